//! Late fee arithmetic and currency display

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Calendar days between the due date and the return date, 0 when on time
pub fn late_days(due_date: NaiveDate, returned_on: NaiveDate) -> i64 {
    (returned_on - due_date).num_days().max(0)
}

pub fn fine_for(late_days: i64, fine_per_day: Decimal) -> Decimal {
    if late_days <= 0 {
        return Decimal::ZERO;
    }
    Decimal::from(late_days) * fine_per_day
}

/// Formats an amount with `.` as thousands separator and no decimals, e.g. `Rp 12.500`
pub fn format_currency(amount: Decimal, symbol: &str) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    if symbol.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{} {}", sign, symbol, grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_late_days() {
        let due = date(2024, 1, 10);
        assert_eq!(late_days(due, date(2024, 1, 8)), 0);
        assert_eq!(late_days(due, due), 0);
        assert_eq!(late_days(due, date(2024, 1, 13)), 3);
        // across a month boundary
        assert_eq!(late_days(date(2024, 1, 30), date(2024, 2, 2)), 3);
    }

    #[test]
    fn test_fine_for() {
        let rate = Decimal::from(1000);
        assert_eq!(fine_for(0, rate), Decimal::ZERO);
        assert_eq!(fine_for(-2, rate), Decimal::ZERO);
        assert_eq!(fine_for(3, rate), Decimal::from(3000));
        assert_eq!(fine_for(2, Decimal::new(25050, 2)), Decimal::new(50100, 2));
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Decimal::ZERO, "Rp"), "Rp 0");
        assert_eq!(format_currency(Decimal::from(999), "Rp"), "Rp 999");
        assert_eq!(format_currency(Decimal::from(1000), "Rp"), "Rp 1.000");
        assert_eq!(format_currency(Decimal::from(1_234_567), "Rp"), "Rp 1.234.567");
        assert_eq!(format_currency(Decimal::new(150050, 2), "Rp"), "Rp 1.501");
        assert_eq!(format_currency(Decimal::from(-2500), "Rp"), "-Rp 2.500");
        assert_eq!(format_currency(Decimal::from(12000), ""), "12.000");
    }
}
