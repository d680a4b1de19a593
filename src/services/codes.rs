//! Generated identifiers: loan codes, barcodes and reset tokens

use chrono::NaiveDate;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Raw size of a password reset token, hex-encoded on the wire
const RESET_TOKEN_BYTES: usize = 64;

/// `LN` + YYYYMMDD + 4 random digits, e.g. `LN202403150042`
pub fn generate_loan_code<R: Rng>(date: NaiveDate, rng: &mut R) -> String {
    format!("LN{}{:04}", date.format("%Y%m%d"), rng.gen_range(0..10_000))
}

/// `BK` + 6 random digits, e.g. `BK004211`
pub fn generate_barcode<R: Rng>(rng: &mut R) -> String {
    format!("BK{:06}", rng.gen_range(0..1_000_000))
}

pub fn generate_reset_token<R: Rng>(rng: &mut R) -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rng.fill(&mut bytes[..]);
    hex::encode(bytes)
}

/// Reset tokens are only ever stored as their SHA-256 hex digest
pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_loan_code_format() {
        let mut rng = StdRng::seed_from_u64(7);
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        for _ in 0..50 {
            let code = generate_loan_code(date, &mut rng);
            assert_eq!(code.len(), 14);
            assert!(code.starts_with("LN20240305"));
            assert!(code[10..].chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_barcode_format() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let barcode = generate_barcode(&mut rng);
            assert_eq!(barcode.len(), 8);
            assert!(barcode.starts_with("BK"));
            assert!(barcode[2..].chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_reset_token_is_128_hex_chars() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = generate_reset_token(&mut rng);
        let b = generate_reset_token(&mut rng);
        assert_eq!(a.len(), 128);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_reset_token() {
        assert_eq!(
            hash_reset_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(hash_reset_token("abc"), hash_reset_token("abd"));
    }
}
