//! API integration tests against a running server.
//!
//! Requires a server on `PUSTAKA_TEST_URL` (default http://localhost:8080)
//! whose database has an admin account `admin` / `admin123`, e.g. created
//! through the bootstrap admin settings.
//! Run with: cargo test --test integration -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

fn base_url() -> String {
    let root = std::env::var("PUSTAKA_TEST_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
    format!("{}/api/v1", root)
}

fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, chrono::Utc::now().timestamp_micros())
}

/// Helper to get an authenticated client token
async fn login(client: &Client, login: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", base_url()))
        .json(&json!({ "login": login, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn admin_token(client: &Client) -> String {
    login(client, "admin", "admin123").await
}

async fn create_member(client: &Client, token: &str) -> (i64, String) {
    let username = unique("member");
    let response = client
        .post(format!("{}/users", base_url()))
        .bearer_auth(token)
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "full_name": "Anggota Uji",
            "role": "member",
            "password": "rahasia123",
            "confirm_password": "rahasia123"
        }))
        .send()
        .await
        .expect("Failed to create member");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    (body["id"].as_i64().unwrap(), username)
}

async fn create_item(client: &Client, token: &str, quantity: i64) -> Value {
    let response = client
        .post(format!("{}/items", base_url()))
        .bearer_auth(token)
        .json(&json!({
            "title": unique("Buku Uji "),
            "author": "Penulis",
            "quantity_total": quantity
        }))
        .send()
        .await
        .expect("Failed to create item");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_and_me() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let response = client
        .get(format!("{}/auth/me", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["username"], "admin");
    assert_eq!(body["role"], "admin");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", base_url()))
        .json(&json!({ "login": "admin", "password": "wrong" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_logout_revokes_token() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let response = client
        .post(format!("{}/auth/logout", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/auth/me", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_category_conflicts() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let name = unique("Kategori ");

    for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
        let response = client
            .post(format!("{}/categories", base_url()))
            .bearer_auth(&token)
            .json(&json!({ "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), expected);
    }
}

#[tokio::test]
#[ignore]
async fn test_item_gets_generated_barcode() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let item = create_item(&client, &token, 2).await;

    let barcode = item["barcode"].as_str().unwrap();
    assert!(barcode.starts_with("BK"));
    assert_eq!(barcode.len(), 8);
    assert_eq!(item["quantity_available"], 2);
}

#[tokio::test]
#[ignore]
async fn test_loan_and_late_return_flow() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let (user_id, _) = create_member(&client, &token).await;
    let item = create_item(&client, &token, 1).await;
    let item_id = item["id"].as_i64().unwrap();

    let today = chrono::Local::now().date_naive();
    let loan_date = today - chrono::Duration::days(10);
    let due_date = today - chrono::Duration::days(3);

    // Backdated loan, already three days late
    let response = client
        .post(format!("{}/loans", base_url()))
        .bearer_auth(&token)
        .json(&json!({
            "user_id": user_id,
            "item_id": item_id,
            "loan_date": loan_date,
            "due_date": due_date
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let loan: Value = response.json().await.unwrap();
    assert!(loan["loan_code"].as_str().unwrap().starts_with("LN"));
    assert_eq!(loan["status"], "overdue");
    assert_eq!(loan["late_days"], 3);

    // The only copy is out
    let response = client
        .get(format!("{}/items/{}", base_url(), item_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let current: Value = response.json().await.unwrap();
    assert_eq!(current["quantity_available"], 0);

    // Same borrower, same item
    let response = client
        .post(format!("{}/loans", base_url()))
        .bearer_auth(&token)
        .json(&json!({ "user_id": user_id, "item_id": item_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client
        .post(format!("{}/returns", base_url()))
        .bearer_auth(&token)
        .json(&json!({
            "loan_id": loan["id"],
            "return_date": today,
            "condition": "good"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let receipt: Value = response.json().await.unwrap();
    assert_eq!(receipt["return"]["late_days"], 3);
    assert_eq!(receipt["fine_formatted"], "Rp 3.000");

    // A closed loan cannot be returned twice
    let response = client
        .post(format!("{}/returns", base_url()))
        .bearer_auth(&token)
        .json(&json!({ "loan_id": loan["id"], "condition": "good" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .get(format!("{}/items/{}", base_url(), item_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let current: Value = response.json().await.unwrap();
    assert_eq!(current["quantity_available"], 1);
}

#[tokio::test]
#[ignore]
async fn test_member_only_sees_own_loans() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let (_, username) = create_member(&client, &token).await;

    let member_token = login(&client, &username, "rahasia123").await;

    let response = client
        .get(format!("{}/loans", base_url()))
        .bearer_auth(&member_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["total"], 0);

    let response = client
        .get(format!("{}/suppliers", base_url()))
        .bearer_auth(&member_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_report_rejects_inverted_period() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let response = client
        .get(format!(
            "{}/reports/summary?date_from=2024-06-01&date_to=2024-05-01",
            base_url()
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

async fn create_loan(client: &Client, token: &str, user_id: i64, item_id: i64) -> Value {
    let response = client
        .post(format!("{}/loans", base_url()))
        .bearer_auth(token)
        .json(&json!({ "user_id": user_id, "item_id": item_id }))
        .send()
        .await
        .expect("Failed to create loan");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn get_json(client: &Client, token: &str, path: &str) -> Value {
    let response = client
        .get(format!("{}{}", base_url(), path))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await.unwrap()
}

#[tokio::test]
#[ignore]
async fn test_lost_return_writes_off_copy() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let (user_id, _) = create_member(&client, &token).await;
    let item = create_item(&client, &token, 2).await;
    let item_id = item["id"].as_i64().unwrap();

    let loan = create_loan(&client, &token, user_id, item_id).await;

    let response = client
        .post(format!("{}/returns", base_url()))
        .bearer_auth(&token)
        .json(&json!({ "loan_id": loan["id"], "condition": "lost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let loan = get_json(&client, &token, &format!("/loans/{}", loan["id"])).await;
    assert_eq!(loan["status"], "lost");

    // One copy left the collection; the other never left the shelf
    let current = get_json(&client, &token, &format!("/items/{}", item_id)).await;
    assert_eq!(current["quantity_total"], 1);
    assert_eq!(current["quantity_available"], 1);
}

#[tokio::test]
#[ignore]
async fn test_delete_loan_restores_stock() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let (user_id, _) = create_member(&client, &token).await;
    let item = create_item(&client, &token, 1).await;
    let item_id = item["id"].as_i64().unwrap();

    let loan = create_loan(&client, &token, user_id, item_id).await;
    let current = get_json(&client, &token, &format!("/items/{}", item_id)).await;
    assert_eq!(current["quantity_available"], 0);

    let response = client
        .delete(format!("{}/loans/{}", base_url(), loan["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let current = get_json(&client, &token, &format!("/items/{}", item_id)).await;
    assert_eq!(current["quantity_available"], 1);

    // A returned loan is history and cannot be deleted
    let loan = create_loan(&client, &token, user_id, item_id).await;
    let response = client
        .post(format!("{}/returns", base_url()))
        .bearer_auth(&token)
        .json(&json!({ "loan_id": loan["id"], "condition": "good" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .delete(format!("{}/loans/{}", base_url(), loan["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore]
async fn test_update_loan_due_date_recomputes_status() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let (user_id, _) = create_member(&client, &token).await;
    let item = create_item(&client, &token, 1).await;
    let item_id = item["id"].as_i64().unwrap();

    let today = chrono::Local::now().date_naive();
    let response = client
        .post(format!("{}/loans", base_url()))
        .bearer_auth(&token)
        .json(&json!({
            "user_id": user_id,
            "item_id": item_id,
            "loan_date": today - chrono::Duration::days(14),
            "due_date": today + chrono::Duration::days(1)
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let loan: Value = response.json().await.unwrap();
    assert_eq!(loan["status"], "borrowed");

    for (due_date, status) in [
        (today - chrono::Duration::days(2), "overdue"),
        (today, "borrowed"),
    ] {
        let response = client
            .put(format!("{}/loans/{}", base_url(), loan["id"]))
            .bearer_auth(&token)
            .json(&json!({ "due_date": due_date }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated: Value = response.json().await.unwrap();
        assert_eq!(updated["status"], status);
    }
}

#[tokio::test]
#[ignore]
async fn test_loan_rejected_when_no_copy_available() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let (first, _) = create_member(&client, &token).await;
    let (second, _) = create_member(&client, &token).await;
    let item = create_item(&client, &token, 1).await;
    let item_id = item["id"].as_i64().unwrap();

    create_loan(&client, &token, first, item_id).await;

    let response = client
        .post(format!("{}/loans", base_url()))
        .bearer_auth(&token)
        .json(&json!({ "user_id": second, "item_id": item_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore]
async fn test_user_delete_guards() {
    let client = Client::new();
    let token = admin_token(&client).await;
    let me = get_json(&client, &token, "/auth/me").await;

    // Own account
    let response = client
        .delete(format!("{}/users/{}", base_url(), me["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Another administrator
    let username = unique("admin");
    let response = client
        .post(format!("{}/users", base_url()))
        .bearer_auth(&token)
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "full_name": "Admin Kedua",
            "role": "admin",
            "password": "rahasia123",
            "confirm_password": "rahasia123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let other_admin: Value = response.json().await.unwrap();

    let response = client
        .delete(format!("{}/users/{}", base_url(), other_admin["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // A member with loan history
    let (user_id, _) = create_member(&client, &token).await;
    let item = create_item(&client, &token, 1).await;
    create_loan(&client, &token, user_id, item["id"].as_i64().unwrap()).await;

    let response = client
        .delete(format!("{}/users/{}", base_url(), user_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // A member without loans can go
    let (user_id, _) = create_member(&client, &token).await;
    let response = client
        .delete(format!("{}/users/{}", base_url(), user_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore]
async fn test_referenced_category_and_supplier_cannot_be_deleted() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let response = client
        .post(format!("{}/categories", base_url()))
        .bearer_auth(&token)
        .json(&json!({ "name": unique("Kategori ") }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let category: Value = response.json().await.unwrap();

    let response = client
        .post(format!("{}/suppliers", base_url()))
        .bearer_auth(&token)
        .json(&json!({ "name": unique("Penerbit ") }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let supplier: Value = response.json().await.unwrap();

    let response = client
        .post(format!("{}/items", base_url()))
        .bearer_auth(&token)
        .json(&json!({
            "title": unique("Buku Uji "),
            "category_id": category["id"],
            "supplier_id": supplier["id"],
            "quantity_total": 1
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let item: Value = response.json().await.unwrap();

    for path in [
        format!("/categories/{}", category["id"]),
        format!("/suppliers/{}", supplier["id"]),
    ] {
        let response = client
            .delete(format!("{}{}", base_url(), path))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    // Clearing both references frees the category and supplier
    let response = client
        .put(format!("{}/items/{}", base_url(), item["id"]))
        .bearer_auth(&token)
        .json(&json!({ "category_id": null, "supplier_id": null }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert!(updated["category_id"].is_null());
    assert!(updated["supplier_id"].is_null());
    assert_eq!(updated["title"], item["title"]);

    let response = client
        .delete(format!("{}/categories/{}", base_url(), category["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore]
async fn test_deactivated_or_demoted_account_loses_access() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let username = unique("pustakawan");
    let response = client
        .post(format!("{}/users", base_url()))
        .bearer_auth(&token)
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "full_name": "Pustakawan Uji",
            "role": "librarian",
            "password": "rahasia123",
            "confirm_password": "rahasia123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let librarian: Value = response.json().await.unwrap();
    let librarian_token = login(&client, &username, "rahasia123").await;

    let response = client
        .get(format!("{}/dashboard", base_url()))
        .bearer_auth(&librarian_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Demotion applies to the token already issued
    let response = client
        .put(format!("{}/users/{}", base_url(), librarian["id"]))
        .bearer_auth(&token)
        .json(&json!({ "role": "member" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(format!("{}/dashboard", base_url()))
        .bearer_auth(&librarian_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .put(format!("{}/users/{}", base_url(), librarian["id"]))
        .bearer_auth(&token)
        .json(&json!({ "is_active": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(format!("{}/auth/me", base_url()))
        .bearer_auth(&librarian_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
