#![allow(clippy::unwrap_used)]

use super::*;
use rust_decimal_macros::dec;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

// ── Error bodies ────────────────────────────────────────────

#[test]
fn test_from_response_prefers_msg() {
    let err = error::from_response(400, r#"{"msg":"limit_amount must be >= 0","error":"bad"}"#);
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "limit_amount must be >= 0");
}

#[test]
fn test_from_response_falls_back_to_message_then_error() {
    let err = error::from_response(409, r#"{"message":"budget already exists"}"#);
    assert_eq!(err.to_string(), "budget already exists");

    let err = error::from_response(404, r#"{"error":"not found"}"#);
    assert_eq!(err.to_string(), "not found");
}

#[test]
fn test_from_response_without_json_uses_status() {
    assert_eq!(error::from_response(502, "").to_string(), "HTTP 502");
    assert_eq!(
        error::from_response(500, "Internal Server Error").to_string(),
        "HTTP 500: Internal Server Error"
    );
}

#[test]
fn test_from_response_truncates_long_bodies() {
    let body = "x".repeat(500);
    let message = error::from_response(500, &body).to_string();
    assert_eq!(message.len(), "HTTP 500: ".len() + 200);
}

#[test]
fn test_unauthorized() {
    assert!(error::from_response(401, r#"{"msg":"Missing Authorization Header"}"#).is_unauthorized());
    assert!(!ApiError::Network("refused".into()).is_unauthorized());
}

// ── Client ──────────────────────────────────────────────────

/// Serve exactly one request with `status` and `body`, returning the raw request text.
async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            if let Some(end) = find_header_end(&raw) {
                let expected = content_length(&raw[..end]) + end;
                if raw.len() >= expected {
                    break;
                }
            }
        }
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        String::from_utf8_lossy(&raw).into_owned()
    });
    (format!("http://{addr}/api"), handle)
}

fn find_header_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}

fn content_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())
                .flatten()
        })
        .unwrap_or(0)
}

fn client(base: &str, session: &Session) -> ApiClient {
    ApiClient::new(base, Duration::from_secs(5), session).unwrap()
}

#[tokio::test]
async fn test_list_budgets_sends_month_and_bearer_token() {
    let (base, server) = serve_once(
        "200 OK",
        r#"[{"id":1,"user_id":7,"category_id":3,"period_month":"2025-03","limit_amount":250.5,"created_at":"2025-03-01T00:00:00"}]"#,
    )
    .await;
    let api = client(&base, &Session::with_token("abc123"));

    let budgets = api.list_budgets("2025-03").await.unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].limit_amount, dec!(250.5));
    assert_eq!(budgets[0].category_id, Some(3));

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /api/budgets?month=2025-03 HTTP/1.1"));
    assert!(request.to_lowercase().contains("authorization: bearer abc123"));
}

#[tokio::test]
async fn test_no_authorization_header_when_signed_out() {
    let (base, server) = serve_once("200 OK", "[]").await;
    let api = client(&base, &Session::default());
    assert!(!api.is_authenticated());

    let categories = api.list_categories().await.unwrap();
    assert!(categories.is_empty());

    let request = server.await.unwrap();
    assert!(!request.to_lowercase().contains("authorization:"));
}

#[tokio::test]
async fn test_create_budget_posts_json_body() {
    let (base, server) = serve_once(
        "201 Created",
        r#"{"id":9,"user_id":1,"category_id":3,"period_month":"2025-03","limit_amount":80.0,"created_at":""}"#,
    )
    .await;
    let api = client(&base, &Session::with_token("t"));

    let created = api
        .create_budget(&NewBudget {
            category_id: 3,
            period_month: "2025-03".into(),
            limit_amount: dec!(80),
        })
        .await
        .unwrap();
    assert_eq!(created.id, 9);

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/budgets HTTP/1.1"));
    let body = &request[find_header_end(request.as_bytes()).unwrap()..];
    let json: Value = serde_json::from_str(body).unwrap();
    assert_eq!(json["category_id"], 3);
    assert_eq!(json["period_month"], "2025-03");
    assert_eq!(json["limit_amount"], serde_json::json!(80.0));
}

#[tokio::test]
async fn test_update_without_category_omits_field() {
    let (base, server) = serve_once(
        "200 OK",
        r#"{"id":4,"category_id":2,"period_month":"2025-03","limit_amount":120.0}"#,
    )
    .await;
    let api = client(&base, &Session::with_token("t"));

    api.update_budget(
        4,
        &BudgetUpdate {
            limit_amount: dec!(120),
            category_id: None,
        },
    )
    .await
    .unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("PUT /api/budgets/4 HTTP/1.1"));
    let body = &request[find_header_end(request.as_bytes()).unwrap()..];
    let json: Value = serde_json::from_str(body).unwrap();
    assert!(json.get("category_id").is_none());
}

#[tokio::test]
async fn test_update_category_puts_name_and_type() {
    let (base, server) = serve_once(
        "200 OK",
        r#"{"id":5,"name":"Dining","type":"expense"}"#,
    )
    .await;
    let api = client(&base, &Session::with_token("t"));

    let updated = api
        .update_category(
            5,
            &NewCategory {
                name: "Dining".into(),
                kind: crate::models::CategoryType::Expense,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Dining");

    let request = server.await.unwrap();
    assert!(request.starts_with("PUT /api/categories/5 HTTP/1.1"));
    let body = &request[find_header_end(request.as_bytes()).unwrap()..];
    let json: Value = serde_json::from_str(body).unwrap();
    assert_eq!(json["name"], "Dining");
    assert_eq!(json["type"], "expense");
}

#[tokio::test]
async fn test_update_transaction_puts_full_body() {
    let (base, server) = serve_once(
        "200 OK",
        r#"{"id":8,"category_id":3,"amount":12.5,"direction":"out","note":"Lunch","occurred_at":"2025-03-02"}"#,
    )
    .await;
    let api = client(&base, &Session::with_token("t"));

    let mut txn = crate::models::NewTransaction::from_signed(
        "2025-03-02".into(),
        dec!(-12.5),
        Some("Lunch".into()),
    );
    txn.category_id = Some(3);
    let updated = api.update_transaction(8, &txn).await.unwrap();
    assert_eq!(updated.id, 8);
    assert_eq!(updated.amount, dec!(12.5));

    let request = server.await.unwrap();
    assert!(request.starts_with("PUT /api/transactions/8 HTTP/1.1"));
    let body = &request[find_header_end(request.as_bytes()).unwrap()..];
    let json: Value = serde_json::from_str(body).unwrap();
    assert_eq!(json["direction"], "out");
    assert_eq!(json["amount"], serde_json::json!(12.5));
    assert_eq!(json["category_id"], 3);
}

#[tokio::test]
async fn test_error_status_carries_server_message() {
    let (base, _server) = serve_once("422 Unprocessable Entity", r#"{"msg":"Invalid category"}"#).await;
    let api = client(&base, &Session::with_token("t"));

    let err = api.delete_budget(12).await.unwrap_err();
    assert_eq!(err.status(), Some(422));
    assert_eq!(err.to_string(), "Invalid category");
}

#[tokio::test]
async fn test_delete_accepts_empty_body() {
    let (base, server) = serve_once("204 No Content", "").await;
    let api = client(&base, &Session::with_token("t"));

    api.delete_budget(5).await.unwrap();
    assert!(server.await.unwrap().starts_with("DELETE /api/budgets/5 HTTP/1.1"));
}

#[tokio::test]
async fn test_unparseable_success_body_is_decode_error() {
    let (base, _server) = serve_once("200 OK", "not json").await;
    let api = client(&base, &Session::with_token("t"));

    let err = api.list_budgets("2025-03").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[test]
fn test_base_url_trailing_slash_trimmed() {
    let api = client("http://localhost:8080/api/", &Session::default());
    assert_eq!(api.base_url(), "http://localhost:8080/api");
}

#[test]
fn test_with_session_swaps_credentials() {
    let api = client("http://localhost:8080/api", &Session::default());
    assert!(!api.is_authenticated());
    let signed_in = api.with_session(&Session::with_token("tok")).unwrap();
    assert!(signed_in.is_authenticated());
}

#[test]
fn test_invalid_token_rejected() {
    let err = ApiClient::new(
        "http://localhost:8080/api",
        Duration::from_secs(5),
        &Session::with_token("bad\ntoken"),
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::InvalidToken(_)));
}
