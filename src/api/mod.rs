//! HTTP client for the Personal Finance Tracker REST API.
//!
//! Every call is a single round trip: no retries, no caching, no
//! deduplication of in-flight requests. Failures come back as [`ApiError`].

mod error;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub use error::{ApiError, ApiResult};

use crate::models::{
    Budget, BudgetUpdate, Category, Credentials, Me, MonthSummary, NewBudget, NewCategory,
    NewTransaction, Registration, TokenResponse, Transaction,
};
use crate::session::Session;

/// Budget endpoints used by the budgets controller.
#[async_trait]
pub(crate) trait BudgetApi: Send + Sync {
    async fn list_budgets(&self, month: &str) -> ApiResult<Vec<Budget>>;
    async fn list_categories(&self) -> ApiResult<Vec<Category>>;
    async fn create_budget(&self, budget: &NewBudget) -> ApiResult<Budget>;
    async fn update_budget(&self, id: i64, update: &BudgetUpdate) -> ApiResult<Budget>;
    async fn delete_budget(&self, id: i64) -> ApiResult<()>;
}

#[derive(Debug, Clone)]
pub(crate) struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: Option<HeaderValue>,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. "http://localhost:8080/api").
    /// The session's token, if any, is attached to every request.
    pub(crate) fn new(base_url: &str, timeout: Duration, session: &Session) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to initialize HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: auth_header(session)?,
        })
    }

    /// Same connection pool, credentials taken from `session`.
    pub(crate) fn with_session(&self, session: &Session) -> ApiResult<Self> {
        Ok(Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            auth_header: auth_header(session)?,
        })
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.auth_header.is_some()
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(auth) = &self.auth_header {
            headers.insert(AUTHORIZATION, auth.clone());
        }
        headers
    }

    /// Perform the round trip and return the raw body of a successful response.
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> ApiResult<String> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "api request");

        let mut request = self.client.request(method.clone(), &url).headers(self.headers());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, %url, error = %e, "api request failed");
            ApiError::from(e)
        })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let err = error::from_response(status.as_u16(), &text);
            tracing::warn!(%method, %url, status = status.as_u16(), error = %err, "api error");
            return Err(err);
        }
        tracing::debug!(%method, %url, status = status.as_u16(), "api response");
        Ok(text)
    }

    /// Issue a request and parse the JSON payload of the response.
    pub(crate) async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ApiResult<T> {
        let text = self.send(method, path, body).await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(format!("{e}")))
    }

    /// Issue a request whose response body is ignored (e.g. 204 No Content).
    pub(crate) async fn request_no_content(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ApiResult<()> {
        self.send(method, path, body).await.map(|_| ())
    }

    /// `GET` a JSON array.
    pub(crate) async fn list<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Vec<T>> {
        self.request(Method::GET, path, None).await
    }

    // ── Auth ────────────────────────────────────────────────────

    pub(crate) async fn login(&self, credentials: &Credentials) -> ApiResult<TokenResponse> {
        self.request(Method::POST, "/login", Some(&to_body(credentials)?))
            .await
    }

    pub(crate) async fn register(&self, registration: &Registration) -> ApiResult<()> {
        self.request_no_content(Method::POST, "/register", Some(&to_body(registration)?))
            .await
    }

    pub(crate) async fn me(&self) -> ApiResult<Me> {
        self.request(Method::GET, "/me", None).await
    }

    // ── Categories ──────────────────────────────────────────────

    pub(crate) async fn create_category(&self, category: &NewCategory) -> ApiResult<Category> {
        self.request(Method::POST, "/categories", Some(&to_body(category)?))
            .await
    }

    /// Rename or retype a category. The body carries both fields.
    pub(crate) async fn update_category(
        &self,
        id: i64,
        category: &NewCategory,
    ) -> ApiResult<Category> {
        self.request(
            Method::PUT,
            &format!("/categories/{id}"),
            Some(&to_body(category)?),
        )
        .await
    }

    pub(crate) async fn delete_category(&self, id: i64) -> ApiResult<()> {
        self.request_no_content(Method::DELETE, &format!("/categories/{id}"), None)
            .await
    }

    // ── Transactions ────────────────────────────────────────────

    pub(crate) async fn list_transactions(&self, month: &str) -> ApiResult<Vec<Transaction>> {
        self.list(&format!("/transactions?month={month}")).await
    }

    pub(crate) async fn create_transaction(&self, txn: &NewTransaction) -> ApiResult<Transaction> {
        self.request(Method::POST, "/transactions", Some(&to_body(txn)?))
            .await
    }

    pub(crate) async fn update_transaction(
        &self,
        id: i64,
        txn: &NewTransaction,
    ) -> ApiResult<Transaction> {
        self.request(
            Method::PUT,
            &format!("/transactions/{id}"),
            Some(&to_body(txn)?),
        )
        .await
    }

    pub(crate) async fn delete_transaction(&self, id: i64) -> ApiResult<()> {
        self.request_no_content(Method::DELETE, &format!("/transactions/{id}"), None)
            .await
    }

    // ── Dashboard ───────────────────────────────────────────────

    pub(crate) async fn month_summary(&self, month: &str) -> ApiResult<MonthSummary> {
        self.request(Method::GET, &format!("/dashboard/summary?month={month}"), None)
            .await
    }
}

#[async_trait]
impl BudgetApi for ApiClient {
    async fn list_budgets(&self, month: &str) -> ApiResult<Vec<Budget>> {
        self.list(&format!("/budgets?month={month}")).await
    }

    async fn list_categories(&self) -> ApiResult<Vec<Category>> {
        self.list("/categories").await
    }

    async fn create_budget(&self, budget: &NewBudget) -> ApiResult<Budget> {
        self.request(Method::POST, "/budgets", Some(&to_body(budget)?))
            .await
    }

    async fn update_budget(&self, id: i64, update: &BudgetUpdate) -> ApiResult<Budget> {
        self.request(Method::PUT, &format!("/budgets/{id}"), Some(&to_body(update)?))
            .await
    }

    async fn delete_budget(&self, id: i64) -> ApiResult<()> {
        self.request_no_content(Method::DELETE, &format!("/budgets/{id}"), None)
            .await
    }
}

fn to_body<T: Serialize>(payload: &T) -> ApiResult<Value> {
    serde_json::to_value(payload).map_err(|e| ApiError::Encode(e.to_string()))
}

fn auth_header(session: &Session) -> ApiResult<Option<HeaderValue>> {
    session
        .token()
        .map(|token| {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ApiError::InvalidToken(e.to_string()))?;
            value.set_sensitive(true);
            Ok(value)
        })
        .transpose()
}

#[cfg(test)]
mod tests;
