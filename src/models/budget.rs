use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    #[serde(default)]
    pub user_id: i64,
    /// `None` for a month-wide budget, or one whose category was removed.
    pub category_id: Option<i64>,
    /// Format: "YYYY-MM"
    pub period_month: String,
    pub limit_amount: Decimal,
    #[serde(default)]
    pub created_at: String,
}

/// Body of `POST /budgets`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBudget {
    pub category_id: i64,
    pub period_month: String,
    pub limit_amount: Decimal,
}

/// Body of `PUT /budgets/{id}`. The period never changes after creation,
/// and a missing `category_id` leaves the stored one untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetUpdate {
    pub limit_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

/// Parse a user-entered limit. Empty, malformed and negative input is rejected.
pub fn parse_limit(input: &str) -> Option<Decimal> {
    let trimmed = input.trim().trim_start_matches('$').replace(',', "");
    if trimmed.is_empty() {
        return None;
    }
    let amount: Decimal = trimmed.parse().ok()?;
    (amount >= Decimal::ZERO).then_some(amount)
}
