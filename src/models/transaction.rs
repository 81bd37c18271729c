use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    #[serde(default)]
    pub category_id: Option<i64>,
    /// Always positive; `direction` carries the sign.
    pub amount: Decimal,
    pub direction: Direction,
    #[serde(default)]
    pub note: Option<String>,
    /// Format: "YYYY-MM-DD"
    pub occurred_at: String,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.direction == Direction::In
    }

    pub fn is_expense(&self) -> bool {
        self.direction == Direction::Out
    }

    /// Amount with the direction applied: income positive, expense negative.
    pub fn signed_amount(&self) -> Decimal {
        match self.direction {
            Direction::In => self.amount,
            Direction::Out => -self.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTransaction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    pub amount: Decimal,
    pub direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub occurred_at: String,
}

impl NewTransaction {
    /// Build from a signed amount: negative becomes an outgoing transaction.
    pub fn from_signed(date: String, amount: Decimal, note: Option<String>) -> Self {
        let direction = if amount < Decimal::ZERO {
            Direction::Out
        } else {
            Direction::In
        };
        Self {
            category_id: None,
            amount: amount.abs(),
            direction,
            note,
            occurred_at: date,
        }
    }
}
