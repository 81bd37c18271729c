use rust_decimal::Decimal;
use serde::Deserialize;

/// Income/expense totals for one month, from `GET /dashboard/summary`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MonthSummary {
    pub month: String,
    pub income_total: Decimal,
    pub expense_total: Decimal,
}

impl MonthSummary {
    pub fn net(&self) -> Decimal {
        self.income_total - self.expense_total
    }
}
