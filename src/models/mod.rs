mod auth;
mod budget;
mod category;
pub mod month;
mod summary;
mod transaction;

pub use auth::{Credentials, Me, Registration, TokenResponse};
pub use budget::{parse_limit, Budget, BudgetUpdate, NewBudget};
pub use category::{Category, CategoryType, NewCategory};
pub use summary::MonthSummary;
pub use transaction::{Direction, NewTransaction, Transaction};
