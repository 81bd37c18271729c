//! State and operations behind the Budgets screen.
//!
//! The controller owns the budgets of one month (its "period"), the category
//! list, the create draft and the inline-edit state of at most one row.
//!
//! Every operation is split in two. Issuing it (`load`, `create`, `update`,
//! `delete`) updates the flags and returns a [`Request`], or `None` when there
//! is nothing to send. The request is executed with [`perform`], and the
//! resulting [`Outcome`] is handed back to [`BudgetsController::apply`]. Local
//! state only changes after the server has answered.
//!
//! Loads are tagged with a [`LoadTicket`]; only the most recently issued load
//! may touch state, so a slow response for a month the user already left is
//! dropped instead of overwriting the newer list.

use rust_decimal::Decimal;

use crate::api::{ApiError, BudgetApi};
use crate::models::{month, parse_limit, Budget, BudgetUpdate, Category, NewBudget};

/// Placeholder shown for a budget without a known category.
pub(crate) const NO_CATEGORY: &str = "—";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadTicket {
    pub(crate) seq: u64,
    pub(crate) period: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Request {
    Load(LoadTicket),
    Create(NewBudget),
    Update { id: i64, update: BudgetUpdate },
    Delete { id: i64 },
}

#[derive(Debug)]
pub(crate) enum Outcome {
    Loaded {
        ticket: LoadTicket,
        result: Result<(Vec<Budget>, Vec<Category>), ApiError>,
    },
    Created(Result<Budget, ApiError>),
    Updated {
        id: i64,
        result: Result<Budget, ApiError>,
    },
    Deleted {
        id: i64,
        result: Result<(), ApiError>,
    },
}

/// What applying an outcome did to the controller.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Applied {
    Loaded { count: usize },
    /// A load superseded by a newer one; nothing changed.
    Stale,
    Created(Budget),
    Updated(Budget),
    Deleted(i64),
    Failed(String),
}

/// Fields of the create form.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Draft {
    pub(crate) category: Option<i64>,
    pub(crate) limit: String,
}

impl Draft {
    fn clear(&mut self) {
        self.category = None;
        self.limit.clear();
    }
}

/// The row under inline edit.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EditState {
    pub(crate) id: i64,
    pub(crate) category: Option<i64>,
    pub(crate) limit: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Body {
    Loading,
    Empty,
    Rows,
}

#[derive(Debug)]
pub(crate) struct BudgetsController {
    period: String,
    categories: Vec<Category>,
    budgets: Vec<Budget>,
    in_flight: usize,
    fetching: bool,
    error_message: Option<String>,
    pub(crate) draft: Draft,
    edit: Option<EditState>,
    latest_load: u64,
}

impl BudgetsController {
    pub(crate) fn new(period: String) -> Self {
        Self {
            period,
            categories: Vec::new(),
            budgets: Vec::new(),
            in_flight: 0,
            fetching: false,
            error_message: None,
            draft: Draft::default(),
            edit: None,
            latest_load: 0,
        }
    }

    pub(crate) fn period(&self) -> &str {
        &self.period
    }

    pub(crate) fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub(crate) fn budgets(&self) -> &[Budget] {
        &self.budgets
    }

    /// True while at least one create/update/delete is outstanding.
    pub(crate) fn pending(&self) -> bool {
        self.in_flight > 0
    }

    pub(crate) fn fetching(&self) -> bool {
        self.fetching
    }

    pub(crate) fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub(crate) fn edit(&self) -> Option<&EditState> {
        self.edit.as_ref()
    }

    pub(crate) fn edit_mut(&mut self) -> Option<&mut EditState> {
        self.edit.as_mut()
    }

    pub(crate) fn total_limit(&self) -> Decimal {
        self.budgets.iter().map(|b| b.limit_amount).sum()
    }

    // ── Issue ───────────────────────────────────────────────────

    /// Switch to another month. The cached list belongs to the old month, so it
    /// is dropped and a fresh load is issued.
    pub(crate) fn set_period(&mut self, period: String) -> Request {
        self.select_period(period);
        self.load()
    }

    /// Switch months without loading, for when nothing can be fetched yet.
    pub(crate) fn select_period(&mut self, period: String) {
        if period != self.period {
            tracing::debug!(from = %self.period, to = %period, "budget period changed");
            self.period = period;
            self.budgets.clear();
            self.edit = None;
        }
    }

    pub(crate) fn load(&mut self) -> Request {
        self.latest_load += 1;
        self.fetching = true;
        self.error_message = None;
        Request::Load(LoadTicket {
            seq: self.latest_load,
            period: self.period.clone(),
        })
    }

    /// Submit the draft. Nothing is sent without a category and a valid limit.
    pub(crate) fn create(&mut self) -> Option<Request> {
        let category_id = self.draft.category?;
        let limit_amount = parse_limit(&self.draft.limit)?;
        self.begin_mutation();
        Some(Request::Create(NewBudget {
            category_id,
            period_month: self.period.clone(),
            limit_amount,
        }))
    }

    /// Save the row under edit. The category is only sent when one is chosen,
    /// so the server keeps whatever it has otherwise.
    pub(crate) fn update(&mut self) -> Option<Request> {
        let edit = self.edit.as_ref()?;
        let limit_amount = parse_limit(&edit.limit)?;
        let request = Request::Update {
            id: edit.id,
            update: BudgetUpdate {
                limit_amount,
                category_id: edit.category,
            },
        };
        self.begin_mutation();
        Some(request)
    }

    pub(crate) fn delete(&mut self, id: i64) -> Request {
        self.begin_mutation();
        Request::Delete { id }
    }

    fn begin_mutation(&mut self) {
        self.in_flight += 1;
        self.error_message = None;
    }

    fn end_mutation(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub(crate) fn start_edit(&mut self, id: i64) -> bool {
        match self.budgets.iter().find(|b| b.id == id) {
            Some(budget) => {
                self.edit = Some(EditState {
                    id,
                    category: budget.category_id,
                    limit: budget.limit_amount.normalize().to_string(),
                });
                true
            }
            None => false,
        }
    }

    pub(crate) fn cancel_edit(&mut self) {
        self.edit = None;
    }

    /// Step the edit row's category through the expense categories.
    pub(crate) fn cycle_edit_category(&mut self, delta: i32) {
        let next = match &self.edit {
            Some(edit) => cycle_expense(&self.categories, edit.category, delta),
            None => return,
        };
        if let Some(edit) = self.edit.as_mut() {
            edit.category = next;
        }
    }

    /// Step the draft's category through the expense categories.
    pub(crate) fn cycle_draft_category(&mut self, delta: i32) {
        self.draft.category = cycle_expense(&self.categories, self.draft.category, delta);
    }

    // ── Apply ───────────────────────────────────────────────────

    pub(crate) fn apply(&mut self, outcome: Outcome) -> Applied {
        match outcome {
            Outcome::Loaded { ticket, result } => self.apply_load(ticket, result),
            Outcome::Created(result) => {
                self.end_mutation();
                match result {
                    Ok(budget) => {
                        // A budget for a month we already left belongs to that month's cache.
                        if budget.period_month == self.period {
                            self.budgets.insert(0, budget.clone());
                        }
                        self.draft.clear();
                        Applied::Created(budget)
                    }
                    Err(e) => self.fail(e),
                }
            }
            Outcome::Updated { id, result } => {
                self.end_mutation();
                match result {
                    Ok(budget) => {
                        if let Some(slot) = self.budgets.iter_mut().find(|b| b.id == id) {
                            *slot = budget.clone();
                        }
                        if self.edit.as_ref().is_some_and(|e| e.id == id) {
                            self.edit = None;
                        }
                        Applied::Updated(budget)
                    }
                    Err(e) => self.fail(e),
                }
            }
            Outcome::Deleted { id, result } => {
                self.end_mutation();
                match result {
                    Ok(()) => {
                        self.budgets.retain(|b| b.id != id);
                        if self.edit.as_ref().is_some_and(|e| e.id == id) {
                            self.edit = None;
                        }
                        Applied::Deleted(id)
                    }
                    Err(e) => self.fail(e),
                }
            }
        }
    }

    fn apply_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<(Vec<Budget>, Vec<Category>), ApiError>,
    ) -> Applied {
        if ticket.seq != self.latest_load || ticket.period != self.period {
            tracing::debug!(
                seq = ticket.seq,
                latest = self.latest_load,
                period = %ticket.period,
                "discarding stale budget load"
            );
            return Applied::Stale;
        }
        self.fetching = false;
        match result {
            Ok((budgets, categories)) => {
                self.budgets = budgets;
                self.categories = categories;
                self.error_message = None;
                if let Some(edit) = &self.edit {
                    if !self.budgets.iter().any(|b| b.id == edit.id) {
                        self.edit = None;
                    }
                }
                Applied::Loaded {
                    count: self.budgets.len(),
                }
            }
            Err(e) => {
                self.budgets.clear();
                self.edit = None;
                self.fail(e)
            }
        }
    }

    fn fail(&mut self, e: ApiError) -> Applied {
        let message = e.to_string();
        tracing::warn!(period = %self.period, error = %message, "budget operation failed");
        self.error_message = Some(message.clone());
        Applied::Failed(message)
    }

    /// Execute `request` against `api` and apply the result.
    pub(crate) async fn run<A: BudgetApi + ?Sized>(&mut self, api: &A, request: Request) -> Applied {
        let outcome = perform(api, request).await;
        self.apply(outcome)
    }

    // ── Presentation ────────────────────────────────────────────

    pub(crate) fn body(&self) -> Body {
        if self.fetching {
            Body::Loading
        } else if self.budgets.is_empty() {
            Body::Empty
        } else {
            Body::Rows
        }
    }

    pub(crate) fn category_label(&self, category_id: Option<i64>) -> &str {
        category_id
            .and_then(|id| Category::find_by_id(&self.categories, id))
            .map(|c| c.name.as_str())
            .unwrap_or(NO_CATEGORY)
    }

    pub(crate) fn expense_categories(&self) -> impl Iterator<Item = &Category> {
        Category::expenses(&self.categories)
    }

    /// Whether the create action is enabled.
    pub(crate) fn can_submit(&self) -> bool {
        !self.pending() && self.draft.category.is_some() && !self.draft.limit.trim().is_empty()
    }

    pub(crate) fn empty_title(&self) -> String {
        format!("No budgets for {}", month::label(&self.period))
    }
}

fn cycle_expense(categories: &[Category], current: Option<i64>, delta: i32) -> Option<i64> {
    let ids: Vec<i64> = Category::expenses(categories).map(|c| c.id).collect();
    if ids.is_empty() {
        return current;
    }
    let len = ids.len() as i32;
    let next = match current.and_then(|id| ids.iter().position(|&c| c == id)) {
        Some(pos) => (pos as i32 + delta).rem_euclid(len),
        None if delta < 0 => len - 1,
        None => 0,
    };
    ids.get(next as usize).copied()
}

/// Execute one request. Loads fetch budgets and categories concurrently and
/// fail as a whole if either call fails.
pub(crate) async fn perform<A: BudgetApi + ?Sized>(api: &A, request: Request) -> Outcome {
    match request {
        Request::Load(ticket) => {
            let result = tokio::try_join!(api.list_budgets(&ticket.period), api.list_categories());
            Outcome::Loaded { ticket, result }
        }
        Request::Create(budget) => Outcome::Created(api.create_budget(&budget).await),
        Request::Update { id, update } => Outcome::Updated {
            id,
            result: api.update_budget(id, &update).await,
        },
        Request::Delete { id } => Outcome::Deleted {
            id,
            result: api.delete_budget(id).await,
        },
    }
}

#[cfg(test)]
mod tests;
