#![allow(clippy::unwrap_used)]

use super::*;
use crate::api::ApiResult;
use crate::models::CategoryType;
use async_trait::async_trait;
use rust_decimal_macros::dec;
use std::sync::Mutex;

// ── Fake backend ────────────────────────────────────────────

#[derive(Default)]
struct FakeState {
    budgets: Vec<Budget>,
    categories: Vec<Category>,
    next_id: i64,
    failing: bool,
    calls: usize,
}

#[derive(Default)]
struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    fn with_categories(categories: Vec<Category>) -> Self {
        let api = Self::default();
        {
            let mut state = api.state.lock().unwrap();
            state.categories = categories;
            state.next_id = 1;
        }
        api
    }

    fn seed(&self, id: i64, category_id: Option<i64>, period: &str, limit: Decimal) {
        let mut state = self.state.lock().unwrap();
        state.budgets.push(budget(id, category_id, period, limit));
        state.next_id = state.next_id.max(id + 1);
    }

    fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    fn enter(&self) -> ApiResult<std::sync::MutexGuard<'_, FakeState>> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.failing {
            return Err(ApiError::Network("connection refused".into()));
        }
        Ok(state)
    }
}

#[async_trait]
impl BudgetApi for FakeApi {
    async fn list_budgets(&self, month: &str) -> ApiResult<Vec<Budget>> {
        let state = self.enter()?;
        Ok(state
            .budgets
            .iter()
            .filter(|b| b.period_month == month)
            .cloned()
            .collect())
    }

    async fn list_categories(&self) -> ApiResult<Vec<Category>> {
        Ok(self.enter()?.categories.clone())
    }

    async fn create_budget(&self, new: &NewBudget) -> ApiResult<Budget> {
        let mut state = self.enter()?;
        let created = budget(
            state.next_id,
            Some(new.category_id),
            &new.period_month,
            new.limit_amount,
        );
        state.next_id += 1;
        state.budgets.push(created.clone());
        Ok(created)
    }

    async fn update_budget(&self, id: i64, update: &BudgetUpdate) -> ApiResult<Budget> {
        let mut state = self.enter()?;
        let stored = state
            .budgets
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| not_found(id))?;
        stored.limit_amount = update.limit_amount;
        if let Some(category_id) = update.category_id {
            stored.category_id = Some(category_id);
        }
        Ok(stored.clone())
    }

    async fn delete_budget(&self, id: i64) -> ApiResult<()> {
        let mut state = self.enter()?;
        let before = state.budgets.len();
        state.budgets.retain(|b| b.id != id);
        if state.budgets.len() == before {
            return Err(not_found(id));
        }
        Ok(())
    }
}

fn not_found(id: i64) -> ApiError {
    ApiError::Status {
        status: 404,
        message: format!("Budget {id} not found"),
    }
}

fn budget(id: i64, category_id: Option<i64>, period: &str, limit: Decimal) -> Budget {
    Budget {
        id,
        user_id: 1,
        category_id,
        period_month: period.to_string(),
        limit_amount: limit,
        created_at: String::new(),
    }
}

fn category(id: i64, name: &str, kind: CategoryType) -> Category {
    Category {
        id,
        name: name.to_string(),
        kind,
    }
}

fn categories() -> Vec<Category> {
    vec![
        category(1, "Salary", CategoryType::Income),
        category(3, "Groceries", CategoryType::Expense),
        category(4, "Rent", CategoryType::Expense),
        category(7, "Fun", CategoryType::Expense),
    ]
}

async fn loaded(api: &FakeApi, period: &str) -> BudgetsController {
    let mut ctl = BudgetsController::new(period.to_string());
    let request = ctl.load();
    ctl.run(api, request).await;
    ctl
}

// ── Load ────────────────────────────────────────────────────

#[tokio::test]
async fn test_load_fetches_budgets_for_period_and_categories() {
    let api = FakeApi::with_categories(categories());
    api.seed(1, Some(3), "2025-03", dec!(100));
    api.seed(2, Some(4), "2025-04", dec!(900));

    let ctl = loaded(&api, "2025-03").await;
    assert!(!ctl.fetching());
    assert_eq!(ctl.budgets().len(), 1);
    assert_eq!(ctl.budgets()[0].id, 1);
    assert_eq!(ctl.categories().len(), 4);
    assert_eq!(ctl.error_message(), None);
    assert_eq!(ctl.body(), Body::Rows);
}

#[tokio::test]
async fn test_load_sets_fetching_until_applied() {
    let api = FakeApi::with_categories(categories());
    let mut ctl = BudgetsController::new("2025-03".into());
    let request = ctl.load();
    assert!(ctl.fetching());
    assert_eq!(ctl.body(), Body::Loading);

    ctl.run(&api, request).await;
    assert!(!ctl.fetching());
    assert_eq!(ctl.body(), Body::Empty);
}

#[tokio::test]
async fn test_load_failure_clears_budgets_keeps_categories() {
    let api = FakeApi::with_categories(categories());
    api.seed(1, Some(3), "2025-03", dec!(100));
    let mut ctl = loaded(&api, "2025-03").await;
    assert_eq!(ctl.budgets().len(), 1);

    api.set_failing(true);
    let request = ctl.load();
    let applied = ctl.run(&api, request).await;

    assert_eq!(applied, Applied::Failed("Network error: connection refused".into()));
    assert!(ctl.budgets().is_empty());
    assert_eq!(ctl.categories().len(), 4);
    assert_eq!(ctl.error_message(), Some("Network error: connection refused"));
    assert!(!ctl.fetching());
}

#[tokio::test]
async fn test_successful_load_clears_previous_error() {
    let api = FakeApi::with_categories(categories());
    api.set_failing(true);
    let mut ctl = loaded(&api, "2025-03").await;
    assert!(ctl.error_message().is_some());

    api.set_failing(false);
    let request = ctl.load();
    assert_eq!(ctl.error_message(), None);
    ctl.run(&api, request).await;
    assert_eq!(ctl.error_message(), None);
}

#[tokio::test]
async fn test_out_of_order_load_is_discarded() {
    let api = FakeApi::with_categories(categories());
    api.seed(1, Some(3), "2025-02", dec!(10));
    api.seed(2, Some(3), "2025-03", dec!(20));

    let mut ctl = BudgetsController::new("2025-02".into());
    let first = ctl.load();
    let second = ctl.set_period("2025-03".into());

    let first_outcome = perform(&api, first).await;
    let second_outcome = perform(&api, second).await;

    // The older response arrives first: ignored, still waiting on the newer one.
    assert_eq!(ctl.apply(first_outcome), Applied::Stale);
    assert!(ctl.fetching());
    assert!(ctl.budgets().is_empty());

    assert_eq!(ctl.apply(second_outcome), Applied::Loaded { count: 1 });
    assert!(!ctl.fetching());
    assert_eq!(ctl.budgets()[0].id, 2);
}

#[tokio::test]
async fn test_late_load_for_old_period_does_not_overwrite() {
    let api = FakeApi::with_categories(categories());
    api.seed(1, Some(3), "2025-02", dec!(10));
    api.seed(2, Some(3), "2025-03", dec!(20));

    let mut ctl = BudgetsController::new("2025-02".into());
    let first = ctl.load();
    let second = ctl.set_period("2025-03".into());
    let first_outcome = perform(&api, first).await;
    ctl.run(&api, second).await;

    assert_eq!(ctl.apply(first_outcome), Applied::Stale);
    assert_eq!(ctl.period(), "2025-03");
    assert_eq!(ctl.budgets().len(), 1);
    assert_eq!(ctl.budgets()[0].period_month, "2025-03");
}

#[tokio::test]
async fn test_set_period_drops_cache_and_edit() {
    let api = FakeApi::with_categories(categories());
    api.seed(1, Some(3), "2025-03", dec!(100));
    let mut ctl = loaded(&api, "2025-03").await;
    assert!(ctl.start_edit(1));

    let request = ctl.set_period("2025-04".into());
    assert!(matches!(&request, Request::Load(t) if t.period == "2025-04"));
    assert!(ctl.budgets().is_empty());
    assert!(ctl.edit().is_none());
    assert_eq!(ctl.body(), Body::Loading);
}

#[tokio::test]
async fn test_select_period_without_load_discards_old_load() {
    let api = FakeApi::with_categories(categories());
    api.seed(1, Some(3), "2025-03", dec!(100));
    let mut ctl = BudgetsController::new("2025-03".into());
    let in_flight = ctl.load();

    ctl.select_period("2025-07".into());
    assert_eq!(ctl.period(), "2025-07");

    let outcome = perform(&api, in_flight).await;
    assert_eq!(ctl.apply(outcome), Applied::Stale);
    assert!(ctl.budgets().is_empty());
}

// ── Create ──────────────────────────────────────────────────

#[tokio::test]
async fn test_create_then_load_returns_single_matching_budget() {
    let api = FakeApi::with_categories(categories());
    let mut ctl = loaded(&api, "2025-03").await;

    ctl.draft.category = Some(3);
    ctl.draft.limit = "250.5".into();
    let request = ctl.create().unwrap();
    assert_eq!(
        request,
        Request::Create(NewBudget {
            category_id: 3,
            period_month: "2025-03".into(),
            limit_amount: dec!(250.5),
        })
    );
    assert!(ctl.pending());

    let applied = ctl.run(&api, request).await;
    assert!(matches!(applied, Applied::Created(_)));
    assert!(!ctl.pending());
    assert_eq!(ctl.draft, Draft::default());

    let request = ctl.load();
    ctl.run(&api, request).await;
    let matching: Vec<_> = ctl
        .budgets()
        .iter()
        .filter(|b| b.category_id == Some(3) && b.limit_amount == dec!(250.5))
        .collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].period_month, "2025-03");
}

#[tokio::test]
async fn test_created_budget_is_prepended() {
    let api = FakeApi::with_categories(categories());
    api.seed(1, Some(4), "2025-03", dec!(900));
    let mut ctl = loaded(&api, "2025-03").await;

    ctl.draft.category = Some(3);
    ctl.draft.limit = "$1,200".into();
    let request = ctl.create().unwrap();
    ctl.run(&api, request).await;

    assert_eq!(ctl.budgets().len(), 2);
    assert_eq!(ctl.budgets()[0].limit_amount, dec!(1200));
    assert_eq!(ctl.budgets()[1].id, 1);
}

#[tokio::test]
async fn test_create_is_noop_without_category() {
    let api = FakeApi::with_categories(categories());
    let mut ctl = loaded(&api, "2025-03").await;
    let calls = api.calls();

    ctl.draft.limit = "100".into();
    assert!(!ctl.can_submit());
    assert_eq!(ctl.create(), None);
    assert!(!ctl.pending());
    assert_eq!(api.calls(), calls);
    assert!(ctl.budgets().is_empty());
}

#[tokio::test]
async fn test_create_is_noop_with_bad_limit() {
    let api = FakeApi::with_categories(categories());
    let mut ctl = loaded(&api, "2025-03").await;

    ctl.draft.category = Some(3);
    for limit in ["", "   ", "abc", "-5"] {
        ctl.draft.limit = limit.into();
        assert_eq!(ctl.create(), None, "limit {limit:?} should be rejected");
    }
    assert!(!ctl.pending());
    assert_eq!(ctl.error_message(), None);
}

#[tokio::test]
async fn test_create_failure_keeps_draft_and_sets_error() {
    let api = FakeApi::with_categories(categories());
    let mut ctl = loaded(&api, "2025-03").await;

    ctl.draft.category = Some(3);
    ctl.draft.limit = "80".into();
    let request = ctl.create().unwrap();
    api.set_failing(true);
    ctl.run(&api, request).await;

    assert!(!ctl.pending());
    assert!(ctl.budgets().is_empty());
    assert_eq!(ctl.draft.category, Some(3));
    assert_eq!(ctl.draft.limit, "80");
    assert_eq!(ctl.error_message(), Some("Network error: connection refused"));
}

#[tokio::test]
async fn test_created_budget_for_previous_period_is_not_shown() {
    let api = FakeApi::with_categories(categories());
    let mut ctl = loaded(&api, "2025-03").await;

    ctl.draft.category = Some(3);
    ctl.draft.limit = "80".into();
    let create = ctl.create().unwrap();
    let outcome = perform(&api, create).await;

    let load = ctl.set_period("2025-04".into());
    ctl.run(&api, load).await;
    assert!(matches!(ctl.apply(outcome), Applied::Created(_)));
    assert!(ctl.budgets().is_empty());
}

#[tokio::test]
async fn test_pending_until_every_mutation_settles() {
    let api = FakeApi::with_categories(categories());
    let mut ctl = loaded(&api, "2025-03").await;

    ctl.draft.category = Some(3);
    ctl.draft.limit = "10".into();
    let first = ctl.create().unwrap();
    ctl.draft.category = Some(4);
    ctl.draft.limit = "20".into();
    let second = ctl.create().unwrap();
    assert!(!ctl.can_submit());

    let first = perform(&api, first).await;
    let second = perform(&api, second).await;
    ctl.apply(first);
    assert!(ctl.pending());
    ctl.apply(second);
    assert!(!ctl.pending());
    assert_eq!(ctl.budgets().len(), 2);
}

// ── Update ──────────────────────────────────────────────────

#[tokio::test]
async fn test_update_without_category_keeps_category() {
    let api = FakeApi::with_categories(categories());
    api.seed(1, Some(3), "2025-03", dec!(100));
    api.seed(2, Some(4), "2025-03", dec!(900));
    let mut ctl = loaded(&api, "2025-03").await;

    assert!(ctl.start_edit(1));
    let edit = ctl.edit_mut().unwrap();
    edit.category = None;
    edit.limit = "120".into();
    let request = ctl.update().unwrap();
    assert_eq!(
        request,
        Request::Update {
            id: 1,
            update: BudgetUpdate {
                limit_amount: dec!(120),
                category_id: None,
            },
        }
    );
    ctl.run(&api, request).await;

    assert!(ctl.edit().is_none());
    assert_eq!(ctl.budgets()[0].id, 1);
    assert_eq!(ctl.budgets()[0].limit_amount, dec!(120));
    assert_eq!(ctl.budgets()[0].category_id, Some(3));
    assert_eq!(ctl.budgets()[1], budget(2, Some(4), "2025-03", dec!(900)));
}

#[tokio::test]
async fn test_update_with_category_changes_category() {
    let api = FakeApi::with_categories(categories());
    api.seed(1, Some(3), "2025-03", dec!(100));
    let mut ctl = loaded(&api, "2025-03").await;

    ctl.start_edit(1);
    ctl.edit_mut().unwrap().category = Some(7);
    let request = ctl.update().unwrap();
    ctl.run(&api, request).await;

    assert_eq!(ctl.budgets()[0].category_id, Some(7));
    assert_eq!(ctl.category_label(ctl.budgets()[0].category_id), "Fun");
}

#[tokio::test]
async fn test_start_edit_seeds_from_budget() {
    let api = FakeApi::with_categories(categories());
    api.seed(1, Some(3), "2025-03", dec!(250.50));
    let mut ctl = loaded(&api, "2025-03").await;

    assert!(!ctl.start_edit(99));
    assert!(ctl.start_edit(1));
    assert_eq!(
        ctl.edit(),
        Some(&EditState {
            id: 1,
            category: Some(3),
            limit: "250.5".into(),
        })
    );
}

#[tokio::test]
async fn test_update_is_noop_without_edit_or_with_bad_limit() {
    let api = FakeApi::with_categories(categories());
    api.seed(1, Some(3), "2025-03", dec!(100));
    let mut ctl = loaded(&api, "2025-03").await;

    assert_eq!(ctl.update(), None);
    ctl.start_edit(1);
    ctl.edit_mut().unwrap().limit = "lots".into();
    assert_eq!(ctl.update(), None);
    assert!(!ctl.pending());
    assert!(ctl.edit().is_some());
}

#[tokio::test]
async fn test_update_failure_stays_in_edit() {
    let api = FakeApi::with_categories(categories());
    api.seed(1, Some(3), "2025-03", dec!(100));
    let mut ctl = loaded(&api, "2025-03").await;

    ctl.start_edit(1);
    ctl.edit_mut().unwrap().limit = "150".into();
    let request = ctl.update().unwrap();
    api.set_failing(true);
    ctl.run(&api, request).await;

    assert_eq!(ctl.edit().map(|e| e.limit.as_str()), Some("150"));
    assert_eq!(ctl.budgets()[0].limit_amount, dec!(100));
    assert!(ctl.error_message().is_some());
}

#[tokio::test]
async fn test_cancel_edit() {
    let api = FakeApi::with_categories(categories());
    api.seed(1, Some(3), "2025-03", dec!(100));
    let mut ctl = loaded(&api, "2025-03").await;

    ctl.start_edit(1);
    ctl.cancel_edit();
    assert!(ctl.edit().is_none());
    assert_eq!(ctl.update(), None);
}

// ── Delete ──────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_removes_only_that_budget() {
    let api = FakeApi::with_categories(categories());
    api.seed(5, Some(3), "2025-03", dec!(100));
    api.seed(6, Some(4), "2025-03", dec!(50));
    let mut ctl = loaded(&api, "2025-03").await;
    assert_eq!(ctl.total_limit(), dec!(150));

    let request = ctl.delete(5);
    assert!(ctl.pending());
    assert_eq!(ctl.run(&api, request).await, Applied::Deleted(5));

    assert!(!ctl.pending());
    assert_eq!(ctl.budgets().len(), 1);
    assert_eq!(ctl.budgets()[0].id, 6);
    assert_eq!(ctl.total_limit(), dec!(50));
}

#[tokio::test]
async fn test_delete_failure_leaves_list_unchanged() {
    let api = FakeApi::with_categories(categories());
    api.seed(5, Some(3), "2025-03", dec!(100));
    let mut ctl = loaded(&api, "2025-03").await;

    let request = ctl.delete(42);
    let applied = ctl.run(&api, request).await;
    assert_eq!(applied, Applied::Failed("Budget 42 not found".into()));
    assert_eq!(ctl.budgets().len(), 1);
    assert_eq!(ctl.error_message(), Some("Budget 42 not found"));
}

#[tokio::test]
async fn test_delete_of_edited_row_exits_edit() {
    let api = FakeApi::with_categories(categories());
    api.seed(5, Some(3), "2025-03", dec!(100));
    let mut ctl = loaded(&api, "2025-03").await;

    ctl.start_edit(5);
    let request = ctl.delete(5);
    ctl.run(&api, request).await;
    assert!(ctl.edit().is_none());
}

// ── Presentation ────────────────────────────────────────────

#[tokio::test]
async fn test_category_label_placeholder() {
    let api = FakeApi::with_categories(categories());
    let ctl = loaded(&api, "2025-03").await;
    assert_eq!(ctl.category_label(Some(3)), "Groceries");
    assert_eq!(ctl.category_label(Some(999)), NO_CATEGORY);
    assert_eq!(ctl.category_label(None), NO_CATEGORY);
}

#[test]
fn test_empty_title_names_month() {
    let ctl = BudgetsController::new("2025-03".into());
    assert_eq!(ctl.empty_title(), "No budgets for March 2025");
}

#[test]
fn test_total_limit_of_empty_list_is_zero() {
    let ctl = BudgetsController::new("2025-03".into());
    assert_eq!(ctl.total_limit(), Decimal::ZERO);
}

#[tokio::test]
async fn test_cycle_draft_category_skips_income() {
    let api = FakeApi::with_categories(categories());
    let mut ctl = loaded(&api, "2025-03").await;

    ctl.cycle_draft_category(1);
    assert_eq!(ctl.draft.category, Some(3));
    ctl.cycle_draft_category(1);
    assert_eq!(ctl.draft.category, Some(4));
    ctl.cycle_draft_category(1);
    assert_eq!(ctl.draft.category, Some(7));
    ctl.cycle_draft_category(1);
    assert_eq!(ctl.draft.category, Some(3));
    ctl.cycle_draft_category(-1);
    assert_eq!(ctl.draft.category, Some(7));
}

#[tokio::test]
async fn test_cycle_edit_category_starts_from_budget() {
    let api = FakeApi::with_categories(categories());
    api.seed(1, Some(4), "2025-03", dec!(100));
    let mut ctl = loaded(&api, "2025-03").await;

    ctl.cycle_edit_category(1);
    assert!(ctl.edit().is_none());

    ctl.start_edit(1);
    ctl.cycle_edit_category(1);
    assert_eq!(ctl.edit().unwrap().category, Some(7));
}
