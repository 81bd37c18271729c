use rust_decimal::Decimal;

use crate::api::{ApiError, ApiResult};
use crate::budgets::{self, Applied, BudgetsController};
use crate::models::*;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Login,
    Dashboard,
    Transactions,
    Categories,
    Budgets,
}

impl Screen {
    /// Screens reachable from the tab bar once signed in.
    pub(crate) fn tabs() -> &'static [Screen] {
        &[
            Self::Dashboard,
            Self::Transactions,
            Self::Categories,
            Self::Budgets,
        ]
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Login => write!(f, "Sign in"),
            Self::Dashboard => write!(f, "Dashboard"),
            Self::Transactions => write!(f, "Transactions"),
            Self::Categories => write!(f, "Categories"),
            Self::Budgets => write!(f, "Budgets"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Editing,
    Confirm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Editing => write!(f, "EDIT"),
            Self::Confirm => write!(f, "CONFIRM"),
        }
    }
}

/// Which budget form receives keystrokes in `InputMode::Editing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BudgetForm {
    Draft,
    Row,
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PendingAction {
    DeleteBudget { id: i64, name: String },
    DeleteCategory { id: i64, name: String },
    DeleteTransaction { id: i64, description: String },
}

/// Network work requested by the UI. The run loop executes these off the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Job {
    Budgets(budgets::Request),
    Transactions { month: String },
    Summary { month: String },
    Categories,
    CreateCategory(NewCategory),
    UpdateCategory { id: i64, category: NewCategory },
    DeleteCategory(i64),
    CreateTransaction(NewTransaction),
    UpdateTransaction { id: i64, txn: NewTransaction },
    DeleteTransaction(i64),
    Login(Credentials),
    Register(Registration),
}

/// The answer to a [`Job`], fed back through [`App::apply`].
#[derive(Debug)]
pub(crate) enum Completion {
    Budgets(budgets::Outcome),
    Transactions {
        month: String,
        result: ApiResult<Vec<Transaction>>,
    },
    Summary {
        month: String,
        result: ApiResult<MonthSummary>,
    },
    Categories(ApiResult<Vec<Category>>),
    CategoryCreated(ApiResult<Category>),
    CategoryUpdated(ApiResult<Category>),
    CategoryDeleted {
        id: i64,
        result: ApiResult<()>,
    },
    TransactionCreated(ApiResult<Transaction>),
    TransactionUpdated {
        id: i64,
        result: ApiResult<Transaction>,
    },
    TransactionDeleted {
        id: i64,
        result: ApiResult<()>,
    },
    SignedIn {
        email: String,
        result: ApiResult<TokenResponse>,
    },
    Registered {
        email: String,
        result: ApiResult<()>,
    },
}

pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,
    pub(crate) current_month: String,

    pub(crate) session: Session,
    /// Set when the token changed; the run loop rebuilds its client.
    pub(crate) session_changed: bool,

    // Dashboard
    pub(crate) summary: Option<MonthSummary>,
    pub(crate) summary_loading: bool,

    // Transactions
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) transactions_loading: bool,
    pub(crate) transaction_index: usize,
    pub(crate) transaction_scroll: usize,

    // Categories
    pub(crate) categories: Vec<Category>,
    pub(crate) category_index: usize,
    pub(crate) category_scroll: usize,

    // Budgets
    pub(crate) budgets: BudgetsController,
    pub(crate) budget_index: usize,
    pub(crate) budget_scroll: usize,
    pub(crate) budget_form: Option<BudgetForm>,

    // Confirmation
    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) confirm_message: String,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,

    jobs: Vec<Job>,
    /// Bumped on every sign-in and sign-out; answers to older jobs are dropped.
    generation: u64,
}

impl App {
    pub(crate) fn new(session: Session, current_month: String) -> Self {
        let screen = if session.is_authenticated() {
            Screen::Dashboard
        } else {
            Screen::Login
        };

        Self {
            running: true,
            screen,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            status_message: String::new(),
            show_help: false,
            budgets: BudgetsController::new(current_month.clone()),
            current_month,

            session,
            session_changed: false,

            summary: None,
            summary_loading: false,

            transactions: Vec::new(),
            transactions_loading: false,
            transaction_index: 0,
            transaction_scroll: 0,

            categories: Vec::new(),
            category_index: 0,
            category_scroll: 0,

            budget_index: 0,
            budget_scroll: 0,
            budget_form: None,

            pending_action: None,
            confirm_message: String::new(),

            visible_rows: 20,

            jobs: Vec::new(),
            generation: 0,
        }
    }

    pub(crate) fn is_signed_in(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Queue network work for the run loop.
    pub(crate) fn submit(&mut self, job: Job) {
        tracing::debug!(?job, "job queued");
        self.jobs.push(job);
    }

    pub(crate) fn take_jobs(&mut self) -> Vec<Job> {
        std::mem::take(&mut self.jobs)
    }

    /// Tag for jobs taken now; pass it back to [`App::apply_from`].
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Report and bail out of a command when nobody is signed in.
    pub(crate) fn require_session(&mut self) -> bool {
        if self.is_signed_in() {
            return true;
        }
        self.screen = Screen::Login;
        self.set_status("Not signed in. Use :login <email> <password>");
        false
    }

    // ── Refresh ─────────────────────────────────────────────────

    pub(crate) fn refresh_dashboard(&mut self) {
        self.summary_loading = true;
        self.submit(Job::Summary {
            month: self.current_month.clone(),
        });
        self.refresh_transactions();
    }

    pub(crate) fn refresh_transactions(&mut self) {
        self.transactions_loading = true;
        self.submit(Job::Transactions {
            month: self.current_month.clone(),
        });
    }

    pub(crate) fn refresh_categories(&mut self) {
        self.submit(Job::Categories);
    }

    pub(crate) fn refresh_budgets(&mut self) {
        let request = self.budgets.load();
        self.submit(Job::Budgets(request));
    }

    pub(crate) fn refresh_all(&mut self) {
        if !self.is_signed_in() {
            return;
        }
        self.refresh_dashboard();
        self.refresh_categories();
        self.refresh_budgets();
    }

    /// Switch every month-scoped view to `month`.
    pub(crate) fn set_month(&mut self, month: String) {
        self.current_month = month.clone();
        self.summary = None;
        self.transactions.clear();
        self.transaction_index = 0;
        self.transaction_scroll = 0;
        self.budget_index = 0;
        self.budget_scroll = 0;
        self.leave_budget_form();

        if !self.is_signed_in() {
            // Nothing to fetch yet, but the next sign-in loads this month.
            self.budgets.select_period(month);
            return;
        }
        let request = self.budgets.set_period(month);
        self.submit(Job::Budgets(request));
        self.refresh_dashboard();
    }

    /// Forget everything that belonged to the signed-out user.
    pub(crate) fn clear_data(&mut self) {
        self.generation += 1;
        self.jobs.clear();
        self.summary = None;
        self.summary_loading = false;
        self.transactions.clear();
        self.transactions_loading = false;
        self.categories.clear();
        self.budgets = BudgetsController::new(self.current_month.clone());
        self.transaction_index = 0;
        self.transaction_scroll = 0;
        self.category_index = 0;
        self.category_scroll = 0;
        self.budget_index = 0;
        self.budget_scroll = 0;
        self.leave_budget_form();
        self.pending_action = None;
    }

    pub(crate) fn leave_budget_form(&mut self) {
        self.budget_form = None;
        self.budgets.cancel_edit();
        if self.input_mode == InputMode::Editing {
            self.input_mode = InputMode::Normal;
        }
    }

    // ── Selection ───────────────────────────────────────────────

    pub(crate) fn selected_budget(&self) -> Option<&Budget> {
        self.budgets.budgets().get(self.budget_index)
    }

    pub(crate) fn selected_category(&self) -> Option<&Category> {
        self.categories.get(self.category_index)
    }

    pub(crate) fn selected_transaction(&self) -> Option<&Transaction> {
        self.transactions.get(self.transaction_index)
    }

    pub(crate) fn category_name(&self, id: Option<i64>) -> &str {
        id.and_then(|id| Category::find_by_id(&self.categories, id))
            .map(|c| c.name.as_str())
            .unwrap_or(budgets::NO_CATEGORY)
    }

    /// Expenses recorded against `category_id` in the loaded month.
    pub(crate) fn spent_in(&self, category_id: Option<i64>) -> Decimal {
        let Some(id) = category_id else {
            return Decimal::ZERO;
        };
        self.transactions
            .iter()
            .filter(|t| t.is_expense() && t.category_id == Some(id))
            .map(|t| t.amount)
            .sum()
    }

    /// Expense totals per category name, largest first.
    pub(crate) fn spending_by_category(&self) -> Vec<(String, Decimal)> {
        let mut totals: Vec<(String, Decimal)> = Vec::new();
        for txn in self.transactions.iter().filter(|t| t.is_expense()) {
            let name = self.category_name(txn.category_id);
            match totals.iter_mut().find(|(n, _)| n == name) {
                Some((_, total)) => *total += txn.amount,
                None => totals.push((name.to_string(), txn.amount)),
            }
        }
        totals.sort_by(|a, b| b.1.cmp(&a.1));
        totals
    }

    // Rows available to each list: visible rows minus the block's own chrome.
    pub(crate) fn transaction_page(&self) -> usize {
        self.visible_rows.saturating_sub(3).max(1)
    }

    pub(crate) fn category_page(&self) -> usize {
        self.visible_rows.saturating_sub(3).max(1)
    }

    pub(crate) fn budget_page(&self) -> usize {
        self.visible_rows.saturating_sub(7).max(1)
    }

    fn clamp_indices(&mut self) {
        clamp(
            &mut self.transaction_index,
            &mut self.transaction_scroll,
            self.transactions.len(),
        );
        clamp(
            &mut self.category_index,
            &mut self.category_scroll,
            self.categories.len(),
        );
        let budget_count = self.budgets.budgets().len();
        clamp(&mut self.budget_index, &mut self.budget_scroll, budget_count);
    }

    // ── Completions ─────────────────────────────────────────────

    /// Apply the answer to a job taken in `generation`. Work started before the
    /// last sign-in or sign-out belongs to another session and is dropped.
    pub(crate) fn apply_from(&mut self, generation: u64, completion: Completion) {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "discarding completion from previous session"
            );
            return;
        }
        self.apply(completion);
    }

    pub(crate) fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Budgets(outcome) => self.apply_budgets(outcome),
            Completion::Transactions { month, result } => {
                if month != self.current_month {
                    tracing::debug!(%month, current = %self.current_month, "discarding stale transactions");
                    return;
                }
                self.transactions_loading = false;
                match result {
                    Ok(txns) => self.transactions = txns,
                    Err(e) => {
                        self.transactions.clear();
                        self.report(&e);
                    }
                }
            }
            Completion::Summary { month, result } => {
                if month != self.current_month {
                    tracing::debug!(%month, current = %self.current_month, "discarding stale summary");
                    return;
                }
                self.summary_loading = false;
                match result {
                    Ok(summary) => self.summary = Some(summary),
                    Err(e) => {
                        self.summary = None;
                        self.report(&e);
                    }
                }
            }
            Completion::Categories(result) => match result {
                Ok(categories) => self.categories = categories,
                Err(e) => self.report(&e),
            },
            Completion::CategoryCreated(result) => match result {
                Ok(category) => {
                    self.set_status(format!("Created {} category: {}", category.kind, category.name));
                    self.categories.push(category);
                    self.refresh_budgets();
                }
                Err(e) => self.report(&e),
            },
            Completion::CategoryUpdated(result) => match result {
                Ok(category) => {
                    self.set_status(format!("Updated {} category: {}", category.kind, category.name));
                    match self.categories.iter_mut().find(|c| c.id == category.id) {
                        Some(slot) => *slot = category,
                        None => self.categories.push(category),
                    }
                    // Budget rows show category names.
                    self.refresh_budgets();
                }
                Err(e) => self.report(&e),
            },
            Completion::CategoryDeleted { id, result } => match result {
                Ok(()) => {
                    let name = self.category_name(Some(id)).to_string();
                    self.categories.retain(|c| c.id != id);
                    self.set_status(format!("Deleted category: {name}"));
                    self.refresh_budgets();
                }
                Err(e) => self.report(&e),
            },
            Completion::TransactionCreated(result) => match result {
                Ok(txn) => {
                    let in_month = month::contains(&self.current_month, &txn.occurred_at);
                    self.set_status(format!(
                        "Added transaction on {}{}",
                        txn.occurred_at,
                        if in_month { "" } else { " (another month)" }
                    ));
                    if in_month {
                        self.transactions.insert(0, txn);
                        self.refresh_summary();
                    }
                }
                Err(e) => self.report(&e),
            },
            Completion::TransactionUpdated { id, result } => match result {
                Ok(txn) => {
                    let in_month = month::contains(&self.current_month, &txn.occurred_at);
                    self.set_status(format!(
                        "Updated transaction on {}{}",
                        txn.occurred_at,
                        if in_month { "" } else { " (moved to another month)" }
                    ));
                    match self.transactions.iter().position(|t| t.id == id) {
                        Some(pos) if in_month => self.transactions[pos] = txn,
                        Some(pos) => {
                            self.transactions.remove(pos);
                        }
                        None if in_month => self.transactions.insert(0, txn),
                        None => {}
                    }
                    self.refresh_summary();
                }
                Err(e) => self.report(&e),
            },
            Completion::TransactionDeleted { id, result } => match result {
                Ok(()) => {
                    self.transactions.retain(|t| t.id != id);
                    self.set_status("Deleted transaction");
                    self.refresh_summary();
                }
                Err(e) => self.report(&e),
            },
            Completion::SignedIn { email, result } => match result {
                Ok(token) => {
                    // Whatever was on screen belonged to the previous account.
                    self.clear_data();
                    if let Err(e) = self.session.sign_in(token.token, token.id) {
                        tracing::error!(error = %e, "failed to persist session");
                        self.set_status(format!("Signed in, but the session was not saved: {e}"));
                    } else {
                        self.set_status(format!("Signed in as {email}"));
                    }
                    tracing::info!(%email, "signed in");
                    self.session_changed = true;
                    self.screen = Screen::Dashboard;
                    self.refresh_all();
                }
                Err(e) => self.set_status(format!("Sign in failed: {e}")),
            },
            Completion::Registered { email, result } => match result {
                Ok(()) => self.set_status(format!(
                    "Registered {email}. Sign in with :login {email} <password>"
                )),
                Err(e) => self.set_status(format!("Registration failed: {e}")),
            },
        }
        self.clamp_indices();
    }

    fn apply_budgets(&mut self, outcome: budgets::Outcome) {
        match self.budgets.apply(outcome) {
            Applied::Loaded { .. } => {
                // The budgets load carries the freshest category list.
                self.categories = self.budgets.categories().to_vec();
            }
            Applied::Stale => {}
            Applied::Created(budget) => {
                let name = self.budgets.category_label(budget.category_id).to_string();
                self.set_status(format!(
                    "Budget set: {name} = {} for {}",
                    crate::ui::util::format_amount(budget.limit_amount),
                    month::label(&budget.period_month)
                ));
                if self.budget_form == Some(BudgetForm::Draft) {
                    self.leave_budget_form();
                }
            }
            Applied::Updated(budget) => {
                let name = self.budgets.category_label(budget.category_id).to_string();
                self.set_status(format!(
                    "Budget updated: {name} = {}",
                    crate::ui::util::format_amount(budget.limit_amount)
                ));
            }
            Applied::Deleted(_) => self.set_status("Deleted budget"),
            Applied::Failed(message) => self.set_status(format!("Error: {message}")),
        }
        if self.budget_form == Some(BudgetForm::Row) && self.budgets.edit().is_none() {
            self.leave_budget_form();
        }
    }

    fn refresh_summary(&mut self) {
        self.summary_loading = true;
        self.submit(Job::Summary {
            month: self.current_month.clone(),
        });
    }

    fn report(&mut self, e: &ApiError) {
        if e.is_unauthorized() {
            self.set_status(format!("{e}. Your session may have expired: use :login"));
        } else {
            self.set_status(format!("Error: {e}"));
        }
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }
}

fn clamp(index: &mut usize, scroll: &mut usize, len: usize) {
    if *index >= len {
        *index = len.saturating_sub(1);
    }
    if *scroll > *index {
        *scroll = *index;
    }
}
