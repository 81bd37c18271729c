use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::app::{App, BudgetForm, InputMode, Job, PendingAction, Screen};
use crate::models::{
    month, Category, CategoryType, Credentials, NewCategory, NewTransaction, Registration,
};

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit pftui", cmd_quit, r);
    register_command!("quit", "Quit pftui", cmd_quit, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("h", "Show available commands", cmd_help, r);
    register_command!(
        "login",
        "Sign in (e.g. :login ann@example.com secret)",
        cmd_login,
        r
    );
    register_command!(
        "register",
        "Create an account (e.g. :register Ann ann@example.com secret)",
        cmd_register,
        r
    );
    register_command!("logout", "Sign out and forget the token", cmd_logout, r);
    register_command!("d", "Go to Dashboard", cmd_dashboard, r);
    register_command!("dashboard", "Go to Dashboard", cmd_dashboard, r);
    register_command!("t", "Go to Transactions", cmd_transactions, r);
    register_command!("transactions", "Go to Transactions", cmd_transactions, r);
    register_command!("c", "Go to Categories", cmd_categories, r);
    register_command!("categories", "Go to Categories", cmd_categories, r);
    register_command!("b", "Go to Budgets", cmd_budgets, r);
    register_command!("budgets", "Go to Budgets", cmd_budgets, r);
    register_command!("month", "Set month (e.g. :month 2025-03)", cmd_month, r);
    register_command!("m", "Set month (e.g. :m 2025-03)", cmd_month, r);
    register_command!("next-month", "Go to next month", cmd_next_month, r);
    register_command!("prev-month", "Go to previous month", cmd_prev_month, r);
    register_command!("reload", "Reload everything from the server", cmd_reload, r);
    register_command!(
        "budget",
        "Set budget (e.g. :budget Groceries 250.50)",
        cmd_budget,
        r
    );
    register_command!("edit-budget", "Edit selected budget inline", cmd_edit_budget, r);
    register_command!(
        "delete-budget",
        "Delete selected budget",
        cmd_delete_budget,
        r
    );
    register_command!(
        "category",
        "Create category (e.g. :category Salary income)",
        cmd_category,
        r
    );
    register_command!(
        "rename-category",
        "Rename selected category (e.g. :rename-category Dining expense)",
        cmd_rename_category,
        r
    );
    register_command!(
        "delete-category",
        "Delete selected category",
        cmd_delete_category,
        r
    );
    register_command!(
        "add-txn",
        "Add transaction (e.g. :add-txn 2025-03-14 -4.50 Coffee)",
        cmd_add_txn,
        r
    );
    register_command!(
        "edit-txn",
        "Edit selected transaction (no args: prefill its values)",
        cmd_edit_txn,
        r
    );
    register_command!(
        "delete-txn",
        "Delete selected transaction",
        cmd_delete_txn,
        r
    );

    r
});

pub(crate) fn handle_command(input: &str, app: &mut App) -> anyhow::Result<()> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if cmd_name.is_empty() {
        return Ok(());
    }

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        tracing::debug!(command = cmd_name, "running command");
        (cmd.run)(args, app)?;
    } else {
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }

    Ok(())
}

fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 1) // skip single-letter aliases for suggestions
        .min_by_key(|k| levenshtein(input, k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Hide the password (the last word) of a `login`/`register` line while it is typed.
pub(crate) fn mask_secret(input: &str) -> String {
    let visible_words = match input.split_whitespace().next() {
        Some("login") => 2,
        Some("register") => 3,
        _ => return input.to_string(),
    };
    if input.split_whitespace().count() <= visible_words {
        return input.to_string();
    }
    let trimmed = input.trim_end();
    let start = trimmed
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let masked: String = trimmed[start..].chars().map(|_| '*').collect();
    format!("{}{masked}{}", &input[..start], &input[trimmed.len()..])
}

// ── Command implementations ──────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App) -> anyhow::Result<()> {
    app.running = false;
    Ok(())
}

fn cmd_help(_args: &str, app: &mut App) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_login(args: &str, app: &mut App) -> anyhow::Result<()> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    let [email, password] = parts.as_slice() else {
        app.set_status("Usage: :login <email> <password>");
        return Ok(());
    };
    app.set_status(format!("Signing in as {email}..."));
    app.submit(Job::Login(Credentials {
        email: email.to_string(),
        password: password.to_string(),
    }));
    Ok(())
}

fn cmd_register(args: &str, app: &mut App) -> anyhow::Result<()> {
    // Name may contain spaces: the last two words are email and password.
    let mut parts = args.rsplitn(3, ' ');
    let (Some(password), Some(email), Some(name)) = (parts.next(), parts.next(), parts.next())
    else {
        app.set_status("Usage: :register <name> <email> <password>");
        return Ok(());
    };
    let name = name.trim();
    if name.is_empty() || !email.contains('@') {
        app.set_status("Usage: :register <name> <email> <password>");
        return Ok(());
    }
    app.set_status(format!("Registering {email}..."));
    app.submit(Job::Register(Registration {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    }));
    Ok(())
}

fn cmd_logout(_args: &str, app: &mut App) -> anyhow::Result<()> {
    if !app.is_signed_in() {
        app.set_status("Not signed in");
        return Ok(());
    }
    app.session.sign_out()?;
    app.session_changed = true;
    app.clear_data();
    app.screen = Screen::Login;
    tracing::info!("signed out");
    app.set_status("Signed out");
    Ok(())
}

fn cmd_dashboard(_args: &str, app: &mut App) -> anyhow::Result<()> {
    if app.require_session() {
        app.screen = Screen::Dashboard;
        app.refresh_dashboard();
    }
    Ok(())
}

fn cmd_transactions(_args: &str, app: &mut App) -> anyhow::Result<()> {
    if app.require_session() {
        app.screen = Screen::Transactions;
        app.refresh_transactions();
    }
    Ok(())
}

fn cmd_categories(_args: &str, app: &mut App) -> anyhow::Result<()> {
    if app.require_session() {
        app.screen = Screen::Categories;
        app.refresh_categories();
    }
    Ok(())
}

fn cmd_budgets(_args: &str, app: &mut App) -> anyhow::Result<()> {
    if app.require_session() {
        app.screen = Screen::Budgets;
        app.refresh_budgets();
    }
    Ok(())
}

fn cmd_month(args: &str, app: &mut App) -> anyhow::Result<()> {
    if args.is_empty() {
        let current = month::current();
        app.set_status(format!("Month: {}", month::label(&current)));
        app.set_month(current);
        return Ok(());
    }

    match month::parse(args, &app.current_month) {
        Some(m) => {
            app.set_status(format!("Switched to month: {}", month::label(&m)));
            app.set_month(m);
        }
        None => app.set_status("Invalid month format. Use YYYY-MM (e.g. 2025-03)"),
    }
    Ok(())
}

fn cmd_next_month(_args: &str, app: &mut App) -> anyhow::Result<()> {
    advance_month(app, 1);
    Ok(())
}

fn cmd_prev_month(_args: &str, app: &mut App) -> anyhow::Result<()> {
    advance_month(app, -1);
    Ok(())
}

fn advance_month(app: &mut App, delta: i32) {
    if let Some(m) = month::shift(&app.current_month, delta) {
        app.set_status(format!("Month: {}", month::label(&m)));
        app.set_month(m);
    }
}

fn cmd_reload(_args: &str, app: &mut App) -> anyhow::Result<()> {
    if app.require_session() {
        app.refresh_all();
        app.set_status("Reloading...");
    }
    Ok(())
}

fn cmd_budget(args: &str, app: &mut App) -> anyhow::Result<()> {
    if !app.require_session() {
        return Ok(());
    }
    app.screen = Screen::Budgets;

    if !args.is_empty() {
        // Last token is the amount, everything before is the category name
        let parts: Vec<&str> = args.rsplitn(2, ' ').collect();
        if parts.len() < 2 {
            app.set_status("Usage: :budget <category_name> <amount>");
            return Ok(());
        }
        let (amount, category_name) = (parts[0], parts[1].trim());

        let found = Category::find_by_name(app.budgets.categories(), category_name)
            .map(|c| (c.id, c.is_expense(), c.name.clone()));
        let Some((id, is_expense, name)) = found else {
            app.set_status(format!("Category '{category_name}' not found"));
            return Ok(());
        };
        if !is_expense {
            app.set_status(format!(
                "'{name}' is an income category; budgets need an expense category"
            ));
            return Ok(());
        }
        app.budgets.draft.category = Some(id);
        app.budgets.draft.limit = amount.to_string();
    }

    submit_budget_draft(app);
    Ok(())
}

/// Send the create form, or explain why it cannot be sent.
pub(crate) fn submit_budget_draft(app: &mut App) {
    if app.budgets.pending() {
        app.set_status("Still saving the previous change...");
        return;
    }
    match app.budgets.create() {
        Some(request) => {
            app.set_status(format!(
                "Saving budget for {}...",
                month::label(app.budgets.period())
            ));
            app.submit(Job::Budgets(request));
        }
        None if app.budgets.draft.category.is_none() => {
            app.set_status("Choose an expense category first (+/- to cycle)");
        }
        None => app.set_status(format!(
            "Invalid amount: '{}'. Enter a non-negative number",
            app.budgets.draft.limit
        )),
    }
}

/// Send the inline edit, or explain why it cannot be sent.
pub(crate) fn submit_budget_edit(app: &mut App) {
    if app.budgets.pending() {
        app.set_status("Still saving the previous change...");
        return;
    }
    match app.budgets.update() {
        Some(request) => {
            app.set_status("Saving budget...");
            app.submit(Job::Budgets(request));
        }
        None => {
            let limit = app
                .budgets
                .edit()
                .map(|e| e.limit.clone())
                .unwrap_or_default();
            app.set_status(format!(
                "Invalid amount: '{limit}'. Enter a non-negative number"
            ));
        }
    }
}

fn cmd_edit_budget(_args: &str, app: &mut App) -> anyhow::Result<()> {
    if app.screen != Screen::Budgets {
        app.set_status("Navigate to Budgets and select one first");
        return Ok(());
    }
    let Some(id) = app.selected_budget().map(|b| b.id) else {
        app.set_status("No budget selected");
        return Ok(());
    };
    if app.budgets.start_edit(id) {
        app.budget_form = Some(BudgetForm::Row);
        app.input_mode = InputMode::Editing;
        app.set_status("Edit limit, +/- category, Enter to save, Esc to cancel");
    }
    Ok(())
}

fn cmd_delete_budget(_args: &str, app: &mut App) -> anyhow::Result<()> {
    if app.screen != Screen::Budgets {
        app.set_status("Navigate to Budgets and select one first");
        return Ok(());
    }
    let Some(budget) = app.selected_budget() else {
        app.set_status("No budgets to delete");
        return Ok(());
    };
    let id = budget.id;
    let name = app.budgets.category_label(budget.category_id).to_string();
    app.confirm_message = format!("Delete budget for '{name}'?");
    app.pending_action = Some(PendingAction::DeleteBudget { id, name });
    app.input_mode = InputMode::Confirm;
    Ok(())
}

fn cmd_category(args: &str, app: &mut App) -> anyhow::Result<()> {
    if !app.require_session() {
        return Ok(());
    }
    if args.is_empty() {
        app.set_status("Usage: :category <name> [income|expense]");
        return Ok(());
    }

    let (name, kind) = split_category_args(args);
    let kind = kind.unwrap_or(CategoryType::Expense);

    if Category::find_by_name(&app.categories, name).is_some() {
        app.set_status(format!("Category '{name}' already exists"));
        return Ok(());
    }

    app.submit(Job::CreateCategory(NewCategory {
        name: name.to_string(),
        kind,
    }));
    Ok(())
}

/// `<name> [income|expense]`; a trailing type word is optional.
fn split_category_args(args: &str) -> (&str, Option<CategoryType>) {
    match args.rsplit_once(' ') {
        Some((name, last)) => match CategoryType::parse(last) {
            Some(kind) => (name.trim(), Some(kind)),
            None => (args, None),
        },
        None => (args, None),
    }
}

fn cmd_rename_category(args: &str, app: &mut App) -> anyhow::Result<()> {
    if app.screen != Screen::Categories {
        app.set_status("Navigate to Categories and select one first");
        return Ok(());
    }
    let Some(category) = app.selected_category() else {
        app.set_status("No categories to rename");
        return Ok(());
    };
    let (id, current_name, current_kind) = (category.id, category.name.clone(), category.kind);

    if args.is_empty() {
        app.command_input = format!("rename-category {current_name} {current_kind}");
        app.input_mode = InputMode::Command;
        return Ok(());
    }

    let (name, kind) = split_category_args(args);
    if name.is_empty() {
        app.set_status("Usage: :rename-category <name> [income|expense]");
        return Ok(());
    }
    if Category::find_by_name(&app.categories, name).is_some_and(|c| c.id != id) {
        app.set_status(format!("Category '{name}' already exists"));
        return Ok(());
    }

    app.submit(Job::UpdateCategory {
        id,
        category: NewCategory {
            name: name.to_string(),
            kind: kind.unwrap_or(current_kind),
        },
    });
    Ok(())
}

fn cmd_delete_category(_args: &str, app: &mut App) -> anyhow::Result<()> {
    if app.screen != Screen::Categories {
        app.set_status("Navigate to Categories and select one first");
        return Ok(());
    }
    let Some(category) = app.selected_category() else {
        app.set_status("No categories to delete");
        return Ok(());
    };
    let (id, name) = (category.id, category.name.clone());
    app.confirm_message = format!("Delete category '{name}'?");
    app.pending_action = Some(PendingAction::DeleteCategory { id, name });
    app.input_mode = InputMode::Confirm;
    Ok(())
}

const TXN_USAGE: &str = "<YYYY-MM-DD> <amount> [note]. Negative amounts are expenses";

/// Parse `<date> <amount> [note]`, reporting the problem on the status line.
fn parse_txn(args: &str, app: &mut App, command: &str) -> Option<NewTransaction> {
    let usage = format!("Usage: :{command} {TXN_USAGE}");
    let mut parts = args.splitn(3, ' ');
    let (Some(date), Some(amount_str)) = (parts.next(), parts.next()) else {
        app.set_status(usage);
        return None;
    };
    let note = parts.next().map(str::trim).filter(|n| !n.is_empty());

    if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
        app.set_status(format!("Invalid date: {date}. {usage}"));
        return None;
    }

    let cleaned = amount_str.replace(['$', ','], "");
    let amount = match Decimal::from_str(&cleaned) {
        Ok(a) if !a.is_zero() => a,
        _ => {
            app.set_status(format!("Invalid amount: {amount_str}"));
            return None;
        }
    };

    // A note naming a category files the transaction under it.
    let mut txn = NewTransaction::from_signed(date.to_string(), amount, note.map(String::from));
    if let Some(category) = note.and_then(|n| Category::find_by_name(&app.categories, n)) {
        txn.category_id = Some(category.id);
    }
    Some(txn)
}

fn cmd_add_txn(args: &str, app: &mut App) -> anyhow::Result<()> {
    if !app.require_session() {
        return Ok(());
    }
    if let Some(txn) = parse_txn(args, app, "add-txn") {
        app.submit(Job::CreateTransaction(txn));
    }
    Ok(())
}

fn cmd_edit_txn(args: &str, app: &mut App) -> anyhow::Result<()> {
    if app.screen != Screen::Transactions {
        app.set_status("Navigate to Transactions and select one first");
        return Ok(());
    }
    let Some(txn) = app.selected_transaction() else {
        app.set_status("No transactions to edit");
        return Ok(());
    };
    let (id, category_id) = (txn.id, txn.category_id);

    if args.is_empty() {
        let mut line = format!("edit-txn {} {}", txn.occurred_at, txn.signed_amount());
        if let Some(note) = &txn.note {
            line.push(' ');
            line.push_str(note);
        }
        app.command_input = line;
        app.input_mode = InputMode::Command;
        return Ok(());
    }

    if let Some(mut update) = parse_txn(args, app, "edit-txn") {
        // Keep the existing category unless the note names another one.
        update.category_id = update.category_id.or(category_id);
        app.submit(Job::UpdateTransaction { id, txn: update });
    }
    Ok(())
}

fn cmd_delete_txn(_args: &str, app: &mut App) -> anyhow::Result<()> {
    if app.screen != Screen::Transactions {
        app.set_status("Navigate to Transactions and select one first");
        return Ok(());
    }
    let Some(txn) = app.selected_transaction() else {
        app.set_status("No transactions to delete");
        return Ok(());
    };
    let id = txn.id;
    let description = match &txn.note {
        Some(note) => format!("{} {note}", txn.occurred_at),
        None => format!("{} {}", txn.occurred_at, txn.amount),
    };
    app.confirm_message = format!("Delete '{description}'?");
    app.pending_action = Some(PendingAction::DeleteTransaction { id, description });
    app.input_mode = InputMode::Confirm;
    Ok(())
}
