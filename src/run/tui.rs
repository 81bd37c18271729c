use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::api::{ApiClient, BudgetApi};
use crate::budgets;
use crate::config::Config;
use crate::models::month;
use crate::session::Session;
use crate::ui::app::{App, BudgetForm, Completion, InputMode, Job, PendingAction, Screen};
use crate::ui::commands;
use crate::ui::util::{scroll_down, scroll_to_bottom, scroll_to_top, scroll_up};

/// How long the loop waits for a key before checking for finished requests.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub(crate) fn as_tui(config: &Config, session: Session, runtime: &Handle) -> Result<()> {
    let api = ApiClient::new(&config.api_url, config.request_timeout, &session)?;
    let mut app = App::new(session, month::current());
    app.refresh_all();
    if !app.is_signed_in() {
        app.set_status("Sign in with :login <email> <password>");
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, api, runtime);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        tracing::error!(error = ?e, "tui exited with error");
        eprintln!("Error: {e:?}");
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    mut api: ApiClient,
    runtime: &Handle,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<(u64, Completion)>();

    while app.running {
        if app.session_changed {
            app.session_changed = false;
            match api.with_session(&app.session) {
                Ok(client) => api = client,
                Err(e) => app.set_status(format!("Error: {e}")),
            }
        }
        let generation = app.generation();
        for job in app.take_jobs() {
            spawn_job(runtime, &api, generation, job, tx.clone());
        }

        terminal.draw(|f| {
            let content_height = f.area().height.saturating_sub(3) as usize;
            app.visible_rows = content_height.max(1);
            crate::ui::render::render(f, app);
        })?;

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(key, app)?;
                }
            }
        }

        while let Ok((generation, completion)) = rx.try_recv() {
            app.apply_from(generation, completion);
        }
    }
    Ok(())
}

// ── Background jobs ──────────────────────────────────────────

fn spawn_job(
    runtime: &Handle,
    api: &ApiClient,
    generation: u64,
    job: Job,
    tx: UnboundedSender<(u64, Completion)>,
) {
    let api = api.clone();
    runtime.spawn(async move {
        let completion = execute_job(&api, job).await;
        // The receiver only goes away when the UI has exited.
        let _ = tx.send((generation, completion));
    });
}

async fn execute_job(api: &ApiClient, job: Job) -> Completion {
    match job {
        Job::Budgets(request) => Completion::Budgets(budgets::perform(api, request).await),
        Job::Transactions { month } => {
            let result = api.list_transactions(&month).await;
            Completion::Transactions { month, result }
        }
        Job::Summary { month } => {
            let result = api.month_summary(&month).await;
            Completion::Summary { month, result }
        }
        Job::Categories => Completion::Categories(api.list_categories().await),
        Job::CreateCategory(category) => {
            Completion::CategoryCreated(api.create_category(&category).await)
        }
        Job::UpdateCategory { id, category } => {
            Completion::CategoryUpdated(api.update_category(id, &category).await)
        }
        Job::DeleteCategory(id) => Completion::CategoryDeleted {
            id,
            result: api.delete_category(id).await,
        },
        Job::CreateTransaction(txn) => {
            Completion::TransactionCreated(api.create_transaction(&txn).await)
        }
        Job::UpdateTransaction { id, txn } => Completion::TransactionUpdated {
            id,
            result: api.update_transaction(id, &txn).await,
        },
        Job::DeleteTransaction(id) => Completion::TransactionDeleted {
            id,
            result: api.delete_transaction(id).await,
        },
        Job::Login(credentials) => Completion::SignedIn {
            result: api.login(&credentials).await,
            email: credentials.email,
        },
        Job::Register(registration) => Completion::Registered {
            result: api.register(&registration).await,
            email: registration.email,
        },
    }
}

// ── Input handlers ───────────────────────────────────────────

fn handle_key(key: event::KeyEvent, app: &mut App) -> Result<()> {
    if app.show_help {
        app.show_help = false;
        return Ok(());
    }
    match app.input_mode {
        InputMode::Normal => handle_normal_input(key, app),
        InputMode::Command => handle_command_input(key, app),
        InputMode::Editing => handle_editing_input(key, app),
        InputMode::Confirm => handle_confirm_input(key, app),
    }
}

fn handle_normal_input(key: event::KeyEvent, app: &mut App) -> Result<()> {
    match key.code {
        KeyCode::Char(':') => {
            app.input_mode = InputMode::Command;
            app.command_input.clear();
            return Ok(());
        }
        KeyCode::Char('q') | KeyCode::Char('c')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            app.running = false;
            return Ok(());
        }
        KeyCode::Char('?') => {
            app.show_help = true;
            return Ok(());
        }
        _ => {}
    }

    // Everything else needs data to act on.
    if app.screen == Screen::Login {
        return Ok(());
    }

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => handle_move_down(app),
        KeyCode::Char('k') | KeyCode::Up => handle_move_up(app),
        KeyCode::Char(c @ '1'..='4') => {
            let idx = (c as usize) - ('1' as usize);
            if let Some(&screen) = Screen::tabs().get(idx) {
                switch_screen(app, screen);
            }
        }
        KeyCode::Tab => cycle_screen(app, 1),
        KeyCode::BackTab => cycle_screen(app, -1),
        KeyCode::Char('g') => handle_goto_top(app),
        KeyCode::Char('G') => handle_goto_bottom(app),
        KeyCode::Char('H') => commands::handle_command("prev-month", app)?,
        KeyCode::Char('L') => commands::handle_command("next-month", app)?,
        KeyCode::Char('r') => commands::handle_command("reload", app)?,
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..app.visible_rows / 2 {
                handle_move_down(app);
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..app.visible_rows / 2 {
                handle_move_up(app);
            }
        }
        KeyCode::Char('a') if app.screen == Screen::Budgets => {
            app.budgets.cancel_edit();
            app.budget_form = Some(BudgetForm::Draft);
            app.input_mode = InputMode::Editing;
            if app.budgets.draft.category.is_none() {
                app.budgets.cycle_draft_category(1);
            }
            app.set_status("New budget: +/- category, type a limit, Enter to add");
        }
        KeyCode::Char('e') | KeyCode::Enter if app.screen == Screen::Budgets => {
            commands::handle_command("edit-budget", app)?;
        }
        KeyCode::Char('e') if app.screen == Screen::Categories => {
            commands::handle_command("rename-category", app)?;
        }
        KeyCode::Char('e') if app.screen == Screen::Transactions => {
            commands::handle_command("edit-txn", app)?;
        }
        KeyCode::Char('D') => match app.screen {
            Screen::Budgets => commands::handle_command("delete-budget", app)?,
            Screen::Categories => commands::handle_command("delete-category", app)?,
            Screen::Transactions => commands::handle_command("delete-txn", app)?,
            _ => {}
        },
        KeyCode::Esc => app.set_status(""),
        _ => {}
    }
    Ok(())
}

fn handle_command_input(key: event::KeyEvent, app: &mut App) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let input = std::mem::take(&mut app.command_input);
            app.input_mode = InputMode::Normal;
            commands::handle_command(&input, app)?;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
        }
        KeyCode::Backspace => {
            app.command_input.pop();
            if app.command_input.is_empty() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let trimmed = app.command_input.trim_end();
            if let Some(pos) = trimmed.rfind(' ') {
                app.command_input.truncate(pos + 1);
            } else {
                app.command_input.clear();
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char(c) => {
            app.command_input.push(c);
        }
        _ => {}
    }
    Ok(())
}

/// Keys for the budget create form and the inline row editor.
fn handle_editing_input(key: event::KeyEvent, app: &mut App) -> Result<()> {
    let Some(form) = app.budget_form else {
        app.input_mode = InputMode::Normal;
        return Ok(());
    };

    match key.code {
        KeyCode::Esc => {
            app.leave_budget_form();
            app.set_status(match form {
                BudgetForm::Draft => "Draft kept; press a to continue",
                BudgetForm::Row => "Edit cancelled",
            });
        }
        KeyCode::Enter => match form {
            BudgetForm::Draft => commands::submit_budget_draft(app),
            BudgetForm::Row => commands::submit_budget_edit(app),
        },
        KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Tab | KeyCode::Right => {
            cycle_form_category(app, form, 1);
        }
        KeyCode::Char('-') | KeyCode::BackTab | KeyCode::Left => {
            cycle_form_category(app, form, -1);
        }
        KeyCode::Backspace => {
            if let Some(limit) = form_limit(app, form) {
                limit.pop();
            }
        }
        KeyCode::Char(c) if c.is_ascii_digit() || matches!(c, '.' | ',' | '$') => {
            if let Some(limit) = form_limit(app, form) {
                limit.push(c);
            }
        }
        _ => {}
    }
    Ok(())
}

fn form_limit(app: &mut App, form: BudgetForm) -> Option<&mut String> {
    match form {
        BudgetForm::Draft => Some(&mut app.budgets.draft.limit),
        BudgetForm::Row => app.budgets.edit_mut().map(|e| &mut e.limit),
    }
}

fn cycle_form_category(app: &mut App, form: BudgetForm, delta: i32) {
    match form {
        BudgetForm::Draft => app.budgets.cycle_draft_category(delta),
        BudgetForm::Row => app.budgets.cycle_edit_category(delta),
    }
}

fn handle_confirm_input(key: event::KeyEvent, app: &mut App) -> Result<()> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            if let Some(action) = app.pending_action.take() {
                confirm(app, action);
            }
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.pending_action = None;
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
            app.set_status("Cancelled");
        }
        _ => {}
    }
    Ok(())
}

fn confirm(app: &mut App, action: PendingAction) {
    match action {
        PendingAction::DeleteBudget { id, name } => {
            if app.budgets.pending() {
                app.set_status("Still saving the previous change...");
                return;
            }
            let request = app.budgets.delete(id);
            app.submit(Job::Budgets(request));
            app.set_status(format!("Deleting budget for {name}..."));
        }
        PendingAction::DeleteCategory { id, name } => {
            app.submit(Job::DeleteCategory(id));
            app.set_status(format!("Deleting category {name}..."));
        }
        PendingAction::DeleteTransaction { id, description } => {
            app.submit(Job::DeleteTransaction(id));
            app.set_status(format!("Deleting {description}..."));
        }
    }
}

// ── Navigation helpers ───────────────────────────────────────

fn switch_screen(app: &mut App, screen: Screen) {
    if !app.require_session() {
        return;
    }
    app.leave_budget_form();
    app.screen = screen;
    match screen {
        Screen::Login => {}
        Screen::Dashboard => app.refresh_dashboard(),
        Screen::Transactions => app.refresh_transactions(),
        Screen::Categories => app.refresh_categories(),
        Screen::Budgets => app.refresh_budgets(),
    }
    app.set_status(format!("{screen}"));
}

fn cycle_screen(app: &mut App, delta: isize) {
    let screens = Screen::tabs();
    let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0) as isize;
    let next = (idx + delta).rem_euclid(screens.len() as isize) as usize;
    switch_screen(app, screens[next]);
}

fn handle_move_down(app: &mut App) {
    match app.screen {
        Screen::Transactions => {
            let page = app.transaction_page();
            scroll_down(
                &mut app.transaction_index,
                &mut app.transaction_scroll,
                app.transactions.len(),
                page,
            );
        }
        Screen::Categories => {
            let page = app.category_page();
            scroll_down(
                &mut app.category_index,
                &mut app.category_scroll,
                app.categories.len(),
                page,
            );
        }
        Screen::Budgets => {
            let page = app.budget_page();
            let len = app.budgets.budgets().len();
            scroll_down(&mut app.budget_index, &mut app.budget_scroll, len, page);
        }
        Screen::Login | Screen::Dashboard => {}
    }
}

fn handle_move_up(app: &mut App) {
    match app.screen {
        Screen::Transactions => scroll_up(&mut app.transaction_index, &mut app.transaction_scroll),
        Screen::Categories => scroll_up(&mut app.category_index, &mut app.category_scroll),
        Screen::Budgets => scroll_up(&mut app.budget_index, &mut app.budget_scroll),
        Screen::Login | Screen::Dashboard => {}
    }
}

fn handle_goto_top(app: &mut App) {
    match app.screen {
        Screen::Transactions => {
            scroll_to_top(&mut app.transaction_index, &mut app.transaction_scroll)
        }
        Screen::Categories => scroll_to_top(&mut app.category_index, &mut app.category_scroll),
        Screen::Budgets => scroll_to_top(&mut app.budget_index, &mut app.budget_scroll),
        Screen::Login | Screen::Dashboard => {}
    }
}

fn handle_goto_bottom(app: &mut App) {
    match app.screen {
        Screen::Transactions => {
            let page = app.transaction_page();
            scroll_to_bottom(
                &mut app.transaction_index,
                &mut app.transaction_scroll,
                app.transactions.len(),
                page,
            );
        }
        Screen::Categories => {
            let page = app.category_page();
            scroll_to_bottom(
                &mut app.category_index,
                &mut app.category_scroll,
                app.categories.len(),
                page,
            );
        }
        Screen::Budgets => {
            let page = app.budget_page();
            let len = app.budgets.budgets().len();
            scroll_to_bottom(&mut app.budget_index, &mut app.budget_scroll, len, page);
        }
        Screen::Login | Screen::Dashboard => {}
    }
}
