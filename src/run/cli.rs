use anyhow::{Context, Result};
use tokio::runtime::Runtime;

use crate::api::{ApiClient, ApiError, BudgetApi};
use crate::budgets::{Applied, BudgetsController};
use crate::config::Config;
use crate::models::{month, Category, Credentials, Registration, TokenResponse};
use crate::session::Session;
use crate::ui::util::format_amount;

pub(crate) fn as_cli(
    args: &[String],
    config: &Config,
    mut session: Session,
    runtime: &Runtime,
) -> Result<()> {
    let api = ApiClient::new(&config.api_url, config.request_timeout, &session)?;
    match args[1].as_str() {
        "login" => cli_login(&args[2..], &api, &mut session, runtime),
        "register" => cli_register(&args[2..], &api, runtime),
        "logout" => {
            session.sign_out()?;
            println!("Signed out");
            Ok(())
        }
        "budgets" | "b" => cli_budgets(&args[2..], &api, runtime),
        "categories" | "c" => cli_categories(&api, runtime),
        "summary" | "s" => cli_summary(&args[2..], &api, runtime),
        "whoami" => cli_whoami(&api, runtime),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("pftui {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("pftui - terminal client for the Personal Finance Tracker API");
    println!();
    println!("Usage: pftui [command]");
    println!();
    println!("Commands:");
    println!("  (none)                            Launch interactive TUI");
    println!("  login <email> <password>          Sign in and remember the session");
    println!("  register <name> <email> <password>  Create an account");
    println!("  logout                            Forget the stored session");
    println!("  budgets [YYYY-MM]                 List budgets for a month (default: current)");
    println!("  categories                        List categories");
    println!("  summary [YYYY-MM]                 Print income, expenses and net for a month");
    println!("  whoami                            Show the signed-in user id");
    println!("  --help, -h                        Show this help");
    println!("  --version, -V                     Show version");
    println!();
    println!("Environment:");
    println!("  PFT_API_URL                       API base URL (default: http://localhost:8080/api)");
    println!("  PFT_DATA_DIR                      Where the session and log file live");
    println!("  PFT_LOG                           Log filter, e.g. debug or pftui=trace");
}

/// Turn an API failure into a CLI error, pointing at `login` when the token was refused.
fn api_error(e: ApiError) -> anyhow::Error {
    if e.is_unauthorized() {
        anyhow::anyhow!("{e}. Run `pftui login <email> <password>`")
    } else {
        anyhow::Error::new(e)
    }
}

fn require_session(api: &ApiClient) -> Result<()> {
    if !api.is_authenticated() {
        anyhow::bail!("Not signed in. Run `pftui login <email> <password>` first");
    }
    Ok(())
}

fn month_arg(args: &[String]) -> Result<String> {
    let current = month::current();
    match args.first() {
        None => Ok(current),
        Some(raw) => month::parse(raw, &current)
            .ok_or_else(|| anyhow::anyhow!("Invalid month: {raw} (expected YYYY-MM)")),
    }
}

fn cli_login(
    args: &[String],
    api: &ApiClient,
    session: &mut Session,
    runtime: &Runtime,
) -> Result<()> {
    let [email, password] = args else {
        anyhow::bail!("Usage: pftui login <email> <password>");
    };
    let credentials = Credentials {
        email: email.clone(),
        password: password.clone(),
    };

    let TokenResponse { token, id } = runtime
        .block_on(api.login(&credentials))
        .map_err(api_error)?;
    session.sign_in(token.clone(), id)?;

    if id.is_none() {
        match runtime.block_on(api.with_session(session)?.me()) {
            Ok(me) => session.sign_in(token, Some(me.id))?,
            Err(e) => tracing::warn!(error = %e, "could not look up user id"),
        }
    }
    println!("Signed in as {email}");
    Ok(())
}

fn cli_register(args: &[String], api: &ApiClient, runtime: &Runtime) -> Result<()> {
    if args.len() < 3 {
        anyhow::bail!("Usage: pftui register <name> <email> <password>");
    }
    let (name, rest) = args.split_at(args.len() - 2);
    let registration = Registration {
        name: name.join(" "),
        email: rest[0].clone(),
        password: rest[1].clone(),
    };

    runtime
        .block_on(api.register(&registration))
        .map_err(api_error)?;
    println!(
        "Registered {}. Sign in with `pftui login {} <password>`",
        registration.email, registration.email
    );
    Ok(())
}

fn cli_budgets(args: &[String], api: &ApiClient, runtime: &Runtime) -> Result<()> {
    require_session(api)?;
    let period = month_arg(args)?;

    let mut controller = BudgetsController::new(period.clone());
    let request = controller.load();
    if let Applied::Failed(msg) = runtime.block_on(controller.run(api, request)) {
        anyhow::bail!("Failed to load budgets: {msg}");
    }

    let budgets = controller.budgets();
    if budgets.is_empty() {
        println!("{}", controller.empty_title());
        return Ok(());
    }

    println!("Budgets for {}", month::label(&period));
    println!("{:-<44}", "");
    for budget in budgets {
        println!(
            "  {:<26} {:>14}",
            controller.category_label(budget.category_id),
            format_amount(budget.limit_amount)
        );
    }
    println!("{:-<44}", "");
    println!(
        "  {:<26} {:>14}",
        "Total",
        format_amount(controller.total_limit())
    );
    Ok(())
}

fn cli_categories(api: &ApiClient, runtime: &Runtime) -> Result<()> {
    require_session(api)?;
    let mut categories: Vec<Category> = runtime
        .block_on(api.list_categories())
        .map_err(api_error)?;
    if categories.is_empty() {
        println!("No categories yet");
        return Ok(());
    }
    categories.sort_by(|a, b| a.kind.as_str().cmp(b.kind.as_str()).then(a.name.cmp(&b.name)));
    for category in &categories {
        println!("  {:>5}  {:<8} {}", category.id, category.kind.as_str(), category.name);
    }
    Ok(())
}

fn cli_summary(args: &[String], api: &ApiClient, runtime: &Runtime) -> Result<()> {
    require_session(api)?;
    let period = month_arg(args)?;
    let summary = runtime
        .block_on(api.month_summary(&period))
        .map_err(api_error)
        .with_context(|| format!("Failed to load summary for {period}"))?;

    println!("Summary for {}", month::label(&period));
    println!("  Income:   {:>14}", format_amount(summary.income_total));
    println!("  Expenses: {:>14}", format_amount(summary.expense_total));
    println!("  Net:      {:>14}", format_amount(summary.net()));
    Ok(())
}

fn cli_whoami(api: &ApiClient, runtime: &Runtime) -> Result<()> {
    require_session(api)?;
    let me = runtime.block_on(api.me()).map_err(api_error)?;
    println!("User {} at {}", me.id, api.base_url());
    Ok(())
}
