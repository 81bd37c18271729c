use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Paragraph},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::panel;
use crate::models::month;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, spend_ratio, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Summary cards
            Constraint::Min(8),    // Spending chart
        ])
        .split(area);

    render_summary_cards(f, chunks[0], app);
    render_spending_chart(f, chunks[1], app);
}

fn render_summary_cards(f: &mut Frame, area: Rect, app: &App) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25); 4])
        .split(area);

    let income_count = app.transactions.iter().filter(|t| t.is_income()).count();
    let expense_count = app.transactions.iter().filter(|t| t.is_expense()).count();

    let Some(summary) = &app.summary else {
        let text = if app.summary_loading {
            "loading..."
        } else {
            "no data"
        };
        for (card, title) in cards.iter().zip(["Income", "Expenses", "Net", "Budgeted"]) {
            let p = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(text, theme::dim_style())),
            ])
            .centered()
            .block(panel(format!(" {title} "), false));
            f.render_widget(p, *card);
        }
        return;
    };

    let net = summary.net();
    let budgeted = app.budgets.total_limit();
    let spent_share = if budgeted > Decimal::ZERO {
        let pct = (summary.expense_total / budgeted * Decimal::ONE_HUNDRED).round();
        format!("{pct}% spent")
    } else {
        "no budgets".to_string()
    };

    render_card(
        f,
        cards[0],
        "Income",
        summary.income_total,
        theme::GREEN,
        format!("{income_count} txns"),
    );
    render_card(
        f,
        cards[1],
        "Expenses",
        summary.expense_total,
        theme::RED,
        format!("{expense_count} txns"),
    );
    render_card(
        f,
        cards[2],
        "Net",
        net,
        if net >= Decimal::ZERO {
            theme::GREEN
        } else {
            theme::RED
        },
        month::label(&summary.month),
    );
    let usage = theme::usage_color(spend_ratio(summary.expense_total, budgeted));
    render_card(f, cards[3], "Budgeted", budgeted, usage, spent_share);
}

fn render_card(f: &mut Frame, area: Rect, title: &str, amount: Decimal, color: Color, subtitle: String) {
    let text = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format_amount(amount),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(subtitle, theme::dim_style())),
    ])
    .centered()
    .block(panel(format!(" {title} "), false));

    f.render_widget(text, area);
}

fn render_spending_chart(f: &mut Frame, area: Rect, app: &App) {
    let title = " Spending by Category ".to_string();
    let spending = app.spending_by_category();

    if spending.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "No expenses recorded this month",
            theme::dim_style(),
        )))
        .centered()
        .block(panel(title, false));
        f.render_widget(msg, area);
        return;
    }

    let bars: Vec<Bar> = spending
        .iter()
        .take(12)
        .map(|(name, amount)| {
            Bar::default()
                .value(amount.round().to_u64().unwrap_or(0))
                .label(Line::from(truncate(name, 10)))
                .style(Style::default().fg(theme::ACCENT))
                .value_style(
                    Style::default()
                        .fg(theme::TEXT)
                        .add_modifier(Modifier::BOLD),
                )
        })
        .collect();

    let chart = BarChart::default()
        .block(panel(title, false))
        .data(BarGroup::default().bars(&bars))
        .bar_width(10)
        .bar_gap(1)
        .bar_style(Style::default().fg(theme::ACCENT))
        .value_style(Style::default().fg(theme::TEXT));

    f.render_widget(chart, area);
}
