use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use super::panel;
use crate::budgets::Body;
use crate::models::month;
use crate::ui::app::{App, BudgetForm};
use crate::ui::theme;
use crate::ui::util::{format_amount, progress_bar, spend_ratio, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Create form
            Constraint::Length(1), // Error line
            Constraint::Min(5),    // Budget list
        ])
        .split(area);

    render_form(f, chunks[0], app);
    render_error(f, chunks[1], app);

    match app.budgets.body() {
        Body::Loading => render_message(f, chunks[2], app, "Loading budgets...", None),
        Body::Empty => render_message(
            f,
            chunks[2],
            app,
            &app.budgets.empty_title(),
            Some("Press a, or use :budget <category> <amount>, to set a spending limit"),
        ),
        Body::Rows => render_rows(f, chunks[2], app),
    }
}

fn render_form(f: &mut Frame, area: Rect, app: &App) {
    let active = app.budget_form == Some(BudgetForm::Draft);
    let draft = &app.budgets.draft;

    let category = match draft.category {
        Some(id) => app.budgets.category_label(Some(id)).to_string(),
        None => "choose category".to_string(),
    };
    let category_style = if draft.category.is_some() {
        theme::normal_style()
    } else {
        theme::dim_style()
    };
    let limit = if active {
        format!("{}▏", draft.limit)
    } else if draft.limit.is_empty() {
        "0.00".to_string()
    } else {
        draft.limit.clone()
    };

    let mut spans = vec![
        Span::styled(" Category ", theme::dim_style()),
        Span::styled("◂ ", Style::default().fg(theme::ACCENT)),
        Span::styled(category, category_style),
        Span::styled(" ▸", Style::default().fg(theme::ACCENT)),
        Span::styled("   Limit $", theme::dim_style()),
        Span::styled(
            limit,
            if active {
                theme::editing_style()
            } else {
                theme::normal_style()
            },
        ),
    ];
    if app.budgets.pending() {
        spans.push(Span::styled("   saving...", theme::editing_style()));
    } else if active {
        let hint = if app.budgets.expense_categories().next().is_none() {
            "   add an expense category first (:category <name>)"
        } else if app.budgets.can_submit() {
            "   Enter to add"
        } else {
            "   +/- category, type a limit"
        };
        spans.push(Span::styled(hint, theme::dim_style()));
    }

    let title = format!(" New budget for {} ", month::label(app.budgets.period()));
    f.render_widget(
        Paragraph::new(Line::from(spans)).block(panel(title, active)),
        area,
    );
}

fn render_error(f: &mut Frame, area: Rect, app: &App) {
    if let Some(message) = app.budgets.error_message() {
        let line = Line::from(Span::styled(
            format!(" {message}"),
            theme::error_style(),
        ));
        f.render_widget(Paragraph::new(line), area);
    }
}

fn render_message(f: &mut Frame, area: Rect, app: &App, title: &str, hint: Option<&str>) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(title.to_string(), theme::dim_style())),
    ];
    if let Some(hint) = hint {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(hint.to_string(), theme::dim_style())));
    }
    let block = panel(
        format!(" Budgets for {} ", month::label(app.budgets.period())),
        false,
    );
    f.render_widget(Paragraph::new(lines).centered().block(block), area);
}

fn render_rows(f: &mut Frame, area: Rect, app: &App) {
    let header = Row::new(
        ["Category", "Limit", "Spent", "Usage"]
            .iter()
            .map(|h| Cell::from(*h).style(theme::header_style())),
    )
    .height(1);

    let edit = app.budgets.edit();
    let rows: Vec<Row> = app
        .budgets
        .budgets()
        .iter()
        .enumerate()
        .skip(app.budget_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, budget)| {
            let spent = app.spent_in(budget.category_id);
            let ratio = spend_ratio(spent, budget.limit_amount);
            let color = theme::usage_color(ratio);

            let style = if i == app.budget_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };

            let (category_cell, limit_cell) = match edit.filter(|e| e.id == budget.id) {
                Some(e) => (
                    Cell::from(Span::styled(
                        format!("◂ {} ▸", truncate(app.budgets.category_label(e.category), 16)),
                        theme::editing_style(),
                    )),
                    Cell::from(Span::styled(
                        format!("${}▏", e.limit),
                        theme::editing_style().add_modifier(Modifier::BOLD),
                    )),
                ),
                None => (
                    Cell::from(truncate(app.budgets.category_label(budget.category_id), 20)),
                    Cell::from(format_amount(budget.limit_amount)),
                ),
            };

            Row::new(vec![
                category_cell,
                limit_cell,
                Cell::from(Span::styled(format_amount(spent), Style::default().fg(color))),
                Cell::from(Span::styled(
                    format!("{} {:.0}%", progress_bar(ratio, 20), ratio * 100.0),
                    Style::default().fg(color),
                )),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(22),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Min(28),
    ];

    let title = format!(
        " Budgets for {} ({}) | total {} ",
        month::label(app.budgets.period()),
        app.budgets.budgets().len(),
        format_amount(app.budgets.total_limit())
    );
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(title, true));
    f.render_widget(table, area);
}
