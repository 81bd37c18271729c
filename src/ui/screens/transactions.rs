use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use super::panel;
use crate::models::month;
use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let title = format!(
        " Transactions: {} ({}) ",
        month::label(&app.current_month),
        app.transactions.len()
    );

    if app.transactions.is_empty() {
        let first = if app.transactions_loading {
            "Loading transactions..."
        } else {
            "No transactions for this month"
        };
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(first, theme::dim_style())),
            Line::from(""),
            Line::from(Span::styled(
                "Add one with :add-txn <YYYY-MM-DD> <amount> [note]",
                theme::dim_style(),
            )),
        ])
        .centered()
        .block(panel(title, false));
        f.render_widget(msg, area);
        return;
    }

    let header = Row::new(
        ["Date", "Note", "Category", "Amount"]
            .iter()
            .map(|h| Cell::from(*h).style(theme::header_style())),
    )
    .height(1);

    let rows: Vec<Row> = app
        .transactions
        .iter()
        .enumerate()
        .skip(app.transaction_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, txn)| {
            let style = if i == app.transaction_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };
            let amount_style = if txn.is_income() {
                theme::income_style()
            } else {
                theme::expense_style()
            };
            let sign = if txn.is_income() { "+" } else { "" };

            Row::new(vec![
                Cell::from(txn.occurred_at.as_str()),
                Cell::from(truncate(txn.note.as_deref().unwrap_or(""), 40)),
                Cell::from(app.category_name(txn.category_id)),
                Cell::from(Span::styled(
                    format!("{sign}{}", format_amount(txn.signed_amount())),
                    amount_style,
                )),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Min(20),
        Constraint::Length(18),
        Constraint::Length(14),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(title, true));
    f.render_widget(table, area);
}
