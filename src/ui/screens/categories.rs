use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table},
    Frame,
};

use super::panel;
use crate::ui::app::App;
use crate::ui::theme;

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let title = format!(" Categories ({}) ", app.categories.len());

    if app.categories.is_empty() {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No categories yet", theme::dim_style())),
            Line::from(""),
            Line::from(Span::styled(
                "Add one with :category <name> [income|expense]",
                theme::dim_style(),
            )),
        ])
        .centered()
        .block(panel(title, false));
        f.render_widget(msg, area);
        return;
    }

    let header = Row::new(
        ["Name", "Type", "Budget this month"]
            .iter()
            .map(|h| Cell::from(*h).style(theme::header_style())),
    )
    .height(1);

    let rows: Vec<Row> = app
        .categories
        .iter()
        .enumerate()
        .skip(app.category_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, cat)| {
            let style = if i == app.category_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };
            let kind_style = if cat.is_expense() {
                theme::expense_style()
            } else {
                theme::income_style()
            };
            let budgeted = app
                .budgets
                .budgets()
                .iter()
                .any(|b| b.category_id == Some(cat.id));

            Row::new(vec![
                Cell::from(cat.name.as_str()),
                Cell::from(Span::styled(cat.kind.as_str(), kind_style)),
                Cell::from(if budgeted { "yes" } else { "" }),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Min(20),
        Constraint::Length(10),
        Constraint::Length(18),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(title, true));
    f.render_widget(table, area);
}
