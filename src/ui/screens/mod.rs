pub(crate) mod budgets;
pub(crate) mod categories;
pub(crate) mod dashboard;
pub(crate) mod login;
pub(crate) mod transactions;

use ratatui::{
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders},
};

use crate::ui::theme;

/// The bordered block every screen panel sits in.
pub(crate) fn panel(title: String, focused: bool) -> Block<'static> {
    let color = if focused { theme::ACCENT } else { theme::OVERLAY };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            title,
            Style::default()
                .fg(if focused { theme::ACCENT } else { theme::TEXT_DIM })
                .add_modifier(Modifier::BOLD),
        ))
}
