use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::panel;
use crate::ui::app::App;
use crate::ui::theme;

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Personal Finance Tracker",
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("You are not signed in.", theme::normal_style())),
        Line::from(""),
        Line::from(Span::styled(
            ":login <email> <password>",
            Style::default().fg(theme::GREEN),
        )),
        Line::from(Span::styled(
            ":register <name> <email> <password>",
            Style::default().fg(theme::GREEN),
        )),
        Line::from(""),
    ];
    if !app.status_message.is_empty() {
        lines.push(Line::from(Span::styled(
            app.status_message.as_str(),
            Style::default().fg(theme::YELLOW),
        )));
    }

    let body = Paragraph::new(lines)
        .centered()
        .block(panel(" Sign in ".into(), true));
    f.render_widget(body, area);
}
