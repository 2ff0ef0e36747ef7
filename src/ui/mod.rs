mod categories;
mod store_list;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::App;
use crate::filter::{ALPHABET_KEY, CATEGORY_KEY, FEATURED_KEY, STATUS_KEY};
use crate::types::ListStatus;

const CATEGORY_PANE_WIDTH: u16 = 24;

/// Rows available to the store list for a terminal of `height` rows:
/// header, filter bar, status bar, and the list's own borders.
pub fn list_rows(height: u16) -> usize {
    height.saturating_sub(5) as usize
}

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_filter_bar(frame, app, chunks[1]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(CATEGORY_PANE_WIDTH), Constraint::Min(0)])
        .split(chunks[2]);

    categories::render(frame, app, panes[0]);
    store_list::render(frame, app, panes[1]);

    render_status_bar(frame, app, chunks[3]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let scope = app
        .list
        .filter()
        .get(CATEGORY_KEY)
        .and_then(|id| app.categories.iter().find(|c| c.id == id))
        .map(|c| c.name.as_str())
        .unwrap_or("All stores");

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("shelf - {}", scope),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  ♥ {}", app.favorites.len()),
            Style::default().fg(Color::Red),
        ),
    ]))
    .style(Style::default().bg(Color::DarkGray));

    frame.render_widget(header, area);
}

fn render_filter_bar(frame: &mut Frame, app: &App, area: Rect) {
    let filter = app.list.filter();
    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::White);

    let search = if app.search_mode {
        let pending = if app.search_pending() { " …" } else { "" };
        Span::styled(
            format!("/{}▏{}", app.search_input, pending),
            Style::default().fg(Color::Yellow),
        )
    } else {
        Span::styled(filter.search().unwrap_or("-").to_string(), value)
    };

    let line = Line::from(vec![
        Span::styled("search ", label),
        search,
        Span::styled("  sort ", label),
        Span::styled(
            filter.sort().map_or("-".to_string(), |k| k.to_string()),
            value,
        ),
        Span::styled("  status ", label),
        Span::styled(filter.get(STATUS_KEY).unwrap_or("-").to_string(), value),
        Span::styled("  featured ", label),
        Span::styled(
            if filter.get(FEATURED_KEY).is_some() { "yes" } else { "-" },
            value,
        ),
        Span::styled("  letter ", label),
        Span::styled(
            filter
                .get(ALPHABET_KEY)
                .map(|v| v.trim_start_matches('^'))
                .unwrap_or("-")
                .to_string(),
            value,
        ),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let snapshot = app.list.snapshot();

    let status = if let Some(error) = &app.error {
        Line::from(vec![Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )])
    } else if let Some(error) = &snapshot.last_error {
        let scope = if error.fingerprint.is_empty() {
            String::new()
        } else {
            format!(" [{}]", error.fingerprint)
        };
        Line::from(vec![Span::styled(
            format!("Error on page {}{}: {} (r: retry)", error.page, scope, error.message),
            Style::default().fg(Color::Red),
        )])
    } else if snapshot.status == ListStatus::Loading {
        Line::from(vec![Span::styled(
            "Loading...",
            Style::default().fg(Color::Yellow),
        )])
    } else if snapshot.status == ListStatus::Ready && !snapshot.has_more {
        Line::from(vec![Span::styled(
            "No more stores to show.",
            Style::default().fg(Color::Gray),
        )])
    } else if app.search_mode {
        Line::from(vec![Span::styled(
            "type to search | Enter: apply | Esc: done",
            Style::default().fg(Color::Gray),
        )])
    } else {
        Line::from(vec![Span::styled(
            "j/k/g/G: nav | Tab: pane | /: search | s: sort | t: status | F: featured | [/]: letter | x: reset | f: fav | q: quit",
            Style::default().fg(Color::Gray),
        )])
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_rows_subtracts_chrome() {
        assert_eq!(list_rows(30), 25);
        assert_eq!(list_rows(3), 0);
    }
}
