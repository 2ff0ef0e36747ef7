use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::action::Pane;
use crate::app::App;
use crate::types::ListStatus;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let snapshot = app.list.snapshot();
    let focused = app.pane == Pane::Stores;
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    if snapshot.items.is_empty() {
        let message = match snapshot.status {
            ListStatus::Loading | ListStatus::Idle => "Loading stores...",
            ListStatus::Error => "Could not load stores",
            ListStatus::Ready => "No stores match these filters",
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title("Stores");
        let empty = Paragraph::new(message)
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    }

    let w = area.width.saturating_sub(2) as usize;
    let fixed = 44; // heart(2) + name(30) + space(1) + cashback(9) + spaces(2)
    let flex = w.saturating_sub(fixed).max(10);

    let items: Vec<ListItem> = snapshot
        .items
        .iter()
        .enumerate()
        .map(|(i, store)| {
            let style = if i == app.store_index && focused {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let heart = if app.favorites.is_favorite(&store.id) {
                Span::styled("♥ ", Style::default().fg(Color::Red))
            } else {
                Span::styled("♡ ", Style::default().fg(Color::DarkGray))
            };

            let name = if store.name.chars().count() > 30 {
                format!("{}...", store.name.chars().take(27).collect::<String>())
            } else {
                store.name.clone()
            };

            let cashback = store
                .cashback
                .map(|c| format!("{:>7.1}%", c))
                .unwrap_or_else(|| format!("{:>8}", "-"));

            let category: String = store
                .category
                .as_deref()
                .unwrap_or_default()
                .chars()
                .take(flex)
                .collect();

            let line = Line::from(vec![
                heart,
                Span::styled(format!("{:<30}", name), style),
                Span::raw(" "),
                Span::styled(cashback, Style::default().fg(Color::Green)),
                Span::raw("  "),
                Span::styled(
                    format!("{:<flex$}", category),
                    Style::default().fg(Color::Gray),
                ),
            ]);

            ListItem::new(line)
        })
        .collect();

    let more = if snapshot.has_more { "+" } else { "" };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(format!("Stores ({}{})", snapshot.items.len(), more)),
        )
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default()
        .with_offset(app.viewport.offset)
        .with_selected(Some(app.store_index));

    frame.render_stateful_widget(list, area, &mut state);
}
