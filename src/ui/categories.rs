use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};
use ratatui::Frame;

use crate::action::Pane;
use crate::app::App;
use crate::filter::CATEGORY_KEY;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.pane == Pane::Categories;
    let active = app.list.filter().get(CATEGORY_KEY);

    let names = std::iter::once(("All", active.is_none())).chain(
        app.categories
            .iter()
            .map(|c| (c.name.as_str(), active == Some(c.id.as_str()))),
    );

    let items: Vec<ListItem> = names
        .enumerate()
        .map(|(i, (name, selected))| {
            let mut style = Style::default();
            if selected {
                style = style.fg(Color::Cyan);
            }
            if focused && i == app.category_index {
                style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
            }
            ListItem::new(Line::styled(name.to_string(), style))
        })
        .collect();

    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title("Categories"),
        )
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    if focused {
        state.select(Some(app.category_index));
    }

    frame.render_stateful_widget(list, area, &mut state);
}
