//! Movie list pane with one favorite marker per row.

use marusya_core::toggle::ToggleView;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::App;

/// Marker for one movie: filled when favorite, dimmed while unsettled,
/// ellipsis while a write is outstanding.
fn marker(view: Option<ToggleView>) -> Span<'static> {
  match view {
    Some(v) if v.busy => Span::styled("… ", Style::default().fg(Color::Yellow)),
    Some(v) if v.favorite => Span::styled("♥ ", Style::default().fg(Color::Red)),
    Some(v) if v.settled => Span::styled("♡ ", Style::default().fg(Color::Gray)),
    _ => Span::styled("· ", Style::default().fg(Color::DarkGray)),
  }
}

/// Render the movie list into `area`.
pub fn draw<F, A>(f: &mut Frame, area: Rect, app: &App<F, A>) {
  let filtered = app.filtered_movies();
  let total = app.movies.len();

  let title = if app.filter_active || !app.filter.is_empty() {
    format!(" Movies ({}/{}) ", filtered.len(), total)
  } else {
    format!(" Movies ({total}) ")
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let items: Vec<ListItem> = filtered
    .iter()
    .map(|movie| {
      ListItem::new(Line::from(vec![
        marker(app.board.view(&movie.id)),
        Span::raw(movie.label().to_string()),
        Span::styled(
          format!("  {}", movie.id),
          Style::default().fg(Color::DarkGray),
        ),
      ]))
    })
    .collect();

  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  if (app.filter_active || !app.filter.is_empty()) && inner_area.height > 2 {
    let filter_area = Rect {
      x:      inner_area.x,
      y:      inner_area.y + inner_area.height - 1,
      width:  inner_area.width,
      height: 1,
    };
    inner_area.height = inner_area.height.saturating_sub(1);

    let filter_text = if app.filter_active {
      format!("/{}_", app.filter)
    } else {
      format!("/{}", app.filter)
    };
    f.render_widget(
      Paragraph::new(filter_text).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  let mut state = ListState::default();
  state.select(if filtered.is_empty() {
    None
  } else {
    Some(app.list_cursor)
  });

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner_area,
    &mut state,
  );
}
