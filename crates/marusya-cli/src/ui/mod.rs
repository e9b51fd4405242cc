//! Frame layout: header, movie list, status bar and the login modal.

pub mod auth_gate;
pub mod movie_list;

use chrono::Local;
use marusya_core::{notify::Level, source::LoadStatus};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};

use crate::app::App;

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<F, A>(f: &mut Frame, app: &App<F, A>) {
  let area = f.area();

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  movie_list::draw(f, rows[1], app);
  draw_status(f, rows[2], app);

  if app.board.gate().is_open() {
    auth_gate::draw(f, area, app);
  }
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header<F, A>(f: &mut Frame, area: Rect, app: &App<F, A>) {
  let who = match app.board.identity() {
    Some(identity) => identity.email,
    None => "signed out".to_string(),
  };
  let date = Local::now().format("%Y-%m-%d").to_string();
  let activity = if app.board.is_idle() { " " } else { "⟳" };

  let left = Span::styled(
    " marusya  [f] favorite  [/] search  [q] quit",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(
    format!("{activity} {who}  {date} "),
    Style::default().fg(Color::Gray),
  );

  let left_width = left.content.chars().count() as u16;
  let right_width = right.content.chars().count() as u16;
  let pad = area
    .width
    .saturating_sub(left_width)
    .saturating_sub(right_width);

  let line = Line::from(vec![
    left,
    Span::raw(" ".repeat(pad as usize)),
    right,
  ]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<F, A>(f: &mut Frame, area: Rect, app: &App<F, A>) {
  let (mode_label, hints) = if app.board.gate().is_open() {
    ("LOGIN", "Tab next field  Enter submit  Ctrl-R sign in / sign up  Esc cancel")
  } else if app.filter_active {
    ("SEARCH", "Type to filter  Esc clear  Enter done")
  } else {
    ("NORMAL", "↑↓/jk navigate  f toggle  r reload  o logout  / search  q quit")
  };

  let (text, color) = match &app.status {
    Some(n) => (n.message.clone(), level_color(n.level)),
    None => match app.board.load_status() {
      LoadStatus::Loading => ("Loading favorites…".to_string(), Color::DarkGray),
      _ => (hints.to_string(), Color::DarkGray),
    },
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let text_span = Span::styled(format!("  {text}"), Style::default().fg(color));

  f.render_widget(
    Paragraph::new(Line::from(vec![mode_span, text_span]))
      .style(Style::default().bg(Color::Black)),
    area,
  );
}

fn level_color(level: Level) -> Color {
  match level {
    Level::Success => Color::Green,
    Level::Info => Color::Gray,
    Level::Warning => Color::Yellow,
    Level::Error => Color::Red,
  }
}
