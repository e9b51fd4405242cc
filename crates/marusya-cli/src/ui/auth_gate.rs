//! The login / sign-up modal shown while the auth gate is open.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::{App, GateField, GateMode};

/// A `width` x `height` rectangle centred in `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  Rect {
    x: area.x + (area.width - width) / 2,
    y: area.y + (area.height - height) / 2,
    width,
    height,
  }
}

fn field_line(label: &str, value: String, focused: bool) -> Line<'static> {
  let style = if focused {
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
  } else {
    Style::default().fg(Color::Gray)
  };
  let cursor = if focused { "_" } else { "" };
  Line::from(vec![
    Span::styled(format!("{label:>10}: "), Style::default().fg(Color::DarkGray)),
    Span::styled(format!("{value}{cursor}"), style),
  ])
}

fn label(field: GateField) -> &'static str {
  match field {
    GateField::Email => "Email",
    GateField::Name => "First name",
    GateField::Surname => "Last name",
    GateField::Password => "Password",
    GateField::ConfirmPassword => "Confirm",
  }
}

pub fn draw<F, A>(f: &mut Frame, area: Rect, app: &App<F, A>) {
  let form = &app.gate_form;
  let fields = form.mode.fields();
  let (title, busy, switch) = match form.mode {
    GateMode::Login => (" Sign in to save favorites ", "Signing in…", "Ctrl-R register"),
    GateMode::Register => (" Create an account ", "Creating account…", "Ctrl-R sign in"),
  };
  let modal = centered(area, 52, fields.len() as u16 + 7);

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let inner = block.inner(modal);
  f.render_widget(Clear, modal);
  f.render_widget(block, modal);

  let mut constraints = vec![Constraint::Length(1); fields.len()];
  constraints.extend([
    Constraint::Length(1),
    Constraint::Length(1), // error / progress
    Constraint::Length(1), // hint
    Constraint::Min(0),
  ]);
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints(constraints)
    .split(inner);

  for (row, &field) in fields.iter().enumerate() {
    let value = form.value(field);
    let shown = match field {
      GateField::Password | GateField::ConfirmPassword => "•".repeat(value.chars().count()),
      _ => value.to_owned(),
    };
    f.render_widget(
      Paragraph::new(field_line(label(field), shown, form.field == field)),
      rows[row],
    );
  }

  let message = if app.board.is_logging_in() {
    Span::styled(busy, Style::default().fg(Color::Yellow))
  } else if let Some(error) = &form.error {
    Span::styled(error.clone(), Style::default().fg(Color::Red))
  } else {
    Span::raw("")
  };
  f.render_widget(Paragraph::new(Line::from(message)), rows[fields.len() + 1]);

  let hint = format!("Enter submits, {switch}, Esc cancels");
  f.render_widget(
    Paragraph::new(Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray)))),
    rows[fields.len() + 2],
  );
}
