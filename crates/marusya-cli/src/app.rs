//! Application state and key dispatch.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use marusya_core::{
  movie::Movie,
  notify::{Level, Notification},
  remote::{AuthService, FavoritesService},
  session::{Credentials, Registration},
};

use crate::board::FavoritesBoard;

// ─── Gate form ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateMode {
  #[default]
  Login,
  Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateField {
  #[default]
  Email,
  Name,
  Surname,
  Password,
  ConfirmPassword,
}

impl GateMode {
  /// Fields shown in this mode, top to bottom.
  pub fn fields(self) -> &'static [GateField] {
    match self {
      Self::Login => &[GateField::Email, GateField::Password],
      Self::Register => &[
        GateField::Email,
        GateField::Name,
        GateField::Surname,
        GateField::Password,
        GateField::ConfirmPassword,
      ],
    }
  }
}

/// Contents of the login / sign-up modal.
#[derive(Debug, Default)]
pub struct GateForm {
  pub mode:             GateMode,
  pub email:            String,
  pub name:             String,
  pub surname:          String,
  pub password:         String,
  pub confirm_password: String,
  pub field:            GateField,
  /// Last failure, shown inside the modal.
  pub error:            Option<String>,
}

impl GateForm {
  pub fn value(&self, field: GateField) -> &str {
    match field {
      GateField::Email => &self.email,
      GateField::Name => &self.name,
      GateField::Surname => &self.surname,
      GateField::Password => &self.password,
      GateField::ConfirmPassword => &self.confirm_password,
    }
  }

  fn focused(&mut self) -> &mut String {
    match self.field {
      GateField::Email => &mut self.email,
      GateField::Name => &mut self.name,
      GateField::Surname => &mut self.surname,
      GateField::Password => &mut self.password,
      GateField::ConfirmPassword => &mut self.confirm_password,
    }
  }

  fn position(&self) -> usize {
    self.mode.fields().iter().position(|f| *f == self.field).unwrap_or(0)
  }

  fn is_last_field(&self) -> bool { self.position() + 1 == self.mode.fields().len() }

  fn move_field(&mut self, forward: bool) {
    let fields = self.mode.fields();
    let pos = self.position();
    let next = if forward { pos + 1 } else { pos + fields.len() - 1 };
    self.field = fields[next % fields.len()];
  }

  /// Flip between signing in and signing up, keeping the email.
  fn switch_mode(&mut self) {
    *self = GateForm {
      mode: match self.mode {
        GateMode::Login => GateMode::Register,
        GateMode::Register => GateMode::Login,
      },
      email: std::mem::take(&mut self.email),
      ..GateForm::default()
    };
  }

  fn credentials(&self) -> Credentials {
    Credentials {
      email:    self.email.trim().to_owned(),
      password: self.password.clone(),
    }
  }

  fn registration(&self) -> Registration {
    Registration {
      email:            self.email.clone(),
      name:             self.name.clone(),
      surname:          self.surname.clone(),
      password:         self.password.clone(),
      confirm_password: self.confirm_password.clone(),
    }
  }
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App<F, A> {
  pub board: FavoritesBoard<F, A>,

  /// Every movie given on the command line or in the config file.
  pub movies: Vec<Movie>,

  /// Current fuzzy-filter string.
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Cursor position within the *filtered* movie list.
  pub list_cursor: usize,

  pub gate_form: GateForm,

  /// Most recent notification, shown in the status bar.
  pub status: Option<Notification>,
}

impl<F, A> App<F, A> {
  /// Movies that match the current filter query.
  pub fn filtered_movies(&self) -> Vec<&Movie> {
    if self.filter.is_empty() {
      return self.movies.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .movies
      .iter()
      .filter(|m| {
        matcher.fuzzy_match(m.label(), &self.filter).is_some()
          || matcher.fuzzy_match(m.id.as_str(), &self.filter).is_some()
      })
      .collect()
  }

  pub fn cursor_movie(&self) -> Option<&Movie> {
    self.filtered_movies().get(self.list_cursor).copied()
  }
}

impl<F, A> App<F, A>
where
  F: FavoritesService + 'static,
  A: AuthService + 'static,
{
  pub fn new(board: FavoritesBoard<F, A>, movies: Vec<Movie>) -> Self {
    let mut app = Self {
      board,
      movies,
      filter: String::new(),
      filter_active: false,
      list_cursor: 0,
      gate_form: GateForm::default(),
      status: None,
    };
    app.sync_mounts();
    app
  }

  // ── Mounting ──────────────────────────────────────────────────────────────

  /// Mount the movies currently shown and unmount the rest.
  fn sync_mounts(&mut self) {
    let visible: Vec<_> = self.filtered_movies().iter().map(|m| m.id.clone()).collect();
    for movie in &self.movies {
      if !visible.contains(&movie.id) {
        self.board.unmount(&movie.id);
      }
    }
    for id in visible {
      self.board.mount(id);
    }
  }

  // ── Background results ────────────────────────────────────────────────────

  /// Apply finished background work. Called once per frame.
  pub fn tick(&mut self) {
    self.board.pump();

    let gate_open = self.board.gate().is_open();
    for notification in self.board.take_notifications() {
      if gate_open && matches!(notification.level, Level::Error | Level::Warning) {
        self.gate_form.error = Some(notification.message.clone());
      }
      self.status = Some(notification);
    }
    if !gate_open {
      self.gate_form = GateForm {
        email: std::mem::take(&mut self.gate_form.email),
        ..GateForm::default()
      };
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    if self.board.gate().is_open() {
      self.handle_gate_key(key);
      return true;
    }
    if self.filter_active {
      self.handle_filter_key(key);
      return true;
    }
    self.handle_list_key(key)
  }

  fn handle_gate_key(&mut self, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
      if key.code == KeyCode::Char('r') && !self.board.is_logging_in() {
        self.gate_form.switch_mode();
      }
      return;
    }

    match key.code {
      KeyCode::Esc => self.board.cancel_gate(),
      KeyCode::Tab | KeyCode::Down => self.gate_form.move_field(true),
      KeyCode::BackTab | KeyCode::Up => self.gate_form.move_field(false),
      KeyCode::Enter if !self.gate_form.is_last_field() => self.gate_form.move_field(true),
      KeyCode::Enter => {
        self.gate_form.error = None;
        match self.gate_form.mode {
          GateMode::Login => self.board.submit_login(self.gate_form.credentials()),
          GateMode::Register => self.board.submit_registration(self.gate_form.registration()),
        };
      }
      KeyCode::Backspace => {
        self.gate_form.focused().pop();
      }
      KeyCode::Char(c) => self.gate_form.focused().push(c),
      _ => {}
    }
  }

  fn handle_filter_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
      }
      KeyCode::Enter => self.filter_active = false,
      KeyCode::Backspace => {
        self.filter.pop();
      }
      KeyCode::Char(c) => self.filter.push(c),
      _ => return,
    }
    self.list_cursor = 0;
    self.sync_mounts();
  }

  fn handle_list_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return false,

      // Navigation
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.filtered_movies().len();
        if self.list_cursor + 1 < len {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.list_cursor = self.list_cursor.saturating_sub(1);
      }

      // Favorites
      KeyCode::Char('f') | KeyCode::Char(' ') | KeyCode::Enter => {
        if let Some(id) = self.cursor_movie().map(|m| m.id.clone()) {
          self.board.click(&id);
        }
      }

      // Session
      KeyCode::Char('r') => {
        self.status = Some(Notification::new(Level::Info, "Reloading…"));
        self.board.reload();
      }
      KeyCode::Char('o') => self.board.logout(),

      // Filter
      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.list_cursor = 0;
      }
      _ => {}
    }
    true
  }
}
