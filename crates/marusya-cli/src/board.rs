//! The favorites board: one [`FavoriteToggle`] per mounted movie, the shared
//! [`FavoritesSource`] and the [`AuthGate`], driven from a single thread.
//!
//! Network calls run on spawned tasks. Each task reports back exactly one
//! [`BoardEvent`] over an unbounded channel, and [`FavoritesBoard::pump`]
//! feeds those results into the state machines on the UI thread. Nothing
//! here ever blocks on the network.

use std::{
  collections::{HashMap, HashSet, VecDeque},
  future::Future,
  sync::Arc,
};

use marusya_core::{
  Error,
  gate::{AuthGate, GateRequest},
  movie::MovieId,
  notify::Notification,
  remote::{AuthService, FavoritesService},
  session::{Credentials, Identity, Registration},
  source::{FavoritesSource, LoadStatus, LoadTicket},
  toggle::{
    FavoriteAction, FavoriteToggle, MutationOutcome, MutationRequest, MutationTicket,
    ToggleCommand, ToggleView,
  },
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::session::SessionStore;

// ─── Events ──────────────────────────────────────────────────────────────────

/// The result of one background task.
#[derive(Debug)]
pub enum BoardEvent {
  MutationSettled {
    request: u64,
    ticket:  MutationTicket,
    outcome: MutationOutcome,
  },
  FavoritesLoaded {
    ticket: LoadTicket,
    result: Result<HashSet<MovieId>, String>,
  },
  LoginFinished {
    epoch:  u64,
    result: Result<Identity, String>,
  },
  SessionRestored {
    epoch:  u64,
    lookup: u64,
    result: Result<Option<Identity>, String>,
  },
  LogoutFinished {
    epoch:  u64,
    result: Result<(), String>,
  },
}

// ─── Board ───────────────────────────────────────────────────────────────────

pub struct FavoritesBoard<F, A> {
  favorites:       Arc<F>,
  auth:            Arc<A>,
  session:         SessionStore,
  session_rx:      watch::Receiver<Option<Identity>>,
  source:          FavoritesSource,
  toggles:         HashMap<MovieId, FavoriteToggle>,
  gate:            AuthGate,
  login_in_flight: bool,
  /// Request id of the mutation each movie is waiting on.
  in_flight:       HashMap<MovieId, u64>,
  next_request:    u64,
  /// Bumped by [`reload`](FavoritesBoard::reload); session events from an
  /// older epoch are dropped.
  epoch:           u64,
  /// Bumped whenever this board signs in or out by itself. A session lookup
  /// started before that answers for a session that no longer exists.
  session_lookup:  u64,
  events_tx:       mpsc::UnboundedSender<BoardEvent>,
  events_rx:       mpsc::UnboundedReceiver<BoardEvent>,
  outstanding:     usize,
  notifications:   VecDeque<Notification>,
}

impl<F, A> FavoritesBoard<F, A> {
  pub fn new(favorites: Arc<F>, auth: Arc<A>) -> Self {
    let session = SessionStore::new();
    let session_rx = session.subscribe();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    Self {
      favorites,
      auth,
      session,
      session_rx,
      source: FavoritesSource::new(),
      toggles: HashMap::new(),
      gate: AuthGate::default(),
      login_in_flight: false,
      in_flight: HashMap::new(),
      next_request: 0,
      epoch: 0,
      session_lookup: 0,
      events_tx,
      events_rx,
      outstanding: 0,
      notifications: VecDeque::new(),
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub fn identity(&self) -> Option<Identity> { self.session.current() }

  pub fn view(&self, movie: &MovieId) -> Option<ToggleView> {
    self.toggles.get(movie).map(FavoriteToggle::view)
  }

  pub fn gate(&self) -> &AuthGate { &self.gate }

  pub fn is_logging_in(&self) -> bool { self.login_in_flight }

  pub fn load_status(&self) -> LoadStatus { self.source.status() }

  /// `true` when no background task is outstanding.
  pub fn is_idle(&self) -> bool { self.outstanding == 0 }

  pub fn take_notifications(&mut self) -> Vec<Notification> {
    self.notifications.drain(..).collect()
  }
}

impl<F, A> FavoritesBoard<F, A>
where
  F: FavoritesService + 'static,
  A: AuthService + 'static,
{
  // ── Mounting ──────────────────────────────────────────────────────────────

  /// A movie became visible. Its flag comes from the source once a load
  /// has settled for the current session; until then it is not trusted.
  pub fn mount(&mut self, movie: MovieId) {
    if self.toggles.contains_key(&movie) {
      return;
    }
    let mut toggle = FavoriteToggle::mount(movie.clone());
    self.source.reconcile(&mut toggle);
    self.toggles.insert(movie, toggle);

    if let Some(ticket) = self.source.ensure_loaded() {
      self.spawn_load(ticket);
    }
  }

  /// A movie went out of view. Responses still on their way for it are
  /// discarded when they arrive.
  pub fn unmount(&mut self, movie: &MovieId) {
    self.toggles.remove(movie);
    self.in_flight.remove(movie);
  }

  // ── User actions ──────────────────────────────────────────────────────────

  pub fn click(&mut self, movie: &MovieId) {
    let identity = self.session.current();
    let Some(toggle) = self.toggles.get_mut(movie) else {
      return;
    };

    match toggle.on_toggle_clicked(identity.as_ref()) {
      ToggleCommand::Ignored => debug!(%movie, "click ignored"),
      ToggleCommand::OpenGate => {
        if self.gate.request(movie) == GateRequest::Opened {
          debug!(%movie, "auth gate opened");
        }
      }
      ToggleCommand::Mutate(request) => self.dispatch(request),
    }
  }

  /// Submit the gate's login form. Returns `false` if nothing was sent.
  pub fn submit_login(&mut self, credentials: Credentials) -> bool {
    if !self.gate.is_open() || self.login_in_flight {
      return false;
    }
    if !credentials.is_complete() {
      self.notify(Notification::credentials_required());
      return false;
    }

    self.login_in_flight = true;
    let auth = Arc::clone(&self.auth);
    let epoch = self.epoch;
    self.spawn(async move {
      let result = auth.login(&credentials).await.map_err(|e| e.to_string());
      BoardEvent::LoginFinished { epoch, result }
    });
    true
  }

  /// Submit the gate's sign-up form. On success the new account is signed
  /// in, which resolves the gate like a login. Returns `false` if nothing
  /// was sent.
  pub fn submit_registration(&mut self, registration: Registration) -> bool {
    if !self.gate.is_open() || self.login_in_flight {
      return false;
    }
    if let Some(problem) = registration.problem() {
      self.notify(Notification::registration_incomplete(problem));
      return false;
    }

    self.login_in_flight = true;
    let auth = Arc::clone(&self.auth);
    let epoch = self.epoch;
    self.spawn(async move {
      let result = match auth.register(&registration).await {
        Ok(()) => {
          info!(email = %registration.email.trim(), "registered");
          auth.login(&registration.credentials()).await
        }
        Err(e) => Err(e),
      };
      BoardEvent::LoginFinished {
        epoch,
        result: result.map_err(|e| e.to_string()),
      }
    });
    true
  }

  /// Dismiss the gate without signing in.
  pub fn cancel_gate(&mut self) {
    debug!("auth gate cancelled");
    self.resolve_gate(false);
  }

  pub fn logout(&mut self) {
    let auth = Arc::clone(&self.auth);
    let epoch = self.epoch;
    self.spawn(async move {
      let result = auth.logout().await.map_err(|e| e.to_string());
      BoardEvent::LogoutFinished { epoch, result }
    });
  }

  /// Ask the auth service who is signed in.
  pub fn restore_session(&mut self) {
    let auth = Arc::clone(&self.auth);
    let epoch = self.epoch;
    let lookup = self.session_lookup;
    self.spawn(async move {
      let result = auth.current_identity().await.map_err(|e| e.to_string());
      BoardEvent::SessionRestored { epoch, lookup, result }
    });
  }

  /// Throw away all client state and rebuild it from the services, the way
  /// a full page reload does.
  pub fn reload(&mut self) {
    info!("reloading");
    self.epoch += 1;
    self.in_flight.clear();
    self.gate = AuthGate::default();
    self.login_in_flight = false;
    self.source.reset();
    for (movie, toggle) in self.toggles.iter_mut() {
      *toggle = FavoriteToggle::mount(movie.clone());
    }
    self.session.sign_out();
    self.sync_session();
    self.restore_session();
  }

  // ── Event loop ────────────────────────────────────────────────────────────

  /// Apply every result that has arrived so far, without waiting. Returns
  /// `true` if anything changed.
  pub fn pump(&mut self) -> bool {
    let mut changed = false;
    while let Ok(event) = self.events_rx.try_recv() {
      self.handle(event);
      self.sync_session();
      changed = true;
    }
    changed
  }

  /// Wait until every background task has reported back.
  pub async fn run_until_idle(&mut self) {
    loop {
      self.sync_session();
      if self.outstanding == 0 {
        break;
      }
      let Some(event) = self.events_rx.recv().await else {
        break;
      };
      self.handle(event);
    }
  }

  fn handle(&mut self, event: BoardEvent) {
    self.outstanding = self.outstanding.saturating_sub(1);

    match event {
      BoardEvent::MutationSettled { request, ticket, outcome } => {
        if self.in_flight.get(&ticket.movie) != Some(&request) {
          debug!(movie = %ticket.movie, request, "discarded stale mutation response");
          // The write still landed; keep the shared list current.
          if outcome == MutationOutcome::Succeeded {
            self.refetch();
          }
          return;
        }
        self.in_flight.remove(&ticket.movie);
        self.settle(&ticket, outcome);
      }
      BoardEvent::FavoritesLoaded { ticket, result } => self.finish_load(&ticket, result),
      BoardEvent::LoginFinished { epoch, result } => {
        if epoch != self.epoch {
          debug!("discarded stale login response");
          return;
        }
        self.login_in_flight = false;
        match result {
          Ok(identity) => {
            info!(email = %identity.email, "signed in");
            self.session_lookup += 1;
            self.session.sign_in(identity);
            // The new identity must be in place before waiting actions run.
            self.sync_session();
            self.resolve_gate(true);
          }
          Err(reason) => {
            warn!(%reason, "login failed");
            self.notify(Notification::login_failed(reason));
          }
        }
      }
      BoardEvent::SessionRestored { epoch, lookup, result } => {
        if epoch != self.epoch || lookup != self.session_lookup {
          debug!("discarded stale session lookup");
          return;
        }
        match result {
          Ok(Some(identity)) => self.session.sign_in(identity),
          Ok(None) => self.session.sign_out(),
          Err(reason) => {
            warn!(%reason, "session lookup failed");
            self.notify(Notification::restore_failed());
          }
        }
      }
      BoardEvent::LogoutFinished { epoch, result } => {
        if epoch != self.epoch {
          return;
        }
        match result {
          Ok(()) => {
            info!("signed out");
            self.session_lookup += 1;
            self.session.sign_out();
          }
          Err(reason) => {
            warn!(%reason, "logout failed");
            self.notify(Notification::logout_failed());
          }
        }
      }
    }
  }

  /// Follow a session change, if one is pending.
  fn sync_session(&mut self) -> bool {
    if !self.session_rx.has_changed().unwrap_or(false) {
      return false;
    }
    let identity = self.session_rx.borrow_and_update().clone();
    debug!(signed_in = identity.is_some(), "session changed");

    for toggle in self.toggles.values_mut() {
      toggle.on_session_changed();
    }
    self.in_flight.clear();
    if let Some(ticket) = self.source.set_identity(identity) {
      self.spawn_load(ticket);
    }
    true
  }

  // ── Gate ──────────────────────────────────────────────────────────────────

  fn resolve_gate(&mut self, success: bool) {
    let Some(resolution) = self.gate.resolve(success) else {
      return;
    };
    debug!(success, waiting = resolution.waiting.len(), "auth gate resolved");

    let requests: Vec<MutationRequest> = resolution
      .waiting
      .iter()
      .filter_map(|movie| self.toggles.get_mut(movie)?.on_auth_gate_resolved(success))
      .collect();
    for request in requests {
      self.dispatch(request);
    }
  }

  // ── Mutations ─────────────────────────────────────────────────────────────

  fn dispatch(&mut self, request: MutationRequest) {
    let Some(identity) = self.session.current() else {
      // Nobody to write for: roll back quietly, the gate handles sign-in.
      debug!(movie = %request.movie(), "no session, mutation dropped");
      if let Some(toggle) = self.toggles.get_mut(request.movie()) {
        let _ = toggle.on_mutation_settled(
          &request.ticket,
          MutationOutcome::Failed(Error::Unauthenticated.to_string()),
        );
      }
      return;
    };

    let id = self.next_request;
    self.next_request += 1;
    self.in_flight.insert(request.movie().clone(), id);
    debug!(movie = %request.movie(), action = ?request.action, request = id, "sending mutation");

    let favorites = Arc::clone(&self.favorites);
    self.spawn(async move {
      let movie = request.movie();
      let result = match request.action {
        FavoriteAction::Add => favorites.add_favorite(&identity, movie).await,
        FavoriteAction::Remove => favorites.remove_favorite(&identity, movie).await,
      };
      let outcome = match result {
        Ok(()) => MutationOutcome::Succeeded,
        Err(e) => MutationOutcome::Failed(e.to_string()),
      };
      BoardEvent::MutationSettled {
        request: id,
        ticket: request.ticket,
        outcome,
      }
    });
  }

  fn settle(&mut self, ticket: &MutationTicket, outcome: MutationOutcome) {
    let Some(toggle) = self.toggles.get_mut(&ticket.movie) else {
      debug!(movie = %ticket.movie, "discarded response for unmounted movie");
      return;
    };

    let settlement = match toggle.on_mutation_settled(ticket, outcome) {
      Ok(settlement) => settlement,
      Err(e) => {
        debug!(movie = %ticket.movie, error = %e, "discarded mutation response");
        return;
      }
    };

    if let Err(e) = &settlement.result {
      warn!(error = %e, "favorite update failed");
    }
    self.notify(settlement.notification());
    if settlement.needs_refetch() {
      self.refetch();
    }
  }

  // ── Loads ─────────────────────────────────────────────────────────────────

  fn refetch(&mut self) {
    if let Some(ticket) = self.source.refetch() {
      self.spawn_load(ticket);
    }
  }

  fn spawn_load(&mut self, ticket: LoadTicket) {
    debug!(generation = ticket.generation, "loading favorites");
    let favorites = Arc::clone(&self.favorites);
    self.spawn(async move {
      let result = favorites
        .list_favorites(&ticket.identity)
        .await
        .map_err(|e| e.to_string());
      BoardEvent::FavoritesLoaded { ticket, result }
    });
  }

  fn finish_load(&mut self, ticket: &LoadTicket, result: Result<HashSet<MovieId>, String>) {
    match self.source.finish_load(ticket, result) {
      Ok(()) => {
        for toggle in self.toggles.values_mut() {
          self.source.reconcile(toggle);
        }
      }
      Err(Error::StaleCallback) => {
        debug!(generation = ticket.generation, "discarded stale favorites list");
      }
      Err(e) => {
        warn!(error = %e, "favorites load failed");
        self.notify(Notification::load_failed());
      }
    }
  }

  // ── Plumbing ──────────────────────────────────────────────────────────────

  fn spawn(&mut self, task: impl Future<Output = BoardEvent> + Send + 'static) {
    self.outstanding += 1;
    let events = self.events_tx.clone();
    tokio::spawn(async move {
      // The receiver lives as long as the board; a failed send means the
      // board is gone and nobody is interested.
      let _ = events.send(task.await);
    });
  }

  fn notify(&mut self, notification: Notification) {
    self.notifications.push_back(notification);
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use marusya_core::notify::Level;
  use tokio::sync::Notify;
  use uuid::Uuid;

  use super::*;

  // ── Fakes ────────────────────────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  #[error("{0}")]
  struct FakeError(String);

  #[derive(Default)]
  struct FakeFavorites {
    lists:       Mutex<HashMap<Uuid, HashSet<MovieId>>>,
    calls:       Mutex<Vec<(FavoriteAction, MovieId)>>,
    loads:       Mutex<usize>,
    fail_writes: Mutex<bool>,
    fail_loads:  Mutex<bool>,
  }

  impl FakeFavorites {
    fn calls(&self) -> Vec<(FavoriteAction, MovieId)> { self.calls.lock().unwrap().clone() }

    fn contains(&self, identity: &Identity, movie: &str) -> bool {
      self
        .lists
        .lock()
        .unwrap()
        .get(&identity.user_id)
        .is_some_and(|list| list.contains(&MovieId::from(movie)))
    }

    fn seed(&self, identity: &Identity, movie: &str) {
      self
        .lists
        .lock()
        .unwrap()
        .entry(identity.user_id)
        .or_default()
        .insert(MovieId::from(movie));
    }

    fn write(&self, identity: &Identity, action: FavoriteAction, movie: &MovieId) -> Result<(), FakeError> {
      self.calls.lock().unwrap().push((action, movie.clone()));
      if *self.fail_writes.lock().unwrap() {
        return Err(FakeError("500 Internal Server Error".into()));
      }
      let mut lists = self.lists.lock().unwrap();
      let list = lists.entry(identity.user_id).or_default();
      match action {
        FavoriteAction::Add => list.insert(movie.clone()),
        FavoriteAction::Remove => list.remove(movie),
      };
      Ok(())
    }
  }

  impl FavoritesService for FakeFavorites {
    type Error = FakeError;

    async fn list_favorites(&self, identity: &Identity) -> Result<HashSet<MovieId>, FakeError> {
      *self.loads.lock().unwrap() += 1;
      if *self.fail_loads.lock().unwrap() {
        return Err(FakeError("503 Service Unavailable".into()));
      }
      Ok(
        self
          .lists
          .lock()
          .unwrap()
          .get(&identity.user_id)
          .cloned()
          .unwrap_or_default(),
      )
    }

    async fn add_favorite(&self, identity: &Identity, movie: &MovieId) -> Result<(), FakeError> {
      self.write(identity, FavoriteAction::Add, movie)
    }

    async fn remove_favorite(&self, identity: &Identity, movie: &MovieId) -> Result<(), FakeError> {
      self.write(identity, FavoriteAction::Remove, movie)
    }
  }

  struct FakeAuth {
    account:        (Credentials, Identity),
    current:        Mutex<Option<Identity>>,
    registered:     Mutex<Vec<(Credentials, Identity)>>,
    /// While set, session lookups wait for `release_lookup` before
    /// answering with what they saw when they started.
    hold_lookups:   Mutex<bool>,
    release_lookup: Notify,
  }

  impl FakeAuth {
    fn new() -> Self {
      let credentials = Credentials {
        email:    "viewer@example.com".into(),
        password: "secret".into(),
      };
      let identity = Identity {
        user_id: Uuid::new_v4(),
        email:   credentials.email.clone(),
      };
      Self {
        account:        (credentials, identity),
        current:        Mutex::new(None),
        registered:     Mutex::new(Vec::new()),
        hold_lookups:   Mutex::new(false),
        release_lookup: Notify::new(),
      }
    }

    fn identity(&self) -> Identity { self.account.1.clone() }

    fn credentials(&self) -> Credentials { self.account.0.clone() }
  }

  impl AuthService for FakeAuth {
    type Error = FakeError;

    async fn login(&self, credentials: &Credentials) -> Result<Identity, FakeError> {
      let identity = if *credentials == self.account.0 {
        self.identity()
      } else {
        self
          .registered
          .lock()
          .unwrap()
          .iter()
          .find(|(known, _)| known == credentials)
          .map(|(_, identity)| identity.clone())
          .ok_or_else(|| FakeError("Invalid email or password".into()))?
      };
      *self.current.lock().unwrap() = Some(identity.clone());
      Ok(identity)
    }

    async fn register(&self, registration: &Registration) -> Result<(), FakeError> {
      let credentials = registration.credentials();
      let mut registered = self.registered.lock().unwrap();
      if credentials.email == self.account.0.email
        || registered.iter().any(|(known, _)| known.email == credentials.email)
      {
        return Err(FakeError("User already exists".into()));
      }
      let identity = Identity {
        user_id: Uuid::new_v4(),
        email:   credentials.email.clone(),
      };
      registered.push((credentials, identity));
      Ok(())
    }

    async fn current_identity(&self) -> Result<Option<Identity>, FakeError> {
      let answer = self.current.lock().unwrap().clone();
      let hold = *self.hold_lookups.lock().unwrap();
      if hold {
        self.release_lookup.notified().await;
      }
      Ok(answer)
    }

    async fn logout(&self) -> Result<(), FakeError> {
      *self.current.lock().unwrap() = None;
      Ok(())
    }
  }

  // ── Helpers ──────────────────────────────────────────────────────────────────

  struct Harness {
    board:     FavoritesBoard<FakeFavorites, FakeAuth>,
    favorites: Arc<FakeFavorites>,
    auth:      Arc<FakeAuth>,
  }

  impl Harness {
    fn new() -> Self {
      let favorites = Arc::new(FakeFavorites::default());
      let auth = Arc::new(FakeAuth::new());
      let board = FavoritesBoard::new(Arc::clone(&favorites), Arc::clone(&auth));
      Self { board, favorites, auth }
    }

    /// A board whose server-side session already exists, restored and loaded.
    async fn signed_in() -> Self {
      let mut h = Self::new();
      *h.auth.current.lock().unwrap() = Some(h.auth.identity());
      h.board.mount(m1());
      h.board.restore_session();
      h.board.run_until_idle().await;
      h
    }

    fn view(&self) -> ToggleView { self.board.view(&m1()).unwrap() }

    fn messages(&mut self) -> Vec<String> {
      self
        .board
        .take_notifications()
        .into_iter()
        .map(|n| n.message)
        .collect()
    }
  }

  fn m1() -> MovieId { MovieId::from("M1") }

  fn registration(email: &str) -> Registration {
    Registration {
      email:            email.into(),
      name:             "Ann".into(),
      surname:          "Lee".into(),
      password:         "hunter2".into(),
      confirm_password: "hunter2".into(),
    }
  }

  /// Pump until only `remaining` tasks are still out.
  async fn settle_until(board: &mut FavoritesBoard<FakeFavorites, FakeAuth>, remaining: usize) {
    while board.outstanding > remaining {
      tokio::task::yield_now().await;
      board.pump();
    }
  }

  // ── Signed in ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn click_adds_and_notifies() {
    let mut h = Harness::signed_in().await;
    assert!(h.view().settled);
    assert!(!h.view().favorite);

    h.board.click(&m1());
    assert!(h.view().favorite);
    assert!(h.view().busy);

    h.board.run_until_idle().await;
    assert!(h.view().favorite);
    assert!(!h.view().busy);
    assert!(h.favorites.contains(&h.auth.identity(), "M1"));
    assert_eq!(h.messages(), vec!["Movie added to favorites"]);
  }

  #[tokio::test]
  async fn clicks_while_busy_are_dropped() {
    let mut h = Harness::signed_in().await;
    h.board.click(&m1());
    h.board.click(&m1());
    h.board.click(&m1());
    h.board.run_until_idle().await;

    assert_eq!(h.favorites.calls(), vec![(FavoriteAction::Add, m1())]);
    assert!(h.view().favorite);
  }

  #[tokio::test]
  async fn flag_tracks_server_across_clicks() {
    let mut h = Harness::signed_in().await;
    for _ in 0..4 {
      h.board.click(&m1());
      h.board.run_until_idle().await;
      assert_eq!(h.view().favorite, h.favorites.contains(&h.auth.identity(), "M1"));
    }
    assert_eq!(h.favorites.calls().len(), 4);
  }

  #[tokio::test]
  async fn failed_write_rolls_back() {
    let mut h = Harness::signed_in().await;
    *h.favorites.fail_writes.lock().unwrap() = true;

    h.board.click(&m1());
    assert!(h.view().favorite);
    h.board.run_until_idle().await;

    assert!(!h.view().favorite);
    assert!(!h.view().busy);
    let notes = h.board.take_notifications();
    assert_eq!(notes, vec![Notification::update_failed()]);
    assert_eq!(notes[0].level, Level::Error);
  }

  #[tokio::test]
  async fn stored_favorite_shows_after_load() {
    let mut h = Harness::new();
    let me = h.auth.identity();
    h.favorites.seed(&me, "M1");
    *h.auth.current.lock().unwrap() = Some(me);

    h.board.mount(m1());
    assert!(!h.view().settled);
    h.board.restore_session();
    h.board.run_until_idle().await;

    assert!(h.view().favorite);
    assert!(h.view().settled);
  }

  #[tokio::test]
  async fn failed_load_leaves_flag_and_warns() {
    let mut h = Harness::new();
    *h.favorites.fail_loads.lock().unwrap() = true;
    *h.auth.current.lock().unwrap() = Some(h.auth.identity());

    h.board.mount(m1());
    h.board.restore_session();
    h.board.run_until_idle().await;

    assert!(!h.view().settled);
    assert_eq!(h.board.load_status(), LoadStatus::Failed);
    assert_eq!(h.messages(), vec!["Could not load favorites"]);
  }

  // ── Auth gate ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn signed_out_click_opens_gate_without_request() {
    let mut h = Harness::new();
    h.board.mount(m1());
    h.board.click(&m1());

    assert!(h.board.gate().is_open());
    assert!(h.board.is_idle());
    assert!(!h.view().favorite);

    h.board.click(&m1());
    assert_eq!(h.board.gate().waiting(), &[m1()]);
  }

  #[tokio::test]
  async fn cancelled_gate_sends_nothing() {
    let mut h = Harness::new();
    h.board.mount(m1());
    h.board.click(&m1());
    h.board.cancel_gate();
    h.board.run_until_idle().await;

    assert!(!h.board.gate().is_open());
    assert!(!h.view().favorite);
    assert!(h.favorites.calls().is_empty());
    assert_eq!(*h.favorites.loads.lock().unwrap(), 0);
  }

  #[tokio::test]
  async fn login_through_gate_adds_exactly_once() {
    let mut h = Harness::new();
    h.board.mount(m1());
    h.board.click(&m1());

    assert!(h.board.submit_login(h.auth.credentials()));
    assert!(!h.board.submit_login(h.auth.credentials()));
    h.board.run_until_idle().await;

    assert_eq!(h.board.identity(), Some(h.auth.identity()));
    assert!(!h.board.gate().is_open());
    assert_eq!(h.favorites.calls(), vec![(FavoriteAction::Add, m1())]);
    assert!(h.view().favorite);
    assert!(h.view().settled);
    assert!(!h.view().busy);
  }

  #[tokio::test]
  async fn gate_resumes_every_waiting_movie() {
    let mut h = Harness::new();
    let m2 = MovieId::from("M2");
    h.board.mount(m1());
    h.board.mount(m2.clone());
    h.board.click(&m1());
    h.board.click(&m2);

    h.board.submit_login(h.auth.credentials());
    h.board.run_until_idle().await;

    let mut calls = h.favorites.calls();
    calls.sort_by(|a, b| a.1.cmp(&b.1));
    assert_eq!(calls, vec![(FavoriteAction::Add, m1()), (FavoriteAction::Add, m2.clone())]);
    assert!(h.board.view(&m2).unwrap().favorite);
  }

  #[tokio::test]
  async fn wrong_password_keeps_gate_open() {
    let mut h = Harness::new();
    h.board.mount(m1());
    h.board.click(&m1());

    let mut credentials = h.auth.credentials();
    credentials.password = "nope".into();
    h.board.submit_login(credentials);
    h.board.run_until_idle().await;

    assert!(h.board.gate().is_open());
    assert_eq!(h.board.identity(), None);
    assert_eq!(h.messages(), vec!["Invalid email or password"]);
    assert!(h.favorites.calls().is_empty());

    h.board.submit_login(h.auth.credentials());
    h.board.run_until_idle().await;
    assert_eq!(h.favorites.calls().len(), 1);
  }

  #[tokio::test]
  async fn blank_credentials_are_not_submitted() {
    let mut h = Harness::new();
    h.board.mount(m1());
    h.board.click(&m1());

    assert!(!h.board.submit_login(Credentials::default()));
    assert!(h.board.is_idle());
    assert_eq!(h.board.take_notifications(), vec![Notification::credentials_required()]);
  }

  #[tokio::test]
  async fn registration_through_gate_adds_exactly_once() {
    let mut h = Harness::new();
    h.board.mount(m1());
    h.board.click(&m1());

    assert!(h.board.submit_registration(registration("new@example.com")));
    assert!(!h.board.submit_registration(registration("new@example.com")));
    h.board.run_until_idle().await;

    let me = h.board.identity().expect("signed in after sign-up");
    assert_eq!(me.email, "new@example.com");
    assert!(!h.board.gate().is_open());
    assert_eq!(h.favorites.calls(), vec![(FavoriteAction::Add, m1())]);
    assert!(h.favorites.contains(&me, "M1"));
    assert!(h.view().favorite && h.view().settled && !h.view().busy);
  }

  #[tokio::test]
  async fn taken_email_keeps_gate_open() {
    let mut h = Harness::new();
    h.board.mount(m1());
    h.board.click(&m1());

    h.board.submit_registration(registration("viewer@example.com"));
    h.board.run_until_idle().await;

    assert!(h.board.gate().is_open());
    assert_eq!(h.board.identity(), None);
    assert_eq!(h.messages(), vec!["User already exists"]);
    assert!(h.favorites.calls().is_empty());
  }

  #[tokio::test]
  async fn invalid_registration_is_not_submitted() {
    let mut h = Harness::new();
    h.board.mount(m1());
    h.board.click(&m1());

    let mut form = registration("new@example.com");
    form.confirm_password = "hunter3".into();
    assert!(!h.board.submit_registration(form));
    assert!(h.board.is_idle());
    assert_eq!(
      h.board.take_notifications(),
      vec![Notification::registration_incomplete("Passwords do not match")]
    );
    assert!(h.auth.registered.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn resumed_action_without_session_rolls_back_quietly() {
    let mut h = Harness::new();
    h.board.mount(m1());
    h.board.click(&m1());

    // Resolve the gate as if a login had succeeded, with no identity set.
    h.board.resolve_gate(true);
    h.board.run_until_idle().await;

    assert!(!h.board.gate().is_open());
    assert!(!h.view().favorite);
    assert!(!h.view().busy);
    assert!(h.favorites.calls().is_empty());
    assert!(h.messages().is_empty());
  }

  // ── Session changes ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn late_session_lookup_does_not_undo_login() {
    let mut h = Harness::new();
    *h.auth.hold_lookups.lock().unwrap() = true;
    h.board.mount(m1());
    h.board.restore_session();
    h.board.click(&m1());
    h.board.submit_login(h.auth.credentials());

    // Everything but the held lookup finishes.
    settle_until(&mut h.board, 1).await;
    assert_eq!(h.board.identity(), Some(h.auth.identity()));
    assert!(h.view().favorite && h.view().settled);

    // The lookup started while signed out now answers "nobody".
    h.auth.release_lookup.notify_one();
    h.board.run_until_idle().await;

    assert_eq!(h.board.identity(), Some(h.auth.identity()));
    let view = h.view();
    assert!(view.favorite && view.settled && !view.busy);
    assert_eq!(h.favorites.calls(), vec![(FavoriteAction::Add, m1())]);
  }

  #[tokio::test]
  async fn late_session_lookup_does_not_undo_logout() {
    let mut h = Harness::signed_in().await;
    *h.auth.hold_lookups.lock().unwrap() = true;
    h.board.restore_session();
    h.board.logout();

    settle_until(&mut h.board, 1).await;
    assert_eq!(h.board.identity(), None);

    h.auth.release_lookup.notify_one();
    h.board.run_until_idle().await;
    assert_eq!(h.board.identity(), None);
  }

  #[tokio::test]
  async fn reload_restores_favorite_without_click() {
    let mut h = Harness::new();
    h.board.mount(m1());
    h.board.click(&m1());
    h.board.submit_login(h.auth.credentials());
    h.board.run_until_idle().await;

    for _ in 0..2 {
      h.board.reload();
      assert!(!h.view().settled);
      h.board.run_until_idle().await;
      assert!(h.view().favorite);
      assert!(h.view().settled);
    }
    assert_eq!(h.favorites.calls().len(), 1);
  }

  #[tokio::test]
  async fn logout_clears_flags() {
    let mut h = Harness::new();
    let me = h.auth.identity();
    h.favorites.seed(&me, "M1");
    *h.auth.current.lock().unwrap() = Some(me);
    h.board.mount(m1());
    h.board.restore_session();
    h.board.run_until_idle().await;
    assert!(h.view().favorite);

    h.board.logout();
    h.board.run_until_idle().await;
    assert_eq!(h.board.identity(), None);
    assert!(!h.view().favorite);
    assert!(!h.view().settled);
    assert_eq!(h.board.load_status(), LoadStatus::Idle);
  }

  #[tokio::test]
  async fn response_after_reload_is_discarded() {
    let mut h = Harness::signed_in().await;
    h.board.click(&m1());
    h.board.reload();
    h.board.run_until_idle().await;

    // The add went through on the server, so the reloaded list shows it,
    // but the old response produced no toast.
    assert!(h.view().favorite);
    assert!(h.messages().is_empty());
  }

  #[tokio::test]
  async fn unmounted_movie_ignores_late_response() {
    let mut h = Harness::signed_in().await;
    h.board.click(&m1());
    h.board.unmount(&m1());
    h.board.run_until_idle().await;
    assert!(h.board.view(&m1()).is_none());
    assert!(h.messages().is_empty());

    h.board.mount(m1());
    h.board.run_until_idle().await;
    assert!(h.view().favorite);
  }
}
