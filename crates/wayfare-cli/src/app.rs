//! Application state machine and event dispatcher.
//!
//! [`App`] is the list-travel view-model: it owns the reactive state slots
//! (travel list, selected travel, participant-profile cache, loading flag),
//! forwards intents to the store, and merges results back into state.
//! Failed calls leave the previous state untouched; successful mutations
//! re-load the list from the store instead of patching it locally.

use std::{
  collections::{BTreeSet, HashMap},
  sync::Arc,
};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use futures::future::join_all;
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use wayfare_core::{
  notification::Notification,
  participant::Role,
  profile::Profile,
  session::Session,
  store::{NotificationStore, TravelStore, UpdateMode},
  travel::Travel,
  uid::Uid,
};

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
  /// Focus on the travel list; right pane is empty or shows a preview.
  TravelList,
  /// Focus on the travel detail pane.
  TravelDetail,
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App<S> {
  /// Current screen / keyboard focus.
  pub screen: Screen,

  /// The signed-in user's session.
  pub session: Session,

  /// All travels the current user participates in.
  pub travels: Vec<Travel>,

  /// UUID-less uid of the currently-selected travel (detail pane).
  pub selected: Option<Uid>,

  /// Cached participant profiles, keyed by participant uid.
  pub profiles: HashMap<Uid, Profile>,

  /// The current user's notification inbox, newest first.
  pub notifications: Vec<Notification>,

  /// Whether a list load is in flight.
  pub loading: bool,

  /// Current fuzzy-filter string (only active when `filter_active`).
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Email being typed for the add-member flow.
  pub invite: String,

  /// Whether the user is typing an invite email.
  pub invite_active: bool,

  /// Cursor position within the *filtered* travel list.
  pub list_cursor: usize,

  /// Scroll offset within the detail pane.
  pub detail_scroll: usize,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// Shared store handle.
  pub store: Arc<S>,

  /// Memo key of the last participant fan-out: (travel identity,
  /// participant set). Profiles are only re-fetched when either changes.
  fetched_for: Option<(Uid, BTreeSet<Uid>)>,
}

impl<S> App<S> {
  /// Create an [`App`] with an empty travel list.
  pub fn new(store: Arc<S>, session: Session) -> Self {
    Self {
      screen: Screen::TravelList,
      session,
      travels: Vec::new(),
      selected: None,
      profiles: HashMap::new(),
      notifications: Vec::new(),
      loading: false,
      filter: String::new(),
      filter_active: false,
      invite: String::new(),
      invite_active: false,
      list_cursor: 0,
      detail_scroll: 0,
      status_msg: String::new(),
      store,
      fetched_for: None,
    }
  }

  /// The selected travel, looked up in the current list.
  pub fn selected_travel(&self) -> Option<&Travel> {
    let selected = self.selected.as_ref()?;
    self.travels.iter().find(|t| t.uid() == selected)
  }

  /// Returns travels that match the current filter query.
  pub fn filtered_travels(&self) -> Vec<&Travel> {
    if self.filter.is_empty() {
      return self.travels.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .travels
      .iter()
      .filter(|t| {
        matcher.fuzzy_match(t.title(), &self.filter).is_some()
          || matcher
            .fuzzy_match(t.location().name(), &self.filter)
            .is_some()
      })
      .collect()
  }

  /// The travel under the list cursor in the filtered view, if any.
  pub fn cursor_travel(&self) -> Option<&Travel> {
    let list = self.filtered_travels();
    list.get(self.list_cursor).copied()
  }

  pub fn unread_count(&self) -> usize {
    self.notifications.iter().filter(|n| !n.read).count()
  }
}

// ─── Travel intents ───────────────────────────────────────────────────────────

impl<S: TravelStore> App<S> {
  /// Fetch the current user's travels and replace the list state.
  ///
  /// On failure the previous list is left untouched (stale-on-error) and
  /// the error lands in the status line. No partial or optimistic update.
  pub async fn load_travels(&mut self) {
    let Some(user) = self.session.current_user() else {
      self.status_msg = "Not signed in".into();
      return;
    };
    self.loading = true;
    match self.store.travels_for_user(&user).await {
      Ok(travels) => {
        self.travels = travels;
        if self.list_cursor >= self.travels.len() {
          self.list_cursor = 0;
        }
        self.status_msg.clear();
      }
      Err(e) => {
        tracing::warn!(error = %e, "loading travels failed");
        self.status_msg = format!("Error: {e}");
      }
    }
    self.loading = false;
  }

  /// Create a travel, then re-load the list from the store.
  pub async fn create_travel(&mut self, travel: Travel) {
    match self.store.add_travel(&travel).await {
      Ok(()) => {
        self.status_msg.clear();
        self.load_travels().await;
      }
      Err(e) => {
        tracing::warn!(error = %e, "creating travel failed");
        self.status_msg = format!("Error: {e}");
      }
    }
  }

  /// Overwrite a travel's fields, then re-load the list from the store.
  pub async fn save_travel(&mut self, travel: Travel) {
    match self
      .store
      .update_travel(&travel, UpdateMode::FieldsUpdate)
      .await
    {
      Ok(()) => {
        self.status_msg.clear();
        self.load_travels().await;
      }
      Err(e) => {
        tracing::warn!(error = %e, "saving travel failed");
        self.status_msg = format!("Error: {e}");
      }
    }
  }

  /// Delete a travel, then re-load the list from the store.
  pub async fn delete_travel(&mut self, id: &Uid) {
    match self.store.delete_travel(id).await {
      Ok(()) => {
        if self.selected.as_ref() == Some(id) {
          self.selected = None;
          self.screen = Screen::TravelList;
        }
        self.status_msg.clear();
        self.load_travels().await;
      }
      Err(e) => {
        tracing::warn!(error = %e, "deleting travel failed");
        self.status_msg = format!("Error: {e}");
      }
    }
  }

  /// Fetch the selected travel's participant profiles into the cache.
  ///
  /// Memoised against (travel identity, participant set): only re-fetches
  /// when either changes. Fetches run concurrently, one per participant;
  /// each result merges into the cache independently, with no ordering
  /// guarantee between them.
  pub async fn fetch_participants(&mut self) {
    let Some(key) = self.selected_travel().map(|t| {
      (
        t.uid().clone(),
        t.participant_uids().into_iter().collect::<BTreeSet<_>>(),
      )
    }) else {
      return;
    };
    if self.fetched_for.as_ref() == Some(&key) {
      return;
    }

    let fetches = key.1.iter().map(|member| {
      let store = Arc::clone(&self.store);
      let member = member.clone();
      async move {
        let result = store.get_profile(&member).await;
        (member, result)
      }
    });

    for (member, result) in join_all(fetches).await {
      match result {
        Ok(Some(profile)) => {
          self.profiles.insert(member, profile);
        }
        Ok(None) => {}
        Err(e) => {
          tracing::warn!(error = %e, participant = %member, "profile fetch failed");
        }
      }
    }
    self.fetched_for = Some(key);
  }

  /// Add the traveller with `email` to the selected travel as a
  /// [`Role::Participant`].
  ///
  /// The updated travel is returned — and local state refreshed — only
  /// after the store's transaction has committed; an unknown email or a
  /// failed transaction leaves state untouched.
  pub async fn add_member_by_email(&mut self, email: &str) -> Option<Travel> {
    let Some(travel) = self.selected_travel().cloned() else {
      self.status_msg = "No travel selected".into();
      return None;
    };

    let profile = match self.store.profile_by_email(email).await {
      Ok(Some(profile)) => profile,
      Ok(None) => {
        self.status_msg = format!("No traveller with email {email}");
        return None;
      }
      Err(e) => {
        tracing::warn!(error = %e, "email lookup failed");
        self.status_msg = format!("Error: {e}");
        return None;
      }
    };

    let updated = match travel.with_participant(profile.uid.clone(), Role::Participant) {
      Ok(updated) => updated,
      Err(e) => {
        self.status_msg = format!("Error: {e}");
        return None;
      }
    };

    match self
      .store
      .update_travel(&updated, UpdateMode::AddParticipant {
        user: profile.uid.clone(),
      })
      .await
    {
      Ok(()) => {
        self.status_msg = format!("{} joined", profile.name);
        self.load_travels().await;
        Some(updated)
      }
      Err(e) => {
        tracing::warn!(error = %e, "adding participant failed");
        self.status_msg = format!("Error: {e}");
        None
      }
    }
  }

  /// Transition to `TravelDetail` for `id`, warming the profile cache.
  async fn open_detail(&mut self, id: Uid) {
    self.selected = Some(id);
    self.fetch_participants().await;
    self.detail_scroll = 0;
    self.screen = Screen::TravelDetail;
  }
}

// ─── Notification intents ─────────────────────────────────────────────────────

impl<S: NotificationStore> App<S> {
  /// Fetch the current user's inbox. Same stale-on-error policy as
  /// [`App::load_travels`].
  pub async fn load_notifications(&mut self) {
    let Some(user) = self.session.current_user() else {
      return;
    };
    match self.store.notifications_for_user(&user).await {
      Ok(inbox) => self.notifications = inbox,
      Err(e) => {
        tracing::warn!(error = %e, "loading notifications failed");
        self.status_msg = format!("Error: {e}");
      }
    }
  }

  /// Mark one notification read, then re-load the inbox.
  pub async fn read_notification(&mut self, id: uuid::Uuid) {
    match self.store.mark_read(&id).await {
      Ok(()) => self.load_notifications().await,
      Err(e) => {
        tracing::warn!(error = %e, "marking notification read failed");
        self.status_msg = format!("Error: {e}");
      }
    }
  }
}

// ─── Key handling ─────────────────────────────────────────────────────────────

impl<S: TravelStore + NotificationStore> App<S> {
  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> bool {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    // Text-input modes capture all printable keys.
    if self.filter_active {
      self.handle_filter_key(key).await;
      return true;
    }
    if self.invite_active {
      self.handle_invite_key(key).await;
      return true;
    }

    match self.screen {
      Screen::TravelList => self.handle_list_key(key).await,
      Screen::TravelDetail => self.handle_detail_key(key).await,
    }
  }

  async fn handle_filter_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Enter => {
        self.filter_active = false;
        self.list_cursor = 0;
        // Immediately open detail if there's exactly one match.
        let only = {
          let list = self.filtered_travels();
          if list.len() == 1 {
            Some(list[0].uid().clone())
          } else {
            None
          }
        };
        if let Some(id) = only {
          self.open_detail(id).await;
        }
      }
      KeyCode::Backspace => {
        self.filter.pop();
        self.list_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.list_cursor = 0;
      }
      _ => {}
    }
  }

  async fn handle_invite_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.invite_active = false;
        self.invite.clear();
      }
      KeyCode::Enter => {
        let email = self.invite.trim().to_owned();
        self.invite_active = false;
        self.invite.clear();
        if !email.is_empty() {
          self.add_member_by_email(&email).await;
        }
      }
      KeyCode::Backspace => {
        self.invite.pop();
      }
      KeyCode::Char(c) => {
        self.invite.push(c);
      }
      _ => {}
    }
  }

  async fn handle_list_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      // Quit
      KeyCode::Char('q') => return false,

      // Navigation
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.filtered_travels().len();
        if len > 0 && self.list_cursor + 1 < len {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        if self.list_cursor > 0 {
          self.list_cursor -= 1;
        }
      }

      // Open detail
      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(id) = self.cursor_travel().map(|t| t.uid().clone()) {
          self.open_detail(id).await;
        }
      }

      // Refresh
      KeyCode::Char('r') => {
        self.load_travels().await;
        self.load_notifications().await;
      }

      // Delete
      KeyCode::Char('d') => {
        if let Some(id) = self.cursor_travel().map(|t| t.uid().clone()) {
          self.delete_travel(&id).await;
        }
      }

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

  async fn handle_detail_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      // Quit
      KeyCode::Char('q') => return false,

      // Back to list
      KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => {
        self.screen = Screen::TravelList;
        self.selected = None;
        self.detail_scroll = 0;
      }

      // Scroll detail
      KeyCode::Down | KeyCode::Char('j') => {
        self.detail_scroll += 1;
      }
      KeyCode::Up | KeyCode::Char('k') => {
        if self.detail_scroll > 0 {
          self.detail_scroll -= 1;
        }
      }

      // Add a member by email
      KeyCode::Char('a') => {
        self.invite_active = true;
        self.invite.clear();
      }

      // Refresh
      KeyCode::Char('r') => {
        self.load_travels().await;
        self.fetched_for = None;
        self.fetch_participants().await;
      }

      _ => {}
    }
    true
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
