//! `Session` — a process-local handle onto the external auth service's
//! user state.
//!
//! The backend tells us who is signed in through a state stream; the store
//! and the UI only ever ask two questions: "who is the current user?" and
//! "run this once a user exists". The latter resolves immediately when a
//! user is already signed in and otherwise waits for the next transition
//! *to* a signed-in state; sign-outs never resolve it.

use std::sync::Arc;

use tokio::sync::watch;

use crate::uid::Uid;

#[derive(Debug, Clone)]
pub struct Session {
  state: Arc<watch::Sender<Option<Uid>>>,
}

impl Session {
  /// A session with nobody signed in.
  pub fn new() -> Self {
    let (tx, _rx) = watch::channel(None);
    Self { state: Arc::new(tx) }
  }

  /// A session that starts signed in as `user`.
  pub fn signed_in(user: Uid) -> Self {
    let (tx, _rx) = watch::channel(Some(user));
    Self { state: Arc::new(tx) }
  }

  pub fn sign_in(&self, user: Uid) {
    self.state.send_replace(Some(user));
  }

  pub fn sign_out(&self) {
    self.state.send_replace(None);
  }

  pub fn current_user(&self) -> Option<Uid> {
    self.state.borrow().clone()
  }

  /// Resolve with the signed-in user: immediately if one exists, otherwise
  /// on the next sign-in. A transition to signed-out is not a resolution.
  pub async fn logged_in(&self) -> Uid {
    let mut rx = self.state.subscribe();
    loop {
      if let Some(user) = rx.borrow_and_update().clone() {
        return user;
      }
      // The sender half lives at least as long as `self`, so the channel
      // cannot close while we wait.
      if rx.changed().await.is_err() {
        std::future::pending::<()>().await;
      }
    }
  }
}

impl Default for Session {
  fn default() -> Self { Self::new() }
}
