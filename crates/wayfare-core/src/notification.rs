//! Typed notification content and the notification record.
//!
//! Each content variant validates its text fields at construction and knows
//! how to render itself as a one-line display string. The variant name
//! serves as the `kind` discriminant stored by backends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, participant::Role, uid::Uid};

/// The typed payload of a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum NotificationContent {
  /// You were invited to join a travel.
  Invitation {
    travel_id:    Uid,
    travel_title: String,
  },
  /// A travel you participate in starts soon (or another nudge).
  Reminder {
    travel_id: Uid,
    message:   String,
  },
  /// Your role within a travel changed.
  RoleChange {
    travel_id:    Uid,
    travel_title: String,
    role:         Role,
  },
  /// Someone answered your invitation.
  InvitationResponse {
    travel_id:    Uid,
    travel_title: String,
    accepted:     bool,
  },
  /// Someone wants to add you as a friend.
  FriendInvitation { from_name: String },
}

impl NotificationContent {
  pub fn invitation(travel_id: Uid, travel_title: impl Into<String>) -> Result<Self> {
    let travel_title = non_blank(travel_title)?;
    Ok(Self::Invitation { travel_id, travel_title })
  }

  pub fn reminder(travel_id: Uid, message: impl Into<String>) -> Result<Self> {
    let message = non_blank(message)?;
    Ok(Self::Reminder { travel_id, message })
  }

  pub fn role_change(
    travel_id: Uid,
    travel_title: impl Into<String>,
    role: Role,
  ) -> Result<Self> {
    let travel_title = non_blank(travel_title)?;
    Ok(Self::RoleChange { travel_id, travel_title, role })
  }

  pub fn invitation_response(
    travel_id: Uid,
    travel_title: impl Into<String>,
    accepted: bool,
  ) -> Result<Self> {
    let travel_title = non_blank(travel_title)?;
    Ok(Self::InvitationResponse { travel_id, travel_title, accepted })
  }

  pub fn friend_invitation(from_name: impl Into<String>) -> Result<Self> {
    let from_name = non_blank(from_name)?;
    Ok(Self::FriendInvitation { from_name })
  }

  /// Re-run the constructors' text checks on an already-built value —
  /// deserialisation does not go through them.
  pub fn validate(&self) -> Result<()> {
    let text = match self {
      Self::Invitation { travel_title, .. } => travel_title,
      Self::Reminder { message, .. } => message,
      Self::RoleChange { travel_title, .. } => travel_title,
      Self::InvitationResponse { travel_title, .. } => travel_title,
      Self::FriendInvitation { from_name } => from_name,
    };
    if text.trim().is_empty() {
      return Err(Error::BlankNotificationText);
    }
    Ok(())
  }

  /// The discriminant string stored in the `kind` column.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn discriminant(&self) -> &'static str {
    match self {
      Self::Invitation { .. } => "invitation",
      Self::Reminder { .. } => "reminder",
      Self::RoleChange { .. } => "role_change",
      Self::InvitationResponse { .. } => "invitation_response",
      Self::FriendInvitation { .. } => "friend_invitation",
    }
  }

  /// User-facing one-line rendering.
  pub fn display_line(&self) -> String {
    match self {
      Self::Invitation { travel_title, .. } => {
        format!("You have been invited to join \"{travel_title}\"")
      }
      Self::Reminder { message, .. } => message.clone(),
      Self::RoleChange { travel_title, role, .. } => {
        format!("Your role in \"{travel_title}\" is now {role}")
      }
      Self::InvitationResponse { travel_title, accepted: true, .. } => {
        format!("Your invitation to \"{travel_title}\" was accepted")
      }
      Self::InvitationResponse { travel_title, accepted: false, .. } => {
        format!("Your invitation to \"{travel_title}\" was declined")
      }
      Self::FriendInvitation { from_name } => {
        format!("{from_name} wants to add you as a friend")
      }
    }
  }
}

fn non_blank(s: impl Into<String>) -> Result<String> {
  let s = s.into();
  if s.trim().is_empty() {
    return Err(Error::BlankNotificationText);
  }
  Ok(s)
}

/// One delivered notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
  pub id:      Uuid,
  pub to:      Uid,
  pub from:    Uid,
  pub at:      DateTime<Utc>,
  pub read:    bool,
  pub content: NotificationContent,
}

impl Notification {
  /// Build a fresh unread notification stamped now.
  pub fn send(to: Uid, from: Uid, content: NotificationContent) -> Self {
    Self {
      id: Uuid::new_v4(),
      to,
      from,
      at: Utc::now(),
      read: false,
      content,
    }
  }
}
