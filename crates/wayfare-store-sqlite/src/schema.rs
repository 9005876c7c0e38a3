//! SQL schema for the Wayfare SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per travel. The document column is the travel's transport map as
-- JSON; participant_uids mirrors the document's derived flat uid list and
-- exists only so membership queries can filter without parsing every doc.
CREATE TABLE IF NOT EXISTS travels (
    uid              TEXT PRIMARY KEY,  -- 20-char alphanumeric
    doc              TEXT NOT NULL,     -- JSON transport map
    participant_uids TEXT NOT NULL      -- JSON array of member uids
);

CREATE TABLE IF NOT EXISTS profiles (
    uid              TEXT PRIMARY KEY,
    username         TEXT NOT NULL,
    email            TEXT NOT NULL,
    name             TEXT NOT NULL,
    friends          TEXT NOT NULL DEFAULT '[]',  -- JSON array of uids
    travels          TEXT NOT NULL DEFAULT '[]',  -- JSON array of travel uids
    needs_onboarding INTEGER NOT NULL DEFAULT 1
);

-- The journal is strictly append-only.
-- No UPDATE is ever issued against this table; rows leave only when their
-- travel is deleted (ON DELETE CASCADE).
CREATE TABLE IF NOT EXISTS events (
    event_id    TEXT PRIMARY KEY,
    travel_uid  TEXT NOT NULL REFERENCES travels(uid) ON DELETE CASCADE,
    kind        TEXT NOT NULL,   -- EventKind discriminant
    at          TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    title       TEXT NOT NULL,
    description TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    to_uid          TEXT NOT NULL,
    from_uid        TEXT NOT NULL,
    at              TEXT NOT NULL,
    is_read         INTEGER NOT NULL DEFAULT 0,
    content         TEXT NOT NULL    -- JSON tagged payload
);

CREATE INDEX IF NOT EXISTS profiles_email_idx     ON profiles(email);
CREATE INDEX IF NOT EXISTS events_travel_idx      ON events(travel_uid);
CREATE INDEX IF NOT EXISTS notifications_to_idx   ON notifications(to_uid);

PRAGMA user_version = 1;
";
