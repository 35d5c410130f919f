//! SQL schema for the Cal SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Raw messages are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS raw_messages (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,   -- RFC 3339, local time with offset
    message   TEXT NOT NULL
);

-- One row per calendar date; replaced wholesale on every merge.
CREATE TABLE IF NOT EXISTS daily_logs (
    date                  TEXT PRIMARY KEY,   -- YYYY-MM-DD
    breakfast_description TEXT NOT NULL DEFAULT '',
    lunch_description     TEXT NOT NULL DEFAULT '',
    dinner_description    TEXT NOT NULL DEFAULT '',
    snack_description     TEXT NOT NULL DEFAULT '',
    mood_morning          TEXT NOT NULL DEFAULT '',
    mood_afternoon        TEXT NOT NULL DEFAULT '',
    mood_night            TEXT NOT NULL DEFAULT '',
    hydration             TEXT NOT NULL DEFAULT '',
    sleep                 TEXT NOT NULL DEFAULT '',
    activity              TEXT NOT NULL DEFAULT '',
    notes                 TEXT NOT NULL DEFAULT '',
    alcohol               TEXT NOT NULL DEFAULT '',
    caffeine              TEXT NOT NULL DEFAULT '',
    marijuana             TEXT NOT NULL DEFAULT '',
    exercise_type         TEXT NOT NULL DEFAULT '',
    supplements           TEXT NOT NULL DEFAULT '[]',   -- JSON array of strings
    last_updated          TEXT NOT NULL DEFAULT ''      -- RFC 3339 or ''
);

PRAGMA user_version = 1;
";

/// Column list of `daily_logs`, in table order.
pub const DAY_COLUMNS: &str = "date, breakfast_description, lunch_description, \
  dinner_description, snack_description, mood_morning, mood_afternoon, \
  mood_night, hydration, sleep, activity, notes, alcohol, caffeine, marijuana, \
  exercise_type, supplements, last_updated";
