/// All job primary keys are SQLite `INTEGER PRIMARY KEY` rowids.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Opaque identity of whoever submitted a job (chat id, account id, ...).
pub type RequesterId = String;
