//! SQL schema for the punchcard SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Directory ──────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS shift_types (
    name       TEXT PRIMARY KEY,
    start_time TEXT NOT NULL,   -- HH:MM:SS
    end_time   TEXT NOT NULL    -- HH:MM:SS; <= start_time means overnight
);

CREATE TABLE IF NOT EXISTS employees (
    employee_id    TEXT PRIMARY KEY,
    employee_name  TEXT,
    device_user_id TEXT UNIQUE,
    active         INTEGER NOT NULL DEFAULT 1,
    default_shift  TEXT,
    holiday_list   TEXT,
    company        TEXT,
    department     TEXT
);

CREATE TABLE IF NOT EXISTS holidays (
    holiday_list TEXT NOT NULL,
    holiday_date TEXT NOT NULL,   -- YYYY-MM-DD
    description  TEXT,
    PRIMARY KEY (holiday_list, holiday_date)
);

CREATE TABLE IF NOT EXISTS leave_applications (
    leave_application TEXT PRIMARY KEY,
    employee_id       TEXT NOT NULL,
    leave_type        TEXT NOT NULL,
    from_date         TEXT NOT NULL,
    to_date           TEXT NOT NULL,
    half_day          INTEGER NOT NULL DEFAULT 0,
    approved          INTEGER NOT NULL DEFAULT 0
);

-- ── Attendance ─────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS attendance (
    attendance_id     TEXT PRIMARY KEY,
    employee_id       TEXT NOT NULL,
    attendance_date   TEXT NOT NULL,
    status            TEXT NOT NULL,   -- 'Present' | 'Absent' | 'Half Day' | 'On Leave'
    in_time           TEXT,
    out_time          TEXT,
    working_hours     REAL NOT NULL DEFAULT 0,
    shift             TEXT,
    company           TEXT,
    leave_type        TEXT,
    leave_application TEXT,
    doc_status        INTEGER NOT NULL DEFAULT 0,   -- 0 open, 1 submitted, 2 cancelled
    version           INTEGER NOT NULL DEFAULT 1,
    UNIQUE (employee_id, attendance_date)
);

-- Duplicate deliveries at the same second collapse on the unique key.
CREATE TABLE IF NOT EXISTS checkins (
    checkin_id    TEXT PRIMARY KEY,
    employee_id   TEXT NOT NULL,
    timestamp     TEXT NOT NULL,   -- YYYY-MM-DD HH:MM:SS, device clock
    direction     TEXT NOT NULL,   -- 'IN' | 'OUT'
    device_id     TEXT,
    device_ip     TEXT,
    source        TEXT NOT NULL DEFAULT 'device',
    attendance_id TEXT REFERENCES attendance(attendance_id) ON DELETE SET NULL,
    UNIQUE (employee_id, timestamp)
);

CREATE TABLE IF NOT EXISTS regularizations (
    request_id        TEXT PRIMARY KEY,
    employee_id       TEXT NOT NULL,
    attendance_date   TEXT NOT NULL,
    in_time           TEXT,   -- JSON-encoded TimeInput or NULL
    out_time          TEXT,   -- JSON-encoded TimeInput or NULL
    reason            TEXT,
    workflow_state    TEXT NOT NULL,
    attendance_status TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS attendance_open_idx    ON attendance(doc_status);
CREATE INDEX IF NOT EXISTS checkins_attendance_idx ON checkins(attendance_id);
CREATE INDEX IF NOT EXISTS regularizations_emp_idx
    ON regularizations(employee_id, attendance_date);

PRAGMA user_version = 1;
";
