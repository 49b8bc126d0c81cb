//! SQLite schema definition.

/// Complete database schema for labtrack.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Users and Roles (Credential Store)
-- ============================================================================

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    enabled INTEGER NOT NULL DEFAULT 1,
    full_name TEXT,
    age INTEGER,
    gender TEXT,
    address TEXT,
    phone_number TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Reference data, created at bootstrap
CREATE TABLE IF NOT EXISTS roles (
    name TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS user_roles (
    user_id TEXT NOT NULL REFERENCES users(id),
    role_name TEXT NOT NULL REFERENCES roles(name),
    PRIMARY KEY (user_id, role_name)
);

-- ============================================================================
-- Lab Test Catalog
-- ============================================================================

CREATE TABLE IF NOT EXISTS lab_tests (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    price TEXT NOT NULL,                          -- decimal, currency precision
    category TEXT,
    description TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_lab_tests_active ON lab_tests(active);

-- ============================================================================
-- Appointments
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES users(id),
    tests TEXT NOT NULL,                          -- JSON array of price snapshots
    appointment_time TEXT NOT NULL,
    patient_name TEXT,
    patient_age INTEGER,
    patient_gender TEXT,
    patient_mobile TEXT,
    home_visit INTEGER NOT NULL DEFAULT 0,
    collection_address TEXT,
    total_amount TEXT NOT NULL,                   -- decimal, frozen at booking
    status TEXT NOT NULL DEFAULT 'PENDING',
    report_url TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(patient_id);
CREATE INDEX IF NOT EXISTS idx_appointments_status ON appointments(status);
"#;
