//! SQL schema for the shareholder SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Accounts are never hard-deleted; `active = 0` is a soft delete.
-- Uniqueness of email and phone_number spans inactive rows too.
CREATE TABLE IF NOT EXISTS shareholders (
    shareholder_id         TEXT PRIMARY KEY,
    name                   TEXT NOT NULL,
    address                TEXT NOT NULL,
    is_login_activated     INTEGER NOT NULL DEFAULT 0,
    email                  TEXT NOT NULL UNIQUE,   -- lower-cased
    phone_number           TEXT NOT NULL UNIQUE,
    proof_of_identity      TEXT NOT NULL,
    proof_of_address       TEXT NOT NULL,
    next_of_kin            TEXT,                   -- JSON NextOfKin or NULL
    password_hash          TEXT NOT NULL,          -- argon2 PHC string
    created_at             TEXT NOT NULL,          -- RFC 3339 UTC; never updated
    password_changed_at    TEXT,
    password_reset_token   TEXT,                   -- SHA-256 hex, never plaintext
    password_reset_expires TEXT,
    role                   TEXT NOT NULL DEFAULT 'shareholder'
                           CHECK (role IN ('shareholder')),
    active                 INTEGER NOT NULL DEFAULT 1,
    shareholding           REAL NOT NULL DEFAULT 0,
    image                  TEXT
);

CREATE TABLE IF NOT EXISTS business_news (
    news_id TEXT PRIMARY KEY,
    title   TEXT NOT NULL,
    summary TEXT NOT NULL,
    date    TEXT NOT NULL,
    image   TEXT NOT NULL
);

-- Owned and written by the Orders service; read-only from here.
CREATE TABLE IF NOT EXISTS orders (
    order_id       TEXT PRIMARY KEY,
    shareholder_id TEXT NOT NULL,
    placed_at      TEXT NOT NULL,
    details        TEXT NOT NULL DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS shareholders_reset_token_idx
    ON shareholders(password_reset_token);
CREATE INDEX IF NOT EXISTS business_news_date_idx ON business_news(date);
CREATE INDEX IF NOT EXISTS orders_shareholder_idx ON orders(shareholder_id);

PRAGMA user_version = 1;
";
