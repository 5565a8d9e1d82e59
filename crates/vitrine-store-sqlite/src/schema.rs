//! SQL schema for the Vitrine SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- The first row (lowest id) is the canonical one.
CREATE TABLE IF NOT EXISTS content (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    hero_label           TEXT NOT NULL DEFAULT '',
    hero_title           TEXT NOT NULL DEFAULT '',
    hero_description     TEXT NOT NULL DEFAULT '',
    stat1_number         TEXT NOT NULL DEFAULT '',
    stat1_text           TEXT NOT NULL DEFAULT '',
    stat2_number         TEXT NOT NULL DEFAULT '',
    stat2_text           TEXT NOT NULL DEFAULT '',
    features_label       TEXT NOT NULL DEFAULT '',
    features_title       TEXT NOT NULL DEFAULT '',
    features_description TEXT NOT NULL DEFAULT '',
    products_label       TEXT NOT NULL DEFAULT '',
    products_title       TEXT NOT NULL DEFAULT '',
    products_description TEXT NOT NULL DEFAULT '',
    contact_tagline      TEXT NOT NULL DEFAULT '',
    contact_title        TEXT NOT NULL DEFAULT '',
    contact_description  TEXT NOT NULL DEFAULT '',
    contact_phone        TEXT NOT NULL DEFAULT '',
    contact_email        TEXT NOT NULL DEFAULT '',
    contact_address      TEXT NOT NULL DEFAULT '',
    company_name         TEXT NOT NULL DEFAULT '',
    company_tagline      TEXT NOT NULL DEFAULT '',
    footer_text          TEXT NOT NULL DEFAULT '',
    updated_at           TEXT NOT NULL        -- RFC 3339 UTC
);

-- Append-only apart from explicit deletes from the history page.
CREATE TABLE IF NOT EXISTS content_history (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    content_snapshot TEXT NOT NULL,           -- flat JSON object field -> value
    description      TEXT NOT NULL,
    created_by       TEXT NOT NULL DEFAULT 'admin',
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS features (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    display_order INTEGER NOT NULL DEFAULT 0,
    title         TEXT NOT NULL DEFAULT '',
    description   TEXT NOT NULL DEFAULT '',
    icon          TEXT,                       -- legacy glyph
    image         TEXT                        -- file name or remote URL
);

CREATE TABLE IF NOT EXISTS products (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    display_order INTEGER NOT NULL DEFAULT 0,
    title         TEXT NOT NULL DEFAULT '',
    description   TEXT NOT NULL DEFAULT '',
    icon          TEXT,
    image         TEXT
);

CREATE TABLE IF NOT EXISTS product_images (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id    INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
    image         TEXT NOT NULL,
    display_order INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS admins (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL           -- argon2 PHC string
);

CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    username   TEXT,                      -- NULL for anonymous visitors
    csrf_token TEXT NOT NULL,
    flashes    TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS history_created_idx  ON content_history(created_at);
CREATE INDEX IF NOT EXISTS product_images_idx   ON product_images(product_id);
CREATE INDEX IF NOT EXISTS sessions_expires_idx ON sessions(expires_at);

PRAGMA user_version = 1;
";
