//! SQL schema for the Romaria SQLite store.
//!
//! Executed once at connection startup; idempotent thanks to
//! `CREATE TABLE IF NOT EXISTS`. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per contact identity, overwritten in place. Never deleted;
-- a finished conversation resets state to 'idle' with an empty context.
CREATE TABLE IF NOT EXISTS sessions (
    phone           TEXT PRIMARY KEY,  -- normalized, digits only
    state           TEXT NOT NULL,
    context         TEXT NOT NULL,     -- JSON FlowContext
    last_message_id TEXT,              -- provider message id, for dedup
    updated_at      TEXT NOT NULL
);

-- Reference data, administered outside the bot.
CREATE TABLE IF NOT EXISTS events (
    event_id  TEXT PRIMARY KEY,
    name      TEXT NOT NULL,
    opens_at  TEXT NOT NULL,
    closes_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS rate_tiers (
    tier_id   TEXT PRIMARY KEY,
    event_id  TEXT NOT NULL REFERENCES events(event_id),
    name      TEXT NOT NULL,
    price     TEXT NOT NULL,    -- decimal as text, exact
    starts_at TEXT NOT NULL,
    ends_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS districts (
    district_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS churches (
    church_id   TEXT PRIMARY KEY,
    district_id TEXT NOT NULL REFERENCES districts(district_id),
    name        TEXT NOT NULL
);

-- Immutable after creation except for status.
CREATE TABLE IF NOT EXISTS registrations (
    registration_id TEXT PRIMARY KEY,
    event_id        TEXT NOT NULL REFERENCES events(event_id),
    contact_phone   TEXT NOT NULL,
    total           TEXT NOT NULL,   -- decimal as text, computed once
    status          TEXT NOT NULL,   -- 'pending' | 'paid'
    created_at      TEXT NOT NULL
);

-- Never updated by the core. (event_id, cpf) unique across the event.
CREATE TABLE IF NOT EXISTS participants (
    participant_id  TEXT PRIMARY KEY,
    registration_id TEXT NOT NULL REFERENCES registrations(registration_id),
    event_id        TEXT NOT NULL REFERENCES events(event_id),
    name            TEXT NOT NULL,
    cpf             TEXT NOT NULL,
    birthdate       TEXT,
    gender          TEXT,
    district_id     TEXT REFERENCES districts(district_id),
    church_id       TEXT REFERENCES churches(church_id),
    phone           TEXT,
    UNIQUE (event_id, cpf)
);

-- One per registration under normal operation; status flipped to 'paid'
-- only by webhook reconciliation.
CREATE TABLE IF NOT EXISTS payments (
    payment_id          TEXT PRIMARY KEY,
    registration_id     TEXT NOT NULL REFERENCES registrations(registration_id),
    provider            TEXT NOT NULL,
    provider_payment_id TEXT NOT NULL UNIQUE,
    status              TEXT NOT NULL,   -- 'pending' | 'paid'
    pix_code            TEXT NOT NULL,
    pix_qr_image        TEXT,
    expires_at          TEXT,
    created_at          TEXT NOT NULL
);

-- Denormalized reporting ledger, one row per participant. Written at
-- creation, status flipped on payment approval. Read by the admin
-- reporting surface.
CREATE TABLE IF NOT EXISTS ledger (
    ledger_id        TEXT PRIMARY KEY,
    registration_id  TEXT NOT NULL,
    participant_id   TEXT NOT NULL,
    event_name       TEXT NOT NULL,
    participant_name TEXT NOT NULL,
    cpf              TEXT NOT NULL,
    district_name    TEXT,
    church_name      TEXT,
    total            TEXT NOT NULL,
    status           TEXT NOT NULL,
    created_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS participants_cpf_idx     ON participants(cpf);
CREATE INDEX IF NOT EXISTS participants_reg_idx     ON participants(registration_id);
CREATE INDEX IF NOT EXISTS payments_reg_idx         ON payments(registration_id);
CREATE INDEX IF NOT EXISTS payments_status_idx      ON payments(status);
CREATE INDEX IF NOT EXISTS ledger_reg_idx           ON ledger(registration_id);
CREATE INDEX IF NOT EXISTS rate_tiers_event_idx     ON rate_tiers(event_id);
CREATE INDEX IF NOT EXISTS churches_district_idx    ON churches(district_id);

PRAGMA user_version = 1;
";
