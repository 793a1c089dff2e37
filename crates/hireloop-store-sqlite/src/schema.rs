//! SQL schema for the Hireloop SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Taxonomy ──────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS categories (
    category_id   INTEGER PRIMARY KEY,
    category_name TEXT NOT NULL UNIQUE
);

-- Sub-categories and tags are append-only; renames deprecate and append.
CREATE TABLE IF NOT EXISTS sub_categories (
    sub_category_id   INTEGER PRIMARY KEY,
    category_id       INTEGER NOT NULL REFERENCES categories(category_id),
    sub_category_name TEXT NOT NULL,
    deprecated        INTEGER NOT NULL DEFAULT 0
);

CREATE UNIQUE INDEX IF NOT EXISTS sub_categories_live_name_idx
    ON sub_categories(category_id, sub_category_name) WHERE deprecated = 0;

CREATE TABLE IF NOT EXISTS tags (
    tag_id       INTEGER PRIMARY KEY,
    tag_name     TEXT NOT NULL,
    -- lowercase form of tag_name, folded on insert; SQLite lower() and
    -- NOCASE only fold ASCII
    tag_name_key TEXT NOT NULL,
    deprecated   INTEGER NOT NULL DEFAULT 0
);

CREATE UNIQUE INDEX IF NOT EXISTS tags_live_name_idx
    ON tags(tag_name_key) WHERE deprecated = 0;

CREATE TABLE IF NOT EXISTS sub_categories_tags (
    sub_category_id INTEGER NOT NULL REFERENCES sub_categories(sub_category_id),
    tag_id          INTEGER NOT NULL REFERENCES tags(tag_id),
    PRIMARY KEY (sub_category_id, tag_id)
);

-- ── Profiles ──────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS customer (
    customer_id INTEGER PRIMARY KEY,
    username    TEXT NOT NULL,
    phone_no    TEXT,
    address     TEXT
);

-- `status` is a projection of verified_accounts; only the verification
-- workflow writes it.
CREATE TABLE IF NOT EXISTS service_provider (
    spsid       INTEGER PRIMARY KEY,
    spid        TEXT NOT NULL UNIQUE,
    category_id INTEGER NOT NULL REFERENCES categories(category_id),
    name        TEXT NOT NULL,
    phone_no    TEXT,
    address     TEXT,
    description TEXT,
    bank_name   TEXT,
    ifsc        TEXT,
    acc_no      TEXT,
    tags        TEXT NOT NULL DEFAULT '[]',   -- JSON array of tag ids
    status      TEXT NOT NULL DEFAULT 'Not Verified'
                CHECK (status IN ('Not Verified', 'Verified', 'Rejected'))
);

CREATE TABLE IF NOT EXISTS sub_category_to_service_provider (
    sub_category_id INTEGER NOT NULL REFERENCES sub_categories(sub_category_id),
    spsid           INTEGER NOT NULL REFERENCES service_provider(spsid),
    min_cost        TEXT NOT NULL,               -- decimal string
    PRIMARY KEY (sub_category_id, spsid)
);

CREATE TABLE IF NOT EXISTS verifiers (
    vid           INTEGER PRIMARY KEY,
    verifier_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS support_staff (
    ssid               INTEGER PRIMARY KEY,
    support_staff_name TEXT NOT NULL
);

-- ── Identity links ────────────────────────────────────────────────────────

-- profile_id points into the table implied by profile_type. The store checks
-- that before every insert, inside the inserting transaction.
CREATE TABLE IF NOT EXISTS accounts (
    account_id   INTEGER PRIMARY KEY,
    email        TEXT NOT NULL,
    profile_type TEXT NOT NULL CHECK (profile_type IN (
                   'Customer', 'Service Provider', 'Verifier', 'Support Staff')),
    profile_id   INTEGER NOT NULL,
    created_at   TEXT NOT NULL,
    disabled     INTEGER NOT NULL DEFAULT 0,
    CONSTRAINT unique_profile UNIQUE (email, profile_type)
);

-- ── Verification ──────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS to_be_verified_profiles (
    spsid     INTEGER PRIMARY KEY REFERENCES service_provider(spsid),
    status    TEXT NOT NULL CHECK (status IN ('Pending', 'Verified', 'Rejected')),
    queued_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS verified_accounts (
    vid             INTEGER NOT NULL REFERENCES verifiers(vid),
    spsid           INTEGER NOT NULL REFERENCES service_provider(spsid),
    sub_category_id INTEGER NOT NULL REFERENCES sub_categories(sub_category_id),
    status          TEXT NOT NULL CHECK (status IN ('Accepted', 'Rejected')),
    decided_at      TEXT NOT NULL,
    PRIMARY KEY (vid, spsid, sub_category_id)
);

-- ── Booking ───────────────────────────────────────────────────────────────

-- AUTOINCREMENT: ids of rows moved out must never be handed out again,
-- since they live on in appointments / cancelled_appointments.
CREATE TABLE IF NOT EXISTS pending_appointments (
    appt_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id  INTEGER NOT NULL REFERENCES customer(customer_id),
    spsid        INTEGER NOT NULL REFERENCES service_provider(spsid),
    date         TEXT NOT NULL,                -- YYYY-MM-DD
    start_time   TEXT NOT NULL,                -- HH:MM:SS
    end_time     TEXT NOT NULL,
    service_type TEXT NOT NULL CHECK (service_type IN ('In house', 'Walk in')),
    description  TEXT,
    requested_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS appointments (
    appt_id      INTEGER PRIMARY KEY,
    customer_id  INTEGER NOT NULL REFERENCES customer(customer_id),
    spsid        INTEGER NOT NULL REFERENCES service_provider(spsid),
    date         TEXT NOT NULL,
    start_time   TEXT NOT NULL,
    end_time     TEXT NOT NULL,
    service_type TEXT NOT NULL CHECK (service_type IN ('In house', 'Walk in')),
    description  TEXT,
    requested_at TEXT NOT NULL,
    scheduled_at TEXT NOT NULL,
    state        TEXT NOT NULL CHECK (state IN ('Scheduled', 'Completed')),
    feedback     TEXT,
    rating       INTEGER CHECK (rating BETWEEN 1 AND 5),
    payment      TEXT,                         -- decimal string
    completed_at TEXT
);

CREATE TABLE IF NOT EXISTS cancelled_appointments (
    appt_id      INTEGER PRIMARY KEY,
    customer_id  INTEGER NOT NULL REFERENCES customer(customer_id),
    spsid        INTEGER NOT NULL REFERENCES service_provider(spsid),
    date         TEXT NOT NULL,
    start_time   TEXT NOT NULL,
    end_time     TEXT NOT NULL,
    service_type TEXT NOT NULL CHECK (service_type IN ('In house', 'Walk in')),
    description  TEXT,
    requested_at TEXT NOT NULL,
    scheduled_at TEXT NOT NULL,
    cancelled_by TEXT NOT NULL CHECK (cancelled_by IN ('Customer', 'Service Provider')),
    cancelled_at TEXT NOT NULL
);

-- appt_id may refer to a pending or an active appointment, so no FK.
CREATE TABLE IF NOT EXISTS handled_requests (
    handled_request_id INTEGER PRIMARY KEY AUTOINCREMENT,
    ssid               INTEGER NOT NULL REFERENCES support_staff(ssid),
    appt_id            INTEGER NOT NULL,
    assigned_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS accounts_email_idx          ON accounts(email);
CREATE INDEX IF NOT EXISTS sub_categories_category_idx ON sub_categories(category_id);
CREATE INDEX IF NOT EXISTS offerings_spsid_idx         ON sub_category_to_service_provider(spsid);
CREATE INDEX IF NOT EXISTS decisions_spsid_idx         ON verified_accounts(spsid);
CREATE INDEX IF NOT EXISTS pending_spsid_idx           ON pending_appointments(spsid);
CREATE INDEX IF NOT EXISTS appointments_slot_idx       ON appointments(spsid, date, state);
CREATE INDEX IF NOT EXISTS handled_requests_appt_idx   ON handled_requests(appt_id);

PRAGMA user_version = 1;
";
