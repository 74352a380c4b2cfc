//! Key-value store database schema.

/// SQL to create the record, counter and list tables.
pub const CREATE_STORE_TABLES: &str = r"
CREATE TABLE IF NOT EXISTS store_records (
    key        TEXT PRIMARY KEY,
    value      JSONB NOT NULL,
    version    BIGINT NOT NULL CHECK (version > 0),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS store_counters (
    key   TEXT NOT NULL,
    field TEXT NOT NULL,
    value BIGINT NOT NULL DEFAULT 0,
    PRIMARY KEY (key, field)
);

CREATE TABLE IF NOT EXISTS store_lists (
    id          BIGSERIAL PRIMARY KEY,
    key         TEXT NOT NULL,
    entry       JSONB NOT NULL,
    appended_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_store_lists_key
    ON store_lists (key, id DESC);
";
