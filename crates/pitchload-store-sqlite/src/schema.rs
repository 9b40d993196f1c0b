//! SQL schema for the pitchload SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS leagues (
    league_id TEXT PRIMARY KEY,
    name      TEXT NOT NULL,
    country   TEXT
);

CREATE TABLE IF NOT EXISTS seasons (
    season_id TEXT PRIMARY KEY,
    name      TEXT,
    league_id TEXT NOT NULL REFERENCES leagues(league_id)
);

CREATE TABLE IF NOT EXISTS teams (
    team_id TEXT PRIMARY KEY,
    name    TEXT
);

CREATE TABLE IF NOT EXISTS players (
    player_id TEXT PRIMARY KEY,
    name      TEXT
);

-- season_id is unconstrained: matches without a season carry the 'N/A'
-- sentinel, which names no season row.
CREATE TABLE IF NOT EXISTS matches (
    event_id     TEXT PRIMARY KEY,
    season_id    TEXT NOT NULL,
    home_team_id TEXT REFERENCES teams(team_id),
    away_team_id TEXT REFERENCES teams(team_id),
    status       TEXT NOT NULL
);

-- Metric catalog; accumulates across loads.
CREATE TABLE IF NOT EXISTS statistics (
    statistic_id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug         TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS team_statistics (
    event_id     TEXT    NOT NULL REFERENCES matches(event_id),
    team_id      TEXT    NOT NULL REFERENCES teams(team_id),
    statistic_id INTEGER NOT NULL REFERENCES statistics(statistic_id),
    value        REAL    NOT NULL,
    PRIMARY KEY (event_id, team_id, statistic_id)
);

-- team_id is the side the player turned out for; not part of the key.
CREATE TABLE IF NOT EXISTS player_statistics (
    event_id     TEXT    NOT NULL REFERENCES matches(event_id),
    player_id    TEXT    NOT NULL REFERENCES players(player_id),
    team_id      TEXT             REFERENCES teams(team_id),
    statistic_id INTEGER NOT NULL REFERENCES statistics(statistic_id),
    value        REAL    NOT NULL,
    PRIMARY KEY (event_id, player_id, statistic_id)
);

CREATE INDEX IF NOT EXISTS seasons_league_idx     ON seasons(league_id);
CREATE INDEX IF NOT EXISTS matches_season_idx     ON matches(season_id);
CREATE INDEX IF NOT EXISTS team_stats_metric_idx  ON team_statistics(statistic_id);
CREATE INDEX IF NOT EXISTS player_stats_metric_idx ON player_statistics(statistic_id);
CREATE INDEX IF NOT EXISTS player_stats_team_idx  ON player_statistics(team_id);

PRAGMA user_version = 1;
";
