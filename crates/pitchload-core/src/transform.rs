//! Wide-to-long fact transformation.
//!
//! Each extract row carries one column per metric. The transformer emits one
//! long record per (identity, metric, value) and then narrows the records
//! down to facts the store will accept:
//!
//! 1. missing values are dropped,
//! 2. values are coerced to numbers and unparseable ones dropped,
//! 3. records lacking an identity value are dropped,
//! 4. only events already registered as matches are kept,
//! 5. metric names are resolved through the [`MetricCatalog`],
//! 6. the natural key is deduplicated, first record wins.
//!
//! Nothing here is fatal; every dropped record is counted in
//! [`TransformStats`].

use std::collections::HashSet;

use serde::Serialize;

use crate::{
  catalog::MetricCatalog,
  model::{PlayerStatFact, TeamStatFact},
  schema::{EVENT_ID, PLAYER_ID, TEAM_ID},
  table::WideTable,
};

// ─── Shapes ──────────────────────────────────────────────────────────────────

/// Identity columns of a fact table.
///
/// The event identifier comes first. The first `key_len` identity columns,
/// plus the metric, form the natural key and must be present; any further
/// identity columns are carried along and may be absent.
#[derive(Debug, Clone, Copy)]
pub struct FactShape {
  pub identity: &'static [&'static str],
  pub key_len:  usize,
}

pub const TEAM_FACTS: FactShape =
  FactShape { identity: &[EVENT_ID, TEAM_ID], key_len: 2 };

pub const PLAYER_FACTS: FactShape =
  FactShape { identity: &[EVENT_ID, PLAYER_ID, TEAM_ID], key_len: 2 };

// ─── Long records ────────────────────────────────────────────────────────────

/// One (identity, metric, raw value) record of a melted table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongRecord<'a> {
  pub identity: Vec<Option<&'a str>>,
  pub metric:   &'a str,
  pub raw:      Option<&'a str>,
}

/// Melt `table` into long records: for each row, one record per column
/// whose name is in `metrics`, in header order.
///
/// A metric name that heads several columns yields one record per column.
pub fn melt<'a>(
  table: &'a WideTable,
  identity: &[&str],
  metrics: &[String],
) -> Vec<LongRecord<'a>> {
  let identity_idx: Vec<Option<usize>> =
    identity.iter().map(|c| table.column_index(c)).collect();
  let metric_idx: Vec<(usize, &'a str)> = table
    .columns()
    .iter()
    .enumerate()
    .map(|(i, c)| (i, c.as_str()))
    .filter(|(_, c)| metrics.iter().any(|m| m.as_str() == *c))
    .collect();

  let mut out = Vec::with_capacity(table.len() * metric_idx.len());
  for row in table.rows() {
    let ids: Vec<Option<&'a str>> = identity_idx
      .iter()
      .map(|i| i.and_then(|i| row.cell(i)))
      .collect();
    for &(index, metric) in &metric_idx {
      out.push(LongRecord { identity: ids.clone(), metric, raw: row.cell(index) });
    }
  }
  out
}

/// Parse a metric cell as a number.
///
/// Accepts anything [`f64`] parses plus the booleans `true` / `false` in any
/// case. Non-finite values are rejected.
pub fn coerce_numeric(raw: &str) -> Option<f64> {
  let raw = raw.trim();
  let value = if raw.eq_ignore_ascii_case("true") {
    1.0
  } else if raw.eq_ignore_ascii_case("false") {
    0.0
  } else {
    raw.parse::<f64>().ok()?
  };
  value.is_finite().then_some(value)
}

// ─── Transformation ──────────────────────────────────────────────────────────

/// Counters for one transformed table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransformStats {
  /// Long records produced by melting.
  pub observed:         usize,
  pub missing:          usize,
  pub non_numeric:      usize,
  pub missing_identity: usize,
  pub unknown_event:    usize,
  pub unknown_metric:   usize,
  pub duplicate:        usize,
  pub kept:             usize,
}

/// Facts ready for loading, with the counters that produced them.
#[derive(Debug, Clone, Default)]
pub struct FactSet<T> {
  pub facts: Vec<T>,
  pub stats: TransformStats,
}

/// A record that survived every filter.
struct Resolved<'a> {
  identity:     Vec<Option<&'a str>>,
  statistic_id: i64,
  value:        f64,
}

fn transform<'a, T>(
  table: &'a WideTable,
  shape: FactShape,
  metrics: &[String],
  known_events: &HashSet<String>,
  catalog: &MetricCatalog,
  build: impl Fn(Resolved<'a>) -> T,
) -> FactSet<T> {
  let mut stats = TransformStats::default();
  let mut seen: HashSet<(Vec<&'a str>, i64)> = HashSet::new();
  let mut facts = Vec::new();

  for record in melt(table, shape.identity, metrics) {
    stats.observed += 1;

    let Some(raw) = record.raw else {
      stats.missing += 1;
      continue;
    };
    let Some(value) = coerce_numeric(raw) else {
      stats.non_numeric += 1;
      continue;
    };
    let Some(key) = record.identity[..shape.key_len]
      .iter()
      .copied()
      .collect::<Option<Vec<&'a str>>>()
    else {
      stats.missing_identity += 1;
      continue;
    };
    if !known_events.contains(key[0]) {
      stats.unknown_event += 1;
      continue;
    }
    let Some(statistic_id) = catalog.get(record.metric) else {
      stats.unknown_metric += 1;
      continue;
    };
    if !seen.insert((key, statistic_id)) {
      stats.duplicate += 1;
      continue;
    }

    stats.kept += 1;
    facts.push(build(Resolved { identity: record.identity, statistic_id, value }));
  }

  FactSet { facts, stats }
}

/// Team facts keyed by (event, team, metric).
pub fn team_facts(
  table: &WideTable,
  metrics: &[String],
  known_events: &HashSet<String>,
  catalog: &MetricCatalog,
) -> FactSet<TeamStatFact> {
  transform(table, TEAM_FACTS, metrics, known_events, catalog, |r| TeamStatFact {
    event_id:     r.identity[0].unwrap_or_default().to_owned(),
    team_id:      r.identity[1].unwrap_or_default().to_owned(),
    statistic_id: r.statistic_id,
    value:        r.value,
  })
}

/// Player facts keyed by (event, player, metric), carrying the player's team.
pub fn player_facts(
  table: &WideTable,
  metrics: &[String],
  known_events: &HashSet<String>,
  catalog: &MetricCatalog,
) -> FactSet<PlayerStatFact> {
  transform(table, PLAYER_FACTS, metrics, known_events, catalog, |r| PlayerStatFact {
    event_id:     r.identity[0].unwrap_or_default().to_owned(),
    player_id:    r.identity[1].unwrap_or_default().to_owned(),
    team_id:      r.identity[2].map(str::to_owned),
    statistic_id: r.statistic_id,
    value:        r.value,
  })
}
