//! Metric catalog derivation.
//!
//! Every non-metadata column of an extract is a metric. The catalog is the
//! sorted union of both extracts' metrics; once persisted, the store assigns
//! each slug a numeric identifier and [`MetricCatalog`] maps slugs back to
//! those identifiers for the fact transformer.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::{
  model::{Metric, NewMetric},
  schema::is_metadata,
  table::WideTable,
};

/// Metric columns of `table`, in header order, each name once.
pub fn metric_columns(table: &WideTable) -> Vec<String> {
  let mut seen = HashSet::new();
  table
    .columns()
    .iter()
    .map(String::as_str)
    .filter(|c| !c.is_empty() && !is_metadata(c))
    .filter(|c| seen.insert(*c))
    .map(str::to_owned)
    .collect()
}

/// Union of the given metric sets, sorted lexicographically so the catalog is
/// registered in the same order on every run.
pub fn metric_universe<'a, I>(sets: I) -> Vec<String>
where
  I: IntoIterator<Item = &'a [String]>,
{
  sets
    .into_iter()
    .flatten()
    .cloned()
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect()
}

/// Human-readable name for a slug: underscores become spaces and each word
/// is title-cased (`shots_on_target` → `Shots On Target`).
///
/// A letter is upper-cased when it follows a non-letter and lower-cased
/// otherwise, so `per_90min` becomes `Per 90Min`.
pub fn display_name(slug: &str) -> String {
  let mut out = String::with_capacity(slug.len());
  let mut after_letter = false;
  for ch in slug.chars().map(|c| if c == '_' { ' ' } else { c }) {
    if ch.is_alphabetic() {
      if after_letter {
        out.extend(ch.to_lowercase());
      } else {
        out.extend(ch.to_uppercase());
      }
      after_letter = true;
    } else {
      out.push(ch);
      after_letter = false;
    }
  }
  out
}

pub fn new_metrics(universe: &[String]) -> Vec<NewMetric> {
  universe
    .iter()
    .map(|slug| NewMetric { slug: slug.clone(), display_name: display_name(slug) })
    .collect()
}

// ─── Persisted catalog ───────────────────────────────────────────────────────

/// Slug → identifier map read back from the store.
///
/// Built from the whole persisted catalog, so it also resolves metrics that
/// earlier runs registered.
#[derive(Debug, Clone, Default)]
pub struct MetricCatalog {
  ids: HashMap<String, i64>,
}

impl MetricCatalog {
  pub fn get(&self, slug: &str) -> Option<i64> { self.ids.get(slug).copied() }

  pub fn len(&self) -> usize { self.ids.len() }

  pub fn is_empty(&self) -> bool { self.ids.is_empty() }
}

impl FromIterator<Metric> for MetricCatalog {
  fn from_iter<T: IntoIterator<Item = Metric>>(iter: T) -> Self {
    Self {
      ids: iter.into_iter().map(|m| (m.slug, m.statistic_id)).collect(),
    }
  }
}
