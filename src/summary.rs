use crate::watched::WatchedEntry;

/// Aggregate figures shown above the watched list.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WatchedSummary {
  pub count: usize,
  pub avg_catalog_rating: Option<f64>,
  pub avg_user_rating: Option<f64>,
  pub avg_runtime: Option<f64>,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
  let (sum, n) = values.filter(|v| v.is_finite()).fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
  (n > 0).then(|| sum / n as f64)
}

impl WatchedSummary {
  /// Entries missing a value are left out of that average.
  pub fn compute(entries: &[WatchedEntry]) -> Self {
    Self {
      count: entries.len(),
      avg_catalog_rating: mean(entries.iter().filter_map(|e| e.catalog_rating)),
      avg_user_rating: mean(entries.iter().map(|e| f64::from(e.user_rating))),
      avg_runtime: mean(entries.iter().filter_map(|e| e.runtime_minutes.map(f64::from))),
    }
  }
}

/// One decimal place, or blank when there is nothing to average.
pub fn format_average(value: Option<f64>) -> String {
  value.map(|v| format!("{:.1}", v)).unwrap_or_default()
}
