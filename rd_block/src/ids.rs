//! Metric identifier generation.

use rd_types::{MetricId, MetricUi};
use std::cell::Cell;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_ID_PREFIX: &str = "metric";

/// Source of fresh metric identifiers.
pub trait IdSource {
    /// Prefix shared by every id of this source.
    fn prefix(&self) -> &str;

    /// Return an id never returned before by this source.
    fn next_id(&self) -> MetricId;
}

/// Last value handed out by any `MetricIdGenerator` in this process.
static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

fn next_stamp() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let (Ok(prev) | Err(prev)) =
        LAST_STAMP.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
            Some(prev.max(now) + 1)
        });
    prev.max(now) + 1
}

/// Time-seeded, strictly increasing ids shared across the whole process, so
/// that two generators can never hand out the same id.
#[derive(Debug, Clone)]
pub struct MetricIdGenerator {
    prefix: String,
}

impl MetricIdGenerator {
    pub fn new(prefix: impl ToString) -> Self {
        MetricIdGenerator {
            prefix: prefix.to_string(),
        }
    }

    /// Use the prefix configured in `parameters.toml`.
    pub fn from_parameters() -> anyhow::Result<Self> {
        Ok(MetricIdGenerator::new(rd_parameters::metric_id_prefix()?))
    }
}

impl Default for MetricIdGenerator {
    fn default() -> Self {
        MetricIdGenerator::new(DEFAULT_ID_PREFIX)
    }
}

impl IdSource for MetricIdGenerator {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn next_id(&self) -> MetricId {
        MetricId::from(format!("{}-{}", self.prefix, next_stamp()))
    }
}

/// Deterministic ids `<prefix>-1`, `<prefix>-2`, ... for reproducible
/// payloads. Only unique within one instance.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: Cell<u64>,
}

impl SequentialIds {
    pub fn new(prefix: impl ToString) -> Self {
        SequentialIds {
            prefix: prefix.to_string(),
            next: Cell::new(1),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        SequentialIds::new(DEFAULT_ID_PREFIX)
    }
}

impl IdSource for SequentialIds {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn next_id(&self) -> MetricId {
        let n = self.next.get();
        self.next.set(n + 1);
        MetricId::from(format!("{}-{n}", self.prefix))
    }
}

impl<T: IdSource + ?Sized> IdSource for &T {
    fn prefix(&self) -> &str {
        (**self).prefix()
    }

    fn next_id(&self) -> MetricId {
        (**self).next_id()
    }
}

/// Draw ids from `ids` until one is not used by any entry of `metrics`.
pub fn next_unique(ids: &dyn IdSource, metrics: &[MetricUi]) -> MetricId {
    loop {
        let id = ids.next_id();
        if metrics.iter().all(|m| m.id != id) {
            return id;
        }
    }
}

/// Draw ids from `ids` until one is not in `taken`, and record it there.
pub fn claim_unused(ids: &dyn IdSource, taken: &mut HashSet<MetricId>) -> MetricId {
    loop {
        let id = ids.next_id();
        if taken.insert(id.clone()) {
            return id;
        }
    }
}
