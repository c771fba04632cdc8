//! Data collection for CPU usage.
//!
//! Usage is derived from two readings of the kernel's cumulative per-core time
//! counters. Those counters are *supposed* to only go up, but can appear to move
//! backwards after a CPU is hot-plugged, after suspend/resume, or because the
//! kernel does not lock them while they are updated. See
//! <https://github.com/prometheus/node_exporter/pull/2067>.

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        pub mod linux;
        pub use self::linux::*;
    } else {
        /// Reads the per-core counter table. Unsupported outside of Linux.
        pub fn read_counters() -> crate::collection::error::CollectionResult<CounterSnapshot> {
            Err(crate::collection::error::CollectionError::Unsupported)
        }
    }
}

use hashbrown::HashMap;
use indexmap::IndexMap;

use crate::utils::general::round_to;

/// Returned by [`calculate_usage`] when a pair of readings can't produce a
/// trustworthy value. Callers should drop the reading and keep whatever value
/// they had before.
pub const INVALID_USAGE: f64 = -1.0;

/// The label of the aggregate entry in a [`CounterSnapshot`].
pub const AGGREGATE_LABEL: &str = "cpu";

/// One reading of a core's cumulative time-in-state counters, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoreCounters {
    pub user: f64,
    pub nice: f64,
    pub system: f64,
    pub idle: f64,
    pub iowait: f64,
    pub irq: f64,
    pub softirq: f64,
    pub steal: f64,
}

impl CoreCounters {
    /// Time spent doing nothing, including time waiting on IO.
    #[inline]
    pub fn idle_time(&self) -> f64 {
        self.idle + self.iowait
    }

    /// Time spent doing work.
    ///
    /// Note guest/guest_nice are not included, as the kernel already counts them
    /// as part of user/nice.
    #[inline]
    pub fn busy_time(&self) -> f64 {
        self.user + self.nice + self.system + self.irq + self.softirq + self.steal
    }

    #[inline]
    pub fn total_time(&self) -> f64 {
        self.idle_time() + self.busy_time()
    }
}

impl std::ops::AddAssign for CoreCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.user += rhs.user;
        self.nice += rhs.nice;
        self.system += rhs.system;
        self.idle += rhs.idle;
        self.iowait += rhs.iowait;
        self.irq += rhs.irq;
        self.softirq += rhs.softirq;
        self.steal += rhs.steal;
    }
}

/// Calculates the usage of a core between two readings as a percentage rounded
/// to two decimal places.
///
/// Returns [`INVALID_USAGE`] if the total did not advance or the idle time went
/// backwards; neither can be turned into a meaningful value.
pub fn calculate_usage(prev: &CoreCounters, curr: &CoreCounters) -> f64 {
    let prev_idle = prev.idle_time();
    let curr_idle = curr.idle_time();

    let prev_total = prev.total_time();
    let curr_total = curr.total_time();

    if curr_total <= prev_total || curr_idle < prev_idle {
        return INVALID_USAGE;
    }

    let total_delta = curr_total - prev_total;
    let idle_delta = curr_idle - prev_idle;
    let usage = (total_delta - idle_delta) / total_delta * 100.0;

    round_to(usage.clamp(0.0, 100.0), 2)
}

/// Every core's counters from one read of the counter table, keyed by label
/// (`cpu0`, `cpu1`, ...). The aggregate [`AGGREGATE_LABEL`] entry is the sum of
/// the cores and is always last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CounterSnapshot {
    pub inner: IndexMap<String, CoreCounters>,
}

impl CounterSnapshot {
    /// Builds a snapshot from per-core entries, appending the aggregate.
    pub fn from_cores<I: IntoIterator<Item = (String, CoreCounters)>>(cores: I) -> Self {
        let mut inner: IndexMap<String, CoreCounters> = cores.into_iter().collect();
        inner.shift_remove(AGGREGATE_LABEL);

        let mut total = CoreCounters::default();
        for counters in inner.values() {
            total += *counters;
        }
        inner.insert(AGGREGATE_LABEL.to_string(), total);

        Self { inner }
    }

    pub fn aggregate(&self) -> Option<&CoreCounters> {
        self.inner.get(AGGREGATE_LABEL)
    }
}

impl std::ops::Deref for CounterSnapshot {
    type Target = IndexMap<String, CoreCounters>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuDataType {
    Avg,
    Cpu(usize),
}

impl CpuDataType {
    fn from_label(label: &str) -> Option<Self> {
        if label == AGGREGATE_LABEL {
            Some(CpuDataType::Avg)
        } else {
            label
                .strip_prefix(AGGREGATE_LABEL)
                .and_then(|index| index.parse().ok())
                .map(CpuDataType::Cpu)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CpuData {
    pub data_type: CpuDataType,
    pub usage: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CpuHarvest {
    pub inner: Vec<CpuData>,
}

impl CpuHarvest {
    /// The usage across all cores, if known.
    pub fn avg(&self) -> Option<f64> {
        self.inner
            .iter()
            .find(|data| data.data_type == CpuDataType::Avg)
            .map(|data| data.usage)
    }
}

impl std::ops::Deref for CpuHarvest {
    type Target = Vec<CpuData>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Turns successive [`CounterSnapshot`]s into usage values, holding on to the
/// last good value of a core whenever a reading comes back invalid.
#[derive(Debug, Default)]
pub struct CpuUsageTracker {
    prev: Option<CounterSnapshot>,
    last_good: HashMap<String, f64>,
}

impl CpuUsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a new snapshot in. Cores only show up in the result once they have
    /// produced at least one valid reading.
    pub fn update(&mut self, curr: CounterSnapshot) -> CpuHarvest {
        // Cores that disappeared (e.g. offlined) shouldn't keep stale values around.
        self.last_good.retain(|label, _| curr.contains_key(label));

        if let Some(prev) = &self.prev {
            for (label, counters) in curr.iter() {
                let Some(prev_counters) = prev.get(label) else {
                    continue;
                };

                let usage = calculate_usage(prev_counters, counters);
                if usage == INVALID_USAGE {
                    log::debug!("Counter regression on {label}, keeping the previous value");
                } else {
                    self.last_good.insert(label.clone(), usage);
                }
            }
        }

        let inner = curr
            .keys()
            .filter_map(|label| {
                let usage = *self.last_good.get(label)?;
                let data_type = CpuDataType::from_label(label)?;

                Some(CpuData { data_type, usage })
            })
            .collect();

        self.prev = Some(curr);

        CpuHarvest { inner }
    }
}
