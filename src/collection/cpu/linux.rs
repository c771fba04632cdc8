//! Reads per-core counters from `/proc/stat`.

use std::fs;

use anyhow::Context;

use super::{CoreCounters, CounterSnapshot};
use crate::collection::error::{CollectionError, CollectionResult};

/// Reads the per-core counter table. Counters are converted from clock ticks to
/// seconds.
pub fn read_counters() -> CollectionResult<CounterSnapshot> {
    let contents = fs::read_to_string("/proc/stat").context("failed to read /proc/stat")?;
    let ticks_per_second = rustix::param::clock_ticks_per_second();

    let snapshot = parse_proc_stat(&contents, ticks_per_second);
    if snapshot.len() <= 1 {
        // Only the aggregate, which is built from nothing.
        return Err(CollectionError::from_str("no cores found in /proc/stat"));
    }

    Ok(snapshot)
}

/// Builds a [`CounterSnapshot`] from `/proc/stat` contents. Only the per-core
/// `cpuN` rows are used; the aggregate is recomputed from them.
pub(crate) fn parse_proc_stat(contents: &str, ticks_per_second: u64) -> CounterSnapshot {
    let cores = contents.lines().filter_map(|line| {
        let mut parts = line.split_whitespace();
        let label = parts.next()?;
        let index = label.strip_prefix("cpu")?;

        if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        Some((label.to_string(), parse_core_row(parts, ticks_per_second)))
    });

    CounterSnapshot::from_cores(cores)
}

/// Parses the counter columns that follow the label. Missing or malformed values
/// count as zero, as older kernels have fewer columns.
fn parse_core_row<'a>(mut values: impl Iterator<Item = &'a str>, ticks_per_second: u64) -> CoreCounters {
    let ticks = if ticks_per_second == 0 {
        1.0
    } else {
        ticks_per_second as f64
    };
    let mut next = || {
        values
            .next()
            .and_then(|v| v.parse::<u64>().ok())
            .map(|v| v as f64 / ticks)
            .unwrap_or(0_f64)
    };

    // Note we do not get guest/guest_nice, as they are calculated as part of
    // user/nice respectively.
    CoreCounters {
        user: next(),
        nice: next(),
        system: next(),
        idle: next(),
        iowait: next(),
        irq: next(),
        softirq: next(),
        steal: next(),
    }
}
