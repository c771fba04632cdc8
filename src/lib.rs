//! A small health monitor for single-board computers.
//!
//! It reports per-core CPU usage from the kernel's counters, finds the
//! processes belonging to a named program, and reads the state of a wireless
//! link through whichever tool the host has.

pub mod collection;
pub mod options;

pub mod utils {
    pub(crate) mod general;
    pub mod logging;
}
