//! Data collection: CPU usage, named processes, and the wireless link.
//!
//! These don't share any state, so each can be used on its own.

pub mod cpu;
pub mod error;
pub mod processes;
pub mod wireless;

pub use self::error::{CollectionError, CollectionResult};
