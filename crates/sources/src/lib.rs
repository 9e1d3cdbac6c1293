//! Perftap Sources - where samples come from
//!
//! A [`CounterSource`] samples the performance counters of one host. The
//! scheduler polls every source once per cycle and delivers each returned
//! [`CategoryBatch`] to the broadcast bus as one category event followed
//! by its data events.
//!
//! The only source shipped is [`SystemSource`], which reads the local
//! machine through `sysinfo`. Per-second counters use [`RateTracker`].

mod error;
mod rate;
mod registration;
mod source;
mod system;

pub use error::{Result, SourceError};
pub use rate::RateTracker;
pub use registration::{open_source, register_matching};
pub use source::{CategoryBatch, CategoryInfo, CounterSource};
pub use system::{LocalCategory, SystemSource, TOTAL_INSTANCE, is_local_host};
