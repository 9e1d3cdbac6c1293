//! Perftap Scheduler - fixed-interval polling of counter sources
//!
//! Each tick starts one poll cycle on its own task: every source is polled
//! in turn and its batches are delivered to the broadcast bus. A tick that
//! arrives while a cycle is still in flight is dropped and reported, never
//! queued, so at most one cycle runs at a time.
//!
//! # Example
//!
//! ```ignore
//! let scheduler = PollScheduler::new(sources, Arc::clone(&bus), config.poll.interval);
//! let metrics = scheduler.metrics();
//! tokio::spawn(scheduler.run(cancel.clone()));
//! ```

mod scheduler;

pub use scheduler::{CycleSummary, PollScheduler, TickOutcome};
