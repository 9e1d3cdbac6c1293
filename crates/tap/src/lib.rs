//! Perftap Tap - live subscriber side of the sample stream
//!
//! This crate fans sampled counters out to TCP clients. Each client gets
//! its own filter and wire encoder and can reconfigure the filter at any
//! time with line commands on the same socket.
//!
//! # Architecture
//!
//! ```text
//! PollScheduler
//!     │ deliver(event)
//!     ▼
//! BroadcastBus ── pending ──(category boundary)──► live
//!     │
//!     ├──► SampleFilter ──► WireSink ──► LineWriter ──► client socket
//!     ├──► SampleFilter ──► WireSink ──► LineWriter ──► client socket
//!     └──► ...                               ▲
//!                                            │ `I` replies
//! TapServer ── accept ──► Connection (command loop) ──┘
//! ```
//!
//! Delivery is synchronous on the poll path: every listener is awaited in
//! turn, and a listener whose write fails or times out is evicted.

mod bus;
mod connection;
mod error;
mod filter;
mod listener;
mod server;
mod sink;

#[cfg(test)]
mod testing;

pub use bus::{BroadcastBus, ListenerId};
pub use connection::{
    BUS_CLOSED_REPLY, Connection, ConnectionSettings, ILLEGAL_PATTERN_REPLY,
    UNKNOWN_COMMAND_REPLY,
};
pub use error::{Result, TapError};
pub use filter::{FilterHandle, MATCH_ALL, SampleFilter};
pub use listener::{SampleListener, dispatch};
pub use server::TapServer;
pub use sink::{LineWriter, WireSink};
