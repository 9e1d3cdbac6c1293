//! Perftap Protocol - events and the line-oriented wire format
//!
//! This crate provides the types that flow from counter sources to
//! subscribers and the text protocol spoken on each subscriber socket:
//! - `CategoryEvent` / `DataEvent` / `SampleEvent` - the sample stream
//! - `WireEncoder` - per-connection catalog/data encoder
//! - `WireDecoder` - client-side decoder resolving id-paths back to names
//! - `Command` - client → server reconfiguration commands
//!
//! # Wire Format
//!
//! Server → client, one record per line:
//!
//! ```text
//! C <id-path> <name>    catalog declaration (once per id-path per connection)
//! T <timestamp>         sampling time of the category batch that follows
//! D <id-path> <value>   one sample
//! I <message>           reply to a client command
//! ```
//!
//! An id-path is `host[.category[.counter[.instance]]]`, each level a small
//! integer allocated in first-seen order on that connection.

mod command;
mod decoder;
mod encoder;
mod error;
mod event;
mod format;

pub use command::{Command, FilterField, USAGE, info_line, pattern_ack};
pub use decoder::{DecodedSample, IdPath, WireDecoder, WireLine};
pub use encoder::{EncoderOptions, WireEncoder};
pub use error::ProtocolError;
pub use event::{CategoryEvent, DataEvent, SampleEvent};
pub use format::{TIMESTAMP_FORMAT, TIMESTAMP_FORMAT_WITH_OFFSET, format_timestamp, format_value};

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Maximum number of fractional digits rendered for a sample value
pub const VALUE_PRECISION: usize = 12;
