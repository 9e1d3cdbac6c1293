//! Client-side wire decoder
//!
//! `WireDecoder` follows one connection's stream, learning the catalog from
//! `C` lines and resolving every `D` line back to host/category/counter
//! (and instance) names.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::Result;
use crate::error::ProtocolError;

/// Dot-separated id-path: `host[.category[.counter[.instance]]]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdPath(Vec<u32>);

impl IdPath {
    /// Maximum depth (host, category, counter, instance)
    pub const MAX_DEPTH: usize = 4;

    /// Path components, outermost first
    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// Number of components
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Path truncated to the first `depth` components
    pub fn prefix(&self, depth: usize) -> IdPath {
        IdPath(self.0[..depth.min(self.0.len())].to_vec())
    }
}

impl FromStr for IdPath {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        let ids = s
            .split('.')
            .map(|part| part.parse::<u32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| ProtocolError::malformed(format!("invalid id-path '{}'", s)))?;

        if ids.is_empty() || ids.len() > Self::MAX_DEPTH {
            return Err(ProtocolError::malformed(format!("invalid id-path '{}'", s)));
        }
        Ok(Self(ids))
    }
}

impl fmt::Display for IdPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", id)?;
        }
        Ok(())
    }
}

/// One server → client line
#[derive(Debug, Clone, PartialEq)]
pub enum WireLine {
    /// `C <id-path> <name>`
    Catalog { path: IdPath, name: String },
    /// `T <timestamp>`
    Time(String),
    /// `D <id-path> <value>`
    Data { path: IdPath, value: f64 },
    /// `I <message>`
    Info(String),
}

impl WireLine {
    /// Parse one line (without its terminator)
    pub fn parse(line: &str) -> Result<Self> {
        let (kind, rest) = line
            .split_once(' ')
            .ok_or_else(|| ProtocolError::malformed(line))?;

        match kind {
            "C" => {
                let (path, name) = rest
                    .split_once(' ')
                    .ok_or_else(|| ProtocolError::malformed(line))?;
                Ok(Self::Catalog {
                    path: path.parse()?,
                    name: name.to_string(),
                })
            }
            "T" => Ok(Self::Time(rest.to_string())),
            "D" => {
                let (path, value) = rest
                    .split_once(' ')
                    .ok_or_else(|| ProtocolError::malformed(line))?;
                let path: IdPath = path.parse()?;
                if path.depth() < 3 {
                    return Err(ProtocolError::malformed(line));
                }
                let value = value
                    .parse::<f64>()
                    .map_err(|_| ProtocolError::malformed(line))?;
                Ok(Self::Data { path, value })
            }
            "I" => Ok(Self::Info(rest.to_string())),
            _ => Err(ProtocolError::malformed(line)),
        }
    }
}

/// A data line resolved to names
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSample {
    pub host: String,
    pub category: String,
    pub counter: String,
    pub instance: Option<String>,
    pub value: f64,
    /// Timestamp of the most recent `T` line
    pub timestamp: Option<String>,
}

/// Stateful decoder for one connection
#[derive(Debug, Default)]
pub struct WireDecoder {
    names: HashMap<IdPath, String>,
    timestamp: Option<String>,
}

impl WireDecoder {
    /// Create a decoder with an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one line
    ///
    /// Returns the resolved sample for `D` lines and `None` for everything
    /// else. `I` lines are accepted and ignored; use [`WireLine::parse`] to
    /// inspect them.
    pub fn feed(&mut self, line: &str) -> Result<Option<DecodedSample>> {
        match WireLine::parse(line)? {
            WireLine::Catalog { path, name } => {
                self.names.insert(path, name);
                Ok(None)
            }
            WireLine::Time(timestamp) => {
                self.timestamp = Some(timestamp);
                Ok(None)
            }
            WireLine::Data { path, value } => self.resolve(&path, value).map(Some),
            WireLine::Info(_) => Ok(None),
        }
    }

    /// Number of catalog entries learned so far
    pub fn catalog_len(&self) -> usize {
        self.names.len()
    }

    fn resolve(&self, path: &IdPath, value: f64) -> Result<DecodedSample> {
        let lookup = |depth: usize| {
            let prefix = path.prefix(depth);
            self.names
                .get(&prefix)
                .cloned()
                .ok_or_else(|| ProtocolError::UndeclaredId(prefix.to_string()))
        };

        Ok(DecodedSample {
            host: lookup(1)?,
            category: lookup(2)?,
            counter: lookup(3)?,
            instance: if path.depth() == 4 {
                Some(lookup(4)?)
            } else {
                None
            },
            value,
            timestamp: self.timestamp.clone(),
        })
    }
}

#[cfg(test)]
#[path = "decoder_test.rs"]
mod tests;
