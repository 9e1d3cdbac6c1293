//! Incremental-dictionary wire encoder
//!
//! `WireEncoder` turns the sample stream of one subscriber into `C`/`T`/`D`
//! lines. Every name is replaced by a small integer the first time it is
//! seen on the connection; the `C` line declaring that mapping is emitted
//! exactly once, immediately before the first line that uses it.
//!
//! # Id Scopes
//!
//! ```text
//! host                      per connection
//! host.category             per host, one allocator for both lookup tables
//!                           ("with instances" / "without instances")
//! host.category.counter     per category
//! ...counter.instance       per counter of an instance-bearing category
//! ```
//!
//! Ids are allocated in first-seen order starting at 0 and never released,
//! so the next id is always `max + 1`. Two connections may assign different
//! ids to the same entity.

use std::collections::HashMap;
use std::fmt::Write;

use crate::error::ProtocolError;
use crate::event::{CategoryEvent, SampleEvent};
use crate::format::{format_timestamp, format_value};
use crate::Result;

/// Encoder settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Append the zone offset to `T` lines
    pub timestamp_offset: bool,
}

/// Name → id dictionary with first-seen allocation
#[derive(Debug, Default)]
struct IdTable {
    ids: HashMap<String, u32>,
}

impl IdTable {
    /// Resolve `name`, allocating the next id on first sight
    ///
    /// Returns the id and whether it was newly allocated.
    fn resolve(&mut self, name: &str) -> (u32, bool) {
        if let Some(&id) = self.ids.get(name) {
            return (id, false);
        }
        let id = self.ids.len() as u32;
        self.ids.insert(name.to_string(), id);
        (id, true)
    }
}

#[derive(Debug, Default)]
struct CategoryCatalog {
    counters: IdTable,
    /// Instance tables, indexed by counter id (instance-bearing categories only)
    instances: Vec<IdTable>,
}

#[derive(Debug, Default)]
struct HostCatalog {
    without_instances: HashMap<String, u32>,
    with_instances: HashMap<String, u32>,
    /// Indexed by category id
    categories: Vec<CategoryCatalog>,
}

/// Category the following data events belong to
#[derive(Debug)]
struct Current {
    host: usize,
    category: usize,
    has_instances: bool,
    name: String,
}

/// Per-connection catalog/data encoder
#[derive(Debug, Default)]
pub struct WireEncoder {
    options: EncoderOptions,
    host_ids: IdTable,
    /// Indexed by host id
    hosts: Vec<HostCatalog>,
    current: Option<Current>,
}

impl WireEncoder {
    /// Create an encoder with an empty catalog
    pub fn new(options: EncoderOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Encode any sample event
    pub fn encode(&mut self, event: &SampleEvent, out: &mut String) -> Result<()> {
        match event {
            SampleEvent::Category(category) => {
                self.encode_category(category, out);
                Ok(())
            }
            SampleEvent::Data(data) => match data.instance {
                Some(ref instance) => {
                    self.encode_instance_data(&data.counter, instance, data.value, out)
                }
                None => self.encode_data(&data.counter, data.value, out),
            },
        }
    }

    /// Encode a category boundary
    ///
    /// Declares the host and category if new, emits the `T` line and makes
    /// the category current for the following data events.
    pub fn encode_category(&mut self, event: &CategoryEvent, out: &mut String) {
        let (host_id, new_host) = self.host_ids.resolve(&event.host);
        if new_host {
            self.hosts.push(HostCatalog::default());
            let _ = writeln!(out, "C {} {}", host_id, clean(&event.host));
        }

        let host = &mut self.hosts[host_id as usize];
        let table = if event.has_instances {
            &mut host.with_instances
        } else {
            &mut host.without_instances
        };
        let category_id = match table.get(&event.category) {
            Some(&id) => id,
            None => {
                let id = host.categories.len() as u32;
                table.insert(event.category.clone(), id);
                host.categories.push(CategoryCatalog::default());
                let _ = writeln!(out, "C {}.{} {}", host_id, id, clean(&event.category));
                id
            }
        };

        let _ = writeln!(
            out,
            "T {}",
            format_timestamp(&event.timestamp, self.options.timestamp_offset)
        );

        self.current = Some(Current {
            host: host_id as usize,
            category: category_id as usize,
            has_instances: event.has_instances,
            name: event.category.clone(),
        });
    }

    /// Encode a sample of a single-instance category
    pub fn encode_data(&mut self, counter: &str, value: f64, out: &mut String) -> Result<()> {
        let (host_id, category_id) = self.current_ids(counter, false)?;
        let category = &mut self.hosts[host_id].categories[category_id];

        let (counter_id, new_counter) = category.counters.resolve(counter);
        if new_counter {
            let _ = writeln!(out, "C {}.{}.{} {}", host_id, category_id, counter_id, clean(counter));
        }

        let _ = writeln!(
            out,
            "D {}.{}.{} {}",
            host_id,
            category_id,
            counter_id,
            format_value(value)
        );
        Ok(())
    }

    /// Encode a sample of one instance of a multi-instance category
    pub fn encode_instance_data(
        &mut self,
        counter: &str,
        instance: &str,
        value: f64,
        out: &mut String,
    ) -> Result<()> {
        let (host_id, category_id) = self.current_ids(counter, true)?;
        let category = &mut self.hosts[host_id].categories[category_id];

        let (counter_id, new_counter) = category.counters.resolve(counter);
        if new_counter {
            category.instances.push(IdTable::default());
            let _ = writeln!(out, "C {}.{}.{} {}", host_id, category_id, counter_id, clean(counter));
        }

        let (instance_id, new_instance) = category.instances[counter_id as usize].resolve(instance);
        if new_instance {
            let _ = writeln!(
                out,
                "C {}.{}.{}.{} {}",
                host_id,
                category_id,
                counter_id,
                instance_id,
                clean(instance)
            );
        }

        let _ = writeln!(
            out,
            "D {}.{}.{}.{} {}",
            host_id,
            category_id,
            counter_id,
            instance_id,
            format_value(value)
        );
        Ok(())
    }

    /// Number of distinct hosts declared on this connection
    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    fn current_ids(&self, counter: &str, with_instance: bool) -> Result<(usize, usize)> {
        let current = self
            .current
            .as_ref()
            .ok_or_else(|| ProtocolError::NoActiveCategory {
                counter: counter.to_string(),
            })?;

        if current.has_instances != with_instance {
            return Err(ProtocolError::instance_mismatch(
                &current.name,
                current.has_instances,
            ));
        }

        Ok((current.host, current.category))
    }
}

/// Names end at the line break, so embedded breaks are flattened
fn clean(name: &str) -> std::borrow::Cow<'_, str> {
    if name.contains(['\r', '\n']) {
        name.replace(['\r', '\n'], " ").into()
    } else {
        name.into()
    }
}

#[cfg(test)]
#[path = "encoder_test.rs"]
mod tests;
