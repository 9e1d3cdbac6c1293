//! Per-subscriber sample filter
//!
//! `FilterHandle` is the control side: the connection's command loop swaps
//! patterns and toggles the active flag through it. `SampleFilter` is the
//! data side: a [`SampleListener`] registered on the bus that reads the
//! same state on every event and forwards matches downstream.
//!
//! Each pattern is an `Arc<Regex>` behind its own lock; a write replaces
//! the whole compiled pattern and a read clones the `Arc`, so the poll path
//! never observes a half-updated filter and never holds a lock across I/O.
//!
//! Host and category matches are evaluated only on category events and
//! held until the next one; data events test the counter (and instance)
//! pattern on top of that remembered decision.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use parking_lot::RwLock;
use regex::Regex;

use perftap_protocol::{CategoryEvent, FilterField};

use crate::error::{Result, TapError};
use crate::listener::SampleListener;

/// Pattern every field starts with
pub const MATCH_ALL: &str = ".*";

static MATCH_ALL_REGEX: LazyLock<Arc<Regex>> =
    LazyLock::new(|| Arc::new(Regex::new(MATCH_ALL).expect("match-all pattern compiles")));

#[derive(Debug)]
struct FilterState {
    hosts: RwLock<Arc<Regex>>,
    categories: RwLock<Arc<Regex>>,
    counters: RwLock<Arc<Regex>>,
    instances: RwLock<Arc<Regex>>,
    active: AtomicBool,
}

impl FilterState {
    fn slot(&self, field: FilterField) -> &RwLock<Arc<Regex>> {
        match field {
            FilterField::Hosts => &self.hosts,
            FilterField::Categories => &self.categories,
            FilterField::Counters => &self.counters,
            FilterField::Instances => &self.instances,
        }
    }
}

/// Shared, runtime-mutable filter state
///
/// Cloning yields another handle to the same state. A new filter matches
/// everything but starts inactive, so a client has to send `start` before
/// any sample flows.
#[derive(Debug, Clone)]
pub struct FilterHandle {
    state: Arc<FilterState>,
}

impl Default for FilterHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterHandle {
    pub fn new() -> Self {
        let all = || RwLock::new(Arc::clone(&MATCH_ALL_REGEX));
        Self {
            state: Arc::new(FilterState {
                hosts: all(),
                categories: all(),
                counters: all(),
                instances: all(),
                active: AtomicBool::new(false),
            }),
        }
    }

    /// Replace one pattern
    ///
    /// On an invalid regex the previous pattern stays in effect.
    pub fn set(&self, field: FilterField, pattern: &str) -> Result<()> {
        let regex = Regex::new(pattern).map_err(|source| TapError::InvalidFilterPattern {
            field: field.keyword(),
            pattern: pattern.to_string(),
            source,
        })?;
        *self.state.slot(field).write() = Arc::new(regex);
        Ok(())
    }

    pub fn set_hosts(&self, pattern: &str) -> Result<()> {
        self.set(FilterField::Hosts, pattern)
    }

    pub fn set_categories(&self, pattern: &str) -> Result<()> {
        self.set(FilterField::Categories, pattern)
    }

    pub fn set_counters(&self, pattern: &str) -> Result<()> {
        self.set(FilterField::Counters, pattern)
    }

    pub fn set_instances(&self, pattern: &str) -> Result<()> {
        self.set(FilterField::Instances, pattern)
    }

    /// Current source text of one pattern
    pub fn pattern(&self, field: FilterField) -> String {
        self.state.slot(field).read().as_str().to_string()
    }

    /// Resume forwarding
    pub fn start(&self) {
        self.state.active.store(true, Ordering::Release);
    }

    /// Pause forwarding
    pub fn stop(&self) {
        self.state.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.state.active.load(Ordering::Acquire)
    }

    #[inline]
    fn matches(&self, field: FilterField, text: &str) -> bool {
        let regex = Arc::clone(&self.state.slot(field).read());
        regex.is_match(text)
    }
}

/// Bus-side stage applying a [`FilterHandle`] in front of `L`
pub struct SampleFilter<L> {
    handle: FilterHandle,
    downstream: L,
    is_current_host: bool,
    is_current_category: bool,
    /// Whether the governing category event went downstream
    forwarded: bool,
}

impl<L: SampleListener> SampleFilter<L> {
    pub fn new(handle: FilterHandle, downstream: L) -> Self {
        Self {
            handle,
            downstream,
            is_current_host: false,
            is_current_category: false,
            forwarded: false,
        }
    }

    #[inline]
    fn passes_batch(&self) -> bool {
        self.handle.is_active()
            && self.forwarded
            && self.is_current_host
            && self.is_current_category
    }
}

#[async_trait]
impl<L: SampleListener> SampleListener for SampleFilter<L> {
    async fn category(&mut self, event: &CategoryEvent) -> Result<()> {
        if !self.handle.is_active() {
            // host/category decisions are kept for a later start
            self.forwarded = false;
            return Ok(());
        }

        self.is_current_host = self.handle.matches(FilterField::Hosts, &event.host);
        self.is_current_category = self
            .handle
            .matches(FilterField::Categories, &event.category);
        self.forwarded = self.is_current_host && self.is_current_category;

        if self.forwarded {
            self.downstream.category(event).await?;
        }
        Ok(())
    }

    async fn data(&mut self, counter: &str, value: f64) -> Result<()> {
        if self.passes_batch() && self.handle.matches(FilterField::Counters, counter) {
            self.downstream.data(counter, value).await?;
        }
        Ok(())
    }

    async fn instance_data(&mut self, counter: &str, instance: &str, value: f64) -> Result<()> {
        if self.passes_batch()
            && self.handle.matches(FilterField::Counters, counter)
            && self.handle.matches(FilterField::Instances, instance)
        {
            self.downstream.instance_data(counter, instance, value).await?;
        }
        Ok(())
    }

    async fn close(&mut self) {
        self.downstream.close().await;
    }
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;
