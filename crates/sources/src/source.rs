//! Counter source interface
//!
//! A source samples the performance counters of one host. Categories must
//! be registered before they are polled; each poll returns one batch per
//! registered category that has values ready.

use async_trait::async_trait;

use perftap_protocol::{CategoryEvent, DataEvent, SampleEvent};

use crate::error::Result;

/// A category a host can be asked to sample
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CategoryInfo {
    /// Category name
    pub name: String,
    /// Whether samples of this category are keyed by instance
    pub has_instances: bool,
}

/// Samples of one category taken in a single poll
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBatch {
    pub category: CategoryEvent,
    pub samples: Vec<DataEvent>,
}

impl CategoryBatch {
    pub fn new(category: CategoryEvent) -> Self {
        Self {
            category,
            samples: Vec::new(),
        }
    }

    /// Append one sample
    pub fn push(&mut self, sample: DataEvent) {
        self.samples.push(sample);
    }

    /// Events in delivery order: the category first, then its samples
    pub fn into_events(self) -> impl Iterator<Item = SampleEvent> {
        std::iter::once(SampleEvent::from(self.category))
            .chain(self.samples.into_iter().map(SampleEvent::from))
    }
}

/// Performance counters of one host
#[async_trait]
pub trait CounterSource: Send + Sync {
    /// Host this source samples
    fn host(&self) -> &str;

    /// Categories the host exposes
    fn available_categories(&self) -> Vec<CategoryInfo>;

    /// Add a category to the set sampled by [`poll`](Self::poll)
    ///
    /// Registering an already registered category is a no-op.
    fn register(&mut self, category: &str) -> Result<()>;

    /// Registered categories, in registration order
    fn registered(&self) -> Vec<String>;

    /// Sample every registered category
    ///
    /// A category yields no batch on its first poll: values are computed
    /// from the two most recent raw samples.
    async fn poll(&mut self) -> Result<Vec<CategoryBatch>>;
}
