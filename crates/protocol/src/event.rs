//! Sample stream events
//!
//! A poll cycle produces, per host and registered category, one
//! `CategoryEvent` followed by zero or more `DataEvent`s. Data events carry
//! no back-reference: they belong to the most recent category event on the
//! same delivery path, so ordering is the only linkage.

use chrono::{DateTime, FixedOffset};

/// Start of a batch of samples for one host/category pair
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryEvent {
    /// Host the samples were taken on
    pub host: String,
    /// Category name (e.g. "Processor")
    pub category: String,
    /// Whether the data events of this batch carry an instance name
    pub has_instances: bool,
    /// Sampling time of the batch
    pub timestamp: DateTime<FixedOffset>,
}

impl CategoryEvent {
    /// Create a new category event
    pub fn new(
        host: impl Into<String>,
        category: impl Into<String>,
        has_instances: bool,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            host: host.into(),
            category: category.into(),
            has_instances,
            timestamp,
        }
    }
}

/// One counter value within the current category batch
#[derive(Debug, Clone, PartialEq)]
pub struct DataEvent {
    /// Counter name (e.g. "% Processor Time")
    pub counter: String,
    /// Instance name, present iff the governing category has instances
    pub instance: Option<String>,
    /// Sampled value
    pub value: f64,
}

impl DataEvent {
    /// Sample of a counter in a single-instance category
    pub fn new(counter: impl Into<String>, value: f64) -> Self {
        Self {
            counter: counter.into(),
            instance: None,
            value,
        }
    }

    /// Sample of one instance of a counter in a multi-instance category
    pub fn with_instance(counter: impl Into<String>, instance: impl Into<String>, value: f64) -> Self {
        Self {
            counter: counter.into(),
            instance: Some(instance.into()),
            value,
        }
    }
}

/// Tagged event flowing through the broadcast bus
#[derive(Debug, Clone, PartialEq)]
pub enum SampleEvent {
    /// Category boundary
    Category(CategoryEvent),
    /// Sample belonging to the preceding category
    Data(DataEvent),
}

impl From<CategoryEvent> for SampleEvent {
    fn from(event: CategoryEvent) -> Self {
        Self::Category(event)
    }
}

impl From<DataEvent> for SampleEvent {
    fn from(event: DataEvent) -> Self {
        Self::Data(event)
    }
}
