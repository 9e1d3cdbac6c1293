//! Sample listener interface
//!
//! Every stage a sample passes through after the bus (filter, wire sink,
//! test recorders) implements `SampleListener`, one method per event shape.
//! The bus calls them strictly in stream order, so a `data` call always
//! belongs to the most recent `category` call on the same listener.

use async_trait::async_trait;

use perftap_protocol::{CategoryEvent, SampleEvent};

use crate::error::Result;

/// Receiver of the sample stream
#[async_trait]
pub trait SampleListener: Send {
    /// Start of a host/category batch
    async fn category(&mut self, event: &CategoryEvent) -> Result<()>;

    /// Sample of a category without instances
    async fn data(&mut self, counter: &str, value: f64) -> Result<()>;

    /// Sample of an instance-bearing category
    async fn instance_data(&mut self, counter: &str, instance: &str, value: f64) -> Result<()>;

    /// Release resources; no further calls follow
    async fn close(&mut self);
}

/// Route one event to the matching listener method
pub async fn dispatch<L>(listener: &mut L, event: &SampleEvent) -> Result<()>
where
    L: SampleListener + ?Sized,
{
    match event {
        SampleEvent::Category(category) => listener.category(category).await,
        SampleEvent::Data(data) => match data.instance.as_deref() {
            Some(instance) => {
                listener
                    .instance_data(&data.counter, instance, data.value)
                    .await
            }
            None => listener.data(&data.counter, data.value).await,
        },
    }
}
