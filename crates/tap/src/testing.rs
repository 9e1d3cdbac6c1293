//! Test helpers shared by the unit tests

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use perftap_protocol::CategoryEvent;

use crate::error::{Result, TapError};
use crate::listener::SampleListener;

/// Listener that appends a short description of every call to a shared log
pub(crate) struct Recorder {
    log: Arc<Mutex<Vec<String>>>,
    fail_on_counter: Option<&'static str>,
}

impl Recorder {
    pub(crate) fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                log: Arc::clone(&log),
                fail_on_counter: None,
            },
            log,
        )
    }

    pub(crate) fn failing_on(counter: &'static str) -> (Self, Arc<Mutex<Vec<String>>>) {
        let (mut recorder, log) = Self::new();
        recorder.fail_on_counter = Some(counter);
        (recorder, log)
    }
}

#[async_trait]
impl SampleListener for Recorder {
    async fn category(&mut self, event: &CategoryEvent) -> Result<()> {
        self.log.lock().push(format!("cat {}", event.category));
        Ok(())
    }

    async fn data(&mut self, counter: &str, value: f64) -> Result<()> {
        if self.fail_on_counter == Some(counter) {
            return Err(TapError::WriterClosed);
        }
        self.log.lock().push(format!("data {}={}", counter, value));
        Ok(())
    }

    async fn instance_data(&mut self, counter: &str, instance: &str, value: f64) -> Result<()> {
        self.log
            .lock()
            .push(format!("data {}({})={}", counter, instance, value));
        Ok(())
    }

    async fn close(&mut self) {
        self.log.lock().push("close".into());
    }
}

/// Listener that parks inside one category until released
pub(crate) struct Stall {
    category: &'static str,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl Stall {
    /// Returns the listener plus its (entered, release) signals
    pub(crate) fn on(category: &'static str) -> (Self, Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        (
            Self {
                category,
                entered: Arc::clone(&entered),
                release: Arc::clone(&release),
            },
            entered,
            release,
        )
    }
}

#[async_trait]
impl SampleListener for Stall {
    async fn category(&mut self, event: &CategoryEvent) -> Result<()> {
        if event.category == self.category {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(())
    }

    async fn data(&mut self, _counter: &str, _value: f64) -> Result<()> {
        Ok(())
    }

    async fn instance_data(&mut self, _counter: &str, _instance: &str, _value: f64) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) {}
}
