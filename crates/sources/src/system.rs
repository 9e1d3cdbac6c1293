//! Local machine counters backed by `sysinfo`
//!
//! Exposes a small fixed catalog of categories modelled on the classic
//! performance-counter names. Only the machine the server runs on can be
//! sampled; remote hosts are rejected when the source is opened.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Local;
use parking_lot::Mutex;
use sysinfo::{Disks, Networks, System};
use tracing::{debug, trace};

use perftap_protocol::{CategoryEvent, DataEvent};

use crate::error::{Result, SourceError};
use crate::rate::RateTracker;
use crate::source::{CategoryBatch, CategoryInfo, CounterSource};

/// Instance name carrying the aggregate over all processors
pub const TOTAL_INSTANCE: &str = "_Total";

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Categories the local source can sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocalCategory {
    Processor,
    Memory,
    System,
    NetworkInterface,
    LogicalDisk,
}

impl LocalCategory {
    pub const ALL: [LocalCategory; 5] = [
        LocalCategory::Processor,
        LocalCategory::Memory,
        LocalCategory::System,
        LocalCategory::NetworkInterface,
        LocalCategory::LogicalDisk,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LocalCategory::Processor => "Processor",
            LocalCategory::Memory => "Memory",
            LocalCategory::System => "System",
            LocalCategory::NetworkInterface => "Network Interface",
            LocalCategory::LogicalDisk => "LogicalDisk",
        }
    }

    pub fn has_instances(self) -> bool {
        matches!(
            self,
            LocalCategory::Processor | LocalCategory::NetworkInterface | LocalCategory::LogicalDisk
        )
    }

    /// Look a category up by name, ignoring ASCII case
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.name().eq_ignore_ascii_case(name))
    }

    pub fn info(self) -> CategoryInfo {
        CategoryInfo {
            name: self.name().to_owned(),
            has_instances: self.has_instances(),
        }
    }
}

impl fmt::Display for LocalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether `host` names the machine this process runs on
pub fn is_local_host(host: &str) -> bool {
    host == "."
        || host.eq_ignore_ascii_case("localhost")
        || System::host_name().is_some_and(|name| name.eq_ignore_ascii_case(host))
}

/// Counter source for the local machine
pub struct SystemSource {
    host: String,
    registered: Vec<LocalCategory>,
    sampler: Arc<Mutex<Sampler>>,
}

impl SystemSource {
    /// Open a source for `host`, which must name the local machine
    pub fn open(host: &str) -> Result<Self> {
        if !is_local_host(host) {
            return Err(SourceError::UnsupportedHost {
                host: host.to_owned(),
            });
        }

        Ok(Self {
            host: host.to_owned(),
            registered: Vec::new(),
            sampler: Arc::new(Mutex::new(Sampler::new())),
        })
    }
}

impl fmt::Debug for SystemSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemSource")
            .field("host", &self.host)
            .field("registered", &self.registered)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CounterSource for SystemSource {
    fn host(&self) -> &str {
        &self.host
    }

    fn available_categories(&self) -> Vec<CategoryInfo> {
        LocalCategory::ALL.into_iter().map(LocalCategory::info).collect()
    }

    fn register(&mut self, category: &str) -> Result<()> {
        let category = LocalCategory::from_name(category)
            .ok_or_else(|| SourceError::unknown_category(&self.host, category))?;

        if !self.registered.contains(&category) {
            debug!(host = %self.host, category = %category, "category registered");
            self.registered.push(category);
        }
        Ok(())
    }

    fn registered(&self) -> Vec<String> {
        self.registered
            .iter()
            .map(|category| category.name().to_owned())
            .collect()
    }

    async fn poll(&mut self) -> Result<Vec<CategoryBatch>> {
        if self.registered.is_empty() {
            return Ok(Vec::new());
        }

        let sampler = Arc::clone(&self.sampler);
        let host = self.host.clone();
        let categories = self.registered.clone();

        // sysinfo reads /proc and friends synchronously
        tokio::task::spawn_blocking(move || sampler.lock().sample(&host, &categories))
            .await
            .map_err(|e| SourceError::sampling(&self.host, e))
    }
}

/// Raw sysinfo state kept between polls
struct Sampler {
    system: System,
    networks: Networks,
    disks: Disks,
    rates: RateTracker,
    primed: HashSet<LocalCategory>,
}

impl Sampler {
    fn new() -> Self {
        Self {
            system: System::new(),
            networks: Networks::new_with_refreshed_list(),
            disks: Disks::new_with_refreshed_list(),
            rates: RateTracker::new(),
            primed: HashSet::new(),
        }
    }

    fn sample(&mut self, host: &str, categories: &[LocalCategory]) -> Vec<CategoryBatch> {
        let timestamp = Local::now().fixed_offset();
        let now = Instant::now();

        let mut batches = Vec::with_capacity(categories.len());
        for &category in categories {
            let samples = self.read(category, now);

            // the first read only establishes the baseline
            if self.primed.insert(category) {
                trace!(host, category = %category, "category primed");
                continue;
            }

            batches.push(CategoryBatch {
                category: CategoryEvent::new(
                    host,
                    category.name(),
                    category.has_instances(),
                    timestamp,
                ),
                samples,
            });
        }
        batches
    }

    fn read(&mut self, category: LocalCategory, now: Instant) -> Vec<DataEvent> {
        match category {
            LocalCategory::Processor => self.read_processor(),
            LocalCategory::Memory => self.read_memory(),
            LocalCategory::System => read_system(),
            LocalCategory::NetworkInterface => self.read_network(now),
            LocalCategory::LogicalDisk => self.read_disks(),
        }
    }

    fn read_processor(&mut self) -> Vec<DataEvent> {
        const COUNTER: &str = "% Processor Time";

        self.system.refresh_cpu_usage();
        let cpus = self.system.cpus();

        let mut samples = Vec::with_capacity(cpus.len() + 1);
        for (index, cpu) in cpus.iter().enumerate() {
            samples.push(DataEvent::with_instance(
                COUNTER,
                index.to_string(),
                f64::from(cpu.cpu_usage()),
            ));
        }
        samples.push(DataEvent::with_instance(
            COUNTER,
            TOTAL_INSTANCE,
            f64::from(self.system.global_cpu_usage()),
        ));
        samples
    }

    fn read_memory(&mut self) -> Vec<DataEvent> {
        self.system.refresh_memory();
        vec![
            DataEvent::new("Available Bytes", self.system.available_memory() as f64),
            DataEvent::new("Used Bytes", self.system.used_memory() as f64),
            DataEvent::new("Free Bytes", self.system.free_memory() as f64),
            DataEvent::new("Swap Used Bytes", self.system.used_swap() as f64),
        ]
    }

    fn read_network(&mut self, now: Instant) -> Vec<DataEvent> {
        self.networks.refresh(true);

        let mut interfaces: Vec<_> = self.networks.list().iter().collect();
        interfaces.sort_by(|a, b| a.0.cmp(b.0));

        let mut samples = Vec::new();
        for (interface, data) in interfaces {
            let counters = [
                ("Bytes Received/sec", data.total_received()),
                ("Bytes Sent/sec", data.total_transmitted()),
                ("Packets Received/sec", data.total_packets_received()),
                ("Packets Sent/sec", data.total_packets_transmitted()),
            ];
            for (counter, raw) in counters {
                let key = rate_key(interface, counter);
                if let Some(rate) = self.rates.rate(&key, raw, now) {
                    samples.push(DataEvent::with_instance(counter, interface.as_str(), rate));
                }
            }
        }

        let networks = &self.networks;
        self.rates.retain(|key| {
            key.split_once('\\')
                .is_some_and(|(interface, _)| networks.list().contains_key(interface))
        });
        samples
    }

    fn read_disks(&mut self) -> Vec<DataEvent> {
        self.disks.refresh(true);

        let mut samples = Vec::new();
        for disk in self.disks.list() {
            let mount = disk.mount_point().to_string_lossy().into_owned();
            let available = disk.available_space() as f64;
            samples.push(DataEvent::with_instance(
                "Free Megabytes",
                mount.clone(),
                available / BYTES_PER_MEGABYTE,
            ));
            if disk.total_space() > 0 {
                samples.push(DataEvent::with_instance(
                    "% Free Space",
                    mount,
                    available / disk.total_space() as f64 * 100.0,
                ));
            }
        }
        samples
    }
}

fn read_system() -> Vec<DataEvent> {
    let load = System::load_average();
    vec![
        DataEvent::new("Load Average 1m", load.one),
        DataEvent::new("Load Average 5m", load.five),
        DataEvent::new("Load Average 15m", load.fifteen),
        DataEvent::new("System Up Time", System::uptime() as f64),
    ]
}

fn rate_key(interface: &str, counter: &str) -> String {
    format!("{}\\{}", interface, counter)
}

#[cfg(test)]
#[path = "system_test.rs"]
mod tests;
