//! Monitored host configuration

use serde::Deserialize;

/// One monitored host and the categories to register on it
///
/// # Example
///
/// ```toml
/// [[hosts]]
/// name = "localhost"
/// categories = "^(Processor|Memory)$"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HostConfig {
    /// Host name (`localhost`, `.`, or a machine name)
    pub name: String,

    /// Regular expression selecting the categories to register
    /// Default: ".*" (every available category)
    #[serde(default = "default_categories")]
    pub categories: String,
}

fn default_categories() -> String {
    ".*".into()
}

impl HostConfig {
    /// Host entry registering every available category
    pub fn all_categories(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            categories: default_categories(),
        }
    }
}
