//! Opening sources for configured hosts and registering their categories

use regex::Regex;
use tracing::info;

use crate::error::Result;
use crate::source::CounterSource;
use crate::system::SystemSource;

/// Open the counter source for `host`
pub fn open_source(host: &str) -> Result<Box<dyn CounterSource>> {
    Ok(Box::new(SystemSource::open(host)?))
}

/// Register every available category whose name matches `pattern`
///
/// Returns the names registered by this call.
pub fn register_matching(source: &mut dyn CounterSource, pattern: &Regex) -> Result<Vec<String>> {
    let mut registered = Vec::new();

    for category in source.available_categories() {
        if !pattern.is_match(&category.name) {
            continue;
        }
        source.register(&category.name)?;
        info!("{}: {}", source.host(), category.name);
        registered.push(category.name);
    }

    Ok(registered)
}

#[cfg(test)]
#[path = "registration_test.rs"]
mod tests;
