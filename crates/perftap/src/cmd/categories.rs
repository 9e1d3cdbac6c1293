//! Categories command - list what a host can be asked to sample

use anyhow::{Context, Result};
use clap::Args;

use perftap_sources::{CategoryInfo, open_source};

/// Categories command arguments
#[derive(Args, Debug)]
pub struct CategoriesArgs {
    /// Host to inspect
    #[arg(long, default_value = "localhost")]
    host: String,
}

/// Run the categories command
pub fn run(args: CategoriesArgs) -> Result<()> {
    let source = open_source(&args.host)
        .with_context(|| format!("cannot list categories of {}", args.host))?;

    for category in source.available_categories() {
        println!("{}", render(&category));
    }
    Ok(())
}

/// One output line; instance-bearing categories are marked
fn render(category: &CategoryInfo) -> String {
    if category.has_instances {
        format!("{} (instances)", category.name)
    } else {
        category.name.clone()
    }
}
