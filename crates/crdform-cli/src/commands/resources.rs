//! Resources command - list registered resource types

use miette::{IntoDiagnostic, Result};

use crate::config::ProviderConfig;
use crate::display;

pub fn run(config: &ProviderConfig, json: bool) -> Result<()> {
    let provider = config.build_provider()?;
    let metadata = provider.metadata();

    if json {
        println!("{}", serde_json::to_string_pretty(&metadata).into_diagnostic()?);
    } else {
        display::print_resources(&metadata);
    }
    Ok(())
}
