//! Schema command - show the attributes a resource type accepts

use miette::{IntoDiagnostic, Result};

use crate::config::ProviderConfig;
use crate::display;
use crate::error::CliError;

pub fn run(config: &ProviderConfig, resource_type: &str, json: bool) -> Result<()> {
    let provider = config.build_provider()?;
    let resource = provider.resource(resource_type).map_err(CliError::from)?;
    let schema = resource.schema();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&schema.to_json_schema()).into_diagnostic()?
        );
    } else {
        display::print_schema(resource_type, schema);
    }
    Ok(())
}
