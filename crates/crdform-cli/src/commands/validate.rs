//! Validate command - check a configuration against a resource schema

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::config::ProviderConfig;
use crate::display;
use crate::error::CliError;

pub fn run(
    config: &ProviderConfig,
    resource_type: &str,
    files: &[PathBuf],
    set_values: &[String],
    json_output: bool,
) -> Result<()> {
    let provider = config.build_provider()?;
    let resource = provider.resource(resource_type).map_err(CliError::from)?;
    let values = super::load_resource_config(files, set_values)?;

    if !json_output {
        println!("{} Validating configuration for {}", style("→").blue(), resource_type);
    }

    let diagnostics = resource.validate(&values);
    let errors = diagnostics.errors().count();
    let warnings = diagnostics.warnings().count();

    if json_output {
        let output = serde_json::json!({
            "valid": errors == 0,
            "resource": resource_type,
            "diagnostics": diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
    } else {
        if !diagnostics.is_empty() {
            display::print_diagnostics(resource_type, &diagnostics);
        }
        println!();
        display::print_summary(&diagnostics);
    }

    if errors > 0 {
        return Err(CliError::ValidationFailed { errors, warnings }.into());
    }
    Ok(())
}
