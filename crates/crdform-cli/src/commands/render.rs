//! Render command - stateless Create

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

use crate::config::ProviderConfig;
use crate::error::CliError;

pub fn run(
    config: &ProviderConfig,
    resource_type: &str,
    files: &[PathBuf],
    set_values: &[String],
    output: Option<&Path>,
    show_state: bool,
) -> Result<()> {
    let provider = config.build_provider()?;
    let resource = provider.resource(resource_type).map_err(CliError::from)?;
    let values = super::load_resource_config(files, set_values)?;

    let state = resource.create(&values).map_err(CliError::from)?;

    let content = if show_state {
        serde_yaml::to_string(&state).into_diagnostic()?
    } else {
        state.yaml
    };

    match output {
        Some(path) => {
            std::fs::write(path, &content).map_err(CliError::from)?;
            println!("{} Wrote {}", style("✓").green(), path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}
