//! Import-crd command - generate definition files from a CRD

use console::style;
use crdform_core::CrdImporter;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::config::ProviderConfig;
use crate::error::CliError;

pub fn run(config: &ProviderConfig, crd: &Path, output: Option<&Path>) -> Result<()> {
    let definitions = CrdImporter::import_file(crd).map_err(CliError::from)?;
    if definitions.is_empty() {
        return Err(CliError::definition(format!(
            "{} has no served versions with a schema",
            crd.display()
        ))
        .into());
    }

    match output {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(CliError::from)?;
            for definition in &definitions {
                let file = dir.join(format!(
                    "{}-{}.yaml",
                    definition.kind.to_lowercase(),
                    definition.version()
                ));
                let content = serde_yaml::to_string(definition).into_diagnostic()?;
                std::fs::write(&file, content).map_err(CliError::from)?;
                println!(
                    "{} Wrote {} ({})",
                    style("✓").green(),
                    file.display(),
                    definition.type_name(&config.provider_prefix)
                );
            }
        }
        None => {
            for (index, definition) in definitions.iter().enumerate() {
                if index > 0 {
                    println!("---");
                }
                print!("{}", serde_yaml::to_string(definition).into_diagnostic()?);
            }
        }
    }
    Ok(())
}
