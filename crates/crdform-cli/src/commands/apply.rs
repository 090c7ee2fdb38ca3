//! Apply command - Create or Update, then record the state

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::config::ProviderConfig;
use crate::error::CliError;
use crate::state::{StateEntry, StateStore};

pub fn run(
    config: &ProviderConfig,
    resource_type: &str,
    name: &str,
    files: &[PathBuf],
    set_values: &[String],
) -> Result<()> {
    let provider = config.build_provider()?;
    let resource = provider.resource(resource_type).map_err(CliError::from)?;
    let values = super::load_resource_config(files, set_values)?;
    let mut store = StateStore::load(&config.state_file)?;

    // Nothing is written unless the lifecycle call succeeds
    let (state, action) = match store.get(resource_type, name) {
        Some(entry) => (
            resource.update(&entry.state, &values).map_err(CliError::from)?,
            "Updated",
        ),
        None => (resource.create(&values).map_err(CliError::from)?, "Created"),
    };

    let id = state.id;
    let yaml = state.yaml.clone();
    store.insert(
        name,
        StateEntry {
            resource_type: resource_type.to_string(),
            state,
        },
    );
    // Only a recorded manifest is shown
    store.save()?;
    print!("{}", yaml);

    eprintln!(
        "{} {} {} (id {})",
        style("✓").green(),
        action,
        StateStore::key(resource_type, name),
        id
    );
    Ok(())
}
