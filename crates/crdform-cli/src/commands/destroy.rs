//! Destroy command - Delete, then drop the state entry

use console::style;
use miette::Result;

use crate::config::ProviderConfig;
use crate::error::CliError;
use crate::state::StateStore;

pub fn run(config: &ProviderConfig, resource_type: &str, name: &str) -> Result<()> {
    let provider = config.build_provider()?;
    let resource = provider.resource(resource_type).map_err(CliError::from)?;
    let mut store = StateStore::load(&config.state_file)?;

    let entry = store
        .get(resource_type, name)
        .ok_or_else(|| super::refresh::no_state(&store, resource_type, name))?;
    resource.delete(&entry.state).map_err(CliError::from)?;

    store.remove(resource_type, name);
    store.save()?;

    println!(
        "{} Destroyed {}",
        style("✓").green(),
        StateStore::key(resource_type, name)
    );
    Ok(())
}
