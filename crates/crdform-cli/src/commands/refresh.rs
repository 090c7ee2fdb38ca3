//! Refresh command - Read

use miette::{IntoDiagnostic, Result};

use crate::config::ProviderConfig;
use crate::error::CliError;
use crate::state::StateStore;

pub fn run(config: &ProviderConfig, resource_type: &str, name: &str) -> Result<()> {
    let provider = config.build_provider()?;
    let resource = provider.resource(resource_type).map_err(CliError::from)?;
    let store = StateStore::load(&config.state_file)?;

    let entry = store
        .get(resource_type, name)
        .ok_or_else(|| no_state(&store, resource_type, name))?;
    let state = resource.read(entry.state.clone()).map_err(CliError::from)?;

    print!("{}", serde_yaml::to_string(&state).into_diagnostic()?);
    Ok(())
}

pub(crate) fn no_state(store: &StateStore, resource_type: &str, name: &str) -> CliError {
    CliError::Validation {
        message: format!("no state recorded for {}", StateStore::key(resource_type, name)),
        help: Some(format!("state file: {}", store.path().display())),
    }
}
