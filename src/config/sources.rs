use super::models::{ActionInputs, BuildInfo};
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "SITEPUSH_CONFIG";
/// Inputs arrive as `INPUT_<NAME>`, e.g. `INPUT_SITE_ID`
const INPUT_PREFIX: &str = "INPUT";

/// Load inputs with priority (lowest to highest):
/// 1. TOML file, when one is given or named by `SITEPUSH_CONFIG`
/// 2. Variables from a `.env` file (via dotenvy)
/// 3. Process environment
pub fn load(config_path: Option<PathBuf>) -> Result<ActionInputs, ConfigError> {
    // A missing .env file is normal
    let _ = dotenvy::dotenv();

    let config_path = config_path.or_else(|| env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from));

    load_from_sources(config_path, Environment::with_prefix(INPUT_PREFIX))
}

/// Load inputs from an optional file and a given environment source
pub fn load_from_sources(
    config_path: Option<PathBuf>,
    environment: Environment,
) -> Result<ActionInputs, ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = config_path {
        if path.exists() {
            tracing::info!("Loading inputs from: {}", path.display());
            builder = builder.add_source(File::from(path).required(false));
        } else {
            tracing::warn!(
                "Input file not found at {}, using environment only",
                path.display()
            );
        }
    }

    builder = builder.add_source(environment);

    let inputs: ActionInputs = builder.build()?.try_deserialize()?;
    Ok(blank_as_missing(inputs))
}

/// Read the identity of the triggering build
pub fn build_info() -> BuildInfo {
    BuildInfo {
        run_id: non_empty_var("GITHUB_RUN_ID"),
        repository: non_empty_var("GITHUB_REPOSITORY"),
        commit: non_empty_var("GITHUB_SHA"),
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

// The runner exports every declared input, empty when the workflow leaves it unset.
fn blank_as_missing(inputs: ActionInputs) -> ActionInputs {
    fn keep(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    ActionInputs {
        api_token: keep(inputs.api_token),
        site_id: keep(inputs.site_id),
        api_base_url: keep(inputs.api_base_url),
        source_dir: keep(inputs.source_dir),
        max_file_size: keep(inputs.max_file_size),
    }
}
