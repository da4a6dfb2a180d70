//! Step outputs and annotations for the hosting workflow runner
//!
//! The runner reads outputs from the file named by `GITHUB_OUTPUT` and
//! annotations from `::warning::` / `::error::` lines on stdout.

use std::collections::BTreeMap;
use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

const OUTPUT_FILE_VAR: &str = "GITHUB_OUTPUT";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("Value of output '{name}' contains the delimiter")]
    DelimiterCollision { name: String },
}

/// Where an upload run reports its results
pub trait ActionOutputs {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), OutputError>;

    /// Non-fatal annotation
    fn warning(&mut self, message: &str);

    /// Annotation for the failure that ends the run
    fn error(&mut self, message: &str);
}

/// Workflow-command sink: output file when available, stdout commands otherwise
pub struct WorkflowCommands<W: Write = io::Stdout> {
    output_file: Option<PathBuf>,
    out: W,
}

impl WorkflowCommands<io::Stdout> {
    pub fn from_env() -> Self {
        let output_file = env::var(OUTPUT_FILE_VAR)
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::new(output_file, io::stdout())
    }
}

impl<W: Write> WorkflowCommands<W> {
    pub fn new(output_file: Option<PathBuf>, out: W) -> Self {
        Self { output_file, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn command(&mut self, command: &str, message: &str) {
        // stdout going away leaves nothing useful to report to
        let _ = writeln!(self.out, "::{command}::{}", escape_data(message));
    }
}

impl<W: Write> ActionOutputs for WorkflowCommands<W> {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), OutputError> {
        let Some(path) = &self.output_file else {
            let _ = writeln!(
                self.out,
                "::set-output name={}::{}",
                escape_property(name),
                escape_data(value)
            );
            return Ok(());
        };

        let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
        if name.contains(&delimiter) || value.contains(&delimiter) {
            return Err(OutputError::DelimiterCollision {
                name: name.to_string(),
            });
        }

        let io_error = |source: io::Error| OutputError::Io {
            name: name.to_string(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_error)?;
        write!(file, "{name}<<{delimiter}\n{value}\n{delimiter}\n").map_err(io_error)
    }

    fn warning(&mut self, message: &str) {
        self.command("warning", message);
    }

    fn error(&mut self, message: &str) {
        self.command("error", message);
    }
}

/// Records everything in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryOutputs {
    pub outputs: BTreeMap<String, String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl MemoryOutputs {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.outputs.get(name).map(String::as_str)
    }
}

impl ActionOutputs for MemoryOutputs {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), OutputError> {
        self.outputs.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    fn error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}
