use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sitepush", version)]
#[command(about = "Upload a built site directory to the hosting API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload every file under the source directory
    Upload(RunArgs),
    /// Only check that the token can reach the site
    Probe(RunArgs),
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// TOML file with inputs; environment variables still take priority
    #[arg(long)]
    pub config: Option<PathBuf>,
}
