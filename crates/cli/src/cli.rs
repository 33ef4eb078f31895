use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use vidgen_core::GenerateVideoRequest;

/// Default config file when neither `--config` nor `VIDGEN_CONFIG` is set.
pub const DEFAULT_CONFIG_PATH: &str = "vidgen.toml";

#[derive(Clone, Debug, Parser)]
#[command(name = "vidgen", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// Configuration file
    #[arg(long, global = true, env = "VIDGEN_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Emit JSON logs and a JSON result
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Check that the job service is up
    Health,
    /// Generate a video and download it
    #[command(alias = "gen")]
    Generate(GenerateArgs),
    /// Show the current state of a job
    Status {
        job_id: String,
    },
    /// Print the effective configuration with the secret redacted
    #[command(alias = "cfg")]
    Config,
}

#[derive(Clone, Debug, Args)]
pub struct GenerateArgs {
    #[arg(long)]
    pub theme: String,

    #[arg(long)]
    pub profile_photo_url: String,

    #[arg(long)]
    pub profile_name: String,

    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub tweet_body: String,

    /// Artifact path; relative paths land under `output.dir`
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Override `poll.deadline_secs`
    #[arg(long)]
    pub deadline_secs: Option<u64>,
}

impl GenerateArgs {
    pub fn request(&self) -> GenerateVideoRequest {
        GenerateVideoRequest {
            theme: self.theme.clone(),
            profile_photo_url: self.profile_photo_url.clone(),
            profile_name: self.profile_name.clone(),
            username: self.username.clone(),
            tweet_body: self.tweet_body.clone(),
        }
    }
}
