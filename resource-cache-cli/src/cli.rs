use clap::{Parser, ValueEnum};
use resource_cache::HostPlatform;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PlatformArg {
    Android,
    Ios,
    Web,
}

impl From<PlatformArg> for HostPlatform {
    fn from(value: PlatformArg) -> Self {
        match value {
            PlatformArg::Android => HostPlatform::Android,
            PlatformArg::Ios => HostPlatform::Ios,
            PlatformArg::Web => HostPlatform::Web,
        }
    }
}

/// Define CLI arguments
#[derive(Parser)]
#[command(
    version,
    about = "Resolve and cache game resources",
    long_about = "Runs one caching pass over the fonts, assets and image placeholders of a\n\
                  resource manifest and prints what every key resolved to: a local object\n\
                  URL, or the origin URI when only a direct load was possible."
)]
pub struct CliArgs {
    /// Resource manifest (JSON)
    #[arg(help = "Path to a resource manifest JSON file")]
    pub manifest: Option<PathBuf>,

    /// Ad hoc URIs cached outside any list
    #[arg(short, long = "uri", help = "Cache a single URI, may be repeated")]
    pub uris: Vec<String>,

    /// Override the manifest's host platform
    #[arg(short, long, value_enum)]
    pub platform: Option<PlatformArg>,

    /// Override the manifest's game instance id
    #[arg(short, long)]
    pub game_instance_id: Option<u64>,

    /// Document location relative resource paths are resolved against
    #[arg(short, long)]
    pub base_url: Option<String>,

    /// Overall request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Connection timeout in seconds
    #[arg(long, default_value = "10")]
    pub connect_timeout: u64,

    /// Retries on network errors and 5xx responses
    #[arg(long, default_value = "2")]
    pub retries: u32,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable detailed debug logging")]
    pub verbose: bool,
}
