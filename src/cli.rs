// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use portico::output::OutputMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "portico")]
#[command(about = "Boot, upgrade and remove kamal-proxy across a fleet of hosts")]
#[command(version)]
pub struct Cli {
    /// Show debug logging, including every remote command
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the final result
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Target destination (defined in config)
    #[arg(short, long, global = true)]
    pub destination: Option<String>,

    /// Break deploy locks held by other runs
    #[arg(long, global = true)]
    pub break_lock: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new portico.yml configuration file
    Init {
        /// Service name
        #[arg(long)]
        service: Option<String>,

        /// Application image
        #[arg(long)]
        image: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Start the proxy on every host, creating it where missing
    Boot,

    /// Replace the proxy container with a fresh one from the configured image
    Reboot {
        /// One host at a time, stopping at the first failure
        #[arg(long)]
        rolling: bool,
    },

    /// Upgrade the proxy and swap application containers onto it
    Upgrade {
        /// One host at a time, stopping at the first failure
        #[arg(long)]
        rolling: bool,
    },

    /// Start the existing proxy container
    Start,

    /// Stop the proxy container
    Stop,

    /// Stop and start the proxy container
    Restart,

    /// Show the proxy container on each host
    Details,

    /// Show proxy logs
    Logs {
        /// Number of lines from the end of the logs
        #[arg(short = 'n', long)]
        lines: Option<usize>,

        /// Show logs since a timestamp or duration (e.g. 5m)
        #[arg(short, long)]
        since: Option<String>,

        /// Only lines matching this pattern
        #[arg(short, long)]
        grep: Option<String>,

        /// Stream logs from the first host
        #[arg(short, long)]
        follow: bool,
    },

    /// Remove the proxy container, images and host directory
    Remove {
        /// Remove even when other apps are installed on the host
        #[arg(long)]
        force: bool,
    },

    /// Remove stopped proxy containers
    #[command(name = "remove_container", alias = "remove-container")]
    RemoveContainer,

    /// Remove unused proxy images
    #[command(name = "remove_image", alias = "remove-image")]
    RemoveImage,

    /// Remove the proxy directory on each host
    #[command(name = "remove_host_directory", alias = "remove-host-directory")]
    RemoveHostDirectory,
}
