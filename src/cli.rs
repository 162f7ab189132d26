use crate::config::{StatFailurePolicy, SyncSettings};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "foldersync")]
#[command(version)]
#[command(about = "Two-way synchronization of the direct contents of two folders")]
#[command(long_about = "Compares the files directly inside two folders by name. The newer copy \
of a file replaces the older one and files missing on one side are copied over. Subfolders are \
not visited and nothing is ever deleted without being replaced.")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub sync: SyncArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show or change the log configuration
    LogConfig {
        #[arg(long, help = "Enable or disable the log file")]
        enabled: Option<bool>,
        #[arg(long, help = "Log level (error, warn, info, debug, trace)")]
        level: Option<String>,
        #[arg(long, help = "Rotate the log file above this size (MB)")]
        max_size_mb: Option<u32>,
    },
}

#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// First folder
    #[arg(value_name = "FOLDER_A")]
    pub folder_a: Option<PathBuf>,

    /// Second folder
    #[arg(value_name = "FOLDER_B")]
    pub folder_b: Option<PathBuf>,

    /// Print the final report as JSON
    #[arg(long, help = "Print the final report as JSON")]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// What to do when a file's metadata cannot be read
    #[arg(long, value_enum, help = "Handling of unreadable metadata")]
    pub stat_failure: Option<StatFailurePolicy>,

    /// Modification time tolerance in milliseconds
    #[arg(long, help = "Treat timestamps this close (ms) as equal")]
    pub tolerance_ms: Option<u64>,

    /// Ignore dot files
    #[arg(long, help = "Ignore files whose name starts with a dot")]
    pub skip_hidden: bool,
}

impl SyncArgs {
    /// 两个目录都必须给出且不能相同
    pub fn folders(&self) -> Result<(PathBuf, PathBuf), String> {
        let (Some(a), Some(b)) = (&self.folder_a, &self.folder_b) else {
            return Err("Two folders are required: foldersync <FOLDER_A> <FOLDER_B>".to_string());
        };

        if let (Ok(ca), Ok(cb)) = (a.canonicalize(), b.canonicalize()) {
            if ca == cb {
                return Err(format!("Both folders point to {}", ca.display()));
            }
        }

        Ok((a.clone(), b.clone()))
    }

    /// 命令行参数覆盖配置文件
    pub fn apply_to(&self, settings: &mut SyncSettings) {
        if let Some(policy) = self.stat_failure {
            settings.stat_failure = policy;
        }
        if let Some(ms) = self.tolerance_ms {
            settings.time_tolerance_ms = ms;
        }
        if self.skip_hidden {
            settings.skip_hidden = true;
        }
    }
}
