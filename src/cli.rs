use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::workload::DEFAULT_JVM_OPTIONS;

#[derive(Debug, Parser)]
#[command(name = "solohost", version, about, long_about = None)]
pub struct Cli {
    /// Authority service URL (e.g. http://a.server.com:9000). Without it,
    /// only the shared-folder record is used.
    #[arg(short = 's', long = "authority")]
    pub authority: Option<String>,

    /// Secret key for the authority service
    #[arg(short = 'k', long = "key")]
    pub key: Option<String>,

    /// Path to the shared folder root (auto-detected when omitted)
    #[arg(short = 'd', long = "share-root", conflicts_with = "path")]
    pub share_root: Option<PathBuf>,

    /// Server name: the folder with that name under the share root holds
    /// the jar and the occupancy record
    #[arg(short = 'n', long = "name", conflicts_with = "path")]
    pub name: Option<String>,

    /// Full path to the server folder, bypassing the share root
    #[arg(short = 'p', long = "path")]
    pub path: Option<PathBuf>,

    /// Jar to launch (default: first jar found in the server folder)
    #[arg(short = 'j', long = "jar")]
    pub jar: Option<PathBuf>,

    /// JVM options for the workload
    #[arg(short = 'o', long = "jvm-options", default_value = DEFAULT_JVM_OPTIONS)]
    pub jvm_options: String,

    /// Identity to report while holding the resource (default: discovered
    /// public IP)
    #[arg(short = 'i', long = "ip")]
    pub identity: Option<String>,

    /// Heartbeat interval in seconds; 0 disables renewals and staleness
    /// checking
    #[arg(long = "heartbeat", default_value_t = 60)]
    pub heartbeat: u64,

    /// Only report who is running, never launch the workload
    #[arg(long = "check")]
    pub check: bool,

    /// Verbose mode (-v, -vv)
    #[arg(short, action = ArgAction::Count)]
    pub verbosity: u8,
}
