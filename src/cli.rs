use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "ambari-cockpit",
    version,
    about = "A terminal console for Ambari-managed Hadoop clusters."
)]
pub struct CliArgs {
    /// Ambari server base URL (for example: http://ambari.example.com:8080)
    #[arg(long)]
    pub server: Option<String>,

    /// Cluster name; the first cluster reported by the server when omitted
    #[arg(short, long)]
    pub cluster: Option<String>,

    /// Ambari user name
    #[arg(short, long)]
    pub user: Option<String>,

    /// Ambari password
    #[arg(long, env = "AMBARI_COCKPIT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Refresh interval in milliseconds
    #[arg(long)]
    pub refresh_ms: Option<u64>,

    /// Config file; discovered from AMBARI_COCKPIT_CONFIG, the working
    /// directory and ~/.config/ambari-cockpit when omitted
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,

    /// Serve built-in demo data and never write to the server
    #[arg(long)]
    pub offline: bool,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Write logs to this file instead of discarding them
    #[arg(long)]
    pub log_file: Option<std::path::PathBuf>,
}
