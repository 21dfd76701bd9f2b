use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use multiping::{AppConfig, PingReport, Transport};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Icmp,
    Tcp,
    Http,
}

/// Measure latency and packet loss to a set of hosts.
#[derive(Parser, Debug)]
#[command(name = "multiping", version, about, long_about = None)]
struct Cli {
    /// Probe transport
    #[arg(value_enum)]
    mode: Mode,

    /// Hosts (icmp), host:port pairs (tcp) or URLs (http)
    #[arg(required = true)]
    hosts: Vec<String>,

    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, env = "MULTIPING_CONFIG")]
    config: Option<PathBuf>,

    /// Number of rounds (overrides config file)
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Per-probe timeout in milliseconds (overrides config file)
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Maximum probes in flight (overrides config file)
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => match AppConfig::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => AppConfig::load(),
    };

    if let Some(count) = cli.count {
        config.ping.round_count = count;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.ping.timeout = Duration::from_millis(timeout_ms);
    }
    if let Some(concurrency) = cli.concurrency {
        config.ping.max_concurrency = concurrency;
    }

    let transport = match cli.mode {
        Mode::Icmp => Transport::Icmp(config.icmp.clone()),
        Mode::Tcp => Transport::Tcp,
        Mode::Http => Transport::Http(config.http.clone()),
    };

    let stats = match multiping::ping(&transport, &config.ping, &cli.hosts).await {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let report = PingReport::new(transport.name(), stats);
    if cli.json {
        match report.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Failed to serialize report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{report}");
    }
    ExitCode::SUCCESS
}
