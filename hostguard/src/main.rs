use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, EnvFilter};

use baseline_sqlite::{export, Db};
use drift_engine::{build_baseline, generate_report, BaselineOptions};
use port_probe::SweepOptions;

mod config;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "hostguard", version, about = "Host-integrity snapshots: file digests and TCP port drift")]
struct Cli {
    /// SQLite store path
    #[arg(long, global = true, default_value = "hostguard.db")]
    db: PathBuf,
    /// Optional config file (YAML). If omitted, loads ./hostguard.yaml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct ProbeArgs {
    /// Timeout per port in milliseconds
    #[arg(long, default_value_t = 1000)]
    timeout_ms: u64,
    /// Max concurrent connect attempts
    #[arg(long, default_value_t = 256)]
    concurrency: usize,
    /// QPS cap for probe launches; 0 disables pacing
    #[arg(long, default_value_t = 0)]
    qps: u32,
    /// Retries per port on probe failure
    #[arg(long, default_value_t = 0)]
    retries: u32,
    /// Delay between retries in milliseconds
    #[arg(long, default_value_t = 50)]
    retry_delay_ms: u64,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print version information
    Version,
    /// Build the baseline: hash supervised folders, probe the port space
    Init {
        /// Wipe and recreate the store first (destructive)
        #[arg(long, default_value_t = false)]
        fresh: bool,
        /// Supervised folder(s); overrides the config file
        #[arg(long = "folder", value_name = "DIR")]
        folders: Vec<PathBuf>,
        #[command(flatten)]
        probe: ProbeArgs,
    },
    /// Re-probe supervised files and ports, persist a drift report
    Report {
        #[command(flatten)]
        probe: ProbeArgs,
        /// Output format: text or json
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Dump every store table to delimited text files
    Export {
        /// Target directory, created if absent
        #[arg(long, value_name = "DIR", default_value = "export")]
        out_dir: PathBuf,
    },
    /// Bind and listen on a loopback port (manual test aid for the probe)
    OpenPort {
        #[arg(default_value_t = 8090)]
        port: u16,
    },
}

fn sweep_options(args: &ProbeArgs, cfg: Option<&config::ProbeConfig>) -> SweepOptions {
    let mut timeout_ms = args.timeout_ms;
    let mut concurrency = args.concurrency;
    let mut qps = args.qps;
    let mut retries = args.retries;
    let mut retry_delay_ms = args.retry_delay_ms;
    if let Some(c) = cfg {
        if let Some(v) = c.timeout_ms {
            timeout_ms = v;
        }
        if let Some(v) = c.concurrency {
            concurrency = v;
        }
        if let Some(v) = c.qps {
            qps = v;
        }
        if let Some(v) = c.retries {
            retries = v;
        }
        if let Some(v) = c.retry_delay_ms {
            retry_delay_ms = v;
        }
    }
    SweepOptions {
        timeout: Duration::from_millis(timeout_ms),
        concurrency,
        qps: if qps == 0 { None } else { Some(qps) },
        retries,
        retry_delay: Duration::from_millis(retry_delay_ms),
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Version => {
            println!("hostguard {} (core {})", env!("CARGO_PKG_VERSION"), hostguard_core::version());
        }
        Commands::Init { fresh, folders, probe } => {
            // Folders must come from somewhere: the flag or the config file.
            let loaded = if folders.is_empty() {
                Some(config::load_config(cli.config.as_deref())?)
            } else {
                config::try_load_config(cli.config.as_deref())?
            };
            let folder_list = if folders.is_empty() {
                loaded
                    .as_ref()
                    .map(|c| c.supervised_folders.clone())
                    .unwrap_or_default()
            } else {
                folders
            };
            let sweep = sweep_options(&probe, loaded.as_ref().and_then(|c| c.probe.as_ref()));

            let db = Db::open_or_create(&cli.db)?;
            if fresh {
                tracing::warn!(db = %cli.db.display(), "wiping store");
                db.reset()?;
            }
            let mut opts = BaselineOptions::new(folder_list);
            opts.sweep = sweep;

            let rt = tokio::runtime::Runtime::new()?;
            let started = Instant::now();
            let summary = rt.block_on(async { build_baseline(&db, &opts).await })?;
            let duration_ms = started.elapsed().as_millis();
            println!(
                "baseline: {} file(s) added ({} seen, {} skipped), {} port(s) added of {} probed ({} ms)",
                summary.files_added,
                summary.files_seen,
                summary.files_skipped,
                summary.ports_added,
                summary.ports_probed,
                duration_ms
            );
        }
        Commands::Report { probe, format } => {
            let loaded = config::try_load_config(cli.config.as_deref())?;
            let sweep = sweep_options(&probe, loaded.as_ref().and_then(|c| c.probe.as_ref()));

            let db = Db::open_or_create(&cli.db)?;
            let rt = tokio::runtime::Runtime::new()?;
            let started = Instant::now();
            let outcome = rt.block_on(async { generate_report(&db, &sweep).await })?;
            let duration_ms = started.elapsed().as_millis();
            match format {
                OutputFormat::Text => {
                    println!("report {}: {} ({} ms)", outcome.report_id, outcome.result.as_str(), duration_ms);
                    println!("{}", outcome.description);
                }
                OutputFormat::Json => {
                    let obj = serde_json::json!({
                        "report_id": outcome.report_id,
                        "result": outcome.result.as_str(),
                        "description": outcome.description,
                        "files_checked": outcome.files_checked,
                        "files_skipped": outcome.files_skipped,
                        "files_modified": outcome.files_modified,
                        "ports_checked": outcome.ports_checked,
                        "ports_modified": outcome.ports_modified,
                        "duration_ms": duration_ms,
                    });
                    println!("{}", serde_json::to_string(&obj)?);
                }
            }
        }
        Commands::Export { out_dir } => {
            let db = Db::open_or_create(&cli.db)?;
            let counts = export::export_all(&db, &out_dir)?;
            for (entity, rows) in counts {
                println!("{}: {} row(s)", entity.file_name(), rows);
            }
        }
        Commands::OpenPort { port } => {
            let listener = std::net::TcpListener::bind(("127.0.0.1", port))?;
            println!("port {port} is now open and listening");
            for stream in listener.incoming() {
                match stream {
                    Ok(s) => {
                        if let Ok(peer) = s.peer_addr() {
                            println!("received connection from {peer}");
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "accept failed"),
                }
            }
        }
    }
    Ok(())
}
