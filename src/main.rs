use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use sysglance::bridge::{self, MetricsBridge};
use sysglance::config::{self, LogFormat, load_config, load_config_from_path};
use sysglance::format::{format_bytes, format_time_remaining, sparkline};
use sysglance::poller::{MetricsPoller, PollStatus, PollView, SnapshotOrigin, SnapshotSource};
use sysglance::synthetic::SyntheticGenerator;
use sysglance::system::acquisition::AcquisitionService;
use sysglance::system::collector::SysinfoSensors;
use sysglance::system::history::UsageHistory;
use sysglance::system::snapshot::SystemSnapshot;

#[derive(Parser)]
#[command(
    name = "sysglance",
    about = "Live CPU, battery, memory and system identity readings"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Refresh rate in milliseconds
    #[arg(long)]
    refresh_rate: Option<u64>,

    /// Publish generated data instead of reading host sensors
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Print each published view as a JSON line
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Exit after this many published views
    #[arg(long)]
    count: Option<usize>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);
    init_logging(config.general.log_level(), config.general.log_format)?;

    run(config, &cli).await
}

async fn run(config: config::Config, cli: &Cli) -> Result<()> {
    let generator = match config.synthetic.seed {
        Some(seed) => SyntheticGenerator::seeded(seed),
        None => SyntheticGenerator::new(),
    };

    let (bridge, host_task) = if config.general.force_synthetic {
        (None, None)
    } else {
        let (client, host) = bridge::channel(16);
        let service = AcquisitionService::new(SysinfoSensors::new());
        let task = host.spawn(service);
        let client: Arc<dyn MetricsBridge> = Arc::new(client);
        (Some(client), Some(task))
    };

    let source = SnapshotSource::probe(bridge, generator);
    let poller = MetricsPoller::new(source).spawn(config.general.refresh_interval());
    let mut views = poller.subscribe();
    let mut history = UsageHistory::new(config.general.history_length);
    let mut published = 0usize;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                if view.is_loading() {
                    continue;
                }
                if view.status == PollStatus::Ready
                    && let Some(snapshot) = &view.snapshot
                {
                    history.record(snapshot);
                }
                if cli.json {
                    println!("{}", serde_json::to_string(&view)?);
                } else {
                    println!("{}", summary_line(&view, &history));
                }
                published += 1;
                if cli.count.is_some_and(|n| published >= n) {
                    break;
                }
            }
            _ = &mut shutdown => {
                tracing::info!("interrupted, stopping poller");
                break;
            }
        }
    }

    poller.stop();
    if let Some(task) = host_task {
        task.abort();
    }
    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> config::Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(rate) = cli.refresh_rate {
        config.general.refresh_rate_ms = rate;
    }
    if cli.synthetic {
        config.general.force_synthetic = true;
    }

    config
}

fn init_logging(level: tracing::Level, format: LogFormat) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => {
            tracing::subscriber::set_global_default(builder.with_ansi(false).json().finish())
        }
    };
    installed.map_err(|e| eyre!("failed to set tracing subscriber: {e}"))
}

fn summary_line(view: &PollView, history: &UsageHistory) -> String {
    let tag = match view.origin {
        Some(SnapshotOrigin::Sensors) => "sensors",
        Some(SnapshotOrigin::Synthetic) => "synthetic",
        None => "-",
    };
    let body = match &view.snapshot {
        Some(snapshot) => describe(snapshot, history),
        None => "no data".to_string(),
    };
    match &view.error {
        Some(error) => format!("[{tag}] {body} (stale: {error})"),
        None => format!("[{tag}] {body}"),
    }
}

fn describe(s: &SystemSnapshot, history: &UsageHistory) -> String {
    let charging = if s.battery.is_charging {
        "charging"
    } else {
        "on battery"
    };
    format!(
        "CPU {:.0}% {:.2} GHz {:.0}°C {} | MEM {} / {} ({:.0}%) | BAT {:.0}% {} health {:.0}% cycles {} {} | {} {}, {} {}",
        s.cpu.usage,
        s.cpu.frequency,
        s.cpu.temperature,
        sparkline(&history.cpu),
        format_bytes(s.memory.used),
        format_bytes(s.memory.total),
        s.memory.usage,
        s.battery.level,
        charging,
        s.battery.health,
        s.battery.cycle_count,
        format_time_remaining(s.battery.time_remaining),
        s.system.manufacturer,
        s.system.model,
        s.system.os,
        s.system.arch,
    )
}
