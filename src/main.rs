use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time;
use tracing_subscriber::EnvFilter;

use smartshield::{classifier, ConsoleSink, Monitor, MonitorConfig, RuleSet};

const APP_TITLE: &str = "SmartShield X — AI-Powered Firewall Monitor";
const TAGLINE: &str = "Detect Before It's Too Late";

#[derive(Parser)]
#[command(name = "smartshield", about = APP_TITLE, version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the live monitor until Ctrl-C or the duration elapses
    Run(RunArgs),
    /// Classify one observation and exit
    Assess(AssessArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Block-rules file, created with empty sets if absent
    #[arg(long, default_value = "rules.json")]
    rules: PathBuf,

    /// Stop on its own after this many seconds
    #[arg(long)]
    duration_secs: Option<u64>,

    /// One JSON document per event and snapshot instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct AssessArgs {
    /// Source address, e.g. 192.168.1.5
    address: String,

    /// Port number (0-65535)
    port: i64,

    /// TCP, UDP or ICMP
    protocol: String,

    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args).await,
        Command::Assess(args) => assess(args),
    }
}

async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.json {
        println!("{APP_TITLE}");
        println!("{TAGLINE}");
        println!("[SmartShield X AI Console Ready]");
    }

    let rules = match RuleSet::load_or_init(&args.rules) {
        Ok(rules) => rules,
        Err(e) => {
            tracing::warn!(
                "failed to load rules file {}: {e}; continuing with empty rules",
                args.rules.display()
            );
            RuleSet::default()
        }
    };
    if !rules.is_empty() {
        tracing::info!(
            addresses = rules.blocked_addresses.len(),
            ports = rules.blocked_ports.len(),
            protocols = rules.blocked_protocols.len(),
            "block rules loaded"
        );
    }

    let monitor = Monitor::new(
        MonitorConfig::default(),
        rules,
        Box::new(ConsoleSink::new(args.json)),
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    monitor.start();

    let deadline = args
        .duration_secs
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut interval = time::interval(monitor.config().snapshot_interval);
    while !shutdown.load(Ordering::SeqCst) {
        interval.tick().await;
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        monitor.publish_stats();
    }

    monitor.stop();
    monitor.publish_stats();
    Ok(())
}

fn assess(args: AssessArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = rand::thread_rng();
    let assessment = classifier::assess_raw(&args.address, args.port, &args.protocol, &mut rng)?;
    if args.json {
        println!(
            "{}",
            serde_json::json!({ "score": assessment.score, "level": assessment.level })
        );
    } else {
        println!("Risk:{:03} -> {}", assessment.score, assessment.level);
    }
    Ok(())
}
