//! SleepyPillow sensor simulator CLI
//!
//! Sends synthetic sleep readings to the realtime webhook.

use clap::{Args, Parser, Subcommand};
use sleepy_sensor::{
    config::{Config, ConfigOverrides},
    driver::{Driver, ShutdownFlag},
    reporter::BlockingReporter,
    sensor::SensorSimulator,
    VERSION,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "sleepy-sensor")]
#[command(author = "SleepyPillow")]
#[command(version = VERSION)]
#[command(about = "Simulated sleep sensor for the SleepyPillow realtime webhook", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report readings until interrupted
    Start {
        #[command(flatten)]
        overrides: OverrideArgs,
    },

    /// Produce and report a single reading
    Once {
        #[command(flatten)]
        overrides: OverrideArgs,
    },

    /// Show configuration
    Config,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Run a local realtime collector
    #[cfg(feature = "server")]
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8787")]
        port: u16,

        /// Bearer token required on ingest
        #[arg(long)]
        token: Option<String>,
    },
}

#[derive(Args)]
struct OverrideArgs {
    /// Seconds between two reports
    #[arg(long)]
    interval: Option<u64>,

    /// Value of the X-User-Id header
    #[arg(long)]
    user_id: Option<String>,

    /// Bearer token
    #[arg(long, env = "SLEEPY_SENSOR_TOKEN")]
    token: Option<String>,

    /// Full webhook URL (replaces the project-derived one)
    #[arg(long)]
    url: Option<String>,
}

impl From<OverrideArgs> for ConfigOverrides {
    fn from(args: OverrideArgs) -> Self {
        Self {
            interval_secs: args.interval,
            user_id: args.user_id,
            token: args.token,
            endpoint_url: args.url,
        }
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Start { overrides } => cmd_start(overrides.into()),
        Commands::Once { overrides } => cmd_once(overrides.into()),
        Commands::Config => {
            cmd_config();
            Ok(())
        }
        Commands::Init { force } => cmd_init(force),
        #[cfg(feature = "server")]
        Commands::Serve { port, token } => cmd_serve(port, token),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn load_config(overrides: &ConfigOverrides) -> Config {
    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load configuration, using defaults: {e}");
            Config::default()
        }
    };
    config.apply_overrides(overrides);
    if config.token.is_empty() {
        tracing::warn!("no bearer token configured; the webhook will likely reject readings");
    }
    config
}

fn print_banner(config: &Config) {
    println!("{}", "=".repeat(60));
    println!("SleepyPillow Sensor Simulator v{VERSION}");
    println!("{}", "=".repeat(60));
    println!("Endpoint: {}", config.webhook_url());
    println!("User ID: {}", config.user_id);
    println!("{}", "=".repeat(60));
    println!();
}

fn cmd_start(overrides: ConfigOverrides) -> anyhow::Result<()> {
    let config = load_config(&overrides);
    print_banner(&config);

    let reporter = BlockingReporter::new(&config)?;
    let shutdown = ShutdownFlag::new();
    shutdown.install_ctrlc_handler()?;

    let run_id = uuid::Uuid::new_v4();
    tracing::info!(%run_id, endpoint = reporter.endpoint(), "starting reporting loop");

    println!("Starting data collection...");
    println!("Sending a reading every {} seconds", config.interval.as_secs());
    println!("Press Ctrl+C to stop");

    let mut driver = Driver::new(SensorSimulator::new(), reporter, config.interval);
    driver.run(&shutdown);

    println!();
    println!("Sensor simulator stopped.");
    println!();
    println!("{}", driver.stats().summary());
    Ok(())
}

fn cmd_once(overrides: ConfigOverrides) -> anyhow::Result<()> {
    let config = load_config(&overrides);
    print_banner(&config);

    let reporter = BlockingReporter::new(&config)?;
    let mut driver = Driver::new(SensorSimulator::new(), reporter, config.interval);
    let outcome = driver.run_cycle();

    outcome.result?;
    Ok(())
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!("Webhook URL: {}", config.webhook_url());
    println!();

    let display = Config {
        token: config.masked_token(),
        ..config
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&display).unwrap_or_else(|_| "Error".to_string())
    );
}

fn cmd_init(force: bool) -> anyhow::Result<()> {
    let path = Config::config_path();
    if path.exists() && !force {
        println!("Configuration already exists at {path:?} (use --force to overwrite)");
        return Ok(());
    }

    Config::default().save()?;
    println!("Wrote default configuration to {path:?}");
    Ok(())
}

#[cfg(feature = "server")]
fn cmd_serve(port: u16, token: Option<String>) -> anyhow::Result<()> {
    use sleepy_sensor::server::{run, ServerConfig};

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let (addr, shutdown_tx) = run(ServerConfig::new(port, token)).await?;
        println!("Realtime collector listening on http://{addr}");
        println!("Point the simulator at it with --url http://{addr}/webhook/realtime");
        println!("Press Ctrl+C to stop");

        tokio::signal::ctrl_c().await?;
        let _ = shutdown_tx.send(());
        Ok::<(), anyhow::Error>(())
    })
}
