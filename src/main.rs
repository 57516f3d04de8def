//! Command-line entry point.
//!
//! Run with: ricecooker-autopilot -c config.toml [run|status|start|menu|stop|history]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ricecooker_autopilot::{
    mask_secret, BarkNotifier, Config, Cooker, MiioTransport, ProfileOptions, ProfileType,
    Result, Scheduler,
};
use tracing::{debug, error, info};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "config.toml")]
    config_path: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Poll the appliance and schedule meals (default)
    Run,
    /// Print every status property
    Status,
    /// Start cooking now
    Start {
        /// Profile to cook (FineRice, QuickRice, Gongee, KeepWarm)
        #[arg(short, long, default_value = "FineRice")]
        profile: ProfileType,
        /// Cooking duration in minutes, for adjustable profiles
        #[arg(short, long)]
        duration: Option<u16>,
        /// Minutes until the food should be ready
        #[arg(long)]
        delay: Option<u16>,
        /// Keep warm once cooking completes
        #[arg(long)]
        keep_warm: Option<bool>,
    },
    /// Select a profile on the appliance without starting it
    Menu {
        /// Profile to select (FineRice, QuickRice, Gongee, KeepWarm)
        #[arg(short, long, default_value = "FineRice")]
        profile: ProfileType,
        /// Cooking duration in minutes, for adjustable profiles
        #[arg(short, long)]
        duration: Option<u16>,
        /// Keep warm once cooking completes
        #[arg(long)]
        keep_warm: Option<bool>,
    },
    /// Stop cooking
    Stop,
    /// Print the temperatures recorded during the current cooking process
    History,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.config_path)?;

    let transport = MiioTransport::new(config.cooker.ip, &config.cooker.token)?;
    let cooker = Cooker::new(transport);

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => serve(&config, &cooker).await,
        Command::Status => {
            let status = cooker.status().await?;
            println!("Mode:        {}", status.mode);
            println!("Stage:       {}", status.stage_name());
            println!("Menu:        {}", status.menu_name());
            print_field("Temperature", status.temperature.map(|t| format!("{t}°C")));
            print_field("Remaining", status.remaining_minutes.map(|m| format!("{m} min")));
            print_field("Delay", status.cooking_delay.map(|m| format!("{m} min")));
            print_field("Duration", status.duration.map(|m| format!("{m} min")));
            print_field("Keep warm", status.keep_warm.map(|k| k.to_string()));
            print_field("Kept warm", status.keep_warm_time.map(|m| format!("{m} min")));
            print_field("Firmware", status.version.clone());
            Ok(())
        }
        Command::Start {
            profile,
            duration,
            delay,
            keep_warm,
        } => {
            let options = ProfileOptions {
                duration,
                delayed_start: delay,
                keep_warm,
            };
            cooker.start(profile, options).await?;
            println!("Started {profile}");
            Ok(())
        }
        Command::Menu {
            profile,
            duration,
            keep_warm,
        } => {
            let options = ProfileOptions {
                duration,
                delayed_start: None,
                keep_warm,
            };
            cooker.set_menu(profile, options).await?;
            println!("Selected {profile}");
            Ok(())
        }
        Command::Stop => {
            cooker.stop().await?;
            println!("Stopped");
            Ok(())
        }
        Command::History => {
            let history = cooker.temperature_history().await?;
            if history.is_empty() {
                println!("No temperatures recorded");
            } else {
                println!("{history}");
            }
            Ok(())
        }
    }
}

fn print_field(label: &str, value: Option<String>) {
    println!("{:<12} {}", format!("{label}:"), value.as_deref().unwrap_or("-"));
}

async fn serve(config: &Config, cooker: &Cooker<MiioTransport>) -> Result<()> {
    let notifier = BarkNotifier::with_server(&config.push.server, &config.push.token)?;
    let mut scheduler = Scheduler::new(config.cooker.clone());

    info!("========================================");
    info!("{}", config.cooker.name);
    info!("  Address:       {}", cooker.transport().addr());
    info!("  Token:         {}", mask_secret(&config.cooker.token));
    info!("  Push token:    {}", mask_secret(&config.push.token));
    info!("  Poll interval: {}s", config.poll_interval);
    info!("  Auto keep-warm: {}", config.cooker.auto_keep_warm);
    for meal in &config.cooker.meals {
        info!(
            "  Meal: {} {} ~ {} (usually {})",
            meal.profile, meal.earliest, meal.latest, meal.usual
        );
    }
    info!("========================================");

    loop {
        let now = chrono::Local::now().naive_local();
        let decision = scheduler.tick(cooker, &notifier, now).await?;
        debug!(?decision, "Tick done");

        tokio::select! {
            _ = tokio::time::sleep(config.poll_interval()) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
        }
    }
}
