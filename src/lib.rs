//! # ricecooker-autopilot
//!
//! Meal-time automation for miIO multi-cookers (`chunmi.cooker.eh1`).
//!
//! Every poll tick the appliance is checked once. When it is plugged in and
//! idle, cooking starts immediately if a configured meal window is open, or
//! with a delay so the food is ready at the usual mealtime of the next window.
//! Food kept warm for too long without the appliance being unplugged triggers
//! reminders and, optionally, an automatic stop.
//!
//! ## Features
//!
//! - **Cooking Profiles**: Decode, validate and adjust the 176-byte profiles
//!   the appliance runs, protected by a CRC-16 checksum
//! - **miIO Transport**: Encrypted UDP request/response with the appliance
//! - **Status Model**: Operation mode, cooking stage, menu and timers
//! - **Scheduling**: Immediate and delayed starts driven by meal windows
//! - **Keep-warm Safety**: Reminders and auto-stop for food left warm too long
//! - **Push Notifications**: Bark notifications for every automatic action
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ricecooker_autopilot::{BarkNotifier, Config, Cooker, MiioTransport, Result, Scheduler};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load("config.toml")?;
//!
//!     let transport = MiioTransport::new(config.cooker.ip, &config.cooker.token)?;
//!     let cooker = Cooker::new(transport);
//!     let notifier = BarkNotifier::with_server(&config.push.server, &config.push.token)?;
//!     let mut scheduler = Scheduler::new(config.cooker.clone());
//!
//!     loop {
//!         let now = chrono::Local::now().naive_local();
//!         let decision = scheduler.tick(&cooker, &notifier, now).await?;
//!         println!("{:?}", decision);
//!         tokio::time::sleep(config.poll_interval()).await;
//!     }
//! }
//! ```
//!
//! ## Configuration
//!
//! Configuration is a TOML file; `${NAME}` placeholders are replaced with
//! environment variables. See [`Config`] for the schema.

// Public modules
pub mod config;
pub mod data;
pub mod device;
pub mod error;
pub mod notify;
pub mod protocol;
pub mod scheduler;
pub mod utils;

// Re-exports for convenience
pub use config::{Config, CookerConfig, MealWindow, PushConfig, TimeOfDay, UnpluggedCheckConfig};
pub use device::{Appliance, ApplianceTransport, Cooker, MiioTransport, MODEL_MULTI};
pub use error::{Error, Result};
pub use notify::{BarkNotifier, Notifier};
pub use scheduler::{Decision, Scheduler, SchedulerState};
pub use utils::mask_secret;

// Re-export commonly used types from submodules
pub use data::{
    cooking_stage, menu_name, ApplianceStatus, CookingStage, OperationMode, TemperatureHistory,
};
pub use protocol::{calculate_crc, CookingProfile, ProfileOptions, ProfileType};
