//! Data structures for appliance data.
//!
//! This module contains the types used to represent what the appliance
//! reports: its operation mode, status properties, stage and menu tables,
//! and recorded temperatures.

pub mod history;
pub mod menus;
pub mod mode;
pub mod status;

pub use history::TemperatureHistory;
pub use menus::{cooking_stage, menu_name, CookingStage};
pub use mode::OperationMode;
pub use status::{ApplianceStatus, PROPERTIES};
