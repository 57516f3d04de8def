//! Multi-cooker facade.
//!
//! Wraps a transport with the appliance's RPC vocabulary: property reads,
//! starting and stopping programs, and temperature history.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::data::status::value_as_i64;
use crate::data::{ApplianceStatus, OperationMode, TemperatureHistory, PROPERTIES};
use crate::device::transport::ApplianceTransport;
use crate::device::Appliance;
use crate::error::Result;
use crate::protocol::{CookingProfile, ProfileOptions, ProfileType};

/// Model identifier of the supported appliance.
pub const MODEL_MULTI: &str = "chunmi.cooker.eh1";

/// A multi-cooker reachable through `T`.
#[derive(Debug)]
pub struct Cooker<T> {
    transport: T,
}

impl<T: ApplianceTransport> Cooker<T> {
    /// Create a cooker on top of a transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Read every status property.
    ///
    /// Properties are requested one at a time; the appliance does not
    /// answer multi-property reads reliably.
    pub async fn status(&self) -> Result<ApplianceStatus> {
        let mut values = Vec::with_capacity(PROPERTIES.len());
        for name in PROPERTIES {
            let result = self.transport.send("get_prop", vec![json!(name)]).await?;
            values.push(result.into_iter().next().unwrap_or(Value::Null));
        }

        Ok(ApplianceStatus::parse(&values))
    }

    /// Start cooking `profile_type` adjusted by `options`.
    pub async fn start(&self, profile_type: ProfileType, options: ProfileOptions) -> Result<()> {
        let profile = CookingProfile::prepare(profile_type, &options)?;
        self.transport
            .send("set_start", vec![json!(profile.to_hex())])
            .await?;

        info!(
            profile = %profile_type,
            duration = ?options.duration,
            delayed_start = ?options.delayed_start,
            keep_warm = ?options.keep_warm,
            "Cooking started"
        );
        Ok(())
    }

    /// Select `profile_type` on the appliance without starting it.
    pub async fn set_menu(&self, profile_type: ProfileType, options: ProfileOptions) -> Result<()> {
        let profile = CookingProfile::prepare(profile_type, &options)?;
        self.transport
            .send("set_menu", vec![json!(profile.to_hex())])
            .await?;

        debug!(profile = %profile_type, "Menu selected");
        Ok(())
    }

    /// Stop cooking.
    pub async fn stop(&self) -> Result<()> {
        self.transport.send("cancel_cooking", Vec::new()).await?;
        info!("Cooking stopped");
        Ok(())
    }

    /// Temperatures recorded during the current cooking process.
    pub async fn temperature_history(&self) -> Result<TemperatureHistory> {
        let result = self.transport.send("get_temp_history", Vec::new()).await?;
        let data = match result.first() {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        Ok(TemperatureHistory::parse(&data))
    }

    async fn read_mode(&self) -> Option<OperationMode> {
        match self.transport.send("get_prop", vec![json!("status")]).await {
            Ok(result) => result
                .first()
                .and_then(value_as_i64)
                .filter(|&raw| raw > 0)
                .map(OperationMode::from_raw),
            Err(e) => {
                debug!("Status read failed, treating appliance as offline: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl<T: ApplianceTransport> Appliance for Cooker<T> {
    async fn current_mode(&self) -> Option<OperationMode> {
        self.read_mode().await
    }

    async fn start(&self, profile_type: ProfileType, options: ProfileOptions) -> Result<()> {
        Cooker::start(self, profile_type, options).await
    }

    async fn stop(&self) -> Result<()> {
        Cooker::stop(self).await
    }
}
