//! Appliance access.
//!
//! - [`transport`]: the miIO UDP transport and the trait it implements
//! - [`cooker`]: the multi-cooker command set on top of a transport
//!
//! The scheduler only sees the [`Appliance`] trait.

pub mod cooker;
pub mod transport;

use async_trait::async_trait;

use crate::data::OperationMode;
use crate::error::Result;
use crate::protocol::{ProfileOptions, ProfileType};

pub use cooker::{Cooker, MODEL_MULTI};
pub use transport::{ApplianceTransport, MiioTransport};

/// What the scheduler needs from an appliance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Appliance: Send + Sync {
    /// Read online state and mode in one request.
    ///
    /// Returns `None` when the appliance is offline or unreachable.
    async fn current_mode(&self) -> Option<OperationMode>;

    /// Start cooking a bundled profile.
    async fn start(&self, profile_type: ProfileType, options: ProfileOptions) -> Result<()>;

    /// Stop whatever the appliance is doing.
    async fn stop(&self) -> Result<()>;
}
