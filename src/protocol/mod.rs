//! Protocol module for encoding and decoding what goes over the wire.
//!
//! This module contains the implementations for:
//! - Cooking profile encoding, validation and mutation
//! - miIO packet framing and payload encryption
//! - CRC calculation

pub mod crc;
pub mod miio;
pub mod profile;

pub use crc::calculate_crc;
pub use miio::{MiioCipher, MiioHeader, RpcRequest, RpcResponse};
pub use profile::{CookingProfile, ProfileOptions, ProfileType};
