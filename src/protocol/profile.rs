//! Cooking profile codec.
//!
//! A cooking profile is a fixed 174-byte payload followed by a big-endian
//! CRC-16 of that payload. The appliance receives it hex-encoded as the
//! argument of `set_start` / `set_menu`.
//!
//! Payload layout of the fields this crate touches:
//! - Byte 8: Cooking duration, hours
//! - Byte 9: Cooking duration, minutes
//! - Bytes 10-11: Maximum allowed duration (hours, minutes)
//! - Bytes 12-13: Minimum allowed duration (hours, minutes)
//! - Byte 14: Delayed-start hours (bit 7: schedule enabled)
//! - Byte 15: Delayed-start minutes (bit 7: keep warm after cooking)
//!
//! Everything else (temperature/time stages) is treated as opaque.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::crc::calculate_crc;

/// Length of the profile payload covered by the checksum.
pub const PAYLOAD_LEN: usize = 174;

/// Length of the trailing checksum.
pub const CHECKSUM_LEN: usize = 2;

/// Upper bound (inclusive) for a delayed start, one day.
pub const MAX_DELAYED_START_MINUTES: u16 = 1440;

/// Hex strings shorter than this are rejected outright.
const MIN_HEX_LEN: usize = 5;

const DURATION_HOURS: usize = 8;
const DURATION_MINUTES: usize = 9;
const MAX_DURATION_HOURS: usize = 10;
const MAX_DURATION_MINUTES: usize = 11;
const MIN_DURATION_HOURS: usize = 12;
const MIN_DURATION_MINUTES: usize = 13;
const SCHEDULE_HOURS: usize = 14;
const SCHEDULE_MINUTES: usize = 15;

const FLAG_BIT: u8 = 0x80;
const VALUE_MASK: u8 = 0x7F;

// 60 minutes cooking for tasty rice.
const FINE_RICE_HEX: &str = "02010000000001e101000000000000800101050814000000002091827d7800050091822d781c0a0091823c781c1e0091ff827820ffff91828278000500ffff8278ffffff91828278000d00ff828778ff000091827d7800000091827d7800ffff91826078ff0100490366780701086c0078090301af540266780801086c00780a02023c5701667b0e010a71007a0d02ffff5701667b0f010a73007d0d032005000000000000000000000000000000cf53";
// Quick 40 minutes cooking.
const QUICK_RICE_HEX: &str = "02010100000002e100280000000000800101050614000000002091827d7800000091823c7820000091823c781c1e0091ff827820ffff91828278000500ffff8278ffffff91828278000d00ff828778ff000082827d7800000091827d7800ffff91826078ff0164490366780701086c007409030200540266780801086c00760a0202785701667b0e010a7100780a02ffff5701667b0f010a73007b0a032005000000000000000000000000000000ddba";
// Slow fire, 40 minutes to 4 hours.
const CONGEE_HEX: &str = "02010200000003e2011e0400002800800101050614000000002091827d7800000091827d7800000091827d78001e0091ff877820ffff91827d78001e0091ff8278ffffff91828278001e0091828278060f0091827d7804000091827d7800000091827d780001f54e0255261802062a0482030002eb4e0255261802062a04820300032d4e0252261802062c04820501ffff4e0152241802062c0482050120000000000000000000000000000000009ce2";
// Keep warm at 73 degrees.
const KEEP_WARM_HEX: &str = "020103000000040c00001800000100800100000000000000002091827d7800000091827d7800000091827d78000000915a7d7820000091827d7800000091826e78ff000091827d7800000091826e7810000091826e7810000091827d7800000091827d780000a082007882140010871478030000eb820078821400108714780300012d8200788214001087147a0501ffff8200788214001087147d0501200000000000000000000000000000000090e5";

/// Bundled cooking programs.
///
/// The serialized identifiers (`FineRice`, `QuickRice`, `Gongee`, `KeepWarm`)
/// are the ones used in configuration files; `Congee` is accepted as an alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileType {
    /// 60 minutes, fixed duration.
    FineRice,
    /// 40 minutes, fixed duration.
    QuickRice,
    /// Slow cooking, adjustable between 40 minutes and 4 hours.
    #[serde(rename = "Gongee", alias = "Congee")]
    Congee,
    /// Keep warm at 73°C, adjustable up to 24 hours.
    KeepWarm,
}

impl ProfileType {
    /// All bundled profile types.
    pub const ALL: [ProfileType; 4] = [
        Self::FineRice,
        Self::QuickRice,
        Self::Congee,
        Self::KeepWarm,
    ];

    /// Configuration identifier of this profile type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FineRice => "FineRice",
            Self::QuickRice => "QuickRice",
            Self::Congee => "Gongee",
            Self::KeepWarm => "KeepWarm",
        }
    }

    /// Hex-encoded template bundled for this profile type.
    pub fn template_hex(&self) -> &'static str {
        match self {
            Self::FineRice => FINE_RICE_HEX,
            Self::QuickRice => QUICK_RICE_HEX,
            Self::Congee => CONGEE_HEX,
            Self::KeepWarm => KEEP_WARM_HEX,
        }
    }

    /// Decode the bundled template.
    pub fn template(&self) -> Result<CookingProfile> {
        CookingProfile::from_hex(self.template_hex())
    }
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "FineRice" => Ok(Self::FineRice),
            "QuickRice" => Ok(Self::QuickRice),
            "Gongee" | "Congee" => Ok(Self::Congee),
            "KeepWarm" => Ok(Self::KeepWarm),
            _ => Err(Error::UnknownProfile {
                name: s.to_string(),
            }),
        }
    }
}

/// Adjustments applied to a template before it is sent to the appliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileOptions {
    /// Cooking duration in minutes; ignored if the profile does not allow it.
    pub duration: Option<u16>,
    /// Delay before cooking starts, in minutes; applied only if in `1..=1440`.
    pub delayed_start: Option<u16>,
    /// Keep warm after cooking.
    pub keep_warm: Option<bool>,
}

impl ProfileOptions {
    /// Options with only the keep-warm flag set.
    pub fn keep_warm(enabled: bool) -> Self {
        Self {
            keep_warm: Some(enabled),
            ..Self::default()
        }
    }

    /// Set the delayed start.
    pub fn with_delayed_start(mut self, minutes: u16) -> Self {
        self.delayed_start = Some(minutes);
        self
    }

    /// Set the cooking duration.
    pub fn with_duration(mut self, minutes: u16) -> Self {
        self.duration = Some(minutes);
        self
    }
}

/// A validated cooking profile: payload plus matching checksum.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CookingProfile {
    payload: [u8; PAYLOAD_LEN],
    checksum: [u8; CHECKSUM_LEN],
}

impl CookingProfile {
    /// Decode a hex-encoded profile and verify its checksum.
    ///
    /// # Arguments
    ///
    /// * `profile_hex` - Payload followed by its checksum, hex-encoded
    ///
    /// # Returns
    ///
    /// The decoded profile, unchanged from what was encoded.
    ///
    /// # Example
    ///
    /// ```
    /// use ricecooker_autopilot::{CookingProfile, ProfileType};
    ///
    /// let profile = CookingProfile::from_hex(ProfileType::FineRice.template_hex()).unwrap();
    /// assert_eq!(profile.duration(), 60);
    /// assert_eq!(profile.checksum(), 0xCF53);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProfile`] if the string is too short, is not
    /// hex, or has the wrong length, and [`Error::ChecksumError`] if the
    /// trailing checksum does not match the payload.
    pub fn from_hex(profile_hex: &str) -> Result<Self> {
        let profile_hex = profile_hex.trim();
        if profile_hex.len() < MIN_HEX_LEN {
            return Err(Error::InvalidProfile {
                context: format!("profile too short: {} characters", profile_hex.len()),
            });
        }

        let bytes = hex::decode(profile_hex).map_err(|e| Error::InvalidProfile {
            context: format!("not a hex string: {e}"),
        })?;

        Self::from_bytes(&bytes)
    }

    /// Decode a raw profile (payload followed by checksum).
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() != PAYLOAD_LEN + CHECKSUM_LEN {
            return Err(Error::InvalidProfile {
                context: format!(
                    "profile is {} bytes (need {})",
                    data.len(),
                    PAYLOAD_LEN + CHECKSUM_LEN
                ),
            });
        }

        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&data[..PAYLOAD_LEN]);
        let checksum = [data[PAYLOAD_LEN], data[PAYLOAD_LEN + 1]];

        let profile = Self { payload, checksum };
        let expected = profile.calc_checksum();
        let actual = profile.checksum();
        if expected != actual {
            return Err(Error::ChecksumError { expected, actual });
        }

        Ok(profile)
    }

    /// Build the profile sent for a start request.
    ///
    /// The template's schedule flag is cleared first, so a delayed start only
    /// happens when `options.delayed_start` asks for one.
    ///
    /// # Arguments
    ///
    /// * `profile_type` - Bundled template to start from
    /// * `options` - Duration, delayed start and keep-warm adjustments
    ///
    /// # Returns
    ///
    /// The adjusted profile with a recomputed checksum. Options the template
    /// cannot honour (a fixed duration, a delay outside `1..=1440`) are
    /// skipped.
    ///
    /// # Example
    ///
    /// ```
    /// use ricecooker_autopilot::{CookingProfile, ProfileOptions, ProfileType};
    ///
    /// let options = ProfileOptions::keep_warm(true).with_delayed_start(90);
    /// let profile = CookingProfile::prepare(ProfileType::FineRice, &options).unwrap();
    /// assert!(profile.is_schedule_enabled());
    /// assert_eq!(profile.schedule_duration(), 90);
    /// assert!(profile.to_hex().ends_with("b81b"));
    /// ```
    pub fn prepare(profile_type: ProfileType, options: &ProfileOptions) -> Result<Self> {
        let mut profile = profile_type.template()?;
        profile.set_schedule_enabled(false);

        if let Some(minutes) = options.duration {
            if !profile.set_duration(minutes) {
                debug!(
                    "Ignoring duration {} for {} (allowed {:?})",
                    minutes,
                    profile_type,
                    profile.duration_range()
                );
            }
        }

        match options.delayed_start {
            Some(minutes) if minutes > 0 && minutes <= MAX_DELAYED_START_MINUTES => {
                profile.set_delayed_start(minutes);
            }
            Some(minutes) => debug!("Ignoring delayed start of {} minutes", minutes),
            None => {}
        }

        if let Some(enabled) = options.keep_warm {
            profile.set_keep_warm_enabled(enabled);
        }

        Ok(profile)
    }

    /// Encode as lowercase hex (payload followed by checksum).
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Raw bytes (payload followed by checksum).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(PAYLOAD_LEN + CHECKSUM_LEN);
        bytes.extend_from_slice(&self.payload);
        bytes.extend_from_slice(&self.checksum);
        bytes
    }

    /// The 174-byte payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The checksum carried by the profile.
    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes(self.checksum)
    }

    /// Whether the carried checksum matches the payload.
    pub fn is_valid(&self) -> bool {
        self.calc_checksum() == self.checksum()
    }

    /// Cooking duration in minutes.
    pub fn duration(&self) -> u16 {
        self.minutes_at(DURATION_HOURS, DURATION_MINUTES)
    }

    /// Allowed duration range `(min, max)` in minutes.
    pub fn duration_range(&self) -> (u16, u16) {
        (
            self.minutes_at(MIN_DURATION_HOURS, MIN_DURATION_MINUTES),
            self.minutes_at(MAX_DURATION_HOURS, MAX_DURATION_MINUTES),
        )
    }

    /// Whether the profile supports a variable cooking time.
    pub fn is_duration_adjustable(&self) -> bool {
        self.payload[MAX_DURATION_HOURS..=MAX_DURATION_MINUTES]
            != self.payload[MIN_DURATION_HOURS..=MIN_DURATION_MINUTES]
    }

    /// Set the cooking duration in minutes.
    ///
    /// # Arguments
    ///
    /// * `minutes` - New cooking duration
    ///
    /// # Returns
    ///
    /// `true` if the duration was applied. Does nothing (and returns `false`)
    /// if the profile has a fixed duration or `minutes` is outside the
    /// profile's own `[min, max]` range.
    ///
    /// # Example
    ///
    /// ```
    /// use ricecooker_autopilot::ProfileType;
    ///
    /// let mut congee = ProfileType::Congee.template().unwrap();
    /// assert!(congee.set_duration(150));
    /// assert!(!congee.set_duration(300));
    /// assert_eq!(congee.duration(), 150);
    /// ```
    pub fn set_duration(&mut self, minutes: u16) -> bool {
        if !self.is_duration_adjustable() {
            return false;
        }

        let (min_minutes, max_minutes) = self.duration_range();
        if minutes < min_minutes || minutes > max_minutes {
            return false;
        }

        self.payload[DURATION_HOURS] = (minutes / 60) as u8;
        self.payload[DURATION_MINUTES] = (minutes % 60) as u8;
        self.update_checksum();
        true
    }

    /// Whether a delayed start is enabled.
    pub fn is_schedule_enabled(&self) -> bool {
        self.payload[SCHEDULE_HOURS] & FLAG_BIT == FLAG_BIT
    }

    /// Set or clear the delayed-start flag.
    pub fn set_schedule_enabled(&mut self, enabled: bool) {
        if enabled {
            self.payload[SCHEDULE_HOURS] |= FLAG_BIT;
        } else {
            self.payload[SCHEDULE_HOURS] &= VALUE_MASK;
        }
        self.update_checksum();
    }

    /// Delay before cooking starts, in minutes (flags excluded).
    pub fn schedule_duration(&self) -> u16 {
        (self.payload[SCHEDULE_HOURS] & VALUE_MASK) as u16 * 60
            + (self.payload[SCHEDULE_MINUTES] & VALUE_MASK) as u16
    }

    /// Set the delay before cooking, keeping both flag bits untouched.
    pub fn set_schedule_duration(&mut self, minutes: u16) {
        let schedule_flag = self.payload[SCHEDULE_HOURS] & FLAG_BIT;
        let keep_warm_flag = self.payload[SCHEDULE_MINUTES] & FLAG_BIT;

        self.payload[SCHEDULE_HOURS] = ((minutes / 60) as u8 & VALUE_MASK) | schedule_flag;
        self.payload[SCHEDULE_MINUTES] = (minutes % 60) as u8 | keep_warm_flag;
        self.update_checksum();
    }

    /// Enable the delayed start and set its delay.
    ///
    /// The keep-warm flag is left as it is.
    ///
    /// # Arguments
    ///
    /// * `minutes` - Delay before cooking, within `1..=MAX_DELAYED_START_MINUTES`
    ///
    /// # Example
    ///
    /// ```
    /// use ricecooker_autopilot::ProfileType;
    ///
    /// let mut profile = ProfileType::QuickRice.template().unwrap();
    /// profile.set_delayed_start(150);
    /// assert!(profile.is_schedule_enabled());
    /// assert!(profile.is_keep_warm_enabled());
    /// assert_eq!(profile.schedule_duration(), 150);
    /// ```
    pub fn set_delayed_start(&mut self, minutes: u16) {
        self.set_schedule_enabled(true);
        self.set_schedule_duration(minutes);
    }

    /// Whether the appliance keeps the food warm after cooking.
    pub fn is_keep_warm_enabled(&self) -> bool {
        self.payload[SCHEDULE_MINUTES] & FLAG_BIT == FLAG_BIT
    }

    /// Set or clear the keep-warm flag.
    pub fn set_keep_warm_enabled(&mut self, enabled: bool) {
        if enabled {
            self.payload[SCHEDULE_MINUTES] |= FLAG_BIT;
        } else {
            self.payload[SCHEDULE_MINUTES] &= VALUE_MASK;
        }
        self.update_checksum();
    }

    fn minutes_at(&self, hours: usize, minutes: usize) -> u16 {
        self.payload[hours] as u16 * 60 + self.payload[minutes] as u16
    }

    fn calc_checksum(&self) -> u16 {
        calculate_crc(&self.payload)
    }

    fn update_checksum(&mut self) {
        self.checksum = self.calc_checksum().to_be_bytes();
    }
}

impl fmt::Debug for CookingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookingProfile")
            .field("duration", &self.duration())
            .field("duration_range", &self.duration_range())
            .field("schedule_enabled", &self.is_schedule_enabled())
            .field("schedule_duration", &self.schedule_duration())
            .field("keep_warm", &self.is_keep_warm_enabled())
            .field("checksum", &format_args!("{:#06x}", self.checksum()))
            .finish()
    }
}
