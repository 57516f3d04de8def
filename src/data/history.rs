//! Temperature history recorded while cooking.

use std::fmt;

/// Temperatures sampled every 10-15 seconds while the appliance cooks.
///
/// The appliance reports one hex octet per sample in °C, e.g.
/// `161515161c` is 22, 21, 21, 22, 28 °C. It reports `0` while idle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TemperatureHistory {
    samples: Vec<u8>,
}

impl TemperatureHistory {
    /// Parse the hex string returned by `get_temp_history`.
    ///
    /// Odd-length or non-hex input yields an empty history.
    pub fn parse(data: &str) -> Self {
        if data.len() % 2 != 0 {
            return Self::default();
        }

        Self {
            samples: hex::decode(data).unwrap_or_default(),
        }
    }

    /// Samples in °C, oldest first.
    pub fn temperatures(&self) -> &[u8] {
        &self.samples
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<u8> {
        self.samples.last().copied()
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Hex representation, as reported by the appliance.
    pub fn raw(&self) -> String {
        hex::encode(&self.samples)
    }
}

impl fmt::Display for TemperatureHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.samples)
    }
}
