//! Appliance status decoded from a property query.
//!
//! The appliance is queried for a fixed list of properties ([`PROPERTIES`])
//! and answers with values in the same order. Values are mapped onto the
//! property names once, here; anything the appliance did not return (or
//! returned as `null`) becomes `None`.

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

use super::menus::{cooking_stage, menu_name};
use super::mode::OperationMode;

/// Properties requested for a full status read, in order.
pub const PROPERTIES: [&str; 21] = [
    "status", "phase", "menu", "t_cook", "t_left", "t_pre", "t_kw", "taste", "temp", "rice",
    "favs", "akw", "t_start", "t_finish", "version", "setting", "code", "en_warm", "t_congee",
    "t_love", "boil",
];

/// Typed appliance status.
///
/// Rebuilt on every poll; nothing here is retained between reads.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplianceStatus {
    /// Current operation mode.
    pub mode: OperationMode,
    /// Raw cooking stage (`phase`).
    pub phase: Option<i64>,
    /// Selected menu ID.
    pub menu_id: Option<String>,
    /// Current temperature in °C.
    pub temperature: Option<i64>,
    /// Start time of the cooking process (device timestamp).
    pub start_time: Option<i64>,
    /// Finish time of the cooking process (device timestamp).
    pub finish_time: Option<i64>,
    /// Remaining minutes of the cooking process.
    pub remaining_minutes: Option<i64>,
    /// Minutes before a delayed start begins cooking.
    pub cooking_delay: Option<i64>,
    /// Total duration of the cooking process.
    pub duration: Option<i64>,
    /// Keep-warm time (`t_kw`).
    pub keep_warm_time: Option<i64>,
    /// Keep warm after cooking.
    pub keep_warm: Option<bool>,
    /// Taste ID.
    pub taste: Option<i64>,
    /// Rice ID.
    pub rice: Option<i64>,
    /// Favourite recipe ID.
    pub favorite: Option<String>,
    /// Firmware-reported version string.
    pub version: Option<String>,
    /// Error code reported by the appliance.
    pub code: Option<i64>,
}

impl ApplianceStatus {
    /// Build a status from values aligned with [`PROPERTIES`].
    ///
    /// A count mismatch is logged and tolerated: values are matched to names
    /// positionally and missing trailing properties read as `None`.
    pub fn parse(values: &[Value]) -> Self {
        if values.len() != PROPERTIES.len() {
            warn!(
                "Count ({}) of requested properties does not match the count ({}) of received values",
                PROPERTIES.len(),
                values.len()
            );
        }

        let props: HashMap<&'static str, &Value> = PROPERTIES
            .iter()
            .copied()
            .zip(values.iter())
            .filter(|(_, value)| !value.is_null())
            .collect();

        let int = |name: &str| props.get(name).and_then(|v| value_as_i64(v));
        let text = |name: &str| props.get(name).and_then(|v| value_as_string(v));

        Self {
            mode: int("status").map_or(OperationMode::Unknown, OperationMode::from_raw),
            phase: int("phase"),
            menu_id: text("menu"),
            temperature: int("temp"),
            start_time: int("t_start"),
            finish_time: int("t_finish"),
            remaining_minutes: int("t_left").map(|seconds| seconds.div_euclid(60)),
            cooking_delay: int("t_pre").filter(|&delay| delay >= 0),
            duration: int("t_cook"),
            keep_warm_time: int("t_kw"),
            keep_warm: int("akw").map(|akw| akw == 1),
            taste: int("taste"),
            rice: int("rice"),
            favorite: text("favs"),
            version: text("version"),
            code: int("code"),
        }
    }

    /// Human-readable name of the current cooking stage.
    pub fn stage_name(&self) -> &'static str {
        self.phase
            .and_then(cooking_stage)
            .map_or("Unknown stage", |stage| stage.name)
    }

    /// Human-readable name of the selected menu.
    pub fn menu_name(&self) -> &'static str {
        self.menu_id
            .as_deref()
            .and_then(menu_name)
            .unwrap_or("Unknown menu")
    }
}

/// Read an integer from a number or a numeric string.
pub(crate) fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
