// SPDX-License-Identifier: Apache-2.0

//! Render-time number formatting. Stored values are never rounded.

pub const VOLUME_DECIMALS: usize = 2;
pub const RATIO_DECIMALS: usize = 4;
pub const MISSING_PLACEHOLDER: &str = "-";

#[must_use]
pub fn format_fixed(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.decimals$}"),
        _ => MISSING_PLACEHOLDER.to_string(),
    }
}

/// Recharge and demand volumes.
#[must_use]
pub fn format_volume(value: Option<f64>) -> String {
    format_fixed(value, VOLUME_DECIMALS)
}

/// GSR ratios.
#[must_use]
pub fn format_ratio(value: Option<f64>) -> String {
    format_fixed(value, RATIO_DECIMALS)
}
