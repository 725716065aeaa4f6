//! Per-monitor scale factors.
//!
//! All factors live in the single string setting `Qt/ScreenScaleFactors`,
//! packed as `NAME=FACTOR;NAME=FACTOR`. The global scale is the primary
//! monitor's entry; monitors without an entry are at 1.0.


use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::warn;

use crate::error::{Result, XSettingsError};

pub const SCREEN_SCALE_FACTORS_KEY: &str = "Qt/ScreenScaleFactors";
pub const WINDOW_SCALING_FACTOR_KEY: &str = "Gdk/WindowScalingFactor";
pub const XFT_DPI_KEY: &str = "Xft/DPI";
pub const UNSCALED_DPI_KEY: &str = "Gdk/UnscaledDPI";

pub const DEFAULT_SCALE_FACTOR: f64 = 1.0;

/// Xft/DPI and Gdk/UnscaledDPI are published in 1/1024 dots per inch.
const DPI_SCALE: f64 = 1024.0;

/// Monitor name to scale factor, ordered by name so packing is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScaleMap(BTreeMap<String, f64>);

impl ScaleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a packed value. Malformed segments are skipped with a warning.
    pub fn parse(packed: &str) -> Self {
        let mut map = BTreeMap::new();
        for segment in packed.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let parsed = segment
                .split_once('=')
                .and_then(|(name, factor)| Some((name.trim(), factor.trim().parse::<f64>().ok()?)))
                .filter(|(name, factor)| validate_entry(name, *factor).is_ok());
            match parsed {
                Some((name, factor)) => {
                    map.insert(name.to_string(), factor);
                }
                None => warn!("Ignoring malformed screen scale entry '{}'", segment),
            }
        }
        Self(map)
    }

    pub fn to_packed(&self) -> String {
        self.to_string()
    }

    /// Factor of `monitor`, [`DEFAULT_SCALE_FACTOR`] when it has no entry.
    pub fn get(&self, monitor: &str) -> f64 {
        self.0.get(monitor).copied().unwrap_or(DEFAULT_SCALE_FACTOR)
    }

    pub fn contains(&self, monitor: &str) -> bool {
        self.0.contains_key(monitor)
    }

    pub fn insert(&mut self, monitor: &str, factor: f64) -> Result<()> {
        validate_entry(monitor, factor)?;
        self.0.insert(monitor.to_string(), factor);
        Ok(())
    }

    /// Overlays `factors`. Nothing is applied unless every entry is valid.
    pub fn merge(&mut self, factors: &HashMap<String, f64>) -> Result<()> {
        for (monitor, factor) in factors {
            validate_entry(monitor, *factor)?;
        }
        self.0.extend(factors.iter().map(|(monitor, factor)| (monitor.clone(), *factor)));
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(monitor, factor)| (monitor.as_str(), *factor))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hash_map(&self) -> HashMap<String, f64> {
        self.0.iter().map(|(monitor, factor)| (monitor.clone(), *factor)).collect()
    }
}

impl fmt::Display for ScaleMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (monitor, factor)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}={}", monitor, factor)?;
        }
        Ok(())
    }
}

/// Monitor names must be non-empty, free of the packing separators and of
/// surrounding whitespace (which parsing strips); factors must be finite and
/// positive.
pub fn validate_entry(monitor: &str, factor: f64) -> Result<()> {
    if monitor.is_empty() || monitor.contains(['=', ';']) || monitor.trim() != monitor {
        return Err(XSettingsError::InvalidArgument(format!("Invalid monitor name '{}'", monitor)));
    }
    if !factor.is_finite() || factor <= 0.0 {
        return Err(XSettingsError::InvalidArgument(format!(
            "Invalid scale factor {} for monitor '{}'",
            factor, monitor
        )));
    }
    Ok(())
}

/// GTK's view of the primary monitor's scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedSettings {
    pub window_scaling_factor: i32,
    pub xft_dpi: i32,
    pub unscaled_dpi: i32,
}

impl DerivedSettings {
    /// Fails with `InvalidArgument` when `Xft/DPI` would not fit an INT32.
    pub fn for_scale(scale: f64, base_dpi: u32) -> Result<Self> {
        let xft_dpi = (scale * f64::from(base_dpi) * DPI_SCALE).round();
        if !(0.0..=f64::from(i32::MAX)).contains(&xft_dpi) {
            return Err(XSettingsError::InvalidArgument(format!(
                "Scale factor {} at {} DPI is out of range for Xft/DPI",
                scale, base_dpi
            )));
        }
        let xft_dpi = xft_dpi as i32;
        // floor(scale) <= Xft/DPI, so this fits as well.
        let window_scaling_factor = (scale.floor() as i32).max(1);
        let unscaled_dpi = (f64::from(xft_dpi) / f64::from(window_scaling_factor)).round() as i32;
        Ok(Self { window_scaling_factor, xft_dpi, unscaled_dpi })
    }

    /// Setting name and value pairs in publishing order.
    pub fn items(&self) -> [(&'static str, i32); 3] {
        [
            (WINDOW_SCALING_FACTOR_KEY, self.window_scaling_factor),
            (XFT_DPI_KEY, self.xft_dpi),
            (UNSCALED_DPI_KEY, self.unscaled_dpi),
        ]
    }
}
