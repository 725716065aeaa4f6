use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};
use xsettings_core::codec::{decode, encode};
use xsettings_core::{Color, ScaleConfig, SettingValue, SettingsBlob};

use crate::display::DisplayServer;
use crate::error::{Result, XSettingsError};
use crate::registry::SettingRegistry;
use crate::scale::{DerivedSettings, ScaleMap, DEFAULT_SCALE_FACTOR, SCREEN_SCALE_FACTORS_KEY};
use crate::store::SettingsStore;

/// Typed access to the XSETTINGS property.
///
/// Every call re-reads the property; nothing is served from a cache. Setters
/// mirror the new value into the secondary store after the property write
/// succeeded.
pub trait XSettingsService: Send + Sync {
    /// Names of all settings as a JSON list, or an empty string when the
    /// property is unreadable or holds no settings.
    fn list_props(&self) -> String;

    fn set_integer(&self, name: &str, value: i32) -> Result<()>;
    fn get_integer(&self, name: &str) -> Result<i32>;

    fn set_string(&self, name: &str, value: &str) -> Result<()>;
    fn get_string(&self, name: &str) -> Result<String>;

    /// `value` must hold exactly red, green, blue and alpha.
    fn set_color(&self, name: &str, value: &[u16]) -> Result<()>;
    /// Channels in red, green, blue, alpha order.
    fn get_color(&self, name: &str) -> Result<Vec<u16>>;

    /// Scale factor of the primary monitor, 1.0 when it cannot be determined.
    fn get_scale_factor(&self) -> f64;
    fn set_scale_factor(&self, scale: f64) -> Result<()>;

    /// Merges `factors` into the per-monitor scale map.
    fn set_screen_scale_factors(&self, factors: &HashMap<String, f64>) -> Result<()>;
    /// The whole per-monitor scale map, empty when it cannot be read.
    fn get_screen_scale_factors(&self) -> HashMap<String, f64>;

    fn get_property_serial(&self) -> Result<u32>;

    /// Publishes every registered setting found in the secondary store.
    /// Returns the number of settings written.
    fn load_from_store(&self) -> Result<usize>;

    /// Gives every connected monitor without a scale entry the default
    /// factor. Returns whether the property was written.
    fn sync_connected_monitors(&self) -> Result<bool>;
}

/// What to do with a change once the property has been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MirrorPolicy {
    /// Unregistered names fail with `PropertyNotRegistered`.
    Required,
    IfRegistered,
    Skip,
}

#[derive(Debug, Clone)]
struct PendingChange {
    name: String,
    value: SettingValue,
    mirror: MirrorPolicy,
}

impl PendingChange {
    fn new(name: impl Into<String>, value: SettingValue, mirror: MirrorPolicy) -> Self {
        Self { name: name.into(), value, mirror }
    }
}

pub struct DefaultXSettingsService {
    /// Held shared by getters and exclusive for a whole read-modify-write-mirror cycle.
    settings_lock: RwLock<()>,
    display: Arc<dyn DisplayServer>,
    store: Arc<dyn SettingsStore>,
    registry: Arc<SettingRegistry>,
    scale_config: ScaleConfig,
}

impl DefaultXSettingsService {
    pub fn new(
        display: Arc<dyn DisplayServer>,
        store: Arc<dyn SettingsStore>,
        registry: Arc<SettingRegistry>,
        scale_config: ScaleConfig,
    ) -> Self {
        Self {
            settings_lock: RwLock::new(()),
            display,
            store,
            registry,
            scale_config,
        }
    }

    pub fn registry(&self) -> &SettingRegistry {
        &self.registry
    }

    /// Reads and decodes the property. Callers hold `settings_lock`.
    fn read_blob(&self) -> Result<SettingsBlob> {
        let data = self.display.read_property()?;
        if data.is_empty() {
            return Ok(SettingsBlob::new());
        }
        Ok(decode(&data)?)
    }

    fn get_value(&self, name: &str) -> Result<SettingValue> {
        let _guard = self.settings_lock.read();
        let blob = self.read_blob()?;
        blob.get(name)
            .map(|item| item.value.clone())
            .ok_or_else(|| XSettingsError::PropertyNotFound(name.to_string()))
    }

    fn set_value(&self, name: &str, value: SettingValue) -> Result<()> {
        validate_name(name)?;
        let display_value = value.to_string();
        self.commit(|_| Ok(vec![PendingChange::new(name, value, MirrorPolicy::Required)]))
            .map(|_| ())
            .map_err(|e| {
                debug!("Set '{}' to '{}' failed: {}", name, display_value, e);
                e
            })
    }

    /// Runs one write cycle under the exclusive lock.
    ///
    /// `build` sees the freshly decoded property and returns the changes to
    /// apply. No write happens when it returns none. All changes share one
    /// new blob serial. Mirroring is attempted for every change; the first
    /// mirror failure is returned after the property has been written.
    fn commit<F>(&self, build: F) -> Result<usize>
    where
        F: FnOnce(&SettingsBlob) -> Result<Vec<PendingChange>>,
    {
        let _guard = self.settings_lock.write();
        let mut blob = self.read_blob()?;
        let changes = build(&blob)?;
        if changes.is_empty() {
            return Ok(0);
        }

        for change in &changes {
            if let Some(existing) = blob.get(&change.name) {
                if existing.setting_type() != change.value.setting_type() {
                    return Err(XSettingsError::type_mismatch(
                        &change.name,
                        existing.setting_type().as_str(),
                        change.value.setting_type().as_str(),
                    ));
                }
            }
        }

        let serial = blob.bump_serial();
        for change in &changes {
            blob.upsert(&change.name, change.value.clone(), serial);
        }
        self.display.write_property(&encode(&blob))?;
        info!("Wrote {} setting(s) to the xsettings property, serial {}", changes.len(), serial);

        let mut first_error = None;
        for change in &changes {
            if let Err(e) = self.mirror(change) {
                warn!("{}", e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(changes.len()),
        }
    }

    fn mirror(&self, change: &PendingChange) -> Result<()> {
        if change.mirror == MirrorPolicy::Skip {
            return Ok(());
        }
        let entry = match self.registry.lookup(&change.name) {
            Some(entry) => entry,
            None if change.mirror == MirrorPolicy::IfRegistered => return Ok(()),
            None => return Err(XSettingsError::PropertyNotRegistered(change.name.clone())),
        };
        let store_value = entry.to_store_value(&change.value)?;
        self.store
            .set_value(&entry.store_key, store_value)
            .map_err(|source| XSettingsError::Mirror { name: change.name.clone(), source })
    }

    fn current_scale_map(&self) -> Result<ScaleMap> {
        let _guard = self.settings_lock.read();
        scale_map_of(&self.read_blob()?)
    }

    /// The packed scale map plus, when enabled and the primary monitor is
    /// known, the derived GTK settings.
    fn scale_changes(&self, map: &ScaleMap, primary: Option<&str>) -> Result<Vec<PendingChange>> {
        let mut changes = vec![PendingChange::new(
            SCREEN_SCALE_FACTORS_KEY,
            SettingValue::String(map.to_packed()),
            MirrorPolicy::Required,
        )];
        if let (true, Some(primary)) = (self.scale_config.derive_dpi_settings, primary) {
            let derived = DerivedSettings::for_scale(map.get(primary), self.scale_config.base_dpi)?;
            changes.extend(
                derived
                    .items()
                    .into_iter()
                    .map(|(name, value)| PendingChange::new(name, SettingValue::Integer(value), MirrorPolicy::IfRegistered)),
            );
        }
        Ok(changes)
    }

    /// Merges `factors` and writes the scale map, deriving DPI settings for
    /// `primary` when given.
    fn write_scale_factors(&self, factors: &HashMap<String, f64>, primary: Option<String>) -> Result<()> {
        self.commit(|blob| {
            let mut map = scale_map_of(blob)?;
            map.merge(factors)?;
            self.scale_changes(&map, primary.as_deref())
        })
        .map(|_| ())
        .map_err(|e| {
            debug!("Set screen scale factors {:?} failed: {}", factors, e);
            e
        })
    }

    /// Primary monitor for derived settings; `None` when it does not matter or cannot be resolved.
    fn primary_for_derived(&self) -> Option<String> {
        if !self.scale_config.derive_dpi_settings {
            return None;
        }
        match self.display.primary_monitor_name() {
            Ok(primary) => Some(primary),
            Err(e) => {
                debug!("Skipping derived DPI settings: {}", e);
                None
            }
        }
    }
}

impl XSettingsService for DefaultXSettingsService {
    fn list_props(&self) -> String {
        let _guard = self.settings_lock.read();
        let blob = match self.read_blob() {
            Ok(blob) => blob,
            Err(e) => {
                debug!("List props failed: {}", e);
                return String::new();
            }
        };
        if blob.is_empty() {
            return String::new();
        }
        serde_json::to_string(&blob.names().collect::<Vec<_>>()).unwrap_or_default()
    }

    fn set_integer(&self, name: &str, value: i32) -> Result<()> {
        self.set_value(name, SettingValue::Integer(value))
    }

    fn get_integer(&self, name: &str) -> Result<i32> {
        let value = self.get_value(name).map_err(|e| log_get_failure(name, e))?;
        value
            .as_integer()
            .ok_or_else(|| XSettingsError::type_mismatch(name, "integer", value.setting_type().as_str()))
    }

    fn set_string(&self, name: &str, value: &str) -> Result<()> {
        self.set_value(name, SettingValue::String(value.to_string()))
    }

    fn get_string(&self, name: &str) -> Result<String> {
        let value = self.get_value(name).map_err(|e| log_get_failure(name, e))?;
        match value {
            SettingValue::String(s) => Ok(s),
            other => Err(XSettingsError::type_mismatch(name, "string", other.setting_type().as_str())),
        }
    }

    fn set_color(&self, name: &str, value: &[u16]) -> Result<()> {
        let color = Color::from_channels(value).ok_or_else(|| {
            XSettingsError::InvalidArgument(format!("Color needs 4 channels, got {}", value.len()))
        })?;
        self.set_value(name, SettingValue::Color(color))
    }

    fn get_color(&self, name: &str) -> Result<Vec<u16>> {
        let value = self.get_value(name).map_err(|e| log_get_failure(name, e))?;
        value
            .as_color()
            .map(|color| color.channels().to_vec())
            .ok_or_else(|| XSettingsError::type_mismatch(name, "color", value.setting_type().as_str()))
    }

    fn get_scale_factor(&self) -> f64 {
        let primary = match self.display.primary_monitor_name() {
            Ok(primary) => primary,
            Err(e) => {
                warn!("Cannot resolve the primary monitor, using scale {}: {}", DEFAULT_SCALE_FACTOR, e);
                return DEFAULT_SCALE_FACTOR;
            }
        };
        match self.current_scale_map() {
            Ok(map) => map.get(&primary),
            Err(e) => {
                warn!("Cannot read screen scale factors, using scale {}: {}", DEFAULT_SCALE_FACTOR, e);
                DEFAULT_SCALE_FACTOR
            }
        }
    }

    fn set_scale_factor(&self, scale: f64) -> Result<()> {
        let primary = self.display.primary_monitor_name()?;
        let derived_for = self.scale_config.derive_dpi_settings.then(|| primary.clone());
        self.write_scale_factors(&HashMap::from([(primary, scale)]), derived_for)
    }

    fn set_screen_scale_factors(&self, factors: &HashMap<String, f64>) -> Result<()> {
        if factors.is_empty() {
            debug!("No screen scale factors given, nothing to write");
            return Ok(());
        }
        self.write_scale_factors(factors, self.primary_for_derived())
    }

    fn get_screen_scale_factors(&self) -> HashMap<String, f64> {
        match self.current_scale_map() {
            Ok(map) => map.to_hash_map(),
            Err(e) => {
                warn!("Cannot read screen scale factors: {}", e);
                HashMap::new()
            }
        }
    }

    fn get_property_serial(&self) -> Result<u32> {
        let _guard = self.settings_lock.read();
        Ok(self.read_blob()?.serial)
    }

    fn load_from_store(&self) -> Result<usize> {
        let mut loaded = Vec::new();
        for entry in self.registry.iter() {
            let stored = match self.store.get_value(&entry.store_key) {
                Ok(Some(stored)) => stored,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Cannot read '{}' from the settings store: {}", entry.store_key, e);
                    continue;
                }
            };
            match entry.from_store_value(&stored) {
                Ok(value) => loaded.push(PendingChange::new(entry.xsettings_key.clone(), value, MirrorPolicy::Skip)),
                Err(e) => warn!("Ignoring stored value of '{}': {}", entry.store_key, e),
            }
        }

        let written = self.commit(|blob| {
            Ok(loaded
                .into_iter()
                .filter(|change| match blob.get(&change.name) {
                    None => true,
                    Some(existing) if existing.setting_type() != change.value.setting_type() => {
                        warn!(
                            "Not loading '{}': property holds a {}, store a {}",
                            change.name,
                            existing.setting_type(),
                            change.value.setting_type()
                        );
                        false
                    }
                    Some(existing) => existing.value != change.value,
                })
                .collect())
        })?;
        info!("Loaded {} setting(s) from the settings store", written);
        Ok(written)
    }

    fn sync_connected_monitors(&self) -> Result<bool> {
        let monitors = self.display.connected_monitor_names()?;
        let primary = self.primary_for_derived();
        let written = self.commit(|blob| {
            let mut map = scale_map_of(blob)?;
            let missing: Vec<&str> = monitors.iter().map(String::as_str).filter(|m| !map.contains(m)).collect();
            let mut added = 0;
            for monitor in missing {
                match map.insert(monitor, DEFAULT_SCALE_FACTOR) {
                    Ok(()) => added += 1,
                    Err(e) => warn!("Skipping monitor: {}", e),
                }
            }
            if added == 0 {
                return Ok(Vec::new());
            }
            debug!("Adding default scale for {} monitor(s)", added);
            self.scale_changes(&map, primary.as_deref())
        })?;
        Ok(written > 0)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(XSettingsError::InvalidArgument("Setting name must not be empty".to_string()));
    }
    if name.len() > usize::from(u16::MAX) {
        return Err(XSettingsError::InvalidArgument(format!(
            "Setting name is {} bytes long, the limit is {}",
            name.len(),
            u16::MAX
        )));
    }
    Ok(())
}

fn scale_map_of(blob: &SettingsBlob) -> Result<ScaleMap> {
    match blob.get(SCREEN_SCALE_FACTORS_KEY) {
        None => Ok(ScaleMap::new()),
        Some(item) => item.value.as_str().map(ScaleMap::parse).ok_or_else(|| {
            XSettingsError::type_mismatch(SCREEN_SCALE_FACTORS_KEY, "string", item.setting_type().as_str())
        }),
    }
}

fn log_get_failure(name: &str, e: XSettingsError) -> XSettingsError {
    debug!("Get '{}' value failed: {}", name, e);
    e
}
