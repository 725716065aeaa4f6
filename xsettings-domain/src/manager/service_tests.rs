use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use xsettings_core::codec::{decode, encode};
use xsettings_core::{ByteOrder, Color, ScaleConfig, SettingItem, SettingValue, SettingsBlob};

use super::{DefaultXSettingsService, XSettingsService};
use crate::display::{DisplayServer, DisplayServerError};
use crate::error::XSettingsError;
use crate::registry::{Conversion, RegistryEntry, SettingRegistry};
use crate::store::{MemorySettingsStore, SettingsStore, StoreError, StoreValue};

// --- Fakes ---

#[derive(Default)]
struct FakeDisplay {
    property: Mutex<Vec<u8>>,
    primary: Mutex<Option<String>>,
    monitors: Mutex<Vec<String>>,
    fail_read: AtomicBool,
    fail_write: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
    primary_lookups: AtomicUsize,
}

impl FakeDisplay {
    fn with_primary(primary: &str) -> Self {
        let display = Self::default();
        *display.primary.lock() = Some(primary.to_string());
        display
    }

    fn set_blob(&self, blob: &SettingsBlob) {
        *self.property.lock() = encode(blob);
    }

    fn blob(&self) -> SettingsBlob {
        decode(&self.property.lock()).expect("property should decode")
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl DisplayServer for FakeDisplay {
    fn read_property(&self) -> Result<Vec<u8>, DisplayServerError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_read.load(Ordering::SeqCst) {
            return Err(DisplayServerError::Read("connection lost".to_string()));
        }
        Ok(self.property.lock().clone())
    }

    fn write_property(&self, data: &[u8]) -> Result<(), DisplayServerError> {
        if self.fail_write.load(Ordering::SeqCst) {
            return Err(DisplayServerError::Write("BadAlloc".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.property.lock() = data.to_vec();
        Ok(())
    }

    fn primary_monitor_name(&self) -> Result<String, DisplayServerError> {
        self.primary_lookups.fetch_add(1, Ordering::SeqCst);
        self.primary.lock().clone().ok_or(DisplayServerError::NoPrimaryMonitor)
    }

    fn connected_monitor_names(&self) -> Result<Vec<String>, DisplayServerError> {
        Ok(self.monitors.lock().clone())
    }
}

struct RejectingStore;

impl SettingsStore for RejectingStore {
    fn set_value(&self, key: &str, _value: StoreValue) -> Result<(), StoreError> {
        Err(StoreError::Rejected { key: key.to_string(), reason: "read-only".to_string() })
    }

    fn get_value(&self, _key: &str) -> Result<Option<StoreValue>, StoreError> {
        Ok(None)
    }
}

struct Fixture {
    display: Arc<FakeDisplay>,
    store: Arc<MemorySettingsStore>,
    service: DefaultXSettingsService,
}

fn fixture_with(display: FakeDisplay, store: MemorySettingsStore, scale_config: ScaleConfig) -> Fixture {
    let display = Arc::new(display);
    let store = Arc::new(store);
    let service = DefaultXSettingsService::new(
        display.clone(),
        store.clone(),
        Arc::new(SettingRegistry::with_defaults()),
        scale_config,
    );
    Fixture { display, store, service }
}

fn fixture() -> Fixture {
    fixture_with(FakeDisplay::with_primary("eDP-1"), MemorySettingsStore::new(), ScaleConfig::default())
}

// --- Typed get/set ---

#[test]
fn test_double_click_time_end_to_end() {
    let f = fixture();
    f.service.set_integer("Net/DoubleClickTime", 400).unwrap();

    assert_eq!(f.service.get_integer("Net/DoubleClickTime").unwrap(), 400);
    assert_eq!(f.store.get_value("double-click-time").unwrap(), Some(StoreValue::Int(400)));

    let blob = f.display.blob();
    assert_eq!(blob.serial, 1);
    assert_eq!(blob.items, vec![SettingItem::new("Net/DoubleClickTime", SettingValue::Integer(400), 1)]);
}

#[test]
fn test_string_and_boolean_mirroring() {
    let f = fixture();
    f.service.set_string("Net/ThemeName", "Adwaita-dark").unwrap();
    f.service.set_integer("Net/CursorBlink", 0).unwrap();

    assert_eq!(f.service.get_string("Net/ThemeName").unwrap(), "Adwaita-dark");
    assert_eq!(f.store.get_value("theme-name").unwrap(), Some(StoreValue::String("Adwaita-dark".into())));
    assert_eq!(f.store.get_value("cursor-blink").unwrap(), Some(StoreValue::Bool(false)));
}

#[test]
fn test_update_keeps_order_and_bumps_serials() {
    let f = fixture();
    f.service.set_string("Net/ThemeName", "Adwaita").unwrap();
    f.service.set_integer("Net/DoubleClickTime", 400).unwrap();
    f.service.set_string("Net/ThemeName", "HighContrast").unwrap();

    let blob = f.display.blob();
    assert_eq!(blob.serial, 3);
    assert_eq!(
        blob.items,
        vec![
            SettingItem::new("Net/ThemeName", SettingValue::String("HighContrast".into()), 3),
            SettingItem::new("Net/DoubleClickTime", SettingValue::Integer(400), 2),
        ]
    );
    assert_eq!(f.service.get_property_serial().unwrap(), 3);
}

#[test]
fn test_existing_property_is_preserved() {
    let f = fixture();
    let mut existing = SettingsBlob::new();
    existing.byte_order = ByteOrder::MsbFirst;
    existing.serial = 41;
    existing.upsert("Gtk/IMModule", SettingValue::String("ibus".into()), 7);
    f.display.set_blob(&existing);

    f.service.set_integer("Xft/Antialias", 1).unwrap();

    let blob = f.display.blob();
    assert_eq!(blob.byte_order, ByteOrder::MsbFirst);
    assert_eq!(blob.serial, 42);
    assert_eq!(blob.items[0], SettingItem::new("Gtk/IMModule", SettingValue::String("ibus".into()), 7));
    assert_eq!(blob.items[1], SettingItem::new("Xft/Antialias", SettingValue::Integer(1), 42));
}

#[test]
fn test_get_missing_property() {
    let f = fixture();
    assert!(matches!(f.service.get_integer("Net/DoubleClickTime"), Err(XSettingsError::PropertyNotFound(name)) if name == "Net/DoubleClickTime"));
    assert!(matches!(f.service.get_color("Qt/ActiveColor"), Err(XSettingsError::PropertyNotFound(_))));
}

#[test]
fn test_get_with_wrong_type() {
    let f = fixture();
    f.service.set_integer("Net/DoubleClickTime", 400).unwrap();

    match f.service.get_string("Net/DoubleClickTime") {
        Err(XSettingsError::TypeMismatch { expected, actual, .. }) => {
            assert_eq!(expected, "string");
            assert_eq!(actual, "integer");
        }
        other => panic!("Expected TypeMismatch, got {:?}", other),
    }
    assert!(matches!(f.service.get_color("Net/DoubleClickTime"), Err(XSettingsError::TypeMismatch { .. })));
}

#[test]
fn test_set_with_wrong_type_does_not_write() {
    let f = fixture();
    f.service.set_integer("Net/DoubleClickTime", 400).unwrap();
    let writes = f.display.writes();

    let result = f.service.set_string("Net/DoubleClickTime", "fast");
    assert!(matches!(result, Err(XSettingsError::TypeMismatch { .. })));
    assert_eq!(f.display.writes(), writes);
    assert_eq!(f.service.get_integer("Net/DoubleClickTime").unwrap(), 400);
}

#[test]
fn test_color_round_trip() {
    let f = fixture();
    f.service.set_color("Qt/ActiveColor", &[0x3535, 0x8484, 0xe4e4, 0xffff]).unwrap();

    assert_eq!(f.service.get_color("Qt/ActiveColor").unwrap(), vec![0x3535, 0x8484, 0xe4e4, 0xffff]);
    assert_eq!(f.store.get_value("qt-active-color").unwrap(), Some(StoreValue::String("#3584e4ff".into())));
    assert_eq!(
        f.display.blob().get("Qt/ActiveColor").unwrap().value,
        SettingValue::Color(Color::new(0x3535, 0x8484, 0xe4e4, 0xffff))
    );
}

#[test]
fn test_color_length_checked_before_io() {
    let f = fixture();
    for channels in [&[1u16, 2, 3][..], &[1, 2, 3, 4, 5][..], &[][..]] {
        assert!(matches!(f.service.set_color("Qt/ActiveColor", channels), Err(XSettingsError::InvalidArgument(_))));
    }
    assert_eq!(f.display.reads(), 0);
    assert_eq!(f.display.writes(), 0);
}

#[test]
fn test_invalid_name_rejected_before_io() {
    let f = fixture();
    assert!(matches!(f.service.set_integer("", 1), Err(XSettingsError::InvalidArgument(_))));
    let long_name = "x".repeat(usize::from(u16::MAX) + 1);
    assert!(matches!(f.service.set_string(&long_name, "v"), Err(XSettingsError::InvalidArgument(_))));
    assert_eq!(f.display.reads(), 0);
}

#[test]
fn test_unregistered_name_is_written_but_reported() {
    let f = fixture();
    let result = f.service.set_string("Gtk/IMModule", "ibus");

    assert!(matches!(result, Err(XSettingsError::PropertyNotRegistered(name)) if name == "Gtk/IMModule"));
    assert_eq!(f.service.get_string("Gtk/IMModule").unwrap(), "ibus");
    assert!(f.store.snapshot().is_empty());
}

#[test]
fn test_write_failure_leaves_store_untouched() {
    let f = fixture();
    f.display.fail_write.store(true, Ordering::SeqCst);

    let result = f.service.set_integer("Net/DoubleClickTime", 400);
    assert!(matches!(result, Err(XSettingsError::Io(DisplayServerError::Write(_)))));
    assert_eq!(f.store.get_value("double-click-time").unwrap(), None);
}

#[test]
fn test_read_failure_surfaces() {
    let f = fixture();
    f.display.fail_read.store(true, Ordering::SeqCst);

    assert!(matches!(f.service.set_integer("Net/DoubleClickTime", 400), Err(XSettingsError::Io(_))));
    assert!(matches!(f.service.get_integer("Net/DoubleClickTime"), Err(XSettingsError::Io(_))));
    assert_eq!(f.display.writes(), 0);
}

#[test]
fn test_mirror_failure_keeps_property_write() {
    let display = Arc::new(FakeDisplay::with_primary("eDP-1"));
    let service = DefaultXSettingsService::new(
        display.clone(),
        Arc::new(RejectingStore),
        Arc::new(SettingRegistry::with_defaults()),
        ScaleConfig::default(),
    );

    let result = service.set_integer("Net/DoubleClickTime", 250);
    assert!(matches!(result, Err(XSettingsError::Mirror { ref name, .. }) if name == "Net/DoubleClickTime"));
    assert_eq!(service.get_integer("Net/DoubleClickTime").unwrap(), 250);
}

#[test]
fn test_corrupted_property() {
    let f = fixture();
    *f.display.property.lock() = vec![7, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0];

    assert!(matches!(f.service.get_integer("Net/DoubleClickTime"), Err(XSettingsError::Format(_))));
    assert!(matches!(f.service.set_integer("Net/DoubleClickTime", 1), Err(XSettingsError::Format(_))));
    assert_eq!(f.service.list_props(), "");
    assert_eq!(f.display.writes(), 0);
}

#[test]
fn test_list_props() {
    let f = fixture();
    assert_eq!(f.service.list_props(), "");

    f.service.set_string("Net/ThemeName", "Adwaita").unwrap();
    f.service.set_integer("Net/DoubleClickTime", 400).unwrap();
    assert_eq!(f.service.list_props(), r#"["Net/ThemeName","Net/DoubleClickTime"]"#);
}

#[test]
fn test_property_serial_of_empty_property() {
    let f = fixture();
    assert_eq!(f.service.get_property_serial().unwrap(), 0);
}

// --- Scale factors ---

#[test]
fn test_scale_factor_defaults() {
    let f = fixture();
    assert_eq!(f.service.get_scale_factor(), 1.0);
    assert!(f.service.get_screen_scale_factors().is_empty());

    let no_primary = fixture_with(FakeDisplay::default(), MemorySettingsStore::new(), ScaleConfig::default());
    no_primary.service.set_string("Qt/ScreenScaleFactors", "eDP-1=2").unwrap();
    assert_eq!(no_primary.service.get_scale_factor(), 1.0);
}

#[test]
fn test_set_scale_factor_only_touches_primary() {
    let f = fixture();
    let initial = HashMap::from([("DP-1".to_string(), 1.5), ("eDP-1".to_string(), 1.0)]);
    f.service.set_screen_scale_factors(&initial).unwrap();

    f.service.set_scale_factor(2.0).unwrap();

    assert_eq!(f.service.get_scale_factor(), 2.0);
    let factors = f.service.get_screen_scale_factors();
    assert_eq!(factors, HashMap::from([("DP-1".to_string(), 1.5), ("eDP-1".to_string(), 2.0)]));
    assert_eq!(f.service.get_string("Qt/ScreenScaleFactors").unwrap(), "DP-1=1.5;eDP-1=2");
    assert_eq!(
        f.store.get_value("individual-scaling").unwrap(),
        Some(StoreValue::String("DP-1=1.5;eDP-1=2".into()))
    );
}

#[test]
fn test_scale_write_publishes_derived_settings() {
    let f = fixture();
    f.service.set_scale_factor(2.0).unwrap();

    assert_eq!(f.service.get_integer("Gdk/WindowScalingFactor").unwrap(), 2);
    assert_eq!(f.service.get_integer("Xft/DPI").unwrap(), 196608);
    assert_eq!(f.service.get_integer("Gdk/UnscaledDPI").unwrap(), 98304);

    assert_eq!(f.store.get_value("window-scale").unwrap(), Some(StoreValue::Int(2)));
    assert_eq!(f.store.get_value("xft-dpi").unwrap(), Some(StoreValue::Int(196608)));

    // One write, one serial for all four items.
    let blob = f.display.blob();
    assert_eq!(f.display.writes(), 1);
    assert!(blob.items.iter().all(|item| item.serial == blob.serial));
}

#[test]
fn test_derived_settings_can_be_disabled() {
    let config = ScaleConfig { base_dpi: 96, derive_dpi_settings: false };
    let f = fixture_with(FakeDisplay::with_primary("eDP-1"), MemorySettingsStore::new(), config);
    f.service.set_scale_factor(1.5).unwrap();

    assert_eq!(f.service.list_props(), r#"["Qt/ScreenScaleFactors"]"#);
}

#[test]
fn test_set_screen_scale_factors_is_idempotent() {
    let f = fixture();
    let factors = HashMap::from([("eDP-1".to_string(), 1.25), ("HDMI-1".to_string(), 2.0)]);

    f.service.set_screen_scale_factors(&factors).unwrap();
    let first = f.display.blob();
    f.service.set_screen_scale_factors(&factors).unwrap();
    let second = f.display.blob();

    assert_eq!(second.serial, first.serial + 1);
    let values = |blob: &SettingsBlob| blob.items.iter().map(|i| (i.name.clone(), i.value.clone())).collect::<Vec<_>>();
    assert_eq!(values(&first), values(&second));
    assert_eq!(f.service.get_screen_scale_factors(), factors);
}

#[test]
fn test_invalid_scale_factor_rejected() {
    let f = fixture();
    for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        assert!(matches!(f.service.set_scale_factor(scale), Err(XSettingsError::InvalidArgument(_))));
    }
    let bad_name = HashMap::from([("DP=1".to_string(), 1.0)]);
    assert!(matches!(f.service.set_screen_scale_factors(&bad_name), Err(XSettingsError::InvalidArgument(_))));
    assert_eq!(f.display.writes(), 0);
}

#[test]
fn test_set_scale_factor_resolves_primary_once() {
    let f = fixture();
    f.service.set_scale_factor(1.5).unwrap();

    assert_eq!(f.display.primary_lookups.load(Ordering::SeqCst), 1);
    assert_eq!(f.service.get_integer("Xft/DPI").unwrap(), 147456);
}

#[test]
fn test_primary_name_with_surrounding_whitespace_rejected() {
    let f = fixture_with(FakeDisplay::with_primary(" HDMI-1"), MemorySettingsStore::new(), ScaleConfig::default());

    assert!(matches!(f.service.set_scale_factor(2.0), Err(XSettingsError::InvalidArgument(_))));
    assert_eq!(f.display.writes(), 0);
    assert_eq!(f.service.get_scale_factor(), 1.0);
}

#[test]
fn test_scale_too_large_for_xft_dpi_rejected() {
    let f = fixture();

    assert!(matches!(f.service.set_scale_factor(1.0e6), Err(XSettingsError::InvalidArgument(_))));
    assert_eq!(f.display.writes(), 0);
    assert!(f.store.snapshot().is_empty());

    f.service.set_scale_factor(21845.0).unwrap();
    assert_eq!(f.service.get_integer("Xft/DPI").unwrap(), 2_147_450_880);
}

#[test]
fn test_set_scale_factor_without_primary() {
    let f = fixture_with(FakeDisplay::default(), MemorySettingsStore::new(), ScaleConfig::default());
    let result = f.service.set_scale_factor(2.0);
    assert!(matches!(result, Err(XSettingsError::Io(DisplayServerError::NoPrimaryMonitor))));
    assert_eq!(f.display.writes(), 0);
}

#[test]
fn test_empty_factor_map_writes_nothing() {
    let f = fixture();
    f.service.set_screen_scale_factors(&HashMap::new()).unwrap();
    assert_eq!(f.display.writes(), 0);
}

#[test]
fn test_scale_setting_with_wrong_type() {
    let f = fixture();
    let mut existing = SettingsBlob::new();
    existing.upsert("Qt/ScreenScaleFactors", SettingValue::Integer(2), 1);
    f.display.set_blob(&existing);

    assert_eq!(f.service.get_scale_factor(), 1.0);
    assert!(f.service.get_screen_scale_factors().is_empty());
    assert!(matches!(f.service.set_scale_factor(2.0), Err(XSettingsError::TypeMismatch { .. })));
}

#[test]
fn test_sync_connected_monitors() {
    let display = FakeDisplay::with_primary("eDP-1");
    *display.monitors.lock() = vec!["eDP-1".to_string(), "DP-1".to_string()];
    let f = fixture_with(display, MemorySettingsStore::new(), ScaleConfig::default());
    f.service.set_screen_scale_factors(&HashMap::from([("eDP-1".to_string(), 2.0)])).unwrap();

    assert!(f.service.sync_connected_monitors().unwrap());
    assert_eq!(
        f.service.get_screen_scale_factors(),
        HashMap::from([("eDP-1".to_string(), 2.0), ("DP-1".to_string(), 1.0)])
    );
    assert_eq!(f.service.get_integer("Xft/DPI").unwrap(), 196608);

    let writes = f.display.writes();
    assert!(!f.service.sync_connected_monitors().unwrap());
    assert_eq!(f.display.writes(), writes);
}

// --- Loading from the store ---

#[test]
fn test_load_from_store() {
    let store = MemorySettingsStore::with_values([
        ("theme-name", StoreValue::String("Adwaita".into())),
        ("double-click-time", StoreValue::Int(400)),
        ("cursor-blink", StoreValue::Bool(true)),
        ("qt-active-color", StoreValue::String("not a color".into())),
        ("xft-dpi", StoreValue::String("98304".into())),
        ("unrelated-key", StoreValue::Int(1)),
    ]);
    let f = fixture_with(FakeDisplay::with_primary("eDP-1"), store, ScaleConfig::default());

    assert_eq!(f.service.load_from_store().unwrap(), 3);
    assert_eq!(f.service.get_string("Net/ThemeName").unwrap(), "Adwaita");
    assert_eq!(f.service.get_integer("Net/DoubleClickTime").unwrap(), 400);
    assert_eq!(f.service.get_integer("Net/CursorBlink").unwrap(), 1);
    assert!(matches!(f.service.get_color("Qt/ActiveColor"), Err(XSettingsError::PropertyNotFound(_))));
    assert_eq!(f.display.writes(), 1);

    // Nothing changed since, so nothing is written.
    assert_eq!(f.service.load_from_store().unwrap(), 0);
    assert_eq!(f.display.writes(), 1);
}

#[test]
fn test_load_from_store_skips_conflicting_types() {
    let store = MemorySettingsStore::with_values([
        ("theme-name", StoreValue::String("Adwaita".into())),
        ("double-click-time", StoreValue::Int(400)),
    ]);
    let f = fixture_with(FakeDisplay::with_primary("eDP-1"), store, ScaleConfig::default());
    let mut existing = SettingsBlob::new();
    existing.upsert("Net/ThemeName", SettingValue::Integer(3), 1);
    f.display.set_blob(&existing);

    assert_eq!(f.service.load_from_store().unwrap(), 1);
    assert_eq!(f.service.get_integer("Net/ThemeName").unwrap(), 3);
    assert_eq!(f.service.get_integer("Net/DoubleClickTime").unwrap(), 400);
}

// --- Concurrency ---

#[test]
fn test_concurrent_writers_serialize() {
    const THREADS: usize = 8;
    const WRITES_PER_THREAD: i32 = 10;

    let registry = SettingRegistry::new(
        (0..THREADS).map(|i| RegistryEntry::new(format!("Test/Counter{}", i), format!("counter-{}", i), Conversion::Integer)),
    );
    let display = Arc::new(FakeDisplay::default());
    let store = Arc::new(MemorySettingsStore::new());
    let service =
        DefaultXSettingsService::new(display.clone(), store.clone(), Arc::new(registry), ScaleConfig::default());

    std::thread::scope(|scope| {
        for i in 0..THREADS {
            let service = &service;
            scope.spawn(move || {
                for value in 1..=WRITES_PER_THREAD {
                    service.set_integer(&format!("Test/Counter{}", i), value).unwrap();
                }
            });
        }
    });

    let blob = display.blob();
    assert_eq!(blob.serial, (THREADS as u32) * (WRITES_PER_THREAD as u32));
    assert_eq!(blob.len(), THREADS);
    for i in 0..THREADS {
        assert_eq!(blob.get(&format!("Test/Counter{}", i)).unwrap().value, SettingValue::Integer(WRITES_PER_THREAD));
        assert_eq!(store.get_value(&format!("counter-{}", i)).unwrap(), Some(StoreValue::Int(10)));
    }
}

#[test]
fn test_concurrent_writers_same_key() {
    const WRITES_PER_THREAD: usize = 20;

    let registry = SettingRegistry::new([RegistryEntry::new("X", "x", Conversion::Integer)]);
    let display = Arc::new(FakeDisplay::default());
    let store = Arc::new(MemorySettingsStore::new());
    let service =
        DefaultXSettingsService::new(display.clone(), store.clone(), Arc::new(registry), ScaleConfig::default());

    std::thread::scope(|scope| {
        for value in [1, 2] {
            let service = &service;
            scope.spawn(move || {
                for _ in 0..WRITES_PER_THREAD {
                    service.set_integer("X", value).unwrap();
                }
            });
        }
    });

    let blob = display.blob();
    assert_eq!(blob.serial as usize, 2 * WRITES_PER_THREAD);
    assert_eq!(blob.len(), 1);
    let last = service.get_integer("X").unwrap();
    assert!(last == 1 || last == 2, "unexpected final value {}", last);
    assert_eq!(store.get_value("x").unwrap(), Some(StoreValue::Int(i64::from(last))));
}

#[test]
fn test_concurrent_readers_see_type_mismatch() {
    let f = fixture();
    f.service.set_integer("Net/DoubleClickTime", 400).unwrap();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let service = &f.service;
            scope.spawn(move || {
                for _ in 0..25 {
                    assert!(matches!(service.get_string("Net/DoubleClickTime"), Err(XSettingsError::TypeMismatch { .. })));
                    assert_eq!(service.get_integer("Net/DoubleClickTime").unwrap(), 400);
                }
            });
        }
    });
}
