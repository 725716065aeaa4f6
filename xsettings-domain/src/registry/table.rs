use super::entry::Conversion::{self, Boolean, HexColor, Integer, String};

/// XSETTINGS name, store key, conversion.
pub(super) const DEFAULT_ENTRIES: &[(&str, &str, Conversion)] = &[
    ("Net/ThemeName", "theme-name", String),
    ("Net/IconThemeName", "icon-theme-name", String),
    ("Net/FallbackIconTheme", "fallback-icon-theme", String),
    ("Net/SoundThemeName", "sound-theme-name", String),
    ("Net/EnableEventSounds", "event-sounds", Boolean),
    ("Net/EnableInputFeedbackSounds", "input-feedback-sounds", Boolean),
    ("Net/DoubleClickTime", "double-click-time", Integer),
    ("Net/DoubleClickDistance", "double-click-distance", Integer),
    ("Net/DndDragThreshold", "dnd-drag-threshold", Integer),
    ("Net/CursorBlink", "cursor-blink", Boolean),
    ("Net/CursorBlinkTime", "cursor-blink-time", Integer),
    ("Gtk/CursorThemeName", "gtk-cursor-theme-name", String),
    ("Gtk/CursorThemeSize", "gtk-cursor-theme-size", Integer),
    ("Gtk/FontName", "gtk-font-name", String),
    ("Gtk/KeyThemeName", "gtk-key-theme-name", String),
    ("Gtk/EnableAnimations", "gtk-enable-animations", Boolean),
    ("Gtk/DecorationLayout", "gtk-decoration-layout", String),
    ("Xft/Antialias", "xft-antialias", Boolean),
    ("Xft/Hinting", "xft-hinting", Boolean),
    ("Xft/HintStyle", "xft-hintstyle", String),
    ("Xft/RGBA", "xft-rgba", String),
    ("Xft/DPI", "xft-dpi", Integer),
    ("Gdk/WindowScalingFactor", "window-scale", Integer),
    ("Qt/ActiveColor", "qt-active-color", HexColor),
    ("Qt/FontName", "qt-font-name", String),
    ("Qt/MonoFontName", "qt-mono-font-name", String),
    ("Qt/ScreenScaleFactors", "individual-scaling", String),
];
