//! # XSETTINGS System Library (`xsettings-system`)
//!
//! Platform side of the NovaDE XSETTINGS manager: the x11rb implementation of
//! [`xsettings_domain::DisplayServer`] and the command line of the
//! `novade-xsettingsd` daemon.

pub mod cli;
pub mod x11;

pub use cli::Cli;
pub use x11::X11DisplayServer;
