//! The XSETTINGS manager.
//!
//! [`DefaultXSettingsService`] serializes all property writes behind one
//! reader/writer lock: getters share it, every setter holds it exclusively
//! for the whole read, decode, modify, encode, write and mirror cycle.

mod service;

#[cfg(test)]
mod service_tests;

pub use service::{DefaultXSettingsService, XSettingsService};
