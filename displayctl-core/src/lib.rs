//! Core domain layer for the display control center: persisted display
//! configuration, startup script generation, and supervision of the external
//! color temperature process.
pub mod commands;
pub mod config;
pub mod lock;
pub mod process;
pub mod script;
pub mod supervisor;

pub use config::{ConfigStore, DisplayConfig, MonitorTransform, StoreError};
pub use lock::{LockError, LockFile};
pub use process::{ProcessRunner, SystemRunner};
pub use supervisor::{NightLightState, NightLightSupervisor, TargetOutcome};

/// Warmest color temperature the night light slider can select.
pub const MIN_TEMP: u32 = 2500;
/// Coolest color temperature; also what displays show with night light off.
pub const MAX_TEMP: u32 = 6500;

/// Duration passed to the fade invocation (`hyprsunset -f`).
pub const FADE_DURATION_SECS: &str = "0.5";

pub const COLOR_TEMP_TOOL: &str = "hyprsunset";
pub const BACKLIGHT_TOOL: &str = "brightnessctl";
pub const COMPOSITOR_TOOL: &str = "hyprctl";

pub fn clamp_temp(kelvin: u32) -> u32 {
    kelvin.clamp(MIN_TEMP, MAX_TEMP)
}

/// Map a warmth slider percentage (0 = coolest, 100 = warmest) to Kelvin.
pub fn percent_to_temp(percent: f64) -> u32 {
    let span = (MAX_TEMP - MIN_TEMP) as f64;
    let raw = MAX_TEMP as f64 - percent.clamp(0.0, 100.0) * span / 100.0;
    raw.round() as u32
}

/// Inverse of [`percent_to_temp`].
pub fn temp_to_percent(kelvin: u32) -> f64 {
    let span = (MAX_TEMP - MIN_TEMP) as f64;
    100.0 - ((clamp_temp(kelvin) - MIN_TEMP) as f64) * 100.0 / span
}
