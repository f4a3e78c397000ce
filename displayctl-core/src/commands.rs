//! One-shot invocations of the external display tools.
//!
//! Everything here is fire-and-forget: a missing tool degrades to "no
//! observable effect" and a warning, never an error for the caller.
use once_cell::sync::Lazy;
use regex::Regex;
use std::env;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::config::MonitorTransform;
use crate::{BACKLIGHT_TOOL, COLOR_TEMP_TOOL, COMPOSITOR_TOOL};

static LEADING_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").unwrap());

/// Check whether a tool can be found on PATH.
pub fn tool_in_path(tool: &str) -> bool {
    let Some(paths) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&paths).any(|dir| is_executable(&dir.join(tool)))
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Names of required tools that are missing from PATH.
pub fn missing_tools() -> Vec<&'static str> {
    [BACKLIGHT_TOOL, COMPOSITOR_TOOL, COLOR_TEMP_TOOL]
        .into_iter()
        .filter(|tool| !tool_in_path(tool))
        .collect()
}

/// Set the backlight to a percentage.
pub fn set_brightness(percent: u32) {
    let percent = percent.clamp(1, 100);
    run_detached(BACKLIGHT_TOOL, &["s", &format!("{percent}%"), "-q"]);
}

/// Current backlight percentage as reported by the tool, for syncing the
/// slider at startup. `None` when the tool is missing or prints nonsense.
pub fn read_brightness_percent() -> Option<u32> {
    let output = Command::new(BACKLIGHT_TOOL)
        .args(["g", "-p"])
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_percent(&String::from_utf8_lossy(&output.stdout))
}

fn parse_percent(raw: &str) -> Option<u32> {
    LEADING_INT
        .captures(raw.trim())?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Apply a monitor transform through the compositor.
pub fn set_monitor_transform(transform: MonitorTransform) {
    run_detached(
        COMPOSITOR_TOOL,
        &[
            "keyword",
            "monitor",
            &format!(",transform,{}", transform.code()),
        ],
    );
}

/// Start a color temperature process that outlives this program. Used by the
/// headless applier, where the session itself owns the process.
pub fn start_color_temp_detached(kelvin: u32) {
    run_detached(COLOR_TEMP_TOOL, &["-t", &kelvin.to_string()]);
}

/// Kill any color temperature process by name. Last-resort cleanup for
/// processes we hold no handle to, e.g. ones left over from a crash.
pub fn kill_color_temp_by_name() {
    let _ = Command::new("pkill")
        .args(["-x", COLOR_TEMP_TOOL])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

fn run_detached(program: &str, args: &[&str]) {
    match Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(mut child) => {
            // Reap off-thread so repeated slider ticks don't pile up zombies.
            std::thread::spawn(move || {
                let _ = child.wait();
            });
        }
        Err(err) => log::warn!("failed to run {program}: {err}"),
    }
}
