//! Startup script generation.
//!
//! The script is a pure function of the persisted configuration and is
//! rewritten on every save, so it can never drift from the state file.
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::config::{DisplayConfig, StoreError};
use crate::{BACKLIGHT_TOOL, COLOR_TEMP_TOOL, COMPOSITOR_TOOL};

/// Render the boot script for a configuration. Deterministic: the same
/// record always renders byte-identical text.
///
/// Any running color temperature process is killed before a conditional
/// restart so two instances never compete at boot, which also makes the
/// script safe to run repeatedly.
pub fn render(config: &DisplayConfig) -> String {
    let mut script = format!(
        "#!/bin/bash\n\
         # Apply display settings on startup\n\
         {BACKLIGHT_TOOL} s {}% -q\n\
         pkill -x {COLOR_TEMP_TOOL} &> /dev/null || true\n\
         sleep 0.2\n",
        config.brightness_percent
    );

    if config.night_light_on {
        script.push_str(&format!(
            "{COLOR_TEMP_TOOL} -t {} &\n",
            config.manual_temp
        ));
    }

    script.push_str(&format!(
        "{COMPOSITOR_TOOL} keyword monitor ,transform,{}\n",
        config.monitor_transform.code()
    ));

    script
}

/// Write the rendered script with executable permission.
pub fn write(path: &Path, config: &DisplayConfig) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| StoreError::from_io(parent, err))?;
    }

    fs::write(path, render(config)).map_err(|err| StoreError::from_io(path, err))?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|err| StoreError::from_io(path, err))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{render, write};
    use crate::config::{DisplayConfig, MonitorTransform};
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn sample() -> DisplayConfig {
        DisplayConfig {
            night_light_on: true,
            manual_temp: 4000,
            brightness_percent: 85,
            monitor_transform: MonitorTransform::Left,
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let config = sample();
        assert_eq!(render(&config), render(&config));
    }

    #[test]
    fn kill_precedes_restart() {
        let script = render(&sample());
        let kill = script.find("pkill -x hyprsunset").expect("kill line");
        let start = script.find("hyprsunset -t 4000 &").expect("start line");
        assert!(kill < start);
    }

    #[test]
    fn disabled_night_light_renders_no_start_line() {
        let config = DisplayConfig {
            night_light_on: false,
            ..sample()
        };
        let script = render(&config);
        assert!(script.contains("pkill -x hyprsunset"));
        assert!(!script.contains("hyprsunset -t"));
    }

    #[test]
    fn written_script_is_executable() {
        let dir = std::env::temp_dir().join(format!("displayctl-script-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("apply-settings.sh");

        write(&path, &sample()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o755, 0o755);
        assert_eq!(fs::read_to_string(&path).unwrap(), render(&sample()));
        let _ = fs::remove_dir_all(dir);
    }
}
