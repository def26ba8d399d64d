//! Display enumeration via `xrandr --query`.

use std::collections::BTreeMap;

use crate::detect::{DetectedDevice, DeviceKind};
use crate::error::DetectionError;
use crate::exec::Executor;

/// Enumerate displays.
///
/// # Errors
///
/// Returns [`DetectionError`] if `xrandr` is missing from PATH, cannot be
/// spawned, or exits non-zero. The caller degrades this to an empty display
/// list.
pub fn detect_displays(executor: &dyn Executor) -> Result<Vec<DetectedDevice>, DetectionError> {
    if !executor.which("xrandr") {
        return Err(DetectionError::ToolMissing("xrandr".to_string()));
    }

    let result = executor
        .run_unchecked("xrandr", &["--query"])
        .map_err(|e| DetectionError::CommandFailed {
            tool: "xrandr".to_string(),
            detail: e.to_string(),
        })?;
    if !result.success {
        return Err(DetectionError::CommandFailed {
            tool: "xrandr".to_string(),
            detail: result.stderr.trim().to_string(),
        });
    }

    Ok(parse_query(&result.stdout))
}

/// Parse `xrandr --query` output.
///
/// Output lines look like:
///
/// ```text
/// Screen 0: minimum 320 x 200, current 3840 x 1080, maximum 16384 x 16384
/// DP-1 connected primary 1920x1080+0+0 (normal left inverted) 531mm x 299mm
///    1920x1080     60.00*+  59.94
/// HDMI-A-1 disconnected (normal left inverted right x axis y axis)
/// ```
///
/// Header lines carry the output name, connection status and primary
/// marker; the indented mode line with `*` carries the active resolution.
pub fn parse_query(stdout: &str) -> Vec<DetectedDevice> {
    let mut displays: Vec<DetectedDevice> = Vec::new();

    for line in stdout.lines() {
        if line.starts_with(char::is_whitespace) {
            // Mode line: attach the active resolution to the last display.
            if line.contains('*')
                && let Some(current) = displays.last_mut()
                && current.connected
                && !current.attributes.contains_key("resolution")
                && let Some(mode) = line.split_whitespace().next()
            {
                current
                    .attributes
                    .insert("resolution".to_string(), mode.to_string());
            }
            continue;
        }

        let mut words = line.split_whitespace();
        let (Some(name), Some(status)) = (words.next(), words.next()) else {
            continue;
        };
        let connected = match status {
            "connected" => true,
            "disconnected" => false,
            _ => continue,
        };

        displays.push(DetectedDevice {
            id: name.to_string(),
            kind: DeviceKind::Display,
            raw_name: name.to_string(),
            connected,
            primary: connected && line.split_whitespace().any(|w| w == "primary"),
            default: false,
            attributes: BTreeMap::new(),
        });
    }

    displays
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::exec::ExecResult;
    use crate::exec::test_support::ScriptedExecutor;

    const SAMPLE: &str = "\
Screen 0: minimum 320 x 200, current 3840 x 1080, maximum 16384 x 16384
DP-1 connected primary 1920x1080+0+0 (normal left inverted right x axis y axis) 531mm x 299mm
   1920x1080     60.00*+  59.94
   1680x1050     59.95
HDMI-A-1 connected 1920x1080+1920+0 (normal left inverted right x axis y axis) 1600mm x 900mm
   1920x1080     60.00*   50.00
   1280x720      60.00
DP-2 disconnected (normal left inverted right x axis y axis)
";

    #[test]
    fn parses_connected_and_disconnected() {
        let displays = parse_query(SAMPLE);
        assert_eq!(displays.len(), 3);
        assert!(displays[0].connected);
        assert!(displays[1].connected);
        assert!(!displays[2].connected);
    }

    #[test]
    fn parses_names_in_detection_order() {
        let displays = parse_query(SAMPLE);
        let names: Vec<&str> = displays.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(names, vec!["DP-1", "HDMI-A-1", "DP-2"]);
    }

    #[test]
    fn parses_primary_marker() {
        let displays = parse_query(SAMPLE);
        assert!(displays[0].primary);
        assert!(!displays[1].primary);
    }

    #[test]
    fn parses_active_resolution() {
        let displays = parse_query(SAMPLE);
        assert_eq!(
            displays[0].attributes.get("resolution"),
            Some(&"1920x1080".to_string())
        );
        assert_eq!(
            displays[1].attributes.get("resolution"),
            Some(&"1920x1080".to_string())
        );
    }

    #[test]
    fn disconnected_display_has_no_resolution() {
        let displays = parse_query(SAMPLE);
        assert!(displays[2].attributes.is_empty());
    }

    #[test]
    fn screen_header_is_skipped() {
        let displays = parse_query("Screen 0: minimum 320 x 200\n");
        assert!(displays.is_empty());
    }

    #[test]
    fn empty_output_yields_no_displays() {
        assert!(parse_query("").is_empty());
    }

    #[test]
    fn detect_fails_when_xrandr_missing() {
        let exec = ScriptedExecutor::new();
        match detect_displays(&exec) {
            Err(DetectionError::ToolMissing(tool)) => assert_eq!(tool, "xrandr"),
            other => panic!("expected ToolMissing, got {other:?}"),
        }
    }

    #[test]
    fn detect_fails_on_nonzero_exit() {
        let exec = ScriptedExecutor::new()
            .with_tool("xrandr")
            .respond("xrandr --query", ExecResult::failed("Can't open display"));
        match detect_displays(&exec) {
            Err(DetectionError::CommandFailed { tool, detail }) => {
                assert_eq!(tool, "xrandr");
                assert!(detail.contains("Can't open display"));
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[test]
    fn detect_parses_scripted_output() {
        let exec = ScriptedExecutor::new()
            .with_tool("xrandr")
            .respond("xrandr --query", ExecResult::ok(SAMPLE));
        let displays = detect_displays(&exec).unwrap();
        assert_eq!(displays.len(), 3);
        assert_eq!(displays[0].id, "DP-1");
    }
}
