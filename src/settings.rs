//! Editor settings.
//!
//! Settings live in a JSON file. Every field has a default, so partial files
//! are fine; unknown keys are ignored.

use crate::constants::*;
use crate::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Location of the settings file, e.g. `~/.config/flowboard/settings.json`.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("flowboard").join("settings.json"))
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub zoom: ZoomSettings,
    pub connections: ConnectionSettings,
    pub routing: RoutingSettings,
    pub layout: LayoutSettings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomSettings {
    pub min: f64,
    pub max: f64,
    pub wheel_pixel_divisor: f64,
    pub wheel_line_divisor: f64,
    pub wheel_line_pixels: f64,
    pub guard_ms: u64,
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            min: MIN_ZOOM,
            max: MAX_ZOOM,
            wheel_pixel_divisor: WHEEL_ZOOM_PIXEL_DIVISOR,
            wheel_line_divisor: WHEEL_ZOOM_LINE_DIVISOR,
            wheel_line_pixels: WHEEL_LINE_PIXELS,
            guard_ms: ZOOM_GUARD_MS,
        }
    }
}

impl ZoomSettings {
    pub fn guard(&self) -> Duration {
        Duration::from_millis(self.guard_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Magnetic snapping radius in screen pixels
    pub snap_radius: f64,
    pub long_press_ms: u64,
    pub long_press_enabled: bool,
    /// Pointer-down on an output starts drawing immediately
    pub drag_from_outputs: bool,
    pub drag_slop: f64,
    pub click_suppress_ms: u64,
    pub hit_radius: f64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            snap_radius: SNAP_RADIUS_PX,
            long_press_ms: LONG_PRESS_MS,
            long_press_enabled: true,
            drag_from_outputs: true,
            drag_slop: DRAG_SLOP_PX,
            click_suppress_ms: CLICK_SUPPRESS_MS,
            hit_radius: CONNECTOR_HIT_RADIUS_PX,
        }
    }
}

impl ConnectionSettings {
    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn click_suppress(&self) -> Duration {
        Duration::from_millis(self.click_suppress_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    pub curvature: f64,
    pub max_offset: f64,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            curvature: BEZIER_CURVATURE,
            max_offset: BEZIER_MAX_OFFSET,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub default_node_width: f64,
    pub default_node_height: f64,
    pub default_connector_size: f64,
    pub bottom_clearance: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            default_node_width: DEFAULT_NODE_SIZE.0,
            default_node_height: DEFAULT_NODE_SIZE.1,
            default_connector_size: DEFAULT_CONNECTOR_SIZE.0,
            bottom_clearance: BOTTOM_CONNECTOR_CLEARANCE,
        }
    }
}

fn positive(name: &str, value: f64) -> SettingsResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::Invalid(format!("{name} must be positive, got {value}")))
    }
}

impl EditorSettings {
    pub fn from_json_str(json: &str) -> SettingsResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> SettingsResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Load from `path`, falling back to defaults on any error.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => {
                info!(path = %path.display(), "settings loaded");
                settings
            }
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load settings, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> SettingsResult<()> {
        positive("zoom.min", self.zoom.min)?;
        positive("zoom.max", self.zoom.max)?;
        if self.zoom.min > self.zoom.max {
            return Err(SettingsError::Invalid(format!(
                "zoom.min ({}) exceeds zoom.max ({})",
                self.zoom.min, self.zoom.max
            )));
        }
        positive("zoom.wheel_pixel_divisor", self.zoom.wheel_pixel_divisor)?;
        positive("zoom.wheel_line_divisor", self.zoom.wheel_line_divisor)?;
        positive("connections.snap_radius", self.connections.snap_radius)?;
        positive("connections.hit_radius", self.connections.hit_radius)?;
        if !(self.connections.drag_slop.is_finite() && self.connections.drag_slop >= 0.0) {
            return Err(SettingsError::Invalid("connections.drag_slop must be non-negative".into()));
        }
        positive("routing.max_offset", self.routing.max_offset)?;
        positive("routing.curvature", self.routing.curvature)?;
        positive("layout.default_node_width", self.layout.default_node_width)?;
        positive("layout.default_node_height", self.layout.default_node_height)?;
        positive("layout.default_connector_size", self.layout.default_connector_size)?;
        Ok(())
    }
}
