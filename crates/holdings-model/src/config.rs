//! Configuration
//!
//! Defaults reproduce the stock deployment: a 1000x1000 image plane, the
//! `holders`/`holdings` trees, and the teardrop pin style.

use crate::error::ModelError;
use crate::holder::Color;
use crate::marker::Position;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldingsConfig {
    /// Remote collections and color derivation
    pub sync: SyncConfig,
    /// Map surface and pin style
    pub map: MapConfig,
}

impl HoldingsConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML; missing keys keep their defaults
    ///
    /// # Errors
    /// Returns [`ModelError::ConfigParse`] on invalid TOML or mistyped keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ModelError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// Returns [`ModelError::ConfigIo`] if the file cannot be read, or
    /// [`ModelError::ConfigParse`] if its content is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// With sync section
    #[inline]
    #[must_use]
    pub fn with_sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    /// With map section
    #[inline]
    #[must_use]
    pub fn with_map(mut self, map: MapConfig) -> Self {
        self.map = map;
        self
    }
}

/// Remote collection paths and color fallback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Tree holding holder records
    pub holders_path: String,
    /// Tree holding marker records
    pub holdings_path: String,
    /// Color for markers whose holder is unset or unknown
    pub default_color: Color,
}

impl SyncConfig {
    /// With default color
    #[inline]
    #[must_use]
    pub fn with_default_color(mut self, color: impl Into<String>) -> Self {
        self.default_color = Color::new(color);
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            holders_path: "holders".to_string(),
            holdings_path: "holdings".to_string(),
            default_color: Color::default(),
        }
    }
}

/// Rectangular extent of the image plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower-left corner
    pub min: Position,
    /// Upper-right corner
    pub max: Position,
}

impl Bounds {
    /// Check if `position` lies inside (edges included)
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        (self.min.latitude..=self.max.latitude).contains(&position.latitude)
            && (self.min.longitude..=self.max.longitude).contains(&position.longitude)
    }

    /// Center of the extent
    #[must_use]
    pub fn center(&self) -> Position {
        Position::new(
            (self.min.latitude + self.max.latitude) / 2.0,
            (self.min.longitude + self.max.longitude) / 2.0,
        )
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: Position::new(0.0, 0.0),
            max: Position::new(1000.0, 1000.0),
        }
    }
}

/// Map surface configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Image drawn under the pins
    pub image_url: String,
    /// Extent the image is stretched over
    pub bounds: Bounds,
    /// Furthest zoom out
    pub min_zoom: i32,
    /// Furthest zoom in
    pub max_zoom: i32,
    /// Viewport center after the surface settles
    pub initial_center: Position,
    /// Viewport zoom after the surface settles
    pub initial_zoom: i32,
    /// Wait between surface-ready and initial framing, in milliseconds
    pub settle_delay_ms: u64,
    /// Pin style shared by every marker
    pub pin: PinAppearance,
}

impl MapConfig {
    /// Settle delay as a duration
    #[inline]
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// With settle delay
    #[inline]
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        let bounds = Bounds::default();
        Self {
            image_url: "assets/map-image.jpg".to_string(),
            bounds,
            min_zoom: -2,
            max_zoom: 1,
            initial_center: bounds.center(),
            initial_zoom: 0,
            settle_delay_ms: 50,
            pin: PinAppearance::default(),
        }
    }
}

/// Default pin appearance, passed explicitly to the projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinAppearance {
    /// CSS class on the icon container
    pub class_name: String,
    /// Swatch edge length in rem
    pub size_rem: f32,
    /// Swatch outline color
    pub border_color: String,
    /// Icon anchor offset in pixels
    pub icon_anchor: (i32, i32),
    /// Popup anchor offset in pixels
    pub popup_anchor: (i32, i32),
    /// Pan the view while a pin is dragged near the edge
    pub auto_pan: bool,
}

impl Default for PinAppearance {
    fn default() -> Self {
        Self {
            class_name: "holding-pin".to_string(),
            size_rem: 2.0,
            border_color: "#FFFFFF".to_string(),
            icon_anchor: (0, 24),
            popup_anchor: (0, -36),
            auto_pan: true,
        }
    }
}
