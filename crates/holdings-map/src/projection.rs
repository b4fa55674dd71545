//! Spatial projection
//!
//! Stateless conversions between markers and map pins. The shared pin style
//! comes in through [`PinAppearance`] rather than library-wide defaults.

use holdings_model::{Color, Marker, MarkerId, PinAppearance, Position};
use serde::Serialize;

/// Icon drawn for a pin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PinIcon {
    /// CSS class on the icon container
    pub class_name: String,
    /// Markup of the colored swatch
    pub html: String,
    /// Icon anchor offset in pixels
    pub icon_anchor: (i32, i32),
    /// Popup anchor offset in pixels
    pub popup_anchor: (i32, i32),
}

/// Renderable map pin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pin {
    /// Where the pin sits
    pub position: Position,
    /// Swatch color
    pub color: Color,
    /// Icon markup and anchors
    pub icon: PinIcon,
    /// Whether the user may drag the pin
    pub draggable: bool,
    /// Pan while dragging near the edge
    pub auto_pan: bool,
    /// Id of the marker this pin shows; used to resolve drag-end gestures
    pub token: Option<MarkerId>,
}

/// Marker to pin conversions
#[derive(Debug, Clone, Default)]
pub struct SpatialProjection {
    appearance: PinAppearance,
    default_color: Color,
}

impl SpatialProjection {
    /// Create a projection with an explicit pin style
    #[inline]
    #[must_use]
    pub fn new(appearance: PinAppearance, default_color: Color) -> Self {
        Self {
            appearance,
            default_color,
        }
    }

    /// Pin for `marker`
    #[must_use]
    pub fn project(&self, marker: &Marker, draggable: bool) -> Pin {
        let color = marker
            .fields()
            .marker_color
            .clone()
            .unwrap_or_else(|| self.default_color.clone());
        Pin {
            position: marker.position(),
            icon: self.icon(&color),
            color,
            draggable,
            auto_pan: self.appearance.auto_pan,
            token: marker.id().cloned(),
        }
    }

    /// Teardrop swatch icon in `color`
    #[must_use]
    pub fn icon(&self, color: &Color) -> PinIcon {
        let size = self.appearance.size_rem;
        let half = size / 2.0;
        let style = format!(
            "background-color: {color}; width: {size}rem; height: {size}rem; display: block; \
             left: -{half}rem; top: -{half}rem; position: relative; \
             border-radius: {round}rem {round}rem 0; transform: rotate(45deg); \
             border: 1px solid {border}",
            round = size * 1.5,
            border = self.appearance.border_color,
        );
        PinIcon {
            class_name: self.appearance.class_name.clone(),
            html: format!("<span style=\"{style}\" />"),
            icon_anchor: self.appearance.icon_anchor,
            popup_anchor: self.appearance.popup_anchor,
        }
    }

    /// Draft marker for a background click at `position`
    #[inline]
    #[must_use]
    pub fn draft_at(&self, position: Position) -> Marker {
        Marker::draft(position)
    }

    /// Marker id and new position for a drag ending at `position`
    ///
    /// `None` when the pin carries no id.
    #[must_use]
    pub fn decode_drag_end(&self, pin: &Pin, position: Position) -> Option<(MarkerId, Position)> {
        pin.token.clone().map(|id| (id, position))
    }
}
