//! Capability boundary between the district pipeline and whatever draws the map.

use crate::style::{Interaction, PathStyle};
use crate::types::District;
use geo::Rect;
use geojson::FeatureCollection;

#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
    pub max_zoom: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPosition {
    BottomLeft,
}

impl ControlPosition {
    /// Leaflet's position string.
    pub fn as_str(self) -> &'static str {
        match self {
            ControlPosition::BottomLeft => "bottomleft",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub position: ControlPosition,
    pub class: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorOverlay {
    pub title: String,
    pub detail: String,
    pub error: String,
    pub hint: String,
}

/// Per-feature callbacks the surface invokes while drawing districts.
pub trait DistrictStyler {
    fn style(&self, district: &District<'_>) -> PathStyle;
    fn on_interaction(&self, district: &District<'_>, event: Interaction) -> PathStyle;
    fn popup(&self, district: &District<'_>) -> String;
}

pub trait MapSurface {
    fn set_view(&mut self, center: [f64; 2], zoom: u8);
    fn add_tile_layer(&mut self, layer: TileLayer);
    /// Draw every feature and return the bounds of what was drawn.
    fn draw_districts(&mut self, districts: &FeatureCollection, styler: &dyn DistrictStyler) -> Option<Rect<f64>>;
    fn fit_bounds(&mut self, bounds: Rect<f64>);
    fn add_control(&mut self, control: Control);
    fn set_status(&mut self, text: &str);
    fn show_error_overlay(&mut self, overlay: ErrorOverlay);
}
