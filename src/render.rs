use crate::map::{Control, DistrictStyler, ErrorOverlay, MapSurface, TileLayer};
use crate::style::{escape_html, Interaction};
use crate::types::District;
use anyhow::{Context, Result};
use geo::bounding_rect::BoundingRect;
use geo::{coord, Rect};
use geojson::FeatureCollection;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tracing::info;

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";

const PAGE_CSS: &str = "\
html, body { margin: 0; height: 100%; font-family: sans-serif; }
#map { position: absolute; top: 40px; bottom: 0; width: 100%; }
header { height: 40px; line-height: 40px; padding: 0 12px; background: #2c3e50; color: white; }
.legend, .error-overlay { background: white; border-radius: 8px; box-shadow: 0 2px 15px rgba(0,0,0,0.1); }
.legend { padding: 15px; min-width: 200px; }
.legend-row { margin: 5px 0; }
.legend .swatch { display: inline-block; width: 20px; height: 20px; margin-right: 8px; border: 1px solid #333; vertical-align: middle; }
.error-overlay { position: absolute; top: 50%; left: 50%; transform: translate(-50%, -50%); padding: 20px; text-align: center; z-index: 1000; }
";

// Reads the embedded page state and drives Leaflet with it.
const PAGE_JS: &str = "\
const state = JSON.parse(document.getElementById('map-state').textContent);
const map = L.map('map').setView(state.center, state.zoom);
for (const t of state.tiles) {
    L.tileLayer(t.url, { attribution: t.attribution, maxZoom: t.maxZoom }).addTo(map);
}
if (state.districts) {
    L.geoJSON(state.districts, {
        style: f => f.properties.style,
        onEachFeature: (f, layer) => {
            layer.bindPopup(f.properties.popup);
            layer.on('mouseover', () => layer.setStyle(f.properties.hoverStyle));
            layer.on('mouseout', () => layer.setStyle(f.properties.leaveStyle));
        }
    }).addTo(map);
}
if (state.bounds) {
    map.fitBounds(state.bounds);
}
for (const c of state.controls) {
    const control = L.control({ position: c.position });
    control.onAdd = () => {
        const div = L.DomUtil.create('div', c.class);
        div.innerHTML = c.html;
        return div;
    };
    control.addTo(map);
}
";

/// A Leaflet page assembled from surface calls and written out as static files.
#[derive(Debug, Clone)]
pub struct LeafletPage {
    title: String,
    center: [f64; 2],
    zoom: u8,
    tiles: Vec<TileLayer>,
    districts: Option<FeatureCollection>,
    fitted: Option<Rect<f64>>,
    controls: Vec<Control>,
    status: String,
    overlay: Option<ErrorOverlay>,
}

impl LeafletPage {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            center: [0.0, 0.0],
            zoom: 1,
            tiles: Vec::new(),
            districts: None,
            fitted: None,
            controls: Vec::new(),
            status: "Loading...".to_string(),
            overlay: None,
        }
    }

    /// Districts with their style, hover styles and popup baked into properties.
    pub fn districts(&self) -> Option<&FeatureCollection> {
        self.districts.as_ref()
    }

    fn state(&self) -> Value {
        json!({
            "center": self.center,
            "zoom": self.zoom,
            "tiles": self.tiles.iter().map(|t| json!({
                "url": t.url_template,
                "attribution": t.attribution,
                "maxZoom": t.max_zoom,
            })).collect::<Vec<_>>(),
            "districts": self.districts,
            "bounds": self.fitted.map(leaflet_bounds),
            "controls": self.controls.iter().map(|c| json!({
                "position": c.position.as_str(),
                "class": c.class,
                "html": c.html,
            })).collect::<Vec<_>>(),
        })
    }

    pub fn render_html(&self) -> String {
        // JSON inside <script> must not close the tag early.
        let state = self.state().to_string().replace("</", "<\\/");

        let mut html = String::with_capacity(state.len() + 4096);
        html.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">");
        html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
        html.push_str(&format!("<title>{}</title>", escape_html(&self.title)));
        html.push_str(&format!("<link rel=\"stylesheet\" href=\"{}\">", LEAFLET_CSS));
        html.push_str(&format!("<style>{}</style></head><body>", PAGE_CSS));
        html.push_str(&format!(
            "<header>{} &middot; Districts: <span id=\"district-count\">{}</span></header>",
            escape_html(&self.title),
            escape_html(&self.status)
        ));
        html.push_str("<div id=\"map\"></div>");

        if let Some(overlay) = &self.overlay {
            html.push_str(&format!(
                "<div class=\"error-overlay\"><h3>{}</h3><p>{}</p><p><strong>Error:</strong> {}</p><p>{}</p></div>",
                escape_html(&overlay.title),
                escape_html(&overlay.detail),
                escape_html(&overlay.error),
                escape_html(&overlay.hint)
            ));
        }

        html.push_str(&format!(
            "<script id=\"map-state\" type=\"application/json\">{}</script>",
            state
        ));
        html.push_str(&format!("<script src=\"{}\"></script>", LEAFLET_JS));
        html.push_str(&format!("<script>{}</script>", PAGE_JS));
        html.push_str("</body></html>");
        html
    }

    /// Writes `index.html`, plus `districts.geojson` when districts were drawn.
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create output directory: {:?}", dir))?;

        let index = dir.join("index.html");
        fs::write(&index, self.render_html()).with_context(|| format!("Failed to write {:?}", index))?;
        info!("Wrote {:?}", index);

        if let Some(districts) = self.districts() {
            let path = dir.join("districts.geojson");
            let body = serde_json::to_string(districts).context("Failed to serialize districts")?;
            fs::write(&path, body).with_context(|| format!("Failed to write {:?}", path))?;
            info!("Wrote {:?}", path);
        }
        Ok(())
    }
}

impl MapSurface for LeafletPage {
    fn set_view(&mut self, center: [f64; 2], zoom: u8) {
        self.center = center;
        self.zoom = zoom;
    }

    fn add_tile_layer(&mut self, layer: TileLayer) {
        self.tiles.push(layer);
    }

    fn draw_districts(&mut self, districts: &FeatureCollection, styler: &dyn DistrictStyler) -> Option<Rect<f64>> {
        let mut drawn = districts.clone();
        let mut bounds: Option<Rect<f64>> = None;

        for feature in drawn.features.iter_mut() {
            let district = District::new(feature);
            let style = styler.style(&district);
            let hover = styler.on_interaction(&district, Interaction::PointerEnter);
            let leave = styler.on_interaction(&district, Interaction::PointerLeave);
            let popup = styler.popup(&district);
            let rect = district.polygons().and_then(|mp| mp.bounding_rect());

            if let Some(rect) = rect {
                bounds = Some(match bounds {
                    Some(b) => union(b, rect),
                    None => rect,
                });
            }

            let props = feature.properties.get_or_insert_with(Default::default);
            props.insert("style".to_string(), json!(style));
            props.insert("hoverStyle".to_string(), json!(hover));
            props.insert("leaveStyle".to_string(), json!(leave));
            props.insert("popup".to_string(), Value::String(popup));
        }

        self.districts = Some(drawn);
        bounds
    }

    fn fit_bounds(&mut self, bounds: Rect<f64>) {
        self.fitted = Some(bounds);
    }

    fn add_control(&mut self, control: Control) {
        self.controls.push(control);
    }

    fn set_status(&mut self, text: &str) {
        self.status = text.to_string();
    }

    fn show_error_overlay(&mut self, overlay: ErrorOverlay) {
        self.overlay = Some(overlay);
    }
}

fn union(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
        coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
    )
}

// Leaflet wants [[south, west], [north, east]] in lat/lon order.
fn leaflet_bounds(rect: Rect<f64>) -> [[f64; 2]; 2] {
    [[rect.min().y, rect.min().x], [rect.max().y, rect.max().x]]
}
