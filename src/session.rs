use crate::config::{InputConfig, MapConfig};
use crate::data::{self, DistrictsError, Source};
use crate::legend;
use crate::map::{Control, ControlPosition, DistrictStyler, ErrorOverlay, MapSurface, TileLayer};
use crate::style::{self, Interaction, PathStyle};
use crate::types::{District, ResultStore};
use geojson::FeatureCollection;
use reqwest::Client;
use tracing::{error, info, warn};

pub const NO_RESULTS_STATUS: &str = "No election data available";
pub const DISTRICTS_FAILED_STATUS: &str = "Error: Could not load district data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NotLoaded,
    ResultsSettled,
    LegendRendered,
    DistrictsFailed,
}

/// Joins district features against the result store.
pub struct ResultJoin<'a> {
    pub results: &'a ResultStore,
}

impl DistrictStyler for ResultJoin<'_> {
    fn style(&self, district: &District<'_>) -> PathStyle {
        style::style_district(district, self.results)
    }

    fn on_interaction(&self, district: &District<'_>, event: Interaction) -> PathStyle {
        style::style_for(district, self.results, event)
    }

    fn popup(&self, district: &District<'_>) -> String {
        style::popup_content(district, self.results)
    }
}

/// Ids that do not fit the fixed-width join key, one entry per district.
pub fn wide_ids(collection: &FeatureCollection) -> Vec<String> {
    collection
        .features
        .iter()
        .filter_map(|feature| District::new(feature).id())
        .filter(|id| id.len() > style::KEY_WIDTH)
        .collect()
}

/// Owns the surface and everything loaded for one map build.
pub struct MapSession<S: MapSurface> {
    surface: S,
    results: ResultStore,
    districts: Option<FeatureCollection>,
    stage: Stage,
}

impl<S: MapSurface> MapSession<S> {
    pub fn new(mut surface: S, map: &MapConfig) -> Self {
        surface.set_view(map.center, map.zoom);
        surface.add_tile_layer(TileLayer {
            url_template: map.tile_url.clone(),
            attribution: map.attribution.clone(),
            max_zoom: map.max_zoom,
        });
        Self {
            surface,
            results: ResultStore::new(),
            districts: None,
            stage: Stage::NotLoaded,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    pub fn districts(&self) -> Option<&FeatureCollection> {
        self.districts.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_parts(self) -> (S, ResultStore, Option<FeatureCollection>) {
        (self.surface, self.results, self.districts)
    }

    /// Results first, then districts; each failure is handled where it happens.
    pub async fn run(&mut self, client: &Client, input: &InputConfig) {
        self.load_results(client, &Source::parse(&input.results)).await;
        self.load_districts(client, &Source::parse(&input.districts_url)).await;
    }

    pub async fn load_results(&mut self, client: &Client, source: &Source) {
        match data::load_results(client, source).await {
            Ok(results) => self.results = results,
            Err(e) => {
                warn!("Error loading election results from {}: {}", source, e);
                warn!("No election results available - districts will show without party coloring");
                self.results = ResultStore::new();
                self.surface.set_status(NO_RESULTS_STATUS);
            }
        }
        self.stage = Stage::ResultsSettled;
    }

    pub async fn load_districts(&mut self, client: &Client, source: &Source) {
        match data::fetch_districts(client, source).await {
            Ok(collection) => self.show_districts(collection),
            Err(e) => self.fail_districts(&e),
        }
    }

    fn show_districts(&mut self, collection: FeatureCollection) {
        let count = collection.features.len();
        for id in wide_ids(&collection) {
            warn!("District id {} is wider than the {}-character join key", id, style::KEY_WIDTH);
        }
        let join = ResultJoin { results: &self.results };
        if let Some(bounds) = self.surface.draw_districts(&collection, &join) {
            self.surface.fit_bounds(bounds);
        }
        self.surface.set_status(&count.to_string());
        self.districts = Some(collection);
        info!("Successfully loaded {} electoral districts", count);

        self.build_legend();
    }

    fn fail_districts(&mut self, e: &DistrictsError) {
        error!("Error loading electoral districts: {}", e);
        self.surface.set_status(DISTRICTS_FAILED_STATUS);
        self.surface.show_error_overlay(ErrorOverlay {
            title: "Unable to Load District Data".to_string(),
            detail: "The application could not connect to the district API to load electoral district boundaries.".to_string(),
            error: e.to_string(),
            hint: "Please check your internet connection and try refreshing the page.".to_string(),
        });
        self.stage = Stage::DistrictsFailed;
    }

    fn build_legend(&mut self) {
        let rows = legend::legend_rows(&self.results);
        for row in &rows {
            info!("Seats for {}: {}", row.party, row.caption());
        }
        self.surface.add_control(Control {
            position: ControlPosition::BottomLeft,
            class: "legend".to_string(),
            html: legend::render_legend(&rows),
        });
        self.stage = Stage::LegendRendered;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::district_feature;
    use geo::{coord, Rect};
    use serde_json::json;
    use std::fs;
    use std::path::Path;

    #[derive(Default)]
    struct Recording {
        view: Option<([f64; 2], u8)>,
        tiles: Vec<TileLayer>,
        drawn: Vec<(PathStyle, PathStyle, PathStyle, String)>,
        fitted: Option<Rect<f64>>,
        controls: Vec<Control>,
        status: Vec<String>,
        overlay: Option<ErrorOverlay>,
    }

    impl MapSurface for Recording {
        fn set_view(&mut self, center: [f64; 2], zoom: u8) {
            self.view = Some((center, zoom));
        }

        fn add_tile_layer(&mut self, layer: TileLayer) {
            self.tiles.push(layer);
        }

        fn draw_districts(&mut self, districts: &FeatureCollection, styler: &dyn DistrictStyler) -> Option<Rect<f64>> {
            for feature in &districts.features {
                let d = District::new(feature);
                self.drawn.push((
                    styler.style(&d),
                    styler.on_interaction(&d, Interaction::PointerEnter),
                    styler.on_interaction(&d, Interaction::PointerLeave),
                    styler.popup(&d),
                ));
            }
            Some(Rect::new(coord! { x: -66.0, y: 46.0 }, coord! { x: -65.0, y: 47.0 }))
        }

        fn fit_bounds(&mut self, bounds: Rect<f64>) {
            self.fitted = Some(bounds);
        }

        fn add_control(&mut self, control: Control) {
            self.controls.push(control);
        }

        fn set_status(&mut self, text: &str) {
            self.status.push(text.to_string());
        }

        fn show_error_overlay(&mut self, overlay: ErrorOverlay) {
            self.overlay = Some(overlay);
        }
    }

    fn write_districts(dir: &Path, ids: &[u64]) -> Source {
        let features: Vec<_> = ids
            .iter()
            .map(|id| district_feature(json!(id), Some("Somewhere")))
            .collect();
        let fc = FeatureCollection { bbox: None, features, foreign_members: None };
        let path = dir.join("districts.geojson");
        fs::write(&path, serde_json::to_string(&fc).unwrap()).unwrap();
        Source::File(path)
    }

    fn write_results(dir: &Path) -> Source {
        let path = dir.join("election-results.json");
        fs::write(
            &path,
            json!({
                "01": {"mla": "A", "party": "PC", "party_full": "Progressive Conservative",
                       "votes": 12345, "percentage": 55.1, "total_votes": 22400},
                "02": {"mla": "B", "party": "PC", "party_full": "Progressive Conservative",
                       "votes": 5000, "percentage": 48.0, "total_votes": 10400},
                "03": {"mla": "C", "party": "Liberal", "party_full": "Liberal",
                       "votes": 7000, "percentage": 61.0, "total_votes": 11400}
            })
            .to_string(),
        )
        .unwrap();
        Source::File(path)
    }

    fn session() -> MapSession<Recording> {
        MapSession::new(Recording::default(), &MapConfig::default())
    }

    #[test]
    fn new_session_initializes_surface() {
        let session = session();
        assert_eq!(session.stage(), Stage::NotLoaded);
        assert_eq!(session.surface().tiles.len(), 1);
        assert_eq!(session.surface().view, Some(([46.5653, -66.4619], 7)));
    }

    #[tokio::test]
    async fn full_pipeline_styles_and_builds_legend() {
        let dir = tempfile::tempdir().unwrap();
        let client = Client::new();
        let mut session = session();

        session.load_results(&client, &write_results(dir.path())).await;
        assert_eq!(session.stage(), Stage::ResultsSettled);
        assert_eq!(session.results().len(), 3);

        session.load_districts(&client, &write_districts(dir.path(), &[1, 3, 4])).await;
        assert_eq!(session.stage(), Stage::LegendRendered);

        let surface = session.surface();
        assert_eq!(surface.status, vec!["3".to_string()]);
        assert!(surface.fitted.is_some());
        assert_eq!(surface.drawn[0].0.fill_color, "#9999FF");
        assert_eq!(surface.drawn[0].0.fill_opacity, 0.7);
        assert_eq!(surface.drawn[0].1.weight, 3.0);
        assert_eq!(surface.drawn[0].2, surface.drawn[0].0);
        assert!(surface.drawn[0].3.contains("12,345"));
        assert!(surface.drawn[0].3.contains("55.1%"));
        assert_eq!(surface.drawn[1].0.fill_color, "#EA6D6A");
        assert_eq!(surface.drawn[2].0.fill_opacity, 0.3);

        assert_eq!(surface.controls.len(), 1);
        let legend = &surface.controls[0];
        assert_eq!(legend.position, ControlPosition::BottomLeft);
        let pc = legend.html.find("Progressive Conservative (2 seats)").unwrap();
        let lib = legend.html.find("Liberal (1 seat)").unwrap();
        assert!(pc < lib);
        assert!(!legend.html.contains("Green"));
    }

    #[tokio::test]
    async fn unreachable_results_still_draw_districts() {
        let dir = tempfile::tempdir().unwrap();
        let client = Client::new();
        let mut session = session();

        session.load_results(&client, &Source::File(dir.path().join("missing.json"))).await;
        assert_eq!(session.surface().status, vec![NO_RESULTS_STATUS.to_string()]);
        assert!(session.results().is_empty());

        session.load_districts(&client, &write_districts(dir.path(), &[1, 2, 10, 11])).await;
        let surface = session.surface();
        assert_eq!(surface.status.last().map(String::as_str), Some("4"));
        assert_eq!(surface.drawn.len(), 4);
        for (style, _, _, popup) in &surface.drawn {
            assert_eq!(style.fill_color, "#cccccc");
            assert_eq!(style.fill_opacity, 0.3);
            assert!(popup.contains("Election results not available"));
        }
        assert!(surface.overlay.is_none());
    }

    #[tokio::test]
    async fn empty_district_response_shows_overlay_without_legend() {
        let dir = tempfile::tempdir().unwrap();
        let client = Client::new();
        let mut session = session();
        let path = dir.path().join("districts.geojson");
        fs::write(&path, r#"{"type": "FeatureCollection", "features": []}"#).unwrap();

        session.load_results(&client, &write_results(dir.path())).await;
        session.load_districts(&client, &Source::File(path)).await;

        assert_eq!(session.stage(), Stage::DistrictsFailed);
        let surface = session.surface();
        let overlay = surface.overlay.as_ref().unwrap();
        assert!(overlay.error.contains("No features found in the response"));
        assert_eq!(surface.status.last().map(String::as_str), Some(DISTRICTS_FAILED_STATUS));
        assert!(surface.controls.is_empty());
        assert!(surface.drawn.is_empty());
        assert_eq!(surface.tiles.len(), 1);
        assert!(session.districts().is_none());
    }

    async fn serve(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn http_error_status_fails_both_fetches_independently() {
        use axum::{http::StatusCode, routing::get, Router};

        let base = serve(
            Router::new()
                .route("/results", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
                .route("/districts", get(|| async { StatusCode::SERVICE_UNAVAILABLE })),
        )
        .await;
        let client = Client::builder().no_proxy().build().unwrap();
        let mut session = session();

        session.load_results(&client, &Source::parse(&format!("{}/results", base))).await;
        assert_eq!(session.stage(), Stage::ResultsSettled);
        assert_eq!(session.surface().status, vec![NO_RESULTS_STATUS.to_string()]);
        assert!(session.results().is_empty());

        session.load_districts(&client, &Source::parse(&format!("{}/districts", base))).await;
        assert_eq!(session.stage(), Stage::DistrictsFailed);
        let surface = session.surface();
        let overlay = surface.overlay.as_ref().unwrap();
        assert!(overlay.error.contains("HTTP error! status: 503"));
        assert_eq!(surface.status.last().map(String::as_str), Some(DISTRICTS_FAILED_STATUS));
        assert!(surface.controls.is_empty());
        assert!(surface.drawn.is_empty());
    }

    #[tokio::test]
    async fn empty_collection_over_http_shows_overlay() {
        use axum::{routing::get, Router};

        let base = serve(Router::new().route(
            "/districts",
            get(|| async { r#"{"type": "FeatureCollection", "features": []}"# }),
        ))
        .await;
        let client = Client::builder().no_proxy().build().unwrap();
        let mut session = session();

        session.load_districts(&client, &Source::parse(&format!("{}/districts", base))).await;
        let surface = session.surface();
        let overlay = surface.overlay.as_ref().unwrap();
        assert!(overlay.error.contains("No features found in the response"));
        assert!(surface.controls.is_empty());
        assert_eq!(surface.tiles.len(), 1);
    }

    #[test]
    fn wide_ids_are_reported_once_per_district() {
        let fc = FeatureCollection {
            bbox: None,
            features: vec![
                district_feature(json!(7), None),
                district_feature(json!(123), None),
                district_feature(json!(49), None),
                district_feature(json!(1001), None),
            ],
            foreign_members: None,
        };
        assert_eq!(wide_ids(&fc), vec!["123".to_string(), "1001".to_string()]);
    }
}
