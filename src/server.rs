use crate::config::AppConfig;
use crate::style::join_key;
use crate::types::{District, ElectionResult, ResultStore};
use anyhow::Result;
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use geo::algorithm::contains::Contains;
use geo::bounding_rect::BoundingRect;
use geo::{MultiPolygon, Point};
use geojson::FeatureCollection;
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

// Bounding box entry pointing back into AppState::districts
pub struct DistrictIndex {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for DistrictIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

pub struct IndexedDistrict {
    pub id: Option<String>,
    pub name: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

pub struct AppState {
    pub districts: Vec<IndexedDistrict>,
    pub tree: RTree<DistrictIndex>,
    pub results: ResultStore,
}

#[derive(Deserialize)]
pub struct QueryParams {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct QueryResponse {
    id: Option<String>,
    key: Option<String>,
    name: Option<String>,
    result: Option<ElectionResult>,
}

impl AppState {
    pub fn new(districts: Option<&FeatureCollection>, results: ResultStore) -> Self {
        let districts: Vec<IndexedDistrict> = districts
            .map(|fc| fc.features.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|feature| {
                let district = District::new(feature);
                Some(IndexedDistrict {
                    id: district.id(),
                    name: district.name().map(str::to_string),
                    geometry: district.polygons()?,
                })
            })
            .collect();

        let tree_items: Vec<DistrictIndex> = districts
            .iter()
            .enumerate()
            .filter_map(|(i, d)| {
                let rect = d.geometry.bounding_rect()?;
                Some(DistrictIndex {
                    index: i,
                    aabb: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
                })
            })
            .collect();

        info!("Spatial index built for {} districts.", tree_items.len());

        Self {
            districts,
            tree: RTree::bulk_load(tree_items),
            results,
        }
    }

    pub fn query(&self, lat: f64, lon: f64) -> Option<QueryResponse> {
        let point = Point::new(lon, lat);
        let envelope = AABB::from_point([lon, lat]);

        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|candidate| self.districts.get(candidate.index))
            .find(|district| district.geometry.contains(&point))
            .map(|district| {
                let key = district.id.as_deref().map(join_key);
                QueryResponse {
                    id: district.id.clone(),
                    result: key.as_ref().and_then(|k| self.results.get(k)).cloned(),
                    key,
                    name: district.name.clone(),
                }
            })
    }
}

pub async fn start_server(config: &AppConfig, state: AppState) -> Result<()> {
    let state = Arc::new(state);
    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));

    let app = Router::new()
        .route("/api/query", get(query_handler))
        .route("/api/results", get(results_handler))
        .fallback_service(ServeDir::new(&config.output.dir))
        .layer(CorsLayer::permissive())
        .with_state(state);

    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn query_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Json<Option<QueryResponse>> {
    Json(state.query(params.lat, params.lon))
}

async fn results_handler(State(state): State<Arc<AppState>>) -> Json<ResultStore> {
    Json(state.results.clone())
}
