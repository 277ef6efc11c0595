use crate::types::ResultStore;
use geojson::{FeatureCollection, GeoJson};
use reqwest::Client;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Where a document comes from: an http(s) URL or a path on disk.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

impl Source {
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Source::Url(location.to_string())
        } else {
            Source::File(PathBuf::from(location))
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => f.write_str(url),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error! status: {0}")]
    Status(u16),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ResultsError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Invalid election results document: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DistrictsError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Invalid GeoJSON: {0}")]
    Parse(#[from] geojson::Error),
    #[error("Response is not a FeatureCollection")]
    NotACollection,
    #[error("No features found in the response")]
    NoFeatures,
}

async fn read_source(client: &Client, source: &Source) -> Result<String, FetchError> {
    match source {
        Source::Url(url) => {
            let response = client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }
            Ok(response.text().await?)
        }
        Source::File(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|source| FetchError::Io { path: path.clone(), source }),
    }
}

pub async fn load_results(client: &Client, source: &Source) -> Result<ResultStore, ResultsError> {
    let body = read_source(client, source).await?;
    let results: ResultStore = serde_json::from_str(&body)?;
    info!("Election results loaded: {} districts", results.len());
    Ok(results)
}

pub async fn fetch_districts(client: &Client, source: &Source) -> Result<FeatureCollection, DistrictsError> {
    let body = read_source(client, source).await?;
    parse_districts(&body)
}

pub fn parse_districts(body: &str) -> Result<FeatureCollection, DistrictsError> {
    let collection = match body.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(DistrictsError::NotACollection),
    };
    if collection.features.is_empty() {
        return Err(DistrictsError::NoFeatures);
    }
    Ok(collection)
}
