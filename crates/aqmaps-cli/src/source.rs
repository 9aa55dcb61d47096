//! HTTP client for the map web server.
//!
//! The server exposes three kinds of resources:
//! - `/maps/YYYY/MM/DD/air-quality-data.json`: sensors to read that day
//! - `/words/w1/w2/w3/details.json`: what3words square details
//! - `/buildings/no-fly-zones.geojson`: no-fly zone polygons

use anyhow::{anyhow, bail, Context, Result};
use aqmaps_core::{Obstacle, Position, SensorRecord, Target};
use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct WordsDetails {
    coordinates: WordsCoordinates,
}

#[derive(Debug, Deserialize)]
struct WordsCoordinates {
    lng: f64,
    lat: f64,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<serde_json::Map<String, serde_json::Value>>,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    #[serde(other)]
    Unsupported,
}

/// Blocking client for the map web server.
pub struct MapServerClient {
    client: Client,
    base_url: String,
}

impl MapServerClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the web server (e.g., "http://localhost:9898")
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Client for a server running on localhost.
    pub fn localhost(port: u16) -> Result<Self> {
        Self::new(format!("http://localhost:{}", port))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_text(&self, path: &str) -> Result<String> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(%url, "requesting");
        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("Failed to connect to {}", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("{} returned HTTP status {}", url, status.as_u16());
        }
        response
            .text()
            .with_context(|| format!("Failed to read response body from {}", url))
    }

    /// Sensors scheduled for reading on `date`.
    pub fn fetch_readings(&self, date: NaiveDate) -> Result<Vec<SensorRecord>> {
        let path = format!("maps/{}/air-quality-data.json", date.format("%Y/%m/%d"));
        let body = self.get_text(&path)?;
        serde_json::from_str(&body).with_context(|| format!("Invalid sensor list at {}", path))
    }

    /// Resolve a what3words address such as "slips.mass.baking".
    pub fn resolve_location(&self, words: &str) -> Result<Position> {
        let path = format!("words/{}/details.json", words_path(words)?);
        let body = self.get_text(&path)?;
        let details: WordsDetails = serde_json::from_str(&body)
            .with_context(|| format!("Invalid location details at {}", path))?;
        Ok(Position::new(details.coordinates.lng, details.coordinates.lat))
    }

    pub fn fetch_no_fly_zones(&self) -> Result<Vec<Obstacle>> {
        let body = self.get_text("buildings/no-fly-zones.geojson")?;
        parse_no_fly_zones(&body)
    }

    /// Sensors for `date` with their positions resolved.
    ///
    /// Sensors whose location cannot be resolved are skipped.
    pub fn load_targets(&self, date: NaiveDate) -> Result<Vec<Target>> {
        let records = self.fetch_readings(date)?;
        let mut targets = Vec::with_capacity(records.len());
        for record in records {
            match self.resolve_location(&record.location) {
                Ok(position) => targets.push(Target::from_record(record, position)),
                Err(e) => warn!(location = %record.location, "Skipping sensor: {:#}", e),
            }
        }
        Ok(targets)
    }
}

/// "a.b.c" -> "a/b/c"
fn words_path(words: &str) -> Result<String> {
    let parts: Vec<&str> = words.split('.').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        bail!("{:?} is not a what3words address", words);
    }
    Ok(parts.join("/"))
}

/// Parse the no-fly-zone GeoJSON. Every feature must be a polygon; only the
/// outer ring is used.
pub fn parse_no_fly_zones(body: &str) -> Result<Vec<Obstacle>> {
    let collection: FeatureCollection =
        serde_json::from_str(body).context("Invalid no-fly-zone GeoJSON")?;

    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(idx, feature)| {
            let name = feature
                .properties
                .as_ref()
                .and_then(|props| props.get("name"))
                .and_then(|value| value.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("zone-{}", idx));
            let Geometry::Polygon { coordinates } = feature.geometry else {
                return Err(anyhow!("no-fly zone {:?} is not a polygon", name));
            };
            let outer = coordinates
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("no-fly zone {:?} has no outer ring", name))?;
            Ok(Obstacle {
                name,
                ring: outer.iter().map(|[lng, lat]| Position::new(*lng, *lat)).collect(),
            })
        })
        .collect()
}
