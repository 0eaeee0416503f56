use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use crate::domain::geo::point::GeoPoint;
use crate::error::{Error, Result};

/// Resolves a street address to coordinates.
///
/// A stateless service handle passed explicitly into whatever needs it;
/// nothing module-global. The core never geocodes on its own, callers do it
/// before building a [`GeoQuery`](crate::domain::geo::query::GeoQuery).
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeoPoint>;
}

#[derive(Deserialize, Debug)]
struct MapboxFeature {
    /// `[lng, lat]`, in Mapbox's coordinate order.
    center: [f64; 2],
}

#[derive(Deserialize, Debug)]
struct MapboxResponse {
    features: Vec<MapboxFeature>,
}

/// Forward geocoding against the Mapbox places API.
#[derive(Debug, Clone)]
pub struct MapboxGeocoder {
    client: reqwest::Client,
    access_token: String,

    /// Optional ISO country filter, e.g. "IN".
    country: Option<String>,
}

impl MapboxGeocoder {
    pub fn new(access_token: impl Into<String>, country: Option<String>) -> Self {
        MapboxGeocoder { client: reqwest::Client::new(), access_token: access_token.into(), country }
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeoPoint> {
        let encoded: String = url::form_urlencoded::byte_serialize(address.as_bytes()).collect();
        let endpoint = format!("https://api.mapbox.com/geocoding/v5/mapbox.places/{}.json", encoded);

        let mut params: Vec<(&str, &str)> = vec![("access_token", self.access_token.as_str()), ("limit", "1")];
        if let Some(country) = &self.country {
            params.push(("country", country.as_str()));
        }

        let response = self.client.get(&endpoint).query(&params).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            log::error!("Geocoding request for '{}' failed. Response-Status-Code: <<{}>> Response-Body: <<{}>>", address, status, body_text);
            return Err(Error::Geocode(format!("mapbox returned status {}", status)));
        }

        let parsed: MapboxResponse = response.json().await?;

        let feature = parsed.features.first().ok_or_else(|| Error::Geocode(format!("no match for address '{}'", address)))?;

        let [lng, lat] = feature.center;
        GeoPoint::new(lat, lng)
    }
}

/// Fixed-table geocoder for tests and offline demos.
#[derive(Debug, Default, Clone)]
pub struct StaticGeocoder {
    table: HashMap<String, GeoPoint>,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, address: impl Into<String>, point: GeoPoint) -> Self {
        self.table.insert(address.into(), point);
        self
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeoPoint> {
        self.table.get(address).copied().ok_or_else(|| Error::Geocode(format!("no match for address '{}'", address)))
    }
}
