use serde::Deserialize;
use url::Url;

use shared::domain::{Address, GeoPoint};

use crate::error::GeocodeError;

pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org";

const USER_AGENT: &str = "transfer-console/1.0 (ops@transfer-console.example)";
const SEARCH_RESULT_LIMIT: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct GeoPlace {
    pub location: GeoPoint,
    pub display_name: String,
    pub address: Address,
}

/// Free-text and coordinate-based address resolution against a
/// Nominatim-style provider. The provider rate-limits; nothing here retries
/// or caches.
pub struct GeocodeClient {
    http: reqwest::Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: String,
    #[serde(default)]
    address: Option<WireAddress>,
}

#[derive(Debug, Deserialize)]
struct ReverseHit {
    #[serde(default)]
    address: Option<WireAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct WireAddress {
    country: Option<String>,
    country_code: Option<String>,
    region: Option<String>,
    state: Option<String>,
    city: Option<String>,
    county: Option<String>,
    town: Option<String>,
    village: Option<String>,
    postcode: Option<String>,
}

impl WireAddress {
    /// The provider scatters the locality across several fields depending on
    /// settlement size; collapse them in a fixed preference order.
    fn into_address(self) -> Address {
        Address {
            country: self.country.unwrap_or_default(),
            country_code: self.country_code.unwrap_or_default().to_uppercase(),
            region: self.region.or(self.state).unwrap_or_default(),
            city: self
                .city
                .or(self.county)
                .or(self.town)
                .or(self.village)
                .unwrap_or_default(),
            postal_code: self.postcode.unwrap_or_default(),
        }
    }
}

impl GeocodeClient {
    pub fn new(base_url: &str) -> Result<Self, GeocodeError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| GeocodeError::Network(format!("invalid geocode url: {err}")))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
        })
    }

    pub async fn search(&self, query: &str) -> Result<Vec<GeoPlace>, GeocodeError> {
        let mut url = self.join("search")?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("format", "json")
            .append_pair("addressdetails", "1")
            .append_pair("limit", &SEARCH_RESULT_LIMIT.to_string());

        let hits: Vec<SearchHit> = self.get_json(url).await?;
        hits.into_iter()
            .map(|hit| {
                let latitude = parse_coord(&hit.lat)?;
                let longitude = parse_coord(&hit.lon)?;
                Ok(GeoPlace {
                    location: GeoPoint {
                        latitude,
                        longitude,
                    },
                    display_name: hit.display_name,
                    address: hit.address.unwrap_or_default().into_address(),
                })
            })
            .collect()
    }

    pub async fn reverse(&self, latitude: f64, longitude: f64) -> Result<Address, GeocodeError> {
        let mut url = self.join("reverse")?;
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("lat", &latitude.to_string())
            .append_pair("lon", &longitude.to_string())
            .append_pair("accept-language", "en");

        let hit: ReverseHit = self.get_json(url).await?;
        Ok(hit.address.unwrap_or_default().into_address())
    }

    fn join(&self, path: &str) -> Result<Url, GeocodeError> {
        self.base_url
            .join(path)
            .map_err(|err| GeocodeError::Network(format!("invalid geocode path: {err}")))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, GeocodeError> {
        let response = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|err| GeocodeError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|err| GeocodeError::Decode(err.to_string()))
    }
}

fn parse_coord(raw: &str) -> Result<f64, GeocodeError> {
    raw.parse::<f64>()
        .map_err(|_| GeocodeError::Decode(format!("bad coordinate '{raw}'")))
}

#[cfg(test)]
#[path = "tests/geocode_tests.rs"]
mod tests;
