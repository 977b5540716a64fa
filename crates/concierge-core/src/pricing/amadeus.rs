//! Minimal Amadeus Self-Service REST client.
//!
//! Authenticates with the OAuth2 client-credentials grant and caches the
//! access token until shortly before it expires. Requests are sent once; a
//! failed request surfaces as an error and is never retried.

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Result};

pub const TEST_BASE_URL: &str = "https://test.api.amadeus.com";
pub const PRODUCTION_BASE_URL: &str = "https://api.amadeus.com";

/// Refresh the token this long before the server-side expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Base URL for a configured hostname (`test` or `production`)
pub fn base_url_for(hostname: &str) -> &'static str {
    if hostname.eq_ignore_ascii_case("production") {
        PRODUCTION_BASE_URL
    } else {
        TEST_BASE_URL
    }
}

#[derive(Debug)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Amadeus API client
#[derive(Debug)]
pub struct AmadeusClient {
    client: Client,
    api_key: String,
    api_secret: String,
    base_url: String,
    token: Mutex<Option<CachedToken>>,
}

impl AmadeusClient {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            base_url: TEST_BASE_URL.to_string(),
            token: Mutex::new(None),
        }
    }

    /// Set custom base URL (production host or a local stand-in)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies)
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            #[serde(default = "default_expires_in")]
            expires_in: u64,
        }

        fn default_expires_in() -> u64 {
            1799
        }

        let response = self
            .client
            .post(format!("{}/v1/security/oauth2/token", self.base_url))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.api_key.as_str()),
                ("client_secret", self.api_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Pricing(format!("Authentication failed ({}): {}", status, body)));
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        debug!(expires_in = token.expires_in, "Obtained Amadeus access token");

        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<T> {
        let token = self.access_token().await?;
        let request = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token);

        let response = build(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Pricing(format!("{} returned {}: {}", path, status, body)));
        }
        Ok(response.json().await?)
    }

    /// `GET /v2/shopping/flight-offers`
    pub async fn flight_offers(&self, params: &[(&str, String)]) -> Result<Vec<RawFlightOffer>> {
        let envelope: Envelope<RawFlightOffer> = self
            .get("/v2/shopping/flight-offers", |req| req.query(params))
            .await?;
        Ok(envelope.data)
    }

    /// `GET /v1/reference-data/locations/hotels/by-city`
    pub async fn hotels_by_city(&self, city_code: &str) -> Result<Vec<RawHotelRef>> {
        let envelope: Envelope<RawHotelRef> = self
            .get("/v1/reference-data/locations/hotels/by-city", |req| {
                req.query(&[("cityCode", city_code)])
            })
            .await?;
        Ok(envelope.data)
    }

    /// `GET /v3/shopping/hotel-offers`
    pub async fn hotel_offers(&self, params: &[(&str, String)]) -> Result<Vec<RawHotelOffers>> {
        let envelope: Envelope<RawHotelOffers> = self
            .get("/v3/shopping/hotel-offers", |req| req.query(params))
            .await?;
        Ok(envelope.data)
    }

    /// `GET /v1/reference-data/locations`
    pub async fn locations(&self, keyword: &str) -> Result<Vec<RawLocation>> {
        let envelope: Envelope<RawLocation> = self
            .get("/v1/reference-data/locations", |req| {
                req.query(&[("keyword", keyword), ("subType", "AIRPORT,CITY")])
            })
            .await?;
        Ok(envelope.data)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types (only the fields we read)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawFlightOffer {
    pub id: String,
    pub price: RawPrice,
    pub itineraries: Vec<RawItinerary>,
    pub number_of_bookable_seats: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawPrice {
    pub total: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawItinerary {
    pub duration: String,
    pub segments: Vec<RawSegment>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawSegment {
    pub departure: RawEndpoint,
    pub arrival: RawEndpoint,
    pub carrier_code: String,
    pub number: String,
    pub duration: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawEndpoint {
    pub iata_code: String,
    pub at: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawHotelRef {
    pub hotel_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawHotelOffers {
    pub hotel: RawHotel,
    pub offers: Vec<RawHotelOffer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawHotel {
    pub hotel_id: String,
    pub name: Option<String>,
    pub rating: Option<String>,
    pub address: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawHotelOffer {
    pub price: RawPrice,
    pub room: Value,
    pub board_type: Option<String>,
    pub policies: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawLocation {
    pub name: String,
    pub iata_code: String,
    pub sub_type: String,
    pub address: RawAddress,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawAddress {
    pub city_name: String,
    pub country_name: String,
}
