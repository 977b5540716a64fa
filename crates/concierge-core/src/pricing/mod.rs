//! Flight and hotel price lookups.
//!
//! [`PricingService`] wraps an optional [`AmadeusClient`]. Without credentials
//! every lookup returns [`Lookup::Unavailable`]; provider failures return
//! [`Lookup::Failed`]. Neither is an error, so a chat turn that asks for
//! prices always gets a result it can show the user.

mod amadeus;
mod links;

pub use amadeus::{AmadeusClient, PRODUCTION_BASE_URL, TEST_BASE_URL, base_url_for};
pub use links::*;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info};

use crate::config::PricingConfig;
use crate::error::Result;

pub const SETUP_URL: &str = "https://developers.amadeus.com";

const NOT_CONFIGURED: &str =
    "Pricing unavailable: add AMADEUS_API_KEY and AMADEUS_API_SECRET to enable live prices.";
const FLIGHT_CITATION: &str =
    "Prices and times are ESTIMATES from Amadeus data - verify on booking sites for actual rates.";
const HOTEL_CITATION: &str =
    "Prices are ESTIMATES from Amadeus data - verify on booking sites for actual rates.";

/// Hotels looked up per city before requesting offers.
const MAX_HOTEL_IDS: usize = 20;
const MAX_LOCATIONS: usize = 5;

// ─────────────────────────────────────────────────────────────────────────────
// Outcome
// ─────────────────────────────────────────────────────────────────────────────

/// Result of a price lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Available(T),
    /// No credentials configured
    Unavailable { reason: String, setup_url: String },
    /// The provider call failed
    Failed { error: String },
}

impl<T: Serialize> Lookup<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Lookup::Available(_))
    }

    pub fn available(&self) -> Option<&T> {
        match self {
            Lookup::Available(value) => Some(value),
            _ => None,
        }
    }

    /// JSON handed back to the model as a tool result.
    pub fn to_tool_result(&self) -> Value {
        match self {
            Lookup::Available(value) => {
                let mut result = json!({ "success": true });
                if let (Some(map), Ok(Value::Object(fields))) =
                    (result.as_object_mut(), serde_json::to_value(value))
                {
                    map.extend(fields);
                }
                result
            }
            Lookup::Unavailable { reason, setup_url } => json!({
                "success": false,
                "available": false,
                "error": reason,
                "setup_url": setup_url,
            }),
            Lookup::Failed { error } => json!({
                "success": false,
                "error": error,
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightQuery {
    /// Origin IATA code
    pub origin: String,
    /// Destination IATA code
    pub destination: String,
    /// `YYYY-MM-DD`
    pub departure_date: String,
    pub return_date: Option<String>,
    pub adults: u32,
    /// ECONOMY, PREMIUM_ECONOMY, BUSINESS or FIRST
    pub cabin_class: String,
    pub max_results: u32,
}

impl FlightQuery {
    pub fn new(origin: &str, destination: &str, departure_date: &str) -> Self {
        Self {
            origin: origin.trim().to_uppercase(),
            destination: destination.trim().to_uppercase(),
            departure_date: departure_date.trim().to_string(),
            return_date: None,
            adults: 1,
            cabin_class: "ECONOMY".to_string(),
            max_results: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelQuery {
    /// City IATA code (PAR, NYC, LON, ...)
    pub city_code: String,
    pub check_in_date: String,
    pub check_out_date: String,
    pub adults: u32,
    pub rooms: u32,
    pub max_results: usize,
}

impl HotelQuery {
    pub fn new(city_code: &str, check_in_date: &str, check_out_date: &str) -> Self {
        Self {
            city_code: city_code.trim().to_uppercase(),
            check_in_date: check_in_date.trim().to_string(),
            check_out_date: check_out_date.trim().to_string(),
            adults: 1,
            rooms: 1,
            max_results: 5,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Results
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Price {
    pub total: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentEndpoint {
    pub airport: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightSegment {
    pub departure: SegmentEndpoint,
    pub arrival: SegmentEndpoint,
    pub carrier: String,
    pub carrier_name: String,
    pub carrier_url: String,
    pub flight_number: String,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Itinerary {
    pub duration: String,
    pub segments: Vec<FlightSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightOffer {
    pub id: String,
    pub price: Price,
    pub itineraries: Vec<Itinerary>,
    pub seats_available: Option<u32>,
    pub booking_links: Vec<AirlineLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightSearch {
    pub count: usize,
    pub flights: Vec<FlightOffer>,
    pub search_links: FlightSearchLinks,
    pub citation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotelOffer {
    pub hotel_id: String,
    pub name: String,
    pub rating: Option<String>,
    pub address: Value,
    pub price: Price,
    pub room_type: String,
    pub board_type: String,
    pub cancellation: String,
    pub booking_link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotelSearch {
    pub count: usize,
    pub hotels: Vec<HotelOffer>,
    pub search_links: HotelSearchLinks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub citation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub name: String,
    pub iata_code: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSearch {
    pub locations: Vec<Location>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Service
// ─────────────────────────────────────────────────────────────────────────────

/// Price lookups with graceful degradation.
#[derive(Debug, Default)]
pub struct PricingService {
    client: Option<AmadeusClient>,
}

impl PricingService {
    /// Service that reports every lookup as unavailable
    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub fn with_client(client: AmadeusClient) -> Self {
        Self { client: Some(client) }
    }

    /// Build from configuration. Missing or placeholder credentials disable pricing.
    pub fn from_config(config: &PricingConfig) -> Self {
        let Some((key, secret)) = config.credentials() else {
            info!("Pricing credentials not configured; price lookups disabled");
            return Self::disabled();
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| base_url_for(&config.hostname).to_string());

        Self::with_client(
            AmadeusClient::new(key, secret)
                .with_http_client(http)
                .with_base_url(base_url),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn run<'a, T, F, Fut>(&'a self, operation: &str, f: F) -> Lookup<T>
    where
        F: FnOnce(&'a AmadeusClient) -> Fut,
        Fut: Future<Output = Result<T>> + 'a,
    {
        let Some(client) = self.client.as_ref() else {
            return Lookup::Unavailable {
                reason: NOT_CONFIGURED.to_string(),
                setup_url: SETUP_URL.to_string(),
            };
        };

        match f(client).await {
            Ok(value) => Lookup::Available(value),
            Err(e) => {
                error!(operation, error = %e, "Pricing lookup failed");
                Lookup::Failed {
                    error: format!("Error during {}: {}", operation, e),
                }
            }
        }
    }

    pub async fn search_flights(&self, query: &FlightQuery) -> Lookup<FlightSearch> {
        self.run("flight search", |client| async move {
            let mut params = vec![
                ("originLocationCode", query.origin.to_uppercase()),
                ("destinationLocationCode", query.destination.to_uppercase()),
                ("departureDate", query.departure_date.clone()),
                ("adults", query.adults.max(1).to_string()),
                ("travelClass", query.cabin_class.to_uppercase()),
                ("max", query.max_results.max(1).to_string()),
                ("currencyCode", "USD".to_string()),
            ];
            if let Some(ret) = &query.return_date {
                params.push(("returnDate", ret.clone()));
            }

            let offers = client.flight_offers(&params).await?;
            let flights: Vec<FlightOffer> = offers.into_iter().map(convert_flight_offer).collect();

            Ok(FlightSearch {
                count: flights.len(),
                flights,
                search_links: flight_search_links(
                    &query.origin,
                    &query.destination,
                    &query.departure_date,
                    query.return_date.as_deref(),
                ),
                citation: FLIGHT_CITATION.to_string(),
            })
        })
        .await
    }

    pub async fn search_hotels(&self, query: &HotelQuery) -> Lookup<HotelSearch> {
        self.run("hotel search", |client| async move {
            let city = query.city_code.to_uppercase();
            let search_links = hotel_search_links(
                &city,
                &query.check_in_date,
                &query.check_out_date,
                query.adults,
            );

            let refs = client.hotels_by_city(&city).await?;
            if refs.is_empty() {
                return Ok(HotelSearch {
                    count: 0,
                    hotels: vec![],
                    search_links,
                    message: Some(format!("No hotels found in {}", city)),
                    citation: HOTEL_CITATION.to_string(),
                });
            }

            let ids: Vec<String> = refs
                .into_iter()
                .take(MAX_HOTEL_IDS)
                .map(|h| h.hotel_id)
                .collect();
            let params = vec![
                ("hotelIds", ids.join(",")),
                ("checkInDate", query.check_in_date.clone()),
                ("checkOutDate", query.check_out_date.clone()),
                ("adults", query.adults.max(1).to_string()),
                ("roomQuantity", query.rooms.max(1).to_string()),
            ];

            let hotels: Vec<HotelOffer> = client
                .hotel_offers(&params)
                .await?
                .into_iter()
                .take(query.max_results)
                .filter_map(convert_hotel_offer)
                .collect();

            Ok(HotelSearch {
                count: hotels.len(),
                hotels,
                search_links,
                message: None,
                citation: HOTEL_CITATION.to_string(),
            })
        })
        .await
    }

    pub async fn lookup_airport(&self, city_name: &str) -> Lookup<LocationSearch> {
        self.run("airport lookup", |client| async move {
            let locations = client
                .locations(city_name.trim())
                .await?
                .into_iter()
                .take(MAX_LOCATIONS)
                .map(|loc| Location {
                    name: loc.name,
                    iata_code: loc.iata_code,
                    kind: loc.sub_type,
                    city: loc.address.city_name,
                    country: loc.address.country_name,
                })
                .collect();
            Ok(LocationSearch { locations })
        })
        .await
    }
}

fn convert_price(raw: amadeus::RawPrice) -> Price {
    Price {
        total: raw.total.unwrap_or_else(|| "N/A".to_string()),
        currency: raw.currency.unwrap_or_else(|| "USD".to_string()),
    }
}

fn convert_flight_offer(offer: amadeus::RawFlightOffer) -> FlightOffer {
    let mut carriers: Vec<String> = Vec::new();
    let itineraries = offer
        .itineraries
        .into_iter()
        .map(|itinerary| Itinerary {
            duration: itinerary.duration,
            segments: itinerary
                .segments
                .into_iter()
                .map(|segment| {
                    if !carriers.contains(&segment.carrier_code) {
                        carriers.push(segment.carrier_code.clone());
                    }
                    let airline = airline_info(&segment.carrier_code);
                    FlightSegment {
                        departure: SegmentEndpoint {
                            airport: segment.departure.iata_code,
                            time: segment.departure.at,
                        },
                        arrival: SegmentEndpoint {
                            airport: segment.arrival.iata_code,
                            time: segment.arrival.at,
                        },
                        carrier: segment.carrier_code,
                        carrier_name: airline.name,
                        carrier_url: airline.url,
                        flight_number: segment.number,
                        duration: segment.duration,
                    }
                })
                .collect(),
        })
        .collect();

    FlightOffer {
        id: offer.id,
        price: convert_price(offer.price),
        itineraries,
        seats_available: offer.number_of_bookable_seats,
        booking_links: carriers.iter().map(|c| airline_info(c)).collect(),
    }
}

fn convert_hotel_offer(raw: amadeus::RawHotelOffers) -> Option<HotelOffer> {
    let best = raw.offers.into_iter().next()?;
    let name = raw.hotel.name.unwrap_or_else(|| "Unknown".to_string());

    let room_type = best
        .room
        .pointer("/typeEstimated/category")
        .and_then(Value::as_str)
        .unwrap_or("Standard")
        .to_string();
    let refundable = best
        .policies
        .get("cancellations")
        .is_some_and(|c| !c.is_null());

    Some(HotelOffer {
        hotel_id: raw.hotel.hotel_id,
        booking_link: hotel_booking_link(&name),
        name,
        rating: raw.hotel.rating,
        address: raw.hotel.address,
        price: convert_price(best.price),
        room_type,
        board_type: best.board_type.unwrap_or_else(|| "ROOM_ONLY".to_string()),
        cancellation: if refundable {
            "Free cancellation".to_string()
        } else {
            "Non-refundable".to_string()
        },
    })
}
