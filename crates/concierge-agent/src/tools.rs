//! Tools the concierge model may call.
//!
//! The tool set is closed: a `(name, arguments)` pair from the model is
//! parsed into a [`ToolInvocation`] and executed against the user's state.
//! Every execution produces a JSON result for the model; tool failures never
//! abort the turn.

use chrono::Utc;
use concierge_core::memory;
use concierge_core::pricing::{FlightQuery, HotelQuery, PricingService};
use concierge_core::storage::StateStore;
use concierge_core::types::{MemoryScope, TripRecord, UserState};
use schemars::JsonSchema;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::{AgentError, AgentResult};
use crate::llm::ToolSchema;

const SAVE_MEMORY_NOTE: &str = "save_memory_note";
const SEARCH_FLIGHTS: &str = "search_flights";
const SEARCH_HOTELS: &str = "search_hotels";
const LOOKUP_AIRPORT: &str = "lookup_airport";

fn default_count() -> u32 {
    1
}

fn default_cabin_class() -> String {
    "ECONOMY".to_string()
}

/// Memory list a note is saved to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NoteScope {
    /// Applies to the current trip only.
    #[default]
    Session,
    /// Applies to all future trips.
    Global,
}

impl From<NoteScope> for MemoryScope {
    fn from(scope: NoteScope) -> Self {
        match scope {
            NoteScope::Session => MemoryScope::Session,
            NoteScope::Global => MemoryScope::Global,
        }
    }
}

/// Arguments of `save_memory_note`.
#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
pub struct SaveMemoryNoteArgs {
    /// One or two sentences stating a durable preference or constraint.
    pub text: String,
    /// "session" for this trip only (default), "global" for a lasting preference.
    #[serde(default)]
    pub scope: NoteScope,
    /// One to three short lowercase tags.
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Arguments of `search_flights`.
#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
pub struct SearchFlightsArgs {
    /// Origin airport IATA code (e.g. "SFO").
    pub origin: String,
    /// Destination airport IATA code (e.g. "JFK").
    pub destination: String,
    /// Departure date, YYYY-MM-DD.
    pub departure_date: String,
    /// Return date for a round trip, YYYY-MM-DD. Omit or leave empty for one-way.
    #[serde(default)]
    pub return_date: Option<String>,
    /// Number of adult passengers.
    #[serde(default = "default_count")]
    pub adults: u32,
    /// ECONOMY, PREMIUM_ECONOMY, BUSINESS or FIRST.
    #[serde(default = "default_cabin_class")]
    pub cabin_class: String,
}

/// Arguments of `search_hotels`.
#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
pub struct SearchHotelsArgs {
    /// City IATA code (e.g. "PAR", "NYC", "LON").
    pub city_code: String,
    /// Check-in date, YYYY-MM-DD.
    pub check_in_date: String,
    /// Check-out date, YYYY-MM-DD.
    pub check_out_date: String,
    /// Number of adult guests.
    #[serde(default = "default_count")]
    pub adults: u32,
    /// Number of rooms.
    #[serde(default = "default_count")]
    pub rooms: u32,
}

/// Arguments of `lookup_airport`.
#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
pub struct LookupAirportArgs {
    /// City name (e.g. "San Francisco").
    pub city_name: String,
}

/// A parsed tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    SaveMemoryNote(SaveMemoryNoteArgs),
    SearchFlights(SearchFlightsArgs),
    SearchHotels(SearchHotelsArgs),
    LookupAirport(LookupAirportArgs),
}

/// What a tool may touch while it runs.
pub struct ToolContext<'a> {
    pub user_id: &'a str,
    pub state: &'a mut UserState,
    pub store: &'a dyn StateStore,
    pub pricing: &'a PricingService,
    /// Flight offers requested per search
    pub max_results: u32,
    /// Searches made this turn, added to trip history once the turn completes
    pub trips: &'a mut Vec<TripRecord>,
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: &Value) -> AgentResult<T> {
    let arguments = match arguments {
        Value::Null => json!({}),
        other => other.clone(),
    };
    serde_json::from_value(arguments).map_err(|e| AgentError::invalid_arguments(tool, e))
}

fn parameters_for<T: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    let mut value = serde_json::to_value(schema).unwrap_or_default();
    if let Some(map) = value.as_object_mut() {
        map.remove("$schema");
        map.remove("title");
    }
    value
}

impl ToolInvocation {
    /// Parse a model tool call.
    pub fn parse(name: &str, arguments: &Value) -> AgentResult<Self> {
        match name {
            SAVE_MEMORY_NOTE => parse_args(name, arguments).map(Self::SaveMemoryNote),
            SEARCH_FLIGHTS => parse_args(name, arguments).map(Self::SearchFlights),
            SEARCH_HOTELS => parse_args(name, arguments).map(Self::SearchHotels),
            LOOKUP_AIRPORT => parse_args(name, arguments).map(Self::LookupAirport),
            other => Err(AgentError::UnknownTool(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SaveMemoryNote(_) => SAVE_MEMORY_NOTE,
            Self::SearchFlights(_) => SEARCH_FLIGHTS,
            Self::SearchHotels(_) => SEARCH_HOTELS,
            Self::LookupAirport(_) => LOOKUP_AIRPORT,
        }
    }

    /// Tool definitions advertised to the model.
    pub fn schemas() -> Vec<ToolSchema> {
        vec![
            ToolSchema {
                name: SAVE_MEMORY_NOTE.to_string(),
                description: "Save a high-signal, reusable travel preference or constraint to \
                    SESSION memory. Only save durable, actionable facts the user stated or \
                    confirmed. Never store passport numbers, payment details, full dates of \
                    birth or addresses. Write 1-2 normalized sentences (not \"User said...\") \
                    and mark trip-only notes as such. Provide 1-3 lowercase one-word keywords."
                    .to_string(),
                parameters: parameters_for::<SaveMemoryNoteArgs>(),
            },
            ToolSchema {
                name: SEARCH_FLIGHTS.to_string(),
                description: "Search real-time flight offers. Always use this for prices; \
                    never invent them. When presenting results include flight numbers \
                    (carrier code + number), airline names with carrier_url booking links, \
                    departure/arrival times, the comparison search_links as markdown links \
                    and the citation."
                    .to_string(),
                parameters: parameters_for::<SearchFlightsArgs>(),
            },
            ToolSchema {
                name: SEARCH_HOTELS.to_string(),
                description: "Search real-time hotel offers in a city. Always use this for \
                    prices; never invent them. When presenting results include each hotel's \
                    booking_link, the comparison search_links as markdown links and the \
                    citation."
                    .to_string(),
                parameters: parameters_for::<SearchHotelsArgs>(),
            },
            ToolSchema {
                name: LOOKUP_AIRPORT.to_string(),
                description: "Look up IATA airport/city codes for a city name before \
                    searching flights or hotels."
                    .to_string(),
                parameters: parameters_for::<LookupAirportArgs>(),
            },
        ]
    }

    /// Run the tool and produce the JSON result handed back to the model.
    pub async fn execute(self, ctx: &mut ToolContext<'_>) -> Value {
        match self {
            Self::SaveMemoryNote(args) => save_memory_note(ctx, args),
            Self::SearchFlights(args) => search_flights(ctx, args).await,
            Self::SearchHotels(args) => search_hotels(ctx, args).await,
            Self::LookupAirport(args) => ctx.pricing.lookup_airport(&args.city_name).await.to_tool_result(),
        }
    }
}

/// Appends to the chosen memory list and persists right away.
fn save_memory_note(ctx: &mut ToolContext<'_>, args: SaveMemoryNoteArgs) -> Value {
    let scope = MemoryScope::from(args.scope);
    let note = match memory::add_note(&mut *ctx.state, scope, &args.text, &args.keywords) {
        Ok(note) => note,
        Err(e) => return json!({ "success": false, "error": e.to_string() }),
    };

    if let Err(e) = ctx.store.save(ctx.user_id, &*ctx.state) {
        warn!(user_id = %ctx.user_id, error = %e, "Failed to persist memory note");
        return json!({ "success": false, "error": e.to_string() });
    }

    info!(user_id = %ctx.user_id, %scope, keywords = ?note.keywords, "Saved memory note");
    json!({ "success": true, "scope": scope, "note": note })
}

async fn search_flights(ctx: &mut ToolContext<'_>, args: SearchFlightsArgs) -> Value {
    let mut query = FlightQuery::new(&args.origin, &args.destination, &args.departure_date);
    query.return_date = args.return_date.filter(|d| !d.trim().is_empty());
    query.adults = args.adults.max(1);
    query.cabin_class = args.cabin_class.to_uppercase();
    query.max_results = ctx.max_results;

    let lookup = ctx.pricing.search_flights(&query).await;
    if lookup.is_available() {
        ctx.trips.push(TripRecord {
            kind: Some("flight_search".to_string()),
            from_city: Some(query.origin.clone()),
            to_city: Some(query.destination.clone()),
            check_in_date: Some(query.departure_date.clone()),
            check_out_date: query.return_date.clone(),
            party_size: Some(query.adults),
            recorded_at: Some(Utc::now().to_rfc3339()),
            ..TripRecord::default()
        });
    }
    lookup.to_tool_result()
}

async fn search_hotels(ctx: &mut ToolContext<'_>, args: SearchHotelsArgs) -> Value {
    let mut query = HotelQuery::new(&args.city_code, &args.check_in_date, &args.check_out_date);
    query.adults = args.adults.max(1);
    query.rooms = args.rooms.max(1);
    query.max_results = ctx.max_results as usize;

    let lookup = ctx.pricing.search_hotels(&query).await;
    if lookup.is_available() {
        ctx.trips.push(TripRecord {
            kind: Some("hotel_search".to_string()),
            to_city: Some(query.city_code.clone()),
            check_in_date: Some(query.check_in_date.clone()),
            check_out_date: Some(query.check_out_date.clone()),
            party_size: Some(query.adults),
            recorded_at: Some(Utc::now().to_rfc3339()),
            ..TripRecord::default()
        });
    }
    lookup.to_tool_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_core::storage::JsonStateStore;
    use tempfile::tempdir;

    #[test]
    fn test_parse_known_tools() {
        let call = ToolInvocation::parse(
            "search_flights",
            &json!({"origin": "sfo", "destination": "JFK", "departure_date": "2025-03-14"}),
        )
        .unwrap();

        match call {
            ToolInvocation::SearchFlights(args) => {
                assert_eq!(args.adults, 1);
                assert_eq!(args.cabin_class, "ECONOMY");
                assert!(args.return_date.is_none());
            }
            other => panic!("unexpected invocation: {:?}", other),
        }

        let call = ToolInvocation::parse("save_memory_note", &json!({"text": "aisle seat"})).unwrap();
        assert_eq!(call.name(), "save_memory_note");
    }

    #[test]
    fn test_parse_rejects_unknown_and_invalid() {
        let err = ToolInvocation::parse("book_flight", &json!({})).unwrap_err();
        assert!(matches!(err, AgentError::UnknownTool(ref name) if name == "book_flight"));

        let err = ToolInvocation::parse("lookup_airport", &json!({"city": "Paris"})).unwrap_err();
        assert!(matches!(err, AgentError::InvalidArguments { ref tool, .. } if tool == "lookup_airport"));

        let err = ToolInvocation::parse("save_memory_note", &Value::String("not json".into())).unwrap_err();
        assert!(err.is_tool_error());
    }

    #[test]
    fn test_schemas_are_object_schemas() {
        let schemas = ToolInvocation::schemas();
        let names: Vec<&str> = schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["save_memory_note", "search_flights", "search_hotels", "lookup_airport"]
        );

        let flights = &schemas[1].parameters;
        assert_eq!(flights["type"], "object");
        assert!(flights.get("$schema").is_none());
        assert!(flights.get("title").is_none());
        let required = flights["required"].as_array().unwrap();
        assert!(required.contains(&json!("origin")));
        assert!(!required.contains(&json!("return_date")));
    }

    #[tokio::test]
    async fn test_save_memory_note_persists_immediately() {
        let temp = tempdir().unwrap();
        let store = JsonStateStore::new(temp.path());
        let pricing = PricingService::disabled();
        let mut state = UserState::default();
        let mut trips = Vec::new();

        let result = {
            let mut ctx = ToolContext {
                user_id: "alice",
                state: &mut state,
                store: &store,
                pricing: &pricing,
                max_results: 5,
                trips: &mut trips,
            };
            ToolInvocation::parse(
                "save_memory_note",
                &json!({"text": "  Prefers aisle seats  ", "keywords": ["Seat", " ", "flight", "a", "b"]}),
            )
            .unwrap()
            .execute(&mut ctx)
            .await
        };

        assert_eq!(result["success"], true);
        assert_eq!(state.session_memory.notes.len(), 1);
        assert_eq!(state.session_memory.notes[0].text, "Prefers aisle seats");
        assert_eq!(state.session_memory.notes[0].keywords, vec!["seat", "flight", "a"]);

        let persisted = store.read("alice").unwrap().unwrap();
        assert_eq!(persisted, state);
    }

    #[tokio::test]
    async fn test_blank_note_is_rejected_in_result() {
        let temp = tempdir().unwrap();
        let store = JsonStateStore::new(temp.path());
        let pricing = PricingService::disabled();
        let mut state = UserState::default();
        let mut trips = Vec::new();
        let mut ctx = ToolContext {
            user_id: "alice",
            state: &mut state,
            store: &store,
            pricing: &pricing,
            max_results: 5,
            trips: &mut trips,
        };

        let result = ToolInvocation::parse("save_memory_note", &json!({"text": "   "}))
            .unwrap()
            .execute(&mut ctx)
            .await;

        assert_eq!(result["success"], false);
        assert!(state.session_memory.notes.is_empty());
        assert!(store.read("alice").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_global_note() {
        let temp = tempdir().unwrap();
        let store = JsonStateStore::new(temp.path());
        let pricing = PricingService::disabled();
        let mut state = UserState::default();
        let mut trips = Vec::new();
        let mut ctx = ToolContext {
            user_id: "alice",
            state: &mut state,
            store: &store,
            pricing: &pricing,
            max_results: 5,
            trips: &mut trips,
        };

        let result = ToolInvocation::parse(
            "save_memory_note",
            &json!({"text": "Always vegetarian meals", "scope": "global"}),
        )
        .unwrap()
        .execute(&mut ctx)
        .await;

        assert_eq!(result["scope"], "global");
        assert!(state.session_memory.notes.is_empty());
        assert_eq!(state.global_memory.notes[0].text, "Always vegetarian meals");

        let err = ToolInvocation::parse("save_memory_note", &json!({"text": "x", "scope": "weekly"}))
            .unwrap_err();
        assert!(err.is_tool_error());
    }

    #[tokio::test]
    async fn test_search_without_credentials_reports_unavailable() {
        let temp = tempdir().unwrap();
        let store = JsonStateStore::new(temp.path());
        let pricing = PricingService::disabled();
        let mut state = UserState::default();
        let mut trips = Vec::new();
        let mut ctx = ToolContext {
            user_id: "alice",
            state: &mut state,
            store: &store,
            pricing: &pricing,
            max_results: 5,
            trips: &mut trips,
        };

        let result = ToolInvocation::parse(
            "search_hotels",
            &json!({"city_code": "PAR", "check_in_date": "2025-05-01", "check_out_date": "2025-05-03"}),
        )
        .unwrap()
        .execute(&mut ctx)
        .await;

        assert_eq!(result["success"], false);
        assert_eq!(result["available"], false);
        assert!(trips.is_empty());
    }
}
