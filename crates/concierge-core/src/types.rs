//! Shared types for concierge-core.
//!
//! The serialized shape of [`UserState`] is the on-disk document format:
//! `{profile, global_memory: {notes}, session_memory: {notes}, trip_history: {trips}}`.
//! Every field defaults when missing so older documents keep loading.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Profile
// ─────────────────────────────────────────────────────────────────────────────

/// Traveller profile. Only changed through explicit user edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    #[serde(rename = "global_customer_id")]
    pub customer_id: String,
    pub name: String,
    pub age: String,
    pub home_city: String,
    pub currency: String,
    pub passport_expiry_date: String,
    pub frequent_flyer_programs: Vec<LoyaltyProgram>,
    pub hotel_loyalty_programs: Vec<LoyaltyProgram>,
    pub flight_preferences: FlightPreferences,
    pub hotel_preferences: HotelPreferences,
    pub car_preferences: CarPreferences,
    pub tone: String,
    pub active_visas: Vec<String>,
    pub insurance_coverage_profile: BTreeMap<String, String>,
    /// Keys this version does not model; kept so saves do not drop them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoyaltyProgram {
    pub program: String,
    pub member_id: String,
    pub status: String,
    pub active: bool,
}

impl LoyaltyProgram {
    pub fn new(
        program: impl Into<String>,
        member_id: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            member_id: member_id.into(),
            status: status.into(),
            active: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightPreferences {
    pub home_airport: String,
    pub seat_preference: String,
    /// morning, afternoon or evening
    pub departure_time: String,
    /// economy, premium_economy, business or first
    pub cabin_class: String,
    pub max_layovers: Option<u32>,
    pub avoid_red_eye: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotelPreferences {
    pub preferred_brands: Vec<String>,
    pub min_stars: Option<u8>,
    pub on_airport: bool,
    pub prefer_high_floor: bool,
    pub bed_type: String,
    pub smoking: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarPreferences {
    /// compact, midsize, full-size, suv or luxury
    pub preferred_size: String,
    pub on_airport: bool,
    pub preferred_companies: Vec<String>,
}

/// Which loyalty list a program entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramKind {
    FrequentFlyer,
    Hotel,
}

impl ProgramKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramKind::FrequentFlyer => "frequent_flyer",
            ProgramKind::Hotel => "hotel",
        }
    }
}

impl std::str::FromStr for ProgramKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "frequent_flyer" | "flyer" | "airline" | "ff" => Ok(ProgramKind::FrequentFlyer),
            "hotel" | "hotel_loyalty" => Ok(ProgramKind::Hotel),
            other => Err(format!(
                "Invalid program kind: {}. Use: frequent_flyer or hotel",
                other
            )),
        }
    }
}

impl Profile {
    pub fn programs(&self, kind: ProgramKind) -> &[LoyaltyProgram] {
        match kind {
            ProgramKind::FrequentFlyer => &self.frequent_flyer_programs,
            ProgramKind::Hotel => &self.hotel_loyalty_programs,
        }
    }

    pub fn programs_mut(&mut self, kind: ProgramKind) -> &mut Vec<LoyaltyProgram> {
        match kind {
            ProgramKind::FrequentFlyer => &mut self.frequent_flyer_programs,
            ProgramKind::Hotel => &mut self.hotel_loyalty_programs,
        }
    }

    /// Remove a program by position. Returns the removed entry.
    pub fn remove_program(&mut self, kind: ProgramKind, index: usize) -> Option<LoyaltyProgram> {
        let programs = self.programs_mut(kind);
        if index < programs.len() {
            Some(programs.remove(index))
        } else {
            None
        }
    }

    /// Flip the active flag of a program. Returns the new flag.
    pub fn toggle_program(&mut self, kind: ProgramKind, index: usize) -> Option<bool> {
        let program = self.programs_mut(kind).get_mut(index)?;
        program.active = !program.active;
        Some(program.active)
    }

    /// Set one field from its text form.
    ///
    /// Nested fields use a section prefix (`flight.`, `hotel.`, `car.`,
    /// `insurance.`). Lists are comma separated. An empty value clears the
    /// field.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match field {
            "customer_id" | "global_customer_id" => self.customer_id = value.to_string(),
            "name" => self.name = value.to_string(),
            "age" => self.age = value.to_string(),
            "home_city" => self.home_city = value.to_string(),
            "currency" => self.currency = value.to_uppercase(),
            "passport_expiry_date" => self.passport_expiry_date = value.to_string(),
            "tone" => self.tone = value.to_string(),
            "active_visas" => self.active_visas = parse_list(value),

            "flight.home_airport" => self.flight_preferences.home_airport = value.to_uppercase(),
            "flight.seat_preference" => self.flight_preferences.seat_preference = value.to_string(),
            "flight.departure_time" => self.flight_preferences.departure_time = value.to_string(),
            "flight.cabin_class" => self.flight_preferences.cabin_class = value.to_lowercase(),
            "flight.max_layovers" => self.flight_preferences.max_layovers = parse_opt(field, value)?,
            "flight.avoid_red_eye" => self.flight_preferences.avoid_red_eye = parse_bool(field, value)?,

            "hotel.preferred_brands" => self.hotel_preferences.preferred_brands = parse_list(value),
            "hotel.min_stars" => self.hotel_preferences.min_stars = parse_opt(field, value)?,
            "hotel.on_airport" => self.hotel_preferences.on_airport = parse_bool(field, value)?,
            "hotel.prefer_high_floor" => {
                self.hotel_preferences.prefer_high_floor = parse_bool(field, value)?
            }
            "hotel.bed_type" => self.hotel_preferences.bed_type = value.to_string(),
            "hotel.smoking" => self.hotel_preferences.smoking = parse_bool(field, value)?,

            "car.preferred_size" => self.car_preferences.preferred_size = value.to_string(),
            "car.on_airport" => self.car_preferences.on_airport = parse_bool(field, value)?,
            "car.preferred_companies" => self.car_preferences.preferred_companies = parse_list(value),

            other => match other.strip_prefix("insurance.") {
                Some(key) if !key.is_empty() => {
                    if value.is_empty() {
                        self.insurance_coverage_profile.remove(key);
                    } else {
                        self.insurance_coverage_profile
                            .insert(key.to_string(), value.to_string());
                    }
                }
                _ => return Err(Error::validation(format!("Unknown profile field: {}", other))),
            },
        }
        Ok(())
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(field: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Ok(true),
        "false" | "no" | "n" | "0" | "off" | "" => Ok(false),
        _ => Err(Error::validation(format!("{} expects yes or no, got '{}'", field, value))),
    }
}

fn parse_opt<T: std::str::FromStr>(field: &str, value: &str) -> Result<Option<T>> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| Error::validation(format!("{} expects a number, got '{}'", field, value)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory
// ─────────────────────────────────────────────────────────────────────────────

/// A single preference note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryNote {
    pub text: String,
    /// ISO date, `YYYY-MM-DD`
    pub last_update_date: String,
    pub keywords: Vec<String>,
}

impl MemoryNote {
    pub fn new(
        text: impl Into<String>,
        last_update_date: impl Into<String>,
        keywords: Vec<String>,
    ) -> Self {
        Self {
            text: text.into(),
            last_update_date: last_update_date.into(),
            keywords,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteList {
    pub notes: Vec<MemoryNote>,
}

/// Memory tier a note is written to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryScope {
    /// Trip-scoped; lives until consolidated or cleared
    #[default]
    Session,
    /// Durable default; lives until deleted
    Global,
}

impl MemoryScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryScope::Session => "session",
            MemoryScope::Global => "global",
        }
    }
}

impl std::fmt::Display for MemoryScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "session" | "s" => Ok(MemoryScope::Session),
            "global" | "g" => Ok(MemoryScope::Global),
            other => Err(format!("Invalid scope: {}. Use: session or global", other)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Trip History
// ─────────────────────────────────────────────────────────────────────────────

/// Append-only record of a past search or booking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripRecord {
    /// "flight_search", "hotel_search", "booking", ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripHistory {
    pub trips: Vec<TripRecord>,
}

// ─────────────────────────────────────────────────────────────────────────────
// User State
// ─────────────────────────────────────────────────────────────────────────────

/// Everything persisted for one user. One document per user id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserState {
    pub profile: Profile,
    pub global_memory: NoteList,
    pub session_memory: NoteList,
    pub trip_history: TripHistory,
}

impl UserState {
    pub fn notes(&self, scope: MemoryScope) -> &[MemoryNote] {
        match scope {
            MemoryScope::Session => &self.session_memory.notes,
            MemoryScope::Global => &self.global_memory.notes,
        }
    }

    pub fn notes_mut(&mut self, scope: MemoryScope) -> &mut Vec<MemoryNote> {
        match scope {
            MemoryScope::Session => &mut self.session_memory.notes,
            MemoryScope::Global => &mut self.global_memory.notes,
        }
    }

    /// Append a trip record. History is never rewritten.
    pub fn record_trip(&mut self, trip: TripRecord) {
        self.trip_history.trips.push(trip);
    }

    /// Sample traveller used to seed new accounts when enabled in config.
    pub fn demo() -> Self {
        let program = |name: &str, id: &str, status: &str, active: bool| LoyaltyProgram {
            active,
            ..LoyaltyProgram::new(name, id, status)
        };
        let note = |text: &str, date: &str, keywords: &[&str]| {
            MemoryNote::new(text, date, keywords.iter().map(|k| k.to_string()).collect())
        };

        let mut insurance = BTreeMap::new();
        insurance.insert("car_rental".to_string(), "primary_cdw_included".to_string());
        insurance.insert("travel_medical".to_string(), "covered".to_string());

        let trip_details = serde_json::json!({
            "from_country": "Turkey",
            "to_country": "France",
            "trip_purpose": "leisure",
            "flight": {
                "airline": "United",
                "airline_status_at_booking": "United Gold",
                "cabin_class": "economy_plus",
                "seat_selected": "aisle",
                "seat_location": "front",
                "layovers": 1,
                "baggage": {"checked_bags": 0, "carry_ons": 1},
                "special_requests": ["vegetarian_meal"]
            },
            "hotel": {
                "brand": "Hilton",
                "property_name": "Hilton Paris Opera",
                "neighborhood": "city_center",
                "bed_type": "king",
                "smoking": "non_smoking",
                "high_floor": true,
                "early_check_in": false,
                "late_check_out": true
            }
        });
        let extra = match trip_details {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Self {
            profile: Profile {
                customer_id: "crm_12345".to_string(),
                name: "John Doe".to_string(),
                age: "31".to_string(),
                home_city: "San Francisco".to_string(),
                currency: "USD".to_string(),
                passport_expiry_date: "2029-06-12".to_string(),
                frequent_flyer_programs: vec![
                    program("United MileagePlus", "AB123456", "Gold", true),
                    program("Delta SkyMiles", "CD789012", "Silver", false),
                    program("American AAdvantage", "EF345678", "Platinum", false),
                ],
                hotel_loyalty_programs: vec![
                    program("Marriott Bonvoy", "MR998877", "Titanium", true),
                    program("Hilton Honors", "HH445566", "Gold", false),
                    program("Hyatt", "HY112233", "Explorist", false),
                ],
                flight_preferences: FlightPreferences {
                    home_airport: "SFO".to_string(),
                    seat_preference: "aisle".to_string(),
                    departure_time: "morning".to_string(),
                    cabin_class: "economy".to_string(),
                    max_layovers: Some(1),
                    avoid_red_eye: true,
                },
                hotel_preferences: HotelPreferences {
                    preferred_brands: vec!["Marriott".to_string(), "Hilton".to_string()],
                    min_stars: Some(4),
                    on_airport: false,
                    prefer_high_floor: true,
                    bed_type: "king".to_string(),
                    smoking: false,
                },
                car_preferences: CarPreferences {
                    preferred_size: "midsize".to_string(),
                    on_airport: true,
                    preferred_companies: vec![],
                },
                tone: "concise and friendly".to_string(),
                active_visas: vec!["Schengen".to_string(), "US".to_string()],
                insurance_coverage_profile: insurance,
                extra: Map::new(),
            },
            global_memory: NoteList {
                notes: vec![
                    note(
                        "For trips shorter than a week, user generally prefers not to check bags.",
                        "2025-04-05",
                        &["baggage", "short_trip"],
                    ),
                    note("User usually prefers aisle seats.", "2024-06-25", &["seat_preference"]),
                    note(
                        "User generally likes central, walkable city-center neighborhoods.",
                        "2024-02-11",
                        &["neighborhood"],
                    ),
                    note(
                        "User generally likes to compare options side-by-side",
                        "2023-02-17",
                        &["pricing"],
                    ),
                    note("User prefers high floors", "2023-02-11", &["room"]),
                ],
            },
            session_memory: NoteList::default(),
            trip_history: TripHistory {
                trips: vec![TripRecord {
                    kind: Some("booking".to_string()),
                    from_city: Some("Istanbul".to_string()),
                    to_city: Some("Paris".to_string()),
                    check_in_date: Some("2025-05-01".to_string()),
                    check_out_date: Some("2025-05-03".to_string()),
                    party_size: Some(1),
                    recorded_at: None,
                    extra,
                }],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_field() {
        let mut profile = Profile::default();
        profile.set_field("name", "  Jane Roe ").unwrap();
        profile.set_field("flight.home_airport", "sfo").unwrap();
        profile.set_field("flight.max_layovers", "1").unwrap();
        profile.set_field("hotel.on_airport", "yes").unwrap();
        profile.set_field("active_visas", "Schengen, US,").unwrap();
        profile.set_field("insurance.travel", "basic").unwrap();

        assert_eq!(profile.name, "Jane Roe");
        assert_eq!(profile.flight_preferences.home_airport, "SFO");
        assert_eq!(profile.flight_preferences.max_layovers, Some(1));
        assert!(profile.hotel_preferences.on_airport);
        assert_eq!(profile.active_visas, vec!["Schengen", "US"]);
        assert_eq!(profile.insurance_coverage_profile["travel"], "basic");

        profile.set_field("flight.max_layovers", "").unwrap();
        profile.set_field("insurance.travel", "").unwrap();
        assert_eq!(profile.flight_preferences.max_layovers, None);
        assert!(profile.insurance_coverage_profile.is_empty());
    }

    #[test]
    fn test_set_field_rejects_bad_input() {
        let mut profile = Profile::default();
        assert!(matches!(profile.set_field("favorite_color", "blue"), Err(Error::Validation(_))));
        assert!(profile.set_field("hotel.min_stars", "five").is_err());
        assert!(profile.set_field("car.on_airport", "maybe").is_err());
        assert!(profile.set_field("insurance.", "x").is_err());
    }

    #[test]
    fn test_default_state_serializes_to_document_shape() {
        let value = serde_json::to_value(UserState::default()).unwrap();
        assert_eq!(value["global_memory"]["notes"], serde_json::json!([]));
        assert_eq!(value["session_memory"]["notes"], serde_json::json!([]));
        assert_eq!(value["trip_history"]["trips"], serde_json::json!([]));
        assert!(value["profile"].is_object());
    }

    #[test]
    fn test_missing_keys_default() {
        let state: UserState = serde_json::from_str(r#"{"profile": {"name": "Ada"}}"#).unwrap();
        assert_eq!(state.profile.name, "Ada");
        assert!(state.global_memory.notes.is_empty());
        assert!(state.session_memory.notes.is_empty());
        assert!(state.trip_history.trips.is_empty());
    }

    #[test]
    fn test_unknown_profile_keys_are_kept() {
        let doc = r#"{"profile": {"name": "Ada", "meal": "vegetarian"}}"#;
        let state: UserState = serde_json::from_str(doc).unwrap();
        assert_eq!(state.profile.extra["meal"], "vegetarian");

        let back = serde_json::to_value(&state).unwrap();
        assert_eq!(back["profile"]["meal"], "vegetarian");
    }

    #[test]
    fn test_customer_id_uses_document_key() {
        let mut profile = Profile::default();
        profile.customer_id = "crm_1".to_string();
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["global_customer_id"], "crm_1");
    }

    #[test]
    fn test_trip_record_keeps_free_form_fields() {
        let doc = r#"{"from_city": "Rome", "hotel": {"brand": "Hyatt"}}"#;
        let trip: TripRecord = serde_json::from_str(doc).unwrap();
        assert_eq!(trip.from_city.as_deref(), Some("Rome"));
        assert_eq!(trip.extra["hotel"]["brand"], "Hyatt");
    }

    #[test]
    fn test_program_toggle_and_remove() {
        let mut profile = UserState::demo().profile;

        assert_eq!(profile.toggle_program(ProgramKind::Hotel, 1), Some(true));
        assert!(profile.hotel_loyalty_programs[1].active);
        assert_eq!(profile.toggle_program(ProgramKind::Hotel, 99), None);

        let removed = profile.remove_program(ProgramKind::FrequentFlyer, 0).unwrap();
        assert_eq!(removed.program, "United MileagePlus");
        assert_eq!(profile.frequent_flyer_programs.len(), 2);
        assert!(profile.remove_program(ProgramKind::FrequentFlyer, 5).is_none());
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("session".parse::<MemoryScope>().unwrap(), MemoryScope::Session);
        assert_eq!("g".parse::<MemoryScope>().unwrap(), MemoryScope::Global);
        assert!("forever".parse::<MemoryScope>().is_err());
        assert_eq!(MemoryScope::default(), MemoryScope::Session);
    }

    #[test]
    fn test_demo_state() {
        let state = UserState::demo();
        assert_eq!(state.profile.name, "John Doe");
        assert_eq!(state.global_memory.notes.len(), 5);
        assert!(state.session_memory.notes.is_empty());
        assert_eq!(state.trip_history.trips.len(), 1);
        assert_eq!(state.profile.flight_preferences.seat_preference, "aisle");
    }
}
