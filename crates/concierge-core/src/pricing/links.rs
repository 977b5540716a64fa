//! Carrier/brand tables and comparison-site search links.

use serde::Serialize;
use urlencoding::encode;

/// Carrier code, display name, booking site
const AIRLINES: &[(&str, &str, &str)] = &[
    ("UA", "United Airlines", "https://www.united.com"),
    ("AA", "American Airlines", "https://www.aa.com"),
    ("DL", "Delta Air Lines", "https://www.delta.com"),
    ("WN", "Southwest Airlines", "https://www.southwest.com"),
    ("B6", "JetBlue", "https://www.jetblue.com"),
    ("AS", "Alaska Airlines", "https://www.alaskaair.com"),
    ("NK", "Spirit Airlines", "https://www.spirit.com"),
    ("F9", "Frontier Airlines", "https://www.flyfrontier.com"),
    ("BA", "British Airways", "https://www.britishairways.com"),
    ("LH", "Lufthansa", "https://www.lufthansa.com"),
    ("AF", "Air France", "https://www.airfrance.com"),
    ("KL", "KLM", "https://www.klm.com"),
    ("EK", "Emirates", "https://www.emirates.com"),
    ("QR", "Qatar Airways", "https://www.qatarairways.com"),
    ("SQ", "Singapore Airlines", "https://www.singaporeair.com"),
    ("CX", "Cathay Pacific", "https://www.cathaypacific.com"),
    ("NH", "ANA", "https://www.ana.co.jp"),
    ("JL", "Japan Airlines", "https://www.jal.co.jp"),
    ("AC", "Air Canada", "https://www.aircanada.com"),
    ("QF", "Qantas", "https://www.qantas.com"),
];

const HOTEL_BRANDS: &[(&str, &str)] = &[
    ("marriott", "https://www.marriott.com"),
    ("hilton", "https://www.hilton.com"),
    ("hyatt", "https://www.hyatt.com"),
    ("ihg", "https://www.ihg.com"),
    ("wyndham", "https://www.wyndham.com"),
    ("bestwestern", "https://www.bestwestern.com"),
    ("accor", "https://www.accor.com"),
    ("radisson", "https://www.radissonhotels.com"),
    ("choice", "https://www.choicehotels.com"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirlineLink {
    pub name: String,
    pub url: String,
}

/// Name and booking site for a carrier code. Unknown carriers get a web search link.
pub fn airline_info(carrier_code: &str) -> AirlineLink {
    let code = carrier_code.to_uppercase();
    match AIRLINES.iter().find(|(c, _, _)| *c == code) {
        Some((_, name, url)) => AirlineLink {
            name: name.to_string(),
            url: url.to_string(),
        },
        None => AirlineLink {
            name: carrier_code.to_string(),
            url: format!(
                "https://www.google.com/search?q={}+airline+booking",
                encode(carrier_code)
            ),
        },
    }
}

/// Brand site when the hotel name contains a known brand, else a web search.
pub fn hotel_booking_link(hotel_name: &str) -> String {
    let lower = hotel_name.to_lowercase();
    HOTEL_BRANDS
        .iter()
        .find(|(brand, _)| lower.contains(brand))
        .map(|(_, url)| url.to_string())
        .unwrap_or_else(|| {
            format!(
                "https://www.google.com/search?q={}+book+hotel",
                encode(hotel_name)
            )
        })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightSearchLinks {
    pub google_flights: String,
    pub kayak: String,
    pub skyscanner: String,
}

pub fn flight_search_links(
    origin: &str,
    destination: &str,
    departure_date: &str,
    return_date: Option<&str>,
) -> FlightSearchLinks {
    let mut query = format!("flights from {} to {} on {}", origin, destination, departure_date);
    if let Some(ret) = return_date {
        query.push_str(&format!(" returning {}", ret));
    }
    let google_flights = format!(
        "https://www.google.com/travel/flights?q={}&curr=USD",
        encode(&query)
    );

    let kayak = match return_date {
        Some(ret) => format!(
            "https://www.kayak.com/flights/{}-{}/{}/{}",
            origin, destination, departure_date, ret
        ),
        None => format!(
            "https://www.kayak.com/flights/{}-{}/{}",
            origin, destination, departure_date
        ),
    };

    let origin_lc = origin.to_lowercase();
    let destination_lc = destination.to_lowercase();
    let skyscanner = match return_date {
        Some(ret) => format!(
            "https://www.skyscanner.com/transport/flights/{}/{}/{}/{}/",
            origin_lc,
            destination_lc,
            year_month(departure_date),
            year_month(ret)
        ),
        None => format!(
            "https://www.skyscanner.com/transport/flights/{}/{}/{}/",
            origin_lc,
            destination_lc,
            year_month(departure_date)
        ),
    };

    FlightSearchLinks {
        google_flights,
        kayak,
        skyscanner,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotelSearchLinks {
    pub google_hotels: String,
    pub booking_com: String,
    pub hotels_com: String,
}

pub fn hotel_search_links(city: &str, check_in: &str, check_out: &str, adults: u32) -> HotelSearchLinks {
    HotelSearchLinks {
        google_hotels: format!(
            "https://www.google.com/travel/hotels?q={}&dates={}_{}",
            encode(&format!("hotels in {}", city)),
            encode(check_in),
            encode(check_out)
        ),
        booking_com: format!(
            "https://www.booking.com/searchresults.html?ss={}&checkin={}&checkout={}&group_adults={}",
            encode(city),
            encode(check_in),
            encode(check_out),
            adults
        ),
        hotels_com: format!(
            "https://www.hotels.com/search.do?q-destination={}&q-check-in={}&q-check-out={}",
            encode(city),
            encode(check_in),
            encode(check_out)
        ),
    }
}

/// `2025-03-14` -> `202503`
fn year_month(date: &str) -> String {
    date.chars().filter(|c| *c != '-').take(6).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_airline() {
        assert_eq!(airline_info("ua").name, "United Airlines");
        assert_eq!(airline_info("UA").url, "https://www.united.com");

        let unknown = airline_info("ZZ");
        assert_eq!(unknown.name, "ZZ");
        assert!(unknown.url.contains("ZZ+airline+booking"));
    }

    #[test]
    fn test_hotel_brand_link() {
        assert_eq!(hotel_booking_link("HILTON PARIS OPERA"), "https://www.hilton.com");
        let fallback = hotel_booking_link("Le Petit Hotel");
        assert!(fallback.starts_with("https://www.google.com/search?q=Le%20Petit%20Hotel"));
    }

    #[test]
    fn test_flight_links_one_way_and_return() {
        let one_way = flight_search_links("SFO", "JFK", "2025-03-14", None);
        assert_eq!(one_way.kayak, "https://www.kayak.com/flights/SFO-JFK/2025-03-14");
        assert_eq!(
            one_way.skyscanner,
            "https://www.skyscanner.com/transport/flights/sfo/jfk/202503/"
        );
        assert!(one_way.google_flights.contains("flights%20from%20SFO%20to%20JFK"));

        let round = flight_search_links("SFO", "JFK", "2025-03-14", Some("2025-04-02"));
        assert_eq!(round.kayak, "https://www.kayak.com/flights/SFO-JFK/2025-03-14/2025-04-02");
        assert!(round.skyscanner.ends_with("/202503/202504/"));
        assert!(round.google_flights.contains("returning%202025-04-02"));
    }

    #[test]
    fn test_hotel_links() {
        let links = hotel_search_links("PAR", "2025-05-01", "2025-05-03", 2);
        assert!(links.booking_com.contains("ss=PAR"));
        assert!(links.booking_com.ends_with("group_adults=2"));
        assert!(links.google_hotels.contains("dates=2025-05-01_2025-05-03"));
        assert!(links.hotels_com.contains("q-destination=PAR"));
    }
}
