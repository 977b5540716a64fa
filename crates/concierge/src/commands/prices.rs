//! Direct price lookups, without the model.

use anyhow::Result;
use colored::Colorize;
use concierge_core::Config;
use concierge_core::pricing::{
    FlightQuery, FlightSearch, HotelQuery, HotelSearch, LocationSearch, Lookup, PricingService,
};
use serde::Serialize;

use crate::cli::{PricesAction, PricesCommand};
use crate::output::spinner;

/// Execute prices command.
pub async fn execute(cmd: PricesCommand, config: &Config) -> Result<()> {
    let pricing = PricingService::from_config(&config.pricing);
    let json = cmd.json;

    match cmd.action {
        PricesAction::Flights {
            origin,
            destination,
            date,
            return_date,
            adults,
            cabin,
        } => {
            let mut query = FlightQuery::new(&origin, &destination, &date);
            query.return_date = return_date;
            query.adults = adults;
            query.cabin_class = cabin.to_uppercase();
            query.max_results = config.pricing.max_results;

            let pb = spinner("Searching flights...");
            let lookup = pricing.search_flights(&query).await;
            pb.finish_and_clear();
            report(&lookup, json, print_flights)
        }

        PricesAction::Hotels {
            city,
            check_in,
            check_out,
            adults,
            rooms,
        } => {
            let mut query = HotelQuery::new(&city, &check_in, &check_out);
            query.adults = adults;
            query.rooms = rooms;
            query.max_results = config.pricing.max_results as usize;

            let pb = spinner("Searching hotels...");
            let lookup = pricing.search_hotels(&query).await;
            pb.finish_and_clear();
            report(&lookup, json, print_hotels)
        }

        PricesAction::Airport { city } => {
            let lookup = pricing.lookup_airport(&city).await;
            report(&lookup, json, print_locations)
        }
    }
}

fn report<T: Serialize>(lookup: &Lookup<T>, json: bool, print: fn(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&lookup.to_tool_result())?);
        return Ok(());
    }

    match lookup {
        Lookup::Available(value) => print(value),
        Lookup::Unavailable { reason, setup_url } => {
            println!("{} {}", "⚠".yellow(), reason);
            println!("  Get credentials at {}", setup_url.cyan());
        }
        Lookup::Failed { error } => println!("{} {}", "✗".red(), error),
    }
    Ok(())
}

fn print_flights(search: &FlightSearch) {
    println!("{} {} flight offers", "✓".green(), search.count);
    for (i, offer) in search.flights.iter().enumerate() {
        println!();
        println!(
            "  {}. {} {}",
            i + 1,
            offer.price.total.bold(),
            offer.price.currency
        );
        for itinerary in &offer.itineraries {
            for seg in &itinerary.segments {
                println!(
                    "     {}{} {} {} → {} {} ({})",
                    seg.carrier,
                    seg.flight_number,
                    seg.departure.airport,
                    seg.departure.time,
                    seg.arrival.airport,
                    seg.arrival.time,
                    seg.carrier_name.dimmed()
                );
            }
        }
    }
    println!();
    println!("  Compare: {}", search.search_links.google_flights.cyan());
    println!("           {}", search.search_links.kayak.cyan());
    println!("           {}", search.search_links.skyscanner.cyan());
    println!("  {}", search.citation.dimmed());
}

fn print_hotels(search: &HotelSearch) {
    if let Some(message) = &search.message {
        println!("{} {}", "⚠".yellow(), message);
    } else {
        println!("{} {} hotel offers", "✓".green(), search.count);
    }
    for (i, hotel) in search.hotels.iter().enumerate() {
        println!();
        println!(
            "  {}. {} {} {}",
            i + 1,
            hotel.name.bold(),
            hotel.price.total,
            hotel.price.currency
        );
        println!("     {} · {}", hotel.room_type, hotel.cancellation.dimmed());
        println!("     {}", hotel.booking_link.cyan());
    }
    println!();
    println!("  Compare: {}", search.search_links.google_hotels.cyan());
    println!("           {}", search.search_links.booking_com.cyan());
    println!("           {}", search.search_links.hotels_com.cyan());
    println!("  {}", search.citation.dimmed());
}

fn print_locations(search: &LocationSearch) {
    if search.locations.is_empty() {
        println!("{} No matching airports", "⚠".yellow());
        return;
    }
    for loc in &search.locations {
        println!(
            "  {} {} ({}, {}) {}",
            loc.iata_code.bold(),
            loc.name,
            loc.city,
            loc.country,
            loc.kind.to_lowercase().dimmed()
        );
    }
}
