//! Recorded trip searches.

use anyhow::Result;
use colored::Colorize;
use concierge_core::Config;

use super::load_state;

pub fn execute(limit: usize, config: &Config, user: &str) -> Result<()> {
    let state = load_state(&config.state_store(), user)?;
    let trips = &state.trip_history.trips;

    if trips.is_empty() {
        println!("{} No trips recorded", "⚠".yellow());
        return Ok(());
    }

    let start = trips.len().saturating_sub(limit);
    println!("{} {} of {} trips:", "✓".green(), trips.len() - start, trips.len());
    for trip in &trips[start..] {
        let route = match (&trip.from_city, &trip.to_city) {
            (Some(from), Some(to)) => format!("{} → {}", from, to),
            (None, Some(to)) => to.clone(),
            (Some(from), None) => from.clone(),
            (None, None) => "-".to_string(),
        };
        let dates = match (&trip.check_in_date, &trip.check_out_date) {
            (Some(a), Some(b)) => format!("{} – {}", a, b),
            (Some(a), None) => a.clone(),
            _ => String::new(),
        };
        println!(
            "  {:<14} {:<16} {:<24} {}",
            trip.kind.as_deref().unwrap_or("trip").cyan(),
            route,
            dates,
            trip.party_size.map(|n| format!("{} pax", n)).unwrap_or_default().dimmed()
        );
    }
    Ok(())
}
