//! Print free time across every calendar of the signed-in user.
//!
//! ```text
//! GAPFINDER_ACCESS_TOKEN=... cargo run -p gapfinder-infra --example find_free_time -- \
//!     2024-06-10 2024-06-14 [2024-06-11@09:00-12:00 ...]
//! ```
//!
//! Arguments after the date range are preferred windows. Without them, each
//! date is searched over the configured core hours.

use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{NaiveDate, NaiveTime};
use gapfinder_core::{AvailabilityRules, AvailabilityService};
use gapfinder_domain::{DateRange, PreferredWindow};
use gapfinder_infra::{
    config, init_tracing, GoogleCalendarClient, LogFormat, RequestLayer, StaticTokenProvider,
};

fn parse_date(value: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").with_context(|| format!("invalid date {value}"))
}

fn parse_time(value: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").with_context(|| format!("invalid time {value}"))
}

/// `YYYY-MM-DD@HH:MM-HH:MM`
fn parse_window(value: &str) -> anyhow::Result<PreferredWindow> {
    let Some((date, hours)) = value.split_once('@') else {
        bail!("expected DATE@START-END, got {value}");
    };
    let Some((start, end)) = hours.split_once('-') else {
        bail!("expected START-END hours, got {hours}");
    };
    Ok(PreferredWindow::new(parse_date(date)?, parse_time(start)?, parse_time(end)?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info", LogFormat::Pretty);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(first) = args.first() else {
        bail!("usage: find_free_time START [END] [DATE@HH:MM-HH:MM ...]");
    };
    let start = parse_date(first)?;
    let end = match args.get(1) {
        Some(value) if !value.contains('@') => parse_date(value)?,
        _ => start,
    };
    let preferred = args
        .iter()
        .skip(1)
        .filter(|value| value.contains('@'))
        .map(|value| parse_window(value))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let config = config::load().context("failed to load configuration")?;
    let tokens = StaticTokenProvider::from_env("GAPFINDER_ACCESS_TOKEN")?;
    let layer = Arc::new(RequestLayer::from_config(&config)?);
    let client = GoogleCalendarClient::new(layer.clone(), Arc::new(tokens), &config.api)?;
    let service = AvailabilityService::new(
        Arc::new(client),
        AvailabilityRules::from(&config.availability),
    );

    let report = service.find_free_time(DateRange::new(start, end)?, &preferred).await?;

    for day in &report.days {
        println!("{} ({} min free)", day.date, day.total_minutes);
        for slot in &day.slots {
            println!("  {} - {}", slot.start_time.format("%H:%M"), slot.end_time.format("%H:%M"));
        }
    }
    for failure in &report.failed_calendars {
        eprintln!("skipped {}: {}", failure.calendar_id, failure.error);
    }

    tracing::info!(cache = %layer.cache_stats(), "response cache");
    Ok(())
}
