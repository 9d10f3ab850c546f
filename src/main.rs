//! Interactive front-end: populates the store with simulated sensor data for
//! a user-chosen date range, serves point lookups by calendar date, then
//! prints the full ascending table and tears the store down.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use climatree::{sim, SensorTree};

#[derive(Parser)]
#[command(
    name = "climatree",
    about = "Populate an ordered sensor store with simulated readings and browse it by date"
)]
struct Args {
    /// Seed for the simulated sensor; drawn from entropy when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Calendar year the generated readings fall in.
    #[arg(long, default_value_t = 2023)]
    year: i32,
}

/// Midnight UTC of the given calendar date, as a store timestamp.
fn date_timestamp(year: i32, month: u32, day: u32) -> Option<i64> {
    let midnight = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
    Some(midnight.and_utc().timestamp())
}

/// Parses a `mm/dd/yyyy` search date into a store timestamp.
fn parse_search_date(input: &str) -> Option<i64> {
    let date = NaiveDate::parse_from_str(input.trim(), "%m/%d/%Y").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp())
}

/// Renders a store timestamp as `DD-MMM-YYYY`.
fn format_date(timestamp: i64) -> String {
    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(dt) => dt.format("%d-%b-%Y").to_string(),
        None => format!("<timestamp {timestamp}>"),
    }
}

/// Parses the `month,day,days` start line and checks the documented ranges.
fn parse_start_input(line: &str) -> Result<(u32, u32, u32)> {
    let mut parts = line.trim().split(',').map(str::trim);
    let (Some(m), Some(d), Some(n), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        bail!("expected exactly three comma-separated values: month,day,days");
    };
    let month: u32 = m.parse().context("month is not a number")?;
    let day: u32 = d.parse().context("day is not a number")?;
    let days: u32 = n.parse().context("day count is not a number")?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) || !(1..=sim::MAX_DAYS).contains(&days)
    {
        bail!(
            "month must be 1-12, day 1-31, and days 1-{}",
            sim::MAX_DAYS
        );
    }
    Ok((month, day, days))
}

fn prompt(text: &str) -> Result<()> {
    print!("{text}");
    io::stdout().flush().context("failed to flush stdout")?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    println!("Ordered store population with simulated sensor data");
    match std::env::current_dir() {
        Ok(cwd) => println!("Current working directory: {}", cwd.display()),
        Err(_) => println!("Could not display the path"),
    }
    println!();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    prompt("Enter the starting month (1 to 12), day (1 to 31), and number of days (1 to 100): ")?;
    let line = lines.next().context("no start date provided")??;
    let (month, day, days) = parse_start_input(&line)?;
    println!(
        "User requested {days} data items starting at {month:2}/{day:2}/{:4}",
        args.year
    );

    let base_timestamp = date_timestamp(args.year, month, day)
        .with_context(|| format!("invalid calendar date {month}/{day}/{}", args.year))?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let readings = sim::generate_readings(&mut rng, base_timestamp, days)?;

    let mut tree = SensorTree::new();
    for reading in &readings {
        tree.insert(*reading)?;
        info!(timestamp = reading.timestamp, "added reading to store");
    }
    println!("Store populated with {} records.", tree.len());

    // Search loop: one date per line, empty line ends it.
    loop {
        prompt("\nEnter a search date (mm/dd/yyyy): ")?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        if line.trim().is_empty() {
            break;
        }

        let Some(timestamp) = parse_search_date(&line) else {
            println!("ERROR: Invalid date format. Please use mm/dd/yyyy.");
            continue;
        };
        info!(timestamp, "searching store");

        match tree.find(timestamp) {
            Some(r) => println!(
                "FOUND-> {}\t{:5.1}C({:08X}) {:5.1}%({:08X})",
                format_date(r.timestamp),
                f64::from(r.temperature),
                r.temperature,
                f64::from(r.humidity),
                r.humidity,
            ),
            None => println!("Did not find data for {}", format_date(timestamp)),
        }
    }

    println!("\nTemperature/Humidity table:");
    println!("---------------------------");
    println!("{:<20} {:<10} {:<10}", "Date", "Temp (C)", "Humid (%)");
    tree.for_each_in_order(|r| {
        println!(
            "{:<20} {:<10} {:<10}",
            format_date(r.timestamp),
            r.temperature,
            r.humidity
        );
    });

    tree.clear();
    println!("\nStore cleared and application terminated.");
    Ok(())
}
