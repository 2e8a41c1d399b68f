use std::path::Path;

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use owo_colors::OwoColorize;
use relay_core::grouping::DayLabel;
use relay_core::ics::parse_calendar;

use crate::commands::Context;
use crate::render::Render;

pub fn run(ctx: &Context, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Could not read {}", file.display()))?;

    let mut events = parse_calendar(&content)?;
    events.sort_by_key(|e| e.start);

    if events.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    let today = ctx.now().date_naive();
    let mut current_date: Option<NaiveDate> = None;

    for event in &events {
        let start = event.start.with_timezone(&ctx.tz);
        let date = start.date_naive();

        if current_date != Some(date) {
            if current_date.is_some() {
                println!();
            }
            println!("{}", DayLabel::for_day(date, today).render());
            current_date = Some(date);
        }

        let time = match event.end {
            Some(end) => format!("{}-{}", start.format("%H:%M"), end.with_timezone(&ctx.tz).format("%H:%M")),
            None => format!("{:<11}", start.format("%H:%M").to_string()),
        };
        let mut line = format!("  {} {}", time, event.summary);
        if let Some(location) = &event.location {
            line.push_str(&format!(" {}", format!("@ {}", location).dimmed()));
        }
        println!("{}", line);

        if let Some(description) = &event.description {
            for desc_line in description.lines() {
                println!("    {}", desc_line.dimmed());
            }
        }
    }

    Ok(())
}
