use anyhow::Result;
use chrono::NaiveDate;
use owo_colors::OwoColorize;
use relay_core::grouping::event_day;

use crate::commands::Context;
use crate::render::render_event;

pub async fn run(ctx: &Context, course: &str, json: bool) -> Result<()> {
    let session = ctx.open(course).await?;
    let events = session.events().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    // Events are ordered by start, so a new date starts a new section
    let mut current_date: Option<NaiveDate> = None;

    for event in &events {
        let date = event_day(event, &ctx.tz);

        if current_date != Some(date) {
            if current_date.is_some() {
                println!();
            }
            println!("{}", date.format("%a %b %-d %Y").bold());
            current_date = Some(date);
        }

        println!("  {}", render_event(event, &ctx.tz));
    }

    Ok(())
}
