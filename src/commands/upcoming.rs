use anyhow::Result;
use owo_colors::OwoColorize;
use relay_core::grouping::timeline;

use crate::commands::Context;
use crate::render::{render_event, Render};

pub async fn run(ctx: &Context, course: &str) -> Result<()> {
    let session = ctx.open(course).await?;
    let events = session.events().await;
    let groups = timeline(&events, &ctx.now());

    if groups.is_empty() {
        println!("{}", "No upcoming events".dimmed());
        return Ok(());
    }

    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", group.label.render());
        for event in &group.events {
            println!("  {}", render_event(event, &ctx.tz));
        }
    }

    Ok(())
}
