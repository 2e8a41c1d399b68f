use anyhow::Result;
use owo_colors::OwoColorize;
use relay_core::grouping::event_day;
use relay_core::{EventDraft, EventId};

use crate::commands::{resolve_event, Context, EventArgs};
use crate::render::render_event;

pub async fn add(
    ctx: &Context,
    course: &str,
    day: String,
    title: String,
    start: String,
    args: EventArgs,
) -> Result<()> {
    let user = ctx.signed_in()?;
    let session = ctx.open(course).await?;

    let draft = EventDraft {
        title,
        description: args.description,
        location: args.location,
        kind: args.kind,
        colour: args.colour,
        start_time: start,
        end_time: args.end,
    };

    let id = session
        .save_event(Some(user), &draft, &day, None, &ctx.tz)
        .await?;

    print_saved(ctx, &session.events().await, &id, "Added");
    Ok(())
}

pub async fn edit(
    ctx: &Context,
    course: &str,
    event: &str,
    day: Option<String>,
    title: Option<String>,
    start: Option<String>,
    args: EventArgs,
) -> Result<()> {
    let user = ctx.signed_in()?;
    let session = ctx.open(course).await?;
    let events = session.events().await;
    let existing = resolve_event(&events, event)?;

    let mut draft = EventDraft::from_event(existing, &ctx.tz);
    if let Some(title) = title {
        draft.title = title;
    }
    if let Some(start) = start {
        draft.start_time = start;
    }
    // An empty value clears the field
    if let Some(end) = args.end {
        draft.end_time = Some(end);
    }
    if let Some(location) = args.location {
        draft.location = Some(location);
    }
    if let Some(kind) = args.kind {
        draft.kind = Some(kind);
    }
    if let Some(description) = args.description {
        draft.description = Some(description);
    }
    if args.colour.is_some() {
        draft.colour = args.colour;
    }

    let day = day.unwrap_or_else(|| event_day(existing, &ctx.tz).format("%Y-%m-%d").to_string());

    let id = session
        .save_event(Some(user), &draft, &day, Some(&existing.id), &ctx.tz)
        .await?;

    print_saved(ctx, &session.events().await, &id, "Updated");
    Ok(())
}

pub async fn delete(ctx: &Context, course: &str, event: &str) -> Result<()> {
    let user = ctx.signed_in()?;
    let session = ctx.open(course).await?;
    let events = session.events().await;
    let existing = resolve_event(&events, event)?;

    session.delete_event(Some(user), &existing.id).await?;

    println!("Deleted {}", existing.title);
    println!("{}", "Vouches for this course were reset".dimmed());
    Ok(())
}

fn print_saved(ctx: &Context, events: &[relay_core::Event], id: &EventId, verb: &str) {
    if let Some(event) = events.iter().find(|e| &e.id == id) {
        let day = event_day(event, &ctx.tz);
        println!("{} on {}", verb, day.format("%a %b %-d %Y").bold());
        println!("  {}", render_event(event, &ctx.tz));
    }
    println!("{}", "Vouches for this course were reset".dimmed());
}
