use anyhow::Result;
use owo_colors::OwoColorize;
use relay_core::grid::shift_month;
use relay_core::grouping::group_by_day;
use relay_core::MonthGrid;

use crate::commands::Context;
use crate::render::{render_event, render_month, Render};

pub async fn run(ctx: &Context, course: &str, offset: i32) -> Result<()> {
    let session = ctx.open(course).await?;
    let course = session.course().await;
    let events = session.events().await;

    let today = ctx.now().date_naive();
    let grid = MonthGrid::new(shift_month(today, offset));
    let days = group_by_day(&events, &ctx.tz);

    println!("{}", course.render());
    println!();
    println!("{}", render_month(&grid, &days, today));

    let in_month: Vec<_> = days.iter().filter(|(day, _)| grid.in_month(**day)).collect();
    if in_month.is_empty() {
        println!();
        println!("{}", "No events this month".dimmed());
        return Ok(());
    }

    for (day, events) in in_month {
        println!();
        println!("{}", day.format("%a %b %-d").bold());
        for event in events {
            println!("  {}", render_event(event, &ctx.tz));
        }
    }

    Ok(())
}
