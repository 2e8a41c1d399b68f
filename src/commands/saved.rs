use anyhow::Result;
use owo_colors::OwoColorize;
use relay_core::session::saved_courses;

use crate::commands::Context;
use crate::render::Render;

pub async fn save(ctx: &Context, course: &str) -> Result<()> {
    let user = ctx.signed_in()?;
    let session = ctx.open(course).await?;

    session.save_to_profile(Some(user)).await?;
    println!("Saved {}", session.course().await.render());
    Ok(())
}

pub async fn unsave(ctx: &Context, course: &str) -> Result<()> {
    let user = ctx.signed_in()?;
    let session = ctx.open(course).await?;

    session.remove_from_profile(Some(user)).await?;
    println!("Removed {}", session.course().await.name());
    Ok(())
}

pub async fn list(ctx: &Context, filter: &str) -> Result<()> {
    let user = ctx.signed_in()?;
    let courses = saved_courses(ctx.store.as_ref(), Some(user), filter).await?;

    if courses.is_empty() {
        if filter.is_empty() {
            println!("{}", "No saved courses yet. Save one with `relay save <course>`".dimmed());
        } else {
            println!("{}", format!("No saved courses match '{}'", filter).dimmed());
        }
        return Ok(());
    }

    for course in &courses {
        println!("{} {}", course.render(), course.id.as_str().dimmed());
    }

    Ok(())
}
