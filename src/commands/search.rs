use anyhow::Result;
use owo_colors::OwoColorize;
use relay_core::session::search_courses;

use crate::commands::Context;
use crate::render::Render;

pub async fn run(ctx: &Context, query: &str) -> Result<()> {
    let courses = search_courses(ctx.store.as_ref(), query).await?;

    if courses.is_empty() {
        println!("{}", "No courses found".dimmed());
        return Ok(());
    }

    for course in &courses {
        println!("{} {}", course.render(), course.id.as_str().dimmed());
    }

    Ok(())
}
