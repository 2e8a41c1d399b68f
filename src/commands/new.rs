use anyhow::Result;
use owo_colors::OwoColorize;
use relay_core::session::create_course;
use relay_core::CourseDetails;

use crate::commands::Context;
use crate::render::Render;

pub async fn run(
    ctx: &Context,
    name: String,
    university: String,
    code: String,
    description: String,
) -> Result<()> {
    let user = ctx.signed_in()?;

    let details = CourseDetails {
        name,
        university,
        code,
        description,
    };
    let course = create_course(ctx.store.as_ref(), Some(user), details).await?;

    println!("Created {}", course.render());
    println!("  {}", format!("id: {}", course.id).dimmed());

    Ok(())
}
