use anyhow::Result;
use owo_colors::OwoColorize;

use crate::commands::Context;
use crate::render::Render;

pub async fn run(
    ctx: &Context,
    course: &str,
    name: Option<String>,
    university: Option<String>,
    code: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let user = ctx.signed_in()?;
    let session = ctx.open(course).await?;

    if name.is_none() && university.is_none() && code.is_none() && description.is_none() {
        anyhow::bail!("Nothing to update. Pass at least one of --name, --university, --code, --description");
    }

    let mut details = session.course().await.details;
    if let Some(name) = name {
        details.name = name;
    }
    if let Some(university) = university {
        details.university = university;
    }
    if let Some(code) = code {
        details.code = code;
    }
    if let Some(description) = description {
        details.description = description;
    }

    session.update_details(Some(user), details).await?;

    println!("Updated {}", session.course().await.render());
    println!("{}", "Vouches for this course were reset".dimmed());
    Ok(())
}
