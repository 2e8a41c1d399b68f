use anyhow::Result;
use owo_colors::OwoColorize;

use crate::commands::Context;
use crate::render::Render;

pub async fn run(ctx: &Context, course: &str) -> Result<()> {
    let user = ctx.signed_in()?;
    let session = ctx.open(course).await?;

    if session.has_vouched(user).await {
        println!("{}", "You already vouched for this schedule".dimmed());
        return Ok(());
    }

    session.vouch(Some(user)).await?;
    println!("Vouched for {}", session.course().await.render());
    Ok(())
}
