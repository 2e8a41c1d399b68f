use std::path::PathBuf;

use anyhow::{Context as _, Result};
use chrono::Utc;

use crate::commands::Context;

pub async fn run(ctx: &Context, course: &str, output: Option<PathBuf>) -> Result<()> {
    let session = ctx.open(course).await?;
    let file = session.export(Utc::now()).await?;

    let dir = match output {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Could not create {}", dir.display()))?;

    let path = dir.join(&file.filename);
    std::fs::write(&path, &file.contents)
        .with_context(|| format!("Could not write {}", path.display()))?;

    println!(
        "Exported {} events to {}",
        session.events().await.len(),
        path.display()
    );
    Ok(())
}
