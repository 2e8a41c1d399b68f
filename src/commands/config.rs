use std::path::PathBuf;

use anyhow::Result;
use chrono_tz::Tz;
use owo_colors::OwoColorize;
use relay_core::RelayConfig;

use crate::commands::Context;

/// Settings given on the command line, written to config.toml.
#[derive(Debug, Default)]
pub struct ConfigUpdate {
    pub user: Option<String>,
    pub timezone: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl ConfigUpdate {
    fn is_empty(&self) -> bool {
        self.user.is_none() && self.timezone.is_none() && self.data_dir.is_none()
    }
}

pub fn run(ctx: &Context, update: ConfigUpdate) -> Result<()> {
    let config_path = RelayConfig::config_path()?;

    if update.is_empty() {
        let config = RelayConfig::load()?;
        println!("{}", "Paths".bold());
        println!("  Config:     {}", config_path.display());
        println!("  Courses:    {}", config.data_path().display());
        println!();
        println!("{}", "Settings".bold());
        match &ctx.user {
            Some(user) => println!("  User:       {}", user),
            None => println!("  User:       {}", "not set".dimmed()),
        }
        println!("  Time zone:  {}", ctx.tz);
        return Ok(());
    }

    let mut config = RelayConfig::load_file(&config_path)?;
    apply(&mut config, update)?;
    config.save()?;

    println!("Saved {}", config_path.display());
    Ok(())
}

/// A blank value clears the setting. Unknown zones are refused before
/// anything is written.
fn apply(config: &mut RelayConfig, update: ConfigUpdate) -> Result<()> {
    if let Some(user) = update.user {
        let user = user.trim();
        config.user = (!user.is_empty()).then(|| user.to_string());
    }

    if let Some(timezone) = update.timezone {
        let timezone = timezone.trim();
        if timezone.is_empty() {
            config.timezone = None;
        } else {
            let zone: Tz = timezone
                .parse()
                .map_err(|_| anyhow::anyhow!("Unknown time zone '{}'", timezone))?;
            config.timezone = Some(zone.name().to_string());
        }
    }

    if let Some(data_dir) = update.data_dir {
        config.data_dir = data_dir;
    }

    Ok(())
}
