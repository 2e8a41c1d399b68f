mod commands;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::config::ConfigUpdate;
use commands::{Context, EventArgs};

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Browse, edit, vouch for and export shared course calendars")]
struct Cli {
    /// Act as this user (overrides `user` in config.toml)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new course
    New {
        #[arg(long)]
        name: String,

        #[arg(long)]
        university: String,

        /// Course code (e.g., "CS350")
        #[arg(long)]
        code: String,

        #[arg(long, default_value = "")]
        description: String,
    },
    /// Find courses by name and university
    Search {
        /// Words that must all appear (empty lists every course)
        terms: Vec<String>,
    },
    /// Show a course's month calendar
    Show {
        course: String,

        /// Months from the current month (e.g., -1 for last month)
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i32,
    },
    /// List a course's upcoming events by day
    Upcoming { course: String },
    /// List all of a course's events
    Events {
        course: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add an event to a course
    Add {
        course: String,

        /// Day of the event (YYYY-MM-DD)
        #[arg(long)]
        day: String,

        #[arg(long)]
        title: String,

        /// Start time (HH:MM)
        #[arg(long)]
        start: String,

        #[command(flatten)]
        details: EventArgs,
    },
    /// Edit an existing event
    Edit {
        course: String,
        event: String,

        /// Move to another day (YYYY-MM-DD)
        #[arg(long)]
        day: Option<String>,

        #[arg(long)]
        title: Option<String>,

        /// Start time (HH:MM)
        #[arg(long)]
        start: Option<String>,

        #[command(flatten)]
        details: EventArgs,
    },
    /// Delete an event
    Delete { course: String, event: String },
    /// Change a course's details
    Update {
        course: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        university: Option<String>,

        #[arg(long)]
        code: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },
    /// Vouch that a course's schedule is accurate
    Vouch { course: String },
    /// Save a course to your profile
    Save { course: String },
    /// Remove a course from your profile
    Unsave { course: String },
    /// List your saved courses
    Saved {
        /// Only show courses whose name, code or university contains this
        filter: Option<String>,
    },
    /// Export a course to an .ics file
    Export {
        course: String,

        /// Directory to write to (defaults to the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the events in an .ics file
    Inspect { file: PathBuf },
    /// Show settings, or save --user, --timezone and --data-dir to config.toml
    Config {
        /// IANA zone name (e.g., "America/Toronto"); "" clears it
        #[arg(long)]
        timezone: Option<String>,

        /// Where courses and saved lists are stored
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let ctx = Context::load(cli.user.clone())?;

    match cli.command {
        Commands::New {
            name,
            university,
            code,
            description,
        } => commands::new::run(&ctx, name, university, code, description).await,
        Commands::Search { terms } => commands::search::run(&ctx, &terms.join(" ")).await,
        Commands::Show { course, offset } => commands::show::run(&ctx, &course, offset).await,
        Commands::Upcoming { course } => commands::upcoming::run(&ctx, &course).await,
        Commands::Events { course, json } => commands::events::run(&ctx, &course, json).await,
        Commands::Add {
            course,
            day,
            title,
            start,
            details,
        } => commands::event::add(&ctx, &course, day, title, start, details).await,
        Commands::Edit {
            course,
            event,
            day,
            title,
            start,
            details,
        } => commands::event::edit(&ctx, &course, &event, day, title, start, details).await,
        Commands::Delete { course, event } => commands::event::delete(&ctx, &course, &event).await,
        Commands::Update {
            course,
            name,
            university,
            code,
            description,
        } => commands::update::run(&ctx, &course, name, university, code, description).await,
        Commands::Vouch { course } => commands::vouch::run(&ctx, &course).await,
        Commands::Save { course } => commands::saved::save(&ctx, &course).await,
        Commands::Unsave { course } => commands::saved::unsave(&ctx, &course).await,
        Commands::Saved { filter } => commands::saved::list(&ctx, filter.as_deref().unwrap_or("")).await,
        Commands::Export { course, output } => commands::export::run(&ctx, &course, output).await,
        Commands::Inspect { file } => commands::inspect::run(&ctx, &file),
        Commands::Config { timezone, data_dir } => commands::config::run(
            &ctx,
            ConfigUpdate {
                user: cli.user,
                timezone,
                data_dir,
            },
        ),
    }
}

/// Log to stderr so command output on stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
