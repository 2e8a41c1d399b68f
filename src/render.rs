//! Terminal rendering for relay types.
//!
//! Extension traits and helpers that add colored output to relay-core types
//! using owo_colors.

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone};
use owo_colors::OwoColorize;
use relay_core::grid::WEEKDAY_HEADERS;
use relay_core::grouping::DayLabel;
use relay_core::{Colour, Course, Event, MonthGrid};

use crate::commands::short_id;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Colour {
    fn render(&self) -> String {
        let (r, g, b) = self.rgb();
        "●".truecolor(r, g, b).to_string()
    }
}

impl Render for DayLabel {
    fn render(&self) -> String {
        match self {
            DayLabel::Today => self.to_string().bold().green().to_string(),
            _ => self.to_string().bold().to_string(),
        }
    }
}

impl Render for Course {
    fn render(&self) -> String {
        let vouches = match self.vouch_count() {
            0 => "not vouched".to_string(),
            1 => "1 vouch".to_string(),
            n => format!("{} vouches", n),
        };
        let badge = if self.vouch_count() > 0 {
            format!("✓ {}", vouches).green().to_string()
        } else {
            vouches.dimmed().to_string()
        };

        format!(
            "{} {} {} {}",
            self.details.name.bold(),
            self.details.code,
            format!("· {}", self.details.university).dimmed(),
            badge
        )
    }
}

/// One event line: time range, swatch, title, type tag, location and id.
pub fn render_event<Tz: TimeZone>(event: &Event, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let start = event.start.with_timezone(tz).format("%H:%M").to_string();
    let time = match event.end {
        Some(end) => format!("{}-{}", start, end.with_timezone(tz).format("%H:%M")),
        None => format!("{:<11}", start),
    };

    let mut line = format!(
        "{} {} {} {}",
        time,
        event.colour.render(),
        event.title,
        format!("[{}]", event.kind_label()).dimmed()
    );
    if let Some(location) = &event.location {
        line.push_str(&format!(" {}", format!("@ {}", location).dimmed()));
    }
    if event.ends_before_start() {
        line.push_str(&format!(" {}", "(ends before it starts)".yellow()));
    }
    line.push_str(&format!(" {}", short_id(&event.id).dimmed()));
    line
}

/// Width of one day cell, including its trailing gap.
const CELL_WIDTH: usize = 7;

/// The month grid: a title, weekday headers and six weeks of days.
///
/// Days with events show their count and the first event's colour. Days
/// outside the month are dimmed; today is underlined.
pub fn render_month(grid: &MonthGrid, days: &BTreeMap<NaiveDate, Vec<&Event>>, today: NaiveDate) -> String {
    let mut lines = Vec::new();
    lines.push(grid.title().bold().to_string());

    let headers: Vec<_> = WEEKDAY_HEADERS
        .iter()
        .map(|h| format!("{:<width$}", h, width = CELL_WIDTH))
        .collect();
    lines.push(headers.concat().trim_end().dimmed().to_string());

    for week in grid.weeks() {
        let cells: Vec<_> = week
            .iter()
            .map(|day| render_cell(grid, *day, days.get(day).map(Vec::as_slice), today))
            .collect();
        lines.push(cells.concat());
    }

    lines.join("\n")
}

fn render_cell(grid: &MonthGrid, day: NaiveDate, events: Option<&[&Event]>, today: NaiveDate) -> String {
    use chrono::Datelike;

    let number = format!("{:>2}", day.day());
    let number = if day == today {
        number.underline().bold().to_string()
    } else if !grid.in_month(day) {
        number.dimmed().to_string()
    } else {
        number
    };

    // Padding is computed on the plain text; escape codes have no width
    let (marker, marker_width) = match events {
        Some(events @ [first, ..]) => {
            let (r, g, b) = first.colour.rgb();
            let text = format!("•{}", events.len());
            let width = text.chars().count();
            (text.truecolor(r, g, b).to_string(), width)
        }
        _ => (String::new(), 0),
    };

    let padding = CELL_WIDTH.saturating_sub(2 + 1 + marker_width);
    format!("{} {}{}", number, marker, " ".repeat(padding))
}
