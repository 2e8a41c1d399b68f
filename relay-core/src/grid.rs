//! Month grid construction.

use chrono::{Datelike, Days, Months, NaiveDate};

/// Cells in a month grid: six full Sunday-first weeks.
pub const GRID_CELLS: usize = 42;

/// Weekday headers matching the grid's column order.
pub const WEEKDAY_HEADERS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// The 42 consecutive days shown for `anchor`'s month.
///
/// Only the year and month of `anchor` matter. The grid starts on the
/// Sunday on or before the 1st, so the 1st sits at the index of its
/// weekday (0 = Sunday).
pub fn month_grid(anchor: NaiveDate) -> Vec<NaiveDate> {
    let first = first_of_month(anchor);
    let lead = u64::from(first.weekday().num_days_from_sunday());
    let start = first - Days::new(lead);

    start.iter_days().take(GRID_CELLS).collect()
}

/// The first day of the month `offset` months away from `today`'s month.
pub fn shift_month(today: NaiveDate, offset: i32) -> NaiveDate {
    let first = first_of_month(today);
    let months = Months::new(offset.unsigned_abs());
    let shifted = if offset >= 0 {
        first.checked_add_months(months)
    } else {
        first.checked_sub_months(months)
    };
    shifted.unwrap_or(first)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    // Day 1 exists in every month
    date.with_day(1).unwrap_or(date)
}

/// A rendered month: the grid dates plus the month they were built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    month: NaiveDate,
    cells: Vec<NaiveDate>,
}

impl MonthGrid {
    pub fn new(anchor: NaiveDate) -> Self {
        MonthGrid {
            month: first_of_month(anchor),
            cells: month_grid(anchor),
        }
    }

    /// First day of the displayed month.
    pub fn month(&self) -> NaiveDate {
        self.month
    }

    pub fn cells(&self) -> &[NaiveDate] {
        &self.cells
    }

    /// Whether `date` belongs to the displayed month (as opposed to the
    /// leading/trailing days of its neighbours).
    pub fn in_month(&self, date: NaiveDate) -> bool {
        date.year() == self.month.year() && date.month() == self.month.month()
    }

    /// The grid as six rows of seven days.
    pub fn weeks(&self) -> impl Iterator<Item = &[NaiveDate]> {
        self.cells.chunks(7)
    }

    /// "March 2026"
    pub fn title(&self) -> String {
        self.month.format("%B %Y").to_string()
    }
}
