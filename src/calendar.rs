//! Inline month-grid date picker.
//!
//! Pure functions: a keyboard builder for one displayed month and a parser
//! for the opaque callback data the grid emits. Callback format is
//! `cal;<op>;<yyyy>;<mm>;<dd>`.

use chrono::{Datelike, NaiveDate};

use crate::gateway::{Button, Keyboard};

const WEEKDAYS: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];
const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// Parsed picker interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarOp {
    /// A concrete day was picked.
    Day(NaiveDate),
    /// Show the month before the given one.
    Prev(NaiveDate),
    /// Show the month after the given one.
    Next(NaiveDate),
    /// Abort the flow.
    Cancel,
    /// Padding cells and the header, acknowledged and ignored.
    Noop,
}

pub fn is_calendar_callback(data: &str) -> bool {
    data.starts_with("cal;")
}

/// Parses `cal;<op>;<yyyy>;<mm>;<dd>`. Malformed data yields `None`, the
/// dispatcher answers it like any unknown callback.
pub fn parse_callback(data: &str) -> Option<CalendarOp> {
    let mut parts = data.split(';');
    if parts.next() != Some("cal") {
        return None;
    }
    let op = parts.next()?;
    match op {
        "cancel" => Some(CalendarOp::Cancel),
        "noop" => Some(CalendarOp::Noop),
        "day" | "prev" | "next" => {
            let year: i32 = parts.next()?.parse().ok()?;
            let month: u32 = parts.next()?.parse().ok()?;
            let day: u32 = parts.next()?.parse().ok()?;
            let date = NaiveDate::from_ymd_opt(year, month, day)?;
            Some(match op {
                "day" => CalendarOp::Day(date),
                "prev" => CalendarOp::Prev(date),
                _ => CalendarOp::Next(date),
            })
        }
        _ => None,
    }
}

fn day_data(date: NaiveDate) -> String {
    format!("cal;day;{};{:02};{:02}", date.year(), date.month(), date.day())
}

fn nav_data(op: &str, first_of_month: NaiveDate) -> String {
    format!(
        "cal;{op};{};{:02};01",
        first_of_month.year(),
        first_of_month.month()
    )
}

const NOOP_DATA: &str = "cal;noop;0;0;0";
pub const CANCEL_DATA: &str = "cal;cancel;0;0;0";

fn days_in_month(first: NaiveDate) -> u32 {
    let (next_year, next_month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    let next_first = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap_or(first);
    next_first.signed_duration_since(first).num_days() as u32
}

/// First day of the month before the one containing `first`.
pub fn previous_month(first: NaiveDate) -> NaiveDate {
    let (year, month) = if first.month() == 1 {
        (first.year() - 1, 12)
    } else {
        (first.year(), first.month() - 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(first)
}

/// First day of the month after the one containing `first`.
pub fn next_month(first: NaiveDate) -> NaiveDate {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(first)
}

/// Builds the grid for the month containing `anchor`: a month/year header,
/// a weekday row, the day cells padded to full weeks, and a navigation row
/// with cancel in the middle.
pub fn month_keyboard(anchor: NaiveDate) -> Keyboard {
    let first = NaiveDate::from_ymd_opt(anchor.year(), anchor.month(), 1).unwrap_or(anchor);
    let mut keyboard = Keyboard::new();

    let header = format!("{} {}", MONTHS[first.month0() as usize], first.year());
    keyboard.push_row(vec![Button::callback(header, NOOP_DATA)]);
    keyboard.push_row(
        WEEKDAYS
            .iter()
            .map(|day| Button::callback(*day, NOOP_DATA))
            .collect(),
    );

    let lead = first.weekday().num_days_from_monday();
    let total = days_in_month(first);
    let mut row: Vec<Button> = (0..lead).map(|_| Button::callback(" ", NOOP_DATA)).collect();
    for day in 1..=total {
        let date = NaiveDate::from_ymd_opt(first.year(), first.month(), day).unwrap_or(first);
        row.push(Button::callback(day.to_string(), day_data(date)));
        if row.len() == 7 {
            keyboard.push_row(std::mem::take(&mut row));
        }
    }
    if !row.is_empty() {
        while row.len() < 7 {
            row.push(Button::callback(" ", NOOP_DATA));
        }
        keyboard.push_row(row);
    }

    keyboard.push_row(vec![
        Button::callback("<", nav_data("prev", first)),
        Button::callback("Cancel", CANCEL_DATA),
        Button::callback(">", nav_data("next", first)),
    ]);
    keyboard
}
