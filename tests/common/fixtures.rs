//! Test fixtures: schedule builders and request bodies.

use affiche::models::{ScheduleEntry, Weekday};
use chrono::{TimeZone, Utc};

/// Monday of the fixture week (2025-01-06 is a Monday)
const BASE_YEAR: i32 = 2025;
const BASE_MONTH: u32 = 1;
const BASE_DAY: u32 = 6;

fn day_offset(day: Weekday) -> u32 {
    match day {
        Weekday::Monday => 0,
        Weekday::Tuesday => 1,
        Weekday::Wednesday => 2,
        Weekday::Thursday => 3,
        Weekday::Friday => 4,
        Weekday::Saturday => 5,
        Weekday::Sunday => 6,
    }
}

/// Build one entry inside the fixture week. Start instants follow the
/// (day, hour, minute) arguments, so building entries day by day in
/// time order yields a valid schedule.
pub fn entry(day: Weekday, hour: u32, minute: u32, label: &str) -> ScheduleEntry {
    let starts_at = Utc
        .with_ymd_and_hms(BASE_YEAR, BASE_MONTH, BASE_DAY + day_offset(day), hour, minute, 0)
        .single()
        .expect("valid fixture timestamp");
    ScheduleEntry::new(day, label, starts_at)
}

/// Small three-day schedule that fits on one page
pub fn week_schedule() -> Vec<ScheduleEntry> {
    vec![
        entry(Weekday::Monday, 9, 0, "Standup"),
        entry(Weekday::Monday, 14, 0, "Design review"),
        entry(Weekday::Wednesday, 10, 30, "Customer call"),
        entry(Weekday::Friday, 16, 0, "Demo and retro"),
    ]
}

/// Schedule sized to force pagination: `days` groups of
/// `entries_per_day` short labels each
pub fn long_schedule(days: usize, entries_per_day: usize) -> Vec<ScheduleEntry> {
    let weekdays = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    let mut entries = Vec::new();
    for (d, day) in weekdays.iter().take(days).enumerate() {
        for i in 0..entries_per_day {
            entries.push(entry(
                *day,
                8 + i as u32,
                0,
                &format!("Session {} of day {}", i + 1, d + 1),
            ));
        }
    }
    entries
}

/// Request body for the poster endpoints, with small dimensions so the
/// scripted engine stays fast
pub fn poster_body(entries: &[ScheduleEntry]) -> serde_json::Value {
    serde_json::json!({
        "entries": entries,
        "width": 320,
        "height": 400,
    })
}

/// Request body with explicit theme and dimensions
pub fn poster_body_with(
    entries: &[ScheduleEntry],
    theme: Option<&str>,
    width: Option<u32>,
    height: Option<u32>,
) -> serde_json::Value {
    let mut body = serde_json::json!({ "entries": entries });
    if let Some(theme) = theme {
        body["theme"] = serde_json::json!(theme);
    }
    if let Some(width) = width {
        body["width"] = serde_json::json!(width);
    }
    if let Some(height) = height {
        body["height"] = serde_json::json!(height);
    }
    body
}
