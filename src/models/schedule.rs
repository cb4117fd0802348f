use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::error::ValidationError;

/// Day of week for schedule entries. Accepts long ("monday") and short
/// ("mon") lowercase forms on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    #[serde(alias = "mon")]
    Monday,
    #[serde(alias = "tue")]
    Tuesday,
    #[serde(alias = "wed")]
    Wednesday,
    #[serde(alias = "thu")]
    Thursday,
    #[serde(alias = "fri")]
    Friday,
    #[serde(alias = "sat")]
    Saturday,
    #[serde(alias = "sun")]
    Sunday,
}

impl Weekday {
    pub fn display_name(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    pub fn short_name(&self) -> &'static str {
        &self.display_name()[..3]
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One schedule item. Labels may be blank; a blank label still occupies
/// one poster line and is never skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScheduleEntry {
    pub day: Weekday,
    #[serde(default)]
    pub label: String,
    #[schema(value_type = String, format = DateTime)]
    pub starts_at: DateTime<Utc>,
    /// Explicit ordering key; defaults to the start instant's epoch
    /// seconds when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<i64>,
}

impl ScheduleEntry {
    pub fn new(day: Weekday, label: impl Into<String>, starts_at: DateTime<Utc>) -> Self {
        Self {
            day,
            label: label.into(),
            starts_at,
            sort_key: None,
        }
    }

    pub fn effective_sort_key(&self) -> i64 {
        self.sort_key.unwrap_or_else(|| self.starts_at.timestamp())
    }
}

/// Maximal run of consecutive entries sharing a weekday. Atomic for
/// pagination: a group is never split across pages. Only produced by
/// [`group_by_day`], so it always holds at least one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayGroup {
    pub day: Weekday,
    pub entries: Vec<ScheduleEntry>,
}

/// Check the ordering contract: start instants and effective sort keys
/// must both be non-decreasing over the list, and the list must not be
/// empty. Reports the first offending position.
pub fn validate_entries(entries: &[ScheduleEntry]) -> Result<(), ValidationError> {
    if entries.is_empty() {
        return Err(ValidationError::NoEntries);
    }

    for (i, pair) in entries.windows(2).enumerate() {
        let (prev, cur) = (&pair[0], &pair[1]);
        if cur.starts_at < prev.starts_at
            || cur.effective_sort_key() < prev.effective_sort_key()
        {
            return Err(ValidationError::EntriesOutOfOrder { position: i + 1 });
        }
    }

    Ok(())
}

/// Split an ordered entry list into runs of consecutive equal days.
/// Preserves input order exactly; a day returning after a different day
/// starts a fresh group.
pub fn group_by_day(entries: Vec<ScheduleEntry>) -> Vec<DayGroup> {
    let mut groups: Vec<DayGroup> = Vec::new();

    for entry in entries {
        match groups.last_mut() {
            Some(group) if group.day == entry.day => group.entries.push(entry),
            _ => groups.push(DayGroup {
                day: entry.day,
                entries: vec![entry],
            }),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 24, hour, 0, 0).unwrap()
    }

    fn entry(day: Weekday, label: &str, hour: u32) -> ScheduleEntry {
        ScheduleEntry::new(day, label, at(hour))
    }

    #[test]
    fn test_weekday_accepts_short_and_long_forms() {
        let short: Weekday = serde_json::from_str("\"mon\"").unwrap();
        let long: Weekday = serde_json::from_str("\"monday\"").unwrap();
        assert_eq!(short, Weekday::Monday);
        assert_eq!(long, Weekday::Monday);
        assert_eq!(serde_json::to_string(&short).unwrap(), "\"monday\"");
    }

    #[test]
    fn test_weekday_names() {
        assert_eq!(Weekday::Wednesday.display_name(), "Wednesday");
        assert_eq!(Weekday::Wednesday.short_name(), "Wed");
        assert_eq!(Weekday::Sunday.to_string(), "Sunday");
    }

    #[test]
    fn test_entry_sort_key_defaults_to_start_instant() {
        let e = entry(Weekday::Monday, "Yoga", 18);
        assert_eq!(e.effective_sort_key(), at(18).timestamp());

        let explicit = ScheduleEntry {
            sort_key: Some(7),
            ..e
        };
        assert_eq!(explicit.effective_sort_key(), 7);
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert_eq!(validate_entries(&[]), Err(ValidationError::NoEntries));
    }

    #[test]
    fn test_validate_accepts_ordered_entries() {
        let entries = vec![
            entry(Weekday::Monday, "Yoga", 9),
            entry(Weekday::Monday, "Spin", 12),
            entry(Weekday::Tuesday, "Pilates", 9),
        ];
        assert!(validate_entries(&entries).is_ok());
    }

    #[test]
    fn test_validate_accepts_equal_instants() {
        let entries = vec![
            entry(Weekday::Monday, "A", 9),
            entry(Weekday::Monday, "B", 9),
        ];
        assert!(validate_entries(&entries).is_ok());
    }

    #[test]
    fn test_validate_rejects_decreasing_start_instants() {
        let entries = vec![
            entry(Weekday::Monday, "Late", 18),
            entry(Weekday::Monday, "Early", 9),
        ];
        assert_eq!(
            validate_entries(&entries),
            Err(ValidationError::EntriesOutOfOrder { position: 1 })
        );
    }

    #[test]
    fn test_validate_rejects_decreasing_sort_keys() {
        let mut first = entry(Weekday::Monday, "A", 9);
        first.sort_key = Some(100);
        let mut second = entry(Weekday::Monday, "B", 12);
        second.sort_key = Some(50);

        assert_eq!(
            validate_entries(&[first, second]),
            Err(ValidationError::EntriesOutOfOrder { position: 1 })
        );
    }

    #[test]
    fn test_group_by_day_splits_runs() {
        let entries = vec![
            entry(Weekday::Monday, "A", 9),
            entry(Weekday::Monday, "B", 12),
            entry(Weekday::Tuesday, "C", 9),
            entry(Weekday::Monday, "D", 18),
        ];

        let groups = group_by_day(entries);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].day, Weekday::Monday);
        assert_eq!(groups[0].entries.len(), 2);
        assert_eq!(groups[1].day, Weekday::Tuesday);
        // Monday returning after Tuesday is a new group, not a merge.
        assert_eq!(groups[2].day, Weekday::Monday);
        assert_eq!(groups[2].entries[0].label, "D");
    }

    #[test]
    fn test_group_by_day_keeps_blank_labels() {
        let entries = vec![entry(Weekday::Friday, "", 9)];
        let groups = group_by_day(entries);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].entries[0].label, "");
    }

    #[test]
    fn test_group_by_day_empty_input() {
        assert!(group_by_day(vec![]).is_empty());
    }
}
