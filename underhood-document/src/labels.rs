use time::macros::offset;
use time::{UtcOffset, Weekday};

use crate::builder::DocumentError;

pub const DEFAULT_WEEK_TITLE: &str = "Архив недели";
pub const DEFAULT_LINKS_TITLE: &str = "Ссылки";
/// Monday first.
pub const DEFAULT_DAYS: [&str; 7] = [
    "Понедельник",
    "Вторник",
    "Среда",
    "Четверг",
    "Пятница",
    "Суббота",
    "Воскресенье",
];
/// Moscow time.
pub const DEFAULT_OFFSET: UtcOffset = offset!(+3);

/// Section titles, weekday names and the fixed offset applied to every
/// timestamp. Passed explicitly into [`build`](crate::build).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedLabels {
    week_title: String,
    links_title: String,
    days: [String; 7],
    offset: UtcOffset,
}

impl LocalizedLabels {
    /// `days` starts at Monday and must have exactly seven entries.
    pub fn new(
        week_title: impl Into<String>,
        links_title: impl Into<String>,
        days: Vec<String>,
        utc_offset_minutes: i32,
    ) -> Result<Self, DocumentError> {
        let days: [String; 7] = days
            .try_into()
            .map_err(|d: Vec<String>| DocumentError::DayNames(d.len()))?;
        let offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(|secs| UtcOffset::from_whole_seconds(secs).ok())
            .ok_or(DocumentError::Offset(utc_offset_minutes))?;
        Ok(Self {
            week_title: week_title.into(),
            links_title: links_title.into(),
            days,
            offset,
        })
    }

    pub fn week_title(&self) -> &str {
        &self.week_title
    }

    pub fn links_title(&self) -> &str {
        &self.links_title
    }

    pub fn day_name(&self, day: Weekday) -> &str {
        &self.days[day.number_days_from_monday() as usize]
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }
}

impl Default for LocalizedLabels {
    fn default() -> Self {
        Self {
            week_title: DEFAULT_WEEK_TITLE.into(),
            links_title: DEFAULT_LINKS_TITLE.into(),
            days: DEFAULT_DAYS.map(String::from),
            offset: DEFAULT_OFFSET,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn week(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_are_moscow_week() {
        let labels = LocalizedLabels::default();
        assert_eq!(labels.week_title(), "Архив недели");
        assert_eq!(labels.links_title(), "Ссылки");
        assert_eq!(labels.day_name(Weekday::Monday), "Понедельник");
        assert_eq!(labels.day_name(Weekday::Sunday), "Воскресенье");
        assert_eq!(labels.offset().whole_minutes(), 180);
    }

    #[test]
    fn defaults_survive_validation() {
        let rebuilt = LocalizedLabels::new(
            DEFAULT_WEEK_TITLE,
            DEFAULT_LINKS_TITLE,
            DEFAULT_DAYS.map(String::from).to_vec(),
            DEFAULT_OFFSET.whole_minutes().into(),
        )
        .unwrap();
        assert_eq!(rebuilt, LocalizedLabels::default());
    }

    #[test]
    fn custom_labels() {
        let labels = LocalizedLabels::new(
            "Week",
            "Links",
            week(&["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"]),
            -330,
        )
        .unwrap();
        assert_eq!(labels.day_name(Weekday::Wednesday), "We");
        assert_eq!(labels.offset().whole_minutes(), -330);
    }

    #[test]
    fn rejects_wrong_number_of_days() {
        let err = LocalizedLabels::new("W", "L", week(&["Mo", "Tu"]), 0).unwrap_err();
        assert!(matches!(err, DocumentError::DayNames(2)));
    }

    #[test]
    fn rejects_unrepresentable_offset() {
        let days = week(&["1", "2", "3", "4", "5", "6", "7"]);
        assert!(matches!(
            LocalizedLabels::new("W", "L", days.clone(), 26 * 60),
            Err(DocumentError::Offset(1560))
        ));
        assert!(matches!(
            LocalizedLabels::new("W", "L", days, i32::MAX),
            Err(DocumentError::Offset(_))
        ));
    }
}
