//! Reminder entity model.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use cartas_core::constants::keys;

use super::catalog::Occasion;

/// A dated reminder ("cumpleaños de mamá"), optionally repeating yearly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "contactId", alias = "contact_id")]
    pub contact_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub occasion: Option<Occasion>,
    pub date: NaiveDate,
    /// Local time of day as `HH:MM`.
    #[serde(default = "default_time")]
    pub time: String,
    #[serde(default, rename = "recurringYearly", alias = "recurring_yearly")]
    pub recurring_yearly: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_time() -> String {
    "09:00".to_string()
}

impl Reminder {
    /// Parsed time of day, `None` when the stored value is malformed.
    pub fn time_of_day(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(self.time.trim(), "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(self.time.trim(), "%H:%M:%S"))
            .ok()
    }

    /// The date this reminder fires in `year`. Yearly reminders set on
    /// February 29th fire on the 28th in non-leap years.
    pub fn occurrence_in(&self, year: i32) -> Option<NaiveDate> {
        if !self.recurring_yearly {
            return (self.date.year() == year).then_some(self.date);
        }
        NaiveDate::from_ymd_opt(year, self.date.month(), self.date.day())
            .or_else(|| NaiveDate::from_ymd_opt(year, self.date.month(), self.date.day() - 1))
    }

    /// If the reminder fires today and its time has passed, the occurrence date.
    /// A malformed time fires from the start of the day.
    pub fn due_occurrence(&self, now: NaiveDateTime) -> Option<NaiveDate> {
        let today = now.date();
        let occurrence = self.occurrence_in(today.year())?;
        if occurrence == today && self.time_of_day().map_or(true, |t| t <= now.time()) {
            Some(occurrence)
        } else {
            None
        }
    }

    /// Whether this reminder should fire at `now`.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.due_occurrence(now).is_some()
    }

    /// Next occurrence on or after `today`, if any.
    pub fn next_occurrence(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self.occurrence_in(today.year()) {
            Some(d) if d >= today => Some(d),
            _ if self.recurring_yearly => self.occurrence_in(today.year() + 1),
            _ => None,
        }
    }

    /// Deduplication key for one native notification per reminder/day/time:
    /// `notified_<reminderId>_<date>_<time>`.
    pub fn notification_key(&self, date: NaiveDate) -> String {
        format!(
            "{}{}_{}_{}",
            keys::NOTIFIED_PREFIX,
            self.id.as_deref().unwrap_or("local"),
            date.format("%Y-%m-%d"),
            self.time.trim()
        )
    }
}
