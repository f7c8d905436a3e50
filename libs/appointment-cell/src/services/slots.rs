// libs/appointment-cell/src/services/slots.rs
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use shared_config::AppConfig;

use crate::models::{AppointmentError, SlotInfo};

const OPENING_HOUR: u32 = 9;
const CLOSING_HOUR: u32 = 22;
const SLOT_MINUTES: u32 = 30;

/// Consultation slots in the clinic's local time zone.
#[derive(Debug, Clone)]
pub struct SlotService {
    timezone: Tz,
}

impl SlotService {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let timezone = config.clinic_timezone.parse::<Tz>().unwrap_or_else(|e| {
            warn!("Invalid CLINIC_TIMEZONE {}: {}, falling back to Asia/Kolkata", config.clinic_timezone, e);
            chrono_tz::Asia::Kolkata
        });

        Self::new(timezone)
    }

    /// Slot start times from opening until the last start before closing.
    pub fn slot_times() -> Vec<NaiveTime> {
        (OPENING_HOUR * 60..CLOSING_HOUR * 60)
            .step_by(SLOT_MINUTES as usize)
            .filter_map(|minutes| NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0))
            .collect()
    }

    /// Every slot of `date` with its UTC instant; slots not after `now` are unselectable.
    pub fn available_slots(&self, date: NaiveDate, now: DateTime<Utc>) -> Vec<SlotInfo> {
        Self::slot_times()
            .into_iter()
            .filter_map(|time| {
                let scheduled_at = self.to_utc(date, time)?;
                Some(SlotInfo {
                    label: time.format("%H:%M").to_string(),
                    display: time.format("%I:%M %p").to_string(),
                    scheduled_at,
                    selectable: scheduled_at > now,
                })
            })
            .collect()
    }

    /// Resolve a slot label on `date` to the UTC instant it denotes.
    pub fn resolve(&self, date: NaiveDate, label: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, AppointmentError> {
        let time = parse_slot_label(label)?;

        let scheduled_at = self.to_utc(date, time).ok_or_else(|| {
            AppointmentError::ValidationError(format!("Slot {} does not exist on {}", label, date))
        })?;

        if scheduled_at <= now {
            return Err(AppointmentError::ValidationError(format!(
                "Slot {} on {} is in the past", label, date
            )));
        }

        debug!("Resolved slot {} on {} to {}", label, date, scheduled_at);
        Ok(scheduled_at)
    }

    fn to_utc(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        self.timezone
            .from_local_datetime(&date.and_time(time))
            .earliest()
            .map(|local| local.with_timezone(&Utc))
    }
}

/// Accepts `HH:MM` or `hh:mm AM/PM`; the time must fall on the slot grid.
pub fn parse_slot_label(label: &str) -> Result<NaiveTime, AppointmentError> {
    let trimmed = label.trim();

    let time = NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(&trimmed.to_uppercase(), "%I:%M %p"))
        .map_err(|_| AppointmentError::ValidationError(format!("Invalid slot: {}", label)))?;

    let on_grid = time.minute() % SLOT_MINUTES == 0
        && time.hour() >= OPENING_HOUR
        && time.hour() < CLOSING_HOUR;

    if !on_grid {
        return Err(AppointmentError::ValidationError(format!("Invalid slot: {}", label)));
    }

    Ok(time)
}
