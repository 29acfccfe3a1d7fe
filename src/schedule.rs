//! Date and time rules for appointment slots.
//!
//! Slots travel as two strings, `YYYY-MM-DD` and `HH:mm`, interpreted in the
//! server's local time zone. Every check takes `now` explicitly so callers
//! decide the clock.

use chrono::{Local, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

use crate::shared::AppError;

pub const MIN_RESCHEDULE_NOTICE_MINUTES: i64 = 60;

static DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap()
});

static TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^\d{2}:\d{2}$").unwrap()
});

pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn check_date_format(date: &str) -> Result<(), AppError> {
    if DATE_REGEX.is_match(date) {
        Ok(())
    } else {
        Err(AppError::bad_request(
            "Invalid date format (YYYY-MM-DD expected)",
        ))
    }
}

pub fn check_time_format(time: &str) -> Result<(), AppError> {
    if TIME_REGEX.is_match(time) {
        Ok(())
    } else {
        Err(AppError::bad_request("Invalid time format (HH:mm expected)"))
    }
}

/// Strictly parses a slot; `None` unless both parts are well-formed and real
pub fn parse_slot(date: &str, time: &str) -> Option<NaiveDateTime> {
    if !DATE_REGEX.is_match(date) || !TIME_REGEX.is_match(time) {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{} {}", date, time), "%Y-%m-%d %H:%M").ok()
}

/// Checks a slot offered by a doctor: well-formed, no timing constraint
pub fn validate_slot(date: &str, time: &str) -> Result<NaiveDateTime, AppError> {
    check_date_format(date)?;
    check_time_format(time)?;
    parse_slot(date, time).ok_or_else(|| AppError::bad_request("Invalid slot date/time"))
}

/// Checks a new booking: time must be `HH:mm`, the slot real and in the future
pub fn ensure_bookable(date: &str, time: &str, now: NaiveDateTime) -> Result<NaiveDateTime, AppError> {
    check_time_format(time)?;
    match parse_slot(date, time) {
        Some(slot) if slot > now => Ok(slot),
        _ => Err(AppError::bad_request(
            "Appointment date/time must be in the future",
        )),
    }
}

/// Checks a reschedule: strict formats, future slot, at least an hour of notice
pub fn ensure_reschedulable(
    date: &str,
    time: &str,
    now: NaiveDateTime,
) -> Result<NaiveDateTime, AppError> {
    check_date_format(date)?;
    check_time_format(time)?;

    let slot = match parse_slot(date, time) {
        Some(slot) if slot > now => slot,
        _ => {
            return Err(AppError::bad_request(
                "Appointment date/time must be valid and in the future",
            ))
        }
    };

    if (slot - now).num_minutes() < MIN_RESCHEDULE_NOTICE_MINUTES {
        return Err(AppError::bad_request(
            "Cannot reschedule less than 1 hour before appointment",
        ));
    }

    Ok(slot)
}
