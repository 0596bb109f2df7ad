//! Scheduling — appointment lifecycle and slot availability.
//!
//! Slots are never stored. They are cut from the doctor's daily template
//! on every query and marked unavailable where a non-cancelled appointment
//! sits at the same time. Booking re-runs the same computation, so what a
//! caller sees as available is exactly what can be booked.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::{self, now_timestamp};
use crate::directory;
use crate::error::{non_blank, required, StoreError};
use crate::models::enums::AppointmentStatus;
use crate::models::*;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

// ─── Types ────────────────────────────────────────────────────────────────────

/// One bookable unit of a doctor's day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub doctor_id: i64,
    pub date: String,
    pub time: String,
    pub available: bool,
}

/// Booking request from the portal.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentRequest {
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub date: Option<String>, // YYYY-MM-DD
    pub time: Option<String>, // HH:MM
    pub reason: Option<String>,
}

/// Result of a cancellation attempt on an existing appointment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The appointment moved from scheduled to cancelled.
    Cancelled(Appointment),
    /// It was already cancelled; nothing changed.
    AlreadyCancelled(Appointment),
}

impl CancelOutcome {
    pub fn appointment(&self) -> &Appointment {
        match self {
            Self::Cancelled(a) | Self::AlreadyCancelled(a) => a,
        }
    }

    pub fn into_appointment(self) -> Appointment {
        match self {
            Self::Cancelled(a) | Self::AlreadyCancelled(a) => a,
        }
    }

    pub fn was_already_cancelled(&self) -> bool {
        matches!(self, Self::AlreadyCancelled(_))
    }
}

// ─── Availability ─────────────────────────────────────────────────────────────

/// Every template slot for `doctor_id` on `date`, tagged available or not.
/// Empty when the date is not one of the doctor's working days.
pub fn get_available_slots(
    conn: &Connection,
    doctor_id: i64,
    date: &str,
) -> Result<Vec<Slot>, StoreError> {
    let doctor = directory::get_doctor(conn, doctor_id)?;
    let date = parse_date(date)?;
    let date_str = date.format(DATE_FORMAT).to_string();

    let booked: HashSet<String> = get_doctor_appointments(conn, doctor_id, &date_str)?
        .into_iter()
        .map(|a| a.time)
        .collect();

    let slots = template_slots(&doctor.working_hours, date)?
        .into_iter()
        .map(|time| Slot {
            doctor_id,
            date: date_str.clone(),
            available: !booked.contains(&time),
            time,
        })
        .collect();
    Ok(slots)
}

/// Non-cancelled appointments holding `doctor_id`'s slots on `date`.
pub fn get_doctor_appointments(
    conn: &Connection,
    doctor_id: i64,
    date: &str,
) -> Result<Vec<Appointment>, StoreError> {
    Ok(db::get_active_appointments_for_doctor(conn, doctor_id, date)?)
}

/// Slot start times (`HH:MM`) from a doctor's template for one date.
///
/// Slots start at `day_start`, step by `slot_minutes`, stop before overrunning
/// `day_end`, and skip anything overlapping the break.
fn template_slots(hours: &WorkingHours, date: NaiveDate) -> Result<Vec<String>, StoreError> {
    if !works_on(hours, date.weekday())? {
        return Ok(Vec::new());
    }

    let start = template_minutes(&hours.day_start)?;
    let end = template_minutes(&hours.day_end)?;
    let step = hours.slot_minutes;
    if step == 0 {
        return Err(StoreError::Internal("slot length must be positive".into()));
    }
    let pause = match (&hours.break_start, &hours.break_end) {
        (Some(from), Some(to)) => Some((template_minutes(from)?, template_minutes(to)?)),
        _ => None,
    };

    let mut slots = Vec::new();
    let mut at = start;
    while at + step <= end {
        let overlaps_break = pause.is_some_and(|(from, to)| at < to && at + step > from);
        if !overlaps_break {
            slots.push(format!("{:02}:{:02}", at / 60, at % 60));
        }
        at += step;
    }
    Ok(slots)
}

fn works_on(hours: &WorkingHours, weekday: Weekday) -> Result<bool, StoreError> {
    for day in &hours.working_days {
        let parsed: Weekday = day
            .parse()
            .map_err(|_| StoreError::Internal(format!("invalid working day '{day}'")))?;
        if parsed == weekday {
            return Ok(true);
        }
    }
    Ok(false)
}

fn template_minutes(value: &str) -> Result<u32, StoreError> {
    let time = NaiveTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|_| StoreError::Internal(format!("invalid template time '{value}'")))?;
    Ok(time.hour() * 60 + time.minute())
}

fn parse_date(value: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        StoreError::validation(format!("Invalid date '{value}' (expected YYYY-MM-DD)"))
    })
}

fn parse_time(value: &str) -> Result<String, StoreError> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT)
        .map(|t| t.format(TIME_FORMAT).to_string())
        .map_err(|_| StoreError::validation(format!("Invalid time '{value}' (expected HH:MM)")))
}

// ─── Appointment lifecycle ────────────────────────────────────────────────────

/// Book a free template slot. The availability check and the insert run on
/// the same locked connection, so a slot cannot be double-booked.
pub fn book_appointment(
    conn: &Connection,
    request: &AppointmentRequest,
) -> Result<Appointment, StoreError> {
    let patient_id = request
        .patient_id
        .ok_or_else(|| StoreError::validation("patient_id is required"))?;
    let doctor_id = request
        .doctor_id
        .ok_or_else(|| StoreError::validation("doctor_id is required"))?;
    let date = parse_date(required(request.date.as_deref(), "date")?)?;
    let time = parse_time(required(request.time.as_deref(), "time")?)?;
    let date_str = date.format(DATE_FORMAT).to_string();

    directory::ensure_patient(conn, patient_id)?;
    let slots = get_available_slots(conn, doctor_id, &date_str)?;

    match slots.iter().find(|s| s.time == time) {
        None => {
            return Err(StoreError::validation(format!(
                "{time} on {date_str} is outside doctor {doctor_id}'s working hours"
            )))
        }
        Some(slot) if !slot.available => {
            tracing::warn!(doctor_id, date = %date_str, time = %time, "Slot already booked");
            return Err(StoreError::Conflict(format!(
                "{time} on {date_str} is already booked"
            )));
        }
        Some(_) => {}
    }

    let appointment = db::insert_appointment(
        conn,
        patient_id,
        doctor_id,
        &date_str,
        &time,
        non_blank(request.reason.as_deref()),
        &now_timestamp(),
    )?;

    tracing::info!(
        appointment_id = appointment.id,
        patient_id,
        doctor_id,
        "Appointment booked"
    );
    Ok(appointment)
}

/// All appointments for a patient in booking order, cancelled ones included.
pub fn get_appointments(conn: &Connection, patient_id: i64) -> Result<Vec<Appointment>, StoreError> {
    Ok(db::get_appointments_for_patient(conn, patient_id)?)
}

/// Cancel an appointment.
///
/// Unknown ids are `NotFound`. An appointment that is already cancelled is
/// returned untouched as `AlreadyCancelled`; completed visits are a conflict.
pub fn cancel_appointment(conn: &Connection, appointment_id: i64) -> Result<CancelOutcome, StoreError> {
    let appointment = db::get_appointment(conn, appointment_id)?
        .ok_or(StoreError::not_found("Appointment", appointment_id))?;

    match appointment.status {
        AppointmentStatus::Cancelled => {
            tracing::debug!(appointment_id, "Cancel on already-cancelled appointment");
            Ok(CancelOutcome::AlreadyCancelled(appointment))
        }
        AppointmentStatus::Completed => Err(StoreError::Conflict(format!(
            "Appointment {appointment_id} is completed and cannot be cancelled"
        ))),
        AppointmentStatus::Scheduled => {
            let changed = db::mark_appointment_cancelled(conn, appointment_id, &now_timestamp())?;
            if changed != 1 {
                return Err(StoreError::Internal(format!(
                    "cancelling appointment {appointment_id} changed {changed} rows"
                )));
            }
            let updated = db::get_appointment(conn, appointment_id)?
                .ok_or(StoreError::not_found("Appointment", appointment_id))?;
            tracing::info!(appointment_id, "Appointment cancelled");
            Ok(CancelOutcome::Cancelled(updated))
        }
    }
}
