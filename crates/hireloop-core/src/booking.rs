//! Appointment types and the booking state machine.
//!
//! ```text
//! Requested ──accept──▶ Scheduled ──complete──▶ Completed
//!     │                     │
//!   reject               cancel
//!     ▼                     ▼
//!  (deleted)            Cancelled
//! ```
//!
//! Each phase lives in its own table; an appointment id is present in exactly
//! one of them at a time.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike as _, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::{
  Error, Result,
  id::{AppointmentId, CustomerId, HandledRequestId, ServiceProviderId, SupportStaffId},
};

// ─── Enumerations ────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
  /// The provider travels to the customer.
  #[strum(serialize = "In house")]
  InHouse,
  /// The customer visits the provider.
  #[strum(serialize = "Walk in")]
  WalkIn,
}

impl ServiceType {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn parse(s: &str) -> Result<Self> {
    s.parse()
      .map_err(|_| Error::Validation(format!("unknown service type: {s:?}")))
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
pub enum CancelledBy {
  #[strum(serialize = "Customer")]
  Customer,
  #[strum(serialize = "Service Provider")]
  ServiceProvider,
}

impl CancelledBy {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn parse(s: &str) -> Result<Self> {
    s.parse()
      .map_err(|_| Error::Validation(format!("unknown canceller: {s:?}")))
  }
}

// ─── Slot ────────────────────────────────────────────────────────────────────

/// A half-open time range `[start_time, end_time)` on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
  pub date:       NaiveDate,
  pub start_time: NaiveTime,
  pub end_time:   NaiveTime,
}

impl TimeSlot {
  pub fn new(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Result<Self> {
    let slot = Self { date, start_time, end_time };
    slot.validate()?;
    Ok(slot)
  }

  /// Slots deserialised from a request bypass [`Self::new`]; check again.
  pub fn validate(&self) -> Result<()> {
    if self.start_time >= self.end_time {
      return Err(Error::Validation(format!(
        "slot start {} must be before end {}",
        self.start_time, self.end_time
      )));
    }
    // Stored as HH:MM:SS; a fractional part would be lost before the
    // overlap check runs.
    if self.start_time.nanosecond() != 0 || self.end_time.nanosecond() != 0 {
      return Err(Error::Validation("slot times must be whole seconds".into()));
    }
    Ok(())
  }

  /// Half-open overlap: touching endpoints do not conflict.
  pub fn overlaps(&self, other: &TimeSlot) -> bool {
    self.date == other.date
      && self.start_time < other.end_time
      && other.start_time < self.end_time
  }
}

// ─── Rating ──────────────────────────────────────────────────────────────────

/// A customer rating in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rating(u8);

impl Rating {
  pub const MIN: i64 = 1;
  pub const MAX: i64 = 5;

  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<i64> for Rating {
  type Error = Error;

  fn try_from(raw: i64) -> Result<Self> {
    if (Self::MIN..=Self::MAX).contains(&raw) {
      Ok(Self(raw as u8))
    } else {
      Err(Error::InvalidRating(raw))
    }
  }
}

impl From<Rating> for i64 {
  fn from(r: Rating) -> Self { i64::from(r.0) }
}

// ─── Appointment ─────────────────────────────────────────────────────────────

/// Input to [`crate::store::BookingLifecycle::request_appointment`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
  pub customer_id:  CustomerId,
  pub spsid:        ServiceProviderId,
  pub slot:         TimeSlot,
  pub service_type: ServiceType,
  #[serde(default)]
  pub description:  Option<String>,
}

/// Closing details supplied when an appointment is completed.
///
/// `rating` is kept raw so an out-of-range value surfaces as
/// [`Error::InvalidRating`] rather than a deserialisation failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Completion {
  pub feedback: Option<String>,
  pub rating:   Option<i64>,
  pub payment:  Option<Decimal>,
}

impl Completion {
  /// Validate and return the checked rating.
  pub fn validate(&self) -> Result<Option<Rating>> {
    if let Some(payment) = self.payment
      && payment < Decimal::ZERO
    {
      return Err(Error::Validation("payment must not be negative".into()));
    }
    self.rating.map(Rating::try_from).transpose()
  }
}

/// Which lifecycle set an appointment currently belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentPhase {
  Requested,
  Scheduled,
  Completed,
  Cancelled,
}

impl AppointmentPhase {
  pub fn is_unresolved(self) -> bool { matches!(self, Self::Requested | Self::Scheduled) }
}

impl fmt::Display for AppointmentPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Requested => "requested",
      Self::Scheduled => "scheduled",
      Self::Completed => "completed",
      Self::Cancelled => "cancelled",
    })
  }
}

/// Phase plus the data that only exists in that phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AppointmentState {
  Requested,
  Scheduled {
    scheduled_at: DateTime<Utc>,
  },
  Completed {
    feedback:     Option<String>,
    rating:       Option<Rating>,
    payment:      Option<Decimal>,
    completed_at: DateTime<Utc>,
  },
  Cancelled {
    cancelled_by: CancelledBy,
    cancelled_at: DateTime<Utc>,
  },
}

impl AppointmentState {
  pub fn phase(&self) -> AppointmentPhase {
    match self {
      Self::Requested => AppointmentPhase::Requested,
      Self::Scheduled { .. } => AppointmentPhase::Scheduled,
      Self::Completed { .. } => AppointmentPhase::Completed,
      Self::Cancelled { .. } => AppointmentPhase::Cancelled,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
  pub appt_id:      AppointmentId,
  pub customer_id:  CustomerId,
  pub spsid:        ServiceProviderId,
  pub slot:         TimeSlot,
  pub service_type: ServiceType,
  pub description:  Option<String>,
  pub requested_at: DateTime<Utc>,
  #[serde(flatten)]
  pub state:        AppointmentState,
}

impl Appointment {
  pub fn phase(&self) -> AppointmentPhase { self.state.phase() }
}

/// A support-staff member assigned to resolve an appointment. The latest
/// assignment for an appointment is its current handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandledRequest {
  pub handled_request_id: HandledRequestId,
  pub ssid:               SupportStaffId,
  pub appt_id:            AppointmentId,
  pub assigned_at:        DateTime<Utc>,
}
