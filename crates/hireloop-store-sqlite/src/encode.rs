//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with microseconds, dates as `YYYY-MM-DD` and times
//! as `HH:MM:SS`, so lexical comparison in SQL matches chronological order.
//! Money is stored as decimal strings. Enumerations use the textual forms
//! named in the schema's CHECK constraints.

use std::str::FromStr as _;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use hireloop_core::{
  account::Account,
  booking::{
    Appointment, AppointmentState, CancelledBy, HandledRequest, Rating, ServiceType, TimeSlot,
  },
  id::{
    AccountId, AppointmentId, CategoryId, CustomerId, HandledRequestId, ServiceProviderId,
    SubCategoryId, SupportStaffId, TagId, VerifierId,
  },
  profile::{
    ContactDetails, PayoutDetails, ProfileRef, ProfileType, ServiceProviderProfile,
    SubCategoryOffering,
  },
  verification::{Decision, VerificationDecision, VerificationStatus},
};
use rust_decimal::Decimal;

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// Fixed microsecond width with a `Z` suffix, so stored timestamps sort
/// lexically in time order.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

// ─── Dates and times ─────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

pub fn encode_time(t: NaiveTime) -> String { t.format(TIME_FORMAT).to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, TIME_FORMAT)
    .map_err(|e| Error::Decode(format!("time {s:?}: {e}")))
}

// ─── Money ───────────────────────────────────────────────────────────────────

pub fn encode_decimal(d: Decimal) -> String { d.normalize().to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

// ─── Tags ────────────────────────────────────────────────────────────────────

pub fn encode_tags(tags: &[TagId]) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<Vec<TagId>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:   i64,
  pub email:        String,
  pub profile_type: String,
  pub profile_id:   i64,
  pub created_at:   String,
  pub disabled:     bool,
}

impl RawAccount {
  pub const COLUMNS: &'static str =
    "account_id, email, profile_type, profile_id, created_at, disabled";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id:   row.get(0)?,
      email:        row.get(1)?,
      profile_type: row.get(2)?,
      profile_id:   row.get(3)?,
      created_at:   row.get(4)?,
      disabled:     row.get(5)?,
    })
  }

  pub fn into_account(self) -> Result<Account> {
    let profile_type = ProfileType::parse(&self.profile_type)?;
    Ok(Account {
      account_id: AccountId(self.account_id),
      email:      self.email,
      profile:    ProfileRef::from_parts(profile_type, self.profile_id),
      created_at: decode_dt(&self.created_at)?,
      disabled:   self.disabled,
    })
  }
}

/// Raw values read from a `service_provider` row. Offerings are loaded
/// separately and attached in [`Self::into_profile`].
pub struct RawServiceProvider {
  pub spsid:       i64,
  pub spid:        String,
  pub category_id: i64,
  pub name:        String,
  pub phone_no:    Option<String>,
  pub address:     Option<String>,
  pub description: Option<String>,
  pub bank_name:   Option<String>,
  pub ifsc:        Option<String>,
  pub acc_no:      Option<String>,
  pub tags:        String,
  pub status:      String,
}

impl RawServiceProvider {
  pub const COLUMNS: &'static str = "spsid, spid, category_id, name, phone_no, address, \
                                     description, bank_name, ifsc, acc_no, tags, status";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      spsid:       row.get(0)?,
      spid:        row.get(1)?,
      category_id: row.get(2)?,
      name:        row.get(3)?,
      phone_no:    row.get(4)?,
      address:     row.get(5)?,
      description: row.get(6)?,
      bank_name:   row.get(7)?,
      ifsc:        row.get(8)?,
      acc_no:      row.get(9)?,
      tags:        row.get(10)?,
      status:      row.get(11)?,
    })
  }

  pub fn into_profile(
    self,
    offerings: Vec<SubCategoryOffering>,
  ) -> Result<ServiceProviderProfile> {
    Ok(ServiceProviderProfile {
      spsid: ServiceProviderId(self.spsid),
      external_id: self.spid,
      category_id: CategoryId(self.category_id),
      name: self.name,
      contact: ContactDetails {
        phone:   self.phone_no,
        address: self.address,
      },
      description: self.description,
      payout: PayoutDetails {
        bank_name:  self.bank_name,
        ifsc:       self.ifsc,
        account_no: self.acc_no,
      },
      tags: decode_tags(&self.tags)?,
      offerings,
      status: VerificationStatus::parse(&self.status)?,
    })
  }
}

/// Raw values read from a `verified_accounts` row.
pub struct RawDecision {
  pub vid:             i64,
  pub spsid:           i64,
  pub sub_category_id: i64,
  pub status:          String,
  pub decided_at:      String,
}

impl RawDecision {
  pub const COLUMNS: &'static str = "vid, spsid, sub_category_id, status, decided_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      vid:             row.get(0)?,
      spsid:           row.get(1)?,
      sub_category_id: row.get(2)?,
      status:          row.get(3)?,
      decided_at:      row.get(4)?,
    })
  }

  pub fn into_decision(self) -> Result<VerificationDecision> {
    Ok(VerificationDecision {
      verifier_id:     VerifierId(self.vid),
      spsid:           ServiceProviderId(self.spsid),
      sub_category_id: SubCategoryId(self.sub_category_id),
      decision:        Decision::parse(&self.status)?,
      decided_at:      decode_dt(&self.decided_at)?,
    })
  }
}

/// Columns shared by every appointment table, in this order.
pub const APPOINTMENT_COLUMNS: &str =
  "appt_id, customer_id, spsid, date, start_time, end_time, service_type, description, \
   requested_at";

/// Raw values of [`APPOINTMENT_COLUMNS`].
pub struct RawAppointment {
  pub appt_id:      i64,
  pub customer_id:  i64,
  pub spsid:        i64,
  pub date:         String,
  pub start_time:   String,
  pub end_time:     String,
  pub service_type: String,
  pub description:  Option<String>,
  pub requested_at: String,
}

impl RawAppointment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      appt_id:      row.get(0)?,
      customer_id:  row.get(1)?,
      spsid:        row.get(2)?,
      date:         row.get(3)?,
      start_time:   row.get(4)?,
      end_time:     row.get(5)?,
      service_type: row.get(6)?,
      description:  row.get(7)?,
      requested_at: row.get(8)?,
    })
  }

  pub fn into_appointment(self, state: AppointmentState) -> Result<Appointment> {
    Ok(Appointment {
      appt_id: AppointmentId(self.appt_id),
      customer_id: CustomerId(self.customer_id),
      spsid: ServiceProviderId(self.spsid),
      slot: TimeSlot {
        date:       decode_date(&self.date)?,
        start_time: decode_time(&self.start_time)?,
        end_time:   decode_time(&self.end_time)?,
      },
      service_type: ServiceType::parse(&self.service_type)?,
      description: self.description,
      requested_at: decode_dt(&self.requested_at)?,
      state,
    })
  }
}

/// Phase-specific columns of the `appointments` table, following
/// [`APPOINTMENT_COLUMNS`].
pub struct RawActiveState {
  pub scheduled_at: String,
  pub state:        String,
  pub feedback:     Option<String>,
  pub rating:       Option<i64>,
  pub payment:      Option<String>,
  pub completed_at: Option<String>,
}

impl RawActiveState {
  pub const COLUMNS: &'static str =
    "scheduled_at, state, feedback, rating, payment, completed_at";

  /// Read starting at column `offset`.
  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      scheduled_at: row.get(offset)?,
      state:        row.get(offset + 1)?,
      feedback:     row.get(offset + 2)?,
      rating:       row.get(offset + 3)?,
      payment:      row.get(offset + 4)?,
      completed_at: row.get(offset + 5)?,
    })
  }

  pub fn into_state(self) -> Result<AppointmentState> {
    match self.state.as_str() {
      "Scheduled" => Ok(AppointmentState::Scheduled {
        scheduled_at: decode_dt(&self.scheduled_at)?,
      }),
      "Completed" => {
        let completed_at = self
          .completed_at
          .as_deref()
          .ok_or_else(|| Error::Decode("completed appointment without completed_at".into()))?;
        Ok(AppointmentState::Completed {
          feedback:     self.feedback,
          rating:       self.rating.map(Rating::try_from).transpose()?,
          payment:      self.payment.as_deref().map(decode_decimal).transpose()?,
          completed_at: decode_dt(completed_at)?,
        })
      }
      other => Err(Error::Decode(format!("unknown appointment state: {other:?}"))),
    }
  }
}

/// Phase-specific columns of `cancelled_appointments`.
pub struct RawCancelledState {
  pub cancelled_by: String,
  pub cancelled_at: String,
}

impl RawCancelledState {
  pub const COLUMNS: &'static str = "cancelled_by, cancelled_at";

  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      cancelled_by: row.get(offset)?,
      cancelled_at: row.get(offset + 1)?,
    })
  }

  pub fn into_state(self) -> Result<AppointmentState> {
    Ok(AppointmentState::Cancelled {
      cancelled_by: CancelledBy::parse(&self.cancelled_by)?,
      cancelled_at: decode_dt(&self.cancelled_at)?,
    })
  }
}

/// Raw values read from a `handled_requests` row.
pub struct RawHandledRequest {
  pub handled_request_id: i64,
  pub ssid:               i64,
  pub appt_id:            i64,
  pub assigned_at:        String,
}

impl RawHandledRequest {
  pub const COLUMNS: &'static str = "handled_request_id, ssid, appt_id, assigned_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      handled_request_id: row.get(0)?,
      ssid:               row.get(1)?,
      appt_id:            row.get(2)?,
      assigned_at:        row.get(3)?,
    })
  }

  pub fn into_handled_request(self) -> Result<HandledRequest> {
    Ok(HandledRequest {
      handled_request_id: HandledRequestId(self.handled_request_id),
      ssid:               SupportStaffId(self.ssid),
      appt_id:            AppointmentId(self.appt_id),
      assigned_at:        decode_dt(&self.assigned_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn time_text_sorts_chronologically() {
    let early = encode_time(NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    let late = encode_time(NaiveTime::from_hms_opt(10, 0, 0).unwrap());
    assert_eq!(early, "09:30:00");
    assert!(early < late);
  }

  #[test]
  fn timestamp_text_has_fixed_width() {
    let whole = DateTime::from_timestamp(1_717_232_400, 0).unwrap();
    let later = DateTime::from_timestamp(1_717_232_400, 500_000_000).unwrap();
    let latest = DateTime::from_timestamp(1_717_232_400, 700_123_000).unwrap();

    let texts = [encode_dt(whole), encode_dt(later), encode_dt(latest)];
    assert_eq!(texts[0], "2024-06-01T09:00:00.000000Z");
    assert!(texts.iter().all(|t| t.len() == texts[0].len()));
    assert!(texts[0] < texts[1] && texts[1] < texts[2]);
    assert_eq!(decode_dt(&texts[2]).unwrap(), latest);
  }

  #[test]
  fn decimal_is_normalised() {
    assert_eq!(encode_decimal(Decimal::new(25000, 2)), "250");
    assert_eq!(decode_decimal("249.50").unwrap(), Decimal::new(24950, 2));
  }

  #[test]
  fn tags_are_a_json_array_of_ids() {
    let s = encode_tags(&[TagId(3), TagId(9)]).unwrap();
    assert_eq!(s, "[3,9]");
    assert_eq!(decode_tags(&s).unwrap(), vec![TagId(3), TagId(9)]);
  }
}
