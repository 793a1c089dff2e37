//! [`BookingLifecycle`] for [`SqliteStore`].
//!
//! Each lifecycle phase has its own table. A transition copies the row into
//! the next table and deletes it from the previous one inside one
//! transaction, so an `appt_id` is never visible in two tables at once.
//! `Completed` shares the `appointments` table with `Scheduled` and is told
//! apart by the `state` column.

use chrono::Utc;
use hireloop_core::{
  Error as CoreError,
  booking::{
    Appointment, AppointmentPhase, AppointmentState, CancelledBy, Completion, HandledRequest,
    NewAppointment, TimeSlot,
  },
  id::{AppointmentId, CustomerId, HandledRequestId, ServiceProviderId, SupportStaffId},
  store::BookingLifecycle,
  verification::VerificationStatus,
};
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::{
  Error, Result, SqliteStore,
  encode::{
    APPOINTMENT_COLUMNS, RawActiveState, RawAppointment, RawCancelledState, RawHandledRequest,
    encode_date, encode_decimal, encode_dt, encode_time,
  },
};

/// Offset of the phase-specific columns in a joined appointment row.
const STATE_OFFSET: usize = 9;

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Appointments in the `Requested` phase matching `filter` (a `WHERE` clause
/// with one `?1` parameter).
fn requested_where(conn: &Connection, filter: &str, param: i64) -> Result<Vec<Appointment>> {
  let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM pending_appointments WHERE {filter}");
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params![param], RawAppointment::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws
    .into_iter()
    .map(|raw| raw.into_appointment(AppointmentState::Requested))
    .collect()
}

/// Scheduled or completed appointments matching `filter`.
fn active_where(conn: &Connection, filter: &str, param: i64) -> Result<Vec<Appointment>> {
  let sql = format!(
    "SELECT {APPOINTMENT_COLUMNS}, {} FROM appointments WHERE {filter}",
    RawActiveState::COLUMNS
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params![param], |row| {
      Ok((
        RawAppointment::from_row(row)?,
        RawActiveState::from_row(row, STATE_OFFSET)?,
      ))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws
    .into_iter()
    .map(|(raw, state)| raw.into_appointment(state.into_state()?))
    .collect()
}

fn cancelled_where(conn: &Connection, filter: &str, param: i64) -> Result<Vec<Appointment>> {
  let sql = format!(
    "SELECT {APPOINTMENT_COLUMNS}, {} FROM cancelled_appointments WHERE {filter}",
    RawCancelledState::COLUMNS
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params![param], |row| {
      Ok((
        RawAppointment::from_row(row)?,
        RawCancelledState::from_row(row, STATE_OFFSET)?,
      ))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws
    .into_iter()
    .map(|(raw, state)| raw.into_appointment(state.into_state()?))
    .collect()
}

/// Every appointment matching `filter`, whatever its phase, ordered by slot.
fn all_where(conn: &Connection, filter: &str, param: i64) -> Result<Vec<Appointment>> {
  let mut out = requested_where(conn, filter, param)?;
  out.extend(active_where(conn, filter, param)?);
  out.extend(cancelled_where(conn, filter, param)?);
  out.sort_by_key(|a| (a.slot.date, a.slot.start_time, a.appt_id));
  Ok(out)
}

fn load_appointment(conn: &Connection, appt_id: AppointmentId) -> Result<Option<Appointment>> {
  Ok(all_where(conn, "appt_id = ?1", appt_id.0)?.into_iter().next())
}

fn phase_of(conn: &Connection, appt_id: AppointmentId) -> Result<Option<AppointmentPhase>> {
  let pending = conn
    .query_row(
      "SELECT 1 FROM pending_appointments WHERE appt_id = ?1",
      params![appt_id.0],
      |_| Ok(()),
    )
    .optional()?;
  if pending.is_some() {
    return Ok(Some(AppointmentPhase::Requested));
  }

  let state: Option<String> = conn
    .query_row(
      "SELECT state FROM appointments WHERE appt_id = ?1",
      params![appt_id.0],
      |r| r.get(0),
    )
    .optional()?;
  match state.as_deref() {
    Some("Scheduled") => return Ok(Some(AppointmentPhase::Scheduled)),
    Some("Completed") => return Ok(Some(AppointmentPhase::Completed)),
    Some(other) => {
      return Err(Error::Decode(format!("unknown appointment state: {other:?}")));
    }
    None => {}
  }

  let cancelled = conn
    .query_row(
      "SELECT 1 FROM cancelled_appointments WHERE appt_id = ?1",
      params![appt_id.0],
      |_| Ok(()),
    )
    .optional()?;
  Ok(cancelled.map(|()| AppointmentPhase::Cancelled))
}

/// Fail unless `appt_id` is currently in `expected`.
fn require_phase(
  conn: &Connection,
  appt_id: AppointmentId,
  expected: AppointmentPhase,
  operation: &'static str,
) -> Result<()> {
  match phase_of(conn, appt_id)? {
    Some(phase) if phase == expected => Ok(()),
    Some(state) => Err(
      CoreError::InvalidState {
        appt_id,
        state,
        operation,
      }
      .into(),
    ),
    None => Err(CoreError::not_found("appointment", appt_id).into()),
  }
}

/// A scheduled appointment of `spsid` whose slot overlaps `slot`.
fn overlapping(
  conn: &Connection,
  spsid: ServiceProviderId,
  slot: &TimeSlot,
) -> Result<Option<AppointmentId>> {
  Ok(
    conn
      .query_row(
        "SELECT appt_id FROM appointments
         WHERE spsid = ?1 AND date = ?2 AND state = 'Scheduled'
           AND start_time < ?4 AND ?3 < end_time
         ORDER BY start_time
         LIMIT 1",
        params![
          spsid.0,
          encode_date(slot.date),
          encode_time(slot.start_time),
          encode_time(slot.end_time)
        ],
        |r| r.get(0).map(AppointmentId),
      )
      .optional()?,
  )
}

fn latest_handler(conn: &Connection, appt_id: AppointmentId) -> Result<Option<HandledRequest>> {
  let sql = format!(
    "SELECT {} FROM handled_requests WHERE appt_id = ?1
     ORDER BY handled_request_id DESC LIMIT 1",
    RawHandledRequest::COLUMNS
  );
  conn
    .query_row(&sql, params![appt_id.0], RawHandledRequest::from_row)
    .optional()?
    .map(RawHandledRequest::into_handled_request)
    .transpose()
}

fn exists(conn: &Connection, sql: &str, id: i64) -> Result<bool> {
  Ok(
    conn
      .query_row(sql, params![id], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

// ─── BookingLifecycle impl ───────────────────────────────────────────────────

impl BookingLifecycle for SqliteStore {
  async fn request_appointment(&self, input: NewAppointment) -> Result<Appointment> {
    input.slot.validate()?;
    let spsid = input.spsid;

    let appointment = self
      .write(move |tx| {
        if !exists(
          tx,
          "SELECT 1 FROM customer WHERE customer_id = ?1",
          input.customer_id.0,
        )? {
          return Err(CoreError::not_found("customer", input.customer_id).into());
        }

        let status: Option<String> = tx
          .query_row(
            "SELECT status FROM service_provider WHERE spsid = ?1",
            params![input.spsid.0],
            |r| r.get(0),
          )
          .optional()?;
        let status = match status {
          Some(s) => VerificationStatus::parse(&s)?,
          None => return Err(CoreError::not_found("service provider", input.spsid).into()),
        };
        if status != VerificationStatus::Verified {
          return Err(
            CoreError::NotBookable {
              spsid: input.spsid,
              status,
            }
            .into(),
          );
        }

        if let Some(existing) = overlapping(tx, input.spsid, &input.slot)? {
          return Err(CoreError::SlotConflict { existing }.into());
        }

        let requested_at = Utc::now();
        tx.execute(
          "INSERT INTO pending_appointments (
             customer_id, spsid, date, start_time, end_time,
             service_type, description, requested_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          params![
            input.customer_id.0,
            input.spsid.0,
            encode_date(input.slot.date),
            encode_time(input.slot.start_time),
            encode_time(input.slot.end_time),
            input.service_type.as_str(),
            input.description,
            encode_dt(requested_at),
          ],
        )?;

        Ok(Appointment {
          appt_id: AppointmentId(tx.last_insert_rowid()),
          customer_id: input.customer_id,
          spsid: input.spsid,
          slot: input.slot,
          service_type: input.service_type,
          description: input.description,
          requested_at,
          state: AppointmentState::Requested,
        })
      })
      .await
      .inspect_err(|e| tracing::warn!(%spsid, error = %e, "appointment request refused"))?;

    tracing::info!(
      appt_id = %appointment.appt_id,
      %spsid,
      customer_id = %appointment.customer_id,
      "appointment requested"
    );
    Ok(appointment)
  }

  async fn accept(&self, appt_id: AppointmentId) -> Result<Appointment> {
    let appointment = self
      .write(move |tx| {
        require_phase(tx, appt_id, AppointmentPhase::Requested, "accept")?;
        let pending = requested_where(tx, "appt_id = ?1", appt_id.0)?
          .into_iter()
          .next()
          .ok_or_else(|| CoreError::not_found("appointment", appt_id))?;

        // Competing requests for the same slot may all be pending; only the
        // first one accepted wins.
        if let Some(existing) = overlapping(tx, pending.spsid, &pending.slot)? {
          return Err(CoreError::SlotConflict { existing }.into());
        }

        let scheduled_at = Utc::now();
        tx.execute(
          &format!(
            "INSERT INTO appointments ({APPOINTMENT_COLUMNS}, scheduled_at, state)
             SELECT {APPOINTMENT_COLUMNS}, ?2, 'Scheduled'
             FROM pending_appointments WHERE appt_id = ?1"
          ),
          params![appt_id.0, encode_dt(scheduled_at)],
        )?;
        tx.execute(
          "DELETE FROM pending_appointments WHERE appt_id = ?1",
          params![appt_id.0],
        )?;

        Ok(Appointment {
          state: AppointmentState::Scheduled { scheduled_at },
          ..pending
        })
      })
      .await
      .inspect_err(|e| tracing::warn!(%appt_id, error = %e, "accept refused"))?;

    tracing::info!(%appt_id, "appointment scheduled");
    Ok(appointment)
  }

  async fn reject(&self, appt_id: AppointmentId) -> Result<()> {
    self
      .write(move |tx| {
        require_phase(tx, appt_id, AppointmentPhase::Requested, "reject")?;
        tx.execute(
          "DELETE FROM pending_appointments WHERE appt_id = ?1",
          params![appt_id.0],
        )?;
        Ok(())
      })
      .await?;
    tracing::info!(%appt_id, "appointment request rejected");
    Ok(())
  }

  async fn cancel(&self, appt_id: AppointmentId, cancelled_by: CancelledBy) -> Result<Appointment> {
    let appointment = self
      .write(move |tx| {
        require_phase(tx, appt_id, AppointmentPhase::Scheduled, "cancel")?;

        let cancelled_at = Utc::now();
        tx.execute(
          &format!(
            "INSERT INTO cancelled_appointments (
               {APPOINTMENT_COLUMNS}, scheduled_at, cancelled_by, cancelled_at
             )
             SELECT {APPOINTMENT_COLUMNS}, scheduled_at, ?2, ?3
             FROM appointments WHERE appt_id = ?1"
          ),
          params![appt_id.0, cancelled_by.as_str(), encode_dt(cancelled_at)],
        )?;
        tx.execute(
          "DELETE FROM appointments WHERE appt_id = ?1",
          params![appt_id.0],
        )?;

        load_appointment(tx, appt_id)?
          .ok_or_else(|| CoreError::not_found("appointment", appt_id).into())
      })
      .await?;

    tracing::info!(%appt_id, cancelled_by = cancelled_by.as_str(), "appointment cancelled");
    Ok(appointment)
  }

  async fn complete(&self, appt_id: AppointmentId, completion: Completion) -> Result<Appointment> {
    let rating = completion.validate()?;

    let appointment = self
      .write(move |tx| {
        require_phase(tx, appt_id, AppointmentPhase::Scheduled, "complete")?;
        tx.execute(
          "UPDATE appointments
           SET state = 'Completed', feedback = ?2, rating = ?3, payment = ?4,
               completed_at = ?5
           WHERE appt_id = ?1",
          params![
            appt_id.0,
            completion.feedback,
            rating.map(i64::from),
            completion.payment.map(encode_decimal),
            encode_dt(Utc::now()),
          ],
        )?;
        load_appointment(tx, appt_id)?
          .ok_or_else(|| CoreError::not_found("appointment", appt_id).into())
      })
      .await?;

    tracing::info!(%appt_id, "appointment completed");
    Ok(appointment)
  }

  async fn assign_support_staff(
    &self,
    ssid: SupportStaffId,
    appt_id: AppointmentId,
  ) -> Result<HandledRequest> {
    let handled = self
      .write(move |tx| {
        if !exists(tx, "SELECT 1 FROM support_staff WHERE ssid = ?1", ssid.0)? {
          return Err(CoreError::not_found("support staff", ssid).into());
        }
        match phase_of(tx, appt_id)? {
          Some(phase) if phase.is_unresolved() => {}
          Some(state) => {
            return Err(
              CoreError::InvalidState {
                appt_id,
                state,
                operation: "assign support staff",
              }
              .into(),
            );
          }
          None => return Err(CoreError::not_found("appointment", appt_id).into()),
        }

        if let Some(current) = latest_handler(tx, appt_id)?
          && current.ssid == ssid
        {
          return Ok(current);
        }

        let assigned_at = Utc::now();
        tx.execute(
          "INSERT INTO handled_requests (ssid, appt_id, assigned_at) VALUES (?1, ?2, ?3)",
          params![ssid.0, appt_id.0, encode_dt(assigned_at)],
        )?;
        Ok(HandledRequest {
          handled_request_id: HandledRequestId(tx.last_insert_rowid()),
          ssid,
          appt_id,
          assigned_at,
        })
      })
      .await?;

    tracing::info!(
      %appt_id,
      %ssid,
      handled_request_id = %handled.handled_request_id,
      "support staff assigned"
    );
    Ok(handled)
  }

  async fn current_handler(&self, appt_id: AppointmentId) -> Result<Option<HandledRequest>> {
    self.read(move |conn| latest_handler(conn, appt_id)).await
  }

  async fn handling_history(&self, appt_id: AppointmentId) -> Result<Vec<HandledRequest>> {
    self
      .read(move |conn| {
        let sql = format!(
          "SELECT {} FROM handled_requests WHERE appt_id = ?1 ORDER BY handled_request_id",
          RawHandledRequest::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let raws = stmt
          .query_map(params![appt_id.0], RawHandledRequest::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws
          .into_iter()
          .map(RawHandledRequest::into_handled_request)
          .collect()
      })
      .await
  }

  async fn get_appointment(&self, appt_id: AppointmentId) -> Result<Option<Appointment>> {
    let found = self
      .read(move |conn| load_appointment(conn, appt_id))
      .await?;
    tracing::debug!(%appt_id, found = found.is_some(), "looked up appointment");
    Ok(found)
  }

  async fn appointments_for_provider(&self, spsid: ServiceProviderId) -> Result<Vec<Appointment>> {
    self
      .read(move |conn| all_where(conn, "spsid = ?1", spsid.0))
      .await
  }

  async fn appointments_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Appointment>> {
    self
      .read(move |conn| all_where(conn, "customer_id = ?1", customer_id.0))
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn state_offset_follows_shared_columns() {
    assert_eq!(APPOINTMENT_COLUMNS.split(',').count(), STATE_OFFSET);
  }
}
