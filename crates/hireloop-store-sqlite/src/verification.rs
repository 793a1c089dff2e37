//! [`VerificationWorkflow`] for [`SqliteStore`].

use chrono::Utc;
use hireloop_core::{
  Error as CoreError,
  id::{ServiceProviderId, SubCategoryId, VerifierId},
  profile::ServiceProviderProfile,
  store::VerificationWorkflow,
  verification::{
    Decision, DecisionOutcome, PendingVerification, VerificationDecision, VerificationReport,
    VerificationStatus, derive_status,
  },
};
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::{
  Result, SqliteStore,
  encode::{RawDecision, encode_dt},
  error::is_unique_violation,
  profiles::{load_offerings, load_service_provider},
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn load_decisions(
  conn: &Connection,
  spsid: ServiceProviderId,
) -> Result<Vec<VerificationDecision>> {
  let sql = format!(
    "SELECT {} FROM verified_accounts WHERE spsid = ?1 ORDER BY decided_at, vid",
    RawDecision::COLUMNS
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params![spsid.0], RawDecision::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawDecision::into_decision).collect()
}

fn offered_ids(sp: &ServiceProviderProfile) -> Vec<SubCategoryId> {
  sp.offerings.iter().map(|o| o.sub_category_id).collect()
}

fn verifier_exists(conn: &Connection, vid: VerifierId) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM verifiers WHERE vid = ?1",
        params![vid.0],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

fn decision_exists(
  conn: &Connection,
  vid: VerifierId,
  spsid: ServiceProviderId,
  sub_category_id: SubCategoryId,
) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM verified_accounts
         WHERE vid = ?1 AND spsid = ?2 AND sub_category_id = ?3",
        params![vid.0, spsid.0, sub_category_id.0],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

/// Write the derived status to the profile and to its queue entry.
fn store_status(
  conn: &Connection,
  spsid: ServiceProviderId,
  status: VerificationStatus,
) -> Result<()> {
  conn.execute(
    "UPDATE service_provider SET status = ?1 WHERE spsid = ?2",
    params![status.as_str(), spsid.0],
  )?;
  conn.execute(
    "UPDATE to_be_verified_profiles SET status = ?1 WHERE spsid = ?2",
    params![status.queue_state(), spsid.0],
  )?;
  Ok(())
}

// ─── VerificationWorkflow impl ───────────────────────────────────────────────

impl VerificationWorkflow for SqliteStore {
  async fn record_decision(
    &self,
    verifier_id: VerifierId,
    spsid: ServiceProviderId,
    sub_category_id: SubCategoryId,
    decision: Decision,
  ) -> Result<DecisionOutcome> {
    let outcome = self
      .write(move |tx| {
        let sp = load_service_provider(tx, spsid)?
          .ok_or_else(|| CoreError::not_found("service provider", spsid))?;
        if !verifier_exists(tx, verifier_id)? {
          return Err(CoreError::not_found("verifier", verifier_id).into());
        }
        let offered = offered_ids(&sp);
        if !offered.contains(&sub_category_id) {
          return Err(
            CoreError::Validation(format!(
              "service provider {spsid} does not offer sub-category {sub_category_id}"
            ))
            .into(),
          );
        }
        if sp.status.is_terminal() {
          return Err(CoreError::NotEligible { spsid, status: sp.status }.into());
        }

        let duplicate = CoreError::DuplicateDecision {
          verifier_id,
          spsid,
          sub_category_id,
        };
        if decision_exists(tx, verifier_id, spsid, sub_category_id)? {
          return Err(duplicate.into());
        }

        let record = VerificationDecision {
          verifier_id,
          spsid,
          sub_category_id,
          decision,
          decided_at: Utc::now(),
        };
        let inserted = tx.execute(
          "INSERT INTO verified_accounts (vid, spsid, sub_category_id, status, decided_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![
            verifier_id.0,
            spsid.0,
            sub_category_id.0,
            decision.as_str(),
            encode_dt(record.decided_at)
          ],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => return Err(duplicate.into()),
          Err(e) => return Err(e.into()),
        }

        let decisions = load_decisions(tx, spsid)?;
        let status = derive_status(&offered, &decisions);
        if status != sp.status {
          store_status(tx, spsid, status)?;
        }

        Ok(DecisionOutcome { decision: record, status })
      })
      .await?;

    tracing::info!(
      %spsid,
      verifier_id = %verifier_id,
      sub_category_id = %sub_category_id,
      decision = outcome.decision.decision.as_str(),
      status = %outcome.status,
      "recorded verification decision"
    );
    Ok(outcome)
  }

  async fn verification_report(&self, spsid: ServiceProviderId) -> Result<VerificationReport> {
    self
      .read(move |conn| {
        let sp = load_service_provider(conn, spsid)?
          .ok_or_else(|| CoreError::not_found("service provider", spsid))?;
        let offered = offered_ids(&sp);
        let decisions = load_decisions(conn, spsid)?;
        let derived_status = derive_status(&offered, &decisions);
        Ok(VerificationReport {
          spsid,
          offered,
          decisions,
          stored_status: sp.status,
          derived_status,
        })
      })
      .await
  }

  async fn pending_verifications(&self) -> Result<Vec<PendingVerification>> {
    self
      .read(|conn| {
        let mut stmt = conn.prepare(
          "SELECT q.spsid, sp.name, cat.category_name
           FROM to_be_verified_profiles q
           JOIN service_provider sp ON sp.spsid = q.spsid
           JOIN categories cat ON cat.category_id = sp.category_id
           WHERE q.status = 'Pending'
           ORDER BY q.queued_at, q.spsid",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok((
              ServiceProviderId(row.get(0)?),
              row.get::<_, String>(1)?,
              row.get::<_, String>(2)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut decided_stmt = conn.prepare(
          "SELECT DISTINCT sub_category_id FROM verified_accounts
           WHERE spsid = ?1 ORDER BY sub_category_id",
        )?;

        let mut pending = Vec::with_capacity(rows.len());
        for (spsid, name, category_name) in rows {
          let offered = load_offerings(conn, spsid)?
            .into_iter()
            .map(|o| o.sub_category_id)
            .collect();
          let decided = decided_stmt
            .query_map(params![spsid.0], |row| Ok(SubCategoryId(row.get(0)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          pending.push(PendingVerification {
            spsid,
            name,
            category_name,
            offered,
            decided,
          });
        }
        Ok(pending)
      })
      .await
  }
}
