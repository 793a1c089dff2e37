//! [`ProfileRegistry`] for [`SqliteStore`], plus the per-table profile
//! helpers the identity resolver dispatches to.

use chrono::Utc;
use hireloop_core::{
  Error as CoreError,
  id::{CustomerId, ServiceProviderId, SubCategoryId, SupportStaffId, TagId, VerifierId},
  profile::{
    CustomerProfile, MAX_TAGS, NewCustomer, NewProfile, NewServiceProvider, ProfileRef,
    ServiceProviderProfile, ServiceProviderUpdate, SubCategoryOffering, SupportStaffProfile,
    VerifierProfile,
  },
  store::ProfileRegistry,
  verification::VerificationStatus,
};
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{RawServiceProvider, decode_decimal, encode_decimal, encode_dt, encode_tags},
  taxonomy::{category_name, get_sub_category, require_live_tag},
};

// ─── Existence checks ────────────────────────────────────────────────────────

/// Whether `profile` names an existing row of the table its type implies.
pub(crate) fn profile_exists(conn: &Connection, profile: ProfileRef) -> Result<bool> {
  let t = profile.profile_type();
  let sql = format!(
    "SELECT 1 FROM {} WHERE {} = ?1",
    t.table(),
    t.key_column()
  );
  Ok(
    conn
      .query_row(&sql, params![profile.raw_id()], |_| Ok(true))
      .optional()?
      .unwrap_or(false),
  )
}

// ─── Inserts ─────────────────────────────────────────────────────────────────

/// Insert the profile row(s) for `profile` and return a reference to it.
///
/// Must run inside the caller's transaction so that a later failure rolls
/// the profile back.
pub(crate) fn insert_profile(conn: &Connection, profile: &NewProfile) -> Result<ProfileRef> {
  profile.validate()?;
  match profile {
    NewProfile::Customer(c) => insert_customer(conn, c).map(ProfileRef::Customer),
    NewProfile::ServiceProvider(sp) => {
      insert_service_provider(conn, sp).map(ProfileRef::ServiceProvider)
    }
    NewProfile::Verifier { name } => {
      conn.execute(
        "INSERT INTO verifiers (verifier_name) VALUES (?1)",
        params![name.trim()],
      )?;
      Ok(ProfileRef::Verifier(VerifierId(conn.last_insert_rowid())))
    }
    NewProfile::SupportStaff { name } => {
      conn.execute(
        "INSERT INTO support_staff (support_staff_name) VALUES (?1)",
        params![name.trim()],
      )?;
      Ok(ProfileRef::SupportStaff(SupportStaffId(conn.last_insert_rowid())))
    }
  }
}

fn insert_customer(conn: &Connection, c: &NewCustomer) -> Result<CustomerId> {
  conn.execute(
    "INSERT INTO customer (username, phone_no, address) VALUES (?1, ?2, ?3)",
    params![c.display_name.trim(), c.phone, c.address],
  )?;
  Ok(CustomerId(conn.last_insert_rowid()))
}

fn insert_service_provider(
  conn: &Connection,
  sp: &NewServiceProvider,
) -> Result<ServiceProviderId> {
  if category_name(conn, sp.category_id)?.is_none() {
    return Err(CoreError::not_found("category", sp.category_id).into());
  }
  for offering in &sp.offerings {
    let sub = get_sub_category(conn, offering.sub_category_id)?
      .filter(|s| !s.deprecated)
      .ok_or_else(|| CoreError::not_found("sub-category", offering.sub_category_id))?;
    if sub.category_id != sp.category_id {
      return Err(
        CoreError::Validation(format!(
          "sub-category {} does not belong to category {}",
          sub.sub_category_id, sp.category_id
        ))
        .into(),
      );
    }
  }
  for tag in &sp.tags {
    require_live_tag(conn, *tag)?;
  }

  let external_id = format!("sp_{}", Uuid::new_v4().simple());
  conn.execute(
    "INSERT INTO service_provider (
       spid, category_id, name, phone_no, address, description,
       bank_name, ifsc, acc_no, tags, status
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    params![
      external_id,
      sp.category_id.0,
      sp.name.trim(),
      sp.contact.phone,
      sp.contact.address,
      sp.description,
      sp.payout.bank_name,
      sp.payout.ifsc,
      sp.payout.account_no,
      encode_tags(&sp.tags)?,
      VerificationStatus::NotVerified.as_str(),
    ],
  )?;
  let spsid = ServiceProviderId(conn.last_insert_rowid());

  let mut offer = conn.prepare(
    "INSERT INTO sub_category_to_service_provider (sub_category_id, spsid, min_cost)
     VALUES (?1, ?2, ?3)",
  )?;
  for offering in &sp.offerings {
    offer.execute(params![
      offering.sub_category_id.0,
      spsid.0,
      encode_decimal(offering.min_cost)
    ])?;
  }

  conn.execute(
    "INSERT INTO to_be_verified_profiles (spsid, status, queued_at) VALUES (?1, ?2, ?3)",
    params![
      spsid.0,
      VerificationStatus::NotVerified.queue_state(),
      encode_dt(Utc::now())
    ],
  )?;

  Ok(spsid)
}

// ─── Reads ───────────────────────────────────────────────────────────────────

pub(crate) fn load_offerings(
  conn: &Connection,
  spsid: ServiceProviderId,
) -> Result<Vec<SubCategoryOffering>> {
  let mut stmt = conn.prepare(
    "SELECT sub_category_id, min_cost FROM sub_category_to_service_provider
     WHERE spsid = ?1 ORDER BY sub_category_id",
  )?;
  let raws = stmt
    .query_map(params![spsid.0], |row| {
      Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws
    .into_iter()
    .map(|(id, cost)| {
      Ok(SubCategoryOffering {
        sub_category_id: SubCategoryId(id),
        min_cost:        decode_decimal(&cost)?,
      })
    })
    .collect()
}

pub(crate) fn load_service_provider(
  conn: &Connection,
  spsid: ServiceProviderId,
) -> Result<Option<ServiceProviderProfile>> {
  let sql = format!(
    "SELECT {} FROM service_provider WHERE spsid = ?1",
    RawServiceProvider::COLUMNS
  );
  let raw = conn
    .query_row(&sql, params![spsid.0], RawServiceProvider::from_row)
    .optional()?;
  match raw {
    Some(raw) => {
      let offerings = load_offerings(conn, spsid)?;
      raw.into_profile(offerings).map(Some)
    }
    None => Ok(None),
  }
}

/// Load a provider that the owner may still edit.
fn editable_service_provider(
  conn: &Connection,
  spsid: ServiceProviderId,
) -> Result<ServiceProviderProfile> {
  let sp = load_service_provider(conn, spsid)?
    .ok_or_else(|| CoreError::not_found("service provider", spsid))?;
  if sp.status != VerificationStatus::NotVerified {
    return Err(CoreError::ProfileLocked(spsid).into());
  }
  Ok(sp)
}

fn store_tags(conn: &Connection, spsid: ServiceProviderId, tags: &[TagId]) -> Result<()> {
  conn.execute(
    "UPDATE service_provider SET tags = ?1 WHERE spsid = ?2",
    params![encode_tags(tags)?, spsid.0],
  )?;
  Ok(())
}

// ─── ProfileRegistry impl ────────────────────────────────────────────────────

impl ProfileRegistry for SqliteStore {
  async fn get_customer(&self, id: CustomerId) -> Result<Option<CustomerProfile>> {
    self
      .read(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT customer_id, username, phone_no, address FROM customer
               WHERE customer_id = ?1",
              params![id.0],
              |row| {
                Ok(CustomerProfile {
                  customer_id:  CustomerId(row.get(0)?),
                  display_name: row.get(1)?,
                  phone:        row.get(2)?,
                  address:      row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
  }

  async fn get_service_provider(
    &self,
    spsid: ServiceProviderId,
  ) -> Result<Option<ServiceProviderProfile>> {
    self
      .read(move |conn| load_service_provider(conn, spsid))
      .await
  }

  async fn get_verifier(&self, vid: VerifierId) -> Result<Option<VerifierProfile>> {
    self
      .read(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT vid, verifier_name FROM verifiers WHERE vid = ?1",
              params![vid.0],
              |row| {
                Ok(VerifierProfile {
                  vid:  VerifierId(row.get(0)?),
                  name: row.get(1)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
  }

  async fn get_support_staff(&self, ssid: SupportStaffId) -> Result<Option<SupportStaffProfile>> {
    self
      .read(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT ssid, support_staff_name FROM support_staff WHERE ssid = ?1",
              params![ssid.0],
              |row| {
                Ok(SupportStaffProfile {
                  ssid: SupportStaffId(row.get(0)?),
                  name: row.get(1)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
  }

  async fn update_service_provider(
    &self,
    spsid: ServiceProviderId,
    update: ServiceProviderUpdate,
  ) -> Result<ServiceProviderProfile> {
    update.validate()?;

    let updated = self
      .write(move |tx| {
        let mut sp = editable_service_provider(tx, spsid)?;
        if let Some(name) = update.name {
          sp.name = name.trim().to_owned();
        }
        if let Some(contact) = update.contact {
          sp.contact = contact;
        }
        if let Some(description) = update.description {
          sp.description = Some(description);
        }
        if let Some(payout) = update.payout {
          sp.payout = payout;
        }

        tx.execute(
          "UPDATE service_provider
           SET name = ?1, phone_no = ?2, address = ?3, description = ?4,
               bank_name = ?5, ifsc = ?6, acc_no = ?7
           WHERE spsid = ?8",
          params![
            sp.name,
            sp.contact.phone,
            sp.contact.address,
            sp.description,
            sp.payout.bank_name,
            sp.payout.ifsc,
            sp.payout.account_no,
            spsid.0,
          ],
        )?;
        Ok(sp)
      })
      .await?;

    tracing::info!(%spsid, "updated service provider");
    Ok(updated)
  }

  async fn attach_tag(&self, spsid: ServiceProviderId, tag_id: TagId) -> Result<Vec<TagId>> {
    self
      .write(move |tx| {
        let mut sp = editable_service_provider(tx, spsid)?;
        if sp.tags.contains(&tag_id) {
          return Err(CoreError::TagAlreadyAttached(tag_id).into());
        }
        if sp.tags.len() >= MAX_TAGS {
          return Err(
            CoreError::TooManyTags {
              count: sp.tags.len() + 1,
              max:   MAX_TAGS,
            }
            .into(),
          );
        }
        require_live_tag(tx, tag_id)?;
        sp.tags.push(tag_id);
        store_tags(tx, spsid, &sp.tags)?;
        Ok(sp.tags)
      })
      .await
  }

  async fn detach_tag(&self, spsid: ServiceProviderId, tag_id: TagId) -> Result<Vec<TagId>> {
    self
      .write(move |tx| {
        let mut sp = editable_service_provider(tx, spsid)?;
        let before = sp.tags.len();
        sp.tags.retain(|t| *t != tag_id);
        if sp.tags.len() == before {
          return Err(CoreError::not_found("attached tag", tag_id).into());
        }
        store_tags(tx, spsid, &sp.tags)?;
        Ok(sp.tags)
      })
      .await
  }
}
