//! [`IdentityLinks`] for [`SqliteStore`].
//!
//! `accounts.profile_id` has no foreign key: the table it points into depends
//! on `profile_type`. Every insert therefore checks the target row inside the
//! same transaction, and `resolve_profiles` uses one `LEFT JOIN` per profile
//! table so a dangling link shows up with no display name instead of
//! disappearing.

use chrono::Utc;
use hireloop_core::{
  Error as CoreError,
  account::{Account, ProfileSummary, normalize_email},
  id::AccountId,
  profile::{NewProfile, ProfileRef, ProfileType},
  store::IdentityLinks,
  verification::VerificationStatus,
};
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::{
  Result, SqliteStore,
  encode::{RawAccount, encode_dt},
  error::is_unique_violation,
  profiles::{insert_profile, profile_exists},
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn load_account(conn: &Connection, account_id: AccountId) -> Result<Option<Account>> {
  let sql = format!(
    "SELECT {} FROM accounts WHERE account_id = ?1",
    RawAccount::COLUMNS
  );
  conn
    .query_row(&sql, params![account_id.0], RawAccount::from_row)
    .optional()?
    .map(RawAccount::into_account)
    .transpose()
}

fn link_exists(conn: &Connection, email: &str, profile_type: ProfileType) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM accounts WHERE email = ?1 AND profile_type = ?2",
        params![email, profile_type.as_str()],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

/// The enabled account whose provider profile was rejected, if `email` has
/// one. Such a link is re-pointed at a replacement profile instead of
/// refusing it; a disabled account stays disabled and keeps its link.
fn rejected_provider_link(conn: &Connection, email: &str) -> Result<Option<AccountId>> {
  Ok(
    conn
      .query_row(
        "SELECT a.account_id FROM accounts a
         JOIN service_provider sp ON sp.spsid = a.profile_id
         WHERE a.email = ?1 AND a.profile_type = ?2 AND a.disabled = 0
           AND sp.status = ?3",
        params![
          email,
          ProfileType::ServiceProvider.as_str(),
          VerificationStatus::Rejected.as_str()
        ],
        |row| row.get(0),
      )
      .optional()?
      .map(AccountId),
  )
}

/// Insert one `accounts` row after checking uniqueness and the target row.
///
/// The unique constraint on `(email, profile_type)` backs up the explicit
/// check; either way the caller sees `LinkExists`.
fn insert_link(conn: &Connection, email: &str, profile: ProfileRef) -> Result<Account> {
  let profile_type = profile.profile_type();
  let already_linked = || CoreError::LinkExists {
    email: email.to_owned(),
    profile_type,
  };

  if link_exists(conn, email, profile_type)? {
    return Err(already_linked().into());
  }
  if !profile_exists(conn, profile)? {
    return Err(CoreError::DanglingProfile(profile).into());
  }

  let created_at = Utc::now();
  let inserted = conn.execute(
    "INSERT INTO accounts (email, profile_type, profile_id, created_at)
     VALUES (?1, ?2, ?3, ?4)",
    params![
      email,
      profile_type.as_str(),
      profile.raw_id(),
      encode_dt(created_at)
    ],
  );
  match inserted {
    Ok(_) => {}
    Err(e) if is_unique_violation(&e) => return Err(already_linked().into()),
    Err(e) => return Err(e.into()),
  }

  Ok(Account {
    account_id: AccountId(conn.last_insert_rowid()),
    email: email.to_owned(),
    profile,
    created_at,
    disabled: false,
  })
}

/// One joined row of [`IdentityLinks::resolve_profiles`] before decoding.
struct RawSummary {
  account_id:    i64,
  profile_type:  String,
  profile_id:    i64,
  display_name:  Option<String>,
  category_name: Option<String>,
}

impl RawSummary {
  fn into_summary(self) -> Result<ProfileSummary> {
    let profile_type = ProfileType::parse(&self.profile_type)?;
    let display_type = match (&self.display_name, profile_type) {
      (None, _) => None,
      (Some(_), ProfileType::ServiceProvider) => self.category_name,
      (Some(_), t) => Some(t.as_str().to_owned()),
    };
    Ok(ProfileSummary {
      account_id: AccountId(self.account_id),
      profile_type,
      profile_id: self.profile_id,
      display_name: self.display_name,
      display_type,
    })
  }
}

// ─── IdentityLinks impl ──────────────────────────────────────────────────────

impl IdentityLinks for SqliteStore {
  async fn resolve_profiles(&self, email: &str) -> Result<Vec<ProfileSummary>> {
    let email = normalize_email(email)?;
    self
      .read(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT a.account_id, a.profile_type, a.profile_id,
                  COALESCE(c.username, sp.name, v.verifier_name, ss.support_staff_name),
                  cat.category_name
           FROM accounts a
           LEFT JOIN customer c
             ON a.profile_type = 'Customer' AND c.customer_id = a.profile_id
           LEFT JOIN service_provider sp
             ON a.profile_type = 'Service Provider' AND sp.spsid = a.profile_id
           LEFT JOIN categories cat
             ON cat.category_id = sp.category_id
           LEFT JOIN verifiers v
             ON a.profile_type = 'Verifier' AND v.vid = a.profile_id
           LEFT JOIN support_staff ss
             ON a.profile_type = 'Support Staff' AND ss.ssid = a.profile_id
           WHERE a.email = ?1 AND a.disabled = 0
           ORDER BY a.account_id",
        )?;
        let raws = stmt
          .query_map(params![email], |row| {
            Ok(RawSummary {
              account_id:    row.get(0)?,
              profile_type:  row.get(1)?,
              profile_id:    row.get(2)?,
              display_name:  row.get(3)?,
              category_name: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawSummary::into_summary).collect()
      })
      .await
  }

  async fn create_link(&self, email: &str, profile: ProfileRef) -> Result<AccountId> {
    let email = normalize_email(email)?;
    let account = self
      .write(move |tx| insert_link(tx, &email, profile))
      .await?;
    tracing::info!(
      account_id = %account.account_id,
      profile = %account.profile,
      "linked account"
    );
    Ok(account.account_id)
  }

  async fn create_profile_and_link(&self, email: &str, profile: NewProfile) -> Result<Account> {
    let email = normalize_email(email)?;
    profile.validate()?;

    let account = self
      .write(move |tx| {
        let profile_type = profile.profile_type();
        if profile_type == ProfileType::ServiceProvider
          && let Some(account_id) = rejected_provider_link(tx, &email)?
        {
          let replacement = insert_profile(tx, &profile)?;
          tx.execute(
            "UPDATE accounts SET profile_id = ?2 WHERE account_id = ?1",
            params![account_id.0, replacement.raw_id()],
          )?;
          tracing::info!(%account_id, profile = %replacement, "replaced rejected provider");
          return load_account(tx, account_id)?
            .ok_or_else(|| CoreError::not_found("account", account_id).into());
        }

        // Fail before any profile rows are written.
        if link_exists(tx, &email, profile_type)? {
          return Err(CoreError::LinkExists { email, profile_type }.into());
        }
        let profile_ref = insert_profile(tx, &profile)?;
        insert_link(tx, &email, profile_ref)
      })
      .await?;

    tracing::info!(
      account_id = %account.account_id,
      profile = %account.profile,
      "created profile and linked account"
    );
    Ok(account)
  }

  async fn get_account(&self, account_id: AccountId) -> Result<Option<Account>> {
    self.read(move |conn| load_account(conn, account_id)).await
  }

  async fn disable_account(&self, account_id: AccountId) -> Result<Account> {
    let account = self
      .write(move |tx| {
        let n = tx.execute(
          "UPDATE accounts SET disabled = 1 WHERE account_id = ?1",
          params![account_id.0],
        )?;
        if n == 0 {
          return Err(CoreError::not_found("account", account_id).into());
        }
        load_account(tx, account_id)?
          .ok_or_else(|| CoreError::not_found("account", account_id).into())
      })
      .await?;
    tracing::info!(%account_id, "disabled account");
    Ok(account)
  }
}
