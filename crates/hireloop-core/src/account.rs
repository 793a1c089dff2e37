//! Accounts: the polymorphic link between an external identity and a profile.
//!
//! An email may own several accounts, one per [`ProfileType`]. The identity
//! provider is trusted to have verified the email; this module only
//! normalises it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  id::AccountId,
  profile::{ProfileRef, ProfileType},
};

/// One `accounts` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
  pub account_id: AccountId,
  pub email:      String,
  pub profile:    ProfileRef,
  pub created_at: DateTime<Utc>,
  /// Soft-disabled accounts are never deleted but no longer resolve.
  pub disabled:   bool,
}

/// One entry of [`crate::store::IdentityLinks::resolve_profiles`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
  pub account_id:   AccountId,
  pub profile_type: ProfileType,
  pub profile_id:   i64,
  /// `None` when the link dangles.
  pub display_name: Option<String>,
  /// The category name for service providers, the role label otherwise.
  pub display_type: Option<String>,
}

impl ProfileSummary {
  pub fn profile_ref(&self) -> ProfileRef {
    ProfileRef::from_parts(self.profile_type, self.profile_id)
  }
}

/// Trim and lower-case an email, rejecting anything without a single `@`
/// separating non-empty parts.
pub fn normalize_email(raw: &str) -> Result<String> {
  let email = raw.trim().to_lowercase();
  match email.split_once('@') {
    Some((local, domain))
      if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
    {
      Ok(email)
    }
    _ => Err(Error::InvalidEmail(raw.to_owned())),
  }
}

/// The part of an email before `@`; used as a fallback display name.
pub fn local_part(email: &str) -> &str {
  email.split_once('@').map_or(email, |(local, _)| local)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalises_case_and_whitespace() {
    assert_eq!(
      normalize_email("  Asha.K@Example.COM ").unwrap(),
      "asha.k@example.com"
    );
  }

  #[test]
  fn rejects_malformed_addresses() {
    for bad in ["", "asha", "@example.com", "asha@", "a@b@c"] {
      assert!(
        matches!(normalize_email(bad), Err(Error::InvalidEmail(_))),
        "{bad:?} should be rejected"
      );
    }
  }

  #[test]
  fn local_part_falls_back_to_whole_string() {
    assert_eq!(local_part("asha@example.com"), "asha");
    assert_eq!(local_part("asha"), "asha");
  }
}
