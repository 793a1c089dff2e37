//! Verification decisions and the derived provider status.
//!
//! A provider's status is never written directly. It is recomputed from the
//! full set of decisions each time one is recorded, by [`derive_status`].

use std::{collections::HashSet, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::{
  Error, Result,
  id::{ServiceProviderId, SubCategoryId, VerifierId},
};

/// Aggregate verification state of a service-provider profile.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
  #[default]
  #[strum(serialize = "Not Verified")]
  NotVerified,
  #[strum(serialize = "Verified")]
  Verified,
  #[strum(serialize = "Rejected")]
  Rejected,
}

impl VerificationStatus {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn parse(s: &str) -> Result<Self> {
    s.parse()
      .map_err(|_| Error::Validation(format!("unknown verification status: {s:?}")))
  }

  pub fn is_terminal(self) -> bool { !matches!(self, Self::NotVerified) }

  /// The matching value of `to_be_verified_profiles.status`.
  pub fn queue_state(self) -> &'static str {
    match self {
      Self::NotVerified => "Pending",
      Self::Verified => "Verified",
      Self::Rejected => "Rejected",
    }
  }
}

impl fmt::Display for VerificationStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One verifier's judgment on one sub-category of one provider.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
  #[strum(serialize = "Accepted")]
  Accepted,
  #[strum(serialize = "Rejected")]
  Rejected,
}

impl Decision {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn parse(s: &str) -> Result<Self> {
    s.parse()
      .map_err(|_| Error::Validation(format!("unknown decision: {s:?}")))
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationDecision {
  pub verifier_id:     VerifierId,
  pub spsid:           ServiceProviderId,
  pub sub_category_id: SubCategoryId,
  pub decision:        Decision,
  pub decided_at:      DateTime<Utc>,
}

/// Result of recording a decision: the decision and the status it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionOutcome {
  pub decision: VerificationDecision,
  pub status:   VerificationStatus,
}

/// A provider waiting in the verifier queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingVerification {
  pub spsid:         ServiceProviderId,
  pub name:          String,
  pub category_name: String,
  pub offered:       Vec<SubCategoryId>,
  /// Sub-categories with at least one decision so far.
  pub decided:       Vec<SubCategoryId>,
}

/// Everything needed to audit a provider's status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
  pub spsid:          ServiceProviderId,
  pub offered:        Vec<SubCategoryId>,
  pub decisions:      Vec<VerificationDecision>,
  pub stored_status:  VerificationStatus,
  /// [`derive_status`] applied to `offered` and `decisions`.
  pub derived_status: VerificationStatus,
}

impl VerificationReport {
  pub fn is_consistent(&self) -> bool { self.stored_status == self.derived_status }
}

/// Compute a provider's status from its offered sub-categories and every
/// decision recorded against it.
///
/// - any `Rejected` decision makes the whole profile `Rejected`;
/// - otherwise, every offered sub-category needs at least one `Accepted`
///   decision for the profile to be `Verified`;
/// - anything short of that is `NotVerified`.
///
/// A provider offering nothing can never become `Verified`.
pub fn derive_status(
  offered: &[SubCategoryId],
  decisions: &[VerificationDecision],
) -> VerificationStatus {
  if decisions.iter().any(|d| d.decision == Decision::Rejected) {
    return VerificationStatus::Rejected;
  }

  let accepted: HashSet<SubCategoryId> = decisions
    .iter()
    .filter(|d| d.decision == Decision::Accepted)
    .map(|d| d.sub_category_id)
    .collect();

  if !offered.is_empty() && offered.iter().all(|sc| accepted.contains(sc)) {
    VerificationStatus::Verified
  } else {
    VerificationStatus::NotVerified
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn decision(vid: i64, sc: i64, d: Decision) -> VerificationDecision {
    VerificationDecision {
      verifier_id:     VerifierId(vid),
      spsid:           ServiceProviderId(1),
      sub_category_id: SubCategoryId(sc),
      decision:        d,
      decided_at:      Utc::now(),
    }
  }

  const A: SubCategoryId = SubCategoryId(10);
  const B: SubCategoryId = SubCategoryId(20);

  #[test]
  fn no_decisions_is_not_verified() {
    assert_eq!(derive_status(&[A, B], &[]), VerificationStatus::NotVerified);
  }

  #[test]
  fn partial_acceptance_stays_not_verified() {
    let ds = [decision(1, 10, Decision::Accepted)];
    assert_eq!(derive_status(&[A, B], &ds), VerificationStatus::NotVerified);
  }

  #[test]
  fn full_acceptance_verifies() {
    let ds = [
      decision(1, 10, Decision::Accepted),
      decision(2, 20, Decision::Accepted),
    ];
    assert_eq!(derive_status(&[A, B], &ds), VerificationStatus::Verified);
  }

  #[test]
  fn single_rejection_rejects_whole_profile() {
    let ds = [
      decision(1, 10, Decision::Accepted),
      decision(2, 20, Decision::Rejected),
    ];
    assert_eq!(derive_status(&[A, B], &ds), VerificationStatus::Rejected);
  }

  #[test]
  fn rejection_wins_over_acceptance_on_same_sub_category() {
    let ds = [
      decision(1, 10, Decision::Accepted),
      decision(2, 10, Decision::Rejected),
      decision(1, 20, Decision::Accepted),
    ];
    assert_eq!(derive_status(&[A, B], &ds), VerificationStatus::Rejected);
  }

  #[test]
  fn nothing_offered_never_verifies() {
    assert_eq!(derive_status(&[], &[]), VerificationStatus::NotVerified);
  }

  #[test]
  fn derivation_is_order_independent() {
    let mut ds = vec![
      decision(1, 10, Decision::Accepted),
      decision(2, 20, Decision::Accepted),
      decision(3, 20, Decision::Accepted),
    ];
    let forward = derive_status(&[A, B], &ds);
    ds.reverse();
    assert_eq!(forward, derive_status(&[A, B], &ds));
  }

  #[test]
  fn stored_text_matches_schema_enumeration() {
    assert_eq!(VerificationStatus::NotVerified.as_str(), "Not Verified");
    assert_eq!(
      VerificationStatus::parse("Rejected").unwrap(),
      VerificationStatus::Rejected
    );
    assert_eq!(Decision::parse("Accepted").unwrap(), Decision::Accepted);
    assert!(Decision::parse("Maybe").is_err());
  }
}
