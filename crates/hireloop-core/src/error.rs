//! Error types for `hireloop-core`.

use serde::Serialize;
use thiserror::Error;

use crate::{
  booking::AppointmentPhase,
  id::{AppointmentId, ServiceProviderId, SubCategoryId, TagId, VerifierId},
  profile::{ProfileRef, ProfileType},
  verification::VerificationStatus,
};

/// Coarse classification shared by every layer's error type.
///
/// The API layer maps these onto HTTP status codes; nothing else about an
/// error needs to cross the storage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  /// A referenced entity is absent.
  NotFound,
  /// Uniqueness violation, including a lost race on link or slot creation.
  Conflict,
  /// A polymorphic reference points at a missing row.
  IntegrityViolation,
  /// The operation is forbidden in the entity's current state.
  InvalidState,
  /// Malformed input.
  Validation,
  /// Transient storage failure; the caller may retry.
  Unavailable,
  Internal,
}

/// Implemented by every error type that can surface from a store.
pub trait Classify {
  fn kind(&self) -> ErrorKind;

  fn is_retryable(&self) -> bool { self.kind() == ErrorKind::Unavailable }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: String },

  #[error("{entity} {name:?} already exists")]
  AlreadyExists { entity: &'static str, name: String },

  #[error("{email} already has a {profile_type} profile")]
  LinkExists {
    email:        String,
    profile_type: ProfileType,
  },

  #[error("{0} does not reference an existing profile")]
  DanglingProfile(ProfileRef),

  #[error("unknown profile type: {0:?}")]
  UnknownProfileType(String),

  #[error("invalid email address: {0:?}")]
  InvalidEmail(String),

  #[error("service provider {spsid} is {status} and no longer accepts decisions")]
  NotEligible {
    spsid:  ServiceProviderId,
    status: VerificationStatus,
  },

  #[error(
    "verifier {verifier_id} already decided sub-category {sub_category_id} for \
     service provider {spsid}"
  )]
  DuplicateDecision {
    verifier_id:     VerifierId,
    spsid:           ServiceProviderId,
    sub_category_id: SubCategoryId,
  },

  #[error("service provider {spsid} is {status}; only verified providers are bookable")]
  NotBookable {
    spsid:  ServiceProviderId,
    status: VerificationStatus,
  },

  #[error("requested slot overlaps scheduled appointment {existing}")]
  SlotConflict { existing: AppointmentId },

  #[error("appointment {appt_id} is {state}; cannot {operation}")]
  InvalidState {
    appt_id:   AppointmentId,
    state:     AppointmentPhase,
    operation: &'static str,
  },

  #[error("service provider {0} can only be edited while not verified")]
  ProfileLocked(ServiceProviderId),

  #[error("rating must be between 1 and 5, got {0}")]
  InvalidRating(i64),

  #[error("a service provider may carry at most {max} tags, got {count}")]
  TooManyTags { count: usize, max: usize },

  #[error("tag {0} is already attached")]
  TagAlreadyAttached(TagId),

  #[error("{0}")]
  Validation(String),
}

impl Error {
  pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
    Self::NotFound { entity, id: id.to_string() }
  }
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::NotFound { .. } => ErrorKind::NotFound,
      Self::AlreadyExists { .. }
      | Self::LinkExists { .. }
      | Self::DuplicateDecision { .. }
      | Self::SlotConflict { .. }
      | Self::TagAlreadyAttached(_) => ErrorKind::Conflict,
      Self::DanglingProfile(_) => ErrorKind::IntegrityViolation,
      Self::NotEligible { .. }
      | Self::NotBookable { .. }
      | Self::InvalidState { .. }
      | Self::ProfileLocked(_) => ErrorKind::InvalidState,
      Self::UnknownProfileType(_)
      | Self::InvalidEmail(_)
      | Self::InvalidRating(_)
      | Self::TooManyTags { .. }
      | Self::Validation(_) => ErrorKind::Validation,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
