//! The authenticated caller, taken from a header set by the identity proxy.
//!
//! The proxy in front of the API has already verified the email; this
//! extractor only normalises it and looks up which profiles it owns.

use axum::{extract::FromRequestParts, http::request::Parts};
use hireloop_core::{
  account::{ProfileSummary, normalize_email},
  id::{CustomerId, ServiceProviderId, SupportStaffId, VerifierId},
  profile::{ProfileRef, ProfileType},
  store::{IdentityLinks, MarketplaceStore},
};

use crate::{ApiState, error::ApiError};

/// An authenticated email plus every enabled profile linked to it.
#[derive(Debug, Clone)]
pub struct Caller {
  pub email:    String,
  pub profiles: Vec<ProfileSummary>,
}

impl Caller {
  /// The caller's profile of type `t`; an email holds at most one.
  pub fn profile(&self, t: ProfileType) -> Option<ProfileRef> {
    self
      .profiles
      .iter()
      .find(|p| p.profile_type == t)
      .map(ProfileSummary::profile_ref)
  }

  pub fn owns(&self, profile: ProfileRef) -> bool {
    self.profiles.iter().any(|p| p.profile_ref() == profile)
  }

  pub fn require_owner(&self, profile: ProfileRef) -> Result<(), ApiError> {
    if self.owns(profile) {
      Ok(())
    } else {
      Err(ApiError::Forbidden(format!("{profile} does not belong to the caller")))
    }
  }

  fn require(&self, t: ProfileType) -> Result<ProfileRef, ApiError> {
    self
      .profile(t)
      .ok_or_else(|| ApiError::Forbidden(format!("caller has no {t} profile")))
  }

  pub fn customer_id(&self) -> Result<CustomerId, ApiError> {
    match self.require(ProfileType::Customer)? {
      ProfileRef::Customer(id) => Ok(id),
      other => Err(mismatch(other)),
    }
  }

  pub fn service_provider_id(&self) -> Result<ServiceProviderId, ApiError> {
    match self.require(ProfileType::ServiceProvider)? {
      ProfileRef::ServiceProvider(id) => Ok(id),
      other => Err(mismatch(other)),
    }
  }

  pub fn verifier_id(&self) -> Result<VerifierId, ApiError> {
    match self.require(ProfileType::Verifier)? {
      ProfileRef::Verifier(id) => Ok(id),
      other => Err(mismatch(other)),
    }
  }

  pub fn support_staff_id(&self) -> Result<SupportStaffId, ApiError> {
    match self.require(ProfileType::SupportStaff)? {
      ProfileRef::SupportStaff(id) => Ok(id),
      other => Err(mismatch(other)),
    }
  }
}

fn mismatch(profile: ProfileRef) -> ApiError {
  ApiError::Store {
    kind:    hireloop_core::ErrorKind::Internal,
    message: format!("profile summary resolved to {profile}"),
  }
}

impl<S> FromRequestParts<ApiState<S>> for Caller
where
  S: MarketplaceStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let raw = parts
      .headers
      .get(&state.identity_header)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthorized)?;
    let email = normalize_email(raw).map_err(|_| ApiError::Unauthorized)?;

    let profiles = state
      .store
      .resolve_profiles(&email)
      .await
      .map_err(ApiError::store)?;
    tracing::debug!(%email, profiles = profiles.len(), "resolved caller");

    Ok(Caller { email, profiles })
  }
}
