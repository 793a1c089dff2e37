//! Handlers for the provider verification workflow.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/verifications` | Verifier only. Body: `{"spsid":1,"sub_category_id":2,"decision":"accepted"}` |
//! | `GET`  | `/verifications/pending` | Verifier only |
//! | `GET`  | `/service-providers/:id/verification` | Verifiers and the profile owner |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use hireloop_core::{
  id::{ServiceProviderId, SubCategoryId},
  profile::{ProfileRef, ProfileType},
  store::{MarketplaceStore, VerificationWorkflow},
  verification::{Decision, PendingVerification, VerificationReport},
};
use serde::Deserialize;

use crate::{ApiState, Caller, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct DecisionBody {
  pub spsid:           ServiceProviderId,
  pub sub_category_id: SubCategoryId,
  pub decision:        Decision,
}

/// `POST /verifications`
pub async fn decide<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Json(body): Json<DecisionBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  let vid = caller.verifier_id()?;
  let outcome = state
    .store
    .record_decision(vid, body.spsid, body.sub_category_id, body.decision)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(outcome)))
}

/// `GET /verifications/pending`
pub async fn pending<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
) -> Result<Json<Vec<PendingVerification>>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  caller.verifier_id()?;
  let queue = state
    .store
    .pending_verifications()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(queue))
}

/// `GET /service-providers/:id/verification`
pub async fn report<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<ServiceProviderId>,
) -> Result<Json<VerificationReport>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  if caller.profile(ProfileType::Verifier).is_none() {
    caller.require_owner(ProfileRef::ServiceProvider(id))?;
  }
  let report = state
    .store
    .verification_report(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(report))
}
