//! Handlers for profile reads and owner edits.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/customers/:id` | 404 if not found |
//! | `GET`    | `/service-providers/:id` | 404 if not found |
//! | `PATCH`  | `/service-providers/:id` | Owner only; 409 once verified or rejected |
//! | `PUT`    | `/service-providers/:id/tags/:tag_id` | Owner only; at most five tags |
//! | `DELETE` | `/service-providers/:id/tags/:tag_id` | Owner only |
//! | `GET`    | `/verifiers/:id` | 404 if not found |
//! | `GET`    | `/support-staff/:id` | 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
};
use hireloop_core::{
  id::{CustomerId, ServiceProviderId, SupportStaffId, TagId, VerifierId},
  profile::{
    CustomerProfile, ProfileRef, ServiceProviderProfile, ServiceProviderUpdate,
    SupportStaffProfile, VerifierProfile,
  },
  store::{MarketplaceStore, ProfileRegistry},
};

use crate::{ApiState, Caller, error::ApiError};

// ─── Reads ───────────────────────────────────────────────────────────────────

/// `GET /customers/:id`
pub async fn customer<S>(
  State(state): State<ApiState<S>>,
  _caller: Caller,
  Path(id): Path<CustomerId>,
) -> Result<Json<CustomerProfile>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  let profile = state
    .store
    .get_customer(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("customer {id} not found")))?;
  Ok(Json(profile))
}

/// `GET /service-providers/:id`
pub async fn service_provider<S>(
  State(state): State<ApiState<S>>,
  _caller: Caller,
  Path(id): Path<ServiceProviderId>,
) -> Result<Json<ServiceProviderProfile>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  let profile = state
    .store
    .get_service_provider(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("service provider {id} not found")))?;
  Ok(Json(profile))
}

/// `GET /verifiers/:id`
pub async fn verifier<S>(
  State(state): State<ApiState<S>>,
  _caller: Caller,
  Path(id): Path<VerifierId>,
) -> Result<Json<VerifierProfile>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  let profile = state
    .store
    .get_verifier(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("verifier {id} not found")))?;
  Ok(Json(profile))
}

/// `GET /support-staff/:id`
pub async fn support_staff<S>(
  State(state): State<ApiState<S>>,
  _caller: Caller,
  Path(id): Path<SupportStaffId>,
) -> Result<Json<SupportStaffProfile>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  let profile = state
    .store
    .get_support_staff(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("support staff {id} not found")))?;
  Ok(Json(profile))
}

// ─── Owner edits ─────────────────────────────────────────────────────────────

/// `PATCH /service-providers/:id`
pub async fn update_service_provider<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<ServiceProviderId>,
  Json(body): Json<ServiceProviderUpdate>,
) -> Result<Json<ServiceProviderProfile>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  caller.require_owner(ProfileRef::ServiceProvider(id))?;
  if body.is_empty() {
    return Err(ApiError::BadRequest("no fields to update".into()));
  }
  let profile = state
    .store
    .update_service_provider(id, body)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(profile))
}

/// `PUT /service-providers/:id/tags/:tag_id`
pub async fn attach_tag<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path((id, tag_id)): Path<(ServiceProviderId, TagId)>,
) -> Result<Json<Vec<TagId>>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  caller.require_owner(ProfileRef::ServiceProvider(id))?;
  let tags = state
    .store
    .attach_tag(id, tag_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(tags))
}

/// `DELETE /service-providers/:id/tags/:tag_id`
pub async fn detach_tag<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path((id, tag_id)): Path<(ServiceProviderId, TagId)>,
) -> Result<Json<Vec<TagId>>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  caller.require_owner(ProfileRef::ServiceProvider(id))?;
  let tags = state
    .store
    .detach_tag(id, tag_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(tags))
}
