//! Handlers for the appointment lifecycle.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/appointments` | Customer only. 409 if the slot overlaps a scheduled one |
//! | `GET`  | `/appointments/:id` | Either party, or support staff |
//! | `POST` | `/appointments/:id/accept` | Provider only |
//! | `POST` | `/appointments/:id/reject` | Provider only |
//! | `POST` | `/appointments/:id/cancel` | Either party |
//! | `POST` | `/appointments/:id/complete` | Provider only. Body: `{"feedback":..,"rating":..,"payment":..}` |
//! | `GET`  | `/appointments/:id/handlers` | Oldest assignment first |
//! | `POST` | `/appointments/:id/handlers` | Support staff assign themselves |
//! | `GET`  | `/customers/:id/appointments` | Owner only |
//! | `GET`  | `/service-providers/:id/appointments` | Owner only |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use hireloop_core::{
  booking::{
    Appointment, CancelledBy, Completion, HandledRequest, NewAppointment, ServiceType, TimeSlot,
  },
  id::{AppointmentId, CustomerId, ServiceProviderId},
  profile::{ProfileRef, ProfileType},
  store::{BookingLifecycle, MarketplaceStore},
};
use serde::Deserialize;

use crate::{ApiState, Caller, error::ApiError};

/// How the caller relates to one appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Party {
  Customer,
  Provider,
  Support,
}

fn is_party(caller: &Caller, appt: &Appointment, party: Party) -> bool {
  match party {
    Party::Customer => caller.owns(ProfileRef::Customer(appt.customer_id)),
    Party::Provider => caller.owns(ProfileRef::ServiceProvider(appt.spsid)),
    Party::Support => caller.profile(ProfileType::SupportStaff).is_some(),
  }
}

async fn load<S>(state: &ApiState<S>, id: AppointmentId) -> Result<Appointment, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  state
    .store
    .get_appointment(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("appointment {id} not found")))
}

/// Load `id` and return the first of `allowed` the caller acts as.
async fn load_as<S>(
  state: &ApiState<S>,
  caller: &Caller,
  id: AppointmentId,
  allowed: &[Party],
) -> Result<(Appointment, Party), ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  let appt = load(state, id).await?;
  match allowed.iter().copied().find(|&p| is_party(caller, &appt, p)) {
    Some(p) => Ok((appt, p)),
    None => Err(ApiError::Forbidden(format!(
      "appointment {id} is not available to the caller"
    ))),
  }
}

// ─── Request ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RequestBody {
  pub spsid:        ServiceProviderId,
  pub slot:         TimeSlot,
  pub service_type: ServiceType,
  #[serde(default)]
  pub description:  Option<String>,
}

/// `POST /appointments`
pub async fn request<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Json(body): Json<RequestBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  let customer_id = caller.customer_id()?;
  let appt = state
    .store
    .request_appointment(NewAppointment {
      customer_id,
      spsid: body.spsid,
      slot: body.slot,
      service_type: body.service_type,
      description: body.description,
    })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(appt)))
}

// ─── Read ────────────────────────────────────────────────────────────────────

/// `GET /appointments/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<AppointmentId>,
) -> Result<Json<Appointment>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  let (appt, _) = load_as(
    &state,
    &caller,
    id,
    &[Party::Customer, Party::Provider, Party::Support],
  )
  .await?;
  Ok(Json(appt))
}

/// `GET /customers/:id/appointments`
pub async fn for_customer<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<CustomerId>,
) -> Result<Json<Vec<Appointment>>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  caller.require_owner(ProfileRef::Customer(id))?;
  let appts = state
    .store
    .appointments_for_customer(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(appts))
}

/// `GET /service-providers/:id/appointments`
pub async fn for_provider<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<ServiceProviderId>,
) -> Result<Json<Vec<Appointment>>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  caller.require_owner(ProfileRef::ServiceProvider(id))?;
  let appts = state
    .store
    .appointments_for_provider(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(appts))
}

// ─── Transitions ─────────────────────────────────────────────────────────────

/// `POST /appointments/:id/accept`
pub async fn accept<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<AppointmentId>,
) -> Result<Json<Appointment>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  load_as(&state, &caller, id, &[Party::Provider]).await?;
  let appt = state.store.accept(id).await.map_err(ApiError::store)?;
  Ok(Json(appt))
}

/// `POST /appointments/:id/reject`
pub async fn reject<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<AppointmentId>,
) -> Result<StatusCode, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  load_as(&state, &caller, id, &[Party::Provider]).await?;
  state.store.reject(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /appointments/:id/cancel`
///
/// Records which side cancelled from the caller's relation to the
/// appointment.
pub async fn cancel<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<AppointmentId>,
) -> Result<Json<Appointment>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  let (_, party) = load_as(&state, &caller, id, &[Party::Customer, Party::Provider]).await?;
  let cancelled_by = match party {
    Party::Customer => CancelledBy::Customer,
    _ => CancelledBy::ServiceProvider,
  };
  let appt = state
    .store
    .cancel(id, cancelled_by)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(appt))
}

/// `POST /appointments/:id/complete`
pub async fn complete<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<AppointmentId>,
  Json(body): Json<Completion>,
) -> Result<Json<Appointment>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  load_as(&state, &caller, id, &[Party::Provider]).await?;
  let appt = state
    .store
    .complete(id, body)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(appt))
}

// ─── Support ─────────────────────────────────────────────────────────────────

/// `POST /appointments/:id/handlers`
pub async fn assign<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<AppointmentId>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  let ssid = caller.support_staff_id()?;
  let handled = state
    .store
    .assign_support_staff(ssid, id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(appt_id = %id, ssid = %handled.ssid, "support staff assigned");
  Ok((StatusCode::CREATED, Json(handled)))
}

/// `GET /appointments/:id/handlers`
pub async fn handlers<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<AppointmentId>,
) -> Result<Json<Vec<HandledRequest>>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  load_as(
    &state,
    &caller,
    id,
    &[Party::Customer, Party::Provider, Party::Support],
  )
  .await?;
  let history = state
    .store
    .handling_history(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(history))
}
