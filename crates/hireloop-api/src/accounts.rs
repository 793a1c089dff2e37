//! Handlers for the caller's own identity.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/me` | Every profile linked to the caller's email |
//! | `POST` | `/me/profiles` | Body: a `NewProfile`, tagged by `profile_type` |
//! | `POST` | `/session` | Body: `{"authType":"login"\|"signup"}` |
//! | `POST` | `/accounts/:id/disable` | Only the caller's own accounts |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use hireloop_core::{
  account::{Account, ProfileSummary, local_part},
  id::AccountId,
  profile::{NewCustomer, NewProfile},
  store::{IdentityLinks, MarketplaceStore},
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, Caller, error::ApiError};

// ─── Me ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
  pub email:    String,
  pub profiles: Vec<ProfileSummary>,
}

/// `GET /me`
pub async fn me<S>(caller: Caller) -> Json<MeResponse>
where
  S: MarketplaceStore + Clone + 'static,
{
  Json(MeResponse {
    email:    caller.email,
    profiles: caller.profiles,
  })
}

/// `POST /me/profiles`
pub async fn create_profile<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Json(body): Json<NewProfile>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  let account = state
    .store
    .create_profile_and_link(&caller.email, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(account)))
}

// ─── Session ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
  Login,
  Signup,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBody {
  pub auth_type: AuthType,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
  pub email:    String,
  pub profiles: Vec<ProfileSummary>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message:  Option<String>,
}

/// What a sign-in attempt should do, given whether the email already owns
/// any profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
  /// Log in to the existing profiles.
  Resume,
  /// Log in was requested but there is nothing to log in to.
  Refuse,
  /// First sign-up: create a customer profile for the email.
  Provision,
  /// Sign-up for an email that already has profiles; behaves like a login.
  AlreadyRegistered,
}

pub fn session_action(auth_type: AuthType, has_profiles: bool) -> SessionAction {
  match (auth_type, has_profiles) {
    (AuthType::Login, true) => SessionAction::Resume,
    (AuthType::Login, false) => SessionAction::Refuse,
    (AuthType::Signup, false) => SessionAction::Provision,
    (AuthType::Signup, true) => SessionAction::AlreadyRegistered,
  }
}

/// `POST /session`
pub async fn session<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Json(body): Json<SessionBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  let action = session_action(body.auth_type, !caller.profiles.is_empty());
  tracing::info!(email = %caller.email, ?action, "session requested");

  match action {
    SessionAction::Resume => Ok((
      StatusCode::OK,
      Json(SessionResponse {
        email:    caller.email,
        profiles: caller.profiles,
        message:  None,
      }),
    )),
    SessionAction::Refuse => Err(ApiError::NotFound(
      "Account does not exist. Please sign up instead.".into(),
    )),
    SessionAction::AlreadyRegistered => Ok((
      StatusCode::OK,
      Json(SessionResponse {
        email:    caller.email,
        profiles: caller.profiles,
        message:  Some("Account already exists".into()),
      }),
    )),
    SessionAction::Provision => {
      let profile = NewProfile::Customer(NewCustomer {
        display_name: local_part(&caller.email).to_owned(),
        ..Default::default()
      });
      state
        .store
        .create_profile_and_link(&caller.email, profile)
        .await
        .map_err(ApiError::store)?;
      let profiles = state
        .store
        .resolve_profiles(&caller.email)
        .await
        .map_err(ApiError::store)?;
      Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
          email: caller.email,
          profiles,
          message: None,
        }),
      ))
    }
  }
}

// ─── Disable ─────────────────────────────────────────────────────────────────

/// `POST /accounts/:id/disable`
pub async fn disable<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<AccountId>,
) -> Result<Json<Account>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  if !caller.profiles.iter().any(|p| p.account_id == id) {
    return Err(ApiError::Forbidden(format!(
      "account {id} does not belong to the caller"
    )));
  }
  let account = state
    .store
    .disable_account(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(account))
}
