//! JSON REST API for Hireloop.
//!
//! Exposes an axum [`Router`] backed by any
//! [`hireloop_core::store::MarketplaceStore`]. Authentication happens
//! upstream: an identity proxy sets a header carrying the caller's verified
//! email, and [`Caller`] reads it. TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", hireloop_api::api_router(ApiState::new(store.clone())))
//! ```

pub mod accounts;
pub mod booking;
pub mod caller;
pub mod error;
pub mod profiles;
pub mod taxonomy;
pub mod verification;

use std::sync::Arc;

use axum::{
  Router,
  http::HeaderName,
  routing::{get, post, put},
};
use hireloop_core::store::MarketplaceStore;

pub use caller::Caller;
pub use error::ApiError;

/// Header carrying the caller's email when none is configured.
pub const DEFAULT_IDENTITY_HEADER: &str = "x-authenticated-email";

/// Shared state threaded through all handlers.
#[derive(Clone)]
pub struct ApiState<S> {
  pub store:           Arc<S>,
  /// Header the identity proxy writes the verified email into.
  pub identity_header: HeaderName,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      identity_header: HeaderName::from_static(DEFAULT_IDENTITY_HEADER),
    }
  }

  pub fn with_identity_header(mut self, header: HeaderName) -> Self {
    self.identity_header = header;
    self
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: MarketplaceStore + Clone + 'static,
{
  Router::new()
    // Identity
    .route("/me", get(accounts::me::<S>))
    .route("/me/profiles", post(accounts::create_profile::<S>))
    .route("/session", post(accounts::session::<S>))
    .route("/accounts/{id}/disable", post(accounts::disable::<S>))
    // Taxonomy
    .route("/categories", get(taxonomy::categories::<S>))
    .route(
      "/categories/{id}/sub-categories",
      get(taxonomy::sub_categories::<S>).post(taxonomy::add_sub_category::<S>),
    )
    .route("/sub-categories", get(taxonomy::sub_categories_by_name::<S>))
    .route("/sub-categories/{id}/tags", get(taxonomy::sub_category_tags::<S>))
    .route(
      "/sub-categories/{id}/deprecate",
      post(taxonomy::deprecate_sub_category::<S>),
    )
    .route("/tags", get(taxonomy::tags::<S>).post(taxonomy::add_tag::<S>))
    .route("/tags/{id}/deprecate", post(taxonomy::deprecate_tag::<S>))
    // Profiles
    .route("/customers/{id}", get(profiles::customer::<S>))
    .route(
      "/service-providers/{id}",
      get(profiles::service_provider::<S>).patch(profiles::update_service_provider::<S>),
    )
    .route(
      "/service-providers/{id}/tags/{tag_id}",
      put(profiles::attach_tag::<S>).delete(profiles::detach_tag::<S>),
    )
    .route("/verifiers/{id}", get(profiles::verifier::<S>))
    .route("/support-staff/{id}", get(profiles::support_staff::<S>))
    // Verification
    .route("/verifications", post(verification::decide::<S>))
    .route("/verifications/pending", get(verification::pending::<S>))
    .route(
      "/service-providers/{id}/verification",
      get(verification::report::<S>),
    )
    // Booking
    .route("/appointments", post(booking::request::<S>))
    .route("/appointments/{id}", get(booking::get_one::<S>))
    .route("/appointments/{id}/accept", post(booking::accept::<S>))
    .route("/appointments/{id}/reject", post(booking::reject::<S>))
    .route("/appointments/{id}/cancel", post(booking::cancel::<S>))
    .route("/appointments/{id}/complete", post(booking::complete::<S>))
    .route(
      "/appointments/{id}/handlers",
      get(booking::handlers::<S>).post(booking::assign::<S>),
    )
    .route(
      "/customers/{id}/appointments",
      get(booking::for_customer::<S>),
    )
    .route(
      "/service-providers/{id}/appointments",
      get(booking::for_provider::<S>),
    )
    .with_state(state)
}

#[cfg(test)]
mod tests;
