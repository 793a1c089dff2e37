//! Handlers for the service taxonomy.
//!
//! Reads are open to any authenticated caller; additions and deprecations
//! need a support-staff profile.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/categories` | The fixed category list |
//! | `GET`  | `/categories/:id/sub-categories` | 404 for an unknown category |
//! | `POST` | `/categories/:id/sub-categories` | Body: `{"sub_category_name":"..","tags":[..]}` |
//! | `GET`  | `/sub-categories` | Required `?category_name=` |
//! | `GET`  | `/sub-categories/:id/tags` | |
//! | `POST` | `/sub-categories/:id/deprecate` | |
//! | `GET`  | `/tags` | Optional `?prefix=`, case-insensitive |
//! | `POST` | `/tags` | Body: `{"tag_name":".."}`; 409 if taken |
//! | `POST` | `/tags/:id/deprecate` | |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use hireloop_core::{
  id::{CategoryId, SubCategoryId, TagId},
  store::{MarketplaceStore, TaxonomyStore},
  taxonomy::{Category, SubCategory, Tag},
};
use serde::Deserialize;

use crate::{ApiState, Caller, error::ApiError};

// ─── Categories ──────────────────────────────────────────────────────────────

/// `GET /categories`
pub async fn categories<S>(
  State(state): State<ApiState<S>>,
  _caller: Caller,
) -> Result<Json<Vec<Category>>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  let categories = state
    .store
    .list_categories()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(categories))
}

// ─── Sub-categories ──────────────────────────────────────────────────────────

/// `GET /categories/:id/sub-categories`
pub async fn sub_categories<S>(
  State(state): State<ApiState<S>>,
  _caller: Caller,
  Path(id): Path<CategoryId>,
) -> Result<Json<Vec<SubCategory>>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  let subs = state
    .store
    .list_sub_categories(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(subs))
}

#[derive(Debug, Deserialize)]
pub struct ByNameParams {
  pub category_name: String,
}

/// `GET /sub-categories?category_name=<name>`
pub async fn sub_categories_by_name<S>(
  State(state): State<ApiState<S>>,
  _caller: Caller,
  Query(params): Query<ByNameParams>,
) -> Result<Json<Vec<SubCategory>>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  let subs = state
    .store
    .list_sub_categories_by_name(&params.category_name)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(subs))
}

#[derive(Debug, Deserialize)]
pub struct NewSubCategoryBody {
  pub sub_category_name: String,
  #[serde(default)]
  pub tags:              Vec<TagId>,
}

/// `POST /categories/:id/sub-categories`
pub async fn add_sub_category<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<CategoryId>,
  Json(body): Json<NewSubCategoryBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  caller.support_staff_id()?;
  let sub = state
    .store
    .add_sub_category(id, body.sub_category_name, body.tags)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(sub)))
}

/// `POST /sub-categories/:id/deprecate`
pub async fn deprecate_sub_category<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<SubCategoryId>,
) -> Result<StatusCode, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  caller.support_staff_id()?;
  state
    .store
    .deprecate_sub_category(id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Tags ────────────────────────────────────────────────────────────────────

/// `GET /sub-categories/:id/tags`
pub async fn sub_category_tags<S>(
  State(state): State<ApiState<S>>,
  _caller: Caller,
  Path(id): Path<SubCategoryId>,
) -> Result<Json<Vec<Tag>>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  let tags = state
    .store
    .tags_for_sub_category(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(tags))
}

#[derive(Debug, Default, Deserialize)]
pub struct TagParams {
  pub prefix: Option<String>,
}

/// `GET /tags[?prefix=<text>]`
pub async fn tags<S>(
  State(state): State<ApiState<S>>,
  _caller: Caller,
  Query(params): Query<TagParams>,
) -> Result<Json<Vec<Tag>>, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  let tags = state
    .store
    .list_tags(params.prefix.as_deref())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(tags))
}

#[derive(Debug, Deserialize)]
pub struct NewTagBody {
  pub tag_name: String,
}

/// `POST /tags`
pub async fn add_tag<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Json(body): Json<NewTagBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  caller.support_staff_id()?;
  let tag = state
    .store
    .add_tag(body.tag_name)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(tag)))
}

/// `POST /tags/:id/deprecate`
pub async fn deprecate_tag<S>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  Path(id): Path<TagId>,
) -> Result<StatusCode, ApiError>
where
  S: MarketplaceStore + Clone + 'static,
{
  caller.support_staff_id()?;
  state
    .store
    .deprecate_tag(id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
