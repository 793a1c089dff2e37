//! Storage traits, one per component.
//!
//! The traits are implemented by storage backends (e.g.
//! `hireloop-store-sqlite`). Higher layers (`hireloop-api`) depend on these
//! abstractions, not on any concrete backend, and receive the backend handle
//! explicitly at construction.
//!
//! Every write method is a single atomic unit: either all of its effects are
//! visible to later reads or none are.

use std::future::Future;

use crate::{
  Classify,
  account::{Account, ProfileSummary},
  booking::{Appointment, CancelledBy, Completion, HandledRequest, NewAppointment},
  id::{
    AccountId, AppointmentId, CategoryId, CustomerId, ServiceProviderId, SubCategoryId,
    SupportStaffId, TagId, VerifierId,
  },
  profile::{
    CustomerProfile, NewProfile, ProfileRef, ServiceProviderProfile, ServiceProviderUpdate,
    SupportStaffProfile, VerifierProfile,
  },
  taxonomy::{Category, SubCategory, Tag},
  verification::{Decision, DecisionOutcome, PendingVerification, VerificationReport},
};

/// The error type shared by every trait a backend implements.
pub trait Backend: Send + Sync {
  type Error: std::error::Error + Classify + From<crate::Error> + Send + Sync + 'static;
}

// ─── Taxonomy ────────────────────────────────────────────────────────────────

pub trait TaxonomyStore: Backend {
  /// Insert any missing [`crate::taxonomy::SEED_CATEGORIES`]. Returns how many
  /// were inserted; running it twice inserts nothing the second time.
  fn seed_categories(&self) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn list_categories(&self)
  -> impl Future<Output = Result<Vec<Category>, Self::Error>> + Send + '_;

  /// Non-deprecated sub-categories of `category_id`. Fails with `NotFound`
  /// for an unknown category.
  fn list_sub_categories(
    &self,
    category_id: CategoryId,
  ) -> impl Future<Output = Result<Vec<SubCategory>, Self::Error>> + Send + '_;

  /// As [`Self::list_sub_categories`], looking the category up by name.
  fn list_sub_categories_by_name<'a>(
    &'a self,
    category_name: &'a str,
  ) -> impl Future<Output = Result<Vec<SubCategory>, Self::Error>> + Send + 'a;

  /// Non-deprecated tags whose name starts with `prefix`, case-insensitively.
  fn list_tags<'a>(
    &'a self,
    prefix: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<Tag>, Self::Error>> + Send + 'a;

  fn tags_for_sub_category(
    &self,
    sub_category_id: SubCategoryId,
  ) -> impl Future<Output = Result<Vec<Tag>, Self::Error>> + Send + '_;

  fn add_sub_category(
    &self,
    category_id: CategoryId,
    name: String,
    tags: Vec<TagId>,
  ) -> impl Future<Output = Result<SubCategory, Self::Error>> + Send + '_;

  /// Append a tag. Fails with `Conflict` if the name is taken.
  fn add_tag(&self, name: String) -> impl Future<Output = Result<Tag, Self::Error>> + Send + '_;

  fn deprecate_sub_category(
    &self,
    sub_category_id: SubCategoryId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn deprecate_tag(&self, tag_id: TagId)
  -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Profiles ────────────────────────────────────────────────────────────────

pub trait ProfileRegistry: Backend {
  fn get_customer(
    &self,
    id: CustomerId,
  ) -> impl Future<Output = Result<Option<CustomerProfile>, Self::Error>> + Send + '_;

  fn get_service_provider(
    &self,
    spsid: ServiceProviderId,
  ) -> impl Future<Output = Result<Option<ServiceProviderProfile>, Self::Error>> + Send + '_;

  fn get_verifier(
    &self,
    vid: VerifierId,
  ) -> impl Future<Output = Result<Option<VerifierProfile>, Self::Error>> + Send + '_;

  fn get_support_staff(
    &self,
    ssid: SupportStaffId,
  ) -> impl Future<Output = Result<Option<SupportStaffProfile>, Self::Error>> + Send + '_;

  /// Owner edits; only while the profile is not yet verified or rejected.
  fn update_service_provider(
    &self,
    spsid: ServiceProviderId,
    update: ServiceProviderUpdate,
  ) -> impl Future<Output = Result<ServiceProviderProfile, Self::Error>> + Send + '_;

  /// Attach a tag, returning the new tag set. A sixth tag fails with a
  /// validation error.
  fn attach_tag(
    &self,
    spsid: ServiceProviderId,
    tag_id: TagId,
  ) -> impl Future<Output = Result<Vec<TagId>, Self::Error>> + Send + '_;

  fn detach_tag(
    &self,
    spsid: ServiceProviderId,
    tag_id: TagId,
  ) -> impl Future<Output = Result<Vec<TagId>, Self::Error>> + Send + '_;
}

// ─── Identity links ──────────────────────────────────────────────────────────

pub trait IdentityLinks: Backend {
  /// Every enabled account for `email`, with display names fetched from the
  /// profile table each account points at. Unknown emails yield an empty
  /// list.
  fn resolve_profiles<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Vec<ProfileSummary>, Self::Error>> + Send + 'a;

  /// Link `email` to an existing profile.
  ///
  /// Fails with `Conflict` if `email` already has a profile of that type and
  /// with `IntegrityViolation` if `profile` does not reference an existing
  /// row.
  fn create_link<'a>(
    &'a self,
    email: &'a str,
    profile: ProfileRef,
  ) -> impl Future<Output = Result<AccountId, Self::Error>> + Send + 'a;

  /// Create a profile and link it to `email` in one unit. If the link cannot
  /// be created the profile is not created either.
  ///
  /// An email whose service-provider profile was rejected may submit a new
  /// one: its existing account is re-pointed at the replacement.
  fn create_profile_and_link<'a>(
    &'a self,
    email: &'a str,
    profile: NewProfile,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + 'a;

  fn get_account(
    &self,
    account_id: AccountId,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// Soft-disable an account. The row stays; it just stops resolving.
  fn disable_account(
    &self,
    account_id: AccountId,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;
}

// ─── Verification ────────────────────────────────────────────────────────────

pub trait VerificationWorkflow: Backend {
  /// Record one verifier's decision on one offered sub-category and
  /// recompute the provider's status in the same transaction.
  fn record_decision(
    &self,
    verifier_id: VerifierId,
    spsid: ServiceProviderId,
    sub_category_id: SubCategoryId,
    decision: Decision,
  ) -> impl Future<Output = Result<DecisionOutcome, Self::Error>> + Send + '_;

  fn verification_report(
    &self,
    spsid: ServiceProviderId,
  ) -> impl Future<Output = Result<VerificationReport, Self::Error>> + Send + '_;

  /// Providers still awaiting a final status.
  fn pending_verifications(
    &self,
  ) -> impl Future<Output = Result<Vec<PendingVerification>, Self::Error>> + Send + '_;
}

// ─── Booking ─────────────────────────────────────────────────────────────────

pub trait BookingLifecycle: Backend {
  fn request_appointment(
    &self,
    input: NewAppointment,
  ) -> impl Future<Output = Result<Appointment, Self::Error>> + Send + '_;

  /// Requested → Scheduled.
  fn accept(
    &self,
    appt_id: AppointmentId,
  ) -> impl Future<Output = Result<Appointment, Self::Error>> + Send + '_;

  /// Drop a request that was never scheduled. Nothing is archived.
  fn reject(
    &self,
    appt_id: AppointmentId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Scheduled → Cancelled.
  fn cancel(
    &self,
    appt_id: AppointmentId,
    cancelled_by: CancelledBy,
  ) -> impl Future<Output = Result<Appointment, Self::Error>> + Send + '_;

  /// Scheduled → Completed.
  fn complete(
    &self,
    appt_id: AppointmentId,
    completion: Completion,
  ) -> impl Future<Output = Result<Appointment, Self::Error>> + Send + '_;

  fn assign_support_staff(
    &self,
    ssid: SupportStaffId,
    appt_id: AppointmentId,
  ) -> impl Future<Output = Result<HandledRequest, Self::Error>> + Send + '_;

  /// The latest assignment for `appt_id`, if any.
  fn current_handler(
    &self,
    appt_id: AppointmentId,
  ) -> impl Future<Output = Result<Option<HandledRequest>, Self::Error>> + Send + '_;

  /// Every assignment for `appt_id`, oldest first.
  fn handling_history(
    &self,
    appt_id: AppointmentId,
  ) -> impl Future<Output = Result<Vec<HandledRequest>, Self::Error>> + Send + '_;

  /// Look an appointment up in whichever lifecycle table holds it.
  fn get_appointment(
    &self,
    appt_id: AppointmentId,
  ) -> impl Future<Output = Result<Option<Appointment>, Self::Error>> + Send + '_;

  fn appointments_for_provider(
    &self,
    spsid: ServiceProviderId,
  ) -> impl Future<Output = Result<Vec<Appointment>, Self::Error>> + Send + '_;

  fn appointments_for_customer(
    &self,
    customer_id: CustomerId,
  ) -> impl Future<Output = Result<Vec<Appointment>, Self::Error>> + Send + '_;
}

/// Everything the API layer needs from one backend.
pub trait MarketplaceStore:
  TaxonomyStore + ProfileRegistry + IdentityLinks + VerificationWorkflow + BookingLifecycle
{
}

impl<T> MarketplaceStore for T where
  T: TaxonomyStore + ProfileRegistry + IdentityLinks + VerificationWorkflow + BookingLifecycle
{
}
