//! Role-specific profiles and the closed `ProfileType → table` mapping.
//!
//! Every account row points at exactly one profile. Which table that profile
//! lives in is decided by [`ProfileType`]; the pairing of type and row id is
//! carried around as a [`ProfileRef`] so the dispatch stays exhaustive.

use std::{collections::HashSet, fmt};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::{
  Error, Result,
  id::{CategoryId, CustomerId, ServiceProviderId, SubCategoryId, SupportStaffId, TagId, VerifierId},
  verification::VerificationStatus,
};

/// Maximum number of tags a service-provider profile may carry.
pub const MAX_TAGS: usize = 5;

/// Maximum length of a service-provider description, in words.
pub const MAX_DESCRIPTION_WORDS: usize = 250;

// ─── Profile type ────────────────────────────────────────────────────────────

/// The role a profile plays. The textual form (`"Service Provider"`) is what
/// the `accounts.profile_type` column stores.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  EnumString,
  IntoStaticStr,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum ProfileType {
  #[strum(serialize = "Customer")]
  Customer,
  #[strum(serialize = "Service Provider")]
  ServiceProvider,
  #[strum(serialize = "Verifier")]
  Verifier,
  #[strum(serialize = "Support Staff")]
  SupportStaff,
}

impl ProfileType {
  /// Parse the stored textual form. Anything outside the closed set is
  /// rejected rather than stored.
  pub fn parse(s: &str) -> Result<Self> {
    s.parse()
      .map_err(|_| Error::UnknownProfileType(s.to_owned()))
  }

  pub fn as_str(self) -> &'static str { self.into() }

  /// The table holding profiles of this type.
  pub fn table(self) -> &'static str {
    match self {
      Self::Customer => "customer",
      Self::ServiceProvider => "service_provider",
      Self::Verifier => "verifiers",
      Self::SupportStaff => "support_staff",
    }
  }

  /// The primary-key column of [`Self::table`].
  pub fn key_column(self) -> &'static str {
    match self {
      Self::Customer => "customer_id",
      Self::ServiceProvider => "spsid",
      Self::Verifier => "vid",
      Self::SupportStaff => "ssid",
    }
  }
}

impl fmt::Display for ProfileType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Profile reference ───────────────────────────────────────────────────────

/// A typed pointer at one profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "profile_type", content = "profile_id", rename_all = "snake_case")]
pub enum ProfileRef {
  Customer(CustomerId),
  ServiceProvider(ServiceProviderId),
  Verifier(VerifierId),
  SupportStaff(SupportStaffId),
}

impl ProfileRef {
  pub fn from_parts(profile_type: ProfileType, id: i64) -> Self {
    match profile_type {
      ProfileType::Customer => Self::Customer(CustomerId(id)),
      ProfileType::ServiceProvider => Self::ServiceProvider(ServiceProviderId(id)),
      ProfileType::Verifier => Self::Verifier(VerifierId(id)),
      ProfileType::SupportStaff => Self::SupportStaff(SupportStaffId(id)),
    }
  }

  pub fn profile_type(&self) -> ProfileType {
    match self {
      Self::Customer(_) => ProfileType::Customer,
      Self::ServiceProvider(_) => ProfileType::ServiceProvider,
      Self::Verifier(_) => ProfileType::Verifier,
      Self::SupportStaff(_) => ProfileType::SupportStaff,
    }
  }

  /// The row id inside [`ProfileType::table`].
  pub fn raw_id(&self) -> i64 {
    match self {
      Self::Customer(id) => id.0,
      Self::ServiceProvider(id) => id.0,
      Self::Verifier(id) => id.0,
      Self::SupportStaff(id) => id.0,
    }
  }
}

impl fmt::Display for ProfileRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} #{}", self.profile_type(), self.raw_id())
  }
}

// ─── Customer ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
  pub customer_id:  CustomerId,
  pub display_name: String,
  pub phone:        Option<String>,
  pub address:      Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCustomer {
  pub display_name: String,
  #[serde(default)]
  pub phone:        Option<String>,
  #[serde(default)]
  pub address:      Option<String>,
}

// ─── Service provider ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
  pub phone:   Option<String>,
  pub address: Option<String>,
}

/// Where payouts for completed work are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutDetails {
  pub bank_name:  Option<String>,
  pub ifsc:       Option<String>,
  pub account_no: Option<String>,
}

/// A provider's declared willingness to perform a sub-category of work at a
/// minimum price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategoryOffering {
  pub sub_category_id: SubCategoryId,
  pub min_cost:        Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceProviderProfile {
  pub spsid:       ServiceProviderId,
  /// Public identifier handed out to clients (`sp_<uuid>`).
  pub external_id: String,
  /// Fixed at creation.
  pub category_id: CategoryId,
  pub name:        String,
  pub contact:     ContactDetails,
  pub description: Option<String>,
  pub payout:      PayoutDetails,
  pub tags:        Vec<TagId>,
  pub offerings:   Vec<SubCategoryOffering>,
  /// Derived from verification decisions; see [`crate::verification`].
  pub status:      VerificationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewServiceProvider {
  pub category_id: CategoryId,
  pub name:        String,
  #[serde(default)]
  pub contact:     ContactDetails,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub payout:      PayoutDetails,
  pub offerings:   Vec<SubCategoryOffering>,
  #[serde(default)]
  pub tags:        Vec<TagId>,
}

impl NewServiceProvider {
  /// Shape checks that need no storage access. Referential checks (category,
  /// sub-category membership, tag existence) happen in the store.
  pub fn validate(&self) -> Result<()> {
    validate_name(&self.name)?;
    validate_description(self.description.as_deref())?;
    validate_tags(&self.tags)?;

    if self.offerings.is_empty() {
      return Err(Error::Validation(
        "at least one sub-category offering is required".into(),
      ));
    }
    let mut seen = HashSet::new();
    for offering in &self.offerings {
      if offering.min_cost <= Decimal::ZERO {
        return Err(Error::Validation(format!(
          "minimum cost for sub-category {} must be positive",
          offering.sub_category_id
        )));
      }
      if !seen.insert(offering.sub_category_id) {
        return Err(Error::Validation(format!(
          "sub-category {} offered more than once",
          offering.sub_category_id
        )));
      }
    }
    Ok(())
  }
}

/// Owner edits to a provider profile. The category and offerings are not
/// editable; a provider wanting different ones submits a new profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceProviderUpdate {
  pub name:        Option<String>,
  pub contact:     Option<ContactDetails>,
  pub description: Option<String>,
  pub payout:      Option<PayoutDetails>,
}

impl ServiceProviderUpdate {
  pub fn validate(&self) -> Result<()> {
    if let Some(name) = &self.name {
      validate_name(name)?;
    }
    validate_description(self.description.as_deref())
  }

  pub fn is_empty(&self) -> bool {
    self.name.is_none()
      && self.contact.is_none()
      && self.description.is_none()
      && self.payout.is_none()
  }
}

// ─── Staff roles ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierProfile {
  pub vid:  VerifierId,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportStaffProfile {
  pub ssid: SupportStaffId,
  pub name: String,
}

// ─── Creation input ──────────────────────────────────────────────────────────

/// Attributes for a profile about to be created and linked to an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "profile_type", rename_all = "snake_case")]
pub enum NewProfile {
  Customer(NewCustomer),
  ServiceProvider(NewServiceProvider),
  Verifier { name: String },
  SupportStaff { name: String },
}

impl NewProfile {
  pub fn profile_type(&self) -> ProfileType {
    match self {
      Self::Customer(_) => ProfileType::Customer,
      Self::ServiceProvider(_) => ProfileType::ServiceProvider,
      Self::Verifier { .. } => ProfileType::Verifier,
      Self::SupportStaff { .. } => ProfileType::SupportStaff,
    }
  }

  pub fn validate(&self) -> Result<()> {
    match self {
      Self::Customer(c) => validate_name(&c.display_name),
      Self::ServiceProvider(sp) => sp.validate(),
      Self::Verifier { name } | Self::SupportStaff { name } => validate_name(name),
    }
  }
}

// ─── Field validation ────────────────────────────────────────────────────────

fn validate_name(name: &str) -> Result<()> {
  if name.trim().is_empty() {
    return Err(Error::Validation("name must not be empty".into()));
  }
  Ok(())
}

fn validate_description(description: Option<&str>) -> Result<()> {
  let words = description.map_or(0, |d| d.split_whitespace().count());
  if words > MAX_DESCRIPTION_WORDS {
    return Err(Error::Validation(format!(
      "description is {words} words; the limit is {MAX_DESCRIPTION_WORDS}"
    )));
  }
  Ok(())
}

/// Tags form a set of at most [`MAX_TAGS`] members.
pub fn validate_tags(tags: &[TagId]) -> Result<()> {
  let distinct: HashSet<_> = tags.iter().collect();
  if distinct.len() != tags.len() {
    return Err(Error::Validation("duplicate tag".into()));
  }
  if tags.len() > MAX_TAGS {
    return Err(Error::TooManyTags { count: tags.len(), max: MAX_TAGS });
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator as _;

  use super::*;

  fn provider() -> NewServiceProvider {
    NewServiceProvider {
      category_id: CategoryId(1),
      name:        "Ravi Electricals".into(),
      contact:     ContactDetails::default(),
      description: Some("Wiring and fixtures".into()),
      payout:      PayoutDetails::default(),
      offerings:   vec![SubCategoryOffering {
        sub_category_id: SubCategoryId(1),
        min_cost:        Decimal::new(25000, 2),
      }],
      tags:        vec![TagId(1), TagId(2)],
    }
  }

  #[test]
  fn profile_type_round_trips_through_stored_text() {
    for t in ProfileType::iter() {
      assert_eq!(ProfileType::parse(t.as_str()).unwrap(), t);
    }
    assert_eq!(ProfileType::ServiceProvider.as_str(), "Service Provider");
  }

  #[test]
  fn unknown_profile_type_is_rejected() {
    let err = ProfileType::parse("Electrician").unwrap_err();
    assert!(matches!(err, Error::UnknownProfileType(ref s) if s == "Electrician"));
  }

  #[test]
  fn every_profile_type_has_its_own_table() {
    let tables: HashSet<_> = ProfileType::iter().map(ProfileType::table).collect();
    assert_eq!(tables.len(), 4);
  }

  #[test]
  fn profile_ref_dispatches_by_type() {
    let r = ProfileRef::from_parts(ProfileType::Verifier, 7);
    assert_eq!(r, ProfileRef::Verifier(VerifierId(7)));
    assert_eq!(r.raw_id(), 7);
    assert_eq!(r.to_string(), "Verifier #7");
  }

  #[test]
  fn valid_provider_passes() {
    provider().validate().unwrap();
  }

  #[test]
  fn sixth_tag_is_rejected() {
    let mut p = provider();
    p.tags = (1..=6).map(TagId).collect();
    assert!(matches!(
      p.validate(),
      Err(Error::TooManyTags { count: 6, max: 5 })
    ));
  }

  #[test]
  fn provider_needs_an_offering_with_positive_cost() {
    let mut p = provider();
    p.offerings.clear();
    assert!(p.validate().is_err());

    let mut p = provider();
    p.offerings[0].min_cost = Decimal::ZERO;
    assert!(p.validate().is_err());
  }

  #[test]
  fn long_description_is_rejected() {
    let mut p = provider();
    p.description = Some("word ".repeat(MAX_DESCRIPTION_WORDS + 1));
    assert!(matches!(p.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn new_profile_deserialises_with_type_tag() {
    let json = r#"{"profile_type":"verifier","name":"Asha"}"#;
    let p: NewProfile = serde_json::from_str(json).unwrap();
    assert_eq!(p.profile_type(), ProfileType::Verifier);
  }
}
