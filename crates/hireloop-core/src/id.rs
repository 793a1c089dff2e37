//! Typed row identifiers.
//!
//! Every table keys its rows by a storage-assigned integer. Wrapping each in
//! its own newtype keeps a `CustomerId` from ever being passed where a
//! `ServiceProviderId` is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! row_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(pub i64);

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
      }
    }

    impl From<i64> for $name {
      fn from(raw: i64) -> Self { Self(raw) }
    }
  };
}

row_id!(
  /// Primary key of the `accounts` table.
  AccountId
);
row_id!(
  /// Primary key of the `customer` table.
  CustomerId
);
row_id!(
  /// Primary key (`spsid`) of the `service_provider` table.
  ServiceProviderId
);
row_id!(
  /// Primary key (`vid`) of the `verifiers` table.
  VerifierId
);
row_id!(
  /// Primary key (`ssid`) of the `support_staff` table.
  SupportStaffId
);
row_id!(CategoryId);
row_id!(SubCategoryId);
row_id!(TagId);
row_id!(
  /// Appointment identifier; stable across the pending, active and archive
  /// tables an appointment moves through.
  AppointmentId
);
row_id!(HandledRequestId);
