//! Categories, sub-categories and tags.
//!
//! Reference data is append-only. A sub-category or tag that needs a new name
//! is deprecated and a replacement appended, so ids used as foreign keys
//! elsewhere keep pointing at the same thing.

use serde::{Deserialize, Serialize};

use crate::id::{CategoryId, SubCategoryId, TagId};

/// The fixed set of top-level categories, seeded at startup.
pub const SEED_CATEGORIES: &[&str] = &[
  "Electrician",
  "Plumber",
  "Carpenter",
  "Women Spa",
  "Men Salon",
  "Home Decor",
  "Cleaning",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub category_id:   CategoryId,
  pub category_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
  pub sub_category_id:   SubCategoryId,
  pub category_id:       CategoryId,
  pub sub_category_name: String,
  pub deprecated:        bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
  pub tag_id:     TagId,
  pub tag_name:   String,
  pub deprecated: bool,
}

/// Escape `%`, `_` and `\` so `prefix` matches literally in a SQL `LIKE`
/// pattern using `ESCAPE '\'`, and append the trailing wildcard.
pub fn like_prefix_pattern(prefix: &str) -> String {
  let mut pattern = String::with_capacity(prefix.len() + 1);
  for c in prefix.to_lowercase().chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn prefix_pattern_is_lowercased_and_escaped() {
    assert_eq!(like_prefix_pattern("Wir"), "wir%");
    assert_eq!(like_prefix_pattern("50%_off"), "50\\%\\_off%");
    assert_eq!(like_prefix_pattern(""), "%");
  }

  #[test]
  fn seed_categories_are_distinct() {
    let mut names = SEED_CATEGORIES.to_vec();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), SEED_CATEGORIES.len());
  }
}
