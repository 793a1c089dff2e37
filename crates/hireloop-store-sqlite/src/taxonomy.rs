//! [`TaxonomyStore`] for [`SqliteStore`].

use hireloop_core::{
  Error as CoreError,
  id::{CategoryId, SubCategoryId, TagId},
  store::TaxonomyStore,
  taxonomy::{Category, SEED_CATEGORIES, SubCategory, Tag, like_prefix_pattern},
};
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::{Result, SqliteStore, error::is_unique_violation};

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn sub_category_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SubCategory> {
  Ok(SubCategory {
    sub_category_id:   SubCategoryId(row.get(0)?),
    category_id:       CategoryId(row.get(1)?),
    sub_category_name: row.get(2)?,
    deprecated:        row.get(3)?,
  })
}

fn tag_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tag> {
  Ok(Tag {
    tag_id:     TagId(row.get(0)?),
    tag_name:   row.get(1)?,
    deprecated: row.get(2)?,
  })
}

pub(crate) fn category_name(conn: &Connection, id: CategoryId) -> Result<Option<String>> {
  Ok(
    conn
      .query_row(
        "SELECT category_name FROM categories WHERE category_id = ?1",
        params![id.0],
        |r| r.get(0),
      )
      .optional()?,
  )
}

pub(crate) fn get_sub_category(
  conn: &Connection,
  id: SubCategoryId,
) -> Result<Option<SubCategory>> {
  Ok(
    conn
      .query_row(
        "SELECT sub_category_id, category_id, sub_category_name, deprecated
         FROM sub_categories WHERE sub_category_id = ?1",
        params![id.0],
        sub_category_from_row,
      )
      .optional()?,
  )
}

pub(crate) fn get_tag(conn: &Connection, id: TagId) -> Result<Option<Tag>> {
  Ok(
    conn
      .query_row(
        "SELECT tag_id, tag_name, deprecated FROM tags WHERE tag_id = ?1",
        params![id.0],
        tag_from_row,
      )
      .optional()?,
  )
}

/// A tag that exists and has not been deprecated, or `NotFound`.
pub(crate) fn require_live_tag(conn: &Connection, id: TagId) -> Result<Tag> {
  get_tag(conn, id)?
    .filter(|t| !t.deprecated)
    .ok_or_else(|| CoreError::not_found("tag", id).into())
}

fn live_sub_categories(conn: &Connection, category_id: CategoryId) -> Result<Vec<SubCategory>> {
  let mut stmt = conn.prepare(
    "SELECT sub_category_id, category_id, sub_category_name, deprecated
     FROM sub_categories
     WHERE category_id = ?1 AND deprecated = 0
     ORDER BY sub_category_name",
  )?;
  let rows = stmt
    .query_map(params![category_id.0], sub_category_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── TaxonomyStore impl ──────────────────────────────────────────────────────

impl TaxonomyStore for SqliteStore {
  async fn seed_categories(&self) -> Result<usize> {
    let inserted = self
      .write(|tx| {
        let mut stmt =
          tx.prepare("INSERT INTO categories (category_name) VALUES (?1) ON CONFLICT DO NOTHING")?;
        let mut inserted = 0;
        for name in SEED_CATEGORIES {
          inserted += stmt.execute(params![name])?;
        }
        Ok(inserted)
      })
      .await?;
    tracing::info!(inserted, "seeded categories");
    Ok(inserted)
  }

  async fn list_categories(&self) -> Result<Vec<Category>> {
    self
      .read(|conn| {
        let mut stmt =
          conn.prepare("SELECT category_id, category_name FROM categories ORDER BY category_id")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Category {
              category_id:   CategoryId(row.get(0)?),
              category_name: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
  }

  async fn list_sub_categories(&self, category_id: CategoryId) -> Result<Vec<SubCategory>> {
    self
      .read(move |conn| {
        if category_name(conn, category_id)?.is_none() {
          return Err(CoreError::not_found("category", category_id).into());
        }
        live_sub_categories(conn, category_id)
      })
      .await
  }

  async fn list_sub_categories_by_name(&self, category_name: &str) -> Result<Vec<SubCategory>> {
    let name = category_name.to_owned();
    self
      .read(move |conn| {
        let id: Option<i64> = conn
          .query_row(
            "SELECT category_id FROM categories WHERE category_name = ?1",
            params![name],
            |r| r.get(0),
          )
          .optional()?;
        match id {
          Some(id) => live_sub_categories(conn, CategoryId(id)),
          None => Err(CoreError::not_found("category", name).into()),
        }
      })
      .await
  }

  async fn list_tags(&self, prefix: Option<&str>) -> Result<Vec<Tag>> {
    let pattern = like_prefix_pattern(prefix.unwrap_or_default());
    self
      .read(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT tag_id, tag_name, deprecated FROM tags
           WHERE deprecated = 0 AND tag_name_key LIKE ?1 ESCAPE '\\'
           ORDER BY tag_name_key",
        )?;
        let rows = stmt
          .query_map(params![pattern], tag_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
  }

  async fn tags_for_sub_category(&self, sub_category_id: SubCategoryId) -> Result<Vec<Tag>> {
    self
      .read(move |conn| {
        if get_sub_category(conn, sub_category_id)?.is_none() {
          return Err(CoreError::not_found("sub-category", sub_category_id).into());
        }
        let mut stmt = conn.prepare(
          "SELECT t.tag_id, t.tag_name, t.deprecated
           FROM sub_categories_tags st
           JOIN tags t ON t.tag_id = st.tag_id
           WHERE st.sub_category_id = ?1 AND t.deprecated = 0
           ORDER BY t.tag_name_key",
        )?;
        let rows = stmt
          .query_map(params![sub_category_id.0], tag_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
  }

  async fn add_sub_category(
    &self,
    category_id: CategoryId,
    name: String,
    tags: Vec<TagId>,
  ) -> Result<SubCategory> {
    let name = name.trim().to_owned();
    if name.is_empty() {
      return Err(CoreError::Validation("sub-category name must not be empty".into()).into());
    }

    let sub_category = self
      .write(move |tx| {
        if category_name(tx, category_id)?.is_none() {
          return Err(CoreError::not_found("category", category_id).into());
        }
        for tag in &tags {
          require_live_tag(tx, *tag)?;
        }

        let inserted = tx.execute(
          "INSERT INTO sub_categories (category_id, sub_category_name) VALUES (?1, ?2)",
          params![category_id.0, name],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => {
            return Err(
              CoreError::AlreadyExists { entity: "sub-category", name }.into(),
            );
          }
          Err(e) => return Err(e.into()),
        }
        let id = SubCategoryId(tx.last_insert_rowid());

        let mut link = tx.prepare(
          "INSERT OR IGNORE INTO sub_categories_tags (sub_category_id, tag_id) VALUES (?1, ?2)",
        )?;
        for tag in &tags {
          link.execute(params![id.0, tag.0])?;
        }

        Ok(SubCategory {
          sub_category_id: id,
          category_id,
          sub_category_name: name,
          deprecated: false,
        })
      })
      .await?;

    tracing::info!(
      sub_category_id = %sub_category.sub_category_id,
      category_id = %category_id,
      "added sub-category"
    );
    Ok(sub_category)
  }

  async fn add_tag(&self, name: String) -> Result<Tag> {
    let name = name.trim().to_owned();
    if name.is_empty() {
      return Err(CoreError::Validation("tag name must not be empty".into()).into());
    }

    self
      .write(move |tx| {
        let inserted = tx.execute(
          "INSERT INTO tags (tag_name, tag_name_key) VALUES (?1, ?2)",
          params![name, name.to_lowercase()],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => {
            return Err(CoreError::AlreadyExists { entity: "tag", name }.into());
          }
          Err(e) => return Err(e.into()),
        }
        Ok(Tag {
          tag_id:     TagId(tx.last_insert_rowid()),
          tag_name:   name,
          deprecated: false,
        })
      })
      .await
  }

  async fn deprecate_sub_category(&self, sub_category_id: SubCategoryId) -> Result<()> {
    self
      .write(move |tx| {
        let n = tx.execute(
          "UPDATE sub_categories SET deprecated = 1 WHERE sub_category_id = ?1",
          params![sub_category_id.0],
        )?;
        if n == 0 {
          return Err(CoreError::not_found("sub-category", sub_category_id).into());
        }
        Ok(())
      })
      .await?;
    tracing::info!(%sub_category_id, "deprecated sub-category");
    Ok(())
  }

  async fn deprecate_tag(&self, tag_id: TagId) -> Result<()> {
    self
      .write(move |tx| {
        let n =
          tx.execute("UPDATE tags SET deprecated = 1 WHERE tag_id = ?1", params![tag_id.0])?;
        if n == 0 {
          return Err(CoreError::not_found("tag", tag_id).into());
        }
        Ok(())
      })
      .await?;
    tracing::info!(%tag_id, "deprecated tag");
    Ok(())
  }
}
