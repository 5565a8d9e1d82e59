//! Ordered feature and product lists, plus the per-product image gallery.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, upload::ImageSlot};

/// Which ordered list an item belongs to. Both lists share one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
  Feature,
  Product,
}

impl CatalogKind {
  /// URL segment and form prefix, e.g. `/admin/feature/add`.
  pub fn slug(self) -> &'static str {
    match self {
      CatalogKind::Feature => "feature",
      CatalogKind::Product => "product",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      CatalogKind::Feature => "Feature",
      CatalogKind::Product => "Product",
    }
  }

  /// Name of the multipart file field carrying the item image.
  pub fn image_field(self) -> &'static str {
    match self {
      CatalogKind::Feature => "feature_image",
      CatalogKind::Product => "product_image",
    }
  }

  pub fn image_slot(self) -> ImageSlot {
    match self {
      CatalogKind::Feature => ImageSlot::Feature,
      CatalogKind::Product => ImageSlot::Product,
    }
  }
}

impl FromStr for CatalogKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "feature" => Ok(CatalogKind::Feature),
      "product" => Ok(CatalogKind::Product),
      other => Err(Error::UnknownKind(other.to_owned())),
    }
  }
}

impl fmt::Display for CatalogKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.slug())
  }
}

/// A persisted feature or product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
  pub id:            i64,
  pub kind:          CatalogKind,
  /// Sort key; neither unique nor dense.
  pub display_order: i64,
  pub title:         String,
  pub description:   String,
  /// Legacy glyph shown when no image is set.
  pub icon:          Option<String>,
  /// Local file name or remote URL.
  pub image:         Option<String>,
}

/// Input for creating an item; the store assigns the id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCatalogItem {
  pub display_order: i64,
  pub title:         String,
  pub description:   String,
  pub icon:          Option<String>,
  pub image:         Option<String>,
}

impl NewCatalogItem {
  pub fn into_item(self, id: i64, kind: CatalogKind) -> CatalogItem {
    CatalogItem {
      id,
      kind,
      display_order: self.display_order,
      title: self.title,
      description: self.description,
      icon: self.icon,
      image: self.image,
    }
  }
}

/// Parse a submitted display order; anything unparseable sorts as `0`.
pub fn parse_order(raw: Option<&str>) -> i64 {
  raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

/// One image in a product's gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
  pub id:            i64,
  pub product_id:    i64,
  pub image:         String,
  pub display_order: i64,
  pub created_at:    DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn order_parsing_falls_back_to_zero() {
    assert_eq!(parse_order(Some("3")), 3);
    assert_eq!(parse_order(Some(" -2 ")), -2);
    assert_eq!(parse_order(Some("first")), 0);
    assert_eq!(parse_order(Some("")), 0);
    assert_eq!(parse_order(None), 0);
  }

  #[test]
  fn kinds_round_trip_through_slug() {
    for kind in [CatalogKind::Feature, CatalogKind::Product] {
      assert_eq!(kind.slug().parse::<CatalogKind>().unwrap(), kind);
    }
    assert!("gallery".parse::<CatalogKind>().is_err());
  }
}
