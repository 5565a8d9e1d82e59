//! The Content singleton — every editable piece of marketing copy on the site.
//!
//! Fields are grouped by page [`Section`]. Each field is addressable by a
//! [`ContentField`] so that section updates, snapshots and rollbacks can work
//! over the field set generically instead of naming each column by hand.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Sections ────────────────────────────────────────────────────────────────

/// A page section whose header copy is edited as one form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
  Hero,
  Features,
  Products,
  Contact,
  General,
}

impl Section {
  pub const ALL: &'static [Section] = &[
    Section::Hero,
    Section::Features,
    Section::Products,
    Section::Contact,
    Section::General,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Section::Hero => "hero",
      Section::Features => "features",
      Section::Products => "products",
      Section::Contact => "contact",
      Section::General => "general",
    }
  }

  /// The content fields edited by this section's form, in display order.
  pub fn fields(self) -> impl Iterator<Item = ContentField> {
    ContentField::ALL
      .iter()
      .copied()
      .filter(move |f| f.section() == self)
  }

  /// History description recorded before this section is overwritten.
  pub fn snapshot_reason(self) -> &'static str {
    match self {
      Section::Hero => "Before hero section update",
      Section::Features => "Before features section update",
      Section::Products => "Before products section update",
      Section::Contact => "Before contact section update",
      Section::General => "Before general settings update",
    }
  }

  pub fn success_message(self) -> &'static str {
    match self {
      Section::Hero => "Hero section updated successfully!",
      Section::Features => "Features section updated successfully!",
      Section::Products => "Products section updated successfully!",
      Section::Contact => "Contact section updated successfully!",
      Section::General => "General settings updated successfully!",
    }
  }

  pub fn title(self) -> &'static str {
    match self {
      Section::Hero => "Hero",
      Section::Features => "Features header",
      Section::Products => "Products header",
      Section::Contact => "Contact",
      Section::General => "General settings",
    }
  }
}

impl FromStr for Section {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Section::ALL
      .iter()
      .copied()
      .find(|section| section.as_str() == s)
      .ok_or_else(|| Error::UnknownSection(s.to_owned()))
  }
}

impl fmt::Display for Section {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Fields ──────────────────────────────────────────────────────────────────

macro_rules! content_fields {
  ($($variant:ident => $name:ident in $section:ident, long: $long:literal;)*) => {
    /// One editable column of the Content singleton.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub enum ContentField {
      $($variant,)*
    }

    impl ContentField {
      /// Every field, in column order.
      pub const ALL: &'static [ContentField] = &[$(ContentField::$variant,)*];

      /// Column name; also the form field name and the snapshot key.
      pub fn as_str(self) -> &'static str {
        match self {
          $(ContentField::$variant => stringify!($name),)*
        }
      }

      pub fn section(self) -> Section {
        match self {
          $(ContentField::$variant => Section::$section,)*
        }
      }

      /// Whether the field holds multi-line prose (rendered as a textarea).
      pub fn is_long(self) -> bool {
        match self {
          $(ContentField::$variant => $long,)*
        }
      }
    }

    /// Values of every editable field.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ContentFields {
      $(pub $name: String,)*
    }

    impl ContentFields {
      pub fn get(&self, field: ContentField) -> &str {
        match field {
          $(ContentField::$variant => &self.$name,)*
        }
      }

      pub fn set(&mut self, field: ContentField, value: String) {
        match field {
          $(ContentField::$variant => self.$name = value,)*
        }
      }
    }
  };
}

content_fields! {
  HeroLabel           => hero_label           in Hero,     long: false;
  HeroTitle           => hero_title           in Hero,     long: false;
  HeroDescription     => hero_description     in Hero,     long: true;
  Stat1Number         => stat1_number         in Hero,     long: false;
  Stat1Text           => stat1_text           in Hero,     long: false;
  Stat2Number         => stat2_number         in Hero,     long: false;
  Stat2Text           => stat2_text           in Hero,     long: false;
  FeaturesLabel       => features_label       in Features, long: false;
  FeaturesTitle       => features_title       in Features, long: false;
  FeaturesDescription => features_description in Features, long: true;
  ProductsLabel       => products_label       in Products, long: false;
  ProductsTitle       => products_title       in Products, long: false;
  ProductsDescription => products_description in Products, long: true;
  ContactTagline      => contact_tagline      in Contact,  long: false;
  ContactTitle        => contact_title        in Contact,  long: false;
  ContactDescription  => contact_description  in Contact,  long: true;
  ContactPhone        => contact_phone        in Contact,  long: false;
  ContactEmail        => contact_email        in Contact,  long: false;
  ContactAddress      => contact_address      in Contact,  long: true;
  CompanyName         => company_name         in General,  long: false;
  CompanyTagline      => company_tagline      in General,  long: false;
  FooterText          => footer_text          in General,  long: true;
}

impl FromStr for ContentField {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    ContentField::ALL
      .iter()
      .copied()
      .find(|field| field.as_str() == s)
      .ok_or_else(|| Error::UnknownField(s.to_owned()))
  }
}

impl fmt::Display for ContentField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Content row ─────────────────────────────────────────────────────────────

/// The canonical Content row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
  pub id:         i64,
  pub fields:     ContentFields,
  pub updated_at: DateTime<Utc>,
}

// ─── Patch ───────────────────────────────────────────────────────────────────

/// A partial update: only the fields present are overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentPatch {
  changes: BTreeMap<ContentField, String>,
}

impl ContentPatch {
  pub fn new() -> Self { Self::default() }

  pub fn set(&mut self, field: ContentField, value: impl Into<String>) -> &mut Self {
    self.changes.insert(field, value.into());
    self
  }

  pub fn get(&self, field: ContentField) -> Option<&str> {
    self.changes.get(&field).map(String::as_str)
  }

  pub fn is_empty(&self) -> bool { self.changes.is_empty() }

  pub fn len(&self) -> usize { self.changes.len() }

  pub fn apply_to(&self, fields: &mut ContentFields) {
    for (field, value) in &self.changes {
      fields.set(*field, value.clone());
    }
  }
}

impl FromIterator<(ContentField, String)> for ContentPatch {
  fn from_iter<I: IntoIterator<Item = (ContentField, String)>>(iter: I) -> Self {
    Self { changes: iter.into_iter().collect() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_field_belongs_to_exactly_one_section() {
    let total: usize = Section::ALL.iter().map(|s| s.fields().count()).sum();
    assert_eq!(total, ContentField::ALL.len());
    assert_eq!(ContentField::ALL.len(), 22);
  }

  #[test]
  fn hero_section_fields() {
    let names: Vec<_> = Section::Hero.fields().map(ContentField::as_str).collect();
    assert_eq!(names, [
      "hero_label",
      "hero_title",
      "hero_description",
      "stat1_number",
      "stat1_text",
      "stat2_number",
      "stat2_text",
    ]);
  }

  #[test]
  fn field_names_parse_back() {
    for field in ContentField::ALL {
      assert_eq!(field.as_str().parse::<ContentField>().unwrap(), *field);
    }
    assert!(matches!("logo".parse::<ContentField>(), Err(Error::UnknownField(_))));
  }

  #[test]
  fn unknown_section_is_rejected() {
    assert_eq!("general".parse::<Section>().unwrap(), Section::General);
    assert!("footer".parse::<Section>().is_err());
  }

  #[test]
  fn patch_only_touches_present_fields() {
    let mut fields = ContentFields {
      hero_title: "Old".into(),
      hero_label: "Label".into(),
      ..Default::default()
    };
    let mut patch = ContentPatch::new();
    patch.set(ContentField::HeroTitle, "New Title");
    patch.apply_to(&mut fields);

    assert_eq!(fields.hero_title, "New Title");
    assert_eq!(fields.hero_label, "Label");
  }
}
