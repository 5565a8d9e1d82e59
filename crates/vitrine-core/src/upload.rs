//! Upload validation and stored-name derivation.
//!
//! Validation is by file-name extension only; the bytes are never inspected.

use chrono::{DateTime, Utc};
use unicode_normalization::UnicodeNormalization as _;

/// Extensions accepted for image uploads (compared case-insensitively).
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

pub const INVALID_IMAGE_MESSAGE: &str =
  "Invalid image file type. Only JPG, PNG, GIF, and WEBP allowed.";

pub const INVALID_LOGO_MESSAGE: &str =
  "Invalid file type. Only JPG, PNG, GIF, and WEBP files are allowed.";

/// Fixed name the site logo is written under.
pub const LOGO_FILE_NAME: &str = "logo.jpg";

/// Where an uploaded image is filed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
  Feature,
  Product,
  Gallery,
}

impl ImageSlot {
  /// Directory under `images/` (and remote folder suffix).
  pub fn folder(self) -> &'static str {
    match self {
      ImageSlot::Feature => "features",
      ImageSlot::Product => "products",
      ImageSlot::Gallery => "gallery",
    }
  }

  pub fn prefix(self) -> &'static str {
    match self {
      ImageSlot::Feature => "feature",
      ImageSlot::Product => "product",
      ImageSlot::Gallery => "gallery",
    }
  }
}

/// `true` if `file_name` ends in an allow-listed extension.
pub fn is_allowed_image(file_name: &str) -> bool {
  match file_name.rsplit_once('.') {
    Some((_, ext)) => {
      let ext = ext.to_ascii_lowercase();
      ALLOWED_EXTENSIONS.contains(&ext.as_str())
    }
    None => false,
  }
}

/// Reduce a client-supplied file name to a safe ASCII name.
///
/// The name is NFKD-decomposed first, so accented letters keep their base
/// letter (`café` becomes `cafe`) once the combining marks are dropped. Path
/// separators and whitespace collapse to `_`, anything outside
/// `[A-Za-z0-9._-]` is dropped, and leading/trailing `.`/`_` are stripped so
/// the result can never name a parent directory or a hidden file.
pub fn secure_filename(file_name: &str) -> String {
  let spaced: String = file_name
    .nfkd()
    .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
    .filter(char::is_ascii)
    .collect();

  let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

  joined
    .chars()
    .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    .collect::<String>()
    .trim_matches(|c| c == '.' || c == '_')
    .to_owned()
}

/// Collision-resistant name for a stored upload:
/// `<prefix>_<YYYYmmdd_HHMMSS>_<sanitised original>`.
pub fn stored_file_name(slot: ImageSlot, original: &str, at: DateTime<Utc>) -> String {
  let mut name = secure_filename(original);
  if name.is_empty() {
    name = "image".to_owned();
  }
  format!("{}_{}_{}", slot.prefix(), at.format("%Y%m%d_%H%M%S"), name)
}

/// A stored reference is a bare file name, never a path.
pub fn is_plain_file_name(reference: &str) -> bool {
  !reference.is_empty()
    && !reference.contains(['/', '\\'])
    && reference != "."
    && !reference.contains("..")
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn allow_list_is_case_insensitive() {
    assert!(is_allowed_image("photo.JPG"));
    assert!(is_allowed_image("a.b.webp"));
    assert!(is_allowed_image("x.jpeg"));
  }

  #[test]
  fn names_without_allowed_extension_are_rejected() {
    assert!(!is_allowed_image("script.php"));
    assert!(!is_allowed_image("png"));
    assert!(!is_allowed_image("image.png.exe"));
    assert!(!is_allowed_image(""));
    assert!(!is_allowed_image("trailing."));
  }

  #[test]
  fn secure_filename_strips_paths_and_oddities() {
    assert_eq!(secure_filename("My cool movie.mov"), "My_cool_movie.mov");
    assert_eq!(secure_filename("../../../etc/passwd"), "etc_passwd");
    assert_eq!(secure_filename("..\\evil.png"), "evil.png");
    assert_eq!(secure_filename(".hidden.png"), "hidden.png");
    assert_eq!(secure_filename("café.png"), "cafe.png");
    assert_eq!(secure_filename("résumé final.png"), "resume_final.png");
    assert_eq!(secure_filename("ﬁle.png"), "file.png");
    assert_eq!(secure_filename("日本.png"), "png");
  }

  #[test]
  fn stored_name_embeds_slot_and_timestamp() {
    let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
    assert_eq!(
      stored_file_name(ImageSlot::Feature, "hero shot.png", at),
      "feature_20250102_030405_hero_shot.png"
    );
    assert_eq!(
      stored_file_name(ImageSlot::Gallery, "图片", at),
      "gallery_20250102_030405_image"
    );
  }

  #[test]
  fn plain_file_names_only() {
    assert!(is_plain_file_name("feature_1.png"));
    assert!(!is_plain_file_name("../logo.jpg"));
    assert!(!is_plain_file_name("images/a.png"));
    assert!(!is_plain_file_name(""));
  }
}
