//! Storage for uploaded images: the local `static/images` tree, or a
//! Cloudinary account when one is configured.
//!
//! Storage failures never fail the request. They are logged and the caller
//! carries on without an image reference.

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
  time::Duration,
};

use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use vitrine_core::upload::{ImageSlot, LOGO_FILE_NAME, is_plain_file_name, stored_file_name};

use crate::{ServerConfig, form::Upload};

const CLOUDINARY_API: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Error)]
pub enum MediaError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
  #[error("remote store rejected the request ({status}): {body}")]
  Rejected { status: u16, body: String },
  #[error("remote store returned no URL")]
  MissingUrl,
  #[error("cannot derive a public id from {0:?}")]
  BadReference(String),
}

// ─── Remote store ────────────────────────────────────────────────────────────

/// Signed Cloudinary upload API client.
#[derive(Clone)]
pub struct RemoteMedia {
  client:     reqwest::Client,
  cloud_name: String,
  api_key:    String,
  api_secret: String,
  folder:     String,
}

#[derive(Deserialize)]
struct UploadResponse {
  secure_url: Option<String>,
}

#[derive(Deserialize)]
struct DestroyResponse {
  result: String,
}

fn is_placeholder(value: &str) -> bool {
  let value = value.trim();
  value.is_empty() || value.starts_with("your_") || value.starts_with("your-")
}

impl RemoteMedia {
  /// `None` unless all three credentials are set to real values.
  pub fn from_config(config: &ServerConfig) -> Result<Option<Self>, reqwest::Error> {
    let (Some(cloud_name), Some(api_key), Some(api_secret)) = (
      config.cloudinary_cloud_name.as_deref(),
      config.cloudinary_api_key.as_deref(),
      config.cloudinary_api_secret.as_deref(),
    ) else {
      return Ok(None);
    };
    if [cloud_name, api_key, api_secret].into_iter().any(is_placeholder) {
      tracing::warn!("cloudinary credentials look like placeholders; using local storage");
      return Ok(None);
    }

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Some(Self {
      client,
      cloud_name: cloud_name.to_owned(),
      api_key: api_key.to_owned(),
      api_secret: api_secret.to_owned(),
      folder: config.cloudinary_folder.clone(),
    }))
  }

  pub fn cloud_name(&self) -> &str { &self.cloud_name }

  /// Request signature: sha256 over the sorted `k=v` pairs joined with `&`,
  /// followed by the API secret.
  fn sign(&self, params: &[(&str, &str)]) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by_key(|(k, _)| *k);
    let joined = sorted
      .iter()
      .map(|(k, v)| format!("{k}={v}"))
      .collect::<Vec<_>>()
      .join("&");
    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(self.api_secret.as_bytes());
    hex::encode(hasher.finalize())
  }

  fn endpoint(&self, action: &str) -> String {
    format!("{CLOUDINARY_API}/{}/image/{action}", self.cloud_name)
  }

  /// Upload into `<folder>/<slot folder>` and return the HTTPS URL.
  pub async fn upload(&self, slot: ImageSlot, name: &str, data: Bytes) -> Result<String, MediaError> {
    let folder = format!("{}/{}", self.folder, slot.folder());
    let timestamp = Utc::now().timestamp().to_string();
    let signature = self.sign(&[("folder", folder.as_str()), ("timestamp", timestamp.as_str())]);

    let file = reqwest::multipart::Part::bytes(data.to_vec()).file_name(name.to_owned());
    let form = reqwest::multipart::Form::new()
      .part("file", file)
      .text("api_key", self.api_key.clone())
      .text("timestamp", timestamp)
      .text("folder", folder)
      .text("signature", signature)
      .text("signature_algorithm", "sha256");

    let resp = self
      .client
      .post(self.endpoint("upload"))
      .multipart(form)
      .send()
      .await?;
    if !resp.status().is_success() {
      let status = resp.status().as_u16();
      let body = resp.text().await.unwrap_or_default();
      return Err(MediaError::Rejected { status, body });
    }

    let body: UploadResponse = resp.json().await?;
    body.secure_url.ok_or(MediaError::MissingUrl)
  }

  /// Delete the asset behind a delivery URL.
  pub async fn destroy(&self, url: &str) -> Result<bool, MediaError> {
    let public_id =
      public_id_from_url(url).ok_or_else(|| MediaError::BadReference(url.to_owned()))?;
    let timestamp = Utc::now().timestamp().to_string();
    let signature = self.sign(&[("public_id", public_id.as_str()), ("timestamp", timestamp.as_str())]);

    let resp = self
      .client
      .post(self.endpoint("destroy"))
      .form(&[
        ("public_id", public_id.as_str()),
        ("timestamp", timestamp.as_str()),
        ("api_key", self.api_key.as_str()),
        ("signature", signature.as_str()),
        ("signature_algorithm", "sha256"),
      ])
      .send()
      .await?;
    if !resp.status().is_success() {
      let status = resp.status().as_u16();
      let body = resp.text().await.unwrap_or_default();
      return Err(MediaError::Rejected { status, body });
    }

    let body: DestroyResponse = resp.json().await?;
    Ok(body.result == "ok")
  }
}

/// Public id of a Cloudinary delivery URL: the path after `upload/`, minus
/// an optional `v<digits>` version segment and the file extension.
///
/// `https://res.cloudinary.com/demo/image/upload/v17/site/products/a.png`
/// → `site/products/a`.
pub fn public_id_from_url(url: &str) -> Option<String> {
  let path = url.split(['?', '#']).next()?;
  let mut segments = path.split('/').skip_while(|s| *s != "upload").skip(1).peekable();

  if let Some(first) = segments.peek()
    && first.len() > 1
    && first.starts_with('v')
    && first[1..].bytes().all(|b| b.is_ascii_digit())
  {
    segments.next();
  }

  let rest: Vec<&str> = segments.filter(|s| !s.is_empty()).collect();
  let (&last, dirs) = rest.split_last()?;
  let stem = match last.rsplit_once('.') {
    Some((stem, _)) if !stem.is_empty() => stem,
    _ => last,
  };

  let mut id = dirs.join("/");
  if !id.is_empty() {
    id.push('/');
  }
  id.push_str(stem);
  Some(id)
}

// ─── Media store ─────────────────────────────────────────────────────────────

/// Where uploaded images go and how stored references become URLs.
pub struct MediaStore {
  static_dir: PathBuf,
  remote:     Option<RemoteMedia>,
}

impl MediaStore {
  pub fn new(static_dir: impl Into<PathBuf>, remote: Option<RemoteMedia>) -> Self {
    Self { static_dir: static_dir.into(), remote }
  }

  pub fn from_config(config: &ServerConfig) -> Result<Self, reqwest::Error> {
    let remote = RemoteMedia::from_config(config)?;
    match &remote {
      Some(r) => tracing::info!(cloud = r.cloud_name(), "storing uploads on cloudinary"),
      None => tracing::info!(dir = %config.static_dir.display(), "storing uploads locally"),
    }
    Ok(Self::new(&config.static_dir, remote))
  }

  pub fn is_remote(&self) -> bool { self.remote.is_some() }

  pub fn slot_dir(&self, slot: ImageSlot) -> PathBuf {
    self.static_dir.join("images").join(slot.folder())
  }

  pub fn logo_path(&self) -> PathBuf { self.static_dir.join("images").join(LOGO_FILE_NAME) }

  /// Persist an already validated upload.
  ///
  /// Returns the reference to record: a URL for remote storage, otherwise
  /// the stored file name. `None` means storage failed and was logged.
  pub async fn store(&self, slot: ImageSlot, upload: &Upload) -> Option<String> {
    let name = stored_file_name(slot, &upload.file_name, Utc::now());

    if let Some(remote) = &self.remote {
      return match remote.upload(slot, &name, upload.data.clone()).await {
        Ok(url) => {
          tracing::info!(%url, "uploaded image");
          Some(url)
        }
        Err(e) => {
          tracing::error!(error = %e, file = %upload.file_name, "remote upload failed");
          None
        }
      };
    }

    let dir = self.slot_dir(slot);
    match write_file(&dir, &name, &upload.data).await {
      Ok(()) => {
        tracing::info!(file = %name, "stored image");
        Some(name)
      }
      Err(e) => {
        tracing::error!(error = %e, dir = %dir.display(), "failed to store image");
        None
      }
    }
  }

  /// Overwrite the site logo. Always local, always `images/logo.jpg`.
  pub async fn store_logo(&self, upload: &Upload) -> bool {
    let path = self.logo_path();
    match write_file(&self.static_dir.join("images"), LOGO_FILE_NAME, &upload.data).await {
      Ok(()) => true,
      Err(e) => {
        tracing::error!(error = %e, path = %path.display(), "failed to store logo");
        false
      }
    }
  }

  /// Delete a stored image. Missing files and remote failures are logged,
  /// never returned.
  pub async fn remove(&self, slot: ImageSlot, reference: &str) {
    if reference.starts_with("http") {
      let Some(remote) = &self.remote else {
        tracing::debug!(%reference, "remote image left in place; no remote store configured");
        return;
      };
      match remote.destroy(reference).await {
        Ok(true) => tracing::info!(%reference, "deleted remote image"),
        Ok(false) => tracing::warn!(%reference, "remote image was not deleted"),
        Err(e) => tracing::error!(error = %e, %reference, "remote delete failed"),
      }
      return;
    }

    if !is_plain_file_name(reference) {
      tracing::warn!(%reference, "refusing to delete a path outside the image folder");
      return;
    }

    let path = self.slot_dir(slot).join(reference);
    match tokio::fs::remove_file(&path).await {
      Ok(()) => tracing::info!(path = %path.display(), "deleted image"),
      Err(e) if e.kind() == ErrorKind::NotFound => {}
      Err(e) => tracing::warn!(error = %e, path = %path.display(), "failed to delete image"),
    }
  }

  /// URL a page should use for a stored reference.
  pub fn src(&self, slot: ImageSlot, reference: &str) -> String {
    if reference.starts_with("http") {
      reference.to_owned()
    } else {
      format!("/static/images/{}/{reference}", slot.folder())
    }
  }
}

async fn write_file(dir: &Path, name: &str, data: &[u8]) -> std::io::Result<()> {
  tokio::fs::create_dir_all(dir).await?;
  tokio::fs::write(dir.join(name), data).await
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  fn upload(name: &str) -> Upload {
    Upload {
      field:     "feature_image".into(),
      file_name: name.into(),
      data:      Bytes::from_static(b"GIF89a"),
    }
  }

  #[test]
  fn public_id_skips_version_and_extension() {
    assert_eq!(
      public_id_from_url("https://res.cloudinary.com/demo/image/upload/v1712345/site/products/a.png")
        .as_deref(),
      Some("site/products/a")
    );
    assert_eq!(
      public_id_from_url("https://res.cloudinary.com/demo/image/upload/logo.jpg").as_deref(),
      Some("logo")
    );
    assert_eq!(
      public_id_from_url("https://res.cloudinary.com/demo/image/upload/v2/a.b.webp?x=1").as_deref(),
      Some("a.b")
    );
  }

  #[test]
  fn public_id_needs_an_upload_segment() {
    assert!(public_id_from_url("https://example.com/images/a.png").is_none());
    assert!(public_id_from_url("https://res.cloudinary.com/demo/image/upload/").is_none());
  }

  #[test]
  fn placeholders_disable_remote_storage() {
    let config = ServerConfig {
      cloudinary_cloud_name: Some("your_cloud_name".into()),
      cloudinary_api_key: Some("123".into()),
      cloudinary_api_secret: Some("s".into()),
      ..ServerConfig::default()
    };
    assert!(RemoteMedia::from_config(&config).unwrap().is_none());

    let partial = ServerConfig {
      cloudinary_cloud_name: Some("demo".into()),
      ..ServerConfig::default()
    };
    assert!(RemoteMedia::from_config(&partial).unwrap().is_none());
  }

  #[test]
  fn signature_is_order_independent() {
    let config = ServerConfig {
      cloudinary_cloud_name: Some("demo".into()),
      cloudinary_api_key: Some("key".into()),
      cloudinary_api_secret: Some("secret".into()),
      ..ServerConfig::default()
    };
    let remote = RemoteMedia::from_config(&config).unwrap().unwrap();
    let a = remote.sign(&[("timestamp", "1"), ("folder", "f")]);
    let b = remote.sign(&[("folder", "f"), ("timestamp", "1")]);
    assert_eq!(a, b);

    let mut hasher = Sha256::new();
    hasher.update(b"folder=f&timestamp=1secret");
    assert_eq!(a, hex::encode(hasher.finalize()));
  }

  #[tokio::test]
  async fn local_store_and_remove() {
    let dir = TempDir::new().unwrap();
    let media = MediaStore::new(dir.path(), None);

    let name = media.store(ImageSlot::Feature, &upload("My Icon.gif")).await.unwrap();
    assert!(name.starts_with("feature_"));
    assert!(name.ends_with("_My_Icon.gif"));
    let path = dir.path().join("images/features").join(&name);
    assert!(path.exists());
    assert_eq!(media.src(ImageSlot::Feature, &name), format!("/static/images/features/{name}"));

    media.remove(ImageSlot::Feature, &name).await;
    assert!(!path.exists());
    // A second removal finds nothing and stays quiet.
    media.remove(ImageSlot::Feature, &name).await;
  }

  #[tokio::test]
  async fn remove_refuses_paths() {
    let dir = TempDir::new().unwrap();
    let victim = dir.path().join("keep.txt");
    tokio::fs::write(&victim, b"x").await.unwrap();

    let media = MediaStore::new(dir.path().join("static"), None);
    media.remove(ImageSlot::Product, "../../keep.txt").await;
    assert!(victim.exists());
  }

  #[tokio::test]
  async fn logo_is_written_to_fixed_path() {
    let dir = TempDir::new().unwrap();
    let media = MediaStore::new(dir.path(), None);
    assert!(media.store_logo(&upload("brand.png")).await);
    assert_eq!(tokio::fs::read(media.logo_path()).await.unwrap(), b"GIF89a");
    assert!(media.logo_path().ends_with("images/logo.jpg"));
  }

  #[test]
  fn remote_references_pass_through() {
    let media = MediaStore::new("static", None);
    let url = "https://res.cloudinary.com/demo/image/upload/a.png";
    assert_eq!(media.src(ImageSlot::Product, url), url);
  }
}
