//! Admin form bodies: URL-encoded or multipart, flattened into one shape.

use axum::{
  extract::{FromRequest, Multipart, Request},
  http::header,
  Form,
};
use bytes::Bytes;

use crate::{error::Error, session::ActiveSession};

/// Name of the hidden field every admin form carries.
pub const CSRF_FIELD: &str = "csrf_token";

/// A file part of a multipart body.
#[derive(Debug, Clone)]
pub struct Upload {
  pub field:     String,
  /// Client-supplied name; never trusted as a path.
  pub file_name: String,
  pub data:      Bytes,
}

/// Text fields and uploads of a submitted form.
///
/// File inputs left empty by the browser (no file name) are dropped, so
/// `upload("logo")` is `Some` only when a file was actually chosen.
#[derive(Debug, Default)]
pub struct FormData {
  fields:  Vec<(String, String)>,
  uploads: Vec<Upload>,
}

impl FormData {
  pub fn new(fields: Vec<(String, String)>, uploads: Vec<Upload>) -> Self {
    Self { fields, uploads }
  }

  /// First value submitted under `name`.
  pub fn get(&self, name: &str) -> Option<&str> {
    self
      .fields
      .iter()
      .find(|(k, _)| k == name)
      .map(|(_, v)| v.as_str())
  }

  /// Like [`get`](Self::get), but blank values count as absent.
  pub fn non_empty(&self, name: &str) -> Option<&str> {
    self.get(name).map(str::trim).filter(|v| !v.is_empty())
  }

  pub fn upload(&self, field: &str) -> Option<&Upload> {
    self.uploads.iter().find(|u| u.field == field)
  }

  pub fn uploads<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Upload> + 'a {
    self.uploads.iter().filter(move |u| u.field == field)
  }

  pub fn verify_csrf(&self, session: &ActiveSession) -> Result<(), Error> {
    session.verify_csrf(self.get(CSRF_FIELD))
  }
}

fn is_multipart(req: &Request) -> bool {
  req
    .headers()
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

impl<S: Send + Sync> FromRequest<S> for FormData {
  type Rejection = Error;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    if !is_multipart(&req) {
      let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, state)
        .await
        .map_err(|e| Error::BadRequest(e.body_text()))?;
      return Ok(Self::new(fields, Vec::new()));
    }

    let mut multipart = Multipart::from_request(req, state)
      .await
      .map_err(|e| Error::BadRequest(e.body_text()))?;

    let mut form = Self::default();
    while let Some(field) = multipart.next_field().await? {
      let name = field.name().unwrap_or_default().to_owned();
      match field.file_name().map(str::to_owned) {
        Some(file_name) => {
          let data = field.bytes().await?;
          if !file_name.is_empty() {
            form.uploads.push(Upload { field: name, file_name, data });
          }
        }
        None => {
          let value = field.text().await?;
          form.fields.push((name, value));
        }
      }
    }
    Ok(form)
  }
}

#[cfg(test)]
mod tests {
  use axum::body::Body;

  use super::*;

  async fn parse(content_type: &str, body: &'static str) -> Result<FormData, Error> {
    let req = Request::builder()
      .method("POST")
      .header(header::CONTENT_TYPE, content_type)
      .body(Body::from(body))
      .unwrap();
    FormData::from_request(req, &()).await
  }

  #[tokio::test]
  async fn urlencoded_fields() {
    let form = parse(
      "application/x-www-form-urlencoded",
      "hero_title=New+Title&csrf_token=abc&blank=",
    )
    .await
    .unwrap();
    assert_eq!(form.get("hero_title"), Some("New Title"));
    assert_eq!(form.get("blank"), Some(""));
    assert_eq!(form.non_empty("blank"), None);
    assert!(form.upload("logo").is_none());
  }

  #[tokio::test]
  async fn multipart_fields_and_files() {
    let body = "--XYZ\r\n\
      Content-Disposition: form-data; name=\"title\"\r\n\r\n\
      Laser\r\n\
      --XYZ\r\n\
      Content-Disposition: form-data; name=\"product_image\"; filename=\"laser.png\"\r\n\
      Content-Type: image/png\r\n\r\n\
      PNGDATA\r\n\
      --XYZ\r\n\
      Content-Disposition: form-data; name=\"logo\"; filename=\"\"\r\n\
      Content-Type: application/octet-stream\r\n\r\n\
      \r\n\
      --XYZ--\r\n";
    let form = parse("multipart/form-data; boundary=XYZ", body).await.unwrap();

    assert_eq!(form.get("title"), Some("Laser"));
    let upload = form.upload("product_image").unwrap();
    assert_eq!(upload.file_name, "laser.png");
    assert_eq!(&upload.data[..], b"PNGDATA");
    assert!(form.upload("logo").is_none());
  }

  #[tokio::test]
  async fn wrong_content_type_is_a_bad_request() {
    assert!(matches!(parse("text/plain", "x").await, Err(Error::BadRequest(_))));
  }
}
