//! HTML generation on top of `quick-xml`'s writer.
//!
//! Every text node and attribute value goes through the writer's escaping,
//! so content typed by an admin can never inject markup into a page.

use std::io::Cursor;

use quick_xml::{
  Writer,
  events::{BytesEnd, BytesStart, BytesText, Event},
};

use crate::error::Error;

type Result<T> = std::result::Result<T, Error>;

fn render_err(e: impl std::fmt::Display) -> Error { Error::Render(e.to_string()) }

/// Site-wide stylesheet, inlined into every page.
const STYLE: &str = "
body { font-family: system-ui, sans-serif; margin: 0; color: #1f2933; }
header, main, footer, section { padding: 1.5rem 2rem; }
nav a { margin-right: 1rem; }
.card { border: 1px solid #d9e2ec; border-radius: 6px; padding: 1rem; margin: 0.5rem 0; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(240px, 1fr)); gap: 1rem; }
.alert { padding: 0.75rem 1rem; border-radius: 4px; margin-bottom: 1rem; }
.alert-success { background: #e3f9e5; }
.alert-danger { background: #ffe3e3; }
.thumb { max-width: 160px; max-height: 120px; display: block; }
label { display: block; margin-top: 0.5rem; font-weight: 600; }
input[type=text], input[type=password], input[type=number], input[type=email], textarea { width: 100%; max-width: 40rem; }
table { border-collapse: collapse; }
td, th { border-bottom: 1px solid #d9e2ec; padding: 0.4rem 0.8rem; text-align: left; }
";

/// An HTML document under construction.
pub struct Html {
  writer: Writer<Cursor<Vec<u8>>>,
}

impl Html {
  /// Start a document: doctype, `<head>` with `title`, and an open `<body>`.
  pub fn document(title: &str) -> Result<Self> {
    let mut html = Self { writer: Writer::new(Cursor::new(Vec::new())) };
    html
      .writer
      .write_event(Event::DocType(BytesText::from_escaped("html")))
      .map_err(render_err)?;
    html.open("html", &[("lang", "en")])?;
    html.open("head", &[])?;
    html.void("meta", &[("charset", "utf-8")])?;
    html.void("meta", &[
      ("name", "viewport"),
      ("content", "width=device-width, initial-scale=1"),
    ])?;
    html.element("title", &[], title)?;
    html.open("style", &[])?;
    html
      .writer
      .write_event(Event::Text(BytesText::from_escaped(STYLE)))
      .map_err(render_err)?;
    html.close("style")?;
    html.close("head")?;
    html.open("body", &[])?;
    Ok(html)
  }

  pub fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<&mut Self> {
    let mut start = BytesStart::new(tag);
    for (k, v) in attrs {
      start.push_attribute((*k, *v));
    }
    self.writer.write_event(Event::Start(start)).map_err(render_err)?;
    Ok(self)
  }

  pub fn close(&mut self, tag: &str) -> Result<&mut Self> {
    self
      .writer
      .write_event(Event::End(BytesEnd::new(tag)))
      .map_err(render_err)?;
    Ok(self)
  }

  pub fn text(&mut self, text: &str) -> Result<&mut Self> {
    self
      .writer
      .write_event(Event::Text(BytesText::new(text)))
      .map_err(render_err)?;
    Ok(self)
  }

  /// `<tag attrs>text</tag>`; always written with an explicit end tag, so it
  /// is safe for `textarea`, `a` and other non-void elements with no text.
  pub fn element(&mut self, tag: &str, attrs: &[(&str, &str)], text: &str) -> Result<&mut Self> {
    self.open(tag, attrs)?;
    if !text.is_empty() {
      self.text(text)?;
    }
    self.close(tag)
  }

  /// A void element such as `<input/>`, `<img/>` or `<meta/>`.
  pub fn void(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<&mut Self> {
    let mut start = BytesStart::new(tag);
    for (k, v) in attrs {
      start.push_attribute((*k, *v));
    }
    self.writer.write_event(Event::Empty(start)).map_err(render_err)?;
    Ok(self)
  }

  /// Close `<body>` and `<html>` and return the page.
  pub fn finish(mut self) -> Result<String> {
    self.close("body")?;
    self.close("html")?;
    String::from_utf8(self.writer.into_inner().into_inner()).map_err(render_err)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn document_skeleton() {
    let mut html = Html::document("Admin").unwrap();
    html.element("h1", &[], "Dashboard").unwrap();
    let page = html.finish().unwrap();

    assert!(page.starts_with("<!DOCTYPE html>"), "{page}");
    assert!(page.contains("<title>Admin</title>"));
    assert!(page.contains("<h1>Dashboard</h1>"));
    assert!(page.ends_with("</body></html>"));
  }

  #[test]
  fn text_and_attributes_are_escaped() {
    let mut html = Html::document("t").unwrap();
    html
      .element("p", &[("title", "a\"b")], "<script>alert(1)</script>")
      .unwrap();
    let page = html.finish().unwrap();

    assert!(!page.contains("<script>"));
    assert!(page.contains("&lt;script&gt;"));
    assert!(page.contains("title=\"a&quot;b\""));
  }

  #[test]
  fn empty_textarea_keeps_end_tag() {
    let mut html = Html::document("t").unwrap();
    html.element("textarea", &[("name", "x")], "").unwrap();
    assert!(html.finish().unwrap().contains("<textarea name=\"x\"></textarea>"));
  }
}
