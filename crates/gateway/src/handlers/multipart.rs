//! Buffered multipart form parsing

use axum::extract::Multipart;
use scriptorium_common::errors::{AppError, Result};

/// One uploaded part
#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FormPart {
    /// Content type sent by the client, or `fallback`
    pub fn content_type_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.content_type.as_deref().unwrap_or(fallback)
    }

    /// File name for logs and transcription, falling back to the field name
    pub fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or(&self.name)
    }
}

/// Every part of a multipart request, in arrival order
#[derive(Debug, Default)]
pub struct Form {
    parts: Vec<FormPart>,
}

impl Form {
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut parts = Vec::new();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?.to_vec();
            parts.push(FormPart {
                name,
                file_name,
                content_type,
                bytes,
            });
        }
        Ok(Self { parts })
    }

    /// Text value of a field; blank values count as absent
    pub fn text(&self, name: &str) -> Option<String> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| String::from_utf8_lossy(&p.bytes).trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// First non-empty file part named `name`
    pub fn file(&mut self, name: &str) -> Option<FormPart> {
        let idx = self
            .parts
            .iter()
            .position(|p| p.name == name && !p.bytes.is_empty())?;
        Some(self.parts.remove(idx))
    }

    /// Every non-empty file part named `name`
    pub fn files(&mut self, name: &str) -> Vec<FormPart> {
        let (taken, rest): (Vec<FormPart>, Vec<FormPart>) = std::mem::take(&mut self.parts)
            .into_iter()
            .partition(|p| p.name == name && !p.bytes.is_empty());
        self.parts = rest;
        taken
    }

    pub fn require_text(&self, name: &str) -> Result<String> {
        self.text(name).ok_or_else(|| missing(name))
    }

    pub fn require_file(&mut self, name: &str) -> Result<FormPart> {
        self.file(name).ok_or_else(|| missing(name))
    }
}

fn missing(name: &str) -> AppError {
    AppError::MissingField {
        field: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn part(name: &str, bytes: &[u8]) -> FormPart {
        FormPart {
            name: name.to_string(),
            file_name: None,
            content_type: None,
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_text_fields() {
        let form = Form {
            parts: vec![part("title", b"  Attention  "), part("blank", b"   ")],
        };
        assert_eq!(form.text("title").as_deref(), Some("Attention"));
        assert!(form.text("blank").is_none());
        assert!(matches!(
            form.require_text("missing"),
            Err(AppError::MissingField { field }) if field == "missing"
        ));
    }

    #[test]
    fn test_files_skip_empty_parts() {
        let mut form = Form {
            parts: vec![
                part("images", b"a"),
                part("images", b""),
                part("audio", b"x"),
                part("images", b"b"),
            ],
        };
        let images = form.files("images");
        assert_eq!(images.len(), 2);
        assert_eq!(images[1].bytes, b"b");
        let audio = assert_ok!(form.require_file("audio"));
        assert_eq!(audio.display_name(), "audio");
        assert_err!(form.require_file("audio"));
    }
}
