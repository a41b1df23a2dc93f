//! Minimal WordprocessingML writer
//!
//! Produces a package with headings (Title, Heading1-3) and plain paragraphs,
//! enough for Word, LibreOffice and Pages to open.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::errors::ExportError;

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:pPr><w:spacing w:after="160"/></w:pPr><w:rPr><w:sz w:val="22"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:rPr><w:b/><w:sz w:val="56"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="240"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="200"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="28"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="160"/><w:outlineLvl w:val="2"/></w:pPr><w:rPr><w:b/><w:sz w:val="24"/></w:rPr></w:style></w:styles>"#;

#[derive(Debug, Clone, PartialEq)]
enum Block {
    Heading { text: String, level: u8 },
    Paragraph(String),
}

/// Accumulates blocks, then renders the `.docx` package
#[derive(Debug, Default)]
pub struct DocxBuilder {
    blocks: Vec<Block>,
}

fn xml_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Docx(e.to_string())
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level 0 is the document title; 1 to 3 are section headings
    pub fn heading(&mut self, text: impl Into<String>, level: u8) -> &mut Self {
        self.blocks.push(Block::Heading {
            text: text.into(),
            level: level.min(3),
        });
        self
    }

    pub fn paragraph(&mut self, text: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::Paragraph(text.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Render `word/document.xml`
    fn document_xml(&self) -> Result<Vec<u8>, ExportError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_err)?;
        writer
            .write_event(Event::Start(
                BytesStart::new("w:document").with_attributes([("xmlns:w", W_NS)]),
            ))
            .map_err(xml_err)?;
        writer
            .write_event(Event::Start(BytesStart::new("w:body")))
            .map_err(xml_err)?;

        for block in &self.blocks {
            match block {
                Block::Heading { text, level } => {
                    let style = match level {
                        0 => "Title".to_string(),
                        n => format!("Heading{}", n),
                    };
                    write_paragraph(&mut writer, Some(&style), text)?;
                }
                Block::Paragraph(text) => write_paragraph(&mut writer, None, text)?,
            }
        }

        writer
            .write_event(Event::End(BytesEnd::new("w:body")))
            .map_err(xml_err)?;
        writer
            .write_event(Event::End(BytesEnd::new("w:document")))
            .map_err(xml_err)?;

        Ok(writer.into_inner().into_inner())
    }

    /// Render the complete `.docx` package
    pub fn build(&self) -> Result<Vec<u8>, ExportError> {
        let document = self.document_xml()?;

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts: [(&str, &[u8]); 5] = [
            ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
            ("_rels/.rels", PACKAGE_RELS_XML.as_bytes()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.as_bytes()),
            ("word/styles.xml", STYLES_XML.as_bytes()),
            ("word/document.xml", &document),
        ];
        for (name, bytes) in parts {
            zip.start_file(name, options).map_err(xml_err)?;
            zip.write_all(bytes).map_err(xml_err)?;
        }

        Ok(zip.finish().map_err(xml_err)?.into_inner())
    }
}

/// One `w:p`; embedded newlines become `w:br` line breaks
fn write_paragraph<W: Write>(
    writer: &mut Writer<W>,
    style: Option<&str>,
    text: &str,
) -> Result<(), ExportError> {
    writer
        .write_event(Event::Start(BytesStart::new("w:p")))
        .map_err(xml_err)?;

    if let Some(style) = style {
        writer
            .write_event(Event::Start(BytesStart::new("w:pPr")))
            .map_err(xml_err)?;
        writer
            .write_event(Event::Empty(
                BytesStart::new("w:pStyle").with_attributes([("w:val", style)]),
            ))
            .map_err(xml_err)?;
        writer
            .write_event(Event::End(BytesEnd::new("w:pPr")))
            .map_err(xml_err)?;
    }

    writer
        .write_event(Event::Start(BytesStart::new("w:r")))
        .map_err(xml_err)?;
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            writer
                .write_event(Event::Empty(BytesStart::new("w:br")))
                .map_err(xml_err)?;
        }
        writer
            .write_event(Event::Start(
                BytesStart::new("w:t").with_attributes([("xml:space", "preserve")]),
            ))
            .map_err(xml_err)?;
        writer
            .write_event(Event::Text(BytesText::new(line.trim_end_matches('\r'))))
            .map_err(xml_err)?;
        writer
            .write_event(Event::End(BytesEnd::new("w:t")))
            .map_err(xml_err)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("w:r")))
        .map_err(xml_err)?;

    writer
        .write_event(Event::End(BytesEnd::new("w:p")))
        .map_err(xml_err)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use quick_xml::Reader;
    use std::io::Read;

    /// Paragraphs of a rendered package as `(style, text)` pairs
    pub(crate) fn read_paragraphs(docx: &[u8]) -> Vec<(Option<String>, String)> {
        let mut archive = zip::ZipArchive::new(Cursor::new(docx)).unwrap();
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();

        let mut reader = Reader::from_str(&xml);
        let mut paragraphs = Vec::new();
        let mut style = None;
        let mut text = String::new();
        let mut in_text = false;

        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) if e.local_name().as_ref() == b"p" => {
                    style = None;
                    text.clear();
                }
                Event::Empty(e) if e.local_name().as_ref() == b"pStyle" => {
                    let val = e.try_get_attribute("w:val").unwrap().unwrap();
                    style = Some(String::from_utf8(val.value.to_vec()).unwrap());
                }
                Event::Empty(e) if e.local_name().as_ref() == b"br" => text.push('\n'),
                Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
                Event::End(e) if e.local_name().as_ref() == b"t" => in_text = false,
                Event::Text(t) if in_text => text.push_str(&t.unescape().unwrap()),
                Event::End(e) if e.local_name().as_ref() == b"p" => {
                    paragraphs.push((style.take(), text.clone()));
                }
                Event::Eof => break,
                _ => {}
            }
        }
        paragraphs
    }

    #[test]
    fn test_package_contains_required_parts() {
        let mut builder = DocxBuilder::new();
        builder.heading("Summary", 0).paragraph("Body");
        let bytes = builder.build().unwrap();

        let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
            "word/document.xml",
        ] {
            assert!(names.contains(&part), "missing {}", part);
        }
    }

    #[test]
    fn test_headings_and_paragraphs_round_trip() {
        let mut builder = DocxBuilder::new();
        builder
            .heading("Research Summary", 0)
            .heading("Articles", 1)
            .heading("Deep nesting", 7)
            .paragraph("Tom & Jerry <3")
            .paragraph("line one\nline two");

        let paragraphs = read_paragraphs(&builder.build().unwrap());
        assert_eq!(
            paragraphs,
            vec![
                (Some("Title".to_string()), "Research Summary".to_string()),
                (Some("Heading1".to_string()), "Articles".to_string()),
                (Some("Heading3".to_string()), "Deep nesting".to_string()),
                (None, "Tom & Jerry <3".to_string()),
                (None, "line one\nline two".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_builder_still_renders() {
        let builder = DocxBuilder::new();
        assert!(builder.is_empty());
        assert!(read_paragraphs(&builder.build().unwrap()).is_empty());
    }
}
