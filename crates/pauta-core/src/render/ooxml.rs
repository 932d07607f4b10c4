//! Minimal Office Open XML packaging: a zip container of XML parts.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::borrow::Cow;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::PautaError;

pub(crate) const NS_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
pub(crate) const NS_OFFICE_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Streaming XML writer for one package part.
///
/// Errors surface as render failures of `target` ("spreadsheet" or
/// "document").
pub(crate) struct XmlWriter {
    inner: Writer<Vec<u8>>,
    target: &'static str,
}

impl XmlWriter {
    pub fn new(target: &'static str) -> Result<Self, PautaError> {
        let mut writer = XmlWriter {
            inner: Writer::new(Vec::new()),
            target,
        };
        writer.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(writer)
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), PautaError> {
        self.inner
            .write_event(event)
            .map_err(|e| PautaError::render(self.target, e))
    }

    fn tag<'a>(name: &'a str, attrs: &[(&str, &str)]) -> BytesStart<'a> {
        let mut tag = BytesStart::new(name);
        for &attr in attrs {
            tag.push_attribute(attr);
        }
        tag
    }

    pub fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), PautaError> {
        self.event(Event::Start(Self::tag(name, attrs)))
    }

    pub fn end(&mut self, name: &str) -> Result<(), PautaError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), PautaError> {
        self.event(Event::Empty(Self::tag(name, attrs)))
    }

    /// Escaped character data. Characters XML 1.0 forbids are dropped.
    pub fn text(&mut self, text: &str) -> Result<(), PautaError> {
        let text = strip_illegal_chars(text);
        self.event(Event::Text(BytesText::new(&text)))
    }

    /// `<name attrs>text</name>`
    pub fn element(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
        text: &str,
    ) -> Result<(), PautaError> {
        self.start(name, attrs)?;
        self.text(text)?;
        self.end(name)
    }

    pub fn finish(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}

/// Whether `c` may appear in an XML 1.0 document.
///
/// pdftotext passes control characters through, and Office refuses files
/// that contain them.
pub(crate) fn is_xml_char(c: char) -> bool {
    !matches!(
        c,
        '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}'
    )
}

pub(crate) fn strip_illegal_chars(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| is_xml_char(c)).collect())
    }
}

/// `[Content_Types].xml` with the given `(part name, content type)` overrides.
pub(crate) fn content_types(
    target: &'static str,
    overrides: &[(&str, &str)],
) -> Result<Vec<u8>, PautaError> {
    let mut xml = XmlWriter::new(target)?;
    xml.start(
        "Types",
        &[(
            "xmlns",
            "http://schemas.openxmlformats.org/package/2006/content-types",
        )],
    )?;
    xml.empty(
        "Default",
        &[
            ("Extension", "rels"),
            (
                "ContentType",
                "application/vnd.openxmlformats-package.relationships+xml",
            ),
        ],
    )?;
    xml.empty(
        "Default",
        &[("Extension", "xml"), ("ContentType", "application/xml")],
    )?;
    for &(part, content_type) in overrides {
        xml.empty(
            "Override",
            &[("PartName", part), ("ContentType", content_type)],
        )?;
    }
    xml.end("Types")?;
    Ok(xml.finish())
}

/// A relationships part from `(id, type, target)` triples.
pub(crate) fn relationships(
    target: &'static str,
    rels: &[(&str, &str, &str)],
) -> Result<Vec<u8>, PautaError> {
    let mut xml = XmlWriter::new(target)?;
    xml.start("Relationships", &[("xmlns", NS_RELATIONSHIPS)])?;
    for &(id, kind, part) in rels {
        xml.empty(
            "Relationship",
            &[("Id", id), ("Type", kind), ("Target", part)],
        )?;
    }
    xml.end("Relationships")?;
    Ok(xml.finish())
}

/// In-memory zip package.
pub(crate) struct Package {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    target: &'static str,
}

impl Package {
    pub fn new(target: &'static str) -> Self {
        Package {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            target,
        }
    }

    pub fn add(&mut self, path: &str, bytes: &[u8]) -> Result<(), PautaError> {
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.zip
            .start_file(path, options)
            .map_err(|e| PautaError::render(self.target, e))?;
        self.zip
            .write_all(bytes)
            .map_err(|e| PautaError::render(self.target, e))
    }

    pub fn finish(self) -> Result<Vec<u8>, PautaError> {
        let target = self.target;
        let cursor = self
            .zip
            .finish()
            .map_err(|e| PautaError::render(target, e))?;
        Ok(cursor.into_inner())
    }
}
