#![forbid(unsafe_code)]

//! XML writing for freshly built fragments, backed by `quick-xml`.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use xmlsign_core::Error;

/// A small element/text writer. Text and attribute values are escaped.
pub struct XmlWriter {
    writer: quick_xml::Writer<Vec<u8>>,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self {
            writer: quick_xml::Writer::new(Vec::new()),
        }
    }

    /// Start an element with the given name and attributes.
    pub fn start_element(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), Error> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Start(start))?;
        Ok(())
    }

    /// Write an empty element (`<name/>`).
    pub fn empty_element(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), Error> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Empty(start))?;
        Ok(())
    }

    pub fn end_element(&mut self, name: &str) -> Result<(), Error> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    pub fn write_text(&mut self, text: &str) -> Result<(), Error> {
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    /// `<name attrs>text</name>`, always with an explicit end tag.
    pub fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<(), Error> {
        self.start_element(name, attrs)?;
        if !text.is_empty() {
            self.write_text(text)?;
        }
        self.end_element(name)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.writer.into_inner()
    }

    pub fn into_string(self) -> Result<String, Error> {
        String::from_utf8(self.into_bytes())
            .map_err(|e| Error::Other(format!("writer produced invalid UTF-8: {e}")))
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}
