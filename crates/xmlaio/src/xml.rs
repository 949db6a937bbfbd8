use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::errors::{Result, SinkError};
use crate::sink::{SinkEncoding, XmlaSink};

enum Open {
    Element(String),
    // Sequences emit nothing but still participate in balancing.
    Sequence(String),
}

/// XML-encoded sink backed by a quick-xml event writer.
pub struct XmlSink<W: Write> {
    writer: Writer<W>,
    open: Vec<Open>,
}

impl<W: Write> XmlSink<W> {
    pub fn new(inner: W) -> XmlSink<W> {
        XmlSink {
            writer: Writer::new(inner),
            open: Vec::new(),
        }
    }

    pub fn new_indented(inner: W) -> XmlSink<W> {
        XmlSink {
            writer: Writer::new_with_indent(inner, b' ', 2),
            open: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn check_top(&self, closing: &str, want_element: bool) -> Result<()> {
        match self.open.last() {
            Some(Open::Element(name)) if want_element && name == closing => Ok(()),
            Some(Open::Sequence(name)) if !want_element && name == closing => Ok(()),
            Some(Open::Element(name)) | Some(Open::Sequence(name)) => Err(SinkError::Unbalanced {
                closing: closing.to_string(),
                open: name.clone(),
            }),
            None => Err(SinkError::NoOpenElement),
        }
    }
}

impl<W: Write> XmlaSink for XmlSink<W> {
    fn encoding(&self) -> SinkEncoding {
        SinkEncoding::Xml
    }

    fn start_element(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut start = BytesStart::new(name);
        for (k, v) in attrs {
            start.push_attribute((*k, *v));
        }
        self.writer.write_event(Event::Start(start))?;
        self.open.push(Open::Element(name.to_string()));
        Ok(())
    }

    fn end_element(&mut self, name: &str) -> Result<()> {
        self.check_top(name, true)?;
        self.open.pop();
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn start_sequence(&mut self, name: &str) -> Result<()> {
        self.open.push(Open::Sequence(name.to_string()));
        Ok(())
    }

    fn end_sequence(&mut self, name: &str) -> Result<()> {
        self.check_top(name, false)?;
        self.open.pop();
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    fn verbatim(&mut self, fragment: &str) -> Result<()> {
        self.writer.get_mut().write_all(fragment.as_bytes())?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        while let Some(open) = self.open.pop() {
            if let Open::Element(name) = open {
                self.writer.write_event(Event::End(BytesEnd::new(&name)))?;
            }
        }
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.get_mut().flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut XmlSink<Vec<u8>>),
    {
        let mut sink = XmlSink::new(Vec::new());
        f(&mut sink);
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn nested_elements_and_attrs() {
        let out = render(|s| {
            s.start_element("root", &[("xmlns", "urn:test")]).unwrap();
            s.text_element("row", &[], "a < b").unwrap();
            s.end_element("root").unwrap();
        });
        assert_eq!(
            out,
            "<root xmlns=\"urn:test\"><row>a &lt; b</row></root>"
        );
    }

    #[test]
    fn sequences_are_transparent() {
        let out = render(|s| {
            s.start_element("rows", &[]).unwrap();
            s.start_sequence("row").unwrap();
            s.text_element("row", &[], "1").unwrap();
            s.text_element("row", &[], "2").unwrap();
            s.end_sequence("row").unwrap();
            s.end_element("rows").unwrap();
        });
        assert_eq!(out, "<rows><row>1</row><row>2</row></rows>");
    }

    #[test]
    fn unbalanced_close_is_an_error() {
        let mut sink = XmlSink::new(Vec::new());
        sink.start_element("a", &[]).unwrap();
        assert!(sink.end_element("b").is_err());
    }

    #[test]
    fn finish_closes_open_elements() {
        let mut sink = XmlSink::new(Vec::new());
        sink.start_element("a", &[]).unwrap();
        sink.start_element("b", &[]).unwrap();
        sink.start_sequence("c").unwrap();
        sink.finish().unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "<a><b></b></a>");
    }

    #[test]
    fn verbatim_is_spliced_raw() {
        let out = render(|s| {
            s.start_element("schema", &[]).unwrap();
            s.verbatim("<xsd:element name=\"row\"/>").unwrap();
            s.end_element("schema").unwrap();
        });
        assert_eq!(out, "<schema><xsd:element name=\"row\"/></schema>");
    }
}
