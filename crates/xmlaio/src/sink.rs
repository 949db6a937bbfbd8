use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEncoding {
    Xml,
    Json,
}

/// Hierarchical emit primitives for a response body.
///
/// `start_sequence`/`end_sequence` bracket a run of same-named child
/// elements; the XML encoding treats them as no-op wrappers while the
/// JSON encoding turns them into arrays. Every `start_*` must be matched
/// by its closing counterpart; [`XmlaSink::finish`] force-closes whatever
/// is still open so an aborted body still yields well-formed output.
pub trait XmlaSink {
    fn encoding(&self) -> SinkEncoding;

    fn start_element(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()>;
    fn end_element(&mut self, name: &str) -> Result<()>;

    fn start_sequence(&mut self, name: &str) -> Result<()>;
    fn end_sequence(&mut self, name: &str) -> Result<()>;

    /// Text content of the currently open element.
    fn characters(&mut self, text: &str) -> Result<()>;

    /// Element with attributes and text content, opened and closed in one
    /// call.
    fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.start_element(name, attrs)?;
        self.characters(text)?;
        self.end_element(name)
    }

    /// Splice a pre-rendered fragment into the output as-is.
    fn verbatim(&mut self, fragment: &str) -> Result<()>;

    /// Close any still-open elements and flush.
    fn finish(&mut self) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}
