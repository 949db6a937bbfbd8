//! Structured fault shape.
//!
//! Nothing that goes wrong inside the engine may reach the transport as
//! a raw error: the dispatcher converts everything into this shape and
//! writes it as a well-formed body.

use std::error::Error;

use xmlaio::XmlaSink;

/// Namespace prefix of every fault code this server emits.
pub const FAULT_NS_PREFIX: &str = "XMLA";

/// Prefix of the human-readable detail text.
const DETAIL_PREFIX: &str = "Error occurred in the XMLA engine: ";

#[derive(Debug)]
pub struct XmlaFault {
    /// Client faults are the caller's mistake; server faults are ours.
    pub client: bool,
    /// Stable sub-code, e.g. `CXE`.
    pub code: &'static str,
    pub message: String,
    pub detail: String,
}

impl XmlaFault {
    /// Wire form of the fault code: `XMLA:Client.USM` / `XMLA:Server.CXE`.
    pub fn fault_code(&self) -> String {
        let side = if self.client { "Client" } else { "Server" };
        format!("{FAULT_NS_PREFIX}:{side}.{}", self.code)
    }

    /// Write the fault body. The sink is assumed to be at top level;
    /// callers `finish()` any partial output first.
    pub fn write(&self, sink: &mut dyn XmlaSink) -> xmlaio::Result<()> {
        sink.start_element("Fault", &[])?;
        sink.text_element("faultcode", &[], &self.fault_code())?;
        sink.text_element("faultstring", &[], &self.message)?;
        sink.start_element("detail", &[])?;
        sink.text_element("Error", &[("Description", self.detail.as_str())], "")?;
        sink.end_element("detail")?;
        sink.end_element("Fault")?;
        sink.flush()
    }
}

/// Detail string for a fault: walk the source chain to the innermost
/// error; an empty message falls back to the error's debug shape.
pub fn fault_detail(err: &dyn Error) -> String {
    let mut cursor: &dyn Error = err;
    while let Some(source) = cursor.source() {
        cursor = source;
    }
    let message = cursor.to_string();
    if message.is_empty() {
        format!("{DETAIL_PREFIX}{cursor:?}")
    } else {
        format!("{DETAIL_PREFIX}{message}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_code_rendering() {
        let fault = XmlaFault {
            client: true,
            code: "USM",
            message: "unsupported method".into(),
            detail: String::new(),
        };
        assert_eq!(fault.fault_code(), "XMLA:Client.USM");

        let fault = XmlaFault {
            client: false,
            code: "CXE",
            message: String::new(),
            detail: String::new(),
        };
        assert_eq!(fault.fault_code(), "XMLA:Server.CXE");
    }

    #[test]
    fn detail_reaches_the_root_cause() {
        let inner = std::io::Error::other("disk on fire");
        let outer = xmlaio::SinkError::Io(inner);
        let detail = fault_detail(&outer);
        assert!(detail.contains("disk on fire"), "{detail}");
        assert!(detail.starts_with(DETAIL_PREFIX));
    }
}
