use crate::fault::{XmlaFault, fault_detail};

pub type Result<T, E = SrvError> = std::result::Result<T, E>;

/// Errors of the protocol engine. Every variant maps onto exactly one
/// fault code; the dispatcher is the only place that conversion happens.
#[derive(Debug, thiserror::Error)]
pub enum SrvError {
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("unsupported {operation} format: {value}")]
    UnsupportedFormat {
        operation: &'static str,
        value: String,
    },

    #[error("unsupported property value: {property}={value}")]
    UnsupportedProperty { property: &'static str, value: String },

    #[error("unrecognized response mime type: {0}")]
    UnsupportedMimeType(String),

    #[error("malformed restriction on {rowset}: {detail}")]
    MalformedRestriction { rowset: String, detail: String },

    #[error("error preparing statement")]
    Prepare(#[source] olapmeta::MetaError),

    #[error("error executing statement")]
    Execute(#[source] olapmeta::MetaError),

    #[error("error serializing result")]
    Serialize(#[source] xmlaio::SinkError),

    #[error("error executing drill through")]
    DrillThrough(#[source] olapmeta::MetaError),

    #[error("access denied")]
    AccessDenied(#[source] olapmeta::MetaError),

    #[error("cannot connect to data source")]
    Connection(#[source] olapmeta::MetaError),

    #[error(transparent)]
    Builtin(#[from] xmlabuiltins::BuiltinError),
}

impl From<xmlaio::SinkError> for SrvError {
    fn from(e: xmlaio::SinkError) -> SrvError {
        SrvError::Serialize(e)
    }
}

impl SrvError {
    /// Stable fault sub-code, part of the wire contract.
    pub fn fault_code(&self) -> &'static str {
        match self {
            SrvError::UnsupportedMethod(_) => "USM",
            SrvError::UnsupportedFormat { .. } => "UDF",
            SrvError::UnsupportedProperty { .. } | SrvError::UnsupportedMimeType(_) => "UDP",
            SrvError::MalformedRestriction { .. } => "MRC",
            SrvError::Prepare(_) => "CPE",
            SrvError::Execute(_) => "CXE",
            SrvError::Serialize(_) => "SRE",
            SrvError::DrillThrough(_) => "SDE",
            SrvError::AccessDenied(_) => "ADE",
            SrvError::Connection(_) => "CDF",
            SrvError::Builtin(b) => match b {
                // Asking for a rowset we do not have is an unsupported
                // operation; a bad restriction column is a restriction
                // problem.
                xmlabuiltins::BuiltinError::UnknownRowset(_) => "USM",
                xmlabuiltins::BuiltinError::NotRestrictable { .. } => "MRC",
                _ => "CXE",
            },
        }
    }

    pub fn is_client_fault(&self) -> bool {
        matches!(
            self.fault_code(),
            "USM" | "UDF" | "UDP" | "MRC" | "ADE" | "CDF"
        )
    }

    pub fn into_fault(self) -> XmlaFault {
        XmlaFault {
            client: self.is_client_fault(),
            code: self.fault_code(),
            message: self.to_string(),
            detail: fault_detail(&self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_codes_are_stable() {
        assert_eq!(SrvError::UnsupportedMethod("x".into()).fault_code(), "USM");
        assert_eq!(
            SrvError::Execute(olapmeta::MetaError::Internal("boom".into())).fault_code(),
            "CXE"
        );
        assert!(SrvError::UnsupportedMethod("x".into()).is_client_fault());
        assert!(
            !SrvError::Execute(olapmeta::MetaError::Internal("boom".into())).is_client_fault()
        );
    }
}
