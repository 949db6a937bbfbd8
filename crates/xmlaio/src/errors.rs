pub type Result<T, E = SinkError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unbalanced element nesting: closing '{closing}' but '{open}' is open")]
    Unbalanced { closing: String, open: String },

    #[error("no element open")]
    NoOpenElement,
}
