pub type Result<T, E = MetaError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    #[error("no such catalog: '{0}'")]
    CatalogNotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("connection failure: {0}")]
    Connection(String),

    #[error("statement preparation failed: {0}")]
    Prepare(String),

    #[error("statement execution failed: {0}")]
    Execute(String),

    #[error("drill through failed: {0}")]
    DrillThrough(String),

    #[error("drill through not possible on this cell")]
    DrillThroughNotPossible,

    #[error("internal error: {0}")]
    Internal(String),
}
