pub type Result<T, E = BuiltinError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum BuiltinError {
    #[error("description contains a carriage return: '{0}'")]
    CarriageReturn(String),

    #[error("unknown rowset: '{0}'")]
    UnknownRowset(String),

    #[error("column '{column}' is not a restriction column of {rowset}")]
    NotRestrictable { rowset: String, column: String },

    #[error(transparent)]
    Meta(#[from] olapmeta::MetaError),
}
