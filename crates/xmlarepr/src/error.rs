pub type Result<T, E = ReprError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ReprError {
    #[error("invalid decimal literal: '{0}'")]
    InvalidDecimal(String),

    #[error("decimal out of range: '{0}'")]
    DecimalOutOfRange(String),

    #[error("unsupported scale: {0}")]
    UnsupportedScale(i64),
}
