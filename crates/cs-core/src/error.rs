use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Value out of Q31 range for {what}: {value}")]
    OutOfRange { what: &'static str, value: i64 },
}
