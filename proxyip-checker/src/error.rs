//! 统一错误类型定义

use thiserror::Error;

/// Request-level failures of a proxy check.
///
/// Per-address probe failures never appear here; they are folded into a
/// `success = false` [`ProbeResult`](crate::ProbeResult).
#[derive(Error, Debug)]
pub enum CheckerError {
    /// 输入校验错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// DNS-over-HTTPS 解析失败
    #[error("Resolution error: {0}")]
    ResolutionError(String),
}

/// Checker Result 类型别名
pub type CheckerResult<T> = std::result::Result<T, CheckerError>;
