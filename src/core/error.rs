use thiserror::Error;

/// 引擎错误分类：调用方（HTTP 层）按 kind 映射状态码
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// 未知 region id
    #[error("not found: {0}")]
    NotFound(String),

    /// 非法参数：零宽直方图、未知车型、畸形 ID 等
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// 区域树尚未挂载就调用了 ingest/query
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
}

impl SearchError {
    pub fn region_not_found(id: u64) -> Self {
        SearchError::NotFound(format!("region {} does not exist", id))
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        SearchError::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
