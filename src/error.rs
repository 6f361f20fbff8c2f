use thiserror::Error;

#[derive(Error, Debug)]
pub enum HttpuError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("无法构建请求: {0}")]
    Build(String),

    #[error("网络错误: {0}")]
    Network(String),

    #[error("请求超时 ({0}ms)")]
    Timeout(u64),

    #[error("请求已取消")]
    Cancelled,

    #[error("Stash 中不存在: {0}")]
    StashNotFound(String),

    #[error("请求不存在: {0}")]
    RequestNotFound(String),

    #[error("请求 \"{request}\" 不存在变体 \"{variant}\"")]
    VariantNotFound { request: String, variant: String },

    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON 解析错误: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL 解析错误: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for HttpuError {
    fn from(err: anyhow::Error) -> Self {
        HttpuError::Other(err.to_string())
    }
}

impl From<reqwest::Error> for HttpuError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            HttpuError::Build(err.to_string())
        } else {
            HttpuError::Network(err.to_string())
        }
    }
}

/// Result type for httpu crate
pub type Result<T> = std::result::Result<T, HttpuError>;
