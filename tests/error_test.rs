use httpu::{HttpuError, Result};

#[test]
fn test_config_error() {
    let err = HttpuError::Config("url 必须是合法的 URL".to_string());
    assert_eq!(err.to_string(), "配置错误: url 必须是合法的 URL");
}

#[test]
fn test_timeout_error() {
    let err = HttpuError::Timeout(500);
    assert_eq!(err.to_string(), "请求超时 (500ms)");
}

#[test]
fn test_variant_not_found() {
    let err = HttpuError::VariantNotFound {
        request: "users".to_string(),
        variant: "purge".to_string(),
    };
    assert_eq!(err.to_string(), "请求 \"users\" 不存在变体 \"purge\"");
}

#[test]
fn test_stash_not_found() {
    let err = HttpuError::StashNotFound("token".to_string());
    assert_eq!(err.to_string(), "Stash 中不存在: token");
}

#[test]
fn test_error_conversion_from_anyhow() {
    let anyhow_err = anyhow::anyhow!("test anyhow error");
    let httpu_err: HttpuError = anyhow_err.into();
    assert!(httpu_err.to_string().contains("test anyhow error"));
}

#[test]
fn test_error_conversion_from_io() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let httpu_err: HttpuError = io_err.into();
    assert!(matches!(httpu_err, HttpuError::IoError(_)));
}

#[test]
fn test_result_type() {
    fn returns_error() -> Result<()> {
        Err(HttpuError::Build("test".to_string()))
    }

    match returns_error() {
        Err(HttpuError::Build(msg)) => assert_eq!(msg, "test"),
        _ => panic!("Expected Build error"),
    }
}
