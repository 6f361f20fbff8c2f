use crate::resource::request::{REQUEST_KIND, Request};
use crate::{HttpuError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// 按扩展名解析 JSON 或 TOML 文档
pub(crate) fn parse_document<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        toml::from_str(content)
            .map_err(|e| HttpuError::Config(format!("无法解析 {}: {}", path.display(), e)))
    } else {
        serde_json::from_str(content)
            .map_err(|e| HttpuError::Config(format!("无法解析 {}: {}", path.display(), e)))
    }
}

/// 读取一个资源文件
///
/// 返回 `Ok(None)` 表示文件有效但 kind 不是本程序认识的类型。
pub fn load_resource(path: &Path) -> Result<Option<Request>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| HttpuError::Config(format!("无法读取资源文件 {}: {}", path.display(), e)))?;
    let document: Value = parse_document(path, &content)?;

    let field = |key: &str| {
        document
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                HttpuError::Config(format!("资源文件 {} 缺少字段 \"{}\"", path.display(), key))
            })
    };
    let kind = field("kind")?;
    let name = field("name")?;

    if kind != REQUEST_KIND {
        tracing::warn!(kind = %kind, name = %name, path = %path.display(), "skipping resource of unknown kind");
        return Ok(None);
    }

    let request: Request = serde_json::from_value(document)
        .map_err(|e| HttpuError::Config(format!("资源文件 {} 格式错误: {}", path.display(), e)))?;

    let mut seen = HashSet::new();
    for variant in request.variants() {
        if !seen.insert(variant.name.as_str()) {
            tracing::warn!(request = %name, variant = %variant.name, "duplicate variant name, the first one is used");
        }
    }

    Ok(Some(request))
}
