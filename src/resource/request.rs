use crate::resource::multimap::{FormData, Headers};
use crate::variable::StashRule;
use crate::{HttpuError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// 目前唯一支持的资源类型
pub const REQUEST_KIND: &str = "request";

/// 请求体：内联文本，或者 `{ "fromFile": "data/user.json" }` 指向项目内的文件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_file: Option<PathBuf>,

    /// 内存中的内容；文件类型在首次加载前为 `None`
    #[serde(skip_serializing_if = "Option::is_none")]
    contents: Option<String>,
}

impl RequestBody {
    pub fn inline(text: impl Into<String>) -> Self {
        Self {
            from_file: None,
            contents: Some(text.into()),
        }
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            from_file: Some(path.into()),
            contents: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.contents.is_some()
    }

    /// Body 文本，未加载或未设置时为空串
    pub fn text(&self) -> &str {
        self.contents.as_deref().unwrap_or_default()
    }

    pub(crate) fn contents_mut(&mut self) -> Option<&mut String> {
        self.contents.as_mut()
    }

    /// 从项目根目录读取文件内容，已经加载过则什么也不做
    pub fn load(&mut self, root: &Path) -> Result<()> {
        if self.is_loaded() {
            return Ok(());
        }
        let Some(relative) = &self.from_file else {
            return Ok(());
        };

        let path = root.join(relative);
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            HttpuError::Config(format!("无法读取请求体文件 {}: {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "loaded request body");
        self.contents = Some(contents);
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBody {
    File {
        #[serde(rename = "fromFile")]
        from_file: PathBuf,
    },
    Text(String),
    Json(serde_json::Value),
}

impl<'de> Deserialize<'de> for RequestBody {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match RawBody::deserialize(deserializer)? {
            RawBody::File { from_file } => RequestBody::from_file(from_file),
            RawBody::Text(text) => RequestBody::inline(text),
            RawBody::Json(serde_json::Value::Null) => RequestBody::default(),
            RawBody::Json(value) => RequestBody::inline(value.to_string()),
        })
    }
}

/// 请求的一个具名变体
///
/// 路径追加在基础 URI 之后；method、body、表单完全由变体自己决定，
/// Header 则合并到基础请求的 Header 上。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Variant {
    pub name: String,
    pub path: String,
    pub method: String,
    pub data: RequestBody,
    pub form_data: FormData,
    pub headers: Headers,
    pub stash_values: Vec<StashRule>,
}

impl Variant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// 基础请求的定义
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestSpec {
    pub uri: String,
    pub method: String,
    pub data: RequestBody,
    pub form_data: FormData,
    pub headers: Headers,
    pub variants: Vec<Variant>,
    pub stash_values: Vec<StashRule>,
}

impl RequestSpec {
    /// 基础请求本身能否单独发送
    pub fn is_executable(&self) -> bool {
        !self.method.is_empty() && !self.uri.is_empty()
    }
}

/// 一个 `kind: request` 资源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub spec: RequestSpec,
}

impl Request {
    pub fn new(name: impl Into<String>, spec: RequestSpec) -> Self {
        Self {
            kind: REQUEST_KIND.to_string(),
            name: name.into(),
            spec,
        }
    }

    /// 按名称查找变体，重名时取第一个
    pub fn variant(&self, name: &str) -> Result<&Variant> {
        self.spec
            .variants
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| HttpuError::VariantNotFound {
                request: self.name.clone(),
                variant: name.to_string(),
            })
    }

    pub fn variants(&self) -> &[Variant] {
        &self.spec.variants
    }

    pub fn variant_names(&self) -> Vec<&str> {
        self.spec.variants.iter().map(|v| v.name.as_str()).collect()
    }
}
