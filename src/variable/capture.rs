use crate::variable::stash::StashEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 捕获规则：请求成功后，从响应 Body 的 JSON 路径提取值写入 stash
///
/// 资源文件中的写法:
/// ```json
/// { "name": "uid", "jsonPath": ["data", "[0]", "id"], "origin": "users.create" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StashRule {
    /// 写入 stash 时使用的名称
    pub name: String,

    /// 逐层选择的 key 或数组下标（`"[0]"` 或 `"0"`）
    #[serde(default)]
    pub json_path: Vec<String>,

    /// 自由文本的来源说明
    #[serde(default)]
    pub origin: String,

    #[serde(default)]
    pub repeat_request: bool,

    /// 旧格式里的输出位，读取时接受但不使用
    #[serde(default, skip_serializing)]
    pub value: Option<String>,
}

impl StashRule {
    pub fn new<I, S>(name: impl Into<String>, json_path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            json_path: json_path.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// 对响应 Body 应用这条规则
    pub fn capture(&self, body: &[u8]) -> Capture {
        extract(body, &self.json_path)
    }

    /// 把捕获结果连同来源信息转换成 stash 记录
    pub fn to_entry(&self, capture: Capture, captured_at: DateTime<Utc>) -> StashEntry {
        StashEntry {
            name: self.name.clone(),
            value: capture.into_option(),
            json_path: self.json_path.clone(),
            origin: self.origin.clone(),
            repeat_request: self.repeat_request,
            captured_at: Some(captured_at),
        }
    }
}

/// 单条规则的捕获结果
///
/// `Absent` 不是错误：字段暂时不存在时链式请求仍然可以继续。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    Found(String),
    Absent,
}

impl Capture {
    pub fn is_found(&self) -> bool {
        matches!(self, Capture::Found(_))
    }

    pub fn into_option(self) -> Option<String> {
        match self {
            Capture::Found(value) => Some(value),
            Capture::Absent => None,
        }
    }
}

/// 从原始 Body 中按路径提取值
///
/// 字符串叶子返回去掉引号后的内容，其余类型返回紧凑的 JSON 文本。
/// 空路径、非 JSON 的 Body、找不到的 key 或下标都视为 `Absent`。
pub fn extract(body: &[u8], path: &[String]) -> Capture {
    if path.is_empty() {
        return Capture::Absent;
    }

    let Ok(root) = serde_json::from_slice::<Value>(body) else {
        return Capture::Absent;
    };

    let mut current = &root;
    for segment in path {
        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => parse_index(segment).and_then(|i| items.get(i)),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return Capture::Absent,
        }
    }

    match current {
        Value::String(s) => Capture::Found(s.clone()),
        other => Capture::Found(other.to_string()),
    }
}

/// 解析数组下标，支持 `[3]` 和 `3` 两种写法
fn parse_index(segment: &str) -> Option<usize> {
    let inner = segment
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(segment);
    inner.trim().parse().ok()
}
