use crate::resource::request::{Request, Variant};
use crate::{HttpuError, Result};
use std::collections::BTreeMap;
use std::fmt;

/// 已加载的请求，按名称索引
#[derive(Debug, Clone, Default)]
pub struct Registry {
    requests: BTreeMap<String, Request>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册请求。重名时后加载的覆盖先加载的，返回被覆盖的旧值
    pub fn insert(&mut self, request: Request) -> Option<Request> {
        let replaced = self.requests.insert(request.name.clone(), request);
        if let Some(old) = &replaced {
            tracing::warn!(name = %old.name, "request redefined, keeping the later definition");
        }
        replaced
    }

    pub fn get(&self, name: &str) -> Option<&Request> {
        self.requests.get(name)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Request> {
        self.requests.values()
    }

    /// 所有可执行目标，格式为 `name` 或 `name.variant`，按字典序排列。
    ///
    /// 基础请求只有在同时定义了 method 和 uri 时才会列出。
    pub fn names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for (name, request) in &self.requests {
            if request.spec.is_executable() {
                names.push(name.clone());
            }
            for variant in request.variants() {
                names.push(format!("{}.{}", name, variant.name));
            }
        }
        names.sort();
        names
    }

    /// 前缀搜索，空查询不返回任何结果
    pub fn search_by_prefix(&self, query: &str) -> Vec<String> {
        if query.is_empty() {
            return Vec::new();
        }
        self.names()
            .into_iter()
            .filter(|name| name.starts_with(query))
            .collect()
    }

    /// 解析 `name` 或 `name.variant`
    ///
    /// 请求名本身可以带 `.`，所以先尝试整体匹配，再从左到右依次尝试拆分。
    pub fn lookup(&self, target: &str) -> Result<(&Request, Option<&Variant>)> {
        if let Some(request) = self.requests.get(target) {
            return Ok((request, None));
        }

        for (i, _) in target.match_indices('.') {
            let (name, variant) = (&target[..i], &target[i + 1..]);
            if let Some(request) = self.requests.get(name) {
                return Ok((request, Some(request.variant(variant)?)));
            }
        }

        Err(HttpuError::RequestNotFound(target.to_string()))
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Requests:")?;
        writeln!(f)?;
        for name in self.names() {
            writeln!(f, "{}", name)?;
        }
        Ok(())
    }
}

impl FromIterator<Request> for Registry {
    fn from_iter<I: IntoIterator<Item = Request>>(iter: I) -> Self {
        let mut registry = Registry::new();
        for request in iter {
            registry.insert(request);
        }
        registry
    }
}
