use crate::variable::resolver::ValueSource;
use crate::{HttpuError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Stash 中的一条记录：捕获到的值以及它的来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashEntry {
    pub name: String,

    /// `None` 表示捕获时响应里没有这个字段，
    /// 和 `Some("")`（字段存在但为空）区分开
    pub value: Option<String>,

    #[serde(default)]
    pub json_path: Vec<String>,

    #[serde(default)]
    pub origin: String,

    #[serde(default)]
    pub repeat_request: bool,

    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,
}

impl StashEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            json_path: Vec::new(),
            origin: String::new(),
            repeat_request: false,
            captured_at: None,
        }
    }

    /// 值的字符串形式，未捕获到时为空串
    pub fn value_str(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}

/// 按名称保存捕获值的存储
///
/// 内部用 `RwLock` 保护，通常以 `Arc<Stash>` 的形式在执行器和调用方之间共享。
/// 写入语义为 last write wins，不做合并。
#[derive(Debug, Default)]
pub struct Stash {
    entries: RwLock<HashMap<String, StashEntry>>,
}

impl Stash {
    pub fn new() -> Self {
        Self::default()
    }

    // 持锁期间不会 panic，中毒时数据仍然一致，直接取回
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, StashEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, StashEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// 插入或覆盖一条记录，记录的 name 以参数为准
    pub fn set(&self, name: impl Into<String>, mut entry: StashEntry) {
        entry.name = name.into();
        self.write().insert(entry.name.clone(), entry);
    }

    /// 按名称读取记录
    pub fn get(&self, name: &str) -> Result<StashEntry> {
        self.read()
            .get(name)
            .cloned()
            .ok_or_else(|| HttpuError::StashNotFound(name.to_string()))
    }

    /// 批量写入，按记录自身的 name 作为键
    pub fn push<I>(&self, entries: I)
    where
        I: IntoIterator<Item = StashEntry>,
    {
        let mut guard = self.write();
        for entry in entries {
            guard.insert(entry.name.clone(), entry);
        }
    }

    /// 取值用于替换，不存在时返回空串，从不失败
    pub fn resolve(&self, key: &str) -> String {
        self.read()
            .get(key)
            .map(|entry| entry.value_str().to_string())
            .unwrap_or_default()
    }

    /// 当前所有记录的快照，按名称排序
    pub fn entries(&self) -> Vec<StashEntry> {
        let mut entries: Vec<StashEntry> = self.read().values().cloned().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl ValueSource for Stash {
    fn lookup(&self, key: &str) -> Option<String> {
        self.read().get(key).and_then(|entry| entry.value.clone())
    }
}
