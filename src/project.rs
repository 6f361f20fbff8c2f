use crate::resource::{Registry, load_resource, loader::parse_document};
use crate::variable::Stash;
use crate::{HttpuError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use url::Url;

/// 项目配置文件的默认文件名
pub const PROJECT_FILE: &str = "project.json";
/// 本地包目录，位于用户主目录下
pub const PACKAGES_DIR: &str = ".httpu/packages";
/// 默认请求超时
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// 项目配置文件的内容
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub url: String,

    #[serde(default)]
    pub resource_files: Vec<PathBuf>,

    /// 单次请求的超时（毫秒）
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// 一个工作会话：基础 URL 和已加载的请求
#[derive(Debug, Clone)]
pub struct Project {
    pub url: Url,
    pub resource_files: Vec<PathBuf>,
    /// 配置文件所在目录，资源文件和请求体文件都相对它解析
    pub root: PathBuf,
    pub timeout: Duration,
    pub requests: Registry,
}

impl Project {
    /// 加载项目配置和其中列出的全部资源文件
    ///
    /// `path` 可以是配置文件本身，也可以是包含 `project.json` 的目录。
    /// 在当前目录下找不到时，会再到 `~/.httpu/packages/<path>` 下查找。
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = locate(path.as_ref())?;
        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            HttpuError::Config(format!("无法读取配置文件 {}: {}", config_path.display(), e))
        })?;
        let config: ProjectConfig = parse_document(&config_path, &content)?;

        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::from_config(config, root)
    }

    /// 根据已解析的配置构建项目，`root` 为资源文件的根目录
    pub fn from_config(config: ProjectConfig, root: PathBuf) -> Result<Self> {
        let url = Url::parse(&config.url)
            .map_err(|e| HttpuError::Config(format!("url 必须是合法的 URL ({}): {}", config.url, e)))?;

        // 加载阶段没有捕获值，stash 轮次只会保留占位符
        let stash = Stash::new();
        let mut requests = Registry::new();
        for file in &config.resource_files {
            let Some(mut request) = load_resource(&root.join(file))? else {
                continue;
            };
            request.spec.update(&root, &stash)?;
            requests.insert(request);
        }

        tracing::info!(
            url = %url,
            root = %root.display(),
            requests = requests.len(),
            "project loaded"
        );

        Ok(Self {
            url,
            resource_files: config.resource_files,
            root,
            timeout: Duration::from_millis(config.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)),
            requests,
        })
    }

    /// 基础 URL 的文本形式，末尾的 `/` 去掉，方便直接拼接 URI
    pub fn base_url(&self) -> &str {
        self.url.as_str().trim_end_matches('/')
    }

    pub fn search_by_prefix(&self, query: &str) -> Vec<String> {
        self.requests.search_by_prefix(query)
    }
}

/// 找到实际的配置文件路径
fn locate(path: &Path) -> Result<PathBuf> {
    let mut candidates = vec![config_file(path)];
    if let Some(home) = dirs::home_dir() {
        candidates.push(config_file(&home.join(PACKAGES_DIR).join(path)));
    }

    candidates
        .iter()
        .find(|candidate| candidate.is_file())
        .cloned()
        .ok_or_else(|| {
            HttpuError::Config(format!(
                "找不到项目配置: {}",
                candidates
                    .iter()
                    .map(|c| c.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
}

fn config_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(PROJECT_FILE)
    } else {
        path.to_path_buf()
    }
}

static SESSION: RwLock<Option<Arc<Project>>> = RwLock::new(None);

/// 加载项目并设为当前会话
pub fn load_project<P: AsRef<Path>>(path: P) -> Result<Arc<Project>> {
    let project = Arc::new(Project::load(path)?);
    *SESSION.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&project));
    Ok(project)
}

/// 最近一次成功加载的项目
pub fn current_session() -> Option<Arc<Project>> {
    SESSION
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}
