use crate::{HttpuError, Result};
use crate::http::{Client, HttpRequest, Response};
use crate::project::Project;
use crate::resource::{FormData, Headers, Request, RequestSpec, Variant};
use crate::variable::{Stash, StashRule};
use chrono::Utc;
use std::future::{Future, pending};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 一次要发送的目标，不区分基础请求还是变体
#[derive(Debug, Clone)]
pub(crate) struct Target {
    pub url: String,
    pub method: String,
    pub headers: Headers,
    pub body: String,
    pub form_data: FormData,
    pub stash_values: Vec<StashRule>,
}

impl Target {
    fn from_spec(base_url: &str, spec: &RequestSpec) -> Self {
        Self {
            url: format!("{}{}", base_url, spec.uri),
            method: spec.method.clone(),
            headers: spec.headers.clone(),
            body: spec.data.text().to_string(),
            form_data: spec.form_data.clone(),
            stash_values: spec.stash_values.clone(),
        }
    }

    /// 变体：URL 追加变体路径，Header 合并，其余字段全部来自变体
    fn from_variant(base_url: &str, spec: &RequestSpec, variant: &Variant) -> Self {
        Self {
            url: format!("{}{}{}", base_url, spec.uri, variant.path),
            method: variant.method.clone(),
            headers: spec.headers.merge(&variant.headers),
            body: variant.data.text().to_string(),
            form_data: variant.form_data.clone(),
            stash_values: variant.stash_values.clone(),
        }
    }

    /// 有表单字段时发送编码后的表单，否则发送原始 Body
    pub fn request_body(&self) -> String {
        if self.form_data.is_empty() {
            self.body.clone()
        } else {
            self.form_data.to_form_urlencoded()
        }
    }

    fn build(&self) -> Result<HttpRequest> {
        Ok(HttpRequest::new(&self.method, &self.url)?
            .with_headers(&self.headers)?
            .with_body(self.request_body()))
    }
}

/// 请求执行器
///
/// 每次执行都会对请求模板的副本跑一遍解析流水线，
/// 所以之前请求捕获到的值会被之后的请求用上，注册表本身保持不变。
pub struct Executor {
    client: Client,
    stash: Arc<Stash>,
}

impl Executor {
    pub fn new(stash: Arc<Stash>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::new(timeout)?,
            stash,
        })
    }

    /// 使用项目配置的超时
    pub fn for_project(project: &Project, stash: Arc<Stash>) -> Result<Self> {
        Self::new(stash, project.timeout)
    }

    pub fn stash(&self) -> &Arc<Stash> {
        &self.stash
    }

    /// 发送基础请求
    pub async fn execute(&self, project: &Project, request: &Request) -> Result<Response> {
        self.execute_with_cancel(project, request, pending()).await
    }

    /// 发送某个变体
    pub async fn execute_variant(
        &self,
        project: &Project,
        request: &Request,
        variant: &Variant,
    ) -> Result<Response> {
        self.execute_variant_with_cancel(project, request, variant, pending())
            .await
    }

    /// 同 [`Executor::execute`]，`cancel` 先完成时放弃请求并返回 `Cancelled`
    pub async fn execute_with_cancel<C>(
        &self,
        project: &Project,
        request: &Request,
        cancel: C,
    ) -> Result<Response>
    where
        C: Future<Output = ()>,
    {
        let spec = self.resolve_base(project, request)?;
        let target = Target::from_spec(project.base_url(), &spec);
        self.dispatch(target, cancel).await
    }

    pub async fn execute_variant_with_cancel<C>(
        &self,
        project: &Project,
        request: &Request,
        variant: &Variant,
        cancel: C,
    ) -> Result<Response>
    where
        C: Future<Output = ()>,
    {
        let spec = self.resolve_base(project, request)?;
        let mut variant = variant.clone();
        variant.update(&project.root, &self.stash)?;

        let target = Target::from_variant(project.base_url(), &spec, &variant);
        self.dispatch(target, cancel).await
    }

    /// 按 `name` 或 `name.variant` 查找并发送
    pub async fn execute_target(&self, project: &Project, target: &str) -> Result<Response> {
        match project.requests.lookup(target)? {
            (request, None) => self.execute(project, request).await,
            (request, Some(variant)) => self.execute_variant(project, request, variant).await,
        }
    }

    /// 解析基础请求的副本；变体在需要时单独解析
    fn resolve_base(&self, project: &Project, request: &Request) -> Result<RequestSpec> {
        let mut spec = RequestSpec {
            variants: Vec::new(),
            ..request.spec.clone()
        };
        spec.update(&project.root, &self.stash)?;
        Ok(spec)
    }

    async fn dispatch<C>(&self, target: Target, cancel: C) -> Result<Response>
    where
        C: Future<Output = ()>,
    {
        let start = Instant::now();
        let request = target.build()?;

        // 读 Body 期间同样可以取消
        let response = tokio::select! {
            result = self.client.fetch(request, start) => result?,
            _ = cancel => return Err(HttpuError::Cancelled),
        };
        tracing::debug!(
            url = %target.url,
            status = response.status.code(),
            latency = %response.latency,
            "request finished"
        );

        self.apply_stash(&target.stash_values, &response);
        Ok(response)
    }

    /// 按捕获规则从响应中提取值并写入 stash
    ///
    /// 找不到的字段记为缺失值而不是错误，所有规则的结果都会写入。
    fn apply_stash(&self, rules: &[StashRule], response: &Response) {
        if rules.is_empty() {
            return;
        }

        let captured_at = Utc::now();
        let entries: Vec<_> = rules
            .iter()
            .map(|rule| {
                let capture = rule.capture(&response.body);
                if !capture.is_found() {
                    tracing::warn!(name = %rule.name, path = ?rule.json_path, "value not found in response");
                }
                rule.to_entry(capture, captured_at)
            })
            .collect();

        self.stash.push(entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::RequestBody;

    #[test]
    fn test_request_body_prefers_form() {
        let mut spec = RequestSpec {
            data: RequestBody::inline(r#"{"x":1}"#),
            ..RequestSpec::default()
        };
        let target = Target::from_spec("http://localhost", &spec);
        assert_eq!(target.request_body(), r#"{"x":1}"#);

        spec.form_data.set("foo", "bar");
        spec.form_data.add("something", "else");
        let target = Target::from_spec("http://localhost", &spec);
        assert_eq!(target.request_body(), "foo=bar&something=else");
    }

    #[test]
    fn test_variant_target() {
        let mut spec = RequestSpec {
            uri: "/users".to_string(),
            method: "GET".to_string(),
            data: RequestBody::inline("base body"),
            ..RequestSpec::default()
        };
        spec.headers.add("A", "1");
        spec.form_data.add("base", "x");

        let mut variant = Variant::new("one");
        variant.path = "/1".to_string();
        variant.method = "DELETE".to_string();
        variant.headers.add("A", "2");
        variant.headers.add("B", "3");

        let target = Target::from_variant("http://localhost:8080", &spec, &variant);
        assert_eq!(target.url, "http://localhost:8080/users/1");
        assert_eq!(target.method, "DELETE");
        assert_eq!(target.headers.get_all("A"), ["1", "2"]);
        assert_eq!(target.headers.get_all("B"), ["3"]);
        // body 和表单不继承
        assert_eq!(target.request_body(), "");
    }

    #[test]
    fn test_build_error_before_sending() {
        let spec = RequestSpec {
            uri: "/x".to_string(),
            method: "BAD METHOD".to_string(),
            ..RequestSpec::default()
        };
        let target = Target::from_spec("http://localhost", &spec);
        assert!(matches!(target.build(), Err(HttpuError::Build(_))));
    }
}
