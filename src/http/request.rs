use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};

use crate::resource::Headers;
use crate::{HttpuError, Result};

/// 已完全解析、可以直接发送的请求
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpRequest {
    /// method 为空时按 GET 处理
    pub fn new(method: &str, url: &str) -> Result<Self> {
        let method = if method.trim().is_empty() {
            Method::GET
        } else {
            Method::from_bytes(method.trim().as_bytes())
                .map_err(|_| HttpuError::Build(format!("Invalid HTTP method: {}", method)))?
        };
        let url = Url::parse(url)
            .map_err(|e| HttpuError::Build(format!("Invalid URL '{}': {}", url, e)))?;

        Ok(Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: String::new(),
        })
    }

    /// 追加一个 Header，同名时保留已有的值
    pub fn with_header(mut self, key: &str, value: &str) -> Result<Self> {
        let name: HeaderName = key
            .parse()
            .map_err(|_| HttpuError::Build(format!("Invalid header name: {}", key)))?;
        let value: HeaderValue = value
            .parse()
            .map_err(|_| HttpuError::Build(format!("Invalid value for header {}", key)))?;
        self.headers.append(name, value);
        Ok(self)
    }

    pub fn with_headers(self, headers: &Headers) -> Result<Self> {
        headers
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |value| (name, value)))
            .try_fold(self, |request, (name, value)| request.with_header(name, value))
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request() {
        let request = HttpRequest::new("post", "http://example.com/users").unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url.path(), "/users");
    }

    #[test]
    fn test_empty_method_defaults_to_get() {
        let request = HttpRequest::new("", "http://example.com").unwrap();
        assert_eq!(request.method, Method::GET);
    }

    #[test]
    fn test_custom_method() {
        let request = HttpRequest::new("PURGE", "http://example.com").unwrap();
        assert_eq!(request.method.as_str(), "PURGE");
    }

    #[test]
    fn test_build_errors() {
        assert!(matches!(
            HttpRequest::new("GE T", "http://example.com"),
            Err(HttpuError::Build(_))
        ));
        assert!(matches!(
            HttpRequest::new("GET", "not a valid url"),
            Err(HttpuError::Build(_))
        ));

        let request = HttpRequest::new("GET", "http://example.com").unwrap();
        assert!(matches!(
            request.with_header("bad header", "x"),
            Err(HttpuError::Build(_))
        ));
    }

    #[test]
    fn test_with_headers_keeps_duplicates() {
        let headers: Headers = [("X-Tag", "a"), ("X-Tag", "b"), ("Accept", "*/*")]
            .into_iter()
            .collect();
        let request = HttpRequest::new("GET", "http://example.com")
            .unwrap()
            .with_headers(&headers)
            .unwrap();

        let tags: Vec<&str> = request
            .headers
            .get_all("x-tag")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(tags, vec!["a", "b"]);
        assert_eq!(request.headers.get("accept").unwrap(), "*/*");
    }
}
