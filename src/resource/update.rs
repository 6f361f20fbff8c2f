use crate::Result;
use crate::resource::multimap::{FormData, Headers};
use crate::resource::request::{RequestBody, RequestSpec, Variant};
use crate::variable::{EnvSource, Stash, ValueSource, VariableResolver};
use std::path::Path;

/// 基础请求和变体共有的、需要解析的字段
struct Template<'a> {
    location: &'a mut String,
    method: &'a mut String,
    body: &'a mut RequestBody,
    form: &'a mut FormData,
    headers: &'a mut Headers,
}

impl Template<'_> {
    fn update(mut self, root: &Path, stash: &Stash) -> Result<()> {
        if !self.form.is_empty() {
            self.headers.set(Headers::CONTENT_TYPE, Headers::FORM_URLENCODED);
        }

        self.body.load(root)?;

        self.substitute(VariableResolver::env(), &EnvSource);
        self.substitute(VariableResolver::stash(), stash);
        Ok(())
    }

    fn substitute<S>(&mut self, resolver: &VariableResolver, source: &S)
    where
        S: ValueSource + ?Sized,
    {
        let apply = |value: &mut String| {
            *value = resolver.substitute(value, source);
        };

        apply(&mut *self.location);
        apply(&mut *self.method);
        if let Some(contents) = self.body.contents_mut() {
            apply(contents);
        }
        self.form.values_mut().for_each(&apply);
        self.headers.values_mut().for_each(&apply);
    }
}

impl RequestSpec {
    fn template(&mut self) -> Template<'_> {
        Template {
            location: &mut self.uri,
            method: &mut self.method,
            body: &mut self.data,
            form: &mut self.form_data,
            headers: &mut self.headers,
        }
    }

    /// 解析流水线，依次作用于基础请求和每个变体:
    ///
    /// 1. 有表单字段时强制 `Content-Type: application/x-www-form-urlencoded`
    /// 2. 读取 `fromFile` 指向的请求体（只读一次）
    /// 3. 替换 `${env[...]}`
    /// 4. 替换 `${stash[...]}`
    ///
    /// 没有值的占位符保持原样，所以重复执行是安全的。
    pub fn update(&mut self, root: &Path, stash: &Stash) -> Result<()> {
        tracing::debug!(uri = %self.uri, "resolving request spec");
        self.template().update(root, stash)?;
        for variant in &mut self.variants {
            variant.update(root, stash)?;
        }
        Ok(())
    }
}

impl Variant {
    fn template(&mut self) -> Template<'_> {
        Template {
            location: &mut self.path,
            method: &mut self.method,
            body: &mut self.data,
            form: &mut self.form_data,
            headers: &mut self.headers,
        }
    }

    /// 对单个变体执行同样的解析流水线
    pub fn update(&mut self, root: &Path, stash: &Stash) -> Result<()> {
        self.template().update(root, stash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::StashEntry;
    use tempfile::TempDir;

    #[test]
    fn test_form_header_inference() {
        let mut spec = RequestSpec::default();
        spec.headers.add("content-type", "application/json");
        spec.form_data.add("foo", "bar");

        spec.update(Path::new("."), &Stash::new()).unwrap();
        assert_eq!(spec.headers.get_all("Content-Type"), [Headers::FORM_URLENCODED]);
    }

    #[test]
    fn test_no_form_keeps_headers() {
        let mut spec = RequestSpec::default();
        spec.headers.add("Content-Type", "application/json");

        spec.update(Path::new("."), &Stash::new()).unwrap();
        assert_eq!(spec.headers.get("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_stash_substitution_everywhere() {
        let stash = Stash::new();
        stash.set("token", StashEntry::new("token", "42"));

        let mut spec = RequestSpec {
            uri: "/users/${stash[token]}".to_string(),
            method: "GET".to_string(),
            data: RequestBody::inline(r#"{"id": "${stash[token]}"}"#),
            ..RequestSpec::default()
        };
        spec.headers.add("Authorization", "Bearer ${stash[token]}");
        spec.headers.add("Authorization", "Token ${stash[token]}");
        spec.form_data.add("id", "${stash[token]}");

        let mut variant = Variant::new("child");
        variant.path = "/${stash[token]}".to_string();
        variant.method = "${stash[missing]}".to_string();
        spec.variants.push(variant);

        spec.update(Path::new("."), &stash).unwrap();

        assert_eq!(spec.uri, "/users/42");
        assert_eq!(spec.data.text(), r#"{"id": "42"}"#);
        assert_eq!(spec.headers.get_all("Authorization"), ["Bearer 42", "Token 42"]);
        assert_eq!(spec.form_data.get("id"), Some("42"));
        assert_eq!(spec.variants[0].path, "/42");
        assert_eq!(spec.variants[0].method, "${stash[missing]}");
    }

    #[test]
    fn test_env_substitution() {
        unsafe {
            std::env::set_var("HTTPU_UPDATE_TEST_HOST", "example.org");
        }

        let mut spec = RequestSpec {
            uri: "/${env[HTTPU_UPDATE_TEST_HOST]}/${stash[later]}".to_string(),
            ..RequestSpec::default()
        };
        spec.update(Path::new("."), &Stash::new()).unwrap();
        assert_eq!(spec.uri, "/example.org/${stash[later]}");

        unsafe {
            std::env::remove_var("HTTPU_UPDATE_TEST_HOST");
        }
    }

    #[test]
    fn test_update_is_idempotent() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("body.json"), r#"{"token": "${stash[token]}"}"#).unwrap();

        let stash = Stash::new();
        stash.set("token", StashEntry::new("token", "abc"));

        let mut spec = RequestSpec {
            data: RequestBody::from_file("body.json"),
            ..RequestSpec::default()
        };
        spec.update(dir.path(), &stash).unwrap();
        let first = spec.data.text().to_string();

        spec.update(dir.path(), &stash).unwrap();
        assert_eq!(spec.data.text(), first);
        assert_eq!(first, r#"{"token": "abc"}"#);
    }

    #[test]
    fn test_variant_body_from_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("v.txt"), "variant body").unwrap();

        let mut variant = Variant::new("v");
        variant.data = RequestBody::from_file("v.txt");
        let mut spec = RequestSpec {
            variants: vec![variant],
            ..RequestSpec::default()
        };

        spec.update(dir.path(), &Stash::new()).unwrap();
        assert_eq!(spec.variants[0].data.text(), "variant body");
    }
}
