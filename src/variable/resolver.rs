use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::OnceLock;

/// 占位符取值来源
///
/// 返回 `None` 表示当前没有可用的值，占位符会原样保留，
/// 以便后续的替换轮次（或之后的请求）再处理。
pub trait ValueSource {
    fn lookup(&self, key: &str) -> Option<String>;
}

/// 从进程环境变量取值
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl ValueSource for EnvSource {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl ValueSource for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<F> ValueSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// 扫描出的一个占位符
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// 整个 `${kind[key]}` 在原字符串中的字节区间
    pub span: Range<usize>,
    pub key: String,
}

/// 占位符替换器
///
/// 语法为 `${kind[key]}`，`kind` 在构造时固定（`env` 或 `stash`），
/// `key` 是 `[` 之后到第一个 `]` 之前的全部字符。不同 kind 的替换器
/// 可以依次处理同一个字符串，彼此不会碰到对方的占位符。
#[derive(Debug, Clone)]
pub struct VariableResolver {
    pattern: Regex,
}

impl VariableResolver {
    pub const ENV: &'static str = "env";
    pub const STASH: &'static str = "stash";

    pub fn new(kind: &str) -> Self {
        let pattern = format!(r"\$\{{{kind}\[([^\]]*)\]\}}", kind = regex::escape(kind));
        Self {
            pattern: Regex::new(&pattern).expect("escaped placeholder pattern is valid"),
        }
    }

    /// `${env[...]}` 替换器
    pub fn env() -> &'static Self {
        static ENV: OnceLock<VariableResolver> = OnceLock::new();
        ENV.get_or_init(|| Self::new(Self::ENV))
    }

    /// `${stash[...]}` 替换器
    pub fn stash() -> &'static Self {
        static STASH: OnceLock<VariableResolver> = OnceLock::new();
        STASH.get_or_init(|| Self::new(Self::STASH))
    }

    /// 第一阶段：从左到右扫描一次原字符串，收集所有格式完整的占位符。
    ///
    /// 缺少 `]}` 结尾的占位符不算数，直接跳过。
    pub fn scan(&self, text: &str) -> Vec<Placeholder> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let key = caps.get(1)?;
                Some(Placeholder {
                    span: whole.range(),
                    key: key.as_str().to_string(),
                })
            })
            .collect()
    }

    /// 第二阶段：按扫描结果重建字符串
    ///
    /// 未匹配的片段原样复制；匹配到的占位符替换为取到的值，
    /// 取不到值则保留原占位符。替换值的长度不会影响其余占位符的位置，
    /// 替换值里即使含有占位符也不会被再次处理。
    pub fn substitute<S>(&self, text: &str, source: &S) -> String
    where
        S: ValueSource + ?Sized,
    {
        let placeholders = self.scan(text);
        if placeholders.is_empty() {
            return text.to_string();
        }

        let mut output = String::with_capacity(text.len());
        let mut cursor = 0;
        for placeholder in placeholders {
            output.push_str(&text[cursor..placeholder.span.start]);
            match source.lookup(&placeholder.key) {
                Some(value) => output.push_str(&value),
                None => output.push_str(&text[placeholder.span.clone()]),
            }
            cursor = placeholder.span.end;
        }
        output.push_str(&text[cursor..]);

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixed(key: &str) -> Option<String> {
        Some(format!("test-variable-{}", key))
    }

    #[test]
    fn test_substitute_by_kind() {
        let resolver = VariableResolver::new("stash");
        assert_eq!(
            resolver.substitute("${stash[test]}", &prefixed),
            "test-variable-test"
        );

        let resolver = VariableResolver::new("env");
        assert_eq!(
            resolver.substitute("${env[hello]}", &prefixed),
            "test-variable-hello"
        );
    }

    #[test]
    fn test_substitute_multiple() {
        let resolver = VariableResolver::new("multi");
        let output = resolver.substitute("${multi[hello]} string ${multi[world]}", &prefixed);
        assert_eq!(output, "test-variable-hello string test-variable-world");
    }

    #[test]
    fn test_other_kind_untouched() {
        let resolver = VariableResolver::new("ignore");
        let input = "${multi[hello]} string ${multi[world]}";
        assert_eq!(resolver.substitute(input, &prefixed), input);
    }

    #[test]
    fn test_resolved_value() {
        let mut values = HashMap::new();
        values.insert("token".to_string(), "42".to_string());

        let output = VariableResolver::stash().substitute("id=${stash[token]}", &values);
        assert_eq!(output, "id=42");
    }

    #[test]
    fn test_unresolved_key_left_as_is() {
        let values: HashMap<String, String> = HashMap::new();
        let output = VariableResolver::stash().substitute("id=${stash[missing]}", &values);
        assert_eq!(output, "id=${stash[missing]}");
    }

    #[test]
    fn test_malformed_placeholder() {
        let values: HashMap<String, String> = HashMap::new();
        let resolver = VariableResolver::stash();

        assert_eq!(resolver.substitute("${stash[token", &values), "${stash[token");
        assert_eq!(resolver.substitute("${stash[token]", &values), "${stash[token]");
        assert_eq!(resolver.substitute("${stash[", &values), "${stash[");
        assert_eq!(resolver.substitute("$", &values), "$");
        assert_eq!(resolver.substitute("", &values), "");
    }

    #[test]
    fn test_malformed_then_wellformed() {
        let resolver = VariableResolver::stash();
        let output = resolver.substitute("${stash[a ${stash[b]} ${stash[c]}", &prefixed);
        // 第一个 `]` 之前都算 key
        assert_eq!(output, "test-variable-a ${stash[b test-variable-c");
    }

    #[test]
    fn test_replacement_length_does_not_shift_scan() {
        let resolver = VariableResolver::stash();
        let long = |_: &str| Some("a-much-longer-replacement-value".to_string());
        let output = resolver.substitute("${stash[x]}/${stash[y]}", &long);
        assert_eq!(
            output,
            "a-much-longer-replacement-value/a-much-longer-replacement-value"
        );

        let short = |_: &str| Some(String::new());
        assert_eq!(resolver.substitute("a${stash[x]}b${stash[y]}c", &short), "abc");
    }

    #[test]
    fn test_replacement_not_rescanned() {
        let resolver = VariableResolver::stash();
        let nested = |key: &str| match key {
            "outer" => Some("${stash[inner]}".to_string()),
            _ => Some("boom".to_string()),
        };
        assert_eq!(resolver.substitute("${stash[outer]}", &nested), "${stash[inner]}");
    }

    #[test]
    fn test_partial_resolution() {
        let mut values = HashMap::new();
        values.insert("a".to_string(), "1".to_string());

        let output = VariableResolver::stash().substitute("${stash[a]}-${stash[b]}", &values);
        assert_eq!(output, "1-${stash[b]}");
    }

    #[test]
    fn test_scan_spans() {
        let found = VariableResolver::env().scan("x ${env[HOME]} y ${stash[z]}");
        assert_eq!(
            found,
            vec![Placeholder {
                span: 2..14,
                key: "HOME".to_string()
            }]
        );
    }

    #[test]
    fn test_multibyte_text() {
        let values = |_: &str| Some("值".to_string());
        let output = VariableResolver::stash().substitute("前缀 ${stash[k]} 后缀", &values);
        assert_eq!(output, "前缀 值 后缀");
    }

    #[test]
    fn test_env_source() {
        unsafe {
            std::env::set_var("HTTPU_RESOLVER_TEST", "from-env");
        }

        let output = VariableResolver::env().substitute("v=${env[HTTPU_RESOLVER_TEST]}", &EnvSource);
        assert_eq!(output, "v=from-env");

        let output = VariableResolver::env().substitute("${env[HTTPU_RESOLVER_MISSING]}", &EnvSource);
        assert_eq!(output, "${env[HTTPU_RESOLVER_MISSING]}");

        unsafe {
            std::env::remove_var("HTTPU_RESOLVER_TEST");
        }
    }
}
