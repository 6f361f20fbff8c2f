use serde::{Deserialize, Serialize};

/// 保持插入顺序的多值映射，名称区分大小写
///
/// 表单字段直接使用它；Header 在外面再包一层做名称规范化。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiMap {
    entries: Vec<(String, Vec<String>)>,
}

impl MultiMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == name)
    }

    /// 追加一个值，同名时累加
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(i) => self.entries[i].1.push(value.into()),
            None => self.entries.push((name, vec![value.into()])),
        }
    }

    /// 覆盖该名称下的所有值
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.position(&name) {
            Some(i) => self.entries[i].1 = vec![value.into()],
            None => self.entries.push((name, vec![value.into()])),
        }
    }

    /// 第一个值
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        self.position(name)
            .map(|i| self.entries[i].1.as_slice())
            .unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// 所有值的可变引用（每个名称下的全部值）
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.entries.iter_mut().flat_map(|(_, v)| v.iter_mut())
    }

    /// 名称数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 合并：同名的值累加在 `self` 的值之后，新名称追加在末尾
    pub fn merge(&self, other: &MultiMap) -> MultiMap {
        let mut merged = self.clone();
        for (name, values) in other.iter() {
            for value in values {
                merged.add(name, value.as_str());
            }
        }
        merged
    }

    /// `application/x-www-form-urlencoded` 编码，按插入顺序
    pub fn to_form_urlencoded(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, values) in self.iter() {
            for value in values {
                serializer.append_pair(name, value);
            }
        }
        serializer.finish()
    }
}

impl<K, V> FromIterator<(K, V)> for MultiMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = MultiMap::new();
        for (k, v) in iter {
            map.add(k, v);
        }
        map
    }
}

/// 资源文件中的表单字段 `{ "name": ..., "value": ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FormField {
    name: String,
    #[serde(default)]
    value: String,
}

/// 表单数据
pub type FormData = MultiMap;

impl Serialize for MultiMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields: Vec<FormField> = self
            .iter()
            .flat_map(|(name, values)| {
                values.iter().map(move |value| FormField {
                    name: name.to_string(),
                    value: value.clone(),
                })
            })
            .collect();
        fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MultiMap {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Vec::<FormField>::deserialize(deserializer)?;
        Ok(fields.into_iter().map(|f| (f.name, f.value)).collect())
    }
}

/// 请求头，名称不区分大小写，统一存成 `Content-Type` 这种规范形式
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: MultiMap,
}

impl Headers {
    pub const CONTENT_TYPE: &'static str = "Content-Type";
    pub const FORM_URLENCODED: &'static str = "application/x-www-form-urlencoded";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, value: impl Into<String>) {
        self.inner.add(canonical_name(name), value);
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.inner.set(canonical_name(name), value);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(&canonical_name(name))
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        self.inner.get_all(&canonical_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains(&canonical_name(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.inner.iter()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.inner.values_mut()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// 变体的 Header 合并到基础请求上：同名保留双方的值，基础请求的在前
    pub fn merge(&self, other: &Headers) -> Headers {
        Headers {
            inner: self.inner.merge(&other.inner),
        }
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Headers {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.add(name, value);
        }
        headers
    }
}

/// 资源文件中的请求头 `{ "header": ..., "value": ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HeaderField {
    header: String,
    #[serde(default)]
    value: String,
}

impl Serialize for Headers {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields: Vec<HeaderField> = self
            .iter()
            .flat_map(|(header, values)| {
                values.iter().map(move |value| HeaderField {
                    header: header.to_string(),
                    value: value.clone(),
                })
            })
            .collect();
        fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Headers {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Vec::<HeaderField>::deserialize(deserializer)?;
        let mut headers = Headers::new();
        for field in fields {
            headers.add(&field.header, field.value);
        }
        Ok(headers)
    }
}

/// 规范化 Header 名称：首字母和 `-` 后的字母大写，其余小写。
/// 含有非法字符的名称原样返回，留给构建请求时报错。
pub fn canonical_name(name: &str) -> String {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b));
    if !valid {
        return name.to_string();
    }

    let mut upper = true;
    name.chars()
        .map(|c| {
            let mapped = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            mapped
        })
        .collect()
}
