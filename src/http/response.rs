use crate::Result;
use crate::http::types::{Latency, Status};
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

/// 完整读入内存的响应，Body 可以反复读取
#[derive(Debug, Clone)]
pub struct Response {
    pub status: Status,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub latency: Latency,
}

impl Response {
    pub fn new(status: u16, headers: HeaderMap, body: Vec<u8>, latency: Latency) -> Result<Self> {
        Ok(Self {
            status: Status::new(status)?,
            headers,
            body,
            latency,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Body 文本，非 UTF-8 字节按替换字符处理
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_is_replayable() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        let response = Response::new(
            200,
            headers,
            br#"{"error": false}"#.to_vec(),
            Latency::default(),
        )
        .unwrap();

        assert_eq!(response.text(), r#"{"error": false}"#);
        assert_eq!(response.text(), r#"{"error": false}"#);
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["error"], false);
    }
}
