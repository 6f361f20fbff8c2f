use crate::http::Response;
use colored::*;

pub enum ResponseFormat {
    /// 状态行、耗时、简短的 Body
    Compact,
    /// 额外输出全部 Header 和完整 Body
    Verbose,
}

pub struct ResponseFormatter {
    format: ResponseFormat,
    color: bool,
}

impl ResponseFormatter {
    /// Compact 模式下超过这个长度的 Body 只显示字节数
    const COMPACT_BODY_LIMIT: usize = 200;

    pub fn new(format: ResponseFormat) -> Self {
        Self {
            format,
            color: true,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn format(&self, response: &Response) -> String {
        let mut output = vec![self.status_line(response), self.timing_line(response)];

        match self.format {
            ResponseFormat::Compact => {
                let body = response.text();
                if !body.is_empty() && body.len() < Self::COMPACT_BODY_LIMIT {
                    output.push(pretty_json(response).unwrap_or(body));
                } else if !body.is_empty() {
                    output.push(format!("Body: {} bytes", body.len()));
                }
            }
            ResponseFormat::Verbose => {
                output.push(String::new());
                output.push(self.paint_heading("Headers:"));
                for (key, value) in response.headers.iter() {
                    let line = format!("   {}: {}", key, value.to_str().unwrap_or("<invalid utf-8>"));
                    output.push(if self.color { line.blue().to_string() } else { line });
                }

                let body = response.text();
                if !body.is_empty() {
                    output.push(String::new());
                    output.push(self.paint_heading("Body:"));
                    output.push(pretty_json(response).unwrap_or(body));
                }
            }
        }

        output.join("\n")
    }

    fn status_line(&self, response: &Response) -> String {
        let line = format!("HTTP {}", response.status);
        if !self.color {
            return line;
        }
        let colored = if response.is_success() {
            line.green()
        } else if response.status.is_redirect() {
            line.cyan()
        } else if response.is_client_error() {
            line.yellow()
        } else if response.is_server_error() {
            line.red()
        } else {
            line.magenta()
        };
        colored.bold().to_string()
    }

    fn timing_line(&self, response: &Response) -> String {
        let line = format!("Time: {}", response.latency);
        if self.color { line.cyan().to_string() } else { line }
    }

    fn paint_heading(&self, heading: &str) -> String {
        if self.color {
            heading.blue().bold().to_string()
        } else {
            heading.to_string()
        }
    }
}

/// 尝试将 Body 格式化为缩进的 JSON，不是 JSON 时返回 None
fn pretty_json(response: &Response) -> Option<String> {
    let value: serde_json::Value = response.json().ok()?;
    serde_json::to_string_pretty(&value).ok()
}
