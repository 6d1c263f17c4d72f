//! Relay端点：`{ "url": ... }` 请求体 → 原样转发返回体，与具体HTTP服务框架解耦

use serde::{Deserialize, Serialize};

use super::RemoteFetcher;

#[derive(Debug, Deserialize)]
struct RelayRequest {
    url: Option<String>,
}

#[derive(Debug, Serialize)]
struct RelayErrorBody<'a> {
    error: &'a str,
}

/// 端点响应：状态码 + 响应体文本；成功时返回体的Content-Type一律按JSON对外声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    pub status: u16,
    pub body: String,
}

impl RelayResponse {
    fn error(status: u16, message: &str) -> Self {
        let body = serde_json::to_string(&RelayErrorBody { error: message })
            .unwrap_or_else(|_| String::from("{}"));
        Self { status, body }
    }
}

/// 处理一次Relay请求：URL缺失/为空 → 400；请求体异常或抓取失败 → 500；成功 → 200原样返回
pub fn handle_relay_request(body: &str, fetcher: &dyn RemoteFetcher) -> RelayResponse {
    let request: RelayRequest = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!("Relay请求体无法解析: {}", e);
            return RelayResponse::error(500, "Failed to fetch JSON from URL");
        }
    };

    let url = match request.url {
        Some(u) if !u.is_empty() => u,
        _ => return RelayResponse::error(400, "URL is required"),
    };

    match fetcher.fetch_remote_json(&url) {
        Ok(payload) => RelayResponse {
            status: 200,
            body: payload,
        },
        Err(e) => {
            tracing::warn!("Relay抓取失败: {}", e);
            RelayResponse::error(500, "Failed to fetch JSON from URL")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::RelayError;
    use std::cell::Cell;

    enum StubReply {
        Body(&'static str),
        Http(u16),
        NotJson,
    }

    struct StubFetcher {
        reply: StubReply,
        calls: Cell<u32>,
    }

    impl StubFetcher {
        fn new(reply: StubReply) -> Self {
            Self {
                reply,
                calls: Cell::new(0),
            }
        }
    }

    impl RemoteFetcher for StubFetcher {
        fn fetch_remote_json(&self, _url: &str) -> Result<String, RelayError> {
            self.calls.set(self.calls.get() + 1);
            match &self.reply {
                StubReply::Body(s) => Ok((*s).to_string()),
                StubReply::Http(code) => Err(RelayError::Http(*code)),
                StubReply::NotJson => Err(RelayError::NotJson),
            }
        }
    }

    #[test]
    fn test_success_returns_body_verbatim() {
        let fetcher = StubFetcher::new(StubReply::Body(r#"{"a": 1}"#));
        let resp = handle_relay_request(r#"{"url": "http://example.com/data"}"#, &fetcher);
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, r#"{"a": 1}"#, "成功时返回体应原样转发");
        assert_eq!(fetcher.calls.get(), 1);
    }

    #[test]
    fn test_missing_url_is_400() {
        let fetcher = StubFetcher::new(StubReply::Body("{}"));
        for body in [r#"{}"#, r#"{"url": ""}"#, r#"{"url": null}"#] {
            let resp = handle_relay_request(body, &fetcher);
            assert_eq!(resp.status, 400, "缺失URL的请求体 {} 应返回400", body);
            assert!(resp.body.contains("error"));
        }
        assert_eq!(fetcher.calls.get(), 0, "URL缺失时不应触发抓取");
    }

    #[test]
    fn test_malformed_body_is_500() {
        let fetcher = StubFetcher::new(StubReply::Body("{}"));
        let resp = handle_relay_request("not json at all", &fetcher);
        assert_eq!(resp.status, 500);
        assert_eq!(fetcher.calls.get(), 0);
    }

    #[test]
    fn test_fetch_failures_are_500() {
        for reply in [StubReply::Http(404), StubReply::NotJson] {
            let fetcher = StubFetcher::new(reply);
            let resp = handle_relay_request(r#"{"url": "http://example.com/x"}"#, &fetcher);
            assert_eq!(resp.status, 500, "上游失败应统一映射为500");
            let parsed: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
            assert!(
                parsed.get("error").is_some(),
                "失败响应体应为 {{\"error\": ...}} 形式"
            );
        }
    }
}
