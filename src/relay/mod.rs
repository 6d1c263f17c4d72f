//! Relay抓取器：对目标URL做单次GET，只校验声明的Content-Type，不解析返回体

use thiserror::Error;

pub mod endpoint;

pub use endpoint::{handle_relay_request, RelayResponse};

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("HTTP状态异常: {0}")]
    Http(u16),
    #[error("URL未返回JSON内容")]
    NotJson,
    #[error("请求失败: {0}")]
    Transport(String),
}

/// 远端抓取接口：真实实现走HTTP客户端，测试以桩实现替换
pub trait RemoteFetcher {
    fn fetch_remote_json(&self, url: &str) -> Result<String, RelayError>;
}

/// 基于 ureq 的阻塞式抓取实现（native-tls，使用系统根证书）
pub struct HttpRelayFetcher {
    agent: ureq::Agent,
}

impl HttpRelayFetcher {
    pub fn new() -> Self {
        use ureq::tls::{RootCerts, TlsConfig, TlsProvider};

        let tls_config = TlsConfig::builder()
            .provider(TlsProvider::NativeTls)
            .root_certs(RootCerts::PlatformVerifier)
            .build();

        // 非2xx状态不转成传输错误，由本层按状态码判定
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .tls_config(tls_config)
            .http_status_as_error(false)
            .build()
            .into();

        Self { agent }
    }
}

impl Default for HttpRelayFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteFetcher for HttpRelayFetcher {
    /// 单次GET：不重试、不缓存，重定向跟随传输层默认行为
    fn fetch_remote_json(&self, url: &str) -> Result<String, RelayError> {
        tracing::debug!("抓取远端JSON: {}", url);

        let mut response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| RelayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("远端返回非成功状态: {} ({})", status.as_u16(), url);
            return Err(RelayError::Http(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if !content_type_is_json(content_type.as_deref()) {
            return Err(RelayError::NotJson);
        }

        response
            .body_mut()
            .read_to_string()
            .map_err(|e| RelayError::Transport(e.to_string()))
    }
}

/// 只看声明的头，不看实际载荷；载荷校验由调用方补做
fn content_type_is_json(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|v| v.contains("application/json"))
}
