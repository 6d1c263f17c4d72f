//! Document：文档状态机与控制器操作

use serde_json::Value;
use thiserror::Error;

use crate::relay::{RelayError, RemoteFetcher};
use crate::utils::clipboard::{ClipboardAccess, ClipboardError};

/// 当前激活的页签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Editor,
    Viewer,
}

#[derive(Error, Debug)]
pub enum DocError {
    #[error("请输入URL")]
    Validation,
    #[error("从URL加载JSON失败，请确认地址可访问且返回有效JSON")]
    Relay(#[source] RelayError),
    #[error("URL未返回有效的JSON数据")]
    NotJson,
    #[error("JSON格式无效")]
    Parse(#[from] serde_json::Error),
    #[error("剪贴板操作失败: {0}")]
    Clipboard(#[from] ClipboardError),
}

/// 文档状态：原始文本、解析结果、错误槽、页签与加载标志
///
/// 不变式：parsed 仅在对当前 raw_text 的一次成功解析之后存在；
/// raw_text 的任何变化都会让 parsed 失效，直到查看器重新激活
#[derive(Debug, Default)]
pub struct Document {
    raw_text: String,
    parsed: Option<Value>,
    error: Option<String>,
    url_text: String,
    view_mode: ViewMode,
    loading: bool,
}

impl Document {
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn parsed(&self) -> Option<&Value> {
        self.parsed.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn url_text(&self) -> &str {
        &self.url_text
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn set_url_text(&mut self, text: impl Into<String>) {
        self.url_text = text.into();
    }

    /// 替换原始文本；不自动解析
    pub fn set_raw_text(&mut self, text: impl Into<String>) {
        self.raw_text = text.into();
        self.parsed = None;
    }

    /// 解析当前文本：成功存入解析结果并清错，失败记录解析错误并丢弃旧结果
    pub fn activate_viewer(&mut self) -> Result<(), DocError> {
        match serde_json::from_str::<Value>(&self.raw_text) {
            Ok(v) => {
                self.parsed = Some(v);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.parsed = None;
                let err = DocError::Parse(e);
                self.error = Some(err.to_string());
                tracing::warn!("文本解析失败: {}", err);
                Err(err)
            }
        }
    }

    /// 页签切换：进入查看器时触发解析，回到编辑器无副作用
    pub fn switch_tab(&mut self, mode: ViewMode) -> Result<(), DocError> {
        let entering_viewer = mode == ViewMode::Viewer && self.view_mode == ViewMode::Editor;
        self.view_mode = mode;
        if entering_viewer {
            self.activate_viewer()
        } else {
            Ok(())
        }
    }

    /// 重新序列化为缩进形式；解析失败时文本保持原样
    pub fn beautify(&mut self) -> Result<(), DocError> {
        self.reserialize(|v| serde_json::to_string_pretty(v))
    }

    /// 重新序列化为紧凑形式（无空白）
    pub fn minify(&mut self) -> Result<(), DocError> {
        self.reserialize(|v| serde_json::to_string(v))
    }

    fn reserialize<F>(&mut self, ser: F) -> Result<(), DocError>
    where
        F: FnOnce(&Value) -> Result<String, serde_json::Error>,
    {
        match serde_json::from_str::<Value>(&self.raw_text) {
            Ok(v) => {
                let text = ser(&v)?;
                self.set_raw_text(text);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                let err = DocError::Parse(e);
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// 从URL加载：空URL直接报错且不触发抓取；抓取成功后先本地校验返回体，
    /// 校验通过才替换文本；查看器激活时顺带解析。加载标志进出时成对维护
    pub fn load_from_url(&mut self, fetcher: &dyn RemoteFetcher) -> Result<(), DocError> {
        let url = self.url_text.trim().to_string();
        if url.is_empty() {
            let err = DocError::Validation;
            self.error = Some(err.to_string());
            return Err(err);
        }
        if self.loading {
            // 上一次加载尚未结束，忽略本次触发
            tracing::debug!("加载进行中，忽略重复的URL加载请求");
            return Ok(());
        }

        self.loading = true;
        self.error = None;
        let result = self.load_from_url_inner(fetcher, &url);
        self.loading = false;

        if let Err(err) = &result {
            self.error = Some(err.to_string());
            tracing::error!("URL加载失败: {}", err);
        } else {
            tracing::info!("URL加载成功: {}", url);
        }
        result
    }

    fn load_from_url_inner(
        &mut self,
        fetcher: &dyn RemoteFetcher,
        url: &str,
    ) -> Result<(), DocError> {
        let body = fetcher.fetch_remote_json(url).map_err(DocError::Relay)?;

        // 中继只看声明头；这里补一次载荷解析，结果本身丢弃
        if serde_json::from_str::<Value>(&body).is_err() {
            self.parsed = None;
            return Err(DocError::NotJson);
        }

        self.set_raw_text(body);
        if self.view_mode == ViewMode::Viewer {
            self.activate_viewer()?;
        }
        Ok(())
    }

    /// 从系统剪贴板读文本替换正文；平台拒绝访问时报剪贴板错误
    pub fn paste_from_clipboard(&mut self, clip: &mut dyn ClipboardAccess) -> Result<(), DocError> {
        match clip.get_text() {
            Ok(text) => {
                self.set_raw_text(text);
                Ok(())
            }
            Err(e) => {
                let err = DocError::Clipboard(e);
                self.error = Some(err.to_string());
                tracing::error!("粘贴失败: {}", err);
                Err(err)
            }
        }
    }

    /// 清空正文、解析结果、错误与URL输入
    pub fn clear(&mut self) {
        self.raw_text.clear();
        self.parsed = None;
        self.error = None;
        self.url_text.clear();
    }
}
