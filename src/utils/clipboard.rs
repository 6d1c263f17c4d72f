//! Clipboard  cross-platform clipboard helpers

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("clipboard error: {0}")]
    Clip(String),
}

/// 剪贴板读写接口：真实实现走系统剪贴板，测试用内存桩
pub trait ClipboardAccess {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
    fn get_text(&mut self) -> Result<String, ClipboardError>;
}

/// 系统剪贴板（copypasta），每次操作新建上下文
pub struct SystemClipboard;

impl ClipboardAccess for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        use copypasta::{ClipboardContext, ClipboardProvider};
        let mut ctx = ClipboardContext::new().map_err(|e| ClipboardError::Clip(e.to_string()))?;
        ctx.set_contents(text.to_string())
            .map_err(|e| ClipboardError::Clip(e.to_string()))
    }

    fn get_text(&mut self) -> Result<String, ClipboardError> {
        use copypasta::{ClipboardContext, ClipboardProvider};
        let mut ctx = ClipboardContext::new().map_err(|e| ClipboardError::Clip(e.to_string()))?;
        ctx.get_contents()
            .map_err(|e| ClipboardError::Clip(e.to_string()))
    }
}
