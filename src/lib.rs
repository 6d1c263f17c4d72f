//! JSON查看器核心库
//!
//! 提供文档状态机、树视图渲染、剪贴板与远端JSON中继抓取
//! 遵循MVVM架构模式，UI层之外的逻辑均可独立测试

pub mod model;
pub mod relay;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use model::document::{DocError, Document, ViewMode};
pub use model::tree_view::{decide_value_click, ClickOutcome, NodeKind, TreeArena, TreeRow};
pub use relay::{handle_relay_request, HttpRelayFetcher, RelayError, RelayResponse, RemoteFetcher};
