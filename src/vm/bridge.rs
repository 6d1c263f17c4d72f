//! VM桥接层：连接Slint UI与Document数据模型
//!
//! 注意：此模块的具体实现在main.rs中，因为依赖于Slint生成的类型
//! 这里只提供公共常量

use std::time::Duration;

// === 常量定义（消除魔法值） ===
pub const TAB_EDITOR: i32 = 0;
pub const TAB_VIEWER: i32 = 1;

/// “已复制”指示的驻留时长
pub const COPIED_RESET: Duration = Duration::from_secs(1);
