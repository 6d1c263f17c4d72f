//! 程序入口：初始化日志、加载 Slint UI，并绑定文档与树视图回调

use std::{cell::RefCell, rc::Rc};

use anyhow::Context;
use slint::{ComponentHandle, ModelRc, Timer, VecModel};
use tracing_subscriber::fmt::SubscriberBuilder;

slint::include_modules!();

mod model;
mod relay;
mod utils;
mod vm;

use model::document::{Document, ViewMode};
use model::tree_view::{ClickOutcome, NodeKind, TreeArena, TreeRow};
use relay::HttpRelayFetcher;
use utils::clipboard::{ClipboardAccess, SystemClipboard};
use vm::bridge::*;

// TreeRowData转换实现
impl From<&TreeRow> for TreeRowData {
    /// 将渲染行转换为Slint可用的数据结构
    fn from(row: &TreeRow) -> Self {
        Self {
            name: row.name.clone().into(),
            path: row.path.clone().into(),
            kind: format!("{:?}", row.kind).into(), // Object/Array/String等
            display_value: row.display_value.clone().into(),
            summary: row.summary.clone().into(),
            depth: row.depth as i32,
            expanded: row.expanded,
            is_composite: matches!(row.kind, NodeKind::Object | NodeKind::Array),
            is_long: row.long_value,
            show_full_text: row.show_full_text,
            copied: row.copied,
        }
    }
}

/// VM桥接器：管理UI与数据层的交互
struct ViewModelBridge {
    document: Rc<RefCell<Document>>,
    tree: Rc<RefCell<TreeArena>>,
    fetcher: Rc<HttpRelayFetcher>,
    clipboard: Rc<RefCell<SystemClipboard>>,
}

impl ViewModelBridge {
    /// 创建新的VM桥接器并绑定所有回调
    fn new(app_window: &AppWindow, document: Rc<RefCell<Document>>) -> Self {
        let bridge = Self {
            document,
            tree: Rc::new(RefCell::new(TreeArena::default())),
            fetcher: Rc::new(HttpRelayFetcher::new()),
            clipboard: Rc::new(RefCell::new(SystemClipboard)),
        };

        // 绑定所有UI回调
        bridge.setup_callbacks(app_window);
        bridge
    }

    /// 设置所有UI回调函数
    fn setup_callbacks(&self, app_window: &AppWindow) {
        // === 编辑器正文改动回调 ===
        {
            let document = self.document.clone();
            app_window.on_raw_text_edited(move |text| {
                document.borrow_mut().set_raw_text(text.to_string());
            });
        }

        // === URL输入改动回调 ===
        {
            let document = self.document.clone();
            app_window.on_url_edited(move |text| {
                document.borrow_mut().set_url_text(text.to_string());
            });
        }

        // === 从URL加载回调 ===
        {
            let document = self.document.clone();
            let tree = self.tree.clone();
            let fetcher = self.fetcher.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_load_from_url(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_load_from_url(&app_window, &document, &tree, &fetcher);
                }
            });
        }

        // === 页签切换回调 ===
        {
            let document = self.document.clone();
            let tree = self.tree.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_tab_changed(move |tab| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_tab_changed(&app_window, &document, &tree, tab);
                }
            });
        }

        // === 美化回调 ===
        {
            let document = self.document.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_beautify_pressed(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    if let Err(e) = document.borrow_mut().beautify() {
                        tracing::warn!("美化失败: {}", e);
                    }
                    Self::sync_document_view(&app_window, &document);
                }
            });
        }

        // === 压缩回调 ===
        {
            let document = self.document.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_minify_pressed(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    if let Err(e) = document.borrow_mut().minify() {
                        tracing::warn!("压缩失败: {}", e);
                    }
                    Self::sync_document_view(&app_window, &document);
                }
            });
        }

        // === 粘贴回调 ===
        {
            let document = self.document.clone();
            let clipboard = self.clipboard.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_paste_pressed(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    let result = document
                        .borrow_mut()
                        .paste_from_clipboard(&mut *clipboard.borrow_mut());
                    if let Err(e) = result {
                        tracing::error!("粘贴失败: {}", e);
                    }
                    Self::sync_document_view(&app_window, &document);
                }
            });
        }

        // === 清空回调 ===
        {
            let document = self.document.clone();
            let tree = self.tree.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_clear_pressed(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    document.borrow_mut().clear();
                    tree.borrow_mut().set_document(None);
                    app_window.set_url_text("".into());
                    Self::sync_document_view(&app_window, &document);
                    Self::rebuild_tree_model(&app_window, &tree);
                }
            });
        }

        // === 节点展开/折叠回调 ===
        {
            let tree = self.tree.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_toggle_expanded(move |node_path| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    tree.borrow_mut().toggle_expanded(&node_path);
                    Self::rebuild_tree_model(&app_window, &tree);
                }
            });
        }

        // === 长值全文开关回调 ===
        {
            let tree = self.tree.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_toggle_full_text(move |node_path| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    tree.borrow_mut().toggle_full_text(&node_path);
                    Self::rebuild_tree_model(&app_window, &tree);
                }
            });
        }

        // === 标量值点击回调（复制或展开嵌套JSON） ===
        {
            let tree = self.tree.clone();
            let clipboard = self.clipboard.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_value_clicked(move |node_path| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_value_clicked(&app_window, &tree, &clipboard, &node_path);
                }
            });
        }

        // === 整棵子树复制回调 ===
        {
            let tree = self.tree.clone();
            let clipboard = self.clipboard.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_copy_subtree(move |node_path| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    let pretty = tree.borrow().subtree_pretty(&node_path);
                    if let Some(text) = pretty {
                        Self::copy_with_indicator(&app_window, &tree, &clipboard, &node_path, &text);
                    }
                }
            });
        }
    }

    /// 初始化UI状态
    fn initialize_ui(&self, app_window: &AppWindow) {
        app_window.set_active_tab(TAB_EDITOR);
        app_window.set_error_message("".into());
        app_window.set_is_loading(false);

        // 设置空的树模型
        let empty_model = ModelRc::new(VecModel::<TreeRowData>::default());
        app_window.set_tree_model(empty_model);
    }

    /// 文档状态回填UI：正文与错误横幅
    fn sync_document_view(app_window: &AppWindow, document: &Rc<RefCell<Document>>) {
        let doc = document.borrow();
        app_window.set_raw_text(doc.raw_text().into());
        app_window.set_error_message(doc.error().unwrap_or("").into());
    }

    /// 树跟随文档整棵重挂载
    fn remount_tree(
        app_window: &AppWindow,
        document: &Rc<RefCell<Document>>,
        tree: &Rc<RefCell<TreeArena>>,
    ) {
        let parsed = document.borrow().parsed().cloned();
        tree.borrow_mut().set_document(parsed);
        Self::rebuild_tree_model(app_window, tree);
    }

    fn rebuild_tree_model(app_window: &AppWindow, tree: &Rc<RefCell<TreeArena>>) {
        let rows: Vec<TreeRowData> = tree.borrow().rows().iter().map(TreeRowData::from).collect();
        app_window.set_tree_model(ModelRc::new(VecModel::from(rows)));
    }

    /// 处理页签切换：进入查看器触发解析并重挂树
    fn handle_tab_changed(
        app_window: &AppWindow,
        document: &Rc<RefCell<Document>>,
        tree: &Rc<RefCell<TreeArena>>,
        tab: i32,
    ) {
        let mode = if tab == TAB_VIEWER {
            ViewMode::Viewer
        } else {
            ViewMode::Editor
        };
        if let Err(e) = document.borrow_mut().switch_tab(mode) {
            tracing::warn!("进入查看器时解析失败: {}", e);
        }
        app_window.set_active_tab(tab);
        if mode == ViewMode::Viewer {
            Self::remount_tree(app_window, document, tree);
        }
        Self::sync_document_view(app_window, document);
    }

    /// 处理从URL加载：加载中再次触发直接忽略
    fn handle_load_from_url(
        app_window: &AppWindow,
        document: &Rc<RefCell<Document>>,
        tree: &Rc<RefCell<TreeArena>>,
        fetcher: &Rc<HttpRelayFetcher>,
    ) {
        if document.borrow().is_loading() {
            return;
        }
        app_window.set_is_loading(true);

        let app_window_weak = app_window.as_weak();
        let document = document.clone();
        let tree = tree.clone();
        let fetcher = fetcher.clone();
        slint::spawn_local(async move {
            let result = document.borrow_mut().load_from_url(fetcher.as_ref());

            let Some(app_window) = app_window_weak.upgrade() else {
                return;
            };
            app_window.set_is_loading(false);
            if let Err(e) = result {
                tracing::error!("URL加载失败: {}", e);
            }
            Self::sync_document_view(&app_window, &document);
            if document.borrow().view_mode() == ViewMode::Viewer {
                Self::remount_tree(&app_window, &document, &tree);
            }
        })
        .unwrap();
    }

    /// 处理标量值点击：JSON字符串展开为嵌套树，其余复制到剪贴板
    fn handle_value_clicked(
        app_window: &AppWindow,
        tree: &Rc<RefCell<TreeArena>>,
        clipboard: &Rc<RefCell<SystemClipboard>>,
        node_path: &str,
    ) {
        let outcome = tree.borrow().decide_click(node_path);
        match outcome {
            Some(ClickOutcome::ExpandNested(nested)) => {
                tree.borrow_mut().expand_nested(node_path, nested);
                Self::rebuild_tree_model(app_window, tree);
            }
            Some(ClickOutcome::CopyText(text)) => {
                Self::copy_with_indicator(app_window, tree, clipboard, node_path, &text);
            }
            None => {}
        }
    }

    /// 复制到剪贴板并点亮“已复制”指示，1秒后自动复位
    fn copy_with_indicator(
        app_window: &AppWindow,
        tree: &Rc<RefCell<TreeArena>>,
        clipboard: &Rc<RefCell<SystemClipboard>>,
        node_path: &str,
        text: &str,
    ) {
        match clipboard.borrow_mut().set_text(text) {
            Ok(()) => {
                tree.borrow_mut().mark_copied(node_path);
                Self::rebuild_tree_model(app_window, tree);
                tracing::info!("内容已复制到剪贴板，长度: {} 字符", text.len());

                let app_window_weak = app_window.as_weak();
                let tree = tree.clone();
                let node_path = node_path.to_string();
                Timer::single_shot(COPIED_RESET, move || {
                    tree.borrow_mut().clear_copied(&node_path);
                    if let Some(app_window) = app_window_weak.upgrade() {
                        Self::rebuild_tree_model(&app_window, &tree);
                    }
                });
            }
            Err(e) => {
                app_window.set_error_message(format!("剪贴板操作失败: {}", e).into());
                tracing::error!("复制失败: {}", e);
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    // 初始化日志输出
    let _ = SubscriberBuilder::default()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let app = AppWindow::new().context("UI 初始化失败")?;
    let document = Rc::new(RefCell::new(Document::default()));

    // 创建VM桥接器并绑定UI回调
    let bridge = ViewModelBridge::new(&app, document);
    bridge.initialize_ui(&app);

    tracing::info!("应用启动成功，UI已初始化");
    app.run().context("事件循环异常退出")?;
    Ok(())
}
