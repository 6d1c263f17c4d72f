//! 树视图（Tree View）：按路径索引的渲染行与节点状态，支撑折叠/展开与嵌套JSON

use std::collections::HashMap;

use jsonpath_rust::JsonPath;
use serde_json::Value;

/// 标量值超过该字符数后在行内截断显示
pub const TRUNCATE_LEN: usize = 100;

/// 嵌套JSON路径标记：叶子路径 + 标记 + 嵌套树内部JSONPath
pub const NESTED_MARK: &str = "::nested::";

/// 嵌套树根节点的显示名
pub const NESTED_ROOT_NAME: &str = "Nested JSON";

/// JSON 节点类型（与 UI 展示解耦）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Array,
    String,
    Number,
    Bool,
    Null,
}

/// 单个渲染行：由 DOM 与节点状态推导，任何状态变化后整体重建
#[derive(Debug, Clone)]
pub struct TreeRow {
    /// 节点在父级中的键名或索引的字符串形式
    pub name: String,
    /// 寻址路径：JSONPath，嵌套树经 NESTED_MARK 延伸
    pub path: String,
    /// 节点类型
    pub kind: NodeKind,
    /// 标量行的显示值（按 show_full_text 截断）；复合行为空
    pub display_value: String,
    /// 复合行的计数摘要：Array[n] / Object{n}
    pub summary: String,
    /// 节点深度（用于UI缩进显示）
    pub depth: u32,
    /// 是否展开（复合行）
    pub expanded: bool,
    /// 标量值是否超长（决定是否提供全文开关）
    pub long_value: bool,
    /// 是否展示全文
    pub show_full_text: bool,
    /// “已复制”瞬时指示
    pub copied: bool,
}

/// 每个节点独立的交互状态，按路径存放
#[derive(Debug, Clone)]
pub struct NodeState {
    pub expanded: bool,
    pub show_full_text: bool,
    pub copied: bool,
    /// 字符串叶子按需解析出的嵌套JSON
    pub nested: Option<Value>,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            expanded: true,
            show_full_text: false,
            copied: false,
            nested: None,
        }
    }
}

/// 点击标量值的判定结果
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// 复制该文本到剪贴板
    CopyText(String),
    /// 字符串本身是JSON对象/数组：展开为嵌套树
    ExpandNested(Value),
}

/// 判定一次值点击：仅当字符串能解析为对象/数组时展开嵌套树，其余一律复制
pub fn decide_value_click(value: &Value) -> ClickOutcome {
    if let Value::String(s) = value {
        if let Ok(parsed) = serde_json::from_str::<Value>(s) {
            if parsed.is_object() || parsed.is_array() {
                return ClickOutcome::ExpandNested(parsed);
            }
        }
        return ClickOutcome::CopyText(s.clone());
    }
    match value {
        Value::Object(_) | Value::Array(_) => ClickOutcome::CopyText(to_pretty(value)),
        scalar => ClickOutcome::CopyText(value_display(scalar)),
    }
}

/// 标量值的原始字符串形式（字符串不带引号）
pub fn value_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        composite => serde_json::to_string(composite).unwrap_or_default(),
    }
}

fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        tracing::error!("JSON序列化失败: {}", e);
        String::new()
    })
}

fn kind_of(v: &Value) -> NodeKind {
    match v {
        Value::Object(_) => NodeKind::Object,
        Value::Array(_) => NodeKind::Array,
        Value::String(_) => NodeKind::String,
        Value::Number(_) => NodeKind::Number,
        Value::Bool(_) => NodeKind::Bool,
        Value::Null => NodeKind::Null,
    }
}

fn summary_of(v: &Value) -> String {
    match v {
        Value::Array(a) => format!("Array[{}]", a.len()),
        Value::Object(m) => format!("Object{{{}}}", m.len()),
        _ => String::new(),
    }
}

fn truncate_display(s: &str) -> String {
    let head: String = s.chars().take(TRUNCATE_LEN).collect();
    format!("{}...", head)
}

/// 渲染树 arena：根 DOM + 按路径索引的节点状态，重建时只产出可见行
#[derive(Debug, Default)]
pub struct TreeArena {
    dom: Option<Value>,
    states: HashMap<String, NodeState>,
    rows: Vec<TreeRow>,
}

impl TreeArena {
    /// 更换文档：所有节点状态作废，整棵重挂载
    pub fn set_document(&mut self, dom: Option<Value>) {
        self.dom = dom;
        self.states.clear();
        self.rebuild();
    }

    pub fn rows(&self) -> &[TreeRow] {
        &self.rows
    }

    /// 切换折叠状态；折叠时丢弃该节点之下所有后代的状态
    pub fn toggle_expanded(&mut self, path: &str) {
        let expanded = {
            let state = self.states.entry(path.to_string()).or_default();
            state.expanded = !state.expanded;
            state.expanded
        };
        if !expanded {
            self.states.retain(|p, _| !is_descendant(path, p));
        }
        self.rebuild();
    }

    /// 切换长值的全文展示；不会重新解析或改动文档
    pub fn toggle_full_text(&mut self, path: &str) {
        let state = self.states.entry(path.to_string()).or_default();
        state.show_full_text = !state.show_full_text;
        self.rebuild();
    }

    pub fn mark_copied(&mut self, path: &str) {
        self.states.entry(path.to_string()).or_default().copied = true;
        self.rebuild();
    }

    pub fn clear_copied(&mut self, path: &str) {
        if let Some(state) = self.states.get_mut(path) {
            state.copied = false;
            self.rebuild();
        }
    }

    /// 把字符串叶子解析出的嵌套JSON挂到该节点之下
    pub fn expand_nested(&mut self, path: &str, nested: Value) {
        self.states.entry(path.to_string()).or_default().nested = Some(nested);
        self.rebuild();
    }

    /// 判定路径处节点被点击后的动作
    pub fn decide_click(&self, path: &str) -> Option<ClickOutcome> {
        self.value_at(path).map(|v| decide_value_click(&v))
    }

    /// 按路径提取节点的 pretty 字符串（整棵子树，与折叠状态无关）
    pub fn subtree_pretty(&self, path: &str) -> Option<String> {
        self.value_at(path).map(|v| to_pretty(&v))
    }

    /// 按路径取值：NESTED_MARK 之前的前缀经节点状态取嵌套树，其余走JSONPath
    pub fn value_at(&self, path: &str) -> Option<Value> {
        if let Some(idx) = path.rfind(NESTED_MARK) {
            let leaf = &path[..idx];
            let inner = &path[idx + NESTED_MARK.len()..];
            let nested = self.states.get(leaf)?.nested.as_ref()?;
            query_one(nested, inner)
        } else {
            query_one(self.dom.as_ref()?, path)
        }
    }

    fn rebuild(&mut self) {
        let mut rows = Vec::with_capacity(self.rows.len().max(64));
        if let Some(dom) = self.dom.as_ref() {
            walk(dom, "root", "$", 0, &mut self.states, &mut rows);
        }
        self.rows = rows;
    }
}

fn query_one(v: &Value, path: &str) -> Option<Value> {
    v.query(path).ok()?.into_iter().next().cloned()
}

/// p 是否位于 parent 之下（子路径只会以 '.'、'[' 或嵌套标记延伸）
fn is_descendant(parent: &str, p: &str) -> bool {
    p.len() > parent.len()
        && p.starts_with(parent)
        && matches!(p.as_bytes()[parent.len()], b'.' | b'[' | b':')
}

fn walk(
    v: &Value,
    name: &str,
    path: &str,
    depth: u32,
    states: &mut HashMap<String, NodeState>,
    rows: &mut Vec<TreeRow>,
) {
    let (expanded, show_full, copied, nested) = {
        let state = states.entry(path.to_string()).or_default();
        (
            state.expanded,
            state.show_full_text,
            state.copied,
            state.nested.clone(),
        )
    };

    match v {
        Value::Object(_) | Value::Array(_) => {
            rows.push(TreeRow {
                name: name.to_string(),
                path: path.to_string(),
                kind: kind_of(v),
                display_value: String::new(),
                summary: summary_of(v),
                depth,
                expanded,
                long_value: false,
                show_full_text: false,
                copied,
            });
            if !expanded {
                return;
            }
            match v {
                Value::Object(map) => {
                    for (k, child) in map {
                        // JSONPath 字段含特殊字符时使用 bracket-notation
                        let field_path = if k.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                            format!("{}.{}", path, k)
                        } else {
                            format!("{}['{}']", path, k.replace('\'', "\\'"))
                        };
                        walk(child, k, &field_path, depth + 1, states, rows);
                    }
                }
                Value::Array(arr) => {
                    for (idx, child) in arr.iter().enumerate() {
                        let item_path = format!("{}[{}]", path, idx);
                        walk(child, &format!("[{}]", idx), &item_path, depth + 1, states, rows);
                    }
                }
                _ => {}
            }
        }
        scalar => {
            let full = value_display(scalar);
            let long_value = full.chars().count() > TRUNCATE_LEN;
            let display_value = if long_value && !show_full {
                truncate_display(&full)
            } else {
                full
            };
            rows.push(TreeRow {
                name: name.to_string(),
                path: path.to_string(),
                kind: kind_of(scalar),
                display_value,
                summary: String::new(),
                depth,
                expanded,
                long_value,
                show_full_text: show_full,
                copied,
            });
            // 字符串叶子解析出的嵌套树紧跟其后，深度+1
            if let Some(nested_val) = nested {
                let nested_path = format!("{}{}$", path, NESTED_MARK);
                walk(&nested_val, NESTED_ROOT_NAME, &nested_path, depth + 1, states, rows);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn arena_with(v: Value) -> TreeArena {
        let mut arena = TreeArena::default();
        arena.set_document(Some(v));
        arena
    }

    #[test]
    fn test_simple_object_rows() {
        let arena = arena_with(json!({"a": 1, "b": [1, 2, 3]}));
        let rows = arena.rows();

        // 默认全部展开：根 + a + b + 3个数组元素
        assert_eq!(rows.len(), 6, "应产出6个可见行");

        assert_eq!(rows[0].name, "root");
        assert_eq!(rows[0].kind, NodeKind::Object);
        assert_eq!(rows[0].summary, "Object{2}", "根节点应显示键数摘要");
        assert!(rows[0].expanded, "复合节点默认展开");

        assert_eq!(rows[1].name, "a");
        assert_eq!(rows[1].kind, NodeKind::Number, "数字值应带数字类型标记");
        assert_eq!(rows[1].display_value, "1");
        assert_eq!(rows[1].depth, 1);

        assert_eq!(rows[2].name, "b");
        assert_eq!(rows[2].summary, "Array[3]", "数组应显示长度摘要");
        assert_eq!(rows[3].path, "$.b[0]");
        assert_eq!(rows[3].name, "[0]");
        assert_eq!(rows[3].depth, 2);
    }

    #[test]
    fn test_key_order_follows_document() {
        let arena = arena_with(
            serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap(),
        );
        let names: Vec<&str> = arena.rows().iter().skip(1).map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"], "对象键应保持文档中的插入顺序");
    }

    #[test]
    fn test_scalar_display_forms() {
        let arena = arena_with(json!({
            "s": "hello",
            "n": 42,
            "f": 1.5,
            "t": true,
            "z": null
        }));
        let by_name = |name: &str| {
            arena
                .rows()
                .iter()
                .find(|r| r.name == name)
                .expect("行应存在")
                .clone()
        };
        assert_eq!(by_name("s").display_value, "hello", "字符串按原文展示，不带引号");
        assert_eq!(by_name("n").display_value, "42");
        assert_eq!(by_name("f").display_value, "1.5");
        assert_eq!(by_name("t").display_value, "true");
        assert_eq!(by_name("z").display_value, "null");
        assert_eq!(by_name("z").kind, NodeKind::Null);
    }

    #[test]
    fn test_collapse_hides_children_and_drops_state() {
        let mut arena = arena_with(json!({"b": ["x", "y"]}));
        assert_eq!(arena.rows().len(), 4);

        // 给子节点设置状态后折叠父节点，子状态应被丢弃
        arena.toggle_full_text("$.b[0]");
        arena.toggle_expanded("$.b");

        let paths: Vec<&str> = arena.rows().iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["$", "$.b"], "折叠后不再产出子行");
        assert!(
            !arena.rows()[1].expanded,
            "父节点应处于折叠状态"
        );

        arena.toggle_expanded("$.b");
        let child = arena
            .rows()
            .iter()
            .find(|r| r.path == "$.b[0]")
            .expect("重新展开后子行应回来");
        assert!(!child.show_full_text, "重新展开后子节点状态应回到默认值");
    }

    #[test]
    fn test_collapse_keeps_sibling_state() {
        let mut arena = arena_with(json!({"a": {"x": 1}, "ab": {"y": 2}}));
        arena.toggle_expanded("$.ab");
        arena.toggle_expanded("$.a");
        // "$.ab" 不是 "$.a" 的后代，折叠 "$.a" 不应影响它
        let ab = arena.rows().iter().find(|r| r.path == "$.ab").unwrap();
        assert!(!ab.expanded, "同名前缀的兄弟节点状态应保留");
    }

    #[test]
    fn test_truncation_boundary() {
        let exactly = "x".repeat(TRUNCATE_LEN);
        let over = "y".repeat(TRUNCATE_LEN + 1);
        let mut arena = arena_with(json!({"short": exactly, "long": over}));

        let short = arena.rows().iter().find(|r| r.name == "short").unwrap().clone();
        assert!(!short.long_value, "恰好100字符不算超长");
        assert_eq!(short.display_value.chars().count(), TRUNCATE_LEN);

        let long = arena.rows().iter().find(|r| r.name == "long").unwrap().clone();
        assert!(long.long_value, "101字符应截断");
        assert!(long.display_value.ends_with("..."), "截断值应以省略号结尾");
        assert_eq!(long.display_value.chars().count(), TRUNCATE_LEN + 3);

        arena.toggle_full_text("$.long");
        let long = arena.rows().iter().find(|r| r.name == "long").unwrap().clone();
        assert!(long.show_full_text);
        assert_eq!(
            long.display_value.chars().count(),
            TRUNCATE_LEN + 1,
            "展开全文后应显示完整值"
        );
    }

    #[test]
    fn test_decide_click_outcomes() {
        // 字符串内容是JSON对象/数组 → 展开嵌套树
        assert!(matches!(
            decide_value_click(&json!("{\"x\":1}")),
            ClickOutcome::ExpandNested(_)
        ));
        assert!(matches!(
            decide_value_click(&json!("[1,2]")),
            ClickOutcome::ExpandNested(_)
        ));

        // 能解析但只是标量（非对象/数组）→ 仍然是复制
        assert_eq!(
            decide_value_click(&json!("5")),
            ClickOutcome::CopyText("5".to_string()),
            "解析为裸标量的字符串不算嵌套JSON"
        );
        assert_eq!(
            decide_value_click(&json!("\"text\"")),
            ClickOutcome::CopyText("\"text\"".to_string())
        );

        // 普通字符串与其它标量 → 复制其字符串形式
        assert_eq!(
            decide_value_click(&json!("hello")),
            ClickOutcome::CopyText("hello".to_string())
        );
        assert_eq!(
            decide_value_click(&json!(42)),
            ClickOutcome::CopyText("42".to_string())
        );
        assert_eq!(
            decide_value_click(&Value::Null),
            ClickOutcome::CopyText("null".to_string())
        );

        // 复合值 → 带缩进的序列化文本
        match decide_value_click(&json!({"a": [1, 2]})) {
            ClickOutcome::CopyText(text) => {
                assert!(text.contains('\n'), "复合值应以缩进形式复制");
                assert_eq!(
                    serde_json::from_str::<Value>(&text).unwrap(),
                    json!({"a": [1, 2]})
                );
            }
            other => panic!("复合值点击应为复制，得到 {:?}", other),
        }
    }

    #[test]
    fn test_expand_nested_renders_rows() {
        let mut arena = arena_with(json!({"cfg": "{\"x\":1}"}));

        let outcome = arena.decide_click("$.cfg").expect("路径应可寻址");
        let nested = match outcome {
            ClickOutcome::ExpandNested(v) => v,
            other => panic!("JSON字符串点击应展开嵌套树，得到 {:?}", other),
        };
        arena.expand_nested("$.cfg", nested);

        let rows = arena.rows();
        let nested_root = rows
            .iter()
            .find(|r| r.name == NESTED_ROOT_NAME)
            .expect("应出现嵌套树根行");
        assert_eq!(nested_root.depth, 2, "嵌套树根在叶子之下一层");
        assert_eq!(nested_root.kind, NodeKind::Object);
        assert_eq!(nested_root.path, "$.cfg::nested::$");

        let x = rows
            .iter()
            .find(|r| r.path == "$.cfg::nested::$.x")
            .expect("嵌套树应包含x字段");
        assert_eq!(x.display_value, "1");
        assert_eq!(x.depth, 3);
    }

    #[test]
    fn test_value_at_nested_path() {
        let mut arena = arena_with(json!({"cfg": "{\"x\":{\"deep\":true}}"}));
        if let Some(ClickOutcome::ExpandNested(v)) = arena.decide_click("$.cfg") {
            arena.expand_nested("$.cfg", v);
        }
        assert_eq!(
            arena.value_at("$.cfg::nested::$.x.deep"),
            Some(json!(true)),
            "应能沿嵌套标记继续寻址"
        );
        assert_eq!(arena.value_at("$.cfg"), Some(json!("{\"x\":{\"deep\":true}}")));
        assert_eq!(arena.value_at("$.missing"), None);
    }

    #[test]
    fn test_copied_flag_set_and_clear() {
        let mut arena = arena_with(json!({"greeting": "hello"}));

        assert_eq!(
            arena.decide_click("$.greeting"),
            Some(ClickOutcome::CopyText("hello".to_string())),
            "普通字符串点击应复制原文"
        );

        arena.mark_copied("$.greeting");
        let row = arena.rows().iter().find(|r| r.name == "greeting").unwrap();
        assert!(row.copied, "复制后应点亮指示");

        arena.clear_copied("$.greeting");
        let row = arena.rows().iter().find(|r| r.name == "greeting").unwrap();
        assert!(!row.copied, "指示应可复位");
    }

    #[test]
    fn test_subtree_pretty_ignores_collapse() {
        let mut arena = arena_with(json!({"b": [1, 2, 3]}));
        arena.toggle_expanded("$.b");

        let pretty = arena.subtree_pretty("$.b").expect("折叠不影响整棵复制");
        assert_eq!(
            serde_json::from_str::<Value>(&pretty).unwrap(),
            json!([1, 2, 3])
        );
        assert!(pretty.contains('\n'), "整棵复制应带缩进");
    }

    #[test]
    fn test_special_characters_in_keys() {
        let arena = arena_with(json!({
            "normal_key": 1,
            "key with spaces": 2,
            "key.with.dots": 3
        }));
        let paths: Vec<&str> = arena.rows().iter().map(|r| r.path.as_str()).collect();
        assert!(paths.contains(&"$.normal_key"));
        assert!(paths.contains(&"$['key with spaces']"));
        assert!(paths.contains(&"$['key.with.dots']"));

        assert_eq!(
            arena.value_at("$['key with spaces']"),
            Some(json!(2)),
            "bracket-notation路径应可寻址"
        );
    }

    #[test]
    fn test_scalar_root_document() {
        let arena = arena_with(json!(42));
        assert_eq!(arena.rows().len(), 1);
        assert_eq!(arena.rows()[0].name, "root");
        assert_eq!(arena.rows()[0].display_value, "42");
    }

    #[test]
    fn test_set_document_remounts() {
        let mut arena = arena_with(json!({"a": {"x": 1}}));
        arena.toggle_expanded("$.a");
        arena.set_document(Some(json!({"a": {"x": 1}})));
        let a = arena.rows().iter().find(|r| r.path == "$.a").unwrap();
        assert!(a.expanded, "换文档后所有节点状态应回到默认值");
    }
}
