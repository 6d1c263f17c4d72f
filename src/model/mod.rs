pub mod document;
pub mod tree_view;
