//! HTML解析和处理模块
//!
//! - `dom`: 解析与基础DOM操作（查找、属性、插入、移除）
//! - `serializer`: 序列化功能

pub mod dom;
pub mod serializer;

pub use dom::{
    append_child, create_text_element, detach, find_element_by_id, find_nodes, for_each_element,
    get_next_sibling, get_node_attr, get_node_name, get_parent_node, has_class, html_name,
    html_to_dom, insert_after, set_node_attr,
};
pub use serializer::serialize_document;
