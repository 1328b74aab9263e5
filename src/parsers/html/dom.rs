use std::rc::Rc;

use encoding_rs::Encoding;
use html5ever::interface::{Attribute, QualName};
use html5ever::parse_document;
use html5ever::tendril::{format_tendril, TendrilSink};
use html5ever::tree_builder::{create_element, NodeOrText, TreeSink};
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// 将 HTML 字节转换为 DOM
pub fn html_to_dom(data: &[u8], document_encoding: &str) -> std::io::Result<RcDom> {
    let s: String = match Encoding::for_label(document_encoding.as_bytes()) {
        Some(encoding) => {
            let (string, _, _) = encoding.decode(data);
            string.into_owned()
        }
        None => String::from_utf8_lossy(data).into_owned(),
    };

    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut s.as_bytes())
}

/// 查找指定路径的DOM节点
pub fn find_nodes(node: &Handle, node_names: &[&str]) -> Vec<Handle> {
    let mut found_nodes = Vec::new();
    let Some((node_name, rest)) = node_names.split_first() else {
        return found_nodes;
    };

    let matches = get_node_name(node).is_some_and(|name| name == *node_name);

    if matches && rest.is_empty() {
        found_nodes.push(node.clone());
    }

    let next_names = if matches && !rest.is_empty() {
        rest
    } else {
        node_names
    };

    for child_node in node.children.borrow().iter() {
        found_nodes.append(&mut find_nodes(child_node, next_names));
    }

    found_nodes
}

/// 深度优先遍历所有元素节点（文档顺序）
pub fn for_each_element<F>(node: &Handle, visit: &mut F)
where
    F: FnMut(&Handle),
{
    if let NodeData::Element { .. } = node.data {
        visit(node);
    }
    for child in node.children.borrow().iter() {
        for_each_element(child, visit);
    }
}

/// 根据 id 查找元素
pub fn find_element_by_id(root: &Handle, id: &str) -> Option<Handle> {
    let mut found = None;
    for_each_element(root, &mut |node| {
        if found.is_none() && get_node_attr(node, "id").as_deref() == Some(id) {
            found = Some(node.clone());
        }
    });
    found
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 判断元素的 class 列表是否包含指定类名
pub fn has_class(node: &Handle, class_name: &str) -> bool {
    get_node_attr(node, "class")
        .map(|classes| classes.split_ascii_whitespace().any(|c| c == class_name))
        .unwrap_or(false)
}

/// 获取父节点
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    // Cell 只能 take 出来再放回去
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(|node| node.upgrade());
    child.parent.set(weak);
    parent
}

/// 获取紧随其后的兄弟节点
pub fn get_next_sibling(node: &Handle) -> Option<Handle> {
    let parent = get_parent_node(node)?;
    let children = parent.children.borrow();
    let index = children.iter().position(|child| Rc::ptr_eq(child, node))?;
    children.get(index + 1).cloned()
}

/// 设置节点属性，`None` 表示删除该属性
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();
        let mut i = 0;
        let mut found_existing_attr: bool = false;

        while i < attrs_mut.len() {
            if &attrs_mut[i].name.local == attr_name {
                found_existing_attr = true;

                if let Some(attr_value) = attr_value.as_deref() {
                    attrs_mut[i].value.clear();
                    attrs_mut[i].value.push_slice(attr_value);
                } else {
                    // Remove attr completely if attr_value is not defined
                    attrs_mut.remove(i);
                    continue;
                }
            }

            i += 1;
        }

        if !found_existing_attr {
            if let Some(attr_value) = attr_value {
                attrs_mut.push(Attribute {
                    name: QualName::new(None, ns!(), LocalName::from(attr_name)),
                    value: format_tendril!("{}", attr_value),
                });
            }
        }
    };
}

/// 创建带有文本内容的元素（尚未挂载到文档树）
pub fn create_text_element(
    dom: &RcDom,
    name: QualName,
    attrs: Vec<(&str, &str)>,
    text: &str,
) -> Handle {
    let attrs = attrs
        .into_iter()
        .map(|(attr_name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(attr_name)),
            value: format_tendril!("{}", value),
        })
        .collect();
    let element = create_element(dom, name, attrs);
    if !text.is_empty() {
        dom.append(&element, NodeOrText::AppendText(format_tendril!("{}", text)));
    }
    element
}

/// 构造 HTML 命名空间下的元素名
pub fn html_name(local: &str) -> QualName {
    QualName::new(None, ns!(html), LocalName::from(local))
}

/// 将新节点插入到目标节点之后
///
/// 目标节点没有父节点时返回 `false`，不做任何修改。
pub fn insert_after(dom: &RcDom, target: &Handle, new_node: Handle) -> bool {
    match get_next_sibling(target) {
        Some(next) => {
            dom.append_before_sibling(&next, NodeOrText::AppendNode(new_node));
            true
        }
        None => match get_parent_node(target) {
            Some(parent) => {
                dom.append(&parent, NodeOrText::AppendNode(new_node));
                true
            }
            None => false,
        },
    }
}

/// 将节点追加为父节点的最后一个子节点
pub fn append_child(dom: &RcDom, parent: &Handle, child: Handle) {
    dom.append(parent, NodeOrText::AppendNode(child));
}

/// 将节点从文档树中移除
pub fn detach(dom: &RcDom, node: &Handle) {
    dom.remove_from_parent(node);
}
