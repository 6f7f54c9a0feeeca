//! Flattens sanitized body HTML into a sequence of styled runs.
//!
//! The fragment is parsed into a small owned tree ([`FragmentNode`]) and
//! then walked top-level node by top-level node. Only direct children of a
//! block carry style; anything nested deeper contributes its text only.

use scraper::{ElementRef, Html, Node};
use tracing::warn;

/// A node of a parsed HTML fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentNode {
    Element { tag: String, attrs: Vec<(String, String)>, children: Vec<FragmentNode> },
    Text(String),
}

impl FragmentNode {
    /// Concatenated text of this node and everything below it.
    pub fn text_content(&self) -> String {
        match self {
            FragmentNode::Text(text) => text.clone(),
            FragmentNode::Element { children, .. } => children.iter().map(FragmentNode::text_content).collect(),
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            FragmentNode::Element { tag, .. } => Some(tag),
            FragmentNode::Text(_) => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            FragmentNode::Element { attrs, .. } => {
                attrs.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
            }
            FragmentNode::Text(_) => None,
        }
    }

    fn children(&self) -> &[FragmentNode] {
        match self {
            FragmentNode::Element { children, .. } => children,
            FragmentNode::Text(_) => &[],
        }
    }

    /// Every descendant element with the given tag, in document order.
    fn descendants_by_tag<'a>(&'a self, tag: &str, out: &mut Vec<&'a FragmentNode>) {
        for child in self.children() {
            if child.tag() == Some(tag) {
                out.push(child);
            }
            child.descendants_by_tag(tag, out);
        }
    }
}

/// Parses an HTML fragment into its top-level nodes.
pub fn parse_fragment(html: &str) -> Vec<FragmentNode> {
    let fragment = Html::parse_fragment(html);
    convert_children(fragment.root_element())
}

fn convert_children(element: ElementRef<'_>) -> Vec<FragmentNode> {
    element
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(text) => Some(FragmentNode::Text(String::from(&**text))),
            Node::Element(_) => ElementRef::wrap(child).map(convert_element),
            _ => None,
        })
        .collect()
}

fn convert_element(element: ElementRef<'_>) -> FragmentNode {
    let value = element.value();
    FragmentNode::Element {
        tag: value.name().to_ascii_lowercase(),
        attrs: value.attrs().map(|(name, value)| (name.to_string(), value.to_string())).collect(),
        children: convert_children(element),
    }
}

/// A span of text sharing one style.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    /// Link target; rendered blue, underlined and clickable.
    pub link: Option<String>,
    /// Last run of its block: the line ends after it.
    pub is_block_terminal: bool,
}

impl StyledRun {
    fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Default::default() }
    }

    fn styled_by(node: &FragmentNode, text: String) -> Self {
        let tag = node.tag().unwrap_or_default();
        Self {
            text,
            bold: matches!(tag, "b" | "strong"),
            italic: matches!(tag, "i" | "em"),
            link: node.attr("href").filter(|href| !href.trim().is_empty()).map(str::to_string),
            is_block_terminal: false,
        }
    }
}

/// One unit of body flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowItem {
    Text(StyledRun),
    /// Horizontal rule.
    Rule,
    List { ordered: bool, items: Vec<String> },
    /// Block quotation, already trimmed.
    Quote(String),
}

const TEXT_BLOCKS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6", "div"];
const INLINE_TAGS: &[&str] = &["a", "b", "strong", "i", "em", "span"];

/// Flattens sanitized body HTML into flow items.
///
/// Nodes that cannot be interpreted are skipped with a warning; flattening
/// itself never fails.
pub fn flatten(html: &str) -> Vec<FlowItem> {
    let mut items = Vec::new();

    for node in parse_fragment(html) {
        let tag = match &node {
            FragmentNode::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    items.push(FlowItem::Text(StyledRun { is_block_terminal: true, ..StyledRun::plain(text) }));
                }
                continue;
            }
            FragmentNode::Element { tag, .. } => tag.as_str(),
        };

        match tag {
            "hr" => items.push(FlowItem::Rule),
            "ul" | "ol" => {
                let mut entries = Vec::new();
                node.descendants_by_tag("li", &mut entries);
                let entries: Vec<String> = entries
                    .iter()
                    .map(|li| li.text_content().trim().to_string())
                    .filter(|text| !text.is_empty())
                    .collect();
                if !entries.is_empty() {
                    items.push(FlowItem::List { ordered: tag == "ol", items: entries });
                }
            }
            "blockquote" => {
                let text = node.text_content().trim().to_string();
                if !text.is_empty() {
                    items.push(FlowItem::Quote(text));
                }
            }
            _ if TEXT_BLOCKS.contains(&tag) => items.extend(block_runs(&node).into_iter().map(FlowItem::Text)),
            _ if INLINE_TAGS.contains(&tag) => {
                let text = node.text_content().trim().to_string();
                if !text.is_empty() {
                    items.push(FlowItem::Text(StyledRun { is_block_terminal: true, ..StyledRun::styled_by(&node, text) }));
                }
            }
            other => warn!(tag = other, "skipping unsupported body element"),
        }
    }

    items
}

/// Runs for a paragraph-like block, one per direct child.
fn block_runs(block: &FragmentNode) -> Vec<StyledRun> {
    if block.text_content().trim().is_empty() {
        return Vec::new();
    }

    let mut runs: Vec<StyledRun> = block
        .children()
        .iter()
        .filter_map(|child| {
            let text = child.text_content();
            if text.is_empty() {
                return None;
            }
            Some(match child {
                FragmentNode::Text(_) => StyledRun::plain(text),
                FragmentNode::Element { .. } => StyledRun::styled_by(child, text),
            })
        })
        .collect();

    if let Some(last) = runs.last_mut() {
        last.is_block_terminal = true;
    }
    runs
}
