//! Minimal document tree used as the mount target for the alert dialog.
//!
//! Elements live in a `slab` arena and are addressed by [`NodeId`]. Removing a
//! node frees its whole subtree together with the click listeners registered
//! on it, so an id must not be used after its node was removed.

use slab::Slab;
use std::fmt::Write as _;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Click listener. Receives the document so handlers can mutate the tree
/// (typically removing the subtree they belong to).
pub type Listener = Rc<dyn Fn(&mut Document, &mut Event)>;

#[derive(Debug, Clone, Copy)]
pub struct Event {
    target: NodeId,
    current: NodeId,
    stopped: bool,
}

impl Event {
    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn current_target(&self) -> NodeId {
        self.current
    }

    /// Prevent ancestors of the current node from seeing this event.
    pub fn stop_propagation(&mut self) {
        self.stopped = true;
    }

    pub fn propagation_stopped(&self) -> bool {
        self.stopped
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
enum Content {
    #[default]
    Empty,
    Text(String),
    Html(String),
}

#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    content: Content,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Text or raw markup assigned to this element, if any.
    pub fn content(&self) -> Option<&str> {
        match &self.content {
            Content::Empty => None,
            Content::Text(s) | Content::Html(s) => Some(s),
        }
    }
}

struct Node {
    element: Element,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<Listener>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            element: Element::new(tag),
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

pub struct Document {
    nodes: Slab<Node>,
    root: NodeId,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

impl Document {
    /// Create an empty `html > body` document.
    pub fn new() -> Self {
        let mut nodes = Slab::new();
        let root = NodeId(nodes.insert(Node::new("html")));
        let body = NodeId(nodes.insert(Node::new("body")));
        nodes[body.0].parent = Some(root);
        nodes[root.0].children.push(body);
        Self { nodes, root, body }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Number of live nodes, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        NodeId(self.nodes.insert(Node::new(tag)))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id.0)
    }

    /// Whether `id` is reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.nodes.get(node.0).and_then(|n| n.parent);
        }
        false
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(id.0).map(|n| &n.element)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first. Ignored when `child` is `parent` or one of its
    /// ancestors.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(parent)
            || !self.contains(child)
            || self.is_inclusive_ancestor(child, parent)
        {
            return;
        }
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Add one or more whitespace separated classes.
    pub fn add_class(&mut self, id: NodeId, classes: &str) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            for class in classes.split_whitespace() {
                if !node.element.has_class(class) {
                    node.element.classes.push(class.to_string());
                }
            }
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            match node.element.attrs.iter_mut().find(|(n, _)| n == name) {
                Some((_, v)) => *v = value.to_string(),
                None => node
                    .element
                    .attrs
                    .push((name.to_string(), value.to_string())),
            }
        }
    }

    /// Set plain text content. Escaped when serialised.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.element.content = Content::Text(text.to_string());
        }
    }

    /// Set raw markup content. Written verbatim when serialised.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.element.content = Content::Html(html.to_string());
        }
    }

    pub fn on_click(&mut self, id: NodeId, listener: impl Fn(&mut Document, &mut Event) + 'static) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.listeners.push(Rc::new(listener));
        }
    }

    /// Detach `id` from the tree and free it with all descendants. The root
    /// cannot be removed.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root || !self.contains(id) {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.try_remove(next.0) {
                stack.extend(node.children);
            }
        }
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            if let Some(p) = self.nodes.get_mut(parent.0) {
                p.children.retain(|c| *c != id);
            }
        }
    }

    /// Pre-order walk starting at (and including) `start`.
    fn preorder(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id.0) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// First connected element carrying `class`, in document order.
    pub fn query_class(&self, class: &str) -> Option<NodeId> {
        self.query_class_all(class).into_iter().next()
    }

    pub fn query_class_all(&self, class: &str) -> Vec<NodeId> {
        self.preorder(self.root)
            .into_iter()
            .filter(|id| self.nodes[id.0].element.has_class(class))
            .collect()
    }

    /// Descendants of `scope` (excluding `scope`) carrying `class`.
    pub fn query_class_within(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        self.preorder(scope)
            .into_iter()
            .skip(1)
            .find(|id| self.nodes[id.0].element.has_class(class))
    }

    /// Dispatch a click at `target`, bubbling through its ancestors until a
    /// listener stops propagation. The path is fixed before dispatch; nodes
    /// removed by an earlier listener are skipped.
    pub fn click(&mut self, target: NodeId) {
        if !self.contains(target) {
            return;
        }
        let mut path = vec![target];
        let mut current = target;
        while let Some(parent) = self.parent(current) {
            path.push(parent);
            current = parent;
        }

        let mut event = Event {
            target,
            current: target,
            stopped: false,
        };
        for node in path {
            let listeners = match self.nodes.get(node.0) {
                Some(n) => n.listeners.clone(),
                None => continue,
            };
            event.current = node;
            for listener in listeners {
                listener(self, &mut event);
            }
            if event.stopped {
                break;
            }
        }
    }

    /// Serialise `id` and its subtree.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };
        let el = &node.element;
        let _ = write!(out, "<{}", el.tag);
        if !el.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape(&el.classes.join(" ")));
        }
        for (name, value) in &el.attrs {
            let _ = write!(out, " {}=\"{}\"", name, escape(value));
        }
        out.push('>');
        match &el.content {
            Content::Empty => {}
            Content::Text(text) => out.push_str(&escape(text)),
            Content::Html(html) => out.push_str(html),
        }
        for child in &node.children {
            self.write_html(*child, out);
        }
        let _ = write!(out, "</{}>", el.tag);
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
