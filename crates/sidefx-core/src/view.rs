use crate::semantics::{Role, Semantics};
use std::rc::Rc;

pub type Callback = Rc<dyn Fn()>;
pub type ToggleCallback = Rc<dyn Fn(bool)>;

/// Node kinds of the headless view tree.
#[derive(Clone)]
pub enum ViewKind {
    Box,
    Row,
    Column,
    Stack,
    Text {
        text: String,
    },
    Button {
        text: String,
        on_click: Option<Callback>,
    },
    Switch {
        checked: bool,
        on_change: Option<ToggleCallback>,
    },
    Icon {
        name: String,
    },
}

impl std::fmt::Debug for ViewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewKind::Box => write!(f, "Box"),
            ViewKind::Row => write!(f, "Row"),
            ViewKind::Column => write!(f, "Column"),
            ViewKind::Stack => write!(f, "Stack"),
            ViewKind::Text { text } => f.debug_struct("Text").field("text", text).finish(),
            ViewKind::Button { text, .. } => f
                .debug_struct("Button")
                .field("text", text)
                .field("on_click", &"<callback>")
                .finish(),
            ViewKind::Switch { checked, .. } => {
                f.debug_struct("Switch").field("checked", checked).finish()
            }
            ViewKind::Icon { name } => f.debug_struct("Icon").field("name", name).finish(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct View {
    pub kind: ViewKind,
    pub children: Vec<View>,
    pub semantics: Option<Semantics>,
}

impl View {
    pub fn new(kind: ViewKind) -> Self {
        View {
            kind,
            children: vec![],
            semantics: None,
        }
    }

    pub fn with_children(mut self, kids: Vec<View>) -> Self {
        self.children = kids;
        self
    }

    pub fn semantics(mut self, s: Semantics) -> Self {
        self.semantics = Some(s);
        self
    }

    pub fn role(&self) -> Option<Role> {
        self.semantics.as_ref().map(|s| s.role)
    }

    /// Semantics label, falling back to the visible text of buttons and
    /// text nodes.
    pub fn label(&self) -> Option<&str> {
        if let Some(label) = self.semantics.as_ref().and_then(|s| s.label.as_deref()) {
            return Some(label);
        }
        match &self.kind {
            ViewKind::Text { text } | ViewKind::Button { text, .. } => Some(text.as_str()),
            _ => None,
        }
    }

    /// Depth-first, pre-order traversal of this node and its descendants.
    pub fn walk(&self) -> Vec<&View> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    pub fn find(&self, pred: impl Fn(&View) -> bool) -> Option<&View> {
        self.walk().into_iter().find(|v| pred(v))
    }

    pub fn find_by_label(&self, label: &str) -> Option<&View> {
        self.find(|v| v.label() == Some(label))
    }

    /// Text of every `Text` node, in tree order.
    pub fn texts(&self) -> Vec<String> {
        self.walk()
            .into_iter()
            .filter_map(|v| match &v.kind {
                ViewKind::Text { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().iter().any(|t| t == needle)
    }
}
