/// High‑level semantic role of a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Text,
    Button,
    Switch,
    Image,
    Container,
}

/// Semantics attached to a `View`. Hosts use the label to find nodes.
#[derive(Clone, Debug)]
pub struct Semantics {
    pub role: Role,
    /// Human‑readable name; for icon-only buttons this is the content
    /// description.
    pub label: Option<String>,
    pub enabled: bool,
}

impl Semantics {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            label: None,
            enabled: true,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
