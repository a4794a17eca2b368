#![forbid(unsafe_code)]

//! Node output.
//!
//! A [`View`] is the structural description a node produces. While stored in
//! the runtime, child output is referenced through [`View::Slot`];
//! [`Runtime::output`](super::Runtime::output) resolves every slot into a
//! slot-free tree.

use std::fmt;

use super::node::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum View {
    #[default]
    Empty,
    /// Terminal marker at the bottom of a chain.
    Leaf { label: String },
    /// One nesting level wrapping its child's output.
    Nest {
        level: u32,
        label: String,
        depth: u32,
        child: Box<View>,
    },
    Text { text: String },
    Group { items: Vec<View> },
    /// Output of a child node, resolved on materialization.
    Slot { node: NodeId },
}

/// One entry of the output sequence handed to consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Marker {
    Level { level: u32, label: String, depth: u32 },
    Leaf { label: String },
}

impl View {
    #[must_use]
    pub fn leaf(label: impl Into<String>) -> Self {
        Self::Leaf {
            label: label.into(),
        }
    }

    #[must_use]
    pub fn nest(level: u32, label: impl Into<String>, depth: u32, child: View) -> Self {
        Self::Nest {
            level,
            label: label.into(),
            depth,
            child: Box::new(child),
        }
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    #[must_use]
    pub fn group(items: impl IntoIterator<Item = View>) -> Self {
        Self::Group {
            items: items.into_iter().collect(),
        }
    }

    #[must_use]
    pub const fn slot(node: NodeId) -> Self {
        Self::Slot { node }
    }

    /// Marker sequence of the first chain found in document order, or an
    /// empty vector if the view holds no chain.
    #[must_use]
    pub fn markers(&self) -> Vec<Marker> {
        self.chains().into_iter().next().unwrap_or_default()
    }

    /// Marker sequences of every chain in document order.
    ///
    /// Each sequence lists nesting levels from the innermost to the
    /// outermost and ends with the leaf marker.
    #[must_use]
    pub fn chains(&self) -> Vec<Vec<Marker>> {
        let mut out = Vec::new();
        self.collect_chains(&mut out);
        out
    }

    fn collect_chains(&self, out: &mut Vec<Vec<Marker>>) {
        match self {
            Self::Leaf { label } => out.push(vec![Marker::Leaf {
                label: label.clone(),
            }]),
            Self::Nest { .. } => {
                let mut levels = Vec::new();
                let mut cursor = self;
                while let Self::Nest {
                    level,
                    label,
                    depth,
                    child,
                } = cursor
                {
                    levels.push(Marker::Level {
                        level: *level,
                        label: label.clone(),
                        depth: *depth,
                    });
                    cursor = &**child;
                }
                levels.reverse();
                if let Self::Leaf { label } = cursor {
                    levels.push(Marker::Leaf {
                        label: label.clone(),
                    });
                    out.push(levels);
                } else {
                    out.push(levels);
                    cursor.collect_chains(out);
                }
            }
            Self::Group { items } => {
                for item in items {
                    item.collect_chains(out);
                }
            }
            Self::Empty | Self::Text { .. } | Self::Slot { .. } => {}
        }
    }

    /// Whether any unresolved slot remains.
    #[must_use]
    pub fn has_slots(&self) -> bool {
        match self {
            Self::Slot { .. } => true,
            Self::Nest { child, .. } => child.has_slots(),
            Self::Group { items } => items.iter().any(Self::has_slots),
            Self::Empty | Self::Leaf { .. } | Self::Text { .. } => false,
        }
    }

    /// Text items in document order.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_texts(&mut out);
        out
    }

    fn collect_texts<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Text { text } => out.push(text),
            Self::Nest { child, .. } => child.collect_texts(out),
            Self::Group { items } => items.iter().for_each(|item| item.collect_texts(out)),
            Self::Empty | Self::Leaf { .. } | Self::Slot { .. } => {}
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "  ".repeat(indent);
        match self {
            Self::Empty => Ok(()),
            Self::Leaf { label } => writeln!(f, "{pad}{label}"),
            Self::Nest { level, child, .. } => {
                writeln!(f, "{pad}level: {level}")?;
                child.write_indented(f, indent + 1)
            }
            Self::Text { text } => writeln!(f, "{pad}{text}"),
            Self::Group { items } => items
                .iter()
                .try_for_each(|item| item.write_indented(f, indent)),
            Self::Slot { node } => writeln!(f, "{pad}<{node}>"),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

impl Marker {
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    #[must_use]
    pub fn level(&self) -> Option<u32> {
        match self {
            Self::Level { level, .. } => Some(*level),
            Self::Leaf { .. } => None,
        }
    }
}
