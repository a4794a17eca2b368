use thiserror::Error;

use crate::reactive::{ChannelId, NodeId};

pub type Result<T> = std::result::Result<T, ReactiveError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// A node read a channel name with no enclosing provider.
    #[error("no enclosing provider for channel `{name}` (read by {node})")]
    UnboundChannel { name: &'static str, node: NodeId },

    #[error("channel {channel} no longer exists")]
    ChannelGone { channel: ChannelId },

    #[error("node {node} no longer exists")]
    NodeGone { node: NodeId },

    #[error("channel `{name}` does not hold a value of type {expected}")]
    ValueType {
        name: &'static str,
        expected: &'static str,
    },

    #[error("parameters for {component} have an unexpected type")]
    ParamsType { component: &'static str },

    #[error("no tree is mounted")]
    NotMounted,

    #[error("{category}: {message}")]
    Render { category: String, message: String },
}

impl ReactiveError {
    /// Build a render failure for components that reject their inputs.
    #[must_use]
    pub fn render(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            category: category.into(),
            message: message.into(),
        }
    }
}
