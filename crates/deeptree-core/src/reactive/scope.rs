#![forbid(unsafe_code)]

//! Persistent provider stacks.
//!
//! A [`ScopeFrame`] is an immutable linked stack of `(name, channel)` entries.
//! Entering a provider returns a new frame that shares its tail with the
//! outer one, so every node can keep the exact frame it was rendered under
//! and resolve its reads later (when a channel write re-renders it on its
//! own) without walking its ancestors.
//!
//! Lookup is innermost-first: a name pushed later shadows every outer entry
//! of the same name.

use std::fmt;
use std::rc::Rc;

use super::channel::ChannelId;

struct Entry {
    name: &'static str,
    channel: ChannelId,
    parent: Option<Rc<Entry>>,
}

/// Channels visible at one point of the tree.
#[derive(Clone, Default)]
pub struct ScopeFrame {
    top: Option<Rc<Entry>>,
}

impl ScopeFrame {
    /// The empty frame above the root node.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Push `channel` under `name`, shadowing outer channels of that name.
    #[must_use]
    pub fn enter(&self, name: &'static str, channel: ChannelId) -> Self {
        Self {
            top: Some(Rc::new(Entry {
                name,
                channel,
                parent: self.top.clone(),
            })),
        }
    }

    /// Pop the innermost entry if it was pushed under `name`.
    ///
    /// Returns `None` when the frame is empty or the innermost entry has a
    /// different name.
    #[must_use]
    pub fn exit(&self, name: &'static str) -> Option<Self> {
        let top = self.top.as_ref()?;
        (top.name == name).then(|| Self {
            top: top.parent.clone(),
        })
    }

    /// Resolve `name` to the innermost enclosing channel.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<ChannelId> {
        self.entries()
            .find(|(entry, _)| *entry == name)
            .map(|(_, channel)| channel)
    }

    /// Number of entries, shadowed ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }

    /// Entries from innermost to outermost.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, ChannelId)> + '_ {
        std::iter::successors(self.top.as_deref(), |entry| entry.parent.as_deref())
            .map(|entry| (entry.name, entry.channel))
    }
}

impl fmt::Debug for ScopeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries().map(|(name, channel)| format!("{name}={channel}")))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_resolves_nothing() {
        let root = ScopeFrame::root();
        assert!(root.is_empty());
        assert_eq!(root.resolve("loading"), None);
        assert!(root.exit("loading").is_none());
    }

    #[test]
    fn inner_entry_shadows_outer() {
        let outer = ScopeFrame::root().enter("loading", ChannelId::new(1));
        let inner = outer.enter("loading", ChannelId::new(2));
        assert_eq!(outer.resolve("loading"), Some(ChannelId::new(1)));
        assert_eq!(inner.resolve("loading"), Some(ChannelId::new(2)));
        assert_eq!(inner.len(), 2);
    }

    #[test]
    fn other_names_fall_through_to_outer_frames() {
        let frame = ScopeFrame::root()
            .enter("depth", ChannelId::new(1))
            .enter("loading", ChannelId::new(2));
        assert_eq!(frame.resolve("depth"), Some(ChannelId::new(1)));
    }

    #[test]
    fn exit_restores_outer_binding() {
        let outer = ScopeFrame::root().enter("loading", ChannelId::new(1));
        let inner = outer.enter("loading", ChannelId::new(2));
        let popped = inner.exit("loading").expect("innermost is loading");
        assert_eq!(popped.resolve("loading"), Some(ChannelId::new(1)));
    }

    #[test]
    fn exit_with_wrong_name_is_rejected() {
        let frame = ScopeFrame::root().enter("loading", ChannelId::new(1));
        assert!(frame.exit("depth").is_none());
    }

    #[test]
    fn frames_are_persistent() {
        let outer = ScopeFrame::root().enter("loading", ChannelId::new(1));
        let _inner = outer.enter("loading", ChannelId::new(2));
        // Entering never mutates the frame it was derived from.
        assert_eq!(outer.len(), 1);
        assert_eq!(outer.resolve("loading"), Some(ChannelId::new(1)));
    }

    #[test]
    fn debug_lists_innermost_first() {
        let frame = ScopeFrame::root()
            .enter("a", ChannelId::new(1))
            .enter("b", ChannelId::new(2));
        assert_eq!(format!("{frame:?}"), "[\"b=c2\", \"a=c1\"]");
    }
}
