#![forbid(unsafe_code)]

//! Core: scoped broadcast channels, derived nodes, memo boundaries and the
//! chain builder used to observe invalidation across configurable depths.

pub mod error;
pub mod reactive;
pub mod tree;

pub use error::{ReactiveError, Result};
pub use reactive::{
    ChannelHandle, ChannelId, ChannelInfo, ChannelKey, Component, CounterSnapshot,
    DiagnosticEvent, DiagnosticKind, DiagnosticSink, InvocationCounter, Marker, NodeId, NodeInfo,
    RenderCx, Runtime, ScopeFrame, View, WriteReport,
};
pub use tree::{Chain, DeepTree, DeepTreeParams, Link, MAX_DEPTH, NestParams, Nester};
