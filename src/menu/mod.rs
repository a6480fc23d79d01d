//! Static menu tree and its renderer.
//!
//! The tree is data, the renderer is a pure function over it, and the
//! dispatcher resolves node kinds with an exhaustive match. Adding a menu
//! entry means touching the tree plus one handler arm, nothing else.

mod render;
mod tree;

pub use render::{RenderedScreen, render};
pub use tree::{Access, Entry, MenuAction, MenuTree, NodeKind};
