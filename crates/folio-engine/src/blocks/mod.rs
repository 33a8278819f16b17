//! Runtime block nodes and the registry that builds them.

pub mod block;
pub mod kinds;
pub mod registry;

pub use block::{Block, BlockBehavior, FieldSpec, FieldType, MarkdownContext};
pub use registry::BlockRegistry;
