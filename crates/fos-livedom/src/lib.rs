//! fOS Live DOM - Live collections over a mutating node tree
//!
//! A reference-counted node tree with HTMLCollection/NodeList style live
//! views. Each view lazily caches one (item, offset) pair plus its length,
//! and the mutation layer invalidates those caches by category so that an
//! irrelevant change (a `style` attribute, say) never forces a re-walk.
//!
//! # Example
//! ```rust
//! use fos_livedom::Document;
//!
//! let doc = Document::new();
//! let body = doc.create_element("body");
//! doc.append_child(&body).unwrap();
//!
//! let images = doc.images();
//! assert_eq!(images.length(), 0);
//!
//! body.append_child(&doc.create_element("img")).unwrap();
//! assert_eq!(images.length(), 1);
//! ```

mod config;
mod document;
mod error;
mod mutation;
mod node;
mod ordered_map;
mod rare_data;
mod tree;

pub mod collection;
pub mod invalidation;
pub mod observer;
pub mod traversal;

pub use collection::{
    CacheState, CollectionType, InvalidationCategory, LiveCollection, RootType,
};
pub use config::{LiveDomConfig, LiveDomConfigBuilder};
pub use document::Document;
pub use error::{DomError, DomResult};
pub use invalidation::ChildrenChangeKind;
pub use node::{Attribute, Namespace, Node, NodeType, PseudoId};
pub use observer::{MutationObserver, MutationObserverInit, MutationRecord, MutationType};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
