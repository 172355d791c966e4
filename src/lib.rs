//! RustyDom - Mutable tag-markup trees
//!
//! Pipeline:
//! - Lexer: bytes to delimiter/identifier tokens (core)
//! - Parser: tokens to an arena tree, lenient or strict (parser)
//! - Tree: ID-recycling arena with cycle-checked moves (dom)
//! - Serializer: tree back to pretty or minified markup (serializer)
//!
//! ```
//! use rustydom::{parse, serialize, SerializeOptions, ROOT};
//!
//! let mut tree = parse("<a><b k=\"v\">hi</b></a>").unwrap();
//! let c = tree.add_node(ROOT, "c").unwrap();
//! assert!(tree.move_subtree(1, c));
//! assert_eq!(
//!     serialize(&tree, &SerializeOptions::minified()),
//!     "<a><c><b k=\"v\">hi</b></c></a>"
//! );
//! ```

pub mod core;
pub mod dom;
pub mod error;
pub mod parser;
pub mod serializer;

#[cfg(feature = "nif")]
mod nif;
#[cfg(feature = "nif")]
mod resource;
#[cfg(feature = "nif")]
mod term;

pub use dom::{Attributes, Node, NodeId, NodeKind, Tree, ROOT};
pub use error::{status_of, ParseError, TreeError, STATUS_MALFORMED, STATUS_OK, STATUS_UNREADABLE};
pub use parser::{load_document, load_document_with, parse, parse_strict, ParseOptions, Parser};
pub use serializer::{serialize, serialize_node, SerializeOptions};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;
