//! Elixir Term Conversion Utilities
//!
//! Converts tree nodes and load errors to Elixir terms.

use crate::dom::{NodeId, NodeKind, Tree};
use crate::error::ParseError;
use rustler::{Encoder, Env, NewBinary, Term};

pub mod atoms {
    rustler::atoms! {
        ok,
        error,
        tag,
        text,
    }
}

/// Convert a node to an Elixir term.
///
/// Tags become `{:tag, name, [{key, value}], [child_id], parent}` and text
/// nodes `{:text, content, parent}`; `parent` is nil for the root. Missing
/// nodes become nil.
pub fn node_to_term<'a>(env: Env<'a>, tree: &Tree, id: NodeId) -> Term<'a> {
    let Some(node) = tree.get_node(id) else {
        return rustler::types::atom::nil().encode(env);
    };

    match node.kind() {
        NodeKind::Tag => {
            let name = str_to_binary(env, node.name().unwrap_or_default());

            // Build in reverse so prepending keeps insertion order
            let mut attrs = Term::list_new_empty(env);
            for (key, value) in node.attributes().iter().rev() {
                let pair = (str_to_binary(env, key), str_to_binary(env, value));
                attrs = attrs.list_prepend(pair.encode(env));
            }

            (atoms::tag(), name, attrs, node.children().to_vec(), node.parent()).encode(env)
        }
        NodeKind::Text => {
            let content = str_to_binary(env, node.text().unwrap_or_default());
            (atoms::text(), content, node.parent()).encode(env)
        }
    }
}

/// `{:error, status, message}` for a failed load
pub fn parse_error_to_term<'a>(env: Env<'a>, err: &ParseError) -> Term<'a> {
    (atoms::error(), err.status(), err.to_string()).encode(env)
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
pub fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}
