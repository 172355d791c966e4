//! Erlang NIF bindings
//!
//! Trees live behind a `ResourceArc` between calls; every NIF locks the
//! tree for the duration of one operation.

use crate::dom::{NodeId, Tree};
use crate::resource::{TreeRef, TreeResource};
use crate::serializer::{self, SerializeOptions};
use crate::term::{atoms, node_to_term, parse_error_to_term, str_to_binary};
use crate::{parser, parser::ParseOptions};
use rustler::{Binary, Encoder, Env, NifResult, ResourceArc, Term};

fn poisoned(reason: &'static str) -> rustler::Error {
    rustler::Error::Term(Box::new(reason))
}

fn load<'a>(env: Env<'a>, input: Binary<'a>, options: ParseOptions) -> Term<'a> {
    match parser::load_document_with(input.as_slice(), options) {
        Ok(tree) => {
            let arc = ResourceArc::new(TreeResource::new(tree));
            (atoms::ok(), arc).encode(env)
        }
        Err(e) => parse_error_to_term(env, &e),
    }
}

/// Create a tree holding only a root tag
#[rustler::nif]
fn new_tree(root_name: &str) -> TreeRef {
    ResourceArc::new(TreeResource::new(Tree::new(root_name)))
}

/// Parse leniently (returns {:ok, tree} or {:error, status, reason})
#[rustler::nif]
fn parse<'a>(env: Env<'a>, input: Binary<'a>) -> Term<'a> {
    load(env, input, ParseOptions::lenient())
}

/// Parse rejecting mismatched and unclosed tags
#[rustler::nif]
fn parse_strict<'a>(env: Env<'a>, input: Binary<'a>) -> Term<'a> {
    load(env, input, ParseOptions::strict())
}

fn added<'a>(env: Env<'a>, result: Result<NodeId, crate::error::TreeError>) -> Term<'a> {
    match result {
        Ok(id) => (atoms::ok(), id).encode(env),
        Err(e) => (atoms::error(), e.to_string()).encode(env),
    }
}

/// Append a tag node (returns {:ok, id} or {:error, reason})
#[rustler::nif]
fn add_tag_node<'a>(env: Env<'a>, tree: TreeRef, parent: NodeId, name: &str) -> NifResult<Term<'a>> {
    let result = tree.with_tree_mut(|t| t.add_node(parent, name)).map_err(poisoned)?;
    Ok(added(env, result))
}

/// Append a text node (returns {:ok, id} or {:error, reason})
#[rustler::nif]
fn add_text_node<'a>(env: Env<'a>, tree: TreeRef, parent: NodeId, text: &str) -> NifResult<Term<'a>> {
    let result = tree.with_tree_mut(|t| t.add_text_node(parent, text)).map_err(poisoned)?;
    Ok(added(env, result))
}

#[rustler::nif]
fn set_attribute<'a>(
    env: Env<'a>,
    tree: TreeRef,
    id: NodeId,
    key: &str,
    value: &str,
) -> NifResult<Term<'a>> {
    let result = tree.with_tree_mut(|t| t.set_attribute(id, key, value)).map_err(poisoned)?;
    Ok(match result {
        Ok(()) => atoms::ok().encode(env),
        Err(e) => (atoms::error(), e.to_string()).encode(env),
    })
}

#[rustler::nif]
fn move_subtree(tree: TreeRef, id: NodeId, new_parent: NodeId) -> NifResult<bool> {
    tree.with_tree_mut(|t| t.move_subtree(id, new_parent)).map_err(poisoned)
}

/// Returns the number of nodes removed
#[rustler::nif]
fn delete_subtree(tree: TreeRef, id: NodeId) -> NifResult<usize> {
    tree.with_tree_mut(|t| t.delete_subtree(id)).map_err(poisoned)
}

#[rustler::nif]
fn get_node<'a>(env: Env<'a>, tree: TreeRef, id: NodeId) -> NifResult<Term<'a>> {
    tree.with_tree(|t| node_to_term(env, t, id)).map_err(poisoned)
}

/// Render the whole tree; `indent` is ignored when minified
#[rustler::nif]
fn serialize<'a>(env: Env<'a>, tree: TreeRef, minified: bool, indent: &str) -> NifResult<Term<'a>> {
    let options = SerializeOptions {
        minified,
        ..SerializeOptions::default().with_indent(indent)
    };
    let markup = tree
        .with_tree(|t| serializer::serialize(t, &options))
        .map_err(poisoned)?;
    Ok(str_to_binary(env, &markup))
}

rustler::init!("Elixir.RustyDom.Native");
