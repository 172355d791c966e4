//! Tree serializer
//!
//! Renders a [`Tree`] (or any subtree) back to markup, either pretty-printed
//! with one node per line or minified. Traversal is iterative with an explicit
//! stack, so arbitrarily deep trees render without recursion.

use crate::dom::{NodeId, NodeKind, Tree, ROOT};
use std::fmt;
use tracing::debug;

/// Output configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Drop all indentation and newlines
    pub minified: bool,
    /// Indent unit repeated once per nesting level (pretty mode)
    pub indent: String,
    /// Prefix applied to every line before the per-level indent (pretty mode)
    pub initial_indent: String,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        SerializeOptions {
            minified: false,
            indent: "    ".to_string(),
            initial_indent: String::new(),
        }
    }
}

impl SerializeOptions {
    pub fn pretty() -> Self {
        Self::default()
    }

    pub fn minified() -> Self {
        SerializeOptions {
            minified: true,
            ..Self::default()
        }
    }

    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    pub fn with_initial_indent(mut self, initial_indent: impl Into<String>) -> Self {
        self.initial_indent = initial_indent.into();
        self
    }
}

/// Render the whole tree from the root
pub fn serialize(tree: &Tree, options: &SerializeOptions) -> String {
    debug!(nodes = tree.len(), minified = options.minified, "serializing tree");
    serialize_node(tree, ROOT, options).unwrap_or_default()
}

/// Render the subtree rooted at `id`, or None if the node does not exist
pub fn serialize_node(tree: &Tree, id: NodeId, options: &SerializeOptions) -> Option<String> {
    tree.get_node(id)?;

    // Stack entries: either entering a node or writing its closing tag
    enum StackEntry {
        Enter(NodeId, usize),
        Close(NodeId, usize),
    }

    let mut out = Writer {
        buf: String::with_capacity(tree.len() * 16),
        options,
    };
    let mut stack = vec![StackEntry::Enter(id, 0)];

    while let Some(entry) = stack.pop() {
        match entry {
            StackEntry::Close(current, depth) => {
                if let Some(name) = tree.get_node(current).and_then(|n| n.name()) {
                    out.begin_line(depth);
                    out.buf.push_str("</");
                    out.buf.push_str(name);
                    out.buf.push('>');
                    out.end_line();
                }
            }
            StackEntry::Enter(current, depth) => {
                let Some(node) = tree.get_node(current) else {
                    continue;
                };

                out.begin_line(depth);
                match node.kind() {
                    NodeKind::Text => {
                        out.buf.push_str(node.text().unwrap_or_default());
                    }
                    NodeKind::Tag => {
                        out.buf.push('<');
                        out.buf.push_str(node.name().unwrap_or_default());
                        for (name, value) in node.attributes() {
                            out.attribute(name, value);
                        }

                        if node.has_children() {
                            out.buf.push('>');
                            // Closing tag first so it pops after the children
                            stack.push(StackEntry::Close(current, depth));
                            stack.extend(
                                node.children()
                                    .iter()
                                    .rev()
                                    .map(|&child| StackEntry::Enter(child, depth + 1)),
                            );
                        } else {
                            out.buf.push_str(" />");
                        }
                    }
                }
                out.end_line();
            }
        }
    }

    Some(out.buf)
}

struct Writer<'o> {
    buf: String,
    options: &'o SerializeOptions,
}

impl Writer<'_> {
    fn begin_line(&mut self, depth: usize) {
        if self.options.minified {
            return;
        }
        self.buf.push_str(&self.options.initial_indent);
        for _ in 0..depth {
            self.buf.push_str(&self.options.indent);
        }
    }

    fn end_line(&mut self) {
        if !self.options.minified {
            self.buf.push('\n');
        }
    }

    /// Empty values render bare; a value holding `"` but no `'` is single-quoted
    fn attribute(&mut self, name: &str, value: &str) {
        self.buf.push(' ');
        self.buf.push_str(name);
        if value.is_empty() {
            return;
        }
        let quote = if value.contains('"') && !value.contains('\'') {
            '\''
        } else {
            '"'
        };
        self.buf.push('=');
        self.buf.push(quote);
        self.buf.push_str(value);
        self.buf.push(quote);
    }
}

/// Minified markup
impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize(self, &SerializeOptions::minified()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use proptest::prelude::*;
    use rstest::rstest;

    const SAMPLE: &str = "<a><b k=\"v\">hi</b></a>";

    #[test]
    fn test_minified_reproduces_input() {
        let tree = parse(SAMPLE).unwrap();
        assert_eq!(serialize(&tree, &SerializeOptions::minified()), SAMPLE);
        assert_eq!(tree.to_string(), SAMPLE);
    }

    #[test]
    fn test_pretty_one_node_per_line() {
        let tree = parse(SAMPLE).unwrap();
        assert_eq!(
            serialize(&tree, &SerializeOptions::pretty()),
            "<a>\n    <b k=\"v\">\n        hi\n    </b>\n</a>\n"
        );
    }

    #[test]
    fn test_custom_indent() {
        let tree = parse(SAMPLE).unwrap();
        let options = SerializeOptions::pretty().with_indent("\t").with_initial_indent("> ");
        assert_eq!(
            serialize(&tree, &options),
            "> <a>\n> \t<b k=\"v\">\n> \t\thi\n> \t</b>\n> </a>\n"
        );
    }

    #[test]
    fn test_minified_ignores_indent() {
        let tree = parse(SAMPLE).unwrap();
        let options = SerializeOptions::minified().with_indent("--").with_initial_indent("##");
        assert_eq!(serialize(&tree, &options), SAMPLE);
    }

    #[rstest]
    #[case::valueless("<x flag>", "<x flag />")]
    #[case::empty_quoted("<x k=\"\"/>", "<x k />")]
    #[case::no_attributes("<x></x>", "<x />")]
    #[case::bare_value("<x k=v/>", "<x k=\"v\" />")]
    #[case::double_quote_inside("<x k='say \"hi\"'/>", "<x k='say \" hi \"' />")]
    #[case::single_quote_inside("<x k=\"it ' s\"/>", "<x k=\"it ' s\" />")]
    #[case::mixed_children("<r>one<e/>two</r>", "<r>one<e />two</r>")]
    fn test_minified_output(#[case] input: &str, #[case] expected: &str) {
        let tree = parse(input).unwrap();
        assert_eq!(serialize(&tree, &SerializeOptions::minified()), expected);
    }

    #[test]
    fn test_serialize_subtree() {
        let tree = parse(SAMPLE).unwrap();
        assert_eq!(
            serialize_node(&tree, 1, &SerializeOptions::pretty()).unwrap(),
            "<b k=\"v\">\n    hi\n</b>\n"
        );
        assert_eq!(serialize_node(&tree, 2, &SerializeOptions::minified()).unwrap(), "hi");
        assert_eq!(serialize_node(&tree, 9, &SerializeOptions::minified()), None);
    }

    #[test]
    fn test_serialize_after_mutation() {
        let mut tree = parse(SAMPLE).unwrap();
        let c = tree.add_node(ROOT, "c").unwrap();
        tree.set_attribute(c, "n", "1").unwrap();
        assert!(tree.move_subtree(1, c));
        assert_eq!(tree.delete_subtree(2), 1);
        assert_eq!(tree.to_string(), "<a><c n=\"1\"><b k=\"v\" /></c></a>");
    }

    #[test]
    fn test_serialize_is_pure() {
        let tree = parse("<r a=1><x>t u</x><y/></r>").unwrap();
        let snapshot = tree.clone();
        let options = SerializeOptions::pretty();
        let first = serialize(&tree, &options);
        let second = serialize(&tree, &options);
        assert_eq!(first, second);
        assert!(tree.structurally_eq(&snapshot));
        assert_eq!(tree.len(), snapshot.len());
    }

    #[test]
    fn test_deep_tree() {
        let depth = 10_000;
        let input = format!("{}{}", "<d>".repeat(depth), "</d>".repeat(depth));
        let tree = parse(&input).unwrap();
        let output = serialize(&tree, &SerializeOptions::minified());
        assert_eq!(output, format!("{}<d />{}", "<d>".repeat(depth - 1), "</d>".repeat(depth - 1)));
    }

    #[derive(Debug, Clone)]
    enum Gen {
        Tag {
            name: String,
            attributes: Vec<(String, String)>,
            children: Vec<Gen>,
        },
        Text(Vec<String>),
    }

    /// Tokens that re-lex to themselves when joined by single spaces
    fn words(punctuation: &'static [&'static str]) -> impl Strategy<Value = Vec<String>> {
        let word = prop_oneof![
            3 => "[a-z0-9]{1,6}",
            1 => prop::sample::select(punctuation).prop_map(str::to_string),
        ];
        prop::collection::vec(word, 1..4)
    }

    fn tag_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9]{0,5}"
    }

    fn attributes() -> impl Strategy<Value = Vec<(String, String)>> {
        let value = prop_oneof![
            1 => Just(String::new()),
            3 => words(&["=", "/", ">", "\""]).prop_map(|w| w.join(" ")),
        ];
        prop::collection::vec(("[a-z][a-z0-9]{0,4}", value), 0..3)
    }

    /// Adjacent text runs would parse back as one
    fn merge_text(children: Vec<Gen>) -> Vec<Gen> {
        let mut merged: Vec<Gen> = Vec::with_capacity(children.len());
        for child in children {
            if let (Some(Gen::Text(prev)), Gen::Text(next)) = (merged.last_mut(), &child) {
                prev.extend(next.iter().cloned());
                continue;
            }
            merged.push(child);
        }
        merged
    }

    fn tag(children: impl Strategy<Value = Vec<Gen>>) -> impl Strategy<Value = Gen> {
        (tag_name(), attributes(), children).prop_map(|(name, attributes, children)| Gen::Tag {
            name,
            attributes,
            children: merge_text(children),
        })
    }

    fn document() -> impl Strategy<Value = Gen> {
        let leaf = prop_oneof![
            words(&["=", "/", ">", "\"", "'"]).prop_map(Gen::Text),
            tag(Just(Vec::new())),
        ];
        let node = leaf.prop_recursive(4, 48, 4, |inner| tag(prop::collection::vec(inner, 0..4)));
        tag(prop::collection::vec(node, 0..4))
    }

    fn build(doc: &Gen) -> Tree {
        let Gen::Tag { name, attributes, children } = doc else {
            unreachable!("documents start with a tag");
        };
        let mut tree = Tree::new(name.clone());
        for (key, value) in attributes {
            tree.set_attribute(ROOT, key.clone(), value.clone()).unwrap();
        }
        for child in children {
            build_into(&mut tree, ROOT, child);
        }
        tree
    }

    fn build_into(tree: &mut Tree, parent: NodeId, node: &Gen) {
        match node {
            Gen::Text(words) => {
                tree.add_text_node(parent, words.join(" ")).unwrap();
            }
            Gen::Tag { name, attributes, children } => {
                let id = tree.add_node(parent, name.clone()).unwrap();
                for (key, value) in attributes {
                    tree.set_attribute(id, key.clone(), value.clone()).unwrap();
                }
                for child in children {
                    build_into(tree, id, child);
                }
            }
        }
    }

    proptest! {
        #[test]
        fn prop_minified_round_trip(doc in document()) {
            let tree = build(&doc);
            let markup = serialize(&tree, &SerializeOptions::minified());
            let reparsed = parse(&markup).unwrap();
            prop_assert!(reparsed.structurally_eq(&tree), "{}", markup);
            prop_assert_eq!(serialize(&reparsed, &SerializeOptions::minified()), markup);
        }

        #[test]
        fn prop_pretty_round_trip(doc in document()) {
            let tree = build(&doc);
            let markup = serialize(&tree, &SerializeOptions::pretty());
            let reparsed = parse(&markup).unwrap();
            prop_assert!(reparsed.structurally_eq(&tree), "{}", markup);
        }
    }
}
