//! Document parser
//!
//! Drives the lexer through a small state machine and builds a [`Tree`].
//! Open elements are tracked on an explicit stack, so nesting depth is
//! bounded by memory rather than the call stack.
//!
//! Two modes, mirroring `parse` / `parse_strict`:
//! - lenient (default): closing tag names are not checked against the open
//!   element, and elements left open at end of input are accepted
//! - strict: both are errors

use crate::core::lexer::{Lexer, Token, TokenKind};
use crate::core::scanner::Position;
use crate::dom::{Attributes, Node, NodeId, Tree, ROOT};
use crate::error::ParseError;
use std::io::Read;
use tracing::{debug, trace, warn};

/// Parser configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Reject mismatched closing tags and unclosed elements
    pub strict: bool,
}

impl ParseOptions {
    pub fn lenient() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        ParseOptions { strict: true }
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// A scanned `<name attr...>` header
#[derive(Debug)]
struct ScannedTag {
    name: String,
    attributes: Attributes,
    position: Position,
}

/// Outcome of scanning one tag
#[derive(Debug)]
enum TagScan {
    /// `<name ...>`
    Open(ScannedTag),
    /// `<name ... />`
    SelfClose(ScannedTag),
    /// `</name>`
    Close { name: String, position: Position },
}

/// Token-driven tree builder
pub struct Parser<R: Read> {
    lexer: Lexer<R>,
    options: ParseOptions,
    stack: Vec<NodeId>,
}

impl<R: Read> Parser<R> {
    /// Create a lenient parser
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, ParseOptions::default())
    }

    pub fn with_options(reader: R, options: ParseOptions) -> Self {
        Self::from_lexer(Lexer::new(reader), options)
    }

    /// Parse from an existing lexer
    pub fn from_lexer(lexer: Lexer<R>, options: ParseOptions) -> Self {
        Parser {
            lexer,
            options,
            stack: Vec::new(),
        }
    }

    /// Consume the whole source and return the finished tree
    pub fn parse(mut self) -> Result<Tree, ParseError> {
        debug!(strict = self.options.strict, "loading document");

        self.expect(TokenKind::FileBegin, "start of input")?;
        let first = self.lexer.peek_token()?;
        if first.kind != TokenKind::OpenAngle {
            return Err(ParseError::MissingRoot {
                found: first.kind,
                position: first.position,
            });
        }
        let open = self.lexer.next_token()?;

        let mut tree = match self.scan_tag(open.position)? {
            TagScan::Open(tag) => {
                trace!(name = %tag.name, "open root");
                self.stack.push(ROOT);
                root_tree(tag)
            }
            TagScan::SelfClose(tag) => {
                trace!(name = %tag.name, "self-closing root");
                root_tree(tag)
            }
            TagScan::Close { name, position } => {
                return Err(ParseError::UnexpectedCloseTag { name, position });
            }
        };

        loop {
            let next = self.lexer.peek_token()?.kind;
            match next {
                TokenKind::FileEnd => break,
                TokenKind::OpenAngle => self.handle_tag(&mut tree)?,
                _ => self.handle_text(&mut tree)?,
            }
        }

        if self.options.strict {
            if let Some(&unclosed) = self.stack.first() {
                let name = tree.get_node(unclosed).and_then(Node::name).unwrap_or_default();
                return Err(ParseError::UnclosedTag {
                    name: name.to_string(),
                    position: self.lexer.position(),
                });
            }
        }

        debug!(
            nodes = tree.len(),
            bytes = self.lexer.position().offset,
            "document loaded"
        );
        Ok(tree)
    }

    /// Current parent for new content; none once the root has closed
    fn parent(&self, position: Position) -> Result<NodeId, ParseError> {
        self.stack
            .last()
            .copied()
            .ok_or(ParseError::ContentAfterRoot { position })
    }

    fn handle_tag(&mut self, tree: &mut Tree) -> Result<(), ParseError> {
        let open = self.lexer.next_token()?;

        match self.scan_tag(open.position)? {
            TagScan::Open(tag) => {
                let parent = self.parent(tag.position)?;
                trace!(name = %tag.name, parent, "open");
                let id = insert_tag(tree, parent, tag)?;
                self.stack.push(id);
            }
            TagScan::SelfClose(tag) => {
                let parent = self.parent(tag.position)?;
                trace!(name = %tag.name, parent, "self-close");
                insert_tag(tree, parent, tag)?;
            }
            TagScan::Close { name, position } => {
                let Some(open_id) = self.stack.pop() else {
                    return Err(ParseError::UnexpectedCloseTag { name, position });
                };
                let open_name = tree.get_node(open_id).and_then(Node::name).unwrap_or_default();
                if open_name != name {
                    if self.options.strict {
                        return Err(ParseError::TagMismatch {
                            expected: open_name.to_string(),
                            found: name,
                            position,
                        });
                    }
                    warn!(expected = open_name, found = %name, %position, "closing tag does not match open element");
                }
                trace!(name = %name, "close");
            }
        }
        Ok(())
    }

    /// Collect tokens up to the next `<` (or end of input) as one text node
    fn handle_text(&mut self, tree: &mut Tree) -> Result<(), ParseError> {
        let position = self.lexer.peek_token()?.position;
        let parent = self.parent(position)?;

        let mut text = String::new();
        while !matches!(
            self.lexer.peek_token()?.kind,
            TokenKind::OpenAngle | TokenKind::FileEnd
        ) {
            let token = self.lexer.next_token()?;
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&token.text);
        }

        trace!(parent, len = text.len(), "text run");
        tree.add_text_node(parent, text)?;
        Ok(())
    }

    /// Scan a tag body; the `<` has already been consumed
    fn scan_tag(&mut self, position: Position) -> Result<TagScan, ParseError> {
        let token = self.lexer.next_token()?;
        match token.kind {
            TokenKind::Slash => {
                let name = self.expect(TokenKind::Identifier, "closing tag name")?.text;
                self.expect(TokenKind::CloseAngle, "'>'")?;
                Ok(TagScan::Close { name, position })
            }
            TokenKind::Identifier => {
                let attributes = self.scan_attributes()?;
                let tag = ScannedTag {
                    name: token.text,
                    attributes,
                    position,
                };
                // scan_attributes stops at '>' or '/'
                if self.lexer.next_token()?.kind == TokenKind::CloseAngle {
                    Ok(TagScan::Open(tag))
                } else {
                    self.expect(TokenKind::CloseAngle, "'>' after '/'")?;
                    Ok(TagScan::SelfClose(tag))
                }
            }
            _ => Err(unexpected(token, "tag name")),
        }
    }

    /// Read `name[=value]` pairs until `>` or `/` is next
    fn scan_attributes(&mut self) -> Result<Attributes, ParseError> {
        let mut attributes = Attributes::new();
        loop {
            let next = self.lexer.peek_token()?.kind;
            match next {
                TokenKind::CloseAngle | TokenKind::Slash => return Ok(attributes),
                TokenKind::Identifier => {
                    let name = self.lexer.next_token()?.text;
                    let value = self.scan_attribute_value()?;
                    attributes.insert(name, value);
                }
                _ => {
                    let token = self.lexer.next_token()?;
                    return Err(unexpected(token, "attribute name, '/' or '>'"));
                }
            }
        }
    }

    fn scan_attribute_value(&mut self) -> Result<String, ParseError> {
        let next = self.lexer.peek_token()?.kind;
        match next {
            TokenKind::Identifier | TokenKind::Slash | TokenKind::CloseAngle => Ok(String::new()),
            TokenKind::Equals => {
                self.lexer.next_token()?;
                let token = self.lexer.next_token()?;
                match token.kind {
                    TokenKind::Identifier => Ok(token.text),
                    quote if quote.is_quote() => self.collect_quoted(quote),
                    _ => Err(unexpected(token, "attribute value")),
                }
            }
            _ => {
                let token = self.lexer.next_token()?;
                Err(unexpected(token, "'=', attribute name, '/' or '>'"))
            }
        }
    }

    /// Join tokens up to the matching quote with single spaces
    fn collect_quoted(&mut self, quote: TokenKind) -> Result<String, ParseError> {
        let mut value = String::new();
        loop {
            let token = self.lexer.next_token()?;
            if token.kind == quote {
                return Ok(value);
            }
            if token.kind == TokenKind::FileEnd {
                return Err(ParseError::UnexpectedEof {
                    expected: "closing quote",
                    position: token.position,
                });
            }
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(&token.text);
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token, ParseError> {
        let token = self.lexer.next_token()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(unexpected(token, expected))
        }
    }
}

fn unexpected(token: Token, expected: &'static str) -> ParseError {
    match token.kind {
        TokenKind::FileEnd => ParseError::UnexpectedEof {
            expected,
            position: token.position,
        },
        found => ParseError::UnexpectedToken {
            expected,
            found,
            position: token.position,
        },
    }
}

fn root_tree(tag: ScannedTag) -> Tree {
    let mut tree = Tree::new(tag.name);
    if let Some(root) = tree.get_node_mut(ROOT) {
        root.set_attributes(tag.attributes);
    }
    tree
}

fn insert_tag(tree: &mut Tree, parent: NodeId, tag: ScannedTag) -> Result<NodeId, ParseError> {
    let id = tree.add_node(parent, tag.name)?;
    if let Some(node) = tree.get_node_mut(id) {
        node.set_attributes(tag.attributes);
    }
    Ok(id)
}

/// Load a document leniently from any byte source
pub fn load_document<R: Read>(source: R) -> Result<Tree, ParseError> {
    load_document_with(source, ParseOptions::default())
}

/// Load a document with explicit options
pub fn load_document_with<R: Read>(source: R, options: ParseOptions) -> Result<Tree, ParseError> {
    Parser::with_options(source, options).parse()
}

/// Parse a document from a string (lenient)
pub fn parse(input: &str) -> Result<Tree, ParseError> {
    load_document(input.as_bytes())
}

/// Parse a document from a string, rejecting mismatched or unclosed tags
pub fn parse_strict(input: &str) -> Result<Tree, ParseError> {
    load_document_with(input.as_bytes(), ParseOptions::strict())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::Scanner;
    use crate::error::{status_of, STATUS_MALFORMED, STATUS_OK, STATUS_UNREADABLE};
    use rstest::rstest;
    use std::io;

    fn variant(err: &ParseError) -> &'static str {
        match err {
            ParseError::Io(_) => "io",
            ParseError::InvalidUtf8 { .. } => "invalid_utf8",
            ParseError::MissingRoot { .. } => "missing_root",
            ParseError::UnexpectedToken { .. } => "unexpected_token",
            ParseError::UnexpectedEof { .. } => "unexpected_eof",
            ParseError::ContentAfterRoot { .. } => "content_after_root",
            ParseError::UnexpectedCloseTag { .. } => "unexpected_close_tag",
            ParseError::TagMismatch { .. } => "tag_mismatch",
            ParseError::UnclosedTag { .. } => "unclosed_tag",
            ParseError::Tree(_) => "tree",
        }
    }

    fn node(tree: &Tree, id: NodeId) -> &Node {
        tree.get_node(id).unwrap()
    }

    #[rstest]
    #[case::empty("", "missing_root")]
    #[case::bare_text("hello", "missing_root")]
    #[case::leading_slash("/a", "missing_root")]
    #[case::eof_in_tag("<a", "unexpected_eof")]
    #[case::eof_after_slash("<a/", "unexpected_eof")]
    #[case::eof_in_quote("<a k=\"v></a>", "unexpected_eof")]
    #[case::missing_tag_name("<a>< ></a>", "unexpected_token")]
    #[case::missing_value("<a k=></a>", "unexpected_token")]
    #[case::stray_equals("<a =x></a>", "unexpected_token")]
    #[case::stray_quote("<a \"x\"></a>", "unexpected_token")]
    #[case::slash_without_close("<a/ x>", "unexpected_token")]
    #[case::close_without_name("<a></>", "unexpected_token")]
    #[case::close_with_attribute("<a></a x>", "unexpected_token")]
    #[case::second_root("<a></a><b/>", "content_after_root")]
    #[case::text_after_root("<a></a> tail", "content_after_root")]
    #[case::text_after_self_closed_root("<a/>tail", "content_after_root")]
    #[case::close_as_root("</a>", "unexpected_close_tag")]
    #[case::extra_close("<a></a></a>", "unexpected_close_tag")]
    fn test_malformed(#[case] input: &str, #[case] expected: &str) {
        let err = parse(input).unwrap_err();
        assert_eq!(variant(&err), expected, "{input:?}: {err}");
        assert_eq!(err.status(), STATUS_MALFORMED);
        assert!(err.position().is_some());
    }

    #[rstest]
    #[case::mismatch("<a><b></c></a>", "tag_mismatch")]
    #[case::unclosed_root("<a>", "unclosed_tag")]
    #[case::unclosed_child("<a><b>text</a>", "tag_mismatch")]
    #[case::text_at_eof("<a>tail", "unclosed_tag")]
    fn test_strict_rejects(#[case] input: &str, #[case] expected: &str) {
        let err = parse_strict(input).unwrap_err();
        assert_eq!(variant(&err), expected, "{input:?}: {err}");
        assert!(parse(input).is_ok(), "lenient mode accepts {input:?}");
    }

    #[test]
    fn test_simple_document() {
        let tree = parse("<a><b k=\"v\">hi</b></a>").unwrap();
        assert_eq!(tree.len(), 3);

        let root = node(&tree, ROOT);
        assert_eq!(root.name(), Some("a"));
        assert_eq!(root.children(), &[1]);

        let b = node(&tree, 1);
        assert_eq!(b.name(), Some("b"));
        assert_eq!(b.attribute("k"), Some("v"));
        assert_eq!(b.parent(), Some(ROOT));
        assert_eq!(b.children(), &[2]);

        let text = node(&tree, 2);
        assert!(text.is_text());
        assert_eq!(text.text(), Some("hi"));
    }

    #[test]
    fn test_valueless_attribute() {
        let tree = parse("<x flag other=1>").unwrap();
        let root = node(&tree, ROOT);
        let attrs: Vec<_> = root.attributes().iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(attrs, [("flag", ""), ("other", "1")]);
    }

    #[test]
    fn test_self_closing_equals_empty_pair() {
        let a = parse("<x/>").unwrap();
        let b = parse("<x></x>").unwrap();
        assert!(a.structurally_eq(&b));
        assert_eq!(a.len(), 1);

        let c = parse("<r><y k=v /><z></z></r>").unwrap();
        let d = parse("<r><y k=v></y><z/></r>").unwrap();
        assert!(c.structurally_eq(&d));
    }

    #[rstest]
    #[case::punctuation("<p>x=y</p>", "x = y")]
    #[case::collapsed_whitespace("<p>  hello \n\t world </p>", "hello world")]
    #[case::stray_close_angle("<p>a > b</p>", "a > b")]
    #[case::quotes_in_text("<p>say \"hi\"</p>", "say \" hi \"")]
    fn test_text_runs(#[case] input: &str, #[case] expected: &str) {
        let tree = parse(input).unwrap();
        let text = tree.children(ROOT).next().unwrap();
        assert_eq!(node(&tree, text).text(), Some(expected));
    }

    #[rstest]
    #[case::bare("<a k=v/>", "v")]
    #[case::double_quoted("<a k=\"one  two\"/>", "one two")]
    #[case::single_quoted("<a k='x/y=z'/>", "x / y = z")]
    #[case::other_quote_inside("<a k='say \"hi\"'/>", "say \" hi \"")]
    #[case::empty_quotes("<a k=\"\"/>", "")]
    fn test_attribute_values(#[case] input: &str, #[case] expected: &str) {
        let tree = parse(input).unwrap();
        assert_eq!(node(&tree, ROOT).attribute("k"), Some(expected));
    }

    #[test]
    fn test_duplicate_attribute_keeps_first_position() {
        let tree = parse("<a x=\"1\" y=\"2\" x=\"3\"/>").unwrap();
        let root = node(&tree, ROOT);
        let keys: Vec<_> = root.attributes().keys().map(String::as_str).collect();
        assert_eq!(keys, ["x", "y"]);
        assert_eq!(root.attribute("x"), Some("3"));
    }

    #[test]
    fn test_lenient_mismatch_pops_open_element() {
        let tree = parse("<a><b></c>after</a>").unwrap();
        let root = node(&tree, ROOT);
        assert_eq!(root.children().len(), 2);
        assert_eq!(node(&tree, root.children()[1]).text(), Some("after"));
    }

    #[test]
    fn test_text_at_end_of_input_is_kept() {
        let tree = parse("<a><b>tail").unwrap();
        let b = tree.children(ROOT).next().unwrap();
        let text = tree.children(b).next().unwrap();
        assert_eq!(node(&tree, text).text(), Some("tail"));
    }

    #[test]
    fn test_strict_accepts_well_formed() {
        let tree = parse_strict("<a><b k='v'>hi</b><c/></a>").unwrap();
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_unclosed_tag_names_outermost() {
        let err = parse_strict("<a><b>").unwrap_err();
        assert!(matches!(err, ParseError::UnclosedTag { ref name, .. } if name == "a"));
    }

    #[test]
    fn test_mismatch_reports_names() {
        let err = parse_strict("<a></b>").unwrap_err();
        match err {
            ParseError::TagMismatch { expected, found, position } => {
                assert_eq!(expected, "a");
                assert_eq!(found, "b");
                assert_eq!(position.offset, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_root_reports_found_token() {
        let err = parse("  text").unwrap_err();
        match err {
            ParseError::MissingRoot { found, position } => {
                assert_eq!(found, TokenKind::Identifier);
                assert_eq!(position.offset, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_small_chunks() {
        let input = "<root attr=\"some value\"><child>some text here</child></root>";
        let lexer = Lexer::from_scanner(Scanner::with_capacity(input.as_bytes(), 3));
        let chunked = Parser::from_lexer(lexer, ParseOptions::strict()).parse().unwrap();
        assert!(chunked.structurally_eq(&parse(input).unwrap()));
        assert_eq!(node(&chunked, ROOT).attribute("attr"), Some("some value"));
    }

    #[test]
    fn test_deep_nesting() {
        let depth = 10_000;
        let input = format!("{}{}", "<d>".repeat(depth), "</d>".repeat(depth));
        let tree = parse_strict(&input).unwrap();
        assert_eq!(tree.len(), depth);
        assert_eq!(tree.depth((depth - 1) as NodeId), Some(depth - 1));
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "broken pipe"))
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(status_of(&parse("<a/>")), STATUS_OK);
        assert_eq!(status_of(&load_document(FailingReader)), STATUS_UNREADABLE);
        assert_eq!(status_of(&load_document(&b"<a>\xfe</a>"[..])), STATUS_UNREADABLE);
        assert_eq!(status_of(&parse("<a></a></a>")), STATUS_MALFORMED);
    }

    #[test]
    fn test_options() {
        assert!(!ParseOptions::default().strict);
        assert_eq!(ParseOptions::lenient(), ParseOptions::default());
        assert_eq!(ParseOptions::lenient().with_strict(true), ParseOptions::strict());
    }
}
