//! Markup Lexer
//!
//! Classifies source bytes into a flat token stream. Whitespace separates
//! tokens and is never emitted; no well-formedness checks happen here.

use super::scanner::{Position, Scanner};
use crate::error::ParseError;
use std::fmt;
use std::io::Read;

/// Markup token types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Always the first token handed out
    FileBegin,
    /// Terminal; repeated calls keep returning it
    FileEnd,
    OpenAngle,   // <
    CloseAngle,  // >
    Slash,       // /
    Equals,      // =
    DoubleQuote, // "
    SingleQuote, // '
    /// Maximal run of non-delimiter, non-whitespace bytes
    Identifier,
}

impl TokenKind {
    /// Classify a single delimiter byte
    #[inline]
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'<' => Some(TokenKind::OpenAngle),
            b'>' => Some(TokenKind::CloseAngle),
            b'/' => Some(TokenKind::Slash),
            b'=' => Some(TokenKind::Equals),
            b'"' => Some(TokenKind::DoubleQuote),
            b'\'' => Some(TokenKind::SingleQuote),
            _ => None,
        }
    }

    pub fn is_quote(self) -> bool {
        matches!(self, TokenKind::DoubleQuote | TokenKind::SingleQuote)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::FileBegin => "start of input",
            TokenKind::FileEnd => "end of input",
            TokenKind::OpenAngle => "'<'",
            TokenKind::CloseAngle => "'>'",
            TokenKind::Slash => "'/'",
            TokenKind::Equals => "'='",
            TokenKind::DoubleQuote => "'\"'",
            TokenKind::SingleQuote => "\"'\"",
            TokenKind::Identifier => "identifier",
        };
        f.write_str(name)
    }
}

/// A lexed token with its source text and start position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Identifier text, or the delimiter character itself
    pub text: String,
    pub position: Position,
}

impl Token {
    fn new(kind: TokenKind, text: String, position: Position) -> Self {
        Token {
            kind,
            text,
            position,
        }
    }
}

#[inline]
fn is_identifier_byte(b: u8) -> bool {
    !b.is_ascii_whitespace() && TokenKind::from_byte(b).is_none()
}

/// Markup lexer with one token of lookahead
pub struct Lexer<R: Read> {
    scanner: Scanner<R>,
    peeked: Option<Token>,
    started: bool,
}

impl<R: Read> Lexer<R> {
    /// Create a new lexer
    pub fn new(reader: R) -> Self {
        Self::from_scanner(Scanner::new(reader))
    }

    /// Create a lexer over an existing scanner (custom chunk size)
    pub fn from_scanner(scanner: Scanner<R>) -> Self {
        Lexer {
            scanner,
            peeked: None,
            started: false,
        }
    }

    /// Position of the next unconsumed byte
    pub fn position(&self) -> Position {
        self.scanner.position()
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.lex(),
        }
    }

    /// Look at the next token without consuming it
    pub fn peek_token(&mut self) -> Result<&Token, ParseError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lex()?,
        };
        let token: &Token = self.peeked.insert(token);
        Ok(token)
    }

    fn lex(&mut self) -> Result<Token, ParseError> {
        if !self.started {
            self.started = true;
            return Ok(Token::new(TokenKind::FileBegin, String::new(), self.position()));
        }

        self.scanner.skip_whitespace()?;
        let position = self.position();

        let byte = match self.scanner.peek()? {
            Some(b) => b,
            None => return Ok(Token::new(TokenKind::FileEnd, String::new(), position)),
        };

        if let Some(kind) = TokenKind::from_byte(byte) {
            self.scanner.advance(1);
            return Ok(Token::new(kind, char::from(byte).to_string(), position));
        }

        let mut bytes = Vec::new();
        self.scanner.take_while(is_identifier_byte, &mut bytes)?;
        let text = String::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8 { position })?;
        Ok(Token::new(TokenKind::Identifier, text, position))
    }

    /// Tokenize the remaining input, excluding FileBegin and FileEnd
    pub fn tokenize(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            match token.kind {
                TokenKind::FileBegin => {}
                TokenKind::FileEnd => break,
                _ => tokens.push(token),
            }
        }
        Ok(tokens)
    }
}
