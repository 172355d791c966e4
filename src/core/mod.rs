//! Core markup lexing primitives
//!
//! - Scanner: buffered byte source with offset/line/column tracking
//! - Lexer: delimiter classification into a token stream with lookahead

pub mod lexer;
pub mod scanner;

pub use lexer::{Lexer, Token, TokenKind};
pub use scanner::{Position, Scanner};
