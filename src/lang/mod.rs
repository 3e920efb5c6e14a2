/*!
# Rust Language Module

This Rust module provides lexical analysis of the PL/0 language.

The scanner classifies raw source text into tokens. Malformed lexemes
(oversized identifiers or numbers, unknown characters, unterminated
comments) are carried in the token stream as error markers and become
fatal only when the parser consults them.

*/

#[macro_use]
mod error;
mod lex;
mod token;

pub use error::Error;
pub use error::ErrorCode;
pub use lex::lex;
pub use lex::Scan;
pub use lex::MAX_IDENT_LEN;
pub use lex::MAX_NUMBER_LEN;
pub use token::Operator;
pub use token::Token;
pub use token::Word;

/// 1-based source line, `None` when a diagnostic has no position.
pub type LineNumber = Option<usize>;
