//! Lexing, token streams and incremental re-scanning.

pub mod directives;
pub mod incremental;
pub mod kind;
pub mod lexer;
pub mod line_info;
pub mod token;

pub use directives::{DirectiveInfo, DirectiveKind, PartOf, SourceKind, UriDirective, unquote};
pub use incremental::{Edit, RescanResult, SCAN_LOOKAHEAD, rescan};
pub use kind::{SyntaxKind, TokenCategory};
pub use line_info::{LineColumn, LineInfo};
pub use token::{Token, TokenId, TokenSnapshot, TokenStream};
