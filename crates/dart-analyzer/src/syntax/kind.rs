use logos::Logos;

/// Kinds of the tokens in a [`crate::syntax::TokenStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    // Tokens
    Error = 0,
    Whitespace,
    Comment,
    Eof,

    // Identifiers & Literals
    Ident,
    Integer,
    Double,
    String,
    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Colon,
    Comma,
    Ellipsis,
    DotDot,
    Dot,
    QuestionQuestionEq,
    QuestionQuestion,
    QuestionDot,
    Question,
    At,
    Hash,
    FatArrow,

    // Operators
    TildeSlashEq,
    LtLtEq,
    GtGtEq,
    PlusPlus,
    MinusMinus,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    TildeSlash,
    PercentEq,
    CaretEq,
    AmpEq,
    PipeEq,
    EqEq,
    BangEq,
    LtEq,
    GtEq,
    AmpAmp,
    PipePipe,
    LtLt,
    GtGt,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Amp,
    Pipe,
    Tilde,
    Bang,
    Eq,
    Lt,
    Gt,

    // Keywords
    KwAbstract,
    KwAs,
    KwAssert,
    KwAsync,
    KwAwait,
    KwBreak,
    KwCase,
    KwCatch,
    KwClass,
    KwConst,
    KwContinue,
    KwDefault,
    KwDeferred,
    KwDo,
    KwElse,
    KwEnum,
    KwExport,
    KwExtends,
    KwExternal,
    KwFactory,
    KwFalse,
    KwFinal,
    KwFinally,
    KwFor,
    KwGet,
    KwHide,
    KwIf,
    KwImplements,
    KwImport,
    KwIn,
    KwIs,
    KwLibrary,
    KwNew,
    KwNull,
    KwOf,
    KwOn,
    KwOperator,
    KwPart,
    KwReturn,
    KwSet,
    KwShow,
    KwStatic,
    KwSuper,
    KwSwitch,
    KwThis,
    KwThrow,
    KwTrue,
    KwTry,
    KwVar,
    KwVoid,
    KwWhile,
    KwWith,
}

#[derive(Logos, Debug, PartialEq, Clone, Copy)]
#[logos(error = ())]
pub enum TokenKind {
    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[regex(r"//[^\n]*", allow_greedy = true)]
    #[token("/*", block_comment)]
    Comment,

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("...")]
    Ellipsis,
    #[token("..")]
    DotDot,
    #[token(".")]
    Dot,
    #[token("??=")]
    QuestionQuestionEq,
    #[token("??")]
    QuestionQuestion,
    #[token("?.")]
    QuestionDot,
    #[token("?")]
    Question,
    #[token("@")]
    At,
    #[token("#")]
    Hash,
    #[token("=>")]
    FatArrow,

    // Operators (multi-char first)
    #[token("~/=")]
    TildeSlashEq,
    #[token("<<=")]
    LtLtEq,
    #[token(">>=")]
    GtGtEq,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("~/")]
    TildeSlash,
    #[token("%=")]
    PercentEq,
    #[token("^=")]
    CaretEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("<<")]
    LtLt,
    #[token(">>")]
    GtGt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("~")]
    Tilde,
    #[token("!")]
    Bang,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    // Keywords
    #[token("abstract")]
    KwAbstract,
    #[token("as")]
    KwAs,
    #[token("assert")]
    KwAssert,
    #[token("async")]
    KwAsync,
    #[token("await")]
    KwAwait,
    #[token("break")]
    KwBreak,
    #[token("case")]
    KwCase,
    #[token("catch")]
    KwCatch,
    #[token("class")]
    KwClass,
    #[token("const")]
    KwConst,
    #[token("continue")]
    KwContinue,
    #[token("default")]
    KwDefault,
    #[token("deferred")]
    KwDeferred,
    #[token("do")]
    KwDo,
    #[token("else")]
    KwElse,
    #[token("enum")]
    KwEnum,
    #[token("export")]
    KwExport,
    #[token("extends")]
    KwExtends,
    #[token("external")]
    KwExternal,
    #[token("factory")]
    KwFactory,
    #[token("false")]
    KwFalse,
    #[token("final")]
    KwFinal,
    #[token("finally")]
    KwFinally,
    #[token("for")]
    KwFor,
    #[token("get")]
    KwGet,
    #[token("hide")]
    KwHide,
    #[token("if")]
    KwIf,
    #[token("implements")]
    KwImplements,
    #[token("import")]
    KwImport,
    #[token("in")]
    KwIn,
    #[token("is")]
    KwIs,
    #[token("library")]
    KwLibrary,
    #[token("new")]
    KwNew,
    #[token("null")]
    KwNull,
    #[token("of")]
    KwOf,
    #[token("on")]
    KwOn,
    #[token("operator")]
    KwOperator,
    #[token("part")]
    KwPart,
    #[token("return")]
    KwReturn,
    #[token("set")]
    KwSet,
    #[token("show")]
    KwShow,
    #[token("static")]
    KwStatic,
    #[token("super")]
    KwSuper,
    #[token("switch")]
    KwSwitch,
    #[token("this")]
    KwThis,
    #[token("throw")]
    KwThrow,
    #[token("true")]
    KwTrue,
    #[token("try")]
    KwTry,
    #[token("var")]
    KwVar,
    #[token("void")]
    KwVoid,
    #[token("while")]
    KwWhile,
    #[token("with")]
    KwWith,

    // Literals
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Ident,
    #[regex(r"0[xX][0-9a-fA-F]+")]
    #[regex(r"[0-9]+")]
    Integer,
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?")]
    Double,
    #[token("'", |lex| quoted(lex, '\'', false))]
    #[token("\"", |lex| quoted(lex, '"', false))]
    #[token("r'", |lex| quoted(lex, '\'', true))]
    #[token("r\"", |lex| quoted(lex, '"', true))]
    String,
}

impl From<TokenKind> for SyntaxKind {
    fn from(token: TokenKind) -> Self {
        match token {
            TokenKind::Whitespace => SyntaxKind::Whitespace,
            TokenKind::Comment => SyntaxKind::Comment,
            TokenKind::LParen => SyntaxKind::LParen,
            TokenKind::RParen => SyntaxKind::RParen,
            TokenKind::LBrace => SyntaxKind::LBrace,
            TokenKind::RBrace => SyntaxKind::RBrace,
            TokenKind::LBracket => SyntaxKind::LBracket,
            TokenKind::RBracket => SyntaxKind::RBracket,
            TokenKind::Semicolon => SyntaxKind::Semicolon,
            TokenKind::Colon => SyntaxKind::Colon,
            TokenKind::Comma => SyntaxKind::Comma,
            TokenKind::Ellipsis => SyntaxKind::Ellipsis,
            TokenKind::DotDot => SyntaxKind::DotDot,
            TokenKind::Dot => SyntaxKind::Dot,
            TokenKind::QuestionQuestionEq => SyntaxKind::QuestionQuestionEq,
            TokenKind::QuestionQuestion => SyntaxKind::QuestionQuestion,
            TokenKind::QuestionDot => SyntaxKind::QuestionDot,
            TokenKind::Question => SyntaxKind::Question,
            TokenKind::At => SyntaxKind::At,
            TokenKind::Hash => SyntaxKind::Hash,
            TokenKind::FatArrow => SyntaxKind::FatArrow,
            TokenKind::TildeSlashEq => SyntaxKind::TildeSlashEq,
            TokenKind::LtLtEq => SyntaxKind::LtLtEq,
            TokenKind::GtGtEq => SyntaxKind::GtGtEq,
            TokenKind::PlusPlus => SyntaxKind::PlusPlus,
            TokenKind::MinusMinus => SyntaxKind::MinusMinus,
            TokenKind::PlusEq => SyntaxKind::PlusEq,
            TokenKind::MinusEq => SyntaxKind::MinusEq,
            TokenKind::StarEq => SyntaxKind::StarEq,
            TokenKind::SlashEq => SyntaxKind::SlashEq,
            TokenKind::TildeSlash => SyntaxKind::TildeSlash,
            TokenKind::PercentEq => SyntaxKind::PercentEq,
            TokenKind::CaretEq => SyntaxKind::CaretEq,
            TokenKind::AmpEq => SyntaxKind::AmpEq,
            TokenKind::PipeEq => SyntaxKind::PipeEq,
            TokenKind::EqEq => SyntaxKind::EqEq,
            TokenKind::BangEq => SyntaxKind::BangEq,
            TokenKind::LtEq => SyntaxKind::LtEq,
            TokenKind::GtEq => SyntaxKind::GtEq,
            TokenKind::AmpAmp => SyntaxKind::AmpAmp,
            TokenKind::PipePipe => SyntaxKind::PipePipe,
            TokenKind::LtLt => SyntaxKind::LtLt,
            TokenKind::GtGt => SyntaxKind::GtGt,
            TokenKind::Plus => SyntaxKind::Plus,
            TokenKind::Minus => SyntaxKind::Minus,
            TokenKind::Star => SyntaxKind::Star,
            TokenKind::Slash => SyntaxKind::Slash,
            TokenKind::Percent => SyntaxKind::Percent,
            TokenKind::Caret => SyntaxKind::Caret,
            TokenKind::Amp => SyntaxKind::Amp,
            TokenKind::Pipe => SyntaxKind::Pipe,
            TokenKind::Tilde => SyntaxKind::Tilde,
            TokenKind::Bang => SyntaxKind::Bang,
            TokenKind::Eq => SyntaxKind::Eq,
            TokenKind::Lt => SyntaxKind::Lt,
            TokenKind::Gt => SyntaxKind::Gt,
            TokenKind::KwAbstract => SyntaxKind::KwAbstract,
            TokenKind::KwAs => SyntaxKind::KwAs,
            TokenKind::KwAssert => SyntaxKind::KwAssert,
            TokenKind::KwAsync => SyntaxKind::KwAsync,
            TokenKind::KwAwait => SyntaxKind::KwAwait,
            TokenKind::KwBreak => SyntaxKind::KwBreak,
            TokenKind::KwCase => SyntaxKind::KwCase,
            TokenKind::KwCatch => SyntaxKind::KwCatch,
            TokenKind::KwClass => SyntaxKind::KwClass,
            TokenKind::KwConst => SyntaxKind::KwConst,
            TokenKind::KwContinue => SyntaxKind::KwContinue,
            TokenKind::KwDefault => SyntaxKind::KwDefault,
            TokenKind::KwDeferred => SyntaxKind::KwDeferred,
            TokenKind::KwDo => SyntaxKind::KwDo,
            TokenKind::KwElse => SyntaxKind::KwElse,
            TokenKind::KwEnum => SyntaxKind::KwEnum,
            TokenKind::KwExport => SyntaxKind::KwExport,
            TokenKind::KwExtends => SyntaxKind::KwExtends,
            TokenKind::KwExternal => SyntaxKind::KwExternal,
            TokenKind::KwFactory => SyntaxKind::KwFactory,
            TokenKind::KwFalse => SyntaxKind::KwFalse,
            TokenKind::KwFinal => SyntaxKind::KwFinal,
            TokenKind::KwFinally => SyntaxKind::KwFinally,
            TokenKind::KwFor => SyntaxKind::KwFor,
            TokenKind::KwGet => SyntaxKind::KwGet,
            TokenKind::KwHide => SyntaxKind::KwHide,
            TokenKind::KwIf => SyntaxKind::KwIf,
            TokenKind::KwImplements => SyntaxKind::KwImplements,
            TokenKind::KwImport => SyntaxKind::KwImport,
            TokenKind::KwIn => SyntaxKind::KwIn,
            TokenKind::KwIs => SyntaxKind::KwIs,
            TokenKind::KwLibrary => SyntaxKind::KwLibrary,
            TokenKind::KwNew => SyntaxKind::KwNew,
            TokenKind::KwNull => SyntaxKind::KwNull,
            TokenKind::KwOf => SyntaxKind::KwOf,
            TokenKind::KwOn => SyntaxKind::KwOn,
            TokenKind::KwOperator => SyntaxKind::KwOperator,
            TokenKind::KwPart => SyntaxKind::KwPart,
            TokenKind::KwReturn => SyntaxKind::KwReturn,
            TokenKind::KwSet => SyntaxKind::KwSet,
            TokenKind::KwShow => SyntaxKind::KwShow,
            TokenKind::KwStatic => SyntaxKind::KwStatic,
            TokenKind::KwSuper => SyntaxKind::KwSuper,
            TokenKind::KwSwitch => SyntaxKind::KwSwitch,
            TokenKind::KwThis => SyntaxKind::KwThis,
            TokenKind::KwThrow => SyntaxKind::KwThrow,
            TokenKind::KwTrue => SyntaxKind::KwTrue,
            TokenKind::KwTry => SyntaxKind::KwTry,
            TokenKind::KwVar => SyntaxKind::KwVar,
            TokenKind::KwVoid => SyntaxKind::KwVoid,
            TokenKind::KwWhile => SyntaxKind::KwWhile,
            TokenKind::KwWith => SyntaxKind::KwWith,
            TokenKind::Ident => SyntaxKind::Ident,
            TokenKind::Integer => SyntaxKind::Integer,
            TokenKind::Double => SyntaxKind::Double,
            TokenKind::String => SyntaxKind::String,
        }
    }
}

/// Coarse token classes exposed to collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenCategory {
    Whitespace,
    Comment,
    Identifier,
    Keyword,
    Literal,
    Operator,
    Punctuation,
    Eof,
    Error,
}

impl SyntaxKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, SyntaxKind::Whitespace | SyntaxKind::Comment)
    }

    pub fn is_keyword(self) -> bool {
        self >= SyntaxKind::KwAbstract
    }

    /// Keywords that may still name declarations (`get`, `show`, `of`, ...).
    pub fn is_builtin_identifier(self) -> bool {
        matches!(
            self,
            SyntaxKind::KwAbstract
                | SyntaxKind::KwAs
                | SyntaxKind::KwAsync
                | SyntaxKind::KwAwait
                | SyntaxKind::KwDeferred
                | SyntaxKind::KwExport
                | SyntaxKind::KwExternal
                | SyntaxKind::KwFactory
                | SyntaxKind::KwGet
                | SyntaxKind::KwHide
                | SyntaxKind::KwImport
                | SyntaxKind::KwLibrary
                | SyntaxKind::KwOf
                | SyntaxKind::KwOn
                | SyntaxKind::KwOperator
                | SyntaxKind::KwPart
                | SyntaxKind::KwSet
                | SyntaxKind::KwShow
                | SyntaxKind::KwStatic
        )
    }

    pub fn is_identifier_like(self) -> bool {
        self == SyntaxKind::Ident || self.is_builtin_identifier()
    }

    pub fn is_assignment_operator(self) -> bool {
        matches!(
            self,
            SyntaxKind::Eq
                | SyntaxKind::PlusEq
                | SyntaxKind::MinusEq
                | SyntaxKind::StarEq
                | SyntaxKind::SlashEq
                | SyntaxKind::TildeSlashEq
                | SyntaxKind::PercentEq
                | SyntaxKind::CaretEq
                | SyntaxKind::AmpEq
                | SyntaxKind::PipeEq
                | SyntaxKind::LtLtEq
                | SyntaxKind::GtGtEq
                | SyntaxKind::QuestionQuestionEq
        )
    }

    pub fn category(self) -> TokenCategory {
        match self {
            SyntaxKind::Error => TokenCategory::Error,
            SyntaxKind::Whitespace => TokenCategory::Whitespace,
            SyntaxKind::Comment => TokenCategory::Comment,
            SyntaxKind::Eof => TokenCategory::Eof,
            SyntaxKind::Ident => TokenCategory::Identifier,
            SyntaxKind::Integer | SyntaxKind::Double | SyntaxKind::String => TokenCategory::Literal,
            kind if kind.is_keyword() => TokenCategory::Keyword,
            kind if kind >= SyntaxKind::TildeSlashEq => TokenCategory::Operator,
            _ => TokenCategory::Punctuation,
        }
    }
}

/// Consumes a (possibly nested) block comment; an unterminated comment runs
/// to the end of input.
fn block_comment(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let rest = lex.remainder().as_bytes();
    let mut depth = 1usize;
    let mut i = 0;
    while i < rest.len() {
        if rest[i] == b'/' && rest.get(i + 1) == Some(&b'*') {
            depth += 1;
            i += 2;
        } else if rest[i] == b'*' && rest.get(i + 1) == Some(&b'/') {
            depth -= 1;
            i += 2;
            if depth == 0 {
                lex.bump(i);
                return true;
            }
        } else {
            i += 1;
        }
    }
    lex.bump(rest.len());
    true
}

/// Consumes a string literal after its opening quote. Single-line strings
/// stop before an unescaped newline when unterminated; triple-quoted strings
/// run to the end of input.
fn quoted(
    lex: &mut logos::Lexer<TokenKind>,
    quote: char,
    raw: bool,
) -> bool {
    let rest = lex.remainder();
    let q = quote as u8;
    let bytes = rest.as_bytes();
    if bytes.len() >= 2 && bytes[0] == q && bytes[1] == q {
        let mut i = 2;
        while i < bytes.len() {
            if !raw && bytes[i] == b'\\' {
                i += 2;
                continue;
            }
            if bytes[i] == q && bytes.get(i + 1) == Some(&q) && bytes.get(i + 2) == Some(&q) {
                lex.bump(i + 3);
                return true;
            }
            i += 1;
        }
        lex.bump(bytes.len());
        return true;
    }
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if !raw && bytes.get(i + 1).is_some_and(|b| *b != b'\n') => i += 2,
            b'\n' => break,
            b if b == q => {
                lex.bump(i + 1);
                return true;
            },
            _ => i += 1,
        }
    }
    let end = i.min(bytes.len());
    lex.bump(end);
    true
}
