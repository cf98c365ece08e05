use serde::Serialize;

use crate::syntax::{SyntaxKind, TokenStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

/// Which pipeline stage reports a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorStage {
    Scan,
    Parse,
    Resolve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ErrorCode {
    IllegalCharacter,
    UnterminatedString,
    UnterminatedComment,
    ExpectedToken,
    UnexpectedToken,
    MissingIdentifier,
    UriDoesNotExist,
    UndefinedIdentifier,
    UndefinedFunction,
    UndefinedClass,
    UndefinedGetter,
    UndefinedSetter,
    UndefinedMethod,
    UndefinedOperator,
    UndefinedConstructor,
    UndefinedPrefixedName,
    UndefinedLabel,
    LabelInOuterScope,
    BreakLabelOnSwitchMember,
    ContinueLabelOnSwitch,
}

impl ErrorCode {
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::IllegalCharacter => "ILLEGAL_CHARACTER",
            ErrorCode::UnterminatedString => "UNTERMINATED_STRING_LITERAL",
            ErrorCode::UnterminatedComment => "UNTERMINATED_MULTI_LINE_COMMENT",
            ErrorCode::ExpectedToken => "EXPECTED_TOKEN",
            ErrorCode::UnexpectedToken => "UNEXPECTED_TOKEN",
            ErrorCode::MissingIdentifier => "MISSING_IDENTIFIER",
            ErrorCode::UriDoesNotExist => "URI_DOES_NOT_EXIST",
            ErrorCode::UndefinedIdentifier => "UNDEFINED_IDENTIFIER",
            ErrorCode::UndefinedFunction => "UNDEFINED_FUNCTION",
            ErrorCode::UndefinedClass => "UNDEFINED_CLASS",
            ErrorCode::UndefinedGetter => "UNDEFINED_GETTER",
            ErrorCode::UndefinedSetter => "UNDEFINED_SETTER",
            ErrorCode::UndefinedMethod => "UNDEFINED_METHOD",
            ErrorCode::UndefinedOperator => "UNDEFINED_OPERATOR",
            ErrorCode::UndefinedConstructor => "UNDEFINED_CONSTRUCTOR",
            ErrorCode::UndefinedPrefixedName => "UNDEFINED_PREFIXED_NAME",
            ErrorCode::UndefinedLabel => "UNDEFINED_LABEL",
            ErrorCode::LabelInOuterScope => "LABEL_IN_OUTER_SCOPE",
            ErrorCode::BreakLabelOnSwitchMember => "BREAK_LABEL_ON_SWITCH_MEMBER",
            ErrorCode::ContinueLabelOnSwitch => "CONTINUE_LABEL_ON_SWITCH",
        }
    }

    /// Message template; `{0}`, `{1}` are replaced by the diagnostic's
    /// arguments.
    fn template(self) -> &'static str {
        match self {
            ErrorCode::IllegalCharacter => "Illegal character '{0}'",
            ErrorCode::UnterminatedString => "Unterminated string literal",
            ErrorCode::UnterminatedComment => "Unterminated multi-line comment",
            ErrorCode::ExpectedToken => "Expected '{0}'",
            ErrorCode::UnexpectedToken => "Unexpected token '{0}'",
            ErrorCode::MissingIdentifier => "Expected an identifier",
            ErrorCode::UriDoesNotExist => "Target of URI does not exist: '{0}'",
            ErrorCode::UndefinedIdentifier => "Undefined name '{0}'",
            ErrorCode::UndefinedFunction => "The function '{0}' is not defined",
            ErrorCode::UndefinedClass => "Undefined class '{0}'",
            ErrorCode::UndefinedGetter => "There is no such getter '{0}' in '{1}'",
            ErrorCode::UndefinedSetter => "There is no such setter '{0}' in '{1}'",
            ErrorCode::UndefinedMethod => "The method '{0}' is not defined for the class '{1}'",
            ErrorCode::UndefinedOperator => "There is no such operator '{0}' in '{1}'",
            ErrorCode::UndefinedConstructor => "The class '{0}' does not have a constructor '{1}'",
            ErrorCode::UndefinedPrefixedName => "'{0}' is not defined in the library imported as '{1}'",
            ErrorCode::UndefinedLabel => "The label '{0}' is not defined",
            ErrorCode::LabelInOuterScope => "Cannot reference label '{0}' declared in an outer method",
            ErrorCode::BreakLabelOnSwitchMember => "A break label resolves to the 'case' or 'default' statement",
            ErrorCode::ContinueLabelOnSwitch => "A continue label resolves to switch, must be loop or switch member",
        }
    }

    pub fn stage(self) -> ErrorStage {
        match self {
            ErrorCode::IllegalCharacter | ErrorCode::UnterminatedString | ErrorCode::UnterminatedComment => {
                ErrorStage::Scan
            },
            ErrorCode::ExpectedToken | ErrorCode::UnexpectedToken | ErrorCode::MissingIdentifier => ErrorStage::Parse,
            _ => ErrorStage::Resolve,
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            ErrorCode::UndefinedGetter
            | ErrorCode::UndefinedSetter
            | ErrorCode::UndefinedMethod
            | ErrorCode::UndefinedOperator => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// A problem found in one source, located by byte range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub offset: usize,
    pub len: usize,
    pub arguments: Vec<String>,
}

impl Diagnostic {
    pub fn new(
        code: ErrorCode,
        offset: usize,
        len: usize,
        arguments: Vec<String>,
    ) -> Self {
        Self {
            code,
            offset,
            len,
            arguments,
        }
    }

    pub fn message(&self) -> String {
        let mut message = self.code.template().to_string();
        for (i, argument) in self.arguments.iter().enumerate() {
            message = message.replace(&format!("{{{i}}}"), argument);
        }
        message
    }
}

/// Receives diagnostics without interrupting the reporter.
pub trait DiagnosticSink {
    fn report(
        &mut self,
        diagnostic: Diagnostic,
    );
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(
        &mut self,
        diagnostic: Diagnostic,
    ) {
        self.push(diagnostic);
    }
}

/// Lexical problems visible in a token stream.
pub fn scan_errors(stream: &TokenStream) -> Vec<Diagnostic> {
    let mut errors = Vec::new();
    for (_, token) in stream.iter() {
        let text = stream.text_of(token);
        let code = match token.kind() {
            SyntaxKind::Error => ErrorCode::IllegalCharacter,
            SyntaxKind::String if !is_terminated_string(text) => ErrorCode::UnterminatedString,
            SyntaxKind::Comment if text.starts_with("/*") && !is_terminated_comment(text) => {
                ErrorCode::UnterminatedComment
            },
            _ => continue,
        };
        let arguments = if code == ErrorCode::IllegalCharacter {
            vec![text.to_string()]
        } else {
            Vec::new()
        };
        errors.push(Diagnostic::new(code, token.offset(), token.len(), arguments));
    }
    errors
}

fn is_terminated_string(text: &str) -> bool {
    let raw = text.starts_with('r');
    let body = if raw { &text[1..] } else { text };
    let Some(quote) = ["'''", "\"\"\"", "'", "\""].into_iter().find(|quote| body.starts_with(*quote)) else {
        return false;
    };
    let inner = &body[quote.len()..];
    let bytes = inner.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !raw && bytes[i] == b'\\' {
            i += 2;
        } else if bytes[i..].starts_with(quote.as_bytes()) {
            return i + quote.len() == inner.len();
        } else {
            i += 1;
        }
    }
    false
}

fn is_terminated_comment(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'/', b'*') => {
                depth += 1;
                i += 2;
            },
            (b'*', b'/') => {
                depth = depth.saturating_sub(1);
                i += 2;
                if depth == 0 {
                    return i == bytes.len();
                }
            },
            _ => i += 1,
        }
    }
    false
}

#[cfg(test)]
#[path = "../tests/src/diagnostics_tests.rs"]
mod tests;
