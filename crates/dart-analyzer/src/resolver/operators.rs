//! Operator tokens to the names of the methods that implement them.

use crate::syntax::SyntaxKind;

/// Method invoked by a compound assignment; `None` for `=` and `??=`.
pub fn assignment_operator_method(operator: SyntaxKind) -> Option<&'static str> {
    Some(match operator {
        SyntaxKind::PlusEq => "+",
        SyntaxKind::MinusEq => "-",
        SyntaxKind::StarEq => "*",
        SyntaxKind::SlashEq => "/",
        SyntaxKind::TildeSlashEq => "~/",
        SyntaxKind::PercentEq => "%",
        SyntaxKind::CaretEq => "^",
        SyntaxKind::AmpEq => "&",
        SyntaxKind::PipeEq => "|",
        SyntaxKind::LtLtEq => "<<",
        SyntaxKind::GtGtEq => ">>",
        _ => return None,
    })
}

/// Method invoked by a binary operator; `None` for the short-circuit and
/// if-null operators, which are not user-definable. `!=` calls `==`.
pub fn binary_operator_method(operator: SyntaxKind) -> Option<&'static str> {
    Some(match operator {
        SyntaxKind::Plus => "+",
        SyntaxKind::Minus => "-",
        SyntaxKind::Star => "*",
        SyntaxKind::Slash => "/",
        SyntaxKind::TildeSlash => "~/",
        SyntaxKind::Percent => "%",
        SyntaxKind::Caret => "^",
        SyntaxKind::Amp => "&",
        SyntaxKind::Pipe => "|",
        SyntaxKind::LtLt => "<<",
        SyntaxKind::GtGt => ">>",
        SyntaxKind::Lt => "<",
        SyntaxKind::Gt => ">",
        SyntaxKind::LtEq => "<=",
        SyntaxKind::GtEq => ">=",
        SyntaxKind::EqEq | SyntaxKind::BangEq => "==",
        _ => return None,
    })
}

/// Method invoked by a prefix operator. `++x` and `--x` call `+` and `-`.
pub fn prefix_operator_method(operator: SyntaxKind) -> Option<&'static str> {
    Some(match operator {
        SyntaxKind::Minus => "unary-",
        SyntaxKind::Tilde => "~",
        SyntaxKind::PlusPlus => "+",
        SyntaxKind::MinusMinus => "-",
        _ => return None,
    })
}

pub fn postfix_operator_method(operator: SyntaxKind) -> Option<&'static str> {
    Some(match operator {
        SyntaxKind::PlusPlus => "+",
        SyntaxKind::MinusMinus => "-",
        _ => return None,
    })
}

/// Whether the operator writes its operand back.
pub fn is_increment(operator: SyntaxKind) -> bool {
    matches!(operator, SyntaxKind::PlusPlus | SyntaxKind::MinusMinus)
}

#[cfg(test)]
#[path = "../../tests/src/resolver/operators_tests.rs"]
mod tests;
