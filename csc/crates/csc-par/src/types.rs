//! Type annotation parsing.

use crate::ast::{BaseType, TypeExpr};
use crate::Parser;
use csc_lex::TokenKind;

impl<'a> Parser<'a> {
    /// Parse a type annotation: a base type plus `[]` suffixes
    pub(crate) fn parse_type(&mut self) -> Option<TypeExpr> {
        let start = self.current_span();
        let base = match self.current_kind() {
            TokenKind::IntegerTy => BaseType::Integer,
            TokenKind::FloatTy => BaseType::Float,
            TokenKind::StringTy => BaseType::Str,
            TokenKind::BooleanTy => BaseType::Boolean,
            TokenKind::VoidTy => BaseType::Void,
            TokenKind::Ident(name) => BaseType::Named(name.clone()),
            other => {
                let found = other.describe();
                self.error(format!("expected type, found {}", found));
                return None;
            }
        };
        self.advance();

        let mut rank = 0;
        let mut end = start;
        while self.at(&TokenKind::LBracket) {
            self.advance();
            end = self.expect(&TokenKind::RBracket, "to close array type")?;
            rank += 1;
        }

        Some(TypeExpr {
            base,
            rank,
            span: start.merge(end),
        })
    }
}
