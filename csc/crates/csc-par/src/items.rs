//! Function and class declaration parsing.

use crate::ast::*;
use crate::Parser;
use csc_lex::TokenKind;

impl<'a> Parser<'a> {
    /// Parse `function name(params): ret { body }`
    pub(crate) fn parse_function(&mut self) -> Option<FnDecl> {
        let start = self.current_span();
        self.advance();

        let (name, name_span) = self.expect_ident("after `function`")?;

        self.expect(&TokenKind::LParen, "after function name")?;
        let params = self.parse_params()?;
        self.expect(&TokenKind::RParen, "after parameter list")?;

        let ret = if self.eat(&TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Some(FnDecl {
            name,
            name_span,
            params,
            ret,
            body,
            span,
        })
    }

    /// Parse `class Name : Super { members }`
    pub(crate) fn parse_class(&mut self) -> Option<ClassDecl> {
        let start = self.current_span();
        self.advance();

        let (name, name_span) = self.expect_ident("after `class`")?;

        let superclass = if self.eat(&TokenKind::Colon) {
            let (super_name, super_span) = self.expect_ident("as superclass name")?;
            Some(SuperRef {
                name: super_name,
                span: super_span,
            })
        } else {
            None
        };

        self.expect(&TokenKind::LBrace, "to open class body")?;
        let mut members = Vec::new();
        while !self.at(&TokenKind::RBrace) && !self.at(&TokenKind::Eof) {
            match self.current_kind() {
                TokenKind::Var => match self.parse_var_decl(true, true) {
                    Some(field) => members.push(ClassMember::Field(field)),
                    None => self.synchronize(),
                },
                TokenKind::Function => match self.parse_function() {
                    Some(method) => members.push(ClassMember::Method(method)),
                    None => self.synchronize(),
                },
                other => {
                    self.error(format!(
                        "expected `var` or `function` in class body, found {}",
                        other.describe()
                    ));
                    self.synchronize();
                }
            }
        }
        let end = self.expect(&TokenKind::RBrace, "to close class body")?;

        Some(ClassDecl {
            name,
            name_span,
            superclass,
            members,
            span: start.merge(end),
        })
    }

    /// Comma-separated `name: type` list
    fn parse_params(&mut self) -> Option<Vec<Param>> {
        let mut params = Vec::new();
        if self.at(&TokenKind::RParen) {
            return Some(params);
        }
        loop {
            let (name, name_span) = self.expect_ident("as parameter name")?;
            self.expect(&TokenKind::Colon, "after parameter name")?;
            let ty = self.parse_type()?;
            let span = name_span.merge(ty.span);
            params.push(Param {
                name,
                name_span,
                ty,
                span,
            });
            if !self.eat(&TokenKind::Comma) {
                return Some(params);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parser;
    use csc_lex::Lexer;
    use csc_util::Handler;

    fn parse_ok(source: &str) -> Program {
        let handler = Handler::new();
        let tokens = Lexer::new(source, &handler).tokenize();
        let program = Parser::new(tokens, &handler).parse();
        assert!(
            !handler.has_errors(),
            "unexpected errors: {:?}",
            handler.diagnostics()
        );
        program
    }

    #[test]
    fn test_function_with_params_and_return() {
        let program = parse_ok("function add(a: integer, b: integer): integer { return a + b; }");
        let Stmt::Function(f) = &program[0] else {
            panic!("expected function");
        };
        assert_eq!(f.name, "add");
        assert_eq!(f.params.len(), 2);
        assert!(f.ret.is_some());
    }

    #[test]
    fn test_void_function_without_annotation() {
        let program = parse_ok("function log() { }");
        let Stmt::Function(f) = &program[0] else {
            panic!("expected function");
        };
        assert!(f.ret.is_none());
        assert!(f.params.is_empty());
    }

    #[test]
    fn test_class_with_inheritance() {
        let program = parse_ok(
            "class Animal { var name: string; function speak(): string { return this.name; } }\n\
             class Dog : Animal { }",
        );
        let Stmt::Class(animal) = &program[0] else {
            panic!("expected class");
        };
        assert_eq!(animal.members.len(), 2);
        assert!(animal.superclass.is_none());

        let Stmt::Class(dog) = &program[1] else {
            panic!("expected class");
        };
        assert_eq!(dog.superclass.as_ref().unwrap().name, "Animal");
    }

    #[test]
    fn test_constructor_is_a_method() {
        let program = parse_ok("class P { function constructor(x: integer) { } }");
        let Stmt::Class(class) = &program[0] else {
            panic!("expected class");
        };
        let ClassMember::Method(method) = &class.members[0] else {
            panic!("expected method");
        };
        assert_eq!(method.name, "constructor");
    }
}
