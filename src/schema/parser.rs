//! Recursive-descent parser over the token stream produced by
//! [`crate::schema::lexer`], implementing the grammar in SPEC_FULL.md §4.3.

use super::lexer::{Lexer, Token, TokenKind};
use super::{
    Constraints, ParsedAlternative, ParsedEnumValue, ParsedMember, ParsedModule, ParsedSchema,
    ParsedType, ParsedValue,
};
use crate::error::{ParseError, ParseErrorKind};

/// Parses the full text of an ASN.1 schema into its constituent modules.
pub fn parse_modules(text: &str) -> Result<ParsedSchema, ParseError> {
    let mut parser = Parser::new(text)?;
    let mut modules = Vec::new();
    while !parser.at_eof() {
        modules.push(parser.parse_module()?);
    }
    Ok(ParsedSchema { modules })
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(text);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    fn at_eof(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    fn bump(&mut self) -> Result<Token, ParseError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn error(&self, expected: &str) -> ParseError {
        ParseError::new(
            ParseErrorKind::UnexpectedToken {
                found: describe(&self.current.kind),
                expected: expected.to_string(),
            },
            self.current.line,
            self.current.column,
        )
    }

    fn expect_kind(&mut self, kind: &TokenKind, expected: &str) -> Result<Token, ParseError> {
        if &self.current.kind == kind {
            self.bump()
        } else {
            Err(self.error(expected))
        }
    }

    /// Consumes an identifier token matching `text` case-sensitively
    /// (ASN.1 keywords are uppercase by convention and the grammar treats
    /// them as fixed literals, not as a separate keyword token class).
    fn expect_keyword(&mut self, text: &str) -> Result<(), ParseError> {
        match &self.current.kind {
            TokenKind::Ident(ident) if ident == text => {
                self.bump()?;
                Ok(())
            }
            _ => Err(self.error(text)),
        }
    }

    fn peek_keyword(&self, text: &str) -> bool {
        matches!(&self.current.kind, TokenKind::Ident(ident) if ident == text)
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match &self.current.kind {
            TokenKind::Ident(_) => {
                let token = self.bump()?;
                match token.kind {
                    TokenKind::Ident(name) => Ok(name),
                    _ => unreachable!(),
                }
            }
            _ => Err(self.error("an identifier")),
        }
    }

    fn expect_number(&mut self) -> Result<i64, ParseError> {
        match self.current.kind {
            TokenKind::Number(_) => {
                let token = self.bump()?;
                match token.kind {
                    TokenKind::Number(n) => Ok(n),
                    _ => unreachable!(),
                }
            }
            _ => Err(self.error("a number")),
        }
    }

    fn parse_module(&mut self) -> Result<ParsedModule, ParseError> {
        let name = self.expect_identifier()?;
        self.expect_keyword("DEFINITIONS")?;
        self.expect_kind(&TokenKind::Assign, "`::=`")?;
        self.expect_keyword("BEGIN")?;

        let mut types = Vec::new();
        while !self.peek_keyword("END") {
            let type_name = self.expect_identifier()?;
            self.expect_kind(&TokenKind::Assign, "`::=`")?;
            let ty = self.parse_type()?;
            types.push((type_name, ty));
        }
        self.expect_keyword("END")?;

        Ok(ParsedModule { name, types })
    }

    fn parse_type(&mut self) -> Result<ParsedType, ParseError> {
        match &self.current.kind {
            TokenKind::Ident(ident) if ident == "INTEGER" => {
                self.bump()?;
                let constraints = self.parse_optional_constraint()?;
                Ok(ParsedType::Integer(constraints))
            }
            TokenKind::Ident(ident) if ident == "BOOLEAN" => {
                self.bump()?;
                let constraints = self.parse_optional_constraint()?;
                Ok(ParsedType::Boolean(constraints))
            }
            TokenKind::Ident(ident) if ident == "OCTET" => {
                self.bump()?;
                self.expect_keyword("STRING")?;
                let constraints = self.parse_optional_constraint()?;
                Ok(ParsedType::OctetString(constraints))
            }
            TokenKind::Ident(ident) if ident == "NULL" => {
                self.bump()?;
                Ok(ParsedType::Null)
            }
            TokenKind::Ident(ident) if ident == "ENUMERATED" => {
                self.bump()?;
                self.expect_kind(&TokenKind::LBrace, "`{`")?;
                let mut values = vec![self.parse_enum_value()?];
                while self.current.kind == TokenKind::Comma {
                    self.bump()?;
                    values.push(self.parse_enum_value()?);
                }
                self.expect_kind(&TokenKind::RBrace, "`}`")?;
                Ok(ParsedType::Enumerated(values))
            }
            TokenKind::Ident(ident) if ident == "CHOICE" => {
                self.bump()?;
                self.expect_kind(&TokenKind::LBrace, "`{`")?;
                let mut alternatives = vec![self.parse_alternative()?];
                while self.current.kind == TokenKind::Comma {
                    self.bump()?;
                    alternatives.push(self.parse_alternative()?);
                }
                self.expect_kind(&TokenKind::RBrace, "`}`")?;
                Ok(ParsedType::Choice(alternatives))
            }
            TokenKind::Ident(ident) if ident == "SEQUENCE" => {
                self.bump()?;
                // Tolerate a SIZE constraint between SEQUENCE and OF, per
                // the grammar note that a strict dialect may admit it.
                let _ = self.parse_optional_constraint()?;
                if self.peek_keyword("OF") {
                    self.bump()?;
                    let element = self.parse_type()?;
                    Ok(ParsedType::SequenceOf(Box::new(element)))
                } else {
                    self.expect_kind(&TokenKind::LBrace, "`{` or `OF`")?;
                    let mut members = vec![self.parse_member()?];
                    while self.current.kind == TokenKind::Comma {
                        self.bump()?;
                        members.push(self.parse_member()?);
                    }
                    self.expect_kind(&TokenKind::RBrace, "`}`")?;
                    Ok(ParsedType::Sequence(members))
                }
            }
            TokenKind::Ident(_) => Ok(ParsedType::Defined(self.expect_identifier()?)),
            _ => Err(self.error("a type")),
        }
    }

    fn parse_optional_tag(&mut self) -> Result<Option<u32>, ParseError> {
        if self.current.kind != TokenKind::LBracket {
            return Ok(None);
        }
        self.bump()?;
        let number = self.expect_number()?;
        self.expect_kind(&TokenKind::RBracket, "`]`")?;
        Ok(Some(number as u32))
    }

    fn parse_optional_constraint(&mut self) -> Result<Constraints, ParseError> {
        if self.current.kind != TokenKind::LParen {
            return Ok(Constraints::default());
        }
        self.bump()?;

        let constraints = if self.peek_keyword("SIZE") {
            self.bump()?;
            self.expect_kind(&TokenKind::LParen, "`(`")?;
            let size = self.expect_number()?;
            self.expect_kind(&TokenKind::RParen, "`)`")?;
            Constraints { range: None, size: Some(size) }
        } else {
            let low = self.expect_number()?;
            let range = if self.current.kind == TokenKind::DotDot {
                self.bump()?;
                let high = self.expect_number()?;
                Some((low, high))
            } else {
                Some((low, low))
            };
            Constraints { range, size: None }
        };

        self.expect_kind(&TokenKind::RParen, "`)`")?;
        Ok(constraints)
    }

    fn parse_member(&mut self) -> Result<ParsedMember, ParseError> {
        let name = self.expect_identifier()?;
        let tag = self.parse_optional_tag()?;
        let ty = self.parse_type()?;

        let (optional, default) = if self.peek_keyword("OPTIONAL") {
            self.bump()?;
            (true, None)
        } else if self.peek_keyword("DEFAULT") {
            self.bump()?;
            (false, Some(self.parse_value()?))
        } else {
            (false, None)
        };

        Ok(ParsedMember { name, ty, tag, optional, default })
    }

    fn parse_alternative(&mut self) -> Result<ParsedAlternative, ParseError> {
        let name = self.expect_identifier()?;
        let tag = self.parse_optional_tag()?;
        let ty = self.parse_type()?;
        Ok(ParsedAlternative { name, ty, tag })
    }

    fn parse_enum_value(&mut self) -> Result<ParsedEnumValue, ParseError> {
        let name = self.expect_identifier()?;
        let number = if self.current.kind == TokenKind::LParen {
            self.bump()?;
            let n = self.expect_number()?;
            self.expect_kind(&TokenKind::RParen, "`)`")?;
            Some(n)
        } else {
            None
        };
        Ok(ParsedEnumValue { name, number })
    }

    fn parse_value(&mut self) -> Result<ParsedValue, ParseError> {
        match self.current.kind.clone() {
            TokenKind::Number(n) => {
                self.bump()?;
                Ok(ParsedValue::Number(n))
            }
            TokenKind::Str(s) => {
                self.bump()?;
                Ok(ParsedValue::String(s))
            }
            TokenKind::Ident(ident) if ident == "TRUE" => {
                self.bump()?;
                Ok(ParsedValue::Boolean(true))
            }
            TokenKind::Ident(ident) if ident == "FALSE" => {
                self.bump()?;
                Ok(ParsedValue::Boolean(false))
            }
            TokenKind::Ident(ident) if ident == "NULL" => {
                self.bump()?;
                Ok(ParsedValue::Null)
            }
            TokenKind::Ident(ident) => {
                self.bump()?;
                Ok(ParsedValue::Identifier(ident))
            }
            _ => Err(self.error("a value")),
        }
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(s) => s.clone(),
        TokenKind::Number(n) => n.to_string(),
        TokenKind::Str(s) => format!("{s:?}"),
        TokenKind::Assign => "::=".to_string(),
        TokenKind::DotDot => "..".to_string(),
        TokenKind::LBrace => "{".to_string(),
        TokenKind::RBrace => "}".to_string(),
        TokenKind::LParen => "(".to_string(),
        TokenKind::RParen => ")".to_string(),
        TokenKind::LBracket => "[".to_string(),
        TokenKind::RBracket => "]".to_string(),
        TokenKind::Comma => ",".to_string(),
        TokenKind::Eof => "end of input".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_integer_module() {
        let schema = parse_modules(
            "Example DEFINITIONS ::= BEGIN \
             MyInt ::= INTEGER \
             END",
        )
        .unwrap();
        assert_eq!(schema.modules.len(), 1);
        assert_eq!(schema.modules[0].name, "Example");
        assert_eq!(
            schema.modules[0].get("MyInt"),
            Some(&ParsedType::Integer(Constraints::default()))
        );
    }

    #[test]
    fn whitespace_tolerant_constraints() {
        let tight = parse_modules("M DEFINITIONS ::= BEGIN T ::= INTEGER(-1..1) END").unwrap();
        let loose = parse_modules("M DEFINITIONS ::= BEGIN T ::= INTEGER ( -1 .. 1 ) END").unwrap();
        assert_eq!(tight.modules[0].get("T"), loose.modules[0].get("T"));
        assert_eq!(
            tight.modules[0].get("T"),
            Some(&ParsedType::Integer(Constraints { range: Some((-1, 1)), size: None }))
        );
    }

    #[test]
    fn sequence_of_and_sequence() {
        let schema = parse_modules(
            "M DEFINITIONS ::= BEGIN \
             List ::= SEQUENCE OF INTEGER \
             Rec ::= SEQUENCE { a INTEGER, b BOOLEAN OPTIONAL } \
             END",
        )
        .unwrap();
        let module = &schema.modules[0];
        assert_eq!(
            module.get("List"),
            Some(&ParsedType::SequenceOf(Box::new(ParsedType::Integer(Constraints::default()))))
        );
        match module.get("Rec").unwrap() {
            ParsedType::Sequence(members) => {
                assert_eq!(members.len(), 2);
                assert_eq!(members[0].name, "a");
                assert!(!members[0].optional);
                assert_eq!(members[1].name, "b");
                assert!(members[1].optional);
            }
            other => panic!("expected Sequence, got {other:?}"),
        }
    }

    #[test]
    fn choice_with_tags() {
        let schema = parse_modules(
            "M DEFINITIONS ::= BEGIN \
             Msg ::= CHOICE { ping [1] NULL, pong [2] INTEGER } \
             END",
        )
        .unwrap();
        match schema.modules[0].get("Msg").unwrap() {
            ParsedType::Choice(alts) => {
                assert_eq!(alts[0].name, "ping");
                assert_eq!(alts[0].tag, Some(1));
                assert_eq!(alts[1].tag, Some(2));
            }
            other => panic!("expected Choice, got {other:?}"),
        }
    }

    #[test]
    fn enumerated_with_and_without_explicit_numbers() {
        let schema = parse_modules(
            "M DEFINITIONS ::= BEGIN \
             Color ::= ENUMERATED { red, green(5), blue } \
             END",
        )
        .unwrap();
        match schema.modules[0].get("Color").unwrap() {
            ParsedType::Enumerated(values) => {
                assert_eq!(values[0], ParsedEnumValue { name: "red".into(), number: None });
                assert_eq!(values[1], ParsedEnumValue { name: "green".into(), number: Some(5) });
                assert_eq!(values[2], ParsedEnumValue { name: "blue".into(), number: None });
            }
            other => panic!("expected Enumerated, got {other:?}"),
        }
    }

    #[test]
    fn defined_reference_and_default_value() {
        let schema = parse_modules(
            "M DEFINITIONS ::= BEGIN \
             Base ::= INTEGER \
             Rec ::= SEQUENCE { x Base DEFAULT 7 } \
             END",
        )
        .unwrap();
        match schema.modules[0].get("Rec").unwrap() {
            ParsedType::Sequence(members) => {
                assert_eq!(members[0].ty, ParsedType::Defined("Base".into()));
                assert_eq!(members[0].default, Some(ParsedValue::Number(7)));
            }
            other => panic!("expected Sequence, got {other:?}"),
        }
    }

    #[test]
    fn reports_line_and_column_on_error() {
        let err = parse_modules("M DEFINITIONS ::= BEGIN\nT ::= SEQUENCE 1\nEND").unwrap_err();
        assert_eq!(err.line, 2);
    }
}
