//! The `where` predicate language.
//!
//! A deliberately small expression grammar evaluated per candidate entity:
//! field access by wire name, string/number/bool/null literals, equality
//! and inequality, boolean combinators (`&&`/`||`/`!`, with `and`/`or`/
//! `not` accepted as aliases), parentheses, and two helper predicates that
//! take the candidate implicitly:
//!
//! - `cross_trust_zone()`: true when the candidate references a
//!   trust-zone id that does not exist in the document
//! - `has_tag('pii')`: true when the tag is in the candidate's tag set
//!
//! There is no assignment, no arbitrary code execution, and no document
//! traversal beyond the candidate's own fields. Every lex/parse/eval
//! failure is an [`ExprError`]; the engine treats those as non-match.

use crate::entity::{Entity, Value};
use crate::model::OtmIndex;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ExprError {
    #[error("unexpected character '{ch}' at offset {at}")]
    UnexpectedChar { ch: char, at: usize },
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: &'static str, found: String },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("{name}() takes {expected} argument(s), got {got}")]
    BadArity {
        name: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{name}() expects a string argument")]
    BadArgument { name: &'static str },
}

/// Shared evaluation environment for the helper predicates.
pub struct EvalContext<'a> {
    pub index: &'a OtmIndex<'a>,
}

/// A parsed `where` expression, reusable across candidates.
#[derive(Clone, Debug, PartialEq)]
pub struct Predicate {
    ast: Expr,
}

impl Predicate {
    pub fn parse(src: &str) -> Result<Self, ExprError> {
        let tokens = lex(src)?;
        let mut parser = Parser { tokens, pos: 0 };
        let ast = parser.expr()?;
        if let Some(tok) = parser.peek() {
            return Err(ExprError::UnexpectedToken {
                expected: "end of expression",
                found: tok.describe(),
            });
        }
        Ok(Predicate { ast })
    }

    /// Evaluate against one candidate. The caller decides how to coerce
    /// the resulting value (the engine uses truthiness) and how to handle
    /// errors (the engine fails closed).
    pub fn eval(&self, entity: &Entity<'_>, ctx: &EvalContext<'_>) -> Result<Value, ExprError> {
        eval_expr(&self.ast, entity, ctx)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Expr {
    Literal(Value),
    Field(String),
    Call { name: String, args: Vec<Expr> },
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Eq(Box<Expr>, Box<Expr>),
    Ne(Box<Expr>, Box<Expr>),
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Number(f64),
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    Bang,
    LParen,
    RParen,
    Comma,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("identifier '{s}'"),
            Token::Str(_) => "string literal".to_string(),
            Token::Number(_) => "number literal".to_string(),
            Token::EqEq => "'=='".to_string(),
            Token::NotEq => "'!='".to_string(),
            Token::AndAnd => "'&&'".to_string(),
            Token::OrOr => "'||'".to_string(),
            Token::Bang => "'!'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
        }
    }
}

fn lex(src: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let bytes: Vec<char> = src.chars().collect();
    let mut i = 0;

    while i < bytes.len() {
        let ch = bytes[i];
        match ch {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '=' if bytes.get(i + 1) == Some(&'=') => {
                tokens.push(Token::EqEq);
                i += 2;
            }
            '!' if bytes.get(i + 1) == Some(&'=') => {
                tokens.push(Token::NotEq);
                i += 2;
            }
            '!' => {
                tokens.push(Token::Bang);
                i += 1;
            }
            '&' if bytes.get(i + 1) == Some(&'&') => {
                tokens.push(Token::AndAnd);
                i += 2;
            }
            '|' if bytes.get(i + 1) == Some(&'|') => {
                tokens.push(Token::OrOr);
                i += 2;
            }
            '\'' | '"' => {
                let quote = ch;
                let mut out = String::new();
                i += 1;
                loop {
                    match bytes.get(i) {
                        None => return Err(ExprError::UnterminatedString),
                        Some(&c) if c == quote => {
                            i += 1;
                            break;
                        }
                        Some('\\') => {
                            // Only the quote characters and backslash escape.
                            match bytes.get(i + 1) {
                                Some(&next @ ('\'' | '"' | '\\')) => {
                                    out.push(next);
                                    i += 2;
                                }
                                _ => {
                                    out.push('\\');
                                    i += 1;
                                }
                            }
                        }
                        Some(&c) => {
                            out.push(c);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(out));
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == '.') {
                    i += 1;
                }
                let text: String = bytes[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| ExprError::UnexpectedChar { ch: c, at: start })?;
                tokens.push(Token::Number(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_alphanumeric() || bytes[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(bytes[start..i].iter().collect()));
            }
            other => return Err(ExprError::UnexpectedChar { ch: other, at: i }),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(s)) if s == word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // expr := and_expr (('||' | 'or') and_expr)*
    fn expr(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.and_expr()?;
        while self.eat(&Token::OrOr) || self.eat_keyword("or") {
            let rhs = self.and_expr()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    // and_expr := not_expr (('&&' | 'and') not_expr)*
    fn and_expr(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.not_expr()?;
        while self.eat(&Token::AndAnd) || self.eat_keyword("and") {
            let rhs = self.not_expr()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    // not_expr := ('!' | 'not') not_expr | comparison
    fn not_expr(&mut self) -> Result<Expr, ExprError> {
        if self.eat(&Token::Bang) || self.eat_keyword("not") {
            let inner = self.not_expr()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.comparison()
    }

    // comparison := operand (('==' | '!=') operand)?
    fn comparison(&mut self) -> Result<Expr, ExprError> {
        let lhs = self.operand()?;
        if self.eat(&Token::EqEq) {
            let rhs = self.operand()?;
            return Ok(Expr::Eq(Box::new(lhs), Box::new(rhs)));
        }
        if self.eat(&Token::NotEq) {
            let rhs = self.operand()?;
            return Ok(Expr::Ne(Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    // operand := literal | field | call | '(' expr ')'
    fn operand(&mut self) -> Result<Expr, ExprError> {
        if self.eat(&Token::LParen) {
            let inner = self.expr()?;
            if !self.eat(&Token::RParen) {
                return Err(match self.peek() {
                    Some(tok) => ExprError::UnexpectedToken {
                        expected: "')'",
                        found: tok.describe(),
                    },
                    None => ExprError::UnexpectedEnd,
                });
            }
            return Ok(inner);
        }

        match self.bump() {
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::Str(s))),
            Some(Token::Number(n)) => Ok(Expr::Literal(Value::Number(n))),
            Some(Token::Ident(name)) => match name.as_str() {
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                "null" => Ok(Expr::Literal(Value::Null)),
                _ => {
                    if self.eat(&Token::LParen) {
                        let args = self.call_args()?;
                        Ok(Expr::Call { name, args })
                    } else {
                        Ok(Expr::Field(name))
                    }
                }
            },
            Some(tok) => Err(ExprError::UnexpectedToken {
                expected: "a value",
                found: tok.describe(),
            }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn call_args(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            if self.eat(&Token::RParen) {
                return Ok(args);
            }
            return Err(match self.peek() {
                Some(tok) => ExprError::UnexpectedToken {
                    expected: "',' or ')'",
                    found: tok.describe(),
                },
                None => ExprError::UnexpectedEnd,
            });
        }
    }
}

fn eval_expr(
    expr: &Expr,
    entity: &Entity<'_>,
    ctx: &EvalContext<'_>,
) -> Result<Value, ExprError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Field(name) => entity
            .field(name)
            .ok_or_else(|| ExprError::UnknownField(name.clone())),
        Expr::Call { name, args } => eval_call(name, args, entity, ctx),
        Expr::Not(inner) => Ok(Value::Bool(!eval_expr(inner, entity, ctx)?.truthy())),
        Expr::And(lhs, rhs) => {
            if !eval_expr(lhs, entity, ctx)?.truthy() {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(eval_expr(rhs, entity, ctx)?.truthy()))
        }
        Expr::Or(lhs, rhs) => {
            if eval_expr(lhs, entity, ctx)?.truthy() {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(eval_expr(rhs, entity, ctx)?.truthy()))
        }
        Expr::Eq(lhs, rhs) => Ok(Value::Bool(
            eval_expr(lhs, entity, ctx)? == eval_expr(rhs, entity, ctx)?,
        )),
        Expr::Ne(lhs, rhs) => Ok(Value::Bool(
            eval_expr(lhs, entity, ctx)? != eval_expr(rhs, entity, ctx)?,
        )),
    }
}

fn eval_call(
    name: &str,
    args: &[Expr],
    entity: &Entity<'_>,
    ctx: &EvalContext<'_>,
) -> Result<Value, ExprError> {
    match name {
        // True when the candidate references a trust-zone id missing from
        // the document's trust-zone set. Non-components and components
        // without a reference are never cross-zone.
        "cross_trust_zone" => {
            if !args.is_empty() {
                return Err(ExprError::BadArity {
                    name: "cross_trust_zone",
                    expected: 0,
                    got: args.len(),
                });
            }
            let crossed = match entity.trust_zone() {
                Some(tz) => !ctx.index.trust_zones.contains_key(tz),
                None => false,
            };
            Ok(Value::Bool(crossed))
        }
        "has_tag" => {
            if args.len() != 1 {
                return Err(ExprError::BadArity {
                    name: "has_tag",
                    expected: 1,
                    got: args.len(),
                });
            }
            let Value::Str(tag) = eval_expr(&args[0], entity, ctx)? else {
                return Err(ExprError::BadArgument { name: "has_tag" });
            };
            Ok(Value::Bool(entity.tags().iter().any(|t| *t == tag)))
        }
        other => Err(ExprError::UnknownFunction(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OtmIndex;
    use crate::test_support::{component, dataflow, sample_otm};

    fn eval_on<'a>(src: &str, entity: &Entity<'a>, index: &OtmIndex<'_>) -> Result<Value, ExprError> {
        let ctx = EvalContext { index };
        Predicate::parse(src)?.eval(entity, &ctx)
    }

    #[test]
    fn equality_against_string_literal() {
        let doc = sample_otm();
        let idx = OtmIndex::build(&doc);
        let flow = dataflow("f1", "a", "b", Some("http"));
        let e = Entity::Dataflow(&flow);

        assert_eq!(eval_on("protocol == 'http'", &e, &idx), Ok(Value::Bool(true)));
        assert_eq!(eval_on("protocol != 'http'", &e, &idx), Ok(Value::Bool(false)));
        assert_eq!(eval_on("protocol == \"https\"", &e, &idx), Ok(Value::Bool(false)));
    }

    #[test]
    fn null_protocol_compares_unequal() {
        let doc = sample_otm();
        let idx = OtmIndex::build(&doc);
        let flow = dataflow("f1", "a", "b", None);
        let e = Entity::Dataflow(&flow);

        assert_eq!(eval_on("protocol == 'http'", &e, &idx), Ok(Value::Bool(false)));
        assert_eq!(eval_on("protocol == null", &e, &idx), Ok(Value::Bool(true)));
    }

    #[test]
    fn boolean_combinators_and_aliases() {
        let doc = sample_otm();
        let idx = OtmIndex::build(&doc);
        let flow = dataflow("f1", "a", "b", Some("http"));
        let e = Entity::Dataflow(&flow);

        assert_eq!(
            eval_on("protocol == 'http' && source == 'a'", &e, &idx),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            eval_on("protocol == 'grpc' || destination == 'b'", &e, &idx),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            eval_on("not (protocol == 'http') or source == 'a'", &e, &idx),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            eval_on("!(protocol == 'http' and source == 'a')", &e, &idx),
            Ok(Value::Bool(false))
        );
    }

    #[test]
    fn bare_field_coerces_by_truthiness() {
        let doc = sample_otm();
        let idx = OtmIndex::build(&doc);
        let with_proto = dataflow("f1", "a", "b", Some("http"));
        let without_proto = dataflow("f2", "a", "b", None);

        assert_eq!(
            eval_on("protocol", &Entity::Dataflow(&with_proto), &idx),
            Ok(Value::Str("http".to_string()))
        );
        assert_eq!(
            eval_on("protocol", &Entity::Dataflow(&without_proto), &idx),
            Ok(Value::Null)
        );
    }

    #[test]
    fn cross_trust_zone_flags_dangling_reference() {
        let doc = sample_otm();
        let idx = OtmIndex::build(&doc);

        let known = component("a", "public", &[]);
        assert_eq!(
            eval_on("cross_trust_zone()", &Entity::Component(&known), &idx),
            Ok(Value::Bool(false))
        );

        let dangling = component("x", "nonexistent", &[]);
        assert_eq!(
            eval_on("cross_trust_zone()", &Entity::Component(&dangling), &idx),
            Ok(Value::Bool(true))
        );

        // Dataflows carry no trust-zone reference.
        let flow = dataflow("f1", "a", "b", None);
        assert_eq!(
            eval_on("cross_trust_zone()", &Entity::Dataflow(&flow), &idx),
            Ok(Value::Bool(false))
        );
    }

    #[test]
    fn has_tag_checks_membership() {
        let doc = sample_otm();
        let idx = OtmIndex::build(&doc);
        let c = component("a", "public", &["pii", "internet"]);
        let e = Entity::Component(&c);

        assert_eq!(eval_on("has_tag('pii')", &e, &idx), Ok(Value::Bool(true)));
        assert_eq!(eval_on("has_tag('gdpr')", &e, &idx), Ok(Value::Bool(false)));
        assert_eq!(
            eval_on("has_tag('pii') && cross_trust_zone()", &e, &idx),
            Ok(Value::Bool(false))
        );
    }

    #[test]
    fn errors_are_reported_not_coerced() {
        let doc = sample_otm();
        let idx = OtmIndex::build(&doc);
        let flow = dataflow("f1", "a", "b", None);
        let e = Entity::Dataflow(&flow);

        assert_eq!(
            eval_on("nosuchfield == 'x'", &e, &idx),
            Err(ExprError::UnknownField("nosuchfield".to_string()))
        );
        assert_eq!(
            eval_on("frobnicate()", &e, &idx),
            Err(ExprError::UnknownFunction("frobnicate".to_string()))
        );
        assert_eq!(
            eval_on("has_tag()", &e, &idx),
            Err(ExprError::BadArity {
                name: "has_tag",
                expected: 1,
                got: 0
            })
        );
        assert!(matches!(
            Predicate::parse("protocol == "),
            Err(ExprError::UnexpectedEnd)
        ));
        assert!(matches!(
            Predicate::parse("protocol = 'http'"),
            Err(ExprError::UnexpectedChar { ch: '=', at: _ })
        ));
        assert!(Predicate::parse("'unterminated").is_err());
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        assert!(matches!(
            Predicate::parse("protocol == 'http' extra"),
            Err(ExprError::UnexpectedToken { .. })
        ));
    }
}
