//! Recursive-descent parser for binding expressions
//!
//! Precedence, loosest first: conditional, `??`, `||`, `&&`, equality,
//! relational, additive, multiplicative, unary, postfix (member, index,
//! call), primary.

use super::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use super::lexer::{tokenize, SpannedToken, Token};
use super::value::Value;
use super::{ExprError, Result};

/// Parse a complete expression
pub fn parse(source: &str) -> Result<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, current: 0 };
    let expr = parser.parse_expression()?;
    parser.expect(&Token::Eof, "end of expression")?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<SpannedToken>,
    current: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.tokens
            .get(self.current)
            .map(|t| &t.token)
            .unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.current < self.tokens.len() {
            self.current += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> ExprError {
        let span = self
            .tokens
            .get(self.current)
            .map(|t| t.span)
            .unwrap_or_default();
        ExprError::Parse {
            span,
            message: message.into(),
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("Expected {}, found {:?}", what, self.peek())))
        }
    }

    fn parse_expression(&mut self) -> Result<Expr> {
        self.parse_conditional()
    }

    fn parse_conditional(&mut self) -> Result<Expr> {
        let test = self.parse_coalesce()?;
        if !self.eat(&Token::Question) {
            return Ok(test);
        }
        let consequent = self.parse_conditional()?;
        self.expect(&Token::Colon, "':' in conditional")?;
        let alternate = self.parse_conditional()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn parse_coalesce(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_or()?;
        while self.eat(&Token::Coalesce) {
            let rhs = self.parse_or()?;
            lhs = Expr::Logical(LogicalOp::Coalesce, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::OrOr) {
            let rhs = self.parse_and()?;
            lhs = Expr::Logical(LogicalOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_equality()?;
        while self.eat(&Token::AndAnd) {
            let rhs = self.parse_equality()?;
            lhs = Expr::Logical(LogicalOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_binary_level(
        &mut self,
        operators: &[(Token, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut lhs = next(self)?;
        'outer: loop {
            for (token, op) in operators {
                if self.eat(token) {
                    let rhs = next(self)?;
                    lhs = Expr::Binary(*op, Box::new(lhs), Box::new(rhs));
                    continue 'outer;
                }
            }
            return Ok(lhs);
        }
    }

    fn parse_equality(&mut self) -> Result<Expr> {
        self.parse_binary_level(
            &[
                (Token::StrictEq, BinaryOp::StrictEq),
                (Token::StrictNe, BinaryOp::StrictNe),
                (Token::EqEq, BinaryOp::Eq),
                (Token::NotEq, BinaryOp::Ne),
            ],
            Self::parse_relational,
        )
    }

    fn parse_relational(&mut self) -> Result<Expr> {
        self.parse_binary_level(
            &[
                (Token::Le, BinaryOp::Le),
                (Token::Ge, BinaryOp::Ge),
                (Token::Lt, BinaryOp::Lt),
                (Token::Gt, BinaryOp::Gt),
            ],
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        self.parse_binary_level(
            &[(Token::Plus, BinaryOp::Add), (Token::Minus, BinaryOp::Sub)],
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        self.parse_binary_level(
            &[
                (Token::Star, BinaryOp::Mul),
                (Token::Slash, BinaryOp::Div),
                (Token::Percent, BinaryOp::Rem),
            ],
            Self::parse_unary,
        )
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek() {
            Token::Bang => UnaryOp::Not,
            Token::Minus => UnaryOp::Neg,
            Token::Plus => UnaryOp::Plus,
            Token::Typeof => UnaryOp::Typeof,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    let property = self.parse_property_name()?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                        optional: false,
                    };
                }
                Token::OptionalDot => {
                    self.advance();
                    if self.eat(&Token::LBracket) {
                        let index = self.parse_expression()?;
                        self.expect(&Token::RBracket, "']'")?;
                        expr = Expr::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                            optional: true,
                        };
                    } else {
                        let property = self.parse_property_name()?;
                        expr = Expr::Member {
                            object: Box::new(expr),
                            property,
                            optional: true,
                        };
                    }
                }
                Token::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(&Token::RBracket, "']'")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                        optional: false,
                    };
                }
                Token::LParen => {
                    self.advance();
                    let args = self.parse_list(&Token::RParen)?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Property names after `.` may be keywords (`a.null` is legal)
    fn parse_property_name(&mut self) -> Result<String> {
        match self.advance() {
            Token::Identifier(name) => Ok(name),
            Token::True => Ok("true".to_string()),
            Token::False => Ok("false".to_string()),
            Token::Null => Ok("null".to_string()),
            Token::Typeof => Ok("typeof".to_string()),
            other => Err(self.error(format!("Expected property name, found {:?}", other))),
        }
    }

    /// Comma-separated expressions up to `close`, allowing a trailing comma
    fn parse_list(&mut self, close: &Token) -> Result<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(self.parse_expression()?);
            if !self.eat(&Token::Comma) {
                self.expect(close, "closing delimiter")?;
                break;
            }
        }
        Ok(items)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.advance() {
            Token::Number(Some(n)) => Ok(Expr::Literal(Value::Number(n))),
            Token::StringLiteral(s) => Ok(Expr::Literal(Value::String(s))),
            Token::True => Ok(Expr::Literal(Value::Bool(true))),
            Token::False => Ok(Expr::Literal(Value::Bool(false))),
            Token::Null => Ok(Expr::Literal(Value::Null)),
            Token::Identifier(name) => Ok(Expr::Ident(name)),
            Token::LParen => {
                let expr = self.parse_expression()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(expr)
            }
            Token::LBracket => Ok(Expr::Array(self.parse_list(&Token::RBracket)?)),
            Token::LBrace => self.parse_object(),
            other => {
                self.current = self.current.saturating_sub(1);
                Err(self.error(format!("Unexpected token {:?}", other)))
            }
        }
    }

    fn parse_object(&mut self) -> Result<Expr> {
        let mut entries = Vec::new();
        while !self.eat(&Token::RBrace) {
            let key = match self.advance() {
                Token::Identifier(name) => name,
                Token::StringLiteral(s) => s,
                Token::Number(Some(n)) => Value::Number(n).to_string(),
                Token::True => "true".to_string(),
                Token::False => "false".to_string(),
                Token::Null => "null".to_string(),
                other => {
                    return Err(self.error(format!("Expected object key, found {:?}", other)))
                }
            };

            let value = if self.eat(&Token::Colon) {
                self.parse_expression()?
            } else {
                // Shorthand `{ open }`
                Expr::Ident(key.clone())
            };
            entries.push((key, value));

            if !self.eat(&Token::Comma) {
                self.expect(&Token::RBrace, "'}'")?;
                break;
            }
        }
        Ok(Expr::Object(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.to_string()))
    }

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Literal(Value::Number(n)))
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse("a + b * 2").unwrap(),
            Expr::Binary(
                BinaryOp::Add,
                ident("a"),
                Box::new(Expr::Binary(BinaryOp::Mul, ident("b"), num(2.0)))
            )
        );
        assert_eq!(
            parse("!a && b || c").unwrap(),
            Expr::Logical(
                LogicalOp::Or,
                Box::new(Expr::Logical(
                    LogicalOp::And,
                    Box::new(Expr::Unary(UnaryOp::Not, ident("a"))),
                    ident("b")
                )),
                ident("c")
            )
        );
    }

    #[test]
    fn test_conditional_is_right_associative() {
        let expr = parse("a ? 1 : b ? 2 : 3").unwrap();
        let Expr::Conditional { alternate, .. } = expr else {
            panic!("expected conditional");
        };
        assert!(matches!(*alternate, Expr::Conditional { .. }));
    }

    #[test]
    fn test_member_chains_and_calls() {
        let expr = parse("user?.name.toUpperCase()").unwrap();
        let Expr::Call { callee, args } = expr else {
            panic!("expected call");
        };
        assert!(args.is_empty());
        assert!(matches!(*callee, Expr::Member { ref property, optional: false, .. } if property == "toUpperCase"));

        assert_eq!(parse("props.count").unwrap().as_path().as_deref(), Some("props.count"));
        assert_eq!(parse("a?.b").unwrap().as_path(), None);
    }

    #[test]
    fn test_object_literals() {
        let expr = parse("{ active: isActive, 'text-muted': !isActive, open, }").unwrap();
        let Expr::Object(entries) = expr else {
            panic!("expected object");
        };
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["active", "text-muted", "open"]);
        assert_eq!(entries[2].1, Expr::Ident("open".into()));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse("a +"), Err(ExprError::Parse { .. })));
        assert!(matches!(parse("(a"), Err(ExprError::Parse { .. })));
        assert!(matches!(parse("a b"), Err(ExprError::Parse { .. })));
        assert!(matches!(parse("{a: 1"), Err(ExprError::Parse { .. })));
    }
}
