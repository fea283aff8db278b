use super::{ExprError, Result};
use accelade_types::Span;
use logos::Logos;

/// Tokens of the binding expression language
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // Keywords
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("typeof")]
    Typeof,

    // Identifiers and literals
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice().to_string())]
    Identifier(String),

    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(Option<f64>),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| unescape(lex.slice()))]
    StringLiteral(String),

    // Operators
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
    #[token("===")]
    StrictEq,
    #[token("!==")]
    StrictNe,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("??")]
    Coalesce,
    #[token("!")]
    Bang,
    #[token("?")]
    Question,
    #[token("?.")]
    OptionalDot,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // Punctuation
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,

    // End of input
    Eof,
}

/// Strip the quotes and resolve escapes of a string literal
fn unescape(literal: &str) -> String {
    let body = &literal[1..literal.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// A token with its source span
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

impl SpannedToken {
    pub fn new(token: Token, span: Span) -> Self {
        Self { token, span }
    }
}

/// Tokenize an expression, appending a trailing [`Token::Eof`]
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>> {
    let mut lex = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(token_result) = lex.next() {
        let span = Span::new(lex.span().start, lex.span().end);
        match token_result {
            Ok(Token::Number(None)) => {
                return Err(ExprError::Lex {
                    span,
                    message: format!("Invalid number: {}", &source[span.start..span.end]),
                });
            }
            Ok(token) => tokens.push(SpannedToken::new(token, span)),
            Err(_) => {
                return Err(ExprError::Lex {
                    span,
                    message: format!("Invalid token: {}", &source[span.start..span.end]),
                });
            }
        }
    }

    tokens.push(SpannedToken::new(
        Token::Eof,
        Span::new(source.len(), source.len()),
    ));
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_operators_prefer_longest_match() {
        assert_eq!(
            kinds("a === b ?? c?.d"),
            vec![
                Token::Identifier("a".into()),
                Token::StrictEq,
                Token::Identifier("b".into()),
                Token::Coalesce,
                Token::Identifier("c".into()),
                Token::OptionalDot,
                Token::Identifier("d".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            kinds(r#"1.5 .5 2e3 'it\'s' "a\nb" true null"#),
            vec![
                Token::Number(Some(1.5)),
                Token::Number(Some(0.5)),
                Token::Number(Some(2000.0)),
                Token::StringLiteral("it's".into()),
                Token::StringLiteral("a\nb".into()),
                Token::True,
                Token::Null,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_identifiers_with_dollar() {
        assert_eq!(
            kinds("$event.target"),
            vec![
                Token::Identifier("$event".into()),
                Token::Dot,
                Token::Identifier("target".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_invalid_token() {
        let err = tokenize("a # b").unwrap_err();
        assert!(matches!(err, ExprError::Lex { span, .. } if span.start == 2));
    }
}
