//! Lexical analysis for knob expressions, using logos.
//!
//! `===` and `!==` are accepted as spellings of `==` and `!=`.

use logos::Logos;

/// Expression token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `!`
    #[token("!")]
    Bang,
    /// `&&`
    #[token("&&")]
    AndAnd,
    /// `||`
    #[token("||")]
    OrOr,
    /// `==` or `===`
    #[token("==")]
    #[token("===")]
    EqEq,
    /// `!=` or `!==`
    #[token("!=")]
    #[token("!==")]
    BangEq,
    /// `<`
    #[token("<")]
    Lt,
    /// `<=`
    #[token("<=")]
    LtEq,
    /// `>`
    #[token(">")]
    Gt,
    /// `>=`
    #[token(">=")]
    GtEq,
    /// `true`
    #[token("true")]
    True,
    /// `false`
    #[token("false")]
    False,

    /// Integer literal, decimal or `0x` hexadecimal.
    #[regex(r"0[xX][0-9a-fA-F]+", |lex| i64::from_str_radix(&lex.slice()[2..], 16).ok())]
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Integer(i64),

    /// String literal in double or single quotes.
    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| unescape(lex.slice()))]
    Str(String),

    /// Knob name.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

/// Strip the surrounding quotes and resolve backslash escapes.
fn unescape(quoted: &str) -> Option<String> {
    let inner = quoted.get(1..quoted.len().checked_sub(1)?)?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            other => out.push(other),
        }
    }
    Some(out)
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Bang => f.write_str("'!'"),
            Token::AndAnd => f.write_str("'&&'"),
            Token::OrOr => f.write_str("'||'"),
            Token::EqEq => f.write_str("'=='"),
            Token::BangEq => f.write_str("'!='"),
            Token::Lt => f.write_str("'<'"),
            Token::LtEq => f.write_str("'<='"),
            Token::Gt => f.write_str("'>'"),
            Token::GtEq => f.write_str("'>='"),
            Token::True => f.write_str("'true'"),
            Token::False => f.write_str("'false'"),
            Token::Integer(n) => write!(f, "integer {n}"),
            Token::Str(s) => write!(f, "string {s:?}"),
            Token::Ident(name) => write!(f, "identifier '{name}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Token::lexer(source).map(|t| t.unwrap()).collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            lex("! && || == === != !== < <= > >= ( )"),
            vec![
                Token::Bang,
                Token::AndAnd,
                Token::OrOr,
                Token::EqEq,
                Token::EqEq,
                Token::BangEq,
                Token::BangEq,
                Token::Lt,
                Token::LtEq,
                Token::Gt,
                Token::GtEq,
                Token::LParen,
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_keywords_beat_identifiers() {
        assert_eq!(
            lex("true false truth"),
            vec![Token::True, Token::False, Token::Ident("truth".into())]
        );
    }

    #[test]
    fn test_integers() {
        assert_eq!(
            lex("0 42 0x1F 0XfF"),
            vec![
                Token::Integer(0),
                Token::Integer(42),
                Token::Integer(31),
                Token::Integer(255),
            ]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            lex(r#""arm" 'x86' "a\"b""#),
            vec![
                Token::Str("arm".into()),
                Token::Str("x86".into()),
                Token::Str("a\"b".into()),
            ]
        );
    }

    #[test]
    fn test_unrecognized_input_is_error() {
        let tokens: Vec<_> = Token::lexer("A & B").collect();
        assert!(tokens.iter().any(|t| t.is_err()));
        let tokens: Vec<_> = Token::lexer("A; B").collect();
        assert!(tokens.iter().any(|t| t.is_err()));
    }

    #[test]
    fn test_integer_overflow_is_error() {
        let tokens: Vec<_> = Token::lexer("99999999999999999999999").collect();
        assert!(tokens[0].is_err());
    }
}
