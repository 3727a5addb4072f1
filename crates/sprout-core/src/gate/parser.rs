//! Lexer and recursive-descent parser for the gate-expression DSL.
//!
//! Grammar (lowest precedence first):
//!
//! ```text
//! expr    := and ("||" and)*
//! and     := cmp ("&&" cmp)*
//! cmp     := sum ((">" | ">=" | "<" | "<=" | "==" | "!=") sum)?
//! sum     := term (("+" | "-") term)*
//! term    := unary (("*" | "/") unary)*
//! unary   := "-" unary | atom
//! atom    := NUMBER | fact | "(" expr ")"
//! fact    := "age" "(" ")"
//!          | "level" "(" STRING ")"
//!          | "confidence" "(" STRING ")"
//! ```
//!
//! Anything outside this grammar is a parse error; the caller treats parse
//! errors as a failed (false) gate. Input size is bounded: expressions
//! longer than [`MAX_TOKENS`] tokens or nested deeper than [`MAX_NESTING`]
//! levels are rejected up front, so neither parsing nor later AST
//! evaluation can exhaust the stack on adversarial input.

use thiserror::Error;

use super::ast::{ArithOp, CompareOp, Expr};

/// Upper bound on tokens per expression. Real gate expressions run a few
/// dozen tokens; anything past this is not an authored gate.
pub const MAX_TOKENS: usize = 256;

/// Upper bound on grouping depth (parentheses and unary-minus chains).
pub const MAX_NESTING: usize = 64;

/// Why an expression failed to parse.
#[derive(Debug, Error, PartialEq)]
pub enum ExprParseError {
    #[error("unexpected character '{ch}' at position {at}")]
    UnexpectedChar { ch: char, at: usize },

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("malformed number '{0}'")]
    MalformedNumber(String),

    #[error("unknown function '{0}' (expected level, confidence, or age)")]
    UnknownFunction(String),

    #[error("unexpected token {0}")]
    UnexpectedToken(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("trailing input after expression: {0}")]
    TrailingInput(String),

    #[error("expression too long ({0} tokens)")]
    TooLong(usize),

    #[error("expression nesting limit exceeded")]
    NestingTooDeep,
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Str(String),
    LParen,
    RParen,
    Plus,
    Minus,
    Star,
    Slash,
    Gt,
    Ge,
    Lt,
    Le,
    EqEq,
    Ne,
    AndAnd,
    OrOr,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {n}"),
            Token::Ident(s) => format!("identifier '{s}'"),
            Token::Str(s) => format!("string '{s}'"),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
            Token::Plus => "'+'".into(),
            Token::Minus => "'-'".into(),
            Token::Star => "'*'".into(),
            Token::Slash => "'/'".into(),
            Token::Gt => "'>'".into(),
            Token::Ge => "'>='".into(),
            Token::Lt => "'<'".into(),
            Token::Le => "'<='".into(),
            Token::EqEq => "'=='".into(),
            Token::Ne => "'!='".into(),
            Token::AndAnd => "'&&'".into(),
            Token::OrOr => "'||'".into(),
        }
    }
}

fn lex(input: &str) -> Result<Vec<Token>, ExprParseError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0usize;

    while i < chars.len() {
        let ch = chars[i];
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
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Ge);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Le);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::EqEq);
                    i += 2;
                } else {
                    return Err(ExprParseError::UnexpectedChar { ch, at: i });
                }
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Ne);
                    i += 2;
                } else {
                    return Err(ExprParseError::UnexpectedChar { ch, at: i });
                }
            }
            '&' => {
                if chars.get(i + 1) == Some(&'&') {
                    tokens.push(Token::AndAnd);
                    i += 2;
                } else {
                    return Err(ExprParseError::UnexpectedChar { ch, at: i });
                }
            }
            '|' => {
                if chars.get(i + 1) == Some(&'|') {
                    tokens.push(Token::OrOr);
                    i += 2;
                } else {
                    return Err(ExprParseError::UnexpectedChar { ch, at: i });
                }
            }
            '\'' | '"' => {
                let quote = ch;
                let start = i + 1;
                let mut j = start;
                while j < chars.len() && chars[j] != quote {
                    j += 1;
                }
                if j >= chars.len() {
                    return Err(ExprParseError::UnterminatedString);
                }
                tokens.push(Token::Str(chars[start..j].iter().collect()));
                i = j + 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| ExprParseError::MalformedNumber(text.clone()))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            _ => return Err(ExprParseError::UnexpectedChar { ch, at: i }),
        }
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, want: Token) -> Result<(), ExprParseError> {
        match self.next() {
            Some(t) if t == want => Ok(()),
            Some(t) => Err(ExprParseError::UnexpectedToken(t.describe())),
            None => Err(ExprParseError::UnexpectedEnd),
        }
    }

    /// Guarded entry for every (sub)expression: grouping recursion past
    /// [`MAX_NESTING`] is a parse error, not a stack overflow.
    fn expr(&mut self) -> Result<Expr, ExprParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ExprParseError::NestingTooDeep);
        }
        self.depth += 1;
        let result = self.or();
        self.depth -= 1;
        result
    }

    fn or(&mut self) -> Result<Expr, ExprParseError> {
        let mut lhs = self.and()?;
        while self.peek() == Some(&Token::OrOr) {
            self.next();
            let rhs = self.and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, ExprParseError> {
        let mut lhs = self.cmp()?;
        while self.peek() == Some(&Token::AndAnd) {
            self.next();
            let rhs = self.cmp()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn cmp(&mut self) -> Result<Expr, ExprParseError> {
        let lhs = self.sum()?;
        let op = match self.peek() {
            Some(Token::Gt) => CompareOp::Gt,
            Some(Token::Ge) => CompareOp::Ge,
            Some(Token::Lt) => CompareOp::Lt,
            Some(Token::Le) => CompareOp::Le,
            Some(Token::EqEq) => CompareOp::Eq,
            Some(Token::Ne) => CompareOp::Ne,
            _ => return Ok(lhs),
        };
        self.next();
        let rhs = self.sum()?;
        Ok(Expr::Compare {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn sum(&mut self) -> Result<Expr, ExprParseError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => ArithOp::Add,
                Some(Token::Minus) => ArithOp::Sub,
                _ => return Ok(lhs),
            };
            self.next();
            let rhs = self.term()?;
            lhs = Expr::Arith {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn term(&mut self) -> Result<Expr, ExprParseError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => ArithOp::Mul,
                Some(Token::Slash) => ArithOp::Div,
                _ => return Ok(lhs),
            };
            self.next();
            let rhs = self.unary()?;
            lhs = Expr::Arith {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn unary(&mut self) -> Result<Expr, ExprParseError> {
        let mut negations = 0usize;
        while self.peek() == Some(&Token::Minus) {
            self.next();
            negations += 1;
            if negations > MAX_NESTING {
                return Err(ExprParseError::NestingTooDeep);
            }
        }
        let mut expr = self.atom()?;
        for _ in 0..negations {
            expr = Expr::Neg(Box::new(expr));
        }
        Ok(expr)
    }

    fn atom(&mut self) -> Result<Expr, ExprParseError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => self.fact_call(name),
            Some(t) => Err(ExprParseError::UnexpectedToken(t.describe())),
            None => Err(ExprParseError::UnexpectedEnd),
        }
    }

    /// `age()` takes no argument; `level` and `confidence` take exactly one
    /// quoted node id. Any other identifier is rejected.
    fn fact_call(&mut self, name: String) -> Result<Expr, ExprParseError> {
        match name.as_str() {
            "age" => {
                self.expect(Token::LParen)?;
                self.expect(Token::RParen)?;
                Ok(Expr::Age)
            }
            "level" | "confidence" => {
                self.expect(Token::LParen)?;
                let id = match self.next() {
                    Some(Token::Str(id)) => id,
                    Some(t) => return Err(ExprParseError::UnexpectedToken(t.describe())),
                    None => return Err(ExprParseError::UnexpectedEnd),
                };
                self.expect(Token::RParen)?;
                if name == "level" {
                    Ok(Expr::Level(id))
                } else {
                    Ok(Expr::Confidence(id))
                }
            }
            _ => Err(ExprParseError::UnknownFunction(name)),
        }
    }
}

/// Parse an expression string into an AST.
pub fn parse(input: &str) -> Result<Expr, ExprParseError> {
    let tokens = lex(input)?;
    if tokens.len() > MAX_TOKENS {
        return Err(ExprParseError::TooLong(tokens.len()));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(t) => Err(ExprParseError::TrailingInput(t.describe())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_plain_comparison() {
        let expr = parse("2 >= 1").unwrap();
        assert_eq!(
            expr,
            Expr::Compare {
                op: CompareOp::Ge,
                lhs: Box::new(Expr::Number(2.0)),
                rhs: Box::new(Expr::Number(1.0)),
            }
        );
    }

    #[test]
    fn test_parses_fact_calls() {
        assert_eq!(parse("age()").unwrap(), Expr::Age);
        assert_eq!(
            parse("level('GM-CRAWL-01')").unwrap(),
            Expr::Level("GM-CRAWL-01".into())
        );
        assert_eq!(
            parse("confidence(\"FM-RAKE-01\")").unwrap(),
            Expr::Confidence("FM-RAKE-01".into())
        );
    }

    #[test]
    fn test_precedence_and_over_or() {
        // a || b && c parses as a || (b && c)
        let expr = parse("1 || 0 && 0").unwrap();
        assert!(matches!(expr, Expr::Or(_, _)));
    }

    #[test]
    fn test_precedence_arithmetic_before_comparison() {
        // 1 + 2 * 3 > 6 parses the arithmetic fully on the left
        let expr = parse("1 + 2 * 3 > 6").unwrap();
        match expr {
            Expr::Compare { op: CompareOp::Gt, lhs, .. } => {
                assert!(matches!(*lhs, Expr::Arith { op: ArithOp::Add, .. }))
            }
            other => panic!("expected comparison, got {other:?}"),
        }
    }

    #[test]
    fn test_parenthesized_subexpression() {
        let expr = parse("(age() - 12) / 2 >= 1").unwrap();
        assert!(matches!(expr, Expr::Compare { .. }));
    }

    #[test]
    fn test_unary_minus() {
        let expr = parse("-3 < 0").unwrap();
        assert!(matches!(expr, Expr::Compare { .. }));
    }

    #[test]
    fn test_rejects_statement_injection() {
        assert!(parse("level('X'); doEvil()").is_err());
    }

    #[test]
    fn test_rejects_unknown_function() {
        let err = parse("rm('-rf')").unwrap_err();
        assert!(matches!(err, ExprParseError::UnknownFunction(_)));
    }

    #[test]
    fn test_rejects_unterminated_string() {
        assert_eq!(parse("level('X"), Err(ExprParseError::UnterminatedString));
    }

    #[test]
    fn test_rejects_single_equals() {
        assert!(parse("age() = 12").is_err());
    }

    #[test]
    fn test_rejects_trailing_garbage() {
        assert!(matches!(
            parse("1 > 0 1"),
            Err(ExprParseError::TrailingInput(_))
        ));
    }

    #[test]
    fn test_rejects_empty_input() {
        assert_eq!(parse(""), Err(ExprParseError::UnexpectedEnd));
        assert_eq!(parse("   "), Err(ExprParseError::UnexpectedEnd));
    }

    #[test]
    fn test_rejects_bare_identifier() {
        assert!(parse("level").is_err());
    }

    #[test]
    fn test_rejects_deep_paren_nesting() {
        // Under the token cap but past the nesting bound.
        let deep = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(parse(&deep), Err(ExprParseError::NestingTooDeep));
    }

    #[test]
    fn test_rejects_long_negation_chain() {
        let negs = format!("{}1", "-".repeat(100));
        assert_eq!(parse(&negs), Err(ExprParseError::NestingTooDeep));
    }

    #[test]
    fn test_rejects_oversized_input() {
        let chain = format!("1{}", " + 1".repeat(MAX_TOKENS));
        assert!(matches!(parse(&chain), Err(ExprParseError::TooLong(_))));
    }

    #[test]
    fn test_nesting_within_bounds_still_parses() {
        let nested = format!("{}age(){}", "(".repeat(20), ")".repeat(20));
        assert_eq!(parse(&nested), Ok(Expr::Age));
    }

    #[test]
    fn test_malformed_number() {
        assert!(matches!(
            parse("1.2.3 > 0"),
            Err(ExprParseError::MalformedNumber(_))
        ));
    }
}
