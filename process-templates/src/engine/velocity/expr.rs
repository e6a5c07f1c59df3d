//! Directive expressions: the `(...)` argument of `#if`, `#elseif` and `#set`.

use std::cmp::Ordering;

use logos::Logos;

use crate::context::Value;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum Token {
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unquote(lex.slice()))]
    #[regex(r"'([^'\\]|\\.)*'", |lex| unquote(lex.slice()))]
    Str(String),

    #[token("true")]
    True,
    #[token("false")]
    False,

    #[regex(r"\$!?[A-Za-z_][A-Za-z0-9_]*", |lex| ref_name(lex.slice()))]
    #[regex(r"\$!?\{[A-Za-z_][A-Za-z0-9_]*\}", |lex| ref_name(lex.slice()))]
    Ref(String),

    #[token("==")]
    #[token("eq")]
    Eq,
    #[token("!=")]
    #[token("ne")]
    Ne,
    #[token("<")]
    #[token("lt")]
    Lt,
    #[token("<=")]
    #[token("le")]
    Le,
    #[token(">")]
    #[token("gt")]
    Gt,
    #[token(">=")]
    #[token("ge")]
    Ge,
    #[token("&&")]
    #[token("and")]
    And,
    #[token("||")]
    #[token("or")]
    Or,
    #[token("!")]
    #[token("not")]
    Not,
    #[token("-")]
    Minus,
    #[token("=")]
    Assign,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
}

fn unquote(literal: &str) -> Option<String> {
    let inner = &literal[1..literal.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.extend(chars.next());
        } else {
            out.push(c);
        }
    }
    Some(out)
}

fn ref_name(slice: &str) -> Option<String> {
    let name = slice
        .trim_start_matches('$')
        .trim_start_matches('!')
        .trim_start_matches('{')
        .trim_end_matches('}');
    Some(name.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Lit(Value),
    Ref(String),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

/// Parse the argument of `#if` / `#elseif`.
pub(crate) fn parse_condition(src: &str) -> Result<Expr, String> {
    let mut parser = Parser::new(src)?;
    if parser.tokens.is_empty() {
        return Err("empty condition".to_string());
    }
    let expr = parser.or()?;
    parser.finish()?;
    Ok(expr)
}

/// Parse the argument of `#set`: `$name = expr`.
pub(crate) fn parse_assignment(src: &str) -> Result<(String, Expr), String> {
    let mut parser = Parser::new(src)?;
    let Some(Token::Ref(name)) = parser.next() else {
        return Err("#set must start with a $reference".to_string());
    };
    if parser.next() != Some(Token::Assign) {
        return Err(format!("expected `=` after ${name} in #set"));
    }
    let value = parser.or()?;
    parser.finish()?;
    Ok((name, value))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(src: &str) -> Result<Self, String> {
        let mut lex = Token::lexer(src);
        let mut tokens = Vec::new();
        while let Some(tok) = lex.next() {
            match tok {
                Ok(t) => tokens.push(t),
                Err(()) => return Err(format!("unexpected `{}` in expression", lex.slice())),
            }
        }
        Ok(Self { tokens, pos: 0 })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn finish(&self) -> Result<(), String> {
        match self.peek() {
            None => Ok(()),
            Some(tok) => Err(format!("unexpected {tok:?} after expression")),
        }
    }

    /// Parse a left-associative chain of `ops` over `operand`.
    fn chain(
        &mut self,
        ops: &[(Token, BinOp)],
        operand: fn(&mut Self) -> Result<Expr, String>,
    ) -> Result<Expr, String> {
        let mut lhs = operand(self)?;
        while let Some(op) = self
            .peek()
            .and_then(|t| ops.iter().find(|(tok, _)| tok == t))
            .map(|(_, op)| *op)
        {
            self.pos += 1;
            let rhs = operand(self)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn or(&mut self) -> Result<Expr, String> {
        self.chain(&[(Token::Or, BinOp::Or)], Self::and)
    }

    fn and(&mut self) -> Result<Expr, String> {
        self.chain(&[(Token::And, BinOp::And)], Self::equality)
    }

    fn equality(&mut self) -> Result<Expr, String> {
        self.chain(
            &[(Token::Eq, BinOp::Eq), (Token::Ne, BinOp::Ne)],
            Self::relational,
        )
    }

    fn relational(&mut self) -> Result<Expr, String> {
        self.chain(
            &[
                (Token::Lt, BinOp::Lt),
                (Token::Le, BinOp::Le),
                (Token::Gt, BinOp::Gt),
                (Token::Ge, BinOp::Ge),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> Result<Expr, String> {
        match self.peek() {
            Some(Token::Not) => {
                self.pos += 1;
                Ok(Expr::Not(Box::new(self.unary()?)))
            }
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, String> {
        match self.next() {
            Some(Token::Int(v)) => Ok(Expr::Lit(Value::Int(v))),
            Some(Token::Str(s)) => Ok(Expr::Lit(Value::Str(s))),
            Some(Token::True) => Ok(Expr::Lit(Value::Bool(true))),
            Some(Token::False) => Ok(Expr::Lit(Value::Bool(false))),
            Some(Token::Ref(name)) => Ok(Expr::Ref(name)),
            Some(Token::LParen) => {
                let inner = self.or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err("missing `)`".to_string()),
                }
            }
            Some(tok) => Err(format!("unexpected {tok:?}")),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

/// Null (an undefined reference) is false; so is `false`. Everything else is true.
pub(crate) fn truthy(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Bool(false)))
}

/// Evaluate `expr`; `Ok(None)` is null.
pub(crate) fn eval<F>(expr: &Expr, lookup: &F) -> Result<Option<Value>, String>
where
    F: Fn(&str) -> Option<Value>,
{
    match expr {
        Expr::Lit(v) => Ok(Some(v.clone())),
        Expr::Ref(name) => Ok(lookup(name)),
        Expr::Not(inner) => Ok(Some(Value::Bool(!truthy(eval(inner, lookup)?.as_ref())))),
        Expr::Neg(inner) => match eval(inner, lookup)? {
            Some(Value::Int(v)) => v
                .checked_neg()
                .map(|n| Some(Value::Int(n)))
                .ok_or_else(|| format!("cannot negate {v}")),
            other => Err(format!("cannot negate {}", describe(other.as_ref()))),
        },
        Expr::Binary(BinOp::And, lhs, rhs) => {
            let result = truthy(eval(lhs, lookup)?.as_ref()) && truthy(eval(rhs, lookup)?.as_ref());
            Ok(Some(Value::Bool(result)))
        }
        Expr::Binary(BinOp::Or, lhs, rhs) => {
            let result = truthy(eval(lhs, lookup)?.as_ref()) || truthy(eval(rhs, lookup)?.as_ref());
            Ok(Some(Value::Bool(result)))
        }
        Expr::Binary(op, lhs, rhs) => {
            let lhs = eval(lhs, lookup)?;
            let rhs = eval(rhs, lookup)?;
            let result = match op {
                BinOp::Eq => equals(lhs.as_ref(), rhs.as_ref()),
                BinOp::Ne => !equals(lhs.as_ref(), rhs.as_ref()),
                _ => {
                    let ord = compare(lhs.as_ref(), rhs.as_ref())?;
                    match op {
                        BinOp::Lt => ord == Ordering::Less,
                        BinOp::Le => ord != Ordering::Greater,
                        BinOp::Gt => ord == Ordering::Greater,
                        _ => ord != Ordering::Less,
                    }
                }
            };
            Ok(Some(Value::Bool(result)))
        }
    }
}

/// Values of different types compare by their rendered text.
fn equals(lhs: Option<&Value>, rhs: Option<&Value>) -> bool {
    match (lhs, rhs) {
        (None, None) => true,
        (Some(a), Some(b)) if std::mem::discriminant(a) == std::mem::discriminant(b) => a == b,
        (Some(a), Some(b)) => a.to_string() == b.to_string(),
        _ => false,
    }
}

fn compare(lhs: Option<&Value>, rhs: Option<&Value>) -> Result<Ordering, String> {
    match (lhs, rhs) {
        (Some(Value::Int(a)), Some(Value::Int(b))) => Ok(a.cmp(b)),
        (a, b) => Err(format!(
            "cannot order {} and {}",
            describe(a),
            describe(b)
        )),
    }
}

fn describe(value: Option<&Value>) -> String {
    match value {
        None => "null".to_string(),
        Some(Value::Int(v)) => format!("integer {v}"),
        Some(Value::Str(s)) => format!("string \"{s}\""),
        Some(Value::Bool(b)) => format!("boolean {b}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_with_level(src: &str, level: i64) -> Result<Option<Value>, String> {
        let expr = parse_condition(src)?;
        eval(&expr, &|name: &str| match name {
            "apiLevel" => Some(Value::Int(level)),
            "ptrClass" => Some(Value::Str("long".to_string())),
            _ => None,
        })
    }

    fn holds(src: &str, level: i64) -> bool {
        truthy(eval_with_level(src, level).unwrap().as_ref())
    }

    #[test]
    fn relational_operators() {
        assert!(holds("$apiLevel >= 21", 21));
        assert!(!holds("$apiLevel >= 21", 20));
        assert!(holds("$apiLevel gt 20", 21));
        assert!(holds("$apiLevel < 21", 19));
        assert!(holds("${apiLevel} <= -1 || $apiLevel == 19", 19));
    }

    #[test]
    fn precedence_and_grouping() {
        assert!(holds("$apiLevel > 18 && $apiLevel < 21 || false", 19));
        assert!(!holds("!($apiLevel > 18 && $apiLevel < 21)", 19));
        assert!(holds("not $missing", 19));
        assert!(holds("$apiLevel > 18 and $ptrClass == 'long'", 19));
    }

    #[test]
    fn null_semantics() {
        assert!(!holds("$missing", 21));
        assert!(holds("$missing == $alsoMissing", 21));
        assert!(holds("$missing != 1", 21));
        let err = eval_with_level("$missing > 1", 21).unwrap_err();
        assert!(err.contains("null"), "{err}");
    }

    #[test]
    fn mixed_types_compare_as_text() {
        assert!(holds("$apiLevel == \"21\"", 21));
        assert!(eval_with_level("$ptrClass < 3", 21).is_err());
    }

    #[test]
    fn syntax_errors() {
        assert!(parse_condition("").is_err());
        assert!(parse_condition("($apiLevel > 1").is_err());
        assert!(parse_condition("$apiLevel >").is_err());
        assert!(parse_condition("$apiLevel 1").is_err());
        assert!(parse_condition("$apiLevel ? 1").is_err());
    }

    #[test]
    fn assignment() {
        let (name, value) = parse_assignment("$handle = \"long\"").unwrap();
        assert_eq!(name, "handle");
        assert_eq!(value, Expr::Lit(Value::Str("long".to_string())));
        assert!(parse_assignment("handle = 1").is_err());
        assert!(parse_assignment("$handle 1").is_err());
    }

    #[test]
    fn string_escapes() {
        assert_eq!(unquote(r#""a\"b""#).as_deref(), Some("a\"b"));
        assert_eq!(unquote(r"'it\'s'").as_deref(), Some("it's"));
    }
}
