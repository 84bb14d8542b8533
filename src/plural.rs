//! Compiler for the C-like plural selection expressions carried by the
//! `Plural-Forms` header of PO catalogs.
//!
//! The grammar is the small C subset described in the gettext manual
//! (<https://www.gnu.org/software/gettext/manual/gettext.html#Plural-forms>);
//! the one incompatible difference is that integer literals starting with
//! zero are still decimal. Expressions compile to a typed tree which is
//! evaluated directly against a cardinal.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{PluralError, PluralResult};

/// Inputs longer than this are rejected before tokenization.
const MAX_EXPRESSION_LEN: usize = 1000;
/// Compiled trees nested deeper than this are rejected.
/// The most complex real-world rule nests a handful of levels.
const MAX_DEPTH: usize = 20;

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // Ordered alternation: operators before the catch-all. Only `n` is
    // allowed as an identifier; unary and bitwise C operators are not.
    Regex::new(
        r"(?s)(?P<ws>[ \t]+)|(?P<num>[0-9]+\b)|(?P<name>n\b)|(?P<paren>[()])|(?P<op>[-*/%+?:]|[><!]=?|==|&&|\|\|)|(?P<invalid>\w+|.)",
    )
    .expect("plural token pattern")
});

static PLURAL_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"plural=([^;\r\n]+)").expect("plural clause pattern"));

static NPLURALS_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"nplurals=([0-9]+)").expect("nplurals clause pattern"));

/// Binary operators, C spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Precedence tier and operator for a binary operator token.
fn binary_op(token: &str) -> Option<(u8, BinOp)> {
    match token {
        "||" => Some((1, BinOp::Or)),
        "&&" => Some((2, BinOp::And)),
        "==" => Some((3, BinOp::Eq)),
        "!=" => Some((3, BinOp::Ne)),
        "<" => Some((4, BinOp::Lt)),
        ">" => Some((4, BinOp::Gt)),
        "<=" => Some((4, BinOp::Le)),
        ">=" => Some((4, BinOp::Ge)),
        "+" => Some((5, BinOp::Add)),
        "-" => Some((5, BinOp::Sub)),
        "*" => Some((6, BinOp::Mul)),
        "/" => Some((6, BinOp::Div)),
        "%" => Some((6, BinOp::Mod)),
        _ => None,
    }
}

/// A compiled plural selection expression.
///
/// Chained same-tier comparisons group structurally through the
/// left-associative parse, so `a < b < c` is the tree `(a < b) < c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(i64),
    /// The cardinal variable `n`
    Var,
    Not(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Evaluate against a cardinal, yielding the zero-based form index.
    ///
    /// A negative expression result maps to an index that never matches a
    /// stored form, so the caller resolves it to the empty string.
    pub fn evaluate(&self, n: u64) -> usize {
        usize::try_from(self.eval(n as i64)).unwrap_or(usize::MAX)
    }

    /// Evaluate against a non-integral cardinal, rounding it to the
    /// nearest integer first. Fails only when the value is not numeric
    /// at all.
    pub fn evaluate_lossy(&self, n: f64) -> PluralResult<usize> {
        if !n.is_finite() {
            return Err(PluralError::NotANumber(n.to_string()));
        }
        Ok(usize::try_from(self.eval(n.round() as i64)).unwrap_or(usize::MAX))
    }

    /// C semantics: comparisons and logical operators yield 0/1, `&&` and
    /// `||` short-circuit, `/` truncates, division or remainder by zero
    /// yields 0 the way libintl's evaluator does.
    fn eval(&self, n: i64) -> i64 {
        match self {
            Expr::Literal(value) => *value,
            Expr::Var => n,
            Expr::Not(inner) => (inner.eval(n) == 0) as i64,
            Expr::Binary(op, left, right) => match op {
                BinOp::Or => {
                    if left.eval(n) != 0 {
                        1
                    } else {
                        (right.eval(n) != 0) as i64
                    }
                }
                BinOp::And => {
                    if left.eval(n) == 0 {
                        0
                    } else {
                        (right.eval(n) != 0) as i64
                    }
                }
                BinOp::Eq => (left.eval(n) == right.eval(n)) as i64,
                BinOp::Ne => (left.eval(n) != right.eval(n)) as i64,
                BinOp::Lt => (left.eval(n) < right.eval(n)) as i64,
                BinOp::Gt => (left.eval(n) > right.eval(n)) as i64,
                BinOp::Le => (left.eval(n) <= right.eval(n)) as i64,
                BinOp::Ge => (left.eval(n) >= right.eval(n)) as i64,
                BinOp::Add => left.eval(n).wrapping_add(right.eval(n)),
                BinOp::Sub => left.eval(n).wrapping_sub(right.eval(n)),
                BinOp::Mul => left.eval(n).wrapping_mul(right.eval(n)),
                BinOp::Div => {
                    let divisor = right.eval(n);
                    if divisor == 0 {
                        0
                    } else {
                        left.eval(n).wrapping_div(divisor)
                    }
                }
                BinOp::Mod => {
                    let divisor = right.eval(n);
                    if divisor == 0 {
                        0
                    } else {
                        left.eval(n).wrapping_rem(divisor)
                    }
                }
            },
            Expr::Ternary(cond, if_true, if_false) => {
                if cond.eval(n) != 0 {
                    if_true.eval(n)
                } else {
                    if_false.eval(n)
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            Expr::Literal(_) | Expr::Var => 0,
            Expr::Not(inner) => 1 + inner.depth(),
            Expr::Binary(_, left, right) => 1 + left.depth().max(right.depth()),
            Expr::Ternary(cond, if_true, if_false) => {
                1 + cond.depth().max(if_true.depth()).max(if_false.depth())
            }
        }
    }
}

/// Token cursor; the empty string is the end-of-input sentinel.
struct Tokens {
    iter: std::vec::IntoIter<String>,
}

impl Tokens {
    fn next(&mut self) -> String {
        self.iter.next().unwrap_or_default()
    }
}

fn tokenize(expr: &str) -> PluralResult<Vec<String>> {
    let mut tokens = Vec::new();
    for caps in TOKEN_PATTERN.captures_iter(expr) {
        if caps.name("ws").is_some() {
            continue;
        }
        if let Some(m) = caps.name("invalid") {
            return Err(PluralError::InvalidToken(m.as_str().to_string()));
        }
        if let Some(m) = caps.get(0) {
            tokens.push(m.as_str().to_string());
        }
    }
    Ok(tokens)
}

fn unexpected(token: &str) -> PluralError {
    if token.is_empty() {
        PluralError::UnexpectedEndOfExpression
    } else {
        PluralError::UnexpectedToken(token.to_string())
    }
}

fn apply_negations(mut expr: Expr, negations: &mut usize) -> Expr {
    for _ in 0..*negations {
        expr = Expr::Not(Box::new(expr));
    }
    *negations = 0;
    expr
}

/// Precedence-climbing parse of one (sub)expression.
///
/// Returns the parsed tree plus the first token past it. `priority` is the
/// lowest operator tier this level may fold; -1 accepts everything and 0
/// additionally admits a ternary.
fn parse(tokens: &mut Tokens, priority: i8) -> PluralResult<(Expr, String)> {
    let mut nexttok = tokens.next();
    let mut negations = 0usize;
    while nexttok == "!" {
        negations += 1;
        nexttok = tokens.next();
    }

    let mut result = if nexttok == "(" {
        let (sub, tok) = parse(tokens, -1)?;
        if tok != ")" {
            return Err(PluralError::UnbalancedParenthesis);
        }
        sub
    } else if nexttok == "n" {
        Expr::Var
    } else {
        match nexttok.parse::<i64>() {
            Ok(value) => Expr::Literal(value),
            Err(_) => return Err(unexpected(&nexttok)),
        }
    };
    nexttok = tokens.next();

    while let Some((tier, op)) = binary_op(&nexttok) {
        if (tier as i8) < priority {
            break;
        }
        // `!` binds looser than comparisons and arithmetic but tighter
        // than the logical connectives.
        if tier <= 2 {
            result = apply_negations(result, &mut negations);
        }
        let (right, tok) = parse(tokens, tier as i8 + 1)?;
        result = Expr::Binary(op, Box::new(result), Box::new(right));
        nexttok = tok;
    }
    result = apply_negations(result, &mut negations);

    // Ternary only at the outermost level, right-associative.
    if nexttok == "?" && priority <= 0 {
        let (if_true, tok) = parse(tokens, 0)?;
        if tok != ":" {
            return Err(unexpected(&tok));
        }
        let (if_false, tok) = parse(tokens, -1)?;
        result = Expr::Ternary(Box::new(result), Box::new(if_true), Box::new(if_false));
        nexttok = tok;
    }

    Ok((result, nexttok))
}

/// Compile a plural selection expression to its evaluator tree.
pub fn compile(expr: &str) -> PluralResult<Expr> {
    if expr.len() > MAX_EXPRESSION_LEN {
        return Err(PluralError::ExpressionTooLong(expr.len()));
    }
    let mut tokens = Tokens {
        iter: tokenize(expr)?.into_iter(),
    };
    let (result, trailing) = parse(&mut tokens, -1)?;
    if !trailing.is_empty() {
        return Err(PluralError::UnexpectedToken(trailing));
    }
    if result.depth() > MAX_DEPTH {
        return Err(PluralError::TooComplex);
    }
    Ok(result)
}

/// A compiled plural rule: form count plus selection expression, as read
/// from a `Plural-Forms` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluralRule {
    nplurals: usize,
    expr: Expr,
}

impl PluralRule {
    /// Compile the rule from the value of a `Plural-Forms` header, e.g.
    /// `nplurals=2; plural=(n != 1);`. A missing `plural=` clause is an
    /// error; a missing `nplurals=` clause defaults to two forms.
    pub fn from_header(header: &str) -> PluralResult<PluralRule> {
        let expr_src = PLURAL_CLAUSE
            .captures(header)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .ok_or(PluralError::MalformedPluralFormsHeader)?;
        let nplurals = NPLURALS_CLAUSE
            .captures(header)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(2);
        Ok(PluralRule {
            nplurals,
            expr: compile(expr_src)?,
        })
    }

    /// Number of plural forms the header declares.
    pub fn nplurals(&self) -> usize {
        self.nplurals
    }

    /// Zero-based form index for a cardinal.
    pub fn evaluate(&self, n: u64) -> usize {
        self.expr.evaluate(n)
    }

    /// Form index for a non-integral cardinal, rounded to the nearest
    /// integer; fails when the value is not numeric at all.
    pub fn evaluate_lossy(&self, n: f64) -> PluralResult<usize> {
        self.expr.evaluate_lossy(n)
    }
}
