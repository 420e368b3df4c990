//! The aesthetic expression language.
//!
//! Grammar (lowest precedence first):
//!
//! ```text
//! expr  := term (('+' | '-') term)*
//! term  := unary (('*' | '/') unary)*
//! unary := '-' unary | power
//! power := atom ('^' unary)?
//! atom  := number | string | call | name | `quoted name` | '(' expr ')'
//! ```
//!
//! Names resolve against data columns first, then against plot variables.

use crate::data::{Column, DataTable, Factor, Value};
use crate::error::{PlotError, Result};
use crate::parser::lexer::{identifier, quoted_identifier, string_literal, unsigned_number, ws};
use indexmap::IndexMap;
use nom::{
    branch::alt,
    character::complete::{char, one_of},
    combinator::{all_consuming, map},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded},
    IResult,
};

/// Named scalar values referenced from expressions (`--define n=2`).
pub type Variables = IndexMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    fn from_char(c: char) -> BinOp {
        match c {
            '+' => BinOp::Add,
            '-' => BinOp::Sub,
            '*' => BinOp::Mul,
            '/' => BinOp::Div,
            _ => BinOp::Pow,
        }
    }

    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
            BinOp::Pow => a.powf(b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Name(String),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

fn fold_binary(first: Expr, rest: Vec<(char, Expr)>) -> Expr {
    rest.into_iter().fold(first, |lhs, (op, rhs)| {
        Expr::Binary(BinOp::from_char(op), Box::new(lhs), Box::new(rhs))
    })
}

/// Parse an expression, stopping at the first token that cannot continue it.
pub fn expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = term(input)?;
    let (input, rest) = many0(pair(ws(one_of("+-")), term))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn term(input: &str) -> IResult<&str, Expr> {
    let (input, first) = unary(input)?;
    let (input, rest) = many0(pair(ws(one_of("*/")), unary))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn unary(input: &str) -> IResult<&str, Expr> {
    alt((
        map(preceded(ws(char('-')), unary), |e| Expr::Neg(Box::new(e))),
        power,
    ))(input)
}

fn power(input: &str) -> IResult<&str, Expr> {
    let (input, base) = atom(input)?;
    match preceded(ws(char('^')), unary)(input) {
        Ok((input, exponent)) => Ok((
            input,
            Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)),
        )),
        Err(nom::Err::Error(_)) => Ok((input, base)),
        Err(e) => Err(e),
    }
}

fn call(input: &str) -> IResult<&str, Expr> {
    let (input, name) = identifier(input)?;
    let (input, args) = delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), expr),
        ws(char(')')),
    )(input)?;
    Ok((input, Expr::Call(name, args)))
}

fn atom(input: &str) -> IResult<&str, Expr> {
    ws(alt((
        map(unsigned_number, Expr::Number),
        map(string_literal, Expr::Str),
        call,
        map(identifier, Expr::Name),
        map(quoted_identifier, Expr::Name),
        delimited(char('('), expr, ws(char(')'))),
    )))(input)
}

/// A parsed expression together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    ast: Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self> {
        match all_consuming(expr)(source) {
            Ok((_, ast)) => Ok(Expression {
                source: source.trim().to_string(),
                ast,
            }),
            Err(e) => Err(PlotError::Expression {
                expr: source.to_string(),
                message: format!("parse error: {:?}", e),
            }),
        }
    }

    pub fn from_ast(source: &str, ast: Expr) -> Self {
        Expression {
            source: source.trim().to_string(),
            ast,
        }
    }

    /// A bare column reference.
    pub fn column(name: &str) -> Self {
        Expression {
            source: name.to_string(),
            ast: Expr::Name(name.to_string()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// The column name when the expression is a bare reference.
    pub fn as_column_name(&self) -> Option<&str> {
        match &self.ast {
            Expr::Name(n) => Some(n),
            _ => None,
        }
    }

    /// Evaluate against every row of `data`.
    pub fn evaluate(&self, data: &DataTable, vars: &Variables) -> Result<Column> {
        self.eval(&self.ast, data, vars)
    }

    fn eval(&self, e: &Expr, data: &DataTable, vars: &Variables) -> Result<Column> {
        let n = data.nrow();
        match e {
            Expr::Number(v) => Ok(Column::Numeric(vec![*v; n])),
            Expr::Str(s) => Ok(Column::Text(vec![s.clone(); n])),
            Expr::Name(name) => data
                .column(name)
                .cloned()
                .or_else(|| vars.get(name).map(|v| Column::repeat(v, n)))
                .ok_or_else(|| PlotError::UnknownColumn {
                    column: name.clone(),
                    expr: self.source.clone(),
                }),
            Expr::Neg(inner) => {
                let v = self.numeric(self.eval(inner, data, vars)?, "unary '-'")?;
                Ok(Column::Numeric(v.into_iter().map(|x| -x).collect()))
            }
            Expr::Binary(op, lhs, rhs) => {
                let a = self.numeric(self.eval(lhs, data, vars)?, "arithmetic")?;
                let b = self.numeric(self.eval(rhs, data, vars)?, "arithmetic")?;
                Ok(Column::Numeric(
                    a.iter().zip(&b).map(|(x, y)| op.apply(*x, *y)).collect(),
                ))
            }
            Expr::Call(func, args) => self.call(func, args, data, vars),
        }
    }

    fn call(&self, func: &str, args: &[Expr], data: &DataTable, vars: &Variables) -> Result<Column> {
        if args.len() != 1 {
            return Err(self.error(format!(
                "{}() takes exactly one argument, got {}",
                func,
                args.len()
            )));
        }
        let arg = self.eval(&args[0], data, vars)?;
        let math: fn(f64) -> f64 = match func {
            "factor" => return Ok(Column::Categorical(Factor::from_column(&arg))),
            "str" => return Ok(Column::Text((0..arg.len()).map(|i| arg.key(i)).collect())),
            "log" => f64::ln,
            "log10" => f64::log10,
            "log2" => f64::log2,
            "sqrt" => f64::sqrt,
            "exp" => f64::exp,
            "abs" => f64::abs,
            "round" => f64::round,
            "floor" => f64::floor,
            "ceil" => f64::ceil,
            other => return Err(self.error(format!("unknown function '{}'", other))),
        };
        let v = self.numeric(arg, func)?;
        Ok(Column::Numeric(v.into_iter().map(math).collect()))
    }

    fn numeric(&self, col: Column, what: &str) -> Result<Vec<f64>> {
        match col {
            Column::Numeric(v) => Ok(v),
            other => {
                let parsed: Option<Vec<f64>> =
                    (0..other.len()).map(|i| other.key(i).parse().ok()).collect();
                parsed.ok_or_else(|| self.error(format!("{} requires numeric operands", what)))
            }
        }
    }

    fn error(&self, message: String) -> PlotError {
        PlotError::Expression {
            expr: self.source.clone(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataTable {
        DataTable::from_columns(vec![
            ("x", Column::Numeric(vec![1.0, 2.0, 3.0])),
            ("z", Column::Numeric(vec![3.0, 1.0, 2.0])),
            ("name", Column::Text(vec!["b".into(), "a".into(), "c".into()])),
        ])
        .unwrap()
    }

    #[test]
    fn test_precedence() {
        let e = Expression::parse("1 + 2 * 3 ^ 2").unwrap();
        let col = e.evaluate(&DataTable::with_rows(1), &Variables::new()).unwrap();
        assert_eq!(col.as_numeric().unwrap(), &[19.0]);
    }

    #[test]
    fn test_unary_minus_and_parens() {
        let e = Expression::parse("-(x - 1) * 2").unwrap();
        let col = e.evaluate(&table(), &Variables::new()).unwrap();
        assert_eq!(col.as_numeric().unwrap(), &[0.0, -2.0, -4.0]);
    }

    #[test]
    fn test_plot_variable() {
        let mut vars = Variables::new();
        vars.insert("n".to_string(), Value::Num(10.0));
        let e = Expression::parse("x+2*n").unwrap();
        let col = e.evaluate(&table(), &vars).unwrap();
        assert_eq!(col.as_numeric().unwrap(), &[21.0, 22.0, 23.0]);
    }

    #[test]
    fn test_unknown_column() {
        let e = Expression::parse("missing + 1").unwrap();
        let err = e.evaluate(&table(), &Variables::new()).unwrap_err();
        assert_eq!(
            err,
            PlotError::UnknownColumn {
                column: "missing".to_string(),
                expr: "missing + 1".to_string()
            }
        );
    }

    #[test]
    fn test_factor_levels_sorted() {
        let e = Expression::parse("factor(z)").unwrap();
        match e.evaluate(&table(), &Variables::new()).unwrap() {
            Column::Categorical(f) => {
                assert_eq!(f.levels(), &["1", "2", "3"]);
                assert_eq!(f.label(0), "3");
            }
            other => panic!("expected factor, got {:?}", other),
        }
    }

    #[test]
    fn test_log10_of_zero_is_non_finite() {
        let t = DataTable::from_columns(vec![("v", Column::Numeric(vec![0.0, 100.0]))]).unwrap();
        let col = Expression::parse("log10(v)")
            .unwrap()
            .evaluate(&t, &Variables::new())
            .unwrap();
        let v = col.as_numeric().unwrap();
        assert!(!v[0].is_finite());
        assert_eq!(v[1], 2.0);
    }

    #[test]
    fn test_arithmetic_on_text_fails() {
        let e = Expression::parse("name * 2").unwrap();
        assert!(matches!(
            e.evaluate(&table(), &Variables::new()),
            Err(PlotError::Expression { .. })
        ));
    }

    #[test]
    fn test_quoted_name() {
        let t = DataTable::from_columns(vec![("unit price", Column::Numeric(vec![2.0]))]).unwrap();
        let col = Expression::parse("`unit price` / 2")
            .unwrap()
            .evaluate(&t, &Variables::new())
            .unwrap();
        assert_eq!(col.as_numeric().unwrap(), &[1.0]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Expression::parse("x +").is_err());
        assert!(Expression::parse("(x").is_err());
        let e = Expression::parse("sqrt(x, z)").unwrap();
        assert!(e.evaluate(&table(), &Variables::new()).is_err());
        let e = Expression::parse("bogus(x)").unwrap();
        assert!(e.evaluate(&table(), &Variables::new()).is_err());
    }

    #[test]
    fn test_as_column_name() {
        assert_eq!(Expression::parse("x").unwrap().as_column_name(), Some("x"));
        assert_eq!(Expression::parse("x + 1").unwrap().as_column_name(), None);
    }
}
