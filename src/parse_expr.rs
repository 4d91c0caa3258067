//! Restricted grammar for linear expressions and constraints.
//!
//! ```text
//! expression := signed_term (('+' | '-') signed_term)*
//! signed_term := ('+' | '-')? term
//! term       := literal '*'? name | name | literal
//! literal    := digits ('.' digits?)? exponent? | '.' digits exponent?
//! name       := [A-Za-z_][A-Za-z0-9_]*
//! ```
//!
//! Whitespace between tokens is ignored. Nothing outside this grammar is
//! accepted: no parentheses, products of names, or function calls. The whole
//! text is checked for syntax before any name is looked up in the model.
//! Literals must be finite, so `1e400` is a syntax error rather than infinity.
//!
//! A literal takes the longest match, exponent included. `2e1` is therefore
//! the constant 20 even when a variable `e1` exists; write `2*e1` or `2 e1`
//! for the product.

use crate::error::{FloorCutError, FloorCutResult};
use crate::expression::LinearExpression;
use crate::model::{ConstraintOp, Model};

use nom::branch::alt;
use nom::bytes::complete::take_while;
use nom::character::complete::{char, digit0, digit1, one_of, satisfy};
use nom::combinator::{all_consuming, map, map_opt, opt, recognize};
use nom::sequence::{pair, preceded, tuple};
use nom::IResult;

//checked in this order, the first one found splits the constraint
const RELATIONS: [(&str, ConstraintOp); 3] = [
    ("<=", ConstraintOp::Lte),
    (">=", ConstraintOp::Gte),
    ("==", ConstraintOp::Eq),
];

#[derive(Debug, Clone, PartialEq)]
enum Term<'a> {
    Scaled(f64, &'a str),
    Constant(f64),
}

/// Parses `text` into a linear expression over the variables of `model`.
pub fn parse_expression(text: &str, model: &Model) -> FloorCutResult<LinearExpression> {
    let terms = parse_terms(text)?;
    resolve(&terms, model)
}

/// Splits `text` at its relational operator and parses both sides.
///
/// The operators are searched for in the fixed order `<=`, `>=`, `==`, and
/// the first occurrence of the first one present is used. The right-hand side
/// must be a single number.
pub fn parse_constraint(
    text: &str,
    model: &Model,
) -> FloorCutResult<(LinearExpression, ConstraintOp, f64)> {
    let (pos, token, op) = RELATIONS
        .iter()
        .find_map(|&(token, op)| text.find(token).map(|pos| (pos, token, op)))
        .ok_or_else(|| FloorCutError::Operator(text.trim().to_string()))?;

    let terms = parse_terms(&text[..pos])?;
    let rhs = parse_number(&text[pos + token.len()..])?;
    let lhs = resolve(&terms, model)?;

    Ok((lhs, op, rhs))
}

/// Parses a single signed real literal surrounded by optional whitespace.
pub fn parse_number(text: &str) -> FloorCutResult<f64> {
    let trimmed = text.trim();

    let bad_number = || {
        FloorCutError::syntax(
            trimmed,
            "right-hand side must be a single finite number, not an expression",
        )
    };

    match signed_literal(trimmed) {
        Ok(("", value)) => Ok(value),
        _ => Err(bad_number()),
    }
}

fn resolve(terms: &[Term<'_>], model: &Model) -> FloorCutResult<LinearExpression> {
    let mut expr = LinearExpression::new();

    for term in terms {
        match *term {
            Term::Scaled(coeff, name) => match model.variable_id(name) {
                Some(var) => expr.add_term(var, coeff),
                None => return Err(FloorCutError::UnknownVariable(name.to_string())),
            },

            Term::Constant(value) => expr.add_constant(value),
        }
    }

    Ok(expr)
}

fn parse_terms(text: &str) -> FloorCutResult<Vec<Term<'_>>> {
    let mut i = text.trim_start();

    if i.trim_end().is_empty() {
        return Err(FloorCutError::syntax(text, "expected an expression"));
    }

    let mut terms = Vec::new();
    let mut sign = 1.;

    loop {
        let (rest, term) =
            signed_term(i).map_err(|_| FloorCutError::syntax(i.trim_end(), "expected a term"))?;

        terms.push(match term {
            Term::Scaled(coeff, name) => Term::Scaled(sign * coeff, name),
            Term::Constant(value) => Term::Constant(sign * value),
        });

        i = rest.trim_start();

        if i.is_empty() {
            return Ok(terms);
        }

        let (rest, op) = separator(i)
            .map_err(|_| FloorCutError::syntax(i.trim_end(), "unexpected input"))?;

        let rest = rest.trim_start();

        if rest.is_empty() {
            return Err(FloorCutError::syntax(
                i.trim_end(),
                "expected a term after the operator",
            ));
        }

        sign = if op == '-' { -1. } else { 1. };
        i = rest;
    }
}

fn separator(i: &str) -> IResult<&str, char> {
    one_of("+-")(i)
}

fn signed_term(i: &str) -> IResult<&str, Term<'_>> {
    let (i, sign) = opt(one_of("+-"))(i)?;
    let i = i.trim_start();
    let (i, term) = term(i)?;

    Ok((
        i,
        match (sign, term) {
            (Some('-'), Term::Scaled(coeff, name)) => Term::Scaled(-coeff, name),
            (Some('-'), Term::Constant(value)) => Term::Constant(-value),
            (_, term) => term,
        },
    ))
}

fn term(i: &str) -> IResult<&str, Term<'_>> {
    alt((
        scaled_term,
        map(identifier, |name| Term::Scaled(1., name)),
        map(literal, Term::Constant),
    ))(i)
}

fn scaled_term(i: &str) -> IResult<&str, Term<'_>> {
    let (i, coeff) = literal(i)?;
    let i = i.trim_start();
    let (i, _star) = opt(char('*'))(i)?;
    let i = i.trim_start();
    let (i, name) = identifier(i)?;
    Ok((i, Term::Scaled(coeff, name)))
}

/// True if all of `text` is a name the expression grammar accepts.
pub(crate) fn is_identifier(text: &str) -> bool {
    all_consuming(identifier)(text).is_ok()
}

fn identifier(i: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(i)
}

//unsigned and finite, and never "inf" or "nan", so those remain usable as variable names
fn literal(i: &str) -> IResult<&str, f64> {
    let exponent = || recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)));

    map_opt(
        alt((
            recognize(tuple((digit1, opt(pair(char('.'), digit0)), opt(exponent())))),
            recognize(tuple((char('.'), digit1, opt(exponent())))),
        )),
        |s: &str| s.parse::<f64>().ok().filter(|value| value.is_finite()),
    )(i)
}

fn signed_literal(i: &str) -> IResult<&str, f64> {
    let (i, sign) = opt(one_of("+-"))(i)?;
    let (i, value) = preceded(take_while(char::is_whitespace), literal)(i)?;
    Ok((i, if sign == Some('-') { -value } else { value }))
}
