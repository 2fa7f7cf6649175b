//! Parse polynomials with integer coefficients from text.
//!
//! The grammar supports `+`, `-`, `*`, `^` (or `**`), parentheses and
//! implicit multiplication such as `2x` or `3(x+1)`. Exponents must evaluate
//! to non-negative integers.

use std::sync::Arc;

use thiserror::Error;

use crate::domains::integer::{Integer, IntegerRing, Z};
use crate::poly::polynomial::MultivariatePolynomial;
use crate::poly::{Exponent, Variable};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unexpected '{found}' in input at column {column}")]
    UnexpectedToken { found: String, column: usize },
    #[error("Unexpected end of input")]
    UnexpectedEnd,
    #[error("Undefined variable {name} at column {column}")]
    UndefinedVariable { name: String, column: usize },
    #[error("Function {name} at column {column} is not supported")]
    FunctionCall { name: String, column: usize },
    #[error("Exponent at column {column} is not a non-negative integer")]
    InvalidExponent { column: usize },
    #[error("Exponent at column {column} is too large")]
    ExponentOverflow { column: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Pow,
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Pow => "^",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Number(Integer),
    ID(String),
    Op(Operator),
    Open,
    Close,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::ID(id) => f.write_str(id),
            Token::Op(o) => write!(f, "{}", o),
            Token::Open => f.write_str("("),
            Token::Close => f.write_str(")"),
        }
    }
}

impl Token {
    /// Split the input into tokens, paired with their 1-based column.
    pub fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, ParseError> {
        let chars: Vec<char> = input.chars().collect();
        let mut tokens = vec![];

        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            let column = i + 1;

            match c {
                c if c.is_whitespace() => {
                    i += 1;
                }
                '0'..='9' => {
                    let start = i;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                    let digits: String = chars[start..i].iter().collect();
                    let n = digits
                        .parse::<Integer>()
                        .map_err(|_| ParseError::UnexpectedToken {
                            found: digits.clone(),
                            column,
                        })?;
                    tokens.push((Token::Number(n), column));
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let start = i;
                    while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                        i += 1;
                    }
                    tokens.push((Token::ID(chars[start..i].iter().collect()), column));
                }
                '*' => {
                    if chars.get(i + 1) == Some(&'*') {
                        tokens.push((Token::Op(Operator::Pow), column));
                        i += 2;
                    } else {
                        tokens.push((Token::Op(Operator::Mul), column));
                        i += 1;
                    }
                }
                '+' | '-' | '^' | '(' | ')' => {
                    let t = match c {
                        '+' => Token::Op(Operator::Add),
                        '-' => Token::Op(Operator::Sub),
                        '^' => Token::Op(Operator::Pow),
                        '(' => Token::Open,
                        _ => Token::Close,
                    };
                    tokens.push((t, column));
                    i += 1;
                }
                _ => {
                    return Err(ParseError::UnexpectedToken {
                        found: c.to_string(),
                        column,
                    });
                }
            }
        }

        Ok(tokens)
    }
}

/// Parse `input` as a polynomial in `variables`. Any identifier that is not
/// in `variables` is an error.
pub fn parse_polynomial<E: Exponent>(
    input: &str,
    variables: &Arc<Vec<Variable>>,
) -> Result<MultivariatePolynomial<IntegerRing, E>, ParseError> {
    let tokens = Token::tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        template: MultivariatePolynomial::new(&Z, 0, variables.clone()),
    };

    let res = parser.parse_expression()?;
    if let Some((t, column)) = parser.tokens.get(parser.pos) {
        return Err(ParseError::UnexpectedToken {
            found: t.to_string(),
            column: *column,
        });
    }

    Ok(res)
}

struct Parser<E: Exponent> {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    template: MultivariatePolynomial<IntegerRing, E>,
}

impl<E: Exponent> Parser<E> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn column(&self) -> usize {
        self.tokens.get(self.pos).map(|(_, c)| *c).unwrap_or(0)
    }

    fn unexpected(&self) -> ParseError {
        match self.tokens.get(self.pos) {
            Some((t, column)) => ParseError::UnexpectedToken {
                found: t.to_string(),
                column: *column,
            },
            None => ParseError::UnexpectedEnd,
        }
    }

    /// expression := term (('+' | '-') term)*
    fn parse_expression(&mut self) -> Result<MultivariatePolynomial<IntegerRing, E>, ParseError> {
        let mut acc = self.parse_term()?;

        loop {
            match self.peek() {
                Some(Token::Op(Operator::Add)) => {
                    self.pos += 1;
                    acc = &acc + &self.parse_term()?;
                }
                Some(Token::Op(Operator::Sub)) => {
                    self.pos += 1;
                    acc = &acc - &self.parse_term()?;
                }
                _ => return Ok(acc),
            }
        }
    }

    /// term := unary (('*')? unary)*
    fn parse_term(&mut self) -> Result<MultivariatePolynomial<IntegerRing, E>, ParseError> {
        let mut acc = self.parse_unary()?;

        loop {
            let column = self.column();
            match self.peek() {
                Some(Token::Op(Operator::Mul)) => {
                    self.pos += 1;
                    let rhs = self.parse_unary()?;
                    acc = Self::checked_mul(&acc, &rhs, column)?;
                }
                Some(Token::Number(_) | Token::ID(_) | Token::Open) => {
                    let rhs = self.parse_unary()?;
                    acc = Self::checked_mul(&acc, &rhs, column)?;
                }
                _ => return Ok(acc),
            }
        }
    }

    /// unary := ('+' | '-') unary | power
    fn parse_unary(&mut self) -> Result<MultivariatePolynomial<IntegerRing, E>, ParseError> {
        match self.peek() {
            Some(Token::Op(Operator::Sub)) => {
                self.pos += 1;
                Ok(-self.parse_unary()?)
            }
            Some(Token::Op(Operator::Add)) => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    /// power := atom ('^' unary)?
    fn parse_power(&mut self) -> Result<MultivariatePolynomial<IntegerRing, E>, ParseError> {
        let base = self.parse_atom()?;

        if self.peek() != Some(&Token::Op(Operator::Pow)) {
            return Ok(base);
        }
        self.pos += 1;

        let column = self.column();
        let exp = self.parse_unary()?;
        if !exp.is_constant() {
            return Err(ParseError::InvalidExponent { column });
        }

        let exp = exp.get_constant();
        if exp.is_negative() {
            return Err(ParseError::InvalidExponent { column });
        }

        let n = match exp.to_i64() {
            Some(n) if n <= u32::MAX as i64 => n as u64,
            _ => return Err(ParseError::ExponentOverflow { column }),
        };

        for d in base.degree_bounds() {
            if d.to_u32() as u64 * n > u32::MAX as u64
                || E::try_from_u32((d.to_u32() as u64 * n) as u32).is_none()
            {
                return Err(ParseError::ExponentOverflow { column });
            }
        }

        Ok(base.pow(n as usize))
    }

    /// atom := number | variable | '(' expression ')'
    fn parse_atom(&mut self) -> Result<MultivariatePolynomial<IntegerRing, E>, ParseError> {
        let Some((token, column)) = self.tokens.get(self.pos).cloned() else {
            return Err(ParseError::UnexpectedEnd);
        };

        match token {
            Token::Number(n) => {
                self.pos += 1;
                Ok(self.template.constant(n))
            }
            Token::ID(name) => {
                self.pos += 1;
                if self.peek() == Some(&Token::Open) {
                    return Err(ParseError::FunctionCall { name, column });
                }

                match self.template.get_vars_ref().iter().position(|v| v.name() == name) {
                    Some(index) => Ok(self.template.variable(index)),
                    None => Err(ParseError::UndefinedVariable { name, column }),
                }
            }
            Token::Open => {
                self.pos += 1;
                let e = self.parse_expression()?;
                if self.peek() != Some(&Token::Close) {
                    return Err(self.unexpected());
                }
                self.pos += 1;
                Ok(e)
            }
            Token::Close | Token::Op(_) => Err(self.unexpected()),
        }
    }

    /// Multiply, reporting an overflow of the exponents as an error.
    fn checked_mul(
        a: &MultivariatePolynomial<IntegerRing, E>,
        b: &MultivariatePolynomial<IntegerRing, E>,
        column: usize,
    ) -> Result<MultivariatePolynomial<IntegerRing, E>, ParseError> {
        for (da, db) in a.degree_bounds().iter().zip(b.degree_bounds()) {
            if da.checked_add(&db).is_none() {
                return Err(ParseError::ExponentOverflow { column });
            }
        }
        Ok(a * b)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::domains::integer::{Integer, IntegerRing};
    use crate::poly::polynomial::MultivariatePolynomial;
    use crate::poly::Variable;

    use super::{parse_polynomial, ParseError};

    fn vars() -> Arc<Vec<Variable>> {
        Arc::new(vec![Variable::new("x"), Variable::new("y")])
    }

    fn parse(s: &str) -> Result<MultivariatePolynomial<IntegerRing>, ParseError> {
        parse_polynomial(s, &vars())
    }

    #[test]
    fn precedence() {
        let a = parse("x^2-y^2").unwrap();
        let b = parse("(x-y)*(x+y)").unwrap();
        assert_eq!(a, b);
        assert_eq!(parse("-x^2").unwrap(), -parse("x*x").unwrap());
        assert_eq!(parse("2^3^2").unwrap(), parse("512").unwrap());
        assert_eq!(parse("x**2").unwrap(), parse("x^2").unwrap());
        assert_eq!(
            parse("2x(y+1)").unwrap_err(),
            ParseError::FunctionCall { name: "x".into(), column: 2 }
        );
        assert_eq!(
            parse("2 x (y+1)").unwrap_err(),
            ParseError::FunctionCall { name: "x".into(), column: 3 }
        );
        assert_eq!(parse("2(y+1)x").unwrap(), parse("2*x*y+2*x").unwrap());
        assert_eq!(parse("--x").unwrap(), parse("x").unwrap());
    }

    #[test]
    fn large_coefficients() {
        let p = parse("123456789012345678901234567890*x").unwrap();
        assert_eq!(
            p.lcoeff(),
            "123456789012345678901234567890".parse::<Integer>().unwrap()
        );
    }

    #[test]
    fn errors() {
        assert_eq!(
            parse("x+z").unwrap_err(),
            ParseError::UndefinedVariable { name: "z".into(), column: 3 }
        );
        assert_eq!(parse("x^-1").unwrap_err(), ParseError::InvalidExponent { column: 3 });
        assert_eq!(parse("x^y").unwrap_err(), ParseError::InvalidExponent { column: 3 });
        assert_eq!(
            parse("x^1.5").unwrap_err(),
            ParseError::UnexpectedToken { found: ".".into(), column: 4 }
        );
        assert_eq!(
            parse("x/2").unwrap_err(),
            ParseError::UnexpectedToken { found: "/".into(), column: 2 }
        );
        assert_eq!(parse("(x+y").unwrap_err(), ParseError::UnexpectedEnd);
        assert_eq!(
            parse("x)").unwrap_err(),
            ParseError::UnexpectedToken { found: ")".into(), column: 2 }
        );
        assert_eq!(parse("").unwrap_err(), ParseError::UnexpectedEnd);
        assert_eq!(parse("x+").unwrap_err(), ParseError::UnexpectedEnd);
        assert_eq!(
            parse("x^4294967296").unwrap_err(),
            ParseError::ExponentOverflow { column: 3 }
        );
        assert_eq!(
            parse("x^4294967295*x").unwrap_err(),
            ParseError::ExponentOverflow { column: 13 }
        );
    }
}
