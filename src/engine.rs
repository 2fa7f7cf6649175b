//! The narrow interface between the driver and a polynomial algebra engine.
//!
//! The driver only parses, computes a gcd or a factorization, and renders.
//! [IntegerPolynomialEngine] implements this for [MultivariatePolynomial]
//! over the integers.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::domains::integer::{Integer, IntegerRing};
use crate::parser::{parse_polynomial, ParseError};
use crate::poly::factor::{FactorizationError, Factorize};
use crate::poly::polynomial::MultivariatePolynomial;
use crate::poly::Variable;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("factorization failed: {0}")]
    Factorization(#[from] FactorizationError),
}

/// A unit times a product of factors with their multiplicities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Factorization<P> {
    pub unit: Integer,
    pub factors: Vec<(P, usize)>,
}

pub trait AlgebraEngine {
    type Polynomial;

    fn parse(&self, text: &str) -> Result<Self::Polynomial, ParseError>;
    fn gcd(
        &self,
        a: &Self::Polynomial,
        b: &Self::Polynomial,
    ) -> Result<Self::Polynomial, EngineError>;
    fn factor(&self, p: &Self::Polynomial) -> Result<Factorization<Self::Polynomial>, EngineError>;
    /// Render a polynomial such that [AlgebraEngine::parse] reads it back.
    fn render(&self, p: &Self::Polynomial) -> String;
}

/// Polynomials with integer coefficients in a fixed list of variables.
#[derive(Debug, Clone)]
pub struct IntegerPolynomialEngine {
    variables: Arc<Vec<Variable>>,
}

impl IntegerPolynomialEngine {
    pub fn new(variables: Arc<Vec<Variable>>) -> IntegerPolynomialEngine {
        IntegerPolynomialEngine { variables }
    }
}

impl AlgebraEngine for IntegerPolynomialEngine {
    type Polynomial = MultivariatePolynomial<IntegerRing, u32>;

    fn parse(&self, text: &str) -> Result<Self::Polynomial, ParseError> {
        parse_polynomial(text, &self.variables)
    }

    fn gcd(
        &self,
        a: &Self::Polynomial,
        b: &Self::Polynomial,
    ) -> Result<Self::Polynomial, EngineError> {
        Ok(a.gcd(b))
    }

    fn factor(&self, p: &Self::Polynomial) -> Result<Factorization<Self::Polynomial>, EngineError> {
        let (unit, factors) = p.factor()?;
        debug!("found {} factors with unit {}", factors.len(), unit);
        Ok(Factorization { unit, factors })
    }

    fn render(&self, p: &Self::Polynomial) -> String {
        p.to_string()
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::domains::integer::Integer;
    use crate::poly::factor::FactorizationError;
    use crate::poly::Variable;

    use super::{AlgebraEngine, EngineError, IntegerPolynomialEngine};

    fn engine() -> IntegerPolynomialEngine {
        IntegerPolynomialEngine::new(Arc::new(vec![Variable::new("x"), Variable::new("y")]))
    }

    #[test]
    fn gcd() {
        let e = engine();
        let a = e.parse("x^2-y^2").unwrap();
        let b = e.parse("x-y").unwrap();
        assert_eq!(e.render(&e.gcd(&a, &b).unwrap()), "x-y");

        let g = e.gcd(&e.parse("x").unwrap(), &e.parse("y").unwrap()).unwrap();
        assert_eq!(e.render(&g), "1");
    }

    #[test]
    fn factor() {
        let e = engine();
        let f = e.factor(&e.parse("x^2-y^2").unwrap()).unwrap();
        assert_eq!(f.unit, Integer::one());
        let rendered: Vec<_> = f.factors.iter().map(|(p, k)| (e.render(p), *k)).collect();
        assert_eq!(rendered, vec![("x-y".to_string(), 1), ("x+y".to_string(), 1)]);

        let f = e.factor(&e.parse("-6").unwrap()).unwrap();
        assert_eq!(f.unit, Integer::new(-6));
        assert!(f.factors.is_empty());
    }

    #[test]
    fn factor_zero() {
        let e = engine();
        assert_eq!(
            e.factor(&e.parse("x-x").unwrap()),
            Err(EngineError::Factorization(FactorizationError::Zero))
        );
    }
}
