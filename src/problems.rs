//! Random benchmark problems.
//!
//! Every problem is built from random "basic block" polynomials, for example
//! a non-trivial gcd problem is `gcd(a*g, b*g)` for random `a`, `b` and `g`.
//! The same seed and options always give the same problems.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

use crate::domains::integer::{Integer, IntegerRing, Z};
use crate::poly::polynomial::MultivariatePolynomial;
use crate::poly::Variable;

const COEFF_MAX_TRIAL: usize = 10;
const POLY_MAX_TRIAL: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProblemError {
    #[error("{name} ({value}) must be {constraint}")]
    InvalidOption {
        name: &'static str,
        value: i64,
        constraint: String,
    },
    #[error("failed to generate a non-zero random polynomial")]
    ZeroPolynomial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemType {
    /// `gcd(a*b, c*d)`, most likely a trivial gcd
    TrivialGcd,
    /// `gcd(a*g, b*g)`
    NontrivialGcd,
    /// `factor(a*b+c)`, most likely irreducible
    TrivialFactor,
    /// `factor(a*b)`
    NontrivialFactor,
}

impl FromStr for ProblemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trivial-gcd" => Ok(ProblemType::TrivialGcd),
            "nontrivial-gcd" => Ok(ProblemType::NontrivialGcd),
            "trivial-factor" => Ok(ProblemType::TrivialFactor),
            "nontrivial-factor" => Ok(ProblemType::NontrivialFactor),
            _ => Err(format!(
                "unknown problem type {}: expected trivial-gcd, nontrivial-gcd, \
                 trivial-factor or nontrivial-factor",
                s
            )),
        }
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            ProblemType::TrivialGcd => "trivial-gcd",
            ProblemType::NontrivialGcd => "nontrivial-gcd",
            ProblemType::TrivialFactor => "trivial-factor",
            ProblemType::NontrivialFactor => "nontrivial-factor",
        })
    }
}

/// How the degree of a term is distributed over the variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExponentDistribution {
    /// Every variable is equally likely.
    #[default]
    Uniform,
    /// Variable weights grow exponentially, so that some variables
    /// have much higher degrees than others.
    Sharp,
}

impl FromStr for ExponentDistribution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uniform" => Ok(ExponentDistribution::Uniform),
            "sharp" => Ok(ExponentDistribution::Sharp),
            _ => Err(format!("unknown distribution {}: expected uniform or sharp", s)),
        }
    }
}

impl fmt::Display for ExponentDistribution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            ExponentDistribution::Uniform => "uniform",
            ExponentDistribution::Sharp => "sharp",
        })
    }
}

/// The shape of the random basic-block polynomials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolynomialOptions {
    pub nvars: usize,
    pub min_nterms: usize,
    pub max_nterms: usize,
    pub min_degree: u32,
    pub max_degree: u32,
    pub min_coeff: i64,
    pub max_coeff: i64,
    pub exp_dist: ExponentDistribution,
}

impl Default for PolynomialOptions {
    fn default() -> Self {
        PolynomialOptions::new(5, None, 30, None, 30, None, 1 << 14, ExponentDistribution::Uniform)
    }
}

impl PolynomialOptions {
    /// Create options, filling in the default lower bounds: `max_nterms * 0.75` terms,
    /// degree `max_degree * 0.75` for the uniform distribution and `0` for the sharp one,
    /// and `-max_coeff` for the coefficients.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        nvars: usize,
        min_nterms: Option<usize>,
        max_nterms: usize,
        min_degree: Option<u32>,
        max_degree: u32,
        min_coeff: Option<i64>,
        max_coeff: i64,
        exp_dist: ExponentDistribution,
    ) -> PolynomialOptions {
        let min_degree = min_degree.unwrap_or(match exp_dist {
            ExponentDistribution::Uniform => max_degree * 3 / 4,
            ExponentDistribution::Sharp => 0,
        });

        PolynomialOptions {
            nvars,
            min_nterms: min_nterms.unwrap_or((max_nterms * 3 / 4).max(1)),
            max_nterms,
            min_degree,
            max_degree,
            min_coeff: min_coeff.unwrap_or(-max_coeff),
            max_coeff,
            exp_dist,
        }
    }

    pub fn validate(&self) -> Result<(), ProblemError> {
        let check = |ok: bool, name: &'static str, value: i64, constraint: String| {
            if ok {
                Ok(())
            } else {
                Err(ProblemError::InvalidOption {
                    name,
                    value,
                    constraint,
                })
            }
        };

        check(self.nvars >= 1, "nvars", self.nvars as i64, ">= 1".into())?;
        check(self.max_nterms >= 1, "max_nterms", self.max_nterms as i64, ">= 1".into())?;
        check(self.max_degree >= 1, "max_degree", self.max_degree as i64, ">= 1".into())?;
        check(self.max_coeff >= 1, "max_coeff", self.max_coeff, ">= 1".into())?;
        check(self.min_nterms >= 1, "min_nterms", self.min_nterms as i64, ">= 1".into())?;
        check(
            self.min_nterms <= self.max_nterms,
            "min_nterms",
            self.min_nterms as i64,
            format!("<= max_nterms ({})", self.max_nterms),
        )?;
        check(
            self.min_degree <= self.max_degree,
            "min_degree",
            self.min_degree as i64,
            format!("<= max_degree ({})", self.max_degree),
        )?;
        check(
            self.min_coeff <= self.max_coeff,
            "min_coeff",
            self.min_coeff,
            format!("<= max_coeff ({})", self.max_coeff),
        )
    }
}

/// The variables `x1, ..., xn`.
pub fn variables(nvars: usize) -> Arc<Vec<Variable>> {
    Arc::new((1..=nvars).map(|i| Variable::new(&format!("x{}", i))).collect())
}

/// Generates random polynomials and problems from a seeded generator.
pub struct ProblemGenerator {
    options: PolynomialOptions,
    variables: Arc<Vec<Variable>>,
    rng: StdRng,
}

impl ProblemGenerator {
    pub fn new(options: PolynomialOptions, seed: u64) -> Result<ProblemGenerator, ProblemError> {
        options.validate()?;

        Ok(ProblemGenerator {
            variables: variables(options.nvars),
            options,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn get_vars_ref(&self) -> &Arc<Vec<Variable>> {
        &self.variables
    }

    fn random_coeff(&mut self) -> Integer {
        for _ in 0..COEFF_MAX_TRIAL {
            let c = self.rng.gen_range(self.options.min_coeff..=self.options.max_coeff);
            if c != 0 {
                return Integer::new(c);
            }
        }
        Integer::one()
    }

    /// The relative weight of each variable when distributing the degree of a term.
    fn variable_weights(&mut self) -> Vec<f64> {
        let n = self.options.nvars;
        if self.options.exp_dist == ExponentDistribution::Uniform || n < 2 {
            return vec![1.; n];
        }

        // a * exp(b * i), from min_degree up to max_degree
        let a = (self.options.min_degree as f64).max(0.1);
        let b = (self.options.max_degree as f64 / a).ln() / (n - 1) as f64;
        let mut weights: Vec<f64> = (0..n).map(|i| a * (b * i as f64).exp()).collect();
        weights.shuffle(&mut self.rng);
        weights
    }

    /// Draw a random non-zero polynomial.
    pub fn random_polynomial(
        &mut self,
    ) -> Result<MultivariatePolynomial<IntegerRing>, ProblemError> {
        let nterms = self
            .rng
            .gen_range(self.options.min_nterms..=self.options.max_nterms);
        let zero = MultivariatePolynomial::new(&Z, nterms, self.variables.clone());

        for _ in 0..POLY_MAX_TRIAL {
            let weights = self.variable_weights();
            let index = WeightedIndex::new(&weights).map_err(|_| ProblemError::InvalidOption {
                name: "max_degree",
                value: self.options.max_degree as i64,
                constraint: "a valid weight for the sharp distribution".into(),
            })?;

            let mut p = zero.clone();
            for _ in 0..nterms {
                let c = self.random_coeff();
                let degree = self
                    .rng
                    .gen_range(self.options.min_degree..=self.options.max_degree);

                let mut exponents = vec![0u32; self.options.nvars];
                for _ in 0..degree {
                    exponents[index.sample(&mut self.rng)] += 1;
                }
                p.append_monomial(c, &exponents);
            }

            if !p.is_zero() {
                return Ok(p);
            }
        }

        Err(ProblemError::ZeroPolynomial)
    }

    /// Generate a single problem in the request format.
    pub fn problem(&mut self, problem_type: ProblemType) -> Result<String, ProblemError> {
        Ok(match problem_type {
            ProblemType::TrivialGcd => {
                let (a, b, c, d) = (
                    self.random_polynomial()?,
                    self.random_polynomial()?,
                    self.random_polynomial()?,
                    self.random_polynomial()?,
                );
                format!("gcd({},{})", &a * &b, &c * &d)
            }
            ProblemType::NontrivialGcd => {
                let (a, b, g) = (
                    self.random_polynomial()?,
                    self.random_polynomial()?,
                    self.random_polynomial()?,
                );
                format!("gcd({},{})", &a * &g, &b * &g)
            }
            ProblemType::TrivialFactor => {
                let (a, b, c) = (
                    self.random_polynomial()?,
                    self.random_polynomial()?,
                    self.random_polynomial()?,
                );
                format!("factor({})", &(&a * &b) + &c)
            }
            ProblemType::NontrivialFactor => {
                let (a, b) = (self.random_polynomial()?, self.random_polynomial()?);
                format!("factor({})", &a * &b)
            }
        })
    }

    /// Generate `nwarmups + nproblems` problems, the warm-up problems first.
    pub fn generate(
        &mut self,
        problem_type: ProblemType,
        nwarmups: usize,
        nproblems: usize,
    ) -> Result<Vec<String>, ProblemError> {
        debug!(
            "generating {} {} problems ({} warm-ups) in {} variables",
            nproblems, problem_type, nwarmups, self.options.nvars
        );
        (0..nwarmups + nproblems)
            .map(|_| self.problem(problem_type))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use crate::domains::integer::Integer;
    use crate::request::Request;

    use super::{
        variables, ExponentDistribution, PolynomialOptions, ProblemError, ProblemGenerator,
        ProblemType,
    };

    fn small() -> PolynomialOptions {
        PolynomialOptions::new(3, None, 4, None, 4, None, 10, ExponentDistribution::Uniform)
    }

    #[test]
    fn defaults() {
        let o = PolynomialOptions::default();
        assert_eq!((o.min_nterms, o.min_degree, o.min_coeff), (22, 22, -16384));

        let o = PolynomialOptions::new(
            5,
            None,
            1,
            None,
            30,
            None,
            1 << 14,
            ExponentDistribution::Sharp,
        );
        assert_eq!((o.min_nterms, o.min_degree), (1, 0));

        let names: Vec<_> = variables(3).iter().map(|v| v.name().to_string()).collect();
        assert_eq!(names, ["x1", "x2", "x3"]);
    }

    #[test]
    fn validation() {
        let mut o = small();
        o.min_coeff = 11;
        assert!(matches!(
            ProblemGenerator::new(o, 1),
            Err(ProblemError::InvalidOption { name: "min_coeff", .. })
        ));

        let mut o = small();
        o.nvars = 0;
        assert!(ProblemGenerator::new(o, 1).is_err());
    }

    #[test]
    fn bounds() {
        for dist in [ExponentDistribution::Uniform, ExponentDistribution::Sharp] {
            let mut o = small();
            o.exp_dist = dist;
            let mut g = ProblemGenerator::new(o, 7).unwrap();
            for _ in 0..20 {
                let p = g.random_polynomial().unwrap();
                assert!(p.nterms() >= 1 && p.nterms() <= 4);
                for t in &p {
                    let degree: u32 = t.exponents.iter().sum();
                    assert!(degree <= 4);
                    // terms with equal exponents are merged, adding their coefficients
                    assert!(t.coefficient.abs() <= Integer::new(4 * 10));
                }
            }
        }
    }

    #[test]
    fn coefficient_draws() {
        let mut g = ProblemGenerator::new(small(), 11).unwrap();
        for _ in 0..200 {
            let c = g.random_coeff();
            assert!(!c.is_zero());
            assert!(c.abs() <= Integer::new(10));
        }

        let mut o = small();
        o.min_coeff = 3;
        let mut g = ProblemGenerator::new(o, 11).unwrap();
        for _ in 0..50 {
            let c = g.random_coeff();
            assert!(c >= Integer::new(3) && c <= Integer::new(10));
        }
    }

    #[test]
    fn deterministic() {
        let a = ProblemGenerator::new(small(), 42)
            .unwrap()
            .generate(ProblemType::NontrivialGcd, 2, 3)
            .unwrap();
        let b = ProblemGenerator::new(small(), 42)
            .unwrap()
            .generate(ProblemType::NontrivialGcd, 2, 3)
            .unwrap();
        assert_eq!(a.len(), 5);
        assert_eq!(a, b);

        for p in &a {
            assert!(matches!(Request::classify(p), Ok(Request::Gcd(..))));
        }
    }

    #[test]
    fn problem_types() {
        let mut g = ProblemGenerator::new(small(), 3).unwrap();
        assert!(g.problem(ProblemType::TrivialGcd).unwrap().starts_with("gcd("));
        assert!(g.problem(ProblemType::TrivialFactor).unwrap().starts_with("factor("));
        assert!(g.problem(ProblemType::NontrivialFactor).unwrap().starts_with("factor("));
        assert_eq!("sharp".parse(), Ok(ExponentDistribution::Sharp));
        assert!("gaussian".parse::<ExponentDistribution>().is_err());
        assert_eq!("trivial-gcd".parse(), Ok(ProblemType::TrivialGcd));
    }
}
