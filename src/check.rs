//! Verification of a result log against its problem file, and timing statistics.

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::engine::{AlgebraEngine, IntegerPolynomialEngine};
use crate::parser::ParseError;
use crate::request::{Request, RequestError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("the output has {output} lines but the input has {input}")]
    LineCount { input: usize, output: usize },
    #[error("line {line}: invalid time '{value}'")]
    InvalidTime { line: usize, value: String },
    #[error("line {line}: {source}")]
    Request { line: usize, source: RequestError },
    #[error("line {line}: {source}")]
    Parse { line: usize, source: ParseError },
    #[error("line {line}: empty result field")]
    EmptyField { line: usize },
    #[error("line {line}: expected a single gcd, found {found} fields")]
    GcdFieldCount { line: usize, found: usize },
    #[error("line {line}: the gcd does not divide both operands")]
    NotADivisor { line: usize },
    #[error("line {line}: the product of the factors does not equal the input")]
    WrongFactorization { line: usize },
    #[error("no timings left after skipping {nwarmups} warm-ups of {lines} lines")]
    NoTimings { nwarmups: usize, lines: usize },
}

/// Statistics of the measured times, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingSummary {
    pub count: usize,
    pub total: f64,
    pub mean: f64,
    pub sd: f64,
    pub min: f64,
    pub max: f64,
}

impl TimingSummary {
    /// Summarize a non-empty list of times. The standard deviation is the
    /// sample standard deviation, and zero for a single time.
    pub fn new(times: &[f64]) -> Option<TimingSummary> {
        if times.is_empty() {
            return None;
        }

        let count = times.len();
        let total: f64 = times.iter().sum();
        let mean = total / count as f64;
        let sd = if count > 1 {
            let squares: f64 = times.iter().map(|t| (t - mean) * (t - mean)).sum();
            let var = squares / (count - 1) as f64;
            var.sqrt()
        } else {
            0.
        };

        Some(TimingSummary {
            count,
            total,
            mean,
            sd,
            min: times.iter().cloned().fold(f64::INFINITY, f64::min),
            max: times.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

impl fmt::Display for TimingSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "count: {}", self.count)?;
        writeln!(f, "total: {}", self.total)?;
        writeln!(f, "mean:  {}", self.mean)?;
        writeln!(f, "sd:    {}", self.sd)?;
        writeln!(f, "min:   {}", self.min)?;
        write!(f, "max:   {}", self.max)
    }
}

/// Verifies result lines with an engine over the same variables as the run.
pub struct Checker {
    engine: IntegerPolynomialEngine,
}

impl Checker {
    pub fn new(engine: IntegerPolynomialEngine) -> Checker {
        Checker { engine }
    }

    /// Check the result `output` of the request `input`, both on line `line`,
    /// returning the measured time.
    pub fn check_line(&self, line: usize, input: &str, output: &str) -> Result<f64, CheckError> {
        let fields: Vec<&str> = output.split(',').collect();
        if fields.iter().skip(1).any(|f| f.trim().is_empty()) {
            return Err(CheckError::EmptyField { line });
        }

        let time = fields.first().copied().unwrap_or_default();
        let seconds = match time.trim().parse::<f64>() {
            Ok(t) if t.is_finite() && t >= 0. => t,
            _ => {
                return Err(CheckError::InvalidTime {
                    line,
                    value: time.to_string(),
                })
            }
        };

        let parse = |text: &str| {
            self.engine
                .parse(text)
                .map_err(|source| CheckError::Parse { line, source })
        };

        let results = fields
            .iter()
            .skip(1)
            .map(|&f| parse(f))
            .collect::<Result<Vec<_>, _>>()?;

        let request = Request::classify(input.trim_end())
            .map_err(|source| CheckError::Request { line, source })?;
        match request {
            Request::Gcd(a, b) => {
                if results.len() != 1 {
                    return Err(CheckError::GcdFieldCount {
                        line,
                        found: results.len(),
                    });
                }

                let (a, b, g) = (parse(a)?, parse(b)?, &results[0]);
                let divides = if g.is_zero() {
                    a.is_zero() && b.is_zero()
                } else {
                    a.divides(g).is_some() && b.divides(g).is_some()
                };

                if !divides {
                    return Err(CheckError::NotADivisor { line });
                }
            }
            Request::Factor(p) => {
                let p = parse(p)?;
                let mut product = p.one();
                for f in &results {
                    product = &product * f;
                }

                if product != p {
                    return Err(CheckError::WrongFactorization { line });
                }
            }
        }

        debug!("line {}: verified in {}s", line, seconds);
        Ok(seconds)
    }

    /// Check all results, and summarize the times after the first `nwarmups` lines.
    pub fn check(
        &self,
        input: &str,
        output: &str,
        nwarmups: usize,
    ) -> Result<TimingSummary, CheckError> {
        let inputs: Vec<&str> = input.lines().collect();
        let outputs: Vec<&str> = output.lines().collect();

        if inputs.len() != outputs.len() {
            return Err(CheckError::LineCount {
                input: inputs.len(),
                output: outputs.len(),
            });
        }

        let mut times = vec![];
        for (i, (input, output)) in inputs.iter().zip(&outputs).enumerate() {
            times.push(self.check_line(i + 1, input, output)?);
        }

        let measured = times.get(nwarmups..).unwrap_or_default();
        TimingSummary::new(measured).ok_or(CheckError::NoTimings {
            nwarmups,
            lines: times.len(),
        })
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::engine::IntegerPolynomialEngine;
    use crate::poly::Variable;

    use super::{CheckError, Checker, TimingSummary};

    fn checker() -> Checker {
        Checker::new(IntegerPolynomialEngine::new(Arc::new(vec![
            Variable::new("x"),
            Variable::new("y"),
        ])))
    }

    #[test]
    fn valid_results() {
        let c = checker();
        assert_eq!(c.check_line(1, "gcd(x^2-y^2,x-y)", "0.5,x-y"), Ok(0.5));
        assert_eq!(c.check_line(1, "gcd(x^2-y^2,x-y)", "0.5,-x+y"), Ok(0.5));
        assert_eq!(c.check_line(2, "factor(x^2-y^2)", "1e-3,1,(x-y)^1,(x+y)^1"), Ok(0.001));
        assert_eq!(c.check_line(3, "factor(-2*x^2)", "0,-2,(x)^2"), Ok(0.));
    }

    #[test]
    fn invalid_results() {
        let c = checker();
        assert_eq!(
            c.check_line(4, "gcd(x^2-y^2,x-y)", "0.5,x+y"),
            Err(CheckError::NotADivisor { line: 4 })
        );
        assert_eq!(
            c.check_line(4, "gcd(x^2-y^2,x-y)", "0.5,x-y,1"),
            Err(CheckError::GcdFieldCount { line: 4, found: 2 })
        );
        assert_eq!(
            c.check_line(5, "factor(x^2-y^2)", "0.1,1,(x-y)^2"),
            Err(CheckError::WrongFactorization { line: 5 })
        );
        assert_eq!(
            c.check_line(6, "factor(x)", "fast,x"),
            Err(CheckError::InvalidTime { line: 6, value: "fast".into() })
        );
        assert!(matches!(
            c.check_line(7, "factor(x)", "0.1,z"),
            Err(CheckError::Parse { line: 7, .. })
        ));
    }

    #[test]
    fn empty_fields() {
        let c = checker();
        assert_eq!(
            c.check_line(2, "gcd(x^2-y^2,x-y)", "0.5,,x-y"),
            Err(CheckError::EmptyField { line: 2 })
        );
        assert_eq!(
            c.check_line(3, "factor(x^2-y^2)", "0.1,1,(x-y)^1,(x+y)^1,"),
            Err(CheckError::EmptyField { line: 3 })
        );
        assert_eq!(
            c.check_line(4, "gcd(x^2-y^2,x-y)", "0.5, "),
            Err(CheckError::EmptyField { line: 4 })
        );
        assert_eq!(
            c.check_line(5, "factor(x)", ""),
            Err(CheckError::InvalidTime { line: 5, value: "".into() })
        );
    }

    #[test]
    fn summary() {
        let c = checker();
        let input = "gcd(x,y)\nfactor(x*y)\ngcd(x,x)\n";
        let output = "9,1\n1,1,(x)^1,(y)^1\n3,x\n";

        let s = c.check(input, output, 1).unwrap();
        assert_eq!(s.count, 2);
        assert_eq!(s.total, 4.);
        assert_eq!(s.mean, 2.);
        assert_eq!(s.min, 1.);
        assert_eq!(s.max, 3.);
        assert_eq!(s.sd, 2f64.sqrt());

        assert_eq!(
            c.check(input, "9,1\n", 0),
            Err(CheckError::LineCount { input: 3, output: 1 })
        );
        assert_eq!(
            c.check(input, output, 3),
            Err(CheckError::NoTimings { nwarmups: 3, lines: 3 })
        );
    }

    #[test]
    fn single_time() {
        let s = TimingSummary::new(&[0.25]).unwrap();
        assert_eq!((s.count, s.sd, s.min, s.max), (1, 0., 0.25, 0.25));
        assert!(TimingSummary::new(&[]).is_none());
    }
}
