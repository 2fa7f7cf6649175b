//! Rendering of result lines.
//!
//! A gcd result is written as `seconds,gcd` and a factorization as
//! `seconds,unit,(f1)^k1,(f2)^k2,...`.

use std::fmt::Write;
use std::time::Duration;

use crate::engine::{AlgebraEngine, Factorization};

/// The elapsed time in seconds, from a nanosecond count.
pub fn seconds(elapsed: Duration) -> f64 {
    elapsed.as_nanos() as f64 / 1e9
}

pub fn gcd_line<A: AlgebraEngine>(engine: &A, elapsed: Duration, gcd: &A::Polynomial) -> String {
    format!("{},{}", seconds(elapsed), engine.render(gcd))
}

pub fn factor_line<A: AlgebraEngine>(
    engine: &A,
    elapsed: Duration,
    factorization: &Factorization<A::Polynomial>,
) -> String {
    let mut line = format!("{},{}", seconds(elapsed), factorization.unit);
    for (f, pow) in &factorization.factors {
        // writing to a String cannot fail
        let _ = write!(line, ",({})^{}", engine.render(f), pow);
    }
    line
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::domains::integer::Integer;
    use crate::engine::{AlgebraEngine, Factorization, IntegerPolynomialEngine};
    use crate::poly::Variable;

    use super::{factor_line, gcd_line, seconds};

    fn engine() -> IntegerPolynomialEngine {
        IntegerPolynomialEngine::new(Arc::new(vec![Variable::new("x"), Variable::new("y")]))
    }

    #[test]
    fn timing() {
        assert_eq!(seconds(Duration::from_nanos(1_500_000_000)), 1.5);
        assert_eq!(seconds(Duration::from_nanos(250)), 2.5e-7);
        assert_eq!(seconds(Duration::ZERO), 0.);
    }

    #[test]
    fn gcd() {
        let e = engine();
        let g = e.parse("x-y").unwrap();
        assert_eq!(gcd_line(&e, Duration::from_millis(1500), &g), "1.5,x-y");
    }

    #[test]
    fn factors() {
        let e = engine();
        let f = Factorization {
            unit: Integer::new(-3),
            factors: vec![(e.parse("x+y").unwrap(), 1), (e.parse("x").unwrap(), 2)],
        };
        assert_eq!(factor_line(&e, Duration::from_secs(2), &f), "2,-3,(x+y)^1,(x)^2");

        let unit_only = Factorization {
            unit: Integer::new(7),
            factors: vec![],
        };
        assert_eq!(factor_line(&e, Duration::ZERO, &unit_only), "0,7");
    }
}
