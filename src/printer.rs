use std::fmt::{self, Write};

use crate::domains::{Ring, RingPrinter};
use crate::poly::polynomial::MultivariatePolynomial;
use crate::poly::Exponent;

/// Prints a polynomial in a form that can be parsed back, with the
/// leading term first, e.g. `3*x^2*y-x+1`.
pub struct PolynomialPrinter<'a, F: Ring, E: Exponent> {
    pub poly: &'a MultivariatePolynomial<F, E>,
}

impl<'a, F: Ring, E: Exponent> PolynomialPrinter<'a, F, E> {
    pub fn new(poly: &'a MultivariatePolynomial<F, E>) -> PolynomialPrinter<'a, F, E> {
        PolynomialPrinter { poly }
    }
}

impl<'a, F: Ring, E: Exponent> fmt::Display for PolynomialPrinter<'a, F, E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let poly = self.poly;
        if poly.is_zero() {
            return f.write_char('0');
        }

        let mut first = true;
        for t in (0..poly.nterms()).rev() {
            let coeff = &poly.coefficients[t];
            let exponents = poly.exponents(t);
            let is_constant = exponents.iter().all(|e| e.is_zero());

            let mut c = String::new();
            write!(c, "{}", RingPrinter::new(&poly.field, coeff))?;
            let (negative, abs) = match c.strip_prefix('-') {
                Some(abs) => (true, abs),
                None => (false, c.as_str()),
            };

            if negative {
                f.write_char('-')?;
            } else if !first {
                f.write_char('+')?;
            }
            first = false;

            let mut needs_mul = false;
            if abs != "1" || is_constant {
                f.write_str(abs)?;
                needs_mul = true;
            }

            for (v, e) in poly.get_vars_ref().iter().zip(exponents) {
                if e.is_zero() {
                    continue;
                }

                if needs_mul {
                    f.write_char('*')?;
                }
                needs_mul = true;

                write!(f, "{}", v)?;
                if e.to_u32() != 1 {
                    write!(f, "^{}", e)?;
                }
            }
        }

        Ok(())
    }
}

impl<F: Ring, E: Exponent> fmt::Display for MultivariatePolynomial<F, E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        PolynomialPrinter::new(self).fmt(f)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::domains::integer::{Integer, IntegerRing, Z};
    use crate::parser::parse_polynomial;
    use crate::poly::polynomial::MultivariatePolynomial;
    use crate::poly::Variable;

    fn vars() -> Arc<Vec<Variable>> {
        Arc::new(vec![Variable::new("x"), Variable::new("y")])
    }

    fn parse(s: &str) -> MultivariatePolynomial<IntegerRing> {
        parse_polynomial(s, &vars()).unwrap()
    }

    #[test]
    fn format() {
        assert_eq!(parse("(x-y)*(x+y)").to_string(), "x^2-y^2");
        assert_eq!(parse("y-x").to_string(), "-x+y");
        assert_eq!(parse("2*y^3*x").to_string(), "2*x*y^3");
        assert_eq!(parse("x-x+1").to_string(), "1");
        assert_eq!(parse("x-x").to_string(), "0");
        assert_eq!(parse("-1").to_string(), "-1");
        assert_eq!(parse("-3x^2+x-7").to_string(), "-3*x^2+x-7");

        let zero = MultivariatePolynomial::<_, u32>::new(&Z, 0, vars());
        let big = zero.constant(Integer::new(2).pow(70)).mul_exp(&[1, 0]);
        assert_eq!(big.to_string(), "1180591620717411303424*x");
    }

    #[test]
    fn reparse() {
        for s in ["x^3*y-2*x*y^2+5", "-x^10+123456789012345678901*y", "x*y-1"] {
            let p = parse(s);
            assert_eq!(parse(&p.to_string()), p);
            assert_eq!(p.to_string(), s);
        }
    }
}
