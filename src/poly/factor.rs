use std::cmp::Ordering;
use std::sync::Arc;

use rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;
use tracing::{debug, instrument, trace};

use crate::combinatorics::CombinationIterator;
use crate::domains::finite_field::{is_prime_u32, FiniteField, LARGE_U32_PRIMES};
use crate::domains::integer::{Integer, IntegerRing};
use crate::domains::Ring;

use super::polynomial::MultivariatePolynomial;
use super::Exponent;

/// The largest degree of the univariate image of a Kronecker substitution.
pub const MAX_SUBSTITUTION_DEGREE: u64 = 1000;

/// The number of evaluation points tried before the multivariate lifting gives up.
const MAX_EVALUATION_ATTEMPTS: usize = 20;

/// The number of usable evaluation points compared to find the image with the fewest factors.
const EVALUATION_CANDIDATES: usize = 3;

const RNG_SEED: u64 = 0x5eed_f4c7;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactorizationError {
    #[error("cannot factor the zero polynomial")]
    Zero,
    #[error("substitution degree {degree} exceeds the supported maximum of {max}")]
    SubstitutionTooLarge { degree: u64, max: u64 },
}

/// The modulus `p^k` of the multivariate lifting.
struct LiftingModulus {
    field: FiniteField,
    prime: Integer,
    k: u32,
    modulus: Integer,
}

impl LiftingModulus {
    /// The smallest power of the prime of `field` that exceeds `2 * bound`.
    fn new(field: FiniteField, bound: &Integer) -> LiftingModulus {
        let prime = Integer::from(field.get_prime());
        let limit = bound * &Integer::new(2);

        let mut modulus = prime.clone();
        let mut k = 1;
        while modulus <= limit {
            modulus = &modulus * &prime;
            k += 1;
        }

        LiftingModulus {
            field,
            prime,
            k,
            modulus,
        }
    }
}

pub trait Factorize: Sized {
    /// Write the polynomial as an integer unit times a product of
    /// square-free, pairwise coprime factors with multiplicities.
    fn square_free_factorization(
        &self,
    ) -> Result<(Integer, Vec<(Self, usize)>), FactorizationError>;

    /// Write the polynomial as an integer unit times a product of irreducible factors
    /// with multiplicities. Every factor is primitive and has a positive leading coefficient.
    fn factor(&self) -> Result<(Integer, Vec<(Self, usize)>), FactorizationError>;
}

impl<E: Exponent> Factorize for MultivariatePolynomial<IntegerRing, E> {
    fn square_free_factorization(
        &self,
    ) -> Result<(Integer, Vec<(Self, usize)>), FactorizationError> {
        let (unit, monomial_factors, p) = self.split_unit_and_monomial()?;

        let mut factors = monomial_factors;
        for piece in p.factor_separable() {
            factors.extend(piece.square_free_factorization_0_char());
        }

        Ok((unit, factors))
    }

    fn factor(&self) -> Result<(Integer, Vec<(Self, usize)>), FactorizationError> {
        let (unit, monomial_factors, p) = self.split_unit_and_monomial()?;

        let mut factors: Vec<(Self, usize)> = vec![];
        for piece in p.factor_separable() {
            for (f, pow) in piece.square_free_factorization_0_char() {
                for g in f.factor_square_free()? {
                    factors.push((g, pow));
                }
            }
        }

        factors.sort_by(|a, b| Self::canonical_cmp(&a.0, &b.0).then(a.1.cmp(&b.1)));

        let mut res = monomial_factors;
        res.extend(factors);
        Ok((unit, res))
    }
}

impl<E: Exponent> MultivariatePolynomial<IntegerRing, E> {
    /// Split off the unit and the factors `x_i^k` that divide every term.
    #[allow(clippy::type_complexity)]
    fn split_unit_and_monomial(
        &self,
    ) -> Result<(Integer, Vec<(Self, usize)>, Self), FactorizationError> {
        if self.is_zero() {
            return Err(FactorizationError::Zero);
        }

        let mut unit = self.content();
        if self.lcoeff().is_negative() {
            unit = -unit;
        }

        let p = self.clone().div_coeff(&unit);

        let mut shared = p.exponents(0).to_vec();
        for t in 1..p.nterms() {
            for (md, v) in shared.iter_mut().zip(p.exponents(t)) {
                *md = (*md).min(*v);
            }
        }

        let mut monomial_factors = vec![];
        for (i, d) in shared.iter().enumerate() {
            if !d.is_zero() {
                monomial_factors.push((p.variable(i), d.to_u32() as usize));
            }
        }

        let p = if monomial_factors.is_empty() {
            p
        } else {
            p.div_exp(&shared)
        };

        Ok((unit, monomial_factors, p))
    }

    /// Compare two factors by their terms from the leading term down: first
    /// the exponents, then the coefficient. A polynomial that runs out of terms first is smaller.
    fn canonical_cmp(a: &Self, b: &Self) -> Ordering {
        for (i, j) in (0..a.nterms()).rev().zip((0..b.nterms()).rev()) {
            match a.exponents(i).cmp(b.exponents(j)) {
                Ordering::Equal => {}
                ord => return ord,
            }
            match a.coefficients[i].cmp(&b.coefficients[j]) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }

        a.nterms().cmp(&b.nterms())
    }

    /// Split a primitive polynomial into factors that contain every variable
    /// they depend on in each of their irreducible factors, by repeatedly splitting
    /// off the content in a variable.
    pub fn factor_separable(&self) -> Vec<Self> {
        let mut stack = vec![self.clone()];
        let mut res = vec![];

        while let Some(f) = stack.pop() {
            if f.is_constant() {
                continue;
            }

            let mut split = false;
            for x in f.occurring_variables() {
                let (c, pp) = f.content_and_primitive_part(x);
                if !c.is_constant() {
                    stack.push(c);
                    stack.push(pp);
                    split = true;
                    break;
                }
            }

            if !split {
                res.push(f);
            }
        }

        res
    }

    /// Compute the square-free factorization of a primitive polynomial with a positive
    /// leading coefficient using Yun's algorithm. Every irreducible factor of `self`
    /// must depend on the first occurring variable.
    pub fn square_free_factorization_0_char(&self) -> Vec<(Self, usize)> {
        if self.is_constant() {
            return vec![];
        }

        let x = self.occurring_variables()[0];

        let b = self.derivative(x);
        let c = self.gcd(&b);

        if c.is_one() {
            return vec![(self.clone(), 1)];
        }

        let mut factors = vec![];
        let mut w = self / &c;
        let mut y = &b / &c;

        let mut i = 1;
        while !w.is_constant() {
            let z = &y - &w.derivative(x);
            let g = w.gcd(&z);
            w = &w / &g;
            y = &z / &g;

            if !g.is_one() {
                factors.push((g, i));
            }
            i += 1;
        }

        factors
    }

    /// Factor a square-free, primitive polynomial with a positive leading coefficient
    /// whose irreducible factors all depend on every occurring variable.
    fn factor_square_free(&self) -> Result<Vec<Self>, FactorizationError> {
        let vars = self.occurring_variables();
        let degrees = self.degree_bounds();

        // primitive and linear in some variable means irreducible
        if vars.iter().any(|v| degrees[*v] == E::one()) {
            return Ok(vec![self.clone()]);
        }

        if vars.len() == 1 {
            let x = vars[0];
            let u = self.to_univariate(x);
            return Ok(u
                .factor_reconstruct()
                .iter()
                .map(|f| f.from_univariate(x, self))
                .collect());
        }

        let mut rng = StdRng::seed_from_u64(RNG_SEED);
        if let Some(factors) = self.factor_hensel(&vars, &mut rng) {
            return Ok(factors);
        }

        debug!("Multivariate lifting failed: using a Kronecker substitution");
        self.factor_kronecker(&vars)
    }

    /// Substitute the values of `alpha` for their variables.
    fn evaluate_at(&self, alpha: &[(usize, Integer)]) -> Self {
        let mut r = self.clone();
        for (v, a) in alpha {
            r = r.replace(*v, a);
        }
        r
    }

    fn product(factors: &[Self]) -> Self {
        let mut r = factors[0].clone();
        for f in &factors[1..] {
            r = &r * f;
        }
        r
    }

    /// Replace the leading coefficient in `x` by `lc`, which must not depend on `x`.
    fn with_lcoeff(&self, x: usize, lc: &Self) -> Self {
        let d = self.degree(x);
        let mut r = self.zero_with_capacity(self.nterms());
        for t in self {
            if t.exponents[x] < d {
                r.append_monomial_back(t.coefficient.clone(), t.exponents);
            }
        }

        let mut exp = vec![E::zero(); self.nvars()];
        exp[x] = d;
        &r + &lc.clone().mul_exp(&exp)
    }

    /// A bound on the coefficients of every divisor of `lc^(r-1) * self`, where
    /// `lc` is the leading coefficient in `x`.
    fn lifting_bound(&self, x: usize, r: usize) -> Integer {
        let a = self * &self.lcoeff_varorder(x).pow(r - 1);
        let norm = a
            .coefficients
            .iter()
            .fold(Integer::zero(), |acc, c| &acc + &c.abs());

        let degrees = a.degree_bounds();
        let total: u64 = degrees.iter().map(|d| d.to_u32() as u64).sum();
        let mut bound = &norm * &Integer::new(2).pow(total);
        for d in &degrees {
            bound = &bound * &Integer::from(d.to_u32() as u64 + 1);
        }
        bound
    }

    /// Factor a square-free polynomial in several variables by evaluating all variables
    /// but one at small integers, factoring the univariate image and lifting the image
    /// factors back with multivariate Hensel lifting. Returns `None` when no usable
    /// evaluation point is found.
    #[instrument(level = "debug", skip_all)]
    fn factor_hensel(&self, vars: &[usize], rng: &mut StdRng) -> Option<Vec<Self>> {
        let degrees = self.degree_bounds();
        let x = *vars.iter().min_by_key(|v| degrees[**v])?;
        let others: Vec<usize> = vars.iter().copied().filter(|v| *v != x).collect();
        let lc = self.lcoeff_varorder(x);

        let mut best: Option<(Vec<(usize, Integer)>, Vec<Self>)> = None;
        let mut candidates = 0;
        for attempt in 0..MAX_EVALUATION_ATTEMPTS {
            let range = 3 + 4 * attempt as i64;
            let alpha: Vec<(usize, Integer)> = others
                .iter()
                .map(|v| (*v, self.field.sample(rng, (-range, range + 1))))
                .collect();

            // the degree in x must be kept and the image must stay square-free
            if lc.evaluate_at(&alpha).is_zero() {
                continue;
            }
            let image = self.evaluate_at(&alpha);
            if !image.gcd(&image.derivative(x)).is_constant() {
                continue;
            }

            let u: Vec<Self> = image
                .make_primitive()
                .to_univariate(x)
                .factor_reconstruct()
                .iter()
                .map(|f| f.from_univariate(x, self))
                .collect();

            // an irreducible image of the same degree means an irreducible polynomial
            if u.len() == 1 {
                return Some(vec![self.clone()]);
            }

            candidates += 1;
            if best.as_ref().map_or(true, |(_, b)| u.len() < b.len()) {
                best = Some((alpha, u));
            }
            if candidates == EVALUATION_CANDIDATES {
                break;
            }
        }

        let (alpha, u) = best?;
        debug!("Lifting {} image factors in x{} at {:?}", u.len(), x, alpha);

        let lc_alpha = lc.evaluate_at(&alpha).get_constant();
        let image = self.evaluate_at(&alpha);
        let field = LARGE_U32_PRIMES
            .iter()
            .map(|p| FiniteField::new(*p))
            .find(|f| {
                if f.to_element(&lc_alpha) == 0 {
                    return false;
                }
                let ip = image.to_finite_field(f);
                ip.gcd_univariate(&ip.derivative(x)).is_one()
            })?;

        let modulus = LiftingModulus::new(field, &self.lifting_bound(x, u.len()));
        self.lift_and_recombine(x, &alpha, u, &modulus)
    }

    /// Lift the image factors `u`. If lifting all of them fails, some are spurious
    /// and the true factors are found by lifting two groups of image factors at a time,
    /// smallest groups first.
    fn lift_and_recombine(
        &self,
        x: usize,
        alpha: &[(usize, Integer)],
        mut u: Vec<Self>,
        modulus: &LiftingModulus,
    ) -> Option<Vec<Self>> {
        if let Some(factors) = self.lift_factors(x, alpha, &u, modulus) {
            return Some(factors);
        }

        debug!("Lifting all {} image factors failed: recombining", u.len());

        let mut rest = self.clone();
        let mut factors = vec![];
        let mut s = 1;
        'len: while 2 * s <= u.len() {
            let mut it = CombinationIterator::new(u.len(), s);
            while let Some(comb) = it.next() {
                let (mut g, mut h) = (vec![], vec![]);
                for (i, f) in u.iter().enumerate() {
                    if comb.contains(&i) {
                        g.push(f.clone());
                    } else {
                        h.push(f.clone());
                    }
                }

                let pair = [Self::product(&g), Self::product(&h)];
                if let Some(lifted) = rest.lift_factors(x, alpha, &pair, modulus) {
                    let used = comb.to_vec();
                    for &i in used.iter().rev() {
                        u.remove(i);
                    }

                    let g = lifted.into_iter().next()?;
                    rest = rest.divides(&g)?;
                    factors.push(g);
                    continue 'len;
                }
            }

            s += 1;
        }

        factors.push(rest.normalize());
        Some(factors)
    }

    /// Lift the factorization `self(x, alpha) = c * prod u` with univariate `u` in `x`
    /// to a factorization of `lc^(r-1) * self` modulo `p^k`, where every factor gets the
    /// leading coefficient `lc` of `self` in `x`. The variables of `alpha` are lifted
    /// one at a time. Returns the primitive parts of the lifted factors when their
    /// product is exact over the integers.
    fn lift_factors(
        &self,
        x: usize,
        alpha: &[(usize, Integer)],
        u: &[Self],
        modulus: &LiftingModulus,
    ) -> Option<Vec<Self>> {
        let m = &modulus.modulus;
        let r = u.len();
        let lc = self.lcoeff_varorder(x);
        let a = self * &lc.pow(r - 1);

        // images[i] only depends on x and the first i variables of alpha
        let mut images = vec![a.symmetric_mod(m)];
        for (v, av) in alpha.iter().rev() {
            let next = images[images.len() - 1].replace(*v, av).symmetric_mod(m);
            images.push(next);
        }
        images.reverse();

        // scale the image factors so that their leading coefficient is lc(alpha)
        let lc_alpha = lc.evaluate_at(alpha).get_constant();
        let mut factors: Vec<Self> = u
            .iter()
            .map(|f| {
                let scale = (&lc_alpha * &f.lcoeff().mod_inverse(m)).symmetric_mod(m);
                f.clone().mul_coeff(scale).symmetric_mod(m)
            })
            .collect();

        let max_deg = alpha
            .iter()
            .map(|(v, _)| a.degree(*v).to_u32())
            .max()
            .unwrap_or(0);

        for (i, (v, av)) in alpha.iter().enumerate() {
            let target = &images[i + 1];
            let previous = factors.clone();

            // impose the leading coefficient, evaluated in the variables still to be lifted
            let lc_i = lc.evaluate_at(&alpha[i + 1..]).symmetric_mod(m);
            for f in &mut factors {
                *f = f.with_lcoeff(x, &lc_i).symmetric_mod(m);
            }

            let shift = &self.variable(*v) - &self.constant(av.clone());
            let mut monomial = self.one();
            let mut e = (target - &Self::product(&factors)).symmetric_mod(m);

            for k in 1..=target.degree(*v).to_u32() {
                if e.is_zero() {
                    break;
                }

                monomial = &monomial * &shift;
                let c = e.taylor_coefficient(*v, av, k).symmetric_mod(m);
                if c.is_zero() {
                    continue;
                }

                let lifted = &alpha[..i];
                let du =
                    Self::multivariate_diophantine(&previous, &c, x, lifted, max_deg, modulus)?;
                for (f, d) in factors.iter_mut().zip(du) {
                    *f = (&*f + &(&d * &monomial)).symmetric_mod(m);
                }
                e = (target - &Self::product(&factors)).symmetric_mod(m);
            }
        }

        if Self::product(&factors) != a {
            trace!("Lifted factors do not multiply to the polynomial");
            return None;
        }

        Some(
            factors
                .into_iter()
                .map(|f| f.content_and_primitive_part(x).1.normalize())
                .collect(),
        )
    }

    /// The products `prod_{i != j} a_i` modulo `m` for every `j`.
    fn cofactor_products(a: &[Self], m: &Integer) -> Vec<Self> {
        (0..a.len())
            .map(|j| {
                let mut b = a[0].one();
                for (i, f) in a.iter().enumerate() {
                    if i != j {
                        b = (&b * f).symmetric_mod(m);
                    }
                }
                b
            })
            .collect()
    }

    /// `c - sum_j sigma_j b_j` modulo `m`.
    fn diophantine_error(c: &Self, sigma: &[Self], b: &[Self], m: &Integer) -> Self {
        let mut e = c.clone();
        for (s, bj) in sigma.iter().zip(b) {
            e = &e - &(s * bj);
        }
        e.symmetric_mod(m)
    }

    /// Solve `sum_j sigma_j prod_{i != j} a_i = c` modulo `p^k` and modulo
    /// `(x_i - alpha_i)^(max_deg + 1)` for the variables in `alpha`, with
    /// `deg_x sigma_j < deg_x a_j`.
    fn multivariate_diophantine(
        a: &[Self],
        c: &Self,
        x: usize,
        alpha: &[(usize, Integer)],
        max_deg: u32,
        modulus: &LiftingModulus,
    ) -> Option<Vec<Self>> {
        let Some(((v, av), rest)) = alpha.split_last() else {
            return Self::univariate_diophantine(a, c, modulus);
        };

        let m = &modulus.modulus;
        let b = Self::cofactor_products(a, m);
        let a_new: Vec<Self> = a.iter().map(|f| f.replace(*v, av).symmetric_mod(m)).collect();
        let c_new = c.replace(*v, av).symmetric_mod(m);

        let mut sigma = Self::multivariate_diophantine(&a_new, &c_new, x, rest, max_deg, modulus)?;
        let mut e = Self::diophantine_error(c, &sigma, &b, m);

        let shift = &c.variable(*v) - &c.constant(av.clone());
        let mut monomial = c.one();
        for k in 1..=max_deg {
            if e.is_zero() {
                break;
            }

            monomial = &monomial * &shift;
            let ck = e.taylor_coefficient(*v, av, k).symmetric_mod(m);
            if ck.is_zero() {
                continue;
            }

            let ds = Self::multivariate_diophantine(&a_new, &ck, x, rest, max_deg, modulus)?;
            for (s, d) in sigma.iter_mut().zip(ds) {
                *s = (&*s + &(&d * &monomial)).symmetric_mod(m);
            }
            e = Self::diophantine_error(c, &sigma, &b, m);
        }

        Some(sigma)
    }

    /// Solve `sum_j sigma_j prod_{i != j} a_i = c` modulo `p^k` for univariate `a_i`
    /// that are pairwise coprime modulo `p`. The solution modulo `p` is lifted
    /// p-adically.
    fn univariate_diophantine(
        a: &[Self],
        c: &Self,
        modulus: &LiftingModulus,
    ) -> Option<Vec<Self>> {
        let field = modulus.field;
        let m = &modulus.modulus;
        let b = Self::cofactor_products(a, m);
        let a_p: Vec<_> = a.iter().map(|f| f.to_finite_field(&field)).collect();

        // s_j is the inverse of b_j modulo a_j
        let mut s = Vec::with_capacity(a.len());
        for (ap, bj) in a_p.iter().zip(&b) {
            let bp = bj.to_finite_field(&field).quot_rem(ap, false).1;
            if bp.is_zero() {
                return None;
            }

            let (g, sj, _) = bp.eea_univariate(ap);
            if !g.is_one() {
                return None;
            }
            s.push(sj);
        }

        let mut sigma = vec![c.zero(); a.len()];
        let mut e = c.symmetric_mod(m);
        let mut pi = Integer::one();
        for _ in 0..modulus.k {
            if e.is_zero() {
                break;
            }

            let ci = e.div_coeff(&pi).to_finite_field(&field);
            for ((sg, sj), ap) in sigma.iter_mut().zip(&s).zip(&a_p) {
                let ds = (&ci * sj).quot_rem(ap, false).1;
                *sg = &*sg + &ds.to_symmetric_integer_polynomial().mul_coeff(pi.clone());
            }

            e = Self::diophantine_error(c, &sigma, &b, m);
            pi = &pi * &modulus.prime;
        }

        Some(sigma.into_iter().map(|sg| sg.symmetric_mod(m)).collect())
    }

    /// Project a polynomial that only depends on `x` to a polynomial in one variable.
    fn to_univariate(&self, x: usize) -> Self {
        let vars = Arc::new(vec![self.variables[x].clone()]);
        let mut r = MultivariatePolynomial::new(&self.field, self.nterms(), vars);
        for m in self {
            r.append_monomial_back(m.coefficient.clone(), &[m.exponents[x]]);
        }
        r
    }

    /// Embed a polynomial in one variable as the variable `x` of `template`.
    fn from_univariate(&self, x: usize, template: &Self) -> Self {
        let mut r = template.zero_with_capacity(self.nterms());
        let mut exp = vec![E::zero(); template.nvars()];
        for m in self {
            exp[x] = m.exponents[0];
            r.append_monomial_back(m.coefficient.clone(), &exp);
        }
        r
    }

    /// Factor a multivariate polynomial by mapping `x_i -> t^(w_i)` with
    /// mixed-radix weights, factoring the univariate image and recombining
    /// the image factors whose preimage divides the polynomial.
    fn factor_kronecker(&self, vars: &[usize]) -> Result<Vec<Self>, FactorizationError> {
        let degrees = self.degree_bounds();

        let mut weights = vec![0u64; self.nvars()];
        let mut w: u64 = 1;
        for &v in vars {
            weights[v] = w;
            w = w
                .checked_mul(degrees[v].to_u32() as u64 + 1)
                .unwrap_or(u64::MAX);
        }

        let image_degree = w - 1;
        if image_degree > MAX_SUBSTITUTION_DEGREE {
            return Err(FactorizationError::SubstitutionTooLarge {
                degree: image_degree,
                max: MAX_SUBSTITUTION_DEGREE,
            });
        }

        let t = vars[0];
        let mut image = self.zero_with_capacity(self.nterms());
        let mut exp = vec![E::zero(); self.nvars()];
        for m in self {
            let e: u64 = vars
                .iter()
                .map(|v| weights[*v] * m.exponents[*v].to_u32() as u64)
                .sum();
            exp[t] = E::try_from_u32(e as u32).ok_or(FactorizationError::SubstitutionTooLarge {
                degree: image_degree,
                max: MAX_SUBSTITUTION_DEGREE,
            })?;
            image.append_monomial(m.coefficient.clone(), &exp);
        }

        let (_, image_factors) = image.to_univariate(t).factor()?;

        let mut pool: Vec<Self> = vec![];
        for (f, pow) in image_factors {
            for _ in 0..pow {
                pool.push(f.clone());
            }
        }

        debug!(
            "Kronecker image of degree {} has {} irreducible factors",
            image_degree,
            pool.len()
        );

        if pool.len() == 1 {
            return Ok(vec![self.clone()]);
        }

        let mut rest = self.clone();
        let mut factors = vec![];
        let mut s = 1;

        'len: while 2 * s <= pool.len() {
            let mut it = CombinationIterator::new(pool.len(), s);
            while let Some(comb) = it.next() {
                let mut g = pool[comb[0]].clone();
                for &i in &comb[1..] {
                    g = &g * &pool[i];
                }

                let Some(g) = g.inverse_kronecker(vars, &weights, &degrees, self) else {
                    continue;
                };

                if g.is_constant() {
                    continue;
                }

                if let Some(q) = rest.divides(&g) {
                    let used = comb.to_vec();
                    for &i in used.iter().rev() {
                        pool.remove(i);
                    }

                    factors.push(g);
                    rest = q;
                    continue 'len;
                }
            }

            s += 1;
        }

        if !rest.is_constant() {
            factors.push(rest.normalize());
        }

        Ok(factors)
    }

    /// Map a univariate image back to a primitive polynomial in the variables `vars`.
    /// Returns `None` when the image does not correspond to a polynomial within the degree bounds.
    fn inverse_kronecker(
        &self,
        vars: &[usize],
        weights: &[u64],
        degrees: &[E],
        template: &Self,
    ) -> Option<Self> {
        let top = vars[vars.len() - 1];

        let mut r = template.zero_with_capacity(self.nterms());
        let mut exp = vec![E::zero(); template.nvars()];
        for m in self {
            let mut e = m.exponents[0].to_u32() as u64;
            for &v in vars.iter().rev() {
                let digit = e / weights[v];
                e %= weights[v];

                if v == top && digit > degrees[v].to_u32() as u64 {
                    return None;
                }
                exp[v] = E::from_u32(digit as u32);
            }
            r.append_monomial(m.coefficient.clone(), &exp);
        }

        Some(r.make_primitive())
    }

    /// Factor a square-free, primitive polynomial in one variable with a positive
    /// leading coefficient using a modular factorization, Hensel lifting and the
    /// recombination of Zassenhaus.
    pub fn factor_reconstruct(&self) -> Vec<Self> {
        assert_eq!(self.nvars(), 1, "Polynomial is not univariate");

        let d = self.degree(0).to_u32();
        if d <= 1 {
            return vec![self.clone()];
        }

        let lc = self.lcoeff().abs();

        // Mignotte bound for the coefficients of any factor, times the leading coefficient
        let mut sq = Integer::zero();
        for c in &self.coefficients {
            sq += &(c * c);
        }
        let bound = Integer::new(2).pow(d as u64 + 1) * &(&sq.isqrt() + &Integer::one()) * &lc;

        let mut rng = StdRng::seed_from_u64(RNG_SEED);

        let mut field = FiniteField::new(LARGE_U32_PRIMES[0]);
        let mut fp = self.to_finite_field(&field);
        for p in LARGE_U32_PRIMES
            .iter()
            .copied()
            .chain((3..LARGE_U32_PRIMES[0]).rev().filter(|n| is_prime_u32(*n)))
        {
            field = FiniteField::new(p);
            if field.to_element(&lc) == 0 {
                continue;
            }

            fp = self.to_finite_field(&field);
            if fp.gcd_univariate(&fp.derivative(0)).is_one() {
                break;
            }
        }

        let prime = Integer::from(field.get_prime());
        let modular_factors = fp.make_monic().factor_distinct_equal_degree(&mut rng);

        debug!(
            "Found {} modular factors of a polynomial of degree {} mod {}",
            modular_factors.len(),
            d,
            prime
        );

        if modular_factors.len() == 1 {
            return vec![self.clone()];
        }

        let mut modulus = prime.clone();
        while modulus <= bound {
            modulus = &modulus * &prime;
        }

        let monic = self
            .clone()
            .mul_coeff(self.lcoeff().mod_inverse(&modulus))
            .symmetric_mod(&modulus);
        let mut lifted = monic.multi_factor_hensel_lift(&modular_factors, &modulus);

        // recombine the lifted factors
        let mut rest = self.clone();
        let mut factors = vec![];
        let mut s = 1;
        'len: while 2 * s <= lifted.len() {
            let mut it = CombinationIterator::new(lifted.len(), s);
            while let Some(comb) = it.next() {
                let mut g = rest.constant(rest.lcoeff());
                for &i in comb {
                    g = (&g * &lifted[i]).symmetric_mod(&modulus);
                }
                let g = g.make_primitive();

                if let Some(q) = rest.divides(&g) {
                    let used = comb.to_vec();
                    for &i in used.iter().rev() {
                        lifted.remove(i);
                    }

                    factors.push(g);
                    rest = q;
                    continue 'len;
                }
            }

            s += 1;
        }

        if !rest.is_constant() {
            factors.push(rest.normalize());
        }

        factors
    }

    /// Lift the factorization `self = prod factors mod p` of a polynomial that is monic modulo
    /// `max`, a power of `p`, to a factorization with monic factors modulo `max`.
    fn multi_factor_hensel_lift(
        &self,
        factors: &[MultivariatePolynomial<FiniteField, E>],
        max: &Integer,
    ) -> Vec<Self> {
        if factors.len() == 1 {
            return vec![self.clone()];
        }

        let (left, right) = factors.split_at(factors.len() / 2);
        let mut g = left[0].clone();
        for f in &left[1..] {
            g = &g * f;
        }
        let mut h = right[0].clone();
        for f in &right[1..] {
            h = &h * f;
        }

        let (gz, hz) = self.hensel_lift(&g, &h, max);

        let mut res = gz.multi_factor_hensel_lift(left, max);
        res.extend(hz.multi_factor_hensel_lift(right, max));
        res
    }

    /// Lift `self = g * h mod p` with monic and coprime `g` and `h` to `self = G * H mod max`.
    fn hensel_lift(
        &self,
        g: &MultivariatePolynomial<FiniteField, E>,
        h: &MultivariatePolynomial<FiniteField, E>,
        max: &Integer,
    ) -> (Self, Self) {
        let field = g.field;
        let prime = Integer::from(field.get_prime());
        let (gcd, s, t) = g.eea_univariate(h);
        assert!(gcd.is_one(), "Modular factors are not coprime");

        let mut gz = g.to_symmetric_integer_polynomial();
        let mut hz = h.to_symmetric_integer_polynomial();

        let mut m = prime.clone();
        while &m < max {
            let e = (self - &(&gz * &hz)).symmetric_mod(max);
            if e.is_zero() {
                break;
            }

            let c = e.div_coeff(&m).to_finite_field(&field);

            let (q, r) = (&s * &c).quot_rem(h, false);
            let dg = &(&c * &t) + &(&q * g);

            let dg = dg.to_symmetric_integer_polynomial().mul_coeff(m.clone());
            let dh = r.to_symmetric_integer_polynomial().mul_coeff(m.clone());
            gz = (&gz + &dg).symmetric_mod(max);
            hz = (&hz + &dh).symmetric_mod(max);
            m = &m * &prime;
        }

        (gz, hz)
    }
}

impl<E: Exponent> MultivariatePolynomial<FiniteField, E> {
    /// Factor a monic, square-free polynomial in one variable into its monic irreducible factors.
    pub fn factor_distinct_equal_degree(&self, rng: &mut StdRng) -> Vec<Self> {
        let mut factors = vec![];
        for (d, f) in self.distinct_degree_factorization() {
            factors.extend(f.equal_degree_factorization(d, rng));
        }
        factors
    }

    /// Split a monic, square-free polynomial in one variable into products of
    /// irreducible factors of the same degree.
    pub fn distinct_degree_factorization(&self) -> Vec<(usize, Self)> {
        let prime = Integer::from(self.field.get_prime());
        let x = self.variable(0);

        let mut f = self.clone();
        let mut h = x.clone();
        let mut i: usize = 0;
        let mut factors = vec![];
        while !f.is_constant() {
            i += 1;

            let deg = f.degree(0).to_u32() as usize;
            if 2 * i > deg {
                factors.push((deg, f));
                break;
            }

            h = h.exp_mod_univariate(prime.clone(), &f);
            let g = f.gcd_univariate(&(&h - &x));

            if !g.is_one() {
                f = f.quot_rem(&g, false).0;
                h = h.quot_rem(&f, false).1;
                factors.push((i, g));
            }
        }

        factors
    }

    /// Split a monic, square-free polynomial in one variable whose irreducible factors
    /// all have degree `d`, using the algorithm of Cantor and Zassenhaus.
    pub fn equal_degree_factorization(&self, d: usize, rng: &mut StdRng) -> Vec<Self> {
        let n = self.degree(0).to_u32() as usize;
        if n == d {
            return vec![self.clone()];
        }

        let p = self.field.get_prime();
        let exp = (Integer::from(p).pow(d as u64) - &Integer::one())
            .quot_rem(&Integer::new(2))
            .0;

        loop {
            let mut a = self.zero();
            for i in 0..n {
                let c = self.field.sample(rng, (0, p as i64));
                a.append_monomial(c, &[E::from_u32(i as u32)]);
            }

            if a.is_constant() {
                continue;
            }

            let mut g = self.gcd_univariate(&a);
            if g.is_one() {
                let b = &a.exp_mod_univariate(exp.clone(), self) - &self.one();
                g = self.gcd_univariate(&b);
            }

            if !g.is_constant() && g.degree(0) < self.degree(0) {
                let h = self.quot_rem(&g, false).0;
                let mut factors = g.equal_degree_factorization(d, rng);
                factors.extend(h.equal_degree_factorization(d, rng));
                return factors;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::domains::finite_field::{FiniteField, LARGE_U32_PRIMES};
    use crate::domains::integer::{Integer, IntegerRing, Z};
    use crate::poly::polynomial::MultivariatePolynomial;
    use crate::poly::Variable;

    use super::{FactorizationError, Factorize, LiftingModulus, MAX_SUBSTITUTION_DEGREE};

    type IntPoly = MultivariatePolynomial<IntegerRing>;

    fn vars() -> (IntPoly, IntPoly, IntPoly) {
        let v = Arc::new(vec![Variable::new("x"), Variable::new("y"), Variable::new("z")]);
        let zero = MultivariatePolynomial::new(&Z, 0, v);
        (zero.variable(0), zero.variable(1), zero.variable(2))
    }

    fn expand(unit: &Integer, factors: &[(IntPoly, usize)], template: &IntPoly) -> IntPoly {
        let mut r = template.constant(unit.clone());
        for (f, pow) in factors {
            r = &r * &f.pow(*pow);
        }
        r
    }

    #[test]
    fn difference_of_squares() {
        let (x, y, _) = vars();
        let p = &(&x * &x) - &(&y * &y);
        let (unit, factors) = p.factor().unwrap();
        assert_eq!(unit, Integer::one());
        assert_eq!(factors, vec![(&x - &y, 1), (&x + &y, 1)]);
    }

    #[test]
    fn monomial_and_unit() {
        let (x, y, _) = vars();
        let p = (&(&x * &x) * &y).mul_coeff(Integer::new(-6));
        let (unit, factors) = p.factor().unwrap();
        assert_eq!(unit, Integer::new(-6));
        assert_eq!(factors, vec![(x.clone(), 2), (y.clone(), 1)]);

        let (unit, factors) = x.constant(Integer::new(-6)).factor().unwrap();
        assert_eq!(unit, Integer::new(-6));
        assert!(factors.is_empty());

        assert_eq!(x.zero().factor(), Err(FactorizationError::Zero));
    }

    #[test]
    fn univariate_zassenhaus() {
        let (x, _, _) = vars();
        let one = x.one();
        // (x^2 + 1)(x^2 - 2)(3x + 5)(x - 1)^2
        let a = &(&x * &x) + &one;
        let b = &(&x * &x) - &one.clone().mul_coeff(Integer::new(2));
        let c = &x.clone().mul_coeff(Integer::new(3)) + &one.clone().mul_coeff(Integer::new(5));
        let d = &x - &one;
        let p = &(&(&a * &b) * &c) * &d.pow(2);

        let (unit, factors) = p.factor().unwrap();
        assert_eq!(unit, Integer::one());
        assert_eq!(factors.len(), 4);
        assert!(factors.contains(&(a.clone(), 1)));
        assert!(factors.contains(&(b.clone(), 1)));
        assert!(factors.contains(&(c.clone(), 1)));
        assert!(factors.contains(&(d.clone(), 2)));
        assert_eq!(expand(&unit, &factors, &x), p);
    }

    #[test]
    fn irreducible_univariate() {
        let (x, _, _) = vars();
        // x^4 + 1 is irreducible over the integers but splits modulo every prime
        let p = &x.pow(4) + &x.one();
        let (unit, factors) = p.factor().unwrap();
        assert_eq!(unit, Integer::one());
        assert_eq!(factors, vec![(p.clone(), 1)]);
    }

    #[test]
    fn multivariate() {
        let (x, y, z) = vars();
        let f1 = &(&(&x * &x) * &y) + &(&z + &x.one());
        let f2 = &(&(&x * &z) - &(&y * &y)) + &x.constant(Integer::new(2));
        let f3 = &x + &y;
        let p = (&(&f1 * &f2) * &f3.pow(2)).mul_coeff(Integer::new(-2));

        let (unit, factors) = p.factor().unwrap();
        assert_eq!(unit, Integer::new(-2));
        assert_eq!(factors.len(), 3);
        assert!(factors.contains(&(f1.clone(), 1)));
        assert!(factors.contains(&(f2.clone(), 1)));
        assert!(factors.contains(&(f3.clone(), 2)));
        assert_eq!(expand(&unit, &factors, &x), p);
    }

    #[test]
    fn content_in_one_variable() {
        let (x, y, _) = vars();
        // (y^2 + 1) * (x^2 + y)
        let a = &(&y * &y) + &y.one();
        let b = &(&x * &x) + &y;
        let p = &a * &b;
        let (_, factors) = p.factor().unwrap();
        assert_eq!(factors, vec![(a, 1), (b, 1)]);
    }

    #[test]
    fn leading_coefficient() {
        let (x, y, z) = vars();
        // (x^2 y + z)(x^2 z + y + 1): the leading coefficient x^2 in y belongs to one factor
        let f1 = &(&(&x * &x) * &y) + &z;
        let f2 = &(&(&(&x * &x) * &z) + &y) + &x.one();
        let p = &f1 * &f2;

        let (unit, factors) = p.factor().unwrap();
        assert_eq!(unit, Integer::one());
        assert_eq!(factors.len(), 2);
        assert!(factors.contains(&(f1.clone(), 1)));
        assert!(factors.contains(&(f2.clone(), 1)));
    }

    #[test]
    fn lifting_recombines_image_factors() {
        let (x, y, _) = vars();
        let c = |n: i64| x.constant(Integer::new(n));
        let modulus =
            LiftingModulus::new(FiniteField::new(LARGE_U32_PRIMES[0]), &Integer::new(1000));
        let alpha = [(1, Integer::new(4))];

        // (x + y)(x^2 - y) at y = 4 is (x + 4)(x - 2)(x + 2)
        let f1 = &x + &y;
        let f2 = &(&x * &x) - &y;
        let p = &f1 * &f2;
        let u = vec![&x - &c(2), &x + &c(2), &x + &c(4)];
        assert!(p.lift_factors(0, &alpha, &u, &modulus).is_none());
        assert_eq!(
            p.lift_and_recombine(0, &alpha, u, &modulus),
            Some(vec![f1, f2.clone()])
        );

        // x^2 - y at y = 4 splits, but no lift exists
        let u = vec![&x - &c(2), &x + &c(2)];
        assert_eq!(f2.lift_and_recombine(0, &alpha, u, &modulus), Some(vec![f2.clone()]));
    }

    #[test]
    fn lifting_modulus() {
        let m = LiftingModulus::new(FiniteField::new(5), &Integer::new(100));
        assert_eq!((m.k, m.modulus), (4, Integer::new(625)));
        assert_eq!(m.prime, Integer::new(5));
    }

    #[test]
    fn kronecker_substitution() {
        let (x, y, _) = vars();
        let f1 = &(&x * &x) + &y;
        let f2 = &(&(&x * &y) - &y) + &x.one();
        let p = &f1 * &f2;

        let factors = p.factor_kronecker(&[0, 1]).unwrap();
        assert_eq!(factors.len(), 2);
        assert!(factors.contains(&f1));
        assert!(factors.contains(&f2));

        let q = &(&x.pow(40) + &y.pow(40)) + &x.one();
        assert_eq!(
            q.factor_kronecker(&[0, 1]),
            Err(FactorizationError::SubstitutionTooLarge {
                degree: 41 * 41 - 1,
                max: MAX_SUBSTITUTION_DEGREE
            })
        );
    }

    #[test]
    fn square_free() {
        let (x, y, _) = vars();
        let p = &(&x + &y).pow(3) * &(&x - &y);
        let (unit, factors) = p.square_free_factorization().unwrap();
        assert_eq!(unit, Integer::one());
        assert_eq!(factors, vec![(&x - &y, 1), (&x + &y, 3)]);
    }
}
