use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::Arc;

use ahash::HashMap;

use crate::domains::finite_field::FiniteField;
use crate::domains::integer::{Integer, IntegerRing};
use crate::domains::{EuclideanDomain, Field, Ring};

use super::{Exponent, Variable, POW_CACHE_SIZE};

/// Multivariate polynomial with a sparse degree and variable dense representation.
///
/// The terms are sorted in lexicographical order of their exponents, where the
/// first variable is the most significant. The last term is therefore the leading term.
#[derive(Clone, Debug)]
pub struct MultivariatePolynomial<F: Ring, E: Exponent = u32> {
    // Data format: the i-th monomial is stored as coefficients[i] and
    // exponents[i * nvars .. (i + 1) * nvars]. Keep coefficients.len() == nterms and
    // exponents.len() == nterms * nvars. Terms are always expanded and sorted by the exponents,
    // and zero coefficients are never stored.
    pub coefficients: Vec<F::Element>,
    pub exponents: Vec<E>,
    pub field: F,
    pub variables: Arc<Vec<Variable>>,
}

/// A view of a single term of a polynomial.
#[derive(Debug)]
pub struct MonomialView<'a, F: 'a + Ring, E: 'a + Exponent> {
    pub coefficient: &'a F::Element,
    pub exponents: &'a [E],
}

/// Iterator over the terms of a polynomial, from the lowest to the leading term.
pub struct MonomialViewIterator<'a, F: Ring, E: Exponent> {
    poly: &'a MultivariatePolynomial<F, E>,
    index: usize,
}

impl<'a, F: Ring, E: Exponent> Iterator for MonomialViewIterator<'a, F, E> {
    type Item = MonomialView<'a, F, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.poly.nterms() {
            return None;
        }

        let view = MonomialView {
            coefficient: &self.poly.coefficients[self.index],
            exponents: self.poly.exponents(self.index),
        };
        self.index += 1;
        Some(view)
    }
}

impl<'a, F: Ring, E: Exponent> IntoIterator for &'a MultivariatePolynomial<F, E> {
    type Item = MonomialView<'a, F, E>;
    type IntoIter = MonomialViewIterator<'a, F, E>;

    fn into_iter(self) -> Self::IntoIter {
        MonomialViewIterator {
            poly: self,
            index: 0,
        }
    }
}

impl<F: Ring, E: Exponent> MultivariatePolynomial<F, E> {
    /// Constructs a zero polynomial with the given variables and capacity.
    #[inline]
    pub fn new(field: &F, cap: usize, variables: Arc<Vec<Variable>>) -> Self {
        let nvars = variables.len();
        Self {
            coefficients: Vec::with_capacity(cap),
            exponents: Vec::with_capacity(cap * nvars),
            field: field.clone(),
            variables,
        }
    }

    /// Constructs a zero polynomial with the same variables and field as `self`.
    #[inline]
    pub fn zero(&self) -> Self {
        Self::new(&self.field, 0, self.variables.clone())
    }

    /// Constructs a zero polynomial with the given capacity.
    #[inline]
    pub fn zero_with_capacity(&self, cap: usize) -> Self {
        Self::new(&self.field, cap, self.variables.clone())
    }

    /// Constructs a constant polynomial with the same variables as `self`.
    #[inline]
    pub fn constant(&self, coeff: F::Element) -> Self {
        if F::is_zero(&coeff) {
            return self.zero();
        }

        Self {
            coefficients: vec![coeff],
            exponents: vec![E::zero(); self.nvars()],
            field: self.field.clone(),
            variables: self.variables.clone(),
        }
    }

    /// Constructs a polynomial that is one.
    #[inline]
    pub fn one(&self) -> Self {
        self.constant(self.field.one())
    }

    /// Constructs a polynomial with a single term.
    #[inline]
    pub fn monomial(&self, coeff: F::Element, exponents: Vec<E>) -> Self {
        debug_assert!(self.nvars() == exponents.len());

        if F::is_zero(&coeff) {
            return self.zero();
        }

        Self {
            coefficients: vec![coeff],
            exponents,
            field: self.field.clone(),
            variables: self.variables.clone(),
        }
    }

    /// Constructs the polynomial `x_index`.
    pub fn variable(&self, index: usize) -> Self {
        let mut exp = vec![E::zero(); self.nvars()];
        exp[index] = E::one();
        self.monomial(self.field.one(), exp)
    }

    #[inline]
    pub fn nterms(&self) -> usize {
        self.coefficients.len()
    }

    #[inline]
    pub fn nvars(&self) -> usize {
        self.variables.len()
    }

    #[inline]
    pub fn get_vars_ref(&self) -> &[Variable] {
        &self.variables
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.nterms() == 0
    }

    #[inline]
    pub fn is_one(&self) -> bool {
        self.is_constant() && self.field.is_one(&self.coefficients[0])
    }

    /// Returns true if the polynomial is constant, including zero.
    #[inline]
    pub fn is_constant(&self) -> bool {
        match self.nterms() {
            0 => true,
            1 => self.exponents.iter().all(|e| e.is_zero()),
            _ => false,
        }
    }

    /// Get the constant term of the polynomial.
    #[inline]
    pub fn get_constant(&self) -> F::Element {
        if self.is_zero() || !self.exponents(0).iter().all(|e| e.is_zero()) {
            return self.field.zero();
        }

        self.coefficients[0].clone()
    }

    /// Get the exponents of the `index`th monomial.
    #[inline]
    pub fn exponents(&self, index: usize) -> &[E] {
        &self.exponents[index * self.nvars()..(index + 1) * self.nvars()]
    }

    #[inline]
    pub fn last_exponents(&self) -> &[E] {
        assert!(self.nterms() > 0);
        &self.exponents[(self.nterms() - 1) * self.nvars()..self.nterms() * self.nvars()]
    }

    /// Get the leading coefficient.
    pub fn lcoeff(&self) -> F::Element {
        self.coefficients
            .last()
            .cloned()
            .unwrap_or_else(|| self.field.zero())
    }

    /// Get the degree of the variable `x`.
    pub fn degree(&self, x: usize) -> E {
        let mut max = E::zero();
        for t in 0..self.nterms() {
            if max < self.exponents(t)[x] {
                max = self.exponents(t)[x];
            }
        }
        max
    }

    /// Get the highest degree of every variable.
    pub fn degree_bounds(&self) -> Vec<E> {
        let mut max = vec![E::zero(); self.nvars()];
        for t in 0..self.nterms() {
            for (m, e) in max.iter_mut().zip(self.exponents(t)) {
                if *m < *e {
                    *m = *e;
                }
            }
        }
        max
    }

    /// Get the indices of the variables that occur in the polynomial.
    pub fn occurring_variables(&self) -> Vec<usize> {
        self.degree_bounds()
            .iter()
            .enumerate()
            .filter_map(|(i, d)| if d.is_zero() { None } else { Some(i) })
            .collect()
    }

    /// Check if the polynomial depends on at most one variable.
    pub fn is_univariate(&self) -> bool {
        self.occurring_variables().len() <= 1
    }

    /// Appends a monomial to the back. It does not check if the monomial
    /// is in the correct position. Use with care.
    #[inline]
    pub fn append_monomial_back(&mut self, coefficient: F::Element, exponents: &[E]) {
        if F::is_zero(&coefficient) {
            return;
        }

        self.coefficients.push(coefficient);
        self.exponents.extend_from_slice(exponents);
    }

    /// Appends a monomial to the polynomial, merging it with a term of the
    /// same exponents if present.
    pub fn append_monomial(&mut self, coefficient: F::Element, exponents: &[E]) {
        if F::is_zero(&coefficient) {
            return;
        }
        if self.nvars() != exponents.len() {
            panic!(
                "nvars mismatched: got {}, expected {}",
                exponents.len(),
                self.nvars()
            );
        }

        // should we append to the back?
        if self.nterms() == 0 || self.last_exponents() < exponents {
            self.coefficients.push(coefficient);
            self.exponents.extend_from_slice(exponents);
            return;
        }

        // binary search to find the insert-point
        let mut l = 0;
        let mut r = self.nterms();
        while l < r {
            let m = (l + r) / 2;
            match self.exponents(m).cmp(exponents) {
                Ordering::Less => l = m + 1,
                Ordering::Greater => r = m,
                Ordering::Equal => {
                    self.field
                        .add_assign(&mut self.coefficients[m], &coefficient);
                    if F::is_zero(&self.coefficients[m]) {
                        self.coefficients.remove(m);
                        let i = m * self.nvars();
                        self.exponents.drain(i..i + self.nvars());
                    }
                    return;
                }
            }
        }

        self.coefficients.insert(l, coefficient);
        let i = l * self.nvars();
        self.exponents.splice(i..i, exponents.iter().cloned());
    }

    /// Multiply every coefficient by `c`.
    pub fn mul_coeff(mut self, c: F::Element) -> Self {
        if F::is_zero(&c) {
            return self.zero();
        }
        if self.field.is_one(&c) {
            return self;
        }

        for coeff in &mut self.coefficients {
            self.field.mul_assign(coeff, &c);
        }
        self
    }

    /// Multiply by the monomial `c * x^exp`.
    pub fn mul_monomial(&self, c: &F::Element, exp: &[E]) -> Self {
        if F::is_zero(c) {
            return self.zero();
        }

        let mut res = self.clone();
        for coeff in &mut res.coefficients {
            self.field.mul_assign(coeff, c);
        }

        for t in res.exponents.chunks_mut(self.nvars().max(1)) {
            for (e1, e2) in t.iter_mut().zip(exp) {
                *e1 = e1
                    .checked_add(e2)
                    .unwrap_or_else(|| panic!("overflow in adding exponents"));
            }
        }

        res
    }

    /// Multiply by `x^exp`.
    pub fn mul_exp(self, exp: &[E]) -> Self {
        let one = self.field.one();
        self.mul_monomial(&one, exp)
    }

    /// Divide every exponent by the corresponding entry of `exp`.
    /// Every term must be divisible by `x^exp`.
    pub fn div_exp(mut self, exp: &[E]) -> Self {
        let nvars = self.nvars().max(1);
        for t in self.exponents.chunks_mut(nvars) {
            for (e1, e2) in t.iter_mut().zip(exp) {
                assert!(*e1 >= *e2, "Exponent cannot be negative");
                *e1 = *e1 - *e2;
            }
        }
        self
    }

    /// Compute `self^pow` by repeated squaring.
    pub fn pow(&self, mut pow: usize) -> Self {
        if pow == 0 {
            return self.one();
        }

        let mut x = self.clone();
        let mut y = self.one();
        while pow != 1 {
            if pow % 2 == 1 {
                y = &y * &x;
                pow -= 1;
            }

            x = &x * &x;
            pow /= 2;
        }

        &x * &y
    }

    /// Take the derivative of the polynomial w.r.t the variable `var`.
    pub fn derivative(&self, var: usize) -> Self {
        debug_assert!(var < self.nvars());

        let mut res = self.zero_with_capacity(self.nterms());

        let mut exp = vec![E::zero(); self.nvars()];
        for x in self {
            if x.exponents[var] > E::zero() {
                exp.copy_from_slice(x.exponents);
                let pow = exp[var].to_u32() as u64;
                exp[var] = exp[var] - E::one();
                res.append_monomial_back(self.field.mul(x.coefficient, &self.field.nth(pow)), &exp);
            }
        }

        res
    }

    /// Create a polynomial with the same exponents and coefficients mapped by `f`.
    /// Terms whose mapped coefficient is zero are removed.
    pub fn map_coeff<U: Ring, T: Fn(&F::Element) -> U::Element>(
        &self,
        f: T,
        field: U,
    ) -> MultivariatePolynomial<U, E> {
        let mut r = MultivariatePolynomial::new(&field, self.nterms(), self.variables.clone());
        for m in self {
            let nc = f(m.coefficient);
            r.append_monomial_back(nc, m.exponents);
        }
        r
    }

    /// Write the polynomial as `sum_i c_i(other vars) * x^i`, with the `c_i` sorted
    /// by increasing power `i`. The variable `x` does not occur in the `c_i`.
    pub fn to_univariate_polynomial_list(&self, x: usize) -> Vec<(Self, E)> {
        let mut list: BTreeMap<E, Self> = BTreeMap::new();

        let mut exp = vec![E::zero(); self.nvars()];
        for m in self {
            exp.copy_from_slice(m.exponents);
            let d = exp[x];
            exp[x] = E::zero();
            // terms with equal power of x stay sorted after zeroing x
            list.entry(d)
                .or_insert_with(|| self.zero())
                .append_monomial_back(m.coefficient.clone(), &exp);
        }

        list.into_iter().map(|(d, p)| (p, d)).collect()
    }

    /// Get the leading coefficient when the polynomial is viewed as a
    /// univariate polynomial in `x`.
    pub fn lcoeff_varorder(&self, x: usize) -> Self {
        let d = self.degree(x);
        let mut res = self.zero();
        let mut exp = vec![E::zero(); self.nvars()];
        for m in self {
            if m.exponents[x] == d {
                exp.copy_from_slice(m.exponents);
                exp[x] = E::zero();
                res.append_monomial_back(m.coefficient.clone(), &exp);
            }
        }
        res
    }

    /// Get the leading coefficient viewed as a polynomial in all variables except `n`,
    /// which must have the lowest sorting priority of the occurring variables.
    /// The result only depends on `n`.
    pub fn lcoeff_last(&self, n: usize) -> Self {
        if self.is_zero() {
            return self.clone();
        }

        let last = self.last_exponents();
        let mut res = self.zero();
        let mut e = vec![E::zero(); self.nvars()];
        for t in (0..self.nterms()).rev() {
            let exp = self.exponents(t);
            if (0..self.nvars()).all(|i| i == n || exp[i] == last[i]) {
                e[n] = exp[n];
                res.append_monomial(self.coefficients[t].clone(), &e);
            } else {
                break;
            }
        }

        res
    }

    /// Get the degree of the variable `v` in the leading monomial.
    pub fn ldegree(&self, v: usize) -> E {
        if self.is_zero() {
            return E::zero();
        }
        self.last_exponents()[v]
    }

    /// Get the highest degree of the leading monomial.
    pub fn ldegree_max(&self) -> E {
        if self.is_zero() {
            return E::zero();
        }
        self.last_exponents()
            .iter()
            .copied()
            .max()
            .unwrap_or_else(E::zero)
    }

    /// Build a polynomial from unsorted terms, merging equal exponents.
    fn from_unsorted_terms(&self, mut terms: Vec<(Vec<E>, F::Element)>) -> Self {
        terms.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let mut res = self.zero_with_capacity(terms.len());
        let mut iter = terms.into_iter().peekable();
        while let Some((e, mut c)) = iter.next() {
            while let Some((_, c2)) = iter.next_if(|(e2, _)| *e2 == e) {
                self.field.add_assign(&mut c, &c2);
            }
            res.append_monomial_back(c, &e);
        }
        res
    }

    /// Replace the variable `n` by the ring element `v`.
    pub fn replace(&self, n: usize, v: &F::Element) -> Self {
        let mut powers = vec![self.field.one()];
        let mut terms = Vec::with_capacity(self.nterms());
        for t in self {
            let k = t.exponents[n].to_u32() as usize;
            let c = if k < POW_CACHE_SIZE {
                while powers.len() <= k {
                    let next = self.field.mul(&powers[powers.len() - 1], v);
                    powers.push(next);
                }
                self.field.mul(t.coefficient, &powers[k])
            } else {
                self.field.mul(t.coefficient, &self.field.pow(v, k as u64))
            };

            let mut e = t.exponents.to_vec();
            e[n] = E::zero();
            terms.push((e, c));
        }

        self.from_unsorted_terms(terms)
    }

    /// Replace all variables except `v` by the values in `r`. Powers of the values are
    /// memoized in `cache`, which holds one table per variable where zero means not computed.
    pub fn replace_all_except(
        &self,
        v: usize,
        r: &[(usize, F::Element)],
        cache: &mut [Vec<F::Element>],
    ) -> Self {
        let mut tm: HashMap<E, F::Element> = HashMap::default();

        for t in self {
            let mut c = t.coefficient.clone();
            for (n, vv) in r {
                let p = t.exponents[*n].to_u32() as usize;
                if p > 0 {
                    if p < cache[*n].len() {
                        if F::is_zero(&cache[*n][p]) {
                            cache[*n][p] = self.field.pow(vv, p as u64);
                        }

                        self.field.mul_assign(&mut c, &cache[*n][p]);
                    } else {
                        self.field.mul_assign(&mut c, &self.field.pow(vv, p as u64));
                    }
                }
            }

            match tm.get_mut(&t.exponents[v]) {
                Some(acc) => self.field.add_assign(acc, &c),
                None => {
                    tm.insert(t.exponents[v], c);
                }
            }
        }

        let mut sorted: Vec<_> = tm.into_iter().collect();
        sorted.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let mut res = self.zero_with_capacity(sorted.len());
        let mut e = vec![E::zero(); self.nvars()];
        for (k, c) in sorted {
            e[v] = k;
            res.append_monomial_back(c, &e);
        }

        res
    }

    /// Split the polynomial into the coefficients of the monomials in all variables
    /// except `x`. The coefficients are polynomials in `x` only.
    pub fn coefficients_except(&self, x: usize) -> Vec<Self> {
        let mut tm: HashMap<Vec<E>, Self> = HashMap::default();

        for t in self {
            let mut rest = t.exponents.to_vec();
            rest[x] = E::zero();
            let mut e = vec![E::zero(); self.nvars()];
            e[x] = t.exponents[x];

            tm.entry(rest)
                .or_insert_with(|| self.zero())
                .append_monomial(t.coefficient.clone(), &e);
        }

        tm.into_values().collect()
    }
}

impl<F: EuclideanDomain, E: Exponent> MultivariatePolynomial<F, E> {
    /// Get the content of the polynomial, i.e., the gcd of the coefficients.
    pub fn content(&self) -> F::Element {
        if self.coefficients.is_empty() {
            return self.field.zero();
        }
        let mut c = self.field.zero();
        for cc in &self.coefficients {
            c = self.field.gcd(&c, cc);

            // early return if possible
            if self.field.is_one(&c) {
                break;
            }
        }
        c
    }

    /// Divide every coefficient by `other`. The division must be exact.
    pub fn div_coeff(mut self, other: &F::Element) -> Self {
        for c in &mut self.coefficients {
            match self.field.try_div(c, other) {
                Some(q) => *c = q,
                None => panic!("Coefficient {:?} is not divisible by {:?}", c, other),
            }
        }
        self
    }

    /// Divide `self` by `div` using the leading terms, returning the quotient and remainder.
    /// If `abort_on_remainder` is set, the division stops at the first term that
    /// moves to the remainder and the quotient is returned as zero.
    pub fn quot_rem(&self, div: &Self, abort_on_remainder: bool) -> (Self, Self) {
        if div.is_zero() {
            panic!("Cannot divide by 0 polynomial");
        }

        if self.is_zero() {
            return (self.zero(), self.zero());
        }

        let nvars = self.nvars();
        let lm = div.last_exponents().to_vec();
        let lc = div.lcoeff();

        // quotient terms are produced from the top down
        let mut q_terms: Vec<(F::Element, Vec<E>)> = vec![];
        let mut rem = self.zero();
        let mut p = self.clone();

        while !p.is_zero() {
            let pe = p.last_exponents();
            let qc = if pe.iter().zip(&lm).all(|(a, b)| a >= b) {
                self.field.try_div(&p.lcoeff(), &lc)
            } else {
                None
            };

            match qc {
                Some(qc) => {
                    let exp: Vec<E> = pe.iter().zip(&lm).map(|(a, b)| *a - *b).collect();
                    p = &p - &div.mul_monomial(&qc, &exp);
                    q_terms.push((qc, exp));
                }
                None => {
                    if abort_on_remainder {
                        return (self.zero(), p);
                    }

                    let c = p.coefficients.pop().unwrap_or_else(|| self.field.zero());
                    let e = p.exponents.split_off(p.exponents.len() - nvars);
                    rem.append_monomial(c, &e);
                }
            }
        }

        let mut q = self.zero_with_capacity(q_terms.len());
        for (c, e) in q_terms.into_iter().rev() {
            q.append_monomial_back(c, &e);
        }

        (q, rem)
    }

    /// Return the quotient if `div` divides `self` exactly.
    pub fn divides(&self, div: &Self) -> Option<Self> {
        if div.is_zero() {
            return None;
        }

        if self.is_zero() {
            return Some(self.zero());
        }

        if (0..self.nvars()).any(|i| div.degree(i) > self.degree(i)) {
            return None;
        }

        let (q, r) = self.quot_rem(div, true);
        if r.is_zero() {
            Some(q)
        } else {
            None
        }
    }
}

impl<E: Exponent> MultivariatePolynomial<IntegerRing, E> {
    /// Make the leading coefficient positive.
    pub fn normalize(self) -> Self {
        if self.lcoeff().is_negative() {
            -self
        } else {
            self
        }
    }

    /// Divide by the content and make the leading coefficient positive.
    pub fn make_primitive(self) -> Self {
        let c = self.content();
        if c.is_zero() {
            return self;
        }
        self.div_coeff(&c).normalize()
    }

    /// Map the polynomial to a finite field, dropping terms that vanish.
    pub fn to_finite_field(&self, field: &FiniteField) -> MultivariatePolynomial<FiniteField, E> {
        self.map_coeff(|c| field.to_element(c), *field)
    }

    /// The largest absolute value of the coefficients.
    pub fn max_norm(&self) -> Integer {
        self.coefficients
            .iter()
            .map(|c| c.abs())
            .max()
            .unwrap_or_else(Integer::zero)
    }

    /// Reduce all coefficients with the symmetric modulus `m`.
    pub fn symmetric_mod(&self, m: &Integer) -> Self {
        self.map_coeff(|c| c.symmetric_mod(m), self.field)
    }

    /// Get the coefficient of `(x_n - v)^k` in the expansion of the polynomial
    /// around `x_n = v`. The result does not depend on `x_n`.
    pub fn taylor_coefficient(&self, n: usize, v: &Integer, k: u32) -> Self {
        let mut terms = Vec::with_capacity(self.nterms());
        for t in self {
            let d = t.exponents[n].to_u32();
            if d < k {
                continue;
            }

            let mut binom = Integer::one();
            for i in 1..=(k as u64) {
                binom = (&binom * &Integer::from((d - k) as u64 + i))
                    .quot_rem(&Integer::from(i))
                    .0;
            }

            let c = &(t.coefficient * &binom) * &v.pow((d - k) as u64);
            let mut e = t.exponents.to_vec();
            e[n] = E::zero();
            terms.push((e, c));
        }

        self.from_unsorted_terms(terms)
    }
}

impl<E: Exponent> MultivariatePolynomial<FiniteField, E> {
    /// Map the polynomial to the integers, using the symmetric representation.
    pub fn to_symmetric_integer_polynomial(&self) -> MultivariatePolynomial<IntegerRing, E> {
        let field = self.field;
        self.map_coeff(|c| field.to_symmetric_integer(c), IntegerRing::new())
    }

    /// Divide by the leading coefficient.
    pub fn make_monic(self) -> Self {
        if self.is_zero() || self.field.is_one(&self.lcoeff()) {
            return self;
        }

        let ci = self.field.inv(&self.lcoeff());
        self.mul_coeff(ci)
    }

    /// Compute the monic gcd of two univariate polynomials.
    pub fn gcd_univariate(&self, b: &Self) -> Self {
        let mut a = self.clone();
        let mut b = b.clone();
        while !b.is_zero() {
            let r = a.quot_rem(&b, false).1;
            a = b;
            b = r;
        }
        a.make_monic()
    }

    /// Compute `self^n % m` for a univariate polynomial `self`.
    pub fn exp_mod_univariate(&self, mut n: Integer, m: &Self) -> Self {
        if n.is_zero() {
            return self.one();
        }

        let two = Integer::new(2);
        let mut b = self.quot_rem(m, false).1;
        let mut res = self.one();
        while !n.is_zero() {
            let (q, r) = n.quot_rem(&two);
            if r.is_one() {
                res = (&res * &b).quot_rem(m, false).1;
            }
            n = q;
            if !n.is_zero() {
                b = (&b * &b).quot_rem(m, false).1;
            }
        }

        res
    }

    /// Compute `(g, s, t)` where `self * s + other * t = g` with `g` the monic gcd
    /// of the two univariate polynomials.
    pub fn eea_univariate(&self, other: &Self) -> (Self, Self, Self) {
        let mut r0 = self.clone().make_monic();
        let mut r1 = other.clone().make_monic();
        let mut s0 = self.constant(self.field.inv(&self.lcoeff()));
        let mut s1 = self.zero();
        let mut t0 = self.zero();
        let mut t1 = self.constant(self.field.inv(&other.lcoeff()));

        while !r1.is_zero() {
            let (q, r) = r0.quot_rem(&r1, false);
            if r.is_zero() {
                return (r1, s1, t1);
            }

            let a = self.field.inv(&r.lcoeff());
            (r1, r0) = (r.mul_coeff(a), r1);
            (s1, s0) = ((&s0 - &(&q * &s1)).mul_coeff(a), s1);
            (t1, t0) = ((&t0 - &(&q * &t1)).mul_coeff(a), t1);
        }

        (r0, s0, t0)
    }
}

impl<F: Ring, E: Exponent> PartialEq for MultivariatePolynomial<F, E> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.nvars() == other.nvars()
            && self.coefficients == other.coefficients
            && self.exponents == other.exponents
    }
}

impl<F: Ring, E: Exponent> Eq for MultivariatePolynomial<F, E> {}

impl<'a, 'b, F: Ring, E: Exponent> Add<&'a MultivariatePolynomial<F, E>>
    for &'b MultivariatePolynomial<F, E>
{
    type Output = MultivariatePolynomial<F, E>;

    fn add(self, other: &'a MultivariatePolynomial<F, E>) -> Self::Output {
        assert_eq!(self.nvars(), other.nvars(), "nvars mismatched");

        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() {
            return self.clone();
        }

        let mut res = self.zero_with_capacity(self.nterms() + other.nterms());
        let (mut i, mut j) = (0, 0);
        while i < self.nterms() && j < other.nterms() {
            match self.exponents(i).cmp(other.exponents(j)) {
                Ordering::Less => {
                    res.append_monomial_back(self.coefficients[i].clone(), self.exponents(i));
                    i += 1;
                }
                Ordering::Greater => {
                    res.append_monomial_back(other.coefficients[j].clone(), other.exponents(j));
                    j += 1;
                }
                Ordering::Equal => {
                    let c = self
                        .field
                        .add(&self.coefficients[i], &other.coefficients[j]);
                    res.append_monomial_back(c, self.exponents(i));
                    i += 1;
                    j += 1;
                }
            }
        }

        for k in i..self.nterms() {
            res.append_monomial_back(self.coefficients[k].clone(), self.exponents(k));
        }
        for k in j..other.nterms() {
            res.append_monomial_back(other.coefficients[k].clone(), other.exponents(k));
        }

        res
    }
}

impl<F: Ring, E: Exponent> Add for MultivariatePolynomial<F, E> {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        &self + &other
    }
}

impl<'a, 'b, F: Ring, E: Exponent> Sub<&'a MultivariatePolynomial<F, E>>
    for &'b MultivariatePolynomial<F, E>
{
    type Output = MultivariatePolynomial<F, E>;

    fn sub(self, other: &'a MultivariatePolynomial<F, E>) -> Self::Output {
        self + &(-other.clone())
    }
}

impl<F: Ring, E: Exponent> Sub for MultivariatePolynomial<F, E> {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        &self - &other
    }
}

impl<F: Ring, E: Exponent> Neg for MultivariatePolynomial<F, E> {
    type Output = Self;

    fn neg(mut self) -> Self::Output {
        for c in &mut self.coefficients {
            *c = self.field.neg(c);
        }
        self
    }
}

impl<'a, 'b, F: Ring, E: Exponent> Mul<&'a MultivariatePolynomial<F, E>>
    for &'b MultivariatePolynomial<F, E>
{
    type Output = MultivariatePolynomial<F, E>;

    fn mul(self, other: &'a MultivariatePolynomial<F, E>) -> Self::Output {
        assert_eq!(self.nvars(), other.nvars(), "nvars mismatched");

        if self.is_zero() || other.is_zero() {
            return self.zero();
        }

        if other.nterms() == 1 {
            return self.mul_monomial(&other.coefficients[0], other.exponents(0));
        }
        if self.nterms() == 1 {
            return other.mul_monomial(&self.coefficients[0], self.exponents(0));
        }

        let nvars = self.nvars();
        let mut terms: HashMap<Vec<E>, F::Element> = HashMap::default();
        let mut exp = vec![E::zero(); nvars];
        for m1 in self {
            for m2 in other {
                for ((e, e1), e2) in exp.iter_mut().zip(m1.exponents).zip(m2.exponents) {
                    *e = e1
                        .checked_add(e2)
                        .unwrap_or_else(|| panic!("overflow in adding exponents"));
                }

                let c = self.field.mul(m1.coefficient, m2.coefficient);
                match terms.get_mut(&exp) {
                    Some(acc) => self.field.add_assign(acc, &c),
                    None => {
                        terms.insert(exp.clone(), c);
                    }
                }
            }
        }

        let mut sorted: Vec<_> = terms.into_iter().filter(|(_, c)| !F::is_zero(c)).collect();
        sorted.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let mut res = self.zero_with_capacity(sorted.len());
        for (e, c) in sorted {
            res.append_monomial_back(c, &e);
        }
        res
    }
}

impl<F: Ring, E: Exponent> Mul for MultivariatePolynomial<F, E> {
    type Output = Self;

    fn mul(self, other: Self) -> Self::Output {
        &self * &other
    }
}

impl<'a, 'b, F: EuclideanDomain, E: Exponent> Div<&'a MultivariatePolynomial<F, E>>
    for &'b MultivariatePolynomial<F, E>
{
    type Output = MultivariatePolynomial<F, E>;

    /// Exact division. Panics when `other` does not divide `self`.
    fn div(self, other: &'a MultivariatePolynomial<F, E>) -> Self::Output {
        self.divides(other)
            .unwrap_or_else(|| panic!("Not an exact division"))
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::domains::finite_field::FiniteField;
    use crate::domains::integer::{Integer, IntegerRing, Z};
    use crate::poly::Variable;

    use super::MultivariatePolynomial;

    type IntPoly = MultivariatePolynomial<IntegerRing>;

    fn xy() -> (IntPoly, IntPoly) {
        let vars = Arc::new(vec![Variable::new("x"), Variable::new("y")]);
        let zero = MultivariatePolynomial::new(&Z, 0, vars);
        (zero.variable(0), zero.variable(1))
    }

    #[test]
    fn arithmetic() {
        let (x, y) = xy();
        let a = &x + &y;
        let b = &x - &y;
        let p = &a * &b;
        let expected = &(&x * &x) - &(&y * &y);
        assert_eq!(p, expected);
        assert_eq!(p.nterms(), 2);
        assert_eq!(p.last_exponents(), &[2, 0]);
        assert_eq!(p.lcoeff(), Integer::one());
        assert!((&a - &a).is_zero());
        assert_eq!(a.pow(3).nterms(), 4);
    }

    #[test]
    fn append_monomial_merges() {
        let (x, _) = xy();
        let mut p = x.zero();
        p.append_monomial(Integer::new(3), &[1, 0]);
        p.append_monomial(Integer::new(1), &[0, 2]);
        p.append_monomial(Integer::new(2), &[0, 0]);
        p.append_monomial(Integer::new(-3), &[1, 0]);
        assert_eq!(p.nterms(), 2);
        assert_eq!(p.exponents(0), &[0, 0]);
        assert_eq!(p.exponents(1), &[0, 2]);
    }

    #[test]
    fn division() {
        let (x, y) = xy();
        let a = &(&x * &x) - &(&y * &y);
        let b = &x - &y;
        assert_eq!(a.divides(&b), Some(&x + &y));
        assert_eq!(a.divides(&(&x + &x.one())), None);

        let (q, r) = (&a + &x.one()).quot_rem(&b, false);
        assert_eq!(q, &x + &y);
        assert_eq!(r, x.one());
    }

    #[test]
    fn content_and_derivative() {
        let (x, y) = xy();
        let p = (&(&x * &y) + &y.constant(Integer::new(2))).mul_coeff(Integer::new(-3));
        assert_eq!(p.content(), Integer::new(3));
        assert_eq!(p.clone().make_primitive(), &(&x * &y) + &y.constant(Integer::new(2)));
        assert_eq!(p.derivative(0), y.clone().mul_coeff(Integer::new(-3)));

        let list = (&(&x * &y) + &y).to_univariate_polynomial_list(0);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0], (y.clone(), 0));
        assert_eq!(list[1], (y.clone(), 1));
    }

    #[test]
    fn univariate_finite_field() {
        let vars = Arc::new(vec![Variable::new("x")]);
        let field = FiniteField::new(7);
        let zero = MultivariatePolynomial::<_, u32>::new(&field, 0, vars);
        let x = zero.variable(0);

        // (x + 1) * (x + 2)
        let a = &(&x + &x.one()) * &(&x + &x.constant(2));
        let b = &x + &x.one();
        assert_eq!(a.gcd_univariate(&b), b);

        let (g, s, t) = a.eea_univariate(&(&x + &x.constant(3)));
        assert!(g.is_one());
        assert!((&(&a * &s) + &(&(&x + &x.constant(3)) * &t)).is_one());

        // x^4 = 1 mod x^2 + 1, so x^7 = x^3
        let m = &(&x * &x) + &x.one();
        assert_eq!(
            x.exp_mod_univariate(Integer::new(7), &m),
            x.exp_mod_univariate(Integer::new(3), &m)
        );
    }

    #[test]
    fn substitution() {
        let (x, y) = xy();
        // x^2 y + 3 x y^2 - y
        let p = &(&(&(&x * &x) * &y) + &(&(&x * &y) * &y).mul_coeff(Integer::new(3))) - &y;

        let two = Integer::new(2);
        assert_eq!(
            p.replace(0, &two),
            (&(&y * &y).mul_coeff(Integer::new(6)) + &y.clone().mul_coeff(Integer::new(3)))
        );

        let mut cache = vec![vec![Integer::zero(); 4], vec![Integer::zero(); 4]];
        let r = p.replace_all_except(0, &[(1, two.clone())], &mut cache);
        assert_eq!(
            r,
            &(&(&x * &x).mul_coeff(two.clone()) + &x.clone().mul_coeff(Integer::new(12)))
                - &x.constant(two.clone())
        );

        // the leading coefficient in x is y, and the coefficients in y alone
        assert_eq!(p.lcoeff_last(1), y);
        assert_eq!(p.coefficients_except(1).len(), 3);
        assert_eq!(p.ldegree(0), 2);
        assert_eq!(p.ldegree_max(), 2);
    }

    #[test]
    fn taylor_expansion() {
        let (x, y) = xy();
        // x y^2 = x ((y - 1) + 1)^2 = x (y - 1)^2 + 2 x (y - 1) + x
        let p = &(&x * &y) * &y;
        let one = Integer::one();
        assert_eq!(p.taylor_coefficient(1, &one, 0), x);
        assert_eq!(p.taylor_coefficient(1, &one, 1), x.clone().mul_coeff(Integer::new(2)));
        assert_eq!(p.taylor_coefficient(1, &one, 2), x);
        assert!(p.taylor_coefficient(1, &one, 3).is_zero());
    }
}
