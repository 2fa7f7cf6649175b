use std::cmp::{max, min};

use ahash::HashSet;
use rand::rngs::StdRng;
use rand::SeedableRng;
use smallvec::{smallvec, SmallVec};
use tracing::{debug, instrument, trace};

use crate::domains::finite_field::{FiniteField, LARGE_U32_PRIMES};
use crate::domains::integer::{Integer, IntegerRing};
use crate::domains::linear_system::{LinearSolverError, Matrix};
use crate::domains::{Field, Ring};

use super::polynomial::MultivariatePolynomial;
use super::{Exponent, INLINED_EXPONENTS, POW_CACHE_SIZE};

/// The upper bound of the range of sample points.
pub const MAX_RNG_PREFACTOR: u32 = 50000;

/// The number of unlucky samples after which an image is abandoned.
const MAX_SAMPLE_FAILURES: usize = 32;

const GCD_RNG_SEED: u64 = 0x5eed_9cd0;

type FFPoly<E> = MultivariatePolynomial<FiniteField, E>;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum GCDError {
    BadOriginalImage,
    BadCurrentImage,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum HeuristicGCDError {
    MaxSizeExceeded,
    BadReconstruction,
}

/// Rings whose polynomials have a greatest common divisor.
pub trait PolynomialGCD<E: Exponent>: Ring {
    /// Compute the gcd of two polynomials, normalized with [PolynomialGCD::normalize].
    fn gcd(
        a: &MultivariatePolynomial<Self, E>,
        b: &MultivariatePolynomial<Self, E>,
    ) -> MultivariatePolynomial<Self, E>;

    /// Choose the canonical associate of `a`.
    fn normalize(a: MultivariatePolynomial<Self, E>) -> MultivariatePolynomial<Self, E>;
}

impl<E: Exponent> PolynomialGCD<E> for IntegerRing {
    fn gcd(
        a: &MultivariatePolynomial<IntegerRing, E>,
        b: &MultivariatePolynomial<IntegerRing, E>,
    ) -> MultivariatePolynomial<IntegerRing, E> {
        MultivariatePolynomial::gcd_integer(a, b)
    }

    /// The associate with a positive leading coefficient.
    fn normalize(
        a: MultivariatePolynomial<IntegerRing, E>,
    ) -> MultivariatePolynomial<IntegerRing, E> {
        a.normalize()
    }
}

impl<F: PolynomialGCD<E>, E: Exponent> MultivariatePolynomial<F, E> {
    /// Compute the greatest common divisor of `self` and `b`.
    pub fn gcd(&self, b: &Self) -> Self {
        F::gcd(self, b)
    }

    /// Compute the gcd of a list of polynomials.
    pub fn gcd_multiple(mut f: Vec<Self>) -> Self {
        assert!(!f.is_empty());

        let mut gcd = f.swap_remove(0);
        for p in &f {
            if gcd.is_one() {
                break;
            }
            gcd = gcd.gcd(p);
        }
        F::normalize(gcd)
    }
}

/// Interpolate the images `u` at the points `a` to a polynomial in `x`,
/// using Newton's divided differences.
fn newton_interpolation<E: Exponent>(a: &[u64], u: &[FFPoly<E>], x: usize) -> FFPoly<E> {
    assert_eq!(u.len(), a.len());
    let field = u[0].field;

    // compute inverses
    let mut gammas = Vec::with_capacity(a.len());
    for k in 1..a.len() {
        let mut pr = field.sub(&a[k], &a[0]);
        for i in 1..k {
            field.mul_assign(&mut pr, &field.sub(&a[k], &a[i]));
        }
        gammas.push(field.inv(&pr));
    }

    // compute coefficients
    let mut v = vec![u[0].clone()];
    for k in 1..a.len() {
        let mut tmp = v[k - 1].clone();
        for j in (0..k - 1).rev() {
            tmp = &tmp.mul_coeff(field.sub(&a[k], &a[j])) + &v[j];
        }
        let r = (&u[k] - &tmp).mul_coeff(gammas[k - 1]);
        v.push(r);
    }

    // convert to standard form
    let xp = u[0].variable(x);
    let mut res = v[v.len() - 1].clone();
    for k in (0..v.len() - 1).rev() {
        res = &(&res * &(&xp - &u[0].constant(a[k]))) + &v[k];
    }
    res
}

/// One power table per variable, sized by the degrees of `a` and `b`.
fn pow_cache<E: Exponent>(a: &FFPoly<E>, b: &FFPoly<E>) -> Vec<Vec<u64>> {
    (0..a.nvars())
        .map(|i| {
            let d = max(a.degree(i), b.degree(i)).to_u32() as usize;
            vec![0; min(d + 1, POW_CACHE_SIZE)]
        })
        .collect()
}

fn clear_cache(cache: &mut [Vec<u64>]) {
    for c in cache {
        c.iter_mut().for_each(|x| *x = 0);
    }
}

fn sample_point(field: &FiniteField, rng: &mut StdRng) -> u64 {
    field.sample(rng, (1, MAX_RNG_PREFACTOR as i64))
}

/// Evaluate the monomials of `poly` without the coefficient at the point `r`.
fn evaluate_exponents<E: Exponent>(
    poly: &FFPoly<E>,
    r: &[(usize, u64)],
    cache: &mut [Vec<u64>],
) -> Vec<u64> {
    let field = poly.field;
    let mut eval = vec![field.one(); poly.nterms()];
    for (c, t) in eval.iter_mut().zip(poly) {
        for &(n, v) in r {
            let exp = t.exponents[n].to_u32() as usize;
            if exp > 0 {
                if exp < cache[n].len() {
                    if cache[n][exp] == 0 {
                        cache[n][exp] = field.pow(&v, exp as u64);
                    }
                    field.mul_assign(c, &cache[n][exp]);
                } else {
                    field.mul_assign(c, &field.pow(&v, exp as u64));
                }
            }
        }
    }
    eval
}

/// Build the univariate polynomial in `main_var` from the coefficients of `poly`
/// and the evaluated monomials `exp_evals`. The terms of `poly` must be grouped by
/// their power of `main_var`.
fn evaluate_using_exponents<E: Exponent>(
    poly: &FFPoly<E>,
    exp_evals: &[u64],
    main_var: usize,
) -> FFPoly<E> {
    let field = poly.field;
    let mut out = poly.zero();
    let mut c = field.zero();
    let mut new_exp = vec![E::zero(); poly.nvars()];
    for (t, e) in poly.into_iter().zip(exp_evals) {
        if t.exponents[main_var] != new_exp[main_var] {
            out.append_monomial_back(c, &new_exp);
            c = field.zero();
            new_exp[main_var] = t.exponents[main_var];
        }
        field.add_assign(&mut c, &field.mul(t.coefficient, e));
    }
    out.append_monomial_back(c, &new_exp);
    out
}

/// Solve the transposed Vandermonde systems that map the sampled coefficients
/// back to the coefficients of the shape.
fn solve_vandermonde<E: Exponent>(
    a: &FFPoly<E>,
    main_var: usize,
    shape: &[(FFPoly<E>, E)],
    row_sample_values: &[Vec<u64>],
    samples: &[Vec<u64>],
) -> FFPoly<E> {
    let field = a.field;
    let mut res = a.zero();

    for (((c, ex), sample), rhs) in shape.iter().zip(row_sample_values).zip(samples) {
        // the master polynomial prod_i (z - sample_i)
        let mut master = vec![field.zero(); sample.len() + 1];
        master[0] = field.one();
        for (i, x) in sample.iter().take(c.nterms()).enumerate() {
            let first = &mut master[0];
            let mut old_last = *first;
            field.mul_assign(first, &field.neg(x));
            for m in &mut master[1..=i] {
                let ov = *m;
                field.mul_assign(m, &field.neg(x));
                field.add_assign(m, &old_last);
                old_last = ov;
            }
            master[i + 1] = field.one();
        }

        for (i, s) in sample.iter().take(c.nterms()).enumerate() {
            let mut norm = field.one();
            for (j, l) in sample.iter().take(c.nterms()).enumerate() {
                if j != i {
                    field.mul_assign(&mut norm, &field.sub(s, l));
                }
            }

            // synthetic division of the master polynomial by (z - s)
            let mut coeff = field.zero();
            let mut last_q = field.zero();
            for (m, r) in master.iter().skip(1).zip(rhs).rev() {
                last_q = field.add(m, &field.mul(s, &last_q));
                field.add_assign(&mut coeff, &field.mul(&last_q, r));
            }
            field.mul_assign(&mut coeff, &field.inv(&field.mul(&norm, s)));

            let mut ee: SmallVec<[E; INLINED_EXPONENTS]> = c.exponents(i).into();
            ee[main_var] = *ex;
            res.append_monomial(coeff, &ee);
        }
    }

    res
}

/// Draw a sample point for `vars` for which every monomial of every part of
/// the shape evaluates to a distinct value.
fn sample_rows<E: Exponent>(
    field: &FiniteField,
    vars: &[usize],
    shape: &[(FFPoly<E>, E)],
    cache: &mut [Vec<u64>],
    rng: &mut StdRng,
) -> Option<(SmallVec<[(usize, u64); INLINED_EXPONENTS]>, Vec<Vec<u64>>)> {
    let r: SmallVec<[(usize, u64); INLINED_EXPONENTS]> =
        vars.iter().map(|i| (*i, sample_point(field, rng))).collect();

    let mut rows = Vec::with_capacity(shape.len());
    for (c, _) in shape {
        let row = evaluate_exponents(c, &r, cache);
        let mut seen = HashSet::default();
        if !row.iter().all(|x| seen.insert(*x)) {
            return None;
        }
        rows.push(row);
    }
    Some((r, rows))
}

/// Compute the gcd of the univariate images of `a` and `b` in `main_var` and
/// check it against the degree bound.
fn univariate_image<E: Exponent>(
    a_poly: &FFPoly<E>,
    b_poly: &FFPoly<E>,
    main_var: usize,
    bounds: &mut [E],
) -> Result<Option<FFPoly<E>>, GCDError> {
    let g = a_poly.gcd_univariate(b_poly);
    if g.ldegree(main_var) < bounds[main_var] {
        // the shape has too high a degree
        bounds[main_var] = g.ldegree(main_var);
        return Err(GCDError::BadOriginalImage);
    }
    if g.ldegree(main_var) > bounds[main_var] {
        return Ok(None);
    }
    Ok(Some(g))
}

/// Construct a new image of the gcd of `a` and `b` in the variables `vars` and
/// `main_var`, with the shape `shape` and one coefficient in `main_var` that
/// is a single monomial, so that it can be used to fix the scaling.
#[allow(clippy::too_many_arguments)]
fn construct_new_image_single_scale<E: Exponent>(
    a: &FFPoly<E>,
    b: &FFPoly<E>,
    a_ldegree: E,
    b_ldegree: E,
    bounds: &mut [E],
    single_scale: usize,
    vars: &[usize],
    main_var: usize,
    shape: &[(FFPoly<E>, E)],
    rng: &mut StdRng,
) -> Result<FFPoly<E>, GCDError> {
    let field = a.field;

    if vars.is_empty() {
        let g = a.gcd_univariate(b);
        if g.ldegree(main_var) < bounds[main_var] {
            bounds[main_var] = g.ldegree(main_var);
            return Err(GCDError::BadOriginalImage);
        }
        if g.ldegree(main_var) > bounds[main_var] {
            return Err(GCDError::BadCurrentImage);
        }

        if g.into_iter()
            .any(|m| shape.iter().all(|(_, pow)| *pow != m.exponents[main_var]))
        {
            return Err(GCDError::BadOriginalImage);
        }

        let (_, d) = &shape[single_scale];
        return match g.into_iter().find(|t| t.exponents[main_var] == *d) {
            Some(t) => {
                let inv = field.inv(t.coefficient);
                Ok(g.clone().mul_coeff(inv))
            }
            None => Err(GCDError::BadOriginalImage),
        };
    }

    let mut cache = pow_cache(a, b);
    let mut attempts = 0;
    let mut failure_count = 0;

    let (row_sample_values, samples) = 'find_root_sample: loop {
        attempts += 1;
        if attempts > MAX_SAMPLE_FAILURES {
            return Err(GCDError::BadCurrentImage);
        }

        clear_cache(&mut cache);
        let Some((r_orig, row_sample_values)) = sample_rows(&field, vars, shape, &mut cache, rng)
        else {
            continue;
        };

        let samples_needed = shape.iter().map(|(c, _)| c.nterms()).max().unwrap_or(0);
        let mut samples = vec![Vec::with_capacity(samples_needed); shape.len()];
        let mut r = r_orig.clone();

        let a_eval = evaluate_exponents(a, &r_orig, &mut cache);
        let b_eval = evaluate_exponents(b, &r_orig, &mut cache);
        let mut a_current = a_eval.clone();
        let mut b_current = b_eval.clone();

        for sample_index in 0..samples_needed {
            // sample at r^(sample_index + 1)
            if sample_index > 0 {
                for (c, rr) in r.iter_mut().zip(&r_orig) {
                    c.1 = field.mul(&c.1, &rr.1);
                }
                for (c, e) in a_current.iter_mut().zip(&a_eval) {
                    field.mul_assign(c, e);
                }
                for (c, e) in b_current.iter_mut().zip(&b_eval) {
                    field.mul_assign(c, e);
                }
            }

            let a_poly = evaluate_using_exponents(a, &a_current, main_var);
            let b_poly = evaluate_using_exponents(b, &b_current, main_var);

            if a_poly.ldegree(main_var) != a_ldegree || b_poly.ldegree(main_var) != b_ldegree {
                continue 'find_root_sample;
            }

            let Some(g) = univariate_image(&a_poly, &b_poly, main_var, bounds)? else {
                failure_count += 1;
                if failure_count > 2 {
                    // three images with too high a degree: the current image is bad
                    return Err(GCDError::BadCurrentImage);
                }
                continue 'find_root_sample;
            };

            // the value the monomial of the scaling term takes at this sample point
            let (c, d) = &shape[single_scale];
            let mut coeff = field.one();
            for (n, v) in &r {
                field.mul_assign(&mut coeff, &field.pow(v, c.exponents(0)[*n].to_u32() as u64));
            }

            let Some(t) = g.into_iter().find(|t| t.exponents[main_var] == *d) else {
                return Err(GCDError::BadOriginalImage);
            };
            let scale_factor = field.div(&coeff, t.coefficient);

            if g.into_iter()
                .any(|m| shape.iter().all(|(_, pow)| *pow != m.exponents[main_var]))
            {
                return Err(GCDError::BadOriginalImage);
            }

            for (rhs, (shape_part, exp)) in samples.iter_mut().zip(shape) {
                if rhs.len() == shape_part.nterms() {
                    continue;
                }

                let c = g
                    .into_iter()
                    .find(|m| m.exponents[main_var] == *exp)
                    .map(|m| field.mul(m.coefficient, &scale_factor))
                    .unwrap_or(0);
                rhs.push(c);
            }
        }

        break (row_sample_values, samples);
    };

    Ok(solve_vandermonde(
        a,
        main_var,
        shape,
        &row_sample_values,
        &samples,
    ))
}

/// Construct a new image of the gcd when no coefficient of the shape in `main_var`
/// is a single monomial. The unknown scaling of every univariate image is
/// determined from a linear system that couples two parts of the shape.
#[allow(clippy::too_many_arguments)]
fn construct_new_image_multiple_scales<E: Exponent>(
    a: &FFPoly<E>,
    b: &FFPoly<E>,
    a_ldegree: E,
    b_ldegree: E,
    bounds: &mut [E],
    vars: &[usize],
    main_var: usize,
    shape: &[(FFPoly<E>, E)],
    rng: &mut StdRng,
) -> Result<FFPoly<E>, GCDError> {
    let field = a.field;
    let mut cache = pow_cache(a, b);
    let mut attempts = 0;
    let mut failure_count = 0;

    // the parts of the shape sorted by the number of terms
    let mut shape_map: Vec<_> = (0..shape.len()).collect();
    shape_map.sort_unstable_by_key(|i| shape[*i].0.nterms());

    if shape.len() < 2 {
        return Err(GCDError::BadOriginalImage);
    }

    // linear relations between the coefficients of the scaling part
    let mut scaling_var_relations: Vec<Vec<u64>> = vec![];

    let max_terms = shape[shape_map[shape.len() - 1]].0.nterms();

    let (row_sample_values, samples) = 'find_root_sample: loop {
        attempts += 1;
        if attempts > MAX_SAMPLE_FAILURES {
            return Err(GCDError::BadCurrentImage);
        }

        clear_cache(&mut cache);
        let Some((r_orig, row_sample_values)) = sample_rows(&field, vars, shape, &mut cache, rng)
        else {
            continue;
        };

        let max_samples_needed = 2 * max_terms - 1;
        let mut samples = vec![Vec::with_capacity(max_samples_needed); shape.len()];
        let mut r = r_orig.clone();

        let a_eval = evaluate_exponents(a, &r_orig, &mut cache);
        let b_eval = evaluate_exponents(b, &r_orig, &mut cache);
        let mut a_current = a_eval.clone();
        let mut b_current = b_eval.clone();

        let mut second_index = 1;
        let mut solved_coeff: Option<Vec<u64>> = None;

        for sample_index in 0..max_samples_needed {
            if solved_coeff.is_some() && sample_index >= max_terms {
                break;
            }

            if sample_index > 0 {
                for (c, rr) in r.iter_mut().zip(&r_orig) {
                    c.1 = field.mul(&c.1, &rr.1);
                }
                for (c, e) in a_current.iter_mut().zip(&a_eval) {
                    field.mul_assign(c, e);
                }
                for (c, e) in b_current.iter_mut().zip(&b_eval) {
                    field.mul_assign(c, e);
                }
            }

            let a_poly = evaluate_using_exponents(a, &a_current, main_var);
            let b_poly = evaluate_using_exponents(b, &b_current, main_var);

            if a_poly.ldegree(main_var) != a_ldegree || b_poly.ldegree(main_var) != b_ldegree {
                continue 'find_root_sample;
            }

            let Some(g) = univariate_image(&a_poly, &b_poly, main_var, bounds)? else {
                failure_count += 1;
                if failure_count > 2 {
                    return Err(GCDError::BadCurrentImage);
                }
                continue 'find_root_sample;
            };

            if g.into_iter()
                .any(|m| shape.iter().all(|(_, pow)| *pow != m.exponents[main_var]))
            {
                return Err(GCDError::BadOriginalImage);
            }

            // set the coefficient of the scaling term to 1
            let (_, d) = &shape[shape_map[0]];
            let Some(scale) = g
                .into_iter()
                .find(|t| t.exponents[main_var] == *d)
                .map(|t| *t.coefficient)
            else {
                continue 'find_root_sample;
            };
            let g = g.mul_coeff(field.inv(&scale));

            for (rhs, (shape_part, exp)) in samples.iter_mut().zip(shape) {
                if solved_coeff.is_some() && rhs.len() == shape_part.nterms() {
                    continue;
                }

                let c = g
                    .into_iter()
                    .find(|m| m.exponents[main_var] == *exp)
                    .map(|m| *m.coefficient)
                    .unwrap_or(0);
                rhs.push(c);
            }

            // try to solve the system that couples the scaling part to another part
            while solved_coeff.is_none() {
                let vars_scale = shape[shape_map[0]].0.nterms() - 1;
                let vars_second = shape[shape_map[second_index]].0.nterms();
                let samples_needed = vars_scale + vars_second;
                let rows = samples_needed + scaling_var_relations.len();

                if sample_index + 1 < samples_needed {
                    break;
                }

                let row_eval_sec = &row_sample_values[shape_map[second_index]];
                let row_eval_first = &row_sample_values[shape_map[0]];

                let mut gfm = SmallVec::with_capacity(rows * samples_needed);
                let mut new_rhs = SmallVec::with_capacity(rows);

                for (si, rhs_sec) in samples[shape_map[second_index]]
                    .iter()
                    .take(samples_needed)
                    .enumerate()
                {
                    let e = si as u64 + 1;
                    new_rhs.push(field.mul(rhs_sec, &field.pow(&row_eval_first[0], e)));

                    for aa in row_eval_sec {
                        gfm.push(field.pow(aa, e));
                    }
                    for aa in &row_eval_first[1..] {
                        gfm.push(field.neg(&field.mul(rhs_sec, &field.pow(aa, e))));
                    }
                }

                for extra in &scaling_var_relations {
                    gfm.extend(std::iter::repeat(0).take(vars_second));
                    gfm.extend(extra[..vars_scale].iter().copied());
                    new_rhs.push(extra[extra.len() - 1]);
                }

                let m = Matrix {
                    shape: (rows as u32, samples_needed as u32),
                    data: gfm,
                    field,
                };
                let rhs = Matrix {
                    shape: (rows as u32, 1),
                    data: new_rhs,
                    field,
                };

                match m.solve(&rhs) {
                    Ok(x) => {
                        trace!("Solved the scaling system with {} rows", rows);
                        solved_coeff = Some(x.data[vars_second..].to_vec());
                    }
                    Err(LinearSolverError::Underdetermined {
                        row_reduced_matrix,
                        ..
                    }) => {
                        debug!("Underdetermined system in the scaling coefficients");

                        let Some(mat) = row_reduced_matrix else {
                            return Err(GCDError::BadOriginalImage);
                        };

                        // rows that only involve the scaling coefficients are new relations
                        for x in mat.row_iter() {
                            if x[..vars_second].iter().all(|y| *y == 0) && x.iter().any(|y| *y != 0)
                            {
                                scaling_var_relations.push(x[vars_second..].to_vec());
                            }
                        }

                        second_index += 1;
                        if second_index == shape.len() {
                            return Err(GCDError::BadOriginalImage);
                        }
                    }
                    Err(LinearSolverError::Inconsistent) => {
                        debug!("Inconsistent system in the scaling coefficients");
                        return Err(GCDError::BadOriginalImage);
                    }
                }
            }
        }

        let Some(solved) = solved_coeff else {
            return Err(GCDError::BadCurrentImage);
        };

        // the value of the scaling part at every sample point
        let row_eval_first = &row_sample_values[shape_map[0]];
        let mut lcoeff_cache = Vec::with_capacity(max_terms);
        for si in 0..max_terms {
            let e = si as u64 + 1;
            let mut scaling_factor = field.pow(&row_eval_first[0], e);
            for (exp_eval, coeff_eval) in row_eval_first[1..].iter().zip(&solved) {
                field.add_assign(
                    &mut scaling_factor,
                    &field.mul(coeff_eval, &field.pow(exp_eval, e)),
                );
            }
            lcoeff_cache.push(scaling_factor);
        }

        for ((c, _), rhs) in shape.iter().zip(&mut samples) {
            rhs.truncate(c.nterms());
            for (r, scale) in rhs.iter_mut().zip(&lcoeff_cache) {
                field.mul_assign(r, scale);
            }
        }

        break (row_sample_values, samples);
    };

    Ok(solve_vandermonde(
        a,
        main_var,
        shape,
        &row_sample_values,
        &samples,
    ))
}

impl<E: Exponent> MultivariatePolynomial<FiniteField, E> {
    /// Check if the coefficients of `a` and `b` in all variables but `x`
    /// have a trivial gcd.
    fn content_in_is_one(a: &Self, b: &Self, x: usize) -> bool {
        let mut g = a.zero();
        for c in a.coefficients_except(x).into_iter().chain(b.coefficients_except(x)) {
            g = g.gcd_univariate(&c);
            if g.is_one() {
                return true;
            }
        }
        g.is_one()
    }

    /// The gcd of the coefficients in all variables but `x`.
    fn content_in(&self, x: usize) -> Self {
        let mut g = self.zero();
        for c in self.coefficients_except(x) {
            g = g.gcd_univariate(&c);
            if g.is_one() {
                break;
            }
        }
        g
    }

    /// Find an upper bound of the degree of `var` in the gcd by evaluating all
    /// other variables at a random point.
    fn get_gcd_var_bound(ap: &Self, bp: &Self, vars: &[usize], var: usize, rng: &mut StdRng) -> E {
        let field = ap.field;
        let mut cache = pow_cache(ap, bp);

        let (a1, b1) = loop {
            clear_cache(&mut cache);
            let r: SmallVec<[(usize, u64); INLINED_EXPONENTS]> =
                vars.iter().map(|i| (*i, sample_point(&field, rng))).collect();

            let a1 = ap.replace_all_except(var, &r, &mut cache);
            let b1 = bp.replace_all_except(var, &r, &mut cache);

            if a1.ldegree(var) == ap.degree(var) && b1.ldegree(var) == bp.degree(var) {
                break (a1, b1);
            }

            debug!("Degree error during sampling: trying again");
        };

        a1.gcd_univariate(&b1).ldegree_max()
    }

    /// Compute the gcd of `a` and `b` modulo a prime with Zippel's sparse algorithm.
    /// The first variable in `vars` is the main variable and the last variable is
    /// interpolated densely. Returns `None` when the image cannot be used.
    #[instrument(level = "trace", skip_all)]
    fn gcd_shape_modular(
        a: &Self,
        b: &Self,
        vars: &[usize],
        bounds: &mut [E],
        tight_bounds: &mut [E],
        rng: &mut StdRng,
    ) -> Option<Self> {
        let lastvar = *vars.last()?;

        // if we are in the univariate case, return the univariate gcd
        if vars.len() == 1 {
            let gg = a.gcd_univariate(b);
            if gg.degree(lastvar) > bounds[lastvar] {
                return None;
            }
            bounds[lastvar] = gg.degree(lastvar);
            return Some(gg);
        }

        // the gcd of the content in the last variable should be 1
        if !Self::content_in_is_one(a, b, lastvar) {
            debug!("Content in last variable is not 1");
            return None;
        }

        let field = a.field;
        let gamma = a.lcoeff_last(lastvar).gcd_univariate(&b.lcoeff_last(lastvar));

        let mut failure_count = 0;

        'newfirstnum: loop {
            // if we had two failures, it may be that the tight degree bound
            // was too tight due to an unfortunate prime/evaluation, so we relax it
            if failure_count == 2 {
                debug!("Changing tight bound for x{} to {}", lastvar, bounds[lastvar]);
                tight_bounds[lastvar] = bounds[lastvar];
            }
            if failure_count > MAX_SAMPLE_FAILURES {
                return None;
            }
            failure_count += 1;

            let v = loop {
                let v = sample_point(&field, rng);
                if !gamma.replace(lastvar, &v).is_zero() {
                    break v;
                }
            };

            trace!("Chosen variable: {}", v);
            let av = a.replace(lastvar, &v);
            let bv = b.replace(lastvar, &v);

            // the first image is computed recursively
            let mut gv = if vars.len() > 2 {
                Self::gcd_shape_modular(
                    &av,
                    &bv,
                    &vars[..vars.len() - 1],
                    bounds,
                    tight_bounds,
                    rng,
                )?
            } else {
                let gg = av.gcd_univariate(&bv);
                if gg.degree(vars[0]) > bounds[vars[0]] {
                    return None;
                }
                bounds[vars[0]] = gg.degree(vars[0]);
                gg
            };

            if gv.is_zero() {
                return None;
            }

            // the shape of the gcd in the main variable
            let gfu = gv.to_univariate_polynomial_list(vars[0]);
            let single_scale = gfu.iter().position(|(c, _)| c.nterms() == 1);

            let gamma_v = gamma.replace(lastvar, &v).get_constant();
            let lc = gv.lcoeff();
            let mut gseq = vec![gv.clone().mul_coeff(field.div(&gamma_v, &lc))];
            let mut vseq = vec![v];

            let mut current_failures = 0;

            'newnum: loop {
                let needed =
                    (tight_bounds[lastvar].to_u32() + gamma.ldegree_max().to_u32() + 1) as usize;
                if gseq.len() >= needed {
                    break;
                }

                let v = loop {
                    let v = sample_point(&field, rng);
                    if !gamma.replace(lastvar, &v).is_zero() && !vseq.contains(&v) {
                        break v;
                    }
                };

                let av = a.replace(lastvar, &v);
                let bv = b.replace(lastvar, &v);

                let rec = match single_scale {
                    Some(s) => construct_new_image_single_scale(
                        &av,
                        &bv,
                        av.degree(vars[0]),
                        bv.degree(vars[0]),
                        bounds,
                        s,
                        &vars[1..vars.len() - 1],
                        vars[0],
                        &gfu,
                        rng,
                    ),
                    None => construct_new_image_multiple_scales(
                        &av,
                        &bv,
                        av.degree(vars[0]),
                        bv.degree(vars[0]),
                        bounds,
                        &vars[1..vars.len() - 1],
                        vars[0],
                        &gfu,
                        rng,
                    ),
                };

                match rec {
                    Ok(r) if !r.is_zero() => gv = r,
                    Err(GCDError::BadOriginalImage) => continue 'newfirstnum,
                    _ => {
                        current_failures += 1;
                        if current_failures > MAX_SAMPLE_FAILURES {
                            return None;
                        }
                        continue 'newnum;
                    }
                }

                let gamma_v = gamma.replace(lastvar, &v).get_constant();
                let lc = gv.lcoeff();
                gseq.push(gv.clone().mul_coeff(field.div(&gamma_v, &lc)));
                vseq.push(v);
            }

            // use interpolation to construct x_n dependence
            let mut gc = newton_interpolation(&vseq, &gseq, lastvar);

            // remove the content in x_n
            let cont = gc.content_in(lastvar);
            if !cont.is_one() {
                match gc.divides(&cont) {
                    Some(q) => gc = q,
                    None => continue 'newfirstnum,
                }
            }

            // do a probabilistic division test
            let mut cache = pow_cache(a, b);
            let (g1, a1, b1) = loop {
                clear_cache(&mut cache);
                let r: SmallVec<[(usize, u64); INLINED_EXPONENTS]> = vars[1..]
                    .iter()
                    .map(|i| (*i, sample_point(&field, rng)))
                    .collect();

                let g1 = gc.replace_all_except(vars[0], &r, &mut cache);
                if g1.ldegree(vars[0]) == gc.degree(vars[0]) {
                    let a1 = a.replace_all_except(vars[0], &r, &mut cache);
                    let b1 = b.replace_all_except(vars[0], &r, &mut cache);
                    break (g1, a1, b1);
                }
            };

            if g1.is_one() || (a1.divides(&g1).is_some() && b1.divides(&g1).is_some()) {
                return Some(gc);
            }

            debug!("Division test failed: restarting");
        }
    }
}

impl<E: Exponent> MultivariatePolynomial<IntegerRing, E> {
    /// Check for some trivial cases of the gcd. A constant operand
    /// yields the gcd of the contents.
    fn simple_gcd(a: &Self, b: &Self) -> Option<Self> {
        if a.is_zero() {
            return Some(b.clone().normalize());
        }
        if b.is_zero() {
            return Some(a.clone().normalize());
        }
        if a == b {
            return Some(a.clone().normalize());
        }
        if a.is_constant() || b.is_constant() {
            return Some(a.constant(a.content().gcd(&b.content())));
        }

        None
    }

    /// Compute the gcd of two polynomials with integer coefficients.
    /// The result includes the gcd of the integer contents and has a positive leading coefficient.
    #[instrument(level = "debug", skip_all)]
    pub fn gcd_integer(a: &Self, b: &Self) -> Self {
        assert_eq!(a.nvars(), b.nvars(), "nvars mismatched");

        if let Some(g) = Self::simple_gcd(a, b) {
            return g;
        }

        // strip the monomial factor shared by all terms
        let mut shared_degree: SmallVec<[E; INLINED_EXPONENTS]> = a.exponents(0).into();
        for t in 0..a.nterms() {
            for (md, v) in shared_degree.iter_mut().zip(a.exponents(t)) {
                *md = (*md).min(*v);
            }
        }
        for t in 0..b.nterms() {
            for (md, v) in shared_degree.iter_mut().zip(b.exponents(t)) {
                *md = (*md).min(*v);
            }
        }

        let has_shared = shared_degree.iter().any(|d| !d.is_zero());
        let (a, b) = if has_shared {
            (
                a.clone().div_exp(&shared_degree),
                b.clone().div_exp(&shared_degree),
            )
        } else {
            (a.clone(), b.clone())
        };

        let content = a.content().gcd(&b.content());
        let a = a.make_primitive();
        let b = b.make_primitive();

        let g = Self::gcd_recursive(&a, &b);

        let g = g.mul_coeff(content);
        if has_shared {
            g.mul_exp(&shared_degree).normalize()
        } else {
            g.normalize()
        }
    }

    /// Compute the gcd of two primitive polynomials. Cheap special cases are tried
    /// first, then the heuristic gcd and finally the modular gcd.
    fn gcd_recursive(a: &Self, b: &Self) -> Self {
        if let Some(g) = Self::simple_gcd(a, b) {
            return g;
        }

        let da = a.degree_bounds();
        let db = b.degree_bounds();

        // a variable that occurs in only one polynomial cannot occur in the gcd
        for x in 0..a.nvars() {
            if !da[x].is_zero() && db[x].is_zero() {
                return Self::gcd_with_coefficients(b, a, x);
            }
            if da[x].is_zero() && !db[x].is_zero() {
                return Self::gcd_with_coefficients(a, b, x);
            }
        }

        if let Some(g) = Self::try_heuristic_gcd(a, b) {
            return g.normalize();
        }

        if a.nterms() >= b.nterms() && a.divides(b).is_some() {
            return b.clone().normalize();
        }
        if b.nterms() >= a.nterms() && b.divides(a).is_some() {
            return a.clone().normalize();
        }

        // a polynomial that is linear in a variable is irreducible up to its content
        for (p1, p2, d1) in [(a, b, &da), (b, a, &db)] {
            if let Some(var) = (0..p1.nvars()).find(|v| d1[*v] == E::one()) {
                let (c1, pp1) = p1.content_and_primitive_part(var);
                let cont = if c1.is_one() {
                    c1
                } else {
                    let (c2, _) = p2.content_and_primitive_part(var);
                    Self::gcd_recursive(&c1, &c2)
                };

                return if p2.divides(&pp1).is_some() {
                    (&pp1 * &cont).normalize()
                } else {
                    cont
                };
            }
        }

        let vars = a.occurring_variables();
        let x = vars[0];

        let (ca, pa) = a.content_and_primitive_part(x);
        let (cb, pb) = b.content_and_primitive_part(x);
        if !ca.is_one() || !cb.is_one() {
            let content = Self::gcd_recursive(&ca, &cb);
            let g = Self::gcd_recursive(&pa, &pb);
            return (&g * &content).normalize();
        }

        trace!("Modular gcd in {} variables", vars.len());
        match Self::gcd_zippel(a, b, &vars) {
            Some(g) => g.normalize(),
            None => {
                debug!("Modular gcd failed: using a primitive remainder sequence");
                Self::primitive_prs(pa, pb, x)
            }
        }
    }

    /// Compute `gcd(a, b)` where `x` occurs in `b` but not in `a`, as the gcd of `a`
    /// and all the coefficients of `b` in `x`.
    fn gcd_with_coefficients(a: &Self, b: &Self, x: usize) -> Self {
        let mut list = vec![a.clone()];
        list.extend(b.to_univariate_polynomial_list(x).into_iter().map(|(c, _)| c));
        Self::gcd_multiple(list)
    }

    /// Compute the content of the polynomial viewed as a polynomial in `x`,
    /// i.e., the gcd of its coefficients in `x`, and the primitive part.
    pub fn content_and_primitive_part(&self, x: usize) -> (Self, Self) {
        let coeffs: Vec<_> = self
            .to_univariate_polynomial_list(x)
            .into_iter()
            .map(|(c, _)| c)
            .collect();

        if coeffs.is_empty() {
            return (self.zero(), self.clone());
        }

        let content = Self::gcd_multiple(coeffs);
        if content.is_one() {
            (content, self.clone())
        } else {
            let pp = self / &content;
            (content, pp)
        }
    }

    /// Decide whether the heuristic gcd is likely to succeed without
    /// creating huge integers, and run it if so.
    fn try_heuristic_gcd(a: &Self, b: &Self) -> Option<Self> {
        fn max_dense_size<E: Exponent>(
            p: &MultivariatePolynomial<IntegerRing, E>,
        ) -> (usize, SmallVec<[bool; INLINED_EXPONENTS]>) {
            let mut max_deg = 0;
            let mut contains: SmallVec<[bool; INLINED_EXPONENTS]> = smallvec![false; p.nvars()];
            for t in p {
                let mut deg = 1;
                for (var, e) in t.exponents.iter().enumerate() {
                    let v = e.to_u32() as usize;
                    if v > 0 {
                        contains[var] = true;
                        deg *= v + 1;
                    }
                }
                max_deg = max_deg.max(deg);
            }
            (max_deg, contains)
        }

        let (max_deg_a, contains_a) = max_dense_size(a);
        let (max_deg_b, contains_b) = max_dense_size(b);

        let num_shared_vars = contains_a
            .iter()
            .zip(&contains_b)
            .filter(|(a, b)| **a && **b)
            .count();

        if max_deg_a < 20
            || max_deg_b < 20
            || num_shared_vars < 3 && max_deg_a.min(max_deg_b) < 150
        {
            a.heuristic_gcd(b).ok().map(|(g, _, _)| g)
        } else {
            None
        }
    }

    /// Compute the gcd by evaluating a shared variable at a large integer,
    /// computing the gcd of the images and reconstructing the gcd from its
    /// `xi`-adic expansion. Also returns the cofactors.
    #[instrument(level = "trace", skip_all)]
    pub fn heuristic_gcd(&self, b: &Self) -> Result<(Self, Self, Self), HeuristicGCDError> {
        fn interpolate<E: Exponent>(
            mut gamma: MultivariatePolynomial<IntegerRing, E>,
            var: usize,
            xi: &Integer,
        ) -> MultivariatePolynomial<IntegerRing, E> {
            let mut g = gamma.zero();
            let mut i = 0;
            while !gamma.is_zero() {
                let g_i = gamma.symmetric_mod(xi);

                let mut shifted = g_i.clone();
                let nvars = shifted.nvars();
                for x in shifted.exponents.chunks_mut(nvars) {
                    x[var] = E::from_u32(i);
                }
                g = &g + &shifted;

                gamma = (&gamma - &g_i).div_coeff(xi);
                i += 1;
            }
            g
        }

        fn next_xi(xi: &Integer) -> Integer {
            (xi * &Integer::new(73794)).quot_rem(&Integer::new(27011)).0
        }

        trace!("a={}; b={}", self, b);

        let content_gcd = self.content().gcd(&b.content());
        if content_gcd.is_zero() {
            return Err(HeuristicGCDError::BadReconstruction);
        }

        let a = self.clone().div_coeff(&content_gcd);
        let b = b.clone().div_coeff(&content_gcd);

        let Some(var) =
            (0..a.nvars()).find(|x| a.degree(*x) > E::zero() && b.degree(*x) > E::zero())
        else {
            // the gcd is an integer
            let g = a.constant(content_gcd);
            return Ok((g, a, b));
        };

        let max_a = a.max_norm();
        let max_b = b.max_norm();
        let min_norm = if max_a > max_b { max_b } else { max_a };

        let limit = Integer::new(2).pow(256);
        let mut xi = &(&min_norm * &Integer::new(2)) + &Integer::new(29);

        for retry in 0..6 {
            debug!("Heuristic gcd retry {} with xi {}", retry, xi);

            let deg = max(a.degree(var), b.degree(var)).to_u32();
            if &xi * &Integer::from(deg) > limit {
                return Err(HeuristicGCDError::MaxSizeExceeded);
            }

            let aa = a.replace(var, &xi);
            let bb = b.replace(var, &xi);

            let (gamma, co_fac_p, co_fac_q) = match aa.heuristic_gcd(&bb) {
                Ok(x) => x,
                Err(HeuristicGCDError::MaxSizeExceeded) => {
                    return Err(HeuristicGCDError::MaxSizeExceeded);
                }
                Err(HeuristicGCDError::BadReconstruction) => {
                    xi = next_xi(&xi);
                    continue;
                }
            };

            let g = interpolate(gamma, var, &xi);
            if !g.is_zero() {
                let gc = g.clone().div_coeff(&g.content());

                if let Some(q) = a.divides(&gc) {
                    if let Some(q1) = b.divides(&gc) {
                        return Ok((gc.mul_coeff(content_gcd), q, q1));
                    }
                }
            }

            if !co_fac_p.is_zero() {
                let a_co_fac = interpolate(co_fac_p, var, &xi);
                if let Some(q) = a.divides(&a_co_fac) {
                    if let Some(q1) = b.divides(&q) {
                        return Ok((q.mul_coeff(content_gcd), a_co_fac, q1));
                    }
                }
            }

            if !co_fac_q.is_zero() {
                let b_co_fac = interpolate(co_fac_q, var, &xi);
                if let Some(q) = b.divides(&b_co_fac) {
                    if let Some(q1) = a.divides(&q) {
                        return Ok((q.mul_coeff(content_gcd), q1, b_co_fac));
                    }
                }
            }

            xi = next_xi(&xi);
        }

        Err(HeuristicGCDError::BadReconstruction)
    }

    /// Find tight upper bounds of the degrees of `vars` in the gcd from the
    /// image modulo the first prime that keeps the leading terms.
    fn get_gcd_var_bounds(
        a: &Self,
        b: &Self,
        vars: &[usize],
        loose_bounds: &[E],
        rng: &mut StdRng,
    ) -> SmallVec<[E; INLINED_EXPONENTS]> {
        let mut tight_bounds: SmallVec<[E; INLINED_EXPONENTS]> = loose_bounds.into();
        for p in LARGE_U32_PRIMES {
            let field = FiniteField::new(p);
            let ap = a.to_finite_field(&field);
            let bp = b.to_finite_field(&field);
            if !ap.is_zero()
                && !bp.is_zero()
                && ap.last_exponents() == a.last_exponents()
                && bp.last_exponents() == b.last_exponents()
            {
                for var in vars {
                    let others: SmallVec<[usize; INLINED_EXPONENTS]> =
                        vars.iter().filter(|i| *i != var).copied().collect();
                    tight_bounds[*var] = FFPoly::get_gcd_var_bound(&ap, &bp, &others, *var, rng);
                }
                break;
            }

            debug!("Variable bounds failed due to unlucky prime");
        }
        tight_bounds
    }

    /// Compute the gcd of two multivariate polynomials that are primitive in `vars[0]`,
    /// using Zippel's modular algorithm. The images modulo several primes are merged
    /// with the Chinese remainder theorem until the result stabilizes and divides both
    /// polynomials. Returns `None` when the primes are exhausted.
    #[instrument(level = "debug", skip_all)]
    fn gcd_zippel(a: &Self, b: &Self, vars: &[usize]) -> Option<Self> {
        debug!("Zippel gcd of {} and {} terms", a.nterms(), b.nterms());

        let mut rng = StdRng::seed_from_u64(GCD_RNG_SEED);

        let mut bounds: SmallVec<[E; INLINED_EXPONENTS]> =
            (0..a.nvars()).map(|i| min(a.degree(i), b.degree(i))).collect();
        let mut tight_bounds = Self::get_gcd_var_bounds(a, b, vars, &bounds, &mut rng);

        // the gcd of the leading coefficients in the main variable ordering
        let gamma = a.lcoeff().gcd(&b.lcoeff());

        let mut primes = LARGE_U32_PRIMES.iter();

        'newfirstprime: loop {
            let field = FiniteField::new(*primes.next()?);
            let gammap = field.to_element(&gamma);
            if gammap == 0 {
                continue;
            }

            let ap = a.to_finite_field(&field);
            let bp = b.to_finite_field(&field);

            debug!("New first image: a={}, b={} mod {}", ap, bp, field.get_prime());

            let Some(gp) = FFPoly::gcd_shape_modular(
                &ap,
                &bp,
                vars,
                &mut bounds,
                &mut tight_bounds,
                &mut rng,
            ) else {
                debug!("Unlucky first prime");
                continue;
            };

            bounds[vars[0]] = gp.degree(vars[0]);

            // the shape of the gcd in the main variable
            let gfu = gp.to_univariate_polynomial_list(vars[0]);
            let single_scale = gfu.iter().position(|(c, _)| c.nterms() == 1);

            // scale the image so that its leading coefficient is gamma
            let lcoeff_factor = field.div(&gammap, &gp.lcoeff());
            let mut gm = gp.map_coeff(
                |c| field.from_element(&field.mul(c, &lcoeff_factor)),
                IntegerRing::new(),
            );
            let mut m = Integer::from(field.get_prime());
            let mut old_gm = a.zero();

            loop {
                // stabilized: check if the candidate divides both
                if gm == old_gm {
                    let gc = gm.clone().make_primitive();
                    if a.divides(&gc).is_some() && b.divides(&gc).is_some() {
                        return Some(gc);
                    }

                    debug!("Does not divide: more primes needed");
                }

                old_gm = gm.clone();

                let (field, gammap) = loop {
                    let field = FiniteField::new(*primes.next()?);
                    let gammap = field.to_element(&gamma);
                    if gammap != 0 {
                        break (field, gammap);
                    }
                };

                let ap = a.to_finite_field(&field);
                let bp = b.to_finite_field(&field);

                let gp = if vars.len() == 1 {
                    let gp = ap.gcd_univariate(&bp);
                    if gp.degree(vars[0]) < bounds[vars[0]] {
                        debug!("Unlucky original prime: lower degree found");
                        continue 'newfirstprime;
                    }
                    if gp.degree(vars[0]) > bounds[vars[0]] {
                        debug!("Unlucky current prime: degree too high");
                        continue;
                    }
                    gp
                } else {
                    let rec = match single_scale {
                        Some(s) => construct_new_image_single_scale(
                            &ap,
                            &bp,
                            ap.degree(vars[0]),
                            bp.degree(vars[0]),
                            &mut bounds,
                            s,
                            &vars[1..],
                            vars[0],
                            &gfu,
                            &mut rng,
                        ),
                        None => construct_new_image_multiple_scales(
                            &ap,
                            &bp,
                            ap.degree(vars[0]),
                            bp.degree(vars[0]),
                            &mut bounds,
                            &vars[1..],
                            vars[0],
                            &gfu,
                            &mut rng,
                        ),
                    };

                    match rec {
                        Ok(r) if !r.is_zero() => r,
                        Err(GCDError::BadOriginalImage) => continue 'newfirstprime,
                        _ => continue,
                    }
                };

                let scale = field.div(&gammap, &gp.lcoeff());
                let gp = gp.mul_coeff(scale);

                // merge the new image with the Chinese remainder theorem
                let prime = Integer::from(field.get_prime());
                let mut merged = gm.zero_with_capacity(gm.nterms());
                let mut gpi = 0;
                for t in 0..gm.nterms() {
                    let gpc = if gpi < gp.nterms() && gm.exponents(t) == gp.exponents(gpi) {
                        gpi += 1;
                        gp.coefficients[gpi - 1]
                    } else {
                        0
                    };

                    let c = Integer::chinese_remainder(
                        &gm.coefficients[t],
                        &field.from_element(&gpc),
                        &m,
                        &prime,
                    );
                    merged.append_monomial_back(c, gm.exponents(t));
                }

                // the terms of the image must fit the shape
                if gpi != gp.nterms() {
                    debug!("Image does not fit the shape: restarting");
                    continue 'newfirstprime;
                }

                gm = merged;
                m = &m * &prime;
                trace!("Merged image modulo {}", m);
            }
        }
    }

    /// Compute `lcoeff(div)^k * self mod div` in the variable `x`, with
    /// `k` the number of reduction steps.
    pub fn pseudo_rem(&self, div: &Self, x: usize) -> Self {
        let db = div.degree(x);
        let lcb = div.lcoeff_varorder(x);

        let mut exp: SmallVec<[E; INLINED_EXPONENTS]> = smallvec![E::zero(); self.nvars()];
        let mut r = self.clone();
        while !r.is_zero() && r.degree(x) >= db {
            let dr = r.degree(x);
            let lcr = r.lcoeff_varorder(x);
            exp[x] = dr - db;
            r = &(&r * &lcb) - &(&lcr * div).mul_exp(&exp);
        }

        r
    }

    /// Compute the gcd of two polynomials that are primitive in `x`
    /// using a primitive pseudo-remainder sequence.
    fn primitive_prs(a: Self, b: Self, x: usize) -> Self {
        let (mut a, mut b) = if a.degree(x) >= b.degree(x) {
            (a, b)
        } else {
            (b, a)
        };

        loop {
            let r = a.pseudo_rem(&b, x);
            if r.is_zero() {
                return b.normalize();
            }

            if r.degree(x).is_zero() {
                return a.one();
            }

            let (_, r) = r.content_and_primitive_part(x);
            a = b;
            b = r;
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::domains::finite_field::FiniteField;
    use crate::domains::integer::{Integer, IntegerRing, Z};
    use crate::poly::polynomial::MultivariatePolynomial;
    use crate::poly::Variable;

    use super::newton_interpolation;

    type IntPoly = MultivariatePolynomial<IntegerRing>;

    fn vars() -> (IntPoly, IntPoly, IntPoly) {
        let v = Arc::new(vec![Variable::new("x"), Variable::new("y"), Variable::new("z")]);
        let zero = MultivariatePolynomial::new(&Z, 0, v);
        (zero.variable(0), zero.variable(1), zero.variable(2))
    }

    fn int(p: &IntPoly, n: i64) -> IntPoly {
        p.constant(Integer::new(n))
    }

    #[test]
    fn difference_of_squares() {
        let (x, y, _) = vars();
        let a = &(&x * &x) - &(&y * &y);
        let b = &x - &y;
        assert_eq!(a.gcd(&b), b);

        // the associate with a positive leading coefficient is chosen
        let c = &y - &x;
        assert_eq!(a.gcd(&c), b);
    }

    #[test]
    fn coprime() {
        let (x, y, _) = vars();
        assert!(x.gcd(&y).is_one());
        assert!((&x + &x.one()).gcd(&(&x - &x.one())).is_one());
    }

    #[test]
    fn zero_and_constants() {
        let (x, _, _) = vars();
        let a = x.clone().mul_coeff(Integer::new(-2));
        assert_eq!(a.gcd(&a.zero()), x.clone().mul_coeff(Integer::new(2)));
        assert_eq!(a.gcd(&a.constant(Integer::new(4))), a.constant(Integer::new(2)));
        assert!(a.zero().gcd(&a.zero()).is_zero());
    }

    #[test]
    fn integer_content_is_kept() {
        let (x, y, _) = vars();
        let a = (&x + &y).mul_coeff(Integer::new(6));
        let b = (&x + &y).mul_coeff(Integer::new(4));
        assert_eq!(a.gcd(&b), (&x + &y).mul_coeff(Integer::new(2)));
    }

    #[test]
    fn nontrivial_multivariate() {
        let (x, y, z) = vars();
        let g = &(&(&x * &y) + &z) + &int(&x, 3);
        let a = &g * &(&(&x * &x) + &(&y * &z));
        let b = &g * &(&(&z * &z) - &x);
        assert_eq!(a.gcd(&b), g);

        let c = &(&g * &g) * &(&x + &y);
        let d = &(&g * &x) * &(&y + &z);
        assert_eq!(c.gcd(&d), g);
    }

    #[test]
    fn shared_monomial() {
        let (x, y, _) = vars();
        let a = &(&x * &x) * &(&y + &x.one());
        let b = &(&x * &y) * &(&y + &x.one());
        assert_eq!(a.gcd(&b), &(&x * &y) + &x);
    }

    #[test]
    fn gcd_of_list() {
        let (x, y, _) = vars();
        let list = vec![
            &(&x * &x) - &(&y * &y),
            &(&x * &y) - &(&y * &y),
            (&x - &y).mul_coeff(Integer::new(3)),
        ];
        assert_eq!(MultivariatePolynomial::gcd_multiple(list), &x - &y);
    }

    #[test]
    fn heuristic() {
        let (x, y, z) = vars();
        let g = &(&(&x * &x) + &(&y * &z)) - &int(&x, 7);
        let p = &(&x * &y) + &int(&x, 2);
        let q = &(&z * &z) - &(&x * &y);
        let a = &g * &p;
        let b = &g * &q;

        let (gh, ca, cb) = a.heuristic_gcd(&b).unwrap();
        assert_eq!(gh.clone().normalize(), g);
        assert_eq!(&gh * &ca, a);
        assert_eq!(&gh * &cb, b);
    }

    #[test]
    fn zippel_single_scale() {
        let (x, y, z) = vars();
        // the coefficient of x^2 is a single monomial
        let g = &(&(&(&x * &x) * &y) + &(&x * &z)) + &(&(&y * &z) + &int(&x, 5));
        let a = &g * &(&(&x * &x) + &(&y * &y) + int(&x, 1));
        let b = &g * &(&(&x * &z) - &(&(&y * &y) * &z) + int(&x, 3));

        let r = MultivariatePolynomial::gcd_zippel(&a, &b, &[0, 1, 2]).unwrap();
        assert_eq!(r, g);
    }

    #[test]
    fn zippel_multiple_scales() {
        let (x, y, z) = vars();
        // every coefficient in x has two terms
        let g = &(&x * &(&y + &z)) + &(&(&y * &z) + &int(&x, 1));
        let a = &g * &(&(&x * &x) + &(&y + &int(&x, 2)));
        let b = &g * &(&(&x * &z) - &(&(&y * &y) - &int(&x, 3)));

        let r = MultivariatePolynomial::gcd_zippel(&a, &b, &[0, 1, 2]).unwrap();
        assert_eq!(r, g);
        assert_eq!(a.gcd(&b), g);
    }

    #[test]
    fn zippel_large_coefficients() {
        let (x, y, _) = vars();
        // coefficients beyond a single 32-bit prime need several images
        let big = Integer::new(3).pow(45);
        let g = &(&(&x * &y).mul_coeff(big.clone()) + &(&y * &y)) + &x.constant(big);
        let a = &g * &(&(&x * &x) + &(&y + &int(&x, 1)));
        let b = &g * &(&(&y * &y) - &(&x + &int(&x, 4)));

        let r = MultivariatePolynomial::gcd_zippel(&a, &b, &[0, 1]).unwrap();
        assert_eq!(r, g);
    }

    #[test]
    fn interpolation() {
        let field = FiniteField::new(17);
        let v = Arc::new(vec![Variable::new("x"), Variable::new("y")]);
        let zero: MultivariatePolynomial<FiniteField> = MultivariatePolynomial::new(&field, 0, v);

        // y^2 + 3 at y = 1, 2, 3 with x as a spectator
        let x = zero.variable(0);
        let images: Vec<_> = [4u64, 7, 12].iter().map(|c| &x + &zero.constant(*c)).collect();
        let r = newton_interpolation(&[1, 2, 3], &images, 1);

        let y = zero.variable(1);
        assert_eq!(r, &(&x + &(&y * &y)) + &zero.constant(3));
    }
}
