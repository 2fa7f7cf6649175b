use std::{
    cmp::Ordering,
    fmt::{Display, Error, Formatter},
    ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub},
    str::FromStr,
};

use rand::Rng;
use rug::{ops::Pow, Integer as MultiPrecisionInteger};

use crate::utils;

use super::{EuclideanDomain, Ring};

/// The integer ring.
pub type Z = IntegerRing;
/// The integer ring.
pub const Z: IntegerRing = IntegerRing::new();

/// The integer ring.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct IntegerRing;

impl Default for IntegerRing {
    fn default() -> Self {
        Self::new()
    }
}

impl IntegerRing {
    pub const fn new() -> IntegerRing {
        IntegerRing
    }
}

/// An arbitrary-precision integer. Values that fit in an `i64` are
/// always stored as [Integer::Natural], so that equal values have equal representations.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Integer {
    Natural(i64),
    Large(MultiPrecisionInteger),
}

impl From<i64> for Integer {
    #[inline]
    fn from(value: i64) -> Self {
        Integer::Natural(value)
    }
}

impl From<i32> for Integer {
    #[inline]
    fn from(value: i32) -> Self {
        Integer::Natural(value as i64)
    }
}

impl From<u32> for Integer {
    #[inline]
    fn from(value: u32) -> Self {
        Integer::Natural(value as i64)
    }
}

impl From<u64> for Integer {
    #[inline]
    fn from(value: u64) -> Self {
        if value <= i64::MAX as u64 {
            Integer::Natural(value as i64)
        } else {
            Integer::Large(value.into())
        }
    }
}

impl From<MultiPrecisionInteger> for Integer {
    #[inline]
    fn from(n: MultiPrecisionInteger) -> Self {
        if let Some(n) = n.to_i64() {
            Integer::Natural(n)
        } else {
            Integer::Large(n)
        }
    }
}

impl FromStr for Integer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(n) = s.parse::<i64>() {
            return Ok(Integer::Natural(n));
        }

        MultiPrecisionInteger::from_str_radix(s, 10)
            .map(Integer::from)
            .map_err(|e| format!("Could not parse integer {}: {}", s, e))
    }
}

impl std::fmt::Debug for Integer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Integer::Natural(n) => std::fmt::Debug::fmt(n, f),
            Integer::Large(r) => std::fmt::Debug::fmt(r, f),
        }
    }
}

impl Integer {
    pub fn new(num: i64) -> Integer {
        Integer::Natural(num)
    }

    pub fn to_multi_prec(&self) -> MultiPrecisionInteger {
        match self {
            Integer::Natural(n) => MultiPrecisionInteger::from(*n),
            Integer::Large(l) => l.clone(),
        }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        match self {
            Integer::Natural(n) => *n == 0,
            Integer::Large(_) => false,
        }
    }

    #[inline]
    pub fn is_one(&self) -> bool {
        match self {
            Integer::Natural(n) => *n == 1,
            Integer::Large(_) => false,
        }
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        match self {
            Integer::Natural(n) => *n < 0,
            Integer::Large(r) => r.cmp0() == Ordering::Less,
        }
    }

    #[inline]
    pub fn zero() -> Integer {
        Integer::Natural(0)
    }

    #[inline]
    pub fn one() -> Integer {
        Integer::Natural(1)
    }

    #[inline]
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Integer::Natural(n) => Some(*n),
            Integer::Large(_) => None,
        }
    }

    pub fn abs(&self) -> Integer {
        if self.is_negative() {
            -self
        } else {
            self.clone()
        }
    }

    pub fn abs_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Integer::Natural(n1), Integer::Natural(n2)) => {
                n1.unsigned_abs().cmp(&n2.unsigned_abs())
            }
            _ => self.to_multi_prec().cmp_abs(&other.to_multi_prec()),
        }
    }

    pub fn pow(&self, e: u64) -> Integer {
        if e > u32::MAX as u64 {
            panic!("Power of exponentiation is too large");
        }
        let e = e as u32;
        match self {
            Integer::Natural(n1) => {
                if let Some(pn) = n1.checked_pow(e) {
                    Integer::Natural(pn)
                } else {
                    Integer::from(MultiPrecisionInteger::from(*n1).pow(e))
                }
            }
            Integer::Large(r) => Integer::from(r.clone().pow(e)),
        }
    }

    /// Euclidean division, so that the remainder is never negative.
    pub fn quot_rem(&self, b: &Integer) -> (Integer, Integer) {
        if b.is_zero() {
            panic!("Cannot divide by zero");
        }

        if let (Integer::Natural(aa), Integer::Natural(bb)) = (self, b) {
            if let (Some(q), Some(r)) = (aa.checked_div_euclid(*bb), aa.checked_rem_euclid(*bb)) {
                return (Integer::Natural(q), Integer::Natural(r));
            }
        }

        let (q, r) = self.to_multi_prec().div_rem_euc(b.to_multi_prec());
        (Integer::from(q), Integer::from(r))
    }

    /// Divide `self` by `b` if the division is exact.
    pub fn try_div(&self, b: &Integer) -> Option<Integer> {
        let (q, r) = self.quot_rem(b);
        if r.is_zero() {
            Some(q)
        } else {
            None
        }
    }

    pub fn gcd(&self, b: &Integer) -> Integer {
        match (self, b) {
            (Integer::Natural(n1), Integer::Natural(n2)) => {
                Integer::from(utils::gcd_signed(*n1, *n2))
            }
            (Integer::Natural(n1), Integer::Large(r2))
            | (Integer::Large(r2), Integer::Natural(n1)) => {
                Integer::from(MultiPrecisionInteger::from(*n1).gcd(r2))
            }
            (Integer::Large(r1), Integer::Large(r2)) => Integer::from(r1.clone().gcd(r2)),
        }
    }

    /// Compute the least common multiple of two integers.
    pub fn lcm(&self, b: &Integer) -> Integer {
        let g = self.gcd(b);
        if g.is_zero() {
            Integer::zero()
        } else {
            (self.quot_rem(&g).0 * b).abs()
        }
    }

    /// Perform the symmetric mod `p` on `self`, yielding a value in `(-p/2, p/2]`.
    #[inline]
    pub fn symmetric_mod(&self, p: &Integer) -> Integer {
        let c = self.quot_rem(p).1;

        if &c + &c > *p {
            &c - p
        } else {
            c
        }
    }

    /// Compute the modular inverse of `self` in the ring with size `n`.
    /// `self` and `n` must be coprime.
    pub fn mod_inverse(&self, n: &Integer) -> Integer {
        let mut t0 = Integer::zero();
        let mut t1 = Integer::one();
        let mut r0 = n.clone();
        let mut r1 = self.quot_rem(n).1;

        while !r1.is_zero() {
            let (q, r) = r0.quot_rem(&r1);
            (t1, t0) = (&t0 - &(&q * &t1), t1);
            (r1, r0) = (r, r1);
        }

        if r0 > Integer::one() {
            panic!("{} is not invertible in ring {}", self, n);
        }
        if t0.is_negative() {
            t0 += n;
        }

        t0
    }

    /// Reconstruct the `x` in `(-p1*p2/2, p1*p2/2]` with `x = n1 mod p1` and `x = n2 mod p2`,
    /// using Garner's algorithm. The moduli must be coprime.
    pub fn chinese_remainder(n1: &Integer, n2: &Integer, p1: &Integer, p2: &Integer) -> Integer {
        let n1 = n1.quot_rem(p1).1;
        let gamma1 = p1.mod_inverse(p2);

        // mixed-radix digit
        let v1 = (&(n2 - &n1) * &gamma1).quot_rem(p2).1;

        (&(&v1 * p1) + &n1).symmetric_mod(&(p1 * p2))
    }

    /// The floor of the square root of a non-negative integer.
    pub fn isqrt(&self) -> Integer {
        if self.is_negative() {
            panic!("Cannot take the square root of negative number {}", self);
        }

        Integer::from(self.to_multi_prec().sqrt())
    }
}

impl Display for Integer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Integer::Natural(n) => n.fmt(f),
            Integer::Large(r) => r.fmt(f),
        }
    }
}

impl Display for IntegerRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Z")
    }
}

impl PartialOrd for Integer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Integer {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Integer::Natural(n1), Integer::Natural(n2)) => n1.cmp(n2),
            (Integer::Natural(n1), Integer::Large(r2)) => {
                MultiPrecisionInteger::from(*n1).cmp(r2)
            }
            (Integer::Large(r1), Integer::Natural(n2)) => {
                r1.cmp(&MultiPrecisionInteger::from(*n2))
            }
            (Integer::Large(r1), Integer::Large(r2)) => r1.cmp(r2),
        }
    }
}

impl Ring for IntegerRing {
    type Element = Integer;

    #[inline]
    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        a + b
    }

    #[inline]
    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        a - b
    }

    #[inline]
    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        a * b
    }

    #[inline]
    fn add_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a += b;
    }

    #[inline]
    fn mul_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a *= b;
    }

    #[inline]
    fn neg(&self, a: &Self::Element) -> Self::Element {
        -a
    }

    #[inline]
    fn zero(&self) -> Self::Element {
        Integer::zero()
    }

    #[inline]
    fn one(&self) -> Self::Element {
        Integer::one()
    }

    #[inline]
    fn nth(&self, n: u64) -> Self::Element {
        Integer::from(n)
    }

    #[inline]
    fn pow(&self, b: &Self::Element, e: u64) -> Self::Element {
        b.pow(e)
    }

    #[inline]
    fn is_zero(a: &Self::Element) -> bool {
        a.is_zero()
    }

    #[inline]
    fn is_one(&self, a: &Self::Element) -> bool {
        a.is_one()
    }

    fn try_div(&self, a: &Self::Element, b: &Self::Element) -> Option<Self::Element> {
        if b.is_zero() {
            return None;
        }
        a.try_div(b)
    }

    fn sample(&self, rng: &mut impl rand::RngCore, range: (i64, i64)) -> Self::Element {
        Integer::Natural(rng.gen_range(range.0..range.1))
    }

    fn fmt_display(&self, element: &Self::Element, f: &mut Formatter<'_>) -> Result<(), Error> {
        element.fmt(f)
    }
}

impl EuclideanDomain for IntegerRing {
    fn quot_rem(&self, a: &Self::Element, b: &Self::Element) -> (Self::Element, Self::Element) {
        a.quot_rem(b)
    }

    fn gcd(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        a.gcd(b)
    }
}

impl<'a, 'b> Add<&'b Integer> for &'a Integer {
    type Output = Integer;

    fn add(self, rhs: &'b Integer) -> Integer {
        match (self, rhs) {
            (Integer::Natural(n1), Integer::Natural(n2)) => {
                if let Some(num) = n1.checked_add(*n2) {
                    Integer::Natural(num)
                } else {
                    Integer::Large(MultiPrecisionInteger::from(*n1) + *n2)
                }
            }
            (Integer::Natural(n1), Integer::Large(r2))
            | (Integer::Large(r2), Integer::Natural(n1)) => Integer::from(r2.clone() + *n1),
            (Integer::Large(r1), Integer::Large(r2)) => Integer::from(r1.clone() + r2),
        }
    }
}

impl Add<Integer> for Integer {
    type Output = Integer;

    fn add(self, rhs: Integer) -> Integer {
        &self + &rhs
    }
}

impl<'a> Add<&'a Integer> for Integer {
    type Output = Integer;

    fn add(self, rhs: &'a Integer) -> Integer {
        &self + rhs
    }
}

impl<'a, 'b> Sub<&'b Integer> for &'a Integer {
    type Output = Integer;

    fn sub(self, rhs: &'b Integer) -> Integer {
        match (self, rhs) {
            (Integer::Natural(n1), Integer::Natural(n2)) => {
                if let Some(num) = n1.checked_sub(*n2) {
                    Integer::Natural(num)
                } else {
                    Integer::from(MultiPrecisionInteger::from(*n1) - *n2)
                }
            }
            (Integer::Natural(n1), Integer::Large(r2)) => {
                Integer::from(MultiPrecisionInteger::from(*n1) - r2)
            }
            (Integer::Large(r1), Integer::Natural(n2)) => Integer::from(r1.clone() - *n2),
            (Integer::Large(r1), Integer::Large(r2)) => Integer::from(r1.clone() - r2),
        }
    }
}

impl Sub<Integer> for Integer {
    type Output = Integer;

    fn sub(self, rhs: Integer) -> Integer {
        &self - &rhs
    }
}

impl<'a> Sub<&'a Integer> for Integer {
    type Output = Integer;

    fn sub(self, rhs: &'a Integer) -> Integer {
        &self - rhs
    }
}

impl<'a, 'b> Mul<&'b Integer> for &'a Integer {
    type Output = Integer;

    fn mul(self, rhs: &'b Integer) -> Integer {
        match (self, rhs) {
            (Integer::Natural(n1), Integer::Natural(n2)) => {
                if let Some(num) = n1.checked_mul(*n2) {
                    Integer::Natural(num)
                } else {
                    Integer::Large(MultiPrecisionInteger::from(*n1) * *n2)
                }
            }
            (Integer::Natural(n1), Integer::Large(r2))
            | (Integer::Large(r2), Integer::Natural(n1)) => Integer::from(r2.clone() * *n1),
            (Integer::Large(r1), Integer::Large(r2)) => Integer::from(r1.clone() * r2),
        }
    }
}

impl Mul<Integer> for Integer {
    type Output = Integer;

    fn mul(self, rhs: Integer) -> Integer {
        &self * &rhs
    }
}

impl<'a> Mul<&'a Integer> for Integer {
    type Output = Integer;

    fn mul(self, rhs: &'a Integer) -> Integer {
        &self * rhs
    }
}

impl<'a> AddAssign<&'a Integer> for Integer {
    #[inline]
    fn add_assign(&mut self, rhs: &'a Integer) {
        *self = &*self + rhs;
    }
}

impl<'a> MulAssign<&'a Integer> for Integer {
    #[inline]
    fn mul_assign(&mut self, rhs: &'a Integer) {
        *self = &*self * rhs;
    }
}

impl<'a> Neg for &'a Integer {
    type Output = Integer;

    fn neg(self) -> Self::Output {
        match self {
            Integer::Natural(n) => {
                if let Some(neg) = n.checked_neg() {
                    Integer::Natural(neg)
                } else {
                    Integer::Large(MultiPrecisionInteger::from(*n).neg())
                }
            }
            Integer::Large(r) => Integer::from(r.clone().neg()),
        }
    }
}

impl Neg for Integer {
    type Output = Integer;

    fn neg(self) -> Self::Output {
        -&self
    }
}
