//! Prime fields with a modulus below `2^32`.

use std::fmt::{Display, Error, Formatter};

use rand::Rng;

use super::integer::Integer;
use super::{EuclideanDomain, Field, Ring};

// large u32 primes starting from the 203213901st prime number
pub const LARGE_U32_PRIMES: [u32; 100] = [
    4293490987, 4293491603, 4293492277, 4293492857, 4293491017, 4293491621, 4293492283, 4293492881,
    4293491023, 4293491639, 4293492293, 4293492893, 4293491051, 4293491659, 4293492331, 4293492941,
    4293491149, 4293491701, 4293492349, 4293492977, 4293491171, 4293491711, 4293492383, 4293493037,
    4293491221, 4293491747, 4293492403, 4293493049, 4293491261, 4293491779, 4293492421, 4293493069,
    4293491269, 4293491791, 4293492431, 4293493081, 4293491273, 4293491819, 4293492487, 4293493091,
    4293491281, 4293491849, 4293492499, 4293493117, 4293491299, 4293491863, 4293492523, 4293493121,
    4293491303, 4293491887, 4293492583, 4293493159, 4293491311, 4293491897, 4293492587, 4293493163,
    4293491327, 4293491911, 4293492649, 4293493207, 4293491329, 4293491953, 4293492661, 4293493229,
    4293491399, 4293491957, 4293492673, 4293493241, 4293491431, 4293492017, 4293492701, 4293493261,
    4293491467, 4293492023, 4293492739, 4293493319, 4293491509, 4293492097, 4293492751, 4293493363,
    4293491539, 4293492101, 4293492769, 4293493367, 4293491551, 4293492107, 4293492779, 4293493409,
    4293491561, 4293492113, 4293492781, 4293493423, 4293491567, 4293492139, 4293492811, 4293493433,
    4293491591, 4293492169, 4293492821, 4293493487,
];

/// Check if `n` is prime by trial division.
pub fn is_prime_u32(n: u32) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }

    let n = n as u64;
    let mut i = 3;
    while i * i <= n {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

/// The finite field `Z / pZ` for a prime `p < 2^32`.
/// Elements are stored as `u64` in `[0, p)`, so that a product of two elements never overflows.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct FiniteField {
    p: u64,
}

/// A 32-bit integer finite field.
pub type Zp = FiniteField;

impl FiniteField {
    /// Create a new finite field. `p` must be a prime number.
    pub fn new(p: u32) -> FiniteField {
        FiniteField { p: p as u64 }
    }

    #[inline]
    pub fn get_prime(&self) -> u64 {
        self.p
    }

    /// Map an integer to its residue in `[0, p)`.
    pub fn to_element(&self, a: &Integer) -> u64 {
        match a {
            Integer::Natural(n) => n.rem_euclid(self.p as i64) as u64,
            Integer::Large(r) => r.mod_u(self.p as u32) as u64,
        }
    }

    /// Map an element to the integer in `[0, p)`.
    #[inline]
    pub fn from_element(&self, a: &u64) -> Integer {
        Integer::from(*a)
    }

    /// Map an element to the integer in `(-p/2, p/2]`.
    #[inline]
    pub fn to_symmetric_integer(&self, a: &u64) -> Integer {
        if *a * 2 > self.p {
            Integer::Natural(*a as i64 - self.p as i64)
        } else {
            Integer::Natural(*a as i64)
        }
    }
}

impl Display for FiniteField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Z_{}", self.p)
    }
}

impl Ring for FiniteField {
    type Element = u64;

    #[inline]
    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        let r = a + b;
        if r >= self.p {
            r - self.p
        } else {
            r
        }
    }

    #[inline]
    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        if a >= b {
            a - b
        } else {
            a + self.p - b
        }
    }

    #[inline]
    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        (a * b) % self.p
    }

    #[inline]
    fn add_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a = self.add(a, b);
    }

    #[inline]
    fn mul_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a = self.mul(a, b);
    }

    #[inline]
    fn neg(&self, a: &Self::Element) -> Self::Element {
        if *a == 0 {
            0
        } else {
            self.p - a
        }
    }

    #[inline]
    fn zero(&self) -> Self::Element {
        0
    }

    #[inline]
    fn one(&self) -> Self::Element {
        1
    }

    #[inline]
    fn nth(&self, n: u64) -> Self::Element {
        n % self.p
    }

    /// Compute `b^e` using square-and-multiply.
    fn pow(&self, b: &Self::Element, mut e: u64) -> Self::Element {
        let mut base = *b;
        let mut res = 1;
        while e != 0 {
            if e & 1 == 1 {
                res = self.mul(&res, &base);
            }
            base = self.mul(&base, &base);
            e >>= 1;
        }
        res
    }

    #[inline]
    fn is_zero(a: &Self::Element) -> bool {
        *a == 0
    }

    #[inline]
    fn is_one(&self, a: &Self::Element) -> bool {
        *a == 1
    }

    fn try_div(&self, a: &Self::Element, b: &Self::Element) -> Option<Self::Element> {
        if *b == 0 {
            None
        } else {
            Some(self.div(a, b))
        }
    }

    fn sample(&self, rng: &mut impl rand::RngCore, range: (i64, i64)) -> Self::Element {
        rng.gen_range(range.0.max(0)..range.1.min(self.p as i64)) as u64
    }

    fn fmt_display(&self, element: &Self::Element, f: &mut Formatter<'_>) -> Result<(), Error> {
        element.fmt(f)
    }
}

impl EuclideanDomain for FiniteField {
    #[inline]
    fn quot_rem(&self, a: &Self::Element, b: &Self::Element) -> (Self::Element, Self::Element) {
        (self.div(a, b), 0)
    }

    #[inline]
    fn gcd(&self, _: &Self::Element, _: &Self::Element) -> Self::Element {
        1
    }
}

impl Field for FiniteField {
    #[inline]
    fn div(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        self.mul(a, &self.inv(b))
    }

    /// Compute the inverse with the extended Euclidean algorithm.
    /// Panics when `a` is zero.
    fn inv(&self, a: &Self::Element) -> Self::Element {
        assert!(*a != 0, "0 is not invertible");

        let mut u1: i64 = 1;
        let mut u3 = *a as i64;
        let mut v1: i64 = 0;
        let mut v3 = self.p as i64;

        while v3 != 0 {
            let q = u3 / v3;
            (u1, v1) = (v1, u1 - q * v1);
            (u3, v3) = (v3, u3 - q * v3);
        }

        assert!(u3 == 1, "{} is not invertible mod {}", a, self.p);
        u1.rem_euclid(self.p as i64) as u64
    }
}

#[cfg(test)]
mod test {
    use crate::domains::{integer::Integer, Field, Ring};

    use super::{is_prime_u32, FiniteField, LARGE_U32_PRIMES};

    #[test]
    fn primes() {
        assert!(LARGE_U32_PRIMES[..4].iter().all(|p| is_prime_u32(*p)));
        assert!(is_prime_u32(2));
        assert!(!is_prime_u32(1));
        assert!(!is_prime_u32(91));
    }

    #[test]
    fn arithmetic() {
        let f = FiniteField::new(7);
        assert_eq!(f.add(&5, &4), 2);
        assert_eq!(f.sub(&2, &5), 4);
        assert_eq!(f.mul(&3, &5), 1);
        assert_eq!(f.inv(&3), 5);
        assert_eq!(f.pow(&3, 6), 1);
        assert_eq!(f.neg(&0), 0);
    }

    #[test]
    fn large_prime_inverse() {
        let f = FiniteField::new(LARGE_U32_PRIMES[0]);
        let a = 123456789;
        assert_eq!(f.mul(&a, &f.inv(&a)), 1);
        let b = f.get_prime() - 1;
        assert_eq!(f.mul(&b, &b), 1);
    }

    #[test]
    fn integer_conversion() {
        let f = FiniteField::new(7);
        assert_eq!(f.to_element(&Integer::new(-1)), 6);
        assert_eq!(f.to_symmetric_integer(&6), Integer::new(-1));
        let large = Integer::new(2).pow(100);
        // 2^3 = 1 mod 7, so 2^100 = 2 mod 7
        assert_eq!(f.to_element(&large), 2);
    }
}
