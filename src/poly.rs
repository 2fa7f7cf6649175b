pub mod factor;
pub mod gcd;
pub mod polynomial;

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::ops::{Add as OpAdd, AddAssign, Sub};

use smartstring::{LazyCompact, SmartString};

use crate::utils;

pub const INLINED_EXPONENTS: usize = 6;
/// The maximum power of a variable that is cached during substitutions.
pub const POW_CACHE_SIZE: usize = 1000;

pub trait Exponent:
    Hash
    + Debug
    + Display
    + Ord
    + Sub<Output = Self>
    + OpAdd<Output = Self>
    + AddAssign
    + Clone
    + Copy
    + PartialEq
    + Eq
{
    fn zero() -> Self;
    fn one() -> Self;
    /// Convert the exponent to `u32`. This is always possible, as `u32` is the
    /// largest supported exponent type.
    fn to_u32(&self) -> u32;
    /// Convert from `u32`. This function may panic if the exponent is too large.
    fn from_u32(n: u32) -> Self;
    /// Convert from `u32`, returning `None` if the exponent does not fit.
    fn try_from_u32(n: u32) -> Option<Self>;
    fn is_zero(&self) -> bool;
    fn checked_add(&self, other: &Self) -> Option<Self>;
    fn gcd(&self, other: &Self) -> Self;
}

macro_rules! impl_exponent {
    ($($t:ty),*) => {
        $(
            impl Exponent for $t {
                #[inline]
                fn zero() -> Self {
                    0
                }

                #[inline]
                fn one() -> Self {
                    1
                }

                #[inline]
                fn to_u32(&self) -> u32 {
                    *self as u32
                }

                #[inline]
                fn from_u32(n: u32) -> Self {
                    Self::try_from(n).unwrap_or_else(|_| {
                        panic!("Exponent {} too large for {}", n, stringify!($t))
                    })
                }

                #[inline]
                fn try_from_u32(n: u32) -> Option<Self> {
                    Self::try_from(n).ok()
                }

                #[inline]
                fn is_zero(&self) -> bool {
                    *self == 0
                }

                #[inline]
                fn checked_add(&self, other: &Self) -> Option<Self> {
                    <$t>::checked_add(*self, *other)
                }

                #[inline]
                fn gcd(&self, other: &Self) -> Self {
                    utils::gcd_unsigned(*self as u64, *other as u64) as Self
                }
            }
        )*
    };
}

impl_exponent!(u16, u32);

/// A named variable of a polynomial. Its position in the variable list
/// of a polynomial determines the index of its exponent.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Variable(SmartString<LazyCompact>);

impl Variable {
    pub fn new(name: &str) -> Variable {
        Variable(name.into())
    }

    pub fn name(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Variable::new(name)
    }
}
