//! Multivariate and univariate polynomials over the integers and prime fields,
//! together with gcd and factorization routines.
pub mod factor;
pub mod gcd;
pub mod polynomial;
pub mod univariate;

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::ops::{Add as OpAdd, AddAssign, Sub};

use smartstring::{LazyCompact, SmartString};

use crate::utils;

/// The number of exponents that are stored inline for a single monomial.
pub const INLINED_EXPONENTS: usize = 6;

/// The name of a polynomial variable.
pub type Variable = SmartString<LazyCompact>;

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
    + Send
    + Sync
    + 'static
{
    fn zero() -> Self;
    fn one() -> Self;
    /// Convert the exponent to `u32`. This is always possible, as `u32` is the largest supported exponent type.
    fn to_u32(&self) -> u32;
    /// Convert from `u32`. This function may panic if the exponent is too large.
    fn from_u32(n: u32) -> Self;
    /// Convert from `u32`, if the value fits.
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
                    Self::try_from_u32(n).unwrap_or_else(|| {
                        panic!("Exponent {} too large for {}", n, stringify!($t))
                    })
                }

                #[inline]
                fn try_from_u32(n: u32) -> Option<Self> {
                    <$t>::try_from(n).ok()
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

impl_exponent!(u8, u16, u32);

#[cfg(test)]
mod test {
    use super::Exponent;

    #[test]
    fn exponent_conversion() {
        assert_eq!(<u8 as Exponent>::try_from_u32(300), None);
        assert_eq!(<u16 as Exponent>::try_from_u32(300), Some(300));
        assert_eq!(Exponent::checked_add(&250u8, &10), None);
        assert_eq!(Exponent::gcd(&12u32, &18), 6);
    }
}
