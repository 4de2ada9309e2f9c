use std::{
    cmp::Ordering,
    fmt::{Display, Error, Formatter},
    ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use rand::Rng;
use rug::{ops::Pow, Complete, Integer as MultiPrecisionInteger};

use crate::utils;

use super::{
    finite_field::{FiniteField, FiniteFieldElement},
    EuclideanDomain, Field, Ring,
};

/// The first 100 primes.
pub const SMALL_PRIMES: [i64; 100] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307,
    311, 313, 317, 331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397, 401, 409, 419, 421,
    431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503, 509, 521, 523, 541,
];

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

/// An arbitrary-precision integer that is stored inline when it fits in an `i64`.
///
/// A value is only ever stored as `Large` when it does not fit in an `i64`, so that
/// the derived equality and hashing agree between the two representations.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Integer {
    Natural(i64),
    Large(MultiPrecisionInteger),
}

macro_rules! from_with_cast {
    ($base: ty) => {
        impl From<$base> for Integer {
            #[inline]
            fn from(value: $base) -> Self {
                Integer::Natural(value as i64)
            }
        }
    };
}

from_with_cast!(i8);
from_with_cast!(i16);
from_with_cast!(i32);
from_with_cast!(i64);
from_with_cast!(u8);
from_with_cast!(u16);
from_with_cast!(u32);

impl From<u64> for Integer {
    #[inline]
    fn from(value: u64) -> Self {
        if value <= i64::MAX as u64 {
            Integer::Natural(value as i64)
        } else {
            Integer::Large(MultiPrecisionInteger::from(value))
        }
    }
}

impl From<MultiPrecisionInteger> for Integer {
    /// Convert from a multi-precision integer to an Integer, potentially
    /// downcasting the number.
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
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() <= 18 {
            if let Ok(n) = s.parse::<i64>() {
                return Ok(Integer::Natural(n));
            }
        }

        if let Ok(n) = s.parse::<MultiPrecisionInteger>() {
            Ok(Integer::from(n))
        } else {
            Err("Could not parse integer")
        }
    }
}

impl std::fmt::Debug for Integer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Natural(n) => std::fmt::Display::fmt(n, f),
            Self::Large(n) => std::fmt::Display::fmt(n, f),
        }
    }
}

impl Integer {
    pub fn new(num: i64) -> Integer {
        Integer::Natural(num)
    }

    pub fn zero() -> Integer {
        Integer::Natural(0)
    }

    pub fn one() -> Integer {
        Integer::Natural(1)
    }

    pub fn to_multi_prec(&self) -> MultiPrecisionInteger {
        match self {
            Integer::Natural(n) => MultiPrecisionInteger::from(*n),
            Integer::Large(l) => l.clone(),
        }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        matches!(self, Integer::Natural(0))
    }

    #[inline]
    pub fn is_one(&self) -> bool {
        matches!(self, Integer::Natural(1))
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        match self {
            Integer::Natural(n) => *n < 0,
            Integer::Large(r) => r.cmp0() == Ordering::Less,
        }
    }

    pub fn abs(&self) -> Integer {
        match self {
            Integer::Natural(n) => match n.checked_abs() {
                Some(a) => Integer::Natural(a),
                None => Integer::Large(MultiPrecisionInteger::from(*n).abs()),
            },
            Integer::Large(r) => Integer::from(r.clone().abs()),
        }
    }

    /// The number of bits needed to store the absolute value.
    pub fn bits(&self) -> u64 {
        match self {
            Integer::Natural(n) => 64 - n.unsigned_abs().leading_zeros() as u64,
            Integer::Large(r) => r.significant_bits() as u64,
        }
    }

    pub fn pow(&self, e: u32) -> Integer {
        if let Integer::Natural(n) = self {
            if let Some(p) = n.checked_pow(e) {
                return Integer::Natural(p);
            }
        }

        Integer::from(self.to_multi_prec().pow(e))
    }

    /// Compute the non-negative gcd of `self` and `b`.
    pub fn gcd(&self, b: &Integer) -> Integer {
        match (self, b) {
            (Integer::Natural(n1), Integer::Natural(n2)) => Integer::from(utils::gcd_signed(*n1, *n2)),
            (Integer::Natural(n1), Integer::Large(r2))
            | (Integer::Large(r2), Integer::Natural(n1)) => {
                Integer::from(MultiPrecisionInteger::from(*n1).gcd(r2))
            }
            (Integer::Large(r1), Integer::Large(r2)) => Integer::from(r1.clone().gcd(r2)),
        }
    }

    /// Euclidean division: the remainder is always non-negative.
    pub fn quot_rem(&self, b: &Integer) -> (Integer, Integer) {
        if b.is_zero() {
            panic!("Cannot divide by zero");
        }

        if let (Integer::Natural(a), Integer::Natural(b)) = (self, b) {
            if let (Some(q), Some(r)) = (a.checked_div_euclid(*b), a.checked_rem_euclid(*b)) {
                return (Integer::Natural(q), Integer::Natural(r));
            }
        }

        let (q, r) = self.to_multi_prec().div_rem_euc(b.to_multi_prec());
        (Integer::from(q), Integer::from(r))
    }

    /// Map `self` into the symmetric range `(-m/2, m/2]` for a positive modulus `m`.
    pub fn symmetric_mod(&self, m: &Integer) -> Integer {
        let r = self.quot_rem(m).1;
        if &(&r + &r) > m {
            &r - m
        } else {
            r
        }
    }

    /// The non-negative residue of `self` modulo `p`.
    pub fn mod_u32(&self, p: u32) -> u32 {
        match self {
            Integer::Natural(n) => n.rem_euclid(p as i64) as u32,
            Integer::Large(r) => r.mod_u(p),
        }
    }

    /// Compute the inverse of `self` modulo `m`, if it exists.
    pub fn mod_inverse(&self, m: &Integer) -> Option<Integer> {
        self.to_multi_prec()
            .invert(&m.to_multi_prec())
            .ok()
            .map(Integer::from)
    }

    /// Use Garner's algorithm to construct the `x` in the symmetric range of `m * p`
    /// that satisfies `x = n1 mod m` and `x = n2 mod p`, where `p` is the prime of
    /// `field`. `m` must be coprime to `p`.
    pub fn chinese_remainder(
        n1: &Integer,
        n2: &FiniteFieldElement,
        m: &Integer,
        field: &FiniteField,
    ) -> Integer {
        let m_p = field.element_from_integer(m);
        let v = field.mul(
            &field.sub(n2, &field.element_from_integer(n1)),
            &field.inv(&m_p),
        );

        let x = n1 + &(m * &field.to_integer(&v));
        x.symmetric_mod(&(m * &Integer::from(field.get_prime())))
    }

    /// Returns the integer square root, rounded up.
    pub fn ceil_sqrt(n: u64) -> u64 {
        let mut r = (n as f64).sqrt() as u64;
        while r * r < n {
            r += 1;
        }
        while r > 0 && (r - 1) * (r - 1) >= n {
            r -= 1;
        }
        r
    }
}

impl Display for Integer {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        match self {
            Integer::Natural(n) => n.fmt(f),
            Integer::Large(r) => r.fmt(f),
        }
    }
}

impl Display for IntegerRing {
    fn fmt(&self, _: &mut Formatter<'_>) -> Result<(), Error> {
        Ok(())
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
            (Integer::Natural(n1), Integer::Large(r2)) => r2
                .partial_cmp(n1)
                .map(Ordering::reverse)
                .unwrap_or(Ordering::Equal),
            (Integer::Large(r1), Integer::Natural(n2)) => {
                r1.partial_cmp(n2).unwrap_or(Ordering::Equal)
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
    fn sub_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a -= b;
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
        b.pow(e as u32)
    }

    #[inline]
    fn is_zero(a: &Self::Element) -> bool {
        a.is_zero()
    }

    #[inline]
    fn is_one(&self, a: &Self::Element) -> bool {
        a.is_one()
    }

    fn characteristic(&self) -> Integer {
        Integer::zero()
    }

    fn try_div(&self, a: &Self::Element, b: &Self::Element) -> Option<Self::Element> {
        if b.is_zero() {
            return None;
        }

        let (q, r) = a.quot_rem(b);
        if r.is_zero() {
            Some(q)
        } else {
            None
        }
    }

    fn sample(&self, rng: &mut impl rand::RngCore, range: (i64, i64)) -> Self::Element {
        Integer::Natural(rng.gen_range(range.0..range.1))
    }
}

impl EuclideanDomain for IntegerRing {
    fn rem(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        a.quot_rem(b).1
    }

    fn quot_rem(&self, a: &Self::Element, b: &Self::Element) -> (Self::Element, Self::Element) {
        a.quot_rem(b)
    }

    fn gcd(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        a.gcd(b)
    }
}

impl<'a, 'b> Add<&'b Integer> for &'a Integer {
    type Output = Integer;

    #[inline(always)]
    fn add(self, rhs: &'b Integer) -> Integer {
        match (self, rhs) {
            (Integer::Natural(n1), Integer::Natural(n2)) => match n1.checked_add(*n2) {
                Some(num) => Integer::Natural(num),
                None => Integer::from(MultiPrecisionInteger::from(*n1) + *n2),
            },
            (Integer::Natural(n1), Integer::Large(r2))
            | (Integer::Large(r2), Integer::Natural(n1)) => Integer::from((*n1 + r2).complete()),
            (Integer::Large(r1), Integer::Large(r2)) => Integer::from((r1 + r2).complete()),
        }
    }
}

impl Add<Integer> for Integer {
    type Output = Integer;

    #[inline]
    fn add(self, rhs: Integer) -> Integer {
        &self + &rhs
    }
}

impl<'a, 'b> Sub<&'b Integer> for &'a Integer {
    type Output = Integer;

    #[inline(always)]
    fn sub(self, rhs: &'b Integer) -> Integer {
        match (self, rhs) {
            (Integer::Natural(n1), Integer::Natural(n2)) => match n1.checked_sub(*n2) {
                Some(num) => Integer::Natural(num),
                None => Integer::from(MultiPrecisionInteger::from(*n1) - *n2),
            },
            (Integer::Natural(n1), Integer::Large(r2)) => Integer::from((*n1 - r2).complete()),
            (Integer::Large(r1), Integer::Natural(n2)) => Integer::from((r1 - *n2).complete()),
            (Integer::Large(r1), Integer::Large(r2)) => Integer::from((r1 - r2).complete()),
        }
    }
}

impl Sub<Integer> for Integer {
    type Output = Integer;

    #[inline]
    fn sub(self, rhs: Integer) -> Integer {
        &self - &rhs
    }
}

impl<'a, 'b> Mul<&'b Integer> for &'a Integer {
    type Output = Integer;

    #[inline(always)]
    fn mul(self, rhs: &'b Integer) -> Integer {
        match (self, rhs) {
            (Integer::Natural(n1), Integer::Natural(n2)) => match n1.checked_mul(*n2) {
                Some(num) => Integer::Natural(num),
                None => Integer::from(MultiPrecisionInteger::from(*n1) * *n2),
            },
            (Integer::Natural(n1), Integer::Large(r2))
            | (Integer::Large(r2), Integer::Natural(n1)) => Integer::from((*n1 * r2).complete()),
            (Integer::Large(r1), Integer::Large(r2)) => Integer::from((r1 * r2).complete()),
        }
    }
}

impl Mul<Integer> for Integer {
    type Output = Integer;

    #[inline]
    fn mul(self, rhs: Integer) -> Integer {
        &self * &rhs
    }
}

/// Division rounding towards zero.
impl<'a, 'b> Div<&'b Integer> for &'a Integer {
    type Output = Integer;

    #[inline(always)]
    fn div(self, rhs: &'b Integer) -> Integer {
        if let (Integer::Natural(n1), Integer::Natural(n2)) = (self, rhs) {
            if let Some(num) = n1.checked_div(*n2) {
                return Integer::Natural(num);
            }
        }

        if rhs.is_zero() {
            panic!("Cannot divide by zero");
        }

        Integer::from(self.to_multi_prec() / rhs.to_multi_prec())
    }
}

impl<'a> AddAssign<&'a Integer> for Integer {
    #[inline]
    fn add_assign(&mut self, rhs: &'a Integer) {
        *self = &*self + rhs;
    }
}

impl<'a> SubAssign<&'a Integer> for Integer {
    #[inline]
    fn sub_assign(&mut self, rhs: &'a Integer) {
        *self = &*self - rhs;
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

    #[inline]
    fn neg(self) -> Self::Output {
        match self {
            Integer::Natural(n) => match n.checked_neg() {
                Some(n) => Integer::Natural(n),
                None => Integer::Large(-MultiPrecisionInteger::from(*n)),
            },
            Integer::Large(r) => Integer::from((-r).complete()),
        }
    }
}

impl Neg for Integer {
    type Output = Integer;

    #[inline]
    fn neg(self) -> Self::Output {
        -&self
    }
}

#[cfg(test)]
mod test {
    use crate::domains::finite_field::FiniteField;

    use super::Integer;

    #[test]
    fn overflow_promotes() {
        let a = Integer::new(i64::MAX);
        let b = &a + &Integer::one();
        assert!(matches!(b, Integer::Large(_)));
        assert_eq!(&b - &Integer::one(), a);
        assert!(matches!(&b - &Integer::one(), Integer::Natural(_)));

        let c = &a * &a;
        assert_eq!(c.to_string(), "85070591730234615847396907784232501249");
        assert_eq!(&c / &a, a);
    }

    #[test]
    fn euclidean_division() {
        let (q, r) = Integer::new(-7).quot_rem(&Integer::new(3));
        assert_eq!((q, r), (Integer::new(-3), Integer::new(2)));

        let big: Integer = "-100000000000000000000000001".parse().unwrap();
        let (q, r) = big.quot_rem(&Integer::new(10));
        assert_eq!(r, Integer::new(9));
        assert_eq!(&(&q * &Integer::new(10)) + &r, big);
    }

    #[test]
    fn symmetric_residue() {
        let m = Integer::new(7);
        assert_eq!(Integer::new(5).symmetric_mod(&m), Integer::new(-2));
        assert_eq!(Integer::new(3).symmetric_mod(&m), Integer::new(3));
        assert_eq!(Integer::new(-3).symmetric_mod(&m), Integer::new(-3));
    }

    #[test]
    fn gcd_and_inverse() {
        assert_eq!(Integer::new(-12).gcd(&Integer::new(18)), Integer::new(6));
        assert_eq!(Integer::zero().gcd(&Integer::new(-5)), Integer::new(5));
        assert_eq!(
            Integer::new(3).mod_inverse(&Integer::new(7)),
            Some(Integer::new(5))
        );
        assert_eq!(Integer::new(2).mod_inverse(&Integer::new(4)), None);
    }

    #[test]
    fn chinese_remainder() {
        let field = FiniteField::new(7);
        // x = 2 mod 5 and x = 3 mod 7
        let x = Integer::chinese_remainder(&Integer::new(2), &field.to_element(3), &Integer::new(5), &field);
        assert_eq!(x, Integer::new(17));

        let x = Integer::chinese_remainder(&Integer::new(4), &field.to_element(4), &Integer::new(5), &field);
        assert_eq!(x, Integer::new(4));

        // 18 is mapped into the symmetric range
        let x = Integer::chinese_remainder(&Integer::new(3), &field.to_element(4), &Integer::new(5), &field);
        assert_eq!(x, Integer::new(-17));

        let y = Integer::chinese_remainder(&Integer::new(-1), &field.to_element(6), &Integer::new(5), &field);
        assert_eq!(y, Integer::new(-1));
    }

    #[test]
    fn residues_and_bits() {
        let big = Integer::new(2).pow(100);
        assert_eq!(big.bits(), 101);
        assert_eq!(Integer::new(-1).mod_u32(5), 4);
        assert_eq!(big.mod_u32(3), 1);
        assert_eq!(Integer::ceil_sqrt(10), 4);
        assert_eq!(Integer::ceil_sqrt(9), 3);
    }
}
