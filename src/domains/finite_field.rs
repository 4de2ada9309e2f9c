//! Prime fields with word-sized moduli.

use rand::Rng;
use std::fmt::{Display, Error, Formatter};

use crate::domains::integer::Integer;

use super::{EuclideanDomain, Field, Ring};

const HENSEL_LIFTING_MASK: [u8; 128] = [
    255, 85, 51, 73, 199, 93, 59, 17, 15, 229, 195, 89, 215, 237, 203, 33, 31, 117, 83, 105, 231,
    125, 91, 49, 47, 5, 227, 121, 247, 13, 235, 65, 63, 149, 115, 137, 7, 157, 123, 81, 79, 37, 3,
    153, 23, 45, 11, 97, 95, 181, 147, 169, 39, 189, 155, 113, 111, 69, 35, 185, 55, 77, 43, 129,
    127, 213, 179, 201, 71, 221, 187, 145, 143, 101, 67, 217, 87, 109, 75, 161, 159, 245, 211, 233,
    103, 253, 219, 177, 175, 133, 99, 249, 119, 141, 107, 193, 191, 21, 243, 9, 135, 29, 251, 209,
    207, 165, 131, 25, 151, 173, 139, 225, 223, 53, 19, 41, 167, 61, 27, 241, 239, 197, 163, 57,
    183, 205, 171, 1,
];

/// A number in a finite field, stored in Montgomery form.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct FiniteFieldElement(pub(crate) u32);

/// The field `Z / pZ` for an odd prime `p < 2^32`.
///
/// Multiplication uses Montgomery arithmetic, so elements have to be converted
/// with [FiniteField::to_element] and [FiniteField::from_element].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FiniteField {
    p: u32,
    m: u32,
    one: FiniteFieldElement,
}

impl FiniteField {
    /// Create a new finite field. `p` must be an odd prime.
    pub fn new(p: u32) -> FiniteField {
        if p % 2 == 0 {
            panic!("Prime 2 is not supported");
        }

        FiniteField {
            p,
            m: Self::inv_2_32(p),
            one: FiniteFieldElement(Self::get_one(p)),
        }
    }

    /// Returns the unit element in Montgomory form, ie.e 1 + 2^32 mod a.
    fn get_one(a: u32) -> u32 {
        if a as u64 <= 1u64 << 31 {
            let res = (((1u64 << 31) % a as u64) << 1) as u32;

            if res < a {
                res
            } else {
                res - a
            }
        } else {
            a.wrapping_neg()
        }
    }

    /// Returns -a^-1 mod 2^32.
    fn inv_2_32(a: u32) -> u32 {
        let mut ret: u32 = HENSEL_LIFTING_MASK[((a >> 1) & 127) as usize] as u32;
        ret = ret.wrapping_mul(a.wrapping_mul(ret).wrapping_add(2));
        ret = ret.wrapping_mul(a.wrapping_mul(ret).wrapping_add(2));
        ret
    }

    pub fn get_prime(&self) -> u32 {
        self.p
    }

    /// Convert a number in a prime field a % n to Montgomory form.
    #[inline(always)]
    pub fn to_element(&self, a: u32) -> FiniteFieldElement {
        FiniteFieldElement((((a as u64) << 32) % self.p as u64) as u32)
    }

    /// Convert a number from Montgomory form to standard form.
    #[inline(always)]
    pub fn from_element(&self, a: &FiniteFieldElement) -> u32 {
        self.mul(a, &FiniteFieldElement(1)).0
    }

    /// Reduce an integer modulo `p`.
    pub fn element_from_integer(&self, a: &Integer) -> FiniteFieldElement {
        self.to_element(a.mod_u32(self.p))
    }

    /// Convert an element to its representative in `[0, p)`.
    pub fn to_integer(&self, a: &FiniteFieldElement) -> Integer {
        Integer::from(self.from_element(a))
    }
}

impl Display for FiniteField {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, " % {}", self.p)
    }
}

impl Ring for FiniteField {
    type Element = FiniteFieldElement;

    /// Add two numbers in Montgomory form.
    #[inline(always)]
    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        let mut t = a.0 as u64 + b.0 as u64;

        if t >= self.p as u64 {
            t -= self.p as u64;
        }

        FiniteFieldElement(t as u32)
    }

    /// Subtract `b` from `a`, where `a` and `b` are in Montgomory form.
    #[inline(always)]
    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        if a.0 >= b.0 {
            FiniteFieldElement(a.0 - b.0)
        } else {
            FiniteFieldElement(a.0 + (self.p - b.0))
        }
    }

    /// Multiply two numbers in Montgomory form.
    #[inline(always)]
    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        let t = a.0 as u64 * b.0 as u64;
        let m = (t as u32).wrapping_mul(self.m);
        let (t, overflow) = t.overflowing_add(m as u64 * self.p as u64);
        let u = (t >> 32) as u32;

        if overflow {
            FiniteFieldElement(u.wrapping_sub(self.p))
        } else if u >= self.p {
            FiniteFieldElement(u - self.p)
        } else {
            FiniteFieldElement(u)
        }
    }

    #[inline(always)]
    fn add_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a = self.add(&*a, b);
    }

    #[inline(always)]
    fn sub_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a = self.sub(&*a, b);
    }

    #[inline(always)]
    fn mul_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a = self.mul(&*a, b);
    }

    /// Computes -x mod n.
    #[inline]
    fn neg(&self, a: &Self::Element) -> Self::Element {
        if a.0 == 0 {
            *a
        } else {
            FiniteFieldElement(self.p - a.0)
        }
    }

    #[inline]
    fn zero(&self) -> Self::Element {
        FiniteFieldElement(0)
    }

    /// Return the unit element in Montgomory form.
    #[inline]
    fn one(&self) -> Self::Element {
        self.one
    }

    #[inline]
    fn nth(&self, n: u64) -> Self::Element {
        self.to_element((n % self.p as u64) as u32)
    }

    /// Compute b^e % n.
    #[inline]
    fn pow(&self, b: &Self::Element, mut e: u64) -> Self::Element {
        if e >= self.p as u64 - 1 {
            e %= self.p as u64 - 1;
        }

        if e == 0 {
            return self.one();
        }

        let mut x = *b;
        let mut y = self.one();
        while e != 1 {
            if e % 2 == 1 {
                y = self.mul(&y, &x);
            }

            x = self.mul(&x, &x);
            e /= 2;
        }

        self.mul(&x, &y)
    }

    #[inline]
    fn is_zero(a: &Self::Element) -> bool {
        a.0 == 0
    }

    #[inline]
    fn is_one(&self, a: &Self::Element) -> bool {
        a == &self.one
    }

    fn characteristic(&self) -> Integer {
        Integer::from(self.p)
    }

    fn try_div(&self, a: &Self::Element, b: &Self::Element) -> Option<Self::Element> {
        if Self::is_zero(b) {
            None
        } else {
            Some(self.div(a, b))
        }
    }

    fn sample(&self, rng: &mut impl rand::RngCore, range: (i64, i64)) -> Self::Element {
        let r = rng.gen_range(range.0.max(0)..range.1.min(self.p as i64));
        self.to_element(r as u32)
    }
}

impl EuclideanDomain for FiniteField {
    #[inline]
    fn rem(&self, _: &Self::Element, _: &Self::Element) -> Self::Element {
        FiniteFieldElement(0)
    }

    #[inline]
    fn quot_rem(&self, a: &Self::Element, b: &Self::Element) -> (Self::Element, Self::Element) {
        (self.mul(a, &self.inv(b)), FiniteFieldElement(0))
    }

    #[inline]
    fn gcd(&self, _: &Self::Element, _: &Self::Element) -> Self::Element {
        self.one()
    }
}

impl Field for FiniteField {
    #[inline]
    fn div(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        self.mul(a, &self.inv(b))
    }

    /// Computes x^-1 mod n.
    fn inv(&self, a: &Self::Element) -> Self::Element {
        if a.0 == 0 {
            panic!("0 is not invertible mod {}", self.p);
        }

        // apply multiplication with 1 twice to get the correct scaling of R=2^32
        let x_mont = self
            .mul(&self.mul(a, &FiniteFieldElement(1)), &FiniteFieldElement(1))
            .0;

        // extended Euclidean algorithm: a x + b p = gcd(x, p) = 1 or a x = 1 (mod p)
        let mut u1: u32 = 1;
        let mut u3 = x_mont;
        let mut v1: u32 = 0;
        let mut v3 = self.p;
        let mut even_iter: bool = true;

        while v3 != 0 {
            let q = u3 / v3;
            let t3 = u3 % v3;
            let t1 = u1 + q * v1;
            u1 = v1;
            v1 = t1;
            u3 = v3;
            v3 = t3;
            even_iter = !even_iter;
        }

        debug_assert_eq!(u3, 1, "modulus is not prime");

        if even_iter {
            FiniteFieldElement(u1)
        } else {
            FiniteFieldElement(self.p - u1)
        }
    }
}

fn mul_mod(a: u64, b: u64, n: u64) -> u64 {
    a * b % n
}

fn pow_mod(mut b: u64, mut e: u64, n: u64) -> u64 {
    let mut r = 1;
    b %= n;
    while e > 0 {
        if e & 1 == 1 {
            r = mul_mod(r, b, n);
        }
        b = mul_mod(b, b, n);
        e >>= 1;
    }
    r
}

/// Do a deterministic Miller test to check if `n` is a prime.
/// Since `n` is a `u32`, the witnesses 2, 7 and 61 suffice.
pub fn is_prime_u32(n: u32) -> bool {
    if n < 2 {
        return false;
    }

    for p in [2, 3, 5, 7, 11, 13, 61] {
        if n == p {
            return true;
        }
        if n % p == 0 {
            return false;
        }
    }

    let n = n as u64;
    let mut s = 0;
    let mut d = n - 1;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }

    'test: for a in [2u64, 7, 61] {
        let mut x = pow_mod(a, d, n);

        if x == 1 || x == n - 1 {
            continue;
        }

        for _ in 1..s {
            x = mul_mod(x, x, n);

            if x == n - 1 {
                continue 'test;
            }
        }

        return false;
    }

    true
}

/// An iterator over primes below a starting point, in descending order.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct PrimeIteratorU32 {
    current_number: u32,
}

impl PrimeIteratorU32 {
    /// Create a new prime iterator that yields primes smaller than `start`.
    pub fn below(start: u32) -> PrimeIteratorU32 {
        PrimeIteratorU32 {
            current_number: start,
        }
    }
}

impl Iterator for PrimeIteratorU32 {
    type Item = u32;

    /// Yield the next smaller odd prime or `None` if 3 has been passed.
    fn next(&mut self) -> Option<u32> {
        while self.current_number > 3 {
            self.current_number -= 1;

            if is_prime_u32(self.current_number) {
                return Some(self.current_number);
            }
        }

        None
    }
}

#[cfg(test)]
mod test {
    use crate::domains::{Field, Ring};

    use super::{is_prime_u32, FiniteField, PrimeIteratorU32};

    #[test]
    fn montgomery_round_trip() {
        let field = FiniteField::new(2147483647);
        let a = field.to_element(123456789);
        let b = field.to_element(987654321);
        let c = field.mul(&a, &b);
        assert_eq!(
            field.from_element(&c) as u64,
            123456789u64 * 987654321 % 2147483647
        );
        assert_eq!(field.from_element(&field.one()), 1);
    }

    #[test]
    fn inverse() {
        let field = FiniteField::new(17);
        for i in 1..17 {
            let a = field.to_element(i);
            let inv = field.inv(&a);
            assert!(field.is_one(&field.mul(&a, &inv)));
        }
    }

    #[test]
    fn primes() {
        assert!(is_prime_u32(2147483647));
        assert!(!is_prime_u32(2147483649));
        assert!(!is_prime_u32(561));
        let p: Vec<u32> = PrimeIteratorU32::below(30).collect();
        assert_eq!(p, vec![29, 23, 19, 17, 13, 11, 7, 5, 3]);
    }
}
