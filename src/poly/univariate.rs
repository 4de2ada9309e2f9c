use std::ops::{Add, Mul, Neg, Sub};

use crate::domains::{
    finite_field::FiniteField,
    integer::{Integer, IntegerRing},
    EuclideanDomain, Field, Ring,
};

/// A dense univariate polynomial. The coefficient at index `i` belongs to `x^i`
/// and the last coefficient is never zero.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct UnivariatePolynomial<F: Ring> {
    pub coefficients: Vec<F::Element>,
    pub field: F,
}

impl<F: Ring> UnivariatePolynomial<F> {
    /// Constructs a zero polynomial.
    pub fn new(field: &F) -> Self {
        Self {
            coefficients: vec![],
            field: field.clone(),
        }
    }

    /// Constructs a polynomial from a list of coefficients, from the lowest to the highest degree.
    pub fn from_coefficients(field: &F, coefficients: Vec<F::Element>) -> Self {
        let mut p = Self {
            coefficients,
            field: field.clone(),
        };
        p.truncate();
        p
    }

    #[inline]
    pub fn zero(&self) -> Self {
        Self::new(&self.field)
    }

    #[inline]
    pub fn constant(&self, coeff: F::Element) -> Self {
        Self::from_coefficients(&self.field, vec![coeff])
    }

    #[inline]
    pub fn one(&self) -> Self {
        self.constant(self.field.one())
    }

    /// Constructs `coeff * x^exponent`.
    pub fn monomial(&self, coeff: F::Element, exponent: usize) -> Self {
        if F::is_zero(&coeff) {
            return self.zero();
        }

        let mut coefficients = vec![self.field.zero(); exponent + 1];
        coefficients[exponent] = coeff;
        Self {
            coefficients,
            field: self.field.clone(),
        }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.coefficients.is_empty()
    }

    #[inline]
    pub fn is_one(&self) -> bool {
        self.coefficients.len() == 1 && self.field.is_one(&self.coefficients[0])
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        self.coefficients.len() <= 1
    }

    /// Get the constant term of the polynomial.
    #[inline]
    pub fn get_constant(&self) -> F::Element {
        self.coefficients
            .first()
            .cloned()
            .unwrap_or_else(|| self.field.zero())
    }

    /// Get the leading coefficient.
    #[inline]
    pub fn lcoeff(&self) -> F::Element {
        self.coefficients
            .last()
            .cloned()
            .unwrap_or_else(|| self.field.zero())
    }

    /// The degree of the polynomial. The zero polynomial has degree 0.
    #[inline]
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Remove trailing zero coefficients.
    fn truncate(&mut self) {
        while let Some(c) = self.coefficients.last() {
            if F::is_zero(c) {
                self.coefficients.pop();
            } else {
                break;
            }
        }
    }

    /// Multiply every coefficient with `coeff`.
    pub fn mul_coeff(mut self, coeff: &F::Element) -> Self {
        for c in &mut self.coefficients {
            self.field.mul_assign(c, coeff);
        }
        self.truncate();
        self
    }

    /// Multiply by `x^exp`.
    pub fn mul_exp(&self, exp: usize) -> Self {
        if self.is_zero() || exp == 0 {
            return self.clone();
        }

        let mut coefficients = vec![self.field.zero(); exp];
        coefficients.extend_from_slice(&self.coefficients);
        Self {
            coefficients,
            field: self.field.clone(),
        }
    }

    pub fn derivative(&self) -> Self {
        let coefficients = self
            .coefficients
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, c)| self.field.mul(c, &self.field.nth(i as u64)))
            .collect();
        Self::from_coefficients(&self.field, coefficients)
    }

    /// Map a coefficient using the function `f`.
    pub fn map_coeff<U: Ring, T: Fn(&F::Element) -> U::Element>(
        &self,
        f: T,
        field: &U,
    ) -> UnivariatePolynomial<U> {
        UnivariatePolynomial::from_coefficients(field, self.coefficients.iter().map(f).collect())
    }
}

impl<'a, 'b, F: Ring> Add<&'a UnivariatePolynomial<F>> for &'b UnivariatePolynomial<F> {
    type Output = UnivariatePolynomial<F>;

    fn add(self, other: &'a UnivariatePolynomial<F>) -> Self::Output {
        let (long, short) = if self.coefficients.len() >= other.coefficients.len() {
            (self, other)
        } else {
            (other, self)
        };

        let mut coefficients = long.coefficients.clone();
        for (c, s) in coefficients.iter_mut().zip(&short.coefficients) {
            self.field.add_assign(c, s);
        }

        UnivariatePolynomial::from_coefficients(&self.field, coefficients)
    }
}

impl<'a, 'b, F: Ring> Sub<&'a UnivariatePolynomial<F>> for &'b UnivariatePolynomial<F> {
    type Output = UnivariatePolynomial<F>;

    fn sub(self, other: &'a UnivariatePolynomial<F>) -> Self::Output {
        let mut coefficients = self.coefficients.clone();
        if coefficients.len() < other.coefficients.len() {
            coefficients.resize(other.coefficients.len(), self.field.zero());
        }

        for (c, s) in coefficients.iter_mut().zip(&other.coefficients) {
            self.field.sub_assign(c, s);
        }

        UnivariatePolynomial::from_coefficients(&self.field, coefficients)
    }
}

impl<F: Ring> Neg for UnivariatePolynomial<F> {
    type Output = Self;

    fn neg(mut self) -> Self::Output {
        for c in &mut self.coefficients {
            *c = self.field.neg(c);
        }
        self
    }
}

impl<'a, 'b, F: Ring> Mul<&'a UnivariatePolynomial<F>> for &'b UnivariatePolynomial<F> {
    type Output = UnivariatePolynomial<F>;

    fn mul(self, rhs: &'a UnivariatePolynomial<F>) -> Self::Output {
        if self.is_zero() || rhs.is_zero() {
            return self.zero();
        }

        let mut coefficients =
            vec![self.field.zero(); self.coefficients.len() + rhs.coefficients.len() - 1];

        for (i, a) in self.coefficients.iter().enumerate() {
            if F::is_zero(a) {
                continue;
            }

            for (j, b) in rhs.coefficients.iter().enumerate() {
                let p = self.field.mul(a, b);
                self.field.add_assign(&mut coefficients[i + j], &p);
            }
        }

        UnivariatePolynomial::from_coefficients(&self.field, coefficients)
    }
}

impl<F: EuclideanDomain> UnivariatePolynomial<F> {
    /// Get the content from the coefficients.
    pub fn content(&self) -> F::Element {
        let mut c = self.field.zero();
        for cc in &self.coefficients {
            c = self.field.gcd(&c, cc);
            if self.field.is_one(&c) {
                break;
            }
        }
        c
    }

    /// Divide every coefficient with `other`.
    pub fn div_coeff(mut self, other: &F::Element) -> Self {
        for c in &mut self.coefficients {
            let (quot, rem) = self.field.quot_rem(c, other);
            debug_assert!(F::is_zero(&rem));
            *c = quot;
        }
        self
    }

    /// Make the polynomial primitive by removing the content.
    pub fn make_primitive(self) -> Self {
        if self.is_zero() {
            return self;
        }

        let c = self.content();
        self.div_coeff(&c)
    }

    /// Return `self / div` if the division is exact.
    pub fn divides(&self, div: &Self) -> Option<Self> {
        if div.is_zero() {
            panic!("Cannot divide by 0 polynomial");
        }

        if self.is_zero() {
            return Some(self.clone());
        }

        if self.degree() < div.degree() {
            return None;
        }

        // check if the leading coefficients divide
        if !F::is_zero(&self.field.rem(&self.lcoeff(), &div.lcoeff())) {
            return None;
        }

        let (q, r) = self.quot_rem(div);
        if r.is_zero() {
            Some(q)
        } else {
            None
        }
    }

    /// Divide `self` by `div`. If a leading coefficient is not divisible by the
    /// leading coefficient of `div`, the division stops and `(0, r)` is returned,
    /// where `r` is the partially reduced dividend.
    pub fn quot_rem(&self, div: &Self) -> (Self, Self) {
        if div.is_zero() {
            panic!("Cannot divide by 0");
        }

        if self.degree() < div.degree() || self.is_zero() {
            return (self.zero(), self.clone());
        }

        let m = div.degree();
        let dlc = div.lcoeff();
        let mut r = self.coefficients.clone();
        let mut q = vec![self.field.zero(); self.degree() - m + 1];

        for i in (0..q.len()).rev() {
            if F::is_zero(&r[i + m]) {
                continue;
            }

            let (qq, rr) = self.field.quot_rem(&r[i + m], &dlc);
            if !F::is_zero(&rr) {
                return (self.zero(), Self::from_coefficients(&self.field, r));
            }

            for (j, d) in div.coefficients.iter().enumerate() {
                let p = self.field.mul(&qq, d);
                self.field.sub_assign(&mut r[i + j], &p);
            }
            q[i] = qq;
        }

        r.truncate(m);
        (
            Self::from_coefficients(&self.field, q),
            Self::from_coefficients(&self.field, r),
        )
    }
}

impl<F: Field> UnivariatePolynomial<F> {
    /// Make the leading coefficient one.
    pub fn make_monic(self) -> Self {
        if self.is_zero() || self.field.is_one(&self.lcoeff()) {
            return self;
        }

        let inv = self.field.inv(&self.lcoeff());
        self.mul_coeff(&inv)
    }

    /// Division with remainder over a field, which only inverts the leading
    /// coefficient of `div` once.
    pub fn quot_rem_field(&self, div: &Self) -> (Self, Self) {
        if div.is_zero() {
            panic!("Cannot divide by 0");
        }

        if self.degree() < div.degree() || self.is_zero() {
            return (self.zero(), self.clone());
        }

        let m = div.degree();
        let inv = self.field.inv(&div.lcoeff());
        let mut r = self.coefficients.clone();
        let mut q = vec![self.field.zero(); self.degree() - m + 1];

        for i in (0..q.len()).rev() {
            if F::is_zero(&r[i + m]) {
                continue;
            }

            let qq = self.field.mul(&r[i + m], &inv);
            for (j, d) in div.coefficients.iter().enumerate() {
                let p = self.field.mul(&qq, d);
                self.field.sub_assign(&mut r[i + j], &p);
            }
            q[i] = qq;
        }

        r.truncate(m);
        (
            Self::from_coefficients(&self.field, q),
            Self::from_coefficients(&self.field, r),
        )
    }

    /// Compute the remainder `self % div`.
    pub fn rem_field(&self, div: &Self) -> Self {
        self.quot_rem_field(div).1
    }

    /// Compute the univariate GCD using Euclid's algorithm. The result is monic.
    pub fn gcd(&self, b: &Self) -> Self {
        let mut c = self.clone();
        let mut d = b.clone();
        if c.degree() < d.degree() {
            std::mem::swap(&mut c, &mut d);
        }

        while !d.is_zero() {
            let r = c.rem_field(&d);
            c = d;
            d = r;
        }

        c.make_monic()
    }

    /// Compute `(g, s, t)` where `self * s + other * t = g` and `g` is the monic gcd.
    pub fn eea(&self, other: &Self) -> (Self, Self, Self) {
        let mut r0 = self.clone();
        let mut r1 = other.clone();
        let mut s0 = self.one();
        let mut s1 = self.zero();
        let mut t0 = self.zero();
        let mut t1 = self.one();

        while !r1.is_zero() {
            let (q, r) = r0.quot_rem_field(&r1);
            r0 = std::mem::replace(&mut r1, r);
            let s = &s0 - &(&q * &s1);
            s0 = std::mem::replace(&mut s1, s);
            let t = &t0 - &(&q * &t1);
            t0 = std::mem::replace(&mut t1, t);
        }

        if r0.is_zero() {
            return (r0, s0, t0);
        }

        let inv = self.field.inv(&r0.lcoeff());
        (r0.mul_coeff(&inv), s0.mul_coeff(&inv), t0.mul_coeff(&inv))
    }

    /// Compute `self^exp mod m`.
    pub fn pow_mod(&self, exp: &Integer, m: &Self) -> Self {
        let e = exp.to_multi_prec();
        let base = self.rem_field(m);
        let mut res = self.one();

        for i in (0..e.significant_bits()).rev() {
            res = (&res * &res).rem_field(m);
            if e.get_bit(i) {
                res = (&res * &base).rem_field(m);
            }
        }

        res
    }
}

impl UnivariatePolynomial<IntegerRing> {
    /// The largest absolute value of the coefficients.
    pub fn max_norm(&self) -> Integer {
        self.coefficients
            .iter()
            .map(|c| c.abs())
            .max()
            .unwrap_or_else(Integer::zero)
    }

    /// Map every coefficient into the symmetric range modulo `m`.
    pub fn symmetric_mod(&self, m: &Integer) -> Self {
        self.map_coeff(|c| c.symmetric_mod(m), &self.field)
    }

    /// Map every coefficient into `[0, m)`.
    pub fn positive_mod(&self, m: &Integer) -> Self {
        self.map_coeff(|c| c.quot_rem(m).1, &self.field)
    }

    /// Reduce the polynomial modulo the prime of `field`.
    pub fn to_finite_field(&self, field: &FiniteField) -> UnivariatePolynomial<FiniteField> {
        self.map_coeff(|c| field.element_from_integer(c), field)
    }

    /// Lift a polynomial over a prime field to the integers, using the representatives `[0, p)`.
    pub fn from_finite_field(poly: &UnivariatePolynomial<FiniteField>) -> Self {
        poly.map_coeff(|c| poly.field.to_integer(c), &IntegerRing::new())
    }
}

#[cfg(test)]
mod test {
    use crate::domains::{
        finite_field::FiniteField,
        integer::{Integer, IntegerRing},
        Ring,
    };

    use super::UnivariatePolynomial;

    fn int_poly(c: &[i64]) -> UnivariatePolynomial<IntegerRing> {
        UnivariatePolynomial::from_coefficients(
            &IntegerRing::new(),
            c.iter().map(|x| Integer::new(*x)).collect(),
        )
    }

    fn ff_poly(field: &FiniteField, c: &[u32]) -> UnivariatePolynomial<FiniteField> {
        UnivariatePolynomial::from_coefficients(field, c.iter().map(|x| field.to_element(*x)).collect())
    }

    #[test]
    fn integer_division() {
        // (x^2 - 1) / (x + 1) = x - 1
        let a = int_poly(&[-1, 0, 1]);
        let b = int_poly(&[1, 1]);
        assert_eq!(a.divides(&b), Some(int_poly(&[-1, 1])));
        assert_eq!(a.divides(&int_poly(&[1, 2])), None);
        assert_eq!(int_poly(&[0, 0, 0]).degree(), 0);
        assert!(int_poly(&[0, 0, 0]).is_zero());
    }

    #[test]
    fn finite_field_gcd() {
        let field = FiniteField::new(7);
        // (x + 1)(x + 2) and (x + 1)(x + 3)
        let a = ff_poly(&field, &[2, 3, 1]);
        let b = ff_poly(&field, &[3, 4, 1]);
        assert_eq!(a.gcd(&b), ff_poly(&field, &[1, 1]));

        let (g, s, t) = a.eea(&b);
        assert_eq!(&(&a * &s) + &(&b * &t), g);
    }

    #[test]
    fn power_modulo() {
        let field = FiniteField::new(5);
        let x = ff_poly(&field, &[0, 1]);
        let m = ff_poly(&field, &[1, 0, 1]);
        // x^5 mod (x^2 + 1) = x^4 * x = x
        let r = x.pow_mod(&Integer::new(5), &m);
        assert_eq!(r, x);
        assert!(field.is_one(&r.lcoeff()));
    }

    #[test]
    fn residues() {
        let a = int_poly(&[-3, 4, 9]);
        assert_eq!(a.symmetric_mod(&Integer::new(5)), int_poly(&[2, -1, -1]));
        assert_eq!(a.positive_mod(&Integer::new(5)), int_poly(&[2, 4, 4]));
        assert_eq!(a.max_norm(), Integer::new(9));
    }
}
