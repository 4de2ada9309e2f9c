use std::fmt::{self, Display, Write};

use crate::{
    domains::Ring,
    poly::{polynomial::MultivariatePolynomial, Exponent},
};

/// Prints a polynomial in infix notation, with the terms in descending lexicographic order,
/// for example `3*x^2*y-x+1`.
pub struct PolynomialPrinter<'a, F: Ring, E: Exponent> {
    pub poly: &'a MultivariatePolynomial<F, E>,
}

impl<'a, F: Ring, E: Exponent> PolynomialPrinter<'a, F, E> {
    pub fn new(poly: &'a MultivariatePolynomial<F, E>) -> PolynomialPrinter<'a, F, E> {
        PolynomialPrinter { poly }
    }
}

impl<'a, F: Ring, E: Exponent> Display for PolynomialPrinter<'a, F, E>
where
    F::Element: Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.poly.is_zero() {
            return f.write_char('0');
        }

        let field = &self.poly.field;
        let vars = self.poly.get_vars_ref();
        let mut first = true;
        for t in (0..self.poly.nterms()).rev() {
            let coeff = &self.poly.coefficients[t];
            let exponents = self.poly.exponents(t);
            let is_constant = exponents.iter().all(|e| e.is_zero());

            let c = coeff.to_string();
            if !first && !c.starts_with('-') {
                f.write_char('+')?;
            }
            first = false;

            let mut write_mul = false;
            if is_constant {
                f.write_str(&c)?;
            } else if field.is_one(&field.neg(coeff)) {
                f.write_char('-')?;
            } else if !field.is_one(coeff) {
                f.write_str(&c)?;
                write_mul = true;
            }

            for (v, e) in vars.iter().zip(exponents) {
                if e.is_zero() {
                    continue;
                }

                if write_mul {
                    f.write_char('*')?;
                }
                write_mul = true;

                f.write_str(v)?;
                if e.to_u32() != 1 {
                    write!(f, "^{}", e)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::domains::integer::{Integer, IntegerRing};
    use crate::poly::polynomial::MultivariatePolynomial;

    fn poly(terms: &[(i64, [u32; 2])]) -> MultivariatePolynomial<IntegerRing, u32> {
        let mut p = MultivariatePolynomial::new(
            &IntegerRing::new(),
            None,
            Arc::new(vec!["x".into(), "y".into()]),
        );
        for (c, e) in terms {
            p.append_monomial(Integer::new(*c), e);
        }
        p
    }

    #[test]
    fn descending_terms() {
        let p = poly(&[(1, [0, 0]), (-3, [1, 0]), (2, [2, 1])]);
        assert_eq!(p.to_string(), "2*x^2*y-3*x+1");
    }

    #[test]
    fn unit_coefficients() {
        assert_eq!(poly(&[(1, [1, 0]), (-1, [0, 1])]).to_string(), "x-y");
        assert_eq!(poly(&[(-1, [1, 1]), (-1, [0, 0])]).to_string(), "-x*y-1");
        assert_eq!(poly(&[(1, [0, 0])]).to_string(), "1");
        assert_eq!(poly(&[]).to_string(), "0");
    }
}
