use std::sync::Arc;

use rand::thread_rng;
use thiserror::Error;
use tracing::{instrument, trace};

use crate::{
    combinatorics::{remove_indices, CombinationIterator},
    domains::{
        finite_field::{FiniteField, PrimeIteratorU32},
        integer::{Integer, IntegerRing},
        Ring,
    },
};

use super::{
    gcd::GCDError, polynomial::MultivariatePolynomial, univariate::UnivariatePolynomial, Exponent,
};

/// The largest degree of the univariate image of a Kronecker substitution.
pub const MAX_KRONECKER_DEGREE: u64 = 400;
/// The largest number of univariate image factors that are recombined after a
/// Kronecker substitution.
pub const MAX_KRONECKER_FACTORS: usize = 16;
/// The largest number of modular factors that are recombined after Hensel lifting.
pub const MAX_MODULAR_FACTORS: usize = 24;
/// The largest degree of a polynomial in a single variable that is factored.
pub const MAX_UNIVARIATE_DEGREE: u32 = 1000;
/// The number of suitable primes that are tried to find the image with the fewest factors.
const PRIME_CANDIDATES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactorizationError {
    #[error("the Kronecker image has degree {degree}, which exceeds the limit {limit}")]
    ImageDegreeTooLarge { degree: u64, limit: u64 },
    #[error("{count} factors need to be recombined, which exceeds the limit {limit}")]
    TooManyCandidates { count: usize, limit: usize },
    #[error("no prime keeps the polynomial square-free")]
    NoSuitablePrime,
    #[error("the degree {degree} exceeds the univariate limit {limit}")]
    DegreeTooLarge { degree: u32, limit: u32 },
    #[error(transparent)]
    Gcd(#[from] GCDError),
}

pub trait Factorize: Sized {
    /// Perform a square-free factorization.
    /// The output is `a_1^e1*...*a_n^e_n`
    /// where each `a_i` is relative prime.
    fn square_free_factorization(&self) -> Result<Vec<(Self, usize)>, FactorizationError>;
    /// Factor a polynomial into a constant and irreducible factors with their multiplicity.
    fn factor(&self) -> Result<(Integer, Vec<(Self, usize)>), FactorizationError>;
}

impl<E: Exponent> MultivariatePolynomial<IntegerRing, E> {
    /// Find factors that do not contain all variables.
    pub fn factor_separable(&self) -> Result<Vec<Self>, GCDError> {
        let mut stripped = self.clone();

        let mut factors = vec![];
        for x in 0..self.nvars() {
            if self.degree(x) == E::zero() {
                continue;
            }

            let gcd = stripped.univariate_content(x)?;

            if !gcd.is_constant() {
                stripped = &stripped / &gcd;
                factors.extend(gcd.factor_separable()?);
            }
        }

        factors.push(stripped);
        Ok(factors)
    }

    /// Perform a square free factorization using Yun's algorithm.
    ///
    /// All variables must occur in every factor.
    fn square_free_factorization_0_char(&self) -> Result<Vec<(Self, usize)>, GCDError> {
        if self.is_constant() {
            if self.is_one() {
                return Ok(vec![]);
            } else {
                return Ok(vec![(self.clone(), 1)]);
            }
        }

        // any variable can be selected
        // select the one with the lowest degree
        let Some(lowest_rank_var) = (0..self.nvars())
            .filter(|x| self.degree(*x) > E::zero())
            .min_by_key(|x| self.degree(*x))
        else {
            return Ok(vec![(self.clone(), 1)]);
        };

        let b = self.derivative(lowest_rank_var);
        let c = self.gcd(&b)?;

        if c.is_one() {
            return Ok(vec![(self.clone(), 1)]);
        }

        let mut factors = vec![];

        let mut w = self / &c;
        let mut y = &b / &c;

        let mut i = 1;
        while !w.is_constant() {
            let z = &y - &w.derivative(lowest_rank_var);
            let g = w.gcd(&z)?;
            w = &w / &g;
            y = &z / &g;

            if !g.is_one() {
                factors.push((g, i));
            }
            i += 1
        }

        Ok(factors)
    }

    /// Factor a primitive, square-free polynomial without monomial factors into
    /// irreducible factors.
    fn factor_square_free(&self) -> Result<Vec<Self>, FactorizationError> {
        let vars: Vec<usize> = (0..self.nvars())
            .filter(|x| self.degree(*x) > E::zero())
            .collect();

        match vars.as_slice() {
            [] => Ok(vec![]),
            [var] => {
                let degree = self.degree(*var).to_u32();
                if degree > MAX_UNIVARIATE_DEGREE {
                    return Err(FactorizationError::DegreeTooLarge {
                        degree,
                        limit: MAX_UNIVARIATE_DEGREE,
                    });
                }

                let factors = self.to_univariate(*var).factor_square_free()?;
                Ok(factors
                    .iter()
                    .map(|f| self.from_univariate(f, *var))
                    .collect())
            }
            _ if vars.iter().any(|x| self.degree(*x) == E::one()) => {
                // a polynomial that is primitive in every variable and linear in one is irreducible
                Ok(vec![self.clone()])
            }
            _ => self.factor_kronecker(&vars),
        }
    }

    /// Factor a polynomial that is primitive in every variable by mapping it
    /// to a univariate polynomial with the substitution `x_i -> t^(w_i)`,
    /// factoring the image, and recombining the image factors.
    #[instrument(level = "trace", skip_all)]
    fn factor_kronecker(&self, vars: &[usize]) -> Result<Vec<Self>, FactorizationError> {
        // the image of every factor can be mapped back uniquely, as the degree of a factor
        // in each variable is bounded by the degree of the polynomial
        let mut radices = Vec::with_capacity(vars.len());
        let mut weights = Vec::with_capacity(vars.len());
        let mut w: u64 = 1;
        for v in vars {
            let r = self.degree(*v).to_u32() as u64 + 1;
            weights.push(w);
            radices.push(r);
            w = w.saturating_mul(r);
        }

        let image_degree: u64 = vars
            .iter()
            .zip(&weights)
            .map(|(v, w)| (self.degree(*v).to_u32() as u64).saturating_mul(*w))
            .fold(0u64, |acc, d| acc.saturating_add(d));
        if image_degree > MAX_KRONECKER_DEGREE {
            return Err(FactorizationError::ImageDegreeTooLarge {
                degree: image_degree,
                limit: MAX_KRONECKER_DEGREE,
            });
        }

        let image_vars = Arc::new(vec![self.get_vars_ref()[vars[0]].clone()]);
        let mut image: MultivariatePolynomial<IntegerRing, u32> =
            MultivariatePolynomial::new(&self.field, Some(self.nterms()), image_vars);
        for t in self {
            let d: u64 = vars
                .iter()
                .zip(&weights)
                .map(|(v, w)| t.exponents[*v].to_u32() as u64 * w)
                .sum();
            image.append_monomial(t.coefficient.clone(), &[d as u32]);
        }

        trace!("Kronecker image of degree {}: {}", image_degree, image);

        let (_, image_factors) = image.factor()?;
        let mut candidates = vec![];
        for (f, k) in image_factors {
            for _ in 0..k {
                candidates.push(f.clone());
            }
        }

        if candidates.len() == 1 {
            return Ok(vec![self.clone()]);
        }

        if candidates.len() > MAX_KRONECKER_FACTORS {
            return Err(FactorizationError::TooManyCandidates {
                count: candidates.len(),
                limit: MAX_KRONECKER_FACTORS,
            });
        }

        let inverse_image = |g: &MultivariatePolynomial<IntegerRing, u32>| {
            let mut res = self.zero_with_capacity(g.nterms());
            let mut e = vec![E::zero(); self.nvars()];
            for t in g {
                let mut d = t.exponents[0] as u64;
                for (v, r) in vars.iter().zip(&radices) {
                    e[*v] = E::from_u32((d % r) as u32);
                    d /= r;
                }
                res.append_monomial(t.coefficient.clone(), &e);
            }
            res
        };

        let mut factors = vec![];
        let mut rest = self.clone();
        let mut s = 1;
        'len: while 2 * s <= candidates.len() {
            let mut cs = CombinationIterator::new(candidates.len(), s);
            while let Some(c) = cs.next() {
                let mut g = candidates[c[0]].clone();
                for i in &c[1..] {
                    g = &g * &candidates[*i];
                }

                let g = inverse_image(&g);
                if g.is_constant() {
                    continue;
                }

                if let Some(q) = rest.divides(&g) {
                    trace!("found factor {}", g);
                    let c = c.to_vec();
                    factors.push(g);
                    rest = q;
                    remove_indices(&mut candidates, &c);
                    continue 'len;
                }
            }

            s += 1;
        }

        if !rest.is_constant() {
            factors.push(rest);
        }

        Ok(factors)
    }
}

impl<E: Exponent> Factorize for MultivariatePolynomial<IntegerRing, E> {
    fn square_free_factorization(&self) -> Result<Vec<(Self, usize)>, FactorizationError> {
        if self.is_zero() {
            return Ok(vec![]);
        }

        let c = self.content();
        let stripped = self.clone().div_coeff(&c);

        let mut factors = vec![];

        if !c.is_one() {
            factors.push((self.constant(c), 1));
        }

        for f in stripped.factor_separable()? {
            factors.extend(f.square_free_factorization_0_char()?);
        }

        if factors.is_empty() {
            factors.push((self.one(), 1))
        }

        Ok(factors)
    }

    #[instrument(level = "trace", skip_all)]
    fn factor(&self) -> Result<(Integer, Vec<(Self, usize)>), FactorizationError> {
        if self.is_zero() {
            return Ok((Integer::zero(), vec![]));
        }

        if self.is_constant() {
            return Ok((self.lcoeff(), vec![]));
        }

        let content = self.content();
        let mut stripped = self.clone().div_coeff(&content).normalize();

        let mut factors = vec![];

        // monomial factors
        let shift = stripped.min_exponents();
        for (v, e) in shift.iter().enumerate() {
            if !e.is_zero() {
                factors.push((stripped.variable(v), e.to_u32() as usize));
            }
        }
        stripped = stripped.div_exp(&shift);

        for f in stripped.factor_separable()? {
            for (g, k) in f.square_free_factorization_0_char()? {
                if g.is_constant() {
                    continue;
                }

                trace!("square-free factor {} with multiplicity {}", g, k);
                for h in g.factor_square_free()? {
                    factors.push((h.make_primitive().normalize(), k));
                }
            }
        }

        factors.sort_by_cached_key(|(f, _)| (f.total_degree(), f.to_string()));

        // the remaining constant
        let mut lc = Integer::one();
        for (f, k) in &factors {
            lc = &lc * &f.lcoeff().pow(*k as u32);
        }
        let constant = &self.lcoeff() / &lc;

        Ok((constant, factors))
    }
}

impl UnivariatePolynomial<FiniteField> {
    /// Perform distinct degree factorization on a monic and square-free polynomial.
    pub fn distinct_degree_factorization(&self) -> Vec<(usize, Self)> {
        let p = Integer::from(self.field.get_prime());
        let x = self.monomial(self.field.one(), 1);

        let mut factors = vec![];
        let mut h = x.clone();
        let mut f = self.clone();
        let mut i: usize = 0;
        while f.degree() >= 2 * (i + 1) {
            i += 1;

            h = h.pow_mod(&p, &f);

            let g = (&h - &x).gcd(&f);

            if !g.is_one() {
                f = f.quot_rem_field(&g).0;
                h = h.rem_field(&f);
                factors.push((i, g));
            }
        }

        // f cannot be split more
        if f.degree() > 0 {
            factors.push((f.degree(), f));
        }

        factors
    }

    /// Perform Cantor-Zassenhaus's probabilistic algorithm for
    /// finding irreducible factors of degree `d`.
    pub fn equal_degree_factorization(&self, d: usize) -> Vec<Self> {
        let s = self.clone().make_monic();
        let n = s.degree();

        if n <= d {
            return vec![s];
        }

        let p = self.field.get_prime();
        let exp = &(&Integer::from(p).pow(d as u32) - &Integer::one()) / &Integer::new(2);
        let one = s.one();

        let mut rng = thread_rng();
        let factor = loop {
            // generate a random non-constant polynomial
            let coefficients = (0..n)
                .map(|_| self.field.sample(&mut rng, (0, p as i64)))
                .collect();
            let random_poly = UnivariatePolynomial::from_coefficients(&self.field, coefficients);

            if random_poly.is_constant() {
                continue;
            }

            let g = random_poly.gcd(&s);

            if !g.is_one() {
                break g;
            }

            let b = &random_poly.pow_mod(&exp, &s) - &one;

            let g = b.gcd(&s);

            if !g.is_one() && g.degree() < n {
                break g;
            }
        };

        let mut factors = factor.equal_degree_factorization(d);
        factors.extend(s.quot_rem_field(&factor).0.equal_degree_factorization(d));
        factors
    }

    /// Perform distinct and equal degree factorization on a square-free polynomial.
    pub fn factor_distinct_equal_degree(&self) -> Vec<Self> {
        let mut factors = vec![];
        for (d, f) in self.clone().make_monic().distinct_degree_factorization() {
            factors.extend(f.equal_degree_factorization(d));
        }
        factors
    }
}

impl UnivariatePolynomial<IntegerRing> {
    /// Factor a primitive, square-free polynomial with a positive leading coefficient
    /// by Hensel lifting the factors of a modular image and recombining the lifted factors.
    #[instrument(level = "trace", skip_all)]
    pub fn factor_square_free(&self) -> Result<Vec<Self>, FactorizationError> {
        let d = self.degree();
        if d <= 1 {
            return Ok(vec![self.clone()]);
        }

        // select the prime whose image has the fewest factors
        let lcoeff = self.lcoeff();
        let mut best: Option<(FiniteField, Vec<UnivariatePolynomial<FiniteField>>)> = None;
        let mut tried = 0;
        for p in PrimeIteratorU32::below(1 << 15) {
            if lcoeff.mod_u32(p) == 0 {
                continue;
            }

            let field = FiniteField::new(p);
            let f_p = self.to_finite_field(&field);
            if !f_p.gcd(&f_p.derivative()).is_one() {
                continue;
            }

            let hs = f_p.factor_distinct_equal_degree();
            trace!("{} factors modulo {}", hs.len(), p);
            if hs.len() == 1 {
                return Ok(vec![self.clone()]);
            }

            if best.as_ref().map(|b| hs.len() < b.1.len()).unwrap_or(true) {
                best = Some((field, hs));
            }

            tried += 1;
            if tried == PRIME_CANDIDATES {
                break;
            }
        }

        let Some((field, hs)) = best else {
            return Err(FactorizationError::NoSuitablePrime);
        };

        if hs.len() > MAX_MODULAR_FACTORS {
            return Err(FactorizationError::TooManyCandidates {
                count: hs.len(),
                limit: MAX_MODULAR_FACTORS,
            });
        }

        // every factor has coefficients bounded by the Mignotte bound
        let bound = &(&(&lcoeff * &Integer::new(2).pow(d as u32))
            * &Integer::from(Integer::ceil_sqrt(d as u64 + 1) + 1))
            * &self.max_norm();
        let two_bound = &bound * &Integer::new(2);

        let p = Integer::from(field.get_prime());
        let mut max_p = p.clone();
        while max_p <= two_bound {
            max_p = &max_p * &p;
        }

        // lift the factors of the monic image lc^-1 f
        let Some(inv) = lcoeff.mod_inverse(&max_p) else {
            return Err(FactorizationError::NoSuitablePrime);
        };
        let target = self.map_coeff(|c| (c * &inv).quot_rem(&max_p).1, &self.field);
        let mut factors = multi_factor_hensel_lift(&target, &hs, &max_p);

        let mut rec_factors = vec![];
        let mut rest = self.clone();
        let mut s = 1;
        'len: while 2 * s <= factors.len() {
            let mut fs = CombinationIterator::new(factors.len(), s);
            while let Some(cs) = fs.next() {
                let lc = rest.lcoeff();
                let mut g = rest.constant(lc);
                for i in cs {
                    g = (&g * &factors[*i]).symmetric_mod(&max_p);
                }

                let g = g.make_primitive();

                // the constant term of a factor divides the constant term of the polynomial
                let c = g.get_constant();
                if !c.is_zero() && !rest.get_constant().quot_rem(&c).1.is_zero() {
                    continue;
                }

                if let Some(q) = rest.divides(&g) {
                    let cs = cs.to_vec();
                    rec_factors.push(g);
                    rest = q;
                    remove_indices(&mut factors, &cs);
                    continue 'len;
                }
            }

            s += 1;
        }

        if !rest.is_constant() {
            rec_factors.push(rest);
        }

        Ok(rec_factors)
    }
}

/// Lift the monic factors `hs` of `f mod p` to monic factors of `f mod max_p`, where
/// `f` is monic modulo `max_p`.
fn multi_factor_hensel_lift(
    f: &UnivariatePolynomial<IntegerRing>,
    hs: &[UnivariatePolynomial<FiniteField>],
    max_p: &Integer,
) -> Vec<UnivariatePolynomial<IntegerRing>> {
    if hs.len() == 1 {
        return vec![f.positive_mod(max_p)];
    }

    let (gs, hs) = hs.split_at(hs.len() / 2);

    let mut g = gs[0].clone();
    for x in &gs[1..] {
        g = &g * x;
    }

    let mut h = hs[0].clone();
    for x in &hs[1..] {
        h = &h * x;
    }

    let (g_i, h_i) = hensel_lift(f, &g, &h, max_p);

    let mut factors = multi_factor_hensel_lift(&g_i, gs, max_p);
    factors.extend(multi_factor_hensel_lift(&h_i, hs, max_p));
    factors
}

/// Lift `f = g * h mod p` to `f = G * H mod max_p` with monic `G` and `H`
/// by linear Hensel lifting. `f` must be monic and `g` and `h` must be
/// monic and coprime.
fn hensel_lift(
    f: &UnivariatePolynomial<IntegerRing>,
    g: &UnivariatePolynomial<FiniteField>,
    h: &UnivariatePolynomial<FiniteField>,
    max_p: &Integer,
) -> (UnivariatePolynomial<IntegerRing>, UnivariatePolynomial<IntegerRing>) {
    let field = &g.field;
    let p = Integer::from(field.get_prime());
    let (_, _, t) = g.eea(h);

    let mut g_i = UnivariatePolynomial::<IntegerRing>::from_finite_field(g);
    let mut h_i = UnivariatePolynomial::<IntegerRing>::from_finite_field(h);

    let mut m = p.clone();
    while &m < max_p {
        let e = f - &(&g_i * &h_i);
        if e.positive_mod(max_p).is_zero() {
            break;
        }

        let e_p = e.div_coeff(&m).to_finite_field(field);

        // solve dg * h + dh * g = e mod p
        let dg = (&e_p * &t).rem_field(g);
        let dh = (&e_p - &(&dg * h)).quot_rem_field(g).0;

        g_i = &g_i + &UnivariatePolynomial::<IntegerRing>::from_finite_field(&dg).mul_coeff(&m);
        h_i = &h_i + &UnivariatePolynomial::<IntegerRing>::from_finite_field(&dh).mul_coeff(&m);

        m = &m * &p;
    }

    (g_i.positive_mod(max_p), h_i.positive_mod(max_p))
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::domains::{
        finite_field::FiniteField,
        integer::{Integer, IntegerRing},
    };
    use crate::poly::{polynomial::MultivariatePolynomial, univariate::UnivariatePolynomial};

    use super::{FactorizationError, Factorize, MAX_UNIVARIATE_DEGREE};

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

    fn poly3(terms: &[(i64, [u32; 3])]) -> MultivariatePolynomial<IntegerRing, u32> {
        let mut p = MultivariatePolynomial::new(
            &IntegerRing::new(),
            None,
            Arc::new(vec!["x".into(), "y".into(), "z".into()]),
        );
        for (c, e) in terms {
            p.append_monomial(Integer::new(*c), e);
        }
        p
    }

    fn reconstruct(
        c: &Integer,
        factors: &[(MultivariatePolynomial<IntegerRing, u32>, usize)],
    ) -> MultivariatePolynomial<IntegerRing, u32> {
        let mut r = poly(&[]).constant(c.clone());
        for (f, k) in factors {
            r = &r * &f.pow(*k);
        }
        r
    }

    #[test]
    fn difference_of_squares() {
        let a = poly(&[(1, [2, 0]), (-1, [0, 0])]);
        let (c, f) = a.factor().unwrap();
        assert_eq!(c, Integer::one());
        assert_eq!(
            f,
            vec![
                (poly(&[(1, [1, 0]), (1, [0, 0])]), 1),
                (poly(&[(1, [1, 0]), (-1, [0, 0])]), 1)
            ]
        );
    }

    #[test]
    fn content_sign_and_monomials() {
        // -6 x^3 y + 6 x y
        let a = poly(&[(-6, [3, 1]), (6, [1, 1])]);
        let (c, f) = a.factor().unwrap();
        assert_eq!(c, Integer::new(-6));
        assert_eq!(f.len(), 4);
        assert_eq!(reconstruct(&c, &f), a);
        assert!(f.iter().all(|(g, _)| !g.lcoeff().is_negative()));
    }

    #[test]
    fn constants() {
        assert_eq!(poly(&[]).factor().unwrap(), (Integer::zero(), vec![]));
        assert_eq!(poly(&[(-7, [0, 0])]).factor().unwrap(), (Integer::new(-7), vec![]));
    }

    #[test]
    fn repeated_factors() {
        let x1 = poly(&[(1, [1, 0]), (1, [0, 0])]);
        let x2 = poly(&[(1, [1, 0]), (-2, [0, 0])]);
        let a = &(&x1.pow(3) * &x2.pow(2)) * &poly(&[(3, [0, 0])]);
        let (c, f) = a.factor().unwrap();
        assert_eq!(c, Integer::new(3));
        assert!(f.contains(&(x1, 3)));
        assert!(f.contains(&(x2, 2)));
    }

    #[test]
    fn univariate_quartic() {
        // x^4 + 4 = (x^2 - 2x + 2)(x^2 + 2x + 2)
        let a = poly(&[(1, [4, 0]), (4, [0, 0])]);
        let (c, f) = a.factor().unwrap();
        assert_eq!(f.len(), 2);
        assert_eq!(reconstruct(&c, &f), a);

        // x^4 + 1 is irreducible over the integers
        let b = poly(&[(1, [4, 0]), (1, [0, 0])]);
        assert_eq!(b.factor().unwrap().1, vec![(b.clone(), 1)]);
    }

    #[test]
    fn non_monic_univariate() {
        // (2x + 3)(3x^2 - 5)(x - 7)
        let a = &(&poly(&[(2, [1, 0]), (3, [0, 0])]) * &poly(&[(3, [2, 0]), (-5, [0, 0])]))
            * &poly(&[(1, [1, 0]), (-7, [0, 0])]);
        let (c, f) = a.factor().unwrap();
        assert_eq!(c, Integer::one());
        assert_eq!(f.len(), 3);
        assert_eq!(reconstruct(&c, &f), a);
    }

    #[test]
    fn multivariate() {
        // (x y + 1)(x^2 + y^2 + 1)
        let a = &poly(&[(1, [1, 1]), (1, [0, 0])])
            * &poly(&[(1, [2, 0]), (1, [0, 2]), (1, [0, 0])]);
        let (c, f) = a.factor().unwrap();
        assert_eq!(f.len(), 2);
        assert_eq!(reconstruct(&c, &f), a);

        // x^2 - y^2
        let b = poly(&[(1, [2, 0]), (-1, [0, 2])]);
        let (_, f) = b.factor().unwrap();
        assert_eq!(f.len(), 2);
    }

    #[test]
    fn separable_factors() {
        // (y + 1)(x + 1)
        let a = &poly(&[(1, [0, 1]), (1, [0, 0])]) * &poly(&[(1, [1, 0]), (1, [0, 0])]);
        let (c, f) = a.factor().unwrap();
        assert_eq!(f.len(), 2);
        assert_eq!(reconstruct(&c, &f), a);
    }

    #[test]
    fn kronecker_degree_limit() {
        let a = &poly(&[(1, [30, 20]), (1, [0, 0])]) * &poly(&[(1, [2, 3]), (2, [0, 0])]);
        assert!(matches!(
            a.factor(),
            Err(FactorizationError::ImageDegreeTooLarge { .. })
        ));
    }

    #[test]
    fn three_variables() {
        // (3x^2y + 2yz^2 - 5xz + 7)(x + yz - 2)
        let g = poly3(&[(3, [2, 1, 0]), (2, [0, 1, 2]), (-5, [1, 0, 1]), (7, [0, 0, 0])]);
        let h = poly3(&[(1, [1, 0, 0]), (1, [0, 1, 1]), (-2, [0, 0, 0])]);
        let a = &g * &h;

        let (c, f) = a.factor().unwrap();
        assert_eq!(c, Integer::one());
        assert_eq!(f, vec![(h, 1), (g, 1)]);
    }

    #[test]
    fn large_exponents() {
        // x^4294967295 y + y
        let a = poly(&[(1, [u32::MAX, 1]), (1, [0, 1])]);
        assert!(matches!(
            a.factor(),
            Err(FactorizationError::DegreeTooLarge {
                limit: MAX_UNIVARIATE_DEGREE,
                ..
            })
        ));

        // the Kronecker image degree saturates instead of overflowing
        let b = poly(&[(1, [3000000000, 0]), (-1, [0, 3000000000])]);
        assert!(matches!(
            b.factor(),
            Err(FactorizationError::ImageDegreeTooLarge { .. })
        ));

        // the square-free step fails through the gcd limit
        let c = poly(&[(1, [1001, 0]), (1, [1, 0]), (1, [0, 0])]);
        assert!(matches!(
            c.square_free_factorization(),
            Err(FactorizationError::Gcd(_))
        ));
    }

    #[test]
    fn distinct_and_equal_degree() {
        let field = FiniteField::new(13);
        // (x + 1)(x + 2)(x^2 + 2), where x^2 + 2 is irreducible mod 13
        let c: Vec<_> = [1u32, 1].iter().map(|x| field.to_element(*x)).collect();
        let a = UnivariatePolynomial::from_coefficients(&field, c);
        let b = UnivariatePolynomial::from_coefficients(
            &field,
            vec![field.to_element(2), field.to_element(1)],
        );
        let q = UnivariatePolynomial::from_coefficients(
            &field,
            vec![field.to_element(2), field.to_element(0), field.to_element(1)],
        );
        let f = &(&a * &b) * &q;
        let factors = f.factor_distinct_equal_degree();
        assert_eq!(factors.len(), 3);
        assert!(factors.contains(&q));
    }
}
