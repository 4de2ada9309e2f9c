use std::borrow::Cow;
use std::cmp::{max, min};

use ahash::HashSet;
use rand::{thread_rng, RngCore};
use smallvec::{smallvec, SmallVec};
use thiserror::Error;
use tracing::{instrument, trace};

use crate::domains::{
    finite_field::{FiniteField, FiniteFieldElement},
    integer::{Integer, IntegerRing, SMALL_PRIMES},
    linear_system::{LinearSolverError, Matrix},
    EuclideanDomain, Field, Ring,
};

use super::{polynomial::MultivariatePolynomial, Exponent, INLINED_EXPONENTS};

// 100 large u32 primes starting from the 203213901st prime number
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

/// The maximum power of a variable that is cached
pub const POW_CACHE_SIZE: usize = 1000;

/// The upper bound of the range to be sampled during the computation of multiple gcds
pub const MAX_RNG_PREFACTOR: u32 = 50000;

/// The largest degree of a variable that occurs in both operands of a gcd.
pub const MAX_GCD_DEGREE: u32 = 1000;

/// The largest number of bits of an evaluation point before the heuristic gcd gives up.
const MAX_EVALUATION_BITS: u64 = 256;

/// The number of random sample points that are tried before an image is considered bad.
const MAX_SAMPLE_ATTEMPTS: usize = 64;

/// The number of failed images for a single prime before a new prime is selected.
const MAX_IMAGE_FAILURES: usize = 8;

/// The reason a gcd computation gave up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GCDError {
    #[error("the degree {degree} exceeds the gcd degree limit {limit}")]
    DegreeTooLarge { degree: u32, limit: u32 },
    #[error("ran out of primes for the modular gcd")]
    OutOfPrimes,
    #[error("cannot compute the gcd of an empty list")]
    EmptyList,
}

#[derive(Debug)]
pub enum HeuristicGCDError {
    MaxSizeExceeded,
    BadReconstruction,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum ImageError {
    BadOriginalImage,
    BadCurrentImage,
}

type Element = FiniteFieldElement;

#[inline]
fn sample_point(field: &FiniteField, rng: &mut impl RngCore) -> Element {
    field.sample(rng, (1, MAX_RNG_PREFACTOR as i64))
}

/// Create an empty power table for every variable of `a` and `b`.
fn pow_cache<E: Exponent>(
    a: &MultivariatePolynomial<FiniteField, E>,
    b: &MultivariatePolynomial<FiniteField, E>,
) -> Vec<Vec<Element>> {
    (0..a.nvars())
        .map(|i| {
            vec![
                a.field.zero();
                min(
                    max(a.degree(i), b.degree(i)).to_u32() as usize + 1,
                    POW_CACHE_SIZE
                )
            ]
        })
        .collect()
}

fn clear_cache(cache: &mut [Vec<Element>]) {
    for v in cache {
        for vi in v {
            *vi = FiniteFieldElement(0);
        }
    }
}

fn newton_interpolation<E: Exponent>(
    a: &[Element],
    u: &[MultivariatePolynomial<FiniteField, E>],
    x: usize, // the variable index to extend the polynomial by
) -> MultivariatePolynomial<FiniteField, E> {
    let field = &u[0].field;

    // compute inverses
    let mut gammas = Vec::with_capacity(a.len());
    for k in 1..a.len() {
        let mut pr = field.sub(&a[k], &a[0]);
        for i in 1..k {
            field.mul_assign(&mut pr, &field.sub(&a[k], &a[i]));
        }
        gammas.push(field.inv(&pr));
    }

    // compute Newton coefficients
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
    let mut e = vec![E::zero(); u[0].nvars()];
    e[x] = E::one();
    let xp = u[0].monomial(field.one(), e);
    let mut res = v[v.len() - 1].clone();
    for k in (0..v.len() - 1).rev() {
        res = &(&res * &(&xp - &u[0].constant(a[k]))) + &v[k];
    }
    res
}

/// Evaluation of the exponents by filling in the variables
#[inline(always)]
fn evaluate_exponents<E: Exponent>(
    poly: &MultivariatePolynomial<FiniteField, E>,
    r: &[(usize, Element)],
    cache: &mut [Vec<Element>],
) -> Vec<Element> {
    let mut eval = vec![poly.field.one(); poly.nterms()];
    for (c, t) in eval.iter_mut().zip(poly) {
        // evaluate each exponent
        for &(n, v) in r {
            let exp = t.exponents[n].to_u32() as usize;
            if exp > 0 {
                if exp < cache[n].len() {
                    if FiniteField::is_zero(&cache[n][exp]) {
                        cache[n][exp] = poly.field.pow(&v, exp as u64);
                    }

                    poly.field.mul_assign(c, &cache[n][exp]);
                } else {
                    poly.field.mul_assign(c, &poly.field.pow(&v, exp as u64));
                }
            }
        }
    }
    eval
}

/// Evaluate a polynomial using the evaluation of the exponent of every monomial.
/// The main variable must be the most significant variable that occurs.
#[inline(always)]
fn evaluate_using_exponents<E: Exponent>(
    poly: &MultivariatePolynomial<FiniteField, E>,
    exp_evals: &[Element],
    main_var: usize,
    out: &mut MultivariatePolynomial<FiniteField, E>,
) {
    out.coefficients.clear();
    out.exponents.clear();

    let field = &poly.field;
    let mut c = field.zero();
    let mut new_exp = vec![E::zero(); poly.nvars()];
    for (aa, e) in poly.into_iter().zip(exp_evals) {
        if aa.exponents[main_var] != new_exp[main_var] {
            if !FiniteField::is_zero(&c) {
                out.coefficients.push(c);
                out.exponents.extend_from_slice(&new_exp);
                c = field.zero();
            }

            new_exp[main_var] = aa.exponents[main_var];
        }

        field.add_assign(&mut c, &field.mul(aa.coefficient, e));
    }

    if !FiniteField::is_zero(&c) {
        out.coefficients.push(c);
        out.exponents.extend_from_slice(&new_exp);
    }
}

/// Check that every power of the main variable in `g` occurs in the shape.
fn terms_in_shape<E: Exponent>(
    g: &MultivariatePolynomial<FiniteField, E>,
    main_var: usize,
    shape: &[(MultivariatePolynomial<FiniteField, E>, E)],
) -> bool {
    g.exponents_iter()
        .all(|e| shape.iter().any(|(_, pow)| *pow == e[main_var]))
}

/// Get the coefficient of `main_var^exp` in the univariate polynomial `g`,
/// trying the term at `hint` first.
fn coefficient_of<E: Exponent>(
    g: &MultivariatePolynomial<FiniteField, E>,
    hint: usize,
    main_var: usize,
    exp: E,
) -> Element {
    if hint < g.nterms() && g.exponents(hint)[main_var] == exp {
        return g.coefficients[hint];
    }

    g.into_iter()
        .find(|t| t.exponents[main_var] == exp)
        .map(|t| *t.coefficient)
        .unwrap_or_else(|| g.field.zero())
}

fn solve_vandermonde<E: Exponent>(
    a: &MultivariatePolynomial<FiniteField, E>,
    main_var: usize,
    shape: &[(MultivariatePolynomial<FiniteField, E>, E)],
    row_sample_values: Vec<Vec<Element>>,
    samples: Vec<Vec<Element>>,
) -> MultivariatePolynomial<FiniteField, E> {
    let field = &a.field;
    let mut gp = a.zero();

    // solve the transposed Vandermonde system
    for (((c, ex), sample), rhs) in shape.iter().zip(&row_sample_values).zip(&samples) {
        if c.nterms() == 1 {
            let coeff = field.div(&rhs[0], &sample[0]);
            let mut ee: SmallVec<[E; INLINED_EXPONENTS]> = c.exponents(0).into();
            ee[main_var] = *ex;
            gp.append_monomial(coeff, &ee);
            continue;
        }

        // construct the master polynomial (1-s1)*(1-s2)*... efficiently
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

            // sample master/(1-s_i) by using the factorized form
            for (j, l) in sample.iter().enumerate() {
                if j != i {
                    field.mul_assign(&mut norm, &field.sub(s, l))
                }
            }

            // divide out 1-s_i
            let mut coeff = field.zero();
            let mut last_q = field.zero();
            for (m, rhs) in master.iter().skip(1).zip(rhs).rev() {
                last_q = field.add(m, &field.mul(s, &last_q));
                field.add_assign(&mut coeff, &field.mul(&last_q, rhs));
            }
            coeff = field.div(&coeff, &norm);

            // the Vandermonde rows start at s_i instead of 1
            coeff = field.div(&coeff, s);

            let mut ee: SmallVec<[E; INLINED_EXPONENTS]> = c.exponents(i).into();
            ee[main_var] = *ex;

            gp.append_monomial(coeff, &ee);
        }
    }

    gp
}

/// Evaluate every coefficient of the shape at `r` and check that the
/// evaluated monomials of each coefficient are distinct.
fn shape_sample_values<E: Exponent>(
    shape: &[(MultivariatePolynomial<FiniteField, E>, E)],
    r: &[(usize, Element)],
    cache: &mut [Vec<Element>],
) -> Option<Vec<Vec<Element>>> {
    let mut row_sample_values = Vec::with_capacity(shape.len());
    for (c, _) in shape {
        let row = evaluate_exponents(c, r, cache);

        let mut seen: HashSet<Element> = HashSet::default();
        if !row.iter().all(|x| seen.insert(*x)) {
            return None;
        }

        row_sample_values.push(row);
    }
    Some(row_sample_values)
}

#[allow(clippy::too_many_arguments)]
#[instrument(level = "trace", skip_all)]
fn construct_new_image_single_scale<E: Exponent>(
    a: &MultivariatePolynomial<FiniteField, E>,
    b: &MultivariatePolynomial<FiniteField, E>,
    a_ldegree: E,
    b_ldegree: E,
    bounds: &mut [E],
    single_scale: usize,
    vars: &[usize],
    main_var: usize,
    shape: &[(MultivariatePolynomial<FiniteField, E>, E)],
) -> Result<MultivariatePolynomial<FiniteField, E>, ImageError> {
    let field = &a.field;

    if vars.is_empty() {
        // return gcd divided by the single scale factor
        let g = MultivariatePolynomial::univariate_gcd(a, b);

        if g.ldegree(main_var) < bounds[main_var] {
            // original image and form and degree bounds are unlucky
            trace!("unlucky degree bound {} vs {}", g.ldegree(main_var), bounds[main_var]);
            bounds[main_var] = g.ldegree(main_var);
            return Err(ImageError::BadOriginalImage);
        }

        if g.ldegree(main_var) > bounds[main_var] {
            return Err(ImageError::BadCurrentImage);
        }

        if !terms_in_shape(&g, main_var, shape) {
            return Err(ImageError::BadOriginalImage);
        }

        let (_, d) = &shape[single_scale];
        let Some(c) = g
            .into_iter()
            .find(|t| t.exponents[main_var] == *d)
            .map(|t| *t.coefficient)
        else {
            // the scaling term is missing, so the assumed form is wrong
            return Err(ImageError::BadOriginalImage);
        };

        let scale_factor = field.neg(&field.inv(&c));
        return Ok(g.mul_coeff(scale_factor));
    }

    let mut rng = thread_rng();
    let mut failure_count = 0;
    let mut cache = pow_cache(a, b);
    let samples_needed = shape.iter().map(|(c, _)| c.nterms()).max().unwrap_or(0);

    let mut attempts = 0;
    // find a set of sample points that yield unique coefficients for every coefficient of a term in the shape
    let (row_sample_values, samples) = 'find_root_sample: loop {
        attempts += 1;
        if attempts > MAX_SAMPLE_ATTEMPTS {
            return Err(ImageError::BadCurrentImage);
        }

        clear_cache(&mut cache);

        let r_orig: SmallVec<[_; INLINED_EXPONENTS]> = vars
            .iter()
            .map(|i| (*i, sample_point(field, &mut rng)))
            .collect();

        let Some(row_sample_values) = shape_sample_values(shape, &r_orig, &mut cache) else {
            trace!("duplicate element: restarting");
            continue;
        };

        let mut samples = vec![Vec::with_capacity(samples_needed); shape.len()];
        let mut r = r_orig.clone();

        let a_eval = evaluate_exponents(a, &r_orig, &mut cache);
        let b_eval = evaluate_exponents(b, &r_orig, &mut cache);

        let mut a_current = a_eval.clone();
        let mut b_current = b_eval.clone();

        let mut a_poly = a.zero_with_capacity(a.degree(main_var).to_u32() as usize + 1);
        let mut b_poly = b.zero_with_capacity(b.degree(main_var).to_u32() as usize + 1);

        for sample_index in 0..samples_needed {
            // sample at r^i
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

            // now construct the univariate polynomials from the current evaluated monomials
            evaluate_using_exponents(a, &a_current, main_var, &mut a_poly);
            evaluate_using_exponents(b, &b_current, main_var, &mut b_poly);

            if a_poly.ldegree(main_var) != a_ldegree || b_poly.ldegree(main_var) != b_ldegree {
                continue 'find_root_sample;
            }

            let g = MultivariatePolynomial::univariate_gcd(&a_poly, &b_poly);

            if g.ldegree(main_var) < bounds[main_var] {
                // original image and form and degree bounds are unlucky
                trace!("unlucky degree bound {} vs {}", g.ldegree(main_var), bounds[main_var]);
                bounds[main_var] = g.ldegree(main_var);
                return Err(ImageError::BadOriginalImage);
            }

            if g.ldegree(main_var) > bounds[main_var] {
                failure_count += 1;
                if failure_count > 2 {
                    // p is likely unlucky
                    return Err(ImageError::BadCurrentImage);
                }
                continue 'find_root_sample;
            }

            // construct the scaling coefficient
            let (c, d) = &shape[single_scale];
            let mut coeff = field.one();
            for (n, v) in r.iter() {
                field.mul_assign(&mut coeff, &field.pow(v, c.exponents(0)[*n].to_u32() as u64));
            }

            let Some(lc) = g
                .into_iter()
                .find(|t| t.exponents[main_var] == *d)
                .map(|t| *t.coefficient)
            else {
                // the scaling term is missing, so the assumed form is wrong
                return Err(ImageError::BadOriginalImage);
            };
            let scale_factor = field.div(&coeff, &lc);

            if !terms_in_shape(&g, main_var, shape) {
                return Err(ImageError::BadOriginalImage);
            }

            // construct the right-hand side
            for (i, (rhs, (shape_part, exp))) in samples.iter_mut().zip(shape).enumerate() {
                // we may not need all terms
                if rhs.len() == shape_part.nterms() {
                    continue;
                }

                let gc = coefficient_of(&g, i, main_var, *exp);
                rhs.push(field.neg(&field.mul(&gc, &scale_factor)));
            }
        }

        break (row_sample_values, samples);
    };

    Ok(solve_vandermonde(
        a,
        main_var,
        shape,
        row_sample_values,
        samples,
    ))
}

/// Construct an image in the case where no monomial in the main variable is a single term.
/// Using Javadi's method to solve the normalization problem, we first determine the coefficients of a single monomial using
/// Gaussian elimination. Then, we are back in the single term case and we use a Vandermonde
/// matrix to solve for every coefficient.
#[allow(clippy::too_many_arguments)]
#[instrument(level = "trace", skip_all)]
fn construct_new_image_multiple_scales<E: Exponent>(
    a: &MultivariatePolynomial<FiniteField, E>,
    b: &MultivariatePolynomial<FiniteField, E>,
    a_ldegree: E,
    b_ldegree: E,
    bounds: &mut [E],
    vars: &[usize],
    main_var: usize,
    shape: &[(MultivariatePolynomial<FiniteField, E>, E)],
) -> Result<MultivariatePolynomial<FiniteField, E>, ImageError> {
    if shape.len() < 2 {
        return Err(ImageError::BadOriginalImage);
    }

    let field = &a.field;
    let mut rng = thread_rng();
    let mut failure_count = 0;
    let mut cache = pow_cache(a, b);

    // sort the shape based on the number of terms in the coefficient
    let mut shape_map: Vec<_> = (0..shape.len()).collect();
    shape_map.sort_unstable_by_key(|i| shape[*i].0.nterms());

    let mut scaling_var_relations: Vec<Vec<Element>> = vec![];

    let max_terms = shape[shape_map[shape.len() - 1]].0.nterms();
    let max_samples_needed = 2 * max_terms - 1;

    let mut attempts = 0;
    // find a set of sample points that yield unique coefficients for every coefficient of a term in the shape
    let (row_sample_values, samples) = 'find_root_sample: loop {
        attempts += 1;
        if attempts > MAX_SAMPLE_ATTEMPTS {
            return Err(ImageError::BadCurrentImage);
        }

        clear_cache(&mut cache);

        let r_orig: SmallVec<[_; INLINED_EXPONENTS]> = vars
            .iter()
            .map(|i| (*i, sample_point(field, &mut rng)))
            .collect();

        let Some(row_sample_values) = shape_sample_values(shape, &r_orig, &mut cache) else {
            trace!("duplicate element: restarting");
            continue;
        };

        let mut samples = vec![Vec::with_capacity(max_samples_needed); shape.len()];
        let mut r = r_orig.clone();

        let a_eval = evaluate_exponents(a, &r_orig, &mut cache);
        let b_eval = evaluate_exponents(b, &r_orig, &mut cache);

        let mut a_current = a_eval.clone();
        let mut b_current = b_eval.clone();

        let mut a_poly = a.zero_with_capacity(a.degree(main_var).to_u32() as usize + 1);
        let mut b_poly = b.zero_with_capacity(b.degree(main_var).to_u32() as usize + 1);

        let mut second_index = 1;
        let mut solved_coeff: Option<SmallVec<[Element; 25]>> = None;
        for sample_index in 0..max_samples_needed {
            if solved_coeff.is_some() && sample_index >= max_terms {
                // we have enough samples
                break;
            }

            // sample at r^i
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

            // now construct the univariate polynomials from the current evaluated monomials
            evaluate_using_exponents(a, &a_current, main_var, &mut a_poly);
            evaluate_using_exponents(b, &b_current, main_var, &mut b_poly);

            if a_poly.ldegree(main_var) != a_ldegree || b_poly.ldegree(main_var) != b_ldegree {
                continue 'find_root_sample;
            }

            let g = MultivariatePolynomial::univariate_gcd(&a_poly, &b_poly);

            if g.ldegree(main_var) < bounds[main_var] {
                // original image and form and degree bounds are unlucky
                trace!("unlucky degree bound {} vs {}", g.ldegree(main_var), bounds[main_var]);
                bounds[main_var] = g.ldegree(main_var);
                return Err(ImageError::BadOriginalImage);
            }

            if g.ldegree(main_var) > bounds[main_var] {
                failure_count += 1;
                if failure_count > 2 {
                    // p is likely unlucky
                    return Err(ImageError::BadCurrentImage);
                }
                continue 'find_root_sample;
            }

            if !terms_in_shape(&g, main_var, shape) {
                return Err(ImageError::BadOriginalImage);
            }

            // set the coefficient of the scaling term in the gcd to 1
            let (_, d) = &shape[shape_map[0]];
            let Some(lc) = g
                .into_iter()
                .find(|t| t.exponents[main_var] == *d)
                .map(|t| *t.coefficient)
            else {
                trace!("bad sample point: scaling term missing");
                continue 'find_root_sample;
            };
            let g = g.mul_coeff(field.inv(&lc));

            // construct the right-hand side
            for (i, (rhs, (shape_part, exp))) in samples.iter_mut().zip(shape).enumerate() {
                // we may not need all terms
                if solved_coeff.is_some() && rhs.len() == shape_part.nterms() {
                    continue;
                }

                rhs.push(coefficient_of(&g, i, main_var, *exp));
            }

            // see if we have collected enough samples to solve for the scaling factor
            while solved_coeff.is_none() {
                let vars_scale = shape[shape_map[0]].0.nterms() - 1;
                let vars_second = shape[shape_map[second_index]].0.nterms();
                let samples_needed = vars_scale + vars_second;
                let rows = samples_needed + scaling_var_relations.len();

                if sample_index + 1 < samples_needed {
                    break; // obtain more samples
                }

                let mut gfm = SmallVec::with_capacity(rows * samples_needed);
                let mut new_rhs = SmallVec::with_capacity(rows);

                let row_eval_sec = &row_sample_values[shape_map[second_index]];
                let row_eval_first = &row_sample_values[shape_map[0]];
                for si in 0..samples_needed {
                    let rhs_sec = &samples[shape_map[second_index]][si];
                    let e = si as u64 + 1;

                    // assume first constant is 1, which will form the rhs of our equation
                    new_rhs.push(field.mul(rhs_sec, &field.pow(&row_eval_first[0], e)));

                    for aa in row_eval_sec {
                        gfm.push(field.pow(aa, e));
                    }

                    // place the scaling term variables at the end
                    for aa in &row_eval_first[1..] {
                        gfm.push(field.neg(&field.mul(rhs_sec, &field.pow(aa, e))));
                    }
                }

                // add extra relations between the scaling term variables coming from previous tries
                // that yielded underdetermined systems
                for extra_relations in &scaling_var_relations {
                    for _ in 0..vars_second {
                        gfm.push(field.zero());
                    }

                    gfm.extend_from_slice(&extra_relations[..vars_scale]);
                    new_rhs.push(extra_relations[vars_scale]);
                }

                let m = Matrix::from_rows(rows as u32, samples_needed as u32, gfm, field.clone());
                let rhs = Matrix::from_rows(rows as u32, 1, new_rhs, field.clone());

                match m.solve(&rhs) {
                    Ok(r) => {
                        let mut r = r.data;
                        r.drain(0..vars_second);
                        solved_coeff = Some(r);
                    }
                    Err(LinearSolverError::Underdetermined {
                        row_reduced_matrix, ..
                    }) => {
                        let Some(mat) = row_reduced_matrix else {
                            return Err(ImageError::BadCurrentImage);
                        };

                        // extract relations between the variables in the scaling term from the row reduced augmented matrix
                        for x in mat.row_iter() {
                            if x[..vars_second].iter().all(FiniteField::is_zero)
                                && x.iter().any(|y| !FiniteField::is_zero(y))
                            {
                                scaling_var_relations.push(x[vars_second..].to_vec());
                            }
                        }

                        second_index += 1;
                        if second_index == shape.len() {
                            trace!("could not solve for the scaling coefficients");
                            return Err(ImageError::BadCurrentImage);
                        }
                    }
                    Err(LinearSolverError::Inconsistent) => {
                        return Err(ImageError::BadOriginalImage);
                    }
                }
            }
        }

        let Some(r) = solved_coeff else {
            return Err(ImageError::BadCurrentImage);
        };

        // evaluate the scaling term for every sample
        let row_eval_first = &row_sample_values[shape_map[0]];
        let mut lcoeff_cache = Vec::with_capacity(max_terms);
        for sample_index in 0..max_terms {
            let e = sample_index as u64 + 1;
            let mut scaling_factor = field.pow(&row_eval_first[0], e); // coeff eval is 1
            for (exp_eval, coeff_eval) in row_eval_first[1..].iter().zip(&r) {
                field.add_assign(
                    &mut scaling_factor,
                    &field.mul(coeff_eval, &field.pow(exp_eval, e)),
                );
            }
            lcoeff_cache.push(scaling_factor);
        }

        for ((c, _), rhs) in shape.iter().zip(&mut samples) {
            rhs.truncate(c.nterms()); // drop unneeded samples
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
        row_sample_values,
        samples,
    ))
}

/// Sample a point where `gamma` does not vanish that is not in `used`.
fn sample_nonzero<E: Exponent>(
    gamma: &MultivariatePolynomial<FiniteField, E>,
    var: usize,
    used: &[Element],
    rng: &mut impl RngCore,
) -> Option<Element> {
    for _ in 0..MAX_SAMPLE_ATTEMPTS {
        let v = sample_point(&gamma.field, rng);
        if !used.contains(&v) && !gamma.replace(var, &v).is_zero() {
            return Some(v);
        }
    }
    None
}

impl<E: Exponent> MultivariatePolynomial<FiniteField, E> {
    /// Compute the univariate GCD using Euclid's algorithm. The polynomials may only
    /// depend on a single variable. The result is monic.
    fn univariate_gcd(a: &Self, b: &Self) -> Self {
        if a.is_zero() {
            return b.clone().make_monic();
        }
        if b.is_zero() {
            return a.clone().make_monic();
        }

        let Some(var) =
            (0..a.nvars()).find(|v| a.degree(*v) > E::zero() || b.degree(*v) > E::zero())
        else {
            return a.one();
        };

        let g = a.to_univariate(var).gcd(&b.to_univariate(var));
        a.from_univariate(&g, var)
    }

    /// Make the leading coefficient one.
    pub fn make_monic(self) -> Self {
        if self.is_zero() || self.field.is_one(&self.lcoeff()) {
            return self;
        }

        let inv = self.field.inv(&self.lcoeff());
        self.mul_coeff(inv)
    }

    /// Get the content of a multivariate polynomial viewed as a
    /// multivariate polynomial in all variables except `x`.
    fn multivariate_content(&self, x: usize) -> Self {
        self.to_multivariate_polynomial_list(&[x])
            .into_values()
            .fold(self.zero(), |g, c| Self::univariate_gcd(&g, &c))
    }

    /// Compute the gcd of the contents of `a` and `b` as polynomials in
    /// all variables except `x`.
    fn multivariate_content_gcd(a: &Self, b: &Self, x: usize) -> Self {
        a.to_multivariate_polynomial_list(&[x])
            .into_values()
            .chain(b.to_multivariate_polynomial_list(&[x]).into_values())
            .fold(a.zero(), |g, c| Self::univariate_gcd(&g, &c))
    }

    /// Find the upper bound of a variable `var` in the gcd.
    /// This is done by computing the univariate gcd by
    /// substituting all variables except `var`. This
    /// upper bound could be too tight due to an unfortunate
    /// sample point, but this is rare.
    fn get_gcd_var_bound(ap: &Self, bp: &Self, vars: &[usize], var: usize) -> Option<E> {
        let mut rng = thread_rng();
        let mut cache = pow_cache(ap, bp);

        for _ in 0..MAX_SAMPLE_ATTEMPTS {
            clear_cache(&mut cache);

            let r: Vec<_> = vars
                .iter()
                .map(|i| (*i, sample_point(&ap.field, &mut rng)))
                .collect();

            let a1 = ap.replace_all_except(var, &r, &mut cache);
            let b1 = bp.replace_all_except(var, &r, &mut cache);

            if a1.ldegree(var) == ap.degree(var) && b1.ldegree(var) == bp.degree(var) {
                return Some(Self::univariate_gcd(&a1, &b1).ldegree(var));
            }

            trace!("degree error during sampling: trying again");
        }

        None
    }

    /// Compute the gcd shape of two polynomials in a finite field by filling in random
    /// numbers.
    #[instrument(level = "trace", skip_all)]
    fn gcd_shape_modular(
        a: &Self,
        b: &Self,
        vars: &[usize],         // variables
        bounds: &mut [E],       // degree bounds
        tight_bounds: &mut [E], // tighter degree bounds
    ) -> Option<Self> {
        let lastvar = *vars.last()?;

        // if we are in the univariate case, return the univariate gcd
        if vars.len() == 1 {
            let gg = Self::univariate_gcd(a, b);
            if gg.degree(vars[0]) > bounds[vars[0]] {
                return None;
            }
            bounds[vars[0]] = gg.degree(vars[0]); // update degree bound
            return Some(gg);
        }

        // the gcd of the content in the last variable should be 1
        let c = Self::multivariate_content_gcd(a, b, lastvar);
        if !c.is_one() {
            trace!("content in the last variable is not 1");
            return None;
        }

        let gamma = Self::univariate_gcd(
            &a.lcoeff_last_varorder(vars),
            &b.lcoeff_last_varorder(vars),
        );

        let field = &a.field;
        let mut rng = thread_rng();
        let mut failure_count = 0;

        'newfirstnum: loop {
            // if we had two failures, it may be that the tight degree bound
            // was too tight due to an unfortunate prime/evaluation, so we relax it
            if failure_count == 2 {
                trace!(
                    "changing tight bound for x{} from {} to {}",
                    lastvar,
                    tight_bounds[lastvar],
                    bounds[lastvar]
                );
                tight_bounds[lastvar] = bounds[lastvar];
            }
            if failure_count == MAX_IMAGE_FAILURES {
                return None;
            }
            failure_count += 1;

            let v = sample_nonzero(&gamma, lastvar, &[], &mut rng)?;
            let av = a.replace(lastvar, &v);
            let bv = b.replace(lastvar, &v);

            // dense reconstruction
            let mut gv = if vars.len() > 2 {
                Self::gcd_shape_modular(&av, &bv, &vars[..vars.len() - 1], bounds, tight_bounds)?
            } else {
                let gg = Self::univariate_gcd(&av, &bv);
                if gg.degree(vars[0]) > bounds[vars[0]] {
                    return None;
                }
                bounds[vars[0]] = gg.degree(vars[0]); // update degree bound
                gg
            };

            // construct a new assumed form
            let gfu = gv.to_univariate_polynomial_list(vars[0]);

            // find a coefficient of x1 in gg that is a monomial (single scaling)
            let single_scale = gfu.iter().rposition(|(c, _)| c.nterms() == 1);

            let lc = gv.lcoeff_varorder(vars);
            if FiniteField::is_zero(&lc) {
                continue 'newfirstnum;
            }

            let mut gseq = vec![gv
                .clone()
                .mul_coeff(field.div(&gamma.replace(lastvar, &v).lcoeff(), &lc))];
            let mut vseq = vec![v];

            let samples_needed =
                tight_bounds[lastvar].to_u32() as usize + gamma.ldegree(lastvar).to_u32() as usize + 1;

            // sparse reconstruction
            let mut image_failures = 0;
            while gseq.len() < samples_needed {
                let v = sample_nonzero(&gamma, lastvar, &vseq, &mut rng)?;

                let av = a.replace(lastvar, &v);
                let bv = b.replace(lastvar, &v);

                let rec = if let Some(single_scale) = single_scale {
                    construct_new_image_single_scale(
                        &av,
                        &bv,
                        av.degree(vars[0]),
                        bv.degree(vars[0]),
                        bounds,
                        single_scale,
                        &vars[1..vars.len() - 1],
                        vars[0],
                        &gfu,
                    )
                } else {
                    construct_new_image_multiple_scales(
                        &av,
                        &bv,
                        // the degree in av may be lower than that of a,
                        // in which case sampling with a.degree would never terminate
                        av.degree(vars[0]),
                        bv.degree(vars[0]),
                        bounds,
                        &vars[1..vars.len() - 1],
                        vars[0],
                        &gfu,
                    )
                };

                match rec {
                    Ok(r) if !r.is_zero() => {
                        gv = r;
                    }
                    Ok(_) | Err(ImageError::BadCurrentImage) => {
                        image_failures += 1;
                        if image_failures > MAX_IMAGE_FAILURES {
                            continue 'newfirstnum;
                        }
                        continue;
                    }
                    Err(ImageError::BadOriginalImage) => {
                        trace!("bad original image");
                        continue 'newfirstnum;
                    }
                }

                let lc = gv.lcoeff_varorder(vars);
                gseq.push(
                    gv.clone()
                        .mul_coeff(field.div(&gamma.replace(lastvar, &v).lcoeff(), &lc)),
                );
                vseq.push(v);
            }

            // use interpolation to construct x_n dependence
            let mut gc = newton_interpolation(&vseq, &gseq, lastvar);
            if gc.is_zero() {
                continue 'newfirstnum;
            }

            // remove content in x_n (wrt all other variables)
            let cont = gc.multivariate_content(lastvar);
            if !cont.is_one() {
                match gc.divides(&cont) {
                    Some(q) => gc = q,
                    None => continue 'newfirstnum,
                }
            }

            // do a probabilistic division test
            let mut test = None;
            for _ in 0..MAX_SAMPLE_ATTEMPTS {
                let mut cache = pow_cache(a, b);

                let r: Vec<_> = vars
                    .iter()
                    .skip(1)
                    .map(|i| (*i, sample_point(field, &mut rng)))
                    .collect();

                let g1 = gc.replace_all_except(vars[0], &r, &mut cache);

                if !g1.is_zero() && g1.ldegree(vars[0]) == gc.degree(vars[0]) {
                    let a1 = a.replace_all_except(vars[0], &r, &mut cache);
                    let b1 = b.replace_all_except(vars[0], &r, &mut cache);
                    test = Some((g1, a1, b1));
                    break;
                }
            }

            let Some((g1, a1, b1)) = test else {
                continue 'newfirstnum;
            };

            if g1.is_one() || (a1.divides(&g1).is_some() && b1.divides(&g1).is_some()) {
                return Some(gc);
            }

            // if the gcd is bad, we had a bad number
            trace!("division test failed: gcd may be bad or probabilistic division test is unlucky");
        }
    }
}

/// Select the next prime that does not divide `gamma`.
fn next_image_field(
    primes: &mut std::slice::Iter<u32>,
    gamma: &Integer,
) -> Result<(FiniteField, Element), GCDError> {
    for p in primes.by_ref() {
        let field = FiniteField::new(*p);
        let gammap = field.element_from_integer(gamma);
        if !FiniteField::is_zero(&gammap) {
            return Ok((field, gammap));
        }
    }

    Err(GCDError::OutOfPrimes)
}

impl<E: Exponent> MultivariatePolynomial<IntegerRing, E> {
    /// Compute the greatest common divisor of two polynomials. The result
    /// has a positive leading coefficient and `gcd(0, 0) = 0`.
    ///
    /// The gcd fails when a variable that occurs in both polynomials has a degree
    /// above [MAX_GCD_DEGREE], or when the modular algorithm runs out of primes.
    #[instrument(level = "trace", skip_all)]
    pub fn gcd(&self, b: &Self) -> Result<Self, GCDError> {
        debug_assert_eq!(self.nvars(), b.nvars());

        if let Some(g) = Self::simple_gcd(self, b) {
            return Ok(g.normalize());
        }

        // factor out the shared monomial
        let min_a = self.min_exponents();
        let min_b = b.min_exponents();
        let shared: Vec<E> = min_a.iter().zip(&min_b).map(|(x, y)| *x.min(y)).collect();

        let mut a = Cow::Owned(self.clone().div_exp(&min_a));
        let mut b = Cow::Owned(b.clone().div_exp(&min_b));

        let finish = |g: Self, content: &Self| {
            let g = if content.is_one() { g } else { &g * content };
            g.normalize().mul_exp(&shared)
        };

        if let Some(g) = Self::simple_gcd(&a, &b) {
            return Ok(finish(g, &a.one()));
        }

        let max_degree = (0..a.nvars())
            .filter(|v| a.degree(*v) > E::zero() && b.degree(*v) > E::zero())
            .map(|v| a.degree(v).max(b.degree(v)).to_u32())
            .max()
            .unwrap_or(0);
        if max_degree > MAX_GCD_DEGREE {
            return Err(GCDError::DegreeTooLarge {
                degree: max_degree,
                limit: MAX_GCD_DEGREE,
            });
        }

        if a.heuristic_gcd_is_viable(&b) {
            match a.heuristic_gcd(&b) {
                Ok((g, _, _)) => return Ok(finish(g, &a.one())),
                Err(e) => trace!("heuristic gcd failed: {:?}", e),
            }
        }

        // store which variables appear in which expression
        let mut scratch: SmallVec<[u8; INLINED_EXPONENTS]> = smallvec![0; a.nvars()];
        for (p, inc) in [(&a, 1), (&b, 2)] {
            for e in p.exponents_iter() {
                for (s, ee) in scratch.iter_mut().zip(e) {
                    if !ee.is_zero() {
                        *s |= inc;
                    }
                }
            }
        }

        // compute the gcd efficiently if some variables do not occur in both
        // polynomials
        if scratch.iter().any(|x| *x == 1 || *x == 2) {
            let inca: SmallVec<[_; INLINED_EXPONENTS]> = scratch
                .iter()
                .enumerate()
                .filter_map(|(i, v)| if *v == 1 || *v == 3 { Some(i) } else { None })
                .collect();

            let incb: SmallVec<[_; INLINED_EXPONENTS]> = scratch
                .iter()
                .enumerate()
                .filter_map(|(i, v)| if *v == 2 || *v == 3 { Some(i) } else { None })
                .collect();

            // extract the variables of b in the coefficient of a and vice versa
            let a1 = a.to_multivariate_polynomial_list(&incb);
            let b1 = b.to_multivariate_polynomial_list(&inca);

            let f = a1.into_values().chain(b1.into_values()).collect();
            return Ok(finish(Self::gcd_multiple(f)?, &a.one()));
        }

        // try if b divides a or vice versa, doing a heuristical length check first
        if a.nterms() >= b.nterms() && a.divides(&b).is_some() {
            return Ok(finish(b.into_owned(), &a.one()));
        }
        if a.nterms() <= b.nterms() && b.divides(&a).is_some() {
            return Ok(finish(a.into_owned(), &b.one()));
        }

        // check if the polynomial is linear in a variable and compute the gcd using the univariate content
        for (p1, p2) in [(&a, &b), (&b, &a)] {
            if let Some(var) = (0..p1.nvars()).find(|v| p1.degree(*v) == E::one()) {
                let mut cont = p1.univariate_content(var)?;

                let p1_prim = &**p1 / &cont;

                if !cont.is_one() {
                    let cont_p2 = p2.univariate_content(var)?;
                    cont = cont.gcd(&cont_p2)?;
                }

                return if p2.divides(&p1_prim).is_some() {
                    Ok(finish(p1_prim, &cont))
                } else {
                    Ok(finish(cont, &p1.one()))
                };
            }
        }

        let mut vars: SmallVec<[_; INLINED_EXPONENTS]> = scratch
            .iter()
            .enumerate()
            .filter_map(|(i, v)| if *v == 3 { Some(i) } else { None })
            .collect();

        // determine safe bounds for variables in the gcd
        let mut bounds: SmallVec<[_; INLINED_EXPONENTS]> = (0..a.nvars())
            .map(|i| a.degree(i).min(b.degree(i)))
            .collect();

        // find better upper bounds for all variables
        // these bounds could actually be wrong due to an unfortunate prime or sampling points
        let mut tight_bounds = Self::get_gcd_var_bounds(&a, &b, &vars, &bounds);

        // Determine a good variable ordering based on the estimated degree (decreasing) in the gcd.
        // If it is different from the input, make a copy and rearrange so that the
        // polynomials do not have to be sorted after filling in variables.
        vars.sort_by(|&i, &j| tight_bounds[j].cmp(&tight_bounds[i]));

        // strip the gcd of the univariate contents wrt the new first variable
        let content = if vars.len() > 1 {
            let content = a.univariate_content_gcd(&b, vars[0])?;
            trace!("gcd of the content: {}", content);

            if !content.is_one() {
                a = Cow::Owned(&*a / &content);
                b = Cow::Owned(&*b / &content);
            }

            content
        } else {
            // get the integer content for univariate polynomials
            let uca = a.content();
            let ucb = b.content();
            let content = a.constant(uca.gcd(&ucb));

            if !uca.is_one() {
                a = Cow::Owned(a.into_owned().div_coeff(&uca));
            }
            if !ucb.is_one() {
                b = Cow::Owned(b.into_owned().div_coeff(&ucb));
            }

            content
        };

        let rearrange = vars.len() > 1 && vars.windows(2).any(|s| s[0] > s[1]);
        if rearrange {
            trace!("rearranging variables with map {:?}", vars);
            a = Cow::Owned(a.rearrange(&vars, false));
            b = Cow::Owned(b.rearrange(&vars, false));

            let mut newbounds: SmallVec<[_; INLINED_EXPONENTS]> =
                smallvec![E::zero(); bounds.len()];
            let mut newtight_bounds: SmallVec<[_; INLINED_EXPONENTS]> =
                smallvec![E::zero(); bounds.len()];
            for (x, v) in vars.iter().enumerate() {
                newbounds[x] = bounds[*v];
                newtight_bounds[x] = tight_bounds[*v];
            }
            bounds = newbounds;
            tight_bounds = newtight_bounds;
        }

        let zippel_vars: SmallVec<[usize; INLINED_EXPONENTS]> = if rearrange {
            (0..vars.len()).collect()
        } else {
            vars.clone()
        };

        let mut g = Self::gcd_zippel(&a, &b, &zippel_vars, &mut bounds, &mut tight_bounds)?;

        if rearrange {
            g = g.rearrange(&vars, true);
        }

        Ok(finish(g, &content))
    }

    /// Compute the gcd for simple cases.
    fn simple_gcd(a: &Self, b: &Self) -> Option<Self> {
        if a == b {
            return Some(a.clone());
        }

        if a.is_zero() {
            return Some(b.clone());
        }
        if b.is_zero() {
            return Some(a.clone());
        }

        if a.is_one() {
            return Some(a.clone());
        }
        if b.is_one() {
            return Some(b.clone());
        }

        if a.is_constant() || b.is_constant() {
            return Some(a.constant(a.content().gcd(&b.content())));
        }

        None
    }

    /// Make the leading coefficient positive.
    pub fn normalize(self) -> Self {
        if self.lcoeff().is_negative() {
            -self
        } else {
            self
        }
    }

    /// Estimate if the heuristic gcd will produce evaluation points that are too large.
    fn heuristic_gcd_is_viable(&self, b: &Self) -> bool {
        let max_dense_size = |p: &Self| {
            let mut contains: SmallVec<[bool; INLINED_EXPONENTS]> = smallvec![false; p.nvars()];
            let mut max_deg = 0usize;
            for e in p.exponents_iter() {
                let mut deg = 1usize;
                for (var, x) in e.iter().enumerate() {
                    let v = x.to_u32() as usize;
                    if v > 0 {
                        contains[var] = true;
                        deg = deg.saturating_mul(v + 1);
                    }
                }
                max_deg = max_deg.max(deg);
            }
            (max_deg, contains)
        };

        let (max_deg_a, contains_a) = max_dense_size(self);
        let (max_deg_b, contains_b) = max_dense_size(b);

        let num_shared_vars = contains_a
            .iter()
            .zip(&contains_b)
            .filter(|(a, b)| **a && **b)
            .count();

        max_deg_a < 20 || max_deg_b < 20 || num_shared_vars < 3 && max_deg_a.min(max_deg_b) < 150
    }

    /// Perform a heuristic GCD algorithm, that evaluates a shared variable
    /// at a large integer and reconstructs the gcd from the xi-adic expansion of
    /// the gcd of the images. Returns the gcd and the two cofactors.
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
                // create xi-adic representation using the symmetric modulus
                let mut g_i = gamma.zero_with_capacity(gamma.nterms());
                for m in &gamma {
                    let c = m.coefficient.symmetric_mod(xi);
                    if !c.is_zero() {
                        g_i.append_monomial_back(c, m.exponents);
                    }
                }

                // multiply with var^i
                let mut g_i_2 = g_i.clone();
                for x in g_i_2.exponents_iter_mut() {
                    x[var] = E::from_u32(i);
                }

                g = &g + &g_i_2;

                gamma = (&gamma - &g_i).div_coeff(xi);
                i += 1;
            }
            g
        }

        if self.is_zero() || b.is_zero() {
            return Err(HeuristicGCDError::BadReconstruction);
        }

        // do integer GCD
        let content_gcd = self.content().gcd(&b.content());

        let mut a = Cow::Borrowed(self);
        let mut b = Cow::Borrowed(b);

        if !content_gcd.is_one() {
            a = Cow::Owned(a.into_owned().div_coeff(&content_gcd));
            b = Cow::Owned(b.into_owned().div_coeff(&content_gcd));
        }

        let Some(var) =
            (0..a.nvars()).find(|x| a.degree(*x) > E::zero() && b.degree(*x) > E::zero())
        else {
            return Ok((a.constant(content_gcd), a.into_owned(), b.into_owned()));
        };

        let max_a = a.coefficients.iter().map(|c| c.abs()).max().unwrap_or_else(Integer::zero);
        let max_b = b.coefficients.iter().map(|c| c.abs()).max().unwrap_or_else(Integer::zero);

        let mut xi = &(&max_a.min(max_b) * &Integer::new(2)) + &Integer::new(29);
        let max_deg = Integer::from(a.degree(var).max(b.degree(var)).to_u32());

        for retry in 0..6 {
            trace!("round {}, xi={}", retry, xi);
            if (&xi * &max_deg).bits() > MAX_EVALUATION_BITS {
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
                    xi = next_evaluation_point(&xi);
                    continue;
                }
            };

            let g = interpolate(gamma, var, &xi);
            if !g.is_zero() {
                let g_cont = g.content();
                let gc = g.div_coeff(&g_cont);

                if let Some(q) = a.divides(&gc) {
                    if let Some(q1) = b.divides(&gc) {
                        return Ok((gc.mul_coeff(content_gcd), q, q1));
                    }
                }
            }

            if !co_fac_p.is_zero() {
                let a_co_fac = interpolate(co_fac_p, var, &xi);

                if !a_co_fac.is_zero() {
                    if let Some(q) = a.divides(&a_co_fac) {
                        if let Some(q1) = b.divides(&q) {
                            return Ok((q.mul_coeff(content_gcd), a_co_fac, q1));
                        }
                    }
                }
            }

            if !co_fac_q.is_zero() {
                let b_co_fac = interpolate(co_fac_q, var, &xi);

                if !b_co_fac.is_zero() {
                    if let Some(q) = b.divides(&b_co_fac) {
                        if let Some(q1) = a.divides(&q) {
                            return Ok((q.mul_coeff(content_gcd), q1, b_co_fac));
                        }
                    }
                }
            }

            xi = next_evaluation_point(&xi);
        }

        Err(HeuristicGCDError::BadReconstruction)
    }

    /// Get the content of a multivariate polynomial viewed as a
    /// univariate polynomial in `x`.
    pub fn univariate_content(&self, x: usize) -> Result<Self, GCDError> {
        if self.is_zero() {
            return Ok(self.clone());
        }

        let f = self
            .to_univariate_polynomial_list(x)
            .into_iter()
            .map(|(c, _)| c)
            .collect();
        Self::gcd_multiple(f)
    }

    /// Compute the gcd of the univariate content in `x`.
    pub fn univariate_content_gcd(&self, b: &Self, x: usize) -> Result<Self, GCDError> {
        if self.is_zero() && b.is_zero() {
            return Ok(self.clone());
        }

        let f = self
            .to_univariate_polynomial_list(x)
            .into_iter()
            .chain(b.to_univariate_polynomial_list(x))
            .map(|(c, _)| c)
            .collect();
        Self::gcd_multiple(f)
    }

    /// Apply a gcd repeatedly to a list of polynomials.
    fn repeated_gcd(mut f: Vec<Self>) -> Result<Self, GCDError> {
        f.sort_unstable_by_key(|p| p.nterms());

        let Some(mut gcd) = f.pop() else {
            return Err(GCDError::EmptyList);
        };

        for p in f {
            if gcd.is_one() {
                break;
            }

            gcd = gcd.gcd(&p)?;
        }
        Ok(gcd.normalize())
    }

    /// Compute the gcd of multiple polynomials efficiently.
    /// `gcd(f0,f1,f2,...)=gcd(f0,f1+k2*f(2)+k3*f(3))`
    /// with high likelihood.
    pub fn gcd_multiple(mut f: Vec<Self>) -> Result<Self, GCDError> {
        let mut prime_index = 1; // skip prime 2
        let mut loop_counter = 0;
        loop {
            match f.len() {
                0 => return Err(GCDError::EmptyList),
                1 => return Ok(f.swap_remove(0).normalize()),
                2 => return f[0].gcd(&f[1]),
                _ => {}
            }

            // check if any entry is a number, as the gcd is then the gcd of the contents
            if let Some(n) = f.iter().find(|x| x.is_constant()) {
                let mut gcd = n.content();
                for x in &f {
                    if gcd.is_one() {
                        break;
                    }

                    gcd = gcd.gcd(&x.content());
                }
                return Ok(n.constant(gcd));
            }

            // take the smallest element
            let index_smallest = f
                .iter()
                .enumerate()
                .min_by_key(|(_, v)| v.nterms())
                .map_or(0, |(i, _)| i);

            let a = f.swap_remove(index_smallest);

            // prevent sampling f[i] and f[i+prime_len] with the same
            // prefactor every iteration
            let num_primes = if f.len() % SMALL_PRIMES.len() == 0 {
                SMALL_PRIMES.len() - 1
            } else {
                SMALL_PRIMES.len()
            };

            // add all other polynomials
            let mut b = a.zero();
            for p in &f {
                let k = Integer::new(SMALL_PRIMES[prime_index % num_primes]);
                prime_index += 1;
                b = &b + &p.clone().mul_coeff(k);
            }

            let mut gcd = a.gcd(&b)?;

            if gcd.is_one() {
                return Ok(gcd);
            }

            // remove the content from the gcd before the division test as the odds
            // of an unlucky content are high
            let content = gcd.content();
            gcd = gcd.div_coeff(&content);
            let mut content_gcd = content;

            let old_length = f.len();

            f.retain(|x| {
                if x.divides(&gcd).is_some() {
                    content_gcd = content_gcd.gcd(&x.content());
                    false
                } else {
                    true
                }
            });

            gcd = gcd.mul_coeff(content_gcd);

            if f.is_empty() {
                return Ok(gcd);
            }

            trace!("gcd of multiple polynomials not found in one try");

            f.push(gcd);

            if f.len() == old_length + 1 && loop_counter > 5 {
                return Self::repeated_gcd(f);
            }

            loop_counter += 1;
        }
    }

    fn to_finite_field(&self, field: &FiniteField) -> MultivariatePolynomial<FiniteField, E> {
        self.map_coeff(|c| field.element_from_integer(c), field.clone())
    }

    /// Find tight upper bounds for the degree of every variable in `vars` in the gcd,
    /// using a modular image. The loose bounds are kept for unlucky primes.
    fn get_gcd_var_bounds(
        a: &Self,
        b: &Self,
        vars: &[usize],
        loose_bounds: &[E],
    ) -> SmallVec<[E; INLINED_EXPONENTS]> {
        let mut tight_bounds: SmallVec<[_; INLINED_EXPONENTS]> = loose_bounds.into();
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
                    let vvars: SmallVec<[usize; INLINED_EXPONENTS]> =
                        vars.iter().filter(|i| *i != var).cloned().collect();
                    if let Some(d) =
                        MultivariatePolynomial::get_gcd_var_bound(&ap, &bp, &vvars, *var)
                    {
                        tight_bounds[*var] = d;
                    }
                }
                break;
            }

            trace!("variable bounds failed due to unlucky prime");
        }
        tight_bounds
    }

    /// Compute the gcd of two multivariate polynomials using Zippel's algorithm.
    /// The first variable of `vars` must be the most significant variable in `a` and `b`.
    #[instrument(level = "trace", skip_all)]
    fn gcd_zippel(
        a: &Self,
        b: &Self,
        vars: &[usize],
        bounds: &mut [E],
        tight_bounds: &mut [E],
    ) -> Result<Self, GCDError> {
        // compute scaling factor in Z
        let gamma = a.lcoeff_varorder(vars).gcd(&b.lcoeff_varorder(vars));

        let prime_list = LARGE_U32_PRIMES;
        let mut primes = prime_list.iter();

        'newfirstprime: loop {
            let (field, gammap) = next_image_field(&mut primes, &gamma)?;

            let ap = a.to_finite_field(&field);
            let bp = b.to_finite_field(&field);

            // calculate modular gcd image
            let Some(gp) =
                MultivariatePolynomial::gcd_shape_modular(&ap, &bp, vars, bounds, tight_bounds)
            else {
                trace!("modular gcd failed: getting new prime");
                continue 'newfirstprime;
            };

            bounds[vars[0]] = gp.degree(vars[0]);

            // construct a new assumed form
            // we have to find the proper normalization
            let gfu = gp.to_univariate_polynomial_list(vars[0]);

            // find a coefficient of x1 in gf that is a monomial (single scaling)
            let single_scale = gfu.iter().rposition(|(c, _)| c.nterms() == 1);

            let gpc = gp.lcoeff_varorder(vars);
            if FiniteField::is_zero(&gpc) {
                continue 'newfirstprime;
            }
            let lcoeff_factor = field.div(&gammap, &gpc);

            // construct the gcd suggestion in Z
            let mut gm = gp.map_coeff(
                |x| field.to_integer(&field.mul(x, &lcoeff_factor)),
                IntegerRing::new(),
            );
            let mut m = Integer::from(field.get_prime());

            let mut old_gm = a.zero();

            // add new primes until we can reconstruct the full gcd
            'newprime: loop {
                if gm == old_gm {
                    // divide by integer content
                    let gc = gm.map_coeff(|c| c.clone(), IntegerRing::new()).make_primitive();

                    trace!("final suggested gcd: {}", gc);
                    if gc.is_one() || (a.divides(&gc).is_some() && b.divides(&gc).is_some()) {
                        return Ok(gc);
                    }

                    // if it does not divide, we need more primes
                    trace!("does not divide: more primes needed");
                }

                old_gm = gm.clone();

                let (field, gammap) = next_image_field(&mut primes, &gamma)?;

                let ap = a.to_finite_field(&field);
                let bp = b.to_finite_field(&field);

                // for the univariate case, we don't need to construct an image
                let gp = if vars.len() == 1 {
                    let gp = MultivariatePolynomial::univariate_gcd(&ap, &bp);
                    if gp.degree(vars[0]) < bounds[vars[0]] {
                        // original image and variable bound unlucky: restart
                        continue 'newfirstprime;
                    }

                    if gp.degree(vars[0]) > bounds[vars[0]] {
                        // prime is probably unlucky
                        continue 'newprime;
                    }

                    if !terms_in_shape(&gp, vars[0], &gfu) {
                        continue 'newfirstprime;
                    }

                    gp
                } else {
                    let rec = if let Some(single_scale) = single_scale {
                        construct_new_image_single_scale(
                            &ap,
                            &bp,
                            ap.degree(vars[0]),
                            bp.degree(vars[0]),
                            bounds,
                            single_scale,
                            &vars[1..],
                            vars[0],
                            &gfu,
                        )
                    } else {
                        construct_new_image_multiple_scales(
                            &ap,
                            &bp,
                            ap.degree(vars[0]),
                            bp.degree(vars[0]),
                            bounds,
                            &vars[1..],
                            vars[0],
                            &gfu,
                        )
                    };

                    match rec {
                        Ok(r) => r,
                        Err(ImageError::BadOriginalImage) => continue 'newfirstprime,
                        Err(ImageError::BadCurrentImage) => continue 'newprime,
                    }
                };

                // scale the new image
                let gpc = gp.lcoeff_varorder(vars);
                if FiniteField::is_zero(&gpc) {
                    continue 'newprime;
                }
                let gp = gp.mul_coeff(field.div(&gammap, &gpc));

                // use the Chinese remainder theorem to merge coefficients and map back to Z
                // terms can be missing in gp, but not in gm
                let mut gpi = 0;
                for t in 0..gm.nterms() {
                    let gpc = if gpi < gp.nterms() && gm.exponents(t) == gp.exponents(gpi) {
                        gpi += 1;
                        gp.coefficients[gpi - 1]
                    } else {
                        field.zero()
                    };

                    gm.coefficients[t] =
                        Integer::chinese_remainder(&gm.coefficients[t], &gpc, &m, &field);
                }

                if gpi < gp.nterms() {
                    trace!("image has terms outside of the assumed form");
                    continue 'newfirstprime;
                }

                m = &m * &Integer::from(field.get_prime());
            }
        }
    }
}

fn next_evaluation_point(xi: &Integer) -> Integer {
    IntegerRing::new()
        .quot_rem(&(xi * &Integer::new(73794)), &Integer::new(27011))
        .0
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::domains::finite_field::FiniteField;
    use crate::domains::integer::{Integer, IntegerRing};
    use crate::domains::Ring;
    use crate::poly::polynomial::MultivariatePolynomial;

    use super::{GCDError, MAX_GCD_DEGREE};

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

    #[test]
    fn difference_of_squares() {
        let a = poly(&[(1, [2, 0]), (-1, [0, 2])]);
        let x_minus_y = poly(&[(1, [1, 0]), (-1, [0, 1])]);
        let x_plus_y = poly(&[(1, [1, 0]), (1, [0, 1])]);
        assert_eq!(a.gcd(&x_minus_y).unwrap(), x_minus_y);
        assert_eq!(a.gcd(&x_plus_y).unwrap(), x_plus_y);
    }

    #[test]
    fn shared_monomial_and_content() {
        let a = poly(&[(6, [2, 1])]);
        let b = poly(&[(4, [1, 2]), (2, [1, 0])]);
        assert_eq!(a.gcd(&b).unwrap(), poly(&[(2, [1, 0])]));
    }

    #[test]
    fn constants_and_zero() {
        let zero = poly(&[]);
        let three = poly(&[(-3, [0, 0])]);
        assert_eq!(zero.gcd(&zero).unwrap(), zero);
        assert_eq!(zero.gcd(&three).unwrap(), poly(&[(3, [0, 0])]));
        assert_eq!(
            three.gcd(&poly(&[(6, [1, 0]), (9, [0, 0])])).unwrap(),
            poly(&[(3, [0, 0])])
        );
    }

    #[test]
    fn coprime() {
        let a = poly(&[(1, [2, 0]), (1, [0, 0])]);
        let b = poly(&[(1, [1, 0]), (-1, [0, 1])]);
        assert!(a.gcd(&b).unwrap().is_one());
    }

    #[test]
    fn positive_leading_coefficient() {
        // -(x + 1)(y - 2) and (x + 1)(x + y)
        let x1 = poly(&[(1, [1, 0]), (1, [0, 0])]);
        let a = -(&x1 * &poly(&[(1, [0, 1]), (-2, [0, 0])]));
        let b = &x1 * &poly(&[(1, [1, 0]), (1, [0, 1])]);
        assert_eq!(a.gcd(&b).unwrap(), x1);
    }

    #[test]
    fn heuristic_cofactors() {
        let g = poly(&[(3, [1, 1]), (1, [0, 0])]);
        let a = &g * &poly(&[(1, [2, 0]), (-5, [0, 1])]);
        let b = &g * &poly(&[(2, [1, 0]), (7, [0, 0])]);
        let (gg, ca, cb) = a.heuristic_gcd(&b).unwrap();
        assert_eq!(gg.clone().normalize(), g);
        assert_eq!(&gg * &ca, a);
        assert_eq!(&gg * &cb, b);
    }

    #[test]
    fn variable_in_one_operand() {
        // (x + 1)(y^2 + 3) and (x + 1)(x - 4)
        let x1 = poly(&[(1, [1, 0]), (1, [0, 0])]);
        let a = &x1 * &poly(&[(1, [0, 2]), (3, [0, 0])]);
        let b = &x1 * &poly(&[(1, [1, 0]), (-4, [0, 0])]);
        assert_eq!(a.gcd(&b).unwrap(), x1);
    }

    #[test]
    fn gcd_multiple() {
        let x1 = poly(&[(1, [1, 0]), (1, [0, 0])]);
        let f = vec![
            &x1 * &poly(&[(2, [0, 1]), (1, [0, 0])]),
            &x1 * &poly(&[(1, [1, 0]), (-3, [0, 0])]),
            &x1 * &poly(&[(1, [2, 1]), (5, [0, 0])]),
            &x1 * &poly(&[(7, [0, 0])]),
        ];
        assert_eq!(MultivariatePolynomial::gcd_multiple(f).unwrap(), x1);
        assert_eq!(
            MultivariatePolynomial::<IntegerRing, u32>::gcd_multiple(vec![]),
            Err(GCDError::EmptyList)
        );
    }

    fn zippel_factors() -> [MultivariatePolynomial<IntegerRing, u32>; 3] {
        // g = 3x^2y + 2yz^2 - 5xz + 7
        let g = poly3(&[(3, [2, 1, 0]), (2, [0, 1, 2]), (-5, [1, 0, 1]), (7, [0, 0, 0])]);
        // p = x^3 + 2y^2z - 4z + 1
        let p = poly3(&[(1, [3, 0, 0]), (2, [0, 2, 1]), (-4, [0, 0, 1]), (1, [0, 0, 0])]);
        // q = 2x^2z - y^3 + 3xy + 6
        let q = poly3(&[(2, [2, 0, 1]), (-1, [0, 3, 0]), (3, [1, 1, 0]), (6, [0, 0, 0])]);
        [g, p, q]
    }

    #[test]
    fn multivariate_zippel() {
        let [g, p, q] = zippel_factors();
        let a = &g * &p;
        let b = &g * &q;

        // the heuristic is skipped for these operands
        assert!(!a.heuristic_gcd_is_viable(&b));
        assert_eq!(a.gcd(&b).unwrap(), g);

        // the modular algorithm directly, with loose degree bounds
        let mut bounds: Vec<u32> = (0..3).map(|v| a.degree(v).min(b.degree(v))).collect();
        let mut tight_bounds = bounds.clone();
        let r = MultivariatePolynomial::gcd_zippel(&a, &b, &[0, 1, 2], &mut bounds, &mut tight_bounds)
            .unwrap();
        assert_eq!(r.normalize(), g);
    }

    #[test]
    fn multivariate_content_and_coprime() {
        let [g, p, q] = zippel_factors();

        let a = (&g * &p).mul_coeff(Integer::new(6));
        let b = (&g * &q).mul_coeff(Integer::new(-4));
        assert_eq!(a.gcd(&b).unwrap(), g.clone().mul_coeff(Integer::new(2)));

        assert!((&p * &q).gcd(&(&g * &g)).unwrap().is_one());
    }

    #[test]
    fn univariate_zippel() {
        // (x + 1)(x^2 + 3) and (x + 1)(x - 5)
        let x1 = poly(&[(1, [1, 0]), (1, [0, 0])]);
        let a = &x1 * &poly(&[(1, [2, 0]), (3, [0, 0])]);
        let b = &x1 * &poly(&[(1, [1, 0]), (-5, [0, 0])]);

        let mut bounds = vec![1, 0];
        let mut tight_bounds = bounds.clone();
        let r = MultivariatePolynomial::gcd_zippel(&a, &b, &[0], &mut bounds, &mut tight_bounds)
            .unwrap();
        assert_eq!(r, x1);
    }

    #[test]
    fn modular_univariate_gcd() {
        let field = FiniteField::new(17);
        let a = poly(&[(1, [2, 0]), (-1, [0, 0])]).to_finite_field(&field);
        let b = poly(&[(3, [1, 0]), (3, [0, 0])]).to_finite_field(&field);
        let g = MultivariatePolynomial::univariate_gcd(&a, &b);
        assert_eq!(g.nterms(), 2);
        assert!(field.is_one(&g.lcoeff()));
        assert_eq!(field.from_element(&g.coefficients[0]), 1);
    }

    #[test]
    fn degree_limit() {
        let big = MAX_GCD_DEGREE + 1;
        let a = poly(&[(1, [big, 0]), (1, [0, 0])]);
        let b = poly(&[(1, [big, 0]), (-1, [0, 0])]);
        assert_eq!(
            a.gcd(&b),
            Err(GCDError::DegreeTooLarge {
                degree: big,
                limit: MAX_GCD_DEGREE
            })
        );

        let a = poly(&[(1, [u32::MAX, 0]), (1, [0, 0])]);
        let b = poly(&[(1, [u32::MAX, 0]), (-1, [0, 0])]);
        assert!(matches!(a.gcd(&b), Err(GCDError::DegreeTooLarge { .. })));

        // a large degree in a single operand is no problem
        let a = poly(&[(1, [u32::MAX, 1]), (1, [0, 1])]);
        let b = poly(&[(1, [0, 1]), (1, [0, 0])]);
        assert!(a.gcd(&b).unwrap().is_one());
    }
}
