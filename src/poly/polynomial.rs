use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::fmt::Display;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::Arc;

use ahash::HashMap;
use smallvec::{smallvec, SmallVec};

use crate::domains::{EuclideanDomain, Ring};
use crate::printer::PolynomialPrinter;

use super::univariate::UnivariatePolynomial;
use super::{Exponent, Variable, INLINED_EXPONENTS};

/// Multivariate polynomial with a sparse degree and variable dense representation.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MultivariatePolynomial<F: Ring, E: Exponent = u16> {
    // Data format: the i-th monomial is stored as coefficients[i] and
    // exponents[i * nvars .. (i + 1) * nvars]. Terms are always expanded and sorted
    // in ascending lexicographic order of the exponents, so that the leading term is last.
    pub coefficients: Vec<F::Element>,
    pub exponents: Vec<E>,
    pub field: F,
    pub variables: Arc<Vec<Variable>>,
}

impl<F: Ring, E: Exponent> MultivariatePolynomial<F, E> {
    /// Constructs a zero polynomial. Instead of using this constructor,
    /// prefer to create new polynomials from existing ones, so that the
    /// variable map and field are inherited.
    #[inline]
    pub fn new(field: &F, cap: Option<usize>, variables: Arc<Vec<Variable>>) -> Self {
        Self {
            coefficients: Vec::with_capacity(cap.unwrap_or(0)),
            exponents: Vec::with_capacity(cap.unwrap_or(0) * variables.len()),
            field: field.clone(),
            variables,
        }
    }

    /// Constructs a zero polynomial, inheriting the field and variable map from `self`.
    #[inline]
    pub fn zero(&self) -> Self {
        Self {
            coefficients: vec![],
            exponents: vec![],
            field: self.field.clone(),
            variables: self.variables.clone(),
        }
    }

    /// Constructs a zero polynomial with the given capacity,
    /// inheriting the field and variable map from `self`.
    #[inline]
    pub fn zero_with_capacity(&self, cap: usize) -> Self {
        Self {
            coefficients: Vec::with_capacity(cap),
            exponents: Vec::with_capacity(cap * self.nvars()),
            field: self.field.clone(),
            variables: self.variables.clone(),
        }
    }

    /// Constructs a constant polynomial,
    /// inheriting the field and variable map from `self`.
    #[inline]
    pub fn constant(&self, coeff: F::Element) -> Self {
        if F::is_zero(&coeff) {
            return self.zero();
        }

        Self {
            coefficients: vec![coeff],
            exponents: vec![E::zero(); self.nvars()],
            field: self.field.clone(),
            variables: self.variables.clone(),
        }
    }

    /// Constructs a polynomial that is one, inheriting the field and variable map from `self`.
    #[inline]
    pub fn one(&self) -> Self {
        self.constant(self.field.one())
    }

    /// Constructs a polynomial with a single term.
    #[inline]
    pub fn monomial(&self, coeff: F::Element, exponents: Vec<E>) -> Self {
        debug_assert!(self.nvars() == exponents.len());

        if F::is_zero(&coeff) {
            return self.zero();
        }

        Self {
            coefficients: vec![coeff],
            exponents,
            field: self.field.clone(),
            variables: self.variables.clone(),
        }
    }

    /// Constructs the polynomial consisting of the variable with index `var`.
    pub fn variable(&self, var: usize) -> Self {
        let mut e = vec![E::zero(); self.nvars()];
        e[var] = E::one();
        self.monomial(self.field.one(), e)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.nterms() == 0
    }

    #[inline]
    pub fn is_one(&self) -> bool {
        self.nterms() == 1
            && self.field.is_one(&self.coefficients[0])
            && self.exponents.iter().all(|x| x.is_zero())
    }

    /// Returns the number of terms in the polynomial.
    #[inline]
    pub fn nterms(&self) -> usize {
        self.coefficients.len()
    }

    /// Returns the number of variables in the polynomial.
    #[inline]
    pub fn nvars(&self) -> usize {
        self.variables.len()
    }

    /// Returns true if the polynomial is constant.
    #[inline]
    pub fn is_constant(&self) -> bool {
        match self.nterms() {
            0 => true,
            1 => self.exponents.iter().all(|e| e.is_zero()),
            _ => false,
        }
    }

    /// Get the constant term of the polynomial.
    #[inline]
    pub fn get_constant(&self) -> F::Element {
        if self.is_zero() || !self.exponents(0).iter().all(|e| e.is_zero()) {
            return self.field.zero();
        }

        self.coefficients[0].clone()
    }

    /// Returns the slice for the exponents of the specified monomial.
    #[inline]
    pub fn exponents(&self, index: usize) -> &[E] {
        &self.exponents[index * self.nvars()..(index + 1) * self.nvars()]
    }

    #[inline]
    pub fn last_exponents(&self) -> &[E] {
        &self.exponents[(self.nterms() - 1) * self.nvars()..self.nterms() * self.nvars()]
    }

    /// Returns an iterator over the exponents of every monomial.
    #[inline]
    pub fn exponents_iter(&self) -> std::slice::Chunks<E> {
        self.exponents.chunks(self.nvars().max(1))
    }

    /// Returns an iterator over the mutable exponents of every monomial.
    #[inline]
    pub fn exponents_iter_mut(&mut self) -> std::slice::ChunksMut<E> {
        let nvars = self.nvars().max(1);
        self.exponents.chunks_mut(nvars)
    }

    /// Get a copy of the variable list.
    pub fn get_vars(&self) -> Arc<Vec<Variable>> {
        self.variables.clone()
    }

    /// Get a reference to the variables list.
    pub fn get_vars_ref(&self) -> &[Variable] {
        self.variables.as_ref()
    }

    /// Check if the polynomial is sorted and has only non-zero coefficients
    pub fn check_consistency(&self) {
        assert_eq!(self.exponents.len(), self.nterms() * self.nvars());

        for c in &self.coefficients {
            if F::is_zero(c) {
                panic!("Inconsistent polynomial (0 coefficient): {:?}", self);
            }
        }

        for t in 1..self.nterms() {
            match self.exponents(t).cmp(self.exponents(t - 1)) {
                Ordering::Equal => panic!("Inconsistent polynomial (equal monomials): {:?}", self),
                Ordering::Less => panic!(
                    "Inconsistent polynomial (wrong monomial ordering): {:?}",
                    self
                ),
                Ordering::Greater => {}
            }
        }
    }

    /// Append a monomial to the back. The exponents must be larger than
    /// or equal to the last exponents. It merges with the last monomial if the
    /// exponents are equal.
    #[inline]
    pub fn append_monomial_back(&mut self, coefficient: F::Element, exponents: &[E]) {
        if F::is_zero(&coefficient) {
            return;
        }

        let nterms = self.nterms();
        if nterms > 0 && exponents == self.last_exponents() {
            self.field
                .add_assign(&mut self.coefficients[nterms - 1], &coefficient);

            if F::is_zero(&self.coefficients[nterms - 1]) {
                self.coefficients.pop();
                self.exponents.truncate((nterms - 1) * self.nvars());
            }
        } else {
            self.coefficients.push(coefficient);
            self.exponents.extend_from_slice(exponents);
        }
    }

    /// Appends a monomial to the polynomial, keeping the terms sorted.
    pub fn append_monomial(&mut self, coefficient: F::Element, exponents: &[E]) {
        if F::is_zero(&coefficient) {
            return;
        }
        if self.nvars() != exponents.len() {
            panic!(
                "nvars mismatched: got {}, expected {}",
                exponents.len(),
                self.nvars()
            );
        }

        // should we append to the back?
        if self.nterms() == 0 || self.last_exponents() < exponents {
            self.coefficients.push(coefficient);
            self.exponents.extend_from_slice(exponents);
            return;
        }

        // binary search for the insertion point
        let mut l = 0;
        let mut r = self.nterms();
        while l < r {
            let m = (l + r) / 2;
            match exponents.cmp(self.exponents(m)) {
                Ordering::Equal => {
                    self.field
                        .add_assign(&mut self.coefficients[m], &coefficient);
                    if F::is_zero(&self.coefficients[m]) {
                        // the coefficient cancelled, so remove the monomial
                        self.coefficients.remove(m);
                        let i = m * self.nvars();
                        self.exponents.drain(i..i + self.nvars());
                    }
                    return;
                }
                Ordering::Greater => l = m + 1,
                Ordering::Less => r = m,
            }
        }

        self.coefficients.insert(l, coefficient);
        let i = l * self.nvars();
        self.exponents.splice(i..i, exponents.iter().cloned());
    }

    /// Remove the leading monomial.
    fn pop_last(&mut self) {
        if self.coefficients.pop().is_some() {
            let n = self.exponents.len() - self.nvars();
            self.exponents.truncate(n);
        }
    }

    /// Take the derivative of the polynomial w.r.t the variable `var`.
    pub fn derivative(&self, var: usize) -> Self {
        debug_assert!(var < self.nvars());

        let mut res = self.zero_with_capacity(self.nterms());

        let mut exp = vec![E::zero(); self.nvars()];
        for x in self {
            if x.exponents[var] > E::zero() {
                exp.copy_from_slice(x.exponents);
                let pow = exp[var].to_u32() as u64;
                exp[var] = exp[var] - E::one();
                res.append_monomial(self.field.mul(x.coefficient, &self.field.nth(pow)), &exp);
            }
        }

        res
    }

    /// Multiply every coefficient with `other`.
    pub fn mul_coeff(mut self, other: F::Element) -> Self {
        for c in &mut self.coefficients {
            self.field.mul_assign(c, &other);
        }

        for i in (0..self.nterms()).rev() {
            if F::is_zero(&self.coefficients[i]) {
                self.coefficients.remove(i);
                self.exponents
                    .drain(i * self.nvars()..(i + 1) * self.nvars());
            }
        }

        self
    }

    /// Map a coefficient using the function `f`.
    pub fn map_coeff<U: Ring, T: Fn(&F::Element) -> U::Element>(
        &self,
        f: T,
        field: U,
    ) -> MultivariatePolynomial<U, E> {
        let mut coefficients = Vec::with_capacity(self.coefficients.len());
        let mut exponents = Vec::with_capacity(self.exponents.len());

        for m in self {
            let nc = f(m.coefficient);
            if !U::is_zero(&nc) {
                coefficients.push(nc);
                exponents.extend_from_slice(m.exponents);
            }
        }

        MultivariatePolynomial {
            coefficients,
            exponents,
            field,
            variables: self.variables.clone(),
        }
    }

    /// Add `exponents` to every exponent. Panics when an exponent overflows.
    pub fn mul_exp(mut self, exponents: &[E]) -> Self {
        debug_assert_eq!(self.nvars(), exponents.len());

        if self.nvars() == 0 {
            return self;
        }

        for e in self.exponents_iter_mut() {
            for (e1, e2) in e.iter_mut().zip(exponents) {
                *e1 = e1.checked_add(e2).expect("overflow in adding exponents");
            }
        }

        self
    }

    /// Subtract `exponents` from every exponent. The caller must make sure
    /// that every monomial is divisible by `exponents`.
    pub fn div_exp(mut self, exponents: &[E]) -> Self {
        if self.nvars() == 0 {
            return self;
        }

        for e in self.exponents_iter_mut() {
            for (e1, e2) in e.iter_mut().zip(exponents) {
                debug_assert!(*e1 >= *e2);
                *e1 = *e1 - *e2;
            }
        }

        self
    }

    #[inline]
    fn mul_monomial(self, coefficient: &F::Element, exponents: &[E]) -> Self {
        self.mul_coeff(coefficient.clone()).mul_exp(exponents)
    }

    /// Get the degree of the variable `x`.
    /// This operation is O(n).
    pub fn degree(&self, x: usize) -> E {
        self.exponents
            .iter()
            .skip(x)
            .step_by(self.nvars().max(1))
            .max()
            .cloned()
            .unwrap_or(E::zero())
    }

    /// Get the highest total degree of any monomial.
    pub fn total_degree(&self) -> u32 {
        self.exponents_iter()
            .map(|e| e.iter().fold(0u32, |acc, x| acc.saturating_add(x.to_u32())))
            .max()
            .unwrap_or(0)
    }

    /// Get the smallest exponent of every variable over all monomials.
    pub fn min_exponents(&self) -> Vec<E> {
        let mut min = self
            .exponents_iter()
            .next()
            .map(|e| e.to_vec())
            .unwrap_or_else(|| vec![E::zero(); self.nvars()]);

        for e in self.exponents_iter().skip(1) {
            for (m, x) in min.iter_mut().zip(e) {
                if *x < *m {
                    *m = *x;
                }
            }
        }

        min
    }

    /// Get the leading coefficient.
    pub fn lcoeff(&self) -> F::Element {
        match self.coefficients.last() {
            Some(c) => c.clone(),
            None => self.field.zero(),
        }
    }

    /// Get the leading coefficient of a multivariate polynomial viewed as a
    /// univariate polynomial in `x`.
    pub fn univariate_lcoeff(&self, x: usize) -> Self {
        let d = self.degree(x);

        if d == E::zero() {
            return self.clone();
        }

        let mut lcoeff = self.zero();
        let mut e = vec![E::zero(); self.nvars()];
        for t in self {
            if t.exponents[x] == d {
                e.copy_from_slice(t.exponents);
                e[x] = E::zero();
                lcoeff.append_monomial(t.coefficient.clone(), &e);
            }
        }

        lcoeff
    }

    /// Get the degree of the variable `v` in the leading monomial.
    pub fn ldegree(&self, v: usize) -> E {
        if self.is_zero() {
            return E::zero();
        }
        self.last_exponents()[v]
    }

    /// Get the leading coefficient under a given variable ordering.
    /// This operation is O(n) if the variables are out of order.
    pub fn lcoeff_varorder(&self, vars: &[usize]) -> F::Element {
        if vars.windows(2).all(|s| s[0] < s[1]) {
            return self.lcoeff();
        }

        let mut highest = vec![E::zero(); self.nvars()];
        let mut highestc = self.field.zero();

        'nextmon: for m in self {
            let mut more = false;
            for &v in vars {
                if more {
                    highest[v] = m.exponents[v];
                } else {
                    match m.exponents[v].cmp(&highest[v]) {
                        Ordering::Less => continue 'nextmon,
                        Ordering::Greater => {
                            highest[v] = m.exponents[v];
                            more = true;
                        }
                        Ordering::Equal => {}
                    }
                }
            }
            highestc = m.coefficient.clone();
        }

        highestc
    }

    /// Get the leading coefficient viewed as a polynomial in all variables of `vars`
    /// except the last one, using the order of `vars`. The result only depends on
    /// the last variable of `vars`.
    pub fn lcoeff_last_varorder(&self, vars: &[usize]) -> Self {
        let Some((lastvar, vars)) = vars.split_last() else {
            return self.clone();
        };

        let mut highest = vec![E::zero(); self.nvars()];
        let mut indices = Vec::with_capacity(10);

        'nextmon: for (i, m) in self.into_iter().enumerate() {
            let mut more = false;
            for &v in vars {
                if more {
                    highest[v] = m.exponents[v];
                } else {
                    match m.exponents[v].cmp(&highest[v]) {
                        Ordering::Less => continue 'nextmon,
                        Ordering::Greater => {
                            highest[v] = m.exponents[v];
                            indices.clear();
                            more = true;
                        }
                        Ordering::Equal => {}
                    }
                }
            }
            indices.push(i);
        }

        let mut res = self.zero();
        let mut e = vec![E::zero(); self.nvars()];
        for i in indices {
            e[*lastvar] = self.exponents(i)[*lastvar];
            res.append_monomial(self.coefficients[i].clone(), &e);
        }
        res
    }

    /// Change the order of the variables in the polynomial, using `order`.
    /// Variables that are not in `order` must not occur in the polynomial.
    /// The map can also be reversed, by setting `inverse` to `true`.
    pub fn rearrange(&self, order: &[usize], inverse: bool) -> Self {
        let nvars = self.nvars();
        let mut new_exp = vec![E::zero(); self.nterms() * nvars];
        for (e, er) in new_exp.chunks_mut(nvars.max(1)).zip(self.exponents_iter()) {
            for (x, o) in order.iter().enumerate() {
                if inverse {
                    e[*o] = er[x];
                } else {
                    e[x] = er[*o];
                }
            }
        }

        let mut indices: Vec<usize> = (0..self.nterms()).collect();
        indices.sort_unstable_by_key(|&i| &new_exp[i * nvars..(i + 1) * nvars]);

        let mut vm = self.variables.as_ref().clone();
        for (x, o) in order.iter().enumerate() {
            if inverse {
                vm[*o] = self.variables[x].clone();
            } else {
                vm[x] = self.variables[*o].clone();
            }
        }

        let mut res = MultivariatePolynomial::new(&self.field, Some(self.nterms()), Arc::new(vm));
        for i in indices {
            res.append_monomial_back(
                self.coefficients[i].clone(),
                &new_exp[i * nvars..(i + 1) * nvars],
            );
        }
        res
    }

    /// Replace all variables except `v` in the polynomial by elements from
    /// the ring. Powers of the substituted values are stored in `cache`,
    /// where a zero entry means that the power has not been computed yet.
    pub fn replace_all_except(
        &self,
        v: usize,
        r: &[(usize, F::Element)],
        cache: &mut [Vec<F::Element>],
    ) -> Self {
        let mut tm: HashMap<E, F::Element> = HashMap::default();

        for t in self {
            let mut c = t.coefficient.clone();
            for (n, vv) in r {
                let p = t.exponents[*n].to_u32() as usize;
                if p > 0 {
                    if p < cache[*n].len() {
                        if F::is_zero(&cache[*n][p]) {
                            cache[*n][p] = self.field.pow(vv, p as u64);
                        }

                        self.field.mul_assign(&mut c, &cache[*n][p]);
                    } else {
                        self.field.mul_assign(&mut c, &self.field.pow(vv, p as u64));
                    }
                }
            }

            match tm.entry(t.exponents[v]) {
                Entry::Occupied(mut o) => self.field.add_assign(o.get_mut(), &c),
                Entry::Vacant(e) => {
                    e.insert(c);
                }
            }
        }

        let mut res = self.zero();
        let mut e = vec![E::zero(); self.nvars()];
        for (k, c) in tm {
            e[v] = k;
            res.append_monomial(c, &e);
        }

        res
    }

    /// Replace a variable `n` in the polynomial by an element from
    /// the ring `v`.
    pub fn replace(&self, n: usize, v: &F::Element) -> Self {
        let mut res = self.zero_with_capacity(self.nterms());
        let mut e: SmallVec<[E; INLINED_EXPONENTS]> = smallvec![E::zero(); self.nvars()];

        for t in self {
            if t.exponents[n] == E::zero() {
                res.append_monomial(t.coefficient.clone(), t.exponents);
                continue;
            }

            let c = self.field.mul(
                t.coefficient,
                &self.field.pow(v, t.exponents[n].to_u32() as u64),
            );

            e.copy_from_slice(t.exponents);
            e[n] = E::zero();
            res.append_monomial(c, &e);
        }

        res
    }

    /// Compute `self^pow`.
    pub fn pow(&self, mut pow: usize) -> Self {
        if pow == 0 {
            return self.one();
        }

        if self.is_constant() {
            return self.constant(self.field.pow(&self.lcoeff(), pow as u64));
        }

        let mut x = self.clone();
        let mut y = self.one();
        while pow != 1 {
            if pow % 2 == 1 {
                y = &y * &x;
                pow -= 1;
            }

            x = &x * &x;
            pow /= 2;
        }

        &x * &y
    }

    /// Create a univariate polynomial coefficient list out of a multivariate polynomial.
    /// The output is sorted in the degree and only contains the degrees that occur.
    pub fn to_univariate_polynomial_list(&self, x: usize) -> Vec<(Self, E)> {
        if self.coefficients.is_empty() {
            return vec![];
        }

        // a stable sort keeps the terms of every degree in ascending order
        let mut indices: Vec<usize> = (0..self.nterms()).collect();
        indices.sort_by_key(|i| self.exponents(*i)[x]);

        let mut result: Vec<(Self, E)> = vec![];
        let mut e: SmallVec<[E; INLINED_EXPONENTS]> = smallvec![E::zero(); self.nvars()];
        for i in indices {
            let d = self.exponents(i)[x];
            e.copy_from_slice(self.exponents(i));
            e[x] = E::zero();

            match result.last_mut() {
                Some((a, dd)) if *dd == d => a.append_monomial_back(self.coefficients[i].clone(), &e),
                _ => {
                    let mut a = self.zero();
                    a.append_monomial_back(self.coefficients[i].clone(), &e);
                    result.push((a, d));
                }
            }
        }

        result
    }

    /// Split the polynomial as a polynomial in all variables except `xs`. The
    /// coefficients only contain the variables in `xs`.
    pub fn to_multivariate_polynomial_list(
        &self,
        xs: &[usize],
    ) -> HashMap<SmallVec<[E; INLINED_EXPONENTS]>, Self> {
        let mut tm: HashMap<SmallVec<[E; INLINED_EXPONENTS]>, Self> = HashMap::default();
        let mut e_not_in_xs: SmallVec<[E; INLINED_EXPONENTS]> = smallvec![E::zero(); self.nvars()];
        let mut e_in_xs: SmallVec<[E; INLINED_EXPONENTS]> = smallvec![E::zero(); self.nvars()];
        for t in self {
            e_not_in_xs.copy_from_slice(t.exponents);
            for e in e_in_xs.iter_mut() {
                *e = E::zero();
            }

            for x in xs {
                e_in_xs[*x] = e_not_in_xs[*x];
                e_not_in_xs[*x] = E::zero();
            }

            match tm.entry(e_not_in_xs.clone()) {
                Entry::Occupied(mut o) => o
                    .get_mut()
                    .append_monomial_back(t.coefficient.clone(), &e_in_xs),
                Entry::Vacant(v) => {
                    v.insert(self.monomial(t.coefficient.clone(), e_in_xs.to_vec()));
                }
            }
        }

        tm
    }

    /// Convert a polynomial that only depends on `var` to a dense univariate polynomial.
    pub fn to_univariate(&self, var: usize) -> UnivariatePolynomial<F> {
        let mut coefficients = vec![self.field.zero(); self.degree(var).to_u32() as usize + 1];
        for t in self {
            debug_assert!(t
                .exponents
                .iter()
                .enumerate()
                .all(|(i, e)| i == var || e.is_zero()));
            coefficients[t.exponents[var].to_u32() as usize] = t.coefficient.clone();
        }

        UnivariatePolynomial::from_coefficients(&self.field, coefficients)
    }

    /// Convert a dense univariate polynomial to a polynomial in the variable `var`,
    /// inheriting the variable map from `self`.
    pub fn from_univariate(&self, poly: &UnivariatePolynomial<F>, var: usize) -> Self {
        let mut res = self.zero_with_capacity(poly.coefficients.len());
        let mut e = vec![E::zero(); self.nvars()];
        for (d, c) in poly.coefficients.iter().enumerate() {
            e[var] = E::from_u32(d as u32);
            res.append_monomial_back(c.clone(), &e);
        }
        res
    }

    /// Build a polynomial from monomials that are sorted in descending order.
    fn from_descending(&self, mut terms: Vec<(F::Element, Vec<E>)>) -> Self {
        let mut res = self.zero_with_capacity(terms.len());
        terms.reverse();
        for (c, e) in terms {
            res.append_monomial_back(c, &e);
        }
        res
    }

    /// Multiply by accumulating all products per exponent and sorting afterwards.
    fn mul_sparse(&self, rhs: &Self) -> Self {
        let nvars = self.nvars();
        let mut terms: HashMap<SmallVec<[E; INLINED_EXPONENTS]>, F::Element> = HashMap::default();
        let mut e: SmallVec<[E; INLINED_EXPONENTS]> = smallvec![E::zero(); nvars];

        for t1 in self {
            for t2 in rhs {
                for (ee, (a, b)) in e.iter_mut().zip(t1.exponents.iter().zip(t2.exponents)) {
                    *ee = a.checked_add(b).expect("overflow in adding exponents");
                }

                let c = self.field.mul(t1.coefficient, t2.coefficient);
                match terms.entry(e.clone()) {
                    Entry::Occupied(mut o) => self.field.add_assign(o.get_mut(), &c),
                    Entry::Vacant(v) => {
                        v.insert(c);
                    }
                }
            }
        }

        let mut sorted: Vec<_> = terms.into_iter().filter(|(_, c)| !F::is_zero(c)).collect();
        sorted.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let mut res = self.zero_with_capacity(sorted.len());
        for (e, c) in sorted {
            res.coefficients.push(c);
            res.exponents.extend_from_slice(&e);
        }
        res
    }
}

impl<F: Ring, E: Exponent> std::fmt::Debug for MultivariatePolynomial<F, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.is_zero() {
            return write!(f, "[]");
        }
        let mut first = true;
        write!(f, "[ ")?;
        for monomial in self {
            if first {
                first = false;
            } else {
                write!(f, ", ")?;
            }
            write!(
                f,
                "{{ {:?}, {:?} }}",
                monomial.coefficient, monomial.exponents
            )?;
        }
        write!(f, " ]")
    }
}

impl<F: Ring, E: Exponent> Display for MultivariatePolynomial<F, E>
where
    F::Element: Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        PolynomialPrinter::new(self).fmt(f)
    }
}

impl<'a, 'b, F: Ring, E: Exponent> Add<&'a MultivariatePolynomial<F, E>>
    for &'b MultivariatePolynomial<F, E>
{
    type Output = MultivariatePolynomial<F, E>;

    fn add(self, other: &'a MultivariatePolynomial<F, E>) -> Self::Output {
        debug_assert_eq!(self.variables, other.variables);

        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() {
            return self.clone();
        }

        // Merge the two polynomials, which are assumed to be already sorted.
        let mut res = self.zero_with_capacity(self.nterms() + other.nterms());
        let mut i = 0;
        let mut j = 0;

        while i < self.nterms() && j < other.nterms() {
            match self.exponents(i).cmp(other.exponents(j)) {
                Ordering::Less => {
                    res.coefficients.push(self.coefficients[i].clone());
                    res.exponents.extend_from_slice(self.exponents(i));
                    i += 1;
                }
                Ordering::Greater => {
                    res.coefficients.push(other.coefficients[j].clone());
                    res.exponents.extend_from_slice(other.exponents(j));
                    j += 1;
                }
                Ordering::Equal => {
                    let coeff = self
                        .field
                        .add(&self.coefficients[i], &other.coefficients[j]);
                    if !F::is_zero(&coeff) {
                        res.coefficients.push(coeff);
                        res.exponents.extend_from_slice(self.exponents(i));
                    }
                    i += 1;
                    j += 1;
                }
            }
        }

        for k in i..self.nterms() {
            res.coefficients.push(self.coefficients[k].clone());
            res.exponents.extend_from_slice(self.exponents(k));
        }

        for k in j..other.nterms() {
            res.coefficients.push(other.coefficients[k].clone());
            res.exponents.extend_from_slice(other.exponents(k));
        }

        res
    }
}

impl<F: Ring, E: Exponent> Add for MultivariatePolynomial<F, E> {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        &self + &other
    }
}

impl<'a, 'b, F: Ring, E: Exponent> Sub<&'a MultivariatePolynomial<F, E>>
    for &'b MultivariatePolynomial<F, E>
{
    type Output = MultivariatePolynomial<F, E>;

    fn sub(self, other: &'a MultivariatePolynomial<F, E>) -> Self::Output {
        self + &other.clone().neg()
    }
}

impl<F: Ring, E: Exponent> Sub for MultivariatePolynomial<F, E> {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        &self + &other.neg()
    }
}

impl<F: Ring, E: Exponent> Neg for MultivariatePolynomial<F, E> {
    type Output = Self;
    fn neg(mut self) -> Self::Output {
        for c in &mut self.coefficients {
            *c = self.field.neg(c);
        }
        self
    }
}

impl<'a, 'b, F: Ring, E: Exponent> Mul<&'a MultivariatePolynomial<F, E>>
    for &'b MultivariatePolynomial<F, E>
{
    type Output = MultivariatePolynomial<F, E>;

    #[inline]
    fn mul(self, rhs: &'a MultivariatePolynomial<F, E>) -> Self::Output {
        if self.nterms() == 0 || rhs.nterms() == 0 {
            return self.zero();
        }

        if self.nterms() == 1 {
            return rhs
                .clone()
                .mul_monomial(&self.coefficients[0], &self.exponents);
        }

        if rhs.nterms() == 1 {
            return self
                .clone()
                .mul_monomial(&rhs.coefficients[0], &rhs.exponents);
        }

        self.mul_sparse(rhs)
    }
}

impl<'a, 'b, F: EuclideanDomain, E: Exponent> Div<&'a MultivariatePolynomial<F, E>>
    for &'b MultivariatePolynomial<F, E>
{
    type Output = MultivariatePolynomial<F, E>;

    fn div(self, other: &'a MultivariatePolynomial<F, E>) -> Self::Output {
        self.divides(other)
            .unwrap_or_else(|| panic!("No clean division of {:?} by {:?}", self, other))
    }
}

impl<F: EuclideanDomain, E: Exponent> MultivariatePolynomial<F, E> {
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

        // check if the leading coefficients divide
        if !F::is_zero(&self.field.rem(&self.lcoeff(), &div.lcoeff())) {
            return None;
        }

        if (0..self.nvars()).any(|v| self.degree(v) < div.degree(v)) {
            return None;
        }

        if self.field.characteristic().is_zero() {
            // test division of constant term (evaluation at x_i = 0)
            let c = div.get_constant();
            if !F::is_zero(&c)
                && !self.field.is_one(&c)
                && !F::is_zero(&self.field.rem(&self.get_constant(), &c))
            {
                return None;
            }

            // test division at x_i = 1
            let mut num = self.field.zero();
            for c in &self.coefficients {
                self.field.add_assign(&mut num, c);
            }
            let mut den = self.field.zero();
            for c in &div.coefficients {
                self.field.add_assign(&mut den, c);
            }

            if !F::is_zero(&den)
                && !self.field.is_one(&den)
                && !F::is_zero(&self.field.rem(&num, &den))
            {
                return None;
            }
        }

        let (a, b) = self.quot_rem(div, true);
        if b.is_zero() {
            Some(a)
        } else {
            None
        }
    }

    /// Compute the remainder `self % div`.
    pub fn rem(&self, div: &Self) -> Self {
        self.quot_rem(div, false).1
    }

    /// Divide two multivariate polynomials and return the quotient and remainder.
    /// A leading term of the dividend is moved to the remainder when it is not divisible
    /// by the leading term of `div`.
    ///
    /// If `abort_on_remainder` is set, the division stops as soon as a non-zero remainder
    /// is detected. The returned remainder is then non-zero but otherwise meaningless.
    pub fn quot_rem(&self, div: &Self, abort_on_remainder: bool) -> (Self, Self) {
        if div.is_zero() {
            panic!("Cannot divide by 0 polynomial");
        }

        if self.is_zero() {
            return (self.clone(), self.clone());
        }

        if div.is_one() {
            return (self.clone(), self.zero());
        }

        if div.nterms() == 1 {
            let dive = div.exponents(0);
            let mut q = self.zero_with_capacity(self.nterms());
            let mut r = self.zero();
            let mut e = vec![E::zero(); self.nvars()];

            for t in self {
                if t.exponents.iter().zip(dive).all(|(a, b)| a >= b) {
                    let (quot, rem) = self.field.quot_rem(t.coefficient, &div.coefficients[0]);
                    if F::is_zero(&rem) {
                        for (ee, (a, b)) in e.iter_mut().zip(t.exponents.iter().zip(dive)) {
                            *ee = *a - *b;
                        }
                        q.append_monomial_back(quot, &e);
                        continue;
                    }
                }

                if abort_on_remainder {
                    return (q, self.clone());
                }
                r.append_monomial_back(t.coefficient.clone(), t.exponents);
            }

            return (q, r);
        }

        let dlc = div.lcoeff();
        let dexp = div.last_exponents().to_vec();
        let mut p = self.clone();
        let mut q = vec![];
        let mut r = vec![];
        let mut e = vec![E::zero(); self.nvars()];

        while !p.is_zero() {
            let plc = p.lcoeff();

            if p.last_exponents().iter().zip(&dexp).all(|(a, b)| a >= b) {
                let (qc, rc) = self.field.quot_rem(&plc, &dlc);
                if F::is_zero(&rc) {
                    for (ee, (a, b)) in e.iter_mut().zip(p.last_exponents().iter().zip(&dexp)) {
                        *ee = *a - *b;
                    }

                    // the leading terms cancel exactly
                    p = &p - &div.clone().mul_monomial(&qc, &e);
                    q.push((qc, e.clone()));
                    continue;
                }
            }

            if abort_on_remainder {
                return (self.from_descending(q), p);
            }

            r.push((plc, p.last_exponents().to_vec()));
            p.pop_last();
        }

        (self.from_descending(q), self.from_descending(r))
    }
}

/// View object for a term in a multivariate polynomial.
#[derive(Copy, Clone, Debug)]
pub struct MonomialView<'a, F: 'a + Ring, E: 'a + Exponent> {
    pub coefficient: &'a F::Element,
    pub exponents: &'a [E],
}

/// Iterator over terms in a multivariate polynomial.
pub struct MonomialViewIterator<'a, F: Ring, E: Exponent> {
    poly: &'a MultivariatePolynomial<F, E>,
    index: usize,
}

impl<'a, F: Ring, E: Exponent> Iterator for MonomialViewIterator<'a, F, E> {
    type Item = MonomialView<'a, F, E>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.index == self.poly.nterms() {
            None
        } else {
            let view = MonomialView {
                coefficient: &self.poly.coefficients[self.index],
                exponents: self.poly.exponents(self.index),
            };
            self.index += 1;
            Some(view)
        }
    }
}

impl<'a, F: Ring, E: Exponent> IntoIterator for &'a MultivariatePolynomial<F, E> {
    type Item = MonomialView<'a, F, E>;
    type IntoIter = MonomialViewIterator<'a, F, E>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        Self::IntoIter {
            poly: self,
            index: 0,
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::domains::integer::{Integer, IntegerRing};

    use super::MultivariatePolynomial;

    fn vars() -> Arc<Vec<crate::poly::Variable>> {
        Arc::new(vec!["x".into(), "y".into()])
    }

    fn poly(terms: &[(i64, [u16; 2])]) -> MultivariatePolynomial<IntegerRing, u16> {
        let mut p = MultivariatePolynomial::new(&IntegerRing::new(), None, vars());
        for (c, e) in terms {
            p.append_monomial(Integer::new(*c), e);
        }
        p
    }

    #[test]
    fn append_sorts_and_merges() {
        let p = poly(&[(1, [1, 0]), (2, [0, 1]), (3, [0, 0]), (-1, [1, 0])]);
        p.check_consistency();
        assert_eq!(p.nterms(), 2);
        assert_eq!(p.exponents(0), &[0, 0]);
        assert_eq!(p.exponents(1), &[0, 1]);
    }

    #[test]
    fn multiply_and_divide() {
        let a = poly(&[(1, [1, 0]), (1, [0, 1])]);
        let b = poly(&[(1, [1, 0]), (-1, [0, 1])]);
        let c = &a * &b;
        c.check_consistency();
        assert_eq!(c, poly(&[(1, [2, 0]), (-1, [0, 2])]));

        assert_eq!(c.divides(&a), Some(b.clone()));
        assert_eq!(c.divides(&poly(&[(1, [1, 0]), (2, [0, 1])])), None);
    }

    #[test]
    fn quotient_and_remainder() {
        // x^2 + y = (x + 1) (x - 1) + y + 1
        let a = poly(&[(1, [2, 0]), (1, [0, 1])]);
        let d = poly(&[(1, [1, 0]), (1, [0, 0])]);
        let (q, r) = a.quot_rem(&d, false);
        assert_eq!(q, poly(&[(1, [1, 0]), (-1, [0, 0])]));
        assert_eq!(r, poly(&[(1, [0, 1]), (1, [0, 0])]));
        assert_eq!(&(&q * &d) + &r, a);
    }

    #[test]
    fn degree_and_derivative() {
        let a = poly(&[(3, [2, 1]), (1, [0, 3]), (5, [0, 0])]);
        assert_eq!(a.degree(0), 2);
        assert_eq!(a.degree(1), 3);
        assert_eq!(a.total_degree(), 3);
        assert_eq!(a.derivative(0), poly(&[(6, [1, 1])]));
        assert_eq!(a.univariate_lcoeff(0), poly(&[(3, [0, 1])]));
        assert_eq!(a.replace(0, &Integer::new(2)), poly(&[(12, [0, 1]), (1, [0, 3]), (5, [0, 0])]));
    }

    #[test]
    fn power() {
        let a = poly(&[(1, [1, 0]), (1, [0, 0])]);
        let p = a.pow(3);
        assert_eq!(p, poly(&[(1, [3, 0]), (3, [2, 0]), (3, [1, 0]), (1, [0, 0])]));
        assert_eq!(p.content(), Integer::one());
    }
}
