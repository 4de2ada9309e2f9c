use std::sync::Arc;

use thiserror::Error;

use crate::{
    domains::integer::IntegerRing,
    parser::PolynomialParser,
    poly::{
        factor::{FactorizationError, Factorize},
        gcd::GCDError,
        polynomial::MultivariatePolynomial,
        Variable,
    },
};

use super::config::VariableSet;

/// A failure of the algebra engine. Parse errors are fatal for the run,
/// computation errors are reported as a failed result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("{0}")]
    Parse(String),
    #[error("factorization limit reached: {0}")]
    FactorizationLimit(String),
    #[error("gcd limit reached: {0}")]
    GcdLimit(String),
}

impl From<FactorizationError> for EngineError {
    fn from(e: FactorizationError) -> Self {
        EngineError::FactorizationLimit(e.to_string())
    }
}

impl From<GCDError> for EngineError {
    fn from(e: GCDError) -> Self {
        EngineError::GcdLimit(e.to_string())
    }
}

/// A factorization `constant * f_1^k_1 * ... * f_n^k_n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Factorization<P> {
    pub constant: P,
    pub factors: Vec<(P, usize)>,
}

/// The interface between the harness and the algebra engine.
pub trait AlgebraEngine {
    type Polynomial;

    fn parse(&self, text: &str) -> Result<Self::Polynomial, EngineError>;
    fn gcd(&self, a: &Self::Polynomial, b: &Self::Polynomial)
        -> Result<Self::Polynomial, EngineError>;
    fn factor(&self, a: &Self::Polynomial) -> Result<Factorization<Self::Polynomial>, EngineError>;
    fn is_one(&self, a: &Self::Polynomial) -> bool;
    fn render(&self, a: &Self::Polynomial) -> String;
}

/// The algebra engine for multivariate polynomials over the integers.
#[derive(Debug, Clone)]
pub struct PolynomialEngine {
    variables: Arc<Vec<Variable>>,
}

impl PolynomialEngine {
    pub fn new(variables: &VariableSet) -> PolynomialEngine {
        PolynomialEngine {
            variables: variables.get_vars(),
        }
    }
}

impl AlgebraEngine for PolynomialEngine {
    type Polynomial = MultivariatePolynomial<IntegerRing, u32>;

    fn parse(&self, text: &str) -> Result<Self::Polynomial, EngineError> {
        PolynomialParser::parse(text, &self.variables).map_err(EngineError::Parse)
    }

    fn gcd(
        &self,
        a: &Self::Polynomial,
        b: &Self::Polynomial,
    ) -> Result<Self::Polynomial, EngineError> {
        Ok(a.gcd(b)?)
    }

    fn factor(&self, a: &Self::Polynomial) -> Result<Factorization<Self::Polynomial>, EngineError> {
        let (constant, factors) = a.factor()?;
        Ok(Factorization {
            constant: a.constant(constant),
            factors,
        })
    }

    fn is_one(&self, a: &Self::Polynomial) -> bool {
        a.is_one()
    }

    fn render(&self, a: &Self::Polynomial) -> String {
        a.to_string()
    }
}

#[cfg(test)]
mod test {
    use crate::harness::config::VariableSet;

    use super::{AlgebraEngine, EngineError, PolynomialEngine};

    fn engine() -> PolynomialEngine {
        PolynomialEngine::new(&VariableSet::parse("x,y"))
    }

    #[test]
    fn gcd() {
        let e = engine();
        let a = e.parse("x^2-y^2").unwrap();
        let b = e.parse("x+y").unwrap();
        assert_eq!(e.render(&e.gcd(&a, &b).unwrap()), "x+y");
    }

    #[test]
    fn factor() {
        let e = engine();
        let f = e.factor(&e.parse("-2*x^2+2").unwrap()).unwrap();
        assert_eq!(e.render(&f.constant), "-2");
        let rendered: Vec<_> = f.factors.iter().map(|(p, k)| (e.render(p), *k)).collect();
        assert_eq!(rendered, vec![("x+1".to_owned(), 1), ("x-1".to_owned(), 1)]);

        let zero = e.factor(&e.parse("0").unwrap()).unwrap();
        assert_eq!(e.render(&zero.constant), "0");
        assert!(zero.factors.is_empty());
    }

    #[test]
    fn limits() {
        let e = engine();
        let a = e.parse("x^4294967295+1").unwrap();
        let b = e.parse("x^4294967295-1").unwrap();
        assert!(matches!(e.gcd(&a, &b), Err(EngineError::GcdLimit(_))));

        let c = e.parse("x^4294967295*y+y").unwrap();
        assert!(matches!(e.factor(&c), Err(EngineError::FactorizationLimit(_))));

        let d = e.parse("x^3000000000-y^3000000000").unwrap();
        assert!(matches!(e.factor(&d), Err(EngineError::FactorizationLimit(_))));
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(engine().parse("x+z"), Err(EngineError::Parse(_))));
        assert!(matches!(
            engine().parse("x^4000000000*x^4000000000"),
            Err(EngineError::Parse(_))
        ));
    }
}
