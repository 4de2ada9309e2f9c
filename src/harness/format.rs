use std::fmt::Write;

use tracing::debug;

use super::engine::{AlgebraEngine, EngineError, Factorization};

/// The number of significant digits of the elapsed time.
const PRECISION: i32 = 6;

/// The marker written in place of a result when the engine fails.
pub const FAILED: &str = "FAILED";

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure,
}

/// The result of a timed engine call.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedResult<T> {
    pub elapsed: f64,
    pub outcome: Outcome<T>,
}

impl<T> TimedResult<T> {
    pub fn new(elapsed: f64, result: Result<T, EngineError>) -> TimedResult<T> {
        let outcome = match result {
            Ok(r) => Outcome::Success(r),
            Err(e) => {
                debug!("engine failure: {}", e);
                Outcome::Failure
            }
        };

        TimedResult { elapsed, outcome }
    }
}

/// Format a number of seconds like C's `%g`: six significant digits,
/// no trailing zeros, and exponent notation for very small or large values.
pub fn format_seconds(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_owned();
    }

    if x.is_infinite() {
        return if x > 0. { "inf" } else { "-inf" }.to_owned();
    }

    if x == 0. {
        return if x.is_sign_negative() { "-0" } else { "0" }.to_owned();
    }

    // the exponent after rounding to the requested precision
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, x);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((&sci, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= PRECISION {
        format!(
            "{}e{}{:02}",
            trim_zeros(mantissa),
            if exp < 0 { '-' } else { '+' },
            exp.abs()
        )
    } else {
        trim_zeros(&format!("{:.*}", (PRECISION - 1 - exp) as usize, x)).to_owned()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Format `<elapsed>,<gcd>` or `<elapsed>,FAILED`.
pub fn format_gcd<A: AlgebraEngine>(engine: &A, r: &TimedResult<A::Polynomial>) -> String {
    let mut out = format_seconds(r.elapsed);
    out.push(',');
    match &r.outcome {
        Outcome::Success(g) => out.push_str(&engine.render(g)),
        Outcome::Failure => out.push_str(FAILED),
    }
    out.push('\n');
    out
}

/// Format `<elapsed>[,<constant>],(<f1>)^<k1>,...` or `<elapsed>,FAILED`.
/// The constant is written when it is not one or when there are no factors.
pub fn format_factor<A: AlgebraEngine>(
    engine: &A,
    r: &TimedResult<Factorization<A::Polynomial>>,
) -> String {
    let mut out = format_seconds(r.elapsed);
    match &r.outcome {
        Outcome::Success(f) => {
            if f.factors.is_empty() || !engine.is_one(&f.constant) {
                out.push(',');
                out.push_str(&engine.render(&f.constant));
            }

            for (p, k) in &f.factors {
                // writing to a string cannot fail
                let _ = write!(out, ",({})^{}", engine.render(p), k);
            }
        }
        Outcome::Failure => {
            out.push(',');
            out.push_str(FAILED);
        }
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use crate::harness::engine::{AlgebraEngine, EngineError, Factorization};

    use super::{format_factor, format_gcd, format_seconds, Outcome, TimedResult};

    /// An engine that renders integers.
    struct Numbers;

    impl AlgebraEngine for Numbers {
        type Polynomial = i64;

        fn parse(&self, text: &str) -> Result<i64, EngineError> {
            text.parse().map_err(|_| EngineError::Parse(text.to_owned()))
        }

        fn gcd(&self, a: &i64, b: &i64) -> Result<i64, EngineError> {
            Ok(crate::utils::gcd_signed(*a, *b) as i64)
        }

        fn factor(&self, a: &i64) -> Result<Factorization<i64>, EngineError> {
            Ok(Factorization {
                constant: *a,
                factors: vec![],
            })
        }

        fn is_one(&self, a: &i64) -> bool {
            *a == 1
        }

        fn render(&self, a: &i64) -> String {
            a.to_string()
        }
    }

    #[test]
    fn general_float_format() {
        assert_eq!(format_seconds(0.), "0");
        assert_eq!(format_seconds(1.), "1");
        assert_eq!(format_seconds(0.5), "0.5");
        assert_eq!(format_seconds(1.5e-5), "1.5e-05");
        assert_eq!(format_seconds(0.000123456), "0.000123456");
        assert_eq!(format_seconds(0.0001234567), "0.000123457");
        assert_eq!(format_seconds(123456.7), "123457");
        assert_eq!(format_seconds(1234567.), "1.23457e+06");
        assert_eq!(format_seconds(9.9999999), "10");
        assert_eq!(format_seconds(2.5e-9), "2.5e-09");
        assert_eq!(format_seconds(1e100), "1e+100");
    }

    #[test]
    fn gcd_lines() {
        let ok = TimedResult::new(0.25, Ok(6));
        assert_eq!(format_gcd(&Numbers, &ok), "0.25,6\n");
        let failed = TimedResult::new(0.25, Err(EngineError::FactorizationLimit("".into())));
        assert_eq!(failed.outcome, Outcome::Failure);
        assert_eq!(format_gcd(&Numbers, &failed), "0.25,FAILED\n");
    }

    #[test]
    fn factor_lines() {
        let f = |constant, factors| TimedResult {
            elapsed: 1.,
            outcome: Outcome::Success(Factorization { constant, factors }),
        };

        assert_eq!(format_factor(&Numbers, &f(1, vec![])), "1,1\n");
        assert_eq!(format_factor(&Numbers, &f(1, vec![(3, 1), (5, 2)])), "1,(3)^1,(5)^2\n");
        assert_eq!(format_factor(&Numbers, &f(-2, vec![(3, 1)])), "1,-2,(3)^1\n");
        assert_eq!(format_factor(&Numbers, &f(0, vec![])), "1,0\n");

        let failed: TimedResult<Factorization<i64>> = TimedResult {
            elapsed: 1.,
            outcome: Outcome::Failure,
        };
        assert_eq!(format_factor(&Numbers, &failed), "1,FAILED\n");
    }

    proptest! {
        #[test]
        fn seconds_round_trip(x in 1e-9f64..1e9) {
            let s = format_seconds(x);
            let y: f64 = s.parse().unwrap();
            prop_assert!(((x - y) / x).abs() < 1e-5);
            prop_assert!(!s.ends_with('.'));
            prop_assert!(!s.contains('.') || s.contains('e') || !s.ends_with('0'));
        }
    }
}
