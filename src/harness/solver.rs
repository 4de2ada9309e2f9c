use super::{
    engine::AlgebraEngine,
    error::HarnessError,
    format::{self, TimedResult},
    problem::{Operation, ParsedProblem},
    timer, tokenizer,
};

/// The delimiter between operands.
pub const OPERAND_DELIMITER: char = ',';

/// Solve a parsed problem and return its output line.
///
/// The operands are parsed before the timer starts and the result is rendered after it stops,
/// so that only the engine call is measured.
pub fn dispatch<A: AlgebraEngine>(
    engine: &A,
    problem: &ParsedProblem,
) -> Result<String, HarnessError> {
    let operation = problem.operation;
    let operands = tokenizer::split(problem.operands, OPERAND_DELIMITER);

    if operands.len() != operation.arity() {
        return Err(HarnessError::ArityMismatch {
            operation,
            expected: operation.arity(),
            found: operands.len(),
        });
    }

    let polys = operands
        .iter()
        .map(|o| {
            engine.parse(o).map_err(|e| HarnessError::InvalidOperand {
                operand: o.to_string(),
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(match operation {
        Operation::Gcd => solve_gcd(engine, &polys[0], &polys[1]),
        Operation::Factor => solve_factor(engine, &polys[0]),
    })
}

fn solve_gcd<A: AlgebraEngine>(engine: &A, a: &A::Polynomial, b: &A::Polynomial) -> String {
    let (elapsed, r) = timer::measure(|| engine.gcd(a, b));
    format::format_gcd(engine, &TimedResult::new(elapsed, r))
}

fn solve_factor<A: AlgebraEngine>(engine: &A, a: &A::Polynomial) -> String {
    let (elapsed, r) = timer::measure(|| engine.factor(a));
    format::format_factor(engine, &TimedResult::new(elapsed, r))
}

#[cfg(test)]
mod test {
    use crate::harness::{
        config::VariableSet,
        engine::PolynomialEngine,
        error::HarnessError,
        problem::{self, Operation},
    };

    use super::dispatch;

    fn solve(vars: &str, line: &str) -> Result<String, HarnessError> {
        let engine = PolynomialEngine::new(&VariableSet::parse(vars));
        dispatch(&engine, &problem::parse(line)?)
    }

    /// Split an output line into the elapsed time and the rest.
    fn split_time(line: &str) -> (f64, &str) {
        let (t, rest) = line.split_once(',').unwrap();
        (t.parse().unwrap(), rest)
    }

    #[test]
    fn gcd() {
        let out = solve("x,y", "gcd(x^2-y^2,x+y)").unwrap();
        let (t, rest) = split_time(&out);
        assert!(t >= 0. && t.is_finite());
        assert_eq!(rest, "x+y\n");

        let out = solve("x,y", "gcd(x^2-y^2,x-y)").unwrap();
        assert_eq!(split_time(&out).1, "x-y\n");
    }

    #[test]
    fn factor() {
        let out = solve("x", "factor(x^2-1)").unwrap();
        assert_eq!(split_time(&out).1, "(x+1)^1,(x-1)^1\n");

        let out = solve("x", "factor(7)").unwrap();
        assert_eq!(split_time(&out).1, "7\n");

        let out = solve("x", "factor(1)").unwrap();
        assert_eq!(split_time(&out).1, "1\n");
    }

    #[test]
    fn engine_failure_is_recoverable() {
        let out = solve("x,y", "factor((x^30*y^20+1)*(x^2*y^3+2))").unwrap();
        assert_eq!(split_time(&out).1, "FAILED\n");
    }

    #[test]
    fn large_exponents() {
        for line in [
            "gcd(x^4294967295+1,x^4294967295-1)",
            "factor(x^4294967295*y+y)",
            "factor(x^3000000000-y^3000000000)",
        ] {
            let out = solve("x,y", line).unwrap();
            assert_eq!(split_time(&out).1, "FAILED\n", "{}", line);
        }

        assert!(matches!(
            solve("x", "factor(x^4000000000*x^4000000000)"),
            Err(HarnessError::InvalidOperand { .. })
        ));
    }

    #[test]
    fn arity_mismatch() {
        assert!(matches!(
            solve("x", "gcd(x)"),
            Err(HarnessError::ArityMismatch {
                operation: Operation::Gcd,
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            solve("x", "factor(x,,x)"),
            Err(HarnessError::ArityMismatch { found: 2, .. })
        ));
    }

    #[test]
    fn invalid_operand() {
        assert!(matches!(
            solve("x", "factor(y)"),
            Err(HarnessError::InvalidOperand { operand, .. }) if operand == "y"
        ));
    }
}
