use std::fmt::{self, Display};

use super::error::HarnessError;

/// An operation that the harness knows how to benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Gcd,
    Factor,
}

impl Operation {
    pub const ALL: [Operation; 2] = [Operation::Gcd, Operation::Factor];

    /// The keyword that introduces the operation in a problem line.
    pub fn keyword(&self) -> &'static str {
        match self {
            Operation::Gcd => "gcd",
            Operation::Factor => "factor",
        }
    }

    /// The number of operands the operation takes.
    pub fn arity(&self) -> usize {
        match self {
            Operation::Gcd => 2,
            Operation::Factor => 1,
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A problem line split into its operation and the raw operand list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedProblem<'a> {
    pub operation: Operation,
    pub operands: &'a str,
}

/// Recognize `name(body)`, where `name` is an operation keyword and the line ends with `)`.
/// The body is not validated.
pub fn parse(line: &str) -> Result<ParsedProblem<'_>, HarnessError> {
    for operation in Operation::ALL {
        let body = line
            .strip_prefix(operation.keyword())
            .and_then(|rest| rest.strip_prefix('('))
            .and_then(|rest| rest.strip_suffix(')'));

        if let Some(operands) = body {
            return Ok(ParsedProblem {
                operation,
                operands,
            });
        }
    }

    Err(HarnessError::UnsupportedProblemType(line.to_owned()))
}

#[cfg(test)]
mod test {
    use crate::harness::error::HarnessError;

    use super::{parse, Operation, ParsedProblem};

    #[test]
    fn known_operations() {
        assert_eq!(
            parse("gcd(x^2-y^2,x-y)").unwrap(),
            ParsedProblem {
                operation: Operation::Gcd,
                operands: "x^2-y^2,x-y"
            }
        );
        assert_eq!(
            parse("factor((x+1)*(x-1))").unwrap(),
            ParsedProblem {
                operation: Operation::Factor,
                operands: "(x+1)*(x-1)"
            }
        );
        assert_eq!(parse("gcd()").unwrap().operands, "");
    }

    #[test]
    fn unsupported() {
        for line in ["foo(x)", "gcd(x,y", "gcdx(x,y)", "factor x", "", " gcd(x,y)"] {
            assert!(matches!(
                parse(line),
                Err(HarnessError::UnsupportedProblemType(l)) if l == line
            ));
        }
    }

    #[test]
    fn arity() {
        assert_eq!(Operation::Gcd.arity(), 2);
        assert_eq!(Operation::Factor.arity(), 1);
        assert_eq!(Operation::Factor.to_string(), "factor");
    }
}
