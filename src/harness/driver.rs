use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
};

use tracing::{debug_span, info};

use super::{
    config::Config,
    engine::{AlgebraEngine, PolynomialEngine},
    error::HarnessError,
    problem,
    reader::LineReader,
    solver,
};

/// Processes problem lines one at a time, in order.
pub struct Harness<A: AlgebraEngine> {
    engine: A,
}

impl<A: AlgebraEngine> Harness<A> {
    pub fn new(engine: A) -> Harness<A> {
        Harness { engine }
    }

    /// Solve every problem in `input` and write one line per problem to `output`.
    /// Every line is flushed as soon as it is written. Returns the number of problems.
    pub fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> Result<usize, HarnessError> {
        let mut reader = LineReader::new(input);

        let mut count = 0;
        while let Some(line) = reader.read_line()? {
            count += 1;

            let problem = problem::parse(&line)?;
            let _span = debug_span!("problem", line = count, operation = %problem.operation).entered();

            let result = solver::dispatch(&self.engine, &problem)?;

            output
                .write_all(result.as_bytes())
                .and_then(|_| output.flush())
                .map_err(HarnessError::Write)?;
        }

        info!("processed {} problems", count);
        Ok(count)
    }
}

/// Run the benchmark described by `config`. The input is opened before the output is created.
pub fn run(config: &Config) -> Result<usize, HarnessError> {
    let input = File::open(&config.input).map_err(|source| HarnessError::OpenInput {
        path: config.input.clone(),
        source,
    })?;

    let output = File::create(&config.output).map_err(|source| HarnessError::CreateOutput {
        path: config.output.clone(),
        source,
    })?;

    Harness::new(PolynomialEngine::new(&config.variables))
        .run(BufReader::new(input), BufWriter::new(output))
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use crate::harness::{config::VariableSet, engine::PolynomialEngine, error::HarnessError};

    use super::Harness;

    fn harness() -> Harness<PolynomialEngine> {
        Harness::new(PolynomialEngine::new(&VariableSet::parse("x,y")))
    }

    #[test]
    fn one_line_per_problem() {
        let mut out = vec![];
        let n = harness()
            .run(Cursor::new("gcd(x*y,y)\r\nfactor(x*y)"), &mut out)
            .unwrap();
        assert_eq!(n, 2);

        let out = String::from_utf8(out).unwrap();
        let lines: Vec<_> = out.lines().map(|l| l.split_once(',').unwrap().1).collect();
        assert_eq!(lines, vec!["y", "(x)^1,(y)^1"]);
    }

    #[test]
    fn stops_at_unsupported_problem() {
        let mut out = vec![];
        let r = harness().run(Cursor::new("factor(x)\nfoo(x)\nfactor(y)\n"), &mut out);
        assert!(matches!(r, Err(HarnessError::UnsupportedProblemType(l)) if l == "foo(x)"));
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }
}
