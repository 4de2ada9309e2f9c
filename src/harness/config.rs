use std::{path::PathBuf, sync::Arc};

use clap::Parser;

use crate::poly::Variable;

use super::{error::HarnessError, tokenizer};

/// Time polynomial gcd and factorization problems read from a file.
#[derive(Debug, Parser)]
#[command(name = "polybench", disable_version_flag = true)]
pub struct Cli {
    /// Print the version banner and exit
    #[arg(short = 'v', long = "version")]
    pub version: bool,
    /// Comma-separated list of variables, in the order used for every polynomial
    pub variables: Option<String>,
    /// File with one problem per line, such as `gcd(x^2-1,x+1)` or `factor(x^2-1)`
    pub input: Option<PathBuf>,
    /// File the timings and results are written to
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Build the run configuration. All three positional arguments are required.
    pub fn into_config(self) -> Result<Config, HarnessError> {
        match (self.variables, self.input, self.output) {
            (Some(variables), Some(input), Some(output)) => Ok(Config {
                variables: VariableSet::parse(&variables),
                input,
                output,
            }),
            _ => Err(HarnessError::Usage),
        }
    }
}

/// The ordered variables of a run. The position of a variable in the set is
/// its position in every polynomial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSet(Arc<Vec<Variable>>);

impl VariableSet {
    /// Parse a comma-separated list of variables. Empty entries are skipped and
    /// duplicates are kept.
    pub fn parse(list: &str) -> VariableSet {
        VariableSet(Arc::new(
            tokenizer::split(list, ',').into_iter().map(Variable::from).collect(),
        ))
    }

    pub fn get_vars(&self) -> Arc<Vec<Variable>> {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The configuration of a benchmark run.
#[derive(Debug, Clone)]
pub struct Config {
    pub variables: VariableSet,
    pub input: PathBuf,
    pub output: PathBuf,
}

/// The banner printed by `-v`: the program version and the compiler it was built with.
pub fn version_banner() -> String {
    format!(
        "polybench {}, {}",
        env!("CARGO_PKG_VERSION"),
        env!("POLYBENCH_RUSTC_VERSION")
    )
}

#[cfg(test)]
mod test {
    use clap::Parser;

    use crate::harness::error::HarnessError;

    use super::{version_banner, Cli, VariableSet};

    #[test]
    fn variables() {
        let v = VariableSet::parse("x,,y,x");
        assert_eq!(v.len(), 3);
        assert_eq!(v.get_vars()[1].as_str(), "y");
        assert!(VariableSet::parse("").is_empty());
    }

    #[test]
    fn positional_arguments() {
        let c = Cli::try_parse_from(["polybench", "x,y", "in.txt", "out.txt"])
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(c.variables, VariableSet::parse("x,y"));
        assert_eq!(c.input.to_str(), Some("in.txt"));
        assert_eq!(c.output.to_str(), Some("out.txt"));

        let c = Cli::try_parse_from(["polybench", "x,y", "in.txt"]).unwrap();
        assert!(matches!(c.into_config(), Err(HarnessError::Usage)));
    }

    #[test]
    fn version_flag() {
        assert!(Cli::try_parse_from(["polybench", "-v"]).unwrap().version);
        assert!(version_banner().starts_with(concat!("polybench ", env!("CARGO_PKG_VERSION"), ", ")));
    }
}
