use std::fs;

use polybench::harness::{
    config::{Config, VariableSet},
    driver,
    error::HarnessError,
};
use tempfile::TempDir;

fn run(dir: &TempDir, vars: &str, input: &str) -> (Result<usize, HarnessError>, String) {
    let input_path = dir.path().join("input.txt");
    let output_path = dir.path().join("output.txt");
    fs::write(&input_path, input).unwrap();

    let config = Config {
        variables: VariableSet::parse(vars),
        input: input_path,
        output: output_path.clone(),
    };

    let r = driver::run(&config);
    let out = fs::read_to_string(output_path).unwrap_or_default();
    (r, out)
}

/// Drop the elapsed time in front of every line, after checking that it is a valid time.
fn results(out: &str) -> Vec<&str> {
    out.lines()
        .map(|l| {
            let (t, rest) = l.split_once(',').unwrap();
            let t: f64 = t.parse().unwrap();
            assert!(t >= 0. && t.is_finite());
            rest
        })
        .collect()
}

#[test]
fn gcd_and_factor() {
    let dir = TempDir::new().unwrap();
    let (r, out) = run(
        &dir,
        "x,y",
        "gcd(x^2-y^2,x+y)\ngcd(6*x*y,4*x^2)\nfactor(x^2-1)\nfactor(-2*x^3*y+2*x*y)\nfactor(1)\n",
    );

    assert_eq!(r.unwrap(), 5);
    assert!(out.ends_with('\n'));
    assert_eq!(
        results(&out),
        vec![
            "x+y",
            "2*x",
            "(x+1)^1,(x-1)^1",
            "-2,(x)^1,(x+1)^1,(x-1)^1,(y)^1",
            "1"
        ]
    );
}

#[test]
fn variable_order() {
    let dir = TempDir::new().unwrap();
    let (_, xy) = run(&dir, "x,y", "gcd(x*y+y^2,x^2+x*y)\n");
    let (_, yx) = run(&dir, "y,x", "gcd(x*y+y^2,x^2+x*y)\n");
    assert_eq!(results(&xy), vec!["x+y"]);
    assert_eq!(results(&yx), vec!["y+x"]);
}

#[test]
fn repeated_and_multivariate_factors() {
    let dir = TempDir::new().unwrap();
    let (r, out) = run(&dir, "x,y", "factor((x+y)^2*(x-y))\nfactor((x*y+1)*(x^2+y^2+1))\n");
    assert_eq!(r.unwrap(), 2);
    let res = results(&out);
    assert_eq!(res[0], "(x+y)^2,(x-y)^1");
    assert_eq!(res[1], "(x*y+1)^1,(x^2+y^2+1)^1");
}

#[test]
fn unknown_operation_is_fatal() {
    let dir = TempDir::new().unwrap();
    let (r, out) = run(&dir, "x", "factor(x)\nfoo(x)\nfactor(x^2)\n");
    assert!(matches!(r, Err(HarnessError::UnsupportedProblemType(_))));
    assert_eq!(results(&out), vec!["(x)^1"]);
}

#[test]
fn missing_input() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        variables: VariableSet::parse("x"),
        input: dir.path().join("missing.txt"),
        output: dir.path().join("output.txt"),
    };

    assert!(matches!(
        driver::run(&config),
        Err(HarnessError::OpenInput { .. })
    ));
    assert!(!dir.path().join("output.txt").exists());
}

#[test]
fn empty_input() {
    let dir = TempDir::new().unwrap();
    let (r, out) = run(&dir, "x", "");
    assert_eq!(r.unwrap(), 0);
    assert!(out.is_empty());
}
