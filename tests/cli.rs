use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn polybench() -> Command {
    Command::cargo_bin("polybench").unwrap()
}

#[test]
fn version_banner() {
    polybench()
        .arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(concat!(
            "polybench ",
            env!("CARGO_PKG_VERSION"),
            ", "
        )));
}

#[test]
fn help() {
    polybench()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn missing_arguments() {
    polybench()
        .arg("x,y")
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("error: usage"));
}

#[test]
fn benchmark_run() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    fs::write(&input, "gcd(x^2-y^2,x-y)\nfactor(x^2-1)\n").unwrap();

    polybench()
        .arg("x,y")
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    let out = fs::read_to_string(&output).unwrap();
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(",x-y"));
    assert!(lines[1].ends_with(",(x+1)^1,(x-1)^1"));
}

#[test]
fn unknown_operation() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    fs::write(&input, "foo(x)\nfactor(x)\n").unwrap();

    polybench()
        .arg("x")
        .arg(&input)
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported problem type"));

    assert_eq!(fs::read_to_string(&output).unwrap(), "");
}

#[test]
fn arity_mismatch() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    fs::write(&input, "gcd(x)\n").unwrap();

    polybench()
        .arg("x")
        .arg(&input)
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("gcd expects 2 operand(s), found 1"));
}
