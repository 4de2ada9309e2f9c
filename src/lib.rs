//! Polybench is a benchmark harness for polynomial gcd and factorization.
//!
//! It reads problems such as `gcd(x^2-y^2,x+y)` or `factor(x^2-1)` from a file,
//! solves them with its own algebra engine over the integers, and writes the
//! elapsed time of every computation together with its result.
//!
//! For example:
//!
//! ```
//! use std::io::Cursor;
//! use polybench::harness::{config::VariableSet, driver::Harness, engine::PolynomialEngine};
//!
//! let engine = PolynomialEngine::new(&VariableSet::parse("x,y"));
//! let mut output = vec![];
//! Harness::new(engine)
//!     .run(Cursor::new("factor(x^2-1)\n"), &mut output)
//!     .unwrap();
//!
//! let line = String::from_utf8(output).unwrap();
//! assert!(line.ends_with(",(x+1)^1,(x-1)^1\n"));
//! ```
pub mod combinatorics;
pub mod domains;
pub mod harness;
pub mod parser;
pub mod poly;
pub mod printer;
pub mod utils;
