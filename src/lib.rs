//! Polybench times polynomial gcd and factorization requests.
//!
//! Requests are read one per line, in the form `gcd(p1,p2)` or `factor(p)`,
//! evaluated by an [AlgebraEngine](engine::AlgebraEngine) and written as
//! result lines that start with the elapsed time in seconds.
//!
//! For example:
//!
//! ```
//! use polybench::{config::parse_variables, driver::Dispatcher, engine::IntegerPolynomialEngine};
//!
//! let variables = parse_variables("x,y").unwrap();
//! let dispatcher = Dispatcher::new(IntegerPolynomialEngine::new(variables));
//!
//! let response = dispatcher.dispatch("factor(x^2-y^2)", 1).unwrap();
//! assert!(response.line.ends_with(",1,(x-y)^1,(x+y)^1"));
//! ```

pub mod check;
pub mod combinatorics;
pub mod config;
pub mod domains;
pub mod driver;
pub mod engine;
pub mod error;
pub mod parser;
pub mod poly;
pub mod printer;
pub mod problems;
pub mod report;
pub mod request;
pub mod utils;
