//! Validation of the Variable List given on the command line.

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::poly::Variable;

/// The environment variable with the log filter, e.g. `POLYBENCH_LOG=debug`.
pub const LOG_ENV: &str = "POLYBENCH_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("the variable list is empty")]
    NoVariables,
    #[error("invalid variable name '{0}'")]
    InvalidVariable(String),
    #[error("variable {0} appears more than once")]
    DuplicateVariable(String),
}

/// Parse a comma-separated list of variable names, such as `x,y,z`.
/// The order of the names fixes the order of the variables in every polynomial.
pub fn parse_variables(list: &str) -> Result<Arc<Vec<Variable>>, ConfigError> {
    if list.trim().is_empty() {
        return Err(ConfigError::NoVariables);
    }

    let mut vars: Vec<Variable> = vec![];
    for name in list.split(',') {
        let name = name.trim();
        if !is_identifier(name) {
            return Err(ConfigError::InvalidVariable(name.to_string()));
        }
        if vars.iter().any(|v| v.name() == name) {
            return Err(ConfigError::DuplicateVariable(name.to_string()));
        }
        vars.push(Variable::new(name));
    }

    Ok(Arc::new(vars))
}

/// Write logs to stderr, filtered by [LOG_ENV]. Only warnings are shown by default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // a subscriber may already be installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod test {
    use super::{parse_variables, ConfigError};

    #[test]
    fn variable_list() {
        let vars = parse_variables("x, y ,z_1").unwrap();
        let names: Vec<_> = vars.iter().map(|v| v.name()).collect();
        assert_eq!(names, ["x", "y", "z_1"]);
    }

    #[test]
    fn invalid() {
        assert_eq!(parse_variables(" "), Err(ConfigError::NoVariables));
        assert_eq!(parse_variables("x,,y"), Err(ConfigError::InvalidVariable("".into())));
        assert_eq!(parse_variables("x,2y"), Err(ConfigError::InvalidVariable("2y".into())));
        assert_eq!(parse_variables("x,y,x"), Err(ConfigError::DuplicateVariable("x".into())));
    }
}
