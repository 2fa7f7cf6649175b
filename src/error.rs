use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::check::CheckError;
use crate::config::ConfigError;
use crate::engine::EngineError;
use crate::parser::ParseError;
use crate::problems::ProblemError;
use crate::request::RequestError;

/// Any error that aborts a run.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("line {line}: {source}")]
    Request { line: usize, source: RequestError },
    #[error("line {line}: {source}")]
    Parse { line: usize, source: ParseError },
    #[error("line {line}: {source}")]
    Engine { line: usize, source: EngineError },
    #[error(transparent)]
    Problem(#[from] ProblemError),
    #[error(transparent)]
    Check(#[from] CheckError),
    #[error("{}: {}", .path.display(), .source)]
    Resource { path: PathBuf, source: io::Error },
}

impl BenchError {
    pub fn resource(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> BenchError {
        let path = path.into();
        move |source| BenchError::Resource { path, source }
    }
}
