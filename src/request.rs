//! Classification of input lines and extraction of their operands.

use std::fmt;

use thiserror::Error;

/// The number of characters of an unrecognized line that is kept in the error.
pub const PREVIEW_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Gcd,
    Factor,
}

impl RequestKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            RequestKind::Gcd => "gcd",
            RequestKind::Factor => "factor",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("unknown problem type: {preview}")]
    Unclassified { preview: String },
    #[error("malformed {kind} request: {reason}")]
    Malformed { kind: RequestKind, reason: String },
}

/// A single request, borrowing the operand texts from the input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'a> {
    Gcd(&'a str, &'a str),
    Factor(&'a str),
}

impl<'a> Request<'a> {
    /// Classify a line by its leading keyword and extract the operands
    /// between the outer parentheses.
    pub fn classify(line: &'a str) -> Result<Request<'a>, RequestError> {
        if let Some(rest) = line.strip_prefix(RequestKind::Gcd.keyword()) {
            let args = Self::arguments(rest, RequestKind::Gcd)?;
            let (a, b) = split_top_level(args).ok_or_else(|| RequestError::Malformed {
                kind: RequestKind::Gcd,
                reason: "expected exactly two operands separated by a top-level comma".into(),
            })?;
            Ok(Request::Gcd(a, b))
        } else if let Some(rest) = line.strip_prefix(RequestKind::Factor.keyword()) {
            Ok(Request::Factor(Self::arguments(rest, RequestKind::Factor)?))
        } else {
            Err(RequestError::Unclassified {
                preview: preview(line),
            })
        }
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Gcd(..) => RequestKind::Gcd,
            Request::Factor(_) => RequestKind::Factor,
        }
    }

    fn arguments(rest: &'a str, kind: RequestKind) -> Result<&'a str, RequestError> {
        rest.strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(|| RequestError::Malformed {
                kind,
                reason: format!("expected {}(...)", kind),
            })
    }
}

/// Keep the first few characters of a line, marking the truncation with `...`.
pub fn preview(line: &str) -> String {
    match line.char_indices().nth(PREVIEW_LENGTH) {
        Some((i, _)) => format!("{}...", &line[..i]),
        None => line.to_string(),
    }
}

/// Split `args` at the single comma outside of parentheses.
fn split_top_level(args: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    let mut split = None;

    for (i, c) in args.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                if split.is_some() {
                    return None;
                }
                split = Some(i);
            }
            _ => {}
        }
    }

    split.map(|i| (&args[..i], &args[i + 1..]))
}

#[cfg(test)]
mod test {
    use super::{preview, Request, RequestError, RequestKind};

    #[test]
    fn classify() {
        assert_eq!(
            Request::classify("gcd(x^2-y^2,x-y)"),
            Ok(Request::Gcd("x^2-y^2", "x-y"))
        );
        assert_eq!(Request::classify("factor(x^2)"), Ok(Request::Factor("x^2")));
        assert_eq!(Request::classify("factor(x^2)").unwrap().kind(), RequestKind::Factor);
        assert_eq!(
            Request::classify("gcd((x+y)*(x-y),(x-y))"),
            Ok(Request::Gcd("(x+y)*(x-y)", "(x-y)"))
        );
    }

    #[test]
    fn unclassified() {
        assert_eq!(
            Request::classify("bogus(x)"),
            Err(RequestError::Unclassified { preview: "bogus(x)".into() })
        );
        assert_eq!(
            Request::classify("resultant(x,y)"),
            Err(RequestError::Unclassified { preview: "resultan...".into() })
        );
        assert_eq!(
            Request::classify(""),
            Err(RequestError::Unclassified { preview: "".into() })
        );
    }

    #[test]
    fn malformed() {
        for line in ["gcd(x)", "gcd(x,y,z)", "gcd x,y", "factor(x", "gcd(x,y"] {
            assert!(
                matches!(Request::classify(line), Err(RequestError::Malformed { .. })),
                "{}",
                line
            );
        }
    }

    #[test]
    fn preview_is_char_based() {
        assert_eq!(preview("äöüäöüäöü"), "äöüäöüäö...");
        assert_eq!(preview("12345678"), "12345678");
    }
}
