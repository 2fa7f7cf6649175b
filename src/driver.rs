//! Reads requests line by line, evaluates them with an [AlgebraEngine]
//! and writes one result line per request.

use std::fs::File;
use std::io::{BufRead, BufReader, LineWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::engine::AlgebraEngine;
use crate::error::BenchError;
use crate::report;
use crate::request::{Request, RequestKind};

/// The outcome of a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub kind: RequestKind,
    pub elapsed: Duration,
    pub line: String,
}

/// Routes each request to the engine and formats the result.
pub struct Dispatcher<A: AlgebraEngine> {
    engine: A,
}

impl<A: AlgebraEngine> Dispatcher<A> {
    pub fn new(engine: A) -> Dispatcher<A> {
        Dispatcher { engine }
    }

    pub fn engine(&self) -> &A {
        &self.engine
    }

    /// Evaluate the request on `line`, the `line_number`-th line of the input.
    /// Only the engine call is timed.
    pub fn dispatch(&self, line: &str, line_number: usize) -> Result<Response, BenchError> {
        let request = Request::classify(line).map_err(|source| BenchError::Request {
            line: line_number,
            source,
        })?;

        let parse = |text: &str| {
            self.engine.parse(text).map_err(|source| BenchError::Parse {
                line: line_number,
                source,
            })
        };
        let engine_error = |source| BenchError::Engine {
            line: line_number,
            source,
        };

        let (elapsed, line) = match request {
            Request::Gcd(a, b) => {
                let a = parse(a)?;
                let b = parse(b)?;

                let instant = Instant::now();
                let gcd = self.engine.gcd(&a, &b).map_err(engine_error)?;
                let elapsed = instant.elapsed();

                (elapsed, report::gcd_line(&self.engine, elapsed, &gcd))
            }
            Request::Factor(p) => {
                let p = parse(p)?;

                let instant = Instant::now();
                let factorization = self.engine.factor(&p).map_err(engine_error)?;
                let elapsed = instant.elapsed();

                (elapsed, report::factor_line(&self.engine, elapsed, &factorization))
            }
        };

        Ok(Response {
            kind: request.kind(),
            elapsed,
            line,
        })
    }

    /// Process every line of `input` in order, writing each result line to `output`
    /// as soon as it is computed. The first error aborts the run.
    /// Returns the number of processed lines.
    pub fn process<R: BufRead, W: Write>(
        &self,
        input: R,
        input_path: &Path,
        output: &mut W,
        output_path: &Path,
    ) -> Result<usize, BenchError> {
        let mut count = 0;

        for (i, line) in input.lines().enumerate() {
            let line = line.map_err(BenchError::resource(input_path))?;
            let line_number = i + 1;

            let response = self.dispatch(line.trim_end(), line_number)?;
            debug!(
                "line {}: {} in {}s",
                line_number,
                response.kind,
                report::seconds(response.elapsed)
            );

            writeln!(output, "{}", response.line).map_err(BenchError::resource(output_path))?;
            count += 1;
        }

        output.flush().map_err(BenchError::resource(output_path))?;
        Ok(count)
    }

    /// Process the requests in the file `input` and write the results to
    /// the file `output`, which is created or truncated.
    pub fn run(&self, input: &Path, output: &Path) -> Result<usize, BenchError> {
        let input_file = File::open(input).map_err(BenchError::resource(input))?;
        let output_file = File::create(output).map_err(BenchError::resource(output))?;

        let mut writer = LineWriter::new(output_file);
        let count = self.process(BufReader::new(input_file), input, &mut writer, output)?;

        info!("processed {} requests", count);
        Ok(count)
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;
    use std::sync::Arc;

    use crate::engine::IntegerPolynomialEngine;
    use crate::error::BenchError;
    use crate::poly::Variable;
    use crate::request::{RequestError, RequestKind};

    use super::Dispatcher;

    fn dispatcher() -> Dispatcher<IntegerPolynomialEngine> {
        Dispatcher::new(IntegerPolynomialEngine::new(Arc::new(vec![
            Variable::new("x"),
            Variable::new("y"),
        ])))
    }

    /// Strip the timing from a result line.
    fn answer(line: &str) -> &str {
        line.split_once(',').unwrap().1
    }

    #[test]
    fn dispatch() {
        let d = dispatcher();
        let r = d.dispatch("gcd(x^2-y^2,x-y)", 1).unwrap();
        assert_eq!(r.kind, RequestKind::Gcd);
        assert_eq!(answer(&r.line), "x-y");

        let r = d.dispatch("factor(x^2-y^2)", 2).unwrap();
        assert_eq!(r.kind, RequestKind::Factor);
        assert_eq!(answer(&r.line), "1,(x-y)^1,(x+y)^1");

        assert_eq!(answer(&d.dispatch("factor(x^2)", 3).unwrap().line), "1,(x)^2");
        assert_eq!(answer(&d.dispatch("gcd(x,y)", 4).unwrap().line), "1");
    }

    #[test]
    fn errors_carry_line_numbers() {
        let d = dispatcher();
        match d.dispatch("bogus(x)", 7) {
            Err(BenchError::Request {
                line: 7,
                source: RequestError::Unclassified { preview },
            }) => assert_eq!(preview, "bogus(x)"),
            r => panic!("unexpected result {:?}", r),
        }

        assert!(matches!(
            d.dispatch("factor(x+z)", 2),
            Err(BenchError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            d.dispatch("factor(0)", 3),
            Err(BenchError::Engine { line: 3, .. })
        ));
    }

    #[test]
    fn process_stops_at_first_error() {
        let d = dispatcher();
        let input = "gcd(x,y)\r\nfactor(x*y)  \nfoo(x)\ngcd(x,x)\n";
        let mut output = vec![];

        let r = d.process(input.as_bytes(), Path::new("in"), &mut output, Path::new("out"));
        assert!(matches!(r, Err(BenchError::Request { line: 3, .. })));

        let output = String::from_utf8(output).unwrap();
        let answers: Vec<_> = output.lines().map(answer).collect();
        assert_eq!(answers, ["1", "1,(x)^1,(y)^1"]);
    }
}
