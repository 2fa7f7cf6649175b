use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[allow(deprecated)]
fn polybench() -> Command {
    Command::cargo_bin("polybench").unwrap()
}

/// Run the driver on `input` and return the status and the result lines without timings.
fn run(variables: &str, input: &str) -> (bool, Vec<String>) {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("input.txt");
    let output_path = dir.path().join("output.csv");
    fs::write(&input_path, input).unwrap();

    let status = polybench()
        .arg(variables)
        .arg(&input_path)
        .arg(&output_path)
        .output()
        .unwrap()
        .status;

    (status.success(), answers(&output_path))
}

fn answers(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|l| {
            let (time, answer) = l.split_once(',').unwrap();
            assert!(time.parse::<f64>().unwrap() >= 0.);
            answer.to_string()
        })
        .collect()
}

#[test]
fn gcd_and_factor() {
    let input = "gcd(x^2-y^2,x-y)\nfactor(x^2-y^2)\nfactor(x^2)\ngcd(x,y)\n";
    let (success, lines) = run("x,y", input);
    assert!(success);
    assert_eq!(lines, ["x-y", "1,(x-y)^1,(x+y)^1", "1,(x)^2", "1"]);
}

#[test]
fn unit_and_content() {
    let input = "factor(-6*x^2*y+6*y^3)\nfactor(-6)\ngcd(6*x+6*y,4*x+4*y)\n";
    let (success, lines) = run("x,y", input);
    assert!(success);
    assert_eq!(
        lines,
        ["-6,(y)^1,(x-y)^1,(x+y)^1", "-6", "2*x+2*y"]
    );
}

#[test]
fn variable_order() {
    let (success, lines) = run("y,x", "gcd(x^2-y^2,x-y)\nfactor(x^2-y^2)\n");
    assert!(success);
    assert_eq!(lines, ["y-x", "-1,(y-x)^1,(y+x)^1"]);
}

#[test]
fn one_line_per_request() {
    let input: String = (1..=20).map(|i| format!("gcd(x^{}-y^{},x^2-y^2)\n", i, i)).collect();
    let (success, lines) = run("x,y", &input);
    assert!(success);
    assert_eq!(lines.len(), 20);
    for (i, l) in lines.iter().enumerate() {
        let expected = if (i + 1) % 2 == 0 { "x^2-y^2" } else { "x-y" };
        assert_eq!(l, expected);
    }
}

#[test]
fn unknown_request_aborts() {
    let (success, lines) = run("x,y", "gcd(x,y)\nbogus(x)\nfactor(x^2)\n");
    assert!(!success);
    assert_eq!(lines, ["1"]);

    let dir = tempdir().unwrap();
    let input_path = dir.path().join("input.txt");
    fs::write(&input_path, "resultant(x,y)\n").unwrap();
    polybench()
        .arg("x,y")
        .arg(&input_path)
        .arg(dir.path().join("output.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("resultan..."))
        .stderr(predicate::str::contains("resultant(").not());
}

#[test]
fn parse_errors_abort() {
    let (success, lines) = run("x,y", "factor(x)\nfactor(x+z)\n");
    assert!(!success);
    assert_eq!(lines, ["1,(x)^1"]);

    let (success, lines) = run("x,y", "gcd(x/2,y)\n");
    assert!(!success);
    assert!(lines.is_empty());
}

#[test]
fn zero_polynomial_cannot_be_factored() {
    let (success, lines) = run("x,y", "gcd(0,0)\nfactor(x-x)\n");
    assert!(!success);
    assert_eq!(lines, ["0"]);
}

#[test]
fn invalid_arguments() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("input.txt");
    let output_path = dir.path().join("output.csv");
    fs::write(&input_path, "gcd(x,y)\n").unwrap();

    polybench()
        .arg("x,,y")
        .arg(&input_path)
        .arg(&output_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid variable"));
    assert!(!output_path.exists());

    polybench()
        .arg("x,y")
        .arg(dir.path().join("missing.txt"))
        .arg(&output_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.txt"));
    assert!(!output_path.exists());

    polybench().arg("x,y").assert().failure();
}
