use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[allow(deprecated)]
fn problems() -> Command {
    Command::cargo_bin("polybench-problems").unwrap()
}

#[allow(deprecated)]
fn polybench() -> Command {
    Command::cargo_bin("polybench").unwrap()
}

const SMALL: [&str; 8] = [
    "--nvars", "2", "--max-nterms", "3", "--max-degree", "2", "--max-coeff", "20",
];

#[test]
fn print_variables() {
    problems()
        .args(["generate", "nontrivial-gcd", "--nvars", "3", "--print-variables"])
        .assert()
        .success()
        .stdout("x1,x2,x3\n");
}

#[test]
fn generate_is_deterministic() {
    let run = |seed: &str| {
        let out = problems()
            .args(["generate", "trivial-factor", "--nproblems", "3", "--nwarmups", "1"])
            .args(["--seed", seed])
            .args(SMALL)
            .output()
            .unwrap();
        assert!(out.status.success());
        String::from_utf8(out.stdout).unwrap()
    };

    let a = run("7");
    assert_eq!(a, run("7"));
    assert_ne!(a, run("8"));
    assert_eq!(a.lines().count(), 4);
    assert!(a.lines().all(|l| l.starts_with("factor(") && l.ends_with(')')));
}

#[test]
fn invalid_options() {
    problems()
        .args(["generate", "nontrivial-gcd", "--min-coeff", "5", "--max-coeff", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("min_coeff"));

    problems()
        .args(["generate", "nontrivial-lcm"])
        .assert()
        .failure();
}

#[test]
fn generate_run_and_check() {
    let dir = tempdir().unwrap();

    for problem_type in ["trivial-gcd", "nontrivial-gcd", "nontrivial-factor"] {
        let input = dir.path().join(format!("{}.txt", problem_type));
        let output = dir.path().join(format!("{}.csv", problem_type));

        problems()
            .args(["generate", problem_type, "--nproblems", "4", "--nwarmups", "2", "-o"])
            .arg(&input)
            .args(SMALL)
            .assert()
            .success();

        polybench().arg("x1,x2").arg(&input).arg(&output).assert().success();

        problems()
            .args(["check", "x1,x2"])
            .arg(&input)
            .arg(&output)
            .args(["--nwarmups", "2"])
            .assert()
            .success()
            .stdout(predicate::str::contains("count: 4"));
    }
}

#[test]
fn check_reports_wrong_answers() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.txt");
    let output = dir.path().join("output.csv");
    fs::write(&input, "gcd(x^2-y^2,x-y)\nfactor(x^2-y^2)\n").unwrap();

    fs::write(&output, "0.1,x-y\n0.2,1,(x-y)^1,(x+y)^2\n").unwrap();
    problems()
        .args(["check", "x,y"])
        .arg(&input)
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));

    fs::write(&output, "0.1,x-y\n").unwrap();
    problems()
        .args(["check", "x,y"])
        .arg(&input)
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 lines but the input has 2"));

    fs::write(&output, "0.1,x-y\n0.3,1,(x-y)^1,(x+y)^1\n").unwrap();
    problems()
        .args(["check", "x,y"])
        .arg(&input)
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("count: 2"))
        .stdout(predicate::str::contains("max:   0.3"));
}
