use std::time::{Duration, Instant};

use polybench::check::Checker;
use polybench::driver::Dispatcher;
use polybench::engine::{AlgebraEngine, IntegerPolynomialEngine};
use polybench::problems::{ExponentDistribution, PolynomialOptions, ProblemGenerator, ProblemType};

fn options(nvars: usize, max_degree: u32, exp_dist: ExponentDistribution) -> PolynomialOptions {
    PolynomialOptions::new(nvars, Some(1), 4, Some(0), max_degree, None, 50, exp_dist)
}

/// Dense enough that a gcd by pseudo-remainder sequences blows up.
fn large_options() -> PolynomialOptions {
    PolynomialOptions::new(3, Some(8), 10, Some(6), 7, None, 100, ExponentDistribution::Uniform)
}

fn generator(o: PolynomialOptions, seed: u64) -> (ProblemGenerator, IntegerPolynomialEngine) {
    let g = ProblemGenerator::new(o, seed).unwrap();
    let engine = IntegerPolynomialEngine::new(g.get_vars_ref().clone());
    (g, engine)
}

#[test]
fn rendering_round_trip() {
    for seed in 0..10 {
        let (mut g, engine) = generator(options(3, 5, ExponentDistribution::Sharp), seed);

        for _ in 0..10 {
            let p = &g.random_polynomial().unwrap() * &g.random_polynomial().unwrap();
            let text = engine.render(&p);
            assert_eq!(engine.parse(&text).unwrap(), p, "{}", text);
        }
    }
}

fn check_gcd(g: &mut ProblemGenerator, engine: &IntegerPolynomialEngine) {
    let (a, b, common) = (
        g.random_polynomial().unwrap(),
        g.random_polynomial().unwrap(),
        g.random_polynomial().unwrap(),
    );
    let (p, q) = (&a * &common, &b * &common);

    let gcd = engine.gcd(&p, &q).unwrap();
    assert!(p.divides(&gcd).is_some());
    assert!(q.divides(&gcd).is_some());
    assert!(gcd.divides(&common.clone().make_primitive()).is_some());

    // a common unit does not change the gcd
    assert_eq!(engine.gcd(&-p.clone(), &-q.clone()).unwrap(), gcd);
}

#[test]
fn gcd_divides_both_operands() {
    for seed in 0..10 {
        let (mut g, engine) = generator(options(3, 3, ExponentDistribution::Uniform), seed);
        for _ in 0..5 {
            check_gcd(&mut g, &engine);
        }
    }

    for seed in 100..104 {
        let (mut g, engine) = generator(large_options(), seed);
        check_gcd(&mut g, &engine);
    }
}

#[test]
fn large_gcd_is_fast() {
    let (mut g, engine) = generator(large_options(), 2024);
    let (a, b, common) = (
        g.random_polynomial().unwrap(),
        g.random_polynomial().unwrap(),
        g.random_polynomial().unwrap(),
    );
    let (p, q) = (&a * &common, &b * &common);

    let start = Instant::now();
    let gcd = engine.gcd(&p, &q).unwrap();
    let elapsed = start.elapsed();

    assert!(p.divides(&gcd).is_some() && q.divides(&gcd).is_some());
    assert!(gcd.divides(&common.make_primitive()).is_some());
    assert!(elapsed < Duration::from_secs(30), "gcd took {:?}", elapsed);
}

fn check_factorization(g: &mut ProblemGenerator, engine: &IntegerPolynomialEngine) {
    let (a, b) = (g.random_polynomial().unwrap(), g.random_polynomial().unwrap());
    let p = &a * &b;
    let f = engine.factor(&p).unwrap();

    let mut product = p.constant(f.unit.clone());
    for (factor, pow) in &f.factors {
        assert!(!factor.is_constant());
        assert!(*pow > 0);
        product = &product * &factor.pow(*pow);
    }
    assert_eq!(product, p);
}

#[test]
fn factorization_identity() {
    for seed in 0..10 {
        let (mut g, engine) = generator(options(2, 3, ExponentDistribution::Uniform), seed);
        for _ in 0..3 {
            check_factorization(&mut g, &engine);
        }
    }

    for seed in 100..103 {
        let (mut g, engine) = generator(large_options(), seed);
        check_factorization(&mut g, &engine);
    }
}

#[test]
fn generated_problems_check() {
    for (problem_type, nvars) in [
        (ProblemType::TrivialGcd, 3),
        (ProblemType::NontrivialGcd, 3),
        (ProblemType::TrivialFactor, 2),
        (ProblemType::NontrivialFactor, 2),
    ] {
        let (mut g, engine) = generator(options(nvars, 2, ExponentDistribution::Uniform), 42);
        let problems = g.generate(problem_type, 1, 4).unwrap().join("\n");

        let dispatcher = Dispatcher::new(engine.clone());
        let results: Vec<String> = problems
            .lines()
            .enumerate()
            .map(|(i, l)| dispatcher.dispatch(l, i + 1).unwrap().line)
            .collect();

        let checker = Checker::new(engine);
        let summary = checker.check(&problems, &results.join("\n"), 1).unwrap();
        assert_eq!(summary.count, 4);
    }
}
