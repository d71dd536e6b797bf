use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::metrics::Metrics;
use crate::prover::{Outcome, Prover, ProverConfig};
use crate::term::Term;
use crate::tests::common::{expect_steps, library, prove, vc};

const ADD_ZERO: (&str, &str) = ("add_zero", "forall x. =(x, +(x, 0))");

const LESS_THAN: (&str, &str) = (
    "lt",
    "forall i, j, k. implies(and(>(i, 0), <=(+(i, j), k)), <(j, k))",
);

const COMMUTE: (&str, &str) = ("commute", "forall x, y. =(+(x, y), +(y, x))");

const ASSOCIATE: (&str, &str) = (
    "associate",
    "forall x, y, z. =(+(+(x, y), z), +(x, +(y, z)))",
);

#[test]
fn test_true_is_proved_by_simplification_alone() {
    let result = prove(&[], &vc("true", "true"), ProverConfig::default());
    assert_eq!(result.outcome, Outcome::Proved);
    expect_steps(&result, &[]);
    assert_eq!(result.metrics.proofs_considered, 1);
    assert_eq!(result.metrics.rule_tries, 0);
}

#[test]
fn test_add_zero_takes_one_step() {
    let result = prove(&[ADD_ZERO], &vc("true", "=(+(a, 0), a)"), ProverConfig::default());
    assert_eq!(result.outcome, Outcome::Proved);
    expect_steps(&result, &["substitute in consequent add_zero: +(@x, 0) => @x"]);
}

#[test]
fn test_develop_antecedent_from_local_facts() {
    let result = prove(
        &[LESS_THAN],
        &vc("and(>(a, 0), <=(+(a, b), c))", "<(b, c)"),
        ProverConfig::default(),
    );
    assert_eq!(result.outcome, Outcome::Proved);
    let proof = result.proof.unwrap();
    assert_eq!(proof.len(), 1);
    assert!(proof.steps()[0].description.starts_with("develop antecedent lt:"));
    assert!(proof.steps()[0]
        .vc
        .antecedent()
        .iter()
        .any(|fact| fact.to_string() == "<(b, c)"));
}

#[test]
fn test_develop_antecedent_rejects_global_only_matches() {
    // The same facts, but as background theorems rather than antecedent conjuncts.
    let result = prove(
        &[LESS_THAN, ("positive", ">(a, 0)"), ("bounded", "<=(+(a, b), c)")],
        &vc("true", "<(b, c)"),
        ProverConfig::default(),
    );
    assert_eq!(result.outcome, Outcome::Exhausted);
    assert!(result.proof.is_none());
}

#[test]
fn test_existential_witness_from_antecedent() {
    let result = prove(
        &[],
        &vc("and(<(0, n), p(n))", "exists y. and(<(0, y), p(y))"),
        ProverConfig::default(),
    );
    assert_eq!(result.outcome, Outcome::Proved);
    expect_steps(&result, &["existential instantiation"]);
}

#[test]
fn test_local_equality_is_used_as_a_rule() {
    let result = prove(&[], &vc("and(=(a, b), p(b))", "p(a)"), ProverConfig::default());
    assert_eq!(result.outcome, Outcome::Proved);
    let proof = result.proof.unwrap();
    assert_eq!(proof.steps()[0].notes, vec!["local theorem"]);

    let config = ProverConfig {
        local_theorems: false,
        ..ProverConfig::default()
    };
    let result = prove(&[], &vc("and(=(a, b), p(b))", "p(a)"), config);
    assert_eq!(result.outcome, Outcome::Exhausted);
}

#[test]
fn test_inconsistent_antecedent_is_reported() {
    let result = prove(&[], &vc("and(p, not(p))", "q"), ProverConfig::default());
    assert_eq!(result.outcome, Outcome::Inconsistent);
}

#[test]
fn test_rewriting_back_and_forth_is_a_cycle() {
    let result = prove(&[("ab", "=(a, b)")], &vc("true", "p(a)"), ProverConfig::default());
    assert_eq!(result.outcome, Outcome::Exhausted);
    assert!(result.metrics.backtracks > 0);
}

#[test]
fn test_rewrite_that_changes_nothing_is_not_explored() {
    let result = prove(&[("aa", "=(a, a)")], &vc("true", "p(a)"), ProverConfig::default());
    assert_eq!(result.outcome, Outcome::Exhausted);
    assert!(result.metrics.rule_tries > 0);
    assert_eq!(result.metrics.backtracks, 0);
    assert_eq!(result.metrics.proofs_considered, 1);
}

#[test]
fn test_depth_tether() {
    let chain = [("one", "=(s1, s2)"), ("two", "=(s2, s3)"), ("three", "=(s3, true)")];
    let shallow = ProverConfig {
        max_depth: 2,
        ..ProverConfig::default()
    };
    let result = prove(&chain, &vc("true", "s1"), shallow);
    assert_eq!(result.outcome, Outcome::Exhausted);
    assert!(result.metrics.max_depth_reached <= 2);

    let deep_enough = ProverConfig {
        max_depth: 3,
        ..ProverConfig::default()
    };
    let result = prove(&chain, &vc("true", "s1"), deep_enough);
    assert_eq!(result.outcome, Outcome::Proved);
    assert_eq!(result.proof.unwrap().len(), 3);
}

fn hopeless() -> crate::vc::VC {
    vc("true", "=(+(+(a, b), c), d)")
}

#[test]
fn test_cancellation_stops_early() {
    let config = ProverConfig {
        max_depth: 3,
        ..ProverConfig::default()
    };
    let library = library(&[COMMUTE, ASSOCIATE], &config);

    let full = Prover::new(config.clone(), &library).prove(&hopeless());
    assert_eq!(full.outcome, Outcome::Exhausted);

    // Cancel as soon as the first top-level step has been explored.
    let token = CancellationToken::new();
    let canceller = token.clone();
    let reports = Rc::new(Cell::new(0));
    let counter = reports.clone();
    let mut metrics = Metrics::new()
        .with_cancellation(token)
        .with_progress(move |_| {
            counter.set(counter.get() + 1);
            canceller.cancel();
        });
    let cancelled = Prover::new(config, &library).prove_with(&hopeless(), &mut metrics);

    assert_eq!(cancelled.outcome, Outcome::Interrupted);
    assert!(cancelled.outcome.is_unable());
    assert!(cancelled.proof.is_none());
    assert_eq!(reports.get(), 1);
    assert!(cancelled.metrics.proofs_considered < full.metrics.proofs_considered);
}

#[test]
fn test_timeout() {
    let config = ProverConfig {
        max_depth: 40,
        timeout: Some(Duration::from_millis(50)),
        ..ProverConfig::default()
    };
    let result = prove(&[COMMUTE, ASSOCIATE], &hopeless(), config);
    assert_eq!(result.outcome, Outcome::Timeout);
    assert!(result.metrics.proofs_considered > 0);
}

#[test]
fn test_cancelled_before_starting() {
    let config = ProverConfig::default();
    let library = library(&[COMMUTE, ASSOCIATE], &config);
    let mut prover = Prover::new(config, &library);

    let token = CancellationToken::new();
    token.cancel();
    let mut metrics = Metrics::new().with_cancellation(token.clone());
    let result = prover.prove_with(&vc("true", "true"), &mut metrics);
    assert_eq!(result.outcome, Outcome::Proved);
    expect_steps(&result, &[]);

    let mut metrics = Metrics::new().with_cancellation(token);
    let result = prover.prove_with(&hopeless(), &mut metrics);
    assert_eq!(result.outcome, Outcome::Interrupted);
    assert_eq!(result.metrics.proofs_considered, 1);
    assert_eq!(result.metrics.rule_tries, 0);
}

#[test]
fn test_timeout_cuts_batch_development_short() {
    let facts: Vec<Term> = (0..60)
        .map(|i| Term::parse(&format!("p(c{})", i)).unwrap())
        .collect();
    let antecedent = Term::conjoin(facts).to_string();
    let config = ProverConfig {
        develop_rounds: 1,
        timeout: Some(Duration::from_millis(10)),
        ..ProverConfig::default()
    };

    let start = Instant::now();
    let result = prove(
        &[("triple", "forall x, y, z. implies(and(p(x), and(p(y), p(z))), q(x))")],
        &vc(&antecedent, "r(c0)"),
        config,
    );
    assert_eq!(result.outcome, Outcome::Timeout);
    assert!(result.proof.is_none());
    assert!(start.elapsed() < Duration::from_secs(2));
}
