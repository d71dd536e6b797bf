use crate::problem::Problem;
use crate::prover::{ProofResult, Prover, ProverConfig};
use crate::term::Term;
use crate::theorem::{RuleLibrary, Theorem};
use crate::vc::VC;

pub fn vc(antecedent: &str, consequent: &str) -> VC {
    let antecedent = Term::parse(antecedent).expect("bad antecedent");
    let consequent = Term::parse(consequent).expect("bad consequent");
    VC::from_terms("test", &antecedent, &consequent)
}

pub fn library(theorems: &[(&str, &str)], config: &ProverConfig) -> RuleLibrary {
    let theorems: Vec<Theorem> = theorems
        .iter()
        .map(|(name, statement)| Theorem::parse(*name, statement).expect("bad theorem"))
        .collect();
    RuleLibrary::new(&theorems, &config.normalizer_config())
}

// Proves a single VC with the default strategy.
pub fn prove(theorems: &[(&str, &str)], vc: &VC, config: ProverConfig) -> ProofResult {
    let library = library(theorems, &config);
    Prover::new(config, &library).prove(vc)
}

/// Proves every VC in a json problem, in order.
pub fn prove_problem(text: &str, config: ProverConfig) -> Vec<(String, ProofResult)> {
    let problem = Problem::from_json(text).expect("bad problem");
    let library = RuleLibrary::new(problem.theorems(), &config.normalizer_config());
    let mut prover = Prover::new(config, &library);
    problem
        .vcs()
        .iter()
        .map(|vc| (vc.source_name().to_string(), prover.prove(vc)))
        .collect()
}

/// Expects a proof that took exactly these steps.
pub fn expect_steps(result: &ProofResult, expected: &[&str]) {
    let proof = match &result.proof {
        Some(proof) => proof,
        None => panic!("expected a proof, got {}", result.outcome),
    };
    assert_eq!(proof.descriptions(), expected, "proof was:\n{}", proof);
}
