pub mod binder;
pub mod binding;
pub mod chooser;
pub mod conjuncts;
pub mod error;
pub mod fitness;
pub mod metrics;
pub mod parser;
pub mod problem;
pub mod proof;
pub mod prover;
pub mod term;
pub mod theorem;
pub mod transformer;
pub mod vc;

#[cfg(test)]
mod tests;
