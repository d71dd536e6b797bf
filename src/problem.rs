use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::term::Term;
use crate::theorem::Theorem;
use crate::vc::VC;

#[derive(Clone, Debug, Deserialize)]
struct TheoremEntry {
    name: String,
    statement: String,
}

fn default_antecedent() -> String {
    "true".to_string()
}

#[derive(Clone, Debug, Deserialize)]
struct VcEntry {
    name: String,
    #[serde(default = "default_antecedent")]
    antecedent: String,
    consequent: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct ProblemFile {
    theorems: Vec<TheoremEntry>,
    vcs: Vec<VcEntry>,
}

/// A set of theorems and the VCs to prove with them, already parsed.
#[derive(Clone, Debug)]
pub struct Problem {
    theorems: Vec<Theorem>,
    vcs: Vec<VC>,
}

impl Problem {
    /// Parses a json problem. Any statement that fails to parse fails the whole problem.
    pub fn from_json(text: &str) -> Result<Problem> {
        let file: ProblemFile = serde_json::from_str(text)?;
        let theorems = file
            .theorems
            .iter()
            .map(|entry| Theorem::parse(entry.name.as_str(), &entry.statement))
            .collect::<Result<Vec<_>>>()?;
        let vcs = file
            .vcs
            .iter()
            .map(|entry| {
                let antecedent = Term::parse(&entry.antecedent)?;
                let consequent = Term::parse(&entry.consequent)?;
                Ok(VC::from_terms(&entry.name, &antecedent, &consequent))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Problem { theorems, vcs })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Problem> {
        let text = std::fs::read_to_string(path)?;
        Problem::from_json(&text)
    }

    pub fn theorems(&self) -> &[Theorem] {
        &self.theorems
    }

    pub fn vcs(&self) -> &[VC] {
        &self.vcs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_from_json() {
        let problem = Problem::from_json(indoc! {r#"
            {
                "theorems": [
                    {"name": "zero", "statement": "forall x. =(x, +(x, 0))"}
                ],
                "vcs": [
                    {"name": "first", "consequent": "=(+(a, 0), a)"},
                    {"name": "second", "antecedent": "and(p, q)", "consequent": "p"}
                ]
            }
        "#})
        .unwrap();
        assert_eq!(problem.theorems().len(), 1);
        assert_eq!(problem.theorems()[0].name, "zero");
        assert_eq!(problem.vcs().len(), 2);
        assert_eq!(problem.vcs()[0].antecedent().to_term(), Term::truth());
        assert_eq!(problem.vcs()[1].antecedent().len(), 2);
        assert_eq!(problem.vcs()[1].source_name(), "second");
    }

    #[test]
    fn test_bad_statement_is_a_parse_error() {
        let err = Problem::from_json(r#"{"vcs": [{"name": "v", "consequent": "p("}]}"#).unwrap_err();
        assert_eq!(err.error_type(), "Parse");
    }

    #[test]
    fn test_bad_json() {
        let err = Problem::from_json("{ not json").unwrap_err();
        assert_eq!(err.error_type(), "Json");
    }

    #[test]
    fn test_missing_file() {
        let err = Problem::load("/nonexistent/problem.json").unwrap_err();
        assert_eq!(err.error_type(), "Io");
    }
}
