use im::{HashMap, Vector};

use crate::vc::VC;

/// Identifies one strategy inside a composed pipeline, so it can keep private state in ProofData.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrategyToken(u32);

/// Hands out strategy tokens. Whoever assembles a pipeline owns one.
#[derive(Debug, Default)]
pub struct TokenSource {
    next: u32,
}

impl TokenSource {
    pub fn new() -> TokenSource {
        TokenSource::default()
    }

    pub fn issue(&mut self) -> StrategyToken {
        let token = StrategyToken(self.next);
        self.next += 1;
        token
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attribute {
    Flag(bool),
    Count(usize),
}

/// What the search remembers about the current proof path.
/// Persistent: each step down the path gets its own copy, and siblings never see each other's.
#[derive(Clone, Debug, Default)]
pub struct ProofData {
    path: Vector<VC>,
    attributes: HashMap<(StrategyToken, &'static str), Attribute>,
}

impl ProofData {
    pub fn new() -> ProofData {
        ProofData::default()
    }

    /// The VCs visited on the way here, oldest first.
    pub fn path(&self) -> &Vector<VC> {
        &self.path
    }

    pub fn push(&self, vc: VC) -> ProofData {
        let mut answer = self.clone();
        answer.path.push_back(vc);
        answer
    }

    pub fn visited(&self, vc: &VC) -> bool {
        self.path.iter().any(|seen| seen.equivalent(vc))
    }

    pub fn attribute(&self, token: StrategyToken, key: &'static str) -> Option<Attribute> {
        self.attributes.get(&(token, key)).copied()
    }

    pub fn with_attribute(
        &self,
        token: StrategyToken,
        key: &'static str,
        value: Attribute,
    ) -> ProofData {
        let mut answer = self.clone();
        answer.attributes.insert((token, key), value);
        answer
    }

    /// A missing flag reads as false.
    pub fn flag(&self, token: StrategyToken, key: &'static str) -> bool {
        matches!(self.attribute(token, key), Some(Attribute::Flag(true)))
    }

    pub fn with_flag(&self, token: StrategyToken, key: &'static str) -> ProofData {
        self.with_attribute(token, key, Attribute::Flag(true))
    }
}
