use std::iter;
use std::rc::Rc;

use tracing::debug;

use crate::chooser::{Chooser, ProofData, StrategyToken, Suggestion};
use crate::metrics::Metrics;
use crate::transformer::{simplified, NoBacktrack, Simplify, Singleton, Transformer};
use crate::vc::VC;

/// Suggests a fixed list of transformers, in order.
pub struct ListChooser {
    transformers: Vec<Rc<dyn Transformer>>,
}

impl ListChooser {
    pub fn new(transformers: Vec<Rc<dyn Transformer>>) -> ListChooser {
        ListChooser { transformers }
    }
}

impl Chooser for ListChooser {
    fn suggest<'a>(
        &'a self,
        _vc: &'a VC,
        _depth: usize,
        _metrics: &mut Metrics,
        data: &ProofData,
    ) -> Box<dyn Iterator<Item = Suggestion> + 'a> {
        let data = data.clone();
        Box::new(
            self.transformers
                .iter()
                .map(move |transformer| Suggestion::new(transformer.clone(), data.clone())),
        )
    }
}

/// Everything the first chooser suggests, then everything the next one does.
pub struct Concatenation {
    children: Vec<Box<dyn Chooser>>,
}

impl Concatenation {
    pub fn new(children: Vec<Box<dyn Chooser>>) -> Concatenation {
        Concatenation { children }
    }
}

impl Chooser for Concatenation {
    fn suggest<'a>(
        &'a self,
        vc: &'a VC,
        depth: usize,
        metrics: &mut Metrics,
        data: &ProofData,
    ) -> Box<dyn Iterator<Item = Suggestion> + 'a> {
        let parts: Vec<_> = self
            .children
            .iter()
            .map(|child| child.suggest(vc, depth, metrics, data))
            .collect();
        Box::new(parts.into_iter().flatten())
    }

    fn preoptimize(&mut self, vc: &VC) {
        for child in &mut self.children {
            child.preoptimize(vc);
        }
    }
}

/// Refuses to go on from a VC that is already on the current path.
pub struct CycleDetector {
    inner: Box<dyn Chooser>,
}

impl CycleDetector {
    pub fn new(inner: Box<dyn Chooser>) -> CycleDetector {
        CycleDetector { inner }
    }
}

impl Chooser for CycleDetector {
    fn suggest<'a>(
        &'a self,
        vc: &'a VC,
        depth: usize,
        metrics: &mut Metrics,
        data: &ProofData,
    ) -> Box<dyn Iterator<Item = Suggestion> + 'a> {
        if data.visited(vc) {
            metrics.backtracks += 1;
            debug!(depth, vc = %vc.name(), "cycle detected, backtracking");
            return Box::new(iter::empty());
        }
        let data = data.push(vc.clone());
        self.inner.suggest(vc, depth, metrics, &data)
    }

    fn preoptimize(&mut self, vc: &VC) {
        self.inner.preoptimize(vc);
    }
}

/// Suggests nothing at or past the maximum depth.
pub struct DepthTether {
    inner: Box<dyn Chooser>,
    max_depth: usize,
}

impl DepthTether {
    pub fn new(inner: Box<dyn Chooser>, max_depth: usize) -> DepthTether {
        DepthTether { inner, max_depth }
    }
}

impl Chooser for DepthTether {
    fn suggest<'a>(
        &'a self,
        vc: &'a VC,
        depth: usize,
        metrics: &mut Metrics,
        data: &ProofData,
    ) -> Box<dyn Iterator<Item = Suggestion> + 'a> {
        if depth >= self.max_depth {
            return Box::new(iter::empty());
        }
        self.inner.suggest(vc, depth, metrics, data)
    }

    fn preoptimize(&mut self, vc: &VC) {
        self.inner.preoptimize(vc);
    }
}

/// From the minimum depth on, every other ply is a simplification pass.
/// When simplifying would not change anything, that ply goes to the inner chooser instead.
pub struct SimplifyInterleave {
    inner: Box<dyn Chooser>,
    min_depth: usize,
    simplify: Rc<dyn Transformer>,
}

impl SimplifyInterleave {
    pub fn new(inner: Box<dyn Chooser>, min_depth: usize) -> SimplifyInterleave {
        SimplifyInterleave {
            inner,
            min_depth,
            simplify: Rc::new(Singleton::new(Rc::new(Simplify))),
        }
    }
}

impl Chooser for SimplifyInterleave {
    fn suggest<'a>(
        &'a self,
        vc: &'a VC,
        depth: usize,
        metrics: &mut Metrics,
        data: &ProofData,
    ) -> Box<dyn Iterator<Item = Suggestion> + 'a> {
        let simplifying_ply = depth >= self.min_depth && (depth - self.min_depth) % 2 == 0;
        if simplifying_ply && simplified(vc).is_some() {
            let suggestion = Suggestion::new(self.simplify.clone(), data.clone());
            return Box::new(iter::once(suggestion));
        }
        self.inner.suggest(vc, depth, metrics, data)
    }

    fn preoptimize(&mut self, vc: &VC) {
        self.inner.preoptimize(vc);
    }
}

/// Makes every suggested step irrevocable: only its first real change is explored.
pub struct NoBacktrackChooser {
    inner: Box<dyn Chooser>,
}

impl NoBacktrackChooser {
    pub fn new(inner: Box<dyn Chooser>) -> NoBacktrackChooser {
        NoBacktrackChooser { inner }
    }
}

impl Chooser for NoBacktrackChooser {
    fn suggest<'a>(
        &'a self,
        vc: &'a VC,
        depth: usize,
        metrics: &mut Metrics,
        data: &ProofData,
    ) -> Box<dyn Iterator<Item = Suggestion> + 'a> {
        Box::new(
            self.inner
                .suggest(vc, depth, metrics, data)
                .map(|suggestion| Suggestion {
                    transformer: Rc::new(NoBacktrack::new(suggestion.transformer)),
                    ..suggestion
                }),
        )
    }

    fn preoptimize(&mut self, vc: &VC) {
        self.inner.preoptimize(vc);
    }
}

const AFTER_TAKEN: &str = "after taken";

/// Offers the first chooser's steps until the second chooser has contributed a step to the
/// current path. From then on, only the second chooser is asked.
pub struct OnlyBefore {
    before: Box<dyn Chooser>,
    after: Box<dyn Chooser>,
    token: StrategyToken,
}

impl OnlyBefore {
    pub fn new(before: Box<dyn Chooser>, after: Box<dyn Chooser>, token: StrategyToken) -> OnlyBefore {
        OnlyBefore {
            before,
            after,
            token,
        }
    }
}

impl Chooser for OnlyBefore {
    fn suggest<'a>(
        &'a self,
        vc: &'a VC,
        depth: usize,
        metrics: &mut Metrics,
        data: &ProofData,
    ) -> Box<dyn Iterator<Item = Suggestion> + 'a> {
        if data.flag(self.token, AFTER_TAKEN) {
            return self.after.suggest(vc, depth, metrics, data);
        }
        let before = self.before.suggest(vc, depth, metrics, data);
        let flagged = data.with_flag(self.token, AFTER_TAKEN);
        let after = self.after.suggest(vc, depth, metrics, &flagged);
        Box::new(before.chain(after))
    }

    fn preoptimize(&mut self, vc: &VC) {
        self.before.preoptimize(vc);
        self.after.preoptimize(vc);
    }
}

const FIRST_TAKEN: &str = "first taken";

/// Tries a fixed step as the first move on every path, then leaves the rest to the inner chooser.
pub struct FixedFirstStep {
    step: Rc<dyn Transformer>,
    inner: Box<dyn Chooser>,
    token: StrategyToken,
}

impl FixedFirstStep {
    pub fn new(
        step: Rc<dyn Transformer>,
        inner: Box<dyn Chooser>,
        token: StrategyToken,
    ) -> FixedFirstStep {
        FixedFirstStep { step, inner, token }
    }
}

impl Chooser for FixedFirstStep {
    fn suggest<'a>(
        &'a self,
        vc: &'a VC,
        depth: usize,
        metrics: &mut Metrics,
        data: &ProofData,
    ) -> Box<dyn Iterator<Item = Suggestion> + 'a> {
        if data.flag(self.token, FIRST_TAKEN) {
            return self.inner.suggest(vc, depth, metrics, data);
        }
        let flagged = data.with_flag(self.token, FIRST_TAKEN);
        let forced = Suggestion::new(self.step.clone(), flagged.clone()).with_note("first step");
        let rest = self.inner.suggest(vc, depth, metrics, &flagged);
        Box::new(iter::once(forced).chain(rest))
    }

    fn preoptimize(&mut self, vc: &VC) {
        self.inner.preoptimize(vc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chooser::TokenSource;
    use crate::term::Term;
    use crate::transformer::SubstituteInConsequent;

    fn t(s: &str) -> Term {
        Term::parse(s).unwrap()
    }

    fn vc(antecedent: &str, consequent: &str) -> VC {
        VC::from_terms("test", &t(antecedent), &t(consequent))
    }

    fn rule(from: &str, to: &str) -> Rc<dyn Transformer> {
        Rc::new(SubstituteInConsequent::new(from, t(from), t(to)))
    }

    fn list(rules: &[(&str, &str)]) -> Box<dyn Chooser> {
        Box::new(ListChooser::new(
            rules.iter().map(|(from, to)| rule(from, to)).collect(),
        ))
    }

    fn suggest(chooser: &dyn Chooser, vc: &VC, depth: usize, data: &ProofData) -> Vec<Suggestion> {
        let mut metrics = Metrics::new();
        chooser.suggest(vc, depth, &mut metrics, data).collect()
    }

    fn names(suggestions: &[Suggestion]) -> Vec<String> {
        suggestions.iter().map(|s| s.transformer.key()).collect()
    }

    #[test]
    fn test_concatenation_keeps_order() {
        let chooser = Concatenation::new(vec![list(&[("a", "b"), ("c", "d")]), list(&[("e", "f")])]);
        let suggestions = suggest(&chooser, &vc("true", "p"), 0, &ProofData::new());
        assert_eq!(
            names(&suggestions),
            vec![
                "substitute in consequent a: a => b",
                "substitute in consequent c: c => d",
                "substitute in consequent e: e => f",
            ]
        );
    }

    #[test]
    fn test_cycle_detector_suppresses_repeats() {
        let chooser = CycleDetector::new(list(&[("a", "b")]));
        let mut metrics = Metrics::new();
        let start = vc("true", "p(a)");
        let suggestions: Vec<Suggestion> = chooser
            .suggest(&start, 0, &mut metrics, &ProofData::new())
            .collect();
        assert_eq!(suggestions.len(), 1);
        assert!(suggestions[0].data.visited(&start));

        let again: Vec<Suggestion> = chooser
            .suggest(&start, 1, &mut metrics, &suggestions[0].data)
            .collect();
        assert!(again.is_empty());
        assert_eq!(metrics.backtracks, 1);
    }

    #[test]
    fn test_depth_tether() {
        let chooser = DepthTether::new(list(&[("a", "b")]), 2);
        let data = ProofData::new();
        assert_eq!(suggest(&chooser, &vc("true", "p"), 1, &data).len(), 1);
        assert!(suggest(&chooser, &vc("true", "p"), 2, &data).is_empty());
        assert!(suggest(&chooser, &vc("true", "p"), 3, &data).is_empty());
    }

    #[test]
    fn test_simplify_interleave() {
        let chooser = SimplifyInterleave::new(list(&[("a", "b")]), 1);
        let data = ProofData::new();
        let messy = vc("true", "and(p, p)");
        let clean = vc("p", "q");
        assert_eq!(names(&suggest(&chooser, &messy, 0, &data)), vec!["substitute in consequent a: a => b"]);
        assert_eq!(names(&suggest(&chooser, &messy, 1, &data)), vec!["simplify"]);
        assert_eq!(names(&suggest(&chooser, &messy, 2, &data)), vec!["substitute in consequent a: a => b"]);
        assert_eq!(names(&suggest(&chooser, &messy, 3, &data)), vec!["simplify"]);
        assert_eq!(names(&suggest(&chooser, &clean, 1, &data)), vec!["substitute in consequent a: a => b"]);
    }

    #[test]
    fn test_no_backtrack_chooser_wraps_steps() {
        let chooser = NoBacktrackChooser::new(list(&[("a", "b")]));
        let input = vc("true", "and(p(a), q(a))");
        let suggestions = suggest(&chooser, &input, 0, &ProofData::new());
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].transformer.transform(&input).count(), 1);
    }

    #[test]
    fn test_only_before_switches_for_good() {
        let mut tokens = TokenSource::new();
        let chooser = OnlyBefore::new(list(&[("a", "b")]), list(&[("c", "d")]), tokens.issue());
        let suggestions = suggest(&chooser, &vc("true", "p"), 0, &ProofData::new());
        assert_eq!(
            names(&suggestions),
            vec!["substitute in consequent a: a => b", "substitute in consequent c: c => d"]
        );

        // Following the first chooser's step keeps both on offer.
        let later = suggest(&chooser, &vc("true", "p"), 1, &suggestions[0].data);
        assert_eq!(later.len(), 2);

        // Following the second chooser's step leaves only the second.
        let later = suggest(&chooser, &vc("true", "p"), 1, &suggestions[1].data);
        assert_eq!(names(&later), vec!["substitute in consequent c: c => d"]);
    }

    #[test]
    fn test_fixed_first_step() {
        let mut tokens = TokenSource::new();
        let chooser = FixedFirstStep::new(rule("x", "y"), list(&[("a", "b")]), tokens.issue());
        let suggestions = suggest(&chooser, &vc("true", "p"), 0, &ProofData::new());
        assert_eq!(
            names(&suggestions),
            vec!["substitute in consequent x: x => y", "substitute in consequent a: a => b"]
        );
        assert_eq!(suggestions[0].notes, vec!["first step"]);

        let later = suggest(&chooser, &vc("true", "p"), 1, &suggestions[0].data);
        assert_eq!(names(&later), vec!["substitute in consequent a: a => b"]);
    }
}
