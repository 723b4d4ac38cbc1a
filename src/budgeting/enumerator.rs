//! K-best enumeration by repeated single solves with exclusion cuts.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::extractor::PortfolioSolution;

/// Where the enumeration stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumeratorState {
    /// Round `round` is next.
    Iterate { round: usize },
    /// The very first round found nothing.
    TerminalEmpty,
    /// `k` solutions were collected.
    TerminalExhausted,
    /// A later round found nothing once the exclusions piled up.
    TerminalInfeasibleGrowth,
}

impl EnumeratorState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EnumeratorState::Iterate { .. })
    }
}

/// Result of a finished enumeration.
#[derive(Debug, Clone)]
pub struct EnumerationOutcome {
    pub solutions: Vec<PortfolioSolution>,
    pub terminal: EnumeratorState,
}

/// Collects up to `k` strictly distinct optima.
///
/// Each round is handed every selection found so far and must return the best
/// selection avoiding all of them, or `None` when there is none. Rounds run
/// strictly one after another.
#[derive(Debug, Clone)]
pub struct KBestEnumerator {
    k: usize,
    state: EnumeratorState,
    found: Vec<PortfolioSolution>,
    exclusions: Vec<BTreeSet<String>>,
}

impl KBestEnumerator {
    pub fn new(k: usize) -> Self {
        let state = if k == 0 {
            EnumeratorState::TerminalExhausted
        } else {
            EnumeratorState::Iterate { round: 0 }
        };
        Self {
            k,
            state,
            found: Vec::new(),
            exclusions: Vec::new(),
        }
    }

    pub fn state(&self) -> EnumeratorState {
        self.state
    }

    pub fn found(&self) -> &[PortfolioSolution] {
        &self.found
    }

    /// Selections every later round must avoid.
    pub fn exclusions(&self) -> &[BTreeSet<String>] {
        &self.exclusions
    }

    /// Advances by one round. A terminal enumerator is left untouched.
    pub fn step<F, E>(&mut self, solve_round: F) -> Result<EnumeratorState, E>
    where
        F: FnOnce(&[BTreeSet<String>]) -> Result<Option<PortfolioSolution>, E>,
    {
        let EnumeratorState::Iterate { round } = self.state else {
            return Ok(self.state);
        };

        let next = match solve_round(&self.exclusions)? {
            None if round == 0 => EnumeratorState::TerminalEmpty,
            None => EnumeratorState::TerminalInfeasibleGrowth,
            Some(solution) => {
                let selection = solution.canonical();
                if self.exclusions.contains(&selection) {
                    warn!(round, "round repeated an excluded selection, stopping");
                    EnumeratorState::TerminalInfeasibleGrowth
                } else {
                    self.found.push(PortfolioSolution {
                        sequence_number: round,
                        ..solution
                    });
                    self.exclusions.push(selection);
                    if round + 1 == self.k {
                        EnumeratorState::TerminalExhausted
                    } else {
                        EnumeratorState::Iterate { round: round + 1 }
                    }
                }
            }
        };

        debug!(round, state = ?next, "enumeration round finished");
        self.state = next;
        Ok(next)
    }

    /// Runs rounds until a terminal state is reached.
    pub fn run<F, E>(mut self, mut solve_round: F) -> Result<EnumerationOutcome, E>
    where
        F: FnMut(&[BTreeSet<String>]) -> Result<Option<PortfolioSolution>, E>,
    {
        while !self.state.is_terminal() {
            self.step(&mut solve_round)?;
        }
        Ok(EnumerationOutcome {
            solutions: self.found,
            terminal: self.state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budgeting::orchestrator::SolveStatus;
    use std::convert::Infallible;

    fn solution(ids: &[&str], objective: f64) -> PortfolioSolution {
        PortfolioSolution {
            sequence_number: 0,
            selected_ids: ids.iter().map(|s| s.to_string()).collect(),
            objective_value: objective,
            status: SolveStatus::Optimal,
        }
    }

    /// Hands out the best of a fixed ranking that is not yet excluded.
    fn ranked(
        ranking: Vec<PortfolioSolution>,
    ) -> impl FnMut(&[BTreeSet<String>]) -> Result<Option<PortfolioSolution>, Infallible> {
        move |excluded| {
            Ok(ranking
                .iter()
                .find(|s| !excluded.contains(&s.canonical()))
                .cloned())
        }
    }

    #[test]
    fn collects_k_distinct_and_relabels() {
        let ranking = vec![
            solution(&["A", "B"], 10.0),
            solution(&["A"], 7.0),
            solution(&["B"], 5.0),
            solution(&[], 0.0),
        ];
        let outcome = KBestEnumerator::new(3).run(ranked(ranking)).unwrap();
        assert_eq!(outcome.terminal, EnumeratorState::TerminalExhausted);
        let numbers: Vec<usize> = outcome.solutions.iter().map(|s| s.sequence_number).collect();
        assert_eq!(numbers, vec![0, 1, 2]);
        assert_eq!(outcome.solutions[2].selected_ids, vec!["B"]);
    }

    #[test]
    fn stops_when_space_is_exhausted() {
        let ranking = vec![solution(&["A"], 3.0), solution(&[], 0.0)];
        let outcome = KBestEnumerator::new(5).run(ranked(ranking)).unwrap();
        assert_eq!(outcome.terminal, EnumeratorState::TerminalInfeasibleGrowth);
        assert_eq!(outcome.solutions.len(), 2);
    }

    #[test]
    fn empty_first_round() {
        let outcome = KBestEnumerator::new(3).run(ranked(Vec::new())).unwrap();
        assert_eq!(outcome.terminal, EnumeratorState::TerminalEmpty);
        assert!(outcome.solutions.is_empty());
    }

    #[test]
    fn zero_k_never_solves() {
        let outcome = KBestEnumerator::new(0)
            .run(|_| -> Result<Option<PortfolioSolution>, Infallible> {
                panic!("no round expected")
            })
            .unwrap();
        assert_eq!(outcome.terminal, EnumeratorState::TerminalExhausted);
    }

    #[test]
    fn each_round_sees_all_previous_selections() {
        let mut enumerator = KBestEnumerator::new(3);
        enumerator
            .step(|excluded| -> Result<_, Infallible> {
                assert!(excluded.is_empty());
                Ok(Some(solution(&["A"], 1.0)))
            })
            .unwrap();
        let state = enumerator
            .step(|excluded| -> Result<_, Infallible> {
                assert_eq!(excluded.len(), 1);
                assert!(excluded[0].contains("A"));
                Ok(Some(solution(&["B"], 1.0)))
            })
            .unwrap();
        assert_eq!(state, EnumeratorState::Iterate { round: 2 });
        assert_eq!(enumerator.exclusions().len(), 2);
    }

    #[test]
    fn repeated_selection_ends_enumeration() {
        let outcome = KBestEnumerator::new(4)
            .run(|_| -> Result<_, Infallible> { Ok(Some(solution(&["A"], 1.0))) })
            .unwrap();
        assert_eq!(outcome.solutions.len(), 1);
        assert_eq!(outcome.terminal, EnumeratorState::TerminalInfeasibleGrowth);
    }

    #[test]
    fn errors_propagate() {
        let result = KBestEnumerator::new(2).run(|_| Err::<Option<PortfolioSolution>, _>("boom"));
        assert_eq!(result.unwrap_err(), "boom");
    }

    #[test]
    fn terminal_step_is_a_no_op() {
        let mut enumerator = KBestEnumerator::new(1);
        enumerator
            .step(|_| -> Result<_, Infallible> { Ok(Some(solution(&["A"], 1.0))) })
            .unwrap();
        let state = enumerator
            .step(|_| -> Result<_, Infallible> { panic!("terminal enumerator solved again") })
            .unwrap();
        assert_eq!(state, EnumeratorState::TerminalExhausted);
        assert_eq!(enumerator.found().len(), 1);
    }
}
