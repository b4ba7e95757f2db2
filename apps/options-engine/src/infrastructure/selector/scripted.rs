//! Selector that replays a fixed script of answers.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::application::ports::{SelectorError, StrategySelectorPort};
use crate::domain::{MarketSnapshot, OptionChain, StrategyProposal};

type Answer = Result<Option<StrategyProposal>, SelectorError>;

/// Answers `propose` calls from a queue; `None` once the queue is drained.
#[derive(Debug, Default)]
pub struct ScriptedSelector {
    answers: Mutex<VecDeque<Answer>>,
}

impl ScriptedSelector {
    /// Script of proposals, one per call.
    #[must_use]
    pub fn new(proposals: impl IntoIterator<Item = StrategyProposal>) -> Self {
        Self {
            answers: Mutex::new(proposals.into_iter().map(|p| Ok(Some(p))).collect()),
        }
    }

    /// Queue a proposal.
    pub fn push(&self, proposal: Option<StrategyProposal>) {
        self.lock().push_back(Ok(proposal));
    }

    /// Queue a failure.
    pub fn push_failure(&self, error: SelectorError) {
        self.lock().push_back(Err(error));
    }

    /// Answers not yet handed out.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.lock().len()
    }

    /// Next answer, synchronously.
    pub fn next_answer(&self) -> Answer {
        self.lock().pop_front().unwrap_or(Ok(None))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Answer>> {
        self.answers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl StrategySelectorPort for ScriptedSelector {
    async fn propose(
        &self,
        _snapshot: &MarketSnapshot,
        _chain: Option<&OptionChain>,
    ) -> Result<Option<StrategyProposal>, SelectorError> {
        self.next_answer()
    }
}
