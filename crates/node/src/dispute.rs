//! The ten-way bisection dispute, as pure step functions.
//!
//! The contract holds the authoritative status: odd means the submitter owes
//! a ten-way division of the disputed range, even (≥ 2) means the challenger
//! owes a pick, 11 is terminal. Both sides poll and feed the observed
//! [`ChallengeInfo`] into their step function; the returned action is the one
//! contract call (or wait) to make. Keeping the transition logic free of I/O
//! is what makes the five-round termination property testable.

use crate::NodeError;
use kahu_contract::ChallengeInfo;
use kahu_kzg::{fold_commitments, Commitment};

/// Terminal status: the disputed range is a single blob and the contract has
/// adjudicated on-chain.
pub const TERMINAL_STATUS: u8 = 11;

/// Validates that a challenge-set width is 10^k with 1 <= k <= 5, returning k.
///
/// The ten-way partition must be exact at every level, so any other width is
/// rejected at startup.
pub fn power_of_ten(n: u64) -> Result<u32, NodeError> {
    let mut k = 0u32;
    let mut rest = n;
    while rest >= 10 && rest % 10 == 0 {
        rest /= 10;
        k += 1;
    }
    if rest != 1 || k == 0 || k > 5 {
        return Err(NodeError::StatePrecondition(format!(
            "challenge-set width must be a power of ten in 10..=100000, got {n}"
        )));
    }
    Ok(k)
}

/// What the responding submitter should do after observing the dispute state.
#[derive(Clone, Debug)]
pub enum ResponderAction {
    /// Not our turn yet; poll again.
    Wait,
    /// No dispute is open, or it reached the terminal state.
    Done,
    /// Our response window lapsed; close the dispute against ourselves.
    Concede,
    /// Post this division. `is_final` when each entry is a single blob.
    Post {
        /// Ten aggregate commitments (or ten single blobs when final).
        divided: [Commitment; 10],
        /// Whether the contract should adjudicate on-chain now.
        is_final: bool,
    },
}

/// Submitter side of a dispute over one cycle's selected commitments.
#[derive(Clone, Debug)]
pub struct Responder {
    scope: Vec<Commitment>,
    splits: Option<[Vec<Commitment>; 10]>,
}

impl Responder {
    /// Starts from the full selected commitment list of the disputed cycle.
    pub fn new(scope: Vec<Commitment>) -> Self {
        Self {
            scope,
            splits: None,
        }
    }

    /// One poll tick.
    pub fn step(
        &mut self,
        info: &ChallengeInfo,
        now: i64,
        last: i64,
        respond_time: i64,
    ) -> ResponderAction {
        if info.status == TERMINAL_STATUS {
            return ResponderAction::Done;
        }
        if info.status % 2 == 0 {
            if now > last + respond_time * i64::from(info.status + 1) {
                return if info.status != 0 {
                    ResponderAction::Concede
                } else {
                    ResponderAction::Done
                };
            }
            return ResponderAction::Wait;
        }

        // Our turn: descend into the picked tenth, then divide again.
        if info.status != 1 {
            if let Some(splits) = self.splits.take() {
                let index = usize::from(info.chal_index).min(9);
                self.scope = splits.into_iter().nth(index).expect("ten splits");
            }
        }

        let split_len = self.scope.len() / 10;
        if split_len <= 1 {
            let mut divided = [Commitment::zero(); 10];
            for (slot, c) in divided.iter_mut().zip(self.scope.iter()) {
                *slot = *c;
            }
            return ResponderAction::Post {
                divided,
                is_final: true,
            };
        }

        let mut divided = [Commitment::zero(); 10];
        let mut splits: [Vec<Commitment>; 10] = Default::default();
        for i in 0..10 {
            let part = self.scope[i * split_len..(i + 1) * split_len].to_vec();
            divided[i] = fold_commitments(&part);
            splits[i] = part;
        }
        self.splits = Some(splits);
        ResponderAction::Post {
            divided,
            is_final: false,
        }
    }
}

/// What the disputing challenger should do after observing the dispute state.
#[derive(Clone, Debug)]
pub enum ChallengerAction {
    /// Not our turn yet; poll again.
    Wait,
    /// The submitter failed to divide in time; close the dispute and win.
    TimeoutWin,
    /// Terminal state reached; query the adjudication result.
    Terminal,
    /// Dispute the `index`-th tenth of the current range.
    Descend {
        /// Sub-range to dispute next.
        index: u8,
    },
}

/// Challenger side of a dispute, narrowing its locally recomputed list.
#[derive(Clone, Debug)]
pub struct Narrower {
    scope: Vec<Commitment>,
}

impl Narrower {
    /// Starts from the challenger's own recomputation of the selected set.
    pub fn new(scope: Vec<Commitment>) -> Self {
        Self { scope }
    }

    /// One poll tick.
    pub fn step(
        &mut self,
        info: &ChallengeInfo,
        now: i64,
        last: i64,
        respond_time: i64,
    ) -> ChallengerAction {
        if info.status == TERMINAL_STATUS {
            return ChallengerAction::Terminal;
        }
        if info.status % 2 == 1 {
            if now > last + respond_time * i64::from(info.status + 1) {
                return ChallengerAction::TimeoutWin;
            }
            return ChallengerAction::Wait;
        }
        if info.status == 0 {
            return ChallengerAction::Wait;
        }

        let split_len = self.scope.len() / 10;
        if split_len == 0 {
            return ChallengerAction::Wait;
        }
        for (index, posted) in info.divided_cn.iter().enumerate() {
            let part = &self.scope[split_len * index..split_len * (index + 1)];
            if fold_commitments(part) != *posted {
                self.scope = part.to_vec();
                return ChallengerAction::Descend { index: index as u8 };
            }
        }
        ChallengerAction::Wait
    }
}
