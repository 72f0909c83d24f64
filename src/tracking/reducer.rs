use crate::tracking::{
    algorithm::{AlgorithmKey, AlgorithmStatus, ProgressBoard},
    parser::LogEvent,
};

pub const ALGORITHM_COUNT: u32 = AlgorithmKey::ALL.len() as u32;

/// Applies one parsed event to `board`.
///
/// Statuses only move forward; an [`Aggregate`](LogEvent::Aggregate) event
/// resolves whatever is still open through [`reconcile`].
pub fn reduce(board: &ProgressBoard, event: &LogEvent) -> ProgressBoard {
    let mut next = board.clone();
    match event {
        LogEvent::Started(algorithm) => {
            next.advance(*algorithm, AlgorithmStatus::Running);
        }
        LogEvent::Finished { algorithm, outcome } => {
            next.advance(*algorithm, outcome.status());
        }
        LogEvent::Detail { algorithm, field, value } => {
            next.set_detail(*algorithm, field, value);
        }
        LogEvent::Aggregate { success_count } => return reconcile(board, *success_count),
    }
    next
}

/// Resolves every pending or running algorithm once the job is complete.
///
/// Running algorithms claim the success slots first, walking GA, CO, RL,
/// until the board holds `success_count` (at most 3) successes. Pending
/// algorithms share whatever remains in the same order; the rest fail.
/// Already resolved algorithms are left alone, so a second pass is a no-op.
pub fn reconcile(board: &ProgressBoard, success_count: u32) -> ProgressBoard {
    let target = success_count.min(ALGORITHM_COUNT) as usize;
    let mut next = board.clone();
    let mut successes = board.success_count();
    for phase in [AlgorithmStatus::Running, AlgorithmStatus::Pending] {
        let open: Vec<_> = board
            .unresolved()
            .filter(|algorithm| board.status(*algorithm) == phase)
            .collect();
        for algorithm in open {
            if successes < target {
                next.advance(algorithm, AlgorithmStatus::Success);
                successes += 1;
            } else {
                next.advance(algorithm, AlgorithmStatus::Failed);
            }
        }
    }
    next
}
