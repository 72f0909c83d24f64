use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The algorithms a generation job runs, in reconciliation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlgorithmKey {
    #[serde(rename = "GA")]
    Ga,
    #[serde(rename = "CO")]
    Co,
    #[serde(rename = "RL")]
    Rl,
}

impl AlgorithmKey {
    pub const ALL: [AlgorithmKey; 3] = [AlgorithmKey::Ga, AlgorithmKey::Co, AlgorithmKey::Rl];

    /// The abbreviation the server uses in completion messages.
    pub fn code(self) -> &'static str {
        match self {
            AlgorithmKey::Ga => "GA",
            AlgorithmKey::Co => "CO",
            AlgorithmKey::Rl => "RL",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AlgorithmKey::Ga => "Genetic Algorithm",
            AlgorithmKey::Co => "Constraint Optimization",
            AlgorithmKey::Rl => "Reinforcement Learning",
        }
    }
}

impl std::fmt::Display for AlgorithmKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmStatus {
    #[default]
    Pending,
    Running,
    Success,
    Failed,
}

impl AlgorithmStatus {
    pub fn is_resolved(self) -> bool {
        matches!(self, AlgorithmStatus::Success | AlgorithmStatus::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            AlgorithmStatus::Pending => 0,
            AlgorithmStatus::Running => 1,
            AlgorithmStatus::Success | AlgorithmStatus::Failed => 2,
        }
    }

    /// Whether moving to `next` is forward progress.
    pub fn can_advance_to(self, next: AlgorithmStatus) -> bool {
        next.rank() > self.rank()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlgorithmProgress {
    pub status: AlgorithmStatus,
    pub details: BTreeMap<String, String>,
}

/// Progress of every algorithm of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProgressBoard {
    algorithms: BTreeMap<AlgorithmKey, AlgorithmProgress>,
}

impl Default for ProgressBoard {
    fn default() -> Self {
        ProgressBoard {
            algorithms: AlgorithmKey::ALL
                .iter()
                .map(|key| (*key, AlgorithmProgress::default()))
                .collect(),
        }
    }
}

impl ProgressBoard {
    pub fn new() -> Self {
        ProgressBoard::default()
    }

    pub fn get(&self, key: AlgorithmKey) -> &AlgorithmProgress {
        &self.algorithms[&key]
    }

    pub fn status(&self, key: AlgorithmKey) -> AlgorithmStatus {
        self.get(key).status
    }

    /// All algorithms in reconciliation order.
    pub fn iter(&self) -> impl Iterator<Item = (AlgorithmKey, &AlgorithmProgress)> {
        self.algorithms.iter().map(|(key, progress)| (*key, progress))
    }

    pub fn success_count(&self) -> usize {
        self.iter()
            .filter(|(_, progress)| progress.status == AlgorithmStatus::Success)
            .count()
    }

    pub fn unresolved(&self) -> impl Iterator<Item = AlgorithmKey> + '_ {
        self.iter()
            .filter(|(_, progress)| !progress.status.is_resolved())
            .map(|(key, _)| key)
    }

    /// Moves `key` to `status` if that is forward progress, returns whether it changed.
    pub(crate) fn advance(&mut self, key: AlgorithmKey, status: AlgorithmStatus) -> bool {
        let progress = self.progress_mut(key);
        if progress.status.can_advance_to(status) {
            progress.status = status;
            true
        } else {
            false
        }
    }

    pub(crate) fn set_detail(&mut self, key: AlgorithmKey, field: &str, value: &str) {
        self.progress_mut(key)
            .details
            .insert(field.to_owned(), value.to_owned());
    }

    fn progress_mut(&mut self, key: AlgorithmKey) -> &mut AlgorithmProgress {
        self.algorithms.entry(key).or_default()
    }
}
