//! Turns free-text generation log lines into [`LogEvent`]s.
//!
//! The phrase tables below are the whole grammar. Rules are applied in this
//! order to every line: start markers, completion markers, the aggregate
//! marker, then detail fields. Detail fields are attributed to the algorithm
//! most recently started, including one started by the same line.

use regex_lite::Regex;

use crate::tracking::algorithm::{AlgorithmKey, AlgorithmStatus};

/// Start phrases, matched case-insensitively.
pub const START_PHRASES: &[(AlgorithmKey, &str)] = &[
    (AlgorithmKey::Ga, "starting genetic algorithm"),
    (AlgorithmKey::Co, "starting constraint optimization"),
    (AlgorithmKey::Co, "starting colony optimization"),
    (AlgorithmKey::Rl, "starting reinforcement learning"),
];

/// Completion phrases, prefixed with the algorithm code (`"GA algorithm failed"`).
/// The first matching phrase wins, so longer phrases come first.
pub const COMPLETION_PHRASES: &[(&str, Outcome)] = &[
    ("algorithm completed successfully", Outcome::Success),
    ("algorithm completed with no result", Outcome::Failed),
    ("algorithm failed", Outcome::Failed),
    ("algorithm completed", Outcome::Success),
];

pub const AGGREGATE_PATTERN: &str = r"Schedule generated successfully with ([0-9]+) of 3 algorithms";

/// Detail fields per algorithm: `(algorithm, field, pattern)`.
pub const DETAIL_PATTERNS: &[(AlgorithmKey, &str, &str)] = &[
    (AlgorithmKey::Ga, "population", r"Population size: ([0-9]+)"),
    (AlgorithmKey::Ga, "iterations", r"Iterations: ([0-9]+)"),
    (AlgorithmKey::Ga, "fitness", r"Best fitness: ([0-9.]+)"),
    (AlgorithmKey::Co, "constraints", r"Constraints: ([0-9]+)"),
    (AlgorithmKey::Co, "violated", r"Violated: ([0-9]+)"),
    (AlgorithmKey::Rl, "episodes", r"Episodes: ([0-9]+)"),
    (AlgorithmKey::Rl, "reward", r"Reward: ([0-9.]+)"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
}

impl Outcome {
    pub fn status(self) -> AlgorithmStatus {
        match self {
            Outcome::Success => AlgorithmStatus::Success,
            Outcome::Failed => AlgorithmStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    Started(AlgorithmKey),
    Finished { algorithm: AlgorithmKey, outcome: Outcome },
    Detail { algorithm: AlgorithmKey, field: &'static str, value: String },
    Aggregate { success_count: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub events: Vec<LogEvent>,
    /// The algorithm context after this line.
    pub current: Option<AlgorithmKey>,
}

impl ParsedLine {
    pub fn is_unrecognized(&self) -> bool {
        self.events.is_empty()
    }
}

struct DetailRule {
    algorithm: AlgorithmKey,
    field: &'static str,
    pattern: Regex,
}

pub struct LogParser {
    aggregate: Regex,
    details: Vec<DetailRule>,
}

impl Default for LogParser {
    fn default() -> Self {
        LogParser::new()
    }
}

impl std::fmt::Debug for LogParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogParser")
            .field("details", &self.details.len())
            .finish()
    }
}

impl LogParser {
    pub fn new() -> Self {
        let details = DETAIL_PATTERNS
            .iter()
            .map(|(algorithm, field, pattern)| DetailRule {
                algorithm: *algorithm,
                field: *field,
                pattern: Regex::new(pattern).expect("detail patterns are valid"),
            })
            .collect();
        LogParser {
            aggregate: Regex::new(AGGREGATE_PATTERN).expect("aggregate pattern is valid"),
            details,
        }
    }

    pub fn parse(&self, line: &str, current: Option<AlgorithmKey>) -> ParsedLine {
        let mut events = Vec::new();
        let mut current = current;

        let lowercase = line.to_lowercase();
        let mut starts: Vec<(usize, AlgorithmKey)> = START_PHRASES
            .iter()
            .filter_map(|(algorithm, phrase)| lowercase.find(phrase).map(|at| (at, *algorithm)))
            .collect();
        starts.sort();
        for (_, algorithm) in starts {
            events.push(LogEvent::Started(algorithm));
            current = Some(algorithm);
        }

        for algorithm in AlgorithmKey::ALL.iter().copied() {
            let outcome = COMPLETION_PHRASES.iter().find_map(|(phrase, outcome)| {
                let marker = format!("{} {}", algorithm.code(), phrase);
                line.contains(&marker).then(|| *outcome)
            });
            if let Some(outcome) = outcome {
                events.push(LogEvent::Finished { algorithm, outcome });
            }
        }

        if let Some(captures) = self.aggregate.captures(line) {
            // the capture is all digits, so parsing only fails on overflow
            let success_count = captures[1].parse::<u32>().unwrap_or(u32::MAX);
            events.push(LogEvent::Aggregate { success_count });
        }

        if let Some(algorithm) = current {
            for rule in self.details.iter().filter(|rule| rule.algorithm == algorithm) {
                if let Some(captures) = rule.pattern.captures(line) {
                    events.push(LogEvent::Detail {
                        algorithm,
                        field: rule.field,
                        value: captures[1].to_owned(),
                    });
                }
            }
        }

        ParsedLine { events, current }
    }
}
