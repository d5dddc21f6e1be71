//! The five scheduling disciplines.
//!
//! A [`Discipline`] is chosen once, at configuration time, and stays
//! fixed for a run. Each maps to a preemption mode and (except for
//! round-robin, which serves in queue order) a rule engine ranking the
//! candidates at a decision point.
//!
//! | Discipline | Preemptive | Ranking |
//! |------------|------------|---------|
//! | FCFS | no | arrival, id |
//! | SJF | no | service time, arrival, id |
//! | SRTN | on every decision point | remaining time, arrival, id |
//! | HRRN | no | response ratio (desc), id |
//! | RR(Q) | at quantum boundaries | queue order |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{rules, RuleEngine, TieBreaker};
use crate::error::{Result, SimError};
use crate::models::SimTime;

/// Scheduling discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discipline {
    /// First-come, first-served.
    Fcfs,
    /// Shortest job first (non-preemptive).
    Sjf,
    /// Shortest remaining time next (preemptive SJF).
    Srtn,
    /// Highest response ratio next.
    Hrrn,
    /// Round-robin with a fixed time slice.
    RoundRobin {
        /// Maximum slice granted per dispatch.
        quantum: SimTime,
    },
}

/// When a held task may lose its unit before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preemption {
    /// Runs to completion once dispatched.
    Never,
    /// Re-ranked against waiting tasks at every decision point.
    OnDecision,
    /// Returned to the back of the queue after each slice.
    Quantum(SimTime),
}

impl Discipline {
    /// Round-robin with a validated quantum.
    pub fn round_robin(quantum: SimTime) -> Result<Self> {
        let discipline = Self::RoundRobin { quantum };
        discipline.validate()?;
        Ok(discipline)
    }

    /// All five disciplines, round-robin using `quantum`.
    pub fn all(quantum: SimTime) -> Result<[Self; 5]> {
        Ok([
            Self::Fcfs,
            Self::Sjf,
            Self::Srtn,
            Self::Hrrn,
            Self::round_robin(quantum)?,
        ])
    }

    /// Parses a discipline name. A bare `rr` / `round-robin` takes its
    /// slice from `quantum`; `rr:<q>` carries its own.
    pub fn parse(name: &str, quantum: Option<SimTime>) -> Result<Self> {
        let key = name.trim().to_ascii_lowercase();
        match key.as_str() {
            "rr" | "round-robin" | "round_robin" | "roundrobin" => match quantum {
                Some(q) => Self::round_robin(q),
                None => Err(SimError::parameter(
                    "quantum",
                    format!("round-robin policy {name:?} requires a quantum"),
                )),
            },
            _ => key.parse(),
        }
    }

    /// Rejects a non-positive round-robin quantum.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::RoundRobin { quantum } if quantum <= 0 => Err(SimError::parameter(
                "quantum",
                format!("must be positive, got {quantum}"),
            )),
            _ => Ok(()),
        }
    }

    /// Short display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fcfs => "FCFS",
            Self::Sjf => "SJF",
            Self::Srtn => "SRTN",
            Self::Hrrn => "HRRN",
            Self::RoundRobin { .. } => "RR",
        }
    }

    /// Preemption mode.
    pub fn preemption(&self) -> Preemption {
        match *self {
            Self::Fcfs | Self::Sjf | Self::Hrrn => Preemption::Never,
            Self::Srtn => Preemption::OnDecision,
            Self::RoundRobin { quantum } => Preemption::Quantum(quantum),
        }
    }

    /// Whether a held task can lose its unit before completing.
    pub fn is_preemptive(&self) -> bool {
        self.preemption() != Preemption::Never
    }

    /// Candidate ranking, or `None` when candidates are served in queue order.
    pub fn rule_engine(&self) -> Option<RuleEngine> {
        let engine = match self {
            Self::Fcfs => RuleEngine::new().with_rule(rules::Fifo),
            Self::Sjf => RuleEngine::new()
                .with_rule(rules::Spt)
                .with_rule(rules::Fifo),
            Self::Srtn => RuleEngine::new()
                .with_rule(rules::Lwkr)
                .with_rule(rules::Fifo),
            Self::Hrrn => RuleEngine::new().with_rule(rules::Hrr),
            Self::RoundRobin { .. } => return None,
        };
        Some(engine.with_final_tie_breaker(TieBreaker::ById))
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoundRobin { quantum } => write!(f, "RR:{quantum}"),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for Discipline {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        match key.as_str() {
            "fcfs" | "fifo" => Ok(Self::Fcfs),
            "sjf" | "spn" => Ok(Self::Sjf),
            "srtn" | "srtf" | "srt" => Ok(Self::Srtn),
            "hrrn" => Ok(Self::Hrrn),
            _ => {
                let quantum = key
                    .split_once(':')
                    .filter(|(head, _)| {
                        matches!(*head, "rr" | "round-robin" | "round_robin" | "roundrobin")
                    })
                    .map(|(_, q)| q.trim());
                match quantum {
                    Some(q) => {
                        let quantum = q.parse::<SimTime>().map_err(|_| {
                            SimError::parameter("quantum", format!("not an integer: {q:?}"))
                        })?;
                        Self::round_robin(quantum)
                    }
                    None => Err(SimError::InvalidPolicy(s.to_string())),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("FCFS".parse::<Discipline>().unwrap(), Discipline::Fcfs);
        assert_eq!(" sjf ".parse::<Discipline>().unwrap(), Discipline::Sjf);
        assert_eq!("SRTF".parse::<Discipline>().unwrap(), Discipline::Srtn);
        assert_eq!("hrrn".parse::<Discipline>().unwrap(), Discipline::Hrrn);
        assert_eq!(
            "rr:4".parse::<Discipline>().unwrap(),
            Discipline::RoundRobin { quantum: 4 }
        );
    }

    #[test]
    fn test_unknown_policy() {
        let err = "lottery".parse::<Discipline>().unwrap_err();
        assert!(matches!(err, SimError::InvalidPolicy(ref name) if name == "lottery"));
        assert!(matches!(
            "edf:3".parse::<Discipline>(),
            Err(SimError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_round_robin_quantum() {
        assert_eq!(
            Discipline::parse("RR", Some(3)).unwrap(),
            Discipline::RoundRobin { quantum: 3 }
        );
        assert!(matches!(
            Discipline::parse("rr", None),
            Err(SimError::InvalidWorkloadParameter { name: "quantum", .. })
        ));
        assert!(matches!(
            Discipline::round_robin(0),
            Err(SimError::InvalidWorkloadParameter { name: "quantum", .. })
        ));
        assert!("rr:x".parse::<Discipline>().is_err());
        // explicit slice wins over the default
        assert_eq!(
            Discipline::parse("rr:2", Some(9)).unwrap(),
            Discipline::RoundRobin { quantum: 2 }
        );
    }

    #[test]
    fn test_display_round_trips() {
        for d in Discipline::all(5).unwrap() {
            assert_eq!(d.to_string().parse::<Discipline>().unwrap(), d);
        }
    }

    #[test]
    fn test_preemption_modes() {
        assert_eq!(Discipline::Fcfs.preemption(), Preemption::Never);
        assert_eq!(Discipline::Srtn.preemption(), Preemption::OnDecision);
        assert_eq!(
            Discipline::RoundRobin { quantum: 2 }.preemption(),
            Preemption::Quantum(2)
        );
        assert!(!Discipline::Hrrn.is_preemptive());
        assert!(Discipline::Srtn.rule_engine().is_some());
        assert!(Discipline::RoundRobin { quantum: 2 }.rule_engine().is_none());
    }

    #[test]
    fn test_serde_tagged() {
        let json = serde_json::to_string(&Discipline::RoundRobin { quantum: 3 }).unwrap();
        assert_eq!(json, r#"{"kind":"round_robin","quantum":3}"#);
        let back: Discipline = serde_json::from_str(r#"{"kind":"srtn"}"#).unwrap();
        assert_eq!(back, Discipline::Srtn);
    }
}
