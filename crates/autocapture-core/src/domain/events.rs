//! Progress notifications emitted by the engine.
//!
//! Only the fact that an event is emitted at a transition matters; the text
//! from `Display` is for people.

use std::fmt;
use std::time::Duration;

use super::ids::AreaId;
use super::player::ScoreReport;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Started,
    Stopped,
    AreasRefreshed {
        total: usize,
        running: usize,
    },
    ActiveAreasRefreshed {
        running: usize,
        summaries: Vec<String>,
    },
    PlayerRefreshed {
        level: u32,
        score: u64,
        next_level_score: u64,
        active_area: Option<AreaId>,
        time_in_area: Duration,
        active_subarea: Option<u32>,
        time_in_subarea: Duration,
    },
    AreaChosen {
        area: AreaId,
        summary: String,
    },
    AreaJoined {
        area: AreaId,
        name: String,
    },
    AreaCaptured {
        area: AreaId,
        name: String,
    },
    AreaLeft {
        area: AreaId,
    },
    SubareaChosen {
        position: u32,
        summary: String,
    },
    SubareaJoined {
        position: u32,
    },
    SubareaUnavailable {
        position: u32,
    },
    SubareaLeft {
        position: u32,
        session_id: String,
    },
    WaitingForRound {
        remaining: Duration,
    },
    ScoreReported {
        score: u64,
        report: ScoreReport,
    },
    ScoreRejected {
        score: u64,
    },
    Failure {
        message: String,
    },
    Restarting {
        backoff: Duration,
    },
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::Started => write!(f, "Automation started"),
            EngineEvent::Stopped => write!(f, "Automation stopped"),
            EngineEvent::AreasRefreshed { total, running } => {
                write!(f, "List of all areas updated ({total} areas, {running} running)")
            }
            EngineEvent::ActiveAreasRefreshed { running, summaries } => {
                write!(f, "Details of active areas updated ({running} running)")?;
                for line in summaries {
                    write!(f, "\n  {line}")?;
                }
                Ok(())
            }
            EngineEvent::PlayerRefreshed {
                level,
                score,
                next_level_score,
                active_area,
                time_in_area,
                active_subarea,
                time_in_subarea,
            } => {
                write!(f, "Player info updated")?;
                if let Some(area) = active_area {
                    write!(f, "\n  Active area: {area} for {}s", time_in_area.as_secs())?;
                }
                if let Some(position) = active_subarea {
                    write!(
                        f,
                        "\n  Active subarea: {position} for {}s",
                        time_in_subarea.as_secs()
                    )?;
                }
                write!(
                    f,
                    "\n  Level: {level} ({}/{})",
                    grouped(*score),
                    grouped(*next_level_score)
                )
            }
            EngineEvent::AreaChosen { summary, .. } => write!(f, "Choosing new area: {summary}"),
            EngineEvent::AreaJoined { area, name } => write!(f, "Joined {name} [{area}]"),
            EngineEvent::AreaCaptured { area, name } => {
                write!(f, "{name} [{area}] has been fully captured, leaving...")
            }
            EngineEvent::AreaLeft { area } => write!(f, "Left area {area}"),
            EngineEvent::SubareaChosen { summary, .. } => write!(f, "Choosing {summary}"),
            EngineEvent::SubareaJoined { position } => write!(f, "Joined subarea {position}"),
            EngineEvent::SubareaUnavailable { position } => {
                write!(f, "Failed to join subarea {position}: already captured")
            }
            EngineEvent::SubareaLeft { position, session_id } => {
                write!(f, "Left subarea {position} (session {session_id})")
            }
            EngineEvent::WaitingForRound { remaining } => write!(
                f,
                "Waiting for round to finish in {} seconds...",
                remaining.as_secs()
            ),
            EngineEvent::ScoreReported { score, report } => {
                write!(f, "Score submitted: {}", grouped(*score))?;
                write!(
                    f,
                    "\n  XP progression: {} -> {} (next level at {})",
                    grouped(report.old_score),
                    grouped(report.new_score),
                    grouped(report.next_level_score)
                )?;
                if report.leveled_up() {
                    write!(f, "\n  New level: {} -> {}", report.old_level, report.new_level)?;
                }
                Ok(())
            }
            EngineEvent::ScoreRejected { score } => write!(
                f,
                "Failed to submit score of {}: round no longer valid",
                grouped(*score)
            ),
            EngineEvent::Failure { message } => write!(f, "Error: {message}"),
            EngineEvent::Restarting { backoff } => {
                write!(f, "Attempting to restart in {} seconds...", backoff.as_secs())
            }
        }
    }
}

/// `1234567` -> `"1,234,567"`.
pub fn grouped(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(grouped(0), "0");
        assert_eq!(grouped(999), "999");
        assert_eq!(grouped(1_000), "1,000");
        assert_eq!(grouped(1_234_567), "1,234,567");
    }

    #[test]
    fn score_event_mentions_level_up_only_when_it_happened() {
        let report = ScoreReport {
            old_score: 1_000,
            new_score: 3_400,
            next_level_score: 5_000,
            old_level: 2,
            new_level: 2,
        };
        let text = EngineEvent::ScoreReported { score: 2_400, report: report.clone() }.to_string();
        assert!(text.starts_with("Score submitted: 2,400"));
        assert!(!text.contains("New level"));

        let report = ScoreReport { new_level: 3, ..report };
        let text = EngineEvent::ScoreReported { score: 2_400, report }.to_string();
        assert!(text.contains("New level: 2 -> 3"));
    }
}
