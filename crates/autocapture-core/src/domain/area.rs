//! Area and subarea records as reported by the game service.
//!
//! The list endpoint returns areas without subareas; only the detail
//! endpoint fills `subareas`. Records are replaced wholesale on refresh and
//! never patched field by field (see `app::store`).

use serde::{Deserialize, Deserializer, Serialize};

use super::ids::AreaId;

/// Difficulty tier.
///
/// The service encodes difficulty as a small integer (1..=3). Anything else
/// is kept as `Unknown` instead of failing the whole payload, so a new tier
/// on the remote side does not take the engine down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Difficulty {
    Low,
    Medium,
    High,
    Unknown(u8),
}

impl Difficulty {
    /// Ordinal used by the difficulty ranking tier.
    ///
    /// Unknown tiers rank with `High`, the same tier their score rate uses.
    pub fn rank(self) -> u8 {
        match self {
            Difficulty::Low => 1,
            Difficulty::Medium => 2,
            Difficulty::High | Difficulty::Unknown(_) => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Low => "low",
            Difficulty::Medium => "medium",
            Difficulty::High => "high",
            Difficulty::Unknown(_) => "unknown",
        }
    }
}

impl From<u8> for Difficulty {
    fn from(value: u8) -> Self {
        match value {
            1 => Difficulty::Low,
            2 => Difficulty::Medium,
            3 => Difficulty::High,
            other => Difficulty::Unknown(other),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(value: Difficulty) -> Self {
        match value {
            Difficulty::Low => 1,
            Difficulty::Medium => 2,
            Difficulty::High => 3,
            Difficulty::Unknown(other) => other,
        }
    }
}

/// Clamp a capture fraction into `[0, 1]`. NaN counts as no progress.
pub fn clamp_progress(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn de_progress<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(clamp_progress)
}

/// Aggregate state of an area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaState {
    pub name: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub captured: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub running: bool,
    #[serde(default, deserialize_with = "de_progress")]
    pub capture_progress: f64,
}

/// A timed sub-objective inside an area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subarea {
    /// Unique within the owning area.
    pub position: u32,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub captured: bool,
    #[serde(default, deserialize_with = "de_progress")]
    pub capture_progress: f64,
    /// Round/session id used when leaving the subarea.
    pub session_id: String,
}

impl Subarea {
    pub fn new(position: u32, difficulty: Difficulty, session_id: impl Into<String>) -> Self {
        Self {
            position,
            difficulty,
            captured: false,
            capture_progress: 0.0,
            session_id: session_id.into(),
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.capture_progress = clamp_progress(progress);
        self
    }

    pub fn captured(mut self) -> Self {
        self.captured = true;
        self.capture_progress = 1.0;
        self
    }

    /// One-line description for progress output.
    pub fn summary(&self) -> String {
        format!(
            "subarea {} ({} difficulty, {:.1}% captured)",
            self.position,
            self.difficulty.label(),
            self.capture_progress * 100.0
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub state: AreaState,
    #[serde(default)]
    pub subareas: Vec<Subarea>,
}

impl Area {
    /// A running, uncaptured area without subareas (the list form).
    pub fn new(id: impl Into<AreaId>, name: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            id: id.into(),
            state: AreaState {
                name: name.into(),
                difficulty,
                captured: false,
                active: true,
                running: true,
                capture_progress: 0.0,
            },
            subareas: Vec::new(),
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.state.capture_progress = clamp_progress(progress);
        self
    }

    pub fn with_subareas(mut self, subareas: Vec<Subarea>) -> Self {
        self.subareas = subareas;
        self
    }

    pub fn stopped(mut self) -> Self {
        self.state.active = false;
        self.state.running = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn subarea(&self, position: u32) -> Option<&Subarea> {
        self.subareas.iter().find(|s| s.position == position)
    }

    pub fn open_subareas(&self) -> impl Iterator<Item = &Subarea> {
        self.subareas.iter().filter(|s| !s.captured)
    }

    /// Highest difficulty among uncaptured subareas, if any are known.
    pub fn hardest_open_subarea(&self) -> Option<Difficulty> {
        self.open_subareas()
            .map(|s| s.difficulty)
            .max_by_key(|d| d.rank())
    }

    /// The list form of this area (subareas stripped).
    pub fn summary_form(&self) -> Area {
        Area {
            id: self.id.clone(),
            state: self.state.clone(),
            subareas: Vec::new(),
        }
    }

    /// One-line description for progress output.
    pub fn summary(&self) -> String {
        let open = self.open_subareas().count();
        format!(
            "{} [{}] ({} difficulty, {:.1}% captured, {}/{} subareas open)",
            self.state.name,
            self.id,
            self.state.difficulty.label(),
            self.state.capture_progress * 100.0,
            open,
            self.subareas.len()
        )
    }
}
