//! Strategy preferences.
//!
//! Configuration arrives as a set of named flags. They are folded once into
//! [`Strategy`], one [`TierOrder`] per ranking tier, so the selector never
//! looks at raw flags. Conflicting pairs are rejected at parse time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Direction of one ranking tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierOrder {
    /// Tier contributes nothing; candidates keep their input order.
    #[default]
    Unordered,
    Ascending,
    Descending,
}

/// Tier directions applied to one kind of candidate, in tier order:
/// difficulty, then completion, then position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RankingTiers {
    pub difficulty: TierOrder,
    pub completion: TierOrder,
    pub position: TierOrder,
}

/// Area choice modes that bypass ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusMode {
    #[default]
    Ranked,
    /// Stay on the joined area while it is still open.
    CurrentArea,
    /// Pick uniformly among running areas.
    RandomArea,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<StrategyFlag>", into = "Vec<StrategyFlag>")]
pub struct Strategy {
    pub areas: RankingTiers,
    pub subareas: RankingTiers,
    pub focus: FocusMode,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::from_flags([
            StrategyFlag::TopDown,
            StrategyFlag::MostCompletedAreasFirst,
            StrategyFlag::MostCompletedSubareasFirst,
            StrategyFlag::MostDifficultAreasFirst,
            StrategyFlag::MostDifficultSubareasFirst,
        ])
        .unwrap_or(Strategy::unordered())
    }
}

/// A single named preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StrategyFlag {
    TopDown,
    BottomUp,
    MostDifficultAreasFirst,
    LeastDifficultAreasFirst,
    MostCompletedAreasFirst,
    LeastCompletedAreasFirst,
    MostDifficultSubareasFirst,
    LeastDifficultSubareasFirst,
    MostCompletedSubareasFirst,
    LeastCompletedSubareasFirst,
    FocusCurrentArea,
    FocusRandomArea,
}

impl StrategyFlag {
    pub const ALL: [StrategyFlag; 12] = [
        StrategyFlag::TopDown,
        StrategyFlag::BottomUp,
        StrategyFlag::MostDifficultAreasFirst,
        StrategyFlag::LeastDifficultAreasFirst,
        StrategyFlag::MostCompletedAreasFirst,
        StrategyFlag::LeastCompletedAreasFirst,
        StrategyFlag::MostDifficultSubareasFirst,
        StrategyFlag::LeastDifficultSubareasFirst,
        StrategyFlag::MostCompletedSubareasFirst,
        StrategyFlag::LeastCompletedSubareasFirst,
        StrategyFlag::FocusCurrentArea,
        StrategyFlag::FocusRandomArea,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyFlag::TopDown => "TopDown",
            StrategyFlag::BottomUp => "BottomUp",
            StrategyFlag::MostDifficultAreasFirst => "MostDifficultAreasFirst",
            StrategyFlag::LeastDifficultAreasFirst => "LeastDifficultAreasFirst",
            StrategyFlag::MostCompletedAreasFirst => "MostCompletedAreasFirst",
            StrategyFlag::LeastCompletedAreasFirst => "LeastCompletedAreasFirst",
            StrategyFlag::MostDifficultSubareasFirst => "MostDifficultSubareasFirst",
            StrategyFlag::LeastDifficultSubareasFirst => "LeastDifficultSubareasFirst",
            StrategyFlag::MostCompletedSubareasFirst => "MostCompletedSubareasFirst",
            StrategyFlag::LeastCompletedSubareasFirst => "LeastCompletedSubareasFirst",
            StrategyFlag::FocusCurrentArea => "FocusCurrentArea",
            StrategyFlag::FocusRandomArea => "FocusRandomArea",
        }
    }
}

impl fmt::Display for StrategyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for StrategyFlag {
    type Error = StrategyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StrategyFlag> for String {
    fn from(flag: StrategyFlag) -> Self {
        flag.name().to_string()
    }
}

impl FromStr for StrategyFlag {
    type Err = StrategyError;

    /// Case-insensitive; `most-difficult-areas-first` and
    /// `MostDifficultAreasFirst` are the same flag.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        StrategyFlag::ALL
            .into_iter()
            .find(|flag| flag.name().to_ascii_lowercase() == wanted)
            .ok_or_else(|| StrategyError::UnknownFlag(s.trim().to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("unknown strategy flag `{0}`")]
    UnknownFlag(String),

    #[error("strategy flags {0} and {1} cannot be combined")]
    Conflict(StrategyFlag, StrategyFlag),
}

impl Strategy {
    /// No tier set, ranked mode: candidates keep input order.
    pub fn unordered() -> Self {
        Self {
            areas: RankingTiers::default(),
            subareas: RankingTiers::default(),
            focus: FocusMode::Ranked,
        }
    }

    pub fn from_flags(flags: impl IntoIterator<Item = StrategyFlag>) -> Result<Self, StrategyError> {
        let mut strategy = Strategy::unordered();
        // Remember which flag set each slot so conflicts can name both.
        let mut seen: Vec<StrategyFlag> = Vec::new();

        for flag in flags {
            if seen.contains(&flag) {
                continue;
            }
            if let Some(other) = seen.iter().copied().find(|s| conflicts(*s, flag)) {
                return Err(StrategyError::Conflict(other, flag));
            }
            seen.push(flag);

            use StrategyFlag::*;
            match flag {
                TopDown => {
                    strategy.areas.position = TierOrder::Ascending;
                    strategy.subareas.position = TierOrder::Ascending;
                }
                BottomUp => {
                    strategy.areas.position = TierOrder::Descending;
                    strategy.subareas.position = TierOrder::Descending;
                }
                MostDifficultAreasFirst => strategy.areas.difficulty = TierOrder::Descending,
                LeastDifficultAreasFirst => strategy.areas.difficulty = TierOrder::Ascending,
                MostCompletedAreasFirst => strategy.areas.completion = TierOrder::Descending,
                LeastCompletedAreasFirst => strategy.areas.completion = TierOrder::Ascending,
                MostDifficultSubareasFirst => strategy.subareas.difficulty = TierOrder::Descending,
                LeastDifficultSubareasFirst => strategy.subareas.difficulty = TierOrder::Ascending,
                MostCompletedSubareasFirst => strategy.subareas.completion = TierOrder::Descending,
                LeastCompletedSubareasFirst => strategy.subareas.completion = TierOrder::Ascending,
                FocusCurrentArea => strategy.focus = FocusMode::CurrentArea,
                FocusRandomArea => strategy.focus = FocusMode::RandomArea,
            }
        }
        Ok(strategy)
    }

    /// Flags that rebuild this strategy.
    ///
    /// Position tiers are shared; the area tier is authoritative.
    pub fn flags(&self) -> Vec<StrategyFlag> {
        use StrategyFlag::*;
        let mut flags = Vec::new();
        match self.areas.position {
            TierOrder::Ascending => flags.push(TopDown),
            TierOrder::Descending => flags.push(BottomUp),
            TierOrder::Unordered => {}
        }
        let pairs = [
            (self.areas.difficulty, LeastDifficultAreasFirst, MostDifficultAreasFirst),
            (self.areas.completion, LeastCompletedAreasFirst, MostCompletedAreasFirst),
            (self.subareas.difficulty, LeastDifficultSubareasFirst, MostDifficultSubareasFirst),
            (self.subareas.completion, LeastCompletedSubareasFirst, MostCompletedSubareasFirst),
        ];
        for (order, ascending, descending) in pairs {
            match order {
                TierOrder::Ascending => flags.push(ascending),
                TierOrder::Descending => flags.push(descending),
                TierOrder::Unordered => {}
            }
        }
        match self.focus {
            FocusMode::CurrentArea => flags.push(FocusCurrentArea),
            FocusMode::RandomArea => flags.push(FocusRandomArea),
            FocusMode::Ranked => {}
        }
        flags
    }
}

fn conflicts(a: StrategyFlag, b: StrategyFlag) -> bool {
    use StrategyFlag::*;
    let pair = |x: StrategyFlag, y: StrategyFlag| (a == x && b == y) || (a == y && b == x);
    pair(TopDown, BottomUp)
        || pair(MostDifficultAreasFirst, LeastDifficultAreasFirst)
        || pair(MostCompletedAreasFirst, LeastCompletedAreasFirst)
        || pair(MostDifficultSubareasFirst, LeastDifficultSubareasFirst)
        || pair(MostCompletedSubareasFirst, LeastCompletedSubareasFirst)
        || pair(FocusCurrentArea, FocusRandomArea)
}

impl TryFrom<Vec<StrategyFlag>> for Strategy {
    type Error = StrategyError;

    fn try_from(flags: Vec<StrategyFlag>) -> Result<Self, Self::Error> {
        Strategy::from_flags(flags)
    }
}

impl From<Strategy> for Vec<StrategyFlag> {
    fn from(strategy: Strategy) -> Self {
        strategy.flags()
    }
}

impl FromStr for Strategy {
    type Err = StrategyError;

    /// Comma-separated flag names. An empty string is the unordered strategy.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let flags = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(StrategyFlag::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Strategy::from_flags(flags)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.flags().into_iter().map(StrategyFlag::name).collect();
        if names.is_empty() {
            f.write_str("(none)")
        } else {
            f.write_str(&names.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategy_prefers_hard_and_complete_top_down() {
        let strategy = Strategy::default();
        assert_eq!(strategy.areas.difficulty, TierOrder::Descending);
        assert_eq!(strategy.areas.completion, TierOrder::Descending);
        assert_eq!(strategy.areas.position, TierOrder::Ascending);
        assert_eq!(strategy.subareas.difficulty, TierOrder::Descending);
        assert_eq!(strategy.subareas.completion, TierOrder::Descending);
        assert_eq!(strategy.subareas.position, TierOrder::Ascending);
        assert_eq!(strategy.focus, FocusMode::Ranked);
    }

    #[test]
    fn parses_mixed_case_and_kebab_names() {
        let strategy: Strategy = "bottom-up, LeastCompletedAreasFirst,focus_random_area"
            .parse()
            .unwrap();
        assert_eq!(strategy.areas.position, TierOrder::Descending);
        assert_eq!(strategy.subareas.position, TierOrder::Descending);
        assert_eq!(strategy.areas.completion, TierOrder::Ascending);
        assert_eq!(strategy.areas.difficulty, TierOrder::Unordered);
        assert_eq!(strategy.focus, FocusMode::RandomArea);
    }

    #[test]
    fn rejects_conflicting_pair() {
        let err = "TopDown,BottomUp".parse::<Strategy>().unwrap_err();
        assert_eq!(
            err,
            StrategyError::Conflict(StrategyFlag::TopDown, StrategyFlag::BottomUp)
        );

        let err = "FocusCurrentArea,FocusRandomArea".parse::<Strategy>().unwrap_err();
        assert!(matches!(err, StrategyError::Conflict(..)));
    }

    #[test]
    fn rejects_unknown_flag() {
        let err = "TopDown, Sideways".parse::<Strategy>().unwrap_err();
        assert_eq!(err, StrategyError::UnknownFlag("Sideways".to_string()));
    }

    #[test]
    fn repeated_flag_is_not_a_conflict() {
        let strategy: Strategy = "TopDown,TopDown".parse().unwrap();
        assert_eq!(strategy.areas.position, TierOrder::Ascending);
    }

    #[test]
    fn flags_rebuild_the_same_strategy() {
        let strategy: Strategy = "BottomUp,MostDifficultSubareasFirst,FocusCurrentArea"
            .parse()
            .unwrap();
        assert_eq!(Strategy::from_flags(strategy.flags()).unwrap(), strategy);
        assert_eq!(
            strategy.to_string(),
            "BottomUp, MostDifficultSubareasFirst, FocusCurrentArea"
        );
    }

    #[test]
    fn empty_string_is_unordered() {
        assert_eq!("".parse::<Strategy>().unwrap(), Strategy::unordered());
        assert_eq!(Strategy::unordered().to_string(), "(none)");
    }
}
