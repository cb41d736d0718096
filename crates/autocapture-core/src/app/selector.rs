//! Strategy selector.
//!
//! Pure ranking over candidates. Tiers apply in fixed order (difficulty,
//! completion, position); an `Unordered` tier contributes nothing. The sort
//! is stable, so ties keep input order.

use std::cmp::Ordering;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::domain::{Area, AreaId, FocusMode, RankingTiers, Strategy, Subarea, TierOrder};

/// Something the tiers can rank.
pub trait Rankable {
    /// Difficulty key, compared lexicographically.
    fn difficulty_key(&self) -> (u8, u8);

    fn completion(&self) -> f64;

    fn position_cmp(&self, other: &Self) -> Ordering;
}

impl Rankable for Area {
    /// The area's own tier, then the hardest open subarea (0 when unknown).
    fn difficulty_key(&self) -> (u8, u8) {
        (
            self.state.difficulty.rank(),
            self.hardest_open_subarea().map_or(0, |d| d.rank()),
        )
    }

    fn completion(&self) -> f64 {
        self.state.capture_progress
    }

    fn position_cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Rankable for Subarea {
    fn difficulty_key(&self) -> (u8, u8) {
        (self.difficulty.rank(), 0)
    }

    fn completion(&self) -> f64 {
        self.capture_progress
    }

    fn position_cmp(&self, other: &Self) -> Ordering {
        self.position.cmp(&other.position)
    }
}

fn directed(order: TierOrder, ordering: impl FnOnce() -> Ordering) -> Ordering {
    match order {
        TierOrder::Unordered => Ordering::Equal,
        TierOrder::Ascending => ordering(),
        TierOrder::Descending => ordering().reverse(),
    }
}

/// Comparator for one candidate pair under `tiers`.
pub fn compare<T: Rankable>(a: &T, b: &T, tiers: &RankingTiers) -> Ordering {
    directed(tiers.difficulty, || a.difficulty_key().cmp(&b.difficulty_key()))
        .then_with(|| directed(tiers.completion, || a.completion().total_cmp(&b.completion())))
        .then_with(|| directed(tiers.position, || a.position_cmp(b)))
}

/// Rank candidates best-first.
pub fn rank<'a, T: Rankable>(
    candidates: impl IntoIterator<Item = &'a T>,
    tiers: &RankingTiers,
) -> Vec<&'a T>
where
    T: 'a,
{
    let mut ranked: Vec<&T> = candidates.into_iter().collect();
    ranked.sort_by(|a, b| compare(*a, *b, tiers));
    ranked
}

/// Choose the target area.
///
/// 1. `override_area`, if it is still in the list;
/// 2. the joined area under `FocusCurrentArea`, if it is still open;
/// 3. uniformly among running areas under `FocusRandomArea`;
/// 4. otherwise the best running area by the area tiers.
pub fn pick_area<'a, R: Rng + ?Sized>(
    areas: &'a [Area],
    strategy: &Strategy,
    joined: Option<&AreaId>,
    override_area: Option<&AreaId>,
    rng: &mut R,
) -> Option<&'a Area> {
    if let Some(id) = override_area
        && let Some(area) = areas.iter().find(|a| &a.id == id)
    {
        return Some(area);
    }

    if strategy.focus == FocusMode::CurrentArea
        && let Some(id) = joined
        && let Some(area) = areas.iter().find(|a| &a.id == id && !a.state.captured)
    {
        return Some(area);
    }

    let running: Vec<&Area> = areas.iter().filter(|a| a.state.running).collect();
    if strategy.focus == FocusMode::RandomArea {
        return running.choose(rng).copied();
    }
    rank(running, &strategy.areas).into_iter().next()
}

/// Choose the target subarea among the uncaptured ones of `area`.
pub fn pick_subarea<'a>(area: &'a Area, strategy: &Strategy) -> Option<&'a Subarea> {
    rank(area.open_subareas(), &strategy.subareas)
        .into_iter()
        .next()
}
