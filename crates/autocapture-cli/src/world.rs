//! Demo world served by the in-memory game service.

use autocapture_core::domain::{Area, Difficulty, PlayerStatus, Subarea};
use autocapture_core::impls::InMemoryGameService;

const NAMES: [(&str, Difficulty); 6] = [
    ("Vega", Difficulty::High),
    ("Rigel", Difficulty::Medium),
    ("Deneb", Difficulty::Low),
    ("Altair", Difficulty::Medium),
    ("Spica", Difficulty::High),
    ("Castor", Difficulty::Low),
];

/// Six areas with four subareas each. The last one is not running yet.
pub fn areas() -> Vec<Area> {
    NAMES
        .iter()
        .enumerate()
        .map(|(i, (name, difficulty))| {
            let id = (i + 1).to_string();
            let subareas = (0..4u32)
                .map(|position| {
                    let difficulty = match (i as u32 + position) % 3 {
                        0 => Difficulty::Low,
                        1 => Difficulty::Medium,
                        _ => Difficulty::High,
                    };
                    let progress = f64::from((i as u32 * 3 + position) % 4) * 0.25;
                    Subarea::new(position, difficulty, format!("{id}-{position}"))
                        .with_progress(progress)
                })
                .collect();
            let area = Area::new(id, *name, *difficulty)
                .with_subareas(subareas)
                .with_progress(f64::from(i as u32 % 4) * 0.2);
            if i == NAMES.len() - 1 {
                area.stopped()
            } else {
                area
            }
        })
        .collect()
}

pub fn service() -> InMemoryGameService {
    InMemoryGameService::new(areas(), PlayerStatus::new(0, 1, 10_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_running_area_has_something_open() {
        let areas = areas();
        assert_eq!(areas.len(), NAMES.len());
        for area in areas.iter().filter(|a| a.state.running) {
            assert!(area.open_subareas().next().is_some(), "{}", area.id);
        }
        assert!(!areas.last().is_some_and(|a| a.state.running));
    }

    #[test]
    fn session_ids_are_unique() {
        let mut ids: Vec<String> = areas()
            .into_iter()
            .flat_map(|a| a.subareas)
            .map(|s| s.session_id)
            .collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }
}
