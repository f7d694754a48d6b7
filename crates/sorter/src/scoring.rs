use crate::category::WasteCategory;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// Receives one event per successfully classified item.
pub trait ScoreSink: Send + Sync {
    /// Record an item and return the updated cumulative point total.
    fn record(&self, category: WasteCategory) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    /// Point total at which the achievement unlocks.
    pub threshold: u64,
}

pub const ACHIEVEMENTS: [Achievement; 10] = [
    Achievement {
        id: "novice_sorter",
        name: "Novice sorter",
        threshold: 100,
    },
    Achievement {
        id: "master_split",
        name: "Separate collection master",
        threshold: 200,
    },
    Achievement {
        id: "eco_activist",
        name: "Eco activist",
        threshold: 300,
    },
    Achievement {
        id: "trash_conqueror",
        name: "Trash conqueror",
        threshold: 400,
    },
    Achievement {
        id: "enthusiast",
        name: "Sorting enthusiast",
        threshold: 500,
    },
    Achievement {
        id: "eco_warrior",
        name: "Eco warrior",
        threshold: 600,
    },
    Achievement {
        id: "clean_home",
        name: "Clean home",
        threshold: 700,
    },
    Achievement {
        id: "eco_pioneer",
        name: "Ecology pioneer",
        threshold: 800,
    },
    Achievement {
        id: "eco_hero",
        name: "Ecology hero",
        threshold: 900,
    },
    Achievement {
        id: "eco_guru",
        name: "Eco guru",
        threshold: 1000,
    },
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total_points: u64,
    pub items: u64,
    pub per_category: BTreeMap<WasteCategory, u64>,
}

impl StatsSnapshot {
    /// Fraction of all recorded items that went into `category`.
    pub fn share(&self, category: WasteCategory) -> f32 {
        if self.items == 0 {
            return 0.0;
        }
        let count = self.per_category.get(&category).copied().unwrap_or(0);
        count as f32 / self.items as f32
    }
}

/// In-memory points and per-category counters.
#[derive(Debug)]
pub struct Scoreboard {
    points_per_item: u64,
    stats: Mutex<StatsSnapshot>,
}

impl Scoreboard {
    pub fn new(points_per_item: u64) -> Self {
        Self {
            points_per_item,
            stats: Mutex::new(StatsSnapshot::default()),
        }
    }

    /// Record an item; returns the new total and the achievements it unlocked.
    pub fn record_with_unlocks(&self, category: WasteCategory) -> (u64, Vec<Achievement>) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        let before = stats.total_points;

        stats.total_points = stats.total_points.saturating_add(self.points_per_item);
        stats.items += 1;
        *stats.per_category.entry(category).or_insert(0) += 1;

        let total = stats.total_points;
        let unlocked: Vec<Achievement> = ACHIEVEMENTS
            .iter()
            .filter(|a| before < a.threshold && a.threshold <= total)
            .copied()
            .collect();

        for achievement in &unlocked {
            tracing::info!(achievement = achievement.id, total, "Achievement unlocked");
        }

        (total, unlocked)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every achievement reached so far.
    pub fn unlocked(&self) -> Vec<Achievement> {
        let total = self.snapshot().total_points;
        ACHIEVEMENTS
            .iter()
            .filter(|a| a.threshold <= total)
            .copied()
            .collect()
    }
}

impl ScoreSink for Scoreboard {
    fn record(&self, category: WasteCategory) -> u64 {
        self.record_with_unlocks(category).0
    }
}
