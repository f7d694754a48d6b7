use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Sorting bins a classification ends up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteCategory {
    Plastic,
    Paper,
    Glass,
    Metal,
    Organic,
    Mixed,
}

impl WasteCategory {
    pub const ALL: [WasteCategory; 6] = [
        WasteCategory::Plastic,
        WasteCategory::Paper,
        WasteCategory::Glass,
        WasteCategory::Metal,
        WasteCategory::Organic,
        WasteCategory::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WasteCategory::Plastic => "plastic",
            WasteCategory::Paper => "paper",
            WasteCategory::Glass => "glass",
            WasteCategory::Metal => "metal",
            WasteCategory::Organic => "organic",
            WasteCategory::Mixed => "mixed",
        }
    }

    /// Map a raw model label to a bin. Case-insensitive; anything unknown is `Mixed`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "plastic" => WasteCategory::Plastic,
            "paper" | "paper_carton" | "cardboard" => WasteCategory::Paper,
            "glass" => WasteCategory::Glass,
            "metal" => WasteCategory::Metal,
            "organic" | "biological" => WasteCategory::Organic,
            _ => WasteCategory::Mixed,
        }
    }
}

impl fmt::Display for WasteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WasteCategory {
    type Err = anyhow::Error;

    /// Strict parse of a category id; use [`WasteCategory::from_label`] for model output.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WasteCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("Unknown waste category '{}'", s))
    }
}

/// Static reference data shown for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInfo {
    pub id: WasteCategory,
    pub title: &'static str,
    /// ARGB.
    pub color: u32,
    pub description: &'static str,
    /// Typical items that belong in this bin.
    pub examples: &'static [&'static str],
    pub instructions: &'static [&'static str],
}

/// Read-only lookup of category reference data.
pub trait CategoryCatalog: Send + Sync {
    fn lookup(&self, category: WasteCategory) -> CategoryInfo;
}

/// Built-in catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalog;

const CATALOG: [CategoryInfo; 6] = [
    CategoryInfo {
        id: WasteCategory::Plastic,
        title: "Plastic",
        color: 0xFFA8D8A0,
        description: "Plastic packaging, bottles, bags and containers",
        examples: &["Drink bottles", "Shopping bags", "Food containers"],
        instructions: &["Remove the cap", "Rinse", "Peel off the label"],
    },
    CategoryInfo {
        id: WasteCategory::Paper,
        title: "Paper",
        color: 0xFFA9CBE4,
        description: "Paper, cardboard and paper packaging",
        examples: &["Cardboard boxes", "Newspapers", "Notebooks"],
        instructions: &["Remove staples", "Fold neatly"],
    },
    CategoryInfo {
        id: WasteCategory::Glass,
        title: "Glass",
        color: 0xFFB6E2DA,
        description: "Glass bottles and jars",
        examples: &["Wine bottles", "Jam jars", "Glass containers"],
        instructions: &["Remove the cap", "Rinse"],
    },
    CategoryInfo {
        id: WasteCategory::Metal,
        title: "Metal",
        color: 0xFFC9C7D7,
        description: "Cans, foil and metal packaging",
        examples: &["Drink cans", "Food tins", "Aluminium foil"],
        instructions: &["Remove the label", "Rinse"],
    },
    CategoryInfo {
        id: WasteCategory::Organic,
        title: "Organic",
        color: 0xFFCFC4A8,
        description: "Food scraps and other biodegradable waste",
        examples: &["Fruit peels", "Vegetable scraps", "Coffee grounds"],
        instructions: &["No packaging", "Drain excess liquid"],
    },
    CategoryInfo {
        id: WasteCategory::Mixed,
        title: "Mixed",
        color: 0xFFD9E0E2,
        description: "Mixed and other waste",
        examples: &["Dirty packaging", "Mixed leftovers", "Disposable tableware"],
        instructions: &["If unsure", "Use the general waste bin"],
    },
];

impl CategoryCatalog for StaticCatalog {
    fn lookup(&self, category: WasteCategory) -> CategoryInfo {
        // CATALOG is ordered like WasteCategory::ALL
        CATALOG[category as usize].clone()
    }
}
