//! Fixed enumerations shared by every pipeline stage.

use serde::{Deserialize, Serialize};

/// Sport taxonomy. Declaration order is the group order of ranked output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Soccer,
    Basketball,
    Hockey,
    Lacrosse,
    Tennis,
    Baseball,
    Softball,
    Running,
    Football,
    Multi,
}

impl Sport {
    pub const ALL: [Sport; 10] = [
        Sport::Soccer,
        Sport::Basketball,
        Sport::Hockey,
        Sport::Lacrosse,
        Sport::Tennis,
        Sport::Baseball,
        Sport::Softball,
        Sport::Running,
        Sport::Football,
        Sport::Multi,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sport::Soccer => "soccer",
            Sport::Basketball => "basketball",
            Sport::Hockey => "hockey",
            Sport::Lacrosse => "lacrosse",
            Sport::Tennis => "tennis",
            Sport::Baseball => "baseball",
            Sport::Softball => "softball",
            Sport::Running => "running",
            Sport::Football => "football",
            Sport::Multi => "multi",
        }
    }
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Footwear,
    Apparel,
    Protective,
    Equipment,
    Bags,
    Accessories,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::Footwear => "footwear",
            Category::Apparel => "apparel",
            Category::Protective => "protective",
            Category::Equipment => "equipment",
            Category::Bags => "bags",
            Category::Accessories => "accessories",
        };
        f.write_str(s)
    }
}

/// Age band a youth-classified deal targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgeBand {
    Youth,
    Junior,
    Kids,
    /// Adult construction in reduced sizing (e.g. hockey "intermediate").
    AdultSizedDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockLevel {
    InStock,
    Limited,
    Out,
}

impl StockLevel {
    /// Lower is more available. Used to pick the best level across a cluster.
    #[must_use]
    pub fn availability_rank(self) -> u8 {
        match self {
            StockLevel::InStock => 0,
            StockLevel::Limited => 1,
            StockLevel::Out => 2,
        }
    }
}

/// Which classification layer decided a deal's youth status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YouthEvidence {
    #[default]
    None,
    /// Conflicting youth and adult signals at the deciding layer.
    Ambiguous,
    CategoryKeyword,
    TitleKeyword,
    Size,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sport_all_is_in_declaration_order() {
        let mut sorted = Sport::ALL;
        sorted.sort();
        assert_eq!(sorted, Sport::ALL);
    }

    #[test]
    fn sport_display_matches_serde_name() {
        for sport in Sport::ALL {
            let json = serde_json::to_string(&sport).unwrap();
            assert_eq!(json, format!("\"{sport}\""));
        }
    }

    #[test]
    fn age_band_serializes_kebab_case() {
        let json = serde_json::to_string(&AgeBand::AdultSizedDown).unwrap();
        assert_eq!(json, "\"adult-sized-down\"");
    }

    #[test]
    fn stock_level_availability_orders_in_stock_first() {
        assert!(StockLevel::InStock.availability_rank() < StockLevel::Limited.availability_rank());
        assert!(StockLevel::Limited.availability_rank() < StockLevel::Out.availability_rank());
    }
}
