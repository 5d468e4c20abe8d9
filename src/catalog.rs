//! Fruit catalog
//!
//! Ordered tier table from the smallest fruit (index 0) to the terminal one.
//! Two fruits of tier `i` merge into one of tier `i + 1`; the last tier never merges.

use serde::{Deserialize, Serialize};

/// A single fruit tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    /// Display name (also the sprite label)
    pub name: String,
    /// Disc radius in container pixels
    pub radius: f32,
    /// Points awarded when a merge produces this tier
    pub score: u64,
    /// Sprite path served next to the page
    pub asset: String,
}

impl Tier {
    fn new(name: &str, radius: f32, score: u64) -> Self {
        Self {
            name: name.to_string(),
            radius,
            score,
            asset: format!("assets/{name}.png"),
        }
    }
}

/// Catalog validation failures
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// No tiers at all
    #[error("fruit catalog is empty")]
    Empty,

    /// Radius is zero, negative or not finite
    #[error("tier {index} has invalid radius {radius}")]
    InvalidRadius { index: usize, radius: f32 },

    /// Radii must grow strictly with the tier index
    #[error("tier {index} radius {radius} does not exceed previous radius {previous}")]
    NonIncreasingRadius {
        index: usize,
        radius: f32,
        previous: f32,
    },

    /// Every tier must be worth something
    #[error("tier {index} has a zero score value")]
    ZeroScore { index: usize },
}

/// Immutable, validated tier list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FruitCatalog {
    tiers: Vec<Tier>,
}

impl Default for FruitCatalog {
    fn default() -> Self {
        Self::classic()
    }
}

impl FruitCatalog {
    /// Build a catalog, checking the tier invariants
    pub fn new(tiers: Vec<Tier>) -> Result<Self, CatalogError> {
        if tiers.is_empty() {
            return Err(CatalogError::Empty);
        }

        for (index, tier) in tiers.iter().enumerate() {
            if !tier.radius.is_finite() || tier.radius <= 0.0 {
                return Err(CatalogError::InvalidRadius {
                    index,
                    radius: tier.radius,
                });
            }
            if tier.score == 0 {
                return Err(CatalogError::ZeroScore { index });
            }
            if index > 0 {
                let previous = tiers[index - 1].radius;
                if tier.radius <= previous {
                    return Err(CatalogError::NonIncreasingRadius {
                        index,
                        radius: tier.radius,
                        previous,
                    });
                }
            }
        }

        Ok(Self { tiers })
    }

    /// The classic eleven fruits, cherry to watermelon
    pub fn classic() -> Self {
        Self {
            tiers: vec![
                Tier::new("cherry", 15.0, 1),
                Tier::new("strawberry", 22.0, 3),
                Tier::new("grape", 30.0, 6),
                Tier::new("dekopon", 37.0, 10),
                Tier::new("persimmon", 46.0, 15),
                Tier::new("apple", 56.0, 21),
                Tier::new("pear", 67.0, 28),
                Tier::new("peach", 79.0, 36),
                Tier::new("pineapple", 92.0, 45),
                Tier::new("melon", 106.0, 55),
                Tier::new("watermelon", 121.0, 66),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Always false for a validated catalog
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tier> {
        self.tiers.get(index)
    }

    /// Index of the largest fruit (has no merge target)
    pub fn terminal(&self) -> usize {
        self.tiers.len() - 1
    }

    pub fn is_terminal(&self, index: usize) -> bool {
        index >= self.terminal()
    }

    /// Tier produced by merging two fruits of `index`, if any
    pub fn merge_target(&self, index: usize) -> Option<usize> {
        if index < self.terminal() {
            Some(index + 1)
        } else {
            None
        }
    }

    /// Radius of a tier (0 for unknown indices)
    pub fn radius(&self, index: usize) -> f32 {
        self.tiers.get(index).map(|t| t.radius).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tier> {
        self.tiers.iter()
    }
}

impl<'de> Deserialize<'de> for FruitCatalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            tiers: Vec<Tier>,
        }

        let raw = Raw::deserialize(deserializer)?;
        FruitCatalog::new(raw.tiers).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_catalog_is_valid() {
        let classic = FruitCatalog::classic();
        let rebuilt = FruitCatalog::new(classic.iter().cloned().collect()).unwrap();
        assert_eq!(rebuilt.len(), 11);
        assert_eq!(rebuilt.terminal(), 10);
        assert_eq!(rebuilt.get(0).unwrap().name, "cherry");
        assert_eq!(rebuilt.get(10).unwrap().name, "watermelon");
        assert_eq!(rebuilt.get(1).unwrap().score, 3);
    }

    #[test]
    fn test_merge_target() {
        let catalog = FruitCatalog::classic();
        assert_eq!(catalog.merge_target(0), Some(1));
        assert_eq!(catalog.merge_target(9), Some(10));
        assert_eq!(catalog.merge_target(10), None);
        assert!(catalog.is_terminal(10));
        assert!(!catalog.is_terminal(9));
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(FruitCatalog::new(Vec::new()), Err(CatalogError::Empty));
    }

    #[test]
    fn test_rejects_non_increasing_radius() {
        let tiers = vec![Tier::new("a", 10.0, 1), Tier::new("b", 10.0, 2)];
        assert!(matches!(
            FruitCatalog::new(tiers),
            Err(CatalogError::NonIncreasingRadius { index: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_zero_score() {
        let tiers = vec![Tier::new("a", 10.0, 0)];
        assert_eq!(
            FruitCatalog::new(tiers),
            Err(CatalogError::ZeroScore { index: 0 })
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{"tiers":[
            {"name":"a","radius":10.0,"score":1,"asset":"a.png"},
            {"name":"b","radius":5.0,"score":2,"asset":"b.png"}
        ]}"#;
        assert!(serde_json::from_str::<FruitCatalog>(json).is_err());

        let json = r#"{"tiers":[{"name":"a","radius":10.0,"score":1,"asset":"a.png"}]}"#;
        let catalog: FruitCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.terminal(), 0);
        assert_eq!(catalog.merge_target(0), None);
    }
}
