//! Level-of-detail tiers and mesher detail levels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One fidelity tier of a converted primitive.
///
/// `Lod1` through `Lod4` are ordered by decreasing detail. `Physics` is a
/// separate, non-visual tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LodTier {
    /// Collision geometry.
    Physics = 0,
    /// Highest detail; what a plain primitive produces.
    Lod1 = 1,
    /// Medium detail.
    Lod2 = 2,
    /// Low detail.
    Lod3 = 3,
    /// Lowest detail.
    Lod4 = 4,
}

impl LodTier {
    /// Number of tiers.
    pub const COUNT: usize = 5;

    /// All tiers, physics first then visual tiers by decreasing detail.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Physics,
        Self::Lod1,
        Self::Lod2,
        Self::Lod3,
        Self::Lod4,
    ];

    /// Visual tiers by decreasing detail.
    pub const VISUAL: [Self; 4] = [Self::Lod1, Self::Lod2, Self::Lod3, Self::Lod4];

    /// Slot index for fixed-size tier tables.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// True for every tier except `Physics`.
    #[inline]
    #[must_use]
    pub const fn is_visual(self) -> bool {
        !matches!(self, Self::Physics)
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Physics => "physics",
            Self::Lod1 => "lod1",
            Self::Lod2 => "lod2",
            Self::Lod3 => "lod3",
            Self::Lod4 => "lod4",
        }
    }
}

impl fmt::Display for LodTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Quality requested from the external mesher.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum DetailLevel {
    /// Fewest facets.
    Low = 0,
    /// Medium.
    Medium = 1,
    /// High.
    High = 2,
    /// Most facets.
    #[default]
    Highest = 3,
}

impl DetailLevel {
    /// The value folded into the content hash for this level.
    #[inline]
    #[must_use]
    pub fn as_hash_value(self) -> f32 {
        f32::from(self as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_order() {
        assert!(LodTier::Lod1 < LodTier::Lod2);
        assert!(LodTier::Lod3 < LodTier::Lod4);
        assert!(!LodTier::Physics.is_visual());
        assert!(LodTier::VISUAL.iter().all(|t| t.is_visual()));
    }

    #[test]
    fn test_indices_are_unique() {
        let mut seen = [false; LodTier::COUNT];
        for tier in LodTier::ALL {
            assert!(!seen[tier.index()]);
            seen[tier.index()] = true;
        }
    }

    #[test]
    fn test_detail_hash_value() {
        assert_eq!(DetailLevel::Highest.as_hash_value(), 3.0);
        assert_eq!(DetailLevel::Low.as_hash_value(), 0.0);
    }
}
