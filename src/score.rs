use std::fmt;

/// Quality tier for an AI match score. Ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchTier {
    Poor,
    Fair,
    Good,
    Excellent,
}

// Inclusive lower bounds, checked from the top down.
const THRESHOLDS: [(f64, MatchTier); 3] = [
    (80.0, MatchTier::Excellent),
    (65.0, MatchTier::Good),
    (50.0, MatchTier::Fair),
];

impl MatchTier {
    pub fn classify(score: f64) -> Self {
        THRESHOLDS
            .iter()
            .find(|(floor, _)| score >= *floor)
            .map(|(_, tier)| *tier)
            .unwrap_or(MatchTier::Poor)
    }

    /// Tier for an optional score. Unranked candidates get no tier at all.
    pub fn for_score(score: Option<f64>) -> Option<Self> {
        score.map(Self::classify)
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchTier::Excellent => "Excellent Match",
            MatchTier::Good => "Good Match",
            MatchTier::Fair => "Fair Match",
            MatchTier::Poor => "Poor Match",
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
