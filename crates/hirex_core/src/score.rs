use std::fmt;

/// Where a fit score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitScore {
    /// The backend sent a numeric score.
    Explicit(u8),
    /// Scaled from the backend's keyword coverage ratio.
    FromCoverage(u8),
    Absent,
}

impl FitScore {
    pub fn value(self) -> Option<u8> {
        match self {
            FitScore::Explicit(score) | FitScore::FromCoverage(score) => Some(score),
            FitScore::Absent => None,
        }
    }
}

/// Prefers an explicit score, else scales a 0..1 coverage ratio to 0..100.
/// Both are rounded half-up and clamped; non-finite inputs count as missing.
pub fn derive_fit_score(explicit: Option<f64>, coverage: Option<f64>) -> FitScore {
    if let Some(score) = explicit.filter(|v| v.is_finite()) {
        return FitScore::Explicit(to_percent(score));
    }
    if let Some(ratio) = coverage.filter(|v| v.is_finite()) {
        return FitScore::FromCoverage(to_percent(ratio * 100.0));
    }
    FitScore::Absent
}

fn to_percent(value: f64) -> u8 {
    (value + 0.5).floor().clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitTier {
    Excellent,
    Strong,
    Moderate,
    Low,
    #[default]
    AwaitingAnalysis,
}

impl FitTier {
    pub fn from_score(score: Option<u8>) -> Self {
        match score {
            Some(s) if s >= 90 => FitTier::Excellent,
            Some(s) if s >= 75 => FitTier::Strong,
            Some(s) if s >= 60 => FitTier::Moderate,
            Some(s) if s > 0 => FitTier::Low,
            _ => FitTier::AwaitingAnalysis,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FitTier::Excellent => "Excellent",
            FitTier::Strong => "Strong",
            FitTier::Moderate => "Moderate",
            FitTier::Low => "Low",
            FitTier::AwaitingAnalysis => "Awaiting Analysis",
        }
    }
}

impl fmt::Display for FitTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
