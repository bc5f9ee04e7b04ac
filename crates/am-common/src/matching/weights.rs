/// Default blend for the composite compatibility score.
/// Personality carries the most weight, location and budget are soft signals.
pub const DEFAULT_WEIGHTS: MatchingWeights = MatchingWeights {
    personality: 0.40,
    activity: 0.30,
    availability: 0.20,
    location: 0.05,
    budget: 0.05,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchingWeights {
    pub personality: f64,
    pub activity: f64,
    pub availability: f64,
    pub location: f64,
    pub budget: f64,
}

impl Default for MatchingWeights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

impl MatchingWeights {
    pub fn sum(&self) -> f64 {
        self.personality + self.activity + self.availability + self.location + self.budget
    }

    /// Overrides individual weights from `AM_WEIGHT_*` variables. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let read = |name: &str, fallback: f64| {
            std::env::var(name)
                .ok()
                .and_then(|raw| raw.parse::<f64>().ok())
                .filter(|value| value.is_finite() && *value >= 0.0)
                .unwrap_or(fallback)
        };

        Self {
            personality: read("AM_WEIGHT_PERSONALITY", DEFAULT_WEIGHTS.personality),
            activity: read("AM_WEIGHT_ACTIVITY", DEFAULT_WEIGHTS.activity),
            availability: read("AM_WEIGHT_AVAILABILITY", DEFAULT_WEIGHTS.availability),
            location: read("AM_WEIGHT_LOCATION", DEFAULT_WEIGHTS.location),
            budget: read("AM_WEIGHT_BUDGET", DEFAULT_WEIGHTS.budget),
        }
    }
}
