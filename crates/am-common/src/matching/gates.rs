/// Outcome of a single hard eligibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// The pairing is excluded; nothing further is scored.
    Fail { reason: String },
    Pass,
}

impl GateDecision {
    pub fn fail(reason: impl Into<String>) -> Self {
        GateDecision::Fail {
            reason: reason.into(),
        }
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, GateDecision::Fail { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            GateDecision::Fail { reason } => Some(reason),
            GateDecision::Pass => None,
        }
    }
}

/// Every check applied to one candidate pairing, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateReport {
    /// False when any check failed.
    pub eligible: bool,
    pub decisions: Vec<(&'static str, GateDecision)>,
}

impl GateReport {
    pub fn new(decisions: Vec<(&'static str, GateDecision)>) -> Self {
        let eligible = !decisions.iter().any(|(_, d)| d.is_fail());

        Self {
            eligible,
            decisions,
        }
    }

    /// Failure reasons joined with `; `, prefixed by the check name.
    pub fn failure_reasons(&self) -> Option<String> {
        let reasons: Vec<_> = self
            .decisions
            .iter()
            .filter_map(|(name, d)| d.reason().map(|r| format!("{name}: {r}")))
            .collect();

        if reasons.is_empty() {
            None
        } else {
            Some(reasons.join("; "))
        }
    }
}
