use crate::module::refinement_run::schema::{CostTracker, TerminationConditions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationDecision {
    AwaitApproval,
    BudgetExceeded,
    Completed(CompletionReason),
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    MaxWaves,
    QualityPlateau,
    ViableCandidates,
}

impl CompletionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxWaves => "max waves reached",
            Self::QualityPlateau => "quality plateau detected",
            Self::ViableCandidates => "viable candidate count reached",
        }
    }
}

/// Evaluate the termination ladder after an analysis report. First match
/// wins; the quality history already includes the wave that just finished.
pub fn evaluate(
    conditions: &TerminationConditions,
    current_wave: u32,
    cost: &CostTracker,
    quality_history: &[f64],
    viable_candidates: u32,
) -> TerminationDecision {
    if conditions.manual_approval.unwrap_or(false) {
        return TerminationDecision::AwaitApproval;
    }
    if let Some(max_cost) = conditions.max_cost_usd {
        if cost.estimated_cost_usd >= max_cost {
            return TerminationDecision::BudgetExceeded;
        }
    }
    if let Some(max_waves) = conditions.max_waves {
        if current_wave >= max_waves {
            return TerminationDecision::Completed(CompletionReason::MaxWaves);
        }
    }
    if let Some(plateau) = &conditions.quality_plateau {
        if plateau_fired(quality_history, plateau.waves, plateau.delta) {
            return TerminationDecision::Completed(CompletionReason::QualityPlateau);
        }
    }
    if let Some(min_viable) = conditions.min_viable_candidates {
        if viable_candidates >= min_viable {
            return TerminationDecision::Completed(CompletionReason::ViableCandidates);
        }
    }
    TerminationDecision::Continue
}

/// The plateau window is the last `waves + 1` best scores; it fires when the
/// best score across the trailing `waves` entries improved on the window's
/// first entry by less than `delta`.
pub fn plateau_fired(quality_history: &[f64], waves: u32, delta: f64) -> bool {
    let window = waves as usize + 1;
    if waves == 0 || quality_history.len() < window {
        return false;
    }
    let tail = &quality_history[quality_history.len() - window..];
    let first = tail[0];
    let best_after = tail[1..].iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    best_after - first < delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::refinement_run::schema::QualityPlateau;

    fn conditions() -> TerminationConditions {
        TerminationConditions::default()
    }

    #[test]
    fn manual_approval_wins_over_everything() {
        let c = TerminationConditions {
            manual_approval: Some(true),
            max_waves: Some(1),
            max_cost_usd: Some(0.0),
            ..conditions()
        };
        assert_eq!(
            evaluate(&c, 5, &CostTracker::default(), &[], 0),
            TerminationDecision::AwaitApproval
        );
    }

    #[test]
    fn budget_checked_before_wave_cap() {
        let c = TerminationConditions {
            max_waves: Some(1),
            max_cost_usd: Some(0.5),
            ..conditions()
        };
        let cost = CostTracker {
            total_tokens: 1_000_000,
            estimated_cost_usd: 0.6,
        };
        assert_eq!(
            evaluate(&c, 1, &cost, &[], 0),
            TerminationDecision::BudgetExceeded
        );
    }

    #[test]
    fn wave_cap_completes() {
        let c = TerminationConditions {
            max_waves: Some(3),
            ..conditions()
        };
        assert_eq!(
            evaluate(&c, 3, &CostTracker::default(), &[50.0, 60.0, 70.0], 0),
            TerminationDecision::Completed(CompletionReason::MaxWaves)
        );
        assert_eq!(
            evaluate(&c, 2, &CostTracker::default(), &[50.0, 60.0], 0),
            TerminationDecision::Continue
        );
    }

    #[test]
    fn plateau_needs_full_window() {
        assert!(!plateau_fired(&[80.0], 1, 0.5));
        assert!(plateau_fired(&[80.0, 80.2], 1, 0.5));
        assert!(!plateau_fired(&[80.0, 81.0], 1, 0.5));
    }

    #[test]
    fn plateau_uses_best_of_trailing_entries() {
        // Window of 3: first 80, trailing best 80.3.
        assert!(plateau_fired(&[70.0, 80.0, 80.3, 80.1], 2, 0.5));
        assert!(!plateau_fired(&[70.0, 80.0, 80.3, 81.0], 2, 0.5));
    }

    #[test]
    fn plateau_decision_fires_from_ladder() {
        let c = TerminationConditions {
            max_waves: Some(5),
            quality_plateau: Some(QualityPlateau {
                waves: 1,
                delta: 0.5,
            }),
            ..conditions()
        };
        assert_eq!(
            evaluate(&c, 2, &CostTracker::default(), &[80.0, 80.2], 0),
            TerminationDecision::Completed(CompletionReason::QualityPlateau)
        );
    }

    #[test]
    fn viable_candidates_complete_cumulatively() {
        let c = TerminationConditions {
            min_viable_candidates: Some(2),
            ..conditions()
        };
        assert_eq!(
            evaluate(&c, 4, &CostTracker::default(), &[82.0], 2),
            TerminationDecision::Completed(CompletionReason::ViableCandidates)
        );
        assert_eq!(
            evaluate(&c, 4, &CostTracker::default(), &[82.0], 1),
            TerminationDecision::Continue
        );
    }

    #[test]
    fn no_conditions_means_continue() {
        assert_eq!(
            evaluate(&conditions(), 9, &CostTracker::default(), &[10.0], 0),
            TerminationDecision::Continue
        );
    }
}
