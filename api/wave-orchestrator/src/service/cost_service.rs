use crate::config::environment::AppConfig;
use crate::module::refinement_run::schema::{CostMetrics, CostTracker};

/// Projected USD cost of dispatching one more wave. Uses the running average
/// tokens-per-artifact once at least one generation has completed; the
/// configured default before that. The same unit price feeds accumulation so
/// a run can never overspend its own estimate by more than one wave.
pub fn estimate_next_wave_cost(
    config: &AppConfig,
    cost: &CostTracker,
    completed_generations: usize,
) -> f64 {
    let avg_tokens = if completed_generations > 0 {
        cost.total_tokens as f64 / completed_generations as f64
    } else {
        config.default_tokens_per_artifact as f64
    };
    config.generator_count_per_wave as f64 * avg_tokens * config.unit_token_price_usd
}

pub fn within_budget(
    config: &AppConfig,
    cost: &CostTracker,
    completed_generations: usize,
    max_cost_usd: Option<f64>,
) -> bool {
    let Some(max_cost) = max_cost_usd else {
        return true;
    };
    let estimate = estimate_next_wave_cost(config, cost, completed_generations);
    cost.estimated_cost_usd + estimate <= max_cost
}

pub fn accumulate(config: &AppConfig, cost: &mut CostTracker, usage: &CostMetrics) {
    let tokens = usage.prompt_tokens + usage.completion_tokens;
    cost.total_tokens += tokens;
    cost.estimated_cost_usd += tokens as f64 * config.unit_token_price_usd;
}
