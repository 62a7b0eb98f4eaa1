use regex::Regex;
use serde_json::{Value, json};

const ERROR_WEIGHT: f64 = 10.0;
const WARNING_WEIGHT: f64 = 2.0;

/// Static lint pass over the artifact text. The scorecard config supplies
/// `error_patterns` and `warning_patterns` regex lists; every match counts
/// as one issue. Errors cost 10 points each, warnings 2, floored at 0 and
/// capped at 100. An empty artifact has no issues and scores 100.
pub fn run(artifact: &str, config: &Value) -> Result<Value, String> {
    let error_patterns = compile_patterns(config, "error_patterns")?;
    let warning_patterns = compile_patterns(config, "warning_patterns")?;

    let error_count = count_matches(artifact, &error_patterns);
    let warning_count = count_matches(artifact, &warning_patterns);

    let score = (100.0 - ERROR_WEIGHT * error_count as f64 - WARNING_WEIGHT * warning_count as f64)
        .clamp(0.0, 100.0);

    Ok(json!({
        "score": score,
        "error_count": error_count,
        "warning_count": warning_count,
    }))
}

fn compile_patterns(config: &Value, key: &str) -> Result<Vec<Regex>, String> {
    let Some(raw) = config.get(key) else {
        return Ok(Vec::new());
    };
    let patterns = raw
        .as_array()
        .ok_or_else(|| format!("{key} must be an array of patterns"))?;
    patterns
        .iter()
        .map(|p| {
            let pattern = p
                .as_str()
                .ok_or_else(|| format!("{key} entries must be strings"))?;
            Regex::new(pattern).map_err(|e| format!("invalid pattern in {key}: {e}"))
        })
        .collect()
}

fn count_matches(artifact: &str, patterns: &[Regex]) -> usize {
    if artifact.is_empty() {
        return 0;
    }
    patterns.iter().map(|p| p.find_iter(artifact).count()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_scores_full_marks() {
        let result = run("", &json!({"error_patterns": ["TODO"]})).expect("lint");
        assert_eq!(result["score"], 100.0);
        assert_eq!(result["error_count"], 0);
    }

    #[test]
    fn issues_are_weighted_ten_and_two() {
        let config = json!({
            "error_patterns": ["<script>"],
            "warning_patterns": ["style="],
        });
        let artifact = "<script>bad()</script><div style=\"x\"><p style=\"y\">";
        let result = run(artifact, &config).expect("lint");
        // One error (10) and two warnings (4).
        assert_eq!(result["score"], 86.0);
        assert_eq!(result["error_count"], 1);
        assert_eq!(result["warning_count"], 2);
    }

    #[test]
    fn score_floors_at_zero() {
        let config = json!({"error_patterns": ["x"]});
        let artifact = "x".repeat(50);
        let result = run(&artifact, &config).expect("lint");
        assert_eq!(result["score"], 0.0);
    }

    #[test]
    fn no_patterns_means_clean_pass() {
        let result = run("<html></html>", &json!({})).expect("lint");
        assert_eq!(result["score"], 100.0);
    }

    #[test]
    fn invalid_pattern_is_a_handler_error() {
        let config = json!({"error_patterns": ["("]});
        assert!(run("anything", &config).is_err());
    }
}
