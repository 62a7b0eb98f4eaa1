use crate::service::evaluation_service::EvaluatedArtifact;
use std::cmp::Ordering;

/// Select the wave's top performers: `min(5, ceil(0.2 N))` artifacts by
/// score, descending, with ties broken by artifact id ascending so the
/// selection is deterministic.
pub fn top_k(evaluated: &[EvaluatedArtifact]) -> Vec<EvaluatedArtifact> {
    let mut ranked: Vec<&EvaluatedArtifact> = evaluated.iter().collect();
    ranked.sort_by(|a, b| {
        b.quality_score
            .partial_cmp(&a.quality_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked
        .into_iter()
        .take(selection_size(evaluated.len()))
        .cloned()
        .collect()
}

pub fn selection_size(n: usize) -> usize {
    std::cmp::min(5, (n as f64 * 0.2).ceil() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn artifact(id: &str, score: f64) -> EvaluatedArtifact {
        EvaluatedArtifact {
            id: id.to_string(),
            blob_path: format!("artifacts/wave-1/{id}.html"),
            quality_score: score,
            details: json!({}),
        }
    }

    #[test]
    fn selection_size_is_twenty_percent_capped_at_five() {
        assert_eq!(selection_size(0), 0);
        assert_eq!(selection_size(1), 1);
        assert_eq!(selection_size(5), 1);
        assert_eq!(selection_size(10), 2);
        assert_eq!(selection_size(25), 5);
        assert_eq!(selection_size(100), 5);
    }

    #[test]
    fn ranks_by_score_descending() {
        let evaluated = vec![
            artifact("w1-a1", 40.0),
            artifact("w1-a2", 90.0),
            artifact("w1-a3", 70.0),
            artifact("w1-a4", 60.0),
            artifact("w1-a5", 50.0),
            artifact("w1-a6", 55.0),
        ];
        let top = top_k(&evaluated);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].id, "w1-a2");
        assert_eq!(top[1].id, "w1-a3");
    }

    #[test]
    fn ties_break_by_artifact_id_ascending() {
        let evaluated = vec![
            artifact("w1-a3", 80.0),
            artifact("w1-a1", 80.0),
            artifact("w1-a2", 80.0),
            artifact("w1-a4", 10.0),
            artifact("w1-a5", 10.0),
            artifact("w1-a6", 10.0),
        ];
        let top = top_k(&evaluated);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].id, "w1-a1");
        assert_eq!(top[1].id, "w1-a2");
    }

    #[test]
    fn ranking_is_stable_across_input_order() {
        let mut forward = vec![
            artifact("w1-a1", 61.0),
            artifact("w1-a2", 61.0),
            artifact("w1-a3", 85.0),
        ];
        let top_forward = top_k(&forward);
        forward.reverse();
        let top_reverse = top_k(&forward);
        assert_eq!(top_forward[0].id, top_reverse[0].id);
    }
}
