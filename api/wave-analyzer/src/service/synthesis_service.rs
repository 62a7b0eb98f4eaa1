use crate::app::AppState;
use crate::service::evaluation_service::EvaluatedArtifact;
use crate::service::metrics_service;
use crate::service::{blob_service, model_service};
use tracing::warn;

/// Distill the wave's top artifacts into a learnings document. The model's
/// markdown is passed through untouched; any failure along the way yields
/// an empty document so the wave still reports its scores.
pub async fn synthesize(state: &AppState, top: &[EvaluatedArtifact]) -> String {
    if top.is_empty() {
        return String::new();
    }

    let mut sections = Vec::with_capacity(top.len());
    for artifact in top {
        match blob_service::get_text(&state.config, &artifact.blob_path).await {
            Ok(Some(text)) => sections.push(format!(
                "### Artifact {} (score {:.1})\n{}",
                artifact.id, artifact.quality_score, text
            )),
            Ok(None) => {
                warn!(artifact_id = %artifact.id, path = %artifact.blob_path, "top artifact missing from blob store")
            }
            Err(e) => {
                warn!(artifact_id = %artifact.id, error = %e, "top artifact fetch failed")
            }
        }
    }
    if sections.is_empty() {
        metrics_service::inc_synthesis_failures();
        return String::new();
    }

    let prompt = build_prompt(&sections);
    match model_service::complete(&state.config, &prompt).await {
        Ok(completion) => completion.text,
        Err(e) => {
            warn!(error = %e, "learnings synthesis failed; reporting empty learnings");
            metrics_service::inc_synthesis_failures();
            String::new()
        }
    }
}

fn build_prompt(sections: &[String]) -> String {
    format!(
        "The documents below are the highest-scoring artifacts from one \
         generation wave. Write concise, actionable markdown describing the \
         patterns that made them succeed, generalized so the next wave can \
         apply them. Do not reference artifacts by name.\n\n{}",
        sections.join("\n\n")
    )
}
