const LEARNINGS_HEADER: &str = "===== LEARNINGS FROM PRIOR WAVES =====";
const GUIDANCE_HEADER: &str = "===== HUMAN GUIDANCE =====";

/// Concatenate the spec, prior-wave learnings and optional human guidance
/// into the meta-prompt for one generation job. Empty sections are omitted.
pub fn build_meta_prompt(spec: &str, learnings: &str, human_guidance: Option<&str>) -> String {
    let mut prompt = spec.trim_end().to_string();
    if !learnings.trim().is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(LEARNINGS_HEADER);
        prompt.push('\n');
        prompt.push_str(learnings.trim());
    }
    if let Some(guidance) = human_guidance {
        if !guidance.trim().is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(GUIDANCE_HEADER);
            prompt.push('\n');
            prompt.push_str(guidance.trim());
        }
    }
    prompt
}
