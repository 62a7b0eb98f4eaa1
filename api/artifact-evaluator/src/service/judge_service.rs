use crate::app::AppState;
use crate::service::metrics_service;
use crate::service::model_service::{self, truncate};
use regex::Regex;
use serde_json::{Value, json};

const DEFAULT_SCORE: f64 = 50.0;

/// Score one artifact with a judge model call. The reply is expected to be
/// a JSON object with `score`, `reasoning`, `strengths` and `improvements`;
/// malformed replies degrade through a regex score scan down to a default
/// of 50 rather than failing the evaluation.
pub async fn run(state: &AppState, artifact: &str, config: &Value) -> Result<Value, String> {
    let prompt = build_prompt(artifact, config);
    let completion = model_service::complete(&state.config, &prompt).await?;
    Ok(parse_reply(&completion.text))
}

fn build_prompt(artifact: &str, config: &Value) -> String {
    let criteria = config
        .get("criteria")
        .and_then(Value::as_str)
        .unwrap_or("overall quality, correctness and polish");
    format!(
        "You are a strict quality judge. Score the artifact below from 0 to 100 \
         against these criteria: {criteria}.\n\
         Respond with a JSON object: \
         {{\"score\": <0-100>, \"reasoning\": \"...\", \"strengths\": [\"...\"], \"improvements\": [\"...\"]}}\n\n\
         ARTIFACT:\n{artifact}"
    )
}

pub fn parse_reply(reply: &str) -> Value {
    let stripped = strip_code_fences(reply);

    if let Ok(Value::Object(mut obj)) = serde_json::from_str::<Value>(&stripped) {
        if let Some(score) = obj.get("score").and_then(Value::as_f64) {
            obj.insert("score".to_string(), json!(score.clamp(0.0, 100.0)));
            return Value::Object(obj);
        }
    }

    if let Some(score) = regex_score(&stripped) {
        metrics_service::inc_judge_parse_fallbacks();
        return json!({
            "score": score.clamp(0.0, 100.0),
            "parse_error": "reply was not valid JSON; score recovered by pattern",
            "raw": truncate(reply, 320),
        });
    }

    metrics_service::inc_judge_parse_fallbacks();
    json!({
        "score": DEFAULT_SCORE,
        "parse_error": "no score found in model reply",
        "raw": truncate(reply, 320),
    })
}

fn strip_code_fences(reply: &str) -> String {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // Drop the fence language tag, then everything after the closing fence.
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim().to_string()
}

fn regex_score(reply: &str) -> Option<f64> {
    let pattern = Regex::new(r#"(?i)"?score"?\s*:\s*(\d+(?:\.\d+)?)"#).ok()?;
    pattern
        .captures(reply)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}
