use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Score report
// ---------------------------------------------------------------------------

/// What the scoring service sends back. Extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoreReport {
    pub predicted_class: String,
    pub addiction_percent: f64,
    /// Per-response keyword sentiment (1 = good, 0 = bad), when provided.
    #[serde(default)]
    pub sentiments: Vec<u8>,
    /// Follow-up advice shown after the summary line.
    #[serde(default)]
    pub conclusion: Option<String>,
}

impl ScoreReport {
    /// The chat line shown once scoring finishes.
    pub fn summary(&self) -> String {
        format!(
            "Analysis complete: {} ({:.1}%)",
            self.predicted_class, self.addiction_percent
        )
    }
}

/// Scores the answers of a finished check-in. Runs off the chat thread.
pub trait ScoringService: Send + Sync {
    fn score(&self, responses: &[String]) -> Result<ScoreReport>;
}

// ---------------------------------------------------------------------------
// Remote scoring
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    responses: &'a [String],
}

/// POSTs `{"responses": [...]}` to an HTTP endpoint.
pub struct HttpScoringClient {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpScoringClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build scoring HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl ScoringService for HttpScoringClient {
    fn score(&self, responses: &[String]) -> Result<ScoreReport> {
        info!(
            "=== SCORING CALL: {} responses -> {} ===",
            responses.len(),
            self.url
        );

        let raw = self
            .client
            .post(&self.url)
            .json(&ScoreRequest { responses })
            .send()
            .with_context(|| format!("scoring request to {} failed", self.url))?
            .error_for_status()
            .context("scoring service returned an error status")?
            .text()
            .context("failed to read scoring response body")?;

        debug!("Scoring response body: {raw}");
        parse_score_report(&raw)
    }
}

pub fn parse_score_report(raw: &str) -> Result<ScoreReport> {
    let report: ScoreReport = serde_json::from_str(raw)
        .with_context(|| format!("failed to parse scoring response: {raw}"))?;
    anyhow::ensure!(
        report.addiction_percent.is_finite(),
        "scoring response has a non-finite percentage"
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Keyword sentiment
// ---------------------------------------------------------------------------

const SENTIMENT_WORDS: [(&str, u8); 11] = [
    ("love", 1),
    ("amazing", 1),
    ("good", 1),
    ("great", 1),
    ("happy", 1),
    ("awesome", 1),
    ("hate", 0),
    ("terrible", 0),
    ("bad", 0),
    ("awful", 0),
    ("sad", 0),
];

/// 1 if the known words in `text` lean positive, else 0. Words are split on
/// whitespace and matched whole, so "good," is not a known word. Text with
/// no known words scores 0.
pub fn keyword_sentiment(text: &str) -> u8 {
    let scores: Vec<u8> = text
        .to_lowercase()
        .split_whitespace()
        .filter_map(|word| {
            SENTIMENT_WORDS
                .iter()
                .find(|(known, _)| *known == word)
                .map(|(_, score)| *score)
        })
        .collect();

    if scores.is_empty() {
        return 0;
    }
    let positive = scores.iter().filter(|s| **s == 1).count();
    u8::from(positive as f64 / scores.len() as f64 >= 0.5)
}

// ---------------------------------------------------------------------------
// Local screening
// ---------------------------------------------------------------------------

/// Offline fallback: counts answers containing "yes". At or above
/// `threshold` the result is flagged as a concern.
pub struct LocalScreening {
    threshold: usize,
}

impl LocalScreening {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }
}

impl Default for LocalScreening {
    fn default() -> Self {
        Self::new(5)
    }
}

impl ScoringService for LocalScreening {
    fn score(&self, responses: &[String]) -> Result<ScoreReport> {
        let total = responses.len();
        let yes = responses
            .iter()
            .filter(|r| r.to_lowercase().contains("yes"))
            .count();
        let sentiments: Vec<u8> = responses.iter().map(|r| keyword_sentiment(r)).collect();
        let addiction_percent = if total == 0 {
            0.0
        } else {
            yes as f64 / total as f64 * 100.0
        };

        let (predicted_class, conclusion) = if yes >= self.threshold {
            (
                "Addiction Concern",
                format!(
                    "Based on your score of {yes} out of {total}, your responses indicate a \
                     **potential for addiction or problematic substance/habit use**. It is highly \
                     recommended that you speak with a healthcare professional or a licensed \
                     counselor for a formal evaluation and support."
                ),
            )
        } else {
            (
                "Lower Risk",
                format!(
                    "Your score is {yes} out of {total}. While this does not indicate an \
                     immediate high risk based on this screening, if you have any concerns about \
                     your habit, you should still consider speaking with a professional."
                ),
            )
        };

        info!("Local screening: {yes} of {total} answers affirmative -> {predicted_class}");
        debug!("Keyword sentiments: {sentiments:?}");
        Ok(ScoreReport {
            predicted_class: predicted_class.into(),
            addiction_percent,
            sentiments,
            conclusion: Some(conclusion),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_parse_score_report_clean() {
        let raw = r#"{"predicted_class": "Addicted", "addiction_percent": 63.456}"#;
        let report = parse_score_report(raw).unwrap();
        assert_eq!(report.predicted_class, "Addicted");
        assert_eq!(report.summary(), "Analysis complete: Addicted (63.5%)");
        assert!(report.sentiments.is_empty());
        assert_eq!(report.conclusion, None);
    }

    #[test]
    fn test_parse_score_report_keeps_sentiments() {
        let raw = r#"{"sentiments": [1, 0, 1], "predicted_class": "Not Addicted", "addiction_percent": 0}"#;
        let report = parse_score_report(raw).unwrap();
        assert_eq!(report.summary(), "Analysis complete: Not Addicted (0.0%)");
        assert_eq!(report.sentiments, vec![1, 0, 1]);
    }

    #[test]
    fn test_parse_score_report_rejects_bad_bodies() {
        assert!(parse_score_report("<html>502 Bad Gateway</html>").is_err());
        assert!(parse_score_report(r#"{"predicted_class": "Addicted"}"#).is_err());
        assert!(parse_score_report(r#"{"predicted_class": 3, "addiction_percent": 1}"#).is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let responses = answers(&["fine", "yes"]);
        let body = serde_json::to_value(ScoreRequest {
            responses: &responses,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"responses": ["fine", "yes"]}));
    }

    #[test]
    fn test_keyword_sentiment() {
        assert_eq!(keyword_sentiment("I feel GOOD today"), 1);
        assert_eq!(keyword_sentiment("I hate homework"), 0);
        assert_eq!(keyword_sentiment("good but sad"), 1);
        assert_eq!(keyword_sentiment("bad awful great"), 0);
        assert_eq!(keyword_sentiment("no idea"), 0);
        assert_eq!(keyword_sentiment("good,"), 0);
    }

    #[test]
    fn test_local_screening_threshold() {
        let screening = LocalScreening::new(2);
        let report = screening.score(&answers(&["yes", "no", "no", "no"])).unwrap();
        assert_eq!(report.predicted_class, "Lower Risk");
        assert_eq!(report.summary(), "Analysis complete: Lower Risk (25.0%)");
        assert!(report
            .conclusion
            .as_deref()
            .unwrap()
            .starts_with("Your score is 1 out of 4."));

        let report = screening
            .score(&answers(&["Yes", "yes!", "no", "YES"]))
            .unwrap();
        assert_eq!(report.predicted_class, "Addiction Concern");
        assert_eq!(report.addiction_percent, 75.0);
        assert!(report
            .conclusion
            .as_deref()
            .unwrap()
            .contains("score of 3 out of 4"));
    }

    #[test]
    fn test_local_screening_reports_sentiments() {
        let report = LocalScreening::default()
            .score(&answers(&["yes I feel good", "no", "sad and bad"]))
            .unwrap();
        assert_eq!(report.sentiments, vec![1, 0, 0]);
    }

    #[test]
    fn test_local_screening_empty_log() {
        let report = LocalScreening::default().score(&[]).unwrap();
        assert_eq!(report.addiction_percent, 0.0);
        assert_eq!(report.predicted_class, "Lower Risk");
    }

    #[test]
    fn test_unreachable_endpoint_is_an_error() {
        let client =
            HttpScoringClient::new("http://127.0.0.1:9/analyze", Duration::from_millis(500))
                .unwrap();
        assert!(client.score(&answers(&["yes"])).is_err());
    }
}
