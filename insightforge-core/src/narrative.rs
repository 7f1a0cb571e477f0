//! Narrative summaries through an injected text-completion client.
//!
//! The analysis pipeline never calls this module. Callers that want a prose
//! summary pass their own [`TextCompletion`] implementation; any failure or
//! empty answer falls back to the deterministic executive summary overview.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::models::AnalysisResult;

/// Most insights quoted in a prompt.
const MAX_PROMPT_INSIGHTS: usize = 5;

/// Text-completion collaborator, such as a hosted language model.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Completes the prompt and returns the generated text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Where the narrative text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeSource {
    /// Produced by the completion client
    Model,
    /// Deterministic executive summary overview
    Fallback,
}

/// A prose summary of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub text: String,
    pub source: NarrativeSource,
}

/// Builds the completion prompt for a report.
pub fn build_prompt(report: &AnalysisResult) -> String {
    let summary = &report.executive_summary;
    let mut prompt = format!(
        "Summarize the following analysis of '{}' ({} rows, {} columns) for a {} audience \
         in one short paragraph.\n\nOverview: {}\n",
        report.metadata.filename,
        report.metadata.total_rows,
        report.metadata.total_columns,
        report.metadata.department,
        summary.overview
    );

    if !report.insights.is_empty() {
        prompt.push_str("\nKey insights:\n");
        for insight in report.insights.iter().take(MAX_PROMPT_INSIGHTS) {
            prompt.push_str(&format!(
                "- [{}] {}: {}\n",
                insight.impact, insight.title, insight.description
            ));
        }
    }

    if !summary.next_steps.is_empty() {
        prompt.push_str(&format!("\nNext steps: {}\n", summary.next_steps.join("; ")));
    }

    prompt
}

/// Asks the client for a narrative, falling back to the summary overview.
pub async fn narrate_summary(client: &dyn TextCompletion, report: &AnalysisResult) -> Narrative {
    let prompt = build_prompt(report);

    match client.complete(&prompt).await {
        Ok(text) if !text.trim().is_empty() => Narrative {
            text: text.trim().to_string(),
            source: NarrativeSource::Model,
        },
        Ok(_) => {
            tracing::warn!("Text completion returned no content; using summary overview");
            fallback(report)
        }
        Err(e) => {
            tracing::warn!("Text completion failed: {}; using summary overview", e);
            fallback(report)
        }
    }
}

fn fallback(report: &AnalysisResult) -> Narrative {
    Narrative {
        text: report.executive_summary.overview.clone(),
        source: NarrativeSource::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InsightError;
    use crate::analysis::CsvAnalyzer;
    use crate::config::AnalysisConfig;
    use std::sync::Mutex;

    struct Recording {
        prompts: Mutex<Vec<String>>,
        reply: Result<String>,
    }

    impl Recording {
        fn replying(reply: Result<String>) -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                reply,
            }
        }
    }

    #[async_trait]
    impl TextCompletion for Recording {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(InsightError::completion(e.to_string())),
            }
        }
    }

    fn report() -> AnalysisResult {
        let csv = b"deal_value,stage\n1000,won\n1500,lost\n9000,won\n";
        CsvAnalyzer::new(AnalysisConfig::new().with_department("sales"))
            .unwrap()
            .analyze_bytes(csv, "pipeline.csv")
            .unwrap()
    }

    #[tokio::test]
    async fn test_model_narrative() {
        let client = Recording::replying(Ok("  Deals are healthy.  ".to_string()));
        let report = report();

        let narrative = narrate_summary(&client, &report).await;

        assert_eq!(narrative.source, NarrativeSource::Model);
        assert_eq!(narrative.text, "Deals are healthy.");

        let prompts = client.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("pipeline.csv"));
        assert!(prompts[0].contains("Deal Size Analysis"));
    }

    #[tokio::test]
    async fn test_fallback_on_error() {
        let client = Recording::replying(Err(InsightError::completion("offline")));
        let report = report();

        let narrative = narrate_summary(&client, &report).await;

        assert_eq!(narrative.source, NarrativeSource::Fallback);
        assert_eq!(narrative.text, report.executive_summary.overview);
    }

    #[tokio::test]
    async fn test_fallback_on_blank_reply() {
        let client = Recording::replying(Ok("   ".to_string()));

        let narrative = narrate_summary(&client, &report()).await;

        assert_eq!(narrative.source, NarrativeSource::Fallback);
    }

    #[test]
    fn test_prompt_lists_next_steps() {
        let prompt = build_prompt(&report());
        let next_steps = prompt.lines().find(|l| l.starts_with("Next steps: ")).unwrap();
        assert!(next_steps.contains("Optimize Sales Pipeline Management"));
    }
}
