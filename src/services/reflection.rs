use std::sync::Arc;
use std::time::Duration;

use super::llm::{GenerationOptions, TextGenerator};

/// Returned whenever the language model cannot produce a reflection.
pub const FALLBACK_REFLECTION: &str = "In the tapestry of your shared day, \
love weaves beautiful patterns of connection and understanding.";

const SYSTEM_PROMPT: &str =
    "You are a relationship counselor and poet who creates beautiful reflections for couples.";

pub fn reflection_prompt(text_a: &str, text_b: &str) -> String {
    format!(
        r#"You are creating a poetic, loving reflection for a couple based on their journal entries from the same day.

First person wrote: "{}"
Second person wrote: "{}"

Create a beautiful, 1-2 sentence reflection that captures the essence of their shared day and emotional connection.
Make it poetic, warm, and insightful about their relationship. Focus on the love and connection between them."#,
        text_a.trim(),
        text_b.trim()
    )
}

/// Turns two partners' journal texts into a shared reflection.
///
/// Generation is best effort: provider errors, empty completions and
/// timeouts all yield [`FALLBACK_REFLECTION`].
#[derive(Clone)]
pub struct ReflectionWriter {
    generator: Arc<dyn TextGenerator>,
    options: GenerationOptions,
    timeout: Duration,
}

impl ReflectionWriter {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        options: GenerationOptions,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            options,
            timeout,
        }
    }

    pub async fn generate_reflection_text(&self, text_a: &str, text_b: &str) -> String {
        let prompt = reflection_prompt(text_a, text_b);
        let call = self.generator.generate(SYSTEM_PROMPT, &prompt, self.options);

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(text)) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(Ok(_)) => {
                tracing::warn!("Empty reflection from language model, using fallback");
                FALLBACK_REFLECTION.to_string()
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Reflection generation failed, using fallback");
                FALLBACK_REFLECTION.to_string()
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Reflection generation timed out, using fallback"
                );
                FALLBACK_REFLECTION.to_string()
            }
        }
    }
}
