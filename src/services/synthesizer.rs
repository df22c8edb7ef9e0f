//! Stuff-style answer synthesis: every retrieved chunk goes into one prompt.

use std::sync::Arc;

use tracing::debug;

use super::generation::TextGenerator;
use super::index::ScoredChunk;
use crate::error::GenerationError;

const PROMPT_PREAMBLE: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

#[derive(Clone)]
pub struct AnswerSynthesizer {
    generator: Arc<dyn TextGenerator>,
}

impl AnswerSynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Build the prompt, run one generation call, and clean the reply.
    pub async fn synthesize(
        &self,
        question: &str,
        context: &[ScoredChunk],
    ) -> Result<String, GenerationError> {
        let prompt = build_prompt(question, context);
        debug!(
            generator = self.generator.name(),
            chunks = context.len(),
            prompt_chars = prompt.chars().count(),
            "Generating answer"
        );

        let generated = self.generator.generate(&prompt).await?;
        Ok(clean_answer(&prompt, &generated))
    }
}

pub fn build_prompt(question: &str, context: &[ScoredChunk]) -> String {
    let context = context
        .iter()
        .map(|c| c.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{PROMPT_PREAMBLE}\n\n{context}\n\nQuestion: {question}\nHelpful Answer:")
}

/// Completion models return the prompt followed by the continuation. Drop the
/// echoed prompt; keep the raw text when nothing would be left.
pub fn clean_answer(prompt: &str, generated: &str) -> String {
    let answer = generated.strip_prefix(prompt).unwrap_or(generated).trim();
    if answer.is_empty() {
        generated.to_string()
    } else {
        answer.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TextChunk;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct EchoGenerator {
        suffix: &'static str,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(format!("{prompt}{}", self.suffix))
        }

        async fn health_check(&self) -> Result<bool, GenerationError> {
            Ok(true)
        }
    }

    fn scored(index: usize, content: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: TextChunk {
                index,
                start: 0,
                end: content.chars().count(),
                content: content.to_string(),
            },
            score: 1.0,
        }
    }

    #[test]
    fn test_prompt_layout() {
        let prompt = build_prompt(
            "What color is the sky?",
            &[scored(0, "The sky is blue."), scored(1, "Grass is green.")],
        );

        assert!(prompt.starts_with("Use the following pieces of context"));
        assert!(prompt.contains("The sky is blue.\n\nGrass is green."));
        assert!(prompt.ends_with("Question: What color is the sky?\nHelpful Answer:"));
    }

    #[test]
    fn test_prompt_without_context() {
        let prompt = build_prompt("Anything?", &[]);
        assert!(prompt.ends_with("Question: Anything?\nHelpful Answer:"));
    }

    #[test]
    fn test_clean_answer() {
        assert_eq!(clean_answer("Q:", "Q: Blue. "), "Blue.");
        assert_eq!(clean_answer("Q:", "Blue."), "Blue.");
        assert_eq!(clean_answer("Q:", "Q:"), "Q:");
        assert_eq!(clean_answer("Q:", "Q:   "), "Q:   ");
    }

    #[tokio::test]
    async fn test_synthesize_strips_echo() {
        let generator = Arc::new(EchoGenerator {
            suffix: " The sky is blue.",
            prompts: Mutex::new(Vec::new()),
        });
        let synthesizer = AnswerSynthesizer::new(generator.clone());

        let answer = synthesizer
            .synthesize("What color is the sky?", &[scored(0, "The sky is blue.")])
            .await
            .unwrap();

        assert_eq!(answer, "The sky is blue.");
        assert_eq!(generator.prompts.lock().unwrap().len(), 1);
    }
}
