// LLM access: text generation trait, Gemini client, listing structuring

pub mod gemini;
pub mod structuring;

use crate::model::AiError;

pub use gemini::GeminiClient;

#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

/// Slice of `text` from the first `{` to the last `}`. Models tend to wrap JSON in
/// prose or code fences.
pub fn extract_json_object(text: &str) -> Result<&str, AiError> {
    let start = text.find('{').ok_or(AiError::NoJson)?;
    let end = text.rfind('}').ok_or(AiError::NoJson)?;
    if end < start {
        return Err(AiError::NoJson);
    }
    Ok(&text[start..=end])
}

#[cfg(test)]
pub mod scripted {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses in order; `None` entries fail the call.
    pub struct ScriptedModel {
        responses: Mutex<VecDeque<Option<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        pub fn new<I, S>(responses: I) -> Self
        where
            I: IntoIterator<Item = Option<S>>,
            S: Into<String>,
        {
            Self {
                responses: Mutex::new(responses.into_iter().map(|r| r.map(Into::into)).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl LanguageModel for ScriptedModel {
        async fn generate(&self, prompt: &str) -> Result<String, AiError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.responses.lock().unwrap().pop_front() {
                Some(Some(text)) => Ok(text),
                Some(None) => Err(AiError::Status {
                    status: 503,
                    body: "overloaded".into(),
                }),
                None => Err(AiError::EmptyResponse),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_cut_out_of_fenced_output() {
        let text = "Here you go:\n```json\n{\"title\": \"Casa\", \"nested\": {\"a\": 1}}\n```\n";
        assert_eq!(
            extract_json_object(text).unwrap(),
            "{\"title\": \"Casa\", \"nested\": {\"a\": 1}}"
        );
    }

    #[test]
    fn missing_json_is_an_error() {
        assert!(matches!(extract_json_object("no data"), Err(AiError::NoJson)));
        assert!(matches!(extract_json_object("} backwards {"), Err(AiError::NoJson)));
    }
}
