use crate::config::ClassifierConfig;
use crate::error::ClassificationError;
use crate::parsers::text;
use crate::providers::TextCompletion;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;

/// Outermost brace-delimited span, newlines included
static JSON_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("static regex is valid"));

/// Build the classification prompt for an already-truncated excerpt
pub fn prompt(excerpt: &str) -> String {
    format!(
        "Analyze the following website content and determine the primary type of website.\n\
         Return JSON: {{\"site_type\": \"...\"}}\n\
         Content: {excerpt}"
    )
}

/// Pull `site_type` out of the first JSON object in a provider response.
///
/// The widest `{...}` span is tried first; when that is not valid JSON (two objects,
/// trailing prose with braces) the first complete object is parsed instead.
pub fn parse_site_type(response: &str) -> Result<String, ClassificationError> {
    let span = JSON_SPAN
        .find(response)
        .ok_or(ClassificationError::NoJsonObject)?;

    let value = match serde_json::from_str::<Value>(span.as_str()) {
        Ok(value) => value,
        Err(_) => serde_json::Deserializer::from_str(&response[span.start()..])
            .into_iter::<Value>()
            .next()
            .ok_or(ClassificationError::NoJsonObject)??,
    };

    match value.get("site_type").and_then(Value::as_str).map(str::trim) {
        Some(label) if !label.is_empty() => Ok(label.to_string()),
        _ => Err(ClassificationError::MissingLabel),
    }
}

/// One pass through the retry loop. Lives only as long as `classify`.
#[derive(Debug)]
pub struct ClassificationAttempt {
    pub number: u32,
    pub raw_response: Option<String>,
    pub outcome: Result<String, ClassificationError>,
}

/// Labels a page by asking a text-completion provider, with fixed-delay retries
pub struct SiteClassifier<P> {
    provider: P,
    config: ClassifierConfig,
}

impl<P: TextCompletion> SiteClassifier<P> {
    pub fn new(provider: P, config: ClassifierConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Classify page text. Never fails: after the last failed attempt the
    /// fallback label (default `"other"`) is returned.
    pub async fn classify(&self, content: &str) -> String {
        let excerpt = text::truncate_chars(content, self.config.excerpt_chars);
        let prompt = prompt(excerpt);
        let retry_delay = Duration::from_millis(self.config.retry_delay_ms);

        for number in 1..=self.config.max_attempts {
            if number > 1 {
                tokio::time::sleep(retry_delay).await;
            }

            let attempt = self.attempt(number, &prompt).await;
            match attempt.outcome {
                Ok(label) => return label,
                Err(e) => {
                    ::log::warn!("Classification attempt {} failed: {}", attempt.number, e);
                    if let Some(raw) = &attempt.raw_response {
                        ::log::debug!("Unusable provider response: {}", raw);
                    }
                }
            }
        }

        ::log::warn!(
            "Classification gave up after {} attempt(s); using {:?}",
            self.config.max_attempts,
            self.config.fallback_label
        );
        self.config.fallback_label.clone()
    }

    async fn attempt(&self, number: u32, prompt: &str) -> ClassificationAttempt {
        ::log::info!("[LLM CALL][SiteType] Attempt {}", number);

        match self.provider.complete(prompt).await {
            Ok(raw) => ClassificationAttempt {
                number,
                outcome: parse_site_type(&raw),
                raw_response: Some(raw),
            },
            Err(e) => ClassificationAttempt {
                number,
                raw_response: None,
                outcome: Err(e.into()),
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::error::ProviderError;
    use crate::providers::TextCompletion;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use tokio::time::Instant;

    /// Replays canned responses and records when and with what it was called.
    /// Once the script runs out every call fails.
    #[derive(Default)]
    pub(crate) struct ScriptedProvider {
        script: RefCell<VecDeque<Result<String, ProviderError>>>,
        calls: RefCell<Vec<(Instant, String)>>,
    }

    impl ScriptedProvider {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn reply(self, text: &str) -> Self {
            self.script.borrow_mut().push_back(Ok(text.to_string()));
            self
        }

        pub(crate) fn fail(self) -> Self {
            self.script
                .borrow_mut()
                .push_back(Err(ProviderError::MalformedResponse("boom".to_string())));
            self
        }

        /// Same reply for the next `n` calls
        pub(crate) fn reply_n(self, text: &str, n: usize) -> Self {
            (0..n).fold(self, |p, _| p.reply(text))
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }

        pub(crate) fn call_times(&self) -> Vec<Instant> {
            self.calls.borrow().iter().map(|(t, _)| *t).collect()
        }

        pub(crate) fn prompts(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|(_, p)| p.clone()).collect()
        }
    }

    impl TextCompletion for ScriptedProvider {
        async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
            self.calls
                .borrow_mut()
                .push((Instant::now(), prompt.to_string()));
            self.script.borrow_mut().pop_front().unwrap_or_else(|| {
                Err(ProviderError::MalformedResponse("script exhausted".to_string()))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedProvider;
    use super::*;
    use std::time::Duration;

    fn classifier(provider: ScriptedProvider) -> SiteClassifier<ScriptedProvider> {
        SiteClassifier::new(provider, ClassifierConfig::default())
    }

    #[test]
    fn test_prompt_template() {
        assert_eq!(
            prompt("Fresh bread daily"),
            "Analyze the following website content and determine the primary type of website.\n\
             Return JSON: {\"site_type\": \"...\"}\n\
             Content: Fresh bread daily"
        );
    }

    #[test]
    fn test_parse_site_type() {
        assert_eq!(parse_site_type(r#"{"site_type": "blog"}"#).unwrap(), "blog");
        assert_eq!(
            parse_site_type("Sure! Here you go:\n```json\n{\n  \"site_type\": \"e-commerce\"\n}\n```")
                .unwrap(),
            "e-commerce"
        );
        // Two objects: the first one wins
        assert_eq!(
            parse_site_type(r#"{"site_type": "news"} or maybe {"site_type": "blog"}"#).unwrap(),
            "news"
        );
    }

    #[test]
    fn test_parse_site_type_failures() {
        assert!(matches!(
            parse_site_type("I think it is a blog."),
            Err(ClassificationError::NoJsonObject)
        ));
        assert!(matches!(
            parse_site_type("{not json}"),
            Err(ClassificationError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_site_type(r#"{"type": "blog"}"#),
            Err(ClassificationError::MissingLabel)
        ));
        assert!(matches!(
            parse_site_type(r#"{"site_type": "  "}"#),
            Err(ClassificationError::MissingLabel)
        ));
        assert!(matches!(
            parse_site_type(r#"{"site_type": 3}"#),
            Err(ClassificationError::MissingLabel)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_first_attempt_makes_one_call() {
        let provider = ScriptedProvider::new().reply(r#"{"site_type": "portfolio"}"#);
        let classifier = classifier(provider);

        assert_eq!(classifier.classify("Some page").await, "portfolio");
        assert_eq!(classifier.provider().call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_then_success() {
        let provider = ScriptedProvider::new()
            .fail()
            .reply("no json here")
            .reply(r#"{"site_type": "docs"}"#);
        let classifier = classifier(provider);

        assert_eq!(classifier.classify("Some page").await, "docs");
        assert_eq!(classifier.provider().call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_attempts_fail_falls_back_to_other() {
        let provider = ScriptedProvider::new().fail().fail().fail().reply(r#"{"site_type": "late"}"#);
        let classifier = classifier(provider);

        assert_eq!(classifier.classify("Some page").await, "other");

        let times = classifier.provider().call_times();
        assert_eq!(times.len(), 3);
        assert_eq!(times[1] - times[0], Duration::from_secs(2));
        assert_eq!(times[2] - times[1], Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_excerpt_is_truncated() {
        let provider = ScriptedProvider::new().reply(r#"{"site_type": "wiki"}"#);
        let classifier = classifier(provider);

        let content = "a".repeat(3000) + &"b".repeat(500);
        classifier.classify(&content).await;

        let sent = &classifier.provider().prompts()[0];
        let (_, excerpt) = sent.split_once("Content: ").unwrap();
        assert_eq!(excerpt.len(), 3000);
        assert!(!excerpt.contains('b'));
    }
}
