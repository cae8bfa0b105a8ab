//! Filter contexts for the two pipeline specializations.
//!
//! An input context transforms the conversation before the agent runs; an
//! output context transforms what the agent produced. Both expose the same
//! expression surface, built purely on `map_latest`.

use crate::conversation::{Message, Transcript};
use crate::error::FilterError;
use crate::filter::{AgentFilter, SubstitutionFilter};
use crate::resolver::{DependencyResolver, FilterRegistry};
use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;

/// Shared expression surface of the input and output filter contexts.
///
/// Every combinator rebinds the context's owned transcript; the previous
/// value is left untouched for anyone still holding it.
#[async_trait]
pub trait FilterContext: Send {
    /// The transcript this context currently owns.
    fn current(&self) -> &Transcript;

    /// Replace the owned transcript with a transformed one.
    fn rebind(&mut self, transcript: Transcript);

    /// Hook used to resolve filters declared by capability key.
    fn resolver(&self) -> &Arc<dyn DependencyResolver>;

    /// Apply a filter to every message of the owned transcript.
    async fn map_all(&mut self, filter: &dyn AgentFilter) -> Result<(), FilterError> {
        let next = self.current().map_all(filter).await?;
        self.rebind(next);
        Ok(())
    }

    /// Apply a filter to the most recent message of the owned transcript.
    async fn map_latest(&mut self, filter: &dyn AgentFilter) -> Result<(), FilterError> {
        let next = self.current().map_latest(filter).await?;
        self.rebind(next);
        Ok(())
    }

    /// Replace every occurrence of a literal in the latest message.
    async fn replace(
        &mut self,
        needle: &str,
        replacement: &str,
    ) -> Result<(), FilterError> {
        self.map_latest(&SubstitutionFilter::replace(needle, replacement))
            .await
    }

    /// Replace every match of a pattern in the latest message.
    async fn replace_pattern(
        &mut self,
        pattern: Regex,
        replacement: &str,
    ) -> Result<(), FilterError> {
        self.map_latest(&SubstitutionFilter::replace_pattern(pattern, replacement))
            .await
    }

    /// Delete every occurrence of a literal from the latest message.
    async fn remove(&mut self, needle: &str) -> Result<(), FilterError> {
        self.map_latest(&SubstitutionFilter::delete(needle)).await
    }

    /// Delete every match of a pattern from the latest message.
    async fn remove_pattern(&mut self, pattern: Regex) -> Result<(), FilterError> {
        self.map_latest(&SubstitutionFilter::delete_pattern(pattern))
            .await
    }

    /// Run a filter instance against the latest message.
    async fn apply(&mut self, filter: &dyn AgentFilter) -> Result<(), FilterError> {
        self.map_latest(filter).await
    }

    /// Resolve a filter by capability key, then run it against the latest
    /// message.
    async fn apply_registered(&mut self, key: &str) -> Result<(), FilterError> {
        let filter = self
            .resolver()
            .resolve_filter(key)
            .map_err(|e| FilterError::new(key, e.to_string()))?;
        self.map_latest(filter.as_ref()).await
    }
}

/// Transforms the conversation before agent invocation.
pub struct InputFilterContext {
    input: Transcript,
    resolver: Arc<dyn DependencyResolver>,
}

impl InputFilterContext {
    pub fn new(input: Transcript) -> Self {
        Self::with_resolver(input, Arc::new(FilterRegistry::new()))
    }

    pub fn with_resolver(input: Transcript, resolver: Arc<dyn DependencyResolver>) -> Self {
        Self { input, resolver }
    }

    /// The message the agent is about to respond to.
    pub fn input_message(&self) -> Option<&Message> {
        self.input.latest()
    }

    /// Replace the most recent message of the request transcript.
    pub fn set_input_message(&mut self, message: Message) {
        self.input = self.input.drop_latest().append(message);
    }

    /// Consume the context, yielding the transformed request transcript.
    pub fn into_transcript(self) -> Transcript {
        self.input
    }
}

#[async_trait]
impl FilterContext for InputFilterContext {
    fn current(&self) -> &Transcript {
        &self.input
    }

    fn rebind(&mut self, transcript: Transcript) {
        self.input = transcript;
    }

    fn resolver(&self) -> &Arc<dyn DependencyResolver> {
        &self.resolver
    }
}

/// Transforms the conversation after agent invocation.
///
/// `input` is the pre-invocation transcript; `output` is `input` plus the
/// generated message(s). Setting a new output message always means "base
/// transcript plus this message", never an edit of the output's history.
pub struct OutputFilterContext {
    input: Transcript,
    output: Transcript,
    system_prompt: String,
    resolver: Arc<dyn DependencyResolver>,
}

impl OutputFilterContext {
    pub fn new(input: Transcript, output: Transcript, system_prompt: impl Into<String>) -> Self {
        Self::with_resolver(input, output, system_prompt, Arc::new(FilterRegistry::new()))
    }

    pub fn with_resolver(
        input: Transcript,
        output: Transcript,
        system_prompt: impl Into<String>,
        resolver: Arc<dyn DependencyResolver>,
    ) -> Self {
        Self {
            input,
            output,
            system_prompt: system_prompt.into(),
            resolver,
        }
    }

    /// The pre-invocation transcript.
    pub fn input(&self) -> &Transcript {
        &self.input
    }

    /// The system prompt the agent was invoked with.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// The message generated by the agent.
    pub fn output_message(&self) -> Option<&Message> {
        self.output.latest()
    }

    /// Replace the generated message: base transcript plus `message`.
    pub fn set_output_message(&mut self, message: Message) {
        self.output = self.input.append(message);
    }

    /// Consume the context, yielding the transformed output transcript.
    pub fn into_transcript(self) -> Transcript {
        self.output
    }
}

#[async_trait]
impl FilterContext for OutputFilterContext {
    fn current(&self) -> &Transcript {
        &self.output
    }

    fn rebind(&mut self, transcript: Transcript) {
        self.output = transcript;
    }

    fn resolver(&self) -> &Arc<dyn DependencyResolver> {
        &self.resolver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FnFilter;

    fn transcript(contents: &[&str]) -> Transcript {
        contents.iter().map(|c| Message::user(*c)).collect()
    }

    #[tokio::test]
    async fn test_input_replace_touches_latest_only() {
        let mut ctx = InputFilterContext::new(transcript(&["secret plans", "tell me a secret"]));
        ctx.replace("secret", "[redacted]").await.unwrap();

        let result = ctx.into_transcript();
        assert_eq!(result.messages()[0].content, "secret plans");
        assert_eq!(result.messages()[1].content, "tell me a [redacted]");
    }

    #[tokio::test]
    async fn test_input_remove_pattern() {
        let mut ctx = InputFilterContext::new(transcript(&["my card is 4111 1111 1111 1111"]));
        ctx.remove_pattern(Regex::new(r"(\d{4} ?){4}").unwrap())
            .await
            .unwrap();

        assert_eq!(ctx.current().messages()[0].content, "my card is ");
    }

    #[tokio::test]
    async fn test_set_input_message_swaps_latest() {
        let mut ctx = InputFilterContext::new(transcript(&["first", "second"]));
        ctx.set_input_message(Message::user("rewritten"));

        let result = ctx.into_transcript();
        assert_eq!(result.len(), 2);
        assert_eq!(result.messages()[0].content, "first");
        assert_eq!(result.messages()[1].content, "rewritten");
    }

    #[tokio::test]
    async fn test_set_output_message_appends_to_base() {
        let input = transcript(&["m1"]);
        let output = input.append(Message::assistant("m2"));
        let mut ctx = OutputFilterContext::new(input, output, "be nice");

        ctx.set_output_message(Message::assistant("m3"));

        let result = ctx.into_transcript();
        let contents: Vec<_> = result.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m1", "m3"]);
    }

    #[tokio::test]
    async fn test_output_map_latest_drop_removes_generated_message() {
        let input = transcript(&["question"]);
        let output = input.append(Message::assistant("inappropriate"));
        let mut ctx = OutputFilterContext::new(input, output, "");

        ctx.apply(&FnFilter::from_sync("censor", |_| None))
            .await
            .unwrap();

        assert_eq!(ctx.into_transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_apply_registered_resolves_through_hook() {
        let registry = Arc::new(FilterRegistry::new());
        registry.register("shout", || {
            Arc::new(FnFilter::from_sync("shout", |m| {
                let upper = m.content.to_uppercase();
                Some(m.with_content(upper))
            }))
        });

        let mut ctx =
            InputFilterContext::with_resolver(transcript(&["quiet words"]), registry);
        ctx.apply_registered("shout").await.unwrap();

        assert_eq!(ctx.current().messages()[0].content, "QUIET WORDS");
    }

    #[tokio::test]
    async fn test_apply_registered_unknown_key_fails() {
        let mut ctx = InputFilterContext::new(transcript(&["hello"]));
        let error = ctx.apply_registered("nope").await.unwrap_err();
        assert_eq!(error.filter, "nope");
    }
}
