//! Message Filter Pipeline
//!
//! Applies a transformation to one or all messages of a transcript, producing
//! a new transcript. Filters may suspend (e.g. a remote moderation check) and
//! run inline on the caller's task; no background work is spawned here.

mod context;

pub use context::{FilterContext, InputFilterContext, OutputFilterContext};

use crate::conversation::{Message, Transcript};
use crate::error::FilterError;
use async_trait::async_trait;
use futures::future::BoxFuture;
use regex::{NoExpand, Regex};

/// A named transformation over a single message.
///
/// Returning `Ok(None)` drops the message from the transcript. Errors are
/// propagated to the pipeline caller unchanged; one bad message fails the
/// whole `map_all`/`map_latest` call.
#[async_trait]
pub trait AgentFilter: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str {
        "filter"
    }

    /// Transform or drop a message.
    async fn filter(&self, message: Message) -> Result<Option<Message>, FilterError>;
}

impl Transcript {
    /// Apply `filter` to every message in order.
    ///
    /// Dropped messages are omitted from the result; the relative order of
    /// surviving messages is preserved.
    pub async fn map_all(&self, filter: &dyn AgentFilter) -> Result<Transcript, FilterError> {
        let mut messages = Vec::with_capacity(self.len());
        for message in self.messages() {
            if let Some(kept) = filter.filter(message.clone()).await? {
                messages.push(kept);
            }
        }
        Ok(Transcript::from_messages(messages))
    }

    /// Apply `filter` to the most recent message only.
    ///
    /// If the filter drops it, the transcript becomes one message shorter.
    /// All earlier messages are untouched. An empty transcript is returned
    /// unchanged.
    pub async fn map_latest(&self, filter: &dyn AgentFilter) -> Result<Transcript, FilterError> {
        let latest = match self.latest() {
            Some(message) => message.clone(),
            None => return Ok(self.clone()),
        };
        match filter.filter(latest).await? {
            Some(updated) => Ok(self.drop_latest().append(updated)),
            None => Ok(self.drop_latest()),
        }
    }
}

/// Text to match in a message's content.
#[derive(Debug, Clone)]
pub enum Pattern {
    Literal(String),
    Regex(Regex),
}

impl Pattern {
    fn substitute(&self, content: &str, replacement: &str) -> String {
        match self {
            Pattern::Literal(needle) => content.replace(needle.as_str(), replacement),
            Pattern::Regex(regex) => regex.replace_all(content, NoExpand(replacement)).into_owned(),
        }
    }
}

/// Replaces every occurrence of a pattern in the message content.
///
/// With an empty replacement this is the text-delete combinator.
#[derive(Debug, Clone)]
pub struct SubstitutionFilter {
    pattern: Pattern,
    replacement: String,
}

impl SubstitutionFilter {
    /// Replace every occurrence of a literal with the given text.
    pub fn replace(needle: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: Pattern::Literal(needle.into()),
            replacement: replacement.into(),
        }
    }

    /// Replace every match of a pattern with the given text.
    pub fn replace_pattern(pattern: Regex, replacement: impl Into<String>) -> Self {
        Self {
            pattern: Pattern::Regex(pattern),
            replacement: replacement.into(),
        }
    }

    /// Delete every occurrence of a literal.
    pub fn delete(needle: impl Into<String>) -> Self {
        Self::replace(needle, "")
    }

    /// Delete every match of a pattern.
    pub fn delete_pattern(pattern: Regex) -> Self {
        Self::replace_pattern(pattern, "")
    }
}

#[async_trait]
impl AgentFilter for SubstitutionFilter {
    fn name(&self) -> &str {
        "substitution"
    }

    async fn filter(&self, message: Message) -> Result<Option<Message>, FilterError> {
        let content = self.pattern.substitute(&message.content, &self.replacement);
        Ok(Some(message.with_content(content)))
    }
}

type FilterFn =
    Box<dyn Fn(Message) -> BoxFuture<'static, Result<Option<Message>, FilterError>> + Send + Sync>;

/// Adapter turning a closure into a named [`AgentFilter`].
pub struct FnFilter {
    name: String,
    func: FilterFn,
}

impl FnFilter {
    /// Wrap an async closure.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Message) -> BoxFuture<'static, Result<Option<Message>, FilterError>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }

    /// Wrap a synchronous transformation.
    pub fn from_sync<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Message) -> Option<Message> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(move |message| {
                let outcome = func(message);
                Box::pin(async move { Ok(outcome) })
            }),
        }
    }
}

#[async_trait]
impl AgentFilter for FnFilter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn filter(&self, message: Message) -> Result<Option<Message>, FilterError> {
        (self.func)(message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::MessageRole;

    fn transcript(contents: &[&str]) -> Transcript {
        contents.iter().map(|c| Message::user(*c)).collect()
    }

    #[tokio::test]
    async fn test_map_all_preserves_order_of_survivors() {
        let input = transcript(&["keep one", "drop me", "keep two"]);
        let filter = FnFilter::from_sync("dropper", |message| {
            if message.content.starts_with("drop") {
                None
            } else {
                Some(message)
            }
        });

        let result = input.map_all(&filter).await.unwrap();
        let contents: Vec<_> = result.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["keep one", "keep two"]);
    }

    #[tokio::test]
    async fn test_map_all_length_matches_survivor_count() {
        let input = transcript(&["a", "b", "c", "d"]);
        let filter = FnFilter::from_sync("keep-a", |message| {
            (message.content == "a").then_some(message)
        });

        let result = input.map_all(&filter).await.unwrap();
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn test_map_latest_touches_only_last_message() {
        let input = transcript(&["first", "second"]);
        let filter = FnFilter::from_sync("upper", |message| {
            let upper = message.content.to_uppercase();
            Some(message.with_content(upper))
        });

        let result = input.map_latest(&filter).await.unwrap();
        assert_eq!(result.messages()[0], input.messages()[0]);
        assert_eq!(result.messages()[1].content, "SECOND");
    }

    #[tokio::test]
    async fn test_map_latest_drop_shortens_by_one() {
        let input = transcript(&["first", "second"]);
        let filter = FnFilter::from_sync("dropper", |_| None);

        let result = input.map_latest(&filter).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.messages()[0], input.messages()[0]);
    }

    #[tokio::test]
    async fn test_map_latest_on_empty_transcript() {
        let empty = Transcript::new();
        let filter = FnFilter::from_sync("noop", Some);
        let result = empty.map_latest(&filter).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_filter_error_propagates() {
        let input = transcript(&["first", "second"]);
        let filter = FnFilter::new("failing", |_| {
            Box::pin(async { Err(FilterError::new("failing", "remote check unavailable")) })
        });

        let error = input.map_all(&filter).await.unwrap_err();
        assert_eq!(error.filter, "failing");
    }

    #[tokio::test]
    async fn test_substitution_literal_replace() {
        let input = transcript(&["untouched", "the SECRET is out, SECRET!"]);
        let filter = SubstitutionFilter::replace("SECRET", "[redacted]");

        let result = input.map_latest(&filter).await.unwrap();
        assert_eq!(result.messages()[0].content, "untouched");
        assert_eq!(
            result.messages()[1].content,
            "the [redacted] is out, [redacted]!"
        );
    }

    #[tokio::test]
    async fn test_substitution_pattern_delete() {
        let input = transcript(&["call me at 555-1234 or 555-9876"]);
        let filter =
            SubstitutionFilter::delete_pattern(Regex::new(r"\d{3}-\d{4}").unwrap());

        let result = input.map_latest(&filter).await.unwrap();
        assert_eq!(result.messages()[0].content, "call me at  or ");
    }

    #[tokio::test]
    async fn test_substitution_replacement_is_literal() {
        // '$' in the replacement must not be treated as a capture reference.
        let input = transcript(&["price: 100"]);
        let filter = SubstitutionFilter::replace_pattern(
            Regex::new(r"\d+").unwrap(),
            "$0.00",
        );

        let result = input.map_latest(&filter).await.unwrap();
        assert_eq!(result.messages()[0].content, "price: $0.00");
    }

    #[tokio::test]
    async fn test_substitution_preserves_role() {
        let input = Transcript::from_messages(vec![Message::assistant("hello world")]);
        let filter = SubstitutionFilter::replace("world", "there");

        let result = input.map_latest(&filter).await.unwrap();
        assert_eq!(result.messages()[0].role, MessageRole::Assistant);
    }
}
