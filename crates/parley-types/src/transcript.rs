use serde::{Deserialize, Serialize};

/// One exchange as shown in the chat view: the user's text and the
/// assistant's (possibly still growing) reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub user: String,
    pub assistant: Option<String>,
}

impl Turn {
    pub fn new(user: impl Into<String>, assistant: Option<String>) -> Self {
        Self {
            user: user.into(),
            assistant,
        }
    }
}

/// Display-side conversation history. Not persisted directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_turns(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Append a new exchange whose reply is a transient placeholder.
    pub fn push_draft(&mut self, user: impl Into<String>, placeholder: impl Into<String>) {
        self.turns.push(Turn::new(user, Some(placeholder.into())));
    }

    /// Replace the reply of the most recent turn. Returns false on an empty transcript.
    pub fn set_last_reply(&mut self, reply: impl Into<String>) -> bool {
        match self.turns.last_mut() {
            Some(turn) => {
                turn.assistant = Some(reply.into());
                true
            }
            None => false,
        }
    }

    /// Build a transcript from `(role, content)` pairs in stored order.
    ///
    /// User messages open a turn; assistant messages fill the reply of the
    /// open turn (or form a reply-only turn when none is open). System
    /// messages are not shown.
    pub fn from_messages<'a, I>(messages: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut turns: Vec<Turn> = Vec::new();
        for (role, content) in messages {
            match role {
                "user" => turns.push(Turn::new(content, None)),
                "assistant" => match turns.last_mut() {
                    Some(turn) if turn.assistant.is_none() => {
                        turn.assistant = Some(content.to_string());
                    }
                    _ => turns.push(Turn::new(String::new(), Some(content.to_string()))),
                },
                _ => {}
            }
        }
        Self { turns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_then_reply() {
        let mut transcript = Transcript::new();
        transcript.push_draft("Hello", "typing...");
        assert!(transcript.set_last_reply("Hi"));

        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.last().unwrap().assistant.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_set_reply_on_empty_transcript() {
        let mut transcript = Transcript::new();
        assert!(!transcript.set_last_reply("orphan"));
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_from_messages_pairs_turns() {
        let transcript = Transcript::from_messages(vec![
            ("system", "be nice"),
            ("user", "one"),
            ("assistant", "reply one"),
            ("user", "two"),
        ]);

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.turns()[0], Turn::new("one", Some("reply one".to_string())));
        assert_eq!(transcript.turns()[1], Turn::new("two", None));
    }
}
