//! # Chat Dataset Port
//!
//! Filters a multilingual chat dataset down to one language and rewrites
//! its `conversations` turns (`{from, value}`) into the conventional
//! chat-message schema (`{role, content}`), for re-publication.

use ctxpack::{CPResult, CtxpackError, Record};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// The default language filter.
pub const DEFAULT_LANGUAGE: &str = "Italian";

/// A turn in the source conversation schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTurn {
    /// The speaker tag; `"human"` marks the user side.
    pub from: String,

    /// The turn text.
    pub value: String,
}

/// Chat roles in the target schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human side of the conversation.
    User,

    /// The model side of the conversation.
    Assistant,
}

/// A message in the target chat schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The speaker role.
    pub role: Role,

    /// The message text.
    pub content: String,
}

impl From<SourceTurn> for ChatMessage {
    fn from(turn: SourceTurn) -> Self {
        let role = if turn.from == "human" {
            Role::User
        } else {
            Role::Assistant
        };

        Self {
            role,
            content: turn.value,
        }
    }
}

/// Options for configuring a chat dataset port.
#[derive(Debug, Clone, PartialEq)]
pub struct PortOptions {
    /// Keep only records in this language.
    pub language: String,

    /// The key of the language field.
    pub language_key: String,

    /// The key of the source conversation field; removed from ported records.
    pub source_key: String,

    /// The key the chat messages are written under.
    pub target_key: String,
}

impl Default for PortOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PortOptions {
    /// Construct default options.
    pub fn new() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            language_key: "language".to_string(),
            source_key: "conversations".to_string(),
            target_key: "messages".to_string(),
        }
    }

    /// Sets the language filter.
    pub fn with_language<S: Into<String>>(
        mut self,
        language: S,
    ) -> Self {
        self.language = language.into();
        self
    }

    /// Port one record.
    ///
    /// ## Returns
    /// `Ok(None)` for records filtered out by language; ported records
    /// have the source conversation removed and the chat messages
    /// inserted. A record without the language or conversation field is
    /// an error.
    pub fn port_record(
        &self,
        mut record: Record,
    ) -> CPResult<Option<Record>> {
        let language = record
            .get(&self.language_key)
            .ok_or_else(|| {
                CtxpackError::External(format!("record has no {:?} field", self.language_key))
            })?
            .as_str()
            .ok_or_else(|| {
                CtxpackError::External(format!("field {:?} is not a string", self.language_key))
            })?;

        if language != self.language {
            return Ok(None);
        }

        let turns = record.remove(&self.source_key).ok_or_else(|| {
            CtxpackError::External(format!("record has no {:?} field", self.source_key))
        })?;
        let turns: Vec<SourceTurn> = serde_json::from_value(turns)?;

        let messages: Vec<ChatMessage> = turns.into_iter().map(ChatMessage::from).collect();
        record.insert(self.target_key.clone(), serde_json::to_value(&messages)?);

        Ok(Some(record))
    }

    /// Port a batch of records in parallel, preserving input order.
    ///
    /// Filtered records are dropped from the output; the first port
    /// error aborts the batch.
    pub fn port_batch(
        &self,
        records: Vec<Record>,
    ) -> CPResult<Vec<Record>> {
        let ported = records
            .into_par_iter()
            .map(|record| self.port_record(record))
            .collect::<CPResult<Vec<_>>>()?;

        Ok(ported.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagengo_record(
        language: &str,
        turns: serde_json::Value,
    ) -> Record {
        let mut record = Record::new();
        record.insert("language".to_string(), serde_json::json!(language));
        record.insert("conversations".to_string(), turns);
        record
    }

    #[test]
    fn test_port_record() {
        let record = tagengo_record(
            "Italian",
            serde_json::json!([
                {"from": "human", "value": "Ciao!"},
                {"from": "gpt", "value": "Ciao, come posso aiutarti?"},
            ]),
        );

        let ported = PortOptions::new().port_record(record).unwrap().unwrap();

        assert!(!ported.contains_key("conversations"));
        assert_eq!(
            ported.get("messages").unwrap(),
            &serde_json::json!([
                {"role": "user", "content": "Ciao!"},
                {"role": "assistant", "content": "Ciao, come posso aiutarti?"},
            ])
        );
    }

    #[test]
    fn test_language_filter() {
        let record = tagengo_record(
            "Japanese",
            serde_json::json!([{"from": "human", "value": "こんにちは"}]),
        );

        assert_eq!(PortOptions::new().port_record(record).unwrap(), None);
    }

    #[test]
    fn test_custom_language() {
        let record = tagengo_record(
            "Japanese",
            serde_json::json!([{"from": "human", "value": "こんにちは"}]),
        );

        let options = PortOptions::new().with_language("Japanese");
        assert!(options.port_record(record).unwrap().is_some());
    }

    #[test]
    fn test_missing_language_field_is_an_error() {
        let mut record = Record::new();
        record.insert("conversations".to_string(), serde_json::json!([]));

        assert!(PortOptions::new().port_record(record).is_err());
    }

    #[test]
    fn test_malformed_turns_are_an_error() {
        let record = tagengo_record("Italian", serde_json::json!([{"from": "human"}]));
        assert!(PortOptions::new().port_record(record).is_err());
    }

    #[test]
    fn test_port_batch_preserves_order_and_drops_filtered() {
        let records = vec![
            tagengo_record(
                "Italian",
                serde_json::json!([{"from": "human", "value": "uno"}]),
            ),
            tagengo_record(
                "English",
                serde_json::json!([{"from": "human", "value": "two"}]),
            ),
            tagengo_record(
                "Italian",
                serde_json::json!([{"from": "human", "value": "tre"}]),
            ),
        ];

        let ported = PortOptions::new().port_batch(records).unwrap();

        assert_eq!(ported.len(), 2);
        assert_eq!(
            ported[0].get("messages").unwrap()[0]["content"],
            serde_json::json!("uno")
        );
        assert_eq!(
            ported[1].get("messages").unwrap()[0]["content"],
            serde_json::json!("tre")
        );
    }
}
