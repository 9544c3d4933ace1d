//! Strict validation of model replies.
//!
//! A reply must be a single JSON object matching exactly one of two shapes:
//! a tool call (`{"action": ..., "input": ...}`) or a final answer
//! (`{"final": ...}`). Anything else is rejected with a classification the
//! step executor treats as unrecoverable. Validation is a pure function of
//! the text: the same input always yields the same result.

use std::fmt;

use serde_json::Value;

/// A model reply that passed shape validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedReply {
    /// Request to invoke one registered tool with a string input.
    ToolCall { action: String, input: String },
    /// Signal that the step is complete, carrying the step's textual result.
    FinalAnswer { text: String },
}

/// Why a raw reply was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Not parseable as JSON at all.
    MalformedSyntax,
    /// Parsed, but the top-level value is an array or scalar.
    NotAnObject,
    /// Has a `final` key alongside other keys.
    ExtraKeysOnFinal,
    /// `final` value is not a string.
    FinalNotString,
    /// Has `action` and `input` alongside other keys.
    ExtraKeysOnToolCall,
    /// `action` value is not a string.
    ActionNotString,
    /// `input` value is not a string.
    InputNotString,
    /// An object, but neither a final answer nor a tool call.
    UnrecognizedStructure,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::MalformedSyntax => "reply is not valid JSON",
            Self::NotAnObject => "reply is not a JSON object",
            Self::ExtraKeysOnFinal => "final response contains extra keys",
            Self::FinalNotString => "final value must be a string",
            Self::ExtraKeysOnToolCall => "tool call contains extra keys",
            Self::ActionNotString => "action must be a string",
            Self::InputNotString => "input must be a string",
            Self::UnrecognizedStructure => "reply matches neither tool call nor final answer",
        };
        f.write_str(msg)
    }
}

/// Classify a raw model reply as a tool call or a final answer.
pub fn validate(raw: &str) -> Result<ParsedReply, ValidationError> {
    let value: Value = serde_json::from_str(raw).map_err(|_| ValidationError::MalformedSyntax)?;
    let Some(object) = value.as_object() else {
        return Err(ValidationError::NotAnObject);
    };

    if let Some(final_value) = object.get("final") {
        if object.len() != 1 {
            return Err(ValidationError::ExtraKeysOnFinal);
        }
        let Some(text) = final_value.as_str() else {
            return Err(ValidationError::FinalNotString);
        };
        return Ok(ParsedReply::FinalAnswer {
            text: text.to_string(),
        });
    }

    if let (Some(action_value), Some(input_value)) = (object.get("action"), object.get("input")) {
        if object.len() != 2 {
            return Err(ValidationError::ExtraKeysOnToolCall);
        }
        let Some(action) = action_value.as_str() else {
            return Err(ValidationError::ActionNotString);
        };
        let Some(input) = input_value.as_str() else {
            return Err(ValidationError::InputNotString);
        };
        return Ok(ParsedReply::ToolCall {
            action: action.to_string(),
            input: input.to_string(),
        });
    }

    Err(ValidationError::UnrecognizedStructure)
}
