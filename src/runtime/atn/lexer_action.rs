//! Lexer actions carried by lexer automata.
//!
//! The runtime stores and serializes these; executing them belongs to a lexer
//! implementation.

use super::error::AtnError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexerActionType {
    Channel = 0,
    Custom = 1,
    Mode = 2,
    More = 3,
    PopMode = 4,
    PushMode = 5,
    Skip = 6,
    Type = 7,
}

impl LexerActionType {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => LexerActionType::Channel,
            1 => LexerActionType::Custom,
            2 => LexerActionType::Mode,
            3 => LexerActionType::More,
            4 => LexerActionType::PopMode,
            5 => LexerActionType::PushMode,
            6 => LexerActionType::Skip,
            7 => LexerActionType::Type,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexerAction {
    Channel(i32),
    Custom { rule_index: i32, action_index: i32 },
    Mode(i32),
    More,
    PopMode,
    PushMode(i32),
    Skip,
    Type(i32),
}

impl LexerAction {
    pub fn action_type(&self) -> LexerActionType {
        match self {
            LexerAction::Channel(_) => LexerActionType::Channel,
            LexerAction::Custom { .. } => LexerActionType::Custom,
            LexerAction::Mode(_) => LexerActionType::Mode,
            LexerAction::More => LexerActionType::More,
            LexerAction::PopMode => LexerActionType::PopMode,
            LexerAction::PushMode(_) => LexerActionType::PushMode,
            LexerAction::Skip => LexerActionType::Skip,
            LexerAction::Type(_) => LexerActionType::Type,
        }
    }

    /// The two serialized payload integers; unused slots are zero.
    pub fn payload(&self) -> (i32, i32) {
        match *self {
            LexerAction::Channel(channel) => (channel, 0),
            LexerAction::Custom {
                rule_index,
                action_index,
            } => (rule_index, action_index),
            LexerAction::Mode(mode) | LexerAction::PushMode(mode) => (mode, 0),
            LexerAction::Type(token_type) => (token_type, 0),
            LexerAction::More | LexerAction::PopMode | LexerAction::Skip => (0, 0),
        }
    }

    pub fn from_parts(code: i32, data1: i32, data2: i32) -> Result<Self, AtnError> {
        let action_type =
            LexerActionType::from_code(code).ok_or(AtnError::InvalidLexerActionType(code))?;
        Ok(match action_type {
            LexerActionType::Channel => LexerAction::Channel(data1),
            LexerActionType::Custom => LexerAction::Custom {
                rule_index: data1,
                action_index: data2,
            },
            LexerActionType::Mode => LexerAction::Mode(data1),
            LexerActionType::More => LexerAction::More,
            LexerActionType::PopMode => LexerAction::PopMode,
            LexerActionType::PushMode => LexerAction::PushMode(data1),
            LexerActionType::Skip => LexerAction::Skip,
            LexerActionType::Type => LexerAction::Type(data1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips_through_parts() {
        let actions = [
            LexerAction::Channel(2),
            LexerAction::Custom {
                rule_index: 3,
                action_index: 1,
            },
            LexerAction::PushMode(1),
            LexerAction::PopMode,
            LexerAction::Skip,
            LexerAction::Type(7),
        ];
        for action in actions {
            let (d1, d2) = action.payload();
            let rebuilt = LexerAction::from_parts(action.action_type() as i32, d1, d2).unwrap();
            assert_eq!(rebuilt, action);
        }
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(matches!(
            LexerAction::from_parts(8, 0, 0),
            Err(AtnError::InvalidLexerActionType(8))
        ));
    }
}
