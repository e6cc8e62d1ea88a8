//! Intake data model: the submitted form, raised red flags and chat history.

pub mod model;

pub use model::{
    ApplicationData, ConversationMessage, ConversationRole, PreScreening, RedFlag, RuleId, fields,
    non_blank,
};
