pub mod conversation;
pub mod intent;
pub mod persona;

pub use conversation::{
    ConversationTurn, GeneratedReply, HistoryMessage, DEFAULT_CUSTOMER_NAME, MAX_HISTORY_MESSAGES,
};
pub use intent::Intent;
pub use persona::PersonaConfig;
