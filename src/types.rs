use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Role {
    User,
    Bot,
    System,
}

impl From<String> for Role {
    // The backend stores replies as "assistant"; anything that isn't user or system is the bot.
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "user" => Role::User,
            "system" => Role::System,
            _ => Role::Bot,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// One entry of the conversation list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: String,
    pub title: String,
    #[serde(default, alias = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ChatDetail {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SendReply {
    pub reply: String,
    #[serde(default, rename = "titleChanged")]
    pub title_changed: bool,
}
