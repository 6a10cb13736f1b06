use async_trait::async_trait;

use crate::domain::ids::{ChannelId, MessageId};
use crate::error::AppResult;

#[derive(Debug, Clone)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone)]
pub struct Embed {
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
    pub color: u32,
}

#[derive(Debug, Clone)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    pub emoji: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SelectMenu {
    pub custom_id: String,
    pub placeholder: String,
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Danger,
    Secondary,
}

#[derive(Debug, Clone)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
}

#[derive(Debug, Clone)]
pub enum ComponentRow {
    Menu(SelectMenu),
    Buttons(Vec<Button>),
}

#[derive(Debug, Clone, Default)]
pub struct OutboundMessage {
    pub content: Option<String>,
    pub embed: Option<Embed>,
    pub components: Vec<ComponentRow>,
}

/// Identifies the inbound action a private acknowledgement answers. The
/// webhook shim has already acknowledged the interaction with a deferred
/// response by the time the dispatch layer replies through this token.
#[derive(Debug, Clone)]
pub struct ReplyToken {
    pub interaction_id: String,
    pub interaction_token: String,
}

#[async_trait]
pub trait MessagingService: Send + Sync {
    async fn post_message(
        &self,
        channel: &ChannelId,
        message: &OutboundMessage,
    ) -> AppResult<MessageId>;

    /// Private reply visible only to the acting user.
    async fn post_ephemeral(&self, reply: &ReplyToken, content: &str) -> AppResult<()>;
}
