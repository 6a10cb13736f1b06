use async_trait::async_trait;
use reqwest::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Client, RequestBuilder,
};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::domain::ids::{ChannelId, GroupId, MessageId};
use crate::error::{AppError, AppResult};
use crate::services::channel_admin::{ChannelSpec, OverwriteTarget, PermissionOverwrite};
use crate::services::messaging::{
    Button, ButtonStyle, ComponentRow, Embed, OutboundMessage, ReplyToken,
};
use crate::services::{ChannelAdminService, MessagingService};

const API_BASE: &str = "https://discord.com/api/v10";
const GUILD_TEXT: u8 = 0;
const EPHEMERAL: u64 = 1 << 6;

/// REST client for the chat platform, implementing both external
/// collaborator interfaces over the same connection pool.
pub struct DiscordApi {
    http: Client,
    token: String,
    application_id: String,
    guild_id: String,
    base_url: String,
}

impl DiscordApi {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: Client::new(),
            token: config.discord_token.clone(),
            application_id: config.application_id.clone(),
            guild_id: config.guild_id.clone(),
            base_url: API_BASE.to_string(),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(AUTHORIZATION, format!("Bot {}", self.token))
            .header(CONTENT_TYPE, "application/json")
    }

    async fn expect_success(
        response: reqwest::Response,
        context: &str,
        wrap: fn(String) -> AppError,
    ) -> AppResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response>".to_string());
        Err(wrap(format!("{context}: {status}: {body}")))
    }
}

#[async_trait]
impl ChannelAdminService for DiscordApi {
    async fn create_channel(&self, spec: &ChannelSpec) -> AppResult<ChannelId> {
        let body = CreateChannelRequest {
            name: &spec.name,
            kind: GUILD_TEXT,
            parent_id: spec.group.as_str(),
            permission_overwrites: spec.overwrites.iter().map(OverwriteJson::from).collect(),
        };

        let response = self
            .authorized(
                self.http
                    .post(format!("{}/guilds/{}/channels", self.base_url, self.guild_id)),
            )
            .json(&body)
            .send()
            .await
            .map_err(|err| AppError::ChannelAdmin(format!("failed to create channel: {err}")))?;

        let response =
            Self::expect_success(response, "create channel", AppError::ChannelAdmin).await?;
        let payload: ChannelResponse = response
            .json()
            .await
            .map_err(|err| AppError::ChannelAdmin(format!("invalid channel response: {err}")))?;
        Ok(ChannelId(payload.id))
    }

    async fn rename_channel(&self, channel: &ChannelId, name: &str) -> AppResult<()> {
        let response = self
            .authorized(
                self.http
                    .patch(format!("{}/channels/{}", self.base_url, channel)),
            )
            .json(&ModifyChannelRequest {
                name: Some(name),
                parent_id: None,
            })
            .send()
            .await
            .map_err(|err| AppError::ChannelAdmin(format!("failed to rename channel: {err}")))?;
        Self::expect_success(response, "rename channel", AppError::ChannelAdmin).await?;
        Ok(())
    }

    async fn reparent_channel(&self, channel: &ChannelId, group: &GroupId) -> AppResult<()> {
        let response = self
            .authorized(
                self.http
                    .patch(format!("{}/channels/{}", self.base_url, channel)),
            )
            .json(&ModifyChannelRequest {
                name: None,
                parent_id: Some(group.as_str()),
            })
            .send()
            .await
            .map_err(|err| AppError::ChannelAdmin(format!("failed to move channel: {err}")))?;
        Self::expect_success(response, "move channel", AppError::ChannelAdmin).await?;
        Ok(())
    }

    async fn delete_channel(&self, channel: &ChannelId) -> AppResult<()> {
        let response = self
            .authorized(
                self.http
                    .delete(format!("{}/channels/{}", self.base_url, channel)),
            )
            .send()
            .await
            .map_err(|err| AppError::ChannelAdmin(format!("failed to delete channel: {err}")))?;
        Self::expect_success(response, "delete channel", AppError::ChannelAdmin).await?;
        Ok(())
    }
}

#[async_trait]
impl MessagingService for DiscordApi {
    async fn post_message(
        &self,
        channel: &ChannelId,
        message: &OutboundMessage,
    ) -> AppResult<MessageId> {
        let response = self
            .authorized(
                self.http
                    .post(format!("{}/channels/{}/messages", self.base_url, channel)),
            )
            .json(&MessageRequest::from(message))
            .send()
            .await
            .map_err(|err| AppError::Messaging(format!("failed to post message: {err}")))?;

        let response = Self::expect_success(response, "post message", AppError::Messaging).await?;
        let payload: MessageResponse = response
            .json()
            .await
            .map_err(|err| AppError::Messaging(format!("invalid message response: {err}")))?;
        Ok(MessageId(payload.id))
    }

    async fn post_ephemeral(&self, reply: &ReplyToken, content: &str) -> AppResult<()> {
        // Follow-up on the deferred acknowledgement the webhook shim already
        // sent for this interaction.
        let response = self
            .http
            .post(format!(
                "{}/webhooks/{}/{}",
                self.base_url, self.application_id, reply.interaction_token
            ))
            .header(CONTENT_TYPE, "application/json")
            .json(&FollowupRequest {
                content,
                flags: EPHEMERAL,
            })
            .send()
            .await
            .map_err(|err| AppError::Messaging(format!("failed to post reply: {err}")))?;
        Self::expect_success(response, "post reply", AppError::Messaging).await?;
        Ok(())
    }
}

fn bits(permissions: &[crate::services::channel_admin::Permission]) -> String {
    permissions
        .iter()
        .fold(0u64, |acc, permission| acc | permission.bit())
        .to_string()
}

#[derive(Serialize)]
struct CreateChannelRequest<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: u8,
    parent_id: &'a str,
    permission_overwrites: Vec<OverwriteJson>,
}

#[derive(Serialize)]
struct OverwriteJson {
    id: String,
    #[serde(rename = "type")]
    kind: u8,
    allow: String,
    deny: String,
}

impl From<&PermissionOverwrite> for OverwriteJson {
    fn from(overwrite: &PermissionOverwrite) -> Self {
        let (id, kind) = match &overwrite.target {
            OverwriteTarget::Role(role) => (role.as_str().to_string(), 0),
            OverwriteTarget::Member(user) => (user.as_str().to_string(), 1),
        };
        Self {
            id,
            kind,
            allow: bits(&overwrite.allow),
            deny: bits(&overwrite.deny),
        }
    }
}

#[derive(Serialize)]
struct ModifyChannelRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct ChannelResponse {
    id: String,
}

#[derive(Serialize)]
struct MessageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    embeds: Vec<serde_json::Value>,
    components: Vec<serde_json::Value>,
}

impl From<&OutboundMessage> for MessageRequest {
    fn from(message: &OutboundMessage) -> Self {
        Self {
            content: message.content.clone(),
            embeds: message.embed.iter().map(embed_json).collect(),
            components: message.components.iter().map(row_json).collect(),
        }
    }
}

#[derive(Serialize)]
struct FollowupRequest<'a> {
    content: &'a str,
    flags: u64,
}

#[derive(Deserialize)]
struct MessageResponse {
    id: String,
}

pub fn embed_json(embed: &Embed) -> serde_json::Value {
    let mut value = serde_json::json!({
        "title": embed.title,
        "color": embed.color,
        "fields": embed
            .fields
            .iter()
            .map(|field| {
                serde_json::json!({
                    "name": field.name,
                    "value": field.value,
                    "inline": field.inline,
                })
            })
            .collect::<Vec<_>>(),
    });
    if let Some(description) = &embed.description {
        value["description"] = serde_json::Value::String(description.clone());
    }
    if let Some(footer) = &embed.footer {
        value["footer"] = serde_json::json!({ "text": footer });
    }
    value
}

pub fn row_json(row: &ComponentRow) -> serde_json::Value {
    let components = match row {
        ComponentRow::Menu(menu) => vec![serde_json::json!({
            "type": 3,
            "custom_id": menu.custom_id,
            "placeholder": menu.placeholder,
            "options": menu
                .options
                .iter()
                .map(|option| {
                    let mut value = serde_json::json!({
                        "label": option.label,
                        "value": option.value,
                    });
                    if let Some(emoji) = &option.emoji {
                        value["emoji"] = serde_json::json!({ "name": emoji });
                    }
                    value
                })
                .collect::<Vec<_>>(),
        })],
        ComponentRow::Buttons(buttons) => buttons.iter().map(button_json).collect(),
    };
    serde_json::json!({ "type": 1, "components": components })
}

fn button_json(button: &Button) -> serde_json::Value {
    let style = match button.style {
        ButtonStyle::Danger => 4,
        ButtonStyle::Secondary => 2,
    };
    serde_json::json!({
        "type": 2,
        "style": style,
        "custom_id": button.custom_id,
        "label": button.label,
    })
}
