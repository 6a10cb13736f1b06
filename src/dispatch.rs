use tracing::warn;

use crate::context::AppContext;
use crate::domain::category::TicketCategory;
use crate::domain::ids::{ChannelId, UserId};
use crate::domain::state::TicketState;
use crate::domain::ticket::TicketFields;
use crate::error::{AppError, AppResult};
use crate::services::messaging::ReplyToken;
use crate::surface;
use crate::workflow::ticket as workflow;

/// Inbound actions, decoded once at the web boundary into typed variants.
/// The category rides as a typed field rather than being re-parsed from the
/// delimited identifier downstream.
#[derive(Debug, Clone)]
pub enum Action {
    SetupMenu {
        channel: ChannelId,
        actor: UserId,
        actor_is_admin: bool,
        reply: ReplyToken,
    },
    TicketSubmitted {
        category: TicketCategory,
        requester: UserId,
        fields: TicketFields,
        reply: ReplyToken,
    },
    StatusSelected {
        channel: ChannelId,
        actor: UserId,
        target: TicketState,
        reply: ReplyToken,
    },
    DeletePressed {
        channel: ChannelId,
        actor: UserId,
        reply: ReplyToken,
    },
    ReopenPressed {
        channel: ChannelId,
        actor: UserId,
        reply: ReplyToken,
    },
    Unknown {
        custom_id: String,
        reply: ReplyToken,
    },
}

impl Action {
    fn reply_token(&self) -> &ReplyToken {
        match self {
            Action::SetupMenu { reply, .. }
            | Action::TicketSubmitted { reply, .. }
            | Action::StatusSelected { reply, .. }
            | Action::DeletePressed { reply, .. }
            | Action::ReopenPressed { reply, .. }
            | Action::Unknown { reply, .. } => reply,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Action::SetupMenu { .. } => "setup_menu",
            Action::TicketSubmitted { .. } => "ticket_submitted",
            Action::StatusSelected { .. } => "status_selected",
            Action::DeletePressed { .. } => "delete_pressed",
            Action::ReopenPressed { .. } => "reopen_pressed",
            Action::Unknown { .. } => "unknown",
        }
    }
}

/// Single action boundary. Every failure is caught here, logged, and
/// reported privately to the acting user; nothing propagates to the event
/// loop and nothing is ever posted to the shared channel on failure.
pub async fn handle(ctx: AppContext, action: Action) {
    let kind = action.kind();
    let reply = action.reply_token().clone();

    match run(&ctx, action).await {
        Ok(ack) => {
            if let Err(err) = ctx.messaging.post_ephemeral(&reply, &ack).await {
                warn!(action = kind, %err, "failed to acknowledge action");
            }
        }
        Err(err) => {
            warn!(action = kind, %err, "action failed");
            let content = user_message(&err);
            if let Err(err) = ctx.messaging.post_ephemeral(&reply, &content).await {
                warn!(action = kind, %err, "failed to report action failure");
            }
        }
    }
}

async fn run(ctx: &AppContext, action: Action) -> AppResult<String> {
    match action {
        Action::SetupMenu {
            channel,
            actor_is_admin,
            ..
        } => {
            if !actor_is_admin {
                return Err(AppError::PermissionDenied);
            }
            ctx.messaging
                .post_message(&channel, &surface::category_menu_message())
                .await?;
            Ok("✅ Menú de tickets publicado.".to_string())
        }
        Action::TicketSubmitted {
            category,
            requester,
            fields,
            ..
        } => {
            let outcome = workflow::open_ticket(ctx, category, requester, fields).await?;
            Ok(format!(
                "✅ Tu ticket ha sido creado: {}",
                outcome.channel.mention()
            ))
        }
        Action::StatusSelected {
            channel,
            actor,
            target,
            ..
        } => {
            let state = workflow::apply_status(ctx, &channel, &actor, target).await?;
            Ok(format!("✅ Estado actualizado: {}", state.label()))
        }
        Action::DeletePressed { channel, actor, .. } => {
            workflow::delete_ticket(ctx, &channel, &actor).await?;
            Ok("✅ Ticket eliminado.".to_string())
        }
        Action::ReopenPressed { channel, actor, .. } => {
            workflow::reopen_ticket(ctx, &channel, &actor).await?;
            Ok("✅ Ticket reabierto.".to_string())
        }
        Action::Unknown { custom_id, .. } => Err(AppError::CommandNotFound(custom_id)),
    }
}

fn user_message(err: &AppError) -> String {
    match err {
        AppError::CommandNotFound(_) => "❌ Este comando no existe.".to_string(),
        AppError::TicketNotFound => "❌ No se encontró información del ticket.".to_string(),
        AppError::InvalidTransition { .. } | AppError::NotDeletable { .. } => {
            "❌ Esta acción no está disponible en el estado actual del ticket.".to_string()
        }
        AppError::PermissionDenied => "❌ No tienes permiso para usar esto.".to_string(),
        _ => "❌ Hubo un error al procesar esta acción.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::config::AppConfig;
    use crate::domain::ids::{GroupId, MessageId, RoleId};
    use crate::error::AppResult;
    use crate::registry::TicketStore;
    use crate::services::channel_admin::ChannelSpec;
    use crate::services::messaging::OutboundMessage;
    use crate::services::{ChannelAdminService, MessagingService};

    #[derive(Default)]
    struct RecordingPlatform {
        posted: Mutex<Vec<(String, String)>>,
        ephemeral: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChannelAdminService for RecordingPlatform {
        async fn create_channel(&self, _spec: &ChannelSpec) -> AppResult<ChannelId> {
            Ok(ChannelId("chan-1".to_string()))
        }

        async fn rename_channel(&self, _channel: &ChannelId, _name: &str) -> AppResult<()> {
            Ok(())
        }

        async fn reparent_channel(&self, _channel: &ChannelId, _group: &GroupId) -> AppResult<()> {
            Ok(())
        }

        async fn delete_channel(&self, _channel: &ChannelId) -> AppResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl MessagingService for RecordingPlatform {
        async fn post_message(
            &self,
            channel: &ChannelId,
            message: &OutboundMessage,
        ) -> AppResult<MessageId> {
            let title = message
                .embed
                .as_ref()
                .map(|e| e.title.clone())
                .unwrap_or_default();
            self.posted
                .lock()
                .unwrap()
                .push((channel.as_str().to_string(), title));
            Ok(MessageId("msg-1".to_string()))
        }

        async fn post_ephemeral(&self, _reply: &ReplyToken, content: &str) -> AppResult<()> {
            self.ephemeral.lock().unwrap().push(content.to_string());
            Ok(())
        }
    }

    fn test_ctx() -> (AppContext, Arc<RecordingPlatform>) {
        let platform = Arc::new(RecordingPlatform::default());
        let config = AppConfig {
            discord_token: "token".to_string(),
            application_id: "app".to_string(),
            public_key: "00".repeat(32),
            guild_id: "guild".to_string(),
            active_group: GroupId("active".to_string()),
            closed_group: GroupId("closed".to_string()),
            staff_role: RoleId("staff".to_string()),
            port: 3000,
        };
        let ctx = AppContext::new(config, platform.clone(), platform.clone(), TicketStore::new());
        (ctx, platform)
    }

    fn reply() -> ReplyToken {
        ReplyToken {
            interaction_id: "1".to_string(),
            interaction_token: "tok".to_string(),
        }
    }

    #[tokio::test]
    async fn unknown_actions_are_reported_privately() {
        let (ctx, platform) = test_ctx();
        handle(
            ctx,
            Action::Unknown {
                custom_id: "mystery_button".to_string(),
                reply: reply(),
            },
        )
        .await;

        let ephemeral = platform.ephemeral.lock().unwrap();
        assert_eq!(ephemeral.len(), 1);
        assert!(ephemeral[0].contains("comando no existe"));
    }

    #[tokio::test]
    async fn status_change_outside_a_ticket_channel_fails_safely() {
        let (ctx, platform) = test_ctx();
        handle(
            ctx,
            Action::StatusSelected {
                channel: ChannelId("random".to_string()),
                actor: UserId("200".to_string()),
                target: TicketState::Closed,
                reply: reply(),
            },
        )
        .await;

        let ephemeral = platform.ephemeral.lock().unwrap();
        assert!(ephemeral[0].contains("No se encontró información"));
        assert!(platform.posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn setup_menu_requires_admin() {
        let (ctx, platform) = test_ctx();
        handle(
            ctx,
            Action::SetupMenu {
                channel: ChannelId("lobby".to_string()),
                actor: UserId("300".to_string()),
                actor_is_admin: false,
                reply: reply(),
            },
        )
        .await;

        assert!(platform.posted.lock().unwrap().is_empty());
        let ephemeral = platform.ephemeral.lock().unwrap();
        assert!(ephemeral[0].contains("permiso"));
    }

    #[tokio::test]
    async fn admin_setup_posts_the_category_menu() {
        let (ctx, platform) = test_ctx();
        handle(
            ctx,
            Action::SetupMenu {
                channel: ChannelId("lobby".to_string()),
                actor: UserId("300".to_string()),
                actor_is_admin: true,
                reply: reply(),
            },
        )
        .await;

        let posted = platform.posted.lock().unwrap();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].0, "lobby");
        assert!(posted[0].1.contains("AYUDA AL JUGADOR"));
    }

    #[tokio::test]
    async fn submission_acknowledges_with_channel_mention() {
        let (ctx, platform) = test_ctx();
        handle(
            ctx,
            Action::TicketSubmitted {
                category: TicketCategory::Bugs,
                requester: UserId("100".to_string()),
                fields: TicketFields {
                    username: "Ana".to_string(),
                    mode: "Survival".to_string(),
                    description: "Crash on login".to_string(),
                },
                reply: reply(),
            },
        )
        .await;

        let ephemeral = platform.ephemeral.lock().unwrap();
        assert!(ephemeral[0].contains("<#chan-1>"));
    }
}
