use tracing::info;

use crate::context::AppContext;
use crate::domain::category::TicketCategory;
use crate::domain::ids::{ChannelId, UserId};
use crate::domain::state::{channel_name, plan_transition, Regroup, TicketState};
use crate::domain::ticket::{Ticket, TicketFields};
use crate::error::{AppError, AppResult};
use crate::services::channel_admin::{ticket_overwrites, ChannelSpec};
use crate::surface;

pub struct OpenOutcome {
    pub channel: ChannelId,
    pub number: u64,
}

/// Creation protocol: allocate the next number, provision the channel in the
/// active group with the fixed permission set, post the summary, and only
/// then insert the registry entry and commit the number.
///
/// The registry lock is held across provisioning, which serializes creations
/// and guarantees that a failure leaves neither a registry entry nor a
/// consumed ticket number.
pub async fn open_ticket(
    ctx: &AppContext,
    category: TicketCategory,
    requester: UserId,
    fields: TicketFields,
) -> AppResult<OpenOutcome> {
    let mut registry = ctx.tickets.lock().await;
    let number = registry.peek_number();

    let everyone = crate::domain::ids::RoleId(ctx.config.guild_id.clone());
    let bot_user = UserId(ctx.config.application_id.clone());
    let spec = ChannelSpec {
        name: channel_name(TicketState::Open, number),
        group: ctx.config.active_group.clone(),
        overwrites: ticket_overwrites(&everyone, &requester, &ctx.config.staff_role, &bot_user),
    };

    let channel = ctx.channel_admin.create_channel(&spec).await?;

    let summary = surface::summary_message(&fields, None);
    let info_message_id = match ctx.messaging.post_message(&channel, &summary).await {
        Ok(id) => id,
        Err(err) => {
            // Never leave a channel without a matching registry entry.
            let _ = ctx.channel_admin.delete_channel(&channel).await;
            return Err(err);
        }
    };

    let ticket = Ticket::new(
        channel.clone(),
        number,
        requester,
        category,
        fields,
        info_message_id,
    );
    registry.insert(ticket)?;
    registry.commit_number();

    info!(number, channel = %channel, category = category.as_str(), "ticket created");
    Ok(OpenOutcome { channel, number })
}

/// Status-menu transition (review, urgent, close).
pub async fn apply_status(
    ctx: &AppContext,
    channel: &ChannelId,
    actor: &UserId,
    target: TicketState,
) -> AppResult<TicketState> {
    transition(ctx, channel, actor, target).await
}

/// Reopen button; only valid on a closed ticket.
pub async fn reopen_ticket(ctx: &AppContext, channel: &ChannelId, actor: &UserId) -> AppResult<()> {
    transition(ctx, channel, actor, TicketState::Reopened).await?;
    Ok(())
}

/// Shared transition core: validate against the registry, plan, apply the
/// external effects, and commit. The registry is not touched until every
/// external call has succeeded, so a failed call leaves the ticket in its
/// last valid state.
async fn transition(
    ctx: &AppContext,
    channel: &ChannelId,
    actor: &UserId,
    target: TicketState,
) -> AppResult<TicketState> {
    let _guard = ctx.tickets.guard(channel).await;

    let (plan, current_name) = {
        let registry = ctx.tickets.lock().await;
        let ticket = registry.get(channel).ok_or(AppError::TicketNotFound)?;
        let plan = plan_transition(ticket.state, ticket.number, target)?;
        (plan, ticket.channel_name())
    };

    if plan.name != current_name {
        ctx.channel_admin.rename_channel(channel, &plan.name).await?;
    }

    if let Some(regroup) = plan.regroup {
        let group = match regroup {
            Regroup::ToClosed => &ctx.config.closed_group,
            Regroup::ToActive => &ctx.config.active_group,
        };
        ctx.channel_admin.reparent_channel(channel, group).await?;
    }

    ctx.messaging
        .post_message(channel, &surface::transition_notice(target, actor))
        .await?;

    {
        let mut registry = ctx.tickets.lock().await;
        registry.update(channel, |ticket| {
            ticket.state = plan.state;
            if plan.set_urgent {
                ticket.urgent = true;
            }
        })?;
    }

    info!(channel = %channel, state = target.label(), actor = %actor, "ticket transition");
    Ok(plan.state)
}

/// Destructive removal, permitted only on a closed ticket. Deletes the
/// channel first and the registry entry after, so a failed platform call
/// keeps the ticket addressable.
pub async fn delete_ticket(ctx: &AppContext, channel: &ChannelId, actor: &UserId) -> AppResult<()> {
    let _guard = ctx.tickets.guard(channel).await;

    {
        let registry = ctx.tickets.lock().await;
        let ticket = registry.get(channel).ok_or(AppError::TicketNotFound)?;
        if ticket.state != TicketState::Closed {
            return Err(AppError::NotDeletable {
                state: ticket.state,
            });
        }
    }

    ctx.channel_admin.delete_channel(channel).await?;

    {
        let mut registry = ctx.tickets.lock().await;
        registry.remove(channel);
    }
    drop(_guard);
    ctx.tickets.drop_guard(channel).await;

    info!(channel = %channel, actor = %actor, "ticket deleted");
    Ok(())
}
