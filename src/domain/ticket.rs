use crate::domain::category::TicketCategory;
use crate::domain::ids::{ChannelId, MessageId, UserId};
use crate::domain::state::{channel_name, TicketState};

/// Values collected by the intake form. Immutable after creation.
#[derive(Debug, Clone)]
pub struct TicketFields {
    pub username: String,
    pub mode: String,
    pub description: String,
}

/// A support case bound one-to-one to a dedicated channel. The channel id is
/// the ticket's sole durable identity; the number exists only for display.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub channel_id: ChannelId,
    pub number: u64,
    pub requester: UserId,
    pub category: TicketCategory,
    pub fields: TicketFields,
    pub state: TicketState,
    pub urgent: bool,
    /// Shown in the summary embed. No lifecycle action currently sets it.
    pub claimed_by: Option<UserId>,
    pub info_message_id: MessageId,
}

impl Ticket {
    pub fn new(
        channel_id: ChannelId,
        number: u64,
        requester: UserId,
        category: TicketCategory,
        fields: TicketFields,
        info_message_id: MessageId,
    ) -> Self {
        Self {
            channel_id,
            number,
            requester,
            category,
            fields,
            state: TicketState::Open,
            urgent: false,
            claimed_by: None,
            info_message_id,
        }
    }

    pub fn channel_name(&self) -> String {
        channel_name(self.state, self.number)
    }
}
