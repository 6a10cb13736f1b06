use std::sync::Arc;

use crate::config::AppConfig;
use crate::registry::TicketStore;
use crate::services::{ChannelAdminService, MessagingService};

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub channel_admin: Arc<dyn ChannelAdminService>,
    pub messaging: Arc<dyn MessagingService>,
    pub tickets: TicketStore,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        channel_admin: Arc<dyn ChannelAdminService>,
        messaging: Arc<dyn MessagingService>,
        tickets: TicketStore,
    ) -> Self {
        Self {
            config,
            channel_admin,
            messaging,
            tickets,
        }
    }
}
