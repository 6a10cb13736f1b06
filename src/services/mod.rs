pub mod channel_admin;
pub mod messaging;

pub use channel_admin::ChannelAdminService;
pub use messaging::MessagingService;
