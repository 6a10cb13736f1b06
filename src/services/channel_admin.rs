use async_trait::async_trait;

use crate::domain::ids::{ChannelId, GroupId, RoleId, UserId};
use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ViewChannel,
    SendMessages,
    ReadMessageHistory,
    ManageChannels,
}

impl Permission {
    /// Platform permission bit for this flag.
    pub fn bit(self) -> u64 {
        match self {
            Permission::ManageChannels => 1 << 4,
            Permission::ViewChannel => 1 << 10,
            Permission::SendMessages => 1 << 11,
            Permission::ReadMessageHistory => 1 << 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverwriteTarget {
    Role(RoleId),
    Member(UserId),
}

#[derive(Debug, Clone)]
pub struct PermissionOverwrite {
    pub target: OverwriteTarget,
    pub allow: Vec<Permission>,
    pub deny: Vec<Permission>,
}

#[derive(Debug, Clone)]
pub struct ChannelSpec {
    pub name: String,
    pub group: GroupId,
    pub overwrites: Vec<PermissionOverwrite>,
}

/// Fixed access set applied at ticket creation and never altered afterwards:
/// the channel is hidden from everyone, the requester and staff can talk in
/// it (staff additionally manage it), and the bot can post.
pub fn ticket_overwrites(
    everyone: &RoleId,
    requester: &UserId,
    staff: &RoleId,
    bot_user: &UserId,
) -> Vec<PermissionOverwrite> {
    vec![
        PermissionOverwrite {
            target: OverwriteTarget::Role(everyone.clone()),
            allow: vec![],
            deny: vec![Permission::ViewChannel],
        },
        PermissionOverwrite {
            target: OverwriteTarget::Member(requester.clone()),
            allow: vec![
                Permission::ViewChannel,
                Permission::SendMessages,
                Permission::ReadMessageHistory,
            ],
            deny: vec![],
        },
        PermissionOverwrite {
            target: OverwriteTarget::Role(staff.clone()),
            allow: vec![
                Permission::ViewChannel,
                Permission::SendMessages,
                Permission::ReadMessageHistory,
                Permission::ManageChannels,
            ],
            deny: vec![],
        },
        PermissionOverwrite {
            target: OverwriteTarget::Member(bot_user.clone()),
            allow: vec![Permission::ViewChannel, Permission::SendMessages],
            deny: vec![],
        },
    ]
}

#[async_trait]
pub trait ChannelAdminService: Send + Sync {
    async fn create_channel(&self, spec: &ChannelSpec) -> AppResult<ChannelId>;
    async fn rename_channel(&self, channel: &ChannelId, name: &str) -> AppResult<()>;
    async fn reparent_channel(&self, channel: &ChannelId, group: &GroupId) -> AppResult<()>;
    async fn delete_channel(&self, channel: &ChannelId) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_bits_match_platform_flags() {
        assert_eq!(Permission::ManageChannels.bit(), 0x10);
        assert_eq!(Permission::ViewChannel.bit(), 0x400);
        assert_eq!(Permission::SendMessages.bit(), 0x800);
        assert_eq!(Permission::ReadMessageHistory.bit(), 0x10000);
    }

    #[test]
    fn creation_policy_hides_channel_from_everyone() {
        let overwrites = ticket_overwrites(
            &RoleId("guild".to_string()),
            &UserId("user".to_string()),
            &RoleId("staff".to_string()),
            &UserId("bot".to_string()),
        );
        assert_eq!(overwrites.len(), 4);
        assert_eq!(overwrites[0].deny, vec![Permission::ViewChannel]);
        assert!(overwrites[1].allow.contains(&Permission::SendMessages));
        assert!(overwrites[2].allow.contains(&Permission::ManageChannels));
        assert!(!overwrites[3].allow.contains(&Permission::ManageChannels));
    }
}
