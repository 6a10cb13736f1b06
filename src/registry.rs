use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

use crate::domain::ids::ChannelId;
use crate::domain::ticket::Ticket;
use crate::error::{AppError, AppResult};

/// Authoritative in-memory store of active tickets, keyed by channel id,
/// together with the display-number counter. Process lifetime only; nothing
/// here is persisted.
#[derive(Debug)]
pub struct TicketRegistry {
    tickets: HashMap<ChannelId, Ticket>,
    next_number: u64,
}

impl TicketRegistry {
    pub fn new() -> Self {
        Self {
            tickets: HashMap::new(),
            next_number: 1,
        }
    }

    /// Number the next ticket would receive. Creation peeks first and commits
    /// only after the channel exists, so a failed provisioning never burns a
    /// number.
    pub fn peek_number(&self) -> u64 {
        self.next_number
    }

    pub fn commit_number(&mut self) {
        self.next_number += 1;
    }

    pub fn insert(&mut self, ticket: Ticket) -> AppResult<()> {
        match self.tickets.entry(ticket.channel_id.clone()) {
            Entry::Occupied(_) => Err(AppError::TicketExists),
            Entry::Vacant(slot) => {
                slot.insert(ticket);
                Ok(())
            }
        }
    }

    /// Absence is the normal "not a ticket channel" case, not an error.
    pub fn get(&self, channel: &ChannelId) -> Option<&Ticket> {
        self.tickets.get(channel)
    }

    pub fn update(
        &mut self,
        channel: &ChannelId,
        mutator: impl FnOnce(&mut Ticket),
    ) -> AppResult<()> {
        let Some(ticket) = self.tickets.get_mut(channel) else {
            return Err(AppError::TicketNotFound);
        };
        mutator(ticket);
        Ok(())
    }

    /// Only deletion removes entries; closing a ticket keeps it registered.
    pub fn remove(&mut self, channel: &ChannelId) -> Option<Ticket> {
        self.tickets.remove(channel)
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}

/// Shared handle to the registry plus per-channel action guards. The guard
/// serializes concurrent staff actions on the same ticket (acquired at the
/// start of an action, released when it completes), while the registry lock
/// itself is only held for short read/commit sections -- except during
/// creation, which holds it across provisioning so two rapid creations can
/// never allocate the same number.
#[derive(Clone)]
pub struct TicketStore {
    registry: Arc<Mutex<TicketRegistry>>,
    guards: Arc<Mutex<HashMap<ChannelId, Arc<Mutex<()>>>>>,
}

impl TicketStore {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(TicketRegistry::new())),
            guards: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, TicketRegistry> {
        self.registry.lock().await
    }

    pub async fn guard(&self, channel: &ChannelId) -> OwnedMutexGuard<()> {
        let slot = {
            let mut guards = self.guards.lock().await;
            guards
                .entry(channel.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        slot.lock_owned().await
    }

    /// Called after a ticket is deleted so the guard map does not grow with
    /// every ticket ever created.
    pub async fn drop_guard(&self, channel: &ChannelId) {
        self.guards.lock().await.remove(channel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::TicketCategory;
    use crate::domain::ids::{MessageId, UserId};
    use crate::domain::ticket::TicketFields;

    fn sample_ticket(channel: &str, number: u64) -> Ticket {
        Ticket::new(
            ChannelId(channel.to_string()),
            number,
            UserId("100".to_string()),
            TicketCategory::General,
            TicketFields {
                username: "Ana".to_string(),
                mode: "Survival".to_string(),
                description: "algo".to_string(),
            },
            MessageId("900".to_string()),
        )
    }

    #[test]
    fn numbers_are_strictly_increasing_without_gaps() {
        let mut registry = TicketRegistry::new();
        let mut seen = Vec::new();
        for i in 0..5 {
            let number = registry.peek_number();
            registry
                .insert(sample_ticket(&format!("c{i}"), number))
                .unwrap();
            registry.commit_number();
            seen.push(number);
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn failed_provisioning_does_not_burn_a_number() {
        let mut registry = TicketRegistry::new();
        let peeked = registry.peek_number();
        // No commit: the external channel creation failed.
        assert_eq!(registry.peek_number(), peeked);
    }

    #[test]
    fn rejects_second_ticket_for_same_channel() {
        let mut registry = TicketRegistry::new();
        registry.insert(sample_ticket("c1", 1)).unwrap();
        assert!(matches!(
            registry.insert(sample_ticket("c1", 2)),
            Err(AppError::TicketExists)
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn missing_channel_is_absent_not_an_error() {
        let registry = TicketRegistry::new();
        assert!(registry.get(&ChannelId("nope".to_string())).is_none());
    }

    #[test]
    fn update_requires_an_entry() {
        let mut registry = TicketRegistry::new();
        let result = registry.update(&ChannelId("nope".to_string()), |_| {});
        assert!(matches!(result, Err(AppError::TicketNotFound)));
    }

    #[test]
    fn remove_makes_later_lookups_absent() {
        let mut registry = TicketRegistry::new();
        let channel = ChannelId("c1".to_string());
        registry.insert(sample_ticket("c1", 1)).unwrap();
        assert!(registry.remove(&channel).is_some());
        assert!(registry.get(&channel).is_none());
        assert!(registry.is_empty());
    }
}
