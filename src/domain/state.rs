use crate::error::{AppError, AppResult};

/// Handling status of a ticket. `Urgent` is both a state and a sticky flag:
/// entering it sets `Ticket::urgent`, which no later transition clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketState {
    Open,
    UnderReview,
    Urgent,
    Closed,
    Reopened,
}

impl TicketState {
    /// Leading symbol encoded into the channel name.
    pub fn glyph(self) -> &'static str {
        match self {
            TicketState::Open | TicketState::Reopened => "🟢",
            TicketState::UnderReview => "🟡",
            TicketState::Urgent => "⚠️",
            TicketState::Closed => "🔴",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TicketState::Open => "Abierto",
            TicketState::UnderReview => "En revisión",
            TicketState::Urgent => "Urgente",
            TicketState::Closed => "Cerrado",
            TicketState::Reopened => "Reabierto",
        }
    }

    /// Whether a transition into `target` is reachable from this state.
    ///
    /// The status menu offers review/urgent/close from any non-closed state
    /// (repeats are idempotent); a closed ticket only accepts the reopen
    /// button or a redundant close. `Open` is never a target.
    pub fn accepts(self, target: TicketState) -> bool {
        match self {
            TicketState::Closed => {
                matches!(target, TicketState::Reopened | TicketState::Closed)
            }
            _ => matches!(
                target,
                TicketState::UnderReview | TicketState::Urgent | TicketState::Closed
            ),
        }
    }
}

/// Channel names derive purely from state and ticket number; nothing ever
/// edits an existing name in place.
pub fn channel_name(state: TicketState, number: u64) -> String {
    format!("{}-ticket-{}", state.glyph(), number)
}

/// Which containment group a transition moves the channel into, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regroup {
    ToClosed,
    ToActive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    pub state: TicketState,
    pub name: String,
    pub regroup: Option<Regroup>,
    pub set_urgent: bool,
}

/// Pure decision step of the lifecycle controller: validates reachability
/// and derives the presentation for the new state. Callers apply the plan's
/// external effects first and only then commit it to the registry.
pub fn plan_transition(
    current: TicketState,
    number: u64,
    target: TicketState,
) -> AppResult<TransitionPlan> {
    if !current.accepts(target) {
        return Err(AppError::InvalidTransition {
            from: current,
            to: target,
        });
    }

    let regroup = match target {
        TicketState::Closed => Some(Regroup::ToClosed),
        TicketState::Reopened => Some(Regroup::ToActive),
        _ => None,
    };

    Ok(TransitionPlan {
        state: target,
        name: channel_name(target, number),
        regroup,
        set_urgent: target == TicketState::Urgent,
    })
}
