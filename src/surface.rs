//! Static menu, form, embed and button definitions. The identifier strings
//! here are part of the wire contract with previously posted messages, so
//! they must never change.

use chrono::Utc;

use crate::domain::category::TicketCategory;
use crate::domain::ids::UserId;
use crate::domain::state::TicketState;
use crate::domain::ticket::TicketFields;
use crate::services::messaging::{
    Button, ButtonStyle, ComponentRow, Embed, EmbedField, OutboundMessage, SelectMenu,
    SelectOption,
};

pub const TICKET_MENU: &str = "ticket_menu";
pub const TICKET_STATUS: &str = "ticket_status";
pub const DELETE_TICKET: &str = "delete_ticket";
pub const REOPEN_TICKET: &str = "reopen_ticket";
pub const TICKET_MODAL_PREFIX: &str = "ticket_modal_";
pub const SETUP_COMMAND: &str = "setticketchannel";

pub const FIELD_USERNAME: &str = "usuario";
pub const FIELD_MODE: &str = "modalidad";
pub const FIELD_DESCRIPTION: &str = "descripcion";

const BRAND_COLOR: u32 = 0x38caea;
const REVIEW_COLOR: u32 = 0xfaa61a;
const CLOSED_COLOR: u32 = 0xae03de;
const URGENT_COLOR: u32 = 0xed4245;
const REOPENED_COLOR: u32 = 0x57f287;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputStyle {
    Short,
    Paragraph,
}

#[derive(Debug, Clone)]
pub struct TextInput {
    pub custom_id: String,
    pub label: String,
    pub style: InputStyle,
    pub required: bool,
}

/// Structured-input form shown after picking a category. Rendered by the
/// webhook shim as the synchronous interaction response.
#[derive(Debug, Clone)]
pub struct ModalDefinition {
    pub custom_id: String,
    pub title: String,
    pub inputs: Vec<TextInput>,
}

pub fn category_menu_message() -> OutboundMessage {
    let options = TicketCategory::ALL
        .iter()
        .map(|category| SelectOption {
            label: category.label().to_string(),
            value: category.as_str().to_string(),
            emoji: Some(category.emoji().to_string()),
        })
        .collect();

    OutboundMessage {
        content: None,
        embed: Some(Embed {
            title: "👉 **AYUDA AL JUGADOR** 👈".to_string(),
            description: Some(
                "**¡Hola, querido usuario**! Si necesitas ayuda, hacer un reporte o tienes \
                 algun problema, no dudes en abrir un ticket aqui, te estara atendiendo un \
                 personal.\n\n> **ADVERTENCIA**: Si abres un ticket para bromear, serás \
                 baneado permanentemente del **Discord**."
                    .to_string(),
            ),
            fields: vec![],
            footer: None,
            color: BRAND_COLOR,
        }),
        components: vec![ComponentRow::Menu(SelectMenu {
            custom_id: TICKET_MENU.to_string(),
            placeholder: "Selecciona tu problema".to_string(),
            options,
        })],
    }
}

pub fn intake_modal(category: TicketCategory) -> ModalDefinition {
    ModalDefinition {
        custom_id: format!("{TICKET_MODAL_PREFIX}{}", category.as_str()),
        title: "SOPORTE DE HYTACRAFT".to_string(),
        inputs: vec![
            TextInput {
                custom_id: FIELD_USERNAME.to_string(),
                label: "Nombre de usuario".to_string(),
                style: InputStyle::Short,
                required: true,
            },
            TextInput {
                custom_id: FIELD_MODE.to_string(),
                label: "Modalidad".to_string(),
                style: InputStyle::Short,
                required: true,
            },
            TextInput {
                custom_id: FIELD_DESCRIPTION.to_string(),
                label: "Descripción o comentario".to_string(),
                style: InputStyle::Paragraph,
                required: true,
            },
        ],
    }
}

pub fn status_menu() -> SelectMenu {
    SelectMenu {
        custom_id: TICKET_STATUS.to_string(),
        placeholder: "Selecciona el estado del ticket...".to_string(),
        options: vec![
            SelectOption {
                label: "En revisión".to_string(),
                value: "en_revision".to_string(),
                emoji: Some("🟡".to_string()),
            },
            SelectOption {
                label: "Cerrar Ticket".to_string(),
                value: "cerrar".to_string(),
                emoji: Some("🔴".to_string()),
            },
            SelectOption {
                label: "Urgente ⚠️".to_string(),
                value: "urgente".to_string(),
                emoji: Some("⚠️".to_string()),
            },
        ],
    }
}

fn closed_actions() -> Vec<Button> {
    vec![
        Button {
            custom_id: DELETE_TICKET.to_string(),
            label: "🗑️ Eliminar".to_string(),
            style: ButtonStyle::Danger,
        },
        Button {
            custom_id: REOPEN_TICKET.to_string(),
            label: "🔓 Re-Abrir".to_string(),
            style: ButtonStyle::Secondary,
        },
    ]
}

/// Summary posted into a freshly provisioned ticket channel, with the status
/// menu attached.
pub fn summary_message(fields: &TicketFields, claimed_by: Option<&UserId>) -> OutboundMessage {
    let claimed = match claimed_by {
        Some(user) => user.mention(),
        None => "> (Este ticket no ha sido reclamado)".to_string(),
    };

    OutboundMessage {
        content: None,
        embed: Some(Embed {
            title: "📝 Detalles del Ticket".to_string(),
            description: None,
            fields: vec![
                EmbedField {
                    name: "👤 Usuario".to_string(),
                    value: fields.username.clone(),
                    inline: true,
                },
                EmbedField {
                    name: "🎮 Modalidad".to_string(),
                    value: fields.mode.clone(),
                    inline: true,
                },
                EmbedField {
                    name: "📝 Descripción".to_string(),
                    value: fields.description.clone(),
                    inline: false,
                },
                EmbedField {
                    name: "🧑‍💼 Reclamado por".to_string(),
                    value: claimed,
                    inline: false,
                },
                EmbedField {
                    name: "❗ Importante".to_string(),
                    value: "¡Recuerda no mencionar al Staff! Te atenderán lo antes posible."
                        .to_string(),
                    inline: false,
                },
            ],
            footer: Some(format!("Creado el {}", Utc::now().format("%d/%m/%Y %H:%M"))),
            color: BRAND_COLOR,
        }),
        components: vec![ComponentRow::Menu(status_menu())],
    }
}

/// State-change notice posted into the ticket channel, attributed to the
/// acting user. The closed notice carries the delete/reopen buttons.
pub fn transition_notice(target: TicketState, actor: &UserId) -> OutboundMessage {
    let actor = actor.mention();
    let (title, description, color, components) = match target {
        TicketState::UnderReview => (
            "🔄 Ticket en Revisión",
            format!("Este ticket fue marcado como \"En Revisión\" por {actor}"),
            REVIEW_COLOR,
            vec![],
        ),
        TicketState::Closed => (
            "🛑 Ticket Cerrado",
            format!("Este ticket fue cerrado por {actor}"),
            CLOSED_COLOR,
            vec![ComponentRow::Buttons(closed_actions())],
        ),
        TicketState::Urgent => (
            "⚠️ Ticket Urgente",
            format!("Este ticket fue marcado como urgente por {actor}"),
            URGENT_COLOR,
            vec![],
        ),
        TicketState::Reopened | TicketState::Open => (
            "🔓 Ticket Reabierto",
            format!("Este ticket fue reabierto por {actor}"),
            REOPENED_COLOR,
            vec![],
        ),
    };

    OutboundMessage {
        content: None,
        embed: Some(Embed {
            title: title.to_string(),
            description: Some(description),
            fields: vec![],
            footer: None,
            color,
        }),
        components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_menu_offers_all_categories() {
        let message = category_menu_message();
        let [ComponentRow::Menu(menu)] = &message.components[..] else {
            panic!("expected a single menu row");
        };
        assert_eq!(menu.custom_id, TICKET_MENU);
        assert_eq!(menu.options.len(), 8);
        assert!(menu.options.iter().any(|o| o.value == "reportar_staff"));
    }

    #[test]
    fn intake_modal_tags_the_category() {
        let modal = intake_modal(TicketCategory::Bugs);
        assert_eq!(modal.custom_id, "ticket_modal_bugs");
        assert_eq!(modal.inputs.len(), 3);
        assert!(modal.inputs.iter().all(|input| input.required));
    }

    #[test]
    fn closed_notice_carries_delete_and_reopen_buttons() {
        let notice = transition_notice(TicketState::Closed, &UserId("1".to_string()));
        let [ComponentRow::Buttons(buttons)] = &notice.components[..] else {
            panic!("expected a button row");
        };
        let ids: Vec<_> = buttons.iter().map(|b| b.custom_id.as_str()).collect();
        assert_eq!(ids, vec![DELETE_TICKET, REOPEN_TICKET]);
    }

    #[test]
    fn unclaimed_summary_shows_placeholder() {
        let message = summary_message(
            &TicketFields {
                username: "Ana".to_string(),
                mode: "Survival".to_string(),
                description: "Crash on login".to_string(),
            },
            None,
        );
        let embed = message.embed.unwrap();
        let claimed = embed
            .fields
            .iter()
            .find(|f| f.name.contains("Reclamado"))
            .unwrap();
        assert!(claimed.value.contains("no ha sido reclamado"));
    }
}
