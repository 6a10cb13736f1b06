//! HTTP shim: the keep-alive endpoint and the interactions webhook. This is
//! the only place that understands the platform's interaction wire format;
//! payloads are decoded into typed [`Action`]s exactly once, here.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ed25519_dalek::{Signature, VerifyingKey};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::context::AppContext;
use crate::dispatch::{self, Action};
use crate::domain::category::TicketCategory;
use crate::domain::ids::{ChannelId, UserId};
use crate::domain::state::TicketState;
use crate::domain::ticket::TicketFields;
use crate::error::{AppError, AppResult};
use crate::services::messaging::ReplyToken;
use crate::surface::{self, InputStyle, ModalDefinition};

const ADMINISTRATOR: u64 = 1 << 3;

// Interaction and response type discriminants from the platform API.
const PING: u8 = 1;
const APPLICATION_COMMAND: u8 = 2;
const MESSAGE_COMPONENT: u8 = 3;
const MODAL_SUBMIT: u8 = 5;
const RESPONSE_PONG: u8 = 1;
const RESPONSE_MESSAGE: u8 = 4;
const RESPONSE_DEFERRED: u8 = 5;
const RESPONSE_MODAL: u8 = 9;
const EPHEMERAL: u64 = 1 << 6;

struct WebState {
    ctx: AppContext,
    verifier: SignatureVerifier,
}

/// Verifies the mandatory ed25519 signature the platform attaches to every
/// webhook delivery.
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    pub fn from_hex(public_key: &str) -> AppResult<Self> {
        let bytes = hex::decode(public_key.trim())
            .map_err(|err| AppError::Configuration(format!("invalid public key: {err}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| AppError::Configuration("public key must be 32 bytes".to_string()))?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|err| AppError::Configuration(format!("invalid public key: {err}")))?;
        Ok(Self { key })
    }

    pub fn verify(&self, timestamp: &str, body: &[u8], signature_hex: &str) -> bool {
        let Ok(signature_bytes) = hex::decode(signature_hex) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&signature_bytes) else {
            return false;
        };
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        self.key.verify_strict(&message, &signature).is_ok()
    }
}

pub async fn serve(ctx: AppContext) -> AppResult<()> {
    let verifier = SignatureVerifier::from_hex(&ctx.config.public_key)?;
    let port = ctx.config.port;
    let state = Arc::new(WebState { ctx, verifier });

    let app = Router::new()
        .route("/", get(keepalive))
        .route("/interactions", post(interactions))
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "web server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to install shutdown handler");
    }
}

async fn keepalive() -> &'static str {
    "¡El bot de tickets está corriendo!"
}

async fn interactions(
    State(state): State<Arc<WebState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = header(&headers, "x-signature-ed25519");
    let timestamp = header(&headers, "x-signature-timestamp");
    let (Some(signature), Some(timestamp)) = (signature, timestamp) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    if !state.verifier.verify(timestamp, &body, signature) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let payload: InteractionPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(%err, "undecodable interaction payload");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match decode(payload) {
        Decoded::Pong => Json(json!({ "type": RESPONSE_PONG })).into_response(),
        Decoded::ShowModal(modal) => {
            Json(json!({ "type": RESPONSE_MODAL, "data": modal_json(&modal) })).into_response()
        }
        Decoded::Reject(content) => Json(json!({
            "type": RESPONSE_MESSAGE,
            "data": { "content": content, "flags": EPHEMERAL },
        }))
        .into_response(),
        Decoded::Dispatch(action) => {
            // Acknowledge within the platform deadline; the real reply goes
            // out as an ephemeral follow-up from the dispatch boundary.
            tokio::spawn(dispatch::handle(state.ctx.clone(), action));
            Json(json!({
                "type": RESPONSE_DEFERRED,
                "data": { "flags": EPHEMERAL },
            }))
            .into_response()
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

#[derive(Debug)]
enum Decoded {
    Pong,
    ShowModal(ModalDefinition),
    Dispatch(Action),
    Reject(String),
}

fn decode(payload: InteractionPayload) -> Decoded {
    if payload.kind == PING {
        return Decoded::Pong;
    }

    let reply = ReplyToken {
        interaction_id: payload.id.clone(),
        interaction_token: payload.token.clone(),
    };
    let Some(actor) = payload.actor() else {
        return Decoded::Reject("❌ No se pudo identificar al usuario.".to_string());
    };
    let actor_is_admin = payload.is_admin();
    let channel = payload.channel_id.clone().map(ChannelId);
    let data = payload.data.unwrap_or_default();

    match payload.kind {
        APPLICATION_COMMAND => {
            let name = data.name.unwrap_or_default();
            if name != surface::SETUP_COMMAND {
                return Decoded::Dispatch(Action::Unknown {
                    custom_id: name,
                    reply,
                });
            }
            let Some(channel) = channel else {
                return Decoded::Reject("❌ Este comando solo funciona en un canal.".to_string());
            };
            Decoded::Dispatch(Action::SetupMenu {
                channel,
                actor,
                actor_is_admin,
                reply,
            })
        }
        MESSAGE_COMPONENT => {
            let custom_id = data.custom_id.unwrap_or_default();
            match custom_id.as_str() {
                surface::TICKET_MENU => {
                    let selected = data.values.unwrap_or_default();
                    match selected.first().and_then(|v| TicketCategory::from_str(v)) {
                        Some(category) => Decoded::ShowModal(surface::intake_modal(category)),
                        None => Decoded::Reject("❌ Categoría no válida.".to_string()),
                    }
                }
                surface::TICKET_STATUS => {
                    let Some(channel) = channel else {
                        return Decoded::Reject("❌ Falta el canal del ticket.".to_string());
                    };
                    let selected = data.values.unwrap_or_default();
                    let target = match selected.first().map(String::as_str) {
                        Some("en_revision") => TicketState::UnderReview,
                        Some("cerrar") => TicketState::Closed,
                        Some("urgente") => TicketState::Urgent,
                        _ => return Decoded::Reject("❌ Estado no válido.".to_string()),
                    };
                    Decoded::Dispatch(Action::StatusSelected {
                        channel,
                        actor,
                        target,
                        reply,
                    })
                }
                surface::DELETE_TICKET => match channel {
                    Some(channel) => Decoded::Dispatch(Action::DeletePressed {
                        channel,
                        actor,
                        reply,
                    }),
                    None => Decoded::Reject("❌ Falta el canal del ticket.".to_string()),
                },
                surface::REOPEN_TICKET => match channel {
                    Some(channel) => Decoded::Dispatch(Action::ReopenPressed {
                        channel,
                        actor,
                        reply,
                    }),
                    None => Decoded::Reject("❌ Falta el canal del ticket.".to_string()),
                },
                _ => Decoded::Dispatch(Action::Unknown { custom_id, reply }),
            }
        }
        MODAL_SUBMIT => {
            let custom_id = data.custom_id.clone().unwrap_or_default();
            let Some(category_value) = custom_id.strip_prefix(surface::TICKET_MODAL_PREFIX) else {
                return Decoded::Dispatch(Action::Unknown { custom_id, reply });
            };
            let Some(category) = TicketCategory::from_str(category_value) else {
                return Decoded::Reject("❌ Categoría no válida.".to_string());
            };
            let (Some(username), Some(mode), Some(description)) = (
                data.field(surface::FIELD_USERNAME),
                data.field(surface::FIELD_MODE),
                data.field(surface::FIELD_DESCRIPTION),
            ) else {
                return Decoded::Reject("❌ Faltan campos del formulario.".to_string());
            };
            Decoded::Dispatch(Action::TicketSubmitted {
                category,
                requester: actor,
                fields: TicketFields {
                    username,
                    mode,
                    description,
                },
                reply,
            })
        }
        other => Decoded::Dispatch(Action::Unknown {
            custom_id: format!("interaction_type_{other}"),
            reply,
        }),
    }
}

fn modal_json(modal: &ModalDefinition) -> serde_json::Value {
    let components: Vec<_> = modal
        .inputs
        .iter()
        .map(|input| {
            let style = match input.style {
                InputStyle::Short => 1,
                InputStyle::Paragraph => 2,
            };
            json!({
                "type": 1,
                "components": [{
                    "type": 4,
                    "custom_id": input.custom_id,
                    "label": input.label,
                    "style": style,
                    "required": input.required,
                }],
            })
        })
        .collect();

    json!({
        "custom_id": modal.custom_id,
        "title": modal.title,
        "components": components,
    })
}

#[derive(Debug, Deserialize)]
struct InteractionPayload {
    #[serde(rename = "type")]
    kind: u8,
    id: String,
    token: String,
    #[serde(default)]
    data: Option<InteractionData>,
    #[serde(default)]
    member: Option<Member>,
    #[serde(default)]
    channel_id: Option<String>,
}

impl InteractionPayload {
    fn actor(&self) -> Option<UserId> {
        self.member
            .as_ref()
            .and_then(|member| member.user.as_ref())
            .map(|user| UserId(user.id.clone()))
    }

    /// Whether the member's permission bitfield carries ADMINISTRATOR.
    fn is_admin(&self) -> bool {
        self.member
            .as_ref()
            .and_then(|member| member.permissions.as_deref())
            .and_then(|bits| bits.parse::<u64>().ok())
            .map(|bits| bits & ADMINISTRATOR != 0)
            .unwrap_or(false)
    }
}

#[derive(Debug, Default, Deserialize)]
struct InteractionData {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    custom_id: Option<String>,
    #[serde(default)]
    values: Option<Vec<String>>,
    #[serde(default)]
    components: Option<Vec<ModalRow>>,
}

impl InteractionData {
    fn field(&self, custom_id: &str) -> Option<String> {
        self.components
            .as_ref()?
            .iter()
            .flat_map(|row| row.components.iter())
            .find(|field| field.custom_id == custom_id)
            .map(|field| field.value.clone())
            .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ModalRow {
    #[serde(default)]
    components: Vec<ModalField>,
}

#[derive(Debug, Deserialize)]
struct ModalField {
    custom_id: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct Member {
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    permissions: Option<String>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signer, SigningKey};
    use serde_json::json;

    use super::*;

    fn payload(value: serde_json::Value) -> InteractionPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn verifies_and_rejects_signatures() {
        let signing = SigningKey::from_bytes(&[7u8; 32]);
        let verifier = SignatureVerifier::from_hex(&hex::encode(
            signing.verifying_key().to_bytes(),
        ))
        .unwrap();

        let body = br#"{"type":1}"#;
        let timestamp = "1700000000";
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        let signature = hex::encode(signing.sign(&message).to_bytes());

        assert!(verifier.verify(timestamp, body, &signature));
        assert!(!verifier.verify("1700000001", body, &signature));
        assert!(!verifier.verify(timestamp, body, "not-hex"));
    }

    #[test]
    fn ping_gets_a_pong() {
        let decoded = decode(payload(json!({ "type": 1, "id": "1", "token": "t" })));
        assert!(matches!(decoded, Decoded::Pong));
    }

    #[test]
    fn category_selection_opens_the_matching_form() {
        let decoded = decode(payload(json!({
            "type": 3,
            "id": "1",
            "token": "t",
            "channel_id": "55",
            "member": { "user": { "id": "100" } },
            "data": { "custom_id": "ticket_menu", "values": ["bugs"] },
        })));
        let Decoded::ShowModal(modal) = decoded else {
            panic!("expected a modal response");
        };
        assert_eq!(modal.custom_id, "ticket_modal_bugs");
    }

    #[test]
    fn form_submission_decodes_category_and_fields_once() {
        let decoded = decode(payload(json!({
            "type": 5,
            "id": "1",
            "token": "t",
            "channel_id": "55",
            "member": { "user": { "id": "100" } },
            "data": {
                "custom_id": "ticket_modal_apelacion",
                "components": [
                    { "components": [{ "custom_id": "usuario", "value": "Ana" }] },
                    { "components": [{ "custom_id": "modalidad", "value": "Survival" }] },
                    { "components": [{ "custom_id": "descripcion", "value": "Crash" }] },
                ],
            },
        })));
        let Decoded::Dispatch(Action::TicketSubmitted {
            category,
            requester,
            fields,
            ..
        }) = decoded
        else {
            panic!("expected a submission action");
        };
        assert_eq!(category, TicketCategory::Appeal);
        assert_eq!(requester, UserId("100".to_string()));
        assert_eq!(fields.username, "Ana");
        assert_eq!(fields.description, "Crash");
    }

    #[test]
    fn incomplete_form_is_rejected() {
        let decoded = decode(payload(json!({
            "type": 5,
            "id": "1",
            "token": "t",
            "member": { "user": { "id": "100" } },
            "data": {
                "custom_id": "ticket_modal_bugs",
                "components": [
                    { "components": [{ "custom_id": "usuario", "value": "Ana" }] },
                ],
            },
        })));
        assert!(matches!(decoded, Decoded::Reject(_)));
    }

    #[test]
    fn status_selection_carries_a_typed_target() {
        let decoded = decode(payload(json!({
            "type": 3,
            "id": "1",
            "token": "t",
            "channel_id": "55",
            "member": { "user": { "id": "200" } },
            "data": { "custom_id": "ticket_status", "values": ["cerrar"] },
        })));
        let Decoded::Dispatch(Action::StatusSelected { target, channel, .. }) = decoded else {
            panic!("expected a status action");
        };
        assert_eq!(target, TicketState::Closed);
        assert_eq!(channel, ChannelId("55".to_string()));
    }

    #[test]
    fn unknown_component_ids_go_to_the_not_found_path() {
        let decoded = decode(payload(json!({
            "type": 3,
            "id": "1",
            "token": "t",
            "channel_id": "55",
            "member": { "user": { "id": "200" } },
            "data": { "custom_id": "mystery_button" },
        })));
        assert!(matches!(
            decoded,
            Decoded::Dispatch(Action::Unknown { custom_id, .. }) if custom_id == "mystery_button"
        ));
    }

    #[test]
    fn admin_bit_gates_the_setup_command() {
        let admin = payload(json!({
            "type": 2,
            "id": "1",
            "token": "t",
            "channel_id": "55",
            "member": { "user": { "id": "300" }, "permissions": "8" },
            "data": { "name": "setticketchannel" },
        }));
        assert!(admin.is_admin());
        let Decoded::Dispatch(Action::SetupMenu { actor_is_admin, .. }) = decode(admin) else {
            panic!("expected a setup action");
        };
        assert!(actor_is_admin);

        let regular = payload(json!({
            "type": 2,
            "id": "1",
            "token": "t",
            "channel_id": "55",
            "member": { "user": { "id": "300" }, "permissions": "2048" },
            "data": { "name": "setticketchannel" },
        }));
        assert!(!regular.is_admin());
    }
}
