/// Issue categories offered by the ticket menu. The wire values double as the
/// suffix of the intake-form identifier, so they must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketCategory {
    General,
    Bugs,
    PlayerReport,
    Appeal,
    ContentCreator,
    WebStore,
    StaffReport,
    Other,
}

impl TicketCategory {
    pub const ALL: [TicketCategory; 8] = [
        TicketCategory::General,
        TicketCategory::Bugs,
        TicketCategory::PlayerReport,
        TicketCategory::Appeal,
        TicketCategory::ContentCreator,
        TicketCategory::WebStore,
        TicketCategory::StaffReport,
        TicketCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketCategory::General => "general",
            TicketCategory::Bugs => "bugs",
            TicketCategory::PlayerReport => "reportar_jugador",
            TicketCategory::Appeal => "apelacion",
            TicketCategory::ContentCreator => "creador_contenido",
            TicketCategory::WebStore => "tienda_web",
            TicketCategory::StaffReport => "reportar_staff",
            TicketCategory::Other => "otros",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TicketCategory::General => "General",
            TicketCategory::Bugs => "Bugs",
            TicketCategory::PlayerReport => "Reportar jugador",
            TicketCategory::Appeal => "Apelacion",
            TicketCategory::ContentCreator => "Creador de contenido",
            TicketCategory::WebStore => "Tienda Web",
            TicketCategory::StaffReport => "Reportar STAFF",
            TicketCategory::Other => "Otros",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            TicketCategory::General => "🌍",
            TicketCategory::Bugs => "🛠️",
            TicketCategory::PlayerReport => "❌",
            TicketCategory::Appeal => "🙏",
            TicketCategory::ContentCreator => "🎥",
            TicketCategory::WebStore => "🛒",
            TicketCategory::StaffReport => "⭕",
            TicketCategory::Other => "❓",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == value.trim())
    }
}
