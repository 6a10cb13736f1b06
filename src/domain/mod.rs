pub mod category;
pub mod ids;
pub mod state;
pub mod ticket;
