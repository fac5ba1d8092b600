//! Capa de presentación: embeds, botones y el notificador que los publica.

pub mod buttons;
pub mod embeds;
pub mod notifier;
