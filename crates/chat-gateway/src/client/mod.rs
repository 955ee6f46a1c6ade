//! Client session facade

mod bot_session;

pub use bot_session::BotSession;
