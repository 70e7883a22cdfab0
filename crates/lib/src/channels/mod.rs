//! Communication channels (Telegram).
//!
//! The polling loop only sees the [`UpdateFeed`] and [`MessageDispatcher`] traits;
//! [`TelegramChannel`] implements both against the Bot API.

mod feed;
mod inbound;
mod telegram;

pub use feed::{DeliveryError, MessageDispatcher, UpdateFeed};
pub use inbound::InboundMessage;
pub use telegram::{TelegramChannel, TelegramError, TelegramUpdate};
