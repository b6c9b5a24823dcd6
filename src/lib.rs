pub mod chat;
pub mod completion;
pub mod constants;
pub mod persona;
pub mod placeholder;
pub mod relay_client;
pub mod terminal;
pub mod ui;
pub mod web_server;

pub use chat::{ChatReply, ChatRequest, ChatSession, Message, OutboundRequest, Role, Ticket};
pub use completion::{CompletionClient, CompletionError};
pub use persona::Profile;
pub use placeholder::{Phase, PlaceholderAnimator};
pub use relay_client::{RelayClient, RelayError};
