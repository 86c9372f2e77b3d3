pub mod messages;
pub mod prompts;
pub mod requests;

pub use messages::{CompletionRole, CompletionTurn, Message, MessageError, Persona, WireMessage};
pub use prompts::PromptDocument;
pub use requests::{IncomingMessage, ProxyRequest, ProxyResponse, ValidatedRequest};
