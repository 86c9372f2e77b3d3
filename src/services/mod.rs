pub mod conversation;
pub mod fanout;
pub mod firestore;
pub mod gcp;
pub mod prompts;
pub mod secrets;
