pub mod category;
pub mod chat;
pub mod forms;

pub use category::Category;
pub use chat::{ChatEvent, ChatMessage, MessageKind, SessionView, Sender};
pub use forms::{ContactForm, NewsletterSignup};
