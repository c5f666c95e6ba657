pub mod forms;
pub mod responder;
pub mod session;
pub mod store;
