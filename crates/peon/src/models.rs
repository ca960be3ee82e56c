//! These models represent the objects passed between the agent loop, the tool
//! registry and the providers.
//!
//! Every provider converts to and from these structs at its edge, so the agent
//! never sees a backend's wire format. The conversation is a plain ordered
//! list of [`message::Message`] values; tool results are carried as JSON text
//! produced from [`content::ToolPayload`].
pub mod content;
pub mod message;
pub mod role;
pub mod tool;
