//! Service implementations
//!
//! Concrete implementations of the collaborator traits: an in-process store,
//! offline template collaborators, OpenAI-backed collaborators and the clock.

pub mod clock;
pub mod memory_store;
pub mod openai;
pub mod template;

// Re-export all service implementations
pub use clock::SystemClock;
pub use memory_store::{ActivityEntry, InMemoryStore, SeedFile, SeedKeyword, StoreSnapshot};
pub use openai::{OpenAiClient, OpenAiContentGenerator, OpenAiContentImprover, OpenAiImageGenerator};
pub use template::{NoImageGenerator, PassthroughImprover, TemplateContentGenerator};
