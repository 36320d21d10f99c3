pub mod db;
pub mod memory;
pub mod vision_llm;

pub use db::DbAdapter;
pub use memory::InMemoryStore;
pub use vision_llm::OpenAiVisionAdapter;
