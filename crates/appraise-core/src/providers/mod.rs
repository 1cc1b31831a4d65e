pub mod browser;
pub mod llm;
pub mod repo;
