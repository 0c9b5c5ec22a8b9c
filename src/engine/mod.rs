pub mod engine;
pub mod protocol;
pub mod session;

pub mod prompt_builder;
pub mod llm_client;
pub mod narrative_parser;
pub mod image_loader;
