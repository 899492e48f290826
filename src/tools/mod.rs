pub mod google;
pub mod llm;
