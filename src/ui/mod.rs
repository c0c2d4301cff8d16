pub mod prompts;
pub mod render;
