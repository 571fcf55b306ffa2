pub mod bypass;
pub mod local;
pub mod ollama;
pub mod openai;
