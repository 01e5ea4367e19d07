pub mod llm;
pub mod paystack;
