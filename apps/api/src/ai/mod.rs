// AI functions: resume improvement and cover-letter generation.
// Stateless request/response proxies. All LLM calls go through llm_client.

pub mod cover_letter;
pub mod handlers;
pub mod improve;
pub mod prompts;
