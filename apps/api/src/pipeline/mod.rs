// Bulk scoring pipeline: pairing-table parsing, criteria extraction,
// dual-path scoring (model + heuristic fallback), the job engine, and
// result export. All LLM calls go through the `llm` module.

pub mod config_parser;
pub mod criteria;
pub mod engine;
pub mod export;
pub mod handlers;
pub mod heuristic;
pub mod prompts;
pub mod scoring;
