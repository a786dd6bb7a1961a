use rig::{agent::Agent, client::CompletionClient, providers::openrouter};

pub const COMPLETION_MODEL: &str = "openai/gpt-4o-mini";

/// Create an LLM agent with the given system preamble.
///
/// The API key is validated at startup; this only fails if the
/// environment changed underneath a running process.
pub fn get_llm_agent(preamble: &str) -> anyhow::Result<Agent<openrouter::CompletionModel>> {
    let api_key = std::env::var("OPENROUTER_API_KEY")
        .map_err(|_| anyhow::anyhow!("OPENROUTER_API_KEY not set"))?;
    let client = openrouter::Client::new(&api_key);
    Ok(client.agent(COMPLETION_MODEL).preamble(preamble).build())
}

/// Bound prompt context to a routine's character limit.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
