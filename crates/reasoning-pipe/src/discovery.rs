//! Pipe discovery for hosts that list available models.

use serde::{Deserialize, Serialize};

use crate::config::PipeConfig;

/// Kind of pipe reported to hosts: one instance exposing a list of pipes.
pub const PIPE_TYPE: &str = "manifold";

/// Prefix of every pipe name.
pub const PIPE_NAME_PREFIX: &str = "codemaster";

/// A pipe as listed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipeDescriptor {
    pub id: String,
    pub name: String,
}

/// List the pipes exposed by a configuration.
///
/// The name spells out the model chain, e.g. reasoning models
/// `qwen2.5:14b, llama3.1` answering with `gpt-4o` give
/// `codemaster-qwen2.5-llama3.1-to-gpt-4o`.
pub fn pipes(config: &PipeConfig) -> Vec<PipeDescriptor> {
    let reasoning: Vec<&str> = config
        .reasoning_models
        .iter()
        .map(|m| short_name(m))
        .collect();

    let name = format!(
        "{}-{}-to-{}",
        PIPE_NAME_PREFIX,
        reasoning.join("-"),
        short_name(&config.responding_model)
    );

    vec![PipeDescriptor {
        id: name.clone(),
        name,
    }]
}

/// Model id up to the first `:` (drops the tag).
fn short_name(model: &str) -> &str {
    let model = model.trim();
    model.split(':').next().unwrap_or(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipe_name() {
        let config = PipeConfig::builder()
            .reasoning_models(["a", "b"])
            .responding_model("c")
            .build();

        assert_eq!(
            pipes(&config),
            vec![PipeDescriptor {
                id: "codemaster-a-b-to-c".to_string(),
                name: "codemaster-a-b-to-c".to_string(),
            }]
        );
    }

    #[test]
    fn test_tags_are_dropped() {
        let config = PipeConfig::builder()
            .reasoning_models(["qwen2.5:14b", " llama3.1:8b-instruct "])
            .responding_model("deepseek-coder:33b")
            .build();

        assert_eq!(
            pipes(&config)[0].name,
            "codemaster-qwen2.5-llama3.1-to-deepseek-coder"
        );
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("model"), "model");
        assert_eq!(short_name(":tag"), "");
    }
}
