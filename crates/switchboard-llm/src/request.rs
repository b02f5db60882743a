//! Generation request and response types
//!
//! A `GenerationRequest` is a single logical "generate a response" call. Its
//! `RequestContext` comes from the terminal layer and is treated as opaque
//! data: the router only folds it into the prompt header and passes it on.

use serde::{Deserialize, Serialize};

/// Max tokens assumed when a request does not set one
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// Git metadata for the working directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitContext {
    /// Current branch
    pub branch: Option<String>,
    /// Whether the tree has uncommitted changes
    #[serde(default)]
    pub dirty: bool,
}

/// Project metadata detected for the working directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectContext {
    /// Project name
    pub name: Option<String>,
    /// Project kind (e.g. "rust", "node")
    pub kind: Option<String>,
}

/// Structured context supplied alongside the prompt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Working directory of the shell
    pub working_directory: Option<String>,
    /// Shell name (bash, zsh, ...)
    pub shell: Option<String>,
    /// Most recent commands, oldest first
    #[serde(default)]
    pub recent_commands: Vec<String>,
    /// Git metadata
    pub git: Option<GitContext>,
    /// Project metadata
    pub project: Option<ProjectContext>,
    /// Snippets from external context sources (search results, docs)
    #[serde(default)]
    pub external_context: Vec<String>,
}

impl RequestContext {
    /// Whether any context field carries data
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.working_directory.is_none()
            && self.shell.is_none()
            && self.recent_commands.is_empty()
            && self.git.is_none()
            && self.project.is_none()
            && self.external_context.is_empty()
    }

    fn render_header(&self) -> String {
        let mut header = String::new();

        if let Some(dir) = &self.working_directory {
            header.push_str(&format!("Working directory: {dir}\n"));
        }
        if let Some(shell) = &self.shell {
            header.push_str(&format!("Shell: {shell}\n"));
        }
        if let Some(git) = &self.git {
            let branch = git.branch.as_deref().unwrap_or("(detached)");
            let state = if git.dirty { " (uncommitted changes)" } else { "" };
            header.push_str(&format!("Git branch: {branch}{state}\n"));
        }
        if let Some(project) = &self.project {
            match (&project.name, &project.kind) {
                (Some(name), Some(kind)) => header.push_str(&format!("Project: {name} ({kind})\n")),
                (Some(name), None) => header.push_str(&format!("Project: {name}\n")),
                (None, Some(kind)) => header.push_str(&format!("Project type: {kind}\n")),
                (None, None) => {}
            }
        }
        if !self.recent_commands.is_empty() {
            header.push_str("Recent commands:\n");
            for command in &self.recent_commands {
                header.push_str(&format!("- {command}\n"));
            }
        }
        if !self.external_context.is_empty() {
            header.push_str("Related context:\n");
            for snippet in &self.external_context {
                header.push_str(&format!("- {snippet}\n"));
            }
        }

        header
    }
}

/// Runtime tuning hints for on-device backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeTuning {
    /// Inference threads
    pub threads: Option<u32>,
    /// Prompt batch size
    pub batch_size: Option<u32>,
    /// Reuse the prompt cache between requests
    #[serde(default)]
    pub cache_prompt: bool,
}

/// A single logical generation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// User prompt
    pub prompt: String,
    /// Terminal/project context
    #[serde(default)]
    pub context: RequestContext,
    /// Explicit provider preference
    pub preferred_provider: Option<String>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Runtime tuning for local backends
    pub tuning: Option<RuntimeTuning>,
}

impl GenerationRequest {
    /// Create a request from a prompt
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Attach context
    #[must_use]
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    /// Prefer a specific provider
    #[must_use]
    pub fn with_provider(mut self, provider_id: impl Into<String>) -> Self {
        self.preferred_provider = Some(provider_id.into());
        self
    }

    /// Set max tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Max tokens with the router-wide default applied
    #[must_use]
    pub fn effective_max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    /// Whether the request carries any context
    #[must_use]
    pub fn has_context(&self) -> bool {
        !self.context.is_empty()
    }

    /// The prompt actually sent to a backend: context header, then the prompt
    #[must_use]
    pub fn expanded_prompt(&self) -> String {
        if self.context.is_empty() {
            return self.prompt.clone();
        }
        format!("{}\n{}", self.context.render_header(), self.prompt)
    }

    /// Normalized key used for command-frequency statistics
    #[must_use]
    pub fn command_key(&self) -> String {
        const MAX_KEY_CHARS: usize = 100;
        let collapsed = self.prompt.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.chars().take(MAX_KEY_CHARS).collect()
    }
}

/// Token usage information
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens
    pub prompt_tokens: u32,
    /// Completion tokens
    pub completion_tokens: u32,
    /// Total tokens
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Create usage from prompt and completion counts
    #[must_use]
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Response produced by a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Generated text
    pub content: String,
    /// Model that produced it
    pub model: String,
    /// Token usage
    pub usage: TokenUsage,
    /// Actual cost in USD
    pub cost: f64,
    /// Finish reason reported by the backend
    pub finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expanded_prompt_without_context() {
        let request = GenerationRequest::new("how do I undo a commit?");
        assert_eq!(request.expanded_prompt(), "how do I undo a commit?");
        assert!(!request.has_context());
    }

    #[test]
    fn test_expanded_prompt_with_context() {
        let context = RequestContext {
            working_directory: Some("/home/dev/app".to_string()),
            shell: Some("zsh".to_string()),
            recent_commands: vec!["cargo build".to_string()],
            git: Some(GitContext {
                branch: Some("main".to_string()),
                dirty: true,
            }),
            ..Default::default()
        };
        let request = GenerationRequest::new("fix the build").with_context(context);

        let prompt = request.expanded_prompt();
        assert!(prompt.starts_with("Working directory: /home/dev/app\n"));
        assert!(prompt.contains("Shell: zsh"));
        assert!(prompt.contains("Git branch: main (uncommitted changes)"));
        assert!(prompt.contains("- cargo build"));
        assert!(prompt.ends_with("fix the build"));
    }

    #[test]
    fn test_command_key_normalizes_whitespace() {
        let request = GenerationRequest::new("  git   log\n --oneline ");
        assert_eq!(request.command_key(), "git log --oneline");
    }

    #[test]
    fn test_effective_max_tokens() {
        assert_eq!(
            GenerationRequest::new("x").effective_max_tokens(),
            DEFAULT_MAX_TOKENS
        );
        assert_eq!(
            GenerationRequest::new("x").with_max_tokens(64).effective_max_tokens(),
            64
        );
    }
}
