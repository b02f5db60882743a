//! Token counting
//!
//! Uses tiktoken's cl100k_base encoding as a vendor-neutral estimate. Exact
//! counts differ per model family; the router only needs a stable estimate
//! for cost and latency prediction.

use crate::request::GenerationRequest;
use std::sync::LazyLock;
use tiktoken_rs::{cl100k_base, CoreBPE};

/// Global tokenizer instance (initialized once, thread-safe)
static TOKENIZER: LazyLock<CoreBPE> = LazyLock::new(|| {
    cl100k_base().expect("cl100k_base tokenizer is a compile-time constant and should never fail")
});

/// Count tokens in a string
#[must_use]
pub fn count_tokens(text: &str) -> u32 {
    let count = TOKENIZER.encode_with_special_tokens(text).len();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Estimate prompt tokens for a request, including its context header
#[must_use]
pub fn estimate_prompt_tokens(request: &GenerationRequest) -> u32 {
    count_tokens(&request.expanded_prompt())
}
