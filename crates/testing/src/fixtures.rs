//! Test fixtures for question/answer pairs and provider payloads.

use serde_json::{json, Value};

/// Question used by most engine tests
pub const QUESTION: &str = "What is the capital of France?";

/// Reference answer for [`QUESTION`]
pub const EXPECTED_ANSWER: &str = "The capital of France is Paris.";

/// Correct candidate answer, reordered
pub const CANDIDATE_ANSWER: &str = "Paris is the capital of France.";

/// Raw model output carrying the three criterion scores
pub fn score_json(completeness: f64, conciseness: f64, correctness: f64) -> String {
    json!({
        "completeness": completeness,
        "conciseness": conciseness,
        "correctness": correctness,
    })
    .to_string()
}

/// OpenAI chat-completions response body whose message content is `content`
pub fn openai_completion_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

/// Anthropic messages response body whose text block is `content`
pub fn anthropic_message_body(content: &str) -> Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "model": "claude-3-5-haiku-latest",
        "content": [{ "type": "text", "text": content }],
        "stop_reason": "end_turn"
    })
}
