//! External tests for providers module: wire shapes of the Anthropic
//! Messages API request and response types.

use chat_relay::message::{Role, Turn};
use chat_relay::providers::*;
use chat_relay::tools::ToolRegistry;
use serde_json::json;

// -- Request serialization ------------------------------------------------

#[test]
fn test_assistant_turn_role() {
    let msg = AnthropicMessage::from(&Turn::assistant("hi"));
    assert_eq!(msg.role, "assistant");
}

#[test]
fn test_block_message_serializes_as_array() {
    let msg = AnthropicMessage::blocks(
        Role::User,
        vec![ContentBlock::ToolResult {
            tool_use_id: "toolu_9".into(),
            content: "{}".into(),
        }],
    );
    let v = serde_json::to_value(&msg).expect("serialize");
    assert_eq!(
        v,
        json!({
            "role": "user",
            "content": [{"type": "tool_result", "tool_use_id": "toolu_9", "content": "{}"}]
        })
    );
}

#[test]
fn test_request_includes_tool_schema() {
    let messages = [AnthropicMessage::from(&Turn::user("x"))];
    let req = AnthropicRequest {
        model: "m",
        max_tokens: 10,
        messages: &messages,
        tools: ToolRegistry::builtin().definitions(),
    };
    let v = serde_json::to_value(&req).expect("serialize");
    assert_eq!(v["tools"][0]["name"], "get_today_date");
    assert_eq!(v["tools"][0]["input_schema"]["type"], "object");
}

// -- Response deserialization ---------------------------------------------

#[test]
fn test_response_text_joins_blocks() {
    let resp: AnthropicResponse = serde_json::from_value(json!({
        "content": [
            {"type": "text", "text": "one"},
            {"type": "text", "text": "two"}
        ],
        "stop_reason": "end_turn"
    }))
    .expect("deserialize");
    assert_eq!(resp.text().as_deref(), Some("one\ntwo"));
    assert!(!resp.wants_tools());
}

#[test]
fn test_error_body_parses() {
    let err: AnthropicErrorBody = serde_json::from_value(json!({
        "type": "error",
        "error": {"type": "overloaded_error", "message": "Overloaded"}
    }))
    .expect("deserialize");
    assert_eq!(err.error.error_type, "overloaded_error");
    assert_eq!(err.error.message, "Overloaded");
}
