use serde_json::Value;

use crate::core::model::assistant::Assistant;
use crate::core::model::chat::ChatMessage;
use crate::error::CompletionError;

/// Reshapes the resolved message list before it reaches a connector (§4.7
/// step d). One processor per `assistant.prompt_processor_name`; `kb`'s
/// nearest analogue is an `IngestPlugin` transforming raw bytes into
/// chunks, so this trait keeps the same "named, registry-dispatched,
/// synchronous transform" shape.
pub trait PromptProcessor {
    fn name(&self) -> &'static str;

    fn process(&self, messages: Vec<ChatMessage>, assistant: &Assistant, rag_context: &Value) -> Result<Vec<ChatMessage>, CompletionError>;
}

/// The only built-in prompt processor (§4.7): prepends a system message
/// from `assistant.system_prompt` if set, then substitutes `{user_input}`
/// and `{context}` into `assistant.prompt_template` if set. Neither step
/// fires if its source field is empty.
pub struct SimpleAugmentProcessor;

impl PromptProcessor for SimpleAugmentProcessor {
    fn name(&self) -> &'static str {
        "simple_augment"
    }

    fn process(&self, mut messages: Vec<ChatMessage>, assistant: &Assistant, rag_context: &Value) -> Result<Vec<ChatMessage>, CompletionError> {
        if !assistant.prompt_template.is_empty() {
            if let Some(last_user) = messages.iter_mut().rev().find(|m| m.role == "user") {
                let context = if rag_context.is_null() {
                    String::new()
                } else {
                    serde_json::to_string(rag_context).unwrap_or_default()
                };
                last_user.content = assistant
                    .prompt_template
                    .replace("{user_input}", &last_user.content)
                    .replace("{context}", &context);
            }
        }

        if !assistant.system_prompt.is_empty() {
            messages.insert(0, ChatMessage::system(assistant.system_prompt.clone()));
        }

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assistant(system_prompt: &str, prompt_template: &str) -> Assistant {
        Assistant {
            id: 1,
            owner: "alice".into(),
            name: "tutor".into(),
            system_prompt: system_prompt.to_string(),
            prompt_template: prompt_template.to_string(),
            rag_processor_name: "simple_rag".into(),
            prompt_processor_name: "simple_augment".into(),
            connector_name: "openai".into(),
            llm_name: "gpt-4o-mini".into(),
            rag_collections: String::new(),
            rag_top_k: 5,
            metadata: Value::Null,
        }
    }

    #[test]
    fn leaves_messages_unchanged_without_system_prompt_or_template() {
        let processor = SimpleAugmentProcessor;
        let messages = vec![ChatMessage {
            role: "user".into(),
            content: "hi".into(),
        }];
        let out = processor.process(messages.clone(), &assistant("", ""), &Value::Null).unwrap();
        assert_eq!(out[0].content, messages[0].content);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn prepends_system_prompt() {
        let processor = SimpleAugmentProcessor;
        let messages = vec![ChatMessage {
            role: "user".into(),
            content: "hi".into(),
        }];
        let out = processor.process(messages, &assistant("be concise", ""), &Value::Null).unwrap();
        assert_eq!(out[0].role, "system");
        assert_eq!(out[0].content, "be concise");
        assert_eq!(out[1].content, "hi");
    }

    #[test]
    fn substitutes_template_placeholders() {
        let processor = SimpleAugmentProcessor;
        let messages = vec![ChatMessage {
            role: "user".into(),
            content: "Summarize".into(),
        }];
        let context = serde_json::json!([{"text": "doc text"}]);
        let out = processor
            .process(messages, &assistant("", "Context: {context}\nUser asked: {user_input}"), &context)
            .unwrap();
        assert_eq!(out[0].content, format!("Context: {}\nUser asked: Summarize", serde_json::to_string(&context).unwrap()));
    }
}
