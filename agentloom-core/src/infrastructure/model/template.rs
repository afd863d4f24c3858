//! Prompt rendering: turns a role-tagged history into the linear prompt a
//! completion backend expects.

use crate::types::{ChatMessage, MessageRole};
use serde::{Deserialize, Serialize};

/// Turn-tag vocabulary used to linearise a conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptFormat {
    /// Llama 3 header tags (`<|start_header_id|>role<|end_header_id|>`).
    #[default]
    Llama3,
    /// ChatML (`<|im_start|>role ... <|im_end|>`).
    ChatMl,
}

impl PromptFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "llama3" | "llama-3" => Some(PromptFormat::Llama3),
            "chatml" => Some(PromptFormat::ChatMl),
            _ => None,
        }
    }

    /// Render the whole history and open an assistant turn at the end.
    pub fn render(&self, messages: &[ChatMessage]) -> String {
        let mut prompt = String::new();
        if *self == PromptFormat::Llama3 {
            prompt.push_str("<|begin_of_text|>");
        }
        for message in messages {
            self.push_turn(&mut prompt, message.role, &message.content);
        }
        self.open_assistant_turn(&mut prompt);
        prompt
    }

    /// Render a one-shot system + user exchange.
    pub fn render_single(&self, system: &str, user: &str) -> String {
        self.render(&[ChatMessage::system(system), ChatMessage::user(user)])
    }

    fn push_turn(&self, prompt: &mut String, role: MessageRole, content: &str) {
        match self {
            PromptFormat::Llama3 => {
                let tag = match role {
                    MessageRole::Tool => "ipython",
                    other => other.as_str(),
                };
                prompt.push_str("<|start_header_id|>");
                prompt.push_str(tag);
                prompt.push_str("<|end_header_id|>\n\n");
                prompt.push_str(content.trim());
                prompt.push_str("<|eot_id|>");
            }
            PromptFormat::ChatMl => {
                prompt.push_str("<|im_start|>");
                prompt.push_str(role.as_str());
                prompt.push('\n');
                prompt.push_str(content.trim());
                prompt.push_str("<|im_end|>\n");
            }
        }
    }

    fn open_assistant_turn(&self, prompt: &mut String) {
        match self {
            PromptFormat::Llama3 => {
                prompt.push_str("<|start_header_id|>assistant<|end_header_id|>\n\n")
            }
            PromptFormat::ChatMl => prompt.push_str("<|im_start|>assistant\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llama3_render_tags_every_turn_and_opens_assistant() {
        let prompt = PromptFormat::Llama3.render(&[
            ChatMessage::system("sys"),
            ChatMessage::user("hi"),
            ChatMessage::assistant("[]"),
            ChatMessage::tool_result("Tool 'x' response: 1", 0),
        ]);

        assert!(prompt.starts_with("<|begin_of_text|><|start_header_id|>system"));
        assert!(prompt.contains("<|start_header_id|>user<|end_header_id|>\n\nhi<|eot_id|>"));
        assert!(prompt.contains("<|start_header_id|>ipython<|end_header_id|>"));
        assert!(prompt.ends_with("<|start_header_id|>assistant<|end_header_id|>\n\n"));
    }

    #[test]
    fn chatml_render_uses_im_markers() {
        let prompt = PromptFormat::ChatMl.render_single("sys", "question");
        assert_eq!(
            prompt,
            "<|im_start|>system\nsys<|im_end|>\n<|im_start|>user\nquestion<|im_end|>\n<|im_start|>assistant\n"
        );
    }

    #[test]
    fn parse_accepts_known_names() {
        assert_eq!(PromptFormat::parse("LLAMA3"), Some(PromptFormat::Llama3));
        assert_eq!(PromptFormat::parse("chatml"), Some(PromptFormat::ChatMl));
        assert_eq!(PromptFormat::parse("alpaca"), None);
    }
}
