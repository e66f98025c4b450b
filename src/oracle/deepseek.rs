//! DeepSeek chat-completions client used as the answer oracle.

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::automation::config::SUPPORTED_MODELS;
use crate::automation::error::SessionError;
use crate::automation::ports::AnswerOracle;

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const SYSTEM_PROMPT: &str =
    "你是一个答题助手，请分析题目并给出答案。只回答选项字母或判断结果，不要解释。";

#[derive(Debug, Error)]
pub enum OracleFailure {
    #[error("question text is empty")]
    EmptyQuestion,
    #[error("unsupported model: {0}")]
    UnsupportedModel(String),
    #[error("DeepSeek API key is not set")]
    MissingKey,
    #[error("authentication failed, check the API key: {0}")]
    Auth(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network connection failed: {0}")]
    Network(String),
    #[error("model returned an empty answer")]
    EmptyAnswer,
    #[error("analysis failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for OracleFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            OracleFailure::Timeout(e.to_string())
        } else if e.is_connect() || e.is_request() {
            OracleFailure::Network(e.to_string())
        } else {
            OracleFailure::Other(e.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// System and user messages for one question.
pub fn build_messages(question_text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system",
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: "user",
            content: format!(
                "题目内容：\n{}\n\n请直接回答正确选项（单选回答如：A，多选回答如：A,C，判断题回答：对 或 错）",
                question_text
            ),
        },
    ]
}

/// Extracts the trimmed answer of the first choice.
fn parse_chat_response(body: &str) -> Result<String, OracleFailure> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| OracleFailure::Other(format!("malformed response: {}", e)))?;

    let answer = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    if answer.is_empty() {
        return Err(OracleFailure::EmptyAnswer);
    }
    Ok(answer)
}

fn classify_status(status: StatusCode, body: &str) -> OracleFailure {
    let detail = format!("HTTP {}: {}", status.as_u16(), body.trim());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => OracleFailure::Auth(detail),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => OracleFailure::Timeout(detail),
        _ => OracleFailure::Other(detail),
    }
}

pub struct DeepSeekOracle {
    client: Client,
    api_key: String,
    base_url: String,
}

impl DeepSeekOracle {
    pub fn new(api_key: impl Into<String>) -> anyhow::Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn analyze(&self, question_text: &str, model: &str) -> Result<String, OracleFailure> {
        if question_text.trim().is_empty() {
            return Err(OracleFailure::EmptyQuestion);
        }
        if !SUPPORTED_MODELS.contains(&model) {
            return Err(OracleFailure::UnsupportedModel(model.to_string()));
        }
        if self.api_key.trim().is_empty() {
            return Err(OracleFailure::MissingKey);
        }

        let request = ChatRequest {
            model,
            messages: build_messages(question_text),
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(classify_status(status, &body));
        }
        parse_chat_response(&body)
    }
}

impl AnswerOracle for DeepSeekOracle {
    fn ask(&mut self, question_text: &str, model: &str) -> Result<String, SessionError> {
        self.analyze(question_text, model)
            .map_err(|e| SessionError::Oracle(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_messages() {
        let messages = build_messages("1.地球是圆的吗");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(messages[1].role, "user");
        assert!(messages[1].content.starts_with("题目内容：\n1.地球是圆的吗\n\n"));
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "deepseek-chat",
            messages: build_messages("q"),
            stream: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "deepseek-chat");
        assert_eq!(value["stream"], false);
        assert_eq!(value["messages"][1]["role"], "user");
    }

    #[test]
    fn test_parse_chat_response() {
        let body = r#"{"id": "x", "choices": [{"index": 0, "message": {"role": "assistant", "content": "  A,C\n"}}]}"#;
        assert_eq!(parse_chat_response(body).unwrap(), "A,C");
    }

    #[test]
    fn test_parse_empty_answer() {
        let blank = r#"{"choices": [{"message": {"role": "assistant", "content": "   "}}]}"#;
        assert!(matches!(parse_chat_response(blank), Err(OracleFailure::EmptyAnswer)));
        assert!(matches!(
            parse_chat_response(r#"{"choices": []}"#),
            Err(OracleFailure::EmptyAnswer)
        ));
        assert!(matches!(parse_chat_response("<html>"), Err(OracleFailure::Other(_))));
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, "bad key"),
            OracleFailure::Auth(msg) if msg == "HTTP 401: bad key"
        ));
        assert!(matches!(
            classify_status(StatusCode::GATEWAY_TIMEOUT, ""),
            OracleFailure::Timeout(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, ""),
            OracleFailure::Other(_)
        ));
    }

    #[test]
    fn test_input_validation_before_network() {
        let oracle = DeepSeekOracle::new("sk-test").unwrap();
        assert!(matches!(
            oracle.analyze("  ", "deepseek-chat"),
            Err(OracleFailure::EmptyQuestion)
        ));
        assert!(matches!(
            oracle.analyze("q", "gpt-4"),
            Err(OracleFailure::UnsupportedModel(m)) if m == "gpt-4"
        ));

        let mut keyless = DeepSeekOracle::new("").unwrap();
        let err = keyless.ask("q", "deepseek-reasoner").unwrap_err();
        assert_eq!(
            err.to_string(),
            "answer oracle failed: DeepSeek API key is not set"
        );
    }
}
