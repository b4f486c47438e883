//! LLM query step and its network collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use flowdeck_scenario::{LLM_QUERY_STEP, Node, StepConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::error::StepError;
use crate::extract::structure_response;
use crate::step::{FlowStep, StepInput, StepOutput};

/// Connection settings for the chat-completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
  pub endpoint: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub model: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
  System,
  User,
  Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
  pub role: ChatRole,
  pub content: String,
}

impl ChatMessage {
  pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
    Self {
      role,
      content: content.into(),
    }
  }
}

/// Request body sent to the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
  pub messages: Vec<ChatMessage>,
  pub user_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub model: Option<String>,
}

/// Chat-completion collaborator.
#[async_trait]
pub trait LlmClient: Send + Sync {
  /// Send the conversation and return the raw response body.
  async fn complete(&self, request: &ChatRequest, token: &str) -> Result<Value, StepError>;
}

/// Identity collaborator for network-backed steps.
#[async_trait]
pub trait AuthProvider: Send + Sync {
  async fn get_token(&self) -> Option<String>;

  fn user_id(&self) -> Option<String>;
}

/// Fixed credentials, e.g. from the command line.
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
  token: Option<String>,
  user_id: Option<String>,
}

impl StaticAuth {
  pub fn new(token: Option<String>, user_id: Option<String>) -> Self {
    Self { token, user_id }
  }
}

#[async_trait]
impl AuthProvider for StaticAuth {
  async fn get_token(&self) -> Option<String> {
    self.token.clone()
  }

  fn user_id(&self) -> Option<String> {
    self.user_id.clone()
  }
}

/// `LlmClient` over HTTP: POST JSON with a bearer token.
#[derive(Debug, Clone)]
pub struct HttpLlmClient {
  client: Client,
  config: LlmConfig,
}

impl HttpLlmClient {
  pub fn new(config: LlmConfig) -> Self {
    Self {
      client: Client::new(),
      config,
    }
  }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
  #[instrument(name = "llm_complete", skip(self, request, token), fields(endpoint = %self.config.endpoint))]
  async fn complete(&self, request: &ChatRequest, token: &str) -> Result<Value, StepError> {
    let mut body = request.clone();
    if body.model.is_none() {
      body.model = self.config.model.clone();
    }

    let response = self
      .client
      .post(&self.config.endpoint)
      .bearer_auth(token)
      .json(&body)
      .send()
      .await?;

    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
      return Err(StepError::Network {
        message: format!("endpoint returned {}: {}", status.as_u16(), text),
      });
    }

    debug!(bytes = text.len(), "llm response received");
    // Try to parse body as JSON, fall back to string
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
  }
}

/// Text content of a response body, across the common response shapes.
pub fn response_text(body: &Value) -> Option<String> {
  let candidates = [
    "/content",
    "/message/content",
    "/choices/0/message/content",
    "/response",
    "/text",
  ];
  match body {
    Value::String(text) => Some(text.clone()),
    _ => candidates
      .iter()
      .find_map(|pointer| body.pointer(pointer).and_then(Value::as_str))
      .map(str::to_string),
  }
}

/// Built-in LLM query step.
pub struct LlmQueryStep {
  client: Arc<dyn LlmClient>,
  auth: Arc<dyn AuthProvider>,
}

impl LlmQueryStep {
  pub fn new(client: Arc<dyn LlmClient>, auth: Arc<dyn AuthProvider>) -> Self {
    Self { client, auth }
  }

  /// Conversation for a run, in send order.
  pub fn build_messages(input: &StepInput) -> Result<Vec<ChatMessage>, StepError> {
    let attrs = match &input.node.step {
      StepConfig::LlmQuery(attrs) => attrs,
      other => {
        return Err(StepError::Configuration {
          message: format!("node '{}' is a {} step", input.node.id, other.kind()),
        });
      }
    };
    let context = input.context.snapshot();
    let render = |template: &str| flowdeck_context::process_template(template, &context);

    let mut messages = Vec::new();
    if attrs.include_system_message
      && let Some(system) = input.system_message.as_deref().filter(|s| !s.is_empty())
    {
      messages.push(ChatMessage::new(ChatRole::System, render(system)));
    }
    if let Some(assistant) = input.node.assistant_message.as_deref() {
      messages.push(ChatMessage::new(ChatRole::Assistant, render(assistant)));
    }
    if let Some(initial) = attrs.initial_user_message.as_deref() {
      messages.push(ChatMessage::new(ChatRole::User, render(initial)));
    }
    if let Some(message) = user_message(&input.user_input) {
      messages.push(ChatMessage::new(ChatRole::User, message));
    }

    if !messages.iter().any(|m| m.role == ChatRole::User) {
      return Err(StepError::Validation {
        field: "message".to_string(),
        message: "a user message is required".to_string(),
      });
    }
    Ok(messages)
  }
}

fn user_message(user_input: &Value) -> Option<String> {
  let text = match user_input {
    Value::String(text) => text.as_str(),
    Value::Object(object) => object.get("message").and_then(Value::as_str)?,
    _ => return None,
  };
  let text = text.trim();
  (!text.is_empty()).then(|| text.to_string())
}

#[async_trait]
impl FlowStep for LlmQueryStep {
  fn id(&self) -> &str {
    LLM_QUERY_STEP
  }

  fn auto_start(&self, node: &Node) -> bool {
    matches!(&node.step, StepConfig::LlmQuery(attrs) if attrs.auto_start)
  }

  async fn execute(&self, input: &StepInput) -> Result<StepOutput, StepError> {
    let token = self.auth.get_token().await.ok_or_else(|| StepError::Auth {
      message: "no access token".to_string(),
    })?;
    let user_id = self.auth.user_id().ok_or_else(|| StepError::Auth {
      message: "no signed-in user".to_string(),
    })?;

    let schema = match input.node.schema_path() {
      Some(path) => Some(
        input
          .context
          .get_schema_at_path(path)
          .ok_or_else(|| StepError::MissingSchema {
            path: path.to_string(),
          })?,
      ),
      None => None,
    };

    let messages = Self::build_messages(input)?;
    let sent = messages
      .iter()
      .rev()
      .find(|m| m.role == ChatRole::User)
      .map(|m| m.content.clone());
    let request = ChatRequest {
      messages,
      user_id,
      model: None,
    };
    let body = self.client.complete(&request, &token).await?;

    let text = response_text(&body).ok_or_else(|| StepError::InvalidResponse {
      message: "response carries no text content".to_string(),
    })?;
    // The user's message travels with the answer it produced.
    Ok(StepOutput::new(json!({
      "input": sent,
      "response": structure_response(&text, schema.as_ref()),
    })))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use flowdeck_config::NodeDef;
  use flowdeck_context::ContextStore;
  use serde_json::json;
  use std::sync::Mutex;

  struct MockClient {
    reply: Value,
    requests: Mutex<Vec<(ChatRequest, String)>>,
  }

  impl MockClient {
    fn new(reply: Value) -> Self {
      Self {
        reply,
        requests: Mutex::new(Vec::new()),
      }
    }
  }

  #[async_trait]
  impl LlmClient for MockClient {
    async fn complete(&self, request: &ChatRequest, token: &str) -> Result<Value, StepError> {
      self
        .requests
        .lock()
        .unwrap()
        .push((request.clone(), token.to_string()));
      Ok(self.reply.clone())
    }
  }

  fn llm_node(attrs: Value) -> Node {
    let def: NodeDef = serde_json::from_value(json!({
      "id": "ask",
      "type": "llm",
      "order": 1,
      "assistantMessage": "Hi {{user.name}}, what are we launching?",
      "attrs": attrs
    }))
    .unwrap();
    Node::from_def(def).unwrap()
  }

  fn context() -> ContextStore {
    let context = ContextStore::for_workspace("ws1");
    context.set("user.name", json!("Jan")).unwrap();
    context
  }

  fn signed_in() -> Arc<StaticAuth> {
    Arc::new(StaticAuth::new(Some("t0k".into()), Some("u1".into())))
  }

  #[tokio::test]
  async fn test_builds_conversation_and_structures_reply() {
    let client = Arc::new(MockClient::new(json!({
      "content": "```json\n{\"headline\": \"Spring sale\"}\n```"
    })));
    let step = LlmQueryStep::new(client.clone(), signed_in());

    let context = context();
    context
      .set_schema(
        "schemas.ad",
        json!({ "type": "object", "required": ["headline"], "properties": { "headline": { "type": "string" } } }),
      )
      .unwrap();
    let node = llm_node(json!({
      "schemaPath": "schemas.ad",
      "includeSystemMessage": true,
      "initialUserMessage": "I am {{user.name}}"
    }));
    let input = StepInput::new(node, context)
      .with_user_input(json!("A shoe launch"))
      .with_system_message(Some("You write ads.".to_string()));

    let output = step.execute(&input).await.unwrap();
    assert_eq!(
      output.data,
      json!({ "input": "A shoe launch", "response": { "headline": "Spring sale" } })
    );

    let requests = client.requests.lock().unwrap();
    let (request, token) = &requests[0];
    assert_eq!(token, "t0k");
    assert_eq!(request.user_id, "u1");
    assert_eq!(
      request.messages,
      vec![
        ChatMessage::new(ChatRole::System, "You write ads."),
        ChatMessage::new(ChatRole::Assistant, "Hi Jan, what are we launching?"),
        ChatMessage::new(ChatRole::User, "I am Jan"),
        ChatMessage::new(ChatRole::User, "A shoe launch"),
      ]
    );
  }

  #[tokio::test]
  async fn test_output_pairs_initial_message_with_response() {
    let client = Arc::new(MockClient::new(json!("no json here")));
    let step = LlmQueryStep::new(client, signed_in());
    let input = StepInput::new(
      llm_node(json!({ "initialUserMessage": "Summarize {{user.name}}" })),
      context(),
    );

    let output = step.execute(&input).await.unwrap();
    assert_eq!(output.data["input"], json!("Summarize Jan"));
    assert_eq!(output.data["response"], json!({ "content": "no json here" }));
  }

  #[tokio::test]
  async fn test_system_message_only_when_enabled() {
    let node = llm_node(json!({}));
    let input = StepInput::new(node, context())
      .with_user_input(json!({ "message": "hello" }))
      .with_system_message(Some("ignored".to_string()));

    let messages = LlmQueryStep::build_messages(&input).unwrap();
    assert!(messages.iter().all(|m| m.role != ChatRole::System));
  }

  #[tokio::test]
  async fn test_missing_auth_is_step_error() {
    let client = Arc::new(MockClient::new(json!("ok")));
    let step = LlmQueryStep::new(client.clone(), Arc::new(StaticAuth::default()));
    let input = StepInput::new(llm_node(json!({})), context()).with_user_input(json!("hi"));

    let err = step.execute(&input).await.unwrap_err();
    assert!(matches!(err, StepError::Auth { .. }));
    assert!(client.requests.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_missing_schema() {
    let step = LlmQueryStep::new(Arc::new(MockClient::new(json!("ok"))), signed_in());
    let input = StepInput::new(llm_node(json!({ "schemaPath": "schemas.none" })), context())
      .with_user_input(json!("hi"));

    let err = step.execute(&input).await.unwrap_err();
    assert_eq!(
      err,
      StepError::MissingSchema {
        path: "schemas.none".to_string()
      }
    );
  }

  #[tokio::test]
  async fn test_requires_a_user_message() {
    let step = LlmQueryStep::new(Arc::new(MockClient::new(json!("ok"))), signed_in());
    let input = StepInput::new(llm_node(json!({})), context());

    let err = step.execute(&input).await.unwrap_err();
    assert!(matches!(err, StepError::Validation { .. }));
  }

  #[test]
  fn test_auto_start() {
    let step = LlmQueryStep::new(Arc::new(MockClient::new(json!("ok"))), signed_in());
    assert!(step.auto_start(&llm_node(json!({ "autoStart": true }))));
    assert!(!step.auto_start(&llm_node(json!({}))));
  }

  #[test]
  fn test_response_text_shapes() {
    assert_eq!(response_text(&json!("plain")), Some("plain".to_string()));
    assert_eq!(
      response_text(&json!({ "choices": [{ "message": { "content": "x" } }] })),
      Some("x".to_string())
    );
    assert_eq!(response_text(&json!({ "other": 1 })), None);
  }

  #[test]
  fn test_request_body_shape() {
    let request = ChatRequest {
      messages: vec![ChatMessage::new(ChatRole::User, "hi")],
      user_id: "u1".to_string(),
      model: None,
    };
    assert_eq!(
      serde_json::to_value(&request).unwrap(),
      json!({ "messages": [{ "role": "user", "content": "hi" }], "userId": "u1" })
    );
  }
}
