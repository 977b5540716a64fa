//! Turn runner.
//!
//! A turn is: build instructions, call the model with the trimmed history and
//! the tool schemas, execute requested tools and feed their results back,
//! until the model answers in plain text or the round limit is reached.

use std::sync::Arc;

use concierge_core::Config;
use concierge_core::memory::RenderLimits;
use concierge_core::pricing::PricingService;
use concierge_core::storage::StateStore;
use concierge_core::types::UserState;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::conversation::Conversation;
use crate::error::{AgentError, AgentResult};
use crate::instructions::build_instructions_now;
use crate::llm::{CompletionRequest, LlmClient, Message, OpenAIClient, TokenUsage};
use crate::tools::{ToolContext, ToolInvocation};

/// Knobs for the turn runner.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub max_tool_rounds: usize,
    pub render_limits: RenderLimits,
    pub temperature: Option<f32>,
    /// Offers requested per price search
    pub max_results: u32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_tool_rounds: 8,
            render_limits: RenderLimits::default(),
            temperature: None,
            max_results: 5,
        }
    }
}

impl AgentSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_tool_rounds: config.agent.max_tool_rounds.max(1),
            render_limits: config.render_limits(),
            temperature: config.agent.temperature,
            max_results: config.pricing.max_results,
        }
    }
}

/// Result of a completed turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub reply: String,
    /// Names of the tools executed, in call order
    pub tools_used: Vec<String>,
    pub usage: TokenUsage,
}

/// The travel concierge agent.
pub struct Concierge {
    model: Arc<dyn LlmClient>,
    store: Arc<dyn StateStore>,
    pricing: Arc<PricingService>,
    settings: AgentSettings,
}

impl Concierge {
    pub fn new(model: Arc<dyn LlmClient>, store: Arc<dyn StateStore>, pricing: Arc<PricingService>) -> Self {
        Self {
            model,
            store,
            pricing,
            settings: AgentSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }

    /// OpenAI model, configured pricing and the given store.
    pub fn from_config(config: &Config, store: Arc<dyn StateStore>) -> AgentResult<Self> {
        let model = OpenAIClient::from_config(&config.openai)?;
        let pricing = PricingService::from_config(&config.pricing);
        Ok(Self::new(Arc::new(model), store, Arc::new(pricing)).with_settings(AgentSettings::from_config(config)))
    }

    pub fn model(&self) -> &dyn LlmClient {
        self.model.as_ref()
    }

    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    pub fn pricing(&self) -> &PricingService {
        &self.pricing
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Run one user turn.
    ///
    /// On success the turn is appended to `conversation`, the turn's searches
    /// are added to trip history and `state` is saved. A model failure aborts
    /// the turn: nothing is appended or recorded and the end-of-turn save is
    /// skipped (notes saved by tools stay saved).
    pub async fn run_turn(
        &self,
        user_id: &str,
        state: &mut UserState,
        conversation: &mut Conversation,
        input: &str,
    ) -> AgentResult<TurnOutcome> {
        let input = input.trim();
        if input.is_empty() {
            return Err(concierge_core::Error::validation("Message must not be empty").into());
        }

        let instructions = build_instructions_now(state, &self.settings.render_limits)?;
        let tools = ToolInvocation::schemas();

        let mut turn = vec![Message::user(input)];
        let mut tools_used = Vec::new();
        let mut trips = Vec::new();
        let mut usage = TokenUsage::default();

        for round in 0..self.settings.max_tool_rounds {
            let mut messages = Vec::with_capacity(conversation.messages().len() + turn.len() + 1);
            messages.push(Message::system(instructions.clone()));
            messages.extend_from_slice(conversation.messages());
            messages.extend_from_slice(&turn);

            let request = CompletionRequest::new(messages)
                .with_tools(tools.clone())
                .with_temperature(self.settings.temperature);

            let response = self.model.complete(request).await.map_err(|e| {
                error!(user_id, round, error = %e, "Model call failed");
                e
            })?;
            if let Some(u) = response.usage {
                usage += u;
            }

            if response.tool_calls.is_empty() {
                let reply = response.content.unwrap_or_default();
                turn.push(Message::assistant(reply.clone()));

                for trip in trips.drain(..) {
                    state.record_trip(trip);
                }
                if conversation.append(turn) {
                    debug!(user_id, "Trimmed conversation to last {} turns", conversation.max_turns());
                }
                if let Err(e) = self.store.save(user_id, state) {
                    error!(user_id, error = %e, "Failed to save state at end of turn");
                }

                info!(user_id, rounds = round + 1, tools = tools_used.len(), "Turn complete");
                return Ok(TurnOutcome {
                    reply,
                    tools_used,
                    usage,
                });
            }

            let calls = response.tool_calls;
            turn.push(Message::assistant_with_tool_calls(response.content, calls.clone()));

            let mut ctx = ToolContext {
                user_id,
                state: &mut *state,
                store: self.store.as_ref(),
                pricing: self.pricing.as_ref(),
                max_results: self.settings.max_results,
                trips: &mut trips,
            };

            for call in calls {
                debug!(user_id, tool = %call.name, "Executing tool");
                let result = match ToolInvocation::parse(&call.name, &call.arguments) {
                    Ok(invocation) => {
                        tools_used.push(invocation.name().to_string());
                        invocation.execute(&mut ctx).await
                    }
                    Err(e) => {
                        warn!(user_id, tool = %call.name, error = %e, "Rejected tool call");
                        json!({ "success": false, "error": e.to_string() })
                    }
                };
                turn.push(Message::tool_result(call.id, result.to_string()));
            }
        }

        warn!(user_id, rounds = self.settings.max_tool_rounds, "Tool round limit reached");
        Err(AgentError::ToolRoundsExhausted {
            rounds: self.settings.max_tool_rounds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockLlmClient, MockStep, Role, ToolCall};
    use concierge_core::storage::JsonStateStore;
    use tempfile::{TempDir, tempdir};

    struct Harness {
        _temp: TempDir,
        store: Arc<JsonStateStore>,
        model: MockLlmClient,
        concierge: Concierge,
    }

    fn harness(steps: Vec<MockStep>, max_tool_rounds: usize) -> Harness {
        let temp = tempdir().unwrap();
        let store = Arc::new(JsonStateStore::new(temp.path()));
        let model = MockLlmClient::from_steps("mock", steps);
        let concierge = Concierge::new(
            Arc::new(model.clone()),
            store.clone(),
            Arc::new(PricingService::disabled()),
        )
        .with_settings(AgentSettings {
            max_tool_rounds,
            ..AgentSettings::default()
        });

        Harness {
            _temp: temp,
            store,
            model,
            concierge,
        }
    }

    #[tokio::test]
    async fn test_plain_reply_appends_and_saves() {
        let h = harness(vec![MockStep::text("Where would you like to go?")], 8);
        let mut state = UserState::default();
        let mut conversation = Conversation::new(20);

        let outcome = h
            .concierge
            .run_turn("alice", &mut state, &mut conversation, "  Plan a trip  ")
            .await
            .unwrap();

        assert_eq!(outcome.reply, "Where would you like to go?");
        assert!(outcome.tools_used.is_empty());
        assert_eq!(conversation.messages().len(), 2);
        assert_eq!(conversation.messages()[0].content, "Plan a trip");
        assert!(h.store.read("alice").unwrap().is_some());

        let requests = h.model.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0].role, Role::System);
        assert!(requests[0].messages[0].content.contains("<memory_policy>"));
        assert_eq!(requests[0].tools.len(), 4);
    }

    #[tokio::test]
    async fn test_tool_round_saves_note_and_feeds_result_back() {
        let h = harness(
            vec![
                MockStep::tool_call(
                    "call_1",
                    "save_memory_note",
                    json!({"text": "Prefers aisle seats", "keywords": ["seat"]}),
                ),
                MockStep::text("Noted."),
            ],
            8,
        );
        let mut state = UserState::default();
        let mut conversation = Conversation::new(20);

        let outcome = h
            .concierge
            .run_turn("alice", &mut state, &mut conversation, "I always sit on the aisle")
            .await
            .unwrap();

        assert_eq!(outcome.tools_used, vec!["save_memory_note"]);
        assert_eq!(state.session_memory.notes[0].text, "Prefers aisle seats");
        assert_eq!(conversation.messages().len(), 4);

        let requests = h.model.requests().await;
        let last = requests[1].messages.last().unwrap();
        assert_eq!(last.role, Role::Tool);
        assert_eq!(last.tool_call_id.as_deref(), Some("call_1"));
        assert!(last.content.contains("\"success\":true"));

        let persisted = h.store.read("alice").unwrap().unwrap();
        assert_eq!(persisted.session_memory.notes.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_to_model() {
        let h = harness(
            vec![
                MockStep::tool_calls(vec![ToolCall {
                    id: "c1".into(),
                    name: "book_flight".into(),
                    arguments: json!({}),
                }]),
                MockStep::text("I can't book directly."),
            ],
            8,
        );
        let mut state = UserState::default();
        let mut conversation = Conversation::default();

        let outcome = h
            .concierge
            .run_turn("alice", &mut state, &mut conversation, "book it")
            .await
            .unwrap();

        assert!(outcome.tools_used.is_empty());
        let requests = h.model.requests().await;
        let tool_msg = requests[1].messages.last().unwrap();
        assert!(tool_msg.content.contains("unknown tool: book_flight"));
    }

    #[tokio::test]
    async fn test_model_failure_aborts_turn() {
        let h = harness(vec![MockStep::error("upstream down")], 8);
        let mut state = UserState::default();
        let mut conversation = Conversation::default();

        let err = h
            .concierge
            .run_turn("alice", &mut state, &mut conversation, "hello")
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Model(_)));
        assert!(conversation.is_empty());
        assert!(h.store.read("alice").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_round_limit() {
        let step = MockStep::tool_call("c", "lookup_airport", json!({"city_name": "Oslo"}));
        let h = harness(vec![step.clone(), step.clone(), step], 2);
        let mut state = UserState::default();
        let mut conversation = Conversation::default();

        let err = h
            .concierge
            .run_turn("alice", &mut state, &mut conversation, "where is Oslo airport")
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::ToolRoundsExhausted { rounds: 2 }));
        assert_eq!(h.model.requests().await.len(), 2);
        assert!(conversation.is_empty());
    }

    #[tokio::test]
    async fn test_searches_recorded_only_on_completed_turn() {
        use concierge_core::pricing::AmadeusClient;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/security/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok",
                "expires_in": 1799
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/reference-data/locations/hotels/by-city"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let search = MockStep::tool_call(
            "c1",
            "search_hotels",
            json!({"city_code": "PAR", "check_in_date": "2025-05-01", "check_out_date": "2025-05-03"}),
        );
        let temp = tempdir().unwrap();
        let store = Arc::new(JsonStateStore::new(temp.path()));
        let concierge = Concierge::new(
            Arc::new(MockLlmClient::from_steps(
                "mock",
                vec![
                    search.clone(),
                    MockStep::error("upstream down"),
                    search,
                    MockStep::text("Nothing available in Paris."),
                ],
            )),
            store.clone(),
            Arc::new(PricingService::with_client(
                AmadeusClient::new("k", "s").with_base_url(server.uri()),
            )),
        );
        let mut state = UserState::default();
        let mut conversation = Conversation::default();

        concierge
            .run_turn("alice", &mut state, &mut conversation, "hotels in Paris")
            .await
            .unwrap_err();
        assert!(state.trip_history.trips.is_empty());

        let outcome = concierge
            .run_turn("alice", &mut state, &mut conversation, "hotels in Paris")
            .await
            .unwrap();
        assert_eq!(outcome.tools_used, vec!["search_hotels"]);
        assert_eq!(state.trip_history.trips.len(), 1);
        assert_eq!(state.trip_history.trips[0].kind.as_deref(), Some("hotel_search"));

        let persisted = store.read("alice").unwrap().unwrap();
        assert_eq!(persisted.trip_history.trips.len(), 1);
    }

    #[tokio::test]
    async fn test_history_is_sent_on_next_turn() {
        let h = harness(vec![MockStep::text("first"), MockStep::text("second")], 8);
        let mut state = UserState::default();
        let mut conversation = Conversation::default();

        h.concierge
            .run_turn("alice", &mut state, &mut conversation, "one")
            .await
            .unwrap();
        h.concierge
            .run_turn("alice", &mut state, &mut conversation, "two")
            .await
            .unwrap();

        let requests = h.model.requests().await;
        let contents: Vec<&str> = requests[1].messages[1..].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "first", "two"]);
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let h = harness(vec![], 8);
        let mut state = UserState::default();
        let mut conversation = Conversation::default();

        let err = h
            .concierge
            .run_turn("alice", &mut state, &mut conversation, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Core(concierge_core::Error::Validation(_))));
        assert!(h.model.requests().await.is_empty());
    }
}
