//! Invocation of generative and search responders.
//!
//! [`ResponderGateway`] owns the per-call policy: reset session state, run a
//! bounded exchange, extract the final content and classify failures into
//! [`CallError`]s. Responders themselves are reached through the
//! [`GenerativeResponder`] and [`SearchProvider`] traits and collected once at
//! start-up in a [`ResponderRegistry`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::conversation::{ConversationLog, ConversationView, Message};
use crate::error::{CallError, TransportError};
use crate::extraction::{ExtractionChain, ExtractionResult};
use crate::models::{ImageHit, Query, SearchHit, Topic};

/// Limits applied to one exchange with a generative responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnBudget {
    pub max_auto_replies: usize,
    pub max_output_tokens: u64,
}

#[async_trait]
pub trait GenerativeResponder: Send + Sync {
    fn name(&self) -> &str;

    /// Drop any state left over from a previous exchange.
    async fn reset(&self);

    /// Run an exchange that ends when either side emits the sentinel or the
    /// budget's auto-reply count is spent.
    async fn converse(
        &self,
        prompt: &str,
        budget: TurnBudget,
    ) -> Result<ConversationLog, TransportError>;

    /// The responder's own record of the most recent message.
    async fn last_message(&self) -> Option<Message>;

    /// A secondary copy of the exchange kept by the responder, if any.
    async fn alternate_log(&self) -> Option<ConversationLog>;
}

/// Web search capability. Implementations swallow their own failures and
/// return an empty list instead.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, n: usize) -> Vec<SearchHit>;

    async fn image_search(&self, query: &str, n: usize) -> Vec<ImageHit>;
}

/// A registered responder plus its budget. Clones share one exclusivity lock,
/// so a responder serves one exchange at a time.
#[derive(Clone)]
pub struct ResponderHandle {
    responder: Arc<dyn GenerativeResponder>,
    budget: TurnBudget,
    in_flight: Arc<Mutex<()>>,
}

impl ResponderHandle {
    pub fn new(responder: Arc<dyn GenerativeResponder>, budget: TurnBudget) -> Self {
        Self {
            responder,
            budget,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    pub fn name(&self) -> &str {
        self.responder.name()
    }

    pub fn budget(&self) -> TurnBudget {
        self.budget
    }
}

/// Every responder the service talks to, built once at process start.
#[derive(Clone)]
pub struct ResponderRegistry {
    generative: HashMap<Topic, ResponderHandle>,
    search: Arc<dyn SearchProvider>,
}

impl ResponderRegistry {
    pub fn new(search: Arc<dyn SearchProvider>) -> Self {
        Self {
            generative: HashMap::new(),
            search,
        }
    }

    pub fn with_responder(mut self, topic: Topic, handle: ResponderHandle) -> Self {
        self.generative.insert(topic, handle);
        self
    }

    pub fn responder(&self, topic: Topic) -> Option<&ResponderHandle> {
        self.generative.get(&topic)
    }

    pub fn search(&self) -> &dyn SearchProvider {
        self.search.as_ref()
    }
}

/// The returned log plus the responder's accessor views, once fetched.
struct ResponderView<'a> {
    log: &'a ConversationLog,
    last: Option<Message>,
    alternate: Option<ConversationLog>,
}

impl ConversationView for ResponderView<'_> {
    fn log(&self) -> &ConversationLog {
        self.log
    }

    fn last_message(&self) -> Option<Message> {
        self.last.clone()
    }

    fn alternate_log(&self) -> Option<ConversationLog> {
        self.alternate.clone()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResponderGateway {
    chain: ExtractionChain,
}

impl ResponderGateway {
    pub fn new(chain: ExtractionChain) -> Self {
        Self { chain }
    }

    #[instrument(skip(self, handle, query), fields(responder = handle.name(), topic = %query.topic))]
    pub async fn call(
        &self,
        handle: &ResponderHandle,
        query: &Query,
        max_auto_replies: usize,
    ) -> Result<String, CallError> {
        // Held from reset through extraction; the accessor views are per responder.
        let _exclusive = handle.in_flight.lock().await;
        let responder = handle.responder.as_ref();
        responder.reset().await;

        let budget = TurnBudget {
            max_auto_replies,
            ..handle.budget
        };
        let log = responder.converse(&query.text, budget).await.map_err(|e| {
            warn!(detail = %e.0, "responder transport failure");
            CallError::from(e)
        })?;

        info!(
            messages = log.len(),
            responder_turns = log.responder_turns(),
            "exchange finished"
        );

        // Fast path: the returned log usually answers on its own.
        let mut view = ResponderView {
            log: &log,
            last: None,
            alternate: None,
        };
        if let ExtractionResult::Success(content) = self.chain.extract(&view) {
            return Ok(content);
        }

        view.last = responder.last_message().await;
        view.alternate = responder.alternate_log().await;
        match self.chain.extract(&view).into_content() {
            Ok(content) => Ok(content),
            Err(failure) => {
                warn!(outcome = ?failure, "no usable content in exchange");
                Err(CallError::NoUsableContent(failure))
            }
        }
    }

    /// Call with the handle's configured auto-reply budget.
    pub async fn call_with_budget(
        &self,
        handle: &ResponderHandle,
        query: &Query,
    ) -> Result<String, CallError> {
        self.call(handle, query, handle.budget.max_auto_replies).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-process responders for exercising the gateway and orchestrator.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// One scripted reaction to a `converse` call.
    #[derive(Debug, Clone)]
    pub enum Script {
        Reply {
            log: ConversationLog,
            last: Option<Message>,
            alternate: Option<ConversationLog>,
        },
        Fail(String),
    }

    impl Script {
        pub fn answer(content: &str) -> Self {
            Script::Reply {
                log: ConversationLog::new(vec![
                    Message::user("prompt"),
                    Message::responder(format!("{content}\nTASK_COMPLETE")),
                ]),
                last: None,
                alternate: None,
            }
        }
    }

    #[derive(Default)]
    struct ScriptedState {
        last: Option<Message>,
        alternate: Option<ConversationLog>,
    }

    pub struct ScriptedResponder {
        name: String,
        scripts: Mutex<VecDeque<Script>>,
        state: Mutex<ScriptedState>,
        pub prompts: Mutex<Vec<String>>,
        pub budgets: Mutex<Vec<TurnBudget>>,
        pub resets: Mutex<usize>,
    }

    impl ScriptedResponder {
        pub fn new(name: &str, scripts: Vec<Script>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                scripts: Mutex::new(scripts.into()),
                state: Mutex::new(ScriptedState::default()),
                prompts: Mutex::new(vec![]),
                budgets: Mutex::new(vec![]),
                resets: Mutex::new(0),
            })
        }

        pub fn answering(name: &str, content: &str) -> Arc<Self> {
            Self::new(name, vec![Script::answer(content)])
        }

        pub fn failing(name: &str) -> Arc<Self> {
            Self::new(name, vec![Script::Fail("connection refused".to_string())])
        }
    }

    #[async_trait]
    impl GenerativeResponder for ScriptedResponder {
        fn name(&self) -> &str {
            &self.name
        }

        async fn reset(&self) {
            *self.resets.lock().unwrap() += 1;
            *self.state.lock().unwrap() = ScriptedState::default();
        }

        async fn converse(
            &self,
            prompt: &str,
            budget: TurnBudget,
        ) -> Result<ConversationLog, TransportError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.budgets.lock().unwrap().push(budget);
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Script::Fail("script exhausted".to_string()));
            match script {
                Script::Reply {
                    log,
                    last,
                    alternate,
                } => {
                    let mut state = self.state.lock().unwrap();
                    state.last = last;
                    state.alternate = alternate;
                    Ok(log)
                }
                Script::Fail(detail) => Err(TransportError::new(detail)),
            }
        }

        async fn last_message(&self) -> Option<Message> {
            self.state.lock().unwrap().last.clone()
        }

        async fn alternate_log(&self) -> Option<ConversationLog> {
            self.state.lock().unwrap().alternate.clone()
        }
    }

    #[derive(Default)]
    pub struct StaticSearch {
        pub hits: Vec<SearchHit>,
        pub images: Vec<ImageHit>,
        pub queries: Mutex<Vec<String>>,
    }

    impl StaticSearch {
        pub fn new(hits: Vec<SearchHit>, images: Vec<ImageHit>) -> Arc<Self> {
            Arc::new(Self {
                hits,
                images,
                queries: Mutex::new(vec![]),
            })
        }

        pub fn empty() -> Arc<Self> {
            Arc::new(Self::default())
        }
    }

    #[async_trait]
    impl SearchProvider for StaticSearch {
        async fn search(&self, query: &str, n: usize) -> Vec<SearchHit> {
            self.queries.lock().unwrap().push(query.to_string());
            self.hits.iter().take(n).cloned().collect()
        }

        async fn image_search(&self, query: &str, n: usize) -> Vec<ImageHit> {
            self.queries.lock().unwrap().push(query.to_string());
            self.images.iter().take(n).cloned().collect()
        }
    }

    pub fn image_hit(link: &str) -> ImageHit {
        ImageHit {
            title: "photo".to_string(),
            link: link.to_string(),
            thumbnail: link.to_string(),
            context_link: String::new(),
        }
    }

    pub fn search_hit(title: &str, link: &str, snippet: &str) -> SearchHit {
        SearchHit {
            title: title.to_string(),
            link: link.to_string(),
            snippet: snippet.to_string(),
        }
    }
}
