//! The ReAct loop: ask the model, run the tools it calls, feed the results
//! back, and repeat until it answers without calling anything.

use std::sync::Arc;

use skillet_config::SkilletConfig;
use skillet_config::schema::AgentConfig;
use skillet_core::{Message, Result, Role, ThreadId, ToolResult};
use skillet_llm::{LlmProvider, LlmRequest, Usage};
use skillet_memory::ConversationStore;
use skillet_skills::SkillRegistry;
use tracing::{debug, info, warn};

use crate::callback::{AgentCallback, SilentCallback};
use crate::hitl::{ApprovalRequest, ApprovalResponse, InterruptPolicy};
use crate::prompt::{SystemPrompt, get_system_prompt};
use crate::subagent::DataAnalysisTool;
use crate::tools::{BashTool, FileSearchTools, ToolRegistry, ViewSkillTool};

/// Model parameters and loop limits.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_iterations: u32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::from_config(&AgentConfig::default())
    }
}

impl AgentSettings {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_iterations: config.max_iterations,
        }
    }
}

/// A tool-calling agent bound to one conversation thread.
pub struct ReActAgent {
    llm: Arc<dyn LlmProvider>,
    settings: AgentSettings,
    system_prompt: String,
    tools: ToolRegistry,
    policy: InterruptPolicy,
    callback: Arc<dyn AgentCallback>,
    store: Option<ConversationStore>,
    thread_id: ThreadId,
    history: Vec<Message>,
    loaded: bool,
    usage: Usage,
}

pub struct ReActAgentBuilder {
    llm: Arc<dyn LlmProvider>,
    system_prompt: String,
    settings: AgentSettings,
    tools: ToolRegistry,
    policy: InterruptPolicy,
    callback: Arc<dyn AgentCallback>,
    store: Option<ConversationStore>,
    thread_id: ThreadId,
}

impl ReActAgentBuilder {
    pub fn settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn policy(mut self, policy: InterruptPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn callback(mut self, callback: Arc<dyn AgentCallback>) -> Self {
        self.callback = callback;
        self
    }

    /// Checkpoint the thread into `store` after every step.
    pub fn store(mut self, store: Option<ConversationStore>) -> Self {
        self.store = store;
        self
    }

    pub fn thread_id(mut self, thread_id: impl Into<ThreadId>) -> Self {
        self.thread_id = thread_id.into();
        self
    }

    pub fn build(self) -> ReActAgent {
        ReActAgent {
            llm: self.llm,
            settings: self.settings,
            system_prompt: self.system_prompt,
            tools: self.tools,
            policy: self.policy,
            callback: self.callback,
            store: self.store,
            thread_id: self.thread_id,
            history: Vec::new(),
            loaded: false,
            usage: Usage::default(),
        }
    }
}

impl ReActAgent {
    /// Start building an agent with no tools, no approvals, and a fresh thread.
    pub fn builder(llm: Arc<dyn LlmProvider>, system_prompt: impl Into<String>) -> ReActAgentBuilder {
        ReActAgentBuilder {
            llm,
            system_prompt: system_prompt.into(),
            settings: AgentSettings::default(),
            tools: ToolRegistry::new(),
            policy: InterruptPolicy::none(),
            callback: Arc::new(SilentCallback),
            store: None,
            thread_id: skillet_core::new_thread_id(),
        }
    }

    /// The main agent: skills discovered from `skills.dir`, the system prompt
    /// rendered with their summaries, and the full tool set.
    pub fn from_config(
        config: &SkilletConfig,
        llm: Arc<dyn LlmProvider>,
        callback: Arc<dyn AgentCallback>,
        store: Option<ConversationStore>,
        thread_id: impl Into<ThreadId>,
    ) -> Result<Self> {
        let registry = Arc::new(SkillRegistry::discover_in(&config.skills.dir)?);
        let prompt = SystemPrompt::resolve(config.agent.system_prompt_file.as_deref())?;
        let system_prompt = get_system_prompt(&prompt, &registry)?;

        let tools = ToolRegistry::new()
            .with(Arc::new(ViewSkillTool::new(registry.clone())))
            .with(Arc::new(FileSearchTools::from_config(&config.file_search)))
            .with(Arc::new(BashTool::from_config(&config.bash)))
            .with(Arc::new(DataAnalysisTool::from_config(
                config,
                llm.clone(),
                store.clone(),
            )));

        let policy = if config.approval.auto_approve {
            InterruptPolicy::none()
        } else {
            InterruptPolicy::new(config.approval.interrupt_on.iter().cloned())
        };

        info!(
            model = %config.agent.model,
            skills = registry.count(),
            tools = ?tools.names(),
            "agent ready"
        );

        Ok(Self::builder(llm, system_prompt)
            .settings(AgentSettings::from_config(&config.agent))
            .tools(tools)
            .policy(policy)
            .callback(callback)
            .store(store)
            .thread_id(thread_id)
            .build())
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Tokens used since the agent was created.
    pub fn usage(&self) -> &Usage {
        &self.usage
    }

    /// Pull the thread's checkpoint from the store, once.
    fn ensure_loaded(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        if let Some(store) = &self.store {
            self.history = store.load_messages(&self.thread_id)?;
            debug!(thread = %self.thread_id, messages = self.history.len(), "restored thread");
        }
        self.loaded = true;
        Ok(())
    }

    fn checkpoint(&self) -> Result<()> {
        match &self.store {
            Some(store) => store.save_messages(&self.thread_id, &self.history),
            None => Ok(()),
        }
    }

    /// Process one user turn and return the final answer.
    pub async fn run(&mut self, user_input: &str) -> Result<String> {
        self.ensure_loaded()?;
        let turn_start = self.history.len();
        self.history.push(Message::text(Role::User, user_input));

        for iteration in 1..=self.settings.max_iterations {
            let request = LlmRequest {
                model: self.settings.model.clone(),
                messages: self.history.clone(),
                tools: self.tools.tools(),
                system: Some(self.system_prompt.clone()),
                max_tokens: self.settings.max_tokens,
                temperature: self.settings.temperature,
            };

            let response = match self.llm.complete(&request).await {
                Ok(r) => r,
                Err(e) => {
                    self.callback.on_error(&e.to_string());
                    self.checkpoint()?;
                    return Err(e);
                }
            };
            self.usage.merge(&response.usage);

            let message = response.message;
            let calls = message.tool_calls.clone();
            self.history.push(message);

            if calls.is_empty() {
                self.checkpoint()?;
                let answer = self.history.last().map(Message::text_content).unwrap_or_default();
                debug!(thread = %self.thread_id, iteration, "final answer");
                return Ok(answer);
            }

            for call in &calls {
                self.callback.on_tool_call(&call.tool_name, &call.arguments);

                if self.policy.requires_approval(&call.tool_name) {
                    let request = ApprovalRequest::from_call(call);
                    if self.callback.request_approval(&request).await == ApprovalResponse::Rejected {
                        info!(tool = %call.tool_name, "tool call rejected");
                        self.history.push(Message::tool_result(&call.tool_name, &request.rejection()));
                        continue;
                    }
                }

                let result = match self.tools.execute(call).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(tool = %call.tool_name, error = %e, "tool failed");
                        ToolResult::error(&call.id, format!("Error: {e}"))
                    }
                };
                self.callback.on_tool_result(&call.tool_name, &result.content);
                self.history.push(Message::tool_result(&call.tool_name, &result));
            }

            self.checkpoint()?;
        }

        let n = self.settings.max_iterations;
        warn!(thread = %self.thread_id, iterations = n, "max agent iterations reached");
        let last_text = self.history[turn_start..]
            .iter()
            .rev()
            .filter(|m| m.role == Role::Assistant)
            .map(Message::text_content)
            .find(|t| !t.is_empty());
        Ok(last_text.unwrap_or_else(|| {
            format!("Agent stopped after {n} iterations without a final answer.")
        }))
    }
}
