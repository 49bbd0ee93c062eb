use async_trait::async_trait;
use parking_lot::Mutex;
use sous_protocol::{
    ToolArguments, ToolDescriptor, ToolError, ToolHost, ToolHostLauncher, ToolOutput,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct HostState {
    calls: Vec<(String, ToolArguments)>,
    outputs: HashMap<String, ToolOutput>,
    failures: HashMap<String, String>,
    closed: usize,
}

/// In-memory tool host returning canned outputs and recording every call.
///
/// Clones share state, so a launcher can hand out copies and the test can
/// inspect them afterwards.
#[derive(Debug, Clone, Default)]
pub struct RecordingToolHost {
    tools: Vec<ToolDescriptor>,
    state: Arc<Mutex<HostState>>,
}

impl RecordingToolHost {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self {
            tools,
            state: Arc::default(),
        }
    }

    /// Answer calls to `name` with `output`. Unconfigured tools answer `Null`.
    pub fn with_output(self, name: impl Into<String>, output: ToolOutput) -> Self {
        self.state.lock().outputs.insert(name.into(), output);
        self
    }

    /// Fail calls to `name` with a transport error carrying `message`.
    pub fn with_transport_failure(self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.state.lock().failures.insert(name.into(), message.into());
        self
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<(String, ToolArguments)> {
        self.state.lock().calls.clone()
    }

    /// Names of the tools called so far, in order.
    pub fn called_names(&self) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// How many times `close` was invoked.
    pub fn close_count(&self) -> usize {
        self.state.lock().closed
    }
}

#[async_trait]
impl ToolHost for RecordingToolHost {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        Ok(self.tools.clone())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: ToolArguments,
    ) -> Result<ToolOutput, ToolError> {
        let mut state = self.state.lock();
        state.calls.push((name.to_string(), arguments));
        if let Some(message) = state.failures.get(name) {
            return Err(ToolError::Transport(message.clone()));
        }
        Ok(state.outputs.get(name).cloned().unwrap_or(ToolOutput::Null))
    }

    async fn close(&self) -> Result<(), ToolError> {
        self.state.lock().closed += 1;
        Ok(())
    }
}

/// Launcher handing out clones of one shared `RecordingToolHost`.
#[derive(Debug, Clone)]
pub struct StaticLauncher {
    host: RecordingToolHost,
    launches: Arc<AtomicUsize>,
}

impl StaticLauncher {
    pub fn new(host: RecordingToolHost) -> Self {
        Self {
            host,
            launches: Arc::default(),
        }
    }

    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolHostLauncher for StaticLauncher {
    async fn launch(&self) -> Result<Box<dyn ToolHost>, ToolError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.host.clone()))
    }
}

/// Launcher that can never reach its tool host.
#[derive(Debug, Clone, Default)]
pub struct FailingLauncher;

#[async_trait]
impl ToolHostLauncher for FailingLauncher {
    async fn launch(&self) -> Result<Box<dyn ToolHost>, ToolError> {
        Err(ToolError::Transport("tool host did not start".to_string()))
    }
}
