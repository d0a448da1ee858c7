//! Lifecycle of the gopls session
//!
//! ```text
//! Stopped ──ensure_started──▶ Starting ──ok──▶ Running ──restart key──▶ Restarting ──ok──▶ Running
//!                                 │                                        │
//!                                 └──────────err──────▶ Failed ◀────err────┘
//! ```
//!
//! `Failed` is left only by another `ensure_started`. Starts are
//! single-flight: every caller that arrives while a start is in progress
//! awaits the same shared future.

use crate::binary::BinaryResolver;
use crate::launch::{self, LaunchContext, TEMP_DIR_VAR};
use futures::future::{BoxFuture, FutureExt, Shared};
use gorig_config::GoConfig;
use gorig_foundation::protocol::{Editor, LanguageServer, ServerLauncher};
use gorig_foundation::{GorigError, GorigResult};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

type StartFuture = Shared<BoxFuture<'static, GorigResult<Arc<dyn LanguageServer>>>>;

enum SessionState {
    Stopped,
    Starting { attempt: u64, start: StartFuture },
    Running { attempt: u64, server: Arc<dyn LanguageServer> },
    Restarting { attempt: u64, start: StartFuture },
    Failed { error: GorigError },
}

/// Observable session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Stopped,
    Starting,
    Running,
    Restarting,
    Failed(GorigError),
}

struct Inner {
    editor: Arc<dyn Editor>,
    resolver: BinaryResolver,
    launcher: Arc<dyn ServerLauncher>,
    config: Mutex<GoConfig>,
    state: Mutex<SessionState>,
    attempts: AtomicU64,
    /// Bumped when a restart begins; in-flight requests watch it
    restarts: watch::Sender<u64>,
}

/// Owns the one gopls client/server pairing
#[derive(Clone)]
pub struct SessionSupervisor {
    inner: Arc<Inner>,
}

impl SessionSupervisor {
    pub fn new(
        config: GoConfig,
        editor: Arc<dyn Editor>,
        resolver: BinaryResolver,
        launcher: Arc<dyn ServerLauncher>,
    ) -> Self {
        let (restarts, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                editor,
                resolver,
                launcher,
                config: Mutex::new(config),
                state: Mutex::new(SessionState::Stopped),
                attempts: AtomicU64::new(0),
                restarts,
            }),
        }
    }

    pub async fn status(&self) -> SessionStatus {
        match &*self.inner.state.lock().await {
            SessionState::Stopped => SessionStatus::Stopped,
            SessionState::Starting { .. } => SessionStatus::Starting,
            SessionState::Running { .. } => SessionStatus::Running,
            SessionState::Restarting { .. } => SessionStatus::Restarting,
            SessionState::Failed { error } => SessionStatus::Failed(error.clone()),
        }
    }

    /// Current configuration snapshot
    pub async fn config(&self) -> GoConfig {
        self.inner.config.lock().await.clone()
    }

    /// Start the session unless it is already running
    ///
    /// Callers arriving during a start or restart join it. A failed
    /// session is started afresh.
    pub async fn ensure_started(&self) -> GorigResult<Arc<dyn LanguageServer>> {
        if !self.inner.config.lock().await.enable {
            return Err(GorigError::config("gopls is disabled (go.enable = false)"));
        }

        let start = {
            let mut state = self.inner.state.lock().await;
            match &*state {
                SessionState::Running { server, .. } => return Ok(server.clone()),
                SessionState::Starting { start, .. } | SessionState::Restarting { start, .. } => {
                    start.clone()
                }
                SessionState::Stopped | SessionState::Failed { .. } => {
                    let attempt = self.next_attempt();
                    let start = start_future(Arc::downgrade(&self.inner), attempt, None);
                    *state = SessionState::Starting {
                        attempt,
                        start: start.clone(),
                    };
                    start
                }
            }
        };

        start.await
    }

    /// Forward a request to the running server
    ///
    /// Does not start the session. A restart that begins while the request
    /// is in flight fails it with `SessionRestarting`.
    pub async fn send_request(&self, method: &str, params: Value) -> GorigResult<Value> {
        let (server, mut restarts) = self.running_server().await?;
        tokio::select! {
            result = server.request(method, params) => result,
            _ = restarts.changed() => {
                debug!(lsp_method = %method, "Request dropped by restart");
                Err(GorigError::SessionRestarting)
            }
        }
    }

    /// Forward a notification to the running server
    pub async fn send_notification(&self, method: &str, params: Value) -> GorigResult<()> {
        let (server, _) = self.running_server().await?;
        server.notify(method, params).await
    }

    /// Take a new configuration snapshot and restart if a watched key changed
    pub async fn on_configuration_changed<S: AsRef<str>>(
        &self,
        changed_keys: &[S],
        config: GoConfig,
    ) -> GorigResult<()> {
        *self.inner.config.lock().await = config;

        if !GoConfig::requires_restart(changed_keys) {
            return Ok(());
        }
        info!(
            keys = ?changed_keys.iter().map(AsRef::as_ref).collect::<Vec<_>>(),
            "Configuration change requires a gopls restart"
        );
        self.restart().await
    }

    /// Replace a running server with a freshly launched one
    ///
    /// A session that is still starting is restarted once the start
    /// completes. Stopped and failed sessions are left alone.
    pub async fn restart(&self) -> GorigResult<()> {
        loop {
            let pending = {
                let mut state = self.inner.state.lock().await;
                match &*state {
                    SessionState::Running { server, .. } => {
                        let attempt = self.next_attempt();
                        let start = start_future(
                            Arc::downgrade(&self.inner),
                            attempt,
                            Some(server.clone()),
                        );
                        *state = SessionState::Restarting {
                            attempt,
                            start: start.clone(),
                        };
                        self.inner.restarts.send_modify(|generation| *generation += 1);
                        drop(state);
                        return start.await.map(|_| ());
                    }
                    SessionState::Restarting { start, .. } => {
                        let start = start.clone();
                        drop(state);
                        return start.await.map(|_| ());
                    }
                    SessionState::Starting { start, .. } => start.clone(),
                    SessionState::Stopped | SessionState::Failed { .. } => return Ok(()),
                }
            };
            // Let the start land, then restart what it produced
            if pending.await.is_err() {
                return Ok(());
            }
        }
    }

    /// Stop the session and release the server process
    pub async fn stop(&self) -> GorigResult<()> {
        let previous = {
            let mut state = self.inner.state.lock().await;
            std::mem::replace(&mut *state, SessionState::Stopped)
        };
        match previous {
            SessionState::Running { attempt, server } => {
                info!(attempt, "Stopping gopls");
                server.shutdown().await
            }
            _ => Ok(()),
        }
    }

    /// Install the server binary into the tools directory
    ///
    /// Independent of the session; a running server keeps running.
    pub async fn install(&self) -> GorigResult<PathBuf> {
        let mut spec = self.inner.config.lock().await.gopls_tool();
        spec.configured_path = None;
        self.inner.resolver.install(&spec).await
    }

    async fn running_server(&self) -> GorigResult<(Arc<dyn LanguageServer>, watch::Receiver<u64>)> {
        match &*self.inner.state.lock().await {
            SessionState::Running { server, .. } => {
                Ok((server.clone(), self.inner.restarts.subscribe()))
            }
            SessionState::Restarting { .. } => Err(GorigError::SessionRestarting),
            _ => Err(GorigError::SessionNotRunning),
        }
    }

    fn next_attempt(&self) -> u64 {
        self.inner.attempts.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// One start attempt, run once no matter how many callers await it
fn start_future(
    inner: Weak<Inner>,
    attempt: u64,
    previous: Option<Arc<dyn LanguageServer>>,
) -> StartFuture {
    async move {
        let inner = inner.upgrade().ok_or(GorigError::SessionNotRunning)?;

        if let Some(previous) = previous {
            if let Err(e) = previous.shutdown().await {
                warn!(attempt, error = %e, "Previous gopls did not shut down cleanly");
            }
        }

        let result = inner.launch(attempt).await;
        inner.finish_start(attempt, &result).await;
        result
    }
    .boxed()
    .shared()
}

impl Inner {
    async fn launch(&self, attempt: u64) -> GorigResult<Arc<dyn LanguageServer>> {
        let config = self.config.lock().await.clone();
        let binary = self.resolver.resolve(&config.gopls_tool()).await?;
        let host_temp_dir = self.editor.host_env(TEMP_DIR_VAR).await;
        let context = LaunchContext::from_process(self.editor.cwd(), host_temp_dir);
        let plan = launch::plan(binary, &config, context);

        info!(
            attempt,
            command = %plan.command.display(),
            args = ?plan.args,
            "Starting gopls"
        );
        self.launcher.launch(plan, config.client_options()).await
    }

    async fn finish_start(&self, attempt: u64, result: &GorigResult<Arc<dyn LanguageServer>>) {
        let mut state = self.state.lock().await;
        let current = matches!(
            &*state,
            SessionState::Starting { attempt: a, .. } | SessionState::Restarting { attempt: a, .. }
                if *a == attempt
        );

        if !current {
            drop(state);
            // Stopped while starting; nobody owns this server
            if let Ok(server) = result {
                debug!(attempt, "Discarding server started after stop");
                let _ = server.shutdown().await;
            }
            return;
        }

        match result {
            Ok(server) => {
                *state = SessionState::Running {
                    attempt,
                    server: server.clone(),
                };
                info!(attempt, "gopls running");
            }
            Err(e) => {
                *state = SessionState::Failed { error: e.clone() };
                drop(state);
                error!(attempt, error = %e, "gopls failed to start");
                self.editor.show_message(&e.to_string(), e.level()).await;
            }
        }
    }
}
