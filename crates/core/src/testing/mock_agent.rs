//! Mock rendering agent for tests.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::generator::{
    AgentError, ArtifactRef, Credentials, GenerationParams, RenderingAgent, Session,
};

/// Scriptable in-memory rendering agent.
///
/// Records every call and counts sessions opened/released so tests can
/// assert the release-exactly-once contract. Failure flags make individual
/// protocol phases fail on demand.
pub struct MockRenderingAgent {
    calls: Mutex<Vec<String>>,
    open_count: AtomicUsize,
    release_count: AtomicUsize,
    check_count: AtomicU32,
    keep_alive_count: AtomicU32,
    purge_count: AtomicU32,

    fail_open: AtomicBool,
    fail_authenticate: AtomicBool,
    fail_configure: AtomicBool,
    fail_submit: AtomicBool,
    /// Fail the next N artifact probes.
    failing_checks: AtomicU32,

    submit_started: AtomicBool,
    unverified_params: Mutex<Vec<String>>,
    /// Artifact returned once `check_count` reaches this value.
    artifact: Mutex<Option<(u32, ArtifactRef)>>,
    last_params: Mutex<Option<GenerationParams>>,
    last_prompt: Mutex<Option<String>>,
}

impl MockRenderingAgent {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            open_count: AtomicUsize::new(0),
            release_count: AtomicUsize::new(0),
            check_count: AtomicU32::new(0),
            keep_alive_count: AtomicU32::new(0),
            purge_count: AtomicU32::new(0),
            fail_open: AtomicBool::new(false),
            fail_authenticate: AtomicBool::new(false),
            fail_configure: AtomicBool::new(false),
            fail_submit: AtomicBool::new(false),
            failing_checks: AtomicU32::new(0),
            submit_started: AtomicBool::new(true),
            unverified_params: Mutex::new(Vec::new()),
            artifact: Mutex::new(None),
            last_params: Mutex::new(None),
            last_prompt: Mutex::new(None),
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    /// All calls in order, e.g. `["open_session", "authenticate", ...]`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.release_count.load(Ordering::SeqCst)
    }

    pub fn check_count(&self) -> u32 {
        self.check_count.load(Ordering::SeqCst)
    }

    pub fn keep_alive_count(&self) -> u32 {
        self.keep_alive_count.load(Ordering::SeqCst)
    }

    pub fn purge_count(&self) -> u32 {
        self.purge_count.load(Ordering::SeqCst)
    }

    pub fn last_params(&self) -> Option<GenerationParams> {
        self.last_params.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }

    pub fn fail_open_session(&self) {
        self.fail_open.store(true, Ordering::SeqCst);
    }

    pub fn fail_authenticate(&self) {
        self.fail_authenticate.store(true, Ordering::SeqCst);
    }

    pub fn fail_configure(&self) {
        self.fail_configure.store(true, Ordering::SeqCst);
    }

    pub fn fail_submit(&self) {
        self.fail_submit.store(true, Ordering::SeqCst);
    }

    /// Make the next `n` artifact probes return an error.
    pub fn fail_checks(&self, n: u32) {
        self.failing_checks.store(n, Ordering::SeqCst);
    }

    pub fn set_submit_started(&self, started: bool) {
        self.submit_started.store(started, Ordering::SeqCst);
    }

    pub fn set_unverified_params(&self, params: Vec<String>) {
        *self.unverified_params.lock().unwrap() = params;
    }

    /// Produce the artifact on the `n`-th probe.
    pub fn set_artifact_after_checks(&self, n: u32, url: &str) {
        *self.artifact.lock().unwrap() = Some((
            n,
            ArtifactRef {
                url: url.to_string(),
            },
        ));
    }
}

impl Default for MockRenderingAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RenderingAgent for MockRenderingAgent {
    async fn open_session(&self) -> Result<Session, AgentError> {
        self.record("open_session");
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(AgentError::Connection("mock open failure".to_string()));
        }
        let n = self.open_count.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Session::new(format!("mock-session-{}", n)))
    }

    async fn authenticate(
        &self,
        _session: &Session,
        _credentials: &Credentials,
    ) -> Result<(), AgentError> {
        self.record("authenticate");
        if self.fail_authenticate.load(Ordering::SeqCst) {
            return Err(AgentError::Protocol("mock auth failure".to_string()));
        }
        Ok(())
    }

    async fn configure(
        &self,
        _session: &Session,
        params: &GenerationParams,
    ) -> Result<Vec<String>, AgentError> {
        self.record("configure");
        if self.fail_configure.load(Ordering::SeqCst) {
            return Err(AgentError::Protocol("mock configure failure".to_string()));
        }
        *self.last_params.lock().unwrap() = Some(params.clone());
        Ok(self.unverified_params.lock().unwrap().clone())
    }

    async fn submit(&self, _session: &Session, prompt: &str) -> Result<bool, AgentError> {
        self.record("submit");
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(AgentError::Protocol("mock submit failure".to_string()));
        }
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        Ok(self.submit_started.load(Ordering::SeqCst))
    }

    async fn check_artifact(
        &self,
        _session: &Session,
        _match_key: &str,
    ) -> Result<Option<ArtifactRef>, AgentError> {
        self.record("check_artifact");
        let count = self.check_count.fetch_add(1, Ordering::SeqCst) + 1;

        let failing = self.failing_checks.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_checks.store(failing - 1, Ordering::SeqCst);
            return Err(AgentError::Timeout("mock probe failure".to_string()));
        }

        let artifact = self.artifact.lock().unwrap();
        if let Some((after, artifact)) = artifact.as_ref() {
            if count >= *after {
                return Ok(Some(artifact.clone()));
            }
        }
        Ok(None)
    }

    async fn keep_alive(&self, _session: &Session) -> Result<(), AgentError> {
        self.keep_alive_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn purge_caches(&self, _session: &Session) -> Result<(), AgentError> {
        self.purge_count.fetch_add(1, Ordering::SeqCst);
        self.record("purge_caches");
        Ok(())
    }

    async fn release(&self, _session: Session) -> Result<(), AgentError> {
        self.record("release");
        self.release_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
