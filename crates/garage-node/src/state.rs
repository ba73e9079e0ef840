//! Application state: the open wizard sessions.

use std::collections::HashMap;
use std::sync::Arc;

use garage_core::{Result, WizardError};
use garage_engine::{AdvanceStep, EngineConfig, Transition, Wizard, WizardSnapshot};
use garage_flows::{FlowKind, GarageBackend};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

/// One open wizard, locked per request.
pub type Session = Arc<Mutex<Wizard>>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Open wizards by id.
    pub sessions: Arc<RwLock<HashMap<Uuid, Session>>>,

    /// Backend the flows commit to.
    pub backend: Arc<dyn GarageBackend>,

    /// Engine settings for new wizards.
    pub engine: EngineConfig,
}

impl AppState {
    /// Create a new application state.
    pub fn new(backend: Arc<dyn GarageBackend>, engine: EngineConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            backend,
            engine,
        }
    }

    /// Open a wizard on the first step of `kind`.
    pub async fn open(&self, kind: FlowKind) -> Result<WizardSnapshot> {
        let flow = kind.build(self.backend.clone())?;
        let wizard = Wizard::new(flow, self.engine.clone());
        let snapshot = wizard.snapshot();

        self.sessions
            .write()
            .await
            .insert(snapshot.wizard_id, Arc::new(Mutex::new(wizard)));

        info!(wizard_id = %snapshot.wizard_id, flow = %kind, "session opened");
        Ok(snapshot)
    }

    /// Look up an open wizard.
    pub async fn session(&self, id: Uuid) -> Result<Session> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(WizardError::SessionNotFound(id))
    }

    /// Snapshot of an open wizard.
    pub async fn snapshot(&self, id: Uuid) -> Result<WizardSnapshot> {
        let session = self.session(id).await?;
        let wizard = session.lock().await;
        Ok(wizard.snapshot())
    }

    /// Record an answer.
    pub async fn update_field(&self, id: Uuid, key: String, value: Value) -> Result<WizardSnapshot> {
        let session = self.session(id).await?;
        let mut wizard = session.lock().await;
        wizard.update_field(key, value);
        Ok(wizard.snapshot())
    }

    /// Advance a wizard. The session lock is released while the commit runs,
    /// so other requests see the in-flight status and are ignored by the engine.
    pub async fn advance(&self, id: Uuid) -> Result<(Transition, WizardSnapshot)> {
        let session = self.session(id).await?;

        let step = session.lock().await.begin_advance();
        let transition = match step {
            AdvanceStep::Done(transition) => transition,
            AdvanceStep::Commit(pending) => {
                let result = pending.run().await;
                session.lock().await.complete_advance(pending, result)
            }
        };

        // The session may have been closed while the commit ran.
        if !self.sessions.read().await.contains_key(&id) {
            return Err(WizardError::SessionNotFound(id));
        }

        let snapshot = session.lock().await.snapshot();
        Ok((transition, snapshot))
    }

    /// Move a wizard back one step.
    pub async fn retreat(&self, id: Uuid) -> Result<WizardSnapshot> {
        let session = self.session(id).await?;
        let mut wizard = session.lock().await;
        wizard.retreat();
        Ok(wizard.snapshot())
    }

    /// Reset a wizard to its first step.
    pub async fn reset(&self, id: Uuid) -> Result<WizardSnapshot> {
        let session = self.session(id).await?;
        let mut wizard = session.lock().await;
        wizard.reset();
        Ok(wizard.snapshot())
    }

    /// Number of open wizards.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Close a wizard, cancelling any commit it has in flight.
    pub async fn close(&self, id: Uuid) -> Result<()> {
        let session = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or(WizardError::SessionNotFound(id))?;

        session.lock().await.reset();
        info!(wizard_id = %id, "session closed");
        Ok(())
    }
}
