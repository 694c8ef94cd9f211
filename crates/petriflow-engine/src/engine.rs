//! The workflow engine facade.
//!
//! `Engine` ties the verifier, the cloner and the instance factory to a
//! store, and reports what it did through a notifier.

use chrono::Utc;
use petriflow_net::{Instance, Workflow, WorkflowId};
use petriflow_store::{Store, Transaction, WorkflowRecord};
use petriflow_verifier::{Violations, verify};
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use crate::error::EngineError;
use crate::events::{NoopNotifier, Notifier, WorkflowEvent};
use crate::fork::{Forked, fork};
use crate::instance::{InstanceFactory, InstanceHook, NoopHook};

/// Configuration for the workflow engine.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
  /// Refuse to build instances of workflows that are not verified.
  pub strict_mode: bool,
}

/// The workflow engine.
pub struct Engine<S, N = NoopNotifier, H = NoopHook> {
  store: S,
  notifier: N,
  instances: InstanceFactory<H>,
  config: EngineConfig,
}

impl<S: Store> Engine<S> {
  /// Create an engine that discards events and uses no instance hook.
  pub fn new(store: S, config: EngineConfig) -> Self {
    Self {
      store,
      notifier: NoopNotifier,
      instances: InstanceFactory::default(),
      config,
    }
  }
}

impl<S, N, H> Engine<S, N, H>
where
  S: Store,
  N: Notifier,
  H: InstanceHook,
{
  /// Replace the notifier.
  pub fn with_notifier<N2: Notifier>(self, notifier: N2) -> Engine<S, N2, H> {
    Engine {
      store: self.store,
      notifier,
      instances: self.instances,
      config: self.config,
    }
  }

  /// Replace the instance hook.
  pub fn with_hook<H2: InstanceHook>(self, hook: H2) -> Engine<S, N, H2> {
    Engine {
      store: self.store,
      notifier: self.notifier,
      instances: InstanceFactory::new(hook),
      config: self.config,
    }
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub async fn load(&self, workflow_id: WorkflowId) -> Result<Workflow, EngineError> {
    Ok(self.store.load_workflow(workflow_id).await?)
  }

  pub async fn list(&self) -> Result<Vec<WorkflowRecord>, EngineError> {
    Ok(self.store.list_workflows().await?)
  }

  pub async fn instances(&self, workflow_id: WorkflowId) -> Result<Vec<Instance>, EngineError> {
    Ok(self.store.list_instances(workflow_id).await?)
  }

  /// Save a new workflow with all of its elements in one transaction.
  #[instrument(skip_all, fields(workflow_id = %workflow.id))]
  pub async fn import(&self, workflow: &Workflow) -> Result<(), EngineError> {
    let mut tx = self.store.begin().await?;
    tx.insert_net(workflow).await?;
    tx.commit().await?;

    info!(
      places = workflow.places().len(),
      transitions = workflow.transitions().len(),
      arcs = workflow.arcs().len(),
      "imported workflow"
    );
    Ok(())
  }

  /// Check soundness without touching the store or the workflow.
  pub fn verify(&self, workflow: &Workflow, violations: &mut Violations) -> bool {
    verify(workflow, violations)
  }

  /// Verify `workflow`, persist the outcome and then record it on the
  /// workflow.
  ///
  /// The ledger reflects this run even when the store write fails. The
  /// workflow is only updated once the store has accepted the outcome.
  #[instrument(skip_all, fields(workflow_id = %workflow.id))]
  pub async fn verify_and_persist(
    &self,
    workflow: &mut Workflow,
    violations: &mut Violations,
  ) -> Result<bool, EngineError> {
    let sound = verify(workflow, violations);
    let verified_at = Utc::now();

    self
      .store
      .update_verification(workflow.id, sound, Some(verified_at))
      .await?;
    workflow.record_verification(sound, verified_at);

    self.notifier.notify(WorkflowEvent::Verified {
      workflow_id: workflow.id,
      sound,
      violations: violations.len(),
    });
    Ok(sound)
  }

  /// Mark a verified workflow as unverified again, e.g. after an edit.
  ///
  /// A workflow that is not verified is left alone and nothing is written.
  #[instrument(skip_all, fields(workflow_id = %workflow.id))]
  pub async fn reset_verification(&self, workflow: &mut Workflow) -> Result<(), EngineError> {
    if !workflow.verified {
      return Ok(());
    }

    self
      .store
      .update_verification(workflow.id, false, None)
      .await?;
    workflow.clear_verification();

    info!("verification reset");
    self.notifier.notify(WorkflowEvent::VerificationReset {
      workflow_id: workflow.id,
    });
    Ok(())
  }

  /// Clone a workflow under its own name.
  pub async fn fork(&self, source: &Workflow) -> Result<Forked, EngineError> {
    self.fork_with(source, |_| {}).await
  }

  /// Clone a workflow, letting `customize` adjust the copy's record before
  /// it is written.
  pub async fn fork_with<F>(&self, source: &Workflow, customize: F) -> Result<Forked, EngineError>
  where
    F: FnOnce(&mut Workflow) + Send,
  {
    let forked = fork(&self.store, source, customize).await?;

    self.notifier.notify(WorkflowEvent::Forked {
      source_id: source.id,
      workflow_id: forked.workflow.id,
      sound: forked.workflow.verified,
    });
    Ok(forked)
  }

  /// Build an unsaved instance, honouring the configured strict mode.
  pub fn build_instance(
    &self,
    workflow: &Workflow,
    attributes: Map<String, Value>,
  ) -> Result<Instance, EngineError> {
    self
      .instances
      .build_instance(workflow, attributes, self.config.strict_mode)
  }

  /// Persist an instance, reporting failure as `false`.
  pub async fn save_instance(&self, instance: &Instance) -> bool {
    match self.create_instance(instance).await {
      Ok(()) => true,
      Err(e) => {
        warn!(instance_id = %instance.id, error = %e, "failed to save instance");
        false
      }
    }
  }

  /// Persist an instance.
  pub async fn create_instance(&self, instance: &Instance) -> Result<(), EngineError> {
    self.store.insert_instance(instance).await?;

    self.notifier.notify(WorkflowEvent::InstanceCreated {
      workflow_id: instance.workflow_id,
      instance_id: instance.id,
    });
    Ok(())
  }

  /// Delete a workflow with its elements and instances.
  #[instrument(skip(self))]
  pub async fn delete(&self, workflow_id: WorkflowId) -> Result<(), EngineError> {
    self.store.delete_workflow(workflow_id).await?;

    info!("deleted workflow");
    self.notifier.notify(WorkflowEvent::Deleted { workflow_id });
    Ok(())
  }
}
