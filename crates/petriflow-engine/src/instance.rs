//! Guarded construction of workflow instances.

use petriflow_net::{Instance, Workflow};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::EngineError;

/// Attribute keys callers may not set on an instance.
pub const FORBIDDEN_ATTRIBUTES: &[&str] = &[
  "id",
  "workflow_id",
  "verified",
  "verified_at",
  "created_at",
  "updated_at",
];

/// Workflow-specific setup run on every freshly built instance, before the
/// caller's attributes are applied.
pub trait InstanceHook: Send + Sync {
  fn after_build(&self, workflow: &Workflow, instance: &mut Instance);
}

/// A hook that leaves instances untouched.
#[derive(Debug, Clone, Default)]
pub struct NoopHook;

impl InstanceHook for NoopHook {
  fn after_build(&self, _workflow: &Workflow, _instance: &mut Instance) {}
}

/// Builds unsaved instances of a workflow.
#[derive(Debug, Clone, Default)]
pub struct InstanceFactory<H = NoopHook> {
  hook: H,
}

impl<H: InstanceHook> InstanceFactory<H> {
  pub fn new(hook: H) -> Self {
    Self { hook }
  }

  pub fn hook(&self) -> &H {
    &self.hook
  }

  /// Build an unsaved instance bound to `workflow`.
  ///
  /// With `strict_mode` on, a workflow whose `verified` flag is not set is
  /// refused and nothing is built.
  pub fn build_instance(
    &self,
    workflow: &Workflow,
    attributes: Map<String, Value>,
    strict_mode: bool,
  ) -> Result<Instance, EngineError> {
    if strict_mode && !workflow.verified {
      return Err(EngineError::UnverifiedWorkflow {
        workflow_id: workflow.id,
      });
    }

    let mut instance = Instance::new(workflow.id);
    self.hook.after_build(workflow, &mut instance);

    for (key, value) in attributes {
      if FORBIDDEN_ATTRIBUTES.contains(&key.as_str()) {
        debug!(workflow_id = %workflow.id, attribute = %key, "dropping protected attribute");
        continue;
      }
      instance.attributes.insert(key, value);
    }

    Ok(instance)
  }
}
