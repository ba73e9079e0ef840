//! Flows: ordered step tables with a single terminal step.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{Result, WizardError};
use crate::step::StepDefinition;

/// A validated, immutable list of steps. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Flow {
    name: String,
    steps: Arc<[StepDefinition]>,
}

impl Flow {
    /// Start building a flow.
    pub fn builder(name: impl Into<String>) -> FlowBuilder {
        FlowBuilder::new(name)
    }

    /// The flow name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All steps in order.
    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    /// The step at `index`.
    pub fn step(&self, index: usize) -> Option<&StepDefinition> {
        self.steps.get(index)
    }

    /// Number of steps, including the terminal step.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a built flow.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Index of the step with `id`.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    /// Index of the terminal step (always the last one).
    pub fn terminal_index(&self) -> usize {
        self.steps.len() - 1
    }

    /// Step ids in order.
    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id.as_str()).collect()
    }
}

/// Builder for [`Flow`]s with a fluent API.
#[derive(Debug)]
pub struct FlowBuilder {
    name: String,
    steps: Vec<StepDefinition>,
}

impl FlowBuilder {
    /// Create a new builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step.
    pub fn step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    /// Build the flow, checking ordering and terminal-step invariants.
    pub fn build(self) -> Result<Flow> {
        let name = self.name;
        let invalid = |message: &str| WizardError::invalid_flow(name.clone(), message);

        let last = self
            .steps
            .last()
            .ok_or_else(|| invalid("a flow needs at least one step"))?;

        let mut seen = HashSet::new();
        for step in &self.steps {
            if step.id.trim().is_empty() {
                return Err(invalid("step ids cannot be empty"));
            }
            if !seen.insert(step.id.as_str()) {
                return Err(invalid(&format!("duplicate step id '{}'", step.id)));
            }
        }

        let terminals = self.steps.iter().filter(|s| s.is_terminal()).count();
        if terminals != 1 {
            return Err(invalid(&format!(
                "expected exactly one terminal step, found {}",
                terminals
            )));
        }

        if !last.is_terminal() {
            return Err(invalid("the terminal step must be the last step"));
        }

        if last.commit_action().is_some() {
            return Err(invalid("the terminal step cannot have a commit"));
        }

        Ok(Flow {
            name,
            steps: self.steps.into(),
        })
    }
}
