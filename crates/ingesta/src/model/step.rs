use uuid::Uuid;

use super::lifecycle::{Execution, Lifecycle};
use super::status::StepKind;
use crate::config::StepParameters;

/// Atomic operation inside a task.
#[derive(Debug, Clone)]
pub struct Step {
    id: Uuid,
    kind: StepKind,
    order: i32,
    parameters: StepParameters,
    execution: Execution,
}

impl Step {
    pub fn new(name: impl Into<String>, kind: StepKind, order: i32) -> Self {
        Self::with_parameters(name, kind, order, StepParameters::default())
    }

    pub fn with_parameters(
        name: impl Into<String>,
        kind: StepKind,
        order: i32,
        parameters: StepParameters,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            order,
            parameters,
            execution: Execution::new(name),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> &StepKind {
        &self.kind
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn parameters(&self) -> &StepParameters {
        &self.parameters
    }
}

impl Lifecycle for Step {
    const ENTITY: &'static str = "Step";

    fn execution(&self) -> &Execution {
        &self.execution
    }

    fn execution_mut(&mut self) -> &mut Execution {
        &mut self.execution
    }
}
