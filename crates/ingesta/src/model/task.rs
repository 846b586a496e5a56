use uuid::Uuid;

use super::lifecycle::{Execution, Lifecycle};
use super::status::TaskKind;
use super::step::Step;

/// Ordered phase of a job, owning its steps.
#[derive(Debug, Clone)]
pub struct Task {
    id: Uuid,
    kind: TaskKind,
    order: i32,
    stop_on_failure: bool,
    steps: Vec<Step>,
    execution: Execution,
}

impl Task {
    pub fn new(name: impl Into<String>, kind: TaskKind, order: i32, stop_on_failure: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            order,
            stop_on_failure,
            steps: Vec::new(),
            execution: Execution::new(name),
        }
    }

    /// Adds a step, keeping steps sorted by their order index.
    pub fn add_step(&mut self, step: Step) {
        self.steps.push(step);
        self.steps.sort_by_key(Step::order);
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn stop_on_failure(&self) -> bool {
        self.stop_on_failure
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn steps_mut(&mut self) -> &mut [Step] {
        &mut self.steps
    }
}

impl Lifecycle for Task {
    const ENTITY: &'static str = "Task";

    fn execution(&self) -> &Execution {
        &self.execution
    }

    fn execution_mut(&mut self) -> &mut Execution {
        &mut self.execution
    }
}
