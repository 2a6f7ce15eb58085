//! Drag gesture state machine.
//!
//! # Responsibility
//! - Translate drag lifecycle events from the pointer/keyboard sensing layer
//!   into column reassignments.
//!
//! # Invariants
//! - At most one gesture is in flight.
//! - Column changes commit on hover, as soon as the target resolves to a
//!   different column. Drop and cancel never move and never roll back.
//! - `transition` is pure; only `DragCoordinator::handle` mutates tasks.

use crate::model::task::{Column, Task, TaskId};
use crate::repo::task_repo::TaskRepository;
use crate::store::KeyValueStore;
use log::debug;

/// What the pointer is currently over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// An empty area of a column.
    Column(Column),
    /// A task card; `column` is that card's column. Hovering the dragged
    /// card itself is ignored.
    Task { id: TaskId, column: Column },
}

impl DropTarget {
    /// Column the dragged task would land in.
    pub fn column(&self) -> Column {
        match self {
            Self::Column(column) => *column,
            Self::Task { column, .. } => *column,
        }
    }
}

/// Lifecycle events reported by the drag-sensing layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    Start { source: TaskId },
    /// `target` is `None` while hovering over nothing droppable.
    Over {
        source: TaskId,
        target: Option<DropTarget>,
    },
    Drop,
    Cancel,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { task_id: TaskId },
}

impl DragState {
    pub fn active_task(&self) -> Option<&TaskId> {
        match self {
            Self::Idle => None,
            Self::Dragging { task_id } => Some(task_id),
        }
    }
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragCommand {
    Move { task_id: TaskId, column: Column },
}

/// Read-only view used to resolve a task's current column.
pub trait TaskLocator {
    fn column_of(&self, id: &TaskId) -> Option<Column>;
}

impl TaskLocator for [Task] {
    fn column_of(&self, id: &TaskId) -> Option<Column> {
        self.iter()
            .find(|task| &task.id == id)
            .map(|task| task.column)
    }
}

impl<S: KeyValueStore> TaskLocator for TaskRepository<S> {
    fn column_of(&self, id: &TaskId) -> Option<Column> {
        self.find_by_id(id).map(|task| task.column)
    }
}

/// Computes the next state and optional command for one event.
pub fn transition<L>(
    state: &DragState,
    event: &DragEvent,
    locator: &L,
) -> (DragState, Option<DragCommand>)
where
    L: TaskLocator + ?Sized,
{
    match event {
        DragEvent::Start { source } => {
            if locator.column_of(source).is_some() {
                (
                    DragState::Dragging {
                        task_id: source.clone(),
                    },
                    None,
                )
            } else {
                (state.clone(), None)
            }
        }
        DragEvent::Over { source, target } => {
            let DragState::Dragging { task_id } = state else {
                return (state.clone(), None);
            };
            if source != task_id {
                return (state.clone(), None);
            }
            let Some(target) = target else {
                return (state.clone(), None);
            };
            if matches!(target, DropTarget::Task { id, .. } if id == task_id) {
                return (state.clone(), None);
            }
            let command = match locator.column_of(task_id) {
                Some(current) if current != target.column() => Some(DragCommand::Move {
                    task_id: task_id.clone(),
                    column: target.column(),
                }),
                _ => None,
            };
            (state.clone(), command)
        }
        DragEvent::Drop | DragEvent::Cancel => (DragState::Idle, None),
    }
}

/// Owns the in-flight gesture and applies its commands to a repository.
#[derive(Debug, Default)]
pub struct DragCoordinator {
    state: DragState,
}

impl DragCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Task being dragged, if any.
    pub fn active_task(&self) -> Option<&TaskId> {
        self.state.active_task()
    }

    /// Feeds one event through `transition` and executes the resulting move.
    ///
    /// Returns the command that was applied, if any.
    pub fn handle<S>(
        &mut self,
        event: &DragEvent,
        repo: &mut TaskRepository<S>,
    ) -> Option<DragCommand>
    where
        S: KeyValueStore,
    {
        let (next, command) = transition(&self.state, event, &*repo);
        if next != self.state {
            debug!(
                "event=drag_transition module=drag status=ok from={} to={}",
                state_name(&self.state),
                state_name(&next)
            );
        }
        self.state = next;

        if let Some(DragCommand::Move { task_id, column }) = &command {
            repo.move_task(task_id, *column);
        }
        command
    }
}

fn state_name(state: &DragState) -> &'static str {
    match state {
        DragState::Idle => "idle",
        DragState::Dragging { .. } => "dragging",
    }
}
