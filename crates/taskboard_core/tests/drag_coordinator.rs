use taskboard_core::{
    Column, DragCommand, DragCoordinator, DragEvent, DragState, DropTarget, MemoryKeyValueStore,
    TaskDraft, TaskId, TaskLimits, TaskRepository, DEFAULT_TASKS_KEY,
};

fn setup() -> (TaskRepository<MemoryKeyValueStore>, TaskId, TaskId) {
    let mut repo = TaskRepository::open(
        MemoryKeyValueStore::new(),
        DEFAULT_TASKS_KEY,
        TaskLimits::default(),
    );
    let dragged = repo.create(TaskDraft::new("dragged")).unwrap().id;
    let anchor = repo.create(TaskDraft::new("anchor")).unwrap().id;
    repo.move_task(&anchor, Column::Done);
    (repo, dragged, anchor)
}

fn over(source: &TaskId, target: DropTarget) -> DragEvent {
    DragEvent::Over {
        source: source.clone(),
        target: Some(target),
    }
}

#[test]
fn hover_sequence_commits_each_column_change_and_drop_keeps_last() {
    let (mut repo, dragged, anchor) = setup();
    let mut drag = DragCoordinator::new();

    drag.handle(
        &DragEvent::Start {
            source: dragged.clone(),
        },
        &mut repo,
    );
    assert_eq!(drag.active_task(), Some(&dragged));

    let first = drag.handle(
        &over(&dragged, DropTarget::Column(Column::InProgress)),
        &mut repo,
    );
    assert_eq!(
        first,
        Some(DragCommand::Move {
            task_id: dragged.clone(),
            column: Column::InProgress,
        })
    );
    assert_eq!(
        repo.find_by_id(&dragged).unwrap().column,
        Column::InProgress
    );

    let repeat = drag.handle(
        &over(&dragged, DropTarget::Column(Column::InProgress)),
        &mut repo,
    );
    assert_eq!(repeat, None);

    let onto_card = drag.handle(
        &over(
            &dragged,
            DropTarget::Task {
                id: anchor.clone(),
                column: Column::Done,
            },
        ),
        &mut repo,
    );
    assert!(onto_card.is_some());
    assert_eq!(repo.find_by_id(&dragged).unwrap().column, Column::Done);

    assert_eq!(drag.handle(&DragEvent::Drop, &mut repo), None);
    assert_eq!(drag.state(), &DragState::Idle);
    assert_eq!(repo.find_by_id(&dragged).unwrap().column, Column::Done);
    assert_eq!(
        repo.list_by_column(Column::Done)
            .into_iter()
            .map(|task| task.id.clone())
            .collect::<Vec<_>>(),
        vec![dragged.clone(), anchor]
    );
}

#[test]
fn start_on_unknown_id_stays_idle_and_ignores_hover() {
    let (mut repo, dragged, _) = setup();
    let mut drag = DragCoordinator::new();

    drag.handle(
        &DragEvent::Start {
            source: TaskId::from("ghost"),
        },
        &mut repo,
    );
    assert_eq!(drag.state(), &DragState::Idle);

    let command = drag.handle(
        &over(&dragged, DropTarget::Column(Column::Done)),
        &mut repo,
    );
    assert_eq!(command, None);
    assert_eq!(repo.find_by_id(&dragged).unwrap().column, Column::Todo);
}

#[test]
fn task_deleted_mid_drag_makes_hover_a_no_op() {
    let (mut repo, dragged, _) = setup();
    let mut drag = DragCoordinator::new();

    drag.handle(
        &DragEvent::Start {
            source: dragged.clone(),
        },
        &mut repo,
    );
    repo.delete(&dragged);

    let command = drag.handle(
        &over(&dragged, DropTarget::Column(Column::InProgress)),
        &mut repo,
    );
    assert_eq!(command, None);
    assert!(repo.find_by_id(&dragged).is_none());
    assert_eq!(repo.count_by_column(Column::InProgress), 0);

    drag.handle(&DragEvent::Cancel, &mut repo);
    assert_eq!(drag.active_task(), None);
}
