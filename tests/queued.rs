//! Queued firing: FIFO processing on a single worker task.

use parking_lot::Mutex;
use stately::{
    Action, FireError, FiringMode, MachineOptions, QueueStatus, StateMachine, Transition,
    UsageError,
};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum Job {
    Pending,
    Running,
    Done,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum Command {
    Start,
    Finish,
    Note,
    Explode,
}

type Notes = Arc<Mutex<Vec<u32>>>;

fn note_taker(notes: &Notes) -> Action<Job, Command> {
    let notes = Arc::clone(notes);
    Action::new("note", move |t: &Transition<Job, Command>| {
        notes.lock().push(*t.parameters.get::<u32>(0).unwrap());
        Ok(())
    })
}

fn queued_job(notes: &Notes) -> StateMachine<Job, Command> {
    let mut builder = StateMachine::builder(Job::Pending).firing_mode(FiringMode::Queued);
    builder
        .configure(Job::Pending)
        .permit(Command::Start, Job::Running)
        .internal_transition(Command::Note, note_taker(notes));
    builder
        .configure(Job::Running)
        .permit(Command::Finish, Job::Done)
        .internal_transition(Command::Note, note_taker(notes))
        .internal_transition(
            Command::Explode,
            Action::new("explode", |_t: &Transition<Job, Command>| panic!("boom")),
        );
    builder.build().unwrap()
}

#[tokio::test]
async fn queued_triggers_run_in_submission_order() {
    let notes = Notes::default();
    let machine = queued_job(&notes);

    let mut handles = Vec::new();
    for i in 0..10u32 {
        handles.push(machine.enqueue(Command::Note, (i,)).unwrap());
    }
    handles.push(machine.enqueue(Command::Start, ()).unwrap());
    for handle in handles {
        handle.outcome().await.unwrap();
    }

    assert_eq!(*notes.lock(), (0..10u32).collect::<Vec<_>>());
    assert_eq!(machine.state(), Job::Running);
}

#[tokio::test]
async fn failed_item_does_not_stop_the_queue() {
    let notes = Notes::default();
    let machine = queued_job(&notes);

    let first = machine.enqueue(Command::Start, ()).unwrap();
    let second = machine.enqueue(Command::Start, ()).unwrap();
    let third = machine.enqueue(Command::Finish, ()).unwrap();

    first.outcome().await.unwrap();
    let error = second.outcome().await.unwrap_err();
    assert!(error.is_invalid_transition());
    third.outcome().await.unwrap();
    assert_eq!(machine.state(), Job::Done);
}

#[tokio::test]
async fn panicking_action_is_reported_and_worker_survives() {
    let notes = Notes::default();
    let machine = queued_job(&notes);

    machine.enqueue(Command::Start, ()).unwrap();
    let exploded = machine.enqueue(Command::Explode, ()).unwrap();
    let after = machine.enqueue(Command::Note, (7u32,)).unwrap();

    let error = exploded.outcome().await.unwrap_err();
    assert!(matches!(error, FireError::Panicked { ref message, .. } if message == "boom"));
    after.outcome().await.unwrap();
    assert_eq!(*notes.lock(), vec![7]);
}

#[tokio::test]
async fn fire_async_in_queued_mode_returns_once_enqueued() {
    let notes = Notes::default();
    let machine = queued_job(&notes);

    // Invalid from Pending; the failure is only logged.
    machine.fire_async(Command::Finish, ()).await.unwrap();
    machine.fire_async(Command::Start, ()).await.unwrap();
    let last = machine.enqueue(Command::Note, (1u32,)).unwrap();

    last.outcome().await.unwrap();
    assert_eq!(machine.state(), Job::Running);
}

#[tokio::test]
async fn status_tracks_pending_work() {
    let gate = Arc::new(Notify::new());
    let waiting = Arc::clone(&gate);
    let mut builder = StateMachine::builder(Job::Pending).options(MachineOptions {
        firing_mode: FiringMode::Queued,
    });
    builder.configure(Job::Pending).permit(Command::Start, Job::Running);
    builder.configure(Job::Running).on_entry(Action::suspending(
        "wait for gate",
        move |_t: Transition<Job, Command>| {
            let gate = Arc::clone(&waiting);
            async move {
                gate.notified().await;
                Ok(())
            }
        },
    ));
    let machine = builder.build().unwrap();
    assert_eq!(machine.queue_status(), QueueStatus::Idle);

    let handle = machine.enqueue(Command::Start, ()).unwrap();
    assert_eq!(machine.queue_status(), QueueStatus::Processing);

    gate.notify_one();
    handle.outcome().await.unwrap();
    assert_eq!(machine.queue_status(), QueueStatus::Idle);
    assert_eq!(machine.state(), Job::Running);
}

#[tokio::test]
async fn close_drains_then_rejects() {
    let notes = Notes::default();
    let machine = queued_job(&notes);

    for i in 0..5u32 {
        machine.fire_async(Command::Note, (i,)).await.unwrap();
    }
    machine.close().await;

    assert_eq!(notes.lock().len(), 5);
    assert!(machine.is_closed());
    assert_eq!(machine.queue_status(), QueueStatus::Stopped);
    assert!(matches!(
        machine.enqueue(Command::Start, ()),
        Err(FireError::Usage(UsageError::Closed))
    ));
    assert!(matches!(
        machine.fire_async(Command::Start, ()).await,
        Err(FireError::Usage(UsageError::Closed))
    ));
}

#[tokio::test]
async fn actions_may_enqueue_follow_up_triggers() {
    let slot = Arc::new(Mutex::new(None::<Arc<StateMachine<Job, Command>>>));
    let inner = Arc::clone(&slot);

    let mut builder = StateMachine::builder(Job::Pending).firing_mode(FiringMode::Queued);
    builder.configure(Job::Pending).permit(Command::Start, Job::Running);
    builder
        .configure(Job::Running)
        .permit(Command::Finish, Job::Done)
        .on_entry(Action::new("finish right away", move |_t: &Transition<Job, Command>| {
            if let Some(machine) = inner.lock().clone() {
                machine
                    .enqueue(Command::Finish, ())
                    .map_err(|error| error.to_string())?;
            }
            Ok(())
        }));
    let machine = Arc::new(builder.build().unwrap());
    *slot.lock() = Some(Arc::clone(&machine));

    machine.enqueue(Command::Start, ()).unwrap().outcome().await.unwrap();
    machine.close().await;

    assert_eq!(machine.state(), Job::Done);
    slot.lock().take();
}

#[tokio::test]
async fn immediate_machine_serializes_concurrent_fires() {
    let notes = Notes::default();
    let mut builder = StateMachine::builder(Job::Pending);
    builder
        .configure(Job::Pending)
        .internal_transition(Command::Note, note_taker(&notes));
    let machine = Arc::new(builder.build().unwrap());

    let tasks: Vec<_> = (0..8u32)
        .map(|i| {
            let machine = Arc::clone(&machine);
            tokio::spawn(async move { machine.fire_async(Command::Note, (i,)).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let mut seen = notes.lock().clone();
    seen.sort_unstable();
    assert_eq!(seen, (0..8u32).collect::<Vec<_>>());
}
