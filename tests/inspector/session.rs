use crate::common::{attach, node_id, value_of, ReadOnlyInspector};
use crate::{
    COUNTER_SCRIPT, FLAGS_SCRIPT, NESTED_SCRIPT, NO_THREAD_SCRIPT, SHORT_LIVED_SCRIPT,
    VANISH_SCRIPT,
};
use livehook::debugger::inspector::scripted::ScriptedInspector;
use livehook::debugger::inspector::{DebugInspector, ProcessState, VariableFilter};
use livehook::debugger::publish::WriteOutcome;
use livehook::debugger::{Error, Session, SessionState};

#[test]
fn test_attach_builds_forest_and_resumes() {
    let (inspector, session) = attach(COUNTER_SCRIPT);

    assert_eq!(session.state(), SessionState::Active);
    assert_eq!(session.forest().len(), 1);
    assert_eq!(value_of(&session, "counter").as_deref(), Some("41"));
    assert_eq!(inspector.state(), ProcessState::Running);
    assert_eq!(inspector.resumes(), 1);
    assert!(inspector.evaluations().is_empty());
}

#[test]
fn test_write_applied_at_next_stop() {
    let (inspector, mut session) = attach(COUNTER_SCRIPT);

    let counter = node_id(&session, "counter");
    session.commit_edit(counter, "42").unwrap();
    assert_eq!(session.pending_edit().unwrap().expression(), "counter = 42");
    // nothing is written until debugee stops
    assert!(inspector.evaluations().is_empty());

    let tick = session.tick();
    assert_eq!(tick.rebuilds, 1);
    assert_eq!(tick.writes.len(), 1);
    assert!(tick.writes[0].is_applied());
    assert!(!tick.terminated);

    assert_eq!(inspector.evaluations(), vec!["counter = 42"]);
    assert_eq!(value_of(&session, "counter").as_deref(), Some("42"));
    assert!(session.pending_edit().is_none());
    assert_eq!(inspector.state(), ProcessState::Running);
    assert_eq!(inspector.resumes(), 2);

    // write is never repeated
    let tick = session.tick();
    assert_eq!(tick.events, 0);
    assert_eq!(inspector.evaluations().len(), 1);
}

#[test]
fn test_enum_write_qualified_with_type() {
    let (inspector, mut session) = attach(FLAGS_SCRIPT);

    let flags = node_id(&session, "flags");
    session.commit_edit(flags, "Slow").unwrap();
    session.tick();

    assert_eq!(inspector.evaluations(), vec!["flags = Mode::Slow"]);
    assert_eq!(value_of(&session, "flags").as_deref(), Some("Slow"));

    let flags = node_id(&session, "flags");
    session.commit_edit(flags, "Fast").unwrap();
    session.tick();
    assert_eq!(
        inspector.evaluations(),
        vec!["flags = Mode::Slow", "flags = Mode::Fast"]
    );
}

#[test]
fn test_last_write_wins_within_one_stop() {
    let (inspector, mut session) = attach(COUNTER_SCRIPT);

    let counter = node_id(&session, "counter");
    session.commit_edit(counter, "1").unwrap();
    session.commit_edit(counter, "2").unwrap();
    session.commit_edit(counter, "3").unwrap();

    let tick = session.tick();
    assert_eq!(tick.writes.len(), 1);
    assert_eq!(inspector.evaluations(), vec!["counter = 3"]);
    assert_eq!(value_of(&session, "counter").as_deref(), Some("3"));
}

#[test]
fn test_write_skipped_when_root_vanished() {
    let (inspector, mut session) = attach(VANISH_SCRIPT);
    // attach resumed debugee into the second stage, `counter` is gone there
    assert_eq!(inspector.stage(), 1);
    let resumes = inspector.resumes();

    let counter = node_id(&session, "counter");
    session.commit_edit(counter, "42").unwrap();
    let tick = session.tick();

    assert_eq!(tick.writes.len(), 1);
    assert!(matches!(
        tick.writes[0],
        WriteOutcome::Skipped(Error::WriteTargetNotFound { .. })
    ));
    assert!(inspector.evaluations().is_empty());
    assert!(session.pending_edit().is_none());

    // forest is rebuilt from the new stack and debugee is resumed anyway
    assert_eq!(value_of(&session, "counter"), None);
    assert_eq!(value_of(&session, "job").as_deref(), Some("1"));
    assert_eq!(inspector.resumes(), resumes + 1);
    assert_eq!(inspector.state(), ProcessState::Running);
}

#[test]
fn test_rejected_write_still_rebuilds_and_resumes() {
    let scripted = ScriptedInspector::from_file(COUNTER_SCRIPT).unwrap();
    let mut session = Session::attach(
        ReadOnlyInspector(scripted.clone()),
        VariableFilter::default(),
    );
    let snapshot = session.forest().snapshot();

    let counter = node_id(&session, "counter");
    session.commit_edit(counter, "42").unwrap();
    let tick = session.tick();

    assert_eq!(tick.writes.len(), 1);
    match &tick.writes[0] {
        WriteOutcome::Failed(Error::EvaluationFailed { expression, reason }) => {
            assert_eq!(expression, "counter = 42");
            assert_eq!(reason, "memory is read-only");
        }
        outcome => panic!("unexpected outcome: {outcome:?}"),
    }
    assert_eq!(tick.rebuilds, 1);
    assert!(session.pending_edit().is_none());
    assert!(session.forest().snapshot() > snapshot);
    assert_eq!(value_of(&session, "counter").as_deref(), Some("41"));
    assert_eq!(session.inspector().state(), ProcessState::Running);
    assert_eq!(scripted.resumes(), 2);
}

#[test]
fn test_write_goes_to_declaring_frame() {
    let (inspector, mut session) = attach(NESTED_SCRIPT);

    // innermost `stop` is found first
    let stop = node_id(&session, "stop");
    assert_eq!(
        session.forest().get(stop).unwrap().declaring_function,
        "infinite_sleep"
    );
    session.commit_edit(stop, "true").unwrap();
    session.tick();

    assert_eq!(inspector.evaluations(), vec!["stop = true"]);
    let forest = session.forest();
    let stops: Vec<_> = forest
        .iter()
        .filter(|(_, node)| node.is_root() && node.name == "stop")
        .map(|(_, node)| (node.declaring_function.as_str(), node.raw_value.as_str()))
        .collect();
    assert_eq!(stops, vec![("infinite_sleep", "true"), ("main", "false")]);
}

#[test]
fn test_write_round_trip() {
    struct TestCase {
        target: &'static str,
        text: &'static str,
        expression: &'static str,
        expected: &'static str,
    }
    let test_cases = vec![
        TestCase {
            target: "bar.foo.a",
            text: "5",
            expression: "bar.foo.a = 5",
            expected: "5",
        },
        TestCase {
            target: "bar.c",
            text: "-12",
            expression: "bar.c = -12",
            expected: "-12",
        },
        TestCase {
            target: "bytes[1]",
            text: "200",
            expression: "bytes[1] = 200",
            expected: "200",
        },
        TestCase {
            target: "::global_float",
            text: "2.5",
            expression: "::global_float = 2.5",
            expected: "2.5",
        },
    ];

    for tc in test_cases {
        let (inspector, mut session) = attach(NESTED_SCRIPT);
        let id = node_id(&session, tc.target);
        session.commit_edit(id, tc.text).unwrap();
        let tick = session.tick();

        assert!(tick.writes[0].is_applied(), "target: {}", tc.target);
        assert_eq!(inspector.evaluations(), vec![tc.expression]);
        assert_eq!(
            value_of(&session, tc.target).as_deref(),
            Some(tc.expected),
            "target: {}",
            tc.target
        );
    }
}

#[test]
fn test_invalid_edit_rejected_before_stop() {
    struct TestCase {
        target: &'static str,
        text: &'static str,
    }
    let test_cases = vec![
        TestCase {
            target: "bar",
            text: "1",
        },
        TestCase {
            target: "bar.c",
            text: "one",
        },
        TestCase {
            target: "bytes[0]",
            text: "256",
        },
        TestCase {
            target: "stop",
            text: "yes",
        },
    ];

    for tc in test_cases {
        let (inspector, mut session) = attach(NESTED_SCRIPT);
        let id = node_id(&session, tc.target);
        assert!(
            matches!(
                session.commit_edit(id, tc.text),
                Err(Error::InvalidEditValue { .. })
            ),
            "target: {}",
            tc.target
        );
        assert!(session.pending_edit().is_none());

        // debugee was not asked to stop
        let tick = session.tick();
        assert_eq!(tick.rebuilds, 0, "target: {}", tc.target);
        assert!(inspector.evaluations().is_empty());
    }
}

#[test]
fn test_stale_node_rejected() {
    let (_, mut session) = attach(COUNTER_SCRIPT);
    let counter = node_id(&session, "counter");

    session.request_stop().unwrap();
    session.tick();

    assert!(matches!(
        session.commit_edit(counter, "1"),
        Err(Error::NodeNotFound(_))
    ));
    assert!(session.pending_edit().is_none());
}

#[test]
fn test_manual_refresh() {
    let (inspector, mut session) = attach(COUNTER_SCRIPT);
    let snapshot = session.forest().snapshot();

    session.request_stop().unwrap();
    let tick = session.tick();

    assert_eq!(tick.events, 2);
    assert_eq!(tick.rebuilds, 1);
    assert!(tick.writes.is_empty());
    assert!(session.forest().snapshot() > snapshot);
    assert_eq!(inspector.state(), ProcessState::Running);
}

#[test]
fn test_exit_terminates_session() {
    let (inspector, mut session) = attach(COUNTER_SCRIPT);
    let counter = node_id(&session, "counter");
    session.tick();

    inspector.terminate();
    let tick = session.tick();
    assert!(tick.terminated);
    assert_eq!(tick.rebuilds, 0);
    assert_eq!(session.state(), SessionState::Terminated);

    // last forest stays visible, but nothing is written or rebuilt anymore
    assert_eq!(value_of(&session, "counter").as_deref(), Some("41"));
    assert!(matches!(
        session.commit_edit(counter, "42"),
        Err(Error::SessionTerminated)
    ));
    assert!(matches!(
        session.request_stop(),
        Err(Error::SessionTerminated)
    ));

    let tick = session.tick();
    assert!(tick.terminated);
    assert_eq!(tick.events, 0);
    assert_eq!(tick.rebuilds, 0);
    assert!(inspector.evaluations().is_empty());
}

#[test]
fn test_exit_right_after_write() {
    let (inspector, mut session) = attach(SHORT_LIVED_SCRIPT);

    // debugee exits on the second resume, right after the stop requested by commit
    let counter = node_id(&session, "counter");
    session.commit_edit(counter, "7").unwrap();
    let tick = session.tick();

    assert!(tick.writes[0].is_applied());
    assert_eq!(tick.rebuilds, 1);
    assert!(tick.terminated);
    assert_eq!(inspector.state(), ProcessState::Exited);
    assert_eq!(inspector.evaluations(), vec!["counter = 7"]);
    assert_eq!(value_of(&session, "counter").as_deref(), Some("7"));
}

#[test]
fn test_commit_refused_after_exit() {
    let (inspector, mut session) = attach(COUNTER_SCRIPT);
    let counter = node_id(&session, "counter");

    // debugee dies before the stop request arrives, edit is refused
    inspector.terminate();
    assert!(matches!(
        session.commit_edit(counter, "7"),
        Err(Error::ProcessControl(_))
    ));
    assert!(session.pending_edit().is_none());

    let tick = session.tick();
    assert!(tick.terminated);
    assert!(tick.writes.is_empty());
    assert!(session.pending_edit().is_none());
    assert!(inspector.evaluations().is_empty());
}

#[test]
fn test_no_thread_gives_empty_forest() {
    let (inspector, mut session) = attach(NO_THREAD_SCRIPT);
    assert_eq!(session.forest().len(), 1);

    let counter = node_id(&session, "counter");
    session.commit_edit(counter, "1").unwrap();
    let tick = session.tick();

    assert!(matches!(
        tick.writes[0],
        WriteOutcome::Skipped(Error::WriteTargetNotFound { .. })
    ));
    assert!(session.forest().is_empty());
    assert!(!session.is_terminated());
    assert_eq!(inspector.state(), ProcessState::Running);
}
