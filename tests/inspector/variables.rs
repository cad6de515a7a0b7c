use crate::common::{attach, flatten, node_id};
use crate::{FLAGS_SCRIPT, NESTED_SCRIPT};
use livehook::debugger::inspector::scripted::ScriptedInspector;
use livehook::debugger::inspector::VariableFilter;
use livehook::debugger::variable::builder::ForestBuilder;
use livehook::debugger::variable::edit::{EditorHint, INT_SLIDER_RANGE};
use livehook::debugger::variable::{expression, ValueKind};
use livehook::debugger::Session;

#[test]
fn test_forest_shape() {
    let (_, session) = attach(NESTED_SCRIPT);
    let forest = session.forest();

    let labels: Vec<_> = forest
        .roots()
        .iter()
        .map(|&id| forest.get(id).unwrap().label())
        .collect();
    assert_eq!(
        labels,
        vec![
            "(infinite_sleep) stop",
            "::global_float",
            "(main) bar",
            "(main) bytes",
            "(main) stop",
        ]
    );

    let names: Vec<_> = flatten(forest).into_iter().map(|(name, _, _)| name).collect();
    assert_eq!(
        names,
        vec![
            "stop",
            "::global_float",
            "bar",
            "bar.c",
            "bar.foo",
            "bar.foo.a",
            "bar.foo.b",
            "bytes",
            "bytes[0]",
            "bytes[1]",
            "stop",
        ]
    );
}

#[test]
fn test_aggregates_have_children_scalars_have_none() {
    let (_, session) = attach(NESTED_SCRIPT);
    let forest = session.forest();

    for (id, node) in forest.iter() {
        if node.is_aggregate() {
            assert!(!node.children().is_empty(), "empty aggregate {}", node.name);
        } else {
            assert!(node.children().is_empty(), "scalar with children {}", node.name);
        }
        for &child in node.children() {
            assert_eq!(forest.get(child).unwrap().parent(), Some(id));
        }
    }
}

#[test]
fn test_unreadable_element_skipped() {
    let (_, session) = attach(NESTED_SCRIPT);
    let forest = session.forest();

    let bytes = forest.get(node_id(&session, "bytes")).unwrap();
    assert_eq!(bytes.children().len(), 2);
    assert!(expression::find(forest, "bytes[2]").is_none());
}

#[test]
fn test_qualified_name_resolves_back() {
    let (_, session) = attach(NESTED_SCRIPT);
    let forest = session.forest();

    for (id, node) in forest.iter() {
        let qualified = expression::qualified_name(forest, id).unwrap();
        let found = expression::find(forest, &qualified).unwrap();
        // both `stop` roots share a name, first one shadows the second
        if node.name != "stop" {
            assert_eq!(found, id, "{qualified}");
        }
        assert_eq!(forest.get(found).unwrap().name, node.name);
    }
}

#[test]
fn test_rebuild_is_deterministic() {
    let (_, mut session) = attach(NESTED_SCRIPT);
    let before = flatten(session.forest());
    let snapshot = session.forest().snapshot();

    session.request_stop().unwrap();
    session.tick();

    assert_ne!(session.forest().snapshot(), snapshot);
    assert_eq!(flatten(session.forest()), before);
}

#[test]
fn test_statics_filtered_out() {
    let inspector = ScriptedInspector::from_file(NESTED_SCRIPT).unwrap();
    let filter = VariableFilter {
        statics: false,
        ..Default::default()
    };
    let session = Session::attach(inspector, filter);

    assert!(expression::find(session.forest(), "::global_float").is_none());
    assert!(expression::find(session.forest(), "bar.foo.a").is_some());
}

#[test]
fn test_kinds_and_hints() {
    struct TestCase {
        target: &'static str,
        kind: ValueKind,
        hint: EditorHint,
    }
    let test_cases = vec![
        TestCase {
            target: "bar",
            kind: ValueKind::Aggregate,
            hint: EditorHint::Tree,
        },
        TestCase {
            target: "bar.foo",
            kind: ValueKind::Aggregate,
            hint: EditorHint::Tree,
        },
        TestCase {
            target: "bar.c",
            kind: ValueKind::SignedInt,
            hint: EditorHint::Slider {
                min: INT_SLIDER_RANGE.0,
                max: INT_SLIDER_RANGE.1,
            },
        },
        TestCase {
            target: "bytes[0]",
            kind: ValueKind::UnsignedByte,
            hint: EditorHint::Slider { min: 0, max: 255 },
        },
        TestCase {
            target: "stop",
            kind: ValueKind::Boolean,
            hint: EditorHint::Checkbox,
        },
        TestCase {
            target: "::global_float",
            kind: ValueKind::Opaque,
            hint: EditorHint::DecimalText,
        },
    ];

    let (_, session) = attach(NESTED_SCRIPT);
    for tc in test_cases {
        let node = session.forest().get(node_id(&session, tc.target)).unwrap();
        assert_eq!(node.kind, tc.kind, "target: {}", tc.target);
        assert_eq!(EditorHint::for_node(node), tc.hint, "target: {}", tc.target);
    }

    let (_, session) = attach(FLAGS_SCRIPT);
    let flags = session.forest().get(node_id(&session, "flags")).unwrap();
    assert_eq!(flags.kind, ValueKind::Enumeration);
    assert_eq!(
        EditorHint::for_node(flags),
        EditorHint::Choice(vec!["Slow".to_string(), "Fast".to_string()])
    );
    assert_eq!(expression::qualified_write_value(flags), "Mode::Fast");
}

#[test]
fn test_builder_matches_session_forest() {
    let inspector = ScriptedInspector::from_file(NESTED_SCRIPT).unwrap();
    let forest = ForestBuilder::default().build(&inspector, 1).unwrap();

    let (_, session) = attach(NESTED_SCRIPT);
    assert_eq!(flatten(&forest), flatten(session.forest()));
}
