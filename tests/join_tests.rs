//! Left, inner, and outer joins, their preconditions, and match introspection

mod test_data_gen;

use mosdex_core::prelude::{Container, DataType, Scalar, Schema};
use mosdex_operators::{MergeJoin, NotPresent, Probed, UnmatchedKeys};
use mosdex_span::SpanError;
use test_data_gen::{
    balance_ship_from, balance_ship_from_rows, extra, factory, int_rows, int_schema, ship,
    ship_rows, ship_schema, ARCS,
};

fn columns(rows: &[Container]) -> Vec<String> {
    rows.iter()
        .filter_map(|r| r.get_str("Column").map(str::to_string))
        .collect()
}

#[test]
fn test_left_join_keeps_left_cardinality_and_order() {
    let joined = balance_ship_from()
        .left_join(ship(), "Column", MergeJoin::default())
        .expect("join failed");
    let names: Vec<&str> = joined.schema().field_names().collect();
    assert_eq!(
        names,
        vec!["Row", "Column", "Coefficient", "Name", "Variable", "LB", "UB"]
    );

    let rows = joined.collect().unwrap();
    assert_eq!(rows.len(), balance_ship_from_rows().len());
    assert_eq!(columns(&rows), columns(&balance_ship_from_rows()));
    assert_eq!(rows[0].get_str("Row"), Some("balance_PITT"));
    assert_eq!(rows[0].get_str("Name"), Some("ship_PITT_NE"));
    assert_eq!(rows[0].get_f64("UB"), Some(250.0));
}

#[test]
fn test_left_join_unmatched_row_gets_nulls() {
    let rows = extra()
        .left_join(ship(), "Column", MergeJoin::default())
        .unwrap()
        .collect()
        .unwrap();
    assert_eq!(rows.len(), 2);
    let missing = &rows[1];
    assert_eq!(missing.get_str("Column"), Some("ship_NE_SE"));
    assert_eq!(missing.get("Name"), Some(&Scalar::Null));
    assert_eq!(missing.get("Variable"), Some(&Scalar::Null));
    assert_eq!(missing.get_f64("Coefficient"), Some(1.0));
}

#[test]
fn test_left_join_reports_unmatched_left_keys() {
    let probed = Probed::new(MergeJoin::default());
    let probe = probed.probe();
    let mut report = UnmatchedKeys::new();
    let rows = extra()
        .left_join(ship(), "Column", probed)
        .unwrap()
        .map(probe.unmatched_keys(&mut report))
        .unwrap()
        .collect()
        .unwrap();
    assert_eq!(rows.len(), 2);

    let left: Vec<&Scalar> = report.get("left").unwrap().iter().collect();
    assert_eq!(left, vec![&Scalar::from("ship_NE_SE")]);
    assert!(report.right().is_empty());
    assert!(report.get("middle").is_none());
}

#[test]
fn test_probe_tracks_each_pairing() {
    let probed = Probed::new(MergeJoin::default());
    let probe = probed.probe();
    assert_eq!(probe.not_present(), None);

    let mut seen = Vec::new();
    extra()
        .left_join(ship(), "Column", probed)
        .unwrap()
        .inspect(|_| seen.push((probe.keys_match(), probe.not_present())))
        .for_each(|_| {})
        .unwrap();
    assert_eq!(
        seen,
        vec![
            (true, Some(NotPresent::Neither)),
            (false, Some(NotPresent::Right)),
        ]
    );
    assert_eq!(probe.key_field().as_deref(), Some("Column"));
}

#[test]
fn test_inner_join_is_matched_subset() {
    let rows = extra()
        .inner_join(ship(), "Column", MergeJoin::default())
        .unwrap()
        .collect()
        .unwrap();
    assert_eq!(columns(&rows), vec!["ship_NE_ATL"]);
    assert_eq!(rows[0].get_str("Name"), Some("ship_NE_ATL"));
}

#[test]
fn test_outer_join_covers_both_sides() {
    let joined = extra()
        .outer_join(ship(), "Column", MergeJoin::default())
        .unwrap();
    assert!(joined.is_keyed());
    assert_eq!(joined.key_field(), Some("Column"));

    let map = joined.get_as_map().unwrap();
    let keys: Vec<String> = map.keys().map(|k| k.to_string()).collect();
    assert_eq!(
        keys,
        vec![
            "ship_NE_ATL",
            "ship_NE_SE",
            "ship_PITT_NE",
            "ship_PITT_SE",
            "ship_NE_BOS",
            "ship_SE_ATL",
            "ship_SE_BOS",
        ]
    );

    let both = &map[&Scalar::from("ship_NE_ATL")];
    assert_eq!(both.get_str("Row"), Some("balance_NE"));
    assert_eq!(both.get_str("Name"), Some("ship_NE_ATL"));

    let left_only = &map[&Scalar::from("ship_NE_SE")];
    assert!(left_only.get("Name").map_or(false, Scalar::is_null));

    let right_only = &map[&Scalar::from("ship_PITT_NE")];
    assert!(right_only.get("Row").map_or(false, Scalar::is_null));
    assert_eq!(right_only.get_str("Name"), Some("ship_PITT_NE"));
}

#[test]
fn test_outer_join_rows_report_both_sides() {
    let probed = Probed::new(MergeJoin::default());
    let probe = probed.probe();
    let mut report = UnmatchedKeys::new();
    let count = extra()
        .outer_join_rows(ship(), "Column", probed)
        .unwrap()
        .map(probe.unmatched_keys(&mut report))
        .unwrap()
        .key("Column")
        .unwrap()
        .count()
        .unwrap();
    assert_eq!(count, 7);

    assert_eq!(report.left().len(), 1);
    assert!(report.left().contains(&Scalar::from("ship_NE_SE")));
    let right: Vec<String> = report.right().iter().map(|k| k.to_string()).collect();
    assert_eq!(
        right,
        vec!["ship_PITT_NE", "ship_PITT_SE", "ship_NE_BOS", "ship_SE_ATL", "ship_SE_BOS"]
    );
}

#[test]
fn test_join_against_prekeyed_right_uses_its_key() {
    // Name carries the same text as Column in the fixture
    let by_name = ship().key("Name").unwrap();
    let rows = balance_ship_from()
        .left_join(by_name, "Column", MergeJoin::default())
        .unwrap()
        .collect()
        .unwrap();
    assert_eq!(rows.len(), ARCS.len());
    assert!(rows.iter().all(|r| r.get_f64("UB").is_some()));
}

#[test]
fn test_join_right_side_can_be_a_stream() {
    let stream = factory().stream("ship_stream", ship_schema(), ship_rows());
    let rows = balance_ship_from()
        .left_join(stream, "Column", MergeJoin::default())
        .unwrap()
        .collect()
        .unwrap();
    assert!(rows.iter().all(|r| !r.get("Name").map_or(true, Scalar::is_null)));
}

#[test]
fn test_join_preconditions() {
    assert!(matches!(
        extra().left_join(ship(), "Missing", MergeJoin::default()),
        Err(SpanError::JoinPrecondition(_))
    ));
    assert!(matches!(
        extra().left_join(ship(), "Row", MergeJoin::default()),
        Err(SpanError::JoinPrecondition(_))
    ));

    let text_ids = Schema::from_pairs([("id", DataType::Utf8), ("label", DataType::Utf8)]).unwrap();
    let labels = factory().create("labels", text_ids, &[]).unwrap();
    let ints = factory().create("ints", int_schema(), &int_rows(2)).unwrap();
    match ints.left_join(labels, "id", MergeJoin::default()) {
        Err(SpanError::JoinPrecondition(msg)) => assert!(msg.contains("incompatible")),
        other => panic!("expected JoinPrecondition, got {other:?}"),
    }
}

#[test]
fn test_join_operator_plan_error() {
    match extra().left_join(ship(), "Column", MergeJoin::dropping(["Column"])) {
        Err(SpanError::Operator { op, .. }) => assert_eq!(op, "join_merge"),
        other => panic!("expected Operator error, got {other:?}"),
    }
}

#[test]
fn test_join_drop_fields() {
    let rows = balance_ship_from()
        .left_join(ship(), "Column", MergeJoin::dropping(["Coefficient", "LB"]))
        .unwrap()
        .collect()
        .unwrap();
    assert!(rows
        .iter()
        .all(|r| !r.contains_field("Coefficient") && !r.contains_field("LB")));
}
