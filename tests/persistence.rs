#![warn(clippy::pedantic)]

use std::path::PathBuf;

use petgraph::stable_graph::EdgeIndex;
use trusscut::{point, PersistenceError, Truss};

fn build_braced_frame() -> (Truss, EdgeIndex) {
    let mut truss = Truss::new();
    let a = truss.add_node(point(0.0, 0.0, 0.0));
    let b = truss.add_node(point(4.0, 0.0, 0.0));
    let c = truss.add_node(point(4.0, 3.0, 0.0));
    let d = truss.add_node(point(0.0, 3.0, 0.0));
    for (start, end) in [(a, b), (b, c), (c, d), (d, a)] {
        truss.add_beam(start, end, 0.2, 0.1).expect("valid beam");
    }
    let brace = truss.add_beam(a, c, 0.2, 0.08).expect("valid beam");
    (truss, brace)
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("trusscut-{}-{name}.json", std::process::id()))
}

fn assert_same_truss(original: &Truss, restored: &Truss) {
    assert_eq!(original.node_count(), restored.node_count());
    assert_eq!(original.beam_count(), restored.beam_count());

    for ((_, left), (_, right)) in original.nodes().zip(restored.nodes()) {
        assert_eq!(left.position(), right.position());
        assert_eq!(left.has_moved(), right.has_moved());
    }

    for ((left_id, left), (right_id, right)) in original.beams().zip(restored.beams()) {
        let (start, end) = original.beam_endpoints(left_id).expect("beam exists");
        let (restored_start, restored_end) = restored.beam_endpoints(right_id).expect("beam exists");
        assert_eq!(
            original.node(start).expect("node").position(),
            restored.node(restored_start).expect("node").position()
        );
        assert_eq!(
            original.node(end).expect("node").position(),
            restored.node(restored_end).expect("node").position()
        );

        assert_eq!(left.axis(), right.axis());
        assert_eq!(left.height(), right.height());
        assert_eq!(left.width(), right.width());
        assert_eq!(left.reference_width(), right.reference_width());
        assert_eq!(left.is_fabricated(), right.is_fabricated());
        assert_eq!(left.is_new(), right.is_new());
        assert_eq!(left.cut_polyline().points(), right.cut_polyline().points());
    }
}

#[test]
fn uncut_truss_round_trips_through_json() {
    let (truss, _) = build_braced_frame();
    let json = truss.to_json_string().expect("serializable");
    let restored = Truss::from_json_str(&json).expect("valid document");
    assert_same_truss(&truss, &restored);
}

#[test]
fn cut_and_fabricated_profiles_round_trip_exactly() {
    let (mut truss, brace) = build_braced_frame();
    let report = truss.cut_all_beams();
    assert!(report.is_complete(), "errors: {:?}", report.errors);
    truss.mark_fabricated(brace).expect("beam exists");

    let json = truss.to_json_string().expect("serializable");
    let mut restored = Truss::from_json_str(&json).expect("valid document");
    assert_same_truss(&truss, &restored);

    // The fabricated brace survives a recut of the restored truss untouched.
    let frozen = truss.beam(brace).expect("brace").cut_polyline().points().to_vec();
    restored.cut_all_beams();
    let (restored_brace, _) = restored
        .beams()
        .find(|(_, beam)| beam.is_fabricated())
        .expect("fabricated brace");
    assert_eq!(
        restored
            .beam(restored_brace)
            .expect("brace")
            .cut_polyline()
            .points(),
        frozen.as_slice()
    );
}

#[test]
fn save_and_load_through_a_file() {
    let (mut truss, _) = build_braced_frame();
    truss.cut_all_beams();
    truss.finish_fabrication_round();

    let path = temp_path("save-load");
    truss.save(&path).expect("temp dir is writable");
    let restored = Truss::load(&path).expect("file was just written");
    std::fs::remove_file(&path).expect("file exists");

    assert_same_truss(&truss, &restored);
    assert!(restored.beams().all(|(_, beam)| beam.is_fabricated()));
}

#[test]
fn missing_file_is_an_io_error() {
    let path = temp_path("does-not-exist");
    let error = Truss::load(&path).expect_err("nothing to read");
    assert!(matches!(error, PersistenceError::Io { .. }), "{error:?}");
}

#[test]
fn malformed_json_is_rejected() {
    let error = Truss::from_json_str("{ \"nodes\": [ }").expect_err("not JSON");
    assert!(matches!(error, PersistenceError::Json(_)), "{error:?}");
}

#[test]
fn dangling_node_reference_is_rejected() {
    let text = r#"{
      "nodes": [ { "id": 0, "position": [0.0, 0.0, 0.0] } ],
      "beams": [
        { "id": 7, "start_node": 0, "end_node": 3,
          "axis": { "from": [0.0, 0.0, 0.0], "to": [1.0, 0.0, 0.0] },
          "height": 0.2, "width": 0.1 }
      ]
    }"#;
    let error = Truss::from_json_str(text).expect_err("node 3 is missing");
    assert!(
        matches!(error, PersistenceError::UnknownNode { beam: 7, node: 3 }),
        "{error:?}"
    );
}

#[test]
fn axis_away_from_its_nodes_is_rejected() {
    let text = r#"{
      "nodes": [
        { "id": 0, "position": [0.0, 0.0, 0.0] },
        { "id": 1, "position": [5.0, 5.0, 0.0] }
      ],
      "beams": [
        { "id": 0, "start_node": 0, "end_node": 1,
          "axis": { "from": [20.0, 20.0, 0.0], "to": [21.0, 20.0, 0.0] },
          "height": 0.2, "width": 0.1 }
      ]
    }"#;
    let error = Truss::from_json_str(text).expect_err("axis is nowhere near its nodes");
    assert!(
        matches!(error, PersistenceError::AxisOffNode { beam: 0, node: 0 }),
        "{error:?}"
    );
}

#[test]
fn open_cut_profile_is_rejected() {
    let text = r#"{
      "nodes": [
        { "id": 0, "position": [0.0, 0.0, 0.0] },
        { "id": 1, "position": [4.0, 0.0, 0.0] }
      ],
      "beams": [
        { "id": 0, "start_node": 0, "end_node": 1,
          "axis": { "from": [0.0, 0.0, 0.0], "to": [4.0, 0.0, 0.0] },
          "height": 0.2, "width": 0.1, "fabricated": true,
          "cut_polyline": [
            [0.0, -0.05, 0.0], [0.0, 0.05, 0.0], [4.0, 0.05, 0.0], [4.0, -0.05, 0.0]
          ] }
      ]
    }"#;
    let error = Truss::from_json_str(text).expect_err("profile is not closed");
    assert!(
        matches!(error, PersistenceError::InvalidProfile { beam: 0, points: 4 }),
        "{error:?}"
    );
}
