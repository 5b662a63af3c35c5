use model_lineage::model::{DependencyRecord, RelationshipRecord};
use model_lineage::{
    Diagnostics, Edge, EdgeDirection, EdgeKind, Engine, EngineConfig, HighlightMode,
    IngestionError, ModelGraph, Node, NodeKind, OpacityTiers, RawRecords, Selection,
    StructuralError, Tree, parse_records,
};

fn node(id: &str, parent: Option<&str>, kind: NodeKind, container: Option<&str>) -> Node {
    Node {
        id: id.into(),
        name: id.rsplit('.').next().unwrap_or(id).into(),
        parent_id: parent.map(str::to_owned),
        kind,
        container: container.map(str::to_owned),
    }
}

fn scenario_a_graph() -> ModelGraph {
    ModelGraph::new(
        "Model",
        vec![
            node("Model", None, NodeKind::Root, None),
            node("Model.Sales", Some("Model"), NodeKind::Container, None),
            node(
                "Model.Sales.Amount",
                Some("Model.Sales"),
                NodeKind::Column,
                Some("Sales"),
            ),
            node("Model.Date", Some("Model"), NodeKind::Container, None),
            node(
                "Model.Date.OrderDate",
                Some("Model.Date"),
                NodeKind::Column,
                Some("Date"),
            ),
        ],
        vec![Edge {
            source_id: "Model.Sales.Amount".into(),
            target_id: "Model.Date.OrderDate".into(),
            kind: EdgeKind::Relationship,
            relationship: None,
        }],
    )
}

fn relationship_row(id: &str, container: &str, object: &str) -> RelationshipRecord {
    RelationshipRecord {
        relationship_id: id.into(),
        ref_container: container.into(),
        ref_object: object.into(),
        is_active: true,
        ..RelationshipRecord::default()
    }
}

fn mixed_records() -> RawRecords {
    RawRecords {
        dependencies: vec![DependencyRecord {
            container: "Sales".into(),
            object: "Total Sales".into(),
            kind: "MEASURE".into(),
            ref_container: Some("Sales".into()),
            ref_object: Some("Amount".into()),
            ref_kind: Some("COLUMN".into()),
        }],
        relationships: vec![
            relationship_row("r1", "Sales", "OrderDate"),
            relationship_row("r1", "Date", "Date"),
        ],
    }
}

#[test]
fn scenario_a_path_climbs_to_root_between_containers() {
    let graph = scenario_a_graph();
    let tree = Tree::build(&graph.nodes).unwrap();

    assert_eq!(tree.children_of("Model").len(), 2);
    assert_eq!(
        tree.lowest_common_ancestor("Model.Sales.Amount", "Model.Date.OrderDate"),
        Some("Model")
    );

    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    engine.load_graph(graph, Diagnostics::default()).unwrap();
    engine.set_tension(1.0).unwrap();

    let tree = engine.tree().unwrap();
    let path = engine.bundles().unwrap().path_ids(tree, 0).unwrap();
    assert_eq!(
        path,
        vec![
            "Model.Sales.Amount",
            "Model.Sales",
            "Model",
            "Model.Date",
            "Model.Date.OrderDate",
        ]
    );

    let dataset = engine.dataset().unwrap();
    assert_eq!(dataset.edges.len(), 1);
    assert_eq!(dataset.edges[0].control_points.len(), 5);
}

#[test]
fn scenario_b_kind_filter_dims_other_kinds_and_rejects_their_rows() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    engine.ingest(&mixed_records()).unwrap();
    engine.set_category_selection(
        Selection::only([EdgeKind::Relationship]),
        Selection::All,
        Selection::All,
    );

    let tiers = OpacityTiers::default();
    let dataset = engine.dataset().unwrap();
    assert_eq!(dataset.mode, HighlightMode::Category);

    let measure_edge = dataset
        .edges
        .iter()
        .find(|edge| edge.kind == EdgeKind::MeasureDependency)
        .unwrap();
    assert_eq!(measure_edge.opacity, tiers.faint);
    let relationship_edge = dataset
        .edges
        .iter()
        .find(|edge| edge.kind == EdgeKind::Relationship)
        .unwrap();
    assert_eq!(relationship_edge.opacity, tiers.medium);

    let predicate = engine.detail_predicate().unwrap();
    assert!(!predicate.matches(
        "Model.Sales.Total Sales",
        "Model.Sales.Amount",
        EdgeKind::MeasureDependency,
        Some("Sales"),
        Some("Sales"),
    ));

    let rows = engine.matching_detail_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, EdgeKind::Relationship);
}

#[test]
fn scenario_c_one_malformed_group_does_not_sink_the_rest() {
    let mut relationships = Vec::new();
    for i in 0..99 {
        let id = format!("rel-{i}");
        relationships.push(relationship_row(&id, "Fact", &format!("Key{i}")));
        relationships.push(relationship_row(&id, &format!("Dim{i}"), "Key"));
    }
    for container in ["A", "B", "C"] {
        relationships.push(relationship_row("rel-broken", container, "Key"));
    }

    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    engine
        .ingest(&RawRecords {
            dependencies: Vec::new(),
            relationships,
        })
        .unwrap();

    let graph = engine.graph().unwrap();
    assert_eq!(graph.edge_count(), 99);
    for edge in &graph.edges {
        assert!(graph.contains(&edge.source_id));
        assert!(graph.contains(&edge.target_id));
    }

    let diagnostics = engine.diagnostics();
    assert_eq!(diagnostics.error_count(), 1);
    assert_eq!(
        diagnostics.ingestion,
        vec![IngestionError::MalformedRelationship {
            relationship_id: "rel-broken".into(),
            rows: 3,
        }]
    );
    assert_eq!(engine.dataset().unwrap().edges.len(), 99);
}

#[test]
fn hover_overrides_category_filter_and_clearing_reverts() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    engine.ingest(&mixed_records()).unwrap();
    engine.set_category_selection(
        Selection::only([EdgeKind::Relationship]),
        Selection::All,
        Selection::All,
    );
    let category_only = engine.dataset().unwrap();

    engine.set_hover(Some("Model.Sales.Amount"));
    let hovered = engine.dataset().unwrap();
    let tiers = OpacityTiers::default();
    assert_eq!(hovered.mode, HighlightMode::Hover);

    let measure_edge = hovered
        .edges
        .iter()
        .find(|edge| edge.kind == EdgeKind::MeasureDependency)
        .unwrap();
    assert_eq!(measure_edge.opacity, tiers.full);
    assert_eq!(measure_edge.direction, EdgeDirection::Inbound);

    let unrelated = hovered
        .nodes
        .iter()
        .find(|node| node.id == "Model.Date.Date")
        .unwrap();
    assert_eq!(unrelated.opacity, tiers.dimmed);

    // Hover never touches the detail rows.
    assert_eq!(engine.matching_detail_rows().len(), 1);

    engine.set_hover(None);
    assert_eq!(engine.dataset().unwrap(), category_only);
}

#[test]
fn structural_failure_surfaces_stale_snapshot() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    engine.load_graph(scenario_a_graph(), Diagnostics::default()).unwrap();

    let mut cyclic = scenario_a_graph();
    cyclic.nodes[1].parent_id = Some("Model.Sales.Amount".into());
    let cyclic = ModelGraph::new("Model", cyclic.nodes, cyclic.edges);

    let error = engine
        .load_graph(cyclic, Diagnostics::default())
        .unwrap_err();
    assert!(matches!(error, StructuralError::Cycle { .. }));

    let dataset = engine.dataset().unwrap();
    assert!(dataset.stale);
    assert_eq!(dataset.tree_version, 1);
    assert_eq!(dataset.edges.len(), 1);
    assert!(dataset.diagnostics.stale.is_some());
    assert_eq!(dataset.diagnostics.error_count(), 1);
}

#[test]
fn hover_and_filters_never_rebuild_bundles() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    engine.ingest(&mixed_records()).unwrap();
    let before = engine.dataset().unwrap();

    for id in ["Model.Sales.Amount", "Model.Date.Date", "Model.Sales.Total Sales"] {
        engine.set_hover(Some(id));
        engine.dataset();
    }
    engine.set_category_selection(
        Selection::All,
        Selection::only(["Date".to_owned()]),
        Selection::All,
    );
    engine.set_hover(None);
    let after = engine.dataset().unwrap();

    assert_eq!(engine.bundle_build_counts(), Some((1, 1)));
    for (a, b) in before.edges.iter().zip(&after.edges) {
        assert_eq!(a.control_points, b.control_points);
    }

    engine.set_tension(0.0).unwrap();
    assert_eq!(engine.bundle_build_counts(), Some((1, 2)));
    let straight = engine.dataset().unwrap();
    assert!(straight.edges.iter().all(|edge| edge.control_points.len() == 2));
}

#[test]
fn record_file_round_trips_through_the_engine() {
    let raw = r#"{
        "dependencies": [
            {"container": "Sales", "object": "Margin", "kind": "CALC_COLUMN",
             "refContainer": "Sales", "refObject": "Cost", "refKind": "COLUMN"},
            {"container": "LocalDateTable_1234", "object": "Date", "kind": "COLUMN"}
        ],
        "relationships": [
            {"relationshipId": "r9", "refContainer": "Sales", "refObject": "ProductKey",
             "isActive": false, "crossFilterBehavior": "OneDirection"},
            {"relationshipId": "r9", "refContainer": "Product", "refObject": "ProductKey"}
        ]
    }"#;
    let records = parse_records(raw).unwrap();

    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    engine.ingest(&records).unwrap();

    let diagnostics = engine.diagnostics();
    assert_eq!(diagnostics.denylisted, 1);
    assert!(diagnostics.is_clean());

    let graph = engine.graph().unwrap();
    assert!(!graph.contains("Model.LocalDateTable_1234"));
    assert_eq!(
        graph.kind_counts().get(&EdgeKind::CalculatedColumnDependency),
        Some(&1)
    );

    let rows = engine.detail_rows();
    let relationship = rows
        .iter()
        .find(|row| row.kind == EdgeKind::Relationship)
        .and_then(|row| row.relationship.as_ref())
        .unwrap();
    assert!(!relationship.is_active);
    assert_eq!(
        relationship.cross_filter_behavior.as_deref(),
        Some("OneDirection")
    );

    let hits = engine.search("productkey", 5);
    assert_eq!(hits.len(), 2);
}
