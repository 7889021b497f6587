use livegraph::graph::{
    ExpectedType, GraphError, Key, ObjectDecl, PropertyKind, PropertyValue, Resolved, SchemaGraph,
    PROPERTIES_EDGE, VALUES_EDGE,
};
use livegraph::{FieldMatcher, GraphConfig};
use regex::Regex;
use serde_json::{json, Value};

const FIXTURE: &str = include_str!("../fixtures/documents.json");

fn fixture() -> SchemaGraph {
    let document: Value = serde_json::from_str(FIXTURE).unwrap();
    SchemaGraph::from_json(&document, GraphConfig::default()).unwrap()
}

#[test]
fn test_valid_construction() {
    let graph = fixture();
    let types = graph.types();
    assert_eq!(types.len(), 3);
    assert_eq!(
        types.keys().cloned().collect::<Vec<_>>(),
        vec![Key::from("type:document"), Key::from("type:entity"), Key::from("type:mention")]
    );
    assert_eq!(graph.objects().len(), 11);
}

#[test]
fn test_type_and_property_inspection() {
    let graph = fixture();
    let document_type = graph.get_type("type:document").unwrap();
    assert_eq!(document_type.name(), Some("Document"));
    assert_eq!(document_type.all(PROPERTIES_EDGE).len(), 4);

    let entities = document_type.get_edge(PROPERTIES_EDGE, "entities").unwrap();
    assert_eq!(entities.name(), Some("Associated Entities"));
    assert_eq!(
        entities.expected_type(),
        Some(&ExpectedType::Object("type:entity".to_string()))
    );
    assert_eq!(entities.property_kind(), Some(PropertyKind::MultiObject));
}

#[test]
fn test_unique_value_access() {
    let graph = fixture();
    let protovis = graph.get_object("/doc/protovis_introduction").unwrap();

    assert_eq!(protovis.get("page_count").unwrap().as_value(), Some(&PropertyValue::Integer(8)));
    assert_eq!(protovis.get("title").unwrap().as_value().unwrap(), &"Protovis");
    assert_eq!(protovis.value("page_count"), Some(PropertyValue::Integer(8)));
}

#[test]
fn test_multi_value_access() {
    let graph = fixture();
    let authors = graph.get("/doc/protovis_introduction", "authors").unwrap();
    let authors = authors.as_values().unwrap();

    assert_eq!(authors.len(), 2);
    assert_eq!(authors.at(0).unwrap(), &"Michael Bostock");
    assert_eq!(authors.at(1).unwrap(), &"Jeffrey Heer");
}

#[test]
fn test_unique_object_access() {
    let graph = fixture();
    let mention = graph.get_object("M0000003").unwrap();

    let entity = mention.get("entity").unwrap().as_node().unwrap();
    assert_eq!(entity.key(), "/location/new_york");
    assert_eq!(mention.first("entity").unwrap(), entity);
}

#[test]
fn test_multi_object_access() {
    let graph = fixture();
    let protovis = graph.get_object("/doc/protovis_introduction").unwrap();

    let entities = protovis.get("entities").unwrap().into_nodes().unwrap();
    assert_eq!(entities.len(), 2);
    assert_eq!(entities.at(0).unwrap().key(), "/location/stanford");
    assert_eq!(entities.at(1).unwrap().key(), "/location/new_york");
    assert_eq!(protovis.all("entities").len(), 2);
}

#[test]
fn test_shared_references_are_identical() {
    let graph = fixture();
    let mention = graph.get_object("M0000003").unwrap();
    let other = graph.get_object("M0000002").unwrap();
    assert_eq!(mention.first("entity").unwrap(), other.first("entity").unwrap());
}

#[test]
fn test_multi_hop_traversal() {
    let graph = fixture();
    let protovis = graph.get_object("/doc/protovis_introduction").unwrap();

    let new_york = protovis.get("entities").unwrap().into_nodes().unwrap();
    let mentions = new_york.at(1).unwrap().get("mentions").unwrap().into_nodes().unwrap();
    let mention = mentions.at(1).unwrap();
    assert_eq!(mention.key(), "M0000003");

    let document = mention.get("document").unwrap().as_node().unwrap();
    assert_eq!(document.key(), "/doc/processing_js_introduction");
}

#[test]
fn test_select_objects() {
    let graph = fixture();
    let pattern = Regex::new("or").unwrap();

    let cities = graph.select(|object, _| {
        object
            .value("name")
            .and_then(|name| name.as_string().map(|name| pattern.is_match(name)))
            .unwrap_or(false)
    });

    assert_eq!(cities.len(), 3);
    assert!(cities.get("/location/new_york").is_some());
    assert!(cities.get("/location/toronto").is_some());
    assert!(cities.get("/location/stanford").is_some());
    assert!(cities.get("/location/berlin").is_none());
}

#[test]
fn test_value_identity() {
    let graph = fixture();
    let unveil = graph.get_object("/doc/unveil_introduction").unwrap();
    let processing = graph.get_object("/doc/processing_js_introduction").unwrap();

    let shared = unveil.all("authors");
    assert_eq!(shared.at(0).unwrap(), processing.all("authors").at(2).unwrap());
    assert_eq!(unveil.values("authors").at(0).unwrap(), &"Michael Aufreiter");

    let authors = graph
        .get_type("type:document")
        .unwrap()
        .get_edge(PROPERTIES_EDGE, "authors")
        .unwrap();
    assert_eq!(authors.all(VALUES_EDGE).len(), 6);
}

#[test]
fn test_interned_change_visible_everywhere() {
    let mut graph = fixture();
    let leaf = graph
        .get_object("/doc/unveil_introduction")
        .unwrap()
        .get_edge("authors", "Michael Aufreiter")
        .unwrap()
        .id();

    graph.set_literal(leaf, "M. Aufreiter".into()).unwrap();

    let authors = graph.get("/doc/processing_js_introduction", "authors").unwrap();
    assert_eq!(authors.as_values().unwrap().at(2).unwrap(), &"M. Aufreiter");
    let unveil = graph.get("/doc/unveil_introduction", "authors").unwrap();
    assert_eq!(unveil.as_values().unwrap().at(0).unwrap(), &"M. Aufreiter");
}

#[test]
fn test_renamed_value_survives_reuse_of_old_text() {
    let mut graph = fixture();
    let leaf = graph
        .get_object("/doc/unveil_introduction")
        .unwrap()
        .get_edge("authors", "Michael Aufreiter")
        .unwrap()
        .id();
    graph.set_literal(leaf, "M. Aufreiter".into()).unwrap();

    graph
        .write(&ObjectDecl::parse_batch(&json!({
            "/doc/n": { "type": "type:document", "authors": ["Michael Aufreiter"] }
        }))
        .unwrap())
        .unwrap();

    let authors = graph
        .get_type("type:document")
        .unwrap()
        .get_edge(PROPERTIES_EDGE, "authors")
        .unwrap();
    let values = authors.values(VALUES_EDGE);
    assert_eq!(values.len(), 7);
    assert_eq!(values.get("M. Aufreiter"), Some(&PropertyValue::from("M. Aufreiter")));
    assert_eq!(values.get("Michael Aufreiter"), Some(&PropertyValue::from("Michael Aufreiter")));

    let unveil = graph.get_object("/doc/unveil_introduction").unwrap();
    assert_eq!(unveil.get_edge("authors", "M. Aufreiter").map(|n| n.id()), Some(leaf));
    let fresh = graph.get_object("/doc/n").unwrap().first("authors").unwrap();
    assert_ne!(fresh.id(), leaf);
}

#[test]
fn test_set_literal_rejects_wrong_value_type() {
    let mut graph = fixture();
    let page_count = graph
        .get_object("/doc/protovis_introduction")
        .unwrap()
        .first("page_count")
        .unwrap()
        .id();

    let err = graph.set_literal(page_count, "eight".into()).unwrap_err();
    assert!(matches!(err, GraphError::InvalidValue { .. }));
    assert_eq!(
        graph.get("/doc/protovis_introduction", "page_count").unwrap().as_value(),
        Some(&PropertyValue::Integer(8))
    );
}

#[test]
fn test_reference_to_wrong_type_is_rejected() {
    let mut graph = fixture();
    let err = graph
        .write(&ObjectDecl::parse_batch(&json!({
            "M9": { "type": "type:mention", "entity": "/doc/protovis_introduction" }
        }))
        .unwrap())
        .unwrap_err();
    assert_eq!(
        err,
        GraphError::TypeConflict {
            id: "/doc/protovis_introduction".to_string(),
            existing: "type:document".to_string(),
            requested: "type:entity".to_string(),
        }
    );
    assert!(graph.get_object("M9").is_none());

    let mut document: Value = serde_json::from_str(FIXTURE).unwrap();
    document["M0000004"]["entity"] = json!("/doc/unveil_introduction");
    assert!(matches!(
        SchemaGraph::from_json(&document, GraphConfig::default()),
        Err(GraphError::TypeConflict { .. })
    ));
}

#[test]
fn test_schema_access_errors() {
    let graph = fixture();
    assert!(matches!(
        graph.get("/doc/protovis_introduction", "isbn"),
        Err(GraphError::UnknownProperty { .. })
    ));
    assert_eq!(
        graph.get("/doc/missing", "title").unwrap_err(),
        GraphError::ObjectNotFound("/doc/missing".to_string())
    );
    // an empty multi-valued property resolves to an empty map
    let berlin = graph.get_object("/location/berlin").unwrap();
    assert!(berlin.get("mentions").unwrap().is_empty());
}

#[test]
fn test_read_with_field_matcher() {
    let graph = fixture();
    let documents = graph
        .read(&json!({ "type": "type:document", "page_count": 8 }), &Value::Null, &FieldMatcher)
        .unwrap();

    assert_eq!(
        documents.keys().cloned().collect::<Vec<_>>(),
        vec![Key::from("/doc/protovis_introduction"), Key::from("/doc/unveil_introduction")]
    );
    let protovis = documents.get("/doc/protovis_introduction").unwrap();
    assert_eq!(
        protovis.property("entities"),
        Some(&json!(["/location/stanford", "/location/new_york"]))
    );
}

#[test]
fn test_write_reuses_interned_values() {
    let mut graph = fixture();
    let before = graph.interned_count();

    let updated = graph
        .write(&ObjectDecl::parse_batch(&json!({
            "/doc/d3": {
                "type": "type:document",
                "title": "D3",
                "authors": ["Michael Bostock", "Jeffrey Heer", "Vadim Ogievetsky"],
                "entities": ["/location/stanford"]
            }
        }))
        .unwrap())
        .unwrap();

    assert_eq!(updated.len(), 1);
    // only the new title and the new author are added
    assert_eq!(graph.interned_count(), before + 2);

    let d3 = graph.get_object("/doc/d3").unwrap();
    let protovis = graph.get_object("/doc/protovis_introduction").unwrap();
    assert_eq!(
        d3.get_edge("authors", "Michael Bostock"),
        protovis.get_edge("authors", "Michael Bostock")
    );
    assert_eq!(
        d3.first("entities").unwrap(),
        protovis.first("entities").unwrap()
    );
    match graph.get("/doc/d3", "authors").unwrap() {
        Resolved::Values(authors) => assert_eq!(authors.len(), 3),
        other => panic!("unexpected {:?}", other),
    }
}
