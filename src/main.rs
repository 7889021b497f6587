use livegraph::{
    ChannelBroadcaster, GraphConfig, RequestGateway, Resolved, SchemaGraph, SessionContext,
};
use serde_json::{json, Value};
use std::sync::Arc;

const FIXTURE: &str = include_str!("../fixtures/documents.json");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("Livegraph v{}", livegraph::version());
    println!("==========================================");
    println!();

    let config = match std::env::args().nth(1) {
        Some(path) => GraphConfig::from_file(&path)?,
        None => GraphConfig::default(),
    };
    let document: Value = serde_json::from_str(FIXTURE)?;
    let graph = SchemaGraph::from_json(&document, config)?;

    // Demo 1: Schema graph
    demo_schema_graph(&graph)?;

    // Demo 2: Live queries
    demo_live_queries(graph).await?;

    Ok(())
}

fn demo_schema_graph(graph: &SchemaGraph) -> anyhow::Result<()> {
    println!("=== Demo 1: Schema Graph ===");
    println!("  Types:   {}", graph.types().len());
    println!("  Objects: {}", graph.objects().len());
    println!("  Nodes:   {}", graph.store().node_count());
    println!("  Interned literals: {}", graph.interned_count());

    let protovis = "/doc/protovis_introduction";
    if let Resolved::Values(authors) = graph.get(protovis, "authors")? {
        let names: Vec<String> = authors.values().map(|a| a.to_string()).collect();
        println!("\n{} authors: {}", protovis, names.join(", "));
    }

    let new_york = graph.get("/location/new_york", "mentions")?;
    if let Some(mentions) = new_york.as_nodes() {
        println!("\nNew York is mentioned in:");
        for mention in mentions.values() {
            if let Some(document) = mention.first("document") {
                let title = document
                    .value("title")
                    .map(|title| title.to_string())
                    .unwrap_or_else(|| document.key().to_string());
                println!("  ✓ {}", title);
            }
        }
    }

    let long_reads = graph.select(|object, _| {
        object
            .value("page_count")
            .and_then(|pages| pages.as_integer())
            .is_some_and(|pages| pages > 10)
    });
    println!("\nDocuments over 10 pages: {}", long_reads.len());
    Ok(())
}

async fn demo_live_queries(graph: SchemaGraph) -> anyhow::Result<()> {
    println!("\n=== Demo 2: Live Queries ===");

    let (broadcaster, mut notifications) = ChannelBroadcaster::channel();
    let gateway = RequestGateway::new(graph, Arc::new(broadcaster));
    let session = SessionContext::generate();

    gateway
        .watch("documents", json!({ "type": "type:document" }), &session)
        .await?;
    println!("✓ Watching channel \"documents\" as {}", session.subscriber);

    let updated = gateway
        .write(
            &json!({
                "/doc/livegraph": {
                    "type": "type:document",
                    "title": "Livegraph",
                    "authors": ["Michael Aufreiter"],
                    "entities": ["/location/berlin"]
                }
            }),
            &session,
        )
        .await?;
    println!("✓ Wrote {} objects", updated.len());

    while let Ok(notification) = notifications.try_recv() {
        println!(
            "  → {} received {}",
            notification.channel,
            serde_json::to_string(&notification.nodes)?
        );
    }
    Ok(())
}
