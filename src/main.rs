use std::sync::Arc;

use flow_cache::TtlDefinitionCache;
use flow_core::constants::LOG_SINK_CAPACITY;
use flow_core::store::DurableStore;
use flow_core::{FlowExecutionEngine, LogSink};
use flow_dispatch::ApiCallDispatcher;
use flowbridge::app::{self, AppState};
use flowbridge::config::CONFIG;

/// A minimal `echo` flow, seeded directly into the in-memory store since
/// flow authoring/CRUD is out of scope for this release and there is
/// otherwise no way to populate one.
#[cfg(not(feature = "pg_demo"))]
fn demo_flow_and_block() -> (flow_domain::Flow, flow_domain::BlockDefinition) {
    use flow_domain::mapping::{InputMapping, MappingSource};
    use flow_domain::{
        BlockDefinition, BlockInputSpec, BlockInstance, BlockOutputSpec, BlockSource, BlockType, Flow, FlowConfig, FlowInputDecl,
        FlowOutputDecl, FlowStatus, HttpMethod, InputLocation, InputType,
    };

    let block_def_id = uuid::Uuid::new_v4();

    let block = BlockDefinition {
        id: block_def_id,
        name: "echo-call".to_string(),
        block_type: BlockType::ApiCall,
        source: BlockSource { operation_id: "echo".to_string(), path: "/echo".to_string(), method: HttpMethod::Get, server_url: None },
        inputs: vec![BlockInputSpec { name: "msg".to_string(), location: InputLocation::Query, required: true }],
        outputs: vec![BlockOutputSpec { name: "reply".to_string(), path: "$.args.msg".to_string() }],
    };

    let flow = Flow {
        id: uuid::Uuid::new_v4(),
        slug: "echo".to_string(),
        version: 1,
        status: FlowStatus::Published,
        inputs: vec![FlowInputDecl {
            name: "msg".to_string(),
            type_tag: InputType::String,
            required: true,
            default_value: None,
            location: InputLocation::Query,
        }],
        outputs: vec![FlowOutputDecl { name: "reply".to_string(), source_block_id: "call".to_string(), source_output: "reply".to_string() }],
        blocks: vec![BlockInstance {
            id: "call".to_string(),
            block_def_id,
            input_mappings: vec![InputMapping {
                target_input: "msg".to_string(),
                source: MappingSource::FlowInput { name: "msg".to_string() },
            }],
            config: None,
            position: None,
        }],
        connections: vec![],
        config: FlowConfig::default(),
        published_at: None,
    };

    (flow, block)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    #[cfg(feature = "pg_demo")]
    let store: Arc<dyn DurableStore> = {
        let pool = flow_persistence::build_dev_pool_from_env().expect("build postgres pool");
        Arc::new(flow_persistence::PgStore::new(flow_persistence::pg::PoolProvider { pool }))
    };

    #[cfg(not(feature = "pg_demo"))]
    let store: Arc<dyn DurableStore> = {
        let store = Arc::new(flow_core::store::InMemoryStore::new());
        let (flow, block) = demo_flow_and_block();
        store.put_block(block);
        store.put_flow(flow);
        store
    };

    let cache = Arc::new(TtlDefinitionCache::new(store.clone()));
    let dispatcher = Arc::new(ApiCallDispatcher::new());
    let log_sink = LogSink::new(LOG_SINK_CAPACITY);
    log_sink.clone().spawn_writer(store.clone());
    let engine = Arc::new(FlowExecutionEngine::new(cache, dispatcher, log_sink.clone()));

    let state = AppState { engine, store, log_sink };
    let router = app::router(state);

    let addr = format!("0.0.0.0:{}", CONFIG.http_port);
    tracing::info!(%addr, base_url = %CONFIG.base_url, "flowbridge-server starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
