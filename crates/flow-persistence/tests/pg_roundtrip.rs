//! Exercises the real Postgres-backed `DurableStore` end to end. Skipped
//! unless `DATABASE_URL` points at a live instance — there is no in-process
//! fake for Diesel's connection type, so this can't run as a unit test.

use flow_core::store::DurableStore;
use flow_domain::{BlockDefinition, BlockSource, BlockType, FlowConfig, FlowStatus, HttpMethod};
use flow_persistence::pg::{build_pool, PoolProvider};
use flow_persistence::PgStore;
use uuid::Uuid;

fn sample_flow(slug: &str) -> flow_domain::Flow {
    flow_domain::Flow {
        id: Uuid::new_v4(),
        slug: slug.to_string(),
        version: 1,
        status: FlowStatus::Published,
        inputs: vec![],
        outputs: vec![],
        blocks: vec![],
        connections: vec![],
        config: FlowConfig::default(),
        published_at: None,
    }
}

fn sample_block() -> BlockDefinition {
    BlockDefinition {
        id: Uuid::new_v4(),
        name: "echo".into(),
        block_type: BlockType::ApiCall,
        source: BlockSource { operation_id: "op".into(), path: "/echo".into(), method: HttpMethod::Get, server_url: None },
        inputs: vec![],
        outputs: vec![],
    }
}

#[tokio::test]
async fn roundtrips_a_flow_and_a_block() {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("skip (no DATABASE_URL)");
        return;
    };
    let pool = build_pool(&url, 1, 2).expect("pool");
    let store = PgStore::new(PoolProvider { pool });

    let flow = sample_flow("pg-roundtrip");
    store.upsert_flow(&flow).expect("upsert flow");
    let found = store.find_flow_by_slug("pg-roundtrip").await.expect("lookup").expect("present");
    assert_eq!(found.id, flow.id);

    let block = sample_block();
    store.upsert_block(&block).expect("upsert block");
    let found_block = store.find_block(block.id).await.expect("lookup").expect("present");
    assert_eq!(found_block.name, "echo");
}
