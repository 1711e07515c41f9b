//! Diesel schema (hand-written; regenerate with `diesel print-schema` once a
//! live database is available).
//!
//! Tables (document store): `flows` and
//! `blocks` hold the published definitions the engine reads through
//! `flow-cache`; `execution_logs` is the append-only sink `LogSink` drains
//! into. All three store their payload as a single `document` JSONB column
//! rather than a fully normalized shape, matching the document-store framing
//! of the durable store contract.

diesel::table! {
    flows (id) {
        id -> Uuid,
        slug -> Text,
        version -> BigInt,
        status -> Text,
        document -> Jsonb,
        published_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    blocks (id) {
        id -> Uuid,
        document -> Jsonb,
    }
}

diesel::table! {
    execution_logs (id) {
        id -> Uuid,
        flow_slug -> Text,
        flow_version -> BigInt,
        status -> Text,
        document -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(flows, blocks, execution_logs,);
