//! Topological Planner: turns a flow's block instances and connections into
//! an ordered sequence of layers, using Kahn's algorithm. Blocks within a
//! layer have no dependency on one another and may run concurrently; each
//! layer waits for the previous one to finish.

use std::collections::HashMap;

use flow_domain::Flow;

use crate::errors::EngineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub layers: Vec<Vec<String>>,
}

impl ExecutionPlan {
    pub fn block_count(&self) -> usize {
        self.layers.iter().map(|l| l.len()).sum()
    }
}

/// Builds the layered execution plan for `flow`, or reports the block
/// instance ids that remain unresolved once no more in-degree-zero nodes
/// are left — a cycle.
pub fn plan(flow: &Flow) -> Result<ExecutionPlan, EngineError> {
    let mut in_degree: HashMap<&str, usize> = flow.blocks.iter().map(|b| (b.id.as_str(), 0)).collect();
    let mut adjacency: HashMap<&str, Vec<&str>> = flow.blocks.iter().map(|b| (b.id.as_str(), Vec::new())).collect();

    for conn in &flow.connections {
        adjacency.entry(conn.from_block_instance_id.as_str()).or_default().push(conn.to_block_instance_id.as_str());
        *in_degree.entry(conn.to_block_instance_id.as_str()).or_insert(0) += 1;
    }

    // Deterministic ordering within a layer: sort by declaration order in
    // `flow.blocks` rather than HashMap iteration order.
    let declared_order: HashMap<&str, usize> = flow.blocks.iter().enumerate().map(|(i, b)| (b.id.as_str(), i)).collect();
    let mut frontier: Vec<&str> = in_degree.iter().filter(|(_, &deg)| deg == 0).map(|(id, _)| *id).collect();
    frontier.sort_by_key(|id| declared_order[id]);

    let mut layers = Vec::new();
    let mut remaining = in_degree.clone();
    let mut visited = 0usize;

    let mut current = frontier;
    while !current.is_empty() {
        layers.push(current.iter().map(|s| s.to_string()).collect::<Vec<_>>());
        visited += current.len();

        let mut next = Vec::new();
        for &node in &current {
            for &succ in adjacency.get(node).into_iter().flatten() {
                let deg = remaining.get_mut(succ).expect("successor must be a known block instance");
                *deg -= 1;
                if *deg == 0 {
                    next.push(succ);
                }
            }
        }
        next.sort_by_key(|id| declared_order[id]);
        next.dedup();
        current = next;
    }

    if visited != flow.blocks.len() {
        let unresolved: Vec<String> = remaining.into_iter()
                                                .filter(|(_, deg)| *deg > 0)
                                                .map(|(id, _)| id.to_string())
                                                .collect();
        return Err(EngineError::CycleDetected(unresolved));
    }

    Ok(ExecutionPlan { layers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_domain::{BlockInstance, Connection, Flow, FlowConfig, FlowStatus};
    use uuid::Uuid;

    fn block(id: &str) -> BlockInstance {
        BlockInstance { id: id.to_string(), block_def_id: Uuid::new_v4(), input_mappings: vec![], config: None, position: None }
    }

    fn flow_with(blocks: Vec<BlockInstance>, connections: Vec<Connection>) -> Flow {
        Flow { id: Uuid::new_v4(),
               slug: "t".into(),
               version: 1,
               status: FlowStatus::Published,
               inputs: vec![],
               outputs: vec![],
               blocks,
               connections,
               config: FlowConfig::default(),
               published_at: None }
    }

    #[test]
    fn linear_chain_produces_one_block_per_layer() {
        let f = flow_with(vec![block("a"), block("b"), block("c")],
                           vec![Connection { id: "c1".into(), from_block_instance_id: "a".into(), to_block_instance_id: "b".into(), condition: None },
                                Connection { id: "c2".into(), from_block_instance_id: "b".into(), to_block_instance_id: "c".into(), condition: None }]);
        let p = plan(&f).unwrap();
        assert_eq!(p.layers, vec![vec!["a".to_string()], vec!["b".to_string()], vec!["c".to_string()]]);
    }

    #[test]
    fn independent_blocks_share_a_layer() {
        let f = flow_with(vec![block("a"), block("b")], vec![]);
        let p = plan(&f).unwrap();
        assert_eq!(p.layers.len(), 1);
        assert_eq!(p.layers[0].len(), 2);
    }

    #[test]
    fn cycle_is_detected() {
        let f = flow_with(vec![block("a"), block("b")],
                           vec![Connection { id: "c1".into(), from_block_instance_id: "a".into(), to_block_instance_id: "b".into(), condition: None },
                                Connection { id: "c2".into(), from_block_instance_id: "b".into(), to_block_instance_id: "a".into(), condition: None }]);
        let err = plan(&f).unwrap_err();
        assert!(matches!(err, EngineError::CycleDetected(_)));
    }
}
