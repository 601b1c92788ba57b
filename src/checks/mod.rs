//! Collaborator checks and the chain registry.
//!
//! Each submodule contributes thin checks over one external CLI; chains are
//! assembled here in their declared execution order.

pub mod config;
pub mod keys;
pub mod network;
pub mod pipeline;
pub mod store;
pub mod tools;

use crate::core::orchestrator::Chain;

/// Chains run by `labctl check`: diagnostics only, no mutations.
pub fn validation_chains() -> Vec<Chain> {
    vec![
        Chain::new("smoke", {
            let mut checks = tools::checks();
            checks.push(store::session_check());
            checks
        }),
        Chain::new("preflight", {
            let mut checks = config::checks();
            checks.push(store::vault_check());
            checks.extend(network::checks());
            checks.extend(keys::checks());
            checks
        }),
    ]
}

/// Chains run by `labctl up`: validation first, then the mutating pipeline.
pub fn orchestration_chains() -> Vec<Chain> {
    let mut chains = validation_chains();
    chains.push(Chain::new(
        "provision",
        vec![pipeline::tofu_plan(), pipeline::tofu_apply()],
    ));
    chains.push(Chain::new("configure", vec![pipeline::ansible_configure()]));
    chains.push(Chain::new("workloads", vec![pipeline::kubectl_workloads()]));
    chains
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_chain_order_is_declared() {
        let names: Vec<String> = orchestration_chains()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(
            names,
            ["smoke", "preflight", "provision", "configure", "workloads"]
        );
    }

    #[test]
    fn test_check_ids_unique_within_each_chain() {
        for chain in orchestration_chains() {
            let mut seen = HashSet::new();
            for check in &chain.checks {
                assert!(
                    seen.insert(check.id.clone()),
                    "duplicate check id '{}' in chain '{}'",
                    check.id,
                    chain.name
                );
            }
        }
    }

    #[test]
    fn test_every_check_carries_at_least_one_tag_or_pipeline_stage() {
        for chain in orchestration_chains() {
            for check in &chain.checks {
                assert!(
                    !check.tags.is_empty(),
                    "check '{}' has no tags",
                    check.id
                );
            }
        }
    }
}
