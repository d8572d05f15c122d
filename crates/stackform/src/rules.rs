//! Security group rule reconciliation
//!
//! Ingress and egress are reconciled under different invariants:
//!
//! - ingress is additive-only: desired rules missing from the live set are
//!   added, and pre-existing extras are left alone
//! - egress is replace-all: when the desired set is non-empty, every live
//!   egress rule is deleted first, then the desired set is created, so
//!   afterwards the live set exactly equals the desired set. Egress rules
//!   have no stable identity to diff against, and a partial sync risks
//!   leaving stale wide-open rules behind.

use crate::error::{EngineError, Result};
use stackform_cloud::{CloudClient, CloudError, Direction, RuleSpec};

/// Substitute the operator-CIDR placeholder in a rule list.
///
/// Happens exactly once, before reconciliation; the diff below only ever
/// sees literal CIDRs.
pub fn resolve_operator_cidr(
    rules: &[RuleSpec],
    operator_cidr: Option<&str>,
) -> Result<Vec<RuleSpec>> {
    rules
        .iter()
        .map(|rule| {
            if rule.wants_operator_cidr() {
                let cidr = operator_cidr.ok_or(EngineError::MissingOperatorCidr)?;
                let mut resolved = rule.clone();
                resolved.cidr = cidr.to_string();
                Ok(resolved)
            } else {
                Ok(rule.clone())
            }
        })
        .collect()
}

/// Add desired ingress rules that are missing from the live set.
pub async fn reconcile_ingress(
    client: &dyn CloudClient,
    group_id: &str,
    desired: &[RuleSpec],
) -> std::result::Result<(), CloudError> {
    let live = client.list_rules(group_id, Direction::Ingress).await?;

    for rule in desired {
        if live.contains(rule) {
            tracing::debug!("rule [{}] already present on {}", rule, group_id);
        } else {
            client.add_rule(group_id, rule).await?;
            tracing::info!("rule [{}] added to {}", rule, group_id);
        }
    }
    Ok(())
}

/// Replace the live egress rule set with the desired one.
///
/// A no-op when the desired set is empty: an empty spec means "leave
/// egress alone", not "remove all egress".
pub async fn reconcile_egress(
    client: &dyn CloudClient,
    group_id: &str,
    desired: &[RuleSpec],
) -> std::result::Result<(), CloudError> {
    if desired.is_empty() {
        return Ok(());
    }

    for rule in client.list_rules(group_id, Direction::Egress).await? {
        client.remove_rule(group_id, &rule).await?;
        tracing::debug!("egress rule [{}] removed from {}", rule, group_id);
    }
    for rule in desired {
        client.add_rule(group_id, rule).await?;
        tracing::info!("egress rule [{}] added to {}", rule, group_id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackform_cloud::OPERATOR_CIDR;

    #[test]
    fn test_resolve_substitutes_placeholder() {
        let rules = vec![
            RuleSpec::ingress("tcp", 22, 22, OPERATOR_CIDR),
            RuleSpec::ingress("tcp", 443, 443, "0.0.0.0/0"),
        ];

        let resolved = resolve_operator_cidr(&rules, Some("198.51.100.7/32")).unwrap();
        assert_eq!(resolved[0].cidr, "198.51.100.7/32");
        assert_eq!(resolved[1].cidr, "0.0.0.0/0");
    }

    #[test]
    fn test_resolve_requires_operator_cidr() {
        let rules = vec![RuleSpec::ingress("tcp", 22, 22, OPERATOR_CIDR)];
        let err = resolve_operator_cidr(&rules, None).unwrap_err();
        assert!(matches!(err, EngineError::MissingOperatorCidr));
    }

    #[test]
    fn test_resolve_without_placeholder_needs_nothing() {
        let rules = vec![RuleSpec::ingress("tcp", 443, 443, "0.0.0.0/0")];
        let resolved = resolve_operator_cidr(&rules, None).unwrap();
        assert_eq!(resolved, rules);
    }
}
