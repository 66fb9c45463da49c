//! Ordered first-match hostname routing

use std::sync::Arc;

use relay_proxy::{Backend, BackendRegistry};
use tracing::debug;

use super::{RuleSet, RuleTarget};

/// Outcome of resolving a hostname against the rule table
#[derive(Debug, Clone)]
pub enum RouteDecision {
    /// A backend rule matched
    Backend {
        backend: Backend,
        /// Index of the winning rule, for diagnostics
        rule_index: usize,
    },
    /// Only the terminal rule matched
    NoRoute { rule_index: usize },
}

/// Resolves request hostnames to backends over a read-only rule table
pub struct IngressRouter {
    rules: RuleSet,
    registry: Arc<BackendRegistry>,
}

impl IngressRouter {
    pub fn new(rules: RuleSet, registry: Arc<BackendRegistry>) -> Self {
        Self { rules, registry }
    }

    /// Resolve a normalized hostname to a backend
    ///
    /// Rules are evaluated strictly in declaration order and evaluation
    /// stops at the first match. The terminal catch-all guarantees a
    /// decision, and a no-route decision is terminal for the request,
    /// never a transient failure.
    pub fn resolve(&self, hostname: &str) -> RouteDecision {
        for (idx, rule) in self.rules.rules().iter().enumerate() {
            if !rule.pattern.matches(hostname) {
                continue;
            }

            return match &rule.target {
                RuleTarget::Backend(name) => match self.registry.get(name) {
                    Some(backend) => {
                        debug!("Resolved {} -> {} (rule {})", hostname, backend.name, idx);
                        RouteDecision::Backend {
                            backend: backend.clone(),
                            rule_index: idx,
                        }
                    }
                    // Rule targets are validated at load time; an absent
                    // backend here still degrades to no-route.
                    None => RouteDecision::NoRoute { rule_index: idx },
                },
                RuleTarget::NotFound => {
                    debug!("No ingress rule for {}", hostname);
                    RouteDecision::NoRoute { rule_index: idx }
                }
            };
        }

        // Unreachable while the rule set invariant holds.
        RouteDecision::NoRoute {
            rule_index: self.rules.rules().len(),
        }
    }

    /// The loaded rule table
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingress::{HostPattern, IngressRule};
    use relay_proxy::Backend;

    fn backend(name: &str, port: u16) -> Backend {
        Backend {
            name: name.to_string(),
            address: "127.0.0.1".to_string(),
            port,
            liveness_path: "/health".to_string(),
        }
    }

    fn rule(hostname: &str, target: &str) -> IngressRule {
        IngressRule {
            pattern: HostPattern::parse(hostname),
            target: RuleTarget::Backend(target.to_string()),
        }
    }

    fn router(rules: Vec<IngressRule>) -> IngressRouter {
        let registry = Arc::new(
            BackendRegistry::new(vec![backend("app1", 3000), backend("app2", 5000)]).unwrap(),
        );
        let rules = RuleSet::load(rules, &registry).unwrap();
        IngressRouter::new(rules, registry)
    }

    #[test]
    fn exact_hostnames_resolve_to_their_backends() {
        let router = router(vec![
            rule("app1.example.com", "app1"),
            rule("app2.example.com", "app2"),
        ]);

        match router.resolve("app1.example.com") {
            RouteDecision::Backend { backend, rule_index } => {
                assert_eq!(backend.name, "app1");
                assert_eq!(rule_index, 0);
            }
            other => panic!("expected backend decision, got {:?}", other),
        }

        match router.resolve("app2.example.com") {
            RouteDecision::Backend { backend, rule_index } => {
                assert_eq!(backend.name, "app2");
                assert_eq!(rule_index, 1);
            }
            other => panic!("expected backend decision, got {:?}", other),
        }
    }

    #[test]
    fn unmatched_hostnames_fall_through_to_the_terminal_rule() {
        let router = router(vec![
            rule("app1.example.com", "app1"),
            rule("app2.example.com", "app2"),
        ]);

        match router.resolve("unknown.example.com") {
            RouteDecision::NoRoute { rule_index } => assert_eq!(rule_index, 2),
            other => panic!("expected no route, got {:?}", other),
        }
    }

    #[test]
    fn subdomains_do_not_match_exact_patterns() {
        let router = router(vec![rule("example.com", "app1")]);

        assert!(matches!(
            router.resolve("sub.example.com"),
            RouteDecision::NoRoute { .. }
        ));
    }

    #[test]
    fn first_match_wins_for_duplicate_patterns() {
        let router = router(vec![
            rule("app.example.com", "app1"),
            rule("app.example.com", "app2"),
        ]);

        match router.resolve("app.example.com") {
            RouteDecision::Backend { backend, rule_index } => {
                assert_eq!(backend.name, "app1");
                // The second rule is never reached.
                assert_eq!(rule_index, 0);
            }
            other => panic!("expected backend decision, got {:?}", other),
        }
    }

    #[test]
    fn empty_rule_table_rejects_every_hostname() {
        let router = router(vec![]);

        assert!(matches!(
            router.resolve("app1.example.com"),
            RouteDecision::NoRoute { rule_index: 0 }
        ));
    }
}
