//! Hostname-based ingress rules
//!
//! An ordered list of hostname-to-backend bindings closed off by a single
//! terminal catch-all. The table mirrors the external tunnel ingress
//! configuration and is consumed as data, immutable after load.

mod router;

pub use router::{IngressRouter, RouteDecision};

use relay_proxy::BackendRegistry;
use tracing::warn;

use crate::error::CoreError;

/// Hostname pattern for a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPattern {
    /// Matches one hostname exactly
    Exact(String),
    /// Matches every hostname; only the terminal rule carries this
    CatchAll,
}

impl HostPattern {
    /// Parse a configured pattern; `*` is the catch-all sentinel
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw == "*" {
            HostPattern::CatchAll
        } else {
            HostPattern::Exact(raw.to_ascii_lowercase())
        }
    }

    pub fn matches(&self, hostname: &str) -> bool {
        match self {
            HostPattern::Exact(host) => host == hostname,
            HostPattern::CatchAll => true,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HostPattern::Exact(host) => host,
            HostPattern::CatchAll => "*",
        }
    }
}

/// Where a matched rule sends the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTarget {
    /// Dispatch to a named backend
    Backend(String),
    /// Terminal: answer with the fixed no-route response
    NotFound,
}

/// One ordered ingress rule
#[derive(Debug, Clone)]
pub struct IngressRule {
    pub pattern: HostPattern,
    pub target: RuleTarget,
}

/// Validated, ordered rule table
///
/// Invariant: exactly one catch-all rule exists, it targets the no-route
/// response, and it is always the last rule evaluated.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<IngressRule>,
}

impl RuleSet {
    /// Build the table from declared rules
    ///
    /// The terminal catch-all is appended here; declaring the catch-all
    /// pattern is rejected. Every rule must name a registered backend.
    /// Duplicate patterns load with a warning, the earlier rule stays
    /// authoritative.
    pub fn load(
        declared: Vec<IngressRule>,
        registry: &BackendRegistry,
    ) -> Result<Self, CoreError> {
        let mut rules: Vec<IngressRule> = Vec::with_capacity(declared.len() + 1);

        for rule in declared {
            if rule.pattern == HostPattern::CatchAll {
                return Err(CoreError::ReservedCatchAll);
            }
            if let RuleTarget::Backend(name) = &rule.target
                && !registry.contains(name)
            {
                return Err(CoreError::UnknownRuleBackend(name.clone()));
            }
            if rules.iter().any(|existing| existing.pattern == rule.pattern) {
                warn!(
                    "Duplicate ingress pattern {}; the earlier rule wins",
                    rule.pattern.as_str()
                );
            }
            rules.push(rule);
        }

        rules.push(IngressRule {
            pattern: HostPattern::CatchAll,
            target: RuleTarget::NotFound,
        });

        Ok(Self { rules })
    }

    /// Rules in evaluation order, terminal included
    pub fn rules(&self) -> &[IngressRule] {
        &self.rules
    }
}

/// Normalize a caller-claimed hostname: lowercase, port suffix stripped
pub fn normalize_host(raw: &str) -> String {
    let raw = raw.trim();

    // Bracketed IPv6 literals keep their colons.
    if let Some(rest) = raw.strip_prefix('[')
        && let Some(end) = rest.find(']')
    {
        return rest[..end].to_ascii_lowercase();
    }

    let host = raw.split(':').next().unwrap_or(raw);
    host.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_proxy::Backend;

    fn registry() -> BackendRegistry {
        BackendRegistry::new(vec![Backend {
            name: "app1".to_string(),
            address: "127.0.0.1".to_string(),
            port: 3000,
            liveness_path: "/health".to_string(),
        }])
        .unwrap()
    }

    fn rule(hostname: &str, backend: &str) -> IngressRule {
        IngressRule {
            pattern: HostPattern::parse(hostname),
            target: RuleTarget::Backend(backend.to_string()),
        }
    }

    #[test]
    fn terminal_rule_is_appended_last() {
        let rules = RuleSet::load(vec![rule("app1.example.com", "app1")], &registry()).unwrap();

        let last = rules.rules().last().unwrap();
        assert_eq!(last.pattern, HostPattern::CatchAll);
        assert_eq!(last.target, RuleTarget::NotFound);
        assert_eq!(rules.rules().len(), 2);
    }

    #[test]
    fn unknown_backend_in_a_rule_is_rejected() {
        let result = RuleSet::load(vec![rule("app9.example.com", "app9")], &registry());
        assert!(matches!(result, Err(CoreError::UnknownRuleBackend(name)) if name == "app9"));
    }

    #[test]
    fn declared_catch_all_is_rejected() {
        let result = RuleSet::load(vec![rule("*", "app1")], &registry());
        assert!(matches!(result, Err(CoreError::ReservedCatchAll)));
    }

    #[test]
    fn duplicate_patterns_load_with_the_earlier_rule_first() {
        let rules = RuleSet::load(
            vec![rule("app1.example.com", "app1"), rule("app1.example.com", "app1")],
            &registry(),
        )
        .unwrap();

        // Both rules are kept; evaluation order decides the winner.
        assert_eq!(rules.rules().len(), 3);
    }

    #[test]
    fn patterns_are_case_normalized_at_parse() {
        assert_eq!(
            HostPattern::parse("App1.Example.COM"),
            HostPattern::Exact("app1.example.com".to_string())
        );
    }

    #[test]
    fn host_normalization() {
        assert_eq!(normalize_host("App1.Example.com"), "app1.example.com");
        assert_eq!(normalize_host("app1.example.com:8443"), "app1.example.com");
        assert_eq!(normalize_host(" app1.example.com "), "app1.example.com");
        assert_eq!(normalize_host("[::1]:8080"), "::1");
    }
}
