//! Configuration type definitions
//!
//! These types decide how a configuration tree treats conditional blocks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Root configuration for a configuration tree
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TreeConfig {
    /// Which blocks count as conditional, and what is known about them
    #[serde(default)]
    pub activation: ActivationPolicy,
}

/// Activation policy for conditional blocks
///
/// A block whose name is listed in `conditional_blocks` is only considered
/// active when its condition can be proven from the known modules and
/// defines. Everything else is always active.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivationPolicy {
    /// Block names whose activation depends on runtime state
    #[serde(default = "default_conditional_blocks")]
    pub conditional_blocks: Vec<String>,

    /// Modules known to be loaded (`ssl_module`, `mod_ssl.c` or `ssl`)
    #[serde(default)]
    pub loaded_modules: BTreeSet<String>,

    /// Parameters known to be defined (`-D NAME` / `Define NAME`)
    #[serde(default)]
    pub defines: BTreeSet<String>,
}

fn default_conditional_blocks() -> Vec<String> {
    [
        "IfModule",
        "IfDefine",
        "IfVersion",
        "IfFile",
        "IfDirective",
        "IfSection",
        "If",
        "ElseIf",
        "Else",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ActivationPolicy {
    fn default() -> Self {
        Self {
            conditional_blocks: default_conditional_blocks(),
            loaded_modules: BTreeSet::new(),
            defines: BTreeSet::new(),
        }
    }
}

impl ActivationPolicy {
    /// Whether `name` is a conditional block name (case-insensitive)
    pub fn is_conditional(&self, name: &str) -> bool {
        self.conditional_blocks
            .iter()
            .any(|c| c.eq_ignore_ascii_case(name))
    }

    /// Whether a block is guaranteed to be active
    pub fn is_active(&self, name: &str, parameters: &[String]) -> bool {
        if !self.is_conditional(name) {
            return true;
        }

        let [condition] = parameters else {
            return false;
        };
        let condition = condition.trim_matches('"');
        if condition.starts_with('!') {
            return false;
        }

        if name.eq_ignore_ascii_case("IfModule") {
            let wanted = normalize_module(condition);
            self.loaded_modules
                .iter()
                .any(|m| normalize_module(m) == wanted)
        } else if name.eq_ignore_ascii_case("IfDefine") {
            self.defines.contains(condition)
        } else {
            false
        }
    }

    /// Record a loaded module
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.loaded_modules.insert(module.into());
        self
    }

    /// Record a define
    pub fn with_define(mut self, define: impl Into<String>) -> Self {
        self.defines.insert(define.into());
        self
    }
}

/// `mod_ssl.c`, `ssl_module` and `ssl` all name the same module
fn normalize_module(module: &str) -> &str {
    if let Some(stem) = module.strip_suffix(".c") {
        stem.strip_prefix("mod_").unwrap_or(stem)
    } else if let Some(stem) = module.strip_suffix("_module") {
        stem
    } else {
        module
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(p: &[&str]) -> Vec<String> {
        p.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plain_blocks_are_active() {
        let policy = ActivationPolicy::default();
        assert!(policy.is_active("VirtualHost", &params(&["*:80"])));
        assert!(policy.is_active("Directory", &params(&["/var/www"])));
    }

    #[test]
    fn test_conditional_names_case_insensitive() {
        let policy = ActivationPolicy::default();
        assert!(policy.is_conditional("ifmodule"));
        assert!(policy.is_conditional("IFDEFINE"));
        assert!(!policy.is_conditional("VirtualHost"));
    }

    #[test]
    fn test_unknown_module_is_inactive() {
        let policy = ActivationPolicy::default();
        assert!(!policy.is_active("IfModule", &params(&["mod_ssl.c"])));
    }

    #[test]
    fn test_loaded_module_aliases() {
        let policy = ActivationPolicy::default().with_module("ssl_module");
        assert!(policy.is_active("IfModule", &params(&["mod_ssl.c"])));
        assert!(policy.is_active("IfModule", &params(&["ssl_module"])));
        assert!(policy.is_active("IfModule", &params(&["ssl"])));
        assert!(!policy.is_active("IfModule", &params(&["!mod_ssl.c"])));
        assert!(!policy.is_active("IfModule", &params(&["mod_rewrite.c"])));
    }

    #[test]
    fn test_defines() {
        let policy = ActivationPolicy::default().with_define("SSL");
        assert!(policy.is_active("IfDefine", &params(&["SSL"])));
        assert!(!policy.is_active("IfDefine", &params(&["!SSL"])));
        assert!(!policy.is_active("IfDefine", &params(&["OTHER"])));
    }

    #[test]
    fn test_other_conditionals_never_guaranteed() {
        let policy = ActivationPolicy::default().with_module("version_module");
        assert!(!policy.is_active("IfVersion", &params(&[">=", "2.4"])));
        assert!(!policy.is_active("If", &params(&["\"%{HTTPS} == 'on'\""])));
        assert!(!policy.is_active("Else", &[]));
    }
}
