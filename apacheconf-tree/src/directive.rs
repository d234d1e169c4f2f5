//! Directive nodes

use crate::node::{NodeCore, NodeParams};
use crate::tracker;
use apacheconf_core::{Error, Result};
use parking_lot::RwLock;
use std::sync::Arc;

/// Name, parameters and enabled flag, shared by directives and blocks
#[derive(Debug)]
pub(crate) struct DirectiveData {
    pub(crate) name: String,
    pub(crate) parameters: RwLock<Vec<String>>,
    /// Only consulted once the node has no live ancestor
    enabled: bool,
}

impl DirectiveData {
    pub(crate) fn new(name: String, parameters: Vec<String>, enabled: bool) -> Self {
        Self {
            name,
            parameters: RwLock::new(parameters),
            enabled,
        }
    }

    pub(crate) fn parameters(&self) -> Vec<String> {
        self.parameters.read().clone()
    }

    /// Enabled when the parent is enabled and its condition holds
    pub(crate) fn enabled(&self, core: &NodeCore) -> bool {
        match core.ancestor() {
            Some(parent) => parent.enabled() && parent.is_active(),
            None => self.enabled,
        }
    }

    /// Replace the parameters of the node owning `core`
    pub(crate) fn set_parameters(&self, core: &NodeCore, parameters: &[&str]) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::EmptyName);
        }

        let parameters: Vec<String> = parameters.iter().map(|p| p.to_string()).collect();
        tracing::debug!(
            "{}: set parameters of {} to {:?}",
            core.filepath.display(),
            self.name,
            parameters
        );
        *self.parameters.write() = parameters;
        tracker::mark_modified(core);
        Ok(())
    }
}

impl PartialEq for DirectiveData {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && *self.parameters.read() == *other.parameters.read()
    }
}

#[derive(Debug)]
pub(crate) struct DirectiveInner {
    core: NodeCore,
    data: DirectiveData,
}

impl PartialEq for DirectiveInner {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
            && self.data.enabled(&self.core) == other.data.enabled(&other.core)
            && self.core == other.core
    }
}

/// A single statement: `Name param1 param2`
#[derive(Debug, Clone)]
pub struct DirectiveNode(Arc<DirectiveInner>);

impl DirectiveNode {
    /// Build a directive node from construction parameters
    pub fn new(params: NodeParams, name: &str, parameters: &[&str], enabled: bool) -> Result<Self> {
        let core = params.build()?;
        let parameters = parameters.iter().map(|p| p.to_string()).collect();
        let node = Self::from_core(core, name.to_string(), parameters, enabled);
        tracker::settle_construction(node.core());
        Ok(node)
    }

    pub(crate) fn from_core(core: NodeCore, name: String, parameters: Vec<String>, enabled: bool) -> Self {
        Self(Arc::new(DirectiveInner {
            core,
            data: DirectiveData::new(name, parameters, enabled),
        }))
    }

    pub(crate) fn core(&self) -> &NodeCore {
        &self.0.core
    }

    pub fn name(&self) -> &str {
        &self.0.data.name
    }

    /// Snapshot of the parameter list
    pub fn parameters(&self) -> Vec<String> {
        self.0.data.parameters()
    }

    /// Whether the directive sits in an active configuration context
    pub fn enabled(&self) -> bool {
        self.0.data.enabled(&self.0.core)
    }

    /// Replace the parameter list, stored verbatim
    pub fn set_parameters(&self, parameters: &[&str]) -> Result<()> {
        self.0.data.set_parameters(&self.0.core, parameters)
    }

    pub fn ptr_eq(&self, other: &DirectiveNode) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for DirectiveNode {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0 == *other.0
    }
}
