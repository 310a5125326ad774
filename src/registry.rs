// Copyright 2023 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implementation of the [`Registry`] of loaded modules.
//!
//! The registry keeps named modules in a tree keyed by reversed domain
//! labels (so `a.b.c` is stored under `c` → `b` → `a`), plus a flat
//! ordered list of the global (unnamed) middlewares. It is an
//! immutable snapshot once built: a reload builds a fresh `Registry`
//! and swaps it in atomically, so resolutions already running keep the
//! snapshot they captured.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};

use crate::module::Module;
use crate::name::Name;

/// The set of modules serving queries, indexed for per-question
/// resolver-chain assembly.
#[derive(Debug, Default)]
pub struct Registry {
    root: RegistryNode,
    middlewares: Vec<Arc<Module>>,
    module_count: usize,
}

#[derive(Debug, Default)]
struct RegistryNode {
    handler: Option<Arc<Module>>,
    children: HashMap<Box<str>, RegistryNode>,
}

impl Registry {
    /// Creates a new, initially empty `Registry`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of modules registered.
    pub fn module_count(&self) -> usize {
        self.module_count
    }

    /// Adds `module` to the registry.
    ///
    /// Named modules are inserted at the reversed-label path of their
    /// name; registering at a path that already holds a module unloads
    /// and replaces the previous one (a failing unload hook is logged
    /// and otherwise ignored). Unnamed middlewares are appended to the
    /// global middleware list instead.
    pub fn register(&mut self, module: Module) {
        let name = match module.name() {
            Some(name) => name.to_lowercase(),
            None => {
                debug!("registering global middleware");
                self.middlewares.push(Arc::new(module));
                self.module_count += 1;
                return;
            }
        };
        debug!("registering module at {}", name);

        let mut node = &mut self.root;
        for label in name.labels_reversed() {
            node = node.children.entry(label.into()).or_default();
        }
        if let Some(previous) = node.handler.replace(Arc::new(module)) {
            warn!("module at {} replaces a loaded module", name);
            if let Err(error) = previous.unload() {
                warn!("unload hook for {} failed: {}", name, error);
            }
        } else {
            self.module_count += 1;
        }
    }

    /// Assembles the resolver chain for a question name: the global
    /// middlewares in registration order, then every named module
    /// matched while walking `name`'s reversed labels from the root of
    /// the tree toward the most specific match.
    ///
    /// The chain is driven as a stack (most specific module first),
    /// so callers pop from the end.
    pub fn find_resolvers(&self, name: &Name) -> Vec<Arc<Module>> {
        let mut resolvers = self.middlewares.clone();
        let mut node = &self.root;
        for label in name.labels_reversed() {
            match node.children.get(label) {
                Some(child) => {
                    if let Some(handler) = &child.handler {
                        resolvers.push(handler.clone());
                    }
                    node = child;
                }
                None => break,
            }
        }
        resolvers
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
