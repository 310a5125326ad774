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

//! Implementation of the [`Module`] sum type and the module-supply
//! boundary.
//!
//! A module is the unit of registration: either a [`Zone`], which
//! answers questions for a domain suffix from its resolving tree, or a
//! [`Middleware`], a bare handler that runs for every query (when
//! unnamed) or for a subtree of the hierarchy (when named). External
//! code supplies the full module set through a [`ModuleProvider`];
//! the registry rebuilds itself from that set on every reload.

use std::fmt;
use std::sync::Arc;

use crate::engine::{Context, ProcessingResult};
use crate::name::Name;
use crate::zone::Zone;

/// A boxed error, used where failures originate in host-supplied code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A handler function, shared by middlewares and dynamic zone leaves.
/// Handlers mutate the response through the context and may fail;
/// failures are contained at the per-question boundary.
pub type Handler = Arc<dyn Fn(&mut Context<'_>) -> ProcessingResult<()> + Send + Sync>;

/// A hook invoked when a module is superseded in the registry. Hook
/// failures are logged and never corrupt the registry.
pub type UnloadHook = Arc<dyn Fn() -> Result<(), BoxError> + Send + Sync>;

////////////////////////////////////////////////////////////////////////
// MODULES                                                            //
////////////////////////////////////////////////////////////////////////

/// A registrable module.
#[derive(Debug)]
pub enum Module {
    Zone(Zone),
    Middleware(Middleware),
}

impl Module {
    /// Returns the module's name in the DNS hierarchy, or `None` for a
    /// global middleware.
    pub fn name(&self) -> Option<&Name> {
        match self {
            Self::Zone(zone) => Some(zone.name()),
            Self::Middleware(middleware) => middleware.name.as_ref(),
        }
    }

    /// Handles a question, mutating the response as needed.
    pub fn handle(&self, ctx: &mut Context) -> ProcessingResult<()> {
        match self {
            Self::Zone(zone) => zone.handle(ctx),
            Self::Middleware(middleware) => (middleware.handler)(ctx),
        }
    }

    /// Runs the module's unload hook, if any.
    pub fn unload(&self) -> Result<(), BoxError> {
        let hook = match self {
            Self::Zone(zone) => zone.unload_hook(),
            Self::Middleware(middleware) => middleware.on_unload.as_ref(),
        };
        match hook {
            Some(hook) => hook(),
            None => Ok(()),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// MIDDLEWARES                                                        //
////////////////////////////////////////////////////////////////////////

/// A middleware: a handler without a resolving tree, used for
/// cross-cutting mutation of responses.
pub struct Middleware {
    name: Option<Name>,
    handler: Handler,
    on_unload: Option<UnloadHook>,
}

impl Middleware {
    /// Creates a global middleware, which participates in every
    /// query's resolver chain.
    pub fn new(handler: Handler) -> Self {
        Self {
            name: None,
            handler,
            on_unload: None,
        }
    }

    /// Creates a middleware registered at `name`, which participates
    /// only in chains for questions at or below that name.
    pub fn named(name: Name, handler: Handler) -> Self {
        Self {
            name: Some(name),
            handler,
            on_unload: None,
        }
    }

    /// Attaches a hook to run when this middleware is unloaded
    /// (replaced in the registry).
    pub fn with_unload_hook(mut self, hook: UnloadHook) -> Self {
        self.on_unload = Some(hook);
        self
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Middleware")
            .field("name", &self.name)
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////
// MODULE SUPPLY                                                      //
////////////////////////////////////////////////////////////////////////

/// The boundary through which host code supplies the module set.
///
/// `modules` is called on every reload and must produce the complete
/// set from scratch; the registry is rebuilt from it wholesale rather
/// than patched incrementally. A failure aborts the reload and leaves
/// the previous registry in service.
pub trait ModuleProvider: Send + Sync {
    fn modules(&self) -> Result<Vec<Module>, BoxError>;
}

impl<F> ModuleProvider for F
where
    F: Fn() -> Result<Vec<Module>, BoxError> + Send + Sync,
{
    fn modules(&self) -> Result<Vec<Module>, BoxError> {
        self()
    }
}
