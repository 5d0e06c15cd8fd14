mod variable;

pub use variable::{SparseCooTensor, SparseCsrTensor, VarKind, VarPayload, Variable};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use crate::error::{OpError, Result};
use crate::formatting::DebugString;
use crate::names::EMPTY_VAR_NAME;

/// Tree-structured variable store.
///
/// A child scope shadows but never mutates its parent; lookup walks toward
/// the root, creation is always local. Strong references run parent to
/// child, weak references child to parent, so the tree cannot cycle and a
/// variable never holds its scope alive.
pub struct Scope {
    vars: Mutex<HashMap<String, Arc<Variable>>>,
    kids: Mutex<Vec<Arc<Scope>>>,
    parent: Weak<Scope>,
}

impl Scope {
    /// Create a root scope.
    pub fn new() -> Arc<Scope> {
        Arc::new(Scope {
            vars: Mutex::new(HashMap::new()),
            kids: Mutex::new(Vec::new()),
            parent: Weak::new(),
        })
    }

    /// Create a child whose parent is this scope.
    pub fn new_child(self: &Arc<Scope>) -> Arc<Scope> {
        let child = Arc::new(Scope {
            vars: Mutex::new(HashMap::new()),
            kids: Mutex::new(Vec::new()),
            parent: Arc::downgrade(self),
        });
        self.kids
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Arc::clone(&child));
        child
    }

    /// Get or create a variable in this scope.
    pub fn var(&self, name: &str) -> Result<Arc<Variable>> {
        if name.is_empty() || name == EMPTY_VAR_NAME {
            return Err(OpError::EmptyVarName);
        }
        let mut vars = self
            .vars
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let var = vars
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Variable::new(name)));
        Ok(Arc::clone(var))
    }

    /// Get or create a variable whose payload kind is pinned up front.
    ///
    /// Fails with `NameCollisionInCurrentFrame` when the variable already
    /// exists in this frame with a different known kind.
    pub fn var_typed(&self, name: &str, kind: VarKind) -> Result<Arc<Variable>> {
        let var = self.var(name)?;
        match var.kind() {
            Some(existing) if existing != kind => {
                Err(OpError::NameCollisionInCurrentFrame {
                    name: name.to_string(),
                })
            }
            Some(_) => Ok(var),
            None => {
                var.set_meta_kind(kind);
                Ok(var)
            }
        }
    }

    /// Find a variable, walking toward the root.
    pub fn find_var(&self, name: &str) -> Option<Arc<Variable>> {
        if name.is_empty() || name == EMPTY_VAR_NAME {
            return None;
        }
        let local = {
            let vars = self
                .vars
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            vars.get(name).cloned()
        };
        if local.is_some() {
            return local;
        }
        self.parent.upgrade()?.find_var(name)
    }

    /// Whether the variable exists in this frame only.
    pub fn find_var_local(&self, name: &str) -> Option<Arc<Variable>> {
        let vars = self
            .vars
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        vars.get(name).cloned()
    }

    /// Destroy all descendant scopes. Not reentrant.
    pub fn drop_kids(&self) {
        let mut kids = self
            .kids
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for kid in kids.iter() {
            kid.drop_kids();
        }
        kids.clear();
    }

    /// Names of the variables created in this frame, sorted for debugging.
    pub fn local_var_names(&self) -> Vec<String> {
        let vars = self
            .vars
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut names: Vec<String> = vars.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of live child scopes.
    pub fn kid_count(&self) -> usize {
        self.kids
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl DebugString for Scope {
    fn debug_string(&self) -> String {
        let names = self.local_var_names();
        let kids = self
            .kids
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut out = format!("scope{{{}}}", names.join(", "));
        for kid in kids.iter() {
            out.push_str(" -> ");
            out.push_str(&kid.debug_string());
        }
        out
    }
}
