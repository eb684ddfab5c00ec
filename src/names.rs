//! The name table. Every target, prerequisite, suffix, and pseudo-target is interned here exactly
//! once, and all rule storage hangs off the interned entry.

use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use crate::context::Context;
use crate::error::{ErrorKind, MakeError};
use crate::fsio::Timestamp;
use crate::logger::Logger;

/// Stable handle into the `NameTable` arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NameId(usize);

/// Per-name evaluation state.
#[derive(Clone, Copy, Debug, Default)]
pub struct NameFlags {
    /// Already evaluated during this invocation.
    pub done: bool,
    /// Declared with `::`.
    pub double_colon: bool,
    /// Appears as a target in some rule.
    pub target: bool,
    pub precious: bool,
    pub silent: bool,
    pub ignore: bool,
    pub phony: bool,
    /// Currently on the evaluation stack (cycle detection).
    pub on_stack: bool,
}

/// One rule body attached to a name.
#[derive(Clone, Debug)]
pub struct Rule {
    pub prereqs: Vec<NameId>,
    /// Unexpanded command lines; expansion happens at execution time under the
    /// automatic-variable bindings.
    pub commands: Vec<String>,
    pub context: Context,
}

/// An interned name with its rules and cached timestamp.
#[derive(Debug)]
pub struct Name {
    pub name: String,
    pub rules: Vec<Rule>,
    pub time: Timestamp,
    pub flags: NameFlags,
}

/// Names are stored in an insertion-ordered arena; `lookup` maps each string to its index.
/// Entries are never removed, so `NameId`s stay valid for the whole invocation and every
/// reference to the same identifier shares one entry.
#[derive(Debug, Default)]
pub struct NameTable {
    names: Vec<Name>,
    lookup: HashMap<String, NameId>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the existing entry for `s` or create a fresh one.
    pub fn intern(&mut self, s: impl AsRef<str>) -> NameId {
        let s = s.as_ref();
        if let Some(id) = self.lookup.get(s) {
            return *id;
        }

        let id = NameId(self.names.len());
        self.names.push(Name {
            name: s.to_string(),
            rules: vec![],
            time: Timestamp::MISSING,
            flags: NameFlags::default(),
        });
        self.lookup.insert(s.to_string(), id);
        id
    }

    /// Find an entry without creating it.
    pub fn lookup(&self, s: impl AsRef<str>) -> Option<NameId> {
        self.lookup.get(s.as_ref()).copied()
    }

    /// All handles, in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = NameId> {
        (0..self.names.len()).map(NameId)
    }

    /// Append a rule to a target. Catches `:`/`::` mixing; on a non-double-colon name a second
    /// command block warns and replaces the first, while the dependency lists of both survive.
    pub fn add_rule<L: Logger>(
        &mut self,
        target: NameId,
        rule: Rule,
        double_colon: bool,
        logger: &L,
    ) -> Result<(), MakeError> {
        let name = &mut self.names[target.0];

        if !name.rules.is_empty() && name.flags.double_colon != double_colon {
            return Err(MakeError::new(
                ErrorKind::RuleKindMismatch(name.name.clone()),
                rule.context,
            ));
        }

        if !double_colon && !rule.commands.is_empty() {
            if let Some(prior) = name.rules.iter_mut().find(|r| !r.commands.is_empty()) {
                logger.warn(
                    format!("overriding commands for target '{}'", name.name),
                    Some(&rule.context),
                );
                prior.commands.clear();
            }
        }

        name.flags.target = true;
        name.flags.double_colon = double_colon;
        name.rules.push(rule);
        Ok(())
    }
}

impl Index<NameId> for NameTable {
    type Output = Name;

    fn index(&self, id: NameId) -> &Name {
        &self.names[id.0]
    }
}

impl IndexMut<NameId> for NameTable {
    fn index_mut(&mut self, id: NameId) -> &mut Name {
        &mut self.names[id.0]
    }
}
