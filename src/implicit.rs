//! Implicit rule resolution via suffix transformations.
//!
//! A transformation rule is an ordinary name of the form `<src><dst>` (for example `.c.o`) whose
//! commands build a `<dst>`-suffixed target from the matching `<src>`-suffixed file. The known
//! suffixes are the declared prerequisites of `.SUFFIXES`, in declaration order. An empty target
//! suffix covers the single-suffix form (a rule named `.c` builds `foo` from `foo.c`).

use crate::fsio::FileSystem;
use crate::names::{NameId, NameTable};

pub const SUFFIXES: &str = ".SUFFIXES";
pub const DEFAULT: &str = ".DEFAULT";

/// A synthesized rule body for a target that had no explicit commands.
#[derive(Debug)]
pub struct Resolved {
    /// The implicit prerequisite (`$<`), e.g. `foo.c` for `foo.o`.
    pub dep: NameId,
    /// Commands cloned from the transformation rule, still unexpanded.
    pub commands: Vec<String>,
    /// The target name with the matched suffix stripped (`$*`).
    pub stem: String,
}

/// The declared suffixes, in declaration order.
pub fn suffix_list(names: &NameTable) -> Vec<String> {
    let Some(id) = names.lookup(SUFFIXES) else {
        return vec![];
    };

    let mut suffixes = vec![];
    for rule in &names[id].rules {
        for dep in &rule.prereqs {
            let suffix = names[*dep].name.clone();
            if !suffixes.contains(&suffix) {
                suffixes.push(suffix);
            }
        }
    }
    suffixes
}

/// Try to find a suffix transformation for `target`. Candidates are only checked for existence
/// here; their timestamps are probed by the driver, which also applies pinning and `.PHONY`
/// handling, when it recurses into the chosen prerequisite.
pub fn resolve(names: &mut NameTable, fs: &dyn FileSystem, target: NameId) -> Option<Resolved> {
    let suffixes = suffix_list(names);
    let target_name = names[target].name.clone();

    // An archive member reference resolves on the member name.
    let (_, member) = split_archive(&target_name);
    let base = member.unwrap_or(target_name.as_str());

    // The longest known suffix wins; no match means an empty suffix (single-suffix form).
    let out_suffix = suffixes
        .iter()
        .filter(|s| base.ends_with(s.as_str()) && base.len() > s.len())
        .max_by_key(|s| s.len())
        .cloned()
        .unwrap_or_default();
    let stem = &base[..base.len() - out_suffix.len()];

    for in_suffix in &suffixes {
        if *in_suffix == out_suffix {
            continue;
        }

        // The transformation rule is stored under the concatenated name.
        let transform = format!("{}{}", in_suffix, out_suffix);
        let Some(rule_id) = names.lookup(&transform) else {
            continue;
        };
        let commands: Vec<String> = names[rule_id]
            .rules
            .iter()
            .flat_map(|r| r.commands.iter().cloned())
            .collect();
        if commands.is_empty() {
            continue;
        }

        // The source must exist on disk or be buildable itself.
        let candidate = format!("{}{}", stem, in_suffix);
        let dep = names.intern(&candidate);
        let exists = !names[dep].time.is_missing() || !fs.modtime(&candidate).is_missing();
        if !exists && names[dep].rules.is_empty() {
            continue;
        }

        return Some(Resolved {
            dep,
            commands,
            stem: stem.to_string(),
        });
    }

    None
}

/// Split `lib(member)` into the archive file and member names.
pub fn split_archive(name: &str) -> (&str, Option<&str>) {
    if let Some(open) = name.find('(') {
        if let Some(member) = name[open + 1..].strip_suffix(')') {
            return (&name[..open], Some(member));
        }
    }
    (name, None)
}
