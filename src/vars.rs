//! A wrapper for a `HashMap` storing the macro bindings of a makefile run.
//!
//! Beyond plain storage there are two behaviors of note. First, every binding carries an origin
//! and a `set` from a weaker origin never clobbers a stronger binding, which is how command-line
//! macros beat makefile assignments and makefile assignments beat the environment. Second, a few
//! special keys have default values which should be "resettable" by setting the value to blank,
//! and calling `get` on a key that doesn't exist should return an empty `Var`. To support these
//! behaviors without polluting the underlying `HashMap` with lots of duplicate data, the `Vars`
//! struct contains fields for those heap-allocated "constant" objects. Since we always return a
//! reference to a `Var`, this is quite efficient.

use std::collections::HashMap;

const DEFAULT_RECIPE_PREFIX: char = '\t';

/// Represents the "raw" environment coming from the OS.
pub type Env = HashMap<String, String>;

/// Where a binding came from. Automatic variables are rebound freely per target; everything else
/// resolves conflicts by rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    Default,
    Environment,
    File,
    CommandLine,
    Automatic,
}

#[derive(Debug)]
pub struct Var {
    pub value: String,
    pub origin: Origin,
}

/// This wraps a `HashMap` and a default value, providing an easy way to get variables, handling
/// special and automatic variables properly.
#[derive(Debug)]
pub struct Vars {
    map: HashMap<String, Var>,

    /// Raise `Environment` above `File` (the `-e` flag).
    env_overrides: bool,

    // Heap-allocated "constant" `Var` objects, setup during initialization, designed to reduce
    // multiple allocations and lifetime tracking.
    blank: Var,
    default_recipe_prefix: Var,
}

impl Vars {
    /// Primary interface for configuring a new instance. We also create some cached values that
    /// live for the lifetime of this instance to reduce the number of allocations.
    pub fn new<const N: usize>(init: [(&str, &str); N]) -> Self {
        let mut vars = Self {
            map: HashMap::new(),
            env_overrides: false,
            blank: Var {
                value: "".to_string(),
                origin: Origin::Default,
            },
            default_recipe_prefix: Var {
                value: DEFAULT_RECIPE_PREFIX.to_string(),
                origin: Origin::Default,
            },
        };

        // Use `set` to initialize data.
        for (k, v) in init {
            let _ = vars.set(k, v, Origin::File);
        }

        vars
    }

    pub fn set_env_overrides(&mut self, enabled: bool) {
        self.env_overrides = enabled;
    }

    /// Public interface for getting variables. For unknown keys, the `blank` object is returned,
    /// and some special keys have default values.
    pub fn get(&self, k: impl AsRef<str>) -> &Var {
        let k = k.as_ref().trim();
        match k {
            ".RECIPEPREFIX" => match self.map.get(k) {
                None => &self.default_recipe_prefix,
                Some(var) if var.value.is_empty() => &self.default_recipe_prefix,
                Some(var) => var,
            },
            _ => match self.map.get(k) {
                None => &self.blank,
                Some(var) => var,
            },
        }
    }

    /// Public interface for setting variables. A binding from a stronger origin silently wins,
    /// so a makefile assignment cannot override a command-line macro.
    pub fn set(
        &mut self,
        k: impl Into<String>,
        v: impl Into<String>,
        origin: Origin,
    ) -> Result<(), String> {
        let k = k.into().trim().to_string();

        // Macro names must not be empty and must not include whitespace or any chars in the set:
        // `:#=`.
        if k.is_empty() {
            return Err("empty macro name".to_string());
        }
        for ch in k.chars() {
            if ch.is_whitespace() {
                return Err("macro name contains whitespace".to_string());
            }
            if matches!(ch, ':' | '#' | '=') {
                return Err(format!("macro name contains bad character '{}'", ch));
            }
        }

        if let Some(existing) = self.map.get(&k) {
            if self.rank(existing.origin) > self.rank(origin) {
                return Ok(());
            }
        }

        self.map.insert(
            k,
            Var {
                value: v.into(),
                origin,
            },
        );
        Ok(())
    }

    /// Append to a binding (the `+=` operator), separating with a space. Precedence still applies
    /// through `set`, so appending from a weaker origin leaves the binding untouched.
    pub fn append(
        &mut self,
        k: impl AsRef<str>,
        v: impl AsRef<str>,
        origin: Origin,
    ) -> Result<(), String> {
        let k = k.as_ref().trim();
        let joined = match self.map.get(k) {
            Some(var) if !var.value.is_empty() => format!("{} {}", var.value, v.as_ref()),
            _ => v.as_ref().to_string(),
        };
        self.set(k, joined, origin)
    }

    /// Iterate the raw bindings (for the database dump).
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Var)> {
        self.map.iter()
    }

    fn rank(&self, origin: Origin) -> u8 {
        match origin {
            Origin::Default => 0,
            Origin::Environment => {
                if self.env_overrides {
                    3
                } else {
                    1
                }
            }
            Origin::File => 2,
            Origin::CommandLine => 4,
            Origin::Automatic => 5,
        }
    }
}

impl From<Env> for Vars {
    fn from(env: Env) -> Self {
        let mut vars = Self::new([]);
        for (k, v) in env {
            // Environment keys can contain characters a makefile assignment must reject, so
            // insert directly.
            vars.map.insert(
                k,
                Var {
                    value: v,
                    origin: Origin::Environment,
                },
            );
        }

        vars
    }
}
