//! # rmake
//!
//! This is the library component of `rmake`, a Rust implementation of the classical `make`
//! utility: parse a makefile, decide which targets are out of date with respect to their
//! prerequisites, and run the associated shell commands. The library is generally oriented
//! towards the main binary of this crate, but should be designed to be used by other
//! applications.

mod context;
mod engine;
mod error;
mod expand;
mod fsio;
mod implicit;
mod logger;
mod makefile;
mod names;
mod shell;
mod vars;

pub use context::Context;
pub use engine::Engine;
pub use error::{ErrorKind, MakeError};
pub use fsio::{FileSystem, HostFs, Timestamp};
pub use logger::{DefaultLogger, Logger, ERROR, INFO, WARN};
pub use makefile::{Makefile, Opts};
pub use names::{Name, NameFlags, NameId, NameTable, Rule};
pub use shell::{ExecStatus, ShRunner, ShellRunner};
pub use vars::{Env, Origin, Var, Vars};
