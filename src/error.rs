//! Error type for the parser and evaluator.

use std::error::Error;
use std::fmt;

use crate::context::Context;

/// The failure vocabulary of the tool. Fatal kinds unwind the whole invocation; `CommandFailed`
/// carries the child's exit status so the process can exit with it.
#[derive(Debug)]
pub enum ErrorKind {
    /// No explicit, implicit, or default rule for a target that does not exist on disk.
    DontKnowHow(String),
    /// Mixing `:` and `::` rule forms on one target.
    RuleKindMismatch(String),
    /// A prerequisite cycle.
    CycleDetected(String),
    /// Macro expansion exceeded the bounded depth.
    RecursiveMacro(String),
    /// A `$(`/`${` reference with no closing delimiter.
    UnterminatedReference(String),
    /// A macro name the store rejects.
    BadMacroName(String),
    /// The shell could not be invoked at all.
    ExecFailure(String),
    /// A command returned this non-zero status.
    CommandFailed(i32),
    RecipeWithoutRule,
    InvalidLine,
    NoTargets,
    Io(String),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::DontKnowHow(name) => write!(f, "don't know how to make '{}'", name),
            Self::RuleKindMismatch(name) => write!(
                f,
                "cannot define rules using `:` and `::` on the same target '{}'",
                name
            ),
            Self::CycleDetected(name) => {
                write!(f, "circular dependency detected through '{}'", name)
            }
            Self::RecursiveMacro(text) => write!(f, "recursive macro reference in '{}'", text),
            Self::UnterminatedReference(text) => {
                write!(f, "unterminated macro reference in '{}'", text)
            }
            Self::BadMacroName(msg) => write!(f, "{}", msg),
            Self::ExecFailure(command) => write!(f, "couldn't execute '{}'", command),
            Self::CommandFailed(status) => write!(f, "command failed with status {}", status),
            Self::RecipeWithoutRule => write!(f, "recipe commences before first target"),
            Self::InvalidLine => write!(f, "invalid line type"),
            Self::NoTargets => write!(f, "no target specified and no default target found"),
            Self::Io(msg) => write!(f, "{}", msg),
        }
    }
}

/// An error in the parsing or execution of a makefile.
#[derive(Debug)]
pub struct MakeError {
    pub kind: ErrorKind,
    pub context: Context,
}

impl MakeError {
    pub fn new(kind: ErrorKind, context: Context) -> Self {
        Self { kind, context }
    }

    /// The process exit status this error should produce: a failed command propagates the child's
    /// status, everything else exits `2`.
    pub fn exit_code(&self) -> i32 {
        match self.kind {
            ErrorKind::CommandFailed(status) => status,
            _ => 2,
        }
    }
}

impl Error for MakeError {}

impl fmt::Display for MakeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.context.label() {
            Some(label) => write!(f, "{}: {}", label, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}
