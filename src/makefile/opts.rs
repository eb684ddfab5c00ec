//! Options available for makefile runs.

/// The enumerated behavior modes. `silent` and `ignore` can also be switched on from inside a
/// makefile by the corresponding special targets; `precious` only ever comes from there.
#[derive(Debug, Default)]
pub struct Opts {
    /// Print command lines without executing them (`-n`).
    pub dry_run: bool,

    /// Print the macro and rule database instead of building (`-p`).
    pub print: bool,

    /// Suppress command echo globally (`-s`).
    pub silent: bool,

    /// Treat every command failure as non-fatal (`-i`).
    pub ignore: bool,

    /// Keep making independent subtrees after a failure (`-k`).
    pub keep_going: bool,

    /// Report whether anything is out of date instead of building (`-q`).
    pub question: bool,

    /// Update target timestamps instead of running commands (`-t`).
    pub touch: bool,

    /// Keep half-made targets when a command is interrupted (`.PRECIOUS:` with no
    /// prerequisites).
    pub precious: bool,

    /// Environment macros override makefile assignments (`-e`).
    pub env_overrides: bool,

    /// Consider these files very old and do not remake them (`-o`).
    pub old_files: Vec<String>,

    /// Consider these files very new to simulate "what if" they changed (`-W`).
    pub new_files: Vec<String>,
}
