//! This module provides the `clap`-based `Args` struct.

use clap::Parser;
use const_format::formatcp;

use rmake::Opts;

/// Represents the `clap`-based arguments provided by this binary.
#[derive(Clone, Debug, Parser)]
#[clap(
    name = "rmake",
    version,
    about,
    after_help = formatcp!(
        "License:  {}\nSource:   {}", env!("CARGO_PKG_LICENSE"), env!("CARGO_PKG_REPOSITORY")
    ),
)]
pub struct Args {
    /// Target(s) to make, plus NAME=VALUE macro overrides (if no target is specified, use the
    /// first regular target).
    #[arg()]
    pub targets: Vec<String>,

    /// Read FILE as the makefile.
    #[arg(short, long, visible_alias("makefile"))]
    pub file: Option<String>,

    /// Change to DIR before doing anything.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Vec<String>,

    /// Environment macros override makefile assignments.
    #[arg(short = 'e', long)]
    pub environment_overrides: bool,

    /// Ignore errors from commands.
    #[arg(short, long)]
    pub ignore_errors: bool,

    /// Keep going when some targets cannot be made.
    #[arg(short, long)]
    pub keep_going: bool,

    /// Don't execute commands; just print them.
    #[arg(
        short = 'n',
        long = "just-print",
        visible_alias("dry-run"),
        visible_alias("recon")
    )]
    pub just_print: bool,

    /// Consider FILE to be very old and do not remake it.
    #[arg(short, long, value_name = "FILE", visible_alias("assume-old"))]
    pub old_file: Vec<String>,

    /// Print the macro and rule database; don't build anything.
    #[arg(short = 'p', long = "print-everything")]
    pub print_everything: bool,

    /// Run no commands; exit status says whether anything is out of date.
    #[arg(short, long)]
    pub question: bool,

    /// Don't echo commands.
    #[arg(short, long)]
    pub silent: bool,

    /// Touch targets instead of remaking them.
    #[arg(short, long)]
    pub touch: bool,

    /// Consider FILE to be very new to simulate "what if" it changed.
    #[arg(
        short = 'W',
        long = "what-if",
        value_name = "FILE",
        visible_alias("new-file"),
        visible_alias("assume-new")
    )]
    pub new_file: Vec<String>,
}

impl From<Args> for Opts {
    fn from(args: Args) -> Self {
        Self {
            dry_run: args.just_print,
            print: args.print_everything,
            silent: args.silent,
            ignore: args.ignore_errors,
            keep_going: args.keep_going,
            question: args.question,
            touch: args.touch,
            // Only the `.PRECIOUS:` pseudo-target turns this on.
            precious: false,
            env_overrides: args.environment_overrides,
            old_files: args.old_file,
            new_files: args.new_file,
        }
    }
}
