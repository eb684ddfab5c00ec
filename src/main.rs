//! # rmake
//!
//! This is an implementation of `make`, written in Rust. The goal is to provide a faithful
//! rendition of the classical tool: explicit rules, suffix rules, macros, and the traditional
//! out-of-date walk.

mod args;

use std::env;
use std::fs;
use std::path::PathBuf;

use clap::Parser;

use args::Args;

use rmake::{Context, DefaultLogger, Env, Logger, Makefile, Origin, Vars};

/// An ordered list of filenames used to search for a makefile.
const MAKEFILE_SEARCH: [&str; 6] = [
    "makefile",
    "Makefile",
    "BSDmakefile",
    "BSDMakefile",
    "GNUmakefile",
    "GNUMakefile",
];

/// Search for a makefile to execute.
///
/// We have to take into account that the file system may be case-insensitive. Ideally, we want to
/// return the proper casing of the makefile (so the file is properly reported when logging), and
/// we also want to support weirdly-cased makefiles on case-insensitive file systems, such as
/// `MAKEFILE`. To that end, we first get a directory listing and try to find makefiles from that
/// list, which would ensure the proper casing is returned. As a fallback, we then iterate through
/// the `MAKEFILE_SEARCH` list and try to read them from the file system, which will do a
/// case-insensitive match on case-insensitive file systems.
fn find_makefile() -> Option<PathBuf> {
    // First, try to find a makefile from the directory listing, which will be a case-sensitive
    // match. This ensures that if a case-sensitive match is found on a case-insensitive file
    // system, we will return the proper casing (e.g., if `Makefile` is found, then we won't have
    // first matched `makefile` and therefore returned the wrong casing).
    if let Some(cwd_files) = fs::read_dir("./").ok().map(|rd| {
        rd.flatten()
            .filter_map(|entry| entry.path().file_name().map(PathBuf::from))
            .collect::<Vec<_>>()
    }) {
        for file in MAKEFILE_SEARCH {
            let f = PathBuf::from(file);
            if cwd_files.contains(&f) && f.is_file() {
                return Some(f);
            }
        }
    }

    // Second, test each file in `MAKEFILE_SEARCH`, which then does a case-insensitive match on
    // case-insensitive file systems. This is purely for flexibility (e.g., so a file named
    // `MAKEFILE` would be matched), however it does result in the "wrong" casing being logged.
    for file in MAKEFILE_SEARCH {
        let f = PathBuf::from(file);
        if f.is_file() {
            return Some(f);
        }
    }

    None
}

/// Print an error message and exit with the given code.
fn exit_with(msg: impl AsRef<str>, logger: &DefaultLogger, context: Option<&Context>, code: i32) -> ! {
    logger.error(msg, context);
    std::process::exit(code)
}

fn main() {
    let args = Args::parse();
    let logger = DefaultLogger {};

    // Change to another directory, if specified by the arguments.
    let original_dir = if args.directory.is_empty() {
        None
    } else {
        // Remember the current directory to return to.
        let cwd = env::current_dir().unwrap_or_else(|e| {
            exit_with(format!("failed to get cwd ({})", e), &logger, None, 2)
        });

        // Change to the specified directory.
        let dir = args
            .directory
            .iter()
            .fold(PathBuf::new(), |dir, d| dir.join(d));
        logger.info(format!("chdir to `{}`", dir.display()), None);
        env::set_current_dir(&dir)
            .unwrap_or_else(|e| exit_with(format!("chdir failed: {}", e), &logger, None, 2));

        Some(cwd)
    };

    // Determine the makefile to read.
    let makefile_fn = match args.file {
        None => find_makefile()
            .unwrap_or_else(|| exit_with("no makefile found", &logger, None, 2)),
        Some(ref file) => PathBuf::from(file),
    };

    // Seed macros from the environment, then apply NAME=VALUE overrides from the command line;
    // what remains of the positional arguments are the goal targets.
    let mut vars: Vars = env::vars().collect::<Env>().into();
    let mut goals = vec![];
    for arg in &args.targets {
        match arg.split_once('=') {
            Some((name, value)) => {
                if let Err(e) = vars.set(name, value, Origin::CommandLine) {
                    exit_with(e, &logger, None, 2);
                }
            }
            None => goals.push(arg.clone()),
        }
    }

    // Parse the makefile.
    let mut makefile = match Makefile::new(
        makefile_fn,
        args.clone().into(),
        Box::new(DefaultLogger {}),
        vars,
    ) {
        Err(e) => exit_with(e.to_string(), &logger, None, e.exit_code()),
        Ok(m) => m,
    };

    // Execute the makefile.
    let estat = match makefile.execute(goals) {
        Err(e) => exit_with(e.to_string(), &logger, None, e.exit_code()),
        Ok(estat) => estat,
    };

    // Go back to the original directory, if we changed directory previously.
    if let Some(cwd) = original_dir {
        logger.info(format!("chdir back to `{}`", cwd.display()), None);
        env::set_current_dir(&cwd)
            .unwrap_or_else(|e| exit_with(format!("chdir failed: {}", e), &logger, None, 2));
    }

    if estat != 0 {
        std::process::exit(estat as i32);
    }
}
