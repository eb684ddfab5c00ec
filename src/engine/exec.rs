//! Command execution for one rule body: modifier prefixes, echo/execute decisions, shell
//! dispatch, and failure handling.

use std::io;

use crate::context::Context;
use crate::error::{ErrorKind, MakeError};
use crate::expand::expand;
use crate::logger::Logger;
use crate::names::NameId;
use crate::shell::{ExecStatus, SIGINT, SIGQUIT};

use super::Engine;

impl<L: Logger> Engine<'_, L> {
    /// Run one command block in declaration order. Returns the keep-going status bit; hard
    /// failures come back as errors.
    pub(super) fn run_commands(
        &mut self,
        id: NameId,
        commands: &[String],
        context: &Context,
    ) -> Result<u8, MakeError> {
        let mut estat = 0;

        for raw in commands {
            let expanded =
                expand(raw, self.vars).map_err(|kind| MakeError::new(kind, context.clone()))?;
            estat |= self.run_command(id, &expanded, context)?;
        }

        Ok(estat)
    }

    fn run_command(&mut self, id: NameId, line: &str, context: &Context) -> Result<u8, MakeError> {
        let flags = self.names[id].flags;
        let name = self.names[id].name.clone();

        let mut silent = self.opts.silent || flags.silent || self.opts.touch;
        let mut ignore = self.opts.ignore || flags.ignore;
        let mut execute = !self.opts.dry_run && !self.opts.touch;
        let mut command_silent = false; // `@`
        let mut command_execute = false; // `+`

        // Modifier prefixes may stack in any order.
        let mut rest = line;
        loop {
            match rest.as_bytes().first() {
                Some(b'@') => command_silent = true,
                Some(b'-') => ignore = true,
                Some(b'+') => command_execute = true,
                _ => break,
            }
            rest = &rest[1..];
        }

        if command_execute {
            // `+` runs even under -n/-t and re-enables the echo a global -s suppressed, but it
            // never overrides `@` or a `.SILENT` target.
            execute = true;
            if !command_silent && !flags.silent {
                silent = false;
            }
        } else if !execute {
            // -n echoes everything, even `@` lines; -t stays quiet and prints `touch` later.
            silent = self.opts.touch;
            command_silent = false;
        }

        if !silent && !command_silent {
            println!("{}", rest);
        }

        if !execute {
            return Ok(0);
        }

        // A failing command inside the line must abort the whole line unless failures are
        // ignored.
        let command = if ignore {
            rest.to_string()
        } else {
            format!("set -e;{}", rest)
        };

        match self.shell.run(&command) {
            ExecStatus::Exited(0) => Ok(0),
            ExecStatus::Unreachable(_) => Err(MakeError::new(
                ErrorKind::ExecFailure(rest.to_string()),
                context.clone(),
            )),
            status if ignore => {
                self.logger.warn(
                    format!("error {} (ignored)", status.exit_code()),
                    Some(context),
                );
                Ok(0)
            }
            status => {
                self.logger
                    .warn(format!("failed to build '{}'", name), None);
                if let ExecStatus::Interrupted(signal) = status {
                    if signal == SIGINT || signal == SIGQUIT {
                        self.remove_target(id);
                    }
                }
                if self.opts.keep_going {
                    Ok(1)
                } else {
                    Err(MakeError::new(
                        ErrorKind::CommandFailed(status.exit_code()),
                        context.clone(),
                    ))
                }
            }
        }
    }

    /// After an interrupt, scrap a half-written target file.
    pub(super) fn remove_target(&mut self, id: NameId) {
        let flags = self.names[id].flags;
        if self.opts.dry_run
            || self.opts.print
            || self.opts.precious
            || flags.precious
            || flags.phony
        {
            return;
        }

        let name = self.names[id].name.clone();
        match self.fs.unlink(&name) {
            Ok(()) => self.logger.warn(format!("'{}' removed", name), None),
            // A target that never materialized is not worth a warning.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => self
                .logger
                .warn(format!("unlink {} failed: {}", name, e), None),
        }
    }

    /// Touch-mode stand-in for running the commands.
    pub(super) fn touch_target(&mut self, id: NameId) {
        if self.names[id].flags.phony {
            return;
        }
        let name = self.names[id].name.clone();

        if self.opts.dry_run || !self.opts.silent {
            println!("touch {}", name);
        }
        if !self.opts.dry_run {
            if let Err(e) = self.fs.touch(&name) {
                self.logger
                    .warn(format!("touch {} failed: {}", name, e), None);
            }
        }
    }
}
