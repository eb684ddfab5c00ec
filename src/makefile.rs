//! The core logic for parsing and executing makefiles.

pub mod opts;
mod special;

pub use opts::Opts;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use crate::context::Context;
use crate::engine::Engine;
use crate::error::{ErrorKind, MakeError};
use crate::expand::expand;
use crate::fsio::{FileSystem, HostFs};
use crate::implicit::{DEFAULT, SUFFIXES};
use crate::logger::Logger;
use crate::names::{NameTable, Rule};
use crate::shell::{ShRunner, ShellRunner};
use crate::vars::{Origin, Vars};

use special::SpecialTarget;

const COMMENT_INDICATOR: char = '#';

/// A rule definition being accumulated by the parser.
#[derive(Debug)]
struct PendingRule {
    targets: Vec<String>,
    prereqs: Vec<String>,
    commands: Vec<String>,
    double_colon: bool,
    context: Context,
}

/// The macro assignment operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AssignOp {
    /// `=` — stored raw, expanded at use.
    Lazy,
    /// `:=`/`::=` — expanded once at assignment.
    Expand,
    /// `+=` — append with a space.
    Append,
    /// `?=` — only when currently unset.
    Condition,
}

/// The primary interface for reading, parsing, and executing a makefile.
#[derive(Debug)]
pub struct Makefile<L: Logger> {
    pub opts: Opts,
    pub logger: Box<L>,
    pub names: NameTable,
    pub vars: Vars,

    default_target: Option<String>,

    // Parser state.
    current_rule: Option<PendingRule>,
    context: Context,
}

impl<L: Logger> Makefile<L> {
    /// Principal interface for reading and parsing a makefile.
    pub fn new(path: PathBuf, opts: Opts, logger: Box<L>, vars: Vars) -> Result<Self, MakeError> {
        let file = File::open(&path).map_err(|e| {
            MakeError::new(
                ErrorKind::Io(format!("could not read makefile ({})", e)),
                path.clone().into(),
            )
        })?;
        Self::from_reader(BufReader::new(file), path, opts, logger, vars)
    }

    /// Parse makefile text from any buffered reader.
    pub fn from_reader<R: BufRead>(
        stream: R,
        path: PathBuf,
        opts: Opts,
        logger: Box<L>,
        mut vars: Vars,
    ) -> Result<Self, MakeError> {
        vars.set_env_overrides(opts.env_overrides);

        let mut makefile = Self {
            opts,
            logger,
            names: NameTable::new(),
            vars,
            default_target: None,
            current_rule: None,
            context: path.into(),
        };
        makefile.parse(stream)?;

        Ok(makefile)
    }

    /// Iterate over the makefile's lines, splice backslash continuations, and hand each logical
    /// line to `parse_line`.
    fn parse<R: BufRead>(&mut self, stream: R) -> Result<(), MakeError> {
        self.current_rule = None;
        let mut pending: Option<(String, usize)> = None;

        for (i, result) in stream.lines().enumerate() {
            self.context.line_index = Some(i);
            let line = result
                .map_err(|e| MakeError::new(ErrorKind::Io(e.to_string()), self.context.clone()))?;

            // A trailing backslash splices the next physical line on.
            if let Some((mut joined, start)) = pending.take() {
                joined.push(' ');
                joined.push_str(line.trim_start());
                if let Some(stripped) = joined.strip_suffix('\\') {
                    pending = Some((stripped.trim_end().to_string(), start));
                } else {
                    self.context.line_index = Some(start);
                    self.parse_line(joined)?;
                }
            } else if let Some(stripped) = line.strip_suffix('\\') {
                pending = Some((stripped.trim_end().to_string(), i));
            } else {
                self.parse_line(line)?;
            }
        }
        if let Some((joined, start)) = pending {
            self.context.line_index = Some(start);
            self.parse_line(joined)?;
        }

        // Always push a blank line at the end to terminate trailing rules.
        self.context.line_index = None;
        self.parse_line(String::new())?;

        Ok(())
    }

    /// The line parser is where the "meat" of the parsing occurs: recipe lines, rule
    /// terminations, comments, macro assignments, and rule definitions, in that order.
    fn parse_line(&mut self, line: String) -> Result<(), MakeError> {
        // Handle recipe lines.
        let recipe_prefix = self.vars.get(".RECIPEPREFIX").value.clone();
        if line.starts_with(&recipe_prefix) {
            match &mut self.current_rule {
                None => {
                    // A prefixed blank line outside a rule is just a blank line.
                    if line.trim().is_empty() {
                        return Ok(());
                    }
                    return Err(MakeError::new(
                        ErrorKind::RecipeWithoutRule,
                        self.context.clone(),
                    ));
                }
                Some(rule) => {
                    // Strip the recipe prefix; the command is stored unexpanded and expands at
                    // execution time under the automatic-variable bindings.
                    let command = line
                        .strip_prefix(&recipe_prefix)
                        .expect("line known to start with the recipe prefix")
                        .trim()
                        .to_string();

                    if !command.is_empty() {
                        rule.commands.push(command);
                    }
                }
            }
            return Ok(());
        }

        // Anything other than recipe lines terminates a rule definition.
        if let Some(rule) = self.current_rule.take() {
            self.finish_rule(rule)?;
        }

        // Strip comments, then ignore blank lines.
        let line = match line.find(COMMENT_INDICATOR) {
            Some(pos) => &line[..pos],
            None => line.as_str(),
        };
        if line.trim().is_empty() {
            return Ok(());
        }

        // Handle macro assignments (recognized when the operator comes before any rule colon).
        if let Some((name, op, value)) = split_assignment(line) {
            let result = match op {
                AssignOp::Lazy => self.vars.set(name, value, Origin::File),
                AssignOp::Expand => {
                    let expanded = expand(value, &self.vars)
                        .map_err(|e| MakeError::new(e, self.context.clone()))?;
                    self.vars.set(name, expanded, Origin::File)
                }
                AssignOp::Append => self.vars.append(name, value, Origin::File),
                AssignOp::Condition => {
                    if self.vars.get(name).value.is_empty() {
                        self.vars.set(name, value, Origin::File)
                    } else {
                        Ok(())
                    }
                }
            };
            return result
                .map_err(|msg| MakeError::new(ErrorKind::BadMacroName(msg), self.context.clone()));
        }

        // Handle rule definitions.
        if let Some((targets, mut deps)) = line.split_once(':') {
            // If deps start with another `:`, then this is a double-colon rule.
            let mut double_colon = false;
            if let Some(rest) = deps.strip_prefix(':') {
                deps = rest;
                double_colon = true;
            }

            // A semicolon after the prerequisites starts an inline command.
            let mut inline_command = None;
            if let Some((d, command)) = deps.split_once(';') {
                inline_command = Some(command.to_string());
                deps = d;
            }

            let targets: Vec<String> = expand(targets, &self.vars)
                .map_err(|e| MakeError::new(e, self.context.clone()))?
                .split_whitespace()
                .map(|s| s.to_string())
                .collect();
            let prereqs: Vec<String> = expand(deps, &self.vars)
                .map_err(|e| MakeError::new(e, self.context.clone()))?
                .split_whitespace()
                .map(|s| s.to_string())
                .collect();

            if targets.is_empty() {
                return Err(MakeError::new(ErrorKind::InvalidLine, self.context.clone()));
            }

            self.current_rule = Some(PendingRule {
                targets,
                prereqs,
                commands: vec![],
                double_colon,
                context: self.context.clone(),
            });

            // Add the inline command if we found one.
            if let Some(command) = inline_command {
                self.parse_line(format!("{}{}", recipe_prefix, command))?;
            }

            return Ok(());
        }

        // Otherwise, throw an error if the line is not recognizable.
        Err(MakeError::new(ErrorKind::InvalidLine, self.context.clone()))
    }

    /// Close out a parsed rule: route special targets, pick a default goal, and load everything
    /// else into the name table.
    fn finish_rule(&mut self, rule: PendingRule) -> Result<(), MakeError> {
        // If there is no default target yet, see if we can assign one. Suffix transformation and
        // pseudo-target names start with a dot and never qualify.
        if self.default_target.is_none() {
            for target in &rule.targets {
                if !target.starts_with('.') {
                    self.default_target = Some(target.clone());
                    break;
                }
            }
        }

        for target in &rule.targets {
            match SpecialTarget::from_name(target) {
                Some(special) => self.apply_special(special, &rule)?,
                None => {
                    let id = self.names.intern(target);
                    let prereqs = rule.prereqs.iter().map(|p| self.names.intern(p)).collect();
                    self.names.add_rule(
                        id,
                        Rule {
                            prereqs,
                            commands: rule.commands.clone(),
                            context: rule.context.clone(),
                        },
                        rule.double_colon,
                        self.logger.as_ref(),
                    )?;
                }
            }
        }

        Ok(())
    }

    fn apply_special(&mut self, special: SpecialTarget, rule: &PendingRule) -> Result<(), MakeError> {
        match special {
            SpecialTarget::Suffixes => {
                let id = self.names.intern(SUFFIXES);
                if rule.prereqs.is_empty() {
                    // `.SUFFIXES:` with nothing clears the known list.
                    self.names[id].rules.clear();
                } else {
                    let prereqs = rule.prereqs.iter().map(|p| self.names.intern(p)).collect();
                    self.names.add_rule(
                        id,
                        Rule {
                            prereqs,
                            commands: vec![],
                            context: rule.context.clone(),
                        },
                        false,
                        self.logger.as_ref(),
                    )?;
                }
            }
            SpecialTarget::Default => {
                let id = self.names.intern(DEFAULT);
                self.names.add_rule(
                    id,
                    Rule {
                        prereqs: vec![],
                        commands: rule.commands.clone(),
                        context: rule.context.clone(),
                    },
                    false,
                    self.logger.as_ref(),
                )?;
            }
            SpecialTarget::Precious | SpecialTarget::Silent | SpecialTarget::Ignore => {
                if rule.prereqs.is_empty() {
                    // No prerequisites applies the mode globally.
                    match special {
                        SpecialTarget::Precious => self.opts.precious = true,
                        SpecialTarget::Ignore => self.opts.ignore = true,
                        _ => self.opts.silent = true,
                    }
                } else {
                    for prereq in &rule.prereqs {
                        let id = self.names.intern(prereq);
                        let flags = &mut self.names[id].flags;
                        match special {
                            SpecialTarget::Precious => flags.precious = true,
                            SpecialTarget::Ignore => flags.ignore = true,
                            _ => flags.silent = true,
                        }
                    }
                }
            }
            SpecialTarget::Phony => {
                for prereq in &rule.prereqs {
                    let id = self.names.intern(prereq);
                    self.names[id].flags.phony = true;
                }
            }
        }

        Ok(())
    }

    /// Principal interface for executing a parsed makefile, given a list of goal targets.
    /// Returns the OR-reduced exit status: `1` when query mode wants a rebuild or keep-going
    /// swallowed a failure.
    pub fn execute(&mut self, targets: Vec<String>) -> Result<u8, MakeError> {
        self.execute_with(targets, &HostFs, &ShRunner)
    }

    /// Like `execute`, but against caller-supplied capabilities.
    pub fn execute_with(
        &mut self,
        mut targets: Vec<String>,
        fs: &dyn FileSystem,
        shell: &dyn ShellRunner,
    ) -> Result<u8, MakeError> {
        if self.opts.print {
            self.print_database();
            return Ok(0);
        }

        // Set targets list to default target if none were provided.
        if targets.is_empty() {
            match &self.default_target {
                None => return Err(MakeError::new(ErrorKind::NoTargets, Context::new())),
                Some(t) => targets.push(t.clone()),
            }
        }

        let mut engine = Engine {
            names: &mut self.names,
            vars: &mut self.vars,
            opts: &self.opts,
            logger: self.logger.as_ref(),
            fs,
            shell,
        };

        let mut estat = 0;
        for target in targets {
            estat |= engine.make_target(&target)?;
        }

        Ok(estat)
    }

    /// Dump the macro store and rule graph (`-p`).
    fn print_database(&self) {
        let mut macros: Vec<_> = self.vars.iter().collect();
        macros.sort_by(|a, b| a.0.cmp(b.0));
        for (name, var) in macros {
            println!("{} = {}", name, var.value);
        }

        for id in self.names.ids() {
            let name = &self.names[id];
            let separator = if name.flags.double_colon { "::" } else { ":" };
            for rule in &name.rules {
                let deps = rule
                    .prereqs
                    .iter()
                    .map(|d| self.names[*d].name.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                println!();
                if deps.is_empty() {
                    println!("{}{}", name.name, separator);
                } else {
                    println!("{}{} {}", name.name, separator, deps);
                }
                for command in &rule.commands {
                    println!("\t{}", command);
                }
            }
        }
    }
}

/// Recognize `NAME op VALUE` assignments (`=`, `:=`, `::=`, `+=`, `?=`). Returns `None` when the
/// first `=` belongs after a rule's colon.
fn split_assignment(line: &str) -> Option<(&str, AssignOp, &str)> {
    let eq = line.find('=')?;
    let before = &line[..eq];

    // A `:=`-style operator owns its colon; any other colon first means a rule line.
    if let Some(colon) = before.find(':') {
        if !before[colon..].chars().all(|ch| ch == ':') {
            return None;
        }
    }

    let (name, op) = if let Some(name) = before.strip_suffix("::") {
        (name, AssignOp::Expand)
    } else if let Some(name) = before.strip_suffix(':') {
        (name, AssignOp::Expand)
    } else if let Some(name) = before.strip_suffix('+') {
        (name, AssignOp::Append)
    } else if let Some(name) = before.strip_suffix('?') {
        (name, AssignOp::Condition)
    } else {
        (before, AssignOp::Lazy)
    };

    Some((name.trim(), op, line[eq + 1..].trim()))
}
