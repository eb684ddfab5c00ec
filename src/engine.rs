//! The recursive evaluator: walks the prerequisite graph depth-first, compares modification
//! times, and rebuilds whatever is out of date.

mod exec;

use crate::context::Context;
use crate::error::{ErrorKind, MakeError};
use crate::fsio::{FileSystem, Timestamp};
use crate::implicit::{self, DEFAULT};
use crate::logger::Logger;
use crate::makefile::Opts;
use crate::names::{NameId, NameTable, Rule};
use crate::shell::ShellRunner;
use crate::vars::{Origin, Vars};

/// Everything one invocation threads through the recursion. Borrowing the pieces keeps the
/// evaluator free of global state and lets tests inject fake capabilities.
pub struct Engine<'a, L: Logger> {
    pub names: &'a mut NameTable,
    pub vars: &'a mut Vars,
    pub opts: &'a Opts,
    pub logger: &'a L,
    pub fs: &'a dyn FileSystem,
    pub shell: &'a dyn ShellRunner,
}

impl<L: Logger> Engine<'_, L> {
    /// Top-level entry: make one goal target. Returns `0` for success/up-to-date and `1` when
    /// query mode wants a rebuild or keep-going swallowed a failure.
    pub fn make_target(&mut self, name: &str) -> Result<u8, MakeError> {
        let id = self.names.intern(name);
        self.make(id, 0)
    }

    fn make(&mut self, id: NameId, level: usize) -> Result<u8, MakeError> {
        if self.names[id].flags.done {
            return Ok(0);
        }
        if self.names[id].flags.on_stack {
            return Err(MakeError::new(
                ErrorKind::CycleDetected(self.names[id].name.clone()),
                Context::new(),
            ));
        }

        self.names[id].flags.on_stack = true;
        let result = self.evaluate(id, level);
        self.names[id].flags.on_stack = false;
        result
    }

    fn evaluate(&mut self, id: NameId, level: usize) -> Result<u8, MakeError> {
        let name = self.names[id].name.clone();

        // `-o` pins a file as ancient and never remade.
        if self.opts.old_files.contains(&name) {
            self.names[id].flags.done = true;
            if level == 0 {
                println!("make: '{}' is up to date (old)", name);
            }
            return Ok(0);
        }

        if self.names[id].time.is_missing() {
            self.probe(id);
        }

        let mut impdep: Option<NameId> = None;
        let mut stem: Option<String> = None;

        if !self.names[id].flags.double_colon {
            // A target with no explicit commands gets one implicit shot.
            let has_commands = self.names[id].rules.iter().any(|r| !r.commands.is_empty());
            if !has_commands {
                if let Some(resolved) = implicit::resolve(self.names, self.fs, id) {
                    impdep = Some(resolved.dep);
                    stem = Some(resolved.stem);
                    self.names[id].rules.push(Rule {
                        prereqs: vec![resolved.dep],
                        commands: resolved.commands,
                        context: Context::new(),
                    });
                    self.names[id].flags.target = true;
                }
            }

            // Last resort for an undeclared, absent target: `.DEFAULT`.
            if !self.names[id].flags.target && self.names[id].time.is_missing() {
                let default_commands = self
                    .names
                    .lookup(DEFAULT)
                    .map(|d| {
                        self.names[d]
                            .rules
                            .iter()
                            .flat_map(|r| r.commands.iter().cloned())
                            .collect::<Vec<_>>()
                    })
                    .filter(|commands| !commands.is_empty());

                match default_commands {
                    Some(commands) => {
                        self.names[id].rules.push(Rule {
                            prereqs: vec![],
                            commands,
                            context: Context::new(),
                        });
                        self.names[id].flags.target = true;
                        impdep = Some(id);
                    }
                    None => {
                        return Err(MakeError::new(ErrorKind::DontKnowHow(name), Context::new()));
                    }
                }
            }
        }

        let mut dtime = Timestamp::OLDEST;
        let mut newer: Vec<String> = vec![];
        let mut estat: u8 = 0;
        let mut didsomething = false;

        for ri in 0..self.names[id].rules.len() {
            let double = self.names[id].flags.double_colon;
            let mut prereqs = self.names[id].rules[ri].prereqs.clone();
            let mut commands_override: Option<Vec<String>> = None;

            if double {
                // Each `::` rule runs with its own accounting; one without commands resolves its
                // own implicit body.
                impdep = None;
                stem = None;
                if self.names[id].rules[ri].commands.is_empty() {
                    match implicit::resolve(self.names, self.fs, id) {
                        Some(resolved) => {
                            impdep = Some(resolved.dep);
                            stem = Some(resolved.stem);
                            prereqs.insert(0, resolved.dep);
                            commands_override = Some(resolved.commands);
                        }
                        None => {
                            return Err(MakeError::new(
                                ErrorKind::DontKnowHow(name),
                                self.names[id].rules[ri].context.clone(),
                            ));
                        }
                    }
                }

                // A `::` rule left with no prerequisites runs unconditionally.
                if prereqs.is_empty() {
                    dtime = self.names[id].time;
                }
            }

            for dep in prereqs {
                estat |= self.make(dep, level + 1)?;

                // Track which prerequisites are newer than the target (but not if we were
                // invoked with -q).
                let dep_time = self.names[dep].time;
                if !self.opts.question && dep_time > self.names[id].time {
                    newer.push(self.names[dep].name.clone());
                }
                dtime = dtime.max(dep_time);
            }

            if double && !self.opts.question && self.names[id].time <= dtime {
                if estat == 0 {
                    estat |= self.rebuild(
                        id,
                        Some((ri, commands_override)),
                        &newer,
                        impdep,
                        stem.as_deref(),
                    )?;
                    dtime = Timestamp::OLDEST;
                    didsomething = true;
                }
                newer.clear();
            }
        }

        self.names[id].flags.done = true;

        let double = self.names[id].flags.double_colon;
        let time = self.names[id].time;
        // Equal timestamps are up to date, except that a `::` rule seeded with its own time must
        // still fire.
        let needs_rebuild = if double { time <= dtime } else { time < dtime };

        if self.opts.question {
            if needs_rebuild {
                self.names[id].time = Timestamp::now();
                return Ok(1);
            }
        } else if !double && needs_rebuild {
            if estat == 0 {
                estat |= self.rebuild(id, None, &newer, impdep, stem.as_deref())?;
                self.names[id].time = Timestamp::now();
            } else {
                self.logger
                    .warn(format!("'{}' not built due to errors", name), None);
            }
        } else if level == 0 && !didsomething {
            println!("make: '{}' is up to date", name);
        }

        Ok(estat)
    }

    /// Bind the automatic variables and run the chosen command block(s), touching instead when
    /// touch-mode is active.
    fn rebuild(
        &mut self,
        id: NameId,
        one_rule: Option<(usize, Option<Vec<String>>)>,
        newer: &[String],
        impdep: Option<NameId>,
        stem: Option<&str>,
    ) -> Result<u8, MakeError> {
        self.bind_automatic(id, newer, impdep, stem);

        let estat = match one_rule {
            // A chosen rule means a `::` body running on its own.
            Some((ri, commands_override)) => {
                let commands = match commands_override {
                    Some(commands) => commands,
                    None => self.names[id].rules[ri].commands.clone(),
                };
                let context = self.names[id].rules[ri].context.clone();
                self.run_commands(id, &commands, &context)?
            }
            None => {
                let mut estat = 0;
                for ri in 0..self.names[id].rules.len() {
                    let commands = self.names[id].rules[ri].commands.clone();
                    let context = self.names[id].rules[ri].context.clone();
                    estat |= self.run_commands(id, &commands, &context)?;
                }
                estat
            }
        };

        if self.opts.touch {
            self.touch_target(id);
        }

        Ok(estat)
    }

    /// Rebind `$@ $% $? $< $*` for one target invocation. Bindings are simply overwritten by the
    /// next target, classical dynamic scoping.
    fn bind_automatic(
        &mut self,
        id: NameId,
        newer: &[String],
        impdep: Option<NameId>,
        stem: Option<&str>,
    ) {
        let name = self.names[id].name.clone();
        let (file, member) = implicit::split_archive(&name);

        let _ = self.vars.set("?", newer.join(" "), Origin::Automatic);
        let _ = self.vars.set("%", member.unwrap_or(""), Origin::Automatic);
        let _ = self.vars.set("@", file, Origin::Automatic);

        match impdep {
            Some(dep) => {
                let dep_name = self.names[dep].name.clone();
                let base = member.unwrap_or(file);
                let stem_value = match stem {
                    Some(s) => s.to_string(),
                    // `.DEFAULT` has no matched suffix; strip at the last dot.
                    None => match base.rfind('.') {
                        Some(dot) => base[..dot].to_string(),
                        None => base.to_string(),
                    },
                };
                let _ = self.vars.set("<", dep_name, Origin::Automatic);
                let _ = self.vars.set("*", stem_value, Origin::Automatic);
            }
            None => {
                let _ = self.vars.set("<", "", Origin::Automatic);
                let _ = self.vars.set("*", "", Origin::Automatic);
            }
        }
    }

    /// Probe and cache the modification time, honoring `-o`/`-W` pinning.
    fn probe(&mut self, id: NameId) {
        let name = self.names[id].name.clone();
        let time = if self.names[id].flags.phony {
            // Phony targets never correspond to a file.
            Timestamp::MISSING
        } else if self.opts.old_files.contains(&name) {
            Timestamp::OLDEST
        } else if self.opts.new_files.contains(&name) {
            Timestamp::far_future()
        } else {
            // For an archive member, the archive's mtime stands in.
            let (file, _) = implicit::split_archive(&name);
            self.fs.modtime(file)
        };
        self.names[id].time = time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsio::test_support::FakeFs;
    use crate::logger::test_support::CollectingLogger;
    use crate::shell::test_support::ScriptedShell;
    use crate::shell::{ExecStatus, SIGINT};

    /// Owns everything an `Engine` borrows so tests can assert on the pieces afterwards.
    struct Fixture {
        names: NameTable,
        vars: Vars,
        opts: Opts,
        logger: CollectingLogger,
        fs: FakeFs,
        shell: ScriptedShell,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                names: NameTable::new(),
                vars: Vars::new([]),
                opts: Opts::default(),
                logger: CollectingLogger::default(),
                fs: FakeFs::default(),
                shell: ScriptedShell::default(),
            }
        }

        fn rule(&mut self, target: &str, deps: &[&str], commands: &[&str], double: bool) -> NameId {
            let id = self.names.intern(target);
            let prereqs = deps.iter().map(|d| self.names.intern(d)).collect();
            self.names
                .add_rule(
                    id,
                    Rule {
                        prereqs,
                        commands: commands.iter().map(|c| c.to_string()).collect(),
                        context: Context::new(),
                    },
                    double,
                    &self.logger,
                )
                .unwrap();
            id
        }

        fn engine(&mut self) -> Engine<'_, CollectingLogger> {
            Engine {
                names: &mut self.names,
                vars: &mut self.vars,
                opts: &self.opts,
                logger: &self.logger,
                fs: &self.fs,
                shell: &self.shell,
            }
        }

        fn ran(&self) -> Vec<String> {
            self.shell.ran.borrow().clone()
        }
    }

    #[test]
    fn test_up_to_date_target_runs_nothing() {
        let mut f = Fixture::new();
        f.rule("all", &["a"], &["echo hi"], false);
        f.fs = FakeFs::with_times(&[("all", 10), ("a", 5)]);

        assert_eq!(f.engine().make_target("all").unwrap(), 0);
        assert!(f.ran().is_empty());
    }

    #[test]
    fn test_equal_timestamps_are_up_to_date() {
        let mut f = Fixture::new();
        f.rule("all", &["a"], &["echo hi"], false);
        f.fs = FakeFs::with_times(&[("all", 5), ("a", 5)]);

        assert_eq!(f.engine().make_target("all").unwrap(), 0);
        assert!(f.ran().is_empty());
    }

    #[test]
    fn test_newer_prerequisite_triggers_rebuild() {
        let mut f = Fixture::new();
        f.rule("all", &["a"], &["echo hi"], false);
        f.fs = FakeFs::with_times(&[("all", 5), ("a", 9)]);

        assert_eq!(f.engine().make_target("all").unwrap(), 0);
        assert_eq!(f.ran(), vec!["set -e;echo hi"]);

        let all = f.names.lookup("all").unwrap();
        assert!(f.names[all].time > Timestamp::at(9));
    }

    #[test]
    fn test_missing_target_rebuilds() {
        let mut f = Fixture::new();
        f.rule("all", &[], &["echo hi"], false);

        assert_eq!(f.engine().make_target("all").unwrap(), 0);
        assert_eq!(f.ran(), vec!["set -e;echo hi"]);
    }

    #[test]
    fn test_commands_without_prereqs_run_only_when_target_is_missing() {
        let mut f = Fixture::new();
        f.rule("all", &[], &["echo hi"], false);
        f.fs = FakeFs::with_times(&[("all", 5)]);

        assert_eq!(f.engine().make_target("all").unwrap(), 0);
        assert!(f.ran().is_empty());
    }

    #[test]
    fn test_second_invocation_is_done() {
        let mut f = Fixture::new();
        f.rule("all", &[], &["echo hi"], false);

        let mut engine = f.engine();
        assert_eq!(engine.make_target("all").unwrap(), 0);
        assert_eq!(engine.make_target("all").unwrap(), 0);
        drop(engine);
        assert_eq!(f.ran().len(), 1);
    }

    #[test]
    fn test_missing_prerequisite_is_made_first() {
        let mut f = Fixture::new();
        f.rule("all", &["gen"], &["link gen"], false);
        f.rule("gen", &[], &["emit gen"], false);

        assert_eq!(f.engine().make_target("all").unwrap(), 0);
        assert_eq!(f.ran(), vec!["set -e;emit gen", "set -e;link gen"]);
    }

    #[test]
    fn test_question_mode_runs_nothing_and_reports() {
        let mut f = Fixture::new();
        f.rule("all", &["a"], &["echo hi"], false);
        f.fs = FakeFs::with_times(&[("all", 5), ("a", 9)]);
        f.opts.question = true;

        assert_eq!(f.engine().make_target("all").unwrap(), 1);
        assert!(f.ran().is_empty());

        // The in-memory timestamp was raised; disk is untouched.
        let all = f.names.lookup("all").unwrap();
        assert!(f.names[all].time > Timestamp::at(9));
        assert_eq!(f.fs.modtime("all"), Timestamp::at(5));
    }

    #[test]
    fn test_question_mode_up_to_date() {
        let mut f = Fixture::new();
        f.rule("all", &["a"], &["echo hi"], false);
        f.fs = FakeFs::with_times(&[("all", 9), ("a", 5)]);
        f.opts.question = true;

        assert_eq!(f.engine().make_target("all").unwrap(), 0);
        assert!(f.ran().is_empty());
    }

    #[test]
    fn test_unknown_target_fails() {
        let mut f = Fixture::new();
        let err = f.engine().make_target("ghost").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::DontKnowHow(name) if name == "ghost"));
    }

    #[test]
    fn test_default_rule_catches_unknown_targets() {
        let mut f = Fixture::new();
        f.rule(DEFAULT, &[], &["echo made $@"], false);

        assert_eq!(f.engine().make_target("ghost").unwrap(), 0);
        assert_eq!(f.ran(), vec!["set -e;echo made ghost"]);
    }

    #[test]
    fn test_existing_file_without_rules_is_up_to_date() {
        let mut f = Fixture::new();
        f.fs = FakeFs::with_times(&[("source.c", 7)]);

        assert_eq!(f.engine().make_target("source.c").unwrap(), 0);
        assert!(f.ran().is_empty());
    }

    #[test]
    fn test_cycle_is_detected() {
        let mut f = Fixture::new();
        f.rule("a", &["b"], &[], false);
        f.rule("b", &["a"], &[], false);

        let err = f.engine().make_target("a").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::CycleDetected(_)));
    }

    #[test]
    fn test_newer_list_feeds_automatic_vars() {
        let mut f = Fixture::new();
        f.rule("all", &["a", "b", "c"], &["echo $@: $?"], false);
        f.fs = FakeFs::with_times(&[("all", 5), ("a", 9), ("b", 3), ("c", 7)]);

        assert_eq!(f.engine().make_target("all").unwrap(), 0);
        assert_eq!(f.ran(), vec!["set -e;echo all: a c"]);
    }

    #[test]
    fn test_implicit_rule_builds_through_suffixes() {
        let mut f = Fixture::new();
        f.rule(implicit::SUFFIXES, &[".c", ".o"], &[], false);
        f.rule(".c.o", &[], &["cc -c $< -o $@"], false);
        f.fs = FakeFs::with_times(&[("foo.c", 5)]);

        assert_eq!(f.engine().make_target("foo.o").unwrap(), 0);
        assert_eq!(f.ran(), vec!["set -e;cc -c foo.c -o foo.o"]);
    }

    #[test]
    fn test_implicit_rule_binds_stem() {
        let mut f = Fixture::new();
        f.rule(implicit::SUFFIXES, &[".c", ".o"], &[], false);
        f.rule(".c.o", &[], &["cc -c $*.c -o $*.o"], false);
        f.fs = FakeFs::with_times(&[("foo.c", 5)]);

        assert_eq!(f.engine().make_target("foo.o").unwrap(), 0);
        assert_eq!(f.ran(), vec!["set -e;cc -c foo.c -o foo.o"]);
    }

    #[test]
    fn test_implicit_source_newer_than_target() {
        let mut f = Fixture::new();
        f.rule(implicit::SUFFIXES, &[".c", ".o"], &[], false);
        f.rule(".c.o", &[], &["cc -c $< -o $@"], false);
        f.fs = FakeFs::with_times(&[("foo.o", 9), ("foo.c", 5)]);

        // The object is newer than its source, so nothing runs.
        assert_eq!(f.engine().make_target("foo.o").unwrap(), 0);
        assert!(f.ran().is_empty());
    }

    #[test]
    fn test_double_colon_rules_run_independently() {
        let mut f = Fixture::new();
        f.rule("log", &[], &["echo a"], true);
        f.rule("log", &[], &["echo b"], true);

        assert_eq!(f.engine().make_target("log").unwrap(), 0);
        assert_eq!(f.ran(), vec!["set -e;echo a", "set -e;echo b"]);
    }

    #[test]
    fn test_double_colon_respects_own_prerequisites() {
        let mut f = Fixture::new();
        f.rule("out", &["fresh"], &["echo fresh-part"], true);
        f.rule("out", &["stale"], &["echo stale-part"], true);
        f.fs = FakeFs::with_times(&[("out", 5), ("fresh", 9), ("stale", 2)]);

        assert_eq!(f.engine().make_target("out").unwrap(), 0);
        assert_eq!(f.ran(), vec!["set -e;echo fresh-part"]);
    }

    #[test]
    fn test_keep_going_skips_dependents_but_not_siblings() {
        let mut f = Fixture::new();
        f.rule("all", &["bad", "good"], &["echo all"], false);
        f.rule("bad", &[], &["boom"], false);
        f.rule("good", &[], &["echo good"], false);
        f.opts.keep_going = true;
        f.shell = ScriptedShell::failing("boom", ExecStatus::Exited(1));

        assert_eq!(f.engine().make_target("all").unwrap(), 1);
        assert_eq!(f.ran(), vec!["set -e;boom", "set -e;echo good"]);
        assert!(f.logger.contains("failed to build 'bad'"));
        assert!(f.logger.contains("'all' not built due to errors"));
    }

    #[test]
    fn test_failure_without_keep_going_is_fatal() {
        let mut f = Fixture::new();
        f.rule("all", &["bad", "good"], &["echo all"], false);
        f.rule("bad", &[], &["boom"], false);
        f.rule("good", &[], &["echo good"], false);
        f.shell = ScriptedShell::failing("boom", ExecStatus::Exited(3));

        let err = f.engine().make_target("all").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::CommandFailed(3)));
        assert_eq!(err.exit_code(), 3);
        assert_eq!(f.ran(), vec!["set -e;boom"]);
    }

    #[test]
    fn test_interrupt_removes_the_target() {
        let mut f = Fixture::new();
        f.rule("out", &["src"], &["emit out"], false);
        f.fs = FakeFs::with_times(&[("out", 5), ("src", 9)]);
        f.shell = ScriptedShell::failing("emit", ExecStatus::Interrupted(SIGINT));

        let err = f.engine().make_target("out").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::CommandFailed(130)));
        assert_eq!(f.fs.unlinked.borrow().clone(), vec!["out"]);
        assert!(f.logger.contains("'out' removed"));
    }

    #[test]
    fn test_precious_target_survives_interrupt() {
        let mut f = Fixture::new();
        let out = f.rule("out", &["src"], &["emit out"], false);
        f.names[out].flags.precious = true;
        f.fs = FakeFs::with_times(&[("out", 5), ("src", 9)]);
        f.shell = ScriptedShell::failing("emit", ExecStatus::Interrupted(SIGINT));

        assert!(f.engine().make_target("out").is_err());
        assert!(f.fs.unlinked.borrow().is_empty());
    }

    #[test]
    fn test_unreachable_shell_is_fatal() {
        let mut f = Fixture::new();
        f.rule("all", &[], &["echo hi"], false);
        f.shell = ScriptedShell::failing("echo", ExecStatus::Unreachable("enoent".to_string()));

        let err = f.engine().make_target("all").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ExecFailure(_)));
    }

    #[test]
    fn test_touch_mode_touches_instead_of_running() {
        let mut f = Fixture::new();
        f.rule("all", &["a"], &["echo hi"], false);
        f.fs = FakeFs::with_times(&[("all", 5), ("a", 9)]);
        f.opts.touch = true;

        assert_eq!(f.engine().make_target("all").unwrap(), 0);
        assert!(f.ran().is_empty());
        assert_eq!(f.fs.touched.borrow().clone(), vec!["all"]);
    }

    #[test]
    fn test_phony_target_ignores_the_file() {
        let mut f = Fixture::new();
        let clean = f.rule("clean", &[], &["rm -f out"], false);
        f.names[clean].flags.phony = true;
        f.fs = FakeFs::with_times(&[("clean", 99)]);

        assert_eq!(f.engine().make_target("clean").unwrap(), 0);
        assert_eq!(f.ran(), vec!["set -e;rm -f out"]);
    }

    #[test]
    fn test_old_file_is_never_remade() {
        let mut f = Fixture::new();
        f.rule("all", &["dep"], &["echo hi"], false);
        f.opts.old_files = vec!["all".to_string()];

        assert_eq!(f.engine().make_target("all").unwrap(), 0);
        assert!(f.ran().is_empty());
    }

    #[test]
    fn test_command_prefixes() {
        let mut f = Fixture::new();
        f.rule(
            "all",
            &[],
            &["@echo quiet", "-boom", "echo after"],
            false,
        );
        f.shell = ScriptedShell::failing("boom", ExecStatus::Exited(1));

        // `-` swallows the failure, the remaining commands still run, and prefixes are stripped
        // before dispatch. An ignored command also loses the `set -e;` wrapper.
        assert_eq!(f.engine().make_target("all").unwrap(), 0);
        assert_eq!(f.ran(), vec!["set -e;echo quiet", "boom", "set -e;echo after"]);
        assert!(f.logger.contains("ignored"));
    }

    #[test]
    fn test_dry_run_skips_execution_except_plus() {
        let mut f = Fixture::new();
        f.rule("all", &[], &["echo skipped", "+echo forced"], false);
        f.opts.dry_run = true;

        assert_eq!(f.engine().make_target("all").unwrap(), 0);
        assert_eq!(f.ran(), vec!["set -e;echo forced"]);
    }

    #[test]
    fn test_global_ignore_drops_set_e() {
        let mut f = Fixture::new();
        f.rule("all", &[], &["boom"], false);
        f.opts.ignore = true;
        f.shell = ScriptedShell::failing("boom", ExecStatus::Exited(1));

        assert_eq!(f.engine().make_target("all").unwrap(), 0);
        assert_eq!(f.ran(), vec!["boom"]);
    }
}
