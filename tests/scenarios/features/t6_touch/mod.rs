// `-t` updates the target's timestamp instead of running its commands.
crate::system_test_cases!(
    {
        args: &["-t"],
        expected_stdout: "touch all\n",
        expected_stderr: "",
        expected_status: 0,
        expected_files: &[("all", "stale\n"), ("dep", "fresh\n")],
        pre_hook: |dir: &str| {
            std::fs::write(format!("{dir}/all"), "stale\n").unwrap();
            crate::stage_newer(dir, "dep", "fresh\n");
        },
    },
);
