// `-q` runs nothing: exit 1 when a rebuild is needed, 0 when everything is current.
crate::system_test_cases!(
    {
        args: &["-q"],
        expected_stdout: "",
        expected_stderr: "",
        expected_status: 1,
        expected_files: &[("all", "stale\n"), ("dep", "fresh\n")],
        pre_hook: |dir: &str| {
            std::fs::write(format!("{dir}/all"), "stale\n").unwrap();
            crate::stage_newer(dir, "dep", "fresh\n");
        },
    },
    {
        args: &["-q"],
        expected_stdout: "",
        expected_stderr: "",
        expected_status: 0,
        expected_files: &[("dep", "d\n"), ("all", "a\n")],
        pre_hook: |dir: &str| {
            std::fs::write(format!("{dir}/dep"), "d\n").unwrap();
            crate::stage_newer(dir, "all", "a\n");
        },
    },
);
