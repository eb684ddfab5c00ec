crate::system_test_cases!(
    {
        args: &[],
        expected_stdout: "make: 'all' is up to date\n",
        expected_stderr: "",
        expected_status: 0,
        expected_files: &[("dep", "d\n"), ("all", "a\n")],
        pre_hook: |dir: &str| {
            std::fs::write(format!("{dir}/dep"), "d\n").unwrap();
            crate::stage_newer(dir, "all", "a\n");
        },
    },
);
