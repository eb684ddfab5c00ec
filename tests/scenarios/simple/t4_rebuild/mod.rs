crate::system_test_cases!(
    {
        args: &[],
        expected_stdout: "cat dep > all\n",
        expected_stderr: "",
        expected_status: 0,
        expected_files: &[("all", "fresh\n"), ("dep", "fresh\n")],
        pre_hook: |dir: &str| {
            std::fs::write(format!("{dir}/all"), "stale\n").unwrap();
            crate::stage_newer(dir, "dep", "fresh\n");
        },
    },
);
