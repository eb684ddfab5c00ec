crate::system_test_cases!(
    {
        args: &[],
        expected_stdout: "echo \"prereq\" > test_prereq\ncat test_prereq > test\n",
        expected_stderr: "",
        expected_status: 0,
        expected_files: &[("test", "prereq\n"), ("test_prereq", "prereq\n")],
    },
);
