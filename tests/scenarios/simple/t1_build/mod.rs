crate::system_test_cases!(
    {
        args: &[],
        expected_stdout: "echo \"This is a test\" > test\n",
        expected_stderr: "",
        expected_status: 0,
        expected_files: &[("test", "This is a test\n")],
    },
    {
        args: &["test"],
        expected_stdout: "echo \"This is a test\" > test\n",
        expected_stderr: "",
        expected_status: 0,
        expected_files: &[("test", "This is a test\n")],
    },
);
