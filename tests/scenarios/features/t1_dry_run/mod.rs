// `-n` prints every command, even `@`-silenced ones, and runs none of them.
crate::system_test_cases!(
    {
        args: &["-n"],
        expected_stdout: "echo hi > test\n",
        expected_stderr: "",
        expected_status: 0,
        expected_files: &[("test", "")],
    },
);
