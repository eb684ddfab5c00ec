// With `-k` the failing prerequisite taints `all`, but its sibling is still made.
crate::system_test_cases!(
    {
        args: &["-k"],
        expected_stdout: "good\n",
        expected_stderr: "make: warning: failed to build 'bad'\nmake: warning: 'all' not built due to errors\n",
        expected_status: 1,
        expected_files: &[],
    },
);
