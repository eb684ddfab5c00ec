// Both `::` bodies run, in declaration order.
crate::system_test_cases!(
    {
        args: &[],
        expected_stdout: "one\ntwo\n",
        expected_stderr: "",
        expected_status: 0,
        expected_files: &[],
    },
);
