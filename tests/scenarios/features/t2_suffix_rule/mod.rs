crate::system_test_cases!(
    {
        args: &["foo.o"],
        expected_stdout: "cat foo.c > foo.o\n",
        expected_stderr: "",
        expected_status: 0,
        expected_files: &[("foo.c", "int main;\n"), ("foo.o", "int main;\n")],
        pre_hook: |dir: &str| {
            std::fs::write(format!("{dir}/foo.c"), "int main;\n").unwrap();
        },
    },
);
