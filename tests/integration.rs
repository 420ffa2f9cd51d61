use std::io::Write;
use std::process::{Command, Output, Stdio};

struct TestPlan {
    args: Vec<String>,
    stdin_data: String,
    expected_out: String,
    expected_err: String,
    expected_exit_code: i32,
}

fn run_vbls(args: &[String], stdin_data: &str, env_vars: &[(&str, &str)]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_vbls"));
    command
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in env_vars {
        command.env(key, value);
    }
    let mut child = command.spawn().expect("failed to spawn vbls");
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(stdin_data.as_bytes())
            .expect("failed to write to stdin");
    }
    child.wait_with_output().expect("failed to wait for vbls")
}

fn run_test(plan: TestPlan) {
    let output = run_vbls(&plan.args, &plan.stdin_data, &[]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, plan.expected_out);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr, plan.expected_err);

    assert_eq!(output.status.code(), Some(plan.expected_exit_code));
}

fn run_test_with_checker<F: Fn(&Output)>(args: Vec<&str>, stdin_data: &str, checker: F) {
    let args = args.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    checker(&run_vbls(&args, stdin_data, &[]));
}

/// `vbls -c COMMAND` produces exactly `expected_out` and succeeds.
fn test_command(command: &str, expected_out: &str) {
    run_test(TestPlan {
        args: vec!["-c".to_string(), command.to_string()],
        stdin_data: String::new(),
        expected_out: expected_out.to_string(),
        expected_err: String::new(),
        expected_exit_code: 0,
    });
}

/// `vbls -c COMMAND` writes `expected_err` to stderr and nothing to
/// stdout.
fn test_command_error(command: &str, expected_err: &str) {
    run_test_with_checker(vec!["-c", command], "", |output| {
        assert_eq!(String::from_utf8_lossy(&output.stdout), "");
        assert_eq!(String::from_utf8_lossy(&output.stderr), expected_err);
    });
}

#[test]
fn echo_simple_words() {
    test_command("echo hello world", "hello world\n");
}

#[test]
fn semicolon_separates_commands() {
    test_command("echo a; echo b", "a\nb\n");
}

#[test]
fn doubled_quote_in_string() {
    test_command("echo 'it''s fine'", "it's fine\n");
}

#[test]
fn for_loop_over_word_list() {
    test_command("for x in one two three; do echo $x; end", "one\ntwo\nthree\n");
}

#[test]
fn for_list_is_fed_through_echo_nl() {
    // the word list is iterated verbatim, a leading command name is not
    // executed
    test_command(
        "for x in echo one two three; do echo $x; end",
        "echo\none\ntwo\nthree\n",
    );
}

#[test]
fn for_loop_over_substitution() {
    test_command(
        "for x in $(echo_nl a b); do echo got $x; end",
        "got a\ngot b\n",
    );
}

#[test]
fn for_restores_the_loop_variable() {
    test_command(
        "set x outer; for x in a b; do echo $x; end\necho $x",
        "a\nb\nouter\n",
    );
}

#[test]
fn for_restores_an_unset_loop_variable() {
    test_command("for y in a; do echo $y; end\necho [${y}]", "a\n[]\n");
}

#[test]
fn for_body_failure_breaks_but_continues_after_end() {
    test_command(
        "for x in a b; do false; echo body; end\necho after",
        "after\n",
    );
}

#[test]
fn if_takes_the_then_branch() {
    test_command("if equals a a; then echo yes; else echo no; end", "yes\n");
}

#[test]
fn if_takes_the_else_branch() {
    test_command("if equals a b; then echo yes; else echo no; end", "no\n");
}

#[test]
fn elseif_chains() {
    test_command(
        "if equals a b; then echo one; elseif equals a a; then echo two; else echo three; end",
        "two\n",
    );
    test_command(
        "if equals a b; then echo one; elseif equals b c; then echo two; else echo three; end",
        "three\n",
    );
}

#[test]
fn if_condition_may_be_an_external_command() {
    test_command("if false; then echo yes; else echo no; end", "no\n");
}

#[test]
fn nested_if_blocks_balance() {
    test_command(
        "if equals a a; then if equals b b; then echo nested; end\necho after; end",
        "nested\nafter\n",
    );
}

#[test]
fn command_substitution_splices_lines() {
    test_command("echo $(echo inner) tail", "inner tail\n");
}

#[test]
fn command_substitution_nests() {
    test_command("echo $(echo $(echo deep))", "deep\n");
}

#[test]
fn empty_substitution_removes_the_argument() {
    test_command("echo a $(:) b", "a b\n");
}

#[test]
fn errexit_stops_the_shell() {
    run_test(TestPlan {
        args: vec![
            "-e".to_string(),
            "-c".to_string(),
            "false; echo unreachable".to_string(),
        ],
        stdin_data: String::new(),
        expected_out: String::new(),
        expected_err: String::new(),
        expected_exit_code: 1,
    });
}

#[test]
fn errexit_via_set_builtin() {
    run_test(TestPlan {
        args: vec!["-c".to_string(), "set -e; false; echo no".to_string()],
        stdin_data: String::new(),
        expected_out: String::new(),
        expected_err: String::new(),
        expected_exit_code: 1,
    });
}

#[test]
fn cd_to_missing_directory_reports_errno_name() {
    run_test_with_checker(vec!["-c", "cd /nonexistent-vbls; echo ${PWD}"], "", |output| {
        assert_eq!(String::from_utf8_lossy(&output.stdout), "");
        assert_eq!(
            String::from_utf8_lossy(&output.stderr),
            "vbls: cd: /nonexistent-vbls: ENOENT: no such file or directory\n"
        );
        assert_eq!(output.status.code(), Some(1));
    });
}

#[test]
fn cd_updates_pwd_and_oldpwd_together() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().canonicalize().unwrap();
    let command = format!("cd {}; echo ${{PWD}}", target.to_str().unwrap());
    test_command(&command, &format!("{}\n", target.to_str().unwrap()));

    let command = format!(
        "cd {}; cd /; cd -",
        target.to_str().unwrap()
    );
    test_command(&command, &format!("{}\n", target.to_str().unwrap()));
}

#[test]
fn pipeline_wires_stdout_to_stdin() {
    test_command("echo through the pipe | cat", "through the pipe\n");
    test_command("echo a | cat | cat", "a\n");
}

#[test]
fn pipeline_inside_substitution() {
    test_command("echo $(echo x | cat) done", "x done\n");
}

#[test]
fn and_or_chains() {
    test_command("false && echo b || echo c", "c\n");
    test_command("true && echo b || echo c", "b\n");
    test_command("true || echo b && echo c", "c\n");
    test_command("false && echo a && echo b || echo fell-through", "fell-through\n");
}

#[test]
fn short_circuit_skips_a_whole_pipeline() {
    run_test_with_checker(vec!["-c", "false && echo a | cat"], "", |output| {
        assert_eq!(String::from_utf8_lossy(&output.stdout), "");
        assert_eq!(String::from_utf8_lossy(&output.stderr), "");
        assert_eq!(output.status.code(), Some(1));
    });
    test_command("true && echo a | cat", "a\n");
}

#[test]
fn leading_operator_is_an_error() {
    test_command_error("| echo x", "vbls: unexpected '|'\n");
    test_command_error("&& echo x", "vbls: unexpected '&&'\n");
}

#[test]
fn unterminated_string_is_reported() {
    test_command_error("echo 'oops", "vbls: unterminated string (near 'oops')\n");
}

#[test]
fn unterminated_substitution_is_reported() {
    test_command_error(
        "echo $(true",
        "vbls: unterminated command substitution (near '$(true')\n",
    );
}

#[test]
fn stray_semicolon_is_an_error() {
    test_command_error(";", "vbls: unexpected ';'\n");
}

#[test]
fn while_is_reserved_but_unimplemented() {
    test_command_error(
        "while true; do echo x; end",
        "vbls: 'while' is not implemented\n",
    );
}

#[test]
fn unknown_command_reports_not_found() {
    run_test_with_checker(vec!["-c", "definitely-not-a-command-vbls"], "", |output| {
        assert_eq!(
            String::from_utf8_lossy(&output.stderr),
            "vbls: definitely-not-a-command-vbls: command not found\n"
        );
        assert_eq!(output.status.code(), Some(127));
    });
}

#[test]
fn empty_quoted_string_is_an_argument() {
    test_command("printf '[%s]' ''", "[]");
}

#[test]
fn quoted_keyword_is_an_ordinary_argument() {
    test_command("echo 'if' 'end'", "if end\n");
}

#[test]
fn variable_set_and_expand_roundtrip() {
    test_command("set NAME value; echo ${NAME}", "value\n");
    test_command("set NAME a b c; echo $NAME", "a b c\n");
    test_command("echo [${UNSET_VBLS_VAR}]", "[]\n");
}

#[test]
fn alias_expands_only_the_first_word() {
    test_command("alias hi 'echo hello'; hi world; echo hi", "hello world\nhi\n");
}

#[test]
fn alias_listing() {
    test_command("alias a 'echo x'; alias", "a='echo x'\n");
    test_command("alias a 'echo x'; alias a", "a='echo x'\n");
    test_command("alias a 'echo x'; unalias a; alias", "");
}

#[test]
fn showcommands_traces_to_stderr() {
    run_test_with_checker(vec!["-x", "-c", "echo hi"], "", |output| {
        assert_eq!(String::from_utf8_lossy(&output.stdout), "hi\n");
        assert_eq!(String::from_utf8_lossy(&output.stderr), "+ 'echo hi '\n");
    });
}

#[test]
fn positional_parameters_reach_the_script() {
    let args = vec![
        "-c".to_string(),
        "echo $1 $2".to_string(),
        "alpha".to_string(),
        "beta".to_string(),
    ];
    let output = run_vbls(&args, "", &[]);
    assert_eq!(String::from_utf8_lossy(&output.stdout), "alpha beta\n");
}

#[test]
fn glob_expands_sorted_matches() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("b.txt"), "").unwrap();
    std::fs::write(dir.path().join("a.txt"), "").unwrap();
    std::fs::write(dir.path().join("other.log"), "").unwrap();
    let base = dir.path().to_str().unwrap();
    test_command(
        &format!("echo {}/*.txt", base),
        &format!("{0}/a.txt {0}/b.txt\n", base),
    );
}

#[test]
fn unmatched_glob_is_left_verbatim() {
    test_command("echo /nonexistent-vbls/*.txt", "/nonexistent-vbls/*.txt\n");
}

#[test]
fn source_evaluates_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("lib.vbls");
    std::fs::write(&script, "set GREETING hello\necho sourced $1\n").unwrap();
    let command = format!("source {}; echo ${{GREETING}}", script.to_str().unwrap());
    let args = vec!["-c".to_string(), command, "arg1".to_string()];
    let output = run_vbls(&args, "", &[]);
    // the sourced file sees the caller's positional parameters and does
    // not disturb them
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "sourced arg1\nhello\n"
    );
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn script_file_with_multiline_control_flow() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("script.vbls");
    std::fs::write(
        &script,
        "if equals $1 expected; then\n  echo match\nelse\n  echo mismatch\nend\nfor f in x y; do\n  echo item $f\nend\n",
    )
    .unwrap();
    let args = vec![script.to_str().unwrap().to_string(), "expected".to_string()];
    let output = run_vbls(&args, "", &[]);
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "match\nitem x\nitem y\n"
    );
}

#[test]
fn stdin_mode_evaluates_line_by_line() {
    let output = run_vbls(&[], "echo first\necho second\n", &[]);
    assert_eq!(String::from_utf8_lossy(&output.stdout), "first\nsecond\n");
}

#[test]
fn printf_formats_like_c() {
    test_command("printf '%s=%03d\n' x 7", "x=007\n");
    test_command_error(
        "printf '%q' x",
        "vbls: printf: invalid conversion specifier '%q'\n",
    );
}

#[test]
fn umask_prints_and_sets() {
    test_command("umask -s 027", "0027\n");
    test_command("umask 022; umask", "0022\n");
}

#[test]
fn builtins_listing_contains_the_builtin_set() {
    run_test_with_checker(vec!["-c", "builtins"], "", |output| {
        let listing = String::from_utf8_lossy(&output.stdout).to_string();
        for name in ["alias", "cd", "echo", "echo_nl", "set", "umask", "equals"] {
            assert!(listing.lines().any(|line| line == name), "missing {}", name);
        }
    });
}

#[test]
fn vbls_version_is_exported() {
    test_command(
        "echo ${VBLS_VERSION}",
        &format!("{}\n", env!("CARGO_PKG_VERSION")),
    );
}

#[test]
fn set_listing_contains_assignments() {
    run_test_with_checker(vec!["-c", "set FOO bar-baz; set"], "", |output| {
        let listing = String::from_utf8_lossy(&output.stdout).to_string();
        assert!(listing.lines().any(|line| line == "FOO=bar-baz"));
    });
}

#[test]
fn exit_builtin_sets_the_status() {
    run_test_with_checker(vec!["-c", "exit 7"], "", |output| {
        assert_eq!(output.status.code(), Some(7));
    });
    run_test_with_checker(vec!["-c", "echo before; exit 3; echo after"], "", |output| {
        assert_eq!(String::from_utf8_lossy(&output.stdout), "before\n");
        assert_eq!(output.status.code(), Some(3));
    });
}

#[test]
fn version_flag() {
    run_test_with_checker(vec!["-v"], "", |output| {
        assert_eq!(
            String::from_utf8_lossy(&output.stdout),
            format!("vbls {}\n", env!("CARGO_PKG_VERSION"))
        );
    });
}

#[test]
fn help_flag_prints_usage() {
    run_test_with_checker(vec!["--help"], "", |output| {
        assert!(String::from_utf8_lossy(&output.stdout).starts_with("usage: vbls"));
    });
}
