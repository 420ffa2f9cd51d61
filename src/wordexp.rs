//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the vbls project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::os;
use crate::shell::environment::Environment;
use crate::shell::Shell;

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// `$NAME` and `${NAME}` expansion. Unset variables expand to nothing,
/// a `$` that starts no valid reference stays literal.
pub fn expand_parameters(word: &str, env: &Environment) -> String {
    let mut result = String::with_capacity(word.len());
    let mut chars = word.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }
        match chars.peek() {
            Some('{') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if closed {
                    result.push_str(env.get(&name).unwrap_or_default());
                } else {
                    // unterminated brace reference stays literal
                    result.push_str("${");
                    result.push_str(&name);
                }
            }
            Some(&next) if is_name_char(next) => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if !is_name_char(c) {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                result.push_str(env.get(&name).unwrap_or_default());
            }
            _ => result.push('$'),
        }
    }
    result
}

/// Glob metacharacter check: `*`, `?`, or a one-character bracket
/// expression `[x]`.
fn contains_glob_characters(word: &str) -> bool {
    let bytes = word.as_bytes();
    if bytes.contains(&b'*') || bytes.contains(&b'?') {
        return true;
    }
    bytes
        .windows(3)
        .any(|w| w[0] == b'[' && w[2] == b']' && w[1] != b']')
}

/// Captured output split on LF; trailing newlines do not produce empty
/// fields, an all-empty capture produces none at all.
pub fn split_captured_lines(captured: &str) -> Vec<String> {
    let trimmed = captured.trim_end_matches('\n');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('\n').map(str::to_string).collect()
}

/// Expands one command's words into its final argv, left to right:
/// command substitution, stray separator removal, globbing, then
/// parameter expansion. Substitution and glob results are final and are
/// not parameter-expanded again.
pub fn expand_words(words: &[String], shell: &mut Shell) -> Vec<String> {
    let mut argv = Vec::with_capacity(words.len());
    for word in words {
        if word.starts_with("$(") && word.ends_with(')') {
            let inner = &word[2..word.len() - 1];
            let captured = shell.eval_substitution(inner);
            argv.extend(split_captured_lines(&captured));
        } else if word == ";" {
            // separator tokens the evaluator did not consume
        } else if contains_glob_characters(word) {
            let matches = os::glob(word);
            if matches.is_empty() {
                argv.push(word.clone());
            } else {
                argv.extend(matches);
            }
        } else {
            argv.push(expand_parameters(word, &shell.environment));
        }
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(vars: &[(&str, &str)]) -> Environment {
        let mut env = Environment::default();
        for (name, value) in vars {
            env.set(*name, *value);
        }
        env
    }

    #[test]
    fn braced_and_bare_references() {
        let env = env_with(&[("NAME", "value"), ("X", "1")]);
        assert_eq!(expand_parameters("${NAME}", &env), "value");
        assert_eq!(expand_parameters("$NAME", &env), "value");
        assert_eq!(expand_parameters("a$X-b${X}c", &env), "a1-b1c");
    }

    #[test]
    fn unset_variables_expand_empty() {
        let env = Environment::default();
        assert_eq!(expand_parameters("${MISSING}", &env), "");
        assert_eq!(expand_parameters("a$MISSING!b", &env), "a!b");
    }

    #[test]
    fn positional_parameters_are_names_too() {
        let env = env_with(&[("1", "first")]);
        assert_eq!(expand_parameters("$1", &env), "first");
    }

    #[test]
    fn lone_dollar_is_literal() {
        let env = Environment::default();
        assert_eq!(expand_parameters("100$", &env), "100$");
        assert_eq!(expand_parameters("$ x", &env), "$ x");
    }

    #[test]
    fn unterminated_brace_stays_literal() {
        let env = env_with(&[("A", "v")]);
        assert_eq!(expand_parameters("${A", &env), "${A");
    }

    #[test]
    fn glob_character_detection() {
        assert!(contains_glob_characters("*.rs"));
        assert!(contains_glob_characters("file?"));
        assert!(contains_glob_characters("file[1]"));
        assert!(!contains_glob_characters("plain"));
        assert!(!contains_glob_characters("a[]b"));
        assert!(!contains_glob_characters("[ab]"));
    }

    #[test]
    fn captured_lines_drop_trailing_newlines() {
        assert_eq!(split_captured_lines("a\nb\n"), vec!["a", "b"]);
        assert_eq!(split_captured_lines("one\n\n"), vec!["one"]);
        assert!(split_captured_lines("").is_empty());
        assert!(split_captured_lines("\n").is_empty());
    }
}
