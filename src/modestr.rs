//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the vbls project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Symbolic permission strings of the `u+rwx,g-w,o=r` form, as accepted
//! by the `umask` builtin.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionOp {
    Add,
    Remove,
    Set,
}

#[derive(Debug, PartialEq, Eq)]
struct Action {
    op: ActionOp,
    // permission bits in the 0..=7 range
    perms: u32,
}

#[derive(Debug, PartialEq, Eq)]
struct Clause {
    user: bool,
    group: bool,
    others: bool,
    actions: Vec<Action>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Symbolic {
    clauses: Vec<Clause>,
}

pub fn parse(mode: &str) -> Result<Symbolic, String> {
    let mut clauses = Vec::new();
    for clause_str in mode.split(',') {
        let mut clause = Clause {
            user: false,
            group: false,
            others: false,
            actions: Vec::new(),
        };
        let mut chars = clause_str.chars().peekable();
        while let Some(&c) = chars.peek() {
            match c {
                'u' => clause.user = true,
                'g' => clause.group = true,
                'o' => clause.others = true,
                'a' => {
                    clause.user = true;
                    clause.group = true;
                    clause.others = true;
                }
                _ => break,
            }
            chars.next();
        }
        // an empty who-list applies to everyone
        if !clause.user && !clause.group && !clause.others {
            clause.user = true;
            clause.group = true;
            clause.others = true;
        }
        while let Some(c) = chars.next() {
            let op = match c {
                '+' => ActionOp::Add,
                '-' => ActionOp::Remove,
                '=' => ActionOp::Set,
                other => return Err(format!("invalid operator '{}' in mode '{}'", other, mode)),
            };
            let mut perms = 0;
            while let Some(&c) = chars.peek() {
                match c {
                    'r' => perms |= 4,
                    'w' => perms |= 2,
                    'x' => perms |= 1,
                    '+' | '-' | '=' => break,
                    other => {
                        return Err(format!("invalid permission '{}' in mode '{}'", other, mode))
                    }
                }
                chars.next();
            }
            clause.actions.push(Action { op, perms });
        }
        if clause.actions.is_empty() {
            return Err(format!("invalid mode '{}'", mode));
        }
        clauses.push(clause);
    }
    Ok(Symbolic { clauses })
}

/// Applies the clauses to `base` permission bits (a 0..=0o777 value).
pub fn mutate(base: u32, symbolic: &Symbolic) -> u32 {
    let mut result = base;
    for clause in &symbolic.clauses {
        for action in &clause.actions {
            let mut spread = 0;
            if clause.user {
                spread |= action.perms << 6;
            }
            if clause.group {
                spread |= action.perms << 3;
            }
            if clause.others {
                spread |= action.perms;
            }
            let mut mask = 0;
            if clause.user {
                mask |= 0o700;
            }
            if clause.group {
                mask |= 0o070;
            }
            if clause.others {
                mask |= 0o007;
            }
            match action.op {
                ActionOp::Add => result |= spread,
                ActionOp::Remove => result &= !spread,
                ActionOp::Set => result = (result & !mask) | spread,
            }
        }
    }
    result & 0o777
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_whole_classes() {
        let symbolic = parse("u=rwx,g=rx,o=rx").unwrap();
        assert_eq!(mutate(0, &symbolic), 0o755);
    }

    #[test]
    fn add_and_remove() {
        let symbolic = parse("g+w").unwrap();
        assert_eq!(mutate(0o755, &symbolic), 0o775);
        let symbolic = parse("o-rx").unwrap();
        assert_eq!(mutate(0o755, &symbolic), 0o750);
    }

    #[test]
    fn empty_who_list_is_everyone() {
        let symbolic = parse("=r").unwrap();
        assert_eq!(mutate(0o777, &symbolic), 0o444);
    }

    #[test]
    fn a_spreads_to_all_classes() {
        let symbolic = parse("a+x").unwrap();
        assert_eq!(mutate(0o644, &symbolic), 0o755);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("u*w").is_err());
        assert!(parse("u+q").is_err());
        assert!(parse("ug").is_err());
    }
}
