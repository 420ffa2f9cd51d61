//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the vbls project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::builtin::{BuiltinIo, BuiltinResult, BuiltinUtility};
use crate::shell::Shell;
use std::iter::Peekable;
use std::str::Chars;

// a printf format conversion specifier
#[derive(Default)]
struct ConvSpec {
    spec: char,
    width: Option<usize>,
    precision: Option<usize>,
    left_justify: bool,
    sign: bool,
    space: bool,
    zero_pad: bool,
}

fn parse_number(chars: &mut Peekable<Chars>) -> Option<usize> {
    let mut number = None;
    while let Some(&c) = chars.peek() {
        if let Some(digit) = c.to_digit(10) {
            number = Some(number.unwrap_or(0) * 10 + digit as usize);
            chars.next();
        } else {
            break;
        }
    }
    number
}

fn parse_conversion(chars: &mut Peekable<Chars>) -> Result<ConvSpec, String> {
    let mut spec = ConvSpec::default();
    while let Some(&c) = chars.peek() {
        match c {
            '-' => spec.left_justify = true,
            '+' => spec.sign = true,
            ' ' => spec.space = true,
            '0' => spec.zero_pad = true,
            _ => break,
        }
        chars.next();
    }
    spec.width = parse_number(chars);
    if chars.peek() == Some(&'.') {
        chars.next();
        spec.precision = Some(parse_number(chars).unwrap_or(0));
    }
    match chars.next() {
        Some(c) if "diouxXcs".contains(c) => {
            spec.spec = c;
            Ok(spec)
        }
        Some(c) => Err(format!("printf: invalid conversion specifier '%{}'", c)),
        None => Err("printf: missing conversion specifier".to_string()),
    }
}

fn pad(text: String, spec: &ConvSpec, numeric: bool) -> String {
    let width = match spec.width {
        Some(width) if width > text.chars().count() => width,
        _ => return text,
    };
    let fill = width - text.chars().count();
    if spec.left_justify {
        let mut result = text;
        result.extend(std::iter::repeat(' ').take(fill));
        result
    } else if spec.zero_pad && numeric {
        // the sign stays in front of the zeros
        let (sign, digits) = match text.strip_prefix(['-', '+', ' ']) {
            Some(digits) => (&text[..1], digits),
            None => ("", text.as_str()),
        };
        format!("{}{}{}", sign, "0".repeat(fill), digits)
    } else {
        format!("{}{}", " ".repeat(fill), text)
    }
}

fn format_conversion(spec: &ConvSpec, argument: Option<&String>) -> Result<String, String> {
    let argument = match argument {
        Some(argument) => argument,
        None => return Err(format!("printf: missing argument for '%{}'", spec.spec)),
    };
    match spec.spec {
        's' => {
            let mut text = argument.clone();
            if let Some(precision) = spec.precision {
                text = text.chars().take(precision).collect();
            }
            Ok(pad(text, spec, false))
        }
        'c' => Ok(pad(
            argument.chars().next().map(String::from).unwrap_or_default(),
            spec,
            false,
        )),
        'd' | 'i' => {
            let number = argument
                .parse::<i64>()
                .map_err(|_| format!("printf: invalid number '{}'", argument))?;
            let text = if number >= 0 && spec.sign {
                format!("+{}", number)
            } else if number >= 0 && spec.space {
                format!(" {}", number)
            } else {
                number.to_string()
            };
            Ok(pad(text, spec, true))
        }
        'u' | 'o' | 'x' | 'X' => {
            let number = argument
                .parse::<u64>()
                .map_err(|_| format!("printf: invalid number '{}'", argument))?;
            let text = match spec.spec {
                'u' => number.to_string(),
                'o' => format!("{:o}", number),
                'x' => format!("{:x}", number),
                _ => format!("{:X}", number),
            };
            Ok(pad(text, spec, true))
        }
        _ => unreachable!("conversion was validated during parsing"),
    }
}

fn format_arguments(format: &str, arguments: &[String]) -> Result<String, String> {
    let mut output = String::new();
    let mut arguments = arguments.iter();
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '%' => {
                if chars.peek() == Some(&'%') {
                    chars.next();
                    output.push('%');
                    continue;
                }
                let spec = parse_conversion(&mut chars)?;
                output.push_str(&format_conversion(&spec, arguments.next())?);
            }
            '\\' => match chars.next() {
                Some('n') => output.push('\n'),
                Some('t') => output.push('\t'),
                Some('r') => output.push('\r'),
                Some('a') => output.push('\x07'),
                Some('e') => output.push('\x1b'),
                Some('\\') => output.push('\\'),
                Some(other) => {
                    output.push('\\');
                    output.push(other);
                }
                None => output.push('\\'),
            },
            other => output.push(other),
        }
    }
    Ok(output)
}

pub struct Printf;

impl BuiltinUtility for Printf {
    fn exec(&self, args: &[String], _: &mut Shell, io: &mut BuiltinIo) -> BuiltinResult {
        let format = match args.first() {
            Some(format) => format,
            None => return Err("printf: usage: printf format [argument...]".into()),
        };
        let output = format_arguments(format, &args[1..])?;
        io.write_out(output);
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(format: &str, args: &[&str]) -> Result<String, String> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        format_arguments(format, &args)
    }

    #[test]
    fn plain_text_and_escapes() {
        assert_eq!(fmt("a b\\tc\\n", &[]).unwrap(), "a b\tc\n");
        assert_eq!(fmt("100%%", &[]).unwrap(), "100%");
    }

    #[test]
    fn string_conversions() {
        assert_eq!(fmt("%s-%s", &["a", "b"]).unwrap(), "a-b");
        assert_eq!(fmt("[%5s]", &["ab"]).unwrap(), "[   ab]");
        assert_eq!(fmt("[%-5s]", &["ab"]).unwrap(), "[ab   ]");
        assert_eq!(fmt("[%.2s]", &["abcdef"]).unwrap(), "[ab]");
        assert_eq!(fmt("%c", &["xyz"]).unwrap(), "x");
    }

    #[test]
    fn integer_conversions() {
        assert_eq!(fmt("%d", &["42"]).unwrap(), "42");
        assert_eq!(fmt("%i", &["-7"]).unwrap(), "-7");
        assert_eq!(fmt("%05d", &["42"]).unwrap(), "00042");
        assert_eq!(fmt("%05d", &["-42"]).unwrap(), "-0042");
        assert_eq!(fmt("%+d", &["42"]).unwrap(), "+42");
        assert_eq!(fmt("%o %x %X", &["8", "255", "255"]).unwrap(), "10 ff FF");
    }

    #[test]
    fn bad_input_is_an_error() {
        assert!(fmt("%d", &["nope"]).is_err());
        assert!(fmt("%q", &["x"]).is_err());
        assert!(fmt("%s %s", &["only-one"]).is_err());
    }
}
