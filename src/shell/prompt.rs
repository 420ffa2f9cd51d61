use crate::os;
use crate::shell::environment::Environment;

pub const DEFAULT_PS1: &str = "% ";

fn abbreviate_home(path: &str, home: Option<&str>) -> String {
    if let Some(home) = home {
        if !home.is_empty() {
            if let Some(rest) = path.strip_prefix(home) {
                if rest.is_empty() || rest.starts_with('/') {
                    return format!("~{}", rest);
                }
            }
        }
    }
    path.to_string()
}

fn basename(path: &str) -> &str {
    if path == "/" {
        return "/";
    }
    path.rsplit('/').next().unwrap_or(path)
}

/// Expands the `PS1` escapes. Unrecognized escapes pass through as-is.
pub fn expand_prompt(ps1: &str, env: &Environment, version: &str) -> String {
    let cwd = env.get("PWD").unwrap_or("/").to_string();
    let home = env.get("HOME");
    let mut result = String::with_capacity(ps1.len());
    let mut chars = ps1.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('W') => {
                let abbreviated = abbreviate_home(&cwd, home);
                result.push_str(basename(&abbreviated));
            }
            Some('w') => result.push_str(&abbreviate_home(&cwd, home)),
            Some('h') => result.push_str(&os::node_name().unwrap_or_default()),
            Some('v') => result.push_str(version),
            Some('s') => result.push_str("vbls"),
            Some('u') => result.push_str(env.get("USER").unwrap_or_default()),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}
