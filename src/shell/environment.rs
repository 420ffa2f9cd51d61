use std::collections::HashMap;

/// Process-wide variable mapping. Positional parameters are stored here
/// under their digit names, so the whole map is the `execve` image for
/// child processes.
#[derive(Default, Clone)]
pub struct Environment {
    variables: HashMap<String, String>,
}

impl Environment {
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(|v| v.as_str())
    }

    pub fn unset(&mut self, name: &str) -> Option<String> {
        self.variables.remove(name)
    }

    /// `NAME=value` pairs for `execve`.
    pub fn as_execve_image(&self) -> Vec<String> {
        self.variables
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect()
    }

    /// Variables sorted by name, for the `set` listing.
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self
            .variables
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        entries.sort_by(|lhs, rhs| lhs.0.cmp(rhs.0));
        entries
    }
}

impl<I: IntoIterator<Item = (String, String)>> From<I> for Environment {
    fn from(value: I) -> Self {
        Self {
            variables: value.into_iter().collect(),
        }
    }
}

/// Renders control characters as `\` followed by `char + 96`, the form
/// the `set` listing uses.
pub fn render_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        if (c as u32) < 32 {
            result.push('\\');
            // 0..32 shifted by 96 always lands on an ASCII character
            result.push(char::from_u32(c as u32 + 96).unwrap());
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_unset() {
        let mut env = Environment::default();
        env.set("NAME", "value");
        assert_eq!(env.get("NAME"), Some("value"));
        env.set("NAME", "other");
        assert_eq!(env.get("NAME"), Some("other"));
        assert_eq!(env.unset("NAME"), Some("other".to_string()));
        assert_eq!(env.get("NAME"), None);
    }

    #[test]
    fn sorted_listing_is_ordered_by_name() {
        let mut env = Environment::default();
        env.set("B", "2");
        env.set("A", "1");
        env.set("C", "3");
        let names: Vec<_> = env.sorted().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn control_characters_render_shifted() {
        assert_eq!(render_value("a\nb"), "a\\jb");
        assert_eq!(render_value("\t"), "\\i");
        assert_eq!(render_value("\x1b"), "\\{");
        assert_eq!(render_value("plain"), "plain");
    }
}
