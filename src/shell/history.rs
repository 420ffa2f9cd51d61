use std::io::Read;
use std::path::{Path, PathBuf};

pub const HISTORY_FILE_NAME: &str = ".vbls_history";

/// Interactive input lines, loaded from `$HOME/.vbls_history` at startup
/// and written back as one LF-joined block on normal exit.
#[derive(Default, Clone)]
pub struct History {
    entries: Vec<String>,
    path: Option<PathBuf>,
}

impl History {
    pub fn add_entry(&mut self, line: String) {
        self.entries.push(line);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn save(&self) {
        let path = match &self.path {
            Some(path) => path,
            None => return,
        };
        let contents = self.entries.join("\n");
        if let Err(err) = std::fs::write(path, contents) {
            eprintln!(
                "vbls: failed to write history file at {}, details: {err}",
                path.to_string_lossy()
            );
        }
    }
}

fn read_history_from_file(path: PathBuf) -> History {
    let file = std::fs::File::options()
        .read(true)
        .write(true)
        .create(true)
        .open(&path);
    let mut history = History {
        entries: Vec::new(),
        path: Some(path),
    };
    match file {
        Ok(mut file) => {
            let mut file_contents = String::new();
            if let Err(err) = file.read_to_string(&mut file_contents) {
                eprintln!("vbls: failed to read history file, details: {err}");
                return history;
            }
            for line in file_contents.lines() {
                history.add_entry(line.to_string());
            }
        }
        Err(err) => {
            eprintln!("vbls: failed to open history file, details: {err}");
        }
    }
    history
}

pub fn initialize_history(home: Option<&str>) -> History {
    if let Some(home) = home {
        read_history_from_file(Path::new(home).join(HISTORY_FILE_NAME))
    } else {
        History::default()
    }
}
