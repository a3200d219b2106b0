use scribe_core::config::SessionSettings;

/// The closed set of command forms the harness tells apart. Everything that
/// is not one of the special forms runs as a `General` shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandShape {
    /// `git clone <remote_url> [dir]`
    CloneRemote { target: Option<String> },
    /// `git pull <fork_url> ...`
    PullFork { command: String },
    /// `cd <dir>`
    ChangeDir { target: String },
    /// `git config --global ...`, run without `--global`. `setting` is the
    /// key and value when the command assigns one.
    GlobalConfig {
        local_command: String,
        setting: Option<(String, String)>,
    },
    /// `git push ...`
    Push { command: String },
    General { command: String },
}

impl CommandShape {
    pub fn classify(command: &str, settings: &SessionSettings) -> Self {
        let general = || CommandShape::General {
            command: command.to_string(),
        };
        // Unbalanced quotes are left for the shell to complain about
        let Some(words) = shlex::split(command) else {
            return general();
        };
        let words: Vec<&str> = words.iter().map(String::as_str).collect();

        match words.as_slice() {
            ["cd", target] => CommandShape::ChangeDir {
                target: target.to_string(),
            },
            ["git", "clone", url] if *url == settings.remote_url => {
                CommandShape::CloneRemote { target: None }
            }
            ["git", "clone", url, dir] if *url == settings.remote_url => {
                CommandShape::CloneRemote {
                    target: Some(dir.to_string()),
                }
            }
            ["git", "pull", rest @ ..]
                if settings
                    .fork_url
                    .as_deref()
                    .is_some_and(|fork| rest.contains(&fork)) =>
            {
                CommandShape::PullFork {
                    command: command.to_string(),
                }
            }
            ["git", "config", rest @ ..] if rest.contains(&"--global") => {
                let args: Vec<&str> = rest.iter().copied().filter(|w| *w != "--global").collect();
                let Ok(local_command) =
                    shlex::try_join(["git", "config"].into_iter().chain(args.iter().copied()))
                else {
                    return general();
                };
                let setting = match args.as_slice() {
                    [key, value] if !key.starts_with('-') => {
                        Some((key.to_string(), value.to_string()))
                    }
                    _ => None,
                };
                CommandShape::GlobalConfig {
                    local_command,
                    setting,
                }
            }
            ["git", "push", ..] => CommandShape::Push {
                command: command.to_string(),
            },
            _ => general(),
        }
    }
}
