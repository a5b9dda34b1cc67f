use std::path::PathBuf;
// For the time being, I want to keep this as stupidly simple as possible.
// If it gets out of hand later, I can bring in clap or whatever.

/// What the binary was asked to do.
#[derive(Debug, PartialEq, Eq)]
pub enum RunMode {
    /// Run the web app. The default.
    Serve,
    /// Apply any pending schema migrations, then exit.
    Migrate,
    /// Print the schema migration status, then exit.
    Status,
}

/// The --config option lets you specify the path of the config file
/// to use. It's optional; if omitted, we'll use madang.toml in the current
/// working directory (or the built-in defaults, if that's missing too).
pub fn config_path() -> Option<PathBuf> {
    config_path_from(std::env::args())
}

/// The run mode is the first bare word on the command line.
pub fn run_mode() -> RunMode {
    run_mode_from(std::env::args().skip(1))
}

fn config_path_from(mut args: impl Iterator<Item = String>) -> Option<PathBuf> {
    args.find(|a| a == "--config")?;
    let Some(p) = args.next() else {
        // This runs before we have a tracing subscriber, so we have to log rudely.
        println!("Startup: received --config without a config path; ignoring!");
        return None;
    };
    Some(PathBuf::from(p))
}

fn run_mode_from(args: impl Iterator<Item = String>) -> RunMode {
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        match arg.as_str() {
            "--config" => skip_next = true,
            "migrate" => return RunMode::Migrate,
            "status" => return RunMode::Status,
            "serve" => return RunMode::Serve,
            other => println!("Startup: ignoring unrecognized argument {other:?}"),
        }
    }
    RunMode::Serve
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn config_flag() {
        assert_eq!(
            config_path_from(args(&["madang", "--config", "conf/madang.toml"]).into_iter()),
            Some(PathBuf::from("conf/madang.toml"))
        );
        assert_eq!(config_path_from(args(&["madang", "--config"]).into_iter()), None);
        assert_eq!(config_path_from(args(&["madang"]).into_iter()), None);
    }

    #[test]
    fn modes() {
        assert_eq!(run_mode_from(args(&[]).into_iter()), RunMode::Serve);
        assert_eq!(run_mode_from(args(&["migrate"]).into_iter()), RunMode::Migrate);
        assert_eq!(
            run_mode_from(args(&["--config", "status", "status"]).into_iter()),
            RunMode::Status
        );
        assert_eq!(
            run_mode_from(args(&["--config", "migrate"]).into_iter()),
            RunMode::Serve
        );
    }
}
