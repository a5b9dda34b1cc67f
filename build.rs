use std::fs::File;
use std::io::Write;
use std::process::Command;

/// Run a command and keep its first line of output, or "unknown" if the
/// command isn't available (building from a tarball, no git, etc.).
fn first_line(cmd: &str, args: &[&str]) -> String {
    Command::new(cmd)
        .args(args)
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .and_then(|s| s.lines().next().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() {
    // trigger recompilation when a new migration is added
    println!("cargo:rerun-if-changed=migrations");
    // write the current git revision to VERSION.txt
    println!("cargo:rerun-if-changed=.git/HEAD");
    let sha = first_line("git", &["rev-parse", "HEAD"]);
    let date = first_line("date", &[]);
    let mut f = File::create("./VERSION.txt").expect("couldn't open VERSION.txt file for write");
    writeln!(f, "{}", sha).expect("couldn't write sha");
    writeln!(f, "{}", date).expect("couldn't write date");
}
