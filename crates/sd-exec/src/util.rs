use tokio::process::{Child, Command};

pub fn cmd_program(program: &str, args: &[String]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args.iter().map(|s| s.as_str()));
    cmd
}

/// Kill the child and reap it.
pub async fn kill_graceful(child: &mut Child) -> std::io::Result<()> {
    match child.kill().await {
        Ok(()) => Ok(()),
        // Already exited between the timeout firing and the kill.
        Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
        Err(e) => Err(e),
    }
}
