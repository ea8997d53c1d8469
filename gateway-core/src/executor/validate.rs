use gateway_protocol::Sensitivity;

use crate::classify;
use crate::error::GatewayError;
use crate::error::Result;

/// Rejects syntactically invalid/empty commands and anything
/// `classify::classify_command` marks BLOCKED — the blocked-binary and
/// dangerous-substring lists live in `classify.rs` so a command is judged
/// BLOCKED in exactly one place, before it ever reaches the approval gate.
pub fn validate_command(command: &str) -> Result<()> {
    let parts = shlex::split(command).ok_or_else(|| GatewayError::OperationBlocked {
        reason: "invalid command syntax".to_string(),
    })?;

    if parts.first().is_none() {
        return Err(GatewayError::OperationBlocked {
            reason: "empty command".to_string(),
        });
    }

    if classify::classify_command(command) == Sensitivity::Blocked {
        return Err(GatewayError::OperationBlocked {
            reason: format!("command blocked for security: {command}"),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blocked_binaries() {
        assert!(validate_command("sudo rm -rf /").is_err());
        assert!(validate_command("/usr/bin/chown root file").is_err());
    }

    #[test]
    fn rejects_dangerous_substrings() {
        assert!(validate_command("cat secret | sh").is_err());
        assert!(validate_command("echo hi > /dev/null").is_err());
        assert!(validate_command("ls /etc/").is_err());
    }

    #[test]
    fn allows_ordinary_commands() {
        assert!(validate_command("ls -la").is_ok());
        assert!(validate_command("echo hello").is_ok());
    }

    #[test]
    fn rejects_empty_command() {
        assert!(validate_command("   ").is_err());
    }
}
