use std::process::ExitCode;

use tracing::info;

use crate::core::error::{AppError, Result};
use crate::features::tracking_server::ServerCommand;

/// Hand the process over to the tracking server.
///
/// On Unix the current process image is replaced, so this only returns on
/// failure. Elsewhere the server runs as a child and its exit code is
/// propagated.
pub fn launch(command: &ServerCommand) -> Result<ExitCode> {
    info!("Starting tracking server: {}", command.display());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;

        let source = command.to_command().exec();
        Err(AppError::Launch {
            program: command.program.clone(),
            source,
        })
    }

    #[cfg(not(unix))]
    {
        let code = run_to_completion(command)?;
        Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
    }
}

/// Spawn the server as a child and wait for it to exit
#[cfg_attr(unix, allow(dead_code))]
pub(crate) fn run_to_completion(command: &ServerCommand) -> Result<i32> {
    let status = command
        .to_command()
        .status()
        .map_err(|source| AppError::Launch {
            program: command.program.clone(),
            source,
        })?;

    // Killed by a signal
    Ok(status.code().unwrap_or(1))
}
