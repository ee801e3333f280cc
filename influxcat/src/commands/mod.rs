pub mod dump;
pub mod restore;
pub mod version;

pub use dump::*;
pub use restore::*;
pub use version::*;

use influxcat_core::InfluxcatError;

/// Attach the command and failed stage to a core error
pub(crate) fn staged(command: &str, err: InfluxcatError) -> anyhow::Error {
    let stage = err.stage();
    anyhow::Error::new(err).context(format!("{} failed during {} stage", command, stage))
}

/// The line shown on stderr when a command fails
pub fn failure_message(err: &anyhow::Error) -> String {
    format!("Error: {:#}", err)
}
