use std::{path::PathBuf, sync::Arc};

use clap::Args;
use fanlog::{Builder, Config, StdoutSink};

/// Shows sinks being attached while the program runs.
///
/// "Unseen" goes nowhere, "ToFile" only reaches the file, "ToFileAndPrint"
/// reaches the file and stdout.
#[derive(Args, Debug)]
pub struct Cmd {
    #[arg(default_value = "logTest.log", help = "File the demo writes to.")]
    pub path: PathBuf,
}

impl Cmd {
    pub fn run(&self, config: Config) -> eyre::Result<()> {
        let file_options = config.file_options;
        let logger = Builder::from_config(Config {
            file: None,
            stdout: false,
            stderr: false,
            ..config
        })
        .build()?;

        fanlog::info!(logger, "Unseen");

        logger.add_sink(logger.file_sink(&self.path, file_options));
        fanlog::info!(logger, "ToFile");

        logger.add_sink(Arc::new(StdoutSink::new()));
        fanlog::info!(logger, "ToFileAndPrint");

        logger.shutdown();
        Ok(())
    }
}
