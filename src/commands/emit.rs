use std::sync::Arc;

use clap::Args;
use fanlog::{Builder, Config, Level, StdoutSink};

#[derive(Args, Debug)]
pub struct Cmd {
    #[arg(help = "Level of the line: debug, info, warn, error or fatal.")]
    pub level: Level,

    #[arg(required = true, help = "Message words, joined with spaces.")]
    pub message: Vec<String>,
}

impl Cmd {
    pub fn run(&self, config: Config) -> eyre::Result<()> {
        if matches!(self.level, Level::All | Level::Off) {
            return Err(eyre::eyre!(
                "'{}' is a threshold, not a level a line can be logged at",
                self.level
            ));
        }

        let logger = Builder::from_config(config).build()?;
        if logger.sink_count() == 0 {
            logger.add_sink(Arc::new(StdoutSink::new()));
        }
        logger.init()?;

        log::debug!(target: "fanlog", "emitting one line at {}", self.level);
        logger.log_at(
            self.level,
            fanlog::call_site!(),
            format_args!("{}", self.message.join(" ")),
        );

        logger.shutdown();
        Ok(())
    }
}
