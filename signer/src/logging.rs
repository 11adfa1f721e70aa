/*
 * Copyright (c) 2021 gematik GmbH
 * 
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 * 
 *    http://www.apache.org/licenses/LICENSE-2.0
 * 
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 */

use std::path::Path;

use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{load_config_file, Appender, Config, Deserializers, Logger, Root},
    encode::pattern::PatternEncoder,
    init_config,
};

use crate::error::Error;

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} {t} - {m}{n}";

/// HTTP stack crates that are capped at `Warn` in the fallback config.
const QUIET_TARGETS: &[&str] = &["hyper", "reqwest", "rustls"];

/// Initializes `log4rs` from the given config file or, if it can not be
/// loaded, with a console logger on stderr at `level`.
pub fn init_logger(config: &Path, level: LevelFilter) -> Result<(), Error> {
    init_config(load_config(config, level)?)?;

    Ok(())
}

pub fn load_config(path: &Path, level: LevelFilter) -> Result<Config, Error> {
    match load_config_file(path, Deserializers::default()) {
        Ok(config) => Ok(config),
        Err(_) => create_default_config(level),
    }
}

fn create_default_config(level: LevelFilter) -> Result<Config, Error> {
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();

    let mut builder =
        Config::builder().appender(Appender::builder().build("console", Box::new(console)));
    for target in QUIET_TARGETS {
        builder = builder.logger(Logger::builder().build(*target, level.min(LevelFilter::Warn)));
    }

    let config = builder.build(Root::builder().appender("console").build(level))?;

    Ok(config)
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn fallback_uses_requested_level() {
        let config = load_config(Path::new("does-not-exist.yml"), LevelFilter::Debug).unwrap();

        assert_eq!(config.root().level(), LevelFilter::Debug);
        assert_eq!(config.root().appenders(), &["console".to_owned()][..]);
        assert_eq!(config.appenders().len(), 1);

        let loggers = config
            .loggers()
            .iter()
            .map(|logger| (logger.name(), logger.level()))
            .collect::<Vec<_>>();
        assert_eq!(
            loggers,
            vec![
                ("hyper", LevelFilter::Warn),
                ("reqwest", LevelFilter::Warn),
                ("rustls", LevelFilter::Warn),
            ]
        );
    }

    #[test]
    fn quiet_level_is_kept() {
        let config = load_config(Path::new("does-not-exist.yml"), LevelFilter::Error).unwrap();

        assert_eq!(config.root().level(), LevelFilter::Error);
        assert!(config
            .loggers()
            .iter()
            .all(|logger| logger.level() == LevelFilter::Error));
    }
}
