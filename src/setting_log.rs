use crate::error::BoxedError;
use crate::settings::LogSettings;
use log::{error, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::{Config, Handle};
use std::str::FromStr;

const LOG_PATTERN: &str = "[{d(%Y-%m-%d %H:%M:%S)}] [{l}] {m}{n}";

/// 대략 5MB
const LOG_FILE_SIZE: u64 = 500_0000;

const LOG_FILE_COUNT: u32 = 5;

pub fn setup_logger(settings: &LogSettings) -> Result<Handle, BoxedError> {
    let config = build_config(settings)?;
    let handle = log4rs::init_config(config)?;

    std::panic::set_hook(Box::new(|panic_info| {
        if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            error!("panic occurred: {s:?}");
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            error!("panic occurred: {s:?}");
        } else {
            error!("panic occurred");
        }

        if let Some(location) = panic_info.location() {
            error!(
                "panic occurred in file '{}' at line {}",
                location.file(),
                location.line(),
            );
        }
    }));

    Ok(handle)
}

/// 콘솔 + (설정된 경우) 크기 기준으로 롤링되는 파일 appender 구성
fn build_config(settings: &LogSettings) -> Result<Config, BoxedError> {
    let level = LevelFilter::from_str(&settings.level)
        .map_err(|_| format!("INVALID_LOG_LEVEL: {}", settings.level))?;

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();

    let mut builder =
        Config::builder().appender(Appender::builder().build("stdout", Box::new(stdout)));
    let mut appenders = vec!["stdout"];

    if let Some(file) = &settings.file {
        let fixed_window_roller =
            FixedWindowRoller::builder().build(&format!("{}.{{}}", file), LOG_FILE_COUNT)?;
        let size_trigger = SizeTrigger::new(LOG_FILE_SIZE);
        let compound_policy =
            CompoundPolicy::new(Box::new(size_trigger), Box::new(fixed_window_roller));
        let file_appender = RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build(file, Box::new(compound_policy))?;

        builder =
            builder.appender(Appender::builder().build("file_appender", Box::new(file_appender)));
        appenders.push("file_appender");
    }

    Ok(builder.build(Root::builder().appenders(appenders).build(level))?)
}
