use crate::config::SorterConfig;

pub fn setup_logging(config: &SorterConfig) {
    common::setup_logging(config.environment);
}
