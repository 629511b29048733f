use std::time::Duration;

/// Fixed strings and timings used by the demo screens.
#[derive(Clone, Debug)]
pub struct DemoConfig {
    pub click_message: String,
    pub retry_label: String,
    pub fab_message: String,
    pub landing_ticks: u32,
    pub landing_tick: Duration,
    pub repository_delay: Duration,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            click_message: "click message".into(),
            retry_label: "retry".into(),
            fab_message: "click floating button".into(),
            landing_ticks: 10,
            landing_tick: Duration::from_secs(1),
            repository_delay: Duration::from_secs(1),
        }
    }
}
