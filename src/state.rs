// state.rs

use crate::*;

/// Shared by the HTTP and MQTT tasks. The config never changes after startup,
/// the counters are only ever bumped.
pub struct MyState {
    pub config: MyConfig,
    pub api_cnt: AtomicU64,
    pub mqtt_cnt: AtomicU64,
}

impl MyState {
    pub fn new(config: MyConfig) -> Self {
        MyState {
            config,
            api_cnt: AtomicU64::new(0),
            mqtt_cnt: AtomicU64::new(0),
        }
    }
}

// EOF
