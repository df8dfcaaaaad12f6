use crate::normalizer::naming;
use std::time::Duration;

/// A phone id to poll and where its sensors land in the state store.
#[derive(Debug, Clone, PartialEq)]
pub struct PollTarget {
    pub phone_id: String,
    pub group: String,
    pub interval: Duration,
}

impl PollTarget {
    pub fn new(phone_id: &str, interval: Duration) -> Self {
        let phone_id = phone_id.trim().to_string();
        Self {
            group: naming::group_id(&phone_id),
            phone_id,
            interval,
        }
    }
}
