use serde::{Deserialize, Serialize};

use super::SubscriberEmail;

/// One entry of the local subscriber list file.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Subscriber {
    pub email: SubscriberEmail,
    #[serde(default)]
    pub name: Option<String>,
}
