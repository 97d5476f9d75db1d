use crate::routes::SubscribePayload;

use super::SubscriberEmail;

pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub name: Option<String>,
}

impl TryFrom<SubscribePayload> for NewSubscriber {
    type Error = String;
    fn try_from(value: SubscribePayload) -> Result<Self, Self::Error> {
        let email = SubscriberEmail::parse(value.email)?;
        Ok(Self {
            email,
            name: value.name,
        })
    }
}
