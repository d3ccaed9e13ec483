use async_trait::async_trait;
use mockall::mock;

use crate::errors::ServiceResult;
use crate::services::notifier::NotificationSink;

// Mock delivery transport for engine tests
mock! {
    pub NotificationSink {}

    #[async_trait]
    impl NotificationSink for NotificationSink {
        async fn send(
            &self,
            recipient_email: &str,
            subject: &str,
            text_body: &str,
            html_body: &str,
        ) -> ServiceResult<()>;
    }
}
