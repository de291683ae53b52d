//! Notifications repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::model::{NewNotificationRow, NotificationRow};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for notification table operations.
pub trait NotificationRepository {
    /// Stores a notification.
    fn create_notification(
        &mut self,
        notification: NewNotificationRow,
    ) -> impl Future<Output = PgResult<NotificationRow>> + Send;
}

impl NotificationRepository for PgConnection {
    async fn create_notification(
        &mut self,
        notification: NewNotificationRow,
    ) -> PgResult<NotificationRow> {
        use schema::notifications;

        diesel::insert_into(notifications::table)
            .values(&notification)
            .returning(NotificationRow::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }
}
