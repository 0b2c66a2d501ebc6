use std::sync::Arc;

use adapter::database::ConnectionPool;
use adapter::mailer::HttpMailSender;
use adapter::queue::PgNotificationQueue;
use adapter::repository::health::HealthCheckRepositoryImpl;
use adapter::repository::meetup::MeetupRepositoryImpl;
use adapter::repository::subscription::SubscriptionRepositoryImpl;
use adapter::repository::user::UserRepositoryImpl;
use kernel::clock::{Clock, SystemClock};
use kernel::notification::{MailSender, NotificationQueue};
use kernel::repository::health::HealthCheckRepository;
use kernel::repository::meetup::MeetupRepository;
use kernel::repository::subscription::SubscriptionRepository;
use kernel::repository::user::UserRepository;
use shared::config::AppConfig;

#[derive(Clone)]
pub struct AppRegistry {
    health_check_repository: Arc<dyn HealthCheckRepository>,
    meetup_repository: Arc<dyn MeetupRepository>,
    subscription_repository: Arc<dyn SubscriptionRepository>,
    user_repository: Arc<dyn UserRepository>,
    notification_queue: Arc<dyn NotificationQueue>,
    mail_sender: Arc<dyn MailSender>,
    clock: Arc<dyn Clock>,
}

impl AppRegistry {
    pub fn new(pool: ConnectionPool, app_config: AppConfig) -> Self {
        let health_check_repository = Arc::new(HealthCheckRepositoryImpl::new(pool.clone()));
        let meetup_repository = Arc::new(MeetupRepositoryImpl::new(pool.clone()));
        let subscription_repository = Arc::new(SubscriptionRepositoryImpl::new(pool.clone()));
        let user_repository = Arc::new(UserRepositoryImpl::new(pool.clone()));
        let notification_queue = Arc::new(PgNotificationQueue::new(
            pool.clone(),
            app_config.queue.clone(),
        ));
        let mail_sender = Arc::new(HttpMailSender::new(app_config.mailer.clone()));
        Self {
            health_check_repository,
            meetup_repository,
            subscription_repository,
            user_repository,
            notification_queue,
            mail_sender,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn health_check_repository(&self) -> Arc<dyn HealthCheckRepository> {
        self.health_check_repository.clone()
    }

    pub fn meetup_repository(&self) -> Arc<dyn MeetupRepository> {
        self.meetup_repository.clone()
    }

    pub fn subscription_repository(&self) -> Arc<dyn SubscriptionRepository> {
        self.subscription_repository.clone()
    }

    pub fn user_repository(&self) -> Arc<dyn UserRepository> {
        self.user_repository.clone()
    }

    pub fn notification_queue(&self) -> Arc<dyn NotificationQueue> {
        self.notification_queue.clone()
    }

    pub fn mail_sender(&self) -> Arc<dyn MailSender> {
        self.mail_sender.clone()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }
}
