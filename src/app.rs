//! The main application logic, decoupled from the entry point.

use crate::{
    bundles::BundleInfo,
    client::NotificationClient,
    config::Config,
    core::{SubscribeInfo, Subscriber},
    error::Result,
    notification::logging_subscriber::LoggingSubscriber,
    service::{state::ServiceSettings, NotificationService, ServiceHandle},
    task_manager::TaskManager,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, instrument};

/// A handle to the running service and every task it spawned.
pub struct App {
    task_manager: TaskManager,
    service: ServiceHandle,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    pub fn service(&self) -> ServiceHandle {
        self.service.clone()
    }

    pub fn task_manager(&self) -> &TaskManager {
        &self.task_manager
    }

    /// Installs (or reinstalls) a bundle and returns a client bound to it.
    pub async fn install(&self, info: BundleInfo) -> Result<NotificationClient> {
        let bundle = info.bundle.clone();
        self.service
            .call(move |state| {
                state.install_bundle(info);
                Ok(())
            })
            .await?;
        Ok(NotificationClient::new(bundle, self.service.clone()))
    }

    /// Returns a client bound to an installed bundle.
    pub async fn client(&self, bundle: &str) -> Result<NotificationClient> {
        let name = bundle.to_string();
        let info = self
            .service
            .call(move |state| state.bundle_info(&name))
            .await?;
        Ok(NotificationClient::new(info.bundle, self.service.clone()))
    }

    /// Waits for the shutdown signal and then gracefully shuts down all tasks.
    pub async fn run(self) -> anyhow::Result<()> {
        let mut shutdown_rx = self.task_manager.get_shutdown_rx();
        // A dropped sender counts as a shutdown request.
        let _ = shutdown_rx.wait_for(|stop| *stop).await;
        info!("Shutdown signal received. Waiting for tasks to complete...");

        self.task_manager.shutdown().await;
        info!("All tasks shut down.");
        Ok(())
    }
}

/// Builder for the application.
///
/// Lets tests attach their own subscribers before any notification can be
/// published.
pub struct AppBuilder {
    config: Config,
    subscribers: Vec<(Arc<dyn Subscriber>, SubscribeInfo)>,
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            subscribers: Vec::new(),
        }
    }

    /// Attaches a subscriber at startup, bypassing the system-app check.
    pub fn subscriber(mut self, subscriber: Arc<dyn Subscriber>) -> Self {
        self.subscribers.push((subscriber, SubscribeInfo::default()));
        self
    }

    /// Starts the service actor, installs the configured bundles and attaches
    /// the startup subscribers.
    #[instrument(skip_all)]
    pub async fn build(self, shutdown_rx: watch::Receiver<bool>) -> anyhow::Result<App> {
        let config = self.config;
        let task_manager = TaskManager::new(shutdown_rx);

        let service = NotificationService::spawn(
            ServiceSettings::from(&config),
            config.service.job_queue_capacity,
            &task_manager,
        );

        let mut subscribers = self.subscribers;
        if config.service.log_events {
            info!("Event logging enabled.");
            subscribers.push((Arc::new(LoggingSubscriber::new()), SubscribeInfo::default()));
        }

        let bundles = config.bundles.clone();
        let bundle_count = bundles.len();
        service
            .call(move |state| {
                for info in bundles {
                    state.install_bundle(info);
                }
                for (subscriber, info) in subscribers {
                    state.register_subscriber(subscriber, info);
                }
                Ok(())
            })
            .await?;
        info!(bundles = bundle_count, "Notification service ready.");

        Ok(App {
            task_manager,
            service,
        })
    }
}
