#![allow(dead_code)]
//! Test helpers for running a full application instance.

use ansd::{
    app::App, bundles::BundleInfo, client::NotificationClient, config::Config, Subscriber,
};
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, time::timeout};

pub const APP_BUNDLE: &str = "com.example.notification.test";
pub const APP_UID: i32 = 20010001;
pub const OTHER_BUNDLE: &str = "com.example.notification.other";
pub const OTHER_UID: i32 = 20010002;
pub const SYSTEM_BUNDLE: &str = "com.example.systemui";
pub const SYSTEM_UID: i32 = 1000;

/// A running application with one client per preinstalled bundle.
pub struct TestApp {
    pub app: App,
    pub shutdown_tx: watch::Sender<bool>,
    /// A normal application.
    pub client: NotificationClient,
    /// A second normal application.
    pub other: NotificationClient,
    /// A system application, allowed to call system APIs.
    pub system: NotificationClient,
}

impl TestApp {
    pub async fn start() -> Self {
        TestAppBuilder::new().start().await
    }

    /// Subscribes through the system client.
    pub async fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        self.system.subscribe(subscriber).await.unwrap();
    }

    /// Shuts down the application and waits for it to terminate.
    pub async fn shutdown(self, timeout_duration: Duration) {
        self.shutdown_tx
            .send(true)
            .expect("Failed to send shutdown signal");
        timeout(timeout_duration, self.app.run())
            .await
            .expect("App failed to shut down within the timeout")
            .expect("App returned an error");
    }
}

#[derive(Default)]
pub struct TestAppBuilder {
    pub config: Config,
    subscribers: Vec<Arc<dyn Subscriber>>,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.bundles = vec![
            BundleInfo::new(APP_BUNDLE, APP_UID),
            BundleInfo::new(OTHER_BUNDLE, OTHER_UID),
            BundleInfo::system(SYSTEM_BUNDLE, SYSTEM_UID),
        ];
        Self {
            config,
            subscribers: Vec::new(),
        }
    }

    pub fn with_config<F: FnOnce(&mut Config)>(mut self, f: F) -> Self {
        f(&mut self.config);
        self
    }

    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscriber>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    pub async fn start(self) -> TestApp {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut builder = App::builder(self.config);
        for subscriber in self.subscribers {
            builder = builder.subscriber(subscriber);
        }
        let app = builder.build(shutdown_rx).await.expect("Failed to build app");

        let client = app.client(APP_BUNDLE).await.unwrap();
        let other = app.client(OTHER_BUNDLE).await.unwrap();
        let system = app.client(SYSTEM_BUNDLE).await.unwrap();
        TestApp {
            app,
            shutdown_tx,
            client,
            other,
            system,
        }
    }
}
