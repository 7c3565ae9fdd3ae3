use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, NotificationEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub notification_producers: Vec<EventProducer<NotificationEvent>>,
}

impl EventProducers {
    pub async fn publish_notification(&self, event: NotificationEvent) {
        for producer in &self.notification_producers {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_notification: Vec<EventHandler<NotificationEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_notification = hooks.on_notification.into_iter().map(|f| EventHandler::new(buffer_size, f)).collect();
        Self { on_notification }
    }

    pub fn producers(&self) -> EventProducers {
        EventProducers { notification_producers: self.on_notification.iter().map(|h| h.subscribe()).collect() }
    }

    pub async fn start_handlers(self) {
        for handler in self.on_notification {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_notification: Vec<Handler<NotificationEvent>>,
}

impl EventHooks {
    pub fn on_notification<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(NotificationEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_notification.push(Arc::new(f));
        self
    }

    pub fn add_notification_handler(&mut self, handler: Handler<NotificationEvent>) -> &mut Self {
        self.on_notification.push(handler);
        self
    }
}
