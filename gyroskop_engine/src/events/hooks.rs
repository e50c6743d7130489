use std::{future::Future, pin::Pin, sync::Arc};

use log::debug;

use crate::events::{EventHandler, EventProducer, Handler, WindowClosedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub window_closed_producer: Vec<EventProducer<WindowClosedEvent>>,
}

impl EventProducers {
    pub async fn publish_window_closed(&self, event: WindowClosedEvent) {
        for producer in &self.window_closed_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_window_closed: Option<EventHandler<WindowClosedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_window_closed = hooks.on_window_closed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_window_closed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_window_closed {
            result.window_closed_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task for every registered hook. Each task ends once all of its producers have been dropped.
    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_window_closed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
            debug!("📬️ Window closed event handler started");
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_window_closed: Option<Handler<WindowClosedEvent>>,
}

impl EventHooks {
    pub fn on_window_closed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(WindowClosedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_window_closed = Some(Arc::new(f));
        self
    }
}
