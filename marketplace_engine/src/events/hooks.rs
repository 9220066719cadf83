use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    DisputeOpenedEvent,
    EventHandler,
    EventProducer,
    Handler,
    PaymentReleasedEvent,
    QcCompletedEvent,
    QuoteAcceptedEvent,
    QuoteSubmittedEvent,
};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub quote_submitted_producer: Vec<EventProducer<QuoteSubmittedEvent>>,
    pub quote_accepted_producer: Vec<EventProducer<QuoteAcceptedEvent>>,
    pub qc_completed_producer: Vec<EventProducer<QcCompletedEvent>>,
    pub payment_released_producer: Vec<EventProducer<PaymentReleasedEvent>>,
    pub dispute_opened_producer: Vec<EventProducer<DisputeOpenedEvent>>,
}

pub struct EventHandlers {
    pub on_quote_submitted: Option<EventHandler<QuoteSubmittedEvent>>,
    pub on_quote_accepted: Option<EventHandler<QuoteAcceptedEvent>>,
    pub on_qc_completed: Option<EventHandler<QcCompletedEvent>>,
    pub on_payment_released: Option<EventHandler<PaymentReleasedEvent>>,
    pub on_dispute_opened: Option<EventHandler<DisputeOpenedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_quote_submitted = hooks.on_quote_submitted.map(|f| EventHandler::new(buffer_size, f));
        let on_quote_accepted = hooks.on_quote_accepted.map(|f| EventHandler::new(buffer_size, f));
        let on_qc_completed = hooks.on_qc_completed.map(|f| EventHandler::new(buffer_size, f));
        let on_payment_released = hooks.on_payment_released.map(|f| EventHandler::new(buffer_size, f));
        let on_dispute_opened = hooks.on_dispute_opened.map(|f| EventHandler::new(buffer_size, f));
        Self { on_quote_submitted, on_quote_accepted, on_qc_completed, on_payment_released, on_dispute_opened }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_quote_submitted {
            result.quote_submitted_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_quote_accepted {
            result.quote_accepted_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_qc_completed {
            result.qc_completed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_payment_released {
            result.payment_released_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_dispute_opened {
            result.dispute_opened_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_quote_submitted {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_quote_accepted {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_qc_completed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_payment_released {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_dispute_opened {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_quote_submitted: Option<Handler<QuoteSubmittedEvent>>,
    pub on_quote_accepted: Option<Handler<QuoteAcceptedEvent>>,
    pub on_qc_completed: Option<Handler<QcCompletedEvent>>,
    pub on_payment_released: Option<Handler<PaymentReleasedEvent>>,
    pub on_dispute_opened: Option<Handler<DisputeOpenedEvent>>,
}

impl EventHooks {
    pub fn on_quote_submitted<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(QuoteSubmittedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_quote_submitted = Some(Arc::new(f));
        self
    }

    pub fn on_quote_accepted<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(QuoteAcceptedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_quote_accepted = Some(Arc::new(f));
        self
    }

    pub fn on_qc_completed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(QcCompletedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_qc_completed = Some(Arc::new(f));
        self
    }

    pub fn on_payment_released<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentReleasedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payment_released = Some(Arc::new(f));
        self
    }

    pub fn on_dispute_opened<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(DisputeOpenedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_dispute_opened = Some(Arc::new(f));
        self
    }
}
