//! Order event fan-out.
//!
//! An [`EventHandler`] owns the receiving end of a bounded channel and one async callback. Any number of
//! [`EventProducer`]s publish into the channel. Every event is handled on its own task, so publishers only wait
//! when the buffer is full.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    events: mpsc::Receiver<E>,
    producer: EventProducer<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, events) = mpsc::channel(buffer_size.max(1));
        Self { events, producer: EventProducer::new(sender), handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        self.producer.clone()
    }

    /// Handles events until the last producer is dropped. Returns once every spawned job has finished.
    ///
    /// A job that panics is logged and does not stop the handler.
    pub async fn start_handler(self) {
        let Self { mut events, producer, handler } = self;
        // only external producers may keep the channel open
        drop(producer);
        debug!("📬️ Starting event handler");
        let mut jobs = JoinSet::new();
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        trace!("📬️ Handling event");
                        jobs.spawn((handler)(event));
                    },
                    None => break,
                },
                Some(done) = jobs.join_next(), if !jobs.is_empty() => log_job_result(done),
            }
        }
        if !jobs.is_empty() {
            debug!("📬️ Channel closed. Waiting for {} event jobs to complete", jobs.len());
        }
        while let Some(done) = jobs.join_next().await {
            log_job_result(done);
        }
        debug!("📬️ Event handler has shut down");
    }
}

fn log_job_result(result: Result<(), tokio::task::JoinError>) {
    match result {
        Ok(()) => trace!("📬️ Event handled"),
        Err(e) => error!("📬️ An event job did not complete. {e}"),
    }
}

pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> Clone for EventProducer<E> {
    fn clone(&self) -> Self {
        Self { sender: self.sender.clone() }
    }
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    /// Queues `event` for the handler. Events published after the handler has stopped are logged and dropped.
    pub async fn publish_event(&self, event: E) {
        if self.sender.send(event).await.is_err() {
            error!("📬️ The event handler has stopped. Event dropped.");
        }
    }
}
