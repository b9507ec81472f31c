// src/communication/port.rs - Newest-value data ports between components
use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortError {
    #[error("Port '{port}' is exclusive and already has a writer")]
    ExclusiveWriter { port: String },
}

/// Result of reading from an input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    /// Nothing has ever been received
    NoData,
    /// Nothing new since the last read; the cached sample is returned
    OldData,
    /// At least one new sample arrived; the newest is returned
    NewData,
}

/// How many writers an input port accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusivity {
    Exclusive,
    Shared,
}

/// Receiving end of a data connection with "read newest" semantics.
#[derive(Debug)]
pub struct InputPort<T> {
    name: String,
    exclusivity: Exclusivity,
    tx: Sender<T>,
    rx: Receiver<T>,
    writers: usize,
    last: Option<T>,
}

impl<T: Clone> InputPort<T> {
    pub fn new(name: impl Into<String>, exclusivity: Exclusivity) -> Self {
        let (tx, rx) = unbounded();
        Self {
            name: name.into(),
            exclusivity,
            tx,
            rx,
            writers: 0,
            last: None,
        }
    }

    /// Hand out a writer for this port.
    pub fn connect(&mut self) -> Result<Sender<T>, PortError> {
        if self.exclusivity == Exclusivity::Exclusive && self.writers > 0 {
            return Err(PortError::ExclusiveWriter {
                port: self.name.clone(),
            });
        }
        self.writers += 1;
        Ok(self.tx.clone())
    }

    /// Drain pending samples and copy the newest into `sample`.
    ///
    /// `sample` is left untouched on `NoData`.
    pub fn read_newest(&mut self, sample: &mut T) -> FlowStatus {
        let mut fresh = false;
        loop {
            match self.rx.try_recv() {
                Ok(value) => {
                    self.last = Some(value);
                    fresh = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        match &self.last {
            Some(value) => {
                sample.clone_from(value);
                if fresh {
                    FlowStatus::NewData
                } else {
                    FlowStatus::OldData
                }
            }
            None => FlowStatus::NoData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exclusivity(&self) -> Exclusivity {
        self.exclusivity
    }
}

/// Sending end of a data connection; fans each sample out to subscribers.
#[derive(Debug)]
pub struct OutputPort<T> {
    name: String,
    subscribers: Vec<Sender<T>>,
}

impl<T: Clone> OutputPort<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscribers: Vec::new(),
        }
    }

    pub fn connect(&mut self) -> Receiver<T> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Best-effort write; subscribers that hung up are dropped.
    pub fn write(&mut self, sample: &T) {
        self.subscribers.retain(|tx| tx.send(sample.clone()).is_ok());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
