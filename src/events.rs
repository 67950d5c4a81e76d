//! Change notification for hosts that render the overview.
//!
//! Core logic mutates its state and then emits events; UI layers subscribe
//! and redraw. A subscription is an `mpsc` receiver, so a host may drain it
//! on whatever thread owns the window.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::canvas::ItemId;

/// Fan-out of events to any number of subscribers.
///
/// Subscribers that dropped their receiver are pruned on the next emit.
#[derive(Debug)]
pub struct Notifier<T> {
    subscribers: Vec<Sender<T>>,
}

impl<T: Clone> Notifier<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Register a new subscriber.
    pub fn subscribe(&mut self) -> Receiver<T> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Send `event` to every live subscriber.
    pub fn emit(&mut self, event: T) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<T: Clone> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Changes to the item collection.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// The whole collection was swapped out.
    Replaced { count: usize },
    /// Positions or scales of these items changed.
    Moved(Vec<ItemId>),
    /// These items changed image: thumbnail, full resolution, or released back.
    ImagesUpdated(Vec<ItemId>),
}

/// Changes to view state that live outside the store.
#[derive(Debug, Clone, PartialEq)]
pub enum OverviewEvent {
    /// Pan or zoom changed.
    CameraChanged,
    /// The selected set changed.
    SelectionChanged,
    /// A gesture preview (move offset or group scale) changed.
    PreviewChanged,
    /// The user double-clicked an item; the single-image editor should open it.
    OpenInEditor(ItemId),
}
