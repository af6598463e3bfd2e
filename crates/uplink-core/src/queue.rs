//! Frame queues
//!
//! Inbound and outbound traffic both move through [`FrameQueue`], a plain
//! FIFO. Transport drivers push inbound frames during their poll; the
//! dispatch loop consumes them and pushes signed responses back out. A frame
//! is owned by exactly one queue until popped and is consumed exactly once.

use std::collections::VecDeque;

use tracing::warn;

use crate::config::QueueConfig;
use crate::types::TransportKind;

// ----------------------------------------------------------------------------
// Frame
// ----------------------------------------------------------------------------

/// One transport-level unit: raw payload bytes plus the channel tag saying
/// where the bytes came from or must be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub transport: TransportKind,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(transport: TransportKind, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            transport,
            payload: payload.into(),
        }
    }

    /// Convenience constructor for text protocols.
    pub fn text(transport: TransportKind, payload: impl Into<String>) -> Self {
        Self {
            transport,
            payload: payload.into().into_bytes(),
        }
    }
}

// ----------------------------------------------------------------------------
// Frame Queue
// ----------------------------------------------------------------------------

/// FIFO buffer of frames.
///
/// Unbounded by default. With a configured capacity the queue rejects the
/// NEWEST frame once full: everything already queued represents transport
/// receipt the remote side considers delivered, so the oldest frames are the
/// ones that must survive.
#[derive(Debug)]
pub struct FrameQueue {
    frames: VecDeque<Frame>,
    capacity: Option<usize>,
    rejected: u64,
}

impl FrameQueue {
    /// Create an unbounded queue.
    pub fn new() -> Self {
        Self {
            frames: VecDeque::new(),
            capacity: None,
            rejected: 0,
        }
    }

    /// Create a queue sized by configuration.
    pub fn from_config(config: &QueueConfig) -> Self {
        Self {
            frames: VecDeque::new(),
            capacity: config.capacity,
            rejected: 0,
        }
    }

    /// Append a frame at the tail. Returns false if the capacity bound
    /// rejected it.
    pub fn push(&mut self, frame: Frame) -> bool {
        if let Some(capacity) = self.capacity {
            if self.frames.len() >= capacity {
                self.rejected += 1;
                warn!(
                    transport = %frame.transport,
                    queued = self.frames.len(),
                    rejected_total = self.rejected,
                    "frame queue full, rejecting newest frame"
                );
                return false;
            }
        }
        self.frames.push_back(frame);
        true
    }

    /// Remove and return the head frame.
    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of frames rejected by the capacity bound since creation.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}

impl Default for FrameQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
