// src/os/mock.rs

//! Scripted stand-ins for the pipe and the notification bridge.

use std::collections::VecDeque;
use std::io;
use std::os::fd::BorrowedFd;

use crate::error::{ChannelError, NotificationError};
use crate::os::fifo::{PipeChannel, ReadOutcome};
use crate::os::notify::{Event, Notifier};

/// One scripted result of `read_available`.
#[derive(Debug, Clone)]
pub enum ChannelStep {
    Message(Vec<u8>),
    Empty,
    Fail(io::ErrorKind),
}

/// A channel that replays a fixed sequence of reads. Once the script runs
/// out every read is `Empty`.
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    steps: VecDeque<ChannelStep>,
    closed: bool,
    reads: usize,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_message(&mut self, bytes: impl Into<Vec<u8>>) -> &mut Self {
        self.steps.push_back(ChannelStep::Message(bytes.into()));
        self
    }

    pub fn push_empty(&mut self) -> &mut Self {
        self.steps.push_back(ChannelStep::Empty);
        self
    }

    pub fn push_failure(&mut self, kind: io::ErrorKind) -> &mut Self {
        self.steps.push_back(ChannelStep::Fail(kind));
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    /// Reads still queued in the script.
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl PipeChannel for ScriptedChannel {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        self.reads += 1;
        match self.steps.pop_front() {
            Some(ChannelStep::Message(bytes)) => {
                let count = bytes.len().min(buf.len());
                buf[..count].copy_from_slice(&bytes[..count]);
                Ok(ReadOutcome::Data(count))
            }
            Some(ChannelStep::Empty) | None => Ok(ReadOutcome::Empty),
            Some(ChannelStep::Fail(kind)) => Err(ChannelError::Read(io::Error::from(kind))),
        }
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn event_fd(&self) -> Option<BorrowedFd<'_>> {
        None
    }
}

/// A notifier that replays queued events and then asks for termination.
#[derive(Debug, Default)]
pub struct ScriptedNotifier {
    events: VecDeque<Event>,
    armed: bool,
    waits: usize,
}

impl ScriptedNotifier {
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn waits(&self) -> usize {
        self.waits
    }
}

impl Notifier for ScriptedNotifier {
    fn arm(&mut self, _channel: &dyn PipeChannel) -> Result<(), NotificationError> {
        self.armed = true;
        Ok(())
    }

    fn wait_for_event(&mut self) -> Result<Event, NotificationError> {
        self.waits += 1;
        Ok(self.events.pop_front().unwrap_or(Event::Terminate))
    }
}
