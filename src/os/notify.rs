// src/os/notify.rs

//! Readiness notifications for the pipe, delivered as signals.
//!
//! The pipe descriptor is put into asynchronous I/O mode with this process as
//! owner, so the kernel raises `SIGIO` whenever a writer adds data. Rather than
//! installing a handler, the bridge keeps `SIGIO` and the termination signals
//! blocked and collects them with `sigwait`. Nothing ever runs in signal
//! context, and a signal raised while the loop is busy drawing stays pending
//! until the next wait, which then returns immediately.
//!
//! Pending standard signals coalesce, so several writes may produce a single
//! `DataReady`. Callers must therefore drain the pipe until it reports empty
//! after every event.

use std::os::fd::{AsRawFd, BorrowedFd};

use log::{debug, error, info, trace};
use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal};
use nix::unistd::getpid;

use crate::error::NotificationError;
use crate::os::fifo::PipeChannel;

/// What woke the render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// New bytes may be waiting in the pipe.
    DataReady,
    /// An interrupt or termination request arrived.
    Terminate,
}

pub trait Notifier {
    /// Registers for readiness notifications on `channel`'s descriptor.
    fn arm(&mut self, channel: &dyn PipeChannel) -> Result<(), NotificationError>;

    /// Blocks until the next event.
    fn wait_for_event(&mut self) -> Result<Event, NotificationError>;
}

/// Signals that end the session.
const TERMINATION_SIGNALS: [Signal; 3] = [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP];

fn watched_signals() -> SigSet {
    let mut set = SigSet::empty();
    set.add(Signal::SIGIO);
    for sig in TERMINATION_SIGNALS {
        set.add(sig);
    }
    set
}

fn set_sigio_handler(handler: SigHandler) -> Result<(), NotificationError> {
    let action = SigAction::new(handler, SaFlags::empty(), SigSet::empty());
    // SAFETY: only SIG_DFL / SIG_IGN are installed; no Rust code runs in
    // signal context.
    unsafe { sigaction(Signal::SIGIO, &action) }
        .map(drop)
        .map_err(NotificationError::Disposition)
}

/// Puts `fd` into O_ASYNC mode with the current process as `SIGIO` owner.
pub fn enable_async_io(fd: BorrowedFd<'_>) -> Result<(), NotificationError> {
    let raw_fd = fd.as_raw_fd();
    let pid = getpid();
    // SAFETY: F_SETOWN takes an integer argument and does not touch memory.
    if unsafe { libc::fcntl(raw_fd, libc::F_SETOWN, pid.as_raw()) } == -1 {
        return Err(NotificationError::Arm {
            op: "F_SETOWN",
            source: Errno::last(),
        });
    }

    let flags = fcntl(fd, FcntlArg::F_GETFL).map_err(|source| NotificationError::Arm {
        op: "F_GETFL",
        source,
    })?;
    let mut async_flags = OFlag::from_bits_truncate(flags);
    async_flags.insert(OFlag::O_ASYNC);
    fcntl(fd, FcntlArg::F_SETFL(async_flags)).map_err(|source| NotificationError::Arm {
        op: "F_SETFL",
        source,
    })?;
    debug!("enable_async_io: fd {} now signals pid {}.", raw_fd, pid);
    Ok(())
}

/// Signal-driven [`Notifier`].
///
/// Construction blocks the watched signals on the calling thread; the bridge
/// must be created, used and dropped on the same thread.
pub struct SignalBridge {
    watched: SigSet,
    previous_mask: SigSet,
}

impl SignalBridge {
    pub fn new() -> Result<Self, NotificationError> {
        let watched = watched_signals();
        // Block before anything can raise SIGIO: its default action kills the
        // process.
        let previous_mask = watched
            .thread_swap_mask(SigmaskHow::SIG_BLOCK)
            .map_err(NotificationError::Mask)?;
        // An ignored SIGIO is discarded at generation, even while blocked.
        if let Err(e) = set_sigio_handler(SigHandler::SigDfl) {
            if let Err(restore) = previous_mask.thread_set_mask() {
                error!("SignalBridge: failed to restore signal mask: {}", restore);
            }
            return Err(e);
        }
        debug!("SignalBridge: watching SIGIO and {:?}.", TERMINATION_SIGNALS);
        Ok(Self {
            watched,
            previous_mask,
        })
    }
}

impl Notifier for SignalBridge {
    fn arm(&mut self, channel: &dyn PipeChannel) -> Result<(), NotificationError> {
        let fd = channel.event_fd().ok_or(NotificationError::Arm {
            op: "event_fd",
            source: Errno::EBADF,
        })?;
        enable_async_io(fd)?;
        info!("SignalBridge: armed for asynchronous pipe notifications.");
        Ok(())
    }

    fn wait_for_event(&mut self) -> Result<Event, NotificationError> {
        loop {
            let signal = match self.watched.wait() {
                Ok(signal) => signal,
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(NotificationError::Wait(e)),
            };
            match signal {
                Signal::SIGIO => {
                    trace!("SignalBridge: SIGIO received.");
                    return Ok(Event::DataReady);
                }
                sig if TERMINATION_SIGNALS.contains(&sig) => {
                    info!("SignalBridge: {:?} received, requesting termination.", sig);
                    return Ok(Event::Terminate);
                }
                other => debug!("SignalBridge: ignoring unexpected {:?}.", other),
            }
        }
    }
}

/// Drops any pending instance of `signal` without changing how it is handled
/// afterwards. Setting a disposition to ignored discards what is pending.
fn discard_pending(signal: Signal) -> Result<(), NotificationError> {
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    // SAFETY: the previous action is reinstalled unchanged; no handler is
    // added by this function.
    let previous =
        unsafe { sigaction(signal, &ignore) }.map_err(NotificationError::Disposition)?;
    unsafe { sigaction(signal, &previous) }
        .map(drop)
        .map_err(NotificationError::Disposition)
}

impl Drop for SignalBridge {
    fn drop(&mut self) {
        // Discard any SIGIO still pending so unblocking cannot kill us.
        if let Err(e) = set_sigio_handler(SigHandler::SigIgn) {
            error!("SignalBridge: failed to ignore SIGIO on drop: {}", e);
        }
        // A termination request that arrived after the session ended has
        // nothing left to stop.
        for sig in TERMINATION_SIGNALS {
            if let Err(e) = discard_pending(sig) {
                error!("SignalBridge: failed to discard pending {:?}: {}", sig, e);
            }
        }
        if let Err(e) = self.previous_mask.thread_set_mask() {
            error!("SignalBridge: failed to restore signal mask: {}", e);
        }
        debug!("SignalBridge: signal mask restored.");
    }
}
