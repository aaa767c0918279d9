// src/os/fifo.rs

//! Non-blocking read side of a named pipe.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read};
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use log::{debug, info, trace};

use crate::error::ChannelError;

/// Result of a single non-blocking read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes were placed at the front of the buffer.
    Data(usize),
    /// Nothing to read right now. Covers both "would block" and end-of-file,
    /// since a FIFO reports EOF whenever no writer is connected.
    Empty,
}

pub trait PipeChannel {
    /// Performs one read into `buf`.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, ChannelError>;

    /// Releases the descriptor. Safe to call more than once.
    fn close(&mut self);

    /// Descriptor to arm for readiness notifications, if still open.
    fn event_fd(&self) -> Option<BorrowedFd<'_>>;
}

#[derive(Debug)]
pub struct FifoChannel {
    path: PathBuf,
    file: Option<File>,
}

impl FifoChannel {
    /// Opens `path` for non-blocking reading. The path must name a FIFO.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ChannelError> {
        let path = path.as_ref().to_path_buf();
        // O_NONBLOCK also keeps the open itself from waiting for a writer.
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&path)
            .map_err(|source| ChannelError::Open {
                path: path.clone(),
                source,
            })?;

        let file_type = file
            .metadata()
            .map_err(|source| ChannelError::Open {
                path: path.clone(),
                source,
            })?
            .file_type();
        if !file_type.is_fifo() {
            return Err(ChannelError::NotAFifo { path });
        }

        info!("FifoChannel: opened {} for reading.", path.display());
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

impl PipeChannel for FifoChannel {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, ChannelError> {
        let file = self.file.as_mut().ok_or(ChannelError::Closed)?;
        loop {
            match file.read(buf) {
                Ok(0) => {
                    trace!("FifoChannel: EOF (no writer connected).");
                    return Ok(ReadOutcome::Empty);
                }
                Ok(count) => {
                    debug!("FifoChannel: read {} bytes.", count);
                    return Ok(ReadOutcome::Data(count));
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    trace!("FifoChannel: read would block.");
                    return Ok(ReadOutcome::Empty);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ChannelError::Read(e)),
            }
        }
    }

    fn close(&mut self) {
        if self.file.take().is_some() {
            debug!("FifoChannel: closed {}.", self.path.display());
        }
    }

    fn event_fd(&self) -> Option<BorrowedFd<'_>> {
        self.file.as_ref().map(AsFd::as_fd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::stat::Mode;
    use nix::unistd::mkfifo;
    use std::io::Write;

    fn temp_fifo() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("splash.fifo");
        mkfifo(&path, Mode::S_IRUSR | Mode::S_IWUSR).expect("mkfifo");
        (dir, path)
    }

    fn open_writer(path: &Path) -> File {
        // The read end is already open, so this does not block.
        OpenOptions::new().write(true).open(path).expect("open writer")
    }

    #[test_log::test]
    fn empty_without_writer() {
        let (_dir, path) = temp_fifo();
        let mut channel = FifoChannel::open(&path).unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(channel.read_available(&mut buf).unwrap(), ReadOutcome::Empty);
    }

    #[test_log::test]
    fn reads_what_a_writer_sent_then_reports_empty() {
        let (_dir, path) = temp_fifo();
        let mut channel = FifoChannel::open(&path).unwrap();
        let mut writer = open_writer(&path);
        writer.write_all(b"Loading drivers").unwrap();

        let mut buf = [0u8; 64];
        assert_eq!(channel.read_available(&mut buf).unwrap(), ReadOutcome::Data(15));
        assert_eq!(&buf[..15], b"Loading drivers");
        // Writer still connected: EAGAIN.
        assert_eq!(channel.read_available(&mut buf).unwrap(), ReadOutcome::Empty);
        drop(writer);
        // Writer gone: EOF.
        assert_eq!(channel.read_available(&mut buf).unwrap(), ReadOutcome::Empty);
    }

    #[test_log::test]
    fn reads_are_capped_at_buffer_length() {
        let (_dir, path) = temp_fifo();
        let mut channel = FifoChannel::open(&path).unwrap();
        let mut writer = open_writer(&path);
        writer.write_all(b"0123456789").unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(channel.read_available(&mut buf).unwrap(), ReadOutcome::Data(4));
        assert_eq!(channel.read_available(&mut buf).unwrap(), ReadOutcome::Data(4));
        assert_eq!(channel.read_available(&mut buf).unwrap(), ReadOutcome::Data(2));
        assert_eq!(&buf[..2], b"89");
    }

    #[test_log::test]
    fn rejects_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = FifoChannel::open(dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, ChannelError::Open { .. }));
    }

    #[test_log::test]
    fn rejects_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain");
        std::fs::write(&path, b"not a pipe").unwrap();
        let err = FifoChannel::open(&path).unwrap_err();
        assert!(matches!(err, ChannelError::NotAFifo { .. }));
    }

    #[test_log::test]
    fn close_is_idempotent_and_blocks_further_reads() {
        let (_dir, path) = temp_fifo();
        let mut channel = FifoChannel::open(&path).unwrap();
        assert!(channel.event_fd().is_some());
        channel.close();
        channel.close();
        assert!(!channel.is_open());
        assert!(channel.event_fd().is_none());
        let mut buf = [0u8; 4];
        assert!(matches!(
            channel.read_available(&mut buf),
            Err(ChannelError::Closed)
        ));
    }
}
