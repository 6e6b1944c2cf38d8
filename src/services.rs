// src/services.rs

//! Device-level services the core receives from its owner and hands through
//! to the composition manager and every display it creates.

use crate::error::{DisplayError, DisplayResult};
use log::{debug, trace, warn};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// A buffer handed out by a `BufferAllocator`.
#[derive(Debug)]
pub struct AllocatedBuffer {
    pub id: u64,
    pub data: Box<[u8]>,
}

/// Allocates backing storage for layer and scratch buffers.
pub trait BufferAllocator: Send + Sync {
    fn allocate(&self, size: usize) -> DisplayResult<AllocatedBuffer>;

    fn free(&self, buffer: AllocatedBuffer);

    /// Buffers allocated and not yet freed.
    fn outstanding(&self) -> usize;
}

pub type SharedAllocator = Arc<dyn BufferAllocator>;

/// Heap-backed allocator with an upper bound on a single allocation.
#[derive(Debug)]
pub struct HeapBufferAllocator {
    max_allocation: usize,
    next_id: AtomicU64,
    outstanding: AtomicUsize,
}

impl HeapBufferAllocator {
    pub fn new(max_allocation: usize) -> Self {
        Self {
            max_allocation,
            next_id: AtomicU64::new(1),
            outstanding: AtomicUsize::new(0),
        }
    }
}

impl Default for HeapBufferAllocator {
    fn default() -> Self {
        // 4K RGBA surface
        Self::new(3840 * 2160 * 4)
    }
}

impl BufferAllocator for HeapBufferAllocator {
    fn allocate(&self, size: usize) -> DisplayResult<AllocatedBuffer> {
        if size == 0 {
            return Err(DisplayError::Parameters);
        }
        if size > self.max_allocation {
            debug!(
                "HeapBufferAllocator: refusing {} bytes (limit {})",
                size, self.max_allocation
            );
            return Err(DisplayError::Memory);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        trace!("HeapBufferAllocator: allocated buffer {} ({} bytes)", id, size);
        Ok(AllocatedBuffer {
            id,
            data: vec![0u8; size].into_boxed_slice(),
        })
    }

    fn free(&self, buffer: AllocatedBuffer) {
        let released = self
            .outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        match released {
            Ok(_) => trace!("HeapBufferAllocator: freed buffer {}", buffer.id),
            Err(_) => warn!(
                "HeapBufferAllocator: freed buffer {} with nothing outstanding",
                buffer.id
            ),
        }
    }

    fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }
}

/// Sockets exposed by the platform's display daemons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketKind {
    /// Post-processing daemon (color, ambient light).
    PostProcessing,
    /// Display diagnostics daemon.
    Diagnostics,
}

impl SocketKind {
    fn file_name(self) -> &'static str {
        match self {
            SocketKind::PostProcessing => "pps",
            SocketKind::Diagnostics => "display-diag",
        }
    }
}

/// Resolves and connects daemon sockets.
pub trait SocketHandler: Send + Sync {
    fn socket_path(&self, kind: SocketKind) -> PathBuf;

    fn connect(&self, kind: SocketKind) -> DisplayResult<UnixStream>;
}

pub type SharedSocketHandler = Arc<dyn SocketHandler>;

/// Unix-domain sockets rooted at a single directory.
#[derive(Debug, Clone)]
pub struct UnixSocketHandler {
    socket_dir: PathBuf,
}

impl UnixSocketHandler {
    pub fn new(socket_dir: impl Into<PathBuf>) -> Self {
        Self {
            socket_dir: socket_dir.into(),
        }
    }
}

impl SocketHandler for UnixSocketHandler {
    fn socket_path(&self, kind: SocketKind) -> PathBuf {
        self.socket_dir.join(kind.file_name())
    }

    fn connect(&self, kind: SocketKind) -> DisplayResult<UnixStream> {
        let path = self.socket_path(kind);
        UnixStream::connect(&path).map_err(|e| {
            debug!("UnixSocketHandler: connect {} failed: {}", path.display(), e);
            DisplayError::Hardware(format!("connect {}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn it_should_track_outstanding_buffers() {
        let allocator = HeapBufferAllocator::new(1024);
        let a = allocator.allocate(16).unwrap();
        let b = allocator.allocate(32).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(allocator.outstanding(), 2);
        allocator.free(a);
        allocator.free(b);
        assert_eq!(allocator.outstanding(), 0);
    }

    #[test_log::test]
    fn it_should_not_underflow_when_freeing_a_foreign_buffer() {
        let owner = HeapBufferAllocator::new(1024);
        let other = HeapBufferAllocator::new(1024);
        let buffer = owner.allocate(16).unwrap();

        other.free(buffer);

        assert_eq!(other.outstanding(), 0);
        assert_eq!(owner.outstanding(), 1);
    }

    #[test_log::test]
    fn it_should_refuse_oversized_and_empty_allocations() {
        let allocator = HeapBufferAllocator::new(8);
        assert_eq!(allocator.allocate(9).unwrap_err(), DisplayError::Memory);
        assert_eq!(allocator.allocate(0).unwrap_err(), DisplayError::Parameters);
        assert_eq!(allocator.outstanding(), 0);
    }

    #[test_log::test]
    fn it_should_report_missing_sockets_as_hardware_errors() {
        let handler = UnixSocketHandler::new("/nonexistent/display-core-sockets");
        assert_eq!(
            handler.socket_path(SocketKind::PostProcessing),
            PathBuf::from("/nonexistent/display-core-sockets/pps")
        );
        assert!(matches!(
            handler.connect(SocketKind::Diagnostics),
            Err(DisplayError::Hardware(_))
        ));
    }
}
