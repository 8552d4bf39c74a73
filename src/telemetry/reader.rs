use super::layout::segment_name;
use super::layout::unpack_name;
use super::layout::EquityRecord;
use super::layout::Segment;
use super::layout::MAX_HANDS;
use crate::error::EngineError;
use std::ffi::CString;
use std::sync::atomic::Ordering;

/// retries before a hung writer is surfaced as a failure
pub const RETRY_BUDGET: usize = 1000;

/// consistent copy of the header payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSnapshot {
    pub job_start_ns: u64,
    pub hands_processed: u64,
    pub last_update_ns: u64,
    pub status: u8,
}

/// Reader side of the telemetry segment, safe to run in a sibling
/// process. Every read follows the seqlock protocol: load seq with
/// Acquire, bail on odd, copy the payload, reload seq, retry on
/// mismatch. The retry budget turns a dead writer into an error
/// instead of a spin.
pub struct TelemetryReader {
    name: CString,
    segment: *const Segment,
}

unsafe impl Send for TelemetryReader {}

impl TelemetryReader {
    pub fn open(job_id: &str) -> Result<Self, EngineError> {
        let name = CString::new(segment_name(job_id))
            .map_err(|_| EngineError::Resource("segment name contains NUL".to_string()))?;
        let size = std::mem::size_of::<Segment>();

        let fd = unsafe { libc::shm_open(name.as_ptr(), libc::O_RDONLY, 0) };
        if fd < 0 {
            return Err(EngineError::Resource(format!(
                "shm_open {}: {}",
                name.to_string_lossy(),
                std::io::Error::last_os_error()
            )));
        }
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                size,
                libc::PROT_READ,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };
        unsafe { libc::close(fd) };
        if ptr == libc::MAP_FAILED {
            return Err(EngineError::Resource(format!(
                "mmap: {}",
                std::io::Error::last_os_error()
            )));
        }
        Ok(Self {
            name,
            segment: ptr as *const Segment,
        })
    }

    fn segment(&self) -> &Segment {
        unsafe { &*self.segment }
    }

    /// torn-free copy of the header counters
    pub fn header(&self) -> Result<HeaderSnapshot, EngineError> {
        let header = &self.segment().header;
        for _ in 0..RETRY_BUDGET {
            let before = header.seq.load(Ordering::Acquire);
            if before & 1 == 1 {
                std::thread::yield_now();
                continue;
            }
            let snapshot = unsafe {
                HeaderSnapshot {
                    job_start_ns: std::ptr::read_volatile(&header.job_start_ns),
                    hands_processed: std::ptr::read_volatile(&header.hands_processed),
                    last_update_ns: std::ptr::read_volatile(&header.last_update_ns),
                    status: std::ptr::read_volatile(&header.status),
                }
            };
            let after = header.seq.load(Ordering::Acquire);
            if before == after {
                return Ok(snapshot);
            }
        }
        Err(EngineError::SeqlockHang)
    }

    /// torn-free copy of the live slice of the equity table
    pub fn results(&self) -> Result<Vec<(String, EquityRecord)>, EngineError> {
        let table = &self.segment().table;
        for _ in 0..RETRY_BUDGET {
            let before = table.seq.load(Ordering::Acquire);
            if before & 1 == 1 {
                std::thread::yield_now();
                continue;
            }
            let count =
                unsafe { std::ptr::read_volatile(&table.results_count) as usize }.min(MAX_HANDS);
            let mut rows = Vec::with_capacity(count);
            for idx in 0..count {
                let name = unsafe { std::ptr::read_volatile(&table.hand_names[idx]) };
                let record = unsafe { std::ptr::read_volatile(&table.results[idx]) };
                rows.push((unpack_name(&name), record));
            }
            let after = table.seq.load(Ordering::Acquire);
            if before == after {
                return Ok(rows);
            }
        }
        Err(EngineError::SeqlockHang)
    }

    /// remove the backing name so stale segments cannot be re-opened;
    /// the reader owns cleanup by contract
    pub fn unlink(&self) {
        unsafe {
            libc::shm_unlink(self.name.as_ptr());
        }
    }
}

impl Drop for TelemetryReader {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(
                self.segment as *mut libc::c_void,
                std::mem::size_of::<Segment>(),
            );
        }
    }
}
