use super::layout::pack_name;
use super::layout::segment_name;
use super::layout::EquityRecord;
use super::layout::Segment;
use super::layout::MAX_HANDS;
use super::layout::STATUS_RUNNING;
use crate::error::EngineError;
use crate::simulation::result::EquityResult;
use std::collections::BTreeMap;
use std::ffi::CString;
use std::sync::atomic::Ordering;

/// Single-writer side of the telemetry segment.
///
/// Creates the segment exclusively, publishes through the seqlock
/// discipline (seq goes odd, payload lands, seq goes even, increments
/// Release-ordered), and unmaps on drop without unlinking; the reader
/// owns the unlink so late-starting readers fail fast.
pub struct TelemetryWriter {
    name: CString,
    segment: *mut Segment,
}

// the raw mapping is written from whichever worker holds the merge
// lock; the seqlock protocol makes that safe across threads
unsafe impl Send for TelemetryWriter {}
unsafe impl Sync for TelemetryWriter {}

fn now_ns() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64)
}

impl TelemetryWriter {
    pub fn create(job_id: &str) -> Result<Self, EngineError> {
        let name = CString::new(segment_name(job_id))
            .map_err(|_| EngineError::Resource("segment name contains NUL".to_string()))?;
        let size = std::mem::size_of::<Segment>();

        let fd = unsafe {
            libc::shm_open(
                name.as_ptr(),
                libc::O_CREAT | libc::O_EXCL | libc::O_RDWR,
                0o600,
            )
        };
        if fd < 0 {
            return Err(EngineError::Resource(format!(
                "shm_open {}: {}",
                name.to_string_lossy(),
                std::io::Error::last_os_error()
            )));
        }
        if unsafe { libc::ftruncate(fd, size as libc::off_t) } < 0 {
            let e = std::io::Error::last_os_error();
            unsafe {
                libc::close(fd);
                libc::shm_unlink(name.as_ptr());
            }
            return Err(EngineError::Resource(format!("ftruncate: {}", e)));
        }
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };
        unsafe { libc::close(fd) };
        if ptr == libc::MAP_FAILED {
            let e = std::io::Error::last_os_error();
            unsafe { libc::shm_unlink(name.as_ptr()) };
            return Err(EngineError::Resource(format!("mmap: {}", e)));
        }

        let writer = Self {
            name,
            segment: ptr as *mut Segment,
        };
        // ftruncate zeroed the mapping; stamp the clock and status
        let start = now_ns();
        let segment = writer.segment;
        unsafe {
            (*segment).header.seq.store(0, Ordering::Release);
            std::ptr::write_volatile(std::ptr::addr_of_mut!((*segment).header.job_start_ns), start);
            std::ptr::write_volatile(std::ptr::addr_of_mut!((*segment).header.hands_processed), 0);
            std::ptr::write_volatile(std::ptr::addr_of_mut!((*segment).header.last_update_ns), start);
            std::ptr::write_volatile(
                std::ptr::addr_of_mut!((*segment).header.status),
                STATUS_RUNNING,
            );
            (*segment).table.seq.store(0, Ordering::Release);
            std::ptr::write_volatile(std::ptr::addr_of_mut!((*segment).table.results_count), 0);
        }
        Ok(writer)
    }

    fn segment(&self) -> &Segment {
        unsafe { &*self.segment }
    }

    /// POSIX name of the backing segment
    pub fn name(&self) -> String {
        self.name.to_string_lossy().into_owned()
    }

    pub fn update_hands(&self, count: u64) {
        let segment = self.segment;
        self.segment().header.seq.fetch_add(1, Ordering::Release);
        unsafe {
            std::ptr::write_volatile(std::ptr::addr_of_mut!((*segment).header.hands_processed), count);
            std::ptr::write_volatile(
                std::ptr::addr_of_mut!((*segment).header.last_update_ns),
                now_ns(),
            );
        }
        self.segment().header.seq.fetch_add(1, Ordering::Release);
    }

    pub fn set_status(&self, status: u8) {
        let segment = self.segment;
        self.segment().header.seq.fetch_add(1, Ordering::Release);
        unsafe {
            std::ptr::write_volatile(std::ptr::addr_of_mut!((*segment).header.status), status);
        }
        self.segment().header.seq.fetch_add(1, Ordering::Release);
    }

    /// publish the first MAX_HANDS entries of the results map
    pub fn update_results(&self, results: &BTreeMap<String, EquityResult>) {
        let segment = self.segment;
        self.segment().table.seq.fetch_add(1, Ordering::Release);
        let count = results.len().min(MAX_HANDS);
        unsafe {
            std::ptr::write_volatile(
                std::ptr::addr_of_mut!((*segment).table.results_count),
                count as u32,
            );
            for (idx, (name, result)) in results.iter().take(MAX_HANDS).enumerate() {
                std::ptr::write_volatile(
                    std::ptr::addr_of_mut!((*segment).table.hand_names[idx]),
                    pack_name(name),
                );
                std::ptr::write_volatile(
                    std::ptr::addr_of_mut!((*segment).table.results[idx]),
                    EquityRecord::from(result),
                );
            }
        }
        self.segment().table.seq.fetch_add(1, Ordering::Release);
    }
}

impl Drop for TelemetryWriter {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.segment as *mut libc::c_void, std::mem::size_of::<Segment>());
        }
    }
}
