//! Memory-mapped file resources.

use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use memview_common::{Result, error::Error};
use memview_page_alloc::FileMapping;

use crate::{handle::Resource, order::ByteOrder, platform, state::ResourceState};

/// Which part of a file to map, and how to present its values.
///
/// ```
/// use memview::{ByteOrder, MapOptions};
///
/// let options = MapOptions::new().offset(4096).length(64).order(ByteOrder::BigEndian);
/// assert_eq!(options.offset, 4096);
/// assert_eq!(options.length, Some(64));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapOptions {
    /// File offset of the first mapped byte. Need not be page aligned.
    pub offset: u64,
    /// Number of bytes to map; `None` maps everything from `offset` to end of file.
    pub length: Option<u64>,
    /// Byte order of the resulting view.
    pub order: ByteOrder,
}

impl MapOptions {
    pub fn new() -> MapOptions {
        MapOptions {
            offset: 0,
            length: None,
            order: ByteOrder::native(),
        }
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }
}

impl Default for MapOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// A mapped byte range of a file together with the resource state exposing it.
pub struct MappedRegion {
    mapping: Mutex<Option<FileMapping>>,
    state: Arc<ResourceState>,
    path: PathBuf,
    offset: u64,
}

impl MappedRegion {
    /// Maps the range described by `options` of the file at `path`.
    ///
    /// A read-only region opens the file for reading only; a writable region opens
    /// it for reading and writing and shares all stores with the file. The file is
    /// never extended: the range must lie within its current length.
    ///
    /// # Errors
    ///
    /// - `UnsupportedPlatform` if the host cannot map files.
    /// - `MappingFailure` if the file cannot be opened or inspected, the range lies
    ///   outside the file, or the OS refuses the mapping.
    pub fn map(path: &Path, options: &MapOptions, read_only: bool) -> Result<MappedRegion> {
        platform::check_supported()?;
        if !platform::supports_file_mapping() {
            return Err(Error::unsupported_platform(
                "memory-mapped files are not available",
            ));
        }

        let offset = options.offset;
        let fail = |length: Option<u64>, reason: String, source: Option<std::io::Error>| {
            Error::mapping(path, offset, length, reason, source)
        };

        let file = open(path, read_only)
            .map_err(|e| fail(options.length, "cannot open file".into(), Some(e)))?;
        let file_length = file
            .metadata()
            .map_err(|e| fail(options.length, "cannot read file metadata".into(), Some(e)))?
            .len();
        if offset > file_length {
            return Err(fail(
                options.length,
                format!("offset exceeds file length {file_length}"),
                None,
            ));
        }
        let length = options.length.unwrap_or(file_length - offset);
        match offset.checked_add(length) {
            Some(end) if end <= file_length => {}
            _ => {
                return Err(fail(
                    Some(length),
                    format!("range exceeds file length {file_length}"),
                    None,
                ));
            }
        }
        let len = usize::try_from(length).map_err(|_| {
            fail(Some(length), "length exceeds the address space".into(), None)
        })?;

        let mapping = FileMapping::map(&file, offset, len, read_only).map_err(|e| {
            fail(Some(length), "the system refused the mapping".into(), Some(e))
        })?;
        let state = unsafe {
            ResourceState::mapped(
                mapping.as_ptr(),
                length,
                file_length,
                options.order,
                read_only,
            )?
        };
        log::debug!(
            "mapped '{}' at offset {offset}, length {length} (read_only: {read_only})",
            path.display()
        );
        Ok(MappedRegion {
            mapping: Mutex::new(Some(mapping)),
            state,
            path: path.to_path_buf(),
            offset,
        })
    }

    pub fn state(&self) -> &Arc<ResourceState> {
        &self.state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File offset of the first mapped byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_read_only(&self) -> bool {
        self.state.is_read_only()
    }

    /// Asks the OS to bring the mapped pages into physical memory.
    ///
    /// Purely a performance hint.
    pub fn load(&self) -> Result<()> {
        log::trace!("load '{}'", self.path.display());
        let mapping = self.lock();
        let mapping = mapping.as_ref().ok_or_else(Error::use_after_release)?;
        mapping
            .prefetch()
            .map_err(|e| Error::io(self.path.display().to_string(), e))
    }

    /// Best-effort check whether the mapped pages are resident in physical memory.
    ///
    /// The answer may be stale by the time it is returned.
    pub fn is_loaded(&self) -> Result<bool> {
        let mapping = self.lock();
        let mapping = mapping.as_ref().ok_or_else(Error::use_after_release)?;
        let resident = mapping
            .is_resident()
            .map_err(|e| Error::io(self.path.display().to_string(), e))?;
        log::trace!("is_loaded '{}': {resident}", self.path.display());
        Ok(resident)
    }

    /// Synchronously writes modified pages back to the file.
    ///
    /// A no-op for read-only regions.
    pub fn force(&self) -> Result<()> {
        let mapping = self.lock();
        let mapping = mapping.as_ref().ok_or_else(Error::use_after_release)?;
        mapping
            .flush()
            .map_err(|e| Error::io(self.path.display().to_string(), e))
    }

    fn lock(&self) -> MutexGuard<'_, Option<FileMapping>> {
        self.mapping
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn open(path: &Path, read_only: bool) -> std::io::Result<File> {
    OpenOptions::new().read(true).write(!read_only).open(path)
}

impl Resource for MappedRegion {
    fn release(&self) -> Result<()> {
        let Some(mapping) = self.lock().take() else {
            return Ok(());
        };
        self.state.invalidate();
        log::debug!(
            "unmapping '{}' at offset {}, length {}",
            self.path.display(),
            self.offset,
            self.state.capacity()
        );
        mapping
            .unmap()
            .map_err(|e| Error::io(self.path.display().to_string(), e))
    }

    fn is_released(&self) -> bool {
        !self.state.is_valid()
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        // The mapping is removed after this runs; views must already see the state as released.
        self.state.invalidate();
    }
}

impl std::fmt::Debug for MappedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRegion")
            .field("path", &self.path)
            .field("offset", &self.offset)
            .field("state", &self.state)
            .finish()
    }
}
