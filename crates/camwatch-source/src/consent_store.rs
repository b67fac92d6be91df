//! Consent-store poll source.
//!
//! The `ConsentStore` trait is the mock-injectable boundary; the real
//! implementation reads the Windows registry. [`sample_consent_store`]
//! enumerates both consumer groups and returns every record found.

use camwatch_core::types::{ConsumerGroup, ConsumerRecord};

use crate::error::SourceError;

/// Registry path of the webcam consent store (under `HKEY_CURRENT_USER`).
pub const WEBCAM_CONSENT_KEY: &str =
    r"Software\Microsoft\Windows\CurrentVersion\CapabilityAccessManager\ConsentStore\webcam";

/// Child key of [`WEBCAM_CONSENT_KEY`] holding non-packaged consumers.
pub const NON_PACKAGED_KEY: &str = "NonPackaged";

/// Value recording when a consumer last stopped using the camera.
pub const LAST_USED_TIME_STOP: &str = "LastUsedTimeStop";

/// Read access to a camera consent store.
///
/// Missing keys or values are `Ok(None)`, never errors.
pub trait ConsentStore: Send + Sync {
    /// Consumer ids registered under `group`, or `None` if the group key
    /// does not exist.
    fn consumers(&self, group: ConsumerGroup) -> Result<Option<Vec<String>>, SourceError>;

    /// `LastUsedTimeStop` of one consumer, or `None` if the consumer key or
    /// its value is missing.
    fn last_used_time_stop(
        &self,
        group: ConsumerGroup,
        consumer_id: &str,
    ) -> Result<Option<u64>, SourceError>;
}

impl<T: ConsentStore + ?Sized> ConsentStore for &T {
    fn consumers(&self, group: ConsumerGroup) -> Result<Option<Vec<String>>, SourceError> {
        (**self).consumers(group)
    }

    fn last_used_time_stop(
        &self,
        group: ConsumerGroup,
        consumer_id: &str,
    ) -> Result<Option<u64>, SourceError> {
        (**self).last_used_time_stop(group, consumer_id)
    }
}

impl<T: ConsentStore + ?Sized> ConsentStore for std::sync::Arc<T> {
    fn consumers(&self, group: ConsumerGroup) -> Result<Option<Vec<String>>, SourceError> {
        (**self).consumers(group)
    }

    fn last_used_time_stop(
        &self,
        group: ConsumerGroup,
        consumer_id: &str,
    ) -> Result<Option<u64>, SourceError> {
        (**self).last_used_time_stop(group, consumer_id)
    }
}

/// Take one snapshot of every consumer record in both groups.
///
/// Consumers without a `LastUsedTimeStop` value are skipped. Any other
/// store error aborts the sample; the caller keeps its previous state.
pub fn sample_consent_store<S: ConsentStore + ?Sized>(
    store: &S,
) -> Result<Vec<ConsumerRecord>, SourceError> {
    let mut records = Vec::new();

    for group in ConsumerGroup::ALL {
        let Some(consumers) = store.consumers(group)? else {
            tracing::trace!(group = group.as_str(), "consent group missing");
            continue;
        };

        for consumer_id in consumers {
            // The non-packaged group is a child of the packaged key.
            if group == ConsumerGroup::Packaged && consumer_id == NON_PACKAGED_KEY {
                continue;
            }
            match store.last_used_time_stop(group, &consumer_id)? {
                Some(last_stop) => {
                    records.push(ConsumerRecord::new(group, consumer_id, last_stop));
                }
                None => {
                    tracing::trace!(consumer = %consumer_id, "no {LAST_USED_TIME_STOP} value");
                }
            }
        }
    }

    Ok(records)
}

// ─── Windows registry ───────────────────────────────────────────────

#[cfg(windows)]
pub use registry::RegistryConsentStore;

#[cfg(windows)]
mod registry {
    use std::ptr;

    use camwatch_core::types::ConsumerGroup;
    use windows_sys::Win32::Foundation::{
        ERROR_FILE_NOT_FOUND, ERROR_NO_MORE_ITEMS, ERROR_PATH_NOT_FOUND, ERROR_SUCCESS,
    };
    use windows_sys::Win32::System::Registry::{
        HKEY, HKEY_CURRENT_USER, KEY_READ, REG_DWORD, REG_QWORD, RegCloseKey, RegEnumKeyExW,
        RegOpenKeyExW, RegQueryValueExW,
    };

    use super::{ConsentStore, LAST_USED_TIME_STOP, NON_PACKAGED_KEY, WEBCAM_CONSENT_KEY};
    use crate::error::SourceError;

    /// Registry key names are limited to 255 characters.
    const MAX_KEY_NAME: usize = 256;

    /// Consent store backed by `HKEY_CURRENT_USER`.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct RegistryConsentStore;

    impl RegistryConsentStore {
        pub fn new() -> Self {
            Self
        }
    }

    fn group_path(group: ConsumerGroup) -> String {
        match group {
            ConsumerGroup::Packaged => WEBCAM_CONSENT_KEY.to_string(),
            ConsumerGroup::NonPackaged => format!(r"{WEBCAM_CONSENT_KEY}\{NON_PACKAGED_KEY}"),
        }
    }

    fn wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    fn is_missing(code: u32) -> bool {
        code == ERROR_FILE_NOT_FOUND || code == ERROR_PATH_NOT_FOUND
    }

    /// Open registry key, closed on drop.
    struct RegKey(HKEY);

    impl RegKey {
        fn open(path: &str) -> Result<Option<Self>, SourceError> {
            let path_w = wide(path);
            let mut hkey: HKEY = ptr::null_mut();
            // SAFETY: `path_w` is NUL-terminated and outlives the call;
            // `hkey` is a valid out pointer.
            let code =
                unsafe { RegOpenKeyExW(HKEY_CURRENT_USER, path_w.as_ptr(), 0, KEY_READ, &mut hkey) };
            if code == ERROR_SUCCESS {
                Ok(Some(Self(hkey)))
            } else if is_missing(code) {
                Ok(None)
            } else {
                Err(SourceError::Registry {
                    path: path.to_string(),
                    code,
                })
            }
        }

        fn subkey_names(&self, path: &str) -> Result<Vec<String>, SourceError> {
            let mut names = Vec::new();
            let mut index = 0u32;
            loop {
                let mut buf = [0u16; MAX_KEY_NAME];
                let mut len = buf.len() as u32;
                // SAFETY: `buf` holds `len` u16s; optional out params are null.
                let code = unsafe {
                    RegEnumKeyExW(
                        self.0,
                        index,
                        buf.as_mut_ptr(),
                        &mut len,
                        ptr::null(),
                        ptr::null_mut(),
                        ptr::null_mut(),
                        ptr::null_mut(),
                    )
                };
                if code == ERROR_NO_MORE_ITEMS {
                    break;
                }
                if code != ERROR_SUCCESS {
                    return Err(SourceError::Registry {
                        path: path.to_string(),
                        code,
                    });
                }
                names.push(String::from_utf16_lossy(&buf[..len as usize]));
                index += 1;
            }
            Ok(names)
        }

        fn integer_value(&self, name: &str, path: &str) -> Result<Option<u64>, SourceError> {
            let name_w = wide(name);
            let mut kind = 0u32;
            let mut data = [0u8; 8];
            let mut len = data.len() as u32;
            // SAFETY: `data` holds `len` bytes; `name_w` is NUL-terminated.
            let code = unsafe {
                RegQueryValueExW(
                    self.0,
                    name_w.as_ptr(),
                    ptr::null(),
                    &mut kind,
                    data.as_mut_ptr(),
                    &mut len,
                )
            };
            if is_missing(code) {
                return Ok(None);
            }
            if code != ERROR_SUCCESS {
                return Err(SourceError::Registry {
                    path: path.to_string(),
                    code,
                });
            }
            let value = match (kind, len) {
                (REG_QWORD, 8) => u64::from_le_bytes(data),
                (REG_DWORD, 4) => u64::from(u32::from_le_bytes([data[0], data[1], data[2], data[3]])),
                _ => return Ok(None),
            };
            Ok(Some(value))
        }
    }

    impl Drop for RegKey {
        fn drop(&mut self) {
            // SAFETY: the handle was opened by RegOpenKeyExW and is closed once.
            unsafe {
                RegCloseKey(self.0);
            }
        }
    }

    impl ConsentStore for RegistryConsentStore {
        fn consumers(&self, group: ConsumerGroup) -> Result<Option<Vec<String>>, SourceError> {
            let path = group_path(group);
            let Some(key) = RegKey::open(&path)? else {
                return Ok(None);
            };
            key.subkey_names(&path).map(Some)
        }

        fn last_used_time_stop(
            &self,
            group: ConsumerGroup,
            consumer_id: &str,
        ) -> Result<Option<u64>, SourceError> {
            let path = format!(r"{}\{consumer_id}", group_path(group));
            let Some(key) = RegKey::open(&path)? else {
                return Ok(None);
            };
            key.integer_value(LAST_USED_TIME_STOP, &path)
        }
    }
}
