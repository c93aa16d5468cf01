//! Status codes and the per-thread last error.

use std::cell::RefCell;
use std::ffi::{c_char, CString};

use devqueue::DevQueueError;

/// Result of a call that returns no handle.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DQStatus {
    /// Success.
    Ok = 0,
    /// Device ordinal past the last device of its class.
    OutOfRange = 1,
    /// Pop on an empty active-queue stack.
    EmptyStack = 2,
    /// No current queue and no usable default queue.
    NoCurrentQueue = 3,
    /// Null or otherwise unusable handle.
    InvalidHandle = 4,
    /// Device runtime failure.
    BackendError = 5,
    /// Invalid configuration.
    InvalidConfig = 6,
}

impl From<&DevQueueError> for DQStatus {
    fn from(err: &DevQueueError) -> Self {
        match err {
            DevQueueError::OutOfRange { .. } => DQStatus::OutOfRange,
            DevQueueError::EmptyStack => DQStatus::EmptyStack,
            DevQueueError::NoCurrentQueue => DQStatus::NoCurrentQueue,
            DevQueueError::InvalidHandle(_) => DQStatus::InvalidHandle,
            DevQueueError::InvalidConfig(_) | DevQueueError::AlreadyInitialized => {
                DQStatus::InvalidConfig
            }
            DevQueueError::QueueCreation { .. }
            | DevQueueError::BackendError(_)
            | DevQueueError::BackendUnavailable(_) => DQStatus::BackendError,
        }
    }
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Record `err` as the calling thread's last error and return its status.
pub(crate) fn set_last_error(err: &DevQueueError) -> DQStatus {
    tracing::debug!(error = %err, "C call failed");
    // Messages never contain NUL; fall back to an empty string if one does.
    let message = CString::new(err.to_string()).unwrap_or_default();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(message));
    DQStatus::from(err)
}

pub(crate) fn clear_last_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

pub(crate) fn last_error_ptr() -> *const c_char {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map_or(std::ptr::null(), |message| message.as_ptr())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use devqueue::DeviceClass;
    use std::ffi::CStr;

    #[test]
    fn test_status_mapping() {
        let err = DevQueueError::OutOfRange {
            class: DeviceClass::Gpu,
            index: 4,
            available: 1,
        };
        assert_eq!(DQStatus::from(&err), DQStatus::OutOfRange);
        assert_eq!(DQStatus::from(&DevQueueError::EmptyStack), DQStatus::EmptyStack);
        assert_eq!(
            DQStatus::from(&DevQueueError::BackendUnavailable("x".into())),
            DQStatus::BackendError
        );
    }

    #[test]
    fn test_last_error_roundtrip() {
        clear_last_error();
        assert!(last_error_ptr().is_null());

        assert_eq!(set_last_error(&DevQueueError::EmptyStack), DQStatus::EmptyStack);
        let message = unsafe { CStr::from_ptr(last_error_ptr()) };
        assert_eq!(message.to_str().unwrap(), "active queue stack is empty");

        clear_last_error();
        assert!(last_error_ptr().is_null());
    }
}
