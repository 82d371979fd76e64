//! Registry-backed accent store
//!
//! The accent is read from `<user hive>\Software\Microsoft\Windows\DWM`. When
//! running as a service the process hive is the system account's, so the
//! hive of the user attached to the console is resolved through its token.

use std::ptr;
use std::sync::Arc;

use tracing::{debug, info, warn};
use windows_sys::core::PWSTR;
use windows_sys::Win32::Foundation::{LocalFree, ERROR_INVALID_DATA, ERROR_SUCCESS, WAIT_FAILED};
use windows_sys::Win32::Security::Authorization::ConvertSidToStringSidW;
use windows_sys::Win32::Security::{GetTokenInformation, TokenUser, TOKEN_USER};
use windows_sys::Win32::System::Registry::{
    RegCloseKey, RegNotifyChangeKeyValue, RegOpenKeyExW, RegQueryValueExW, HKEY,
    HKEY_CURRENT_USER, HKEY_USERS, KEY_READ, REG_DWORD, REG_NOTIFY_CHANGE_LAST_SET,
    REG_VALUE_TYPE,
};
use windows_sys::Win32::System::RemoteDesktop::{WTSGetActiveConsoleSessionId, WTSQueryUserToken};
use windows_sys::Win32::System::Threading::{CreateEventW, WaitForSingleObject, INFINITE};

use super::{resolve_with_fallback, AccentError, AccentStore, ChangeWatch, StoreResolver};
use crate::winutil::{from_wide_ptr, last_error, to_wide, OwnedHandle};

/// DWM theme settings, relative to a user hive
const DWM_SUBKEY: &str = r"Software\Microsoft\Windows\DWM";

/// Returned by `WTSGetActiveConsoleSessionId` when no session is attached
const NO_CONSOLE_SESSION: u32 = 0xFFFF_FFFF;

fn os_error(op: &'static str) -> AccentError {
    AccentError::Os {
        op,
        code: last_error(),
    }
}

/// Open registry key closed on drop
struct RegKey(HKEY);

// Registry handles may be used from any thread
unsafe impl Send for RegKey {}
unsafe impl Sync for RegKey {}

impl Drop for RegKey {
    fn drop(&mut self) {
        unsafe { RegCloseKey(self.0) };
    }
}

/// Accent store on an open DWM registry key
pub struct RegistryStore {
    key: Arc<RegKey>,
    location: String,
}

impl RegistryStore {
    fn open(root: HKEY, root_name: &str, subkey: &str) -> Result<Self, AccentError> {
        let location = format!(r"{root_name}\{subkey}");
        let subkey_w = to_wide(subkey);
        let mut key: HKEY = ptr::null_mut();

        let status = unsafe { RegOpenKeyExW(root, subkey_w.as_ptr(), 0, KEY_READ, &mut key) };
        if status != ERROR_SUCCESS {
            warn!("Failed to open {} (os error {:#010x})", location, status);
            return Err(AccentError::Os {
                op: "RegOpenKeyExW",
                code: status,
            });
        }

        info!("Opened accent store {}", location);
        Ok(Self {
            key: Arc::new(RegKey(key)),
            location,
        })
    }

    /// DWM key of the user attached to the console
    pub fn open_active_session() -> Result<Self, AccentError> {
        let sid = active_session_sid()?;
        info!("Interactive user: {}", sid);
        Self::open(HKEY_USERS, "HKEY_USERS", &format!(r"{sid}\{DWM_SUBKEY}"))
    }

    /// DWM key of the account running this process
    pub fn open_current_user() -> Result<Self, AccentError> {
        Self::open(HKEY_CURRENT_USER, "HKEY_CURRENT_USER", DWM_SUBKEY)
    }
}

impl AccentStore for RegistryStore {
    fn location(&self) -> &str {
        &self.location
    }

    fn read_value(&self, name: &str) -> Result<u32, AccentError> {
        let name_w = to_wide(name);
        let mut value: u32 = 0;
        let mut size = std::mem::size_of::<u32>() as u32;
        let mut kind: REG_VALUE_TYPE = 0;

        let status = unsafe {
            RegQueryValueExW(
                self.key.0,
                name_w.as_ptr(),
                ptr::null(),
                &mut kind,
                (&mut value as *mut u32).cast(),
                &mut size,
            )
        };

        if status != ERROR_SUCCESS {
            return Err(AccentError::ValueMissing {
                name: name.to_string(),
                code: status,
            });
        }
        if kind != REG_DWORD || size != 4 {
            return Err(AccentError::ValueMissing {
                name: name.to_string(),
                code: ERROR_INVALID_DATA,
            });
        }
        Ok(value)
    }

    fn watch(&self) -> Result<Box<dyn ChangeWatch>, AccentError> {
        let event = unsafe { CreateEventW(ptr::null(), 0, 0, ptr::null()) };
        if event.is_null() {
            return Err(os_error("CreateEventW"));
        }
        Ok(Box::new(RegistryWatch {
            key: Arc::clone(&self.key),
            event: OwnedHandle(event),
        }))
    }
}

/// Auto-reset event signalled by `RegNotifyChangeKeyValue`
struct RegistryWatch {
    key: Arc<RegKey>,
    event: OwnedHandle,
}

impl ChangeWatch for RegistryWatch {
    fn arm(&mut self) -> Result<(), AccentError> {
        let status = unsafe {
            RegNotifyChangeKeyValue(self.key.0, 1, REG_NOTIFY_CHANGE_LAST_SET, self.event.0, 1)
        };
        if status != ERROR_SUCCESS {
            return Err(AccentError::Os {
                op: "RegNotifyChangeKeyValue",
                code: status,
            });
        }
        Ok(())
    }

    fn wait(&mut self) -> Result<(), AccentError> {
        if unsafe { WaitForSingleObject(self.event.0, INFINITE) } == WAIT_FAILED {
            return Err(os_error("WaitForSingleObject"));
        }
        Ok(())
    }
}

/// String SID of the user attached to the console session
fn active_session_sid() -> Result<String, AccentError> {
    let session = unsafe { WTSGetActiveConsoleSessionId() };
    if session == NO_CONSOLE_SESSION {
        return Err(AccentError::NoActiveSession);
    }

    let mut raw_token = ptr::null_mut();
    if unsafe { WTSQueryUserToken(session, &mut raw_token) } == 0 {
        return Err(os_error("WTSQueryUserToken"));
    }
    let token = OwnedHandle(raw_token);

    // First call only reports the buffer size
    let mut needed = 0u32;
    unsafe { GetTokenInformation(token.0, TokenUser, ptr::null_mut(), 0, &mut needed) };
    if needed == 0 {
        return Err(os_error("GetTokenInformation"));
    }
    debug!("Allocating {} bytes for token user information", needed);

    // u64 storage keeps TOKEN_USER pointer-aligned
    let len = needed;
    let mut buf = vec![0u64; (len as usize).div_ceil(8)];
    if unsafe {
        GetTokenInformation(
            token.0,
            TokenUser,
            buf.as_mut_ptr().cast(),
            len,
            &mut needed,
        )
    } == 0
    {
        return Err(os_error("GetTokenInformation"));
    }
    let user = unsafe { &*(buf.as_ptr() as *const TOKEN_USER) };

    let mut sid_w: PWSTR = ptr::null_mut();
    if unsafe { ConvertSidToStringSidW(user.User.Sid, &mut sid_w) } == 0 {
        return Err(os_error("ConvertSidToStringSidW"));
    }
    let sid = unsafe { from_wide_ptr(sid_w) };
    unsafe { LocalFree(sid_w.cast()) };

    Ok(sid)
}

/// Resolves the active session's store, falling back to the process hive
pub struct SessionStoreResolver;

impl StoreResolver for SessionStoreResolver {
    fn resolve(&self) -> Result<Arc<dyn AccentStore>, AccentError> {
        resolve_with_fallback(
            || Ok(Arc::new(RegistryStore::open_active_session()?) as Arc<dyn AccentStore>),
            || Ok(Arc::new(RegistryStore::open_current_user()?) as Arc<dyn AccentStore>),
        )
    }
}
