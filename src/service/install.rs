//! Service registration

use std::ptr::{null, null_mut};

use windows_sys::Win32::Foundation::{ERROR_SERVICE_EXISTS, MAX_PATH};
use windows_sys::Win32::System::LibraryLoader::GetModuleFileNameW;
use windows_sys::Win32::System::Services::{
    CloseServiceHandle, CreateServiceW, OpenSCManagerW, SC_HANDLE, SC_MANAGER_ALL_ACCESS,
    SERVICE_ALL_ACCESS, SERVICE_AUTO_START, SERVICE_ERROR_NORMAL, SERVICE_WIN32_OWN_PROCESS,
};

use tracing::info;

use super::{ServiceError, DISPLAY_NAME, SERVICE_NAME};
use crate::winutil::{last_error, to_wide};

struct ScHandle(SC_HANDLE);

impl Drop for ScHandle {
    fn drop(&mut self) {
        unsafe { CloseServiceHandle(self.0) };
    }
}

/// Register the running executable as an auto-start service
pub fn install() -> Result<(), ServiceError> {
    let binary = module_path()?;
    info!("Installing {} from {}", SERVICE_NAME, binary);

    let manager = unsafe { OpenSCManagerW(null(), null(), SC_MANAGER_ALL_ACCESS) };
    if manager.is_null() {
        return Err(os_error("OpenSCManagerW"));
    }
    let manager = ScHandle(manager);

    let name = to_wide(SERVICE_NAME);
    let display = to_wide(DISPLAY_NAME);
    // Quoted so a path with spaces cannot be split by the service manager
    let binary = to_wide(&format!("\"{binary}\""));

    let service = unsafe {
        CreateServiceW(
            manager.0,
            name.as_ptr(),
            display.as_ptr(),
            SERVICE_ALL_ACCESS,
            SERVICE_WIN32_OWN_PROCESS,
            SERVICE_AUTO_START,
            SERVICE_ERROR_NORMAL,
            binary.as_ptr(),
            null(),
            null_mut(),
            null(),
            null(),
            null(),
        )
    };
    if service.is_null() {
        let code = last_error();
        if code == ERROR_SERVICE_EXISTS {
            return Err(ServiceError::AlreadyInstalled(SERVICE_NAME));
        }
        return Err(ServiceError::Os {
            op: "CreateServiceW",
            code,
        });
    }
    drop(ScHandle(service));

    info!("Service {} installed", SERVICE_NAME);
    Ok(())
}

fn module_path() -> Result<String, ServiceError> {
    let mut buf = vec![0u16; MAX_PATH as usize];
    loop {
        let len = unsafe { GetModuleFileNameW(null_mut(), buf.as_mut_ptr(), buf.len() as u32) };
        if len == 0 {
            return Err(os_error("GetModuleFileNameW"));
        }
        // A full buffer means truncation
        if (len as usize) < buf.len() {
            return Ok(String::from_utf16_lossy(&buf[..len as usize]));
        }
        let grown = buf.len() * 2;
        buf.resize(grown, 0);
    }
}

fn os_error(op: &'static str) -> ServiceError {
    ServiceError::Os {
        op,
        code: last_error(),
    }
}
