//! Administrative privilege detection

/// Reports whether the current process may mutate service records
pub trait Privilege {
    fn is_elevated(&self) -> bool;
}

/// Queries the real process token (Windows) or effective uid (Unix)
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPrivilege;

impl Privilege for SystemPrivilege {
    fn is_elevated(&self) -> bool {
        is_process_elevated()
    }
}

#[cfg(windows)]
fn is_process_elevated() -> bool {
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::Security::{
        GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY,
    };
    use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

    let mut token = HANDLE::default();
    let mut elevation = TOKEN_ELEVATION::default();
    let mut returned = 0u32;

    unsafe {
        if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token).is_err() {
            return false;
        }

        let queried = GetTokenInformation(
            token,
            TokenElevation,
            Some(&mut elevation as *mut TOKEN_ELEVATION as *mut _),
            std::mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut returned,
        );
        let _ = CloseHandle(token);

        queried.is_ok() && elevation.TokenIsElevated != 0
    }
}

#[cfg(unix)]
fn is_process_elevated() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(any(windows, unix)))]
fn is_process_elevated() -> bool {
    false
}
