//! Startup privilege guard: refuses to run as root (Unix) or Administrator
//! (Windows). Must run before `tracing_subscriber` is initialised or any
//! socket is opened — a process that's already listening has already done
//! the thing we're trying to prevent.

use mercury_core::MercuryError;

#[cfg(unix)]
pub fn refuse_elevated_privileges() -> Result<(), MercuryError> {
    let uid = nix::unistd::Uid::effective();
    if uid.is_root() {
        return Err(MercuryError::Privilege(
            "refusing to start as root — run xzmercury as an unprivileged user".to_string(),
        ));
    }
    Ok(())
}

#[cfg(windows)]
pub fn refuse_elevated_privileges() -> Result<(), MercuryError> {
    use windows_sys::Win32::Foundation::{CloseHandle, HANDLE};
    use windows_sys::Win32::Security::{
        GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY,
    };
    use windows_sys::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

    unsafe {
        let mut token: HANDLE = 0;
        if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token) == 0 {
            return Err(MercuryError::Privilege(
                "could not open process token to check elevation".to_string(),
            ));
        }

        let mut elevation = TOKEN_ELEVATION::default();
        let mut returned_len: u32 = 0;
        let ok = GetTokenInformation(
            token,
            TokenElevation,
            &mut elevation as *mut _ as *mut _,
            std::mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut returned_len,
        );
        CloseHandle(token);

        if ok == 0 {
            return Err(MercuryError::Privilege(
                "could not read token elevation information".to_string(),
            ));
        }

        if elevation.TokenIsElevated != 0 {
            return Err(MercuryError::Privilege(
                "refusing to start as Administrator — run xzmercury as a standard user".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(not(any(unix, windows)))]
pub fn refuse_elevated_privileges() -> Result<(), MercuryError> {
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn guard_runs_without_panicking() {
        // CI/dev containers often run tests as root, so this can't assert a
        // specific outcome — it only proves the syscall path doesn't panic.
        let _ = refuse_elevated_privileges();
    }
}
