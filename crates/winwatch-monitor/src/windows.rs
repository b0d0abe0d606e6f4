//! Windows 플랫폼: 포그라운드 프로세스 감지 및 메타데이터 조회.
//!
//! Win32 API `GetForegroundWindow` + `GetWindowThreadProcessId` +
//! `QueryFullProcessImageNameW` + `EnumProcessModulesEx` + `GetFileVersionInfoW` 기반.
//! 모든 프로세스 핸들은 [`OwnedHandle`]이 닫는다.

#![cfg(target_os = "windows")]

use std::ffi::c_void;
use tracing::debug;
use windows_sys::Win32::Foundation::{CloseHandle, HANDLE, HMODULE, HWND};
use windows_sys::Win32::Storage::FileSystem::{GetFileVersionInfoSizeW, GetFileVersionInfoW};
use windows_sys::Win32::System::ProcessStatus::{
    EnumProcessModulesEx, GetModuleBaseNameW, LIST_MODULES_ALL,
};
use windows_sys::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32, PROCESS_QUERY_INFORMATION,
    PROCESS_VM_READ,
};
use windows_sys::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowThreadProcessId};
use winwatch_core::error::CoreError;
use winwatch_core::models::process::ForegroundProcess;

use crate::version_info::VersionInfoError;

/// 경로 버퍼 크기 (긴 경로 재시도 포함)
const PATH_BUFFER_SIZES: [usize; 2] = [1_024, 32_768];

/// 모듈 이름 버퍼 크기
const MODULE_NAME_LEN: usize = 260;

/// 프로세스 핸들. drop 시 `CloseHandle`
struct OwnedHandle {
    handle: HANDLE,
    pid: u32,
}

impl OwnedHandle {
    /// 조회 + 메모리 읽기 권한으로 프로세스 열기
    fn open(pid: u32) -> Result<Self, CoreError> {
        let handle = unsafe { OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, 0, pid) };
        if handle.is_null() {
            return Err(os_error(pid, "OpenProcess"));
        }
        Ok(Self { handle, pid })
    }

    /// 실행 파일 전체 경로
    fn image_path(&self) -> Result<String, CoreError> {
        for size in PATH_BUFFER_SIZES {
            let mut buf = vec![0u16; size];
            let mut len = buf.len() as u32;
            let ok = unsafe {
                QueryFullProcessImageNameW(
                    self.handle,
                    PROCESS_NAME_WIN32,
                    buf.as_mut_ptr(),
                    &mut len,
                )
            };
            if ok != 0 {
                return Ok(String::from_utf16_lossy(&buf[..len as usize]));
            }
        }
        Err(os_error(self.pid, "QueryFullProcessImageNameW"))
    }

    /// 주 모듈의 기본 이름 (패키지 앱은 경로의 파일 이름과 다를 수 있음)
    fn base_module_name(&self) -> Result<String, CoreError> {
        let mut module: HMODULE = std::ptr::null_mut();
        let mut needed: u32 = 0;
        let ok = unsafe {
            EnumProcessModulesEx(
                self.handle,
                &mut module,
                std::mem::size_of::<HMODULE>() as u32,
                &mut needed,
                LIST_MODULES_ALL,
            )
        };
        if ok == 0 {
            return Err(os_error(self.pid, "EnumProcessModulesEx"));
        }

        let mut name = [0u16; MODULE_NAME_LEN];
        let len = unsafe {
            GetModuleBaseNameW(self.handle, module, name.as_mut_ptr(), name.len() as u32)
        };
        if len == 0 {
            return Err(os_error(self.pid, "GetModuleBaseNameW"));
        }
        Ok(String::from_utf16_lossy(&name[..len as usize]))
    }
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        unsafe {
            CloseHandle(self.handle);
        }
    }
}

fn os_error(pid: u32, call: &str) -> CoreError {
    CoreError::ProcessAccess {
        pid,
        message: format!("{call}: {}", std::io::Error::last_os_error()),
    }
}

fn to_wide_null(text: &str) -> Vec<u16> {
    text.encode_utf16().chain(std::iter::once(0)).collect()
}

/// 포그라운드 창을 소유한 프로세스
///
/// 포커스된 창이 없으면 `Ok(None)`.
pub fn foreground_process() -> Result<Option<ForegroundProcess>, CoreError> {
    let hwnd: HWND = unsafe { GetForegroundWindow() };
    if hwnd.is_null() {
        debug!("활성 창 없음 (GetForegroundWindow → null)");
        return Ok(None);
    }

    let mut pid: u32 = 0;
    unsafe {
        GetWindowThreadProcessId(hwnd, &mut pid);
    }
    if pid == 0 {
        debug!("활성 창의 PID 조회 실패");
        return Ok(None);
    }

    let process = OwnedHandle::open(pid)?;
    let path = process.image_path()?;
    Ok(Some(ForegroundProcess { pid, path }))
}

/// PID → (모듈 기본 이름, 실행 파일 경로)
pub fn module_name_and_path(pid: u32) -> Result<(String, String), CoreError> {
    let process = OwnedHandle::open(pid)?;
    let name = process.base_module_name()?;
    if name.is_empty() {
        return Err(CoreError::ProcessAccess {
            pid,
            message: "빈 모듈 이름".to_string(),
        });
    }
    let path = process.image_path()?;
    Ok((name, path))
}

/// 실행 파일의 원시 버전 리소스 블록
pub fn read_version_block(path: &str) -> Result<Vec<u8>, VersionInfoError> {
    let wide = to_wide_null(path);
    let mut handle: u32 = 0;
    let size = unsafe { GetFileVersionInfoSizeW(wide.as_ptr(), &mut handle) };
    if size == 0 {
        return Err(VersionInfoError::Missing(format!(
            "GetFileVersionInfoSizeW: {}",
            std::io::Error::last_os_error()
        )));
    }

    let mut block = vec![0u8; size as usize];
    let ok = unsafe {
        GetFileVersionInfoW(
            wide.as_ptr(),
            0,
            size,
            block.as_mut_ptr() as *mut c_void,
        )
    };
    if ok == 0 {
        return Err(VersionInfoError::Missing(format!(
            "GetFileVersionInfoW: {}",
            std::io::Error::last_os_error()
        )));
    }
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_process_identity() {
        let pid = std::process::id();
        let (name, path) = module_name_and_path(pid).unwrap();
        assert!(name.to_lowercase().ends_with(".exe"));
        assert!(!path.is_empty());
    }

    #[test]
    fn system_binary_has_description() {
        let windir = std::env::var("WINDIR").unwrap_or_else(|_| r"C:\Windows".to_string());
        let notepad = format!(r"{windir}\System32\notepad.exe");
        let block = read_version_block(&notepad).unwrap();
        let description = crate::version_info::describe(&block).unwrap();
        assert!(!description.is_empty());
    }

    #[test]
    fn missing_file_has_no_version_block() {
        let result = read_version_block(r"C:\definitely\not\here.exe");
        assert!(matches!(result, Err(VersionInfoError::Missing(_))));
    }

    #[test]
    fn open_invalid_pid_is_recoverable() {
        let err = OwnedHandle::open(u32::MAX - 3).err().unwrap();
        assert!(err.is_recoverable());
    }
}
