//! GL debug-output callback plumbing
//!
//! The native callback fires asynchronously with a C string message; it is
//! decoded here and forwarded to the sink installed by the core. The sink
//! lives in a global because the extern callback carries no state.

use std::ffi::c_void;
use std::sync::{Mutex, OnceLock};

use gl::types::{GLchar, GLenum, GLsizei, GLuint};

use nebula_gl::nebulagl::driver::{
    DebugKind, DebugMessage, DebugSeverity, DebugSink, DebugSource,
};

/// Installed sink, shared with the extern callback
static DEBUG_SINK: OnceLock<Mutex<Option<DebugSink>>> = OnceLock::new();

/// Install `sink` and enable synchronous debug output
pub(crate) fn install(sink: DebugSink) {
    let cell = DEBUG_SINK.get_or_init(|| Mutex::new(None));
    if let Ok(mut lock) = cell.lock() {
        *lock = Some(sink);
    }
    unsafe {
        gl::Enable(gl::DEBUG_OUTPUT);
        gl::Enable(gl::DEBUG_OUTPUT_SYNCHRONOUS);
        gl::DebugMessageCallback(Some(debug_callback), std::ptr::null());
    }
}

extern "system" fn debug_callback(
    source: GLenum,
    kind: GLenum,
    id: GLuint,
    severity: GLenum,
    length: GLsizei,
    message: *const GLchar,
    _user_param: *mut c_void,
) {
    let text = if message.is_null() {
        String::new()
    } else {
        let bytes =
            unsafe { std::slice::from_raw_parts(message as *const u8, length.max(0) as usize) };
        String::from_utf8_lossy(bytes).into_owned()
    };

    let decoded = DebugMessage {
        source: map_source(source),
        kind: map_kind(kind),
        severity: map_severity(severity),
        id,
        message: text,
    };

    if let Some(cell) = DEBUG_SINK.get() {
        if let Ok(lock) = cell.lock() {
            if let Some(sink) = lock.as_ref() {
                sink(decoded);
            }
        }
    }
}

pub(crate) fn map_source(source: GLenum) -> DebugSource {
    match source {
        gl::DEBUG_SOURCE_API => DebugSource::Api,
        gl::DEBUG_SOURCE_WINDOW_SYSTEM => DebugSource::WindowSystem,
        gl::DEBUG_SOURCE_SHADER_COMPILER => DebugSource::ShaderCompiler,
        gl::DEBUG_SOURCE_THIRD_PARTY => DebugSource::ThirdParty,
        gl::DEBUG_SOURCE_APPLICATION => DebugSource::Application,
        _ => DebugSource::Other,
    }
}

pub(crate) fn map_kind(kind: GLenum) -> DebugKind {
    match kind {
        gl::DEBUG_TYPE_ERROR => DebugKind::Error,
        gl::DEBUG_TYPE_DEPRECATED_BEHAVIOR => DebugKind::DeprecatedBehavior,
        gl::DEBUG_TYPE_UNDEFINED_BEHAVIOR => DebugKind::UndefinedBehavior,
        gl::DEBUG_TYPE_PORTABILITY => DebugKind::Portability,
        gl::DEBUG_TYPE_PERFORMANCE => DebugKind::Performance,
        gl::DEBUG_TYPE_MARKER => DebugKind::Marker,
        gl::DEBUG_TYPE_PUSH_GROUP => DebugKind::PushGroup,
        gl::DEBUG_TYPE_POP_GROUP => DebugKind::PopGroup,
        _ => DebugKind::Other,
    }
}

pub(crate) fn map_severity(severity: GLenum) -> DebugSeverity {
    match severity {
        gl::DEBUG_SEVERITY_HIGH => DebugSeverity::High,
        gl::DEBUG_SEVERITY_MEDIUM => DebugSeverity::Medium,
        gl::DEBUG_SEVERITY_LOW => DebugSeverity::Low,
        _ => DebugSeverity::Notification,
    }
}
