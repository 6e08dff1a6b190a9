//! Built‑in functions installed in the global scope, and the file handle
//! they share.
//!
//! | name  | arity | behaviour                                             |
//! |-------|------:|-------------------------------------------------------|
//! | clock | 0     | seconds since the Unix epoch                          |
//! | open  | 2     | `open(path, "r" \| "w")` → file handle                |
//! | close | 1     | releases the handle; closing twice is harmless        |
//! | read  | 1     | whole contents, or `""` if not opened for reading     |
//! | write | 2     | writes a string; no‑op if not opened for writing      |

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, Read, Write};
use std::rc::Rc;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

use log::{debug, info};

use crate::value::{NativeFunction, Value};

type NativeResult<'a> = std::result::Result<Value<'a>, String>;

/// Every built‑in, ready to be defined in the globals.
pub fn all<'a>() -> Vec<NativeFunction<'a>> {
    vec![
        NativeFunction {
            name: "clock",
            arity: 0,
            func: clock,
        },
        NativeFunction {
            name: "open",
            arity: 2,
            func: open,
        },
        NativeFunction {
            name: "close",
            arity: 1,
            func: close,
        },
        NativeFunction {
            name: "read",
            arity: 1,
            func: read,
        },
        NativeFunction {
            name: "write",
            arity: 2,
            func: write,
        },
    ]
}

fn clock<'a>(_args: &[Value<'a>]) -> NativeResult<'a> {
    let timestamp: f64 = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e: SystemTimeError| format!("Clock error: {}", e))?
        .as_secs_f64();

    debug!("Native function 'clock' returned: {}", timestamp);

    Ok(Value::Number(timestamp))
}

fn open<'a>(args: &[Value<'a>]) -> NativeResult<'a> {
    let path: &str = expect_string(&args[0])?;

    let mode: FileMode = match expect_string(&args[1])? {
        "r" => FileMode::Read,
        "w" => FileMode::Write,
        _ => return Err("Invalid file mode.".to_string()),
    };

    let file: LoxFile = LoxFile::open(path, mode).map_err(|e| {
        debug!("open({:?}) failed: {}", path, e);
        "Failed to open file.".to_string()
    })?;

    Ok(Value::File(Rc::new(RefCell::new(file))))
}

fn close<'a>(args: &[Value<'a>]) -> NativeResult<'a> {
    expect_file(&args[0])?.borrow_mut().close();

    Ok(Value::Nil)
}

fn read<'a>(args: &[Value<'a>]) -> NativeResult<'a> {
    let contents: String = expect_file(&args[0])?.borrow_mut().read();

    Ok(Value::String(contents))
}

fn write<'a>(args: &[Value<'a>]) -> NativeResult<'a> {
    let file: &Rc<RefCell<LoxFile>> = expect_file(&args[0])?;
    let text: &str = expect_string(&args[1])?;

    file.borrow_mut().write(text);

    Ok(Value::Nil)
}

fn expect_string<'v>(value: &'v Value<'_>) -> std::result::Result<&'v str, String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(format!("Expected a string but got {}.", other.type_name())),
    }
}

fn expect_file<'v>(value: &'v Value<'_>) -> std::result::Result<&'v Rc<RefCell<LoxFile>>, String> {
    match value {
        Value::File(file) => Ok(file),
        other => Err(format!("Expected a file but got {}.", other.type_name())),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File handle
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    Read,
    Write,
}

/// An open (or closed) file.  I/O failures after opening are swallowed:
/// `read` yields what it could, `write` drops the text.
#[derive(Debug)]
pub struct LoxFile {
    path: String,
    mode: FileMode,
    /// `None` once closed.
    file: Option<File>,
}

impl LoxFile {
    pub fn open(path: &str, mode: FileMode) -> io::Result<Self> {
        let file: File = match mode {
            FileMode::Read => File::open(path)?,
            FileMode::Write => File::create(path)?,
        };

        info!("Opened {:?} in {:?} mode", path, mode);

        Ok(LoxFile {
            path: path.to_string(),
            mode,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Idempotent.
    pub fn close(&mut self) {
        if self.file.take().is_some() {
            info!("Closed {:?}", self.path);
        }
    }

    pub fn read(&mut self) -> String {
        let mut contents: String = String::new();

        if self.mode != FileMode::Read {
            return contents;
        }

        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.read_to_string(&mut contents) {
                debug!("read({:?}) failed: {}", self.path, e);
            }
        }

        contents
    }

    pub fn write(&mut self, text: &str) {
        if self.mode != FileMode::Write {
            return;
        }

        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.write_all(text.as_bytes()) {
                debug!("write({:?}) failed: {}", self.path, e);
            }
        }
    }
}
