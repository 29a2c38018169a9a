//! Output boundary for die-after-render mode
//!
//! [`crate::renderer::Renderer::render_to`] is the only code path that writes
//! headers and ends the response. It goes through a [`TerminalWriter`] so the
//! side effect stays at the caller's edge.

use std::io::{self, Write};

/// Receives one rendered response and ends it.
pub trait TerminalWriter {
    /// Emit one response header.
    fn header(&mut self, name: &str, value: &str) -> io::Result<()>;
    /// Emit the response body.
    fn body(&mut self, bytes: &[u8]) -> io::Result<()>;
    /// End the response. Implementations may not return.
    fn terminate(&mut self) -> io::Result<()>;
}

/// Writes a CGI-style response to stdout and exits the process.
#[derive(Debug, Default)]
pub struct StdoutTerminal {
    headers_done: bool,
}

impl TerminalWriter for StdoutTerminal {
    fn header(&mut self, name: &str, value: &str) -> io::Result<()> {
        write!(io::stdout().lock(), "{}: {}\r\n", name, value)
    }

    fn body(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut out = io::stdout().lock();
        if !self.headers_done {
            out.write_all(b"\r\n")?;
            self.headers_done = true;
        }
        out.write_all(bytes)
    }

    fn terminate(&mut self) -> io::Result<()> {
        io::stdout().lock().flush()?;
        std::process::exit(0)
    }
}

/// Collects the response in memory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferedTerminal {
    /// Headers in emission order
    pub headers: Vec<(String, String)>,
    /// Body bytes
    pub body: Vec<u8>,
    /// Set once `terminate` has been called
    pub terminated: bool,
}

impl BufferedTerminal {
    /// First header called `name`, case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl TerminalWriter for BufferedTerminal {
    fn header(&mut self, name: &str, value: &str) -> io::Result<()> {
        if self.terminated {
            return Err(io::Error::new(io::ErrorKind::Other, "response already terminated"));
        }
        self.headers.push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn body(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.terminated {
            return Err(io::Error::new(io::ErrorKind::Other, "response already terminated"));
        }
        self.body.extend_from_slice(bytes);
        Ok(())
    }

    fn terminate(&mut self) -> io::Result<()> {
        self.terminated = true;
        Ok(())
    }
}
