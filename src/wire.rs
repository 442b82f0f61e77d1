//! Station Host wire codec
//!
//! Typed primitives over a byte stream. Every number is big-endian:
//!
//! ```text
//! i32      4 bytes signed
//! ptr      8 bytes unsigned (item handle)
//! f64      8 bytes IEEE-754
//! line     UTF-8 bytes terminated by LF
//! bytes    i32 length N, then N bytes
//! array    i32 count n, then n x f64
//! pose     16 x f64, column-major
//! matrix   i32 rows, i32 cols, then rows*cols x f64 column-major
//! xyz      3 x f64
//! item     ptr then i32 type (received); ptr alone (sent)
//! ```
//!
//! Outgoing fields are buffered and written in one go before the first read
//! of the reply. Any transport failure surfaces as `FatalProtocol`.

use crate::{matrix::Mat, pose::Pose, Result, StationError};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;
use tracing::trace;

/// Matrix payloads are read in chunks of at least this many bytes
pub const MATRIX_CHUNK_BYTES: usize = 4096;

/// Token sent in place of an embedded newline
pub const LINE_BREAK_TOKEN: &str = "<br>";

/// Byte stream the codec runs on
pub trait Transport: Read + Write + Send {
    /// Timeout applied to every blocking read and write; `None` blocks forever
    fn set_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()>;

    /// Close both directions
    fn shutdown(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Transport for TcpStream {
    fn set_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.set_read_timeout(timeout)?;
        self.set_write_timeout(timeout)
    }

    fn shutdown(&mut self) -> std::io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

/// Round half-to-even and range-check a value destined for an `i32` field
pub fn to_wire_int(value: f64) -> Result<i32> {
    if !value.is_finite() {
        return Err(StationError::Input(format!(
            "Cannot send {} as an integer",
            value
        )));
    }
    let rounded = value.round_ties_even();
    if rounded < i32::MIN as f64 || rounded > i32::MAX as f64 {
        return Err(StationError::Input(format!(
            "Value {} does not fit in a 32-bit integer",
            value
        )));
    }
    Ok(rounded as i32)
}

fn len_to_i32(len: usize, what: &str) -> Result<i32> {
    i32::try_from(len).map_err(|_| StationError::Input(format!("{} too long: {}", what, len)))
}

fn fatal(action: &str, e: std::io::Error) -> StationError {
    StationError::FatalProtocol(format!("Failed to {}: {}", action, e))
}

pub struct Wire<T: Transport> {
    stream: BufReader<T>,
    outgoing: Vec<u8>,
}

impl<T: Transport> Wire<T> {
    pub fn new(transport: T) -> Self {
        Self {
            stream: BufReader::new(transport),
            outgoing: Vec::with_capacity(256),
        }
    }

    pub fn transport(&self) -> &T {
        self.stream.get_ref()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.stream.get_mut()
    }

    pub fn into_transport(self) -> T {
        self.stream.into_inner()
    }

    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.stream
            .get_mut()
            .set_timeout(timeout)
            .map_err(StationError::Io)
    }

    pub fn shutdown(&mut self) -> Result<()> {
        self.stream.get_mut().shutdown().map_err(StationError::Io)
    }

    /// Bytes queued but not yet written
    pub fn pending(&self) -> &[u8] {
        &self.outgoing
    }

    /// Drop queued bytes without sending them
    pub fn discard_pending(&mut self) {
        self.outgoing.clear();
    }

    /// Write all queued fields to the transport
    pub fn flush(&mut self) -> Result<()> {
        if self.outgoing.is_empty() {
            return Ok(());
        }
        trace!("Sending {} bytes", self.outgoing.len());
        let stream = self.stream.get_mut();
        stream
            .write_all(&self.outgoing)
            .map_err(|e| fatal("send request", e))?;
        stream.flush().map_err(|e| fatal("flush request", e))?;
        self.outgoing.clear();
        Ok(())
    }

    // Send side

    /// Queue a line; embedded newlines become `<br>`
    pub fn send_line(&mut self, line: &str) {
        let line = line.replace('\n', LINE_BREAK_TOKEN);
        self.outgoing.extend_from_slice(line.as_bytes());
        self.outgoing.push(b'\n');
    }

    pub fn send_int(&mut self, value: i32) {
        self.outgoing.extend_from_slice(&value.to_be_bytes());
    }

    /// Queue a real value as an `i32`, rounded half-to-even
    pub fn send_real_int(&mut self, value: f64) -> Result<()> {
        let value = to_wire_int(value)?;
        self.send_int(value);
        Ok(())
    }

    pub fn send_ptr(&mut self, ptr: u64) {
        self.outgoing.extend_from_slice(&ptr.to_be_bytes());
    }

    pub fn send_f64(&mut self, value: f64) {
        self.outgoing.extend_from_slice(&value.to_be_bytes());
    }

    pub fn send_bytes(&mut self, data: &[u8]) -> Result<()> {
        let len = len_to_i32(data.len(), "Byte payload")?;
        self.send_int(len);
        self.outgoing.extend_from_slice(data);
        Ok(())
    }

    pub fn send_array(&mut self, values: &[f64]) -> Result<()> {
        let len = len_to_i32(values.len(), "Array")?;
        self.send_int(len);
        for v in values {
            self.send_f64(*v);
        }
        Ok(())
    }

    pub fn send_pose(&mut self, pose: &Pose) {
        for v in pose.to_col_major() {
            self.send_f64(v);
        }
    }

    /// Queue a matrix; `0x0` sends only the two counts
    pub fn send_matrix(&mut self, matrix: &Mat) -> Result<()> {
        let rows = len_to_i32(matrix.rows(), "Matrix rows")?;
        let cols = len_to_i32(matrix.cols(), "Matrix cols")?;
        self.send_int(rows);
        self.send_int(cols);
        for v in matrix.to_col_major() {
            self.send_f64(v);
        }
        Ok(())
    }

    pub fn send_xyz(&mut self, xyz: &[f64; 3]) {
        for v in xyz {
            self.send_f64(*v);
        }
    }

    // Receive side

    fn read_exact(&mut self, buf: &mut [u8], what: &str) -> Result<()> {
        self.flush()?;
        self.stream
            .read_exact(buf)
            .map_err(|e| fatal(&format!("read {}", what), e))
    }

    /// Read one LF-terminated line; the terminator is not included
    pub fn rec_line(&mut self) -> Result<String> {
        self.flush()?;
        let mut raw = Vec::new();
        let n = self
            .stream
            .read_until(b'\n', &mut raw)
            .map_err(|e| fatal("read line", e))?;
        if n == 0 || raw.last() != Some(&b'\n') {
            return Err(StationError::FatalProtocol(
                "Connection closed while reading a line".to_string(),
            ));
        }
        raw.pop();
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    pub fn rec_int(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf, "integer")?;
        Ok(i32::from_be_bytes(buf))
    }

    pub fn rec_ptr(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf, "item pointer")?;
        Ok(u64::from_be_bytes(buf))
    }

    pub fn rec_f64(&mut self) -> Result<f64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf, "double")?;
        Ok(f64::from_be_bytes(buf))
    }

    /// Item as `(ptr, raw type)`
    pub fn rec_item(&mut self) -> Result<(u64, i32)> {
        let ptr = self.rec_ptr()?;
        let kind = self.rec_int()?;
        Ok((ptr, kind))
    }

    fn rec_count(&mut self, what: &str) -> Result<usize> {
        let n = self.rec_int()?;
        usize::try_from(n).map_err(|_| {
            StationError::FatalProtocol(format!("Negative {} count: {}", what, n))
        })
    }

    pub fn rec_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.rec_count("byte")?;
        let mut data = vec![0u8; len];
        self.read_exact(&mut data, "byte payload")?;
        Ok(data)
    }

    pub fn rec_array(&mut self) -> Result<Vec<f64>> {
        let n = self.rec_count("array")?;
        self.rec_doubles(n)
    }

    pub fn rec_pose(&mut self) -> Result<Pose> {
        let values = self.rec_doubles(16)?;
        Pose::from_col_major(&values)
    }

    /// Read a matrix; zero rows or columns yield an empty matrix with no payload
    pub fn rec_matrix(&mut self) -> Result<Mat> {
        let rows = self.rec_count("matrix row")?;
        let cols = self.rec_count("matrix column")?;
        let count = rows.checked_mul(cols).ok_or_else(|| {
            StationError::FatalProtocol(format!("Matrix {}x{} is too large", rows, cols))
        })?;
        if count == 0 {
            return Ok(Mat::zeros(rows, cols));
        }
        let values = self.rec_doubles(count)?;
        Mat::from_col_major(rows, cols, &values)
    }

    pub fn rec_xyz(&mut self) -> Result<[f64; 3]> {
        let v = self.rec_doubles(3)?;
        Ok([v[0], v[1], v[2]])
    }

    fn rec_doubles(&mut self, count: usize) -> Result<Vec<f64>> {
        let total = count.checked_mul(8).ok_or_else(|| {
            StationError::FatalProtocol(format!("Payload of {} doubles is too large", count))
        })?;

        let mut raw = Vec::with_capacity(total.min(1 << 24));
        let mut chunk = vec![0u8; MATRIX_CHUNK_BYTES];
        while raw.len() < total {
            let take = (total - raw.len()).min(MATRIX_CHUNK_BYTES);
            self.read_exact(&mut chunk[..take], "doubles")?;
            raw.extend_from_slice(&chunk[..take]);
        }

        Ok(raw
            .chunks_exact(8)
            .map(|b| f64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect())
    }
}
