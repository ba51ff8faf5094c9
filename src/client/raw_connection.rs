//! Raw TCP connection speaking RESP2
//!
//! One blocking socket split into a buffered reader and writer. The same
//! timeout is applied to connect, read and write.

use std::io::{self, BufReader, BufWriter, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::control_plane::ControlPlane;
use crate::config::Endpoint;
use crate::utils::{ConnectionError, RespDecoder, RespEncoder, RespValue};

pub struct RawConnection {
    writer: BufWriter<TcpStream>,
    reader: BufReader<TcpStream>,
    encoder: RespEncoder,
}

impl RawConnection {
    /// Open a TCP connection to `endpoint`
    pub fn connect(endpoint: &Endpoint, timeout: Duration) -> Result<Self, ConnectionError> {
        let connect_failed = |source: io::Error| ConnectionError::ConnectFailed {
            host: endpoint.host.clone(),
            port: endpoint.port,
            source,
        };

        let addr = (endpoint.host.as_str(), endpoint.port)
            .to_socket_addrs()
            .map_err(connect_failed)?
            .next()
            .ok_or_else(|| {
                connect_failed(io::Error::new(
                    io::ErrorKind::NotFound,
                    "No addresses found",
                ))
            })?;

        let stream = TcpStream::connect_timeout(&addr, timeout).map_err(connect_failed)?;

        stream.set_nodelay(true).ok();
        stream.set_read_timeout(Some(timeout)).map_err(connect_failed)?;
        stream.set_write_timeout(Some(timeout)).map_err(connect_failed)?;

        let writer = BufWriter::with_capacity(16 * 1024, stream.try_clone().map_err(connect_failed)?);
        let reader = BufReader::with_capacity(16 * 1024, stream);

        Ok(Self {
            writer,
            reader,
            encoder: RespEncoder::with_capacity(256),
        })
    }
}

impl ControlPlane for RawConnection {
    fn execute(&mut self, args: &[&str]) -> io::Result<RespValue> {
        self.encoder.clear();
        self.encoder.encode_command(args);
        self.writer.write_all(self.encoder.as_bytes())?;
        self.writer.flush()?;
        RespDecoder::new(&mut self.reader).decode()
    }

    /// QUIT, then shut the socket down in both directions
    fn close(&mut self) {
        let _ = self.execute(&["QUIT"]);
        let _ = self.reader.get_ref().shutdown(Shutdown::Both);
    }
}
