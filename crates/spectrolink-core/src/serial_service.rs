use log::{debug, error};
use serialport::{SerialPort, SerialPortInfo};
use std::io::{ErrorKind, Read};
use std::time::Duration;

use crate::error::AcquireError;
use crate::source::{ByteSource, ReadOutcome};

#[derive(Debug, Clone)]
pub struct PortInfo {
    pub port_name: String,
    pub port_type: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (port_type, vid, pid, serial_number, manufacturer, product) = match &info.port_type {
            serialport::SerialPortType::UsbPort(usb) => (
                "USB".to_string(),
                Some(usb.vid),
                Some(usb.pid),
                usb.serial_number.clone(),
                usb.manufacturer.clone(),
                usb.product.clone(),
            ),
            serialport::SerialPortType::PciPort => ("PCI".to_string(), None, None, None, None, None),
            serialport::SerialPortType::BluetoothPort => ("Bluetooth".to_string(), None, None, None, None, None),
            serialport::SerialPortType::Unknown => ("Unknown".to_string(), None, None, None, None, None),
        };
        Self {
            port_name: info.port_name,
            port_type,
            vid,
            pid,
            serial_number,
            manufacturer,
            product,
        }
    }
}

pub fn list_ports() -> Vec<PortInfo> {
    serialport::available_ports()
        .unwrap_or_default()
        .into_iter()
        .map(PortInfo::from)
        .collect()
}

#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: serialport::DataBits,
    pub parity: serialport::Parity,
    pub stop_bits: serialport::StopBits,
    pub flow_control: serialport::FlowControl,
    /// Upper bound on a single blocking read; also bounds mode-change latency.
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: 115_200,
            data_bits: serialport::DataBits::Eight,
            parity: serialport::Parity::None,
            stop_bits: serialport::StopBits::One,
            flow_control: serialport::FlowControl::None,
            timeout: Duration::from_secs(1),
        }
    }
}

const READ_CHUNK: usize = 4096;

/// Serial port handed out one byte at a time.
///
/// Reads are chunked underneath; a chunk is only requested once the previous
/// one has been fully handed out.
pub struct SerialByteSource {
    port: Box<dyn SerialPort>,
    timeout: Duration,
    buf: Box<[u8; READ_CHUNK]>,
    pos: usize,
    len: usize,
}

impl SerialByteSource {
    pub fn open(cfg: &SerialConfig) -> Result<Self, AcquireError> {
        let port = serialport::new(&cfg.port_name, cfg.baud_rate)
            .data_bits(cfg.data_bits)
            .parity(cfg.parity)
            .stop_bits(cfg.stop_bits)
            .flow_control(cfg.flow_control)
            .timeout(cfg.timeout)
            .open()
            .map_err(|source| AcquireError::Open {
                port: cfg.port_name.clone(),
                source,
            })?;
        debug!("opened {} at {} baud", cfg.port_name, cfg.baud_rate);
        Ok(Self {
            port,
            timeout: cfg.timeout,
            buf: Box::new([0u8; READ_CHUNK]),
            pos: 0,
            len: 0,
        })
    }

    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl ByteSource for SerialByteSource {
    fn read_byte(&mut self) -> ReadOutcome {
        if self.pos == self.len {
            match self.port.read(&mut self.buf[..]) {
                Ok(n) if n > 0 => {
                    self.pos = 0;
                    self.len = n;
                }
                Ok(_) => return ReadOutcome::Timeout,
                Err(e) if e.kind() == ErrorKind::TimedOut => return ReadOutcome::Timeout,
                Err(e) => {
                    // A yanked adapter fails every read immediately; pace the retries.
                    error!("serial read failed: {e}");
                    std::thread::sleep(self.timeout);
                    return ReadOutcome::Timeout;
                }
            }
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        ReadOutcome::Byte(byte)
    }
}
