//! Serial port backed transport.
//!
//! Wraps a `serialport` handle in the four callbacks the driver expects.
//! A read that times out is reported as "no data", so the port's read
//! timeout sets how long each retry waits on the wire.

use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::rc::Rc;
use std::time::Duration;

use atcommander::Transport;
use serialport::{FlowControl, SerialPort, SerialPortType};
use tracing::{info, warn};

use crate::error::RunnerResult;

/// Open `path` at `baud`. The driver re-clocks it while searching.
pub fn open(path: &str, baud: u32, read_timeout: Duration) -> RunnerResult<Box<dyn SerialPort>> {
    let port = serialport::new(path, baud)
        .timeout(read_timeout)
        .flow_control(FlowControl::None)
        .open()?;
    Ok(port)
}

/// Build a driver transport that owns `port`.
pub fn serial_transport(port: Box<dyn SerialPort>) -> Transport {
    let port = Rc::new(RefCell::new(port));
    let reader = port.clone();
    let writer = port.clone();
    let clock = port;

    Transport::new()
        .with_read(move || {
            let mut byte = [0u8; 1];
            match reader.borrow_mut().read(&mut byte) {
                Ok(1) => Some(byte[0]),
                Ok(_) => None,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => None,
                Err(e) => {
                    warn!("serial read failed: {}", e);
                    None
                }
            }
        })
        .with_write(move |byte| {
            if let Err(e) = writer.borrow_mut().write_all(&[byte]) {
                warn!("serial write failed: {}", e);
            }
        })
        .with_delay(|ms| std::thread::sleep(Duration::from_millis(u64::from(ms))))
        .with_baud_initializer(move |baud| {
            if let Err(e) = clock.borrow_mut().set_baud_rate(baud) {
                warn!("unable to set host baud rate {}: {}", baud, e);
            }
        })
}

fn port_type_name(port_type: &SerialPortType) -> &'static str {
    match port_type {
        SerialPortType::UsbPort(_) => "USB",
        SerialPortType::PciPort => "PCI",
        SerialPortType::BluetoothPort => "Bluetooth",
        SerialPortType::Unknown => "Unknown",
    }
}

/// Print the serial ports the OS knows about.
pub fn list_ports() -> RunnerResult<()> {
    let ports = serialport::available_ports()?;
    if ports.is_empty() {
        info!("no serial ports found");
    }
    for port in ports {
        match &port.port_type {
            SerialPortType::UsbPort(usb) => println!(
                "{}  {}  {:04x}:{:04x}  {}",
                port.port_name,
                port_type_name(&port.port_type),
                usb.vid,
                usb.pid,
                usb.product.as_deref().unwrap_or("")
            ),
            other => println!("{}  {}", port.port_name, port_type_name(other)),
        }
    }
    Ok(())
}
