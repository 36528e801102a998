//! Loopback - a host talking to a simulated bridge over an in-memory link.
//!
//! This example demonstrates:
//! - Building a bridge with the builder pattern
//! - Serving a byte stream with `Bridge::run`
//! - What the host sees for successful, failed and malformed requests
//!
//! ```text
//! cargo run --example loopback
//! ```

use serial_i2c_bridge::hal::sim::{RecordingResetLine, SimulatedBus, SimulatedDevice};
use serial_i2c_bridge::protocol::{build_frame, Opcode};
use serial_i2c_bridge::Bridge;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // A temperature sensor at 0x48 and an EEPROM at 0x50.
    let bus = SimulatedBus::new()
        .with_device(0x48, SimulatedDevice::with_response(vec![0x19u8, 0x80]))
        .with_device(0x50, SimulatedDevice::with_response(vec![0xDEu8, 0xAD, 0xBE, 0xEF]));

    let mut bridge = Bridge::builder()
        .write_read_delay_ms(5)
        .build(bus, RecordingResetLine::new())?;

    let (host, device) = tokio::io::duplex(1024);
    let (device_rx, device_tx) = tokio::io::split(device);

    let requests = vec![
        ("device list", build_frame(Opcode::DeviceList, &[])),
        ("check 0x48", build_frame(Opcode::CheckDevice, &[0x48])),
        ("check 0x49", build_frame(Opcode::CheckDevice, &[0x49])),
        ("read temperature", build_frame(Opcode::WriteRead, &[0x48, 1, 0x00, 101, 2])),
        ("read eeprom", build_frame(Opcode::Read, &[0x50, 4])),
        ("fast mode", build_frame(Opcode::Set400kHz, &[])),
        ("info", build_frame(Opcode::Info, &[])),
        ("truncated write", build_frame(Opcode::Write, &[0x48])),
        ("unknown opcode", build_frame(Opcode::NoCommand, &[])),
    ];

    let client = async move {
        let (rx, mut tx) = tokio::io::split(host);
        let mut rx = BufReader::new(rx);
        let mut line = Vec::new();

        for (label, request) in requests {
            tx.write_all(&request).await?;
            line.clear();
            // Payload bytes may contain LF, so wait for the full CR LF.
            while !line.ends_with(&[13, 10]) {
                if rx.read_until(b'\n', &mut line).await? == 0 {
                    break;
                }
            }
            println!("{:<18} {:?} -> {:?}", label, request, line);
        }

        Ok::<_, std::io::Error>(())
    };

    let (served, sent) = tokio::join!(bridge.run(device_rx, device_tx), client);
    sent?;
    served?;

    Ok(())
}
