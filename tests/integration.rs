//! Integration tests for serial-i2c-bridge.
//!
//! These drive the bridge with raw request bytes and check the raw
//! response bytes, the way a host on the serial link sees them.

use std::time::Duration;

use serial_i2c_bridge::hal::sim::{BusEventKind, RecordingResetLine, SimulatedBus, SimulatedDevice};
use serial_i2c_bridge::hal::PinLevel;
use serial_i2c_bridge::protocol::{build_frame, Opcode};
use serial_i2c_bridge::{Bridge, BusFault, BusFrequency};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::Instant;

type SimBridge = Bridge<SimulatedBus, RecordingResetLine>;

fn bridge_with(bus: SimulatedBus) -> SimBridge {
    let mut bridge = Bridge::builder()
        .build(bus, RecordingResetLine::new())
        .unwrap();
    // Drop the startup frequency event.
    bridge.bus_mut().clear_events();
    bridge
}

/// Send one request and return the single response it produced.
async fn roundtrip(bridge: &mut SimBridge, request: &[u8]) -> Vec<u8> {
    let responses = bridge.push(request).await;
    assert_eq!(responses.len(), 1, "request {:?}", request);
    responses[0].as_bytes().to_vec()
}

#[tokio::test]
async fn test_write_single_byte() {
    let mut bridge = bridge_with(SimulatedBus::new().with_device(23, SimulatedDevice::new()));

    let response = roundtrip(&mut bridge, &[100, 23, 1, 65, 13, 10]).await;

    assert_eq!(response, vec![100, 23, 0, 13, 10]);
    let received = bridge.bus().device(23).unwrap().received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0], &[65u8][..]);
}

#[tokio::test]
async fn test_read_two_bytes() {
    let bus = SimulatedBus::new().with_device(23, SimulatedDevice::with_response(vec![0xB0u8, 0xB1]));
    let mut bridge = bridge_with(bus);

    let response = roundtrip(&mut bridge, &[101, 23, 2, 13, 10]).await;

    assert_eq!(response, vec![101, 23, 2, 0xB0, 0xB1, 13, 10]);
}

#[tokio::test]
async fn test_short_read_reports_received_count() {
    let bus = SimulatedBus::new().with_device(23, SimulatedDevice::with_response(vec![0x01u8]));
    let mut bridge = bridge_with(bus);

    let response = roundtrip(&mut bridge, &[101, 23, 4, 13, 10]).await;

    assert_eq!(response, vec![101, 23, 1, 0x01, 13, 10]);
}

#[tokio::test]
async fn test_write_missing_count_is_message_error() {
    let mut bridge = bridge_with(SimulatedBus::new().with_device(23, SimulatedDevice::new()));

    let response = roundtrip(&mut bridge, &[100, 23, 13, 10]).await;

    assert_eq!(response, vec![107, 13, 10]);
    assert!(bridge.bus().events().is_empty());
}

#[tokio::test]
async fn test_unknown_and_emit_only_opcodes() {
    let mut bridge = bridge_with(SimulatedBus::new());

    assert_eq!(roundtrip(&mut bridge, &[42, 13, 10]).await, vec![108, 13, 10]);
    assert_eq!(roundtrip(&mut bridge, &[106, 13, 10]).await, vec![108, 13, 10]);
    assert_eq!(roundtrip(&mut bridge, &[107, 1, 13, 10]).await, vec![108, 13, 10]);
    assert_eq!(roundtrip(&mut bridge, &[13, 10]).await, vec![107, 13, 10]);
}

#[tokio::test]
async fn test_input_buffer_size_bounds_frames() {
    let mut bridge = bridge_with(SimulatedBus::new().with_device(23, SimulatedDevice::new()));

    assert_eq!(roundtrip(&mut bridge, &[116, 8, 0, 13, 10]).await, vec![116, 13, 10]);

    // Seven body bytes fit.
    let response = roundtrip(&mut bridge, &[100, 23, 4, 1, 2, 3, 4, 13, 10]).await;
    assert_eq!(response, vec![100, 23, 0, 13, 10]);

    // Nine do not: one messageError, nothing reaches the bus.
    bridge.bus_mut().clear_events();
    let response = roundtrip(&mut bridge, &[100, 23, 6, 1, 2, 3, 4, 5, 6, 13, 10]).await;
    assert_eq!(response, vec![107, 13, 10]);
    assert!(bridge.bus().events().is_empty());

    // The next frame is served normally.
    let response = roundtrip(&mut bridge, &[103, 23, 13, 10]).await;
    assert_eq!(response, vec![103, 23, 0, 13, 10]);
}

#[tokio::test]
async fn test_input_buffer_size_below_minimum_rejected() {
    let mut bridge = bridge_with(SimulatedBus::new());

    assert_eq!(roundtrip(&mut bridge, &[116, 2, 0, 13, 10]).await, vec![107, 13, 10]);
    assert_eq!(bridge.configuration().input_buffer_capacity, 128);
}

#[tokio::test]
async fn test_pipelined_frames_answered_in_order() {
    let bus = SimulatedBus::new()
        .with_device(0x20, SimulatedDevice::new())
        .with_device(0x21, SimulatedDevice::with_response(vec![9u8]));
    let mut bridge = bridge_with(bus);

    let mut input = Vec::new();
    input.extend(build_frame(Opcode::Write, &[0x20, 1, 0xFF]));
    input.extend(build_frame(Opcode::Read, &[0x21, 1]));
    input.extend(build_frame(Opcode::CheckDevice, &[0x22]));

    let responses = bridge.push(&input).await;

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0].as_bytes(), &[100, 0x20, 0, 13, 10]);
    assert_eq!(responses[1].as_bytes(), &[101, 0x21, 1, 9, 13, 10]);
    assert_eq!(responses[2].as_bytes(), &[103, 0x22, 2, 13, 10]);
}

#[tokio::test]
async fn test_successful_responses_echo_request_opcode() {
    let bus = SimulatedBus::new().with_device(0x30, SimulatedDevice::with_response(vec![1u8, 2, 3]));
    let mut bridge = bridge_with(bus);

    let requests: [&[u8]; 12] = [
        &[100, 0x30, 0],
        &[101, 0x30, 1],
        &[102, 0x30, 1, 0x00, 101, 1],
        &[103, 0x30],
        &[104],
        &[105],
        &[109],
        &[110],
        &[112, 1, 0],
        &[113, 4],
        &[114, 1, 0],
        &[115, 1, 0],
    ];

    for body in requests {
        let mut request = body.to_vec();
        request.extend([13, 10]);
        let response = roundtrip(&mut bridge, &request).await;
        assert_eq!(response[0], body[0], "request {:?}", body);
        assert_eq!(&response[response.len() - 2..], &[13, 10]);
    }
}

#[tokio::test(start_paused = true)]
async fn test_write_read_honours_configured_delay() {
    let bus = SimulatedBus::new().with_device(0x48, SimulatedDevice::with_response(vec![1u8, 2]));
    let mut bridge = bridge_with(bus);

    assert_eq!(roundtrip(&mut bridge, &[112, 30, 0, 13, 10]).await, vec![112, 13, 10]);

    let response = roundtrip(&mut bridge, &[102, 0x48, 1, 0x00, 101, 2, 13, 10]).await;

    assert_eq!(response, vec![102, 0x48, 2, 1, 2, 13, 10]);
    let events = bridge.bus().events();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0].kind, BusEventKind::Write { .. }));
    assert!(matches!(events[1].kind, BusEventKind::Read { .. }));
    assert!(events[1].at - events[0].at >= Duration::from_millis(30));
}

#[tokio::test(start_paused = true)]
async fn test_write_read_failed_write_skips_read() {
    let mut bridge = bridge_with(SimulatedBus::new());

    let response = roundtrip(&mut bridge, &[102, 0x50, 1, 0x00, 101, 1, 13, 10]).await;

    assert_eq!(response, vec![106, 2, 13, 10]);
    let events = bridge.bus().events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0].kind, BusEventKind::Write { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_reset_uses_configured_pin_and_timing() {
    let mut bridge = bridge_with(SimulatedBus::new());

    assert_eq!(roundtrip(&mut bridge, &[113, 5, 13, 10]).await, vec![113, 13, 10]);
    assert_eq!(roundtrip(&mut bridge, &[114, 20, 0, 13, 10]).await, vec![114, 13, 10]);
    assert_eq!(roundtrip(&mut bridge, &[115, 80, 0, 13, 10]).await, vec![115, 13, 10]);

    let start = Instant::now();
    assert_eq!(roundtrip(&mut bridge, &[105, 13, 10]).await, vec![105, 13, 10]);
    let answered = Instant::now();

    let events = bridge.reset_line().events();
    assert_eq!(events.len(), 2);
    assert_eq!((events[0].pin, events[0].level), (5, PinLevel::Low));
    assert_eq!((events[1].pin, events[1].level), (5, PinLevel::High));
    assert!(events[1].at - events[0].at >= Duration::from_millis(20));
    assert!(answered - events[1].at >= Duration::from_millis(80));
    assert!(answered - start >= Duration::from_millis(100));
}

#[tokio::test]
async fn test_device_list_matches_check_device() {
    let bus = SimulatedBus::new()
        .with_device(0x68, SimulatedDevice::new())
        .with_device(0x20, SimulatedDevice::new())
        .with_device(0x50, SimulatedDevice::new());
    let mut bridge = bridge_with(bus);

    let response = roundtrip(&mut bridge, &[104, 13, 10]).await;
    assert_eq!(response, vec![104, 3, 0x20, 0x50, 0x68, 13, 10]);

    for address in 1u8..=126 {
        let response = roundtrip(&mut bridge, &[103, address, 13, 10]).await;
        let present = [0x20, 0x50, 0x68].contains(&address);
        let expected_status = if present { 0 } else { 2 };
        assert_eq!(response, vec![103, address, expected_status, 13, 10]);
    }
}

#[tokio::test]
async fn test_device_list_follows_hot_plug() {
    let bus = SimulatedBus::new()
        .with_device(0x20, SimulatedDevice::new())
        .with_device(0x50, SimulatedDevice::with_response(vec![1u8]));
    let mut bridge = bridge_with(bus);

    assert_eq!(roundtrip(&mut bridge, &[104, 13, 10]).await, vec![104, 2, 0x20, 0x50, 13, 10]);

    bridge.bus_mut().remove_device(0x20);
    bridge.bus_mut().device_mut(0x50).unwrap().set_response(vec![5u8, 6]);

    assert_eq!(roundtrip(&mut bridge, &[104, 13, 10]).await, vec![104, 1, 0x50, 13, 10]);
    assert_eq!(
        roundtrip(&mut bridge, &[101, 0x50, 2, 13, 10]).await,
        vec![101, 0x50, 2, 5, 6, 13, 10]
    );
}

#[tokio::test]
async fn test_frequency_and_info() {
    let mut bridge = bridge_with(SimulatedBus::new());

    assert_eq!(roundtrip(&mut bridge, &[111, 13, 10]).await, vec![111, 13, 10]);
    assert_eq!(bridge.bus().frequency(), BusFrequency::Fast400k);

    let response = roundtrip(&mut bridge, &[109, 13, 10]).await;
    assert_eq!(
        response,
        vec![109, 1, 1, 10, 0, 2, 10, 0, 50, 0, 128, 0, 13, 10]
    );

    assert_eq!(roundtrip(&mut bridge, &[110, 13, 10]).await, vec![110, 13, 10]);
    assert_eq!(bridge.bus().frequency(), BusFrequency::Standard);
    assert_eq!(bridge.configuration().bus_frequency, BusFrequency::Standard);
}

#[tokio::test]
async fn test_bus_faults_answer_error_and_continue() {
    let mut bridge = bridge_with(SimulatedBus::new().with_device(23, SimulatedDevice::new()));

    bridge.bus_mut().fail_next(BusFault::Timeout);
    assert_eq!(roundtrip(&mut bridge, &[100, 23, 1, 0, 13, 10]).await, vec![106, 13, 10]);

    assert_eq!(
        roundtrip(&mut bridge, &[100, 23, 1, 0, 13, 10]).await,
        vec![100, 23, 0, 13, 10]
    );

    bridge.bus_mut().fail_frequency_changes(BusFault::ArbitrationLost);
    assert_eq!(roundtrip(&mut bridge, &[111, 13, 10]).await, vec![106, 13, 10]);
    assert_eq!(bridge.configuration().bus_frequency, BusFrequency::Standard);
}

#[tokio::test(start_paused = true)]
async fn test_run_over_duplex_stream() {
    let bus = SimulatedBus::new().with_device(0x48, SimulatedDevice::with_response(vec![0xAAu8, 0xBB]));
    let mut bridge = bridge_with(bus);

    let (client, server) = tokio::io::duplex(1024);
    let (server_rx, server_tx) = tokio::io::split(server);

    let mut request = Vec::new();
    request.extend(build_frame(Opcode::Write, &[0x48, 1, 0x01]));
    request.extend(build_frame(Opcode::WriteRead, &[0x48, 1, 0x02, 101, 2]));
    request.extend([42, 13, 10]);

    let expected: Vec<u8> = [
        &[100u8, 0x48, 0, 13, 10][..],
        &[102, 0x48, 2, 0xAA, 0xBB, 13, 10][..],
        &[108, 13, 10][..],
    ]
    .concat();

    let host = async move {
        let mut client = client;
        client.write_all(&request).await.unwrap();
        let mut received = vec![0u8; expected.len()];
        client.read_exact(&mut received).await.unwrap();
        (received, expected)
    };

    let (result, (received, expected)) = tokio::join!(bridge.run(server_rx, server_tx), host);

    result.unwrap();
    assert_eq!(received, expected);
}

#[tokio::test]
async fn test_run_returns_on_immediate_eof() {
    let mut bridge = bridge_with(SimulatedBus::new());
    let (client, server) = tokio::io::duplex(64);
    drop(client);
    let (server_rx, server_tx) = tokio::io::split(server);

    bridge.run(server_rx, server_tx).await.unwrap();
}
