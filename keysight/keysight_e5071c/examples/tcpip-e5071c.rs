use std::time::Duration;

use benchrs::TcpIpInterface;
use keysight_e5071c::{E5071C, Format, SParameter};
use measurements::Frequency;

fn main() {
    let address = "192.168.1.30:5025";

    let tcpip = TcpIpInterface::simple(address).expect("Failed to connect");
    let mut vna = E5071C::try_new(tcpip).unwrap();
    println!("Instrument ID: {}", vna.get_name().unwrap());

    vna.set_center_span(Frequency::from_hertz(6e9), Frequency::from_hertz(100e6))
        .unwrap();
    vna.set_num_points(801).unwrap();
    vna.set_power(-30.0).unwrap();
    vna.set_if_bandwidth(Frequency::from_hertz(1e3)).unwrap();
    vna.set_measurement(SParameter::S21).unwrap();
    vna.set_format(Format::LogMag).unwrap();

    vna.single_sweep(Duration::from_secs(60)).unwrap();
    let trace = vna.get_trace().unwrap();
    for (f, s21) in trace.frequency.iter().zip(trace.primary.iter()).take(10) {
        println!("{f:.0} Hz: {s21:.2} dB");
    }
}
