use std::time::Duration;

use benchrs::TcpIpInterface;
use lecroy_620zi::{Lecroy620Zi, TriggerMode};
use measurements::Voltage;

fn main() {
    let address = "192.168.1.20:5025";

    let tcpip = TcpIpInterface::simple(address).expect("Failed to connect");
    let mut scope = Lecroy620Zi::try_new(tcpip).unwrap();
    println!("Instrument ID: {}", scope.get_name().unwrap());

    let mut c1 = scope.get_channel(0).unwrap();
    c1.set_vertical_scale(Voltage::from_volts(0.1)).unwrap();
    scope.set_trigger_source(0).unwrap();
    scope.set_trigger_level(0, Voltage::from_volts(0.05)).unwrap();
    scope.set_trigger_mode(TriggerMode::Normal).unwrap();

    // Statistics of parameter P1 over 100 sweeps
    scope.clear_sweeps().unwrap();
    scope
        .wait_for_sweeps(1, 100, Duration::from_millis(200), Duration::from_secs(60))
        .unwrap();
    println!("P1 mean: {:?}", scope.get_parameter_mean(1));

    let wf = c1.get_waveform().unwrap();
    println!("Waveform with {} samples", wf.len());
}
