use std::{thread, time::Duration};

use benchrs::SerialInterface;
use measurements::Voltage;
use srs_sim928::SrsSim928;

fn main() {
    let port = "/dev/ttyUSB0";

    // SIM900 mainframe with the SIM928 in slot 2
    let serial_inst = SerialInterface::simple(port, 9600).expect("Failed to open serial port");
    let mut source = SrsSim928::try_new(serial_inst, 2).unwrap();
    println!("Module ID: {}", source.get_name().unwrap());

    source.set_voltage(Voltage::from_volts(0.0)).unwrap();
    source.set_output(true).unwrap();
    for mv in (0..=500).step_by(100) {
        source
            .set_voltage(Voltage::from_volts(mv as f64 / 1000.0))
            .unwrap();
        thread::sleep(Duration::from_millis(200));
        println!("Voltage: {:?}", source.get_voltage());
    }
    source.set_voltage(Voltage::from_volts(0.0)).unwrap();
    source.set_output(false).unwrap();
}
