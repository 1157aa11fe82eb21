use std::{thread, time::Duration};

use benchrs::{PrologixInterface, SerialInterface};
use jdsu_ha9::JdsuHa9;

fn main() {
    let port = "/dev/ttyUSB0";

    let adapter = SerialInterface::simple(port, 115200).expect("Failed to open serial port");
    let gpib = PrologixInterface::try_new(adapter, 7).unwrap();
    let mut att = JdsuHa9::try_new(gpib).unwrap();
    println!("Instrument ID: {}", att.get_name().unwrap());

    // Step the attenuation down in 10 dB steps with the beam open
    att.set_beam_block(false).unwrap();
    for db in [60.0, 50.0, 40.0, 30.0] {
        att.set_attenuation(db).unwrap();
        thread::sleep(Duration::from_millis(500));
        println!("Attenuation: {:?} dB", att.get_attenuation());
    }
    att.set_beam_block(true).unwrap();
}
