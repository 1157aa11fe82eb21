use std::time::Duration;

use agilent_53131a::{Agilent53131A, Slope};
use benchrs::{PrologixInterface, SerialInterface};
use measurements::Voltage;

fn main() {
    let port = "/dev/ttyUSB0";

    let adapter = SerialInterface::simple(port, 115200).expect("Failed to open serial port");
    let gpib = PrologixInterface::try_new(adapter, 5).unwrap();
    let mut counter = Agilent53131A::try_new(gpib).unwrap();
    println!("Instrument ID: {}", counter.get_name().unwrap());

    counter.basic_setup().unwrap();
    counter.set_trigger_level(Voltage::from_volts(0.1)).unwrap();
    counter.set_slope(Slope::Positive).unwrap();

    for _ in 0..5 {
        let rate = counter.count_rate(Duration::from_secs(1)).unwrap();
        println!("Count rate: {rate} counts/s");
    }
}
