use lakeshore_336::{Lakeshore336, SerialInterfaceLakeshore};

fn main() {
    let port = "/dev/ttyUSB0";

    // Get our serial instrument interface
    let serial_inst = SerialInterfaceLakeshore::simple(port).expect("Failed to open serial port");

    // Now we can open the Lakeshore336 with the serial interface.
    let mut inst = Lakeshore336::try_new(serial_inst).unwrap();
    println!("Instrument ID: {}", inst.get_name().unwrap());

    // Read all four inputs
    for idx in 0..4 {
        let mut ch = inst.get_channel(idx).unwrap();
        println!("Input {} temperature: {:?}", ch.name(), ch.get_temperature());
    }

    // Show what loop 1 is doing
    let mut loop1 = inst.get_loop(0).unwrap();
    println!("Loop 1 setpoint: {:?}", loop1.get_setpoint());
    println!("Loop 1 heater range: {:?}", loop1.get_heater_range());
    println!("Loop 1 heater output: {:?} %", loop1.get_heater_output());
}
