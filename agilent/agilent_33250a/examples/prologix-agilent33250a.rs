use agilent_33250a::{Agilent33250A, Function, Load};
use benchrs::{PrologixInterface, SerialInterface};
use measurements::{Frequency, Voltage};

fn main() {
    let port = "/dev/ttyUSB0";

    // The generator sits at GPIB address 10 behind a Prologix GPIB-USB adapter.
    let adapter = SerialInterface::simple(port, 115200).expect("Failed to open serial port");
    let gpib = PrologixInterface::try_new(adapter, 10).unwrap();
    let mut awg = Agilent33250A::try_new(gpib).unwrap();
    println!("Instrument ID: {}", awg.get_name().unwrap());

    // Output a slow sawtooth, e.g., to ramp the bias current of a detector.
    awg.set_load(Load::HighZ).unwrap();
    awg.set_function(Function::Ramp).unwrap();
    awg.set_ramp_symmetry(100.0).unwrap();
    awg.set_frequency(Frequency::from_hertz(200.0)).unwrap();
    awg.set_vhighlow(Voltage::from_volts(1.0), Voltage::from_volts(0.0))
        .unwrap();
    awg.set_output(true).unwrap();

    println!("Frequency: {:?}", awg.get_frequency());
    println!("Amplitude: {:?}", awg.get_vpp());
}
