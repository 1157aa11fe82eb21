use std::time::Duration;

use attocube_anc300::{Anc300, Direction, Mode};
use benchrs::TcpIpInterface;
use measurements::{Frequency, Voltage};

fn main() {
    let address = "192.168.1.40:7230";

    let tcpip = TcpIpInterface::simple(address).expect("Failed to connect");
    let mut anc = Anc300::try_new(tcpip).unwrap();
    anc.authenticate("123456").unwrap();
    println!("Controller: {}", anc.get_name().unwrap());

    let mut x = anc.get_axis(0).unwrap();
    println!("Capacitance of axis 1: {:?} F", x.get_capacitance());

    x.set_mode(Mode::Step).unwrap();
    x.set_frequency(Frequency::from_hertz(100.0)).unwrap();
    x.set_voltage(Voltage::from_volts(25.0)).unwrap();
    x.step(Direction::Up, 50).unwrap();
    x.wait_steps(Duration::from_secs(10)).unwrap();
    x.set_mode(Mode::Ground).unwrap();
}
