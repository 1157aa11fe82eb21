use benchrs::TcpIpInterface;
use cryocon_22c::Cryocon22C;

fn main() {
    let address = "192.168.1.5:5000";

    let tcpip = TcpIpInterface::simple(address).expect("Failed to connect");
    let mut inst = Cryocon22C::try_new(tcpip).unwrap();
    println!("Instrument ID: {}", inst.get_name().unwrap());

    for idx in 0..2 {
        let mut ch = inst.get_channel(idx).unwrap();
        println!("Input {}: {:?}", ch.name(), ch.get_temperature());
    }

    let mut loop1 = inst.get_loop(0).unwrap();
    println!("Loop 1 setpoint: {:?}", loop1.get_setpoint());
    println!("Loop 1 output power: {:?} %", loop1.get_output_power());
    println!("Controlling: {:?}", inst.is_controlling());
}
