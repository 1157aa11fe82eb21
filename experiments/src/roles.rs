//! The roles instruments play in the measurement routines.
//!
//! Routines are written against these traits, not against a specific driver, so that a bias can
//! come from a SIM928 or a function generator and the temperature from either controller. Each
//! trait is implemented here for the drivers of this workspace.

use std::time::Duration;

use agilent_33250a::{Agilent33250A, Function};
use agilent_53131a::Agilent53131A;
use attocube_anc300::{Axis, Direction};
use benchrs::{InstrumentError, InstrumentInterface};
use cryocon_22c::Cryocon22C;
use jdsu_ha9::JdsuHa9;
use keysight_e5071c::{E5071C, VnaTrace};
use lakeshore_336::Lakeshore336;
use lecroy_620zi::Lecroy620Zi;
use measurements::{Frequency, Temperature, Voltage};
use srs_sim928::SrsSim928;

use crate::vna::VnaSettings;

/// A voltage source that biases the detector through a series resistor.
pub trait BiasSource {
    /// Set the bias voltage.
    fn set_bias(&mut self, voltage: Voltage) -> Result<(), InstrumentError>;
    /// Turn the bias output on or off.
    fn set_bias_output(&mut self, on: bool) -> Result<(), InstrumentError>;
}

/// Something that counts detector clicks.
pub trait PhotonCounter {
    /// Count rate in counts per second, measured over the given gate time.
    fn count_rate(&mut self, gate: Duration) -> Result<f64, InstrumentError>;
}

/// One sensor input and one control loop of a temperature controller.
pub trait TemperatureController {
    /// Set the control setpoint.
    fn set_setpoint(&mut self, setpoint: Temperature) -> Result<(), InstrumentError>;
    /// Read the temperature of the sensor that is regulated on.
    fn get_temperature(&mut self) -> Result<Temperature, InstrumentError>;
    /// Start (`true`) or stop (`false`) heating towards the setpoint.
    fn set_heating(&mut self, on: bool) -> Result<(), InstrumentError>;
}

/// A variable optical attenuator with a beam block.
pub trait Attenuator {
    /// Set the attenuation in dB.
    fn set_attenuation(&mut self, db: f64) -> Result<(), InstrumentError>;
    /// Block or open the beam.
    fn set_beam_block(&mut self, block: bool) -> Result<(), InstrumentError>;
}

/// One axis of a stepping positioner.
pub trait Positioner {
    /// Move by the given number of steps, the sign gives the direction, and wait for the move.
    fn move_steps(&mut self, steps: i64) -> Result<(), InstrumentError>;
}

/// An oscilloscope with measurement parameters.
pub trait Oscilloscope {
    /// Clear the accumulated statistics.
    fn clear_sweeps(&mut self) -> Result<(), InstrumentError>;
    /// Wait until parameter `p` has at least `n` sweeps.
    fn wait_for_sweeps(
        &mut self,
        p: u8,
        n: u64,
        poll: Duration,
        timeout: Duration,
    ) -> Result<u64, InstrumentError>;
    /// Mean of parameter `p` since the last clear.
    fn parameter_mean(&mut self, p: u8) -> Result<f64, InstrumentError>;
    /// `n` values of parameter `p`, one per acquisition.
    fn parameter_values(
        &mut self,
        p: u8,
        n: usize,
        timeout: Duration,
    ) -> Result<Vec<f64>, InstrumentError>;
}

/// A generator for a periodic rising voltage ramp.
pub trait RampSource {
    /// Output a sawtooth from `low` to `high` at the given repetition frequency.
    fn configure_ramp(
        &mut self,
        frequency: Frequency,
        low: Voltage,
        high: Voltage,
    ) -> Result<(), InstrumentError>;
    /// Turn the ramp output on or off.
    fn set_ramp_output(&mut self, on: bool) -> Result<(), InstrumentError>;
}

/// A vector network analyzer.
pub trait NetworkAnalyzer {
    /// Apply the sweep settings.
    fn configure(&mut self, settings: &VnaSettings) -> Result<(), InstrumentError>;
    /// Run a single sweep, waiting at most `max_wait`, and read the trace.
    fn measure(&mut self, max_wait: Duration) -> Result<VnaTrace, InstrumentError>;
}

impl<T: InstrumentInterface> BiasSource for SrsSim928<T> {
    fn set_bias(&mut self, voltage: Voltage) -> Result<(), InstrumentError> {
        self.set_voltage(voltage)
    }

    fn set_bias_output(&mut self, on: bool) -> Result<(), InstrumentError> {
        self.set_output(on)
    }
}

/// The function generator biases in DC mode, the offset is the bias voltage.
impl<T: InstrumentInterface> BiasSource for Agilent33250A<T> {
    fn set_bias(&mut self, voltage: Voltage) -> Result<(), InstrumentError> {
        self.set_offset(voltage)
    }

    fn set_bias_output(&mut self, on: bool) -> Result<(), InstrumentError> {
        if on {
            self.set_function(Function::Dc)?;
        }
        self.set_output(on)
    }
}

impl<T: InstrumentInterface> RampSource for Agilent33250A<T> {
    fn configure_ramp(
        &mut self,
        frequency: Frequency,
        low: Voltage,
        high: Voltage,
    ) -> Result<(), InstrumentError> {
        self.set_function(Function::Ramp)?;
        self.set_ramp_symmetry(100.0)?;
        self.set_frequency(frequency)?;
        self.set_vhighlow(high, low)
    }

    fn set_ramp_output(&mut self, on: bool) -> Result<(), InstrumentError> {
        self.set_output(on)
    }
}

impl<T: InstrumentInterface> PhotonCounter for Agilent53131A<T> {
    fn count_rate(&mut self, gate: Duration) -> Result<f64, InstrumentError> {
        Agilent53131A::count_rate(self, gate)
    }
}

impl<T: InstrumentInterface> Attenuator for JdsuHa9<T> {
    fn set_attenuation(&mut self, db: f64) -> Result<(), InstrumentError> {
        JdsuHa9::set_attenuation(self, db)
    }

    fn set_beam_block(&mut self, block: bool) -> Result<(), InstrumentError> {
        JdsuHa9::set_beam_block(self, block)
    }
}

/// Longest wait for a single move of an axis.
const MOVE_TIMEOUT: Duration = Duration::from_secs(120);

impl<T: InstrumentInterface> Positioner for Axis<T> {
    fn move_steps(&mut self, steps: i64) -> Result<(), InstrumentError> {
        if steps == 0 {
            return Ok(());
        }
        let direction = if steps > 0 {
            Direction::Up
        } else {
            Direction::Down
        };
        let count = u32::try_from(steps.unsigned_abs()).map_err(|_| {
            InstrumentError::InvalidArgument(format!("Cannot move {steps} steps at once"))
        })?;
        self.step(direction, count)?;
        self.wait_steps(MOVE_TIMEOUT)
    }
}

impl<T: InstrumentInterface> Oscilloscope for Lecroy620Zi<T> {
    fn clear_sweeps(&mut self) -> Result<(), InstrumentError> {
        Lecroy620Zi::clear_sweeps(self)
    }

    fn wait_for_sweeps(
        &mut self,
        p: u8,
        n: u64,
        poll: Duration,
        timeout: Duration,
    ) -> Result<u64, InstrumentError> {
        Lecroy620Zi::wait_for_sweeps(self, p, n, poll, timeout)
    }

    fn parameter_mean(&mut self, p: u8) -> Result<f64, InstrumentError> {
        self.get_parameter_mean(p)
    }

    fn parameter_values(
        &mut self,
        p: u8,
        n: usize,
        timeout: Duration,
    ) -> Result<Vec<f64>, InstrumentError> {
        self.get_parameter_values(p, n, timeout)
    }
}

impl<T: InstrumentInterface> NetworkAnalyzer for E5071C<T> {
    fn configure(&mut self, settings: &VnaSettings) -> Result<(), InstrumentError> {
        self.set_start_frequency(Frequency::from_hertz(settings.start_hz))?;
        self.set_stop_frequency(Frequency::from_hertz(settings.stop_hz))?;
        self.set_num_points(settings.points)?;
        self.set_power(settings.power_dbm)?;
        self.set_if_bandwidth(Frequency::from_hertz(settings.if_bandwidth_hz))?;
        self.set_measurement(settings.parameter.into())?;
        self.set_format(settings.format.into())?;
        self.set_averaging(settings.averages)
    }

    fn measure(&mut self, max_wait: Duration) -> Result<VnaTrace, InstrumentError> {
        self.set_output(true)?;
        self.single_sweep(max_wait)?;
        self.get_trace()
    }
}

/// Input and heater output of a Lakeshore 336 used together.
///
/// Heating sets the heater range of the output, stopping sets it to off.
pub struct LakeshoreControl<T: InstrumentInterface> {
    input: lakeshore_336::Channel<T>,
    output: lakeshore_336::Loop<T>,
    range: lakeshore_336::HeaterRange,
}

impl<T: InstrumentInterface> LakeshoreControl<T> {
    /// Pair input `input` (0 is A) with heater output `output` (0 is output 1).
    ///
    /// Nothing is sent to the controller, the heater stays as it is until
    /// [`TemperatureController::set_heating`] is called.
    pub fn new(
        inst: &mut Lakeshore336<T>,
        input: usize,
        output: usize,
        range: lakeshore_336::HeaterRange,
    ) -> Result<Self, InstrumentError> {
        Ok(Self {
            input: inst.get_channel(input)?,
            output: inst.get_loop(output)?,
            range,
        })
    }
}

impl<T: InstrumentInterface> TemperatureController for LakeshoreControl<T> {
    fn set_setpoint(&mut self, setpoint: Temperature) -> Result<(), InstrumentError> {
        self.output.set_setpoint(setpoint)
    }

    fn get_temperature(&mut self) -> Result<Temperature, InstrumentError> {
        self.input.get_temperature()
    }

    fn set_heating(&mut self, on: bool) -> Result<(), InstrumentError> {
        let range = if on {
            self.range
        } else {
            lakeshore_336::HeaterRange::Off
        };
        self.output.set_heater_range(range)
    }
}

/// Input and control loop of a Cryo-con 22C used together.
///
/// Heating sets the heater range and engages control, stopping disengages all loops.
pub struct CryoconControl<T: InstrumentInterface> {
    inst: Cryocon22C<T>,
    input: cryocon_22c::Channel<T>,
    output: cryocon_22c::Loop<T>,
    range: cryocon_22c::HeaterRange,
}

impl<T: InstrumentInterface> CryoconControl<T> {
    /// Pair input `input` (0 is A) with loop `output` (0 is loop 1) and regulate on that input.
    ///
    /// Control is not engaged here, see [`TemperatureController::set_heating`].
    pub fn new(
        inst: &mut Cryocon22C<T>,
        input: usize,
        output: usize,
        range: cryocon_22c::HeaterRange,
    ) -> Result<Self, InstrumentError> {
        let input_ch = inst.get_channel(input)?;
        let mut output_loop = inst.get_loop(output)?;
        output_loop.set_source(input)?;
        Ok(Self {
            inst: inst.clone(),
            input: input_ch,
            output: output_loop,
            range,
        })
    }
}

impl<T: InstrumentInterface> TemperatureController for CryoconControl<T> {
    fn set_setpoint(&mut self, setpoint: Temperature) -> Result<(), InstrumentError> {
        self.output.set_setpoint(setpoint)
    }

    fn get_temperature(&mut self) -> Result<Temperature, InstrumentError> {
        self.input.get_temperature()
    }

    fn set_heating(&mut self, on: bool) -> Result<(), InstrumentError> {
        if on {
            self.output.set_range(self.range)?;
        }
        self.inst.control(on)
    }
}
