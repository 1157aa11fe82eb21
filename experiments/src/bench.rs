//! Opening the configured instruments and running the configured experiment.
//!
//! [`run`] opens a [`Bench`] from the configuration and hands it to [`run_on`], which measures and
//! writes the results. A [`Bench`] can also be filled by hand, e.g., with drivers on other
//! interfaces.

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use agilent_33250a::Agilent33250A;
use agilent_53131a::Agilent53131A;
use attocube_anc300::{Anc300, Mode};
use benchrs::{InstrumentInterface, PrologixInterface, SerialInterface, TcpIpInterface};
use cryocon_22c::Cryocon22C;
use jdsu_ha9::JdsuHa9;
use keysight_e5071c::E5071C;
use lakeshore_336::{Lakeshore336, SerialInterfaceLakeshore};
use lecroy_620zi::Lecroy620Zi;
use measurements::Voltage;
use srs_sim928::SrsSim928;

use crate::{
    BenchError,
    config::{
        BenchConfig, BiasSourceConfig, Connection, CounterConfig, Experiment, HeaterPower,
        Instruments, PositionerConfig, TemperatureConfig,
    },
    counts::{attenuation_sweep, counts_vs_bias},
    data::{DataTable, RunMetadata, output_stem},
    ic_sweep::{step_iv_sweep, switching_current_histogram},
    plot::{Series, plot_map, plot_xy},
    raster::raster_scan,
    roles::{
        Attenuator, BiasSource, CryoconControl, LakeshoreControl, NetworkAnalyzer, Oscilloscope,
        PhotonCounter, Positioner, RampSource, TemperatureController,
    },
    sweep::secs,
    thermal::temperature_scan,
    vna::{temperature_trace_table, trace_table, vna_spectroscopy, vna_vs_temperature},
};

/// An interface selected at runtime.
pub type Interface = Box<dyn InstrumentInterface>;

/// Open the interface described by a connection.
pub fn open(conn: &Connection) -> Result<Interface, BenchError> {
    log::debug!("Opening {conn:?}");
    match conn {
        Connection::Serial { port, baud } => Ok(Box::new(SerialInterface::simple(port, *baud)?)),
        Connection::Tcp { address } => Ok(Box::new(TcpIpInterface::simple(address.as_str())?)),
        #[cfg(feature = "visa")]
        Connection::Visa { resource } => Ok(Box::new(benchrs::VisaInterface::simple(resource)?)),
        #[cfg(not(feature = "visa"))]
        Connection::Visa { resource } => Err(BenchError::UnsupportedConnection(format!(
            "VISA resource {resource} needs the `visa` feature"
        ))),
        Connection::Gpib { adapter, address } => {
            let adapter = open(adapter)?;
            Ok(Box::new(PrologixInterface::try_new(adapter, *address)?))
        }
    }
}

/// The instruments of a run, opened and set up, each in the role it plays.
///
/// Roles an experiment does not use stay `None`.
#[derive(Default)]
pub struct Bench {
    pub bias_source: Option<Box<dyn BiasSource>>,
    pub function_generator: Option<Box<dyn RampSource>>,
    pub oscilloscope: Option<Box<dyn Oscilloscope>>,
    pub counter: Option<Box<dyn PhotonCounter>>,
    pub temperature: Option<Box<dyn TemperatureController>>,
    pub attenuator: Option<Box<dyn Attenuator>>,
    pub network_analyzer: Option<Box<dyn NetworkAnalyzer>>,
    /// x and y axis
    pub positioner: Option<(Box<dyn Positioner>, Box<dyn Positioner>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    BiasSource,
    FunctionGenerator,
    Oscilloscope,
    Counter,
    Temperature,
    Attenuator,
    NetworkAnalyzer,
    Positioner,
}

impl Role {
    fn name(self) -> &'static str {
        match self {
            Role::BiasSource => "bias source",
            Role::FunctionGenerator => "function generator",
            Role::Oscilloscope => "oscilloscope",
            Role::Counter => "counter",
            Role::Temperature => "temperature controller",
            Role::Attenuator => "attenuator",
            Role::NetworkAnalyzer => "network analyzer",
            Role::Positioner => "positioner",
        }
    }

    fn is_configured(self, inst: &Instruments) -> bool {
        match self {
            Role::BiasSource => inst.bias_source.is_some(),
            Role::FunctionGenerator => inst.function_generator.is_some(),
            Role::Oscilloscope => inst.oscilloscope.is_some(),
            Role::Counter => inst.counter.is_some(),
            Role::Temperature => inst.temperature.is_some(),
            Role::Attenuator => inst.attenuator.is_some(),
            Role::NetworkAnalyzer => inst.network_analyzer.is_some(),
            Role::Positioner => inst.positioner.is_some(),
        }
    }
}

/// Roles an experiment cannot do without, and roles it uses when they are configured.
fn roles(experiment: &Experiment) -> (&'static [Role], &'static [Role]) {
    match experiment {
        Experiment::SwitchingHistogram(_) => (&[Role::FunctionGenerator, Role::Oscilloscope], &[]),
        Experiment::IvSweep(_) => (&[Role::BiasSource, Role::Oscilloscope], &[]),
        Experiment::SwitchingVsTemperature { .. } => (
            &[Role::Temperature, Role::FunctionGenerator, Role::Oscilloscope],
            &[],
        ),
        Experiment::CountsVsBias(_) => (&[Role::BiasSource, Role::Counter], &[Role::Attenuator]),
        Experiment::AttenuationSweep { .. } => (&[Role::Attenuator, Role::Counter], &[]),
        Experiment::Raster(_) => (&[Role::Positioner, Role::Counter], &[]),
        Experiment::VnaSpectroscopy(_) => (&[Role::NetworkAnalyzer], &[]),
        Experiment::VnaVsTemperature { .. } => (&[Role::Temperature, Role::NetworkAnalyzer], &[]),
    }
}

impl Bench {
    /// Open the instruments the configured experiment uses, and only those.
    ///
    /// Fails with [`BenchError::MissingInstrument`] before anything is opened if the configuration
    /// lacks an instrument the experiment needs.
    pub fn open(config: &BenchConfig) -> Result<Self, BenchError> {
        let inst = &config.instruments;
        let (required, optional) = roles(&config.experiment);
        if let Some(missing) = required.iter().find(|r| !r.is_configured(inst)) {
            return Err(BenchError::MissingInstrument(missing.name().to_string()));
        }

        let mut bench = Bench::default();
        for &role in required {
            bench.open_role(inst, role)?;
        }
        for &role in optional.iter().filter(|r| r.is_configured(inst)) {
            bench.open_role(inst, role)?;
        }
        Ok(bench)
    }

    fn open_role(&mut self, inst: &Instruments, role: Role) -> Result<(), BenchError> {
        log::debug!("Setting up the {}", role.name());
        match role {
            Role::BiasSource => {
                if let Some(cfg) = &inst.bias_source {
                    self.bias_source = Some(bias_source(cfg)?);
                }
            }
            Role::FunctionGenerator => {
                if let Some(conn) = &inst.function_generator {
                    self.function_generator = Some(Box::new(Agilent33250A::try_new(open(conn)?)?));
                }
            }
            Role::Oscilloscope => {
                if let Some(conn) = &inst.oscilloscope {
                    let mut scope = Lecroy620Zi::try_new(open(conn)?)?;
                    log::info!("Oscilloscope: {}", scope.get_name()?);
                    self.oscilloscope = Some(Box::new(scope));
                }
            }
            Role::Counter => {
                if let Some(cfg) = &inst.counter {
                    self.counter = Some(Box::new(counter(cfg)?));
                }
            }
            Role::Temperature => {
                if let Some(cfg) = &inst.temperature {
                    self.temperature = Some(temperature_controller(cfg)?);
                }
            }
            Role::Attenuator => {
                if let Some(conn) = &inst.attenuator {
                    self.attenuator = Some(Box::new(JdsuHa9::try_new(open(conn)?)?));
                }
            }
            Role::NetworkAnalyzer => {
                if let Some(conn) = &inst.network_analyzer {
                    self.network_analyzer = Some(Box::new(E5071C::try_new(open(conn)?)?));
                }
            }
            Role::Positioner => {
                if let Some(cfg) = &inst.positioner {
                    self.positioner = Some(positioner(cfg)?);
                }
            }
        }
        Ok(())
    }
}

fn bias_source(cfg: &BiasSourceConfig) -> Result<Box<dyn BiasSource>, BenchError> {
    let source: Box<dyn BiasSource> = match cfg {
        BiasSourceConfig::Sim928 {
            connection,
            slot: Some(slot),
        } => Box::new(SrsSim928::try_new(open(connection)?, *slot)?),
        BiasSourceConfig::Sim928 {
            connection,
            slot: None,
        } => Box::new(SrsSim928::try_new_direct(open(connection)?)?),
        BiasSourceConfig::Agilent33250a { connection } => {
            Box::new(Agilent33250A::try_new(open(connection)?)?)
        }
    };
    Ok(source)
}

fn temperature_controller(
    cfg: &TemperatureConfig,
) -> Result<Box<dyn TemperatureController>, BenchError> {
    match cfg {
        TemperatureConfig::Lakeshore336 {
            connection,
            input,
            output,
            heater_range,
        } => {
            // The serial port of the 336 needs odd parity and seven data bits.
            let intf: Interface = match connection {
                Connection::Serial { port, .. } => {
                    Box::new(SerialInterfaceLakeshore::simple(port)?)
                }
                other => open(other)?,
            };
            let mut inst = Lakeshore336::try_new(intf)?;
            log::info!("Temperature controller: {}", inst.get_name()?);
            let range = match heater_range {
                HeaterPower::Low => lakeshore_336::HeaterRange::Low,
                HeaterPower::Medium => lakeshore_336::HeaterRange::Medium,
                HeaterPower::High => lakeshore_336::HeaterRange::High,
            };
            Ok(Box::new(LakeshoreControl::new(&mut inst, *input, *output, range)?))
        }
        TemperatureConfig::Cryocon22c {
            connection,
            input,
            output,
            heater_range,
        } => {
            let mut inst = Cryocon22C::try_new(open(connection)?)?;
            log::info!("Temperature controller: {}", inst.get_name()?);
            let range = match heater_range {
                HeaterPower::Low => cryocon_22c::HeaterRange::Low,
                HeaterPower::Medium => cryocon_22c::HeaterRange::Mid,
                HeaterPower::High => cryocon_22c::HeaterRange::Hi,
            };
            Ok(Box::new(CryoconControl::new(&mut inst, *input, *output, range)?))
        }
    }
}

fn counter(cfg: &CounterConfig) -> Result<Agilent53131A<Interface>, BenchError> {
    let mut inst = Agilent53131A::try_new(open(&cfg.connection)?)?;
    inst.basic_setup()?;
    inst.set_trigger_level(Voltage::from_volts(cfg.trigger_level_v))?;
    Ok(inst)
}

type AxisPair = (Box<dyn Positioner>, Box<dyn Positioner>);

fn positioner(cfg: &PositionerConfig) -> Result<AxisPair, BenchError> {
    let mut inst = Anc300::try_new(open(&cfg.connection)?)?;
    if let Some(password) = &cfg.password {
        inst.authenticate(password)?;
    }
    let mut x = inst.get_axis(cfg.x_axis)?;
    let mut y = inst.get_axis(cfg.y_axis)?;
    x.set_mode(Mode::Step)?;
    y.set_mode(Mode::Step)?;
    Ok((Box::new(x), Box::new(y)))
}

/// The instrument in a role, or [`BenchError::MissingInstrument`].
fn need<'a, R: ?Sized>(role: &'a mut Option<Box<R>>, name: &str) -> Result<&'a mut R, BenchError> {
    role.as_deref_mut()
        .ok_or_else(|| BenchError::MissingInstrument(name.to_string()))
}

/// Append an extension to a path stem, keeping any dots already in it.
fn with_ext(stem: &Path, ext: &str) -> PathBuf {
    let mut s = OsString::from(stem.as_os_str());
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

/// What a finished experiment leaves behind, before it is written to disk.
struct RunOutput {
    table: DataTable,
    metadata: RunMetadata,
    plot: PlotKind,
}

enum PlotKind {
    Xy {
        title: String,
        x_label: String,
        y_label: String,
        series: Vec<Series>,
    },
    Map {
        title: String,
        grid: Vec<Vec<f64>>,
    },
}

/// Series of one table column against another, empty if a column is missing.
fn column_series(table: &DataTable, x: &str, y: &str) -> Series {
    Series::new(y, table.xy(x, y).unwrap_or_default())
}

/// Open the instruments of the configuration, run its experiment and save the results.
///
/// See [`run_on`] for the files that are written.
pub fn run(config: &BenchConfig) -> Result<PathBuf, BenchError> {
    log::info!("Running {} on {}", config.experiment.name(), config.sample);
    let mut bench = Bench::open(config)?;
    run_on(&mut bench, config)
}

/// Run the configured experiment with already opened instruments and save the results.
///
/// Writes `<stem>.csv`, `<stem>.yaml` and `<stem>.svg` into the output directory and returns the
/// stem. Nothing is written if the measurement fails.
pub fn run_on(bench: &mut Bench, config: &BenchConfig) -> Result<PathBuf, BenchError> {
    let output = measure(bench, config)?;

    fs::create_dir_all(&config.output_dir)?;
    let stem = output_stem(&config.output_dir, &config.sample, config.experiment.name());
    output.table.write_csv(with_ext(&stem, "csv"))?;
    output.metadata.write_yaml(with_ext(&stem, "yaml"))?;
    let plot_path = with_ext(&stem, "svg");
    match output.plot {
        PlotKind::Xy {
            title,
            x_label,
            y_label,
            series,
        } => plot_xy(&plot_path, &title, &x_label, &y_label, &series)?,
        PlotKind::Map { title, grid } => plot_map(&plot_path, &title, &grid)?,
    }
    log::info!("Saved {}", stem.display());
    Ok(stem)
}

/// Experiment settings as flat metadata parameters, nested values as inline YAML.
fn settings_metadata(config: &BenchConfig) -> Result<RunMetadata, BenchError> {
    let mut metadata = RunMetadata::new(config.experiment.name(), &config.sample);
    if let serde_yaml::Value::Mapping(map) = serde_yaml::to_value(&config.experiment)? {
        for (k, v) in map {
            let key = serde_yaml::to_string(&k)?;
            let value = serde_yaml::to_string(&v)?;
            metadata.insert(key.trim(), value.trim());
        }
    }
    Ok(metadata)
}

fn measure(bench: &mut Bench, config: &BenchConfig) -> Result<RunOutput, BenchError> {
    let mut metadata = settings_metadata(config)?;

    let (table, plot) = match &config.experiment {
        Experiment::SwitchingHistogram(settings) => {
            let awg = need(&mut bench.function_generator, Role::FunctionGenerator.name())?;
            let scope = need(&mut bench.oscilloscope, Role::Oscilloscope.name())?;
            let result = switching_current_histogram(awg, scope, settings)?;
            metadata.insert("isw_mean_a", result.histogram.mean);
            metadata.insert("isw_std_a", result.histogram.std_dev);
            let table = result.histogram.to_table();
            let plot = PlotKind::Xy {
                title: format!("{} switching current", config.sample),
                x_label: "I (A)".to_string(),
                y_label: "Counts".to_string(),
                series: vec![column_series(&table, "center", "count")],
            };
            (table, plot)
        }
        Experiment::IvSweep(settings) => {
            let source = need(&mut bench.bias_source, Role::BiasSource.name())?;
            let scope = need(&mut bench.oscilloscope, Role::Oscilloscope.name())?;
            let table = step_iv_sweep(source, scope, settings)?;
            let plot = PlotKind::Xy {
                title: format!("{} IV", config.sample),
                x_label: "I (A)".to_string(),
                y_label: "V (V)".to_string(),
                series: vec![column_series(&table, "bias_current", "device_voltage")],
            };
            (table, plot)
        }
        Experiment::SwitchingVsTemperature {
            setpoints_k,
            stabilize,
            switching,
        } => {
            let ctrl = need(&mut bench.temperature, Role::Temperature.name())?;
            let awg = need(&mut bench.function_generator, Role::FunctionGenerator.name())?;
            let scope = need(&mut bench.oscilloscope, Role::Oscilloscope.name())?;
            let points = temperature_scan(ctrl, setpoints_k, stabilize, |_| {
                let result = switching_current_histogram(&mut *awg, &mut *scope, switching)?;
                Ok(vec![result.histogram.mean, result.histogram.std_dev])
            })?;
            let mut table =
                DataTable::new(&["setpoint_k", "temperature_k", "isw_mean_a", "isw_std_a"]);
            for p in points {
                let mut row = vec![p.setpoint, p.temperature];
                row.extend(p.values);
                table.push_row(row)?;
            }
            let plot = PlotKind::Xy {
                title: format!("{} switching current vs temperature", config.sample),
                x_label: "T (K)".to_string(),
                y_label: "I (A)".to_string(),
                series: vec![column_series(&table, "temperature_k", "isw_mean_a")],
            };
            (table, plot)
        }
        Experiment::CountsVsBias(settings) => {
            let source = need(&mut bench.bias_source, Role::BiasSource.name())?;
            let counter = need(&mut bench.counter, Role::Counter.name())?;
            let attenuator = bench
                .attenuator
                .as_mut()
                .map(|a| &mut **a as &mut dyn Attenuator);
            let table = counts_vs_bias(source, counter, attenuator, settings)?;
            let series = table.columns()[1..]
                .iter()
                .map(|c| column_series(&table, "bias_voltage", c))
                .collect();
            let plot = PlotKind::Xy {
                title: format!("{} counts vs bias", config.sample),
                x_label: "Bias (V)".to_string(),
                y_label: "Rate (1/s)".to_string(),
                series,
            };
            (table, plot)
        }
        Experiment::AttenuationSweep {
            attenuations_db,
            gate_s,
        } => {
            let attenuator = need(&mut bench.attenuator, Role::Attenuator.name())?;
            let counter = need(&mut bench.counter, Role::Counter.name())?;
            let table = attenuation_sweep(attenuator, counter, attenuations_db, secs(*gate_s)?)?;
            let plot = PlotKind::Xy {
                title: format!("{} counts vs attenuation", config.sample),
                x_label: "Attenuation (dB)".to_string(),
                y_label: "Rate (1/s)".to_string(),
                series: vec![column_series(&table, "attenuation_db", "rate")],
            };
            (table, plot)
        }
        Experiment::Raster(settings) => {
            let (x, y) = bench
                .positioner
                .as_mut()
                .ok_or_else(|| BenchError::MissingInstrument(Role::Positioner.name().to_string()))?;
            let counter = need(&mut bench.counter, Role::Counter.name())?;
            let grid = raster_scan(&mut **x, &mut **y, counter, settings)?;
            let plot = PlotKind::Map {
                title: format!("{} raster", config.sample),
                grid: grid.counts.clone(),
            };
            (grid.to_table()?, plot)
        }
        Experiment::VnaSpectroscopy(settings) => {
            let vna = need(&mut bench.network_analyzer, Role::NetworkAnalyzer.name())?;
            let trace = vna_spectroscopy(vna, settings)?;
            let table = trace_table(&trace)?;
            let plot = PlotKind::Xy {
                title: format!("{} {:?}", config.sample, settings.parameter),
                x_label: "f (Hz)".to_string(),
                y_label: format!("{:?}", settings.format),
                series: vec![column_series(&table, "frequency_hz", "primary")],
            };
            (table, plot)
        }
        Experiment::VnaVsTemperature {
            setpoints_k,
            stabilize,
            vna: settings,
        } => {
            let ctrl = need(&mut bench.temperature, Role::Temperature.name())?;
            let vna = need(&mut bench.network_analyzer, Role::NetworkAnalyzer.name())?;
            let traces = vna_vs_temperature(vna, ctrl, setpoints_k, settings, stabilize)?;
            let series = traces
                .iter()
                .map(|t| {
                    let points = t
                        .trace
                        .frequency
                        .iter()
                        .copied()
                        .zip(t.trace.primary.iter().copied())
                        .collect();
                    Series::new(&format!("{:.3} K", t.temperature), points)
                })
                .collect();
            let plot = PlotKind::Xy {
                title: format!("{} {:?} vs temperature", config.sample, settings.parameter),
                x_label: "f (Hz)".to_string(),
                y_label: format!("{:?}", settings.format),
                series,
            };
            (temperature_trace_table(&traces)?, plot)
        }
    };

    Ok(RunOutput {
        table,
        metadata,
        plot,
    })
}
