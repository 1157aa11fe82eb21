use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    counts::CountsSettings,
    error::ConfigError,
    ic_sweep::{IvSettings, SwitchingSettings},
    raster::RasterSettings,
    thermal::StabilizeSettings,
    vna::VnaSettings,
};

/// How an instrument is reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Connection {
    /// Serial port, e.g. `/dev/ttyUSB0` or `COM3`
    Serial { port: String, baud: u32 },
    /// Raw socket, `host:port`
    Tcp { address: String },
    /// VISA resource string, needs the `visa` feature
    Visa { resource: String },
    /// GPIB address behind a Prologix adapter that is itself reached through `adapter`.
    /// Each adapter port can only be opened once.
    Gpib { adapter: Box<Connection>, address: u8 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum BiasSourceConfig {
    /// SRS SIM928, `slot` in a SIM900 mainframe or `None` if connected directly
    Sim928 {
        connection: Connection,
        slot: Option<u8>,
    },
    /// Agilent 33250A in DC mode
    Agilent33250a { connection: Connection },
}

/// Heater range used while a temperature is regulated. The heater is off otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaterPower {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum TemperatureConfig {
    /// Lakeshore 336. `input` 0 is A, `output` 0 is heater output 1.
    Lakeshore336 {
        connection: Connection,
        input: usize,
        output: usize,
        heater_range: HeaterPower,
    },
    /// Cryo-con 22C. `input` 0 is A, `output` 0 is loop 1.
    Cryocon22c {
        connection: Connection,
        input: usize,
        output: usize,
        heater_range: HeaterPower,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterConfig {
    pub connection: Connection,
    /// Trigger level of input 1 in V
    pub trigger_level_v: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionerConfig {
    pub connection: Connection,
    /// Login password, only needed on the ethernet port
    pub password: Option<String>,
    /// Axis number of x, 0 is axis 1
    pub x_axis: usize,
    /// Axis number of y, 0 is axis 1
    pub y_axis: usize,
}

/// Connections of the instruments on the bench. Only the ones an experiment uses need to be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Instruments {
    pub bias_source: Option<BiasSourceConfig>,
    pub function_generator: Option<Connection>,
    pub oscilloscope: Option<Connection>,
    pub counter: Option<CounterConfig>,
    pub temperature: Option<TemperatureConfig>,
    pub attenuator: Option<Connection>,
    pub network_analyzer: Option<Connection>,
    pub positioner: Option<PositionerConfig>,
}

/// The measurement a run performs, with its settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Experiment {
    SwitchingHistogram(SwitchingSettings),
    IvSweep(IvSettings),
    /// Switching current histogram at every temperature
    SwitchingVsTemperature {
        setpoints_k: Vec<f64>,
        stabilize: StabilizeSettings,
        switching: SwitchingSettings,
    },
    CountsVsBias(CountsSettings),
    AttenuationSweep {
        attenuations_db: Vec<f64>,
        gate_s: f64,
    },
    Raster(RasterSettings),
    VnaSpectroscopy(VnaSettings),
    VnaVsTemperature {
        setpoints_k: Vec<f64>,
        stabilize: StabilizeSettings,
        vna: VnaSettings,
    },
}

impl Experiment {
    /// Short name used in file names and metadata.
    pub fn name(&self) -> &'static str {
        match self {
            Experiment::SwitchingHistogram(_) => "switching_histogram",
            Experiment::IvSweep(_) => "iv_sweep",
            Experiment::SwitchingVsTemperature { .. } => "switching_vs_temperature",
            Experiment::CountsVsBias(_) => "counts_vs_bias",
            Experiment::AttenuationSweep { .. } => "attenuation_sweep",
            Experiment::Raster(_) => "raster",
            Experiment::VnaSpectroscopy(_) => "vna_spectroscopy",
            Experiment::VnaVsTemperature { .. } => "vna_vs_temperature",
        }
    }
}

/// Structure representing one measurement run: where data goes, which instruments are connected
/// how, and what to measure. Serializable to and from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    pub output_dir: PathBuf,
    pub sample: String,
    pub instruments: Instruments,
    pub experiment: Experiment,
}

impl Default for BenchConfig {
    /// A counts versus bias run with a SIM928, a counter and an attenuator, to be edited.
    fn default() -> Self {
        let gpib_adapter = |port: &str| Connection::Serial {
            port: port.to_string(),
            baud: 115200,
        };
        Self {
            output_dir: PathBuf::from("data"),
            sample: String::from("sample"),
            instruments: Instruments {
                bias_source: Some(BiasSourceConfig::Sim928 {
                    connection: Connection::Serial {
                        port: String::from("/dev/ttyUSB0"),
                        baud: 9600,
                    },
                    slot: Some(1),
                }),
                counter: Some(CounterConfig {
                    connection: Connection::Gpib {
                        adapter: Box::new(gpib_adapter("/dev/ttyUSB1")),
                        address: 5,
                    },
                    trigger_level_v: 0.1,
                }),
                attenuator: Some(Connection::Gpib {
                    adapter: Box::new(gpib_adapter("/dev/ttyUSB2")),
                    address: 7,
                }),
                ..Instruments::default()
            },
            experiment: Experiment::CountsVsBias(CountsSettings::default()),
        }
    }
}

impl BenchConfig {
    /// Read the configuration in a YAML file
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Write the default configuration as a template to edit
    pub fn make_template_config(path: &Path) -> Result<(), ConfigError> {
        let yaml_str = serde_yaml::to_string(&Self::default())?;
        std::fs::write(path, yaml_str)?;
        Ok(())
    }
}
