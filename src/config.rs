use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming the directory holding the city files.
pub const DATA_DIR_ENV: &str = "BIKESHARE_DATA_DIR";
/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV: &str = "BIKESHARE_CONFIG";

// ---------------------------------------------------------------------------
// City – the fixed set of datasets the tool knows about
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum City {
    Chicago,
    NewYorkCity,
    Washington,
}

impl City {
    pub const ALL: [City; 3] = [City::Chicago, City::NewYorkCity, City::Washington];

    /// Every spelling accepted at the city prompt.
    pub const CHOICES: [&'static str; 4] = ["chicago", "new york city", "newyorkcity", "washington"];

    pub fn name(self) -> &'static str {
        match self {
            City::Chicago => "chicago",
            City::NewYorkCity => "new york city",
            City::Washington => "washington",
        }
    }

    fn default_file_name(self) -> &'static str {
        match self {
            City::Chicago => "chicago.csv",
            City::NewYorkCity => "new_york_city.csv",
            City::Washington => "washington.csv",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for City {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chicago" => Ok(City::Chicago),
            "new york city" | "newyorkcity" | "new_york_city" => Ok(City::NewYorkCity),
            "washington" => Ok(City::Washington),
            other => Err(ConfigError::UnknownCity(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown city '{0}'")]
    UnknownCity(String),
    #[error("reading config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// CityTable – immutable city → dataset path mapping
// ---------------------------------------------------------------------------

/// On-disk shape of the optional JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    #[serde(default)]
    files: BTreeMap<String, PathBuf>,
}

/// Resolved dataset location for every [`City`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityTable {
    paths: BTreeMap<City, PathBuf>,
}

impl CityTable {
    /// Default file names under `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        let paths = City::ALL
            .iter()
            .map(|&city| (city, data_dir.join(city.default_file_name())))
            .collect();
        CityTable { paths }
    }

    /// Build the table from `BIKESHARE_CONFIG` if set, else from
    /// `BIKESHARE_DATA_DIR` (default: current directory).
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Some(config_path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&config_path));
        }
        let data_dir = std::env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self::new(data_dir))
    }

    /// Read a JSON config file. Relative `data_dir` resolves against the
    /// config file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let data_dir = match file.data_dir {
            Some(dir) => base.join(dir),
            None => base.to_path_buf(),
        };

        let mut table = Self::new(&data_dir);
        for (key, file_name) in file.files {
            let city: City = key.parse()?;
            table.paths.insert(city, data_dir.join(file_name));
        }
        Ok(table)
    }

    pub fn path(&self, city: City) -> &Path {
        // Every constructor fills all cities.
        &self.paths[&city]
    }
}
