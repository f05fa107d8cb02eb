use crate::error::{CompostOpsError, Result};
use crate::models::{MoistureCategory, TemperatureCategory};
use dialoguer::{Input, Select};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub pile: PileDefaults,
    #[serde(default)]
    pub reminders: ReminderConfig,
    #[serde(default)]
    pub harvest: HarvestConfig,
    #[serde(default = "default_methods")]
    pub methods: Vec<MethodConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pile: PileDefaults::default(),
            reminders: ReminderConfig::default(),
            harvest: HarvestConfig::default(),
            methods: default_methods(),
        }
    }
}

/// Vitals assigned to newly created piles.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PileDefaults {
    #[serde(deserialize_with = "deserialize_temperature")]
    pub temperature: TemperatureCategory,
    #[serde(deserialize_with = "deserialize_moisture")]
    pub moisture: MoistureCategory,
}

impl Default for PileDefaults {
    fn default() -> Self {
        Self {
            temperature: TemperatureCategory::Warm,
            moisture: MoistureCategory::Humid,
        }
    }
}

fn deserialize_temperature<'de, D>(deserializer: D) -> std::result::Result<TemperatureCategory, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value = String::deserialize(deserializer)?;
    TemperatureCategory::from_str(&value).ok_or_else(|| {
        D::Error::custom(format!(
            "invalid temperature '{}' - expected cold, warm or hot",
            value
        ))
    })
}

fn deserialize_moisture<'de, D>(deserializer: D) -> std::result::Result<MoistureCategory, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value = String::deserialize(deserializer)?;
    MoistureCategory::from_str(&value).ok_or_else(|| {
        D::Error::custom(format!(
            "invalid moisture '{}' - expected dry, humid or wet",
            value
        ))
    })
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReminderConfig {
    #[serde(default = "default_interval_days")]
    pub turn_interval_days: u32,
    #[serde(default = "default_interval_days")]
    pub log_interval_days: u32,
    #[serde(default = "default_harvest_days")]
    pub harvest_fallback_days: u32,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            turn_interval_days: default_interval_days(),
            log_interval_days: default_interval_days(),
            harvest_fallback_days: default_harvest_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HarvestConfig {
    #[serde(default = "default_harvest_days")]
    pub base_days: u32,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_days: default_harvest_days(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MethodConfig {
    pub name: String,
    pub low_days: u32,
    pub high_days: u32,
}

fn default_interval_days() -> u32 {
    5
}

fn default_harvest_days() -> u32 {
    90
}

fn default_methods() -> Vec<MethodConfig> {
    vec![
        MethodConfig {
            name: "Hot Compost".into(),
            low_days: 30,
            high_days: 90,
        },
        MethodConfig {
            name: "Cold Compost".into(),
            low_days: 180,
            high_days: 365,
        },
        MethodConfig {
            name: "Tumbler".into(),
            low_days: 21,
            high_days: 60,
        },
    ]
}

impl Config {
    pub fn load(config_override: Option<&PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => p.clone(),
            None => Self::find_config_path()?,
        };

        if !config_path.exists() {
            return Err(CompostOpsError::Config(format!(
                "Config file not found at {:?}. Run `compostops init` to set up.",
                config_path
            )));
        }

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| CompostOpsError::Config(format!("Failed to read config: {}", e)))?;

        Self::parse(&config_str)
    }

    /// Parse YAML after substituting `${VAR}` placeholders from the environment.
    pub fn parse(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content);
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| CompostOpsError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.harvest.base_days == 0 {
            return Err(CompostOpsError::Config(
                "harvest.base_days must be greater than zero".into(),
            ));
        }
        if self.reminders.turn_interval_days == 0 || self.reminders.log_interval_days == 0 {
            return Err(CompostOpsError::Config(
                "reminder intervals must be greater than zero".into(),
            ));
        }
        for method in &self.methods {
            if method.name.trim().is_empty() {
                return Err(CompostOpsError::Config("method name cannot be empty".into()));
            }
        }
        Ok(())
    }

    /// Search for config.yaml in standard locations.
    /// Returns the path of the first found config, or the XDG default path if none found.
    fn find_config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        Self::default_config_path()
    }

    /// Returns true if a config file can be found in any standard location.
    pub fn exists(config_override: Option<&PathBuf>) -> bool {
        match config_override {
            Some(p) => p.exists(),
            None => Self::find_config_path()
                .map(|p| p.exists())
                .unwrap_or(false),
        }
    }

    /// Default path for writing new config files (~/.config/compostops/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CompostOpsError::Config("Cannot determine config directory".into()))?
            .join("compostops");
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    /// Returns the new Config and the path it was written to.
    pub fn setup_interactive(config_override: Option<&PathBuf>) -> Result<(Self, PathBuf)> {
        println!();
        println!("Let's set up compostops!");
        println!();

        println!("New pile defaults");
        let temperatures = TemperatureCategory::all();
        let temp_labels: Vec<&str> = temperatures.iter().map(|t| t.as_str()).collect();
        let temp_idx = Select::new()
            .with_prompt("  Starting temperature")
            .items(&temp_labels)
            .default(1)
            .interact()
            .map_err(|e| CompostOpsError::Config(format!("Input error: {}", e)))?;

        let moistures = MoistureCategory::all();
        let moisture_labels: Vec<&str> = moistures.iter().map(|m| m.as_str()).collect();
        let moisture_idx = Select::new()
            .with_prompt("  Starting moisture")
            .items(&moisture_labels)
            .default(1)
            .interact()
            .map_err(|e| CompostOpsError::Config(format!("Input error: {}", e)))?;

        println!();

        println!("Reminders");
        let turn_interval_days: u32 = Input::new()
            .with_prompt("  Remind me to turn after (days)")
            .default(default_interval_days())
            .interact_text()
            .map_err(|e| CompostOpsError::Config(format!("Input error: {}", e)))?;

        let log_interval_days: u32 = Input::new()
            .with_prompt("  Remind me to log after (days)")
            .default(default_interval_days())
            .interact_text()
            .map_err(|e| CompostOpsError::Config(format!("Input error: {}", e)))?;

        println!();

        let config = Config {
            pile: PileDefaults {
                temperature: temperatures[temp_idx],
                moisture: moistures[moisture_idx],
            },
            reminders: ReminderConfig {
                turn_interval_days: turn_interval_days.max(1),
                log_interval_days: log_interval_days.max(1),
                harvest_fallback_days: default_harvest_days(),
            },
            harvest: HarvestConfig::default(),
            methods: default_methods(),
        };

        let config_path = match config_override {
            Some(p) => p.clone(),
            None => Self::default_config_path()?,
        };
        config.write_to(&config_path)?;

        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)
            .map_err(|e| CompostOpsError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            "# compostops configuration\n# Generated by `compostops init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(path, content)?;
        Ok(())
    }

    fn substitute_env_vars(content: &str) -> String {
        let mut result = content.to_string();

        let re = match regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") {
            Ok(re) => re,
            Err(_) => return result,
        };

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        result
    }

    pub fn data_dir(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        // CLI override takes priority
        if let Some(dir) = data_dir_override {
            std::fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }

        // Then check env var
        if let Ok(dir) = std::env::var("COMPOSTOPS_DATA_DIR") {
            let p = PathBuf::from(dir);
            std::fs::create_dir_all(&p)?;
            return Ok(p);
        }

        // Use XDG data directory
        let data_dir = dirs::data_dir()
            .ok_or_else(|| CompostOpsError::Config("Cannot determine data directory".into()))?
            .join("compostops");

        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    pub fn db_path(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        Ok(Self::data_dir(data_dir_override)?.join("compostops.db"))
    }
}
